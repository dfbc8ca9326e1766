//! Gangway - beta-tester reaction-role onboarding and approval bot.
//!
//! Connects to the chat gateway, routes reaction and member-leave events into
//! the onboarding/approval pipeline, and keeps the config and reaction-role
//! caches fresh on a timer.

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Command-line arguments for the bot.
#[derive(Parser, Debug)]
#[command(name = "gangway")]
#[command(about = "Gangway - beta-tester onboarding and approval bot")]
#[command(version)]
struct Args {
    /// Path to the bot configuration file
    #[arg(short, long, default_value = "gangway.toml")]
    config: PathBuf,

    /// Discord bot token
    #[arg(long, env = "DISCORD_TOKEN", hide_env_values = true)]
    discord_token: Option<String>,

    /// Record store API key
    #[arg(long, env = "STORE_API_KEY", hide_env_values = true)]
    store_api_key: Option<String>,
}

#[cfg(feature = "discord")]
mod run {
    use super::Args;
    use gangway::{
        AppConnectClient, ApprovalEngine, BotConfig, ConfigCacheService, ConfigStorage,
        Dispatcher, EnvTokenProvider, MemberLeft, OnboardingEngine, ReactionAdded,
        RoleCacheService, SerenityGateway, StoreClient, TesterStorage, spawn_refresh_job,
    };
    use gangway::BetaStore;
    use gangway_discord::MemberInfo;
    use serenity::async_trait;
    use serenity::model::channel::{Reaction, ReactionType};
    use serenity::model::gateway::{GatewayIntents, Ready};
    use serenity::model::guild::Member;
    use serenity::model::id::GuildId;
    use serenity::model::user::User;
    use serenity::prelude::{Client, Context, EventHandler};
    use std::sync::{Arc, OnceLock};
    use std::time::Duration;
    use tracing::{error, info, warn};

    struct Handler {
        dispatcher: OnceLock<Arc<Dispatcher>>,
    }

    impl Handler {
        fn dispatcher(&self) -> Option<&Arc<Dispatcher>> {
            let dispatcher = self.dispatcher.get();
            if dispatcher.is_none() {
                warn!("Event received before the dispatcher was wired up");
            }
            dispatcher
        }
    }

    #[async_trait]
    impl EventHandler for Handler {
        async fn ready(&self, _ctx: Context, ready: Ready) {
            info!(user = %ready.user.name, "Connected to the gateway");
        }

        async fn reaction_add(&self, _ctx: Context, reaction: Reaction) {
            let Some(dispatcher) = self.dispatcher() else {
                return;
            };
            let Some(event) = convert_reaction(&reaction) else {
                return;
            };
            if let Err(err) = dispatcher.handle_reaction(&event).await {
                error!(error = %err, "Failed to handle reaction");
            }
        }

        async fn guild_member_removal(
            &self,
            _ctx: Context,
            guild_id: GuildId,
            user: User,
            _member: Option<Member>,
        ) {
            let Some(dispatcher) = self.dispatcher() else {
                return;
            };
            let event = MemberLeft::new(
                guild_id.to_string(),
                user.id.to_string(),
                user.name.clone(),
            );
            if let Err(err) = dispatcher.handle_member_left(&event).await {
                error!(error = %err, "Failed to handle member departure");
            }
        }
    }

    fn convert_reaction(reaction: &Reaction) -> Option<ReactionAdded> {
        let user_id = reaction.user_id?;
        let emoji = match &reaction.emoji {
            ReactionType::Unicode(name) => name.clone(),
            ReactionType::Custom { name, .. } => name.clone()?,
            _ => return None,
        };
        let member = reaction.member.as_ref().map(|member| {
            MemberInfo::new(
                member.user.name.clone(),
                member.roles.iter().map(|role| role.to_string()).collect(),
            )
        });
        Some(ReactionAdded::new(
            reaction.guild_id.map(|id| id.to_string()),
            reaction.channel_id.to_string(),
            reaction.message_id.to_string(),
            emoji,
            user_id.to_string(),
            member,
        ))
    }

    pub async fn main(args: Args) -> Result<(), Box<dyn std::error::Error>> {
        let config = BotConfig::from_file(&args.config)?;
        let discord_token = args
            .discord_token
            .ok_or("DISCORD_TOKEN is not set")?;
        let store_api_key = args
            .store_api_key
            .ok_or("STORE_API_KEY is not set")?;

        let store_client = StoreClient::new(
            config.store().api_url(),
            config.store().web_url(),
            config.store().base_id(),
            store_api_key,
        );
        let store: Arc<dyn BetaStore> = Arc::new(TesterStorage::new(store_client.clone()));
        let remote_config = Arc::new(ConfigStorage::new(store_client));
        let config_cache = Arc::new(ConfigCacheService::new(remote_config));
        let role_cache = Arc::new(RoleCacheService::new(store.clone()));
        let beta = Arc::new(AppConnectClient::new(
            config.beta().api_url(),
            Arc::new(EnvTokenProvider),
        ));

        let handler = Arc::new(Handler {
            dispatcher: OnceLock::new(),
        });
        let intents = GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MEMBERS
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::GUILD_MESSAGE_REACTIONS
            | GatewayIntents::DIRECT_MESSAGES;
        let mut client = Client::builder(&discord_token, intents)
            .event_handler_arc(handler.clone())
            .await?;

        let gateway = Arc::new(SerenityGateway::new(
            client.http.clone(),
            client.cache.clone(),
        ));
        let onboarding = OnboardingEngine::new(
            store.clone(),
            gateway.clone(),
            config_cache.clone(),
            role_cache.clone(),
            *config.registration_throttle_minutes(),
        );
        let approval = ApprovalEngine::new(
            store.clone(),
            gateway.clone(),
            config_cache.clone(),
            beta,
        );
        let dispatcher = Arc::new(Dispatcher::new(
            gateway,
            config_cache.clone(),
            role_cache.clone(),
            onboarding,
            approval,
        ));
        if handler.dispatcher.set(dispatcher).is_err() {
            return Err("dispatcher wired twice".into());
        }

        let refresh_interval = Duration::from_secs(*config.refresh_interval_minutes() * 60);
        let refresh = spawn_refresh_job(config_cache, role_cache, refresh_interval);

        info!("Starting Gangway");
        client.start().await?;
        refresh.abort();
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    #[cfg(feature = "discord")]
    {
        run::main(args).await
    }
    #[cfg(not(feature = "discord"))]
    {
        let _ = args;
        Err("gangway was built without the 'discord' feature".into())
    }
}
