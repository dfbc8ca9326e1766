//! Chat-platform surface of the Gangway pipeline.
//!
//! The engines see the chat platform only through the [`ChatGateway`] trait
//! and the payload types here; the serenity-backed implementation is behind
//! the `discord` feature so library consumers and tests stay gateway-free.
#![warn(missing_docs)]

mod format;
mod gateway;
mod message;
mod payload;
#[cfg(feature = "discord")]
mod serenity_gateway;

pub use format::{message_link, mention, relative_timestamp};
pub use gateway::ChatGateway;
pub use message::{ChatMessage, SentMessage};
pub use payload::{MemberInfo, MemberLeft, ReactionAdded};
#[cfg(feature = "discord")]
pub use serenity_gateway::SerenityGateway;
