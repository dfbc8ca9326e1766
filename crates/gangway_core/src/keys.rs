//! Per-guild configuration keys recognized by the pipeline.

/// Channel receiving approval notifications when an app has no channel of its own.
pub const DEFAULT_APPROVALS_CHANNEL: &str = "default_approvals_channel";

/// Role a member must hold before requesting access to a gated app.
pub const RULE_AGREEMENT_ROLE: &str = "rule_agreement_role";

/// JSON `{channel, message}` pointer to the rules message.
pub const RULE_AGREEMENT_MESSAGE: &str = "rule_agreement_message";

/// JSON array of emoji names that approve a testing request.
pub const APPROVAL_EMOJIS: &str = "approval_emojis";

/// JSON array of emoji names that remove a tester from their betas.
pub const REMOVAL_EMOJIS: &str = "removal_emojis";

/// Channel notified when an active tester leaves the guild.
pub const TESTER_EXIT_NOTIFICATION_CHANNEL: &str = "tester_exit_notification_channel";
