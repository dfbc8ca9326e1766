//! Reaction emojis the bot applies to its own notifications.

/// Added to the notification the moderator acted on.
pub const COMPLETION_EMOJI: &str = "✅";

/// Added to every other notification for the same request.
pub const ALREADY_HANDLED_EMOJI: &str = "✔️";

/// Shown while an event is being handled, removed when done.
pub const PROCESSING_EMOJI: &str = "⏳";
