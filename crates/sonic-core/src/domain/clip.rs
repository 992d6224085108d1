//! Mapping from spoken messages to cached clip names.

/// Normalize a feedback message to its clip identifier.
///
/// Lower-cases the message and replaces spaces with underscores, so
/// `"Volume up"` is cached as `volume_up.wav`.
pub fn clip_id(message: &str) -> String {
    message.to_lowercase().replace(' ', "_")
}
