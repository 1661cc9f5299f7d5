//! A concrete, ready-to-use queue entry

/// An item identifying one piece of media in a [`crate::MediaQueue`].
///
/// [`MediaQueue`](crate::MediaQueue) is generic over its item type, so
/// embedders are free to queue whatever they like (a bare `String` location
/// works); `QueueItem` is provided as the common case of an id paired with a
/// playback location, so most callers don't need to define their own type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueItem {
    /// Stable identifier, distinct from position in the queue.
    pub id: u64,
    /// The location a `Prepare` command would be issued against.
    pub location: String,
    /// Optional display title.
    pub title: Option<String>,
}

impl QueueItem {
    /// Creates a new item with no title.
    pub fn new(id: u64, location: impl Into<String>) -> Self {
        Self {
            id,
            location: location.into(),
            title: None,
        }
    }

    /// Creates a new item carrying a display title.
    pub fn with_title(id: u64, location: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id,
            location: location.into(),
            title: Some(title.into()),
        }
    }
}
