//! Error types for capture and transport.

/// A modality adapter rejected its input.
///
/// Display strings double as the user-facing notice text.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Please enter something to search for")]
    EmptyQuery,

    #[error("Please select an image file (JPEG, PNG, WebP, etc.)")]
    NotAnImage(String),

    #[error(
        "Image size exceeds {}MB limit. Please choose a smaller image.",
        .limit / (1024 * 1024)
    )]
    ImageTooLarge { size: u64, limit: u64 },

    #[error("Could not access microphone. Please check your permissions. ({0})")]
    MicrophoneUnavailable(String),

    #[error("A voice recording is already in progress")]
    AlreadyRecording,

    #[error("Voice recording ended unexpectedly")]
    RecordingAborted,

    #[error("Could not read file: {0}")]
    Io(#[from] std::io::Error),
}

/// A search request could not produce a decoded response.
///
/// Always recovered by the search client into a fallback response.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}
