//! Input capture for the three search modalities
//!
//! Each adapter turns raw user input into a validated payload for the
//! search client, or a [`CaptureError`](crate::error::CaptureError).

mod audio;
mod image;
mod text;
mod voice;

pub use audio::{
    AudioDevice, AudioDeviceError, AudioStream, FileAudioDevice, DEFAULT_FILE_CHUNK_SIZE,
    DEFAULT_FILE_PACE,
};
pub use image::{CapturedImage, ImageCapture, ImageFile, DEFAULT_MAX_IMAGE_BYTES};
pub use text::capture_text;
pub use voice::{
    RecorderState, RecordingHandle, StopReason, VoicePayload, VoiceRecorder,
    DEFAULT_MAX_RECORDING, DEFAULT_PROCESSING_INDICATOR,
};
