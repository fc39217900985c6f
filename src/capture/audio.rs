//! Audio input devices used by the voice recorder

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Failure to acquire an audio input
#[derive(Debug, thiserror::Error)]
pub enum AudioDeviceError {
    #[error("permission denied")]
    PermissionDenied,

    #[error("no audio input device found")]
    NotFound,

    #[error("audio input busy")]
    Busy,

    #[error("{0}")]
    Io(std::io::Error),
}

impl From<std::io::Error> for AudioDeviceError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            ErrorKind::PermissionDenied => Self::PermissionDenied,
            ErrorKind::NotFound => Self::NotFound,
            _ => Self::Io(err),
        }
    }
}

/// A source of recorded audio that can be opened for exclusive use
#[async_trait]
pub trait AudioDevice: Send + Sync {
    /// Acquire the input; the returned stream owns it until released
    async fn open(&self) -> Result<Box<dyn AudioStream>, AudioDeviceError>;
}

/// An open, exclusively held audio input
#[async_trait]
pub trait AudioStream: Send {
    /// MIME type of the encoded chunks
    fn mime(&self) -> &str {
        "audio/wav"
    }

    /// Next encoded chunk, or `None` once the input has ended.
    ///
    /// Must be cancel-safe: the recorder drops this future when a stop
    /// request or the duration ceiling wins the race.
    async fn next_chunk(&mut self) -> Option<Vec<u8>>;

    /// Give the input back. Called exactly once by the recorder.
    fn release(&mut self);
}

/// Default chunk size for file playback
pub const DEFAULT_FILE_CHUNK_SIZE: usize = 16 * 1024;
/// Default delay before each chunk, roughly 16-bit stereo at 44.1 kHz
pub const DEFAULT_FILE_PACE: Duration = Duration::from_millis(100);

/// Plays back a recorded file as if it were a live input.
///
/// Chunks are released at a steady pace, so the recorder's duration
/// ceiling cuts long files short just as it would a live microphone.
#[derive(Debug, Clone)]
pub struct FileAudioDevice {
    path: PathBuf,
    chunk_size: usize,
    pace: Duration,
}

impl FileAudioDevice {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            chunk_size: DEFAULT_FILE_CHUNK_SIZE,
            pace: DEFAULT_FILE_PACE,
        }
    }

    /// Delay before each chunk; zero plays the file back at once
    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = pace;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }
}

#[async_trait]
impl AudioDevice for FileAudioDevice {
    async fn open(&self) -> Result<Box<dyn AudioStream>, AudioDeviceError> {
        let data = tokio::fs::read(&self.path).await?;
        debug!("Opened {} ({} bytes)", self.path.display(), data.len());

        let mime = match self.path.extension().and_then(|e| e.to_str()) {
            Some("webm") => "audio/webm",
            Some("ogg") | Some("oga") => "audio/ogg",
            Some("mp3") => "audio/mpeg",
            Some("m4a") => "audio/mp4",
            _ => "audio/wav",
        };

        Ok(Box::new(FileAudioStream {
            data,
            position: 0,
            chunk_size: self.chunk_size,
            pace: self.pace,
            mime,
        }))
    }
}

struct FileAudioStream {
    data: Vec<u8>,
    position: usize,
    chunk_size: usize,
    pace: Duration,
    mime: &'static str,
}

#[async_trait]
impl AudioStream for FileAudioStream {
    fn mime(&self) -> &str {
        self.mime
    }

    async fn next_chunk(&mut self) -> Option<Vec<u8>> {
        if self.position >= self.data.len() {
            return None;
        }
        // Nothing is consumed until the wait is over
        if !self.pace.is_zero() {
            tokio::time::sleep(self.pace).await;
        }
        let end = (self.position + self.chunk_size).min(self.data.len());
        let chunk = self.data[self.position..end].to_vec();
        self.position = end;
        Some(chunk)
    }

    fn release(&mut self) {
        self.data = Vec::new();
        self.position = 0;
    }
}
