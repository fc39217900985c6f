//! Voice recording sessions
//!
//! A [`VoiceRecorder`] holds at most one recording at a time. Each recording
//! runs as a task that owns the audio stream and finishes on the first of:
//! a manual stop, the duration ceiling, the end of the input, or the
//! [`RecordingHandle`] being dropped. The stream is released on every one
//! of those paths, and also if the task itself is torn down.

use super::audio::{AudioDevice, AudioStream};
use crate::config::CaptureSettings;
use crate::error::CaptureError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Default recording ceiling
pub const DEFAULT_MAX_RECORDING: Duration = Duration::from_millis(8_000);
/// Default time the processing indicator stays up
pub const DEFAULT_PROCESSING_INDICATOR: Duration = Duration::from_millis(2_500);

/// Recorder state as seen by the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
    /// A recording was just handed off; indicator only
    Processing,
}

/// Why a recording stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Manual,
    Ceiling,
    EndOfInput,
}

/// Audio captured by one recording
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoicePayload {
    /// All chunks, concatenated in arrival order
    pub bytes: Vec<u8>,
    pub mime: String,
    pub duration: Duration,
    pub stop_reason: StopReason,
}

impl VoicePayload {
    pub fn new(bytes: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            bytes,
            mime: mime.into(),
            duration: Duration::ZERO,
            stop_reason: StopReason::EndOfInput,
        }
    }

    /// File name used when uploading
    pub fn file_name(&self) -> &'static str {
        match self.mime.as_str() {
            "audio/webm" => "recording.webm",
            "audio/ogg" => "recording.ogg",
            "audio/mpeg" => "recording.mp3",
            "audio/mp4" => "recording.m4a",
            _ => "recording.wav",
        }
    }
}

struct Shared {
    state: watch::Sender<RecorderState>,
    /// Bumped for every recording that acquires the input
    session: AtomicU64,
}

/// Records from an [`AudioDevice`], one session at a time
pub struct VoiceRecorder {
    device: Arc<dyn AudioDevice>,
    max_duration: Duration,
    processing_indicator: Duration,
    shared: Arc<Shared>,
}

impl VoiceRecorder {
    pub fn new(device: Arc<dyn AudioDevice>) -> Self {
        let (state, _) = watch::channel(RecorderState::Idle);
        Self {
            device,
            max_duration: DEFAULT_MAX_RECORDING,
            processing_indicator: DEFAULT_PROCESSING_INDICATOR,
            shared: Arc::new(Shared {
                state,
                session: AtomicU64::new(0),
            }),
        }
    }

    /// Apply limits from settings
    pub fn with_settings(self, settings: &CaptureSettings) -> Self {
        self.with_max_duration(Duration::from_millis(settings.max_recording_ms))
            .with_processing_indicator(Duration::from_millis(settings.processing_indicator_ms))
    }

    pub fn with_max_duration(mut self, max: Duration) -> Self {
        self.max_duration = max;
        self
    }

    pub fn with_processing_indicator(mut self, indicator: Duration) -> Self {
        self.processing_indicator = indicator;
        self
    }

    pub fn state(&self) -> RecorderState {
        *self.shared.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<RecorderState> {
        self.shared.state.subscribe()
    }

    /// Acquire the input and start recording
    pub async fn start(&self) -> Result<RecordingHandle, CaptureError> {
        let claimed = self.shared.state.send_if_modified(|state| {
            if *state == RecorderState::Recording {
                false
            } else {
                *state = RecorderState::Recording;
                true
            }
        });
        if !claimed {
            return Err(CaptureError::AlreadyRecording);
        }
        // Back to Idle if opening fails or this future is dropped mid-open
        let claim = Claim {
            shared: &*self.shared,
            armed: true,
        };

        let stream = match self.device.open().await {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Could not open audio input: {}", e);
                return Err(CaptureError::MicrophoneUnavailable(e.to_string()));
            }
        };

        let session = self.shared.session.fetch_add(1, Ordering::SeqCst) + 1;
        let (stop_tx, stop_rx) = oneshot::channel();
        let (done_tx, done_rx) = oneshot::channel();

        info!("Recording started (ceiling {:?})", self.max_duration);
        tokio::spawn(record(
            StreamGuard(Some(stream)),
            stop_rx,
            done_tx,
            self.shared.clone(),
            session,
            self.max_duration,
            self.processing_indicator,
        ));
        claim.disarm();

        Ok(RecordingHandle {
            stop: Some(stop_tx),
            done: done_rx,
        })
    }
}

/// Holds the `Recording` state between claiming it and handing the
/// stream to the recording task.
struct Claim<'a> {
    shared: &'a Shared,
    armed: bool,
}

impl Claim<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.shared.state.send_replace(RecorderState::Idle);
        }
    }
}

/// Control over one running recording.
///
/// Dropping the handle stops the recording, releases the input and
/// discards the audio.
pub struct RecordingHandle {
    stop: Option<oneshot::Sender<()>>,
    done: oneshot::Receiver<VoicePayload>,
}

impl RecordingHandle {
    /// Ask the recording to stop; `finish` then returns promptly
    pub fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }

    /// Wait for the recording to finalize and take its audio
    pub async fn finish(self) -> Result<VoicePayload, CaptureError> {
        // Keep the stop sender alive while waiting, or the task would read
        // its closure as a teardown.
        let Self { stop, done } = self;
        let result = done.await.map_err(|_| CaptureError::RecordingAborted);
        drop(stop);
        result
    }

    /// Stop now and take the audio
    pub async fn stop_and_finish(mut self) -> Result<VoicePayload, CaptureError> {
        self.stop();
        self.finish().await
    }
}

/// Releases the stream when dropped
struct StreamGuard(Option<Box<dyn AudioStream>>);

impl StreamGuard {
    fn mime(&self) -> String {
        self.0
            .as_ref()
            .map(|s| s.mime().to_string())
            .unwrap_or_else(|| "audio/wav".to_string())
    }

    fn release(&mut self) {
        if let Some(mut stream) = self.0.take() {
            stream.release();
            debug!("Audio input released");
        }
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.release();
    }
}

enum Ended {
    Stopped(StopReason),
    HandleDropped,
}

async fn next_chunk(guard: &mut StreamGuard) -> Option<Vec<u8>> {
    match guard.0.as_mut() {
        Some(stream) => stream.next_chunk().await,
        None => None,
    }
}

async fn record(
    mut guard: StreamGuard,
    mut stop_rx: oneshot::Receiver<()>,
    done_tx: oneshot::Sender<VoicePayload>,
    shared: Arc<Shared>,
    session: u64,
    max_duration: Duration,
    processing_indicator: Duration,
) {
    let started = Instant::now();
    let ceiling = tokio::time::sleep(max_duration);
    tokio::pin!(ceiling);

    let mime = guard.mime();
    let mut chunks: Vec<Vec<u8>> = Vec::new();

    let ended = loop {
        tokio::select! {
            biased;
            stop = &mut stop_rx => {
                break match stop {
                    Ok(()) => Ended::Stopped(StopReason::Manual),
                    Err(_) => Ended::HandleDropped,
                };
            }
            _ = &mut ceiling => break Ended::Stopped(StopReason::Ceiling),
            chunk = next_chunk(&mut guard) => match chunk {
                Some(chunk) if !chunk.is_empty() => chunks.push(chunk),
                Some(_) => {}
                None => break Ended::Stopped(StopReason::EndOfInput),
            },
        }
    };

    guard.release();
    let duration = started.elapsed();

    let stop_reason = match ended {
        Ended::Stopped(reason) => reason,
        Ended::HandleDropped => {
            debug!("Recording abandoned after {:?}", duration);
            shared.state.send_replace(RecorderState::Idle);
            return;
        }
    };

    let payload = VoicePayload {
        bytes: chunks.concat(),
        mime,
        duration,
        stop_reason,
    };
    info!(
        "Recording finished after {:?} ({:?}, {} bytes)",
        duration,
        stop_reason,
        payload.bytes.len()
    );

    shared.state.send_replace(RecorderState::Processing);
    let indicator_shared = shared.clone();
    tokio::spawn(async move {
        tokio::time::sleep(processing_indicator).await;
        indicator_shared.state.send_if_modified(|state| {
            let current = indicator_shared.session.load(Ordering::SeqCst) == session;
            if current && *state == RecorderState::Processing {
                *state = RecorderState::Idle;
                true
            } else {
                false
            }
        });
    });

    if done_tx.send(payload).is_err() {
        debug!("Recording finished but nobody is waiting for it");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::audio::AudioDeviceError;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct Counters {
        opened: AtomicUsize,
        released: AtomicUsize,
    }

    /// Emits a 4-byte chunk every 100ms, or `limit` chunks then ends
    struct FakeMic {
        counters: Arc<Counters>,
        deny: Option<fn() -> AudioDeviceError>,
        limit: Option<usize>,
    }

    impl FakeMic {
        fn new() -> (Self, Arc<Counters>) {
            let counters = Arc::new(Counters::default());
            (
                Self {
                    counters: counters.clone(),
                    deny: None,
                    limit: None,
                },
                counters,
            )
        }
    }

    struct FakeStream {
        counters: Arc<Counters>,
        emitted: usize,
        limit: Option<usize>,
    }

    #[async_trait]
    impl AudioDevice for FakeMic {
        async fn open(&self) -> Result<Box<dyn AudioStream>, AudioDeviceError> {
            if let Some(deny) = self.deny {
                return Err(deny());
            }
            self.counters.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeStream {
                counters: self.counters.clone(),
                emitted: 0,
                limit: self.limit,
            }))
        }
    }

    #[async_trait]
    impl AudioStream for FakeStream {
        fn mime(&self) -> &str {
            "audio/webm"
        }

        async fn next_chunk(&mut self) -> Option<Vec<u8>> {
            if self.limit.is_some_and(|limit| self.emitted >= limit) {
                return None;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
            self.emitted += 1;
            Some(vec![self.emitted as u8; 4])
        }

        fn release(&mut self) {
            self.counters.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ceiling_finalizes_at_8000ms() {
        let (mic, counters) = FakeMic::new();
        let recorder = VoiceRecorder::new(Arc::new(mic));

        let handle = recorder.start().await.unwrap();
        assert_eq!(recorder.state(), RecorderState::Recording);

        let payload = handle.finish().await.unwrap();

        assert_eq!(payload.duration, Duration::from_millis(8_000));
        assert_eq!(payload.stop_reason, StopReason::Ceiling);
        assert_eq!(payload.mime, "audio/webm");
        assert!(!payload.bytes.is_empty());
        assert_eq!(counters.opened.load(Ordering::SeqCst), 1);
        assert_eq!(counters.released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_stop_before_ceiling() {
        let (mic, counters) = FakeMic::new();
        let recorder = VoiceRecorder::new(Arc::new(mic));

        let handle = recorder.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(1_050)).await;
        let payload = handle.stop_and_finish().await.unwrap();

        assert_eq!(payload.stop_reason, StopReason::Manual);
        assert_eq!(payload.duration, Duration::from_millis(1_050));
        assert_eq!(payload.bytes.len(), 10 * 4);
        assert_eq!(&payload.bytes[..4], &[1, 1, 1, 1]);
        assert_eq!(&payload.bytes[36..], &[10, 10, 10, 10]);
        assert_eq!(counters.released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_of_input_concatenates_chunks() {
        let (mut mic, counters) = FakeMic::new();
        mic.limit = Some(3);
        let recorder = VoiceRecorder::new(Arc::new(mic));

        let payload = recorder.start().await.unwrap().finish().await.unwrap();

        assert_eq!(payload.stop_reason, StopReason::EndOfInput);
        assert_eq!(payload.bytes, vec![1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3]);
        assert_eq!(payload.duration, Duration::from_millis(300));
        assert_eq!(counters.released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permission_denied_stays_idle() {
        let (mut mic, counters) = FakeMic::new();
        mic.deny = Some(|| AudioDeviceError::PermissionDenied);
        let recorder = VoiceRecorder::new(Arc::new(mic));

        let result = recorder.start().await;

        assert!(matches!(result, Err(CaptureError::MicrophoneUnavailable(_))));
        assert_eq!(recorder.state(), RecorderState::Idle);
        assert_eq!(counters.opened.load(Ordering::SeqCst), 0);
        assert_eq!(counters.released.load(Ordering::SeqCst), 0);
    }

    /// Never finishes opening, like an unanswered permission prompt
    struct StalledMic;

    #[async_trait]
    impl AudioDevice for StalledMic {
        async fn open(&self) -> Result<Box<dyn AudioStream>, AudioDeviceError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Err(AudioDeviceError::Busy)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_start_returns_to_idle() {
        let recorder = VoiceRecorder::new(Arc::new(StalledMic));

        let cancelled =
            tokio::time::timeout(Duration::from_millis(10), recorder.start()).await;

        assert!(cancelled.is_err());
        assert_eq!(recorder.state(), RecorderState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_works_after_cancelled_start() {
        let (mic, counters) = FakeMic::new();
        let mic: Arc<dyn AudioDevice> = Arc::new(mic);
        let recorder = VoiceRecorder {
            device: Arc::new(StalledMic),
            ..VoiceRecorder::new(mic.clone())
        };
        let _ = tokio::time::timeout(Duration::from_millis(10), recorder.start()).await;

        let recorder = VoiceRecorder { device: mic, ..recorder };
        let payload = recorder.start().await.unwrap().stop_and_finish().await.unwrap();

        assert_eq!(payload.stop_reason, StopReason::Manual);
        assert_eq!(counters.released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_busy_device_reports_reason() {
        let (mut mic, _) = FakeMic::new();
        mic.deny = Some(|| AudioDeviceError::Busy);
        let recorder = VoiceRecorder::new(Arc::new(mic));

        match recorder.start().await {
            Err(CaptureError::MicrophoneUnavailable(reason)) => assert_eq!(reason, "audio input busy"),
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_recording_at_a_time() {
        let (mic, counters) = FakeMic::new();
        let recorder = VoiceRecorder::new(Arc::new(mic));

        let handle = recorder.start().await.unwrap();
        assert!(matches!(
            recorder.start().await,
            Err(CaptureError::AlreadyRecording)
        ));
        assert_eq!(counters.opened.load(Ordering::SeqCst), 1);

        handle.stop_and_finish().await.unwrap();
        assert_eq!(recorder.state(), RecorderState::Processing);

        // A new recording may start while the indicator is still up
        let handle = recorder.start().await.unwrap();
        handle.stop_and_finish().await.unwrap();
        assert_eq!(counters.opened.load(Ordering::SeqCst), 2);
        assert_eq!(counters.released.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_handle_releases_input() {
        let (mic, counters) = FakeMic::new();
        let recorder = VoiceRecorder::new(Arc::new(mic));
        let mut state = recorder.subscribe();

        let handle = recorder.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;
        drop(handle);

        state
            .wait_for(|s| *s == RecorderState::Idle)
            .await
            .unwrap();
        assert_eq!(counters.released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_processing_indicator_lasts_2500ms() {
        let (mut mic, _) = FakeMic::new();
        mic.limit = Some(1);
        let recorder = VoiceRecorder::new(Arc::new(mic));
        let mut state = recorder.subscribe();

        recorder.start().await.unwrap().finish().await.unwrap();
        assert_eq!(recorder.state(), RecorderState::Processing);

        let finished = Instant::now();
        state
            .wait_for(|s| *s == RecorderState::Idle)
            .await
            .unwrap();
        assert_eq!(finished.elapsed(), Duration::from_millis(2_500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_limits_from_settings() {
        let (mic, _) = FakeMic::new();
        let settings = CaptureSettings {
            max_recording_ms: 500,
            ..CaptureSettings::default()
        };
        let recorder = VoiceRecorder::new(Arc::new(mic)).with_settings(&settings);

        let payload = recorder.start().await.unwrap().finish().await.unwrap();
        assert_eq!(payload.duration, Duration::from_millis(500));
        assert_eq!(payload.stop_reason, StopReason::Ceiling);
    }

    #[tokio::test(start_paused = true)]
    async fn test_long_file_stops_at_ceiling() {
        use crate::capture::audio::FileAudioDevice;

        let path = std::env::temp_dir().join(format!(
            "heritage-search-long-{}.wav",
            std::process::id()
        ));
        // 100 chunks at 100ms each, far past the ceiling
        tokio::fs::write(&path, vec![0u8; 400]).await.unwrap();
        let device = FileAudioDevice::new(&path).with_chunk_size(4);
        let recorder =
            VoiceRecorder::new(Arc::new(device)).with_max_duration(Duration::from_millis(1_000));

        let payload = recorder.start().await.unwrap().finish().await.unwrap();
        let _ = tokio::fs::remove_file(&path).await;

        assert_eq!(payload.stop_reason, StopReason::Ceiling);
        assert_eq!(payload.duration, Duration::from_millis(1_000));
        assert!(payload.bytes.len() < 400);
    }

    #[test]
    fn test_upload_file_name_follows_mime() {
        assert_eq!(VoicePayload::new(vec![], "audio/webm").file_name(), "recording.webm");
        assert_eq!(VoicePayload::new(vec![], "audio/wav").file_name(), "recording.wav");
        assert_eq!(VoicePayload::new(vec![], "").file_name(), "recording.wav");
    }
}
