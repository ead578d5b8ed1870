//! Test doubles for the blob store and transcoder.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use amux_media::{MediaError, MediaResult, TranscodeOutput, TranscodeRequest, Transcoder};
use amux_storage::{BlobStore, StorageError, StorageResult};

/// Concatenates its inputs into the output file and reports one second per input.
#[derive(Debug, Default)]
pub struct FakeTranscoder {
    calls: AtomicUsize,
    last_inputs: Mutex<Vec<Vec<u8>>>,
}

impl FakeTranscoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Input contents seen by the most recent call, in order.
    pub fn last_inputs(&self) -> Vec<Vec<u8>> {
        self.last_inputs.lock().unwrap().clone()
    }
}

async fn concat_to_output(request: &TranscodeRequest<'_>) -> MediaResult<(TranscodeOutput, Vec<Vec<u8>>)> {
    let mut contents = Vec::with_capacity(request.inputs.len());
    for input in request.inputs {
        contents.push(tokio::fs::read(input).await?);
    }
    let path = request
        .work_dir
        .join(format!("output.{}", request.preset.extension()));
    tokio::fs::write(&path, contents.concat()).await?;
    Ok((
        TranscodeOutput {
            path,
            duration_seconds: request.inputs.len() as f64,
        },
        contents,
    ))
}

#[async_trait]
impl Transcoder for FakeTranscoder {
    async fn transcode(&self, request: TranscodeRequest<'_>) -> MediaResult<TranscodeOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (output, contents) = concat_to_output(&request).await?;
        *self.last_inputs.lock().unwrap() = contents;
        Ok(output)
    }

    fn check_available(&self) -> MediaResult<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Always fails like a crashed encoder.
#[derive(Debug, Default)]
pub struct FailingTranscoder;

#[async_trait]
impl Transcoder for FailingTranscoder {
    async fn transcode(&self, _request: TranscodeRequest<'_>) -> MediaResult<TranscodeOutput> {
        Err(MediaError::ffmpeg_failed(
            "FFmpeg exited with non-zero status",
            Some("boom: invalid data found when processing input".to_string()),
            Some(1),
        ))
    }

    fn check_available(&self) -> MediaResult<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// Never finishes.
#[derive(Debug, Default)]
pub struct StalledTranscoder;

#[async_trait]
impl Transcoder for StalledTranscoder {
    async fn transcode(&self, _request: TranscodeRequest<'_>) -> MediaResult<TranscodeOutput> {
        std::future::pending().await
    }

    fn check_available(&self) -> MediaResult<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "stalled"
    }
}

/// Blocks inside `transcode` until released.
#[derive(Debug)]
pub struct GatedTranscoder {
    entered: Semaphore,
    gate: Semaphore,
    calls: AtomicUsize,
}

impl GatedTranscoder {
    pub fn new() -> Self {
        Self {
            entered: Semaphore::new(0),
            gate: Semaphore::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    /// Wait until one more call has reached the gate.
    pub async fn wait_entered(&self) {
        if let Ok(permit) = self.entered.acquire().await {
            permit.forget();
        }
    }

    /// Let one parked call finish.
    pub fn release(&self) {
        self.gate.add_permits(1);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcoder for GatedTranscoder {
    async fn transcode(&self, request: TranscodeRequest<'_>) -> MediaResult<TranscodeOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.add_permits(1);
        self.gate
            .acquire()
            .await
            .map_err(|e| MediaError::internal(e.to_string()))?
            .forget();
        let (output, _) = concat_to_output(&request).await?;
        Ok(output)
    }

    fn check_available(&self) -> MediaResult<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "gated"
    }
}

/// Blob store whose backend is always down.
#[derive(Debug, Default)]
pub struct FailingBlobStore;

#[async_trait]
impl BlobStore for FailingBlobStore {
    async fn put(&self, _key: &str, _data: Vec<u8>, _content_type: &str) -> StorageResult<()> {
        Err(StorageError::upload_failed("backend unavailable"))
    }

    async fn get(&self, key: &str) -> StorageResult<Vec<u8>> {
        Err(StorageError::download_failed(format!("{}: backend unavailable", key)))
    }

    async fn list(&self, _prefix: &str) -> StorageResult<Vec<String>> {
        Err(StorageError::ListFailed("backend unavailable".to_string()))
    }

    fn backend_name(&self) -> &'static str {
        "failing"
    }
}
