use std::{
    num::NonZeroUsize,
    path::Path,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
};

use bytes::Bytes;
use futures::future::try_join_all;
use reqwest::Client;
use tokio::{
    fs::File,
    io::{AsyncWrite, AsyncWriteExt},
};

use crate::{
    error::{RutubeError, RutubeResult},
    fetch::fetch_bytes,
    retry::RetryConfig,
    segment::{Segment, SegmentList},
};

/// Called with `(completed, total)` segment counts.
pub type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Cooperative cancellation flag, settable from any thread.
#[derive(Debug, Clone, Default)]
pub struct InterruptHandle(Arc<AtomicBool>);

impl InterruptHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interrupt(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_interrupted(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Segment counters of the running download.
#[derive(Debug, Default)]
pub struct Progress {
    completed: AtomicUsize,
    total: AtomicUsize,
}

impl Progress {
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }

    fn reset(&self, total: usize) {
        self.completed.store(0, Ordering::Relaxed);
        self.total.store(total, Ordering::Relaxed);
    }

    fn finish_segment(&self) -> usize {
        self.completed.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// Number of completed segments between two progress notifications.
pub fn refresh_rate(total: usize, batch_size: usize) -> usize {
    let batches = total.div_ceil(batch_size.max(1)).max(1);
    (total / batches).max(1)
}

fn should_report(completed: usize, total: usize, refresh_rate: usize) -> bool {
    completed % refresh_rate == 0 || completed == total
}

/// Downloads segments batch by batch and writes them in playlist order.
///
/// Segments of one batch are fetched concurrently on the current task. The next
/// batch starts only after the previous one has been written.
pub struct SegmentDownloader {
    client: Client,
    batch_size: NonZeroUsize,
    retry: RetryConfig,
    interrupt: InterruptHandle,
    progress: Arc<Progress>,
    on_progress: Option<ProgressCallback>,
}

impl SegmentDownloader {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            batch_size: NonZeroUsize::new(20).unwrap(),
            retry: RetryConfig::default(),
            interrupt: InterruptHandle::default(),
            progress: Arc::new(Progress::default()),
            on_progress: None,
        }
    }

    pub fn batch_size(mut self, batch_size: NonZeroUsize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn interrupt(mut self, interrupt: InterruptHandle) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub fn progress(mut self, progress: Arc<Progress>) -> Self {
        self.progress = progress;
        self
    }

    pub fn on_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }

    /// Writes all segments into a newly created file at `path`.
    ///
    /// On failure the partially written file is left on disk.
    pub async fn download_to_file<P>(&self, segments: &SegmentList, path: P) -> RutubeResult<()>
    where
        P: AsRef<Path>,
    {
        let mut file = File::create(path.as_ref()).await?;
        self.download_all(segments, &mut file).await?;
        file.shutdown().await?;
        Ok(())
    }

    pub async fn download_all<W>(&self, segments: &SegmentList, writer: &mut W) -> RutubeResult<()>
    where
        W: AsyncWrite + Unpin,
    {
        let total = segments.len();
        let batch_size = self.batch_size.get();
        let refresh_rate = refresh_rate(total, batch_size);
        self.progress.reset(total);

        tracing::info!(
            "Start downloading {total} segments with {} at a time.",
            batch_size.min(total)
        );

        for (index, batch) in segments.batches(batch_size).enumerate() {
            if self.interrupt.is_interrupted() {
                tracing::info!("Download interrupted before batch {}.", index + 1);
                return Err(RutubeError::DownloadInterrupted);
            }

            let payloads = try_join_all(
                batch
                    .iter()
                    .map(|segment| self.fetch_segment(segment, refresh_rate)),
            )
            .await?;

            if self.interrupt.is_interrupted() {
                tracing::info!("Download interrupted, batch {} discarded.", index + 1);
                return Err(RutubeError::DownloadInterrupted);
            }

            for payload in payloads {
                writer.write_all(&payload).await?;
            }
            tracing::debug!(
                "Batch {} written. ({} / {total})",
                index + 1,
                self.progress.completed()
            );
        }

        writer.flush().await?;
        Ok(())
    }

    async fn fetch_segment(&self, segment: &Segment, refresh_rate: usize) -> RutubeResult<Bytes> {
        let bytes = self
            .retry
            .run(
                || fetch_bytes(&self.client, segment.url.clone()),
                || {
                    RutubeError::SegmentDownload(format!(
                        "Failed to download segment {} ({})",
                        segment.sequence, segment.url
                    ))
                },
            )
            .await?;

        let completed = self.progress.finish_segment();
        let total = self.progress.total();
        if let Some(on_progress) = &self.on_progress {
            if should_report(completed, total, refresh_rate) {
                on_progress(completed, total);
            }
        }

        Ok(bytes)
    }
}
