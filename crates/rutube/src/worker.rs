use std::{future::Future, pin::Pin, thread::JoinHandle};

use tokio::sync::{mpsc, oneshot};

use crate::error::{RutubeError, RutubeResult};

type Job = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Dedicated thread running a single-threaded tokio runtime.
///
/// Lets a host with its own event loop (a GUI toolkit for example) drive a
/// [`DownloadSession`](crate::DownloadSession) without blocking its own thread:
/// operations are submitted one by one and their result is awaited through a
/// oneshot channel.
pub struct SessionWorker {
    sender: Option<mpsc::UnboundedSender<Job>>,
    thread: Option<JoinHandle<()>>,
}

impl SessionWorker {
    pub fn spawn() -> RutubeResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let (sender, mut receiver) = mpsc::unbounded_channel::<Job>();

        let thread = std::thread::Builder::new()
            .name("rutube-worker".to_string())
            .spawn(move || {
                runtime.block_on(async move {
                    let mut running = Vec::new();
                    while let Some(job) = receiver.recv().await {
                        running.push(tokio::spawn(job));
                        running.retain(|handle| !handle.is_finished());
                    }
                    // queue closed, let submitted operations finish
                    for handle in running {
                        _ = handle.await;
                    }
                });
            })?;

        Ok(Self {
            sender: Some(sender),
            thread: Some(thread),
        })
    }

    /// Hands `future` to the worker thread.
    pub fn submit<F, T>(&self, future: F) -> oneshot::Receiver<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (result_sender, result_receiver) = oneshot::channel();
        let job: Job = Box::pin(async move {
            _ = result_sender.send(future.await);
        });

        if let Some(sender) = &self.sender {
            if sender.send(job).is_err() {
                log::error!("Worker thread is not running, operation dropped.");
            }
        }
        result_receiver
    }

    /// Submits `future` and blocks the calling thread until it completes.
    ///
    /// Must not be called from inside an async runtime.
    pub fn submit_blocking<F, T>(&self, future: F) -> RutubeResult<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        self.submit(future).blocking_recv().map_err(|_| {
            RutubeError::IOError(std::io::Error::other("worker thread stopped"))
        })
    }
}

impl Drop for SessionWorker {
    fn drop(&mut self) {
        // closing the queue stops the worker loop
        drop(self.sender.take());
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("Worker thread panicked.");
            }
        }
    }
}
