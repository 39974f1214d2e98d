//! Typewriter notifications: spoken text is revealed on screen character by
//! character, paced to finish ahead of the audio.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

mod sink;

pub use sink::{AlertSink, NotifySend};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification tool failed: {0}")]
    Tool(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience result type used throughout this crate.
pub type Result<T> = std::result::Result<T, NotifyError>;

/// A request to reveal `text` over roughly `duration` seconds of speech.
#[derive(Clone, Debug, PartialEq)]
pub struct Notification {
    pub text: String,
    pub duration: f64,
}

enum NotifyCommand {
    Show(Notification),
    Stop,
}

/// Queues reveals from any thread; cheap to clone.
#[derive(Clone)]
pub struct NotifyHandle {
    tx: mpsc::UnboundedSender<NotifyCommand>,
}

impl NotifyHandle {
    /// Enqueue a reveal and return immediately.
    pub fn notify(&self, text: impl Into<String>, duration: f64) {
        let _ = self.tx.send(NotifyCommand::Show(Notification {
            text: text.into(),
            duration,
        }));
    }
}

/// Owns the background worker that drains reveal requests in order.
pub struct Notifier {
    handle: NotifyHandle,
    worker: JoinHandle<()>,
}

impl Notifier {
    /// Spawn the reveal worker on top of `sink`.
    pub fn spawn<S: AlertSink + 'static>(sink: S) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_worker(sink, rx));
        Self {
            handle: NotifyHandle { tx },
            worker,
        }
    }

    pub fn handle(&self) -> NotifyHandle {
        self.handle.clone()
    }

    /// Enqueue a reveal and return immediately.
    pub fn notify(&self, text: impl Into<String>, duration: f64) {
        self.handle.notify(text, duration);
    }

    /// Stop accepting work and wait for the worker to drain what is queued.
    pub async fn shutdown(self) {
        let _ = self.handle.tx.send(NotifyCommand::Stop);
        let _ = self.worker.await;
    }
}

async fn run_worker<S: AlertSink>(sink: S, mut rx: mpsc::UnboundedReceiver<NotifyCommand>) {
    while let Some(command) = rx.recv().await {
        match command {
            NotifyCommand::Stop => break,
            NotifyCommand::Show(notification) => reveal(&sink, &notification).await,
        }
    }
}

async fn reveal<S: AlertSink>(sink: &S, notification: &Notification) {
    let id = match sink.create("").await {
        Ok(id) => id,
        Err(e) => {
            warn!(?e, "alert creation failed, dropping notification");
            return;
        }
    };

    let chars: Vec<char> = notification.text.chars().collect();
    let interval = if chars.is_empty() {
        Duration::ZERO
    } else {
        Duration::from_secs_f64(notification.duration / (chars.len() as f64 * 3.0))
    };

    for shown in 0..=chars.len() {
        let prefix: String = chars[..shown].iter().collect();
        if let Err(e) = sink.update(&id, &prefix).await {
            warn!(?e, shown, "alert update failed, skipping this step");
        }
        tokio::time::sleep(interval).await;
    }
}
