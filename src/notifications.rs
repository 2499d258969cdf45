//! Short-lived user-facing notifications ("toasts"). One `Notifier` lives
//! for the whole process; `main` starts its sweeper and stops it on
//! shutdown, and everything else gets it by reference through `AppState`.

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::{Duration, Instant},
};
use tokio::task::JoinHandle;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

#[derive(Clone, Debug)]
pub struct Toast {
    pub id: Uuid,
    pub kind: ToastKind,
    pub message: String,
    pub expires_at: Instant,
}

pub struct Notifier {
    toasts: Arc<Mutex<Vec<Toast>>>,
    ttl: Duration,
    sweep_interval: Duration,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

fn sweep(toasts: &Mutex<Vec<Toast>>, now: Instant) -> usize {
    let mut toasts = lock(toasts);
    let before = toasts.len();
    toasts.retain(|t| t.expires_at > now);
    before - toasts.len()
}

impl Notifier {
    pub fn new(ttl: Duration, sweep_interval: Duration) -> Self {
        Self {
            toasts: Arc::new(Mutex::new(Vec::new())),
            ttl,
            sweep_interval,
            sweeper: Mutex::new(None),
        }
    }

    /// Spawn the background sweeper. Calling this twice is a no-op. Must be
    /// called from within a tokio runtime.
    pub fn start(&self) {
        let mut sweeper = lock(&self.sweeper);
        if sweeper.is_some() {
            return;
        }
        let toasts = Arc::clone(&self.toasts);
        let period = self.sweep_interval;
        *sweeper = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let removed = sweep(&toasts, Instant::now());
                if removed > 0 {
                    tracing::trace!(removed, "expired toasts swept");
                }
            }
        }));
    }

    pub fn stop(&self) {
        if let Some(handle) = lock(&self.sweeper).take() {
            handle.abort();
        }
    }

    pub fn push(&self, kind: ToastKind, message: impl Into<String>) -> Uuid {
        let toast = Toast {
            id: Uuid::new_v4(),
            kind,
            message: message.into(),
            expires_at: Instant::now() + self.ttl,
        };
        let id = toast.id;
        lock(&self.toasts).push(toast);
        id
    }

    pub fn success(&self, message: impl Into<String>) -> Uuid {
        self.push(ToastKind::Success, message)
    }

    pub fn error(&self, message: impl Into<String>) -> Uuid {
        self.push(ToastKind::Error, message)
    }

    pub fn info(&self, message: impl Into<String>) -> Uuid {
        self.push(ToastKind::Info, message)
    }

    /// Unexpired toasts, oldest first. Doesn't rely on the sweeper having
    /// run.
    pub fn active(&self) -> Vec<Toast> {
        self.active_at(Instant::now())
    }

    pub fn active_at(&self, now: Instant) -> Vec<Toast> {
        lock(&self.toasts)
            .iter()
            .filter(|t| t.expires_at > now)
            .cloned()
            .collect()
    }

    pub fn dismiss(&self, id: Uuid) {
        lock(&self.toasts).retain(|t| t.id != id);
    }
}

impl Drop for Notifier {
    fn drop(&mut self) {
        self.stop();
    }
}
