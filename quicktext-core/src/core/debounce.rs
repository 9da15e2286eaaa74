//! Trailing-edge debouncing of save requests.
//!
//! Each [`Debouncer::schedule`] replaces the pending value and restarts a
//! single timer; only the value present when the timer fires reaches the
//! sink. The sink runs on the blocking pool since it writes to disk.
//!
//! Every value carries a generation number. Sink calls are serialized and a
//! value older than the last one delivered is dropped, so a save that was
//! already running when a newer value was flushed can never land last.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::{QuicktextError, Result};

type Sink<T> = Arc<dyn Fn(T) + Send + Sync>;

pub struct Debouncer<T: Send + 'static> {
    handle: Handle,
    delay: Duration,
    generation: u64,
    pending: Arc<Mutex<Option<(u64, T)>>>,
    delivered: Arc<Mutex<u64>>,
    timer: Option<JoinHandle<()>>,
    sink: Sink<T>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Creates a debouncer bound to the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`QuicktextError::Runtime`] when called outside a runtime.
    pub fn new<F>(delay: Duration, sink: F) -> Result<Self>
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        let handle = Handle::try_current().map_err(|e| QuicktextError::Runtime(e.to_string()))?;
        Ok(Self::with_handle(handle, delay, sink))
    }

    pub fn with_handle<F>(handle: Handle, delay: Duration, sink: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        Self {
            handle,
            delay,
            generation: 0,
            pending: Arc::new(Mutex::new(None)),
            delivered: Arc::new(Mutex::new(0)),
            timer: None,
            sink: Arc::new(sink),
        }
    }

    /// True while a value is waiting for its timer.
    pub fn is_pending(&self) -> bool {
        self.pending.lock().map(|p| p.is_some()).unwrap_or(false)
    }

    /// Replaces the pending value and restarts the timer.
    pub fn schedule(&mut self, value: T) {
        let generation = self.next_generation();
        if let Ok(mut pending) = self.pending.lock() {
            *pending = Some((generation, value));
        }
        self.cancel_timer();

        let pending = Arc::clone(&self.pending);
        let delivered = Arc::clone(&self.delivered);
        let sink = Arc::clone(&self.sink);
        let delay = self.delay;
        self.timer = Some(self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            let next = pending.lock().ok().and_then(|mut p| p.take());
            if let Some((generation, value)) = next {
                let save = move || deliver(&sink, &delivered, generation, value);
                if let Err(e) = tokio::task::spawn_blocking(save).await {
                    log::error!("debounced save task failed: {e}");
                }
            }
        }));
    }

    /// Cancels the timer and runs the sink now on the calling thread, if anything is pending.
    ///
    /// Waits for a sink call that is already running to finish first.
    pub fn flush(&mut self) {
        self.cancel_timer();
        let next = self.pending.lock().ok().and_then(|mut p| p.take());
        if let Some((generation, value)) = next {
            deliver(&self.sink, &self.delivered, generation, value);
        }
    }

    /// Discards anything pending and runs the sink now with `value`.
    ///
    /// Waits for a sink call that is already running to finish first.
    pub fn flush_with(&mut self, value: T) {
        self.cancel_timer();
        if let Ok(mut pending) = self.pending.lock() {
            *pending = None;
        }
        let generation = self.next_generation();
        deliver(&self.sink, &self.delivered, generation, value);
    }

    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

/// Runs `sink` unless a newer generation has already been delivered.
fn deliver<T>(sink: &Sink<T>, delivered: &Mutex<u64>, generation: u64, value: T) {
    let mut last = delivered.lock().unwrap_or_else(PoisonError::into_inner);
    if generation <= *last {
        log::debug!("dropping stale save (generation {generation}, delivered {})", *last);
        return;
    }
    sink(value);
    *last = generation;
}

impl<T: Send + 'static> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}
