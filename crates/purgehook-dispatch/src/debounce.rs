use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

/// The single timer a gate may have outstanding.
struct PendingDispatch {
    generation: u64,
    handle: JoinHandle<()>,
}

/// Timer slot plus the counter that numbers every schedule call. Both live
/// under one lock so the newest generation is always the one installed.
#[derive(Default)]
struct TimerSlot {
    last_generation: u64,
    pending: Option<PendingDispatch>,
}

/// Collapses bursts of signals into one deferred action that runs with the
/// most recent signal once the window has passed without a new one.
pub struct DebounceGate {
    window: Duration,
    slot: Arc<Mutex<TimerSlot>>,
}

impl DebounceGate {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            slot: Arc::new(Mutex::new(TimerSlot::default())),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Replace any pending timer with a new one that calls `fire(value)`
    /// after the window.
    ///
    /// Must be called from within a tokio runtime. Once `fire` has started it
    /// is no longer pending and later calls cannot cancel it.
    pub fn schedule<T, F, Fut>(&self, value: T, fire: F)
    where
        T: Send + 'static,
        F: FnOnce(T) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let window = self.window;
        let timer_slot = Arc::clone(&self.slot);

        let mut slot = lock(&self.slot);
        slot.last_generation += 1;
        let generation = slot.last_generation;
        if let Some(previous) = slot.pending.take() {
            previous.handle.abort();
            debug!(
                superseded = previous.generation,
                generation, "Pending dispatch superseded"
            );
        }

        let handle = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            {
                let mut slot = lock(&timer_slot);
                match slot.pending.as_ref() {
                    Some(current) if current.generation == generation => {
                        slot.pending = None;
                    }
                    _ => return,
                }
            }
            fire(value).await;
        });

        slot.pending = Some(PendingDispatch { generation, handle });
    }

    pub fn has_pending(&self) -> bool {
        lock(&self.slot).pending.is_some()
    }

    #[cfg(test)]
    fn pending_generation(&self) -> Option<u64> {
        lock(&self.slot).pending.as_ref().map(|p| p.generation)
    }

    /// Drop the pending timer, if any. Returns whether one was cancelled.
    pub fn cancel(&self) -> bool {
        match lock(&self.slot).pending.take() {
            Some(previous) => {
                previous.handle.abort();
                true
            }
            None => false,
        }
    }
}

fn lock(slot: &Mutex<TimerSlot>) -> MutexGuard<'_, TimerSlot> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
