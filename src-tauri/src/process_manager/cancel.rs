use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const SLEEP_SLICE: Duration = Duration::from_millis(50);

/// Shared flag checked by long-running loops and child process polling
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Sleeps for `duration` in short slices. Returns false if cancelled meanwhile.
    pub fn sleep(&self, duration: Duration) -> bool {
        let started = Instant::now();
        while !self.is_cancelled() {
            let elapsed = started.elapsed();
            if elapsed >= duration {
                return true;
            }
            thread::sleep(SLEEP_SLICE.min(duration - elapsed));
        }
        false
    }
}
