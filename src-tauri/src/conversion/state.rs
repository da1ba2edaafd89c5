use crate::models::GhostscriptBinary;
use crate::process_manager::CancelToken;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared between commands and the worker thread. Only one run may be active.
#[derive(Default)]
pub struct ConversionState {
    running: AtomicBool,
    cancel: Mutex<Option<CancelToken>>,
    binary: RwLock<Option<GhostscriptBinary>>,
}

/// Marks the run finished when dropped, including on worker panic
pub struct RunGuard {
    state: Arc<ConversionState>,
    cancel: CancelToken,
}

impl RunGuard {
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        *self.state.cancel.lock() = None;
        self.state.running.store(false, Ordering::SeqCst);
    }
}

impl ConversionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the single run slot. `None` when a run is already active.
    pub fn try_begin(self: &Arc<Self>) -> Option<RunGuard> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return None;
        }

        let cancel = CancelToken::new();
        *self.cancel.lock() = Some(cancel.clone());
        Some(RunGuard {
            state: Arc::clone(self),
            cancel,
        })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Returns whether there was an active run to cancel
    pub fn cancel(&self) -> bool {
        match self.cancel.lock().as_ref() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn set_binary(&self, binary: GhostscriptBinary) {
        *self.binary.write() = Some(binary);
    }

    pub fn binary(&self) -> Option<GhostscriptBinary> {
        self.binary.read().clone()
    }
}
