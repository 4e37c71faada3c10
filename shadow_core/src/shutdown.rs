//! Cooperative shutdown flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable handle used to ask a running simulation to stop.
///
/// Requests are advisory: the master only looks at the flag at window
/// boundaries, so the in-flight window always completes.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    requested: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests shutdown. Safe to call from signal handlers and other threads.
    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_flag() {
        let handle = ShutdownHandle::new();
        let remote = handle.clone();
        assert!(!handle.is_requested());

        std::thread::spawn(move || remote.request()).join().unwrap();
        assert!(handle.is_requested());
    }
}
