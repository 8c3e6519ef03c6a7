use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Stop request observed by the receive loop between datagrams.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    requested: Arc<AtomicBool>,
}

impl Shutdown {
    /// Treats SIGINT and SIGTERM as a stop request. Only one handler can be
    /// installed per process.
    pub fn on_signals() -> Result<Self, ctrlc::Error> {
        let shutdown = Shutdown::default();
        let handle = shutdown.clone();
        ctrlc::set_handler(move || handle.trigger())?;
        Ok(shutdown)
    }

    pub fn trigger(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}
