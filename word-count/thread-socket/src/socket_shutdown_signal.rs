// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tracing::warn;
use word_count_core::shutdown_signal::ShutdownSignal;

/// Thread-based shutdown signal using atomic flag
#[derive(Debug, Clone, Default)]
pub struct SocketShutdownSignal {
    flag: Arc<AtomicBool>,
}

impl SocketShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Raises the flag on Ctrl-C. Only one handler can be installed per process.
    pub fn install_ctrlc_handler(&self) -> Result<(), ctrlc::Error> {
        let signal = self.clone();
        ctrlc::set_handler(move || {
            warn!("interrupt received, cancelling the job");
            signal.shutdown();
        })
    }
}

impl ShutdownSignal for SocketShutdownSignal {
    fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
