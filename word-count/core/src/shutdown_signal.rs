// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

/// Trait for job-wide cancellation.
/// Workers poll it between sections and while scanning; the coordinator polls it while gathering.
pub trait ShutdownSignal: Clone + Send + Sync + 'static {
    fn is_cancelled(&self) -> bool;
}

/// Signal that never fires
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverShutdown;

impl ShutdownSignal for NeverShutdown {
    fn is_cancelled(&self) -> bool {
        false
    }
}
