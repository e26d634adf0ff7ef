// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use tokio_util::sync::CancellationToken;
use word_count_core::shutdown_signal::ShutdownSignal;

/// Tokio CancellationToken-based shutdown signal
#[derive(Debug, Clone, Default)]
pub struct ChannelShutdownSignal {
    token: CancellationToken,
}

impl ChannelShutdownSignal {
    pub fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Cancels the job on the first Ctrl-C
    pub fn cancel_on_ctrl_c(&self) {
        let token = self.token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received, cancelling the job");
                token.cancel();
            }
        });
    }
}

impl ShutdownSignal for ChannelShutdownSignal {
    fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}
