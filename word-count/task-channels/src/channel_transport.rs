// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use tokio::sync::mpsc;
use word_count_core::constants::{WorkerId, COORDINATOR_ID};
use word_count_core::error::TransportError;
use word_count_core::transport::Transport;

/// One end of an in-process star of bounded mpsc channels.
/// Only the coordinator and a worker are connected; workers never talk to each other.
#[derive(Debug)]
pub struct ChannelTransport {
    worker_id: WorkerId,
    workers_count: usize,
    senders: HashMap<WorkerId, mpsc::Sender<Bytes>>,
    receivers: HashMap<WorkerId, mpsc::Receiver<Bytes>>,
}

impl ChannelTransport {
    fn new(worker_id: WorkerId, workers_count: usize) -> Self {
        Self {
            worker_id,
            workers_count,
            senders: HashMap::new(),
            receivers: HashMap::new(),
        }
    }
}

/// Builds the transports of a job, indexed by worker id.
/// Each direction of each link buffers up to `capacity` frames.
pub fn channel_star(workers_count: usize, capacity: usize) -> Vec<ChannelTransport> {
    let mut transports: Vec<ChannelTransport> = (0..workers_count)
        .map(|worker| ChannelTransport::new(worker, workers_count))
        .collect();

    for worker in (0..workers_count).filter(|&worker| worker != COORDINATOR_ID) {
        let (to_worker_tx, to_worker_rx) = mpsc::channel(capacity);
        let (to_coordinator_tx, to_coordinator_rx) = mpsc::channel(capacity);

        let coordinator = &mut transports[COORDINATOR_ID];
        coordinator.senders.insert(worker, to_worker_tx);
        coordinator.receivers.insert(worker, to_coordinator_rx);

        let end = &mut transports[worker];
        end.senders.insert(COORDINATOR_ID, to_coordinator_tx);
        end.receivers.insert(COORDINATOR_ID, to_worker_rx);
    }

    transports
}

#[async_trait]
impl Transport for ChannelTransport {
    fn worker_id(&self) -> WorkerId {
        self.worker_id
    }

    fn workers_count(&self) -> usize {
        self.workers_count
    }

    async fn send(&mut self, to: WorkerId, frame: Bytes) -> Result<(), TransportError> {
        let sender = self.senders.get(&to).ok_or(TransportError::NoRoute {
            from: self.worker_id,
            to,
        })?;

        sender
            .send(frame)
            .await
            .map_err(|_| TransportError::Disconnected { peer: to })
    }

    async fn recv(&mut self, from: WorkerId) -> Result<Bytes, TransportError> {
        let worker_id = self.worker_id;
        let receiver = self
            .receivers
            .get_mut(&from)
            .ok_or(TransportError::NoRoute {
                from: worker_id,
                to: from,
            })?;

        receiver
            .recv()
            .await
            .ok_or(TransportError::Disconnected { peer: from })
    }
}
