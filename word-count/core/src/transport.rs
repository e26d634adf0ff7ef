// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::constants::WorkerId;
use crate::error::TransportError;
use crate::wire::Message;
use async_trait::async_trait;
use bytes::Bytes;

/// Trait for point-to-point message passing between the workers of one job.
/// Different implementations for mpsc channels, sockets, etc.
///
/// Frames between a given pair of workers arrive in the order they were sent.
#[async_trait]
pub trait Transport: Send {
    /// Id of the worker owning this end
    fn worker_id(&self) -> WorkerId;

    fn workers_count(&self) -> usize;

    /// Send one frame to `to`
    async fn send(&mut self, to: WorkerId, frame: Bytes) -> Result<(), TransportError>;

    /// Receive the next frame sent by `from`
    async fn recv(&mut self, from: WorkerId) -> Result<Bytes, TransportError>;
}

pub async fn send_message<T: Transport + ?Sized>(
    transport: &mut T,
    to: WorkerId,
    message: &Message,
) -> Result<(), TransportError> {
    let frame = message.encode().map_err(|source| TransportError::Malformed {
        peer: transport.worker_id(),
        source,
    })?;
    transport.send(to, frame).await
}

pub async fn recv_message<T: Transport + ?Sized>(
    transport: &mut T,
    from: WorkerId,
) -> Result<Message, TransportError> {
    let frame = transport.recv(from).await?;
    Message::decode(&frame).map_err(|source| TransportError::Malformed { peer: from, source })
}

pub fn unexpected(peer: WorkerId, expected: &str, actual: &Message) -> TransportError {
    TransportError::ProtocolViolation {
        peer,
        expected: expected.to_string(),
        actual: actual.kind_name().to_string(),
    }
}
