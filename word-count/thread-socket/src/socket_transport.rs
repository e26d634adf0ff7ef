// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use async_trait::async_trait;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::codec::{Framed, LengthDelimitedCodec};
use tracing::{debug, info, warn};
use word_count_core::constants::{WorkerId, COORDINATOR_ID};
use word_count_core::error::TransportError;
use word_count_core::transport::{send_message, unexpected, Transport};
use word_count_core::wire::Message;

/// How long the coordinator waits for each worker to connect
pub const ACCEPT_TIMEOUT: Duration = Duration::from_secs(30);

const CONNECT_ATTEMPTS: u32 = 20;
const CONNECT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// A word block of a single bucket can get large on big inputs
const MAX_FRAME_LENGTH: usize = 256 * 1024 * 1024;

type Connection = Framed<TcpStream, LengthDelimitedCodec>;

fn framed(stream: TcpStream) -> Connection {
    let codec = LengthDelimitedCodec::builder()
        .max_frame_length(MAX_FRAME_LENGTH)
        .new_codec();
    Framed::new(stream, codec)
}

fn io_error(peer: WorkerId) -> impl FnOnce(io::Error) -> TransportError {
    move |source| TransportError::Io { peer, source }
}

/// One end of a star of TCP connections centered on the coordinator
pub struct SocketTransport {
    worker_id: WorkerId,
    workers_count: usize,
    connections: HashMap<WorkerId, Connection>,
}

#[async_trait]
impl Transport for SocketTransport {
    fn worker_id(&self) -> WorkerId {
        self.worker_id
    }

    fn workers_count(&self) -> usize {
        self.workers_count
    }

    async fn send(&mut self, to: WorkerId, frame: Bytes) -> Result<(), TransportError> {
        let connection = self.connections.get_mut(&to).ok_or(TransportError::NoRoute {
            from: self.worker_id,
            to,
        })?;

        connection.send(frame).await.map_err(io_error(to))
    }

    async fn recv(&mut self, from: WorkerId) -> Result<Bytes, TransportError> {
        let worker_id = self.worker_id;
        let connection = self
            .connections
            .get_mut(&from)
            .ok_or(TransportError::NoRoute {
                from: worker_id,
                to: from,
            })?;

        match connection.next().await {
            Some(Ok(frame)) => Ok(frame.freeze()),
            Some(Err(source)) => Err(TransportError::Io { peer: from, source }),
            None => Err(TransportError::Disconnected { peer: from }),
        }
    }
}

/// Listening socket of the coordinator, bound before any worker starts
pub struct CoordinatorListener {
    listener: TcpListener,
    workers_count: usize,
}

impl CoordinatorListener {
    /// Binds an OS-assigned port on the loopback interface
    pub async fn bind(workers_count: usize) -> io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        Ok(Self {
            listener,
            workers_count,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Waits until every worker has connected and introduced itself
    pub async fn accept_workers(self) -> Result<SocketTransport, TransportError> {
        let workers_count = self.workers_count;
        let mut connections = HashMap::new();
        let mut incoming = TcpListenerStream::new(self.listener);

        while connections.len() + 1 < workers_count {
            // The next worker is unknown until it says hello
            let pending = (1..workers_count)
                .find(|worker| !connections.contains_key(worker))
                .unwrap_or(COORDINATOR_ID);

            let stream = match tokio::time::timeout(ACCEPT_TIMEOUT, incoming.next()).await {
                Ok(Some(stream)) => stream.map_err(io_error(pending))?,
                Ok(None) => return Err(TransportError::Disconnected { peer: pending }),
                Err(_) => {
                    warn!(connected = connections.len(), "workers did not connect in time");
                    return Err(TransportError::Io {
                        peer: pending,
                        source: io::Error::new(
                            io::ErrorKind::TimedOut,
                            "timed out waiting for workers to connect",
                        ),
                    });
                }
            };

            stream.set_nodelay(true).map_err(io_error(pending))?;
            let mut connection = framed(stream);
            let worker = read_hello(&mut connection, pending).await?;

            if worker == COORDINATOR_ID
                || worker >= workers_count
                || connections.contains_key(&worker)
            {
                return Err(TransportError::ProtocolViolation {
                    peer: worker,
                    expected: format!("Hello from an unconnected worker below {workers_count}"),
                    actual: format!("Hello from worker {worker}"),
                });
            }

            debug!(worker, "worker connected");
            connections.insert(worker, connection);
        }

        info!(workers = workers_count, "all workers connected");

        Ok(SocketTransport {
            worker_id: COORDINATOR_ID,
            workers_count,
            connections,
        })
    }
}

async fn read_hello(
    connection: &mut Connection,
    pending: WorkerId,
) -> Result<WorkerId, TransportError> {
    let frame = match tokio::time::timeout(ACCEPT_TIMEOUT, connection.next()).await {
        Ok(Some(frame)) => frame.map_err(io_error(pending))?,
        Ok(None) => return Err(TransportError::Disconnected { peer: pending }),
        Err(_) => {
            return Err(TransportError::Io {
                peer: pending,
                source: io::Error::new(io::ErrorKind::TimedOut, "no hello received"),
            })
        }
    };

    match Message::decode(&frame) {
        Ok(Message::Hello { worker_id }) => Ok(worker_id as WorkerId),
        Ok(other) => Err(unexpected(pending, "Hello", &other)),
        Err(source) => Err(TransportError::Malformed {
            peer: pending,
            source,
        }),
    }
}

/// Connects worker `worker_id` to the coordinator at `addr`, retrying while
/// the coordinator is not listening yet, and introduces it.
pub async fn connect_worker(
    worker_id: WorkerId,
    workers_count: usize,
    addr: SocketAddr,
) -> Result<SocketTransport, TransportError> {
    let mut attempts = 0;
    let stream = loop {
        match TcpStream::connect(addr).await {
            Ok(stream) => break stream,
            Err(source) => {
                attempts += 1;
                if attempts >= CONNECT_ATTEMPTS {
                    return Err(TransportError::Io {
                        peer: COORDINATOR_ID,
                        source,
                    });
                }
                tokio::time::sleep(CONNECT_RETRY_DELAY).await;
            }
        }
    };

    stream.set_nodelay(true).map_err(io_error(COORDINATOR_ID))?;

    let mut transport = SocketTransport {
        worker_id,
        workers_count,
        connections: HashMap::from([(COORDINATOR_ID, framed(stream))]),
    };

    let hello = Message::hello(worker_id).map_err(|source| TransportError::Malformed {
        peer: worker_id,
        source,
    })?;
    send_message(&mut transport, COORDINATOR_ID, &hello).await?;

    debug!(worker = worker_id, %addr, "connected to the coordinator");
    Ok(transport)
}
