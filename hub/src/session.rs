//! Read and write loops for one live connection.
//!
//! Both loops run on the same task. Whichever finishes first cancels the
//! other; the connection is then closed toward the client and removed from
//! the hub exactly once.

use crate::connection::{ConnectionHandle, ConnectionId};
use crate::manager::Hub;
use crate::outbox::Outbox;
use axum::body::Bytes;
use axum::extract::ws::Message;
use futures::{Sink, SinkExt, Stream, StreamExt};
use log::*;
use std::fmt;
use std::time::Duration;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Upper bound on the courtesy close frame sent while tearing down.
const CLOSE_FRAME_TIMEOUT: Duration = Duration::from_secs(1);

/// Why a connection left the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disconnect {
    ClientClosed,
    ReadError,
    IdleTimeout,
    WriteError,
    WriteTimeout,
    /// The hub removed the connection and closed its outbox.
    Unregistered,
    /// The other loop finished first, or the hub is shutting down.
    Cancelled,
}

impl Disconnect {
    /// Whether the outbound half can still take a close frame.
    fn can_write(&self) -> bool {
        !matches!(self, Disconnect::WriteError | Disconnect::WriteTimeout)
    }
}

impl fmt::Display for Disconnect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Disconnect::ClientClosed => "client closed the connection",
            Disconnect::ReadError => "read failed",
            Disconnect::IdleTimeout => "idle timeout",
            Disconnect::WriteError => "write failed",
            Disconnect::WriteTimeout => "write timed out",
            Disconnect::Unregistered => "unregistered by the hub",
            Disconnect::Cancelled => "cancelled",
        };
        f.write_str(reason)
    }
}

/// Unregisters the connection when the session ends, however it ends.
struct UnregisterOnDrop {
    hub: Hub,
    connection_id: ConnectionId,
}

impl Drop for UnregisterOnDrop {
    fn drop(&mut self) {
        self.hub.unregister(&self.connection_id);
    }
}

pub(crate) struct Session {
    hub: Hub,
    handle: ConnectionHandle,
    shutdown: CancellationToken,
}

impl Session {
    pub(crate) fn new(hub: Hub, handle: ConnectionHandle, shutdown: CancellationToken) -> Self {
        Self {
            hub,
            handle,
            shutdown,
        }
    }

    pub(crate) async fn run<Si, St, E>(self, mut sink: Si, stream: St)
    where
        Si: Sink<Message> + Unpin,
        Si::Error: fmt::Display,
        St: Stream<Item = Result<Message, E>> + Unpin,
        E: fmt::Display,
    {
        let Session {
            hub,
            handle,
            shutdown,
        } = self;
        let config = hub.config().clone();
        let connection_id = handle.id().clone();
        let _unregister = UnregisterOnDrop {
            hub: hub.clone(),
            connection_id: connection_id.clone(),
        };

        debug!(
            "Starting session for connection {connection_id} (user {})",
            handle.user_id()
        );

        let done = shutdown.child_token();
        let reader = async {
            let reason = read_loop(stream, config.idle_timeout, &done, &connection_id).await;
            done.cancel();
            reason
        };
        let writer = async {
            let reason = write_loop(
                &mut sink,
                handle.outbox(),
                config.write_timeout,
                config.ping_interval,
                &done,
            )
            .await;
            done.cancel();
            reason
        };
        let (read_reason, write_reason) = tokio::join!(reader, writer);

        handle.outbox().close();

        if write_reason.can_write() {
            let deadline = config.write_timeout.min(CLOSE_FRAME_TIMEOUT);
            match time::timeout(deadline, sink.send(Message::Close(None))).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => trace!("Close frame for connection {connection_id} not sent: {e}"),
                Err(_) => trace!("Close frame for connection {connection_id} timed out"),
            }
        }

        let reason = if read_reason != Disconnect::Cancelled {
            read_reason
        } else {
            write_reason
        };
        info!(
            "Connection {connection_id} for user {} ended: {reason} ({} event(s) dropped)",
            handle.user_id(),
            handle.outbox().dropped()
        );
    }
}

/// Consumes inbound frames until the client goes away. Application frames are
/// ignored; any frame at all resets the idle clock.
async fn read_loop<St, E>(
    mut stream: St,
    idle_timeout: Duration,
    done: &CancellationToken,
    connection_id: &ConnectionId,
) -> Disconnect
where
    St: Stream<Item = Result<Message, E>> + Unpin,
    E: fmt::Display,
{
    loop {
        let next = tokio::select! {
            biased;
            _ = done.cancelled() => return Disconnect::Cancelled,
            next = time::timeout(idle_timeout, stream.next()) => next,
        };

        match next {
            Err(_) => return Disconnect::IdleTimeout,
            Ok(None) => return Disconnect::ClientClosed,
            Ok(Some(Err(e))) => {
                debug!("Read error on connection {connection_id}: {e}");
                return Disconnect::ReadError;
            }
            Ok(Some(Ok(Message::Close(frame)))) => {
                trace!("Connection {connection_id} sent close: {frame:?}");
                return Disconnect::ClientClosed;
            }
            Ok(Some(Ok(Message::Ping(_) | Message::Pong(_)))) => {}
            Ok(Some(Ok(_))) => {
                trace!("Ignoring inbound application frame on connection {connection_id}");
            }
        }
    }
}

/// Drains the outbox to the client in FIFO order and keeps the connection
/// alive with periodic pings. Each write is bounded by `write_timeout`.
async fn write_loop<Si>(
    sink: &mut Si,
    outbox: &Outbox,
    write_timeout: Duration,
    ping_interval: Duration,
    done: &CancellationToken,
) -> Disconnect
where
    Si: Sink<Message> + Unpin,
    Si::Error: fmt::Display,
{
    let mut keepalive = time::interval_at(Instant::now() + ping_interval, ping_interval);
    keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let message = tokio::select! {
            biased;
            _ = done.cancelled() => return Disconnect::Cancelled,
            frame = outbox.pop() => match frame {
                Some(frame) => Message::Text(frame),
                None => return Disconnect::Unregistered,
            },
            _ = keepalive.tick() => Message::Ping(Bytes::new()),
        };

        tokio::select! {
            biased;
            _ = done.cancelled() => return Disconnect::Cancelled,
            sent = time::timeout(write_timeout, sink.send(message)) => match sent {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    debug!("Write error: {e}");
                    return Disconnect::WriteError;
                }
                Err(_) => return Disconnect::WriteTimeout,
            },
        }
    }
}
