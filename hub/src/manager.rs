use crate::connection::{
    ConnectionHandle, ConnectionId, ConnectionInfo, ConnectionRegistry, ConnectionStats, UserId,
};
use crate::message::Event;
use crate::session::Session;
use axum::extract::ws::Message;
use futures::{Sink, Stream};
use log::*;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Tunables for the hub and every connection it supervises.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Maximum frames queued per connection before the oldest is evicted.
    pub outbox_capacity: usize,
    /// Maximum broadcasts waiting on the coordinator before new ones are rejected.
    pub submission_capacity: usize,
    /// Upper bound on a single frame write.
    pub write_timeout: Duration,
    /// A connection that sends nothing for this long is considered gone.
    pub idle_timeout: Duration,
    pub ping_interval: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            outbox_capacity: 256,
            submission_capacity: 4096,
            write_timeout: Duration::from_secs(10),
            idle_timeout: Duration::from_secs(60),
            ping_interval: Duration::from_secs(25),
        }
    }
}

/// Counters reported by the coordinator. Cumulative since start except `connections`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HubStats {
    pub connections: usize,
    pub registered: u64,
    pub unregistered: u64,
    pub broadcasts: u64,
    pub deliveries: u64,
    pub evictions: u64,
    pub malformed: u64,
    pub rejected: u64,
}

enum Command {
    Register {
        connection_id: ConnectionId,
        user_id: UserId,
        outbox: Arc<crate::outbox::Outbox>,
    },
    Unregister {
        connection_id: ConnectionId,
    },
    Broadcast {
        event: Event,
    },
    Stats {
        reply: oneshot::Sender<HubStats>,
    },
    Inspect {
        connection_id: ConnectionId,
        reply: oneshot::Sender<Option<ConnectionStats>>,
    },
}

/// Bookkeeping shared between submitters and the coordinator.
#[derive(Default)]
struct Backlog {
    pending_broadcasts: AtomicUsize,
    rejected: AtomicU64,
}

struct Inner {
    commands: mpsc::UnboundedSender<Command>,
    backlog: Arc<Backlog>,
    config: HubConfig,
    shutdown: CancellationToken,
    tasks: TaskTracker,
}

/// Handle to the real-time broadcast hub. Cheap to clone; every clone talks to
/// the same coordinator.
///
/// All registry changes and broadcasts are messages into one coordinator
/// task, which gives them a single total order: a connection receives exactly
/// the broadcasts processed while it was registered. None of the methods wait
/// on the coordinator or on any connection.
#[derive(Clone)]
pub struct Hub {
    inner: Arc<Inner>,
}

impl fmt::Debug for Hub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hub")
            .field("config", &self.inner.config)
            .field("shutting_down", &self.inner.shutdown.is_cancelled())
            .finish()
    }
}

impl Hub {
    /// Spawns the coordinator on the current Tokio runtime.
    pub fn start(config: HubConfig) -> Self {
        // Zero capacities behave as one, matching `Outbox::new`.
        let config = HubConfig {
            outbox_capacity: config.outbox_capacity.max(1),
            submission_capacity: config.submission_capacity.max(1),
            ..config
        };
        let (commands, receiver) = mpsc::unbounded_channel();
        let backlog = Arc::new(Backlog::default());
        let shutdown = CancellationToken::new();
        let tasks = TaskTracker::new();

        let coordinator = Coordinator {
            registry: ConnectionRegistry::new(),
            commands: receiver,
            backlog: backlog.clone(),
            shutdown: shutdown.clone(),
            stats: HubStats::default(),
        };
        tasks.spawn(coordinator.run());

        info!(
            "Hub started (outbox capacity {}, submission capacity {})",
            config.outbox_capacity, config.submission_capacity
        );

        Self {
            inner: Arc::new(Inner {
                commands,
                backlog,
                config,
                shutdown,
                tasks,
            }),
        }
    }

    pub fn config(&self) -> &HubConfig {
        &self.inner.config
    }

    /// Admits a connection without any I/O loops and returns the handle to
    /// its outbox. The connection takes part in every broadcast submitted
    /// after this returns.
    pub fn attach(&self, user_id: UserId) -> ConnectionHandle {
        if user_id.is_empty() {
            warn!("Registering a connection with an empty user id");
        }

        let handle = ConnectionHandle::new(user_id, self.inner.config.outbox_capacity);
        let submitted = self.submit(Command::Register {
            connection_id: handle.id().clone(),
            user_id: handle.user_id().to_string(),
            outbox: handle.outbox().clone(),
        });
        if !submitted {
            // Nobody will ever fill or unregister it.
            handle.outbox().close();
        }

        handle
    }

    /// Admits a live duplex channel: attaches it and spawns its read and
    /// write loops. The loops unregister the connection exactly once when
    /// either side fails, the client closes or the hub shuts down.
    pub fn register<Si, St, E>(&self, user_id: UserId, sink: Si, stream: St) -> ConnectionId
    where
        Si: Sink<Message> + Unpin + Send + 'static,
        Si::Error: fmt::Display,
        St: Stream<Item = Result<Message, E>> + Unpin + Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        let handle = self.attach(user_id);
        let connection_id = handle.id().clone();

        let session = Session::new(self.clone(), handle, self.inner.shutdown.child_token());
        self.inner.tasks.spawn(session.run(sink, stream));

        connection_id
    }

    /// Idempotent: unknown or already removed ids are ignored.
    pub fn unregister(&self, connection_id: &ConnectionId) {
        self.submit(Command::Unregister {
            connection_id: connection_id.clone(),
        });
    }

    /// Queues `event` for every connection registered when the coordinator
    /// processes it. Rejected with a warning if the coordinator already has
    /// `submission_capacity` broadcasts waiting.
    pub fn broadcast(&self, event: Event) {
        let backlog = &self.inner.backlog;
        let pending = backlog.pending_broadcasts.fetch_add(1, Ordering::AcqRel);

        if pending >= self.inner.config.submission_capacity {
            backlog.pending_broadcasts.fetch_sub(1, Ordering::AcqRel);
            let rejected = backlog.rejected.fetch_add(1, Ordering::Relaxed) + 1;
            warn!(
                "Hub overloaded with {pending} pending broadcasts; rejected {} event for board {} ({rejected} rejected so far)",
                event.kind, event.board_id
            );
            return;
        }

        if !self.submit(Command::Broadcast { event }) {
            backlog.pending_broadcasts.fetch_sub(1, Ordering::AcqRel);
        }
    }

    /// Snapshot of the hub counters, ordered after every earlier submission.
    /// `None` once the coordinator has stopped.
    pub async fn stats(&self) -> Option<HubStats> {
        let (reply, response) = oneshot::channel();
        if !self.submit(Command::Stats { reply }) {
            return None;
        }
        response.await.ok()
    }

    /// Counters for one connection, or `None` if it is not registered.
    pub async fn connection_stats(&self, connection_id: &ConnectionId) -> Option<ConnectionStats> {
        let (reply, response) = oneshot::channel();
        let submitted = self.submit(Command::Inspect {
            connection_id: connection_id.clone(),
            reply,
        });
        if !submitted {
            return None;
        }
        response.await.ok().flatten()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }

    /// Cancels the coordinator and every connection, then waits up to
    /// `deadline` for all of them to finish their cleanup. Returns `false`
    /// if the deadline passed first.
    pub async fn shutdown(&self, deadline: Duration) -> bool {
        info!("Shutting down hub");
        self.inner.shutdown.cancel();
        self.inner.tasks.close();

        match tokio::time::timeout(deadline, self.inner.tasks.wait()).await {
            Ok(()) => {
                info!("Hub shut down cleanly");
                true
            }
            Err(_) => {
                warn!(
                    "Hub shutdown deadline of {deadline:?} passed with {} task(s) still running",
                    self.inner.tasks.len()
                );
                false
            }
        }
    }

    fn submit(&self, command: Command) -> bool {
        if self.inner.commands.send(command).is_err() {
            debug!("Hub coordinator has stopped; dropping command");
            return false;
        }
        true
    }
}

/// Sole owner of the registry. Processes commands one at a time.
struct Coordinator {
    registry: ConnectionRegistry,
    commands: mpsc::UnboundedReceiver<Command>,
    backlog: Arc<Backlog>,
    shutdown: CancellationToken,
    stats: HubStats,
}

impl Coordinator {
    async fn run(mut self) {
        debug!("Hub coordinator running");

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                command = self.commands.recv() => match command {
                    Some(command) => self.handle(command),
                    // Every Hub handle is gone.
                    None => break,
                },
            }
        }

        let closed = self.registry.close_all();
        self.stats.unregistered += closed as u64;
        info!("Hub coordinator stopped; closed {closed} connection(s)");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Register {
                connection_id,
                user_id,
                outbox,
            } => {
                if self.registry.insert(
                    connection_id.clone(),
                    ConnectionInfo {
                        user_id: user_id.clone(),
                        outbox,
                    },
                ) {
                    self.stats.registered += 1;
                    info!(
                        "Registered connection {connection_id} for user {user_id} ({} live)",
                        self.registry.len()
                    );
                } else {
                    warn!("Ignoring duplicate registration of connection {connection_id}");
                }
            }
            Command::Unregister { connection_id } => match self.registry.remove(&connection_id) {
                Some(info) => {
                    info.outbox.close();
                    self.stats.unregistered += 1;
                    info!(
                        "Unregistered connection {connection_id} for user {} ({} live, {} event(s) dropped)",
                        info.user_id,
                        self.registry.len(),
                        info.outbox.dropped()
                    );
                }
                None => debug!("Ignoring unregister of unknown connection {connection_id}"),
            },
            Command::Broadcast { event } => {
                self.backlog
                    .pending_broadcasts
                    .fetch_sub(1, Ordering::AcqRel);
                self.broadcast(event);
            }
            Command::Stats { reply } => {
                // The asker may have given up; nothing to do then.
                let _ = reply.send(self.snapshot());
            }
            Command::Inspect {
                connection_id,
                reply,
            } => {
                let stats = self.registry.get(&connection_id).map(|info| ConnectionStats {
                    user_id: info.user_id.clone(),
                    queued: info.outbox.len(),
                    dropped: info.outbox.dropped(),
                });
                let _ = reply.send(stats);
            }
        }
    }

    fn broadcast(&mut self, event: Event) {
        if !event.is_well_formed() {
            self.stats.malformed += 1;
            warn!(
                "Ignoring malformed {} event for board {}",
                event.kind, event.board_id
            );
            return;
        }

        let frame = match event.to_frame() {
            Ok(frame) => frame,
            Err(e) => {
                self.stats.malformed += 1;
                warn!("Failed to serialize {} event: {e}", event.kind);
                return;
            }
        };

        let fan_out = self.registry.broadcast(&frame);
        self.stats.broadcasts += 1;
        self.stats.deliveries += fan_out.delivered;
        self.stats.evictions += fan_out.evicted;

        debug!(
            "Broadcast {} for board {} to {} connection(s)",
            event.kind, event.board_id, fan_out.delivered
        );
    }

    fn snapshot(&self) -> HubStats {
        HubStats {
            connections: self.registry.len(),
            rejected: self.backlog.rejected.load(Ordering::Relaxed),
            ..self.stats.clone()
        }
    }
}
