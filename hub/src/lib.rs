//! Real-time broadcast hub for task board changes over WebSockets.
//!
//! Every completed board or task mutation becomes an [`Event`] that is pushed
//! to every live connection. Clients filter by `board_id` themselves.
//!
//! # Architecture
//!
//! - **Single coordinator**: one task owns the connection registry. Register,
//!   unregister and broadcast are messages to it, so they form one total
//!   order and no lock guards the registry.
//! - **Bounded outboxes**: each connection has a drop-oldest queue. The
//!   coordinator never waits on a connection; a slow client loses its oldest
//!   undelivered events instead of slowing everyone else down.
//! - **Per-connection sessions**: a read loop (liveness and close detection)
//!   and a write loop (outbox drain plus keep-alive pings). Either one
//!   failing ends both and unregisters the connection exactly once.
//! - **Bounded shutdown**: [`Hub::shutdown`] cancels the coordinator and every
//!   session and waits up to a deadline for them to finish.
//!
//! # Message Flow
//!
//! 1. Client upgrades via `/api/v1/ws` after the identity gate resolves a user
//! 2. The web layer hands the split socket to [`Hub::register`]
//! 3. A domain operation commits and publishes a `DomainEvent`
//! 4. [`HubDomainEventHandler`] turns it into an [`Event`] and calls [`Hub::broadcast`]
//! 5. The coordinator serializes it once and enqueues the frame on every outbox
//! 6. Each session's write loop sends the frame to its client
//!
//! Delivery is best effort and lossy under load. There is no replay: a client
//! that reconnects should reload the board over the REST API.
//!
//! # Modules
//!
//! - `connection`: `ConnectionId`, handles and the coordinator-owned registry
//! - `domain_event_handler`: bridge from `events::DomainEvent` to hub broadcasts
//! - `manager`: the `Hub` handle and coordinator loop
//! - `message`: the wire envelope
//! - `outbox`: bounded drop-oldest queue
//! - `session`: read and write loops for one connection

pub mod connection;
pub mod domain_event_handler;
pub mod manager;
pub mod message;
pub mod outbox;
pub mod session;

pub use connection::{ConnectionHandle, ConnectionId, ConnectionStats, UserId};
pub use domain_event_handler::HubDomainEventHandler;
pub use manager::{Hub, HubConfig, HubStats};
pub use message::{BoardId, Event, EventKind};
pub use outbox::{Enqueued, Outbox};
pub use session::Disconnect;
