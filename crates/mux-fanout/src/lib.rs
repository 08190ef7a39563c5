//! # mux-fanout
//!
//! The fan-out orchestrator: drives one provider adapter per selected
//! provider, multiplexes their fragment streams onto a single tagged event
//! sequence, persists finalized responses, and guarantees the stream
//! terminates exactly once.
//!
//! Providers run as independent tasks feeding a fan-in channel; the returned
//! stream owns those tasks, so dropping it (client disconnect) aborts all
//! in-flight upstream work promptly.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod orchestrator;
pub mod resolver;
pub mod sink;

pub use orchestrator::{Fanout, FanoutRequest};
pub use resolver::{CredentialResolver, Resolution, ResolveError, StoreResolver};
pub use sink::{ResponseSink, SinkError};
