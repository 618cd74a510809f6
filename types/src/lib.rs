//! Fundamental types for the event spine.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! 256-bit digests, timestamps and clocks, spine events, object-store nodes,
//! and the tagged policy decision used by append guards.

pub mod error;
pub mod event;
pub mod hash;
pub mod node;
pub mod policy;
pub mod time;

pub use error::TypesError;
pub use event::{Event, EventBody};
pub use hash::Hash256;
pub use node::Node;
pub use policy::{AllowAll, AppendPolicy, PolicyDecision};
pub use time::{Clock, SystemClock, Timestamp};
