//! Append-only, chain-hashed event spine.
//!
//! Each line of the spine is one JSON event whose `chain_hash` folds the
//! previous link with the canonical form of the event body. Writers go
//! through [`EventSpine`]; auditors go through [`ReplayVerifier`].
//!
//! Reader disciplines differ on purpose:
//! - the append path ([`EventSpine::open`]) refuses a spine with a malformed
//!   complete line, and repairs only a torn trailing line;
//! - [`read_all`] is strict, [`read_tolerant`] skips and counts bad lines;
//! - [`ReplayVerifier`] reports a malformed line as a chain break at its index.
//!
//! The spine assumes a single writer. Concurrent writers must be serialized
//! by the caller.

pub mod error;
pub mod reader;
pub mod replay;
pub mod spine;

pub use error::LedgerError;
pub use reader::{read_all, read_tolerant, TolerantRead};
pub use replay::{BreakCause, ReplayOutcome, ReplayStatus, ReplayVerifier};
pub use spine::EventSpine;
