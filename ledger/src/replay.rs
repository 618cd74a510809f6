//! Deterministic replay: recompute the chain from genesis and find the first break.

use std::fmt;
use std::path::Path;

use spine_crypto::{chain_hash, GENESIS};
use spine_types::{Event, Hash256};

use crate::reader::{parse_line, read_bytes, split_lines};
use crate::LedgerError;

/// Why the chain stopped verifying.
#[derive(Clone, Debug, PartialEq)]
pub enum BreakCause {
    /// The stored link differs from the recomputed one.
    HashMismatch { expected: Hash256, stored: Hash256 },
    /// The line could not be parsed as an event.
    Malformed(String),
}

impl fmt::Display for BreakCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BreakCause::HashMismatch { expected, stored } => {
                write!(f, "expected {expected}, stored {stored}")
            }
            BreakCause::Malformed(reason) => write!(f, "malformed line: {reason}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ReplayStatus {
    Intact { count: usize },
    ChainBreak { index: usize, cause: BreakCause },
}

/// Outcome of a replay. `events` holds only the verified prefix.
#[derive(Clone, Debug)]
pub struct ReplayOutcome {
    pub status: ReplayStatus,
    pub events: Vec<Event>,
}

impl ReplayOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self.status, ReplayStatus::Intact { .. })
    }

    /// `"OK (n events)"` or `"chain break at event i"`.
    pub fn message(&self) -> String {
        match &self.status {
            ReplayStatus::Intact { count } => format!("OK ({count} events)"),
            ReplayStatus::ChainBreak { index, .. } => format!("chain break at event {index}"),
        }
    }

    /// Index of the first broken event, if any.
    pub fn break_index(&self) -> Option<usize> {
        match self.status {
            ReplayStatus::ChainBreak { index, .. } => Some(index),
            ReplayStatus::Intact { .. } => None,
        }
    }

    /// The last verified link, or genesis if nothing verified.
    pub fn head(&self) -> Hash256 {
        self.events.last().map_or(GENESIS, |e| e.chain_hash)
    }

    pub fn into_parts(self) -> (bool, String, Vec<Event>) {
        let ok = self.is_ok();
        let message = self.message();
        (ok, message, self.events)
    }
}

/// Strict, read-only chain verifier.
pub struct ReplayVerifier;

impl ReplayVerifier {
    /// Replay the spine at `path`. A missing file is an empty, intact spine.
    ///
    /// Only I/O failures are errors; tampering and malformed lines are
    /// reported through the outcome.
    pub fn replay(path: impl AsRef<Path>) -> Result<ReplayOutcome, LedgerError> {
        let path = path.as_ref();
        let bytes = read_bytes(path)?;
        let outcome = Self::replay_bytes(&bytes);
        match &outcome.status {
            ReplayStatus::Intact { count } => {
                tracing::info!(path = %path.display(), events = count, "replay verified");
            }
            ReplayStatus::ChainBreak { index, cause } => {
                tracing::warn!(path = %path.display(), index, %cause, "replay found chain break");
            }
        }
        Ok(outcome)
    }

    /// Replay raw spine bytes.
    pub fn replay_bytes(bytes: &[u8]) -> ReplayOutcome {
        let mut events = Vec::new();
        let lines = split_lines(bytes);
        for line in lines.iter().filter(|l| !l.is_blank()) {
            match parse_line(line.text) {
                Ok(event) => events.push(event),
                Err(reason) => {
                    let index = events.len();
                    let mut outcome = Self::replay_events(events);
                    if outcome.is_ok() {
                        outcome.status = ReplayStatus::ChainBreak {
                            index,
                            cause: BreakCause::Malformed(reason),
                        };
                    }
                    return outcome;
                }
            }
        }
        Self::replay_events(events)
    }

    /// Verify an in-memory event sequence from genesis.
    pub fn replay_events(mut events: Vec<Event>) -> ReplayOutcome {
        let mut prev = GENESIS;
        let mut broken = None;
        for (index, event) in events.iter().enumerate() {
            let expected = chain_hash(&prev, &event.body_value());
            if expected != event.chain_hash {
                broken = Some((index, expected, event.chain_hash));
                break;
            }
            prev = expected;
        }

        match broken {
            Some((index, expected, stored)) => {
                events.truncate(index);
                ReplayOutcome {
                    status: ReplayStatus::ChainBreak {
                        index,
                        cause: BreakCause::HashMismatch { expected, stored },
                    },
                    events,
                }
            }
            None => ReplayOutcome {
                status: ReplayStatus::Intact { count: events.len() },
                events,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use spine_types::{EventBody, Timestamp};

    fn build_chain(n: usize) -> Vec<Event> {
        let mut prev = GENESIS;
        (0..n)
            .map(|i| {
                let body = EventBody::new(Timestamp::new(i as f64), "tick", json!({"i": i})).unwrap();
                let link = chain_hash(&prev, &body.to_value());
                prev = link;
                body.seal(link)
            })
            .collect()
    }

    fn to_bytes(events: &[Event]) -> Vec<u8> {
        let mut out = Vec::new();
        for e in events {
            out.extend(serde_json::to_vec(e).unwrap());
            out.push(b'\n');
        }
        out
    }

    #[test]
    fn empty_is_ok() {
        let outcome = ReplayVerifier::replay_bytes(b"");
        assert!(outcome.is_ok());
        assert_eq!(outcome.message(), "OK (0 events)");
        assert_eq!(outcome.head(), GENESIS);
    }

    #[test]
    fn intact_chain_reports_count() {
        let events = build_chain(5);
        let outcome = ReplayVerifier::replay_bytes(&to_bytes(&events));
        assert!(outcome.is_ok());
        assert_eq!(outcome.message(), "OK (5 events)");
        assert_eq!(outcome.events, events);
        assert_eq!(outcome.head(), events[4].chain_hash);
    }

    #[test]
    fn tampered_payload_breaks_at_its_index() {
        let mut events = build_chain(4);
        events[2].data = json!({"i": 99});
        let outcome = ReplayVerifier::replay_events(events.clone());
        assert_eq!(outcome.break_index(), Some(2));
        assert_eq!(outcome.message(), "chain break at event 2");
        assert_eq!(outcome.events, events[..2].to_vec());
    }

    #[test]
    fn malformed_line_is_a_break() {
        let events = build_chain(3);
        let mut bytes = to_bytes(&events[..1]);
        bytes.extend_from_slice(b"{not json}\n");
        bytes.extend(to_bytes(&events[1..]));
        let (ok, message, prefix) = ReplayVerifier::replay_bytes(&bytes).into_parts();
        assert!(!ok);
        assert_eq!(message, "chain break at event 1");
        assert_eq!(prefix.len(), 1);
    }

    #[test]
    fn earlier_mismatch_wins_over_later_malformed_line() {
        let mut events = build_chain(3);
        events[0].kind = "tock".into();
        let mut bytes = to_bytes(&events);
        bytes.extend_from_slice(b"garbage\n");
        let outcome = ReplayVerifier::replay_bytes(&bytes);
        assert_eq!(outcome.break_index(), Some(0));
        assert!(matches!(
            outcome.status,
            ReplayStatus::ChainBreak { cause: BreakCause::HashMismatch { .. }, .. }
        ));
    }

    #[test]
    fn reordered_events_break() {
        let mut events = build_chain(3);
        events.swap(1, 2);
        assert_eq!(ReplayVerifier::replay_events(events).break_index(), Some(1));
    }

    #[test]
    fn blank_lines_do_not_consume_indices() {
        let events = build_chain(2);
        let mut bytes = to_bytes(&events[..1]);
        bytes.extend_from_slice(b"\n   \n");
        bytes.extend(to_bytes(&events[1..]));
        assert_eq!(ReplayVerifier::replay_bytes(&bytes).message(), "OK (2 events)");
    }
}
