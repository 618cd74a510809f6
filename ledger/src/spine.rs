//! The spine writer.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::Value;
use spine_crypto::{chain_hash, GENESIS};
use spine_types::{AllowAll, AppendPolicy, Clock, Event, EventBody, Hash256, PolicyDecision, SystemClock};

use crate::reader::{parse_line, read_bytes, split_lines};
use crate::LedgerError;

enum TailRepair {
    None,
    Truncate(u64),
    Terminate,
}

/// Append-only writer over a newline-delimited JSON file.
///
/// Holds the running chain head in memory. Every [`append`](Self::append)
/// writes one complete line with a single write and syncs it before returning.
pub struct EventSpine<C: Clock = SystemClock> {
    path: PathBuf,
    file: File,
    head: Hash256,
    len: u64,
    clock: C,
    policy: Box<dyn AppendPolicy>,
}

impl EventSpine<SystemClock> {
    /// Open (or create) the spine at `path` using the system clock.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        Self::open_with_clock(path, SystemClock)
    }
}

impl<C: Clock> EventSpine<C> {
    /// Open (or create) the spine at `path`, recovering the chain head.
    ///
    /// A trailing line without a newline is a torn write: if it parses it is
    /// completed with `\n`, otherwise it is truncated away. Any other line that
    /// fails to parse is an error.
    pub fn open_with_clock(path: impl AsRef<Path>, clock: C) -> Result<Self, LedgerError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let bytes = read_bytes(&path)?;
        let mut head = GENESIS;
        let mut len = 0u64;
        let mut valid_bytes = 0u64;
        let mut repair = TailRepair::None;

        for line in split_lines(&bytes) {
            if !line.terminated {
                repair = match parse_line(line.text) {
                    Ok(event) => {
                        tracing::warn!(path = %path.display(), line = line.number, "completing unterminated spine line");
                        head = event.chain_hash;
                        len += 1;
                        TailRepair::Terminate
                    }
                    Err(reason) => {
                        tracing::warn!(
                            path = %path.display(),
                            line = line.number,
                            %reason,
                            "truncating torn trailing spine line"
                        );
                        TailRepair::Truncate(valid_bytes)
                    }
                };
                break;
            }

            valid_bytes += line.text.len() as u64 + 1;
            if line.is_blank() {
                continue;
            }
            let event = parse_line(line.text).map_err(|reason| LedgerError::MalformedLine {
                line: line.number,
                reason,
            })?;
            head = event.chain_hash;
            len += 1;
        }

        if let TailRepair::Truncate(keep) = repair {
            let truncated = OpenOptions::new().write(true).open(&path)?;
            truncated.set_len(keep)?;
            truncated.sync_all()?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        if let TailRepair::Terminate = repair {
            file.write_all(b"\n")?;
            file.sync_data()?;
        }

        tracing::info!(path = %path.display(), events = len, head = %head, "spine opened");

        Ok(Self {
            path,
            file,
            head,
            len,
            clock,
            policy: Box::new(AllowAll),
        })
    }

    /// Guard every subsequent append with `policy`.
    pub fn with_policy(mut self, policy: impl AppendPolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    /// Append one event and return it sealed with its chain hash.
    pub fn append(&mut self, event_type: &str, payload: Value) -> Result<Event, LedgerError> {
        if let PolicyDecision::Denied(reason) = self.policy.check(event_type, &payload) {
            tracing::warn!(event_type, %reason, "append denied by policy");
            return Err(LedgerError::Denied {
                event_type: event_type.to_string(),
                reason,
            });
        }

        let body = EventBody::new(self.clock.now(), event_type, payload)?;
        let link = chain_hash(&self.head, &body.to_value());
        let event = body.seal(link);

        let mut line = serde_json::to_vec(&event)?;
        line.push(b'\n');
        self.file.write_all(&line)?;
        self.file.sync_data()?;

        self.head = link;
        self.len += 1;
        tracing::debug!(event_type, index = self.len - 1, chain_hash = %link, "event appended");
        Ok(event)
    }

    /// The chain hash of the last appended event, or genesis for an empty spine.
    pub fn head(&self) -> Hash256 {
        self.head
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use spine_crypto::fold_chain;
    use spine_nullables::{DenyTypes, NullClock};

    fn temp_spine() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("spine").join("events.jsonl");
        (dir, path)
    }

    #[test]
    fn new_spine_starts_at_genesis() {
        let (_dir, path) = temp_spine();
        let spine = EventSpine::open_with_clock(&path, NullClock::new(1.0)).unwrap();
        assert_eq!(spine.head(), GENESIS);
        assert!(spine.is_empty());
        assert!(path.exists());
    }

    #[test]
    fn append_links_to_previous_head() {
        let (_dir, path) = temp_spine();
        let mut spine = EventSpine::open_with_clock(&path, NullClock::stepping(10.0, 1.0)).unwrap();
        let e1 = spine.append("run_started", json!({"run": "r1"})).unwrap();
        let e2 = spine.append("run_finished", json!({"run": "r1"})).unwrap();

        assert_eq!(e1.chain_hash, chain_hash(&GENESIS, &e1.body_value()));
        assert_eq!(e2.chain_hash, chain_hash(&e1.chain_hash, &e2.body_value()));
        assert_eq!(spine.head(), e2.chain_hash);
        assert_eq!(spine.len(), 2);
        assert_eq!(fold_chain(&[e1, e2]), spine.head());
    }

    #[test]
    fn writes_one_line_per_event() {
        let (_dir, path) = temp_spine();
        let mut spine = EventSpine::open_with_clock(&path, NullClock::new(5.0)).unwrap();
        spine.append("a", json!({})).unwrap();
        spine.append("b", json!({"x": [1, 2]})).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(text.ends_with('\n'));
        assert!(lines[0].starts_with(r#"{"ts":5.0,"type":"a","data":{},"chain_hash":""#));
    }

    #[test]
    fn reopen_recovers_head() {
        let (_dir, path) = temp_spine();
        let head = {
            let mut spine = EventSpine::open_with_clock(&path, NullClock::new(1.0)).unwrap();
            spine.append("a", json!({"n": 1})).unwrap();
            spine.append("b", json!({"n": 2})).unwrap().chain_hash
        };
        let spine = EventSpine::open_with_clock(&path, NullClock::new(1.0)).unwrap();
        assert_eq!(spine.head(), head);
        assert_eq!(spine.len(), 2);
    }

    #[test]
    fn torn_tail_is_truncated() {
        let (_dir, path) = temp_spine();
        {
            let mut spine = EventSpine::open_with_clock(&path, NullClock::new(1.0)).unwrap();
            spine.append("a", json!({})).unwrap();
        }
        let intact = fs::read(&path).unwrap();
        let mut torn = intact.clone();
        torn.extend_from_slice(br#"{"ts":2.0,"type":"b","da"#);
        fs::write(&path, &torn).unwrap();

        let mut spine = EventSpine::open_with_clock(&path, NullClock::new(3.0)).unwrap();
        assert_eq!(spine.len(), 1);
        assert_eq!(fs::read(&path).unwrap(), intact);

        spine.append("c", json!({})).unwrap();
        assert_eq!(crate::read_all(&path).unwrap().len(), 2);
    }

    #[test]
    fn unterminated_but_complete_tail_is_kept() {
        let (_dir, path) = temp_spine();
        let head = {
            let mut spine = EventSpine::open_with_clock(&path, NullClock::new(1.0)).unwrap();
            spine.append("a", json!({})).unwrap().chain_hash
        };
        let mut bytes = fs::read(&path).unwrap();
        bytes.pop();
        fs::write(&path, &bytes).unwrap();

        let spine = EventSpine::open_with_clock(&path, NullClock::new(1.0)).unwrap();
        assert_eq!(spine.head(), head);
        assert!(fs::read_to_string(&path).unwrap().ends_with('\n'));
    }

    #[test]
    fn malformed_complete_line_refuses_open() {
        let (_dir, path) = temp_spine();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "garbage\n").unwrap();
        let err = EventSpine::open_with_clock(&path, NullClock::new(1.0))
            .err()
            .expect("open must fail");
        assert!(matches!(err, LedgerError::MalformedLine { line: 1, .. }));
    }

    #[test]
    fn non_object_payload_is_rejected_without_write() {
        let (_dir, path) = temp_spine();
        let mut spine = EventSpine::open_with_clock(&path, NullClock::new(1.0)).unwrap();
        assert!(matches!(
            spine.append("a", json!(42)),
            Err(LedgerError::InvalidEvent(_))
        ));
        assert_eq!(spine.head(), GENESIS);
        assert_eq!(fs::read(&path).unwrap().len(), 0);
    }

    #[test]
    fn policy_denial_writes_nothing() {
        let (_dir, path) = temp_spine();
        let mut spine = EventSpine::open_with_clock(&path, NullClock::new(1.0))
            .unwrap()
            .with_policy(DenyTypes::new(["wallet_intercept"]));

        let err = spine.append("wallet_intercept", json!({})).unwrap_err();
        assert!(matches!(err, LedgerError::Denied { .. }));
        assert!(spine.is_empty());

        spine.append("round_scored", json!({"round": 1})).unwrap();
        assert_eq!(spine.len(), 1);
    }
}
