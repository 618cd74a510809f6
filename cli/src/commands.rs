//! Subcommand bodies. Each writes its primary output to `out` and returns
//! whether the check it performs passed.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

use spine_detect::{DetectB, RoundRecord, SignalAdapter};
use spine_ledger::{read_all, read_tolerant, EventSpine, ReplayVerifier};
use spine_manifest::{Manifest, ManifestBuilder, ManifestVerifier};
use spine_store::{NodeStore, ObjectStore};
use spine_types::{Event, Node};

use crate::config::SpineConfig;

/// Copy of the verified spine written into every sealed run.
pub const BUNDLE_FILE: &str = "events.jsonl";

/// Event type recorded for each detector fire with `--record-fires`.
pub const FIRE_EVENT_TYPE: &str = "signal_fire";

pub fn append<W: Write>(config: &SpineConfig, event_type: &str, data: &str, out: &mut W) -> Result<()> {
    let payload: Value = serde_json::from_str(data).context("--data is not valid JSON")?;
    let mut spine = EventSpine::open(&config.spine_path)
        .with_context(|| format!("failed to open spine {}", config.spine_path.display()))?;
    let event = spine.append(event_type, payload)?;
    writeln!(out, "{}", serde_json::to_string(&event)?)?;
    Ok(())
}

pub fn replay<W: Write>(config: &SpineConfig, out: &mut W) -> Result<bool> {
    let outcome = ReplayVerifier::replay(&config.spine_path)
        .with_context(|| format!("failed to read spine {}", config.spine_path.display()))?;
    writeln!(out, "{}", outcome.message())?;
    if outcome.is_ok() {
        writeln!(out, "head {}", outcome.head())?;
    }
    Ok(outcome.is_ok())
}

pub fn read<W: Write>(config: &SpineConfig, tolerant: bool, out: &mut W) -> Result<()> {
    let events = if tolerant {
        let read = read_tolerant(&config.spine_path)?;
        if !read.skipped.is_empty() {
            tracing::warn!(skipped = ?read.skipped, "malformed lines skipped");
        }
        read.events
    } else {
        read_all(&config.spine_path)
            .with_context(|| format!("failed to read spine {}", config.spine_path.display()))?
    };
    for event in &events {
        writeln!(out, "{}", serde_json::to_string(event)?)?;
    }
    Ok(())
}

/// Replay the spine, copy its events into the run directory and seal it.
///
/// A spine that does not replay cleanly is not sealed.
pub fn seal<W: Write>(
    config: &SpineConfig,
    run_id: &str,
    run_dir: Option<&Path>,
    out: &mut W,
) -> Result<bool> {
    let outcome = ReplayVerifier::replay(&config.spine_path)
        .with_context(|| format!("failed to read spine {}", config.spine_path.display()))?;
    if !outcome.is_ok() {
        tracing::error!(status = %outcome.message(), "refusing to seal a broken spine");
        writeln!(out, "{}", outcome.message())?;
        return Ok(false);
    }

    let run_dir: PathBuf = run_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.run_dir(run_id));
    fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create {}", run_dir.display()))?;
    write_events(&run_dir.join(BUNDLE_FILE), &outcome.events)?;

    let manifest = ManifestBuilder::new().seal(run_id, &run_dir, &outcome.events)?;
    writeln!(out, "{}", manifest.root_hash)?;
    Ok(true)
}

/// Check the run's files, then its event bundle when one is present.
pub fn verify<W: Write>(run_dir: &Path, out: &mut W) -> Result<bool> {
    let verdict = ManifestVerifier::verify(run_dir)
        .with_context(|| format!("failed to verify {}", run_dir.display()))?;
    for failure in &verdict.failures {
        tracing::warn!(%failure, "manifest check failed");
    }
    if !verdict.is_ok() {
        writeln!(out, "{}", verdict.message())?;
        return Ok(false);
    }

    let bundle = run_dir.join(BUNDLE_FILE);
    if bundle.is_file() {
        let outcome = ReplayVerifier::replay(&bundle)?;
        if !outcome.is_ok() {
            writeln!(out, "bundle: {}", outcome.message())?;
            return Ok(false);
        }
        let manifest = Manifest::load(run_dir)?;
        let bundle_verdict = ManifestVerifier::verify_bundle(&outcome.events, &manifest);
        if !bundle_verdict.is_ok() {
            writeln!(out, "bundle: {}", bundle_verdict.message())?;
            return Ok(false);
        }
    }

    writeln!(out, "{}", verdict.message())?;
    Ok(true)
}

/// Run DetectB over one `RoundRecord` per line and print every signal.
pub fn detect<W: Write>(
    config: &SpineConfig,
    input: &Path,
    record_fires: bool,
    out: &mut W,
) -> Result<()> {
    let records: Vec<RoundRecord> = read_json_lines(input)?;
    let mut detector = DetectB::new(config.detector.clone()).context("invalid detector config")?;
    let signals = SignalAdapter::replay_arc(&mut detector, &records)?;

    let mut spine = if record_fires {
        Some(
            EventSpine::open(&config.spine_path)
                .with_context(|| format!("failed to open spine {}", config.spine_path.display()))?,
        )
    } else {
        None
    };

    for signal in &signals {
        writeln!(out, "{}", serde_json::to_string(signal)?)?;
        if !signal.signal.fired() {
            continue;
        }
        if let Some(spine) = spine.as_mut() {
            spine.append(FIRE_EVENT_TYPE, SignalAdapter::fire_payload(signal)?)?;
        }
    }

    let state = detector.state();
    tracing::info!(
        samples = state.sample_count,
        fires = state.fire_count,
        recorded = record_fires,
        "detection finished"
    );
    Ok(())
}

/// Load one `Node` per line into a fresh store and print its digest.
pub fn project<W: Write>(input: &Path, out: &mut W) -> Result<()> {
    let nodes: Vec<Node> = read_json_lines(input)?;
    let store = ObjectStore::from_nodes(nodes)?;
    tracing::info!(nodes = store.len(), "projection built");
    writeln!(out, "{}", store.store_sha())?;
    Ok(())
}

fn read_json_lines<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let text = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let mut items = Vec::new();
    for (i, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(line) {
            Ok(item) => items.push(item),
            Err(e) => bail!("{}:{}: {e}", path.display(), i + 1),
        }
    }
    Ok(items)
}

fn write_events(path: &Path, events: &[Event]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    for event in events {
        serde_json::to_writer(&mut writer, event)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> SpineConfig {
        SpineConfig {
            spine_path: dir.path().join("spine/events.jsonl"),
            runs_dir: dir.path().join("runs"),
            ..SpineConfig::default()
        }
    }

    fn output(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn append_then_replay() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir);
        let mut out = Vec::new();
        append(&cfg, "run_started", r#"{"run_id":"r1"}"#, &mut out).unwrap();
        append(&cfg, "run_finished", r#"{"run_id":"r1"}"#, &mut out).unwrap();
        assert_eq!(output(out).lines().count(), 2);

        let mut out = Vec::new();
        assert!(replay(&cfg, &mut out).unwrap());
        assert!(output(out).starts_with("OK (2 events)\nhead "));
    }

    #[test]
    fn append_rejects_non_object_data() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir);
        assert!(append(&cfg, "x", "[1,2]", &mut Vec::new()).is_err());
        assert!(append(&cfg, "x", "{not json", &mut Vec::new()).is_err());
    }

    #[test]
    fn replay_reports_break() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir);
        append(&cfg, "a", r#"{"n":1}"#, &mut Vec::new()).unwrap();
        append(&cfg, "b", r#"{"n":2}"#, &mut Vec::new()).unwrap();
        let text = fs::read_to_string(&cfg.spine_path).unwrap();
        fs::write(&cfg.spine_path, text.replace(r#""n":1"#, r#""n":7"#)).unwrap();

        let mut out = Vec::new();
        assert!(!replay(&cfg, &mut out).unwrap());
        assert_eq!(output(out), "chain break at event 0\n");
    }

    #[test]
    fn tolerant_read_skips_garbage() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir);
        append(&cfg, "a", "{}", &mut Vec::new()).unwrap();
        let mut text = fs::read_to_string(&cfg.spine_path).unwrap();
        text.push_str("garbage\n");
        fs::write(&cfg.spine_path, text).unwrap();

        assert!(read(&cfg, false, &mut Vec::new()).is_err());
        let mut out = Vec::new();
        read(&cfg, true, &mut out).unwrap();
        assert_eq!(output(out).lines().count(), 1);
    }

    #[test]
    fn seal_then_verify() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir);
        append(&cfg, "a", r#"{"n":1}"#, &mut Vec::new()).unwrap();

        assert!(seal(&cfg, "r1", None, &mut Vec::new()).unwrap());
        let run_dir = cfg.run_dir("r1");
        assert!(run_dir.join(BUNDLE_FILE).is_file());

        let mut out = Vec::new();
        assert!(verify(&run_dir, &mut out).unwrap());
        assert_eq!(output(out), "OK\n");

        fs::write(run_dir.join(BUNDLE_FILE), "").unwrap();
        let mut out = Vec::new();
        assert!(!verify(&run_dir, &mut out).unwrap());
        assert_eq!(output(out), "hash mismatch: events.jsonl\n");
    }

    #[test]
    fn broken_spine_is_not_sealed() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir);
        append(&cfg, "a", r#"{"n":1}"#, &mut Vec::new()).unwrap();
        let text = fs::read_to_string(&cfg.spine_path).unwrap();
        fs::write(&cfg.spine_path, text.replace(r#""n":1"#, r#""n":2"#)).unwrap();

        assert!(!seal(&cfg, "r1", None, &mut Vec::new()).unwrap());
        assert!(!cfg.run_dir("r1").exists());
    }

    #[test]
    fn detect_records_fires() {
        let dir = TempDir::new().unwrap();
        let mut cfg = config(&dir);
        cfg.detector = spine_detect::DetectorConfig::fixed(0.5);
        let input = dir.path().join("rounds.jsonl");
        fs::write(
            &input,
            concat!(
                r#"{"round":1,"composite_score":0.3}"#,
                "\n",
                r#"{"round":2,"composite_score":0.6,"label":"spike"}"#,
                "\n\n",
                r#"{"round":3,"composite_score":0.3}"#,
                "\n",
                r#"{"round":4,"composite_score":0.6}"#,
                "\n",
            ),
        )
        .unwrap();

        let mut out = Vec::new();
        detect(&cfg, &input, true, &mut out).unwrap();
        let lines: Vec<Value> = output(out)
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1]["classification"], "B");
        assert_eq!(lines[1]["label"], "spike");

        let events = read_all(&cfg.spine_path).unwrap();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.kind == FIRE_EVENT_TYPE));
        assert_eq!(events[0].data["round"], 2);
    }

    #[test]
    fn detect_reports_bad_line_number() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir);
        let input = dir.path().join("rounds.jsonl");
        fs::write(&input, "{\"round\":1,\"composite_score\":0.3}\nnope\n").unwrap();
        let err = detect(&cfg, &input, false, &mut Vec::new()).unwrap_err();
        assert!(err.to_string().contains(":2:"));
    }

    #[test]
    fn projection_ignores_line_order() {
        let dir = TempDir::new().unwrap();
        let a = r#"{"type":"run","id":"r1","attrs":{"status":"done"}}"#;
        let b = r#"{"type":"artifact","id":"a1","attrs":{"size":3}}"#;
        let forward = dir.path().join("f.jsonl");
        let backward = dir.path().join("b.jsonl");
        fs::write(&forward, format!("{a}\n{b}\n")).unwrap();
        fs::write(&backward, format!("{b}\n{a}\n")).unwrap();

        let mut x = Vec::new();
        let mut y = Vec::new();
        project(&forward, &mut x).unwrap();
        project(&backward, &mut y).unwrap();
        assert_eq!(x, y);
        assert_eq!(output(x).trim().len(), 64);
    }
}
