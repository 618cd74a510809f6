//! Translation from domain records to detector calls and back.
//!
//! A record's ordinal (its round number) stands in for time: one tick per
//! record, `dt_ms = 1`. The adapter holds no state of its own; all state
//! lives in the detector passed in.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{DetectB, DetectError, SignalEvent};

/// Anything that can be fed to the detector.
pub trait DomainRecord {
    /// Monotonic position of the record; used as `timestamp_ms`.
    fn ordinal(&self) -> u64;
    /// The scalar to classify.
    fn value(&self) -> f64;
    /// Fields carried through onto the resulting signal.
    fn domain_fields(&self) -> Map<String, Value>;
}

/// The stock round record: a round number and its composite score.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub round: u64,
    pub composite_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub divisor_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Any other fields on the input line.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RoundRecord {
    pub fn new(round: u64, composite_score: f64) -> Self {
        Self {
            round,
            composite_score,
            divisor_count: None,
            label: None,
            extra: Map::new(),
        }
    }
}

impl DomainRecord for RoundRecord {
    fn ordinal(&self) -> u64 {
        self.round
    }

    fn value(&self) -> f64 {
        self.composite_score
    }

    fn domain_fields(&self) -> Map<String, Value> {
        let mut fields = self.extra.clone();
        fields.insert("round".into(), Value::from(self.round));
        fields.insert("composite_score".into(), Value::from(self.composite_score));
        if let Some(count) = self.divisor_count {
            fields.insert("divisor_count".into(), Value::from(count));
        }
        if let Some(label) = &self.label {
            fields.insert("label".into(), Value::from(label.as_str()));
        }
        fields
    }
}

/// A signal with the originating record's fields alongside it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AdaptedSignal {
    #[serde(flatten)]
    pub signal: SignalEvent,
    #[serde(flatten)]
    pub domain: Map<String, Value>,
}

pub struct SignalAdapter;

impl SignalAdapter {
    /// Feed one record through `detector`.
    ///
    /// Domain fields whose names collide with signal fields are dropped so the
    /// detector's values are never shadowed.
    pub fn observe<R: DomainRecord + ?Sized>(
        detector: &mut DetectB,
        record: &R,
    ) -> Result<AdaptedSignal, DetectError> {
        let signal = detector.process(record.value(), record.ordinal() as f64, 1.0)?;
        let mut domain = record.domain_fields();
        for field in SignalEvent::FIELDS {
            if domain.remove(field).is_some() {
                tracing::debug!(field, "dropping domain field that shadows a signal field");
            }
        }
        Ok(AdaptedSignal { signal, domain })
    }

    /// Reset `detector` once, then process `records` in order.
    pub fn replay_arc<'a, R, I>(
        detector: &mut DetectB,
        records: I,
    ) -> Result<Vec<AdaptedSignal>, DetectError>
    where
        R: DomainRecord + 'a,
        I: IntoIterator<Item = &'a R>,
    {
        detector.reset();
        records
            .into_iter()
            .map(|record| Self::observe(detector, record))
            .collect()
    }

    /// JSON object form of a signal, suitable as a spine payload.
    pub fn fire_payload(signal: &AdaptedSignal) -> Result<Value, DetectError> {
        Ok(serde_json::to_value(signal)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Classification, DetectorConfig};
    use serde_json::json;

    fn arc() -> Vec<RoundRecord> {
        [0.3, 0.6, 0.3, 0.6]
            .iter()
            .enumerate()
            .map(|(i, &s)| RoundRecord::new(i as u64 + 1, s))
            .collect()
    }

    #[test]
    fn ordinal_becomes_timestamp() {
        let mut d = DetectB::new(DetectorConfig::fixed(0.5)).unwrap();
        let out = SignalAdapter::observe(&mut d, &RoundRecord::new(17, 0.9)).unwrap();
        assert_eq!(out.signal.timestamp_ms, 17.0);
        assert_eq!(out.domain["round"], 17);
        assert!(out.signal.fired());
    }

    #[test]
    fn replay_arc_resets_first() {
        let mut d = DetectB::new(DetectorConfig::fixed(0.5)).unwrap();
        d.process(0.9, 0.0, 1.0).unwrap();

        let out = SignalAdapter::replay_arc(&mut d, &arc()).unwrap();
        let classes: Vec<Classification> = out.iter().map(|s| s.signal.classification).collect();
        use Classification::*;
        assert_eq!(classes, vec![C, B, C, B]);
        assert_eq!(out[0].signal.sample_count, 1);
        assert_eq!(out[3].signal.fire_count, 2);
    }

    #[test]
    fn replay_arc_is_deterministic() {
        let mut d = DetectB::new(DetectorConfig::default()).unwrap();
        let records: Vec<RoundRecord> = (1..=30)
            .map(|r| RoundRecord::new(r, ((r * 37) % 11) as f64 / 10.0))
            .collect();
        let first: Vec<Classification> = SignalAdapter::replay_arc(&mut d, &records)
            .unwrap()
            .iter()
            .map(|s| s.signal.classification)
            .collect();
        let second: Vec<Classification> = SignalAdapter::replay_arc(&mut d, &records)
            .unwrap()
            .iter()
            .map(|s| s.signal.classification)
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn domain_fields_flatten_without_shadowing() {
        let mut record: RoundRecord = serde_json::from_value(json!({
            "round": 3,
            "composite_score": 0.7,
            "divisor_count": 12,
            "source": "batch-a",
            "confidence": 99
        }))
        .unwrap();
        record.label = Some("peak".into());

        let mut d = DetectB::new(DetectorConfig::fixed(0.5)).unwrap();
        let adapted = SignalAdapter::observe(&mut d, &record).unwrap();
        let payload = SignalAdapter::fire_payload(&adapted).unwrap();

        assert_eq!(payload["round"], 3);
        assert_eq!(payload["divisor_count"], 12);
        assert_eq!(payload["source"], "batch-a");
        assert_eq!(payload["label"], "peak");
        assert_eq!(payload["detect_B"], true);
        assert!(payload["confidence"].as_f64().unwrap() <= 1.0);
    }
}
