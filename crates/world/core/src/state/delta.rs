//! Ordered state-mutation records.
//!
//! Every observable mutation inside a turn is described by a [`Delta`] with
//! an op, a path into the state tree, and an optional value. Deltas are
//! collected alongside the mutation as it happens, never derived by diffing
//! snapshots, so their order matches the order of application.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Mutation operation kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeltaOp {
    Set,
    Add,
    Del,
    Inc,
}

/// One state mutation: `{op, path, value?}`.
///
/// Paths follow the state tree literally, e.g.
/// `/world/cells/L1:0,0:6,6` or `/player/inventory`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    pub op: DeltaOp,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl Delta {
    pub fn set(path: impl Into<String>, value: Value) -> Self {
        Self {
            op: DeltaOp::Set,
            path: path.into(),
            value: Some(value),
        }
    }

    pub fn add(path: impl Into<String>, value: Value) -> Self {
        Self {
            op: DeltaOp::Add,
            path: path.into(),
            value: Some(value),
        }
    }

    pub fn del(path: impl Into<String>) -> Self {
        Self {
            op: DeltaOp::Del,
            path: path.into(),
            value: None,
        }
    }

    pub fn inc(path: impl Into<String>) -> Self {
        Self {
            op: DeltaOp::Inc,
            path: path.into(),
            value: None,
        }
    }
}

/// Collector for a turn's deltas plus the revision flags raised while
/// mutating.
///
/// Revision counters themselves are bumped once at the end of the turn for
/// each raised flag, so repeated mutations of the same substate within one
/// turn still produce a single increment.
#[derive(Clone, Debug, Default)]
pub struct DeltaLog {
    deltas: Vec<Delta>,
    pub cell_rev: bool,
    pub site_rev: bool,
    pub inventory_rev: bool,
    pub merchant_state_rev: bool,
    pub faction_rev: bool,
}

impl DeltaLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, delta: Delta) {
        self.deltas.push(delta);
    }

    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    pub fn deltas(&self) -> &[Delta] {
        &self.deltas
    }

    pub fn into_deltas(self) -> Vec<Delta> {
        self.deltas
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deltas_preserve_insertion_order() {
        let mut log = DeltaLog::new();
        log.push(Delta::set("/world/time_utc", json!("2026-01-01T00:00:00Z")));
        log.push(Delta::del("/world/cells/L1:0,0:0,0"));
        log.push(Delta::inc("/counters/cell_rev"));
        let ops: Vec<DeltaOp> = log.deltas().iter().map(|d| d.op).collect();
        assert_eq!(ops, vec![DeltaOp::Set, DeltaOp::Del, DeltaOp::Inc]);
    }

    #[test]
    fn delta_serializes_without_null_value() {
        let rendered = serde_json::to_string(&Delta::del("/x")).unwrap();
        assert_eq!(rendered, r#"{"op":"del","path":"/x"}"#);
    }
}
