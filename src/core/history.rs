//! State transition history tracking.
//!
//! Provides immutable tracking of executed sub-transitions over time. Every
//! committed branch of a transition (forks produce one per target) appends
//! one record.

use super::state::State;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Record of a single executed sub-transition.
///
/// # Example
///
/// ```rust
/// use mindtree::core::{State, TransitionRecord};
/// use serde::{Deserialize, Serialize};
/// use chrono::Utc;
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
/// enum Matter {
///     Solid,
///     Liquid,
/// }
///
/// impl State for Matter {
///     fn name(&self) -> &str {
///         match self {
///             Self::Solid => "Solid",
///             Self::Liquid => "Liquid",
///         }
///     }
/// }
///
/// let record = TransitionRecord {
///     from: Matter::Solid,
///     event: "Melted".to_string(),
///     to: Matter::Liquid,
///     timestamp: Utc::now(),
/// };
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct TransitionRecord<S: State> {
    /// The state the transition was found on
    pub from: S,
    /// Tag of the event that triggered the transition
    pub event: String,
    /// The declared target of this branch
    pub to: S,
    /// When the transition was committed
    pub timestamp: DateTime<Utc>,
}

/// Ordered history of executed transitions.
///
/// History is immutable: `record` returns a new history with the record
/// appended, leaving the original untouched.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct StateHistory<S: State> {
    records: Vec<TransitionRecord<S>>,
}

impl<S: State> Default for StateHistory<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State> StateHistory<S> {
    /// Create a new empty history.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Record a transition, returning a new history.
    pub fn record(&self, record: TransitionRecord<S>) -> Self {
        let mut records = self.records.clone();
        records.push(record);
        Self { records }
    }

    /// All recorded transitions in execution order.
    pub fn records(&self) -> &[TransitionRecord<S>] {
        &self.records
    }

    /// Number of recorded transitions.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total duration from first to last recorded transition.
    ///
    /// Returns `None` while the history is empty.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.records.first(), self.records.last()) {
            let duration = last.timestamp.signed_duration_since(first.timestamp);
            duration.to_std().ok()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
    enum TestState {
        Solid,
        Liquid,
        Gas,
    }

    impl State for TestState {
        fn name(&self) -> &str {
            match self {
                Self::Solid => "Solid",
                Self::Liquid => "Liquid",
                Self::Gas => "Gas",
            }
        }
    }

    fn record(from: TestState, event: &str, to: TestState) -> TransitionRecord<TestState> {
        TransitionRecord {
            from,
            event: event.to_string(),
            to,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn record_is_pure() {
        let history = StateHistory::new();
        let updated = history.record(record(TestState::Solid, "Melted", TestState::Liquid));

        assert!(history.is_empty());
        assert_eq!(updated.len(), 1);
    }

    #[test]
    fn records_preserve_order() {
        let history = StateHistory::new()
            .record(record(TestState::Solid, "Melted", TestState::Liquid))
            .record(record(TestState::Liquid, "Vaporized", TestState::Gas));

        let records = history.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].to, TestState::Liquid);
        assert_eq!(records[1].to, TestState::Gas);
        assert_eq!(records[1].event, "Vaporized");
    }

    #[test]
    fn duration_requires_records() {
        let history: StateHistory<TestState> = StateHistory::new();
        assert!(history.duration().is_none());

        let history = history.record(record(TestState::Solid, "Melted", TestState::Liquid));
        assert!(history.duration().is_some());
    }

    #[test]
    fn history_roundtrip_serialization() {
        let history = StateHistory::new()
            .record(record(TestState::Solid, "Melted", TestState::Liquid));

        let json = serde_json::to_string(&history).unwrap();
        let back: StateHistory<TestState> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), history.len());
        assert_eq!(back.records()[0].event, "Melted");
    }
}
