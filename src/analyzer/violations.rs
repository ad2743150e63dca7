//! Violation kinds reported by the static analyzer.

use thiserror::Error;

/// One defect found in a state graph.
///
/// The analyzer accumulates every violation it finds instead of stopping
/// at the first, so authors can fix a broken graph in a single pass.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Violation {
    #[error("Initial state '{name}' is not a leaf")]
    InitialStateNotLeaf { name: String },

    #[error("State '{name}' is unreachable from the initial state")]
    UnreachableState { name: String },

    #[error("Transition on '{from}' targets abstract state '{target}'")]
    AbstractTargetState { from: String, target: String },

    #[error("Fork on '{from}' does not fan out into distinct concurrent regions")]
    ForkTargetsNotConcurrent { from: String },

    #[error("Join on '{from}' for '{trigger}' is not inside a concurrent region")]
    JoinOutsideConcurrent { from: String, trigger: String },

    #[error("Join for '{trigger}' into '{target}' does not cover every region of '{parent}'")]
    JoinSourcesIncomplete {
        trigger: String,
        target: String,
        parent: String,
    },
}
