//! Static validation for frozen state graphs.
//!
//! The analyzer runs once at construction (skipped in production mode) and
//! on demand through `Machine::analyze`. It accumulates ALL violations it
//! finds before reporting, so a broken graph is fixable in one pass
//! instead of one error at a time.

pub mod rules;
pub mod violations;

pub use rules::Analyzer;
pub use violations::Violation;
