//! Active-configuration types: state paths and the state of mind.
//!
//! A hierarchical machine is never "in one state": it occupies a set of
//! root-to-leaf chains, one per orthogonal region. `StatePath` is one such
//! chain and `StateOfMind` is the full set.

use super::state::State;
use serde::{Deserialize, Serialize};

/// Ordered chain of kinds from a top-level state down to a leaf.
///
/// Equality is structural: two paths are equal when they list the same
/// kinds in the same order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct StatePath<S: State> {
    kinds: Vec<S>,
}

impl<S: State> StatePath<S> {
    pub(crate) fn new(kinds: Vec<S>) -> Self {
        debug_assert!(!kinds.is_empty(), "a state path is never empty");
        Self { kinds }
    }

    /// All kinds on the path, top-level state first.
    pub fn kinds(&self) -> &[S] {
        &self.kinds
    }

    /// The active leaf at the bottom of the path.
    pub fn leaf(&self) -> &S {
        self.kinds.last().expect("a state path is never empty")
    }

    /// The top-level state at the head of the path.
    pub fn top(&self) -> &S {
        self.kinds.first().expect("a state path is never empty")
    }

    /// True if the path passes through `kind`.
    pub fn contains(&self, kind: &S) -> bool {
        self.kinds.contains(kind)
    }

    /// Number of kinds on the path.
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Always false: paths have at least one kind.
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

/// The machine's active configuration: the set of currently-occupied
/// root-to-leaf paths.
///
/// With orthogonal regions several paths are active at once; any two
/// distinct paths diverge only where a concurrent state allows it. A
/// path's prefix kinds are all implicitly active, which is what
/// [`StateOfMind::contains`] reflects.
///
/// Equality is set equality: path order does not matter.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct StateOfMind<S: State> {
    paths: Vec<StatePath<S>>,
}

impl<S: State> StateOfMind<S> {
    pub(crate) fn new(paths: Vec<StatePath<S>>) -> Self {
        Self { paths }
    }

    /// The active paths, in insertion order.
    pub fn paths(&self) -> &[StatePath<S>] {
        &self.paths
    }

    /// True if any active path passes through `kind`.
    pub fn contains(&self, kind: &S) -> bool {
        self.paths.iter().any(|p| p.contains(kind))
    }

    /// The active leaves, one per path.
    pub fn leaves(&self) -> impl Iterator<Item = &S> {
        self.paths.iter().map(|p| p.leaf())
    }

    pub(crate) fn contains_path(&self, path: &StatePath<S>) -> bool {
        self.paths.contains(path)
    }

    pub(crate) fn insert(&mut self, path: StatePath<S>) {
        if !self.paths.contains(&path) {
            self.paths.push(path);
        }
    }

    pub(crate) fn remove(&mut self, path: &StatePath<S>) {
        self.paths.retain(|p| p != path);
    }
}

impl<S: State> PartialEq for StateOfMind<S> {
    fn eq(&self, other: &Self) -> bool {
        self.paths.len() == other.paths.len()
            && self.paths.iter().all(|p| other.paths.contains(p))
    }
}

impl<S: State> Eq for StateOfMind<S> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
    enum TestState {
        Running,
        AudioOn,
        VideoOn,
        On,
        Off,
    }

    impl State for TestState {
        fn name(&self) -> &str {
            match self {
                Self::Running => "Running",
                Self::AudioOn => "AudioOn",
                Self::VideoOn => "VideoOn",
                Self::On => "On",
                Self::Off => "Off",
            }
        }
    }

    fn audio_path() -> StatePath<TestState> {
        StatePath::new(vec![TestState::Running, TestState::AudioOn, TestState::On])
    }

    fn video_path() -> StatePath<TestState> {
        StatePath::new(vec![TestState::Running, TestState::VideoOn, TestState::Off])
    }

    #[test]
    fn path_exposes_leaf_and_top() {
        let path = audio_path();
        assert_eq!(path.top(), &TestState::Running);
        assert_eq!(path.leaf(), &TestState::On);
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn path_contains_every_kind_on_it() {
        let path = audio_path();
        assert!(path.contains(&TestState::Running));
        assert!(path.contains(&TestState::AudioOn));
        assert!(path.contains(&TestState::On));
        assert!(!path.contains(&TestState::VideoOn));
    }

    #[test]
    fn path_equality_is_structural() {
        assert_eq!(audio_path(), audio_path());
        assert_ne!(audio_path(), video_path());
    }

    #[test]
    fn mind_contains_prefix_kinds() {
        let mind = StateOfMind::new(vec![audio_path(), video_path()]);
        assert!(mind.contains(&TestState::Running));
        assert!(mind.contains(&TestState::AudioOn));
        assert!(mind.contains(&TestState::Off));
        let leaves: Vec<_> = mind.leaves().collect();
        assert_eq!(leaves, vec![&TestState::On, &TestState::Off]);
    }

    #[test]
    fn mind_equality_ignores_path_order() {
        let a = StateOfMind::new(vec![audio_path(), video_path()]);
        let b = StateOfMind::new(vec![video_path(), audio_path()]);
        assert_eq!(a, b);

        let c = StateOfMind::new(vec![audio_path()]);
        assert_ne!(a, c);
    }

    #[test]
    fn insert_deduplicates_paths() {
        let mut mind = StateOfMind::new(vec![audio_path()]);
        mind.insert(audio_path());
        assert_eq!(mind.paths().len(), 1);

        mind.insert(video_path());
        assert_eq!(mind.paths().len(), 2);

        mind.remove(&audio_path());
        assert_eq!(mind.paths().len(), 1);
        assert!(!mind.contains(&TestState::AudioOn));
    }

    #[test]
    fn mind_roundtrip_serialization() {
        let mind = StateOfMind::new(vec![audio_path(), video_path()]);
        let json = serde_json::to_string(&mind).unwrap();
        let back: StateOfMind<TestState> = serde_json::from_str(&json).unwrap();
        assert_eq!(mind, back);
    }
}
