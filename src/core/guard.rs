//! Guard predicates for controlling state transitions.
//!
//! Guards are pure boolean functions over the incoming event. A transition
//! entry only fires when its guard is absent or returns true.

use super::state::Event;

/// Pure predicate that determines if a transition entry can fire for a
/// given event.
///
/// Guards are evaluated in authoring order within a transition list; the
/// first entry whose guard passes (or has no guard) wins. The engine treats
/// the predicate as opaque: it may close over external state, but it must
/// not have side effects.
///
/// # Example
///
/// ```rust
/// use mindtree::core::{Event, Guard};
///
/// #[derive(Clone, Debug)]
/// enum Thermal {
///     Heat { delta_degrees: i32 },
/// }
///
/// impl Event for Thermal {
///     fn name(&self) -> &str {
///         "Heat"
///     }
/// }
///
/// let boiling = Guard::new(|e: &Thermal| {
///     let Thermal::Heat { delta_degrees } = e;
///     *delta_degrees > 100
/// });
///
/// assert!(boiling.check(&Thermal::Heat { delta_degrees: 150 }));
/// assert!(!boiling.check(&Thermal::Heat { delta_degrees: 50 }));
/// ```
pub struct Guard<E: Event> {
    predicate: Box<dyn Fn(&E) -> bool + Send + Sync>,
}

impl<E: Event> Guard<E> {
    /// Create a guard from a pure predicate function.
    ///
    /// The predicate must be deterministic for a given event and
    /// thread-safe (Send + Sync).
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        Guard {
            predicate: Box::new(predicate),
        }
    }

    /// Check if the guard lets the transition fire for this event.
    pub fn check(&self, event: &E) -> bool {
        (self.predicate)(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug)]
    enum TestEvent {
        Melted,
        Heat { delta_degrees: i32 },
    }

    impl Event for TestEvent {
        fn name(&self) -> &str {
            match self {
                Self::Melted => "Melted",
                Self::Heat { .. } => "Heat",
            }
        }
    }

    #[test]
    fn guard_allows_matching_events() {
        let guard = Guard::new(|e: &TestEvent| matches!(e, TestEvent::Melted));

        assert!(guard.check(&TestEvent::Melted));
        assert!(!guard.check(&TestEvent::Heat { delta_degrees: 1 }));
    }

    #[test]
    fn guard_reads_event_payload() {
        let guard = Guard::new(|e: &TestEvent| match e {
            TestEvent::Heat { delta_degrees } => *delta_degrees > 100,
            _ => false,
        });

        assert!(guard.check(&TestEvent::Heat { delta_degrees: 150 }));
        assert!(!guard.check(&TestEvent::Heat { delta_degrees: 100 }));
        assert!(!guard.check(&TestEvent::Melted));
    }

    #[test]
    fn guard_is_deterministic() {
        let event = TestEvent::Heat { delta_degrees: 42 };
        let guard = Guard::new(|e: &TestEvent| match e {
            TestEvent::Heat { delta_degrees } => *delta_degrees > 0,
            _ => false,
        });

        let result1 = guard.check(&event);
        let result2 = guard.check(&event);

        assert_eq!(result1, result2);
    }

    #[test]
    fn guard_can_close_over_external_state() {
        let threshold = 10;
        let guard = Guard::new(move |e: &TestEvent| match e {
            TestEvent::Heat { delta_degrees } => *delta_degrees > threshold,
            _ => false,
        });

        assert!(guard.check(&TestEvent::Heat { delta_degrees: 11 }));
        assert!(!guard.check(&TestEvent::Heat { delta_degrees: 9 }));
    }
}
