//! Given/When/Then helper for aggregate state-machine tests.
//!
//! A scenario replays the given events into a [`StreetName`], runs one
//! command through `decide`, and asserts on the outcome. Failures are
//! reported by panicking, as test helpers do.

#![allow(clippy::expect_used)] // Panics: scenario assertions report by panicking

use address_registry_core::event::SerializedEvent;
use address_registry_streetname::municipality::Municipalities;
use address_registry_streetname::{
    StreetName, StreetNameCommand, StreetNameError, StreetNameEvent,
};

use crate::mocks::StaticMunicipalities;

/// Fluent Given/When/Then scenario for the StreetName state machine.
pub struct AggregateScenario {
    given: Vec<StreetNameEvent>,
    municipalities: Box<dyn Municipalities>,
}

impl AggregateScenario {
    /// Start from the given event history. The first event must be the
    /// street name import.
    #[must_use]
    pub fn given(events: Vec<StreetNameEvent>) -> Self {
        Self {
            given: events,
            municipalities: Box::new(StaticMunicipalities::knowing(&["44021"])),
        }
    }

    /// Replace the municipality lookup (defaults to one knowing `44021`).
    #[must_use]
    pub fn with_municipalities(mut self, municipalities: impl Municipalities + 'static) -> Self {
        self.municipalities = Box::new(municipalities);
        self
    }

    /// Run one command against the replayed state.
    #[must_use]
    pub fn when(self, command: StreetNameCommand) -> ScenarioOutcome {
        let tail: Vec<SerializedEvent> = self
            .given
            .iter()
            .map(|event| SerializedEvent::from_event(event, None).expect("given event serializes"))
            .collect();
        let (state, _) = StreetName::replay(None, &tail).expect("given events replay");
        let result = state.decide(&command, self.municipalities.as_ref());
        ScenarioOutcome { result }
    }
}

/// The outcome of the `when` step, awaiting its assertion.
pub struct ScenarioOutcome {
    result: Result<
        address_registry_streetname::EmittedEvents,
        StreetNameError,
    >,
}

impl ScenarioOutcome {
    /// Assert the command emitted exactly these events, in order.
    ///
    /// # Panics
    ///
    /// Panics when the command failed or emitted anything else.
    pub fn then(self, expected: Vec<StreetNameEvent>) {
        let events = self.result.expect("command should succeed");
        assert_eq!(events.as_slice(), expected.as_slice());
    }

    /// Assert the command succeeded as a no-op.
    ///
    /// # Panics
    ///
    /// Panics when the command failed or emitted events.
    pub fn then_none(self) {
        let events = self.result.expect("command should succeed");
        assert!(
            events.is_empty(),
            "expected no events, got {}: {:?}",
            events.len(),
            events
        );
    }

    /// Assert the command was rejected with exactly this error.
    ///
    /// # Panics
    ///
    /// Panics when the command succeeded or failed differently.
    pub fn throws(self, expected: &StreetNameError) {
        match self.result {
            Ok(events) => panic_on_success(&events),
            Err(actual) => assert_eq!(&actual, expected),
        }
    }
}

#[allow(clippy::panic)] // Panics: assertion failure path of a test helper
fn panic_on_success(events: &[StreetNameEvent]) {
    panic!("expected the command to fail, but it emitted {events:?}");
}
