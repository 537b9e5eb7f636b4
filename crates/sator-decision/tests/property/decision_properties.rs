//! Property tests: the allowed-action cap holds for every input.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use sator_core::clock::ManualClock;
use sator_core::config::DecisionConfig;
use sator_core::errors::DecisionError;
use sator_core::models::ActionType;
use sator_core::Score;
use sator_decision::{allowed_actions, ConflictPosture, DecisionMachine, OpenDecision};

fn arb_action() -> impl Strategy<Value = ActionType> {
    prop_oneof![
        Just(ActionType::Act),
        Just(ActionType::Escalate),
        Just(ActionType::Defer)
    ]
}

proptest! {
    #[test]
    fn derived_actions_never_exceed_cap(
        trust in 0.0f64..=1.0,
        open in 0usize..5,
        high in any::<bool>(),
        cap in 1usize..=3,
    ) {
        let posture = ConflictPosture { open, high_open: high && open > 0 };
        let actions = allowed_actions(Score::new(trust), posture, cap);
        prop_assert!(actions.len() <= cap);
        prop_assert!(actions.len() <= 3);
        prop_assert!(actions.contains(&ActionType::Defer));
    }

    #[test]
    fn opened_decisions_respect_cap(
        requested in prop::collection::vec(arb_action(), 0..7),
        trust in 0.0f64..=1.0,
    ) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap());
        let machine = DecisionMachine::new(DecisionConfig::default(), Arc::new(clock));
        match machine.open(OpenDecision::new("lineage", Score::new(trust)).with_allowed_actions(requested)) {
            Ok(d) => prop_assert!(d.allowed_actions.len() <= 3),
            Err(e) => prop_assert!(matches!(e, DecisionError::ActionCapExceeded { .. }), "unexpected {e:?}"),
        }
    }
}
