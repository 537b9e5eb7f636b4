//! Property tests: artifact hashes round-trip and any content edit changes them.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use sator_artifact::{recompute_hash, verify_artifact, ArtifactChain, SealRequest};
use sator_core::models::*;
use sator_core::{ManualClock, Score};

fn decision(id: &str, operator: &str, trust: f64, outcome: ActionType) -> Decision {
    let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    Decision {
        id: id.to_string(),
        lineage_id: "lineage-prop".to_string(),
        mode: DecisionMode::Decision,
        state: DecisionState::Resolved { outcome },
        created_at: at,
        evidence_ids: Default::default(),
        allowed_actions: vec![outcome, ActionType::Defer],
        trust_score: Score::new(trust),
        uncertainty_score: Score::new(trust).inverse(),
        timebox_seconds: 30,
        timebox_expires_at: at + Duration::seconds(30),
        action_taken: Some(outcome),
        action_details: None,
        action_taken_at: Some(at),
        operator_id: Some(operator.to_string()),
        prompt: None,
    }
}

fn outcome_strategy() -> impl Strategy<Value = ActionType> {
    prop_oneof![
        Just(ActionType::Act),
        Just(ActionType::Escalate),
        Just(ActionType::Defer),
    ]
}

proptest! {
    #[test]
    fn sealed_hash_round_trips(
        operators in prop::collection::vec("[a-z]{1,12}", 1..6),
        trust in 0.0f64..=1.0,
        outcome in outcome_strategy(),
    ) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap());
        let chain = ArtifactChain::with_clock(Arc::new(clock.clone()));
        let mut sealed = Vec::new();
        for (i, operator) in operators.iter().enumerate() {
            clock.advance_secs(1);
            let d = decision(&format!("d-{i}"), operator, trust, outcome);
            sealed.push(chain.seal(SealRequest::new(d)).unwrap());
        }
        for artifact in &sealed {
            prop_assert_eq!(recompute_hash(artifact).unwrap(), artifact.hash.clone());
        }
        prop_assert_eq!(chain.verify_lineage("lineage-prop").unwrap(), operators.len());
    }

    #[test]
    fn any_content_edit_changes_the_hash(
        operator in "[a-z]{1,12}",
        other in "[a-z]{1,12}",
        trust in 0.0f64..=1.0,
        details in proptest::option::of("[ -~]{0,40}"),
    ) {
        prop_assume!(operator != other);
        let chain = ArtifactChain::new();
        let mut d = decision("d-0", &operator, trust, ActionType::Act);
        d.action_details = details;
        let artifact = chain.seal(SealRequest::new(d)).unwrap();

        let mut edited = artifact.clone();
        if let ArtifactContent::Receipt(content) = &mut edited.content {
            content.decision.operator_id = Some(other);
        }
        prop_assert_ne!(recompute_hash(&edited).unwrap(), artifact.hash.clone());
        prop_assert!(verify_artifact(&edited).is_err());
    }

    #[test]
    fn relinking_changes_the_hash(prev in "[0-9a-f]{64}") {
        let chain = ArtifactChain::new();
        let artifact = chain
            .seal(SealRequest::new(decision("d-0", "op", 0.9, ActionType::Act)))
            .unwrap();
        let mut relinked = artifact.clone();
        relinked.previous_hash = Some(prev);
        prop_assert_ne!(recompute_hash(&relinked).unwrap(), artifact.hash.clone());
    }
}
