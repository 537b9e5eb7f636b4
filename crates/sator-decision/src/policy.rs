//! Allowed actions and recommendations from trust and conflict posture.

use sator_core::models::{ActionType, EvidenceConflict, Recommendation, SeverityBand, UncertaintyLevel};
use sator_core::Score;

/// Open-conflict summary a decision is gated on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConflictPosture {
    pub open: usize,
    pub high_open: bool,
}

impl ConflictPosture {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_conflicts(conflicts: &[EvidenceConflict]) -> Self {
        let open: Vec<&EvidenceConflict> = conflicts.iter().filter(|c| !c.resolved).collect();
        Self {
            open: open.len(),
            high_open: open.iter().any(|c| c.band == SeverityBand::High),
        }
    }

    pub fn any_open(&self) -> bool {
        self.open > 0
    }
}

/// Actions offered for a decision, at most `cap` of them.
///
/// `act` unless uncertainty is critical or a high conflict is open, `defer` always,
/// `escalate` when uncertainty is high or worse or any conflict is open.
pub fn allowed_actions(trust: Score, posture: ConflictPosture, cap: usize) -> Vec<ActionType> {
    let level = UncertaintyLevel::from_trust(trust);
    let mut actions = Vec::with_capacity(3);
    if level != UncertaintyLevel::Critical && !posture.high_open {
        actions.push(ActionType::Act);
    }
    if level >= UncertaintyLevel::High || posture.any_open() {
        actions.push(ActionType::Escalate);
    }
    actions.push(ActionType::Defer);
    if actions.len() > cap {
        // Defer must survive truncation; it is the timeout action.
        actions.retain(|a| *a != ActionType::Defer);
        actions.truncate(cap.saturating_sub(1));
        actions.push(ActionType::Defer);
    }
    actions
}

pub fn recommend(trust: Score, posture: ConflictPosture) -> Recommendation {
    let level = UncertaintyLevel::from_trust(trust);
    let (action, rationale) = if posture.high_open {
        (
            ActionType::Defer,
            format!(
                "{} open conflict(s) including a high-severity divergence; hold until resolved",
                posture.open
            ),
        )
    } else {
        match level {
            UncertaintyLevel::Critical => (
                ActionType::Escalate,
                format!("trust {trust} is critically low; escalate to a supervisor"),
            ),
            UncertaintyLevel::High => (
                ActionType::Escalate,
                format!("trust {trust} leaves high uncertainty; escalate for review"),
            ),
            UncertaintyLevel::Moderate | UncertaintyLevel::Low => (
                ActionType::Act,
                format!("trust {trust} supports acting on current evidence"),
            ),
        }
    };
    Recommendation {
        action,
        rationale,
        uncertainty_level: level,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confident_and_clean_offers_act_and_defer() {
        let actions = allowed_actions(Score::new(0.94), ConflictPosture::none(), 3);
        assert_eq!(actions, vec![ActionType::Act, ActionType::Defer]);
    }

    #[test]
    fn open_conflict_adds_escalate() {
        let posture = ConflictPosture { open: 1, high_open: false };
        let actions = allowed_actions(Score::new(0.86), posture, 3);
        assert_eq!(actions, vec![ActionType::Act, ActionType::Escalate, ActionType::Defer]);
    }

    #[test]
    fn high_conflict_removes_act() {
        let posture = ConflictPosture { open: 1, high_open: true };
        let actions = allowed_actions(Score::new(0.9), posture, 3);
        assert_eq!(actions, vec![ActionType::Escalate, ActionType::Defer]);
        assert_eq!(recommend(Score::new(0.9), posture).action, ActionType::Defer);
    }

    #[test]
    fn critical_uncertainty_escalates() {
        let actions = allowed_actions(Score::new(0.1), ConflictPosture::none(), 3);
        assert_eq!(actions, vec![ActionType::Escalate, ActionType::Defer]);
        let rec = recommend(Score::new(0.1), ConflictPosture::none());
        assert_eq!(rec.action, ActionType::Escalate);
        assert_eq!(rec.uncertainty_level, UncertaintyLevel::Critical);
    }

    #[test]
    fn truncation_keeps_defer() {
        let posture = ConflictPosture { open: 2, high_open: false };
        assert_eq!(
            allowed_actions(Score::new(0.6), posture, 2),
            vec![ActionType::Act, ActionType::Defer]
        );
        assert_eq!(allowed_actions(Score::new(0.6), posture, 1), vec![ActionType::Defer]);
    }
}
