use sator_core::models::{Decision, DecisionPrompt, DecisionTransition};

/// Everything the machine reports to listeners, in the order it happened.
#[derive(Debug, Clone, PartialEq)]
pub enum DecisionEvent {
    Opened(Decision),
    PromptRaised(DecisionPrompt),
    /// `timed_out` is set when the countdown, not an operator, resolved it.
    Resolved { decision: Decision, timed_out: bool },
    ModeChanged(DecisionTransition),
    Closed(Decision),
}

impl DecisionEvent {
    pub fn decision_id(&self) -> &str {
        match self {
            Self::Opened(d) | Self::Closed(d) => &d.id,
            Self::Resolved { decision, .. } => &decision.id,
            Self::PromptRaised(p) => &p.decision_id,
            Self::ModeChanged(t) => &t.decision_id,
        }
    }
}

/// Called after the transition is applied, outside the decision's lock.
pub trait DecisionListener: Send + Sync {
    fn on_decision_event(&self, event: &DecisionEvent);
}
