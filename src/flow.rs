//! Learning-flow state machine
//!
//! Models the map → briefing → content → test progression as an explicit
//! finite state machine with named states and transition guards, so illegal
//! states (e.g. a test with no selected unit, or any work on a locked unit)
//! are unrepresentable instead of being encoded in ad hoc mode flags.

use crate::model::{LearningUnit, UnitStatus};

/// Named states of the learning flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    /// Browsing the unit map; nothing selected.
    Map,
    /// A unit is selected and its briefing is shown.
    Briefing,
    /// Working through the unit's content nodes.
    Content,
    /// Taking the unit's final test.
    Test,
}

/// Transition failures.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FlowError {
    #[error("no unit selected")]
    NoUnitSelected,

    #[error("unit '{0}' is locked")]
    UnitLocked(String),

    #[error("cannot move from {from:?} to {to:?}")]
    InvalidTransition { from: FlowState, to: FlowState },
}

/// One learner's position in the flow.
#[derive(Debug, Clone)]
pub struct LearningFlow {
    state: FlowState,
    selected_unit: Option<LearningUnit>,
}

impl Default for LearningFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl LearningFlow {
    pub fn new() -> Self {
        Self {
            state: FlowState::Map,
            selected_unit: None,
        }
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn selected_unit(&self) -> Option<&LearningUnit> {
        self.selected_unit.as_ref()
    }

    fn guard_transition(&self, from: FlowState, to: FlowState) -> Result<(), FlowError> {
        if self.state != from {
            return Err(FlowError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        Ok(())
    }

    /// Map → Briefing. Locked units cannot be entered.
    pub fn select_unit(&mut self, unit: LearningUnit) -> Result<(), FlowError> {
        self.guard_transition(FlowState::Map, FlowState::Briefing)?;
        if unit.status == UnitStatus::Locked {
            return Err(FlowError::UnitLocked(unit.id));
        }
        self.selected_unit = Some(unit);
        self.state = FlowState::Briefing;
        Ok(())
    }

    /// Briefing → Content.
    pub fn begin_content(&mut self) -> Result<(), FlowError> {
        self.guard_transition(FlowState::Briefing, FlowState::Content)?;
        if self.selected_unit.is_none() {
            return Err(FlowError::NoUnitSelected);
        }
        self.state = FlowState::Content;
        Ok(())
    }

    /// Content → Test. Requires a selected, non-locked unit.
    pub fn begin_test(&mut self) -> Result<(), FlowError> {
        self.guard_transition(FlowState::Content, FlowState::Test)?;
        let unit = self.selected_unit.as_ref().ok_or(FlowError::NoUnitSelected)?;
        if unit.status == UnitStatus::Locked {
            return Err(FlowError::UnitLocked(unit.id.clone()));
        }
        self.state = FlowState::Test;
        Ok(())
    }

    /// Any state → Map, clearing the selection. Always allowed.
    pub fn return_to_map(&mut self) {
        self.state = FlowState::Map;
        self.selected_unit = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UnitCategory;

    fn unit(status: UnitStatus) -> LearningUnit {
        LearningUnit {
            id: "ALG-101".into(),
            title: "Algebra Foundations".into(),
            category: UnitCategory::Math,
            status,
            progress: 0,
            organization_id: None,
            video_id: None,
            start_sec: None,
            content: None,
            nodes: Vec::new(),
            xp_reward: 0,
        }
    }

    #[test]
    fn test_happy_path() {
        let mut flow = LearningFlow::new();
        assert_eq!(flow.state(), FlowState::Map);

        flow.select_unit(unit(UnitStatus::Active)).expect("select");
        assert_eq!(flow.state(), FlowState::Briefing);

        flow.begin_content().expect("content");
        flow.begin_test().expect("test");
        assert_eq!(flow.state(), FlowState::Test);

        flow.return_to_map();
        assert_eq!(flow.state(), FlowState::Map);
        assert!(flow.selected_unit().is_none());
    }

    #[test]
    fn test_locked_unit_refused_at_selection() {
        let mut flow = LearningFlow::new();
        let result = flow.select_unit(unit(UnitStatus::Locked));
        assert_eq!(result, Err(FlowError::UnitLocked("ALG-101".into())));
        assert_eq!(flow.state(), FlowState::Map);
    }

    #[test]
    fn test_cannot_skip_to_test_from_map() {
        let mut flow = LearningFlow::new();
        let result = flow.begin_test();
        assert_eq!(
            result,
            Err(FlowError::InvalidTransition {
                from: FlowState::Map,
                to: FlowState::Test,
            })
        );
    }

    #[test]
    fn test_cannot_reenter_briefing_mid_flow() {
        let mut flow = LearningFlow::new();
        flow.select_unit(unit(UnitStatus::Active)).expect("select");
        flow.begin_content().expect("content");

        let result = flow.select_unit(unit(UnitStatus::Active));
        assert!(matches!(
            result,
            Err(FlowError::InvalidTransition { from: FlowState::Content, .. })
        ));
    }
}
