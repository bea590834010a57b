use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStep {
    SelectingBase,
    SelectingParts,
    Previewing,
    Reviewing,
}

impl SessionStep {
    pub fn index(&self) -> usize {
        match self {
            Self::SelectingBase => 0,
            Self::SelectingParts => 1,
            Self::Previewing => 2,
            Self::Reviewing => 3,
        }
    }

    pub fn as_key(&self) -> &'static str {
        match self {
            Self::SelectingBase => "selecting_base",
            Self::SelectingParts => "selecting_parts",
            Self::Previewing => "previewing",
            Self::Reviewing => "reviewing",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepEvent {
    Next,
    Back,
}

/// Facts about the session the transition guards need.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StepContext {
    pub has_base_component: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepAction {
    ComputeBillOfMaterials,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: SessionStep,
    pub to: SessionStep,
    pub event: StepEvent,
    pub actions: Vec<StepAction>,
}
