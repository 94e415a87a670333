//! Trail definition format.
//!
//! A trail is the only artifact the engine persists: a JSON document that must
//! survive export/import without loss. Unknown keys (editor-only metadata) are
//! ignored on import.

use crate::error::TrailError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trail {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub steps: Vec<Step>,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

impl Trail {
    pub fn new(id: impl Into<String>, title: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            version: default_version(),
            steps,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, TrailError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, TrailError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self, TrailError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn step(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn is_last(&self, index: usize) -> bool {
        index + 1 >= self.steps.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    #[serde(default)]
    pub id: String,
    /// CSS selector, re-resolved every time the step is shown.
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub placement: Placement,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<StepAction>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_on: Option<AdvanceTrigger>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Step {
    pub fn new(id: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            target: target.into(),
            placement: Placement::default(),
            title: String::new(),
            content: String::new(),
            action: None,
            optional: false,
            next_on: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>, content: impl Into<String>) -> Self {
        self.title = title.into();
        self.content = content.into();
        self
    }

    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn advance_on(mut self, trigger: AdvanceTrigger) -> Self {
        self.next_on = Some(trigger);
        self
    }

    pub fn with_action(mut self, action: StepAction) -> Self {
        self.action = Some(action);
        self
    }
}

/// Side of the target the tooltip is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    Top,
    #[default]
    Bottom,
    Left,
    Right,
}

impl Placement {
    pub fn opposite(&self) -> Placement {
        match self {
            Placement::Top => Placement::Bottom,
            Placement::Bottom => Placement::Top,
            Placement::Left => Placement::Right,
            Placement::Right => Placement::Left,
        }
    }

    pub fn is_vertical(&self) -> bool {
        matches!(self, Placement::Top | Placement::Bottom)
    }
}

/// What the user is expected to do with the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepAction {
    Click,
    Input,
    Hover,
}

impl StepAction {
    pub fn hint(&self) -> &'static str {
        match self {
            StepAction::Click => "Click the highlighted element",
            StepAction::Input => "Type into the highlighted field",
            StepAction::Hover => "Hover over the highlighted element",
        }
    }
}

/// User interaction with the target that advances the trail on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdvanceTrigger {
    Click,
    Input,
}
