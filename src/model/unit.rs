//! Learning unit schema
//!
//! A unit with no organization id is global: visible to every tenant. A unit
//! with an organization id is visible only to that tenant (and to operator
//! roles in unscoped views).

use serde::{Deserialize, Serialize};

use super::Identified;

/// Remote collection / local namespace for learning units
pub const UNIT_COLLECTION: &str = "learning-units";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitCategory {
    Math,
    Physics,
    Safety,
    Mechanics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitStatus {
    Locked,
    Active,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Video,
    Read,
    Quiz,
}

/// One ordered sub-step within a unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitNode {
    pub id: String,
    pub title: String,
    pub kind: NodeKind,
    #[serde(default)]
    pub completed: bool,
}

/// A learning unit, optionally scoped to one tenant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningUnit {
    pub id: String,
    pub title: String,
    pub category: UnitCategory,
    pub status: UnitStatus,

    /// Completion progress, 0-100
    #[serde(default)]
    pub progress: u8,

    /// Absent means global: visible to all tenants.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_sec: Option<u32>,

    /// Free-text lesson body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Ordered sub-steps
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<UnitNode>,

    /// Experience granted on first completion
    #[serde(default)]
    pub xp_reward: u64,
}

impl LearningUnit {
    /// Global units carry no organization id.
    pub fn is_global(&self) -> bool {
        self.organization_id.is_none()
    }
}

impl Identified for LearningUnit {
    fn id(&self) -> &str {
        &self.id
    }
}
