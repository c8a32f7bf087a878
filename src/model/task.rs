//! Task schema

use serde::{Deserialize, Serialize};

use super::Identified;

/// Remote collection / local namespace for tasks
pub const TASK_COLLECTION: &str = "tasks";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// A task attached to one learning unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub unit_id: String,
    pub title: String,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub completed: bool,
}

impl Identified for Task {
    fn id(&self) -> &str {
        &self.id
    }
}
