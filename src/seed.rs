//! Seed dataset - immutable baseline records
//!
//! Shipped with the system and created once, outside the running engine.
//! The seed tier participates in every merge as the lowest-precedence
//! baseline; it is never mutated at runtime (local writes go to the
//! override cache, never here).

use crate::model::{
    Difficulty, Identity, IdentityStatus, LearningUnit, NodeKind, Organization,
    OrganizationStatus, ProgressionState, Rank, Role, Task, UnitCategory, UnitNode, UnitStatus,
};

/// Tenant id assigned to identities that belong to no real organization.
pub const GLOBAL_TENANT: &str = "GLOBAL";

/// Baseline records for organizations, identities and learning units.
///
/// Fields are public so tests can construct reduced datasets; production
/// callers use [`SeedDataset::builtin`].
#[derive(Debug, Clone)]
pub struct SeedDataset {
    pub organizations: Vec<Organization>,
    pub identities: Vec<Identity>,
    pub learning_units: Vec<LearningUnit>,
}

impl Default for SeedDataset {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SeedDataset {
    /// An empty dataset, useful for tests that want full control.
    pub fn empty() -> Self {
        Self {
            organizations: Vec::new(),
            identities: Vec::new(),
            learning_units: Vec::new(),
        }
    }

    /// The built-in baseline shipped with the platform.
    pub fn builtin() -> Self {
        Self {
            organizations: builtin_organizations(),
            identities: builtin_identities(),
            learning_units: builtin_units(),
        }
    }

    /// Baseline tasks for a unit that has none of its own.
    ///
    /// Generated rather than stored: every unit gets the same two-step
    /// verification/application pair until real tasks are authored.
    pub fn baseline_tasks(unit_id: &str) -> Vec<Task> {
        vec![
            Task {
                id: format!("T-{unit_id}-1"),
                unit_id: unit_id.to_string(),
                title: "Concept Verification".into(),
                difficulty: Difficulty::Easy,
                completed: true,
            },
            Task {
                id: format!("T-{unit_id}-2"),
                unit_id: unit_id.to_string(),
                title: "Practical Application".into(),
                difficulty: Difficulty::Medium,
                completed: false,
            },
        ]
    }
}

fn builtin_organizations() -> Vec<Organization> {
    vec![
        Organization {
            id: "ORG-NORTHWIND".into(),
            name: "Northwind Automotive".into(),
            industry: "Automotive".into(),
            seat_count: 1420,
            status: OrganizationStatus::Active,
            domain: Some("northwind.example".into()),
        },
        Organization {
            id: "ORG-HELIOS".into(),
            name: "Helios Aerospace".into(),
            industry: "Aerospace".into(),
            seat_count: 850,
            status: OrganizationStatus::Active,
            domain: Some("helios.example".into()),
        },
        Organization {
            id: "ORG-MERIDIAN".into(),
            name: "Meridian Refining".into(),
            industry: "Oil & Gas".into(),
            seat_count: 2100,
            status: OrganizationStatus::Pending,
            domain: Some("meridian.example".into()),
        },
    ]
}

fn identity(
    id: &str,
    name: &str,
    email: &str,
    role: Role,
    organization_id: &str,
    xp: u64,
    rank: Rank,
    badges: &[&str],
) -> Identity {
    Identity {
        id: id.into(),
        name: name.into(),
        email: email.into(),
        role,
        organization_id: organization_id.into(),
        status: IdentityStatus::Active,
        progression: ProgressionState {
            xp,
            rank,
            badges: badges.iter().map(|b| b.to_string()).collect(),
        },
    }
}

fn builtin_identities() -> Vec<Identity> {
    vec![
        identity(
            "ADM-001",
            "Sarah Connor",
            "sarah@lumen.example",
            Role::Admin,
            GLOBAL_TENANT,
            12_500,
            Rank::SystemsArchitect,
            &["b1", "b2"],
        ),
        identity(
            "TCH-102",
            "Otto Marek",
            "omarek@northwind.example",
            Role::Teacher,
            "ORG-NORTHWIND",
            8_000,
            Rank::SeniorEngineer,
            &["b2"],
        ),
        identity(
            "OP-442",
            "Alex Rivera",
            "arivera@northwind.example",
            Role::Student,
            "ORG-NORTHWIND",
            2_400,
            Rank::Technician,
            &["b1"],
        ),
        identity(
            "OP-445",
            "Piotr Kowalski",
            "pkowalski@northwind.example",
            Role::Student,
            "ORG-NORTHWIND",
            500,
            Rank::Operative,
            &[],
        ),
        identity(
            "OP-443",
            "Wei Chen",
            "wchen@helios.example",
            Role::Student,
            "ORG-HELIOS",
            4_500,
            Rank::Specialist,
            &["b1", "b3"],
        ),
        identity(
            "OP-444",
            "Jordan Smith",
            "jsmith@helios.example",
            Role::Student,
            "ORG-HELIOS",
            1_200,
            Rank::Technician,
            &[],
        ),
    ]
}

fn node(id: &str, title: &str, kind: NodeKind, completed: bool) -> UnitNode {
    UnitNode {
        id: id.into(),
        title: title.into(),
        kind,
        completed,
    }
}

fn builtin_units() -> Vec<LearningUnit> {
    vec![
        LearningUnit {
            id: "SAF-100".into(),
            title: "Lockout / Tagout".into(),
            category: UnitCategory::Safety,
            status: UnitStatus::Completed,
            progress: 100,
            organization_id: None,
            video_id: None,
            start_sec: None,
            content: None,
            nodes: Vec::new(),
            xp_reward: 500,
        },
        LearningUnit {
            id: "ALG-101".into(),
            title: "Algebra Foundations".into(),
            category: UnitCategory::Math,
            status: UnitStatus::Active,
            progress: 45,
            organization_id: None,
            video_id: Some("LwCRRUa8yTU".into()),
            start_sec: Some(0),
            content: Some(
                "Algebra is the study of mathematical symbols and the rules for \
                 manipulating them. In industrial settings, variables often represent \
                 pressure, temperature, or voltage."
                    .into(),
            ),
            nodes: vec![
                node("n1", "Variables", NodeKind::Video, true),
                node("n2", "Linear Equations", NodeKind::Read, false),
                node("n3", "Final Test", NodeKind::Quiz, false),
            ],
            xp_reward: 800,
        },
        LearningUnit {
            id: "PHY-202".into(),
            title: "Torque & Leverage".into(),
            category: UnitCategory::Physics,
            status: UnitStatus::Locked,
            progress: 0,
            organization_id: None,
            video_id: None,
            start_sec: None,
            content: Some(
                "Torque is a measure of the force that can cause an object to rotate \
                 about an axis. T = F * r * sin(theta)."
                    .into(),
            ),
            nodes: vec![
                node("n1", "Force Vectors", NodeKind::Video, false),
                node("n2", "Lever Arms", NodeKind::Read, false),
                node("n3", "Wrench Exam", NodeKind::Quiz, false),
            ],
            xp_reward: 1_000,
        },
        LearningUnit {
            id: "MEC-303".into(),
            title: "Hydraulic Systems".into(),
            category: UnitCategory::Mechanics,
            status: UnitStatus::Locked,
            progress: 0,
            organization_id: None,
            video_id: None,
            start_sec: None,
            content: None,
            nodes: Vec::new(),
            xp_reward: 1_500,
        },
        // Tenant-private content
        LearningUnit {
            id: "NW-900".into(),
            title: "Press Line Safety".into(),
            category: UnitCategory::Mechanics,
            status: UnitStatus::Locked,
            progress: 0,
            organization_id: Some("ORG-NORTHWIND".into()),
            video_id: None,
            start_sec: None,
            content: None,
            nodes: Vec::new(),
            xp_reward: 2_000,
        },
        LearningUnit {
            id: "HEL-101".into(),
            title: "Orbital Mechanics".into(),
            category: UnitCategory::Physics,
            status: UnitStatus::Locked,
            progress: 0,
            organization_id: Some("ORG-HELIOS".into()),
            video_id: None,
            start_sec: None,
            content: None,
            nodes: Vec::new(),
            xp_reward: 2_500,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_builtin_ids_unique() {
        let seed = SeedDataset::builtin();
        let org_ids: HashSet<_> = seed.organizations.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(org_ids.len(), seed.organizations.len());
        let unit_ids: HashSet<_> = seed.learning_units.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(unit_ids.len(), seed.learning_units.len());
    }

    #[test]
    fn test_builtin_emails_unique_case_insensitive() {
        let seed = SeedDataset::builtin();
        let emails: HashSet<String> = seed
            .identities
            .iter()
            .map(|i| i.email.to_ascii_lowercase())
            .collect();
        assert_eq!(emails.len(), seed.identities.len());
    }

    #[test]
    fn test_baseline_tasks_reference_unit() {
        let tasks = SeedDataset::baseline_tasks("ALG-101");
        assert_eq!(tasks.len(), 2);
        assert!(tasks.iter().all(|t| t.unit_id == "ALG-101"));
        assert!(tasks.iter().all(|t| t.id.contains("ALG-101")));
    }

    #[test]
    fn test_global_and_scoped_units_present() {
        let seed = SeedDataset::builtin();
        assert!(seed.learning_units.iter().any(|u| u.is_global()));
        assert!(seed
            .learning_units
            .iter()
            .any(|u| u.organization_id.as_deref() == Some("ORG-HELIOS")));
    }
}
