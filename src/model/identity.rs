//! Identity (user) schema and progression state
//!
//! Emails are unique case-insensitively across the whole system (seed +
//! local + remote combined); the service layer enforces this on
//! registration. Experience points are monotonically non-decreasing and
//! rank is a pure function of current experience.

use serde::{Deserialize, Serialize};

use super::Identified;

/// Remote collection / local namespace for identities
pub const IDENTITY_COLLECTION: &str = "identities";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Student,
    Teacher,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentityStatus {
    Active,
    Inactive,
    Advanced,
}

/// Rank ladder, ordered ascending by the XP threshold that unlocks it.
///
/// The derived `Ord` follows declaration order, which lets the progression
/// engine guarantee no downgrade with a plain `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rank {
    Operative,
    Technician,
    Specialist,
    #[serde(rename = "Senior Engineer")]
    SeniorEngineer,
    #[serde(rename = "Systems Architect")]
    SystemsArchitect,
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Operative => "Operative",
            Self::Technician => "Technician",
            Self::Specialist => "Specialist",
            Self::SeniorEngineer => "Senior Engineer",
            Self::SystemsArchitect => "Systems Architect",
        };
        f.write_str(name)
    }
}

/// Experience points, computed rank and earned badges for one identity.
///
/// A badge, once earned, is never revoked; the list never contains
/// duplicates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressionState {
    #[serde(default)]
    pub xp: u64,
    #[serde(default = "default_rank")]
    pub rank: Rank,
    #[serde(default)]
    pub badges: Vec<String>,
}

fn default_rank() -> Rank {
    Rank::Operative
}

impl Default for ProgressionState {
    fn default() -> Self {
        Self {
            xp: 0,
            rank: Rank::Operative,
            badges: Vec::new(),
        }
    }
}

/// A user identity scoped to one organization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub organization_id: String,
    pub status: IdentityStatus,

    /// Progression fields live inline on the identity document so a single
    /// point lookup resolves both the record and its XP state.
    #[serde(flatten)]
    pub progression: ProgressionState,
}

impl Identity {
    /// Case-insensitive email comparison used by the uniqueness check.
    pub fn email_matches(&self, email: &str) -> bool {
        self.email.eq_ignore_ascii_case(email)
    }
}

impl Identified for Identity {
    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_serde_names() {
        assert_eq!(
            serde_json::to_string(&Rank::SeniorEngineer).expect("encode"),
            r#""Senior Engineer""#
        );
        let rank: Rank = serde_json::from_str(r#""Systems Architect""#).expect("decode");
        assert_eq!(rank, Rank::SystemsArchitect);
    }

    #[test]
    fn test_rank_ordering_follows_ladder() {
        assert!(Rank::Operative < Rank::Technician);
        assert!(Rank::Specialist < Rank::SystemsArchitect);
    }

    #[test]
    fn test_progression_flattened_and_defaulted() {
        // A remote document written before progression fields existed still
        // decodes: xp 0, lowest rank, no badges.
        let decoded: Identity = serde_json::from_str(
            r#"{"id":"USR-1","name":"A","email":"a@x.example","role":"Student",
                "organization_id":"ORG-1","status":"Active"}"#,
        )
        .expect("decode");
        assert_eq!(decoded.progression.xp, 0);
        assert_eq!(decoded.progression.rank, Rank::Operative);

        let encoded = serde_json::to_value(&decoded).expect("encode");
        assert_eq!(encoded["xp"], 0);
        assert_eq!(encoded["rank"], "Operative");
    }

    #[test]
    fn test_email_match_case_insensitive() {
        let identity: Identity = serde_json::from_str(
            r#"{"id":"USR-1","name":"A","email":"Pilot@Helios.example","role":"Teacher",
                "organization_id":"ORG-1","status":"Active","xp":10,"rank":"Operative","badges":[]}"#,
        )
        .expect("decode");
        assert!(identity.email_matches("pilot@helios.EXAMPLE"));
    }
}
