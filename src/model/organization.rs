//! Organization (tenant) schema
//!
//! Root of data isolation: every identity and most learning units reference
//! an organization id, or omit it to signal "global, shared across tenants".

use serde::{Deserialize, Serialize};

use super::Identified;

/// Remote collection / local namespace for organizations
pub const ORGANIZATION_COLLECTION: &str = "organizations";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrganizationStatus {
    Active,
    Pending,
    Suspended,
}

/// A tenant organization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub industry: String,
    pub seat_count: u32,
    pub status: OrganizationStatus,

    /// Email domain used to auto-assign registering identities
    /// (e.g. "helios.example") when no organization id is supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

impl Organization {
    /// Whether an email address belongs to this organization's domain.
    pub fn owns_email_domain(&self, email: &str) -> bool {
        match (&self.domain, email.rsplit_once('@')) {
            (Some(domain), Some((_, email_domain))) => domain.eq_ignore_ascii_case(email_domain),
            _ => false,
        }
    }
}

impl Identified for Organization {
    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn org() -> Organization {
        Organization {
            id: "ORG-1".into(),
            name: "Helios Aerospace".into(),
            industry: "Aerospace".into(),
            seat_count: 850,
            status: OrganizationStatus::Active,
            domain: Some("helios.example".into()),
        }
    }

    #[test]
    fn test_domain_match_is_case_insensitive() {
        let org = org();
        assert!(org.owns_email_domain("pilot@HELIOS.example"));
        assert!(!org.owns_email_domain("pilot@other.example"));
        assert!(!org.owns_email_domain("not-an-email"));
    }

    #[test]
    fn test_domain_field_optional_on_decode() {
        let decoded: Organization = serde_json::from_str(
            r#"{"id":"ORG-2","name":"X","industry":"Other","seat_count":1,"status":"Pending"}"#,
        )
        .expect("decode");
        assert_eq!(decoded.domain, None);
        assert_eq!(decoded.status, OrganizationStatus::Pending);
    }
}
