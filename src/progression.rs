//! Progression engine - experience accrual, rank transitions, badges
//!
//! Experience points are monotonically non-decreasing over an identity's
//! lifetime and rank is a pure function of current experience, so the rank
//! never downgrades. Identity resolution for an award is a point lookup,
//! tried remote, then local, then seed.
//!
//! Persistence order matches the write-path guarantee: the local shadow
//! write completes first (the whole read-modify-write runs under the cache's
//! namespace lock, so concurrent writers on a shared profile serialize and
//! cannot lose an update), then the remote write is attempted and its
//! failure absorbed.

use std::sync::Arc;

use serde_json::{json, Value as JsonValue};
use tracing::{debug, info, warn};

use crate::local::LocalOverrideCache;
use crate::model::{Identity, Rank, IDENTITY_COLLECTION};
use crate::remote::RemoteStore;
use crate::seed::SeedDataset;
use crate::types::{LumenError, Result};

/// Rank ladder with minimum XP thresholds, ascending.
///
/// Rank resolution is a linear reverse scan of this list; at five entries
/// that is the right tool, not an optimization target.
pub const RANK_TABLE: [(Rank, u64); 5] = [
    (Rank::Operative, 0),
    (Rank::Technician, 1_000),
    (Rank::Specialist, 3_000),
    (Rank::SeniorEngineer, 6_000),
    (Rank::SystemsArchitect, 10_000),
];

/// Highest-threshold rank whose minimum does not exceed the given total.
pub fn rank_for_xp(xp: u64) -> Rank {
    RANK_TABLE
        .iter()
        .rev()
        .find(|(_, min_xp)| xp >= *min_xp)
        .map(|(rank, _)| *rank)
        .unwrap_or(Rank::Operative)
}

/// Declarative badge definition. The criterion describes a predicate over an
/// identity's recorded activity; evaluating it is the caller's
/// responsibility - the engine only records the earned badge id.
#[derive(Debug, Clone, Copy)]
pub struct BadgeDef {
    pub id: &'static str,
    pub name: &'static str,
    pub criterion: &'static str,
}

/// Badge catalog.
pub const BADGES: [BadgeDef; 5] = [
    BadgeDef {
        id: "b1",
        name: "System Initialization",
        criterion: "first learning unit completed",
    },
    BadgeDef {
        id: "b2",
        name: "Zero Tolerance",
        criterion: "100% accuracy on an assessment",
    },
    BadgeDef {
        id: "b3",
        name: "Velocity Efficiency",
        criterion: "unit cycle completed in record time",
    },
    BadgeDef {
        id: "b4",
        name: "Protocol Alpha",
        criterion: "full compliance with safety standards",
    },
    BadgeDef {
        id: "b5",
        name: "Neural Uplink",
        criterion: "assistant session completed",
    },
];

/// Result of an experience award.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwardOutcome {
    pub new_total: u64,
    /// Set only when the resolved rank differs from the previously stored
    /// one - never on the first (lowest) rank.
    pub new_rank: Option<Rank>,
}

/// Which tier yielded the identity record for a point lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IdentitySource {
    Remote,
    Local,
    Seed,
}

/// Engine computing XP accrual, rank transitions and badge grants.
#[derive(Clone)]
pub struct ProgressionEngine {
    remote: Option<Arc<dyn RemoteStore>>,
    local: LocalOverrideCache,
    seed: Arc<SeedDataset>,
}

impl ProgressionEngine {
    pub fn new(
        remote: Option<Arc<dyn RemoteStore>>,
        local: LocalOverrideCache,
        seed: Arc<SeedDataset>,
    ) -> Self {
        Self {
            remote,
            local,
            seed,
        }
    }

    /// Point lookup: remote first, then local override, then seed.
    async fn resolve_identity(&self, identity_id: &str) -> Result<(Identity, IdentitySource)> {
        if let Some(remote) = &self.remote {
            match remote.get(IDENTITY_COLLECTION, identity_id).await {
                Ok(Some(doc)) => match serde_json::from_value::<Identity>(doc) {
                    Ok(identity) => return Ok((identity, IdentitySource::Remote)),
                    Err(err) => {
                        warn!(identity_id, error = %err, "Undecodable remote identity, falling back");
                    }
                },
                Ok(None) => {}
                Err(err) => {
                    debug!(identity_id, error = %err, "Remote identity lookup failed, falling back");
                }
            }
        }

        if let Some(identity) = self
            .local
            .load::<Identity>(IDENTITY_COLLECTION)
            .into_iter()
            .find(|identity| identity.id == identity_id)
        {
            return Ok((identity, IdentitySource::Local));
        }

        if let Some(identity) = self
            .seed
            .identities
            .iter()
            .find(|identity| identity.id == identity_id)
            .cloned()
        {
            return Ok((identity, IdentitySource::Seed));
        }

        Err(LumenError::NotFound(format!("identity {identity_id}")))
    }

    /// The freshest base for a read-modify-write: the local override copy if
    /// one exists (it is authoritative for unsynced writes), else the record
    /// resolved at call time.
    fn base_from_records(records: &[JsonValue], resolved: &Identity) -> Identity {
        records
            .iter()
            .find(|record| record.get("id").and_then(JsonValue::as_str) == Some(resolved.id.as_str()))
            .and_then(|record| serde_json::from_value::<Identity>(record.clone()).ok())
            .map(|local_copy| {
                // Remote may be ahead of an old shadow copy; keep the max.
                if local_copy.progression.xp >= resolved.progression.xp {
                    local_copy
                } else {
                    resolved.clone()
                }
            })
            .unwrap_or_else(|| resolved.clone())
    }

    /// Persist an identity mutation. The mutation is computed from the
    /// freshest cached base inside the cache's locked read-modify-write
    /// cycle, so concurrent writers serialize and never lose an update.
    fn commit_local<F>(&self, resolved: &Identity, mutate: F) -> Result<(Identity, Identity)>
    where
        F: FnOnce(Identity) -> Identity,
    {
        self.local
            .modify(IDENTITY_COLLECTION, |records| {
                let base = Self::base_from_records(records, resolved);
                let updated = mutate(base.clone());
                let value = serde_json::to_value(&updated)?;

                let slot = records.iter_mut().find(|record| {
                    record.get("id").and_then(JsonValue::as_str) == Some(resolved.id.as_str())
                });
                match slot {
                    Some(existing) => *existing = value,
                    None => records.push(value),
                }
                Ok::<_, serde_json::Error>((base, updated))
            })?
            .map_err(Into::into)
    }

    /// Award experience to an identity.
    ///
    /// A zero amount is a no-op that still returns the current total.
    /// Otherwise the new total and rank are persisted locally first (under
    /// the cache's namespace lock, against the freshest cached base), then
    /// pushed to the remote store when the record was resolved from there.
    pub async fn award_experience(
        &self,
        identity_id: &str,
        amount: u64,
    ) -> Result<AwardOutcome> {
        let (resolved, source) = self.resolve_identity(identity_id).await?;

        if amount == 0 {
            return Ok(AwardOutcome {
                new_total: resolved.progression.xp,
                new_rank: None,
            });
        }

        let (base, updated) = self.commit_local(&resolved, |mut identity| {
            identity.progression.xp += amount;
            // Pure function of XP, with an explicit no-downgrade guard.
            identity.progression.rank =
                rank_for_xp(identity.progression.xp).max(identity.progression.rank);
            identity
        })?;

        let outcome = AwardOutcome {
            new_total: updated.progression.xp,
            new_rank: (updated.progression.rank != base.progression.rank)
                .then_some(updated.progression.rank),
        };

        if source == IdentitySource::Remote {
            if let Some(remote) = &self.remote {
                let fields = json!({
                    "xp": outcome.new_total,
                    "rank": updated.progression.rank,
                });
                if let Err(err) = remote.update(IDENTITY_COLLECTION, identity_id, fields).await {
                    warn!(identity_id, error = %err, "Remote XP update failed, local shadow kept");
                }
            }
        }

        info!(
            identity_id,
            amount,
            new_total = outcome.new_total,
            rank_up = outcome.new_rank.is_some(),
            "Experience awarded"
        );
        Ok(outcome)
    }

    /// Record an earned badge on an identity. Idempotent: the earned list
    /// never contains duplicates, and a badge is never revoked.
    pub async fn award_badge(&self, identity_id: &str, badge_id: &str) -> Result<Vec<String>> {
        if !BADGES.iter().any(|badge| badge.id == badge_id) {
            return Err(LumenError::Validation(format!("unknown badge '{badge_id}'")));
        }

        let (resolved, source) = self.resolve_identity(identity_id).await?;

        let (base, updated) = self.commit_local(&resolved, |mut identity| {
            if !identity.progression.badges.iter().any(|earned| earned == badge_id) {
                identity.progression.badges.push(badge_id.to_string());
            }
            identity
        })?;

        if updated.progression.badges == base.progression.badges {
            // Already earned; nothing new to report upstream.
            return Ok(updated.progression.badges);
        }

        if source == IdentitySource::Remote {
            if let Some(remote) = &self.remote {
                let fields = json!({ "badges": updated.progression.badges });
                if let Err(err) = remote.update(IDENTITY_COLLECTION, identity_id, fields).await {
                    warn!(identity_id, error = %err, "Remote badge update failed, local shadow kept");
                }
            }
        }

        info!(identity_id, badge_id, "Badge awarded");
        Ok(updated.progression.badges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{IdentityStatus, ProgressionState, Role};
    use crate::remote::MemoryRemoteStore;
    use tempfile::tempdir;

    fn seed_identity(id: &str, xp: u64, rank: Rank) -> Identity {
        Identity {
            id: id.into(),
            name: "Test Subject".into(),
            email: format!("{id}@x.example"),
            role: Role::Student,
            organization_id: "ORG-A".into(),
            status: IdentityStatus::Active,
            progression: ProgressionState {
                xp,
                rank,
                badges: Vec::new(),
            },
        }
    }

    fn engine_with_seed(
        dir: &tempfile::TempDir,
        identities: Vec<Identity>,
        remote: Option<Arc<dyn RemoteStore>>,
    ) -> ProgressionEngine {
        let mut seed = SeedDataset::empty();
        seed.identities = identities;
        ProgressionEngine::new(remote, LocalOverrideCache::new(dir.path()), Arc::new(seed))
    }

    #[test]
    fn test_rank_table_boundaries() {
        assert_eq!(rank_for_xp(0), Rank::Operative);
        assert_eq!(rank_for_xp(999), Rank::Operative);
        assert_eq!(rank_for_xp(1_000), Rank::Technician);
        assert_eq!(rank_for_xp(2_999), Rank::Technician);
        assert_eq!(rank_for_xp(3_000), Rank::Specialist);
        assert_eq!(rank_for_xp(10_000), Rank::SystemsArchitect);
        assert_eq!(rank_for_xp(u64::MAX), Rank::SystemsArchitect);
    }

    #[tokio::test]
    async fn test_award_crosses_rank_threshold() {
        let dir = tempdir().expect("tempdir");
        let engine = engine_with_seed(
            &dir,
            vec![seed_identity("OP-900", 900, Rank::Operative)],
            None,
        );

        let outcome = engine.award_experience("OP-900", 150).await.expect("award");
        assert_eq!(outcome.new_total, 1_050);
        assert_eq!(outcome.new_rank, Some(Rank::Technician));
    }

    #[tokio::test]
    async fn test_zero_award_is_noop() {
        let dir = tempdir().expect("tempdir");
        let engine = engine_with_seed(
            &dir,
            vec![seed_identity("OP-900", 900, Rank::Operative)],
            None,
        );

        let outcome = engine.award_experience("OP-900", 0).await.expect("award");
        assert_eq!(outcome.new_total, 900);
        assert_eq!(outcome.new_rank, None);

        // Nothing was persisted locally by the no-op.
        let cached: Vec<Identity> = LocalOverrideCache::new(dir.path()).load(IDENTITY_COLLECTION);
        assert!(cached.is_empty());
    }

    #[tokio::test]
    async fn test_no_spurious_promotion_to_lowest_rank() {
        let dir = tempdir().expect("tempdir");
        let engine = engine_with_seed(&dir, vec![seed_identity("OP-NEW", 0, Rank::Operative)], None);

        let outcome = engine.award_experience("OP-NEW", 50).await.expect("award");
        assert_eq!(outcome.new_total, 50);
        assert_eq!(outcome.new_rank, None);
    }

    #[tokio::test]
    async fn test_xp_and_rank_monotone_across_awards() {
        let dir = tempdir().expect("tempdir");
        let engine = engine_with_seed(&dir, vec![seed_identity("OP-SEQ", 0, Rank::Operative)], None);

        let mut last_total = 0;
        let mut last_rank = Rank::Operative;
        for amount in [100, 0, 950, 2_000, 0, 7_000] {
            let outcome = engine
                .award_experience("OP-SEQ", amount)
                .await
                .expect("award");
            assert!(outcome.new_total >= last_total);
            let rank = outcome.new_rank.unwrap_or(last_rank);
            assert!(rank >= last_rank);
            last_total = outcome.new_total;
            last_rank = rank;
        }
        assert_eq!(last_total, 10_050);
        assert_eq!(last_rank, Rank::SystemsArchitect);
    }

    #[tokio::test]
    async fn test_remote_sourced_award_shadows_locally_and_updates_remote() {
        let dir = tempdir().expect("tempdir");
        let remote = Arc::new(MemoryRemoteStore::new());
        let identity = seed_identity("OP-R", 2_900, Rank::Technician);
        remote
            .put(
                IDENTITY_COLLECTION,
                "OP-R",
                serde_json::to_value(&identity).expect("encode"),
            )
            .await
            .expect("put");

        let engine = engine_with_seed(&dir, Vec::new(), Some(remote.clone()));
        let outcome = engine.award_experience("OP-R", 200).await.expect("award");
        assert_eq!(outcome.new_total, 3_100);
        assert_eq!(outcome.new_rank, Some(Rank::Specialist));

        // Remote got the update.
        let doc = remote
            .get(IDENTITY_COLLECTION, "OP-R")
            .await
            .expect("get")
            .expect("present");
        assert_eq!(doc["xp"], 3_100);
        assert_eq!(doc["rank"], "Specialist");

        // And the durable local shadow exists regardless of remote outcome.
        let cached: Vec<Identity> = LocalOverrideCache::new(dir.path()).load(IDENTITY_COLLECTION);
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].progression.xp, 3_100);
    }

    #[tokio::test]
    async fn test_award_survives_remote_write_failure() {
        let dir = tempdir().expect("tempdir");
        let remote = Arc::new(MemoryRemoteStore::new());
        let identity = seed_identity("OP-F", 100, Rank::Operative);
        remote
            .put(
                IDENTITY_COLLECTION,
                "OP-F",
                serde_json::to_value(&identity).expect("encode"),
            )
            .await
            .expect("put");

        let engine = engine_with_seed(&dir, Vec::new(), Some(remote.clone()));

        // First award lands while the remote is healthy.
        let _ = engine.award_experience("OP-F", 50).await.expect("award");

        // Then the service goes dark; the award still succeeds on the local
        // shadow copy without surfacing an error.
        remote.set_permission_denied(true);
        let outcome = engine.award_experience("OP-F", 50).await.expect("award");
        assert_eq!(outcome.new_total, 200);

        let cached: Vec<Identity> = LocalOverrideCache::new(dir.path()).load(IDENTITY_COLLECTION);
        assert_eq!(cached[0].progression.xp, 200);
    }

    #[tokio::test]
    async fn test_badges_never_duplicate() {
        let dir = tempdir().expect("tempdir");
        let engine = engine_with_seed(&dir, vec![seed_identity("OP-B", 0, Rank::Operative)], None);

        let first = engine.award_badge("OP-B", "b1").await.expect("award");
        assert_eq!(first, vec!["b1".to_string()]);

        let second = engine.award_badge("OP-B", "b1").await.expect("award");
        assert_eq!(second, vec!["b1".to_string()]);

        let third = engine.award_badge("OP-B", "b3").await.expect("award");
        assert_eq!(third, vec!["b1".to_string(), "b3".to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_badge_rejected() {
        let dir = tempdir().expect("tempdir");
        let engine = engine_with_seed(&dir, vec![seed_identity("OP-B", 0, Rank::Operative)], None);
        let result = engine.award_badge("OP-B", "nope").await;
        assert!(matches!(result, Err(LumenError::Validation(_))));
    }

    #[tokio::test]
    async fn test_unknown_identity_not_found() {
        let dir = tempdir().expect("tempdir");
        let engine = engine_with_seed(&dir, Vec::new(), None);
        let result = engine.award_experience("GHOST", 10).await;
        assert!(matches!(result, Err(LumenError::NotFound(_))));
    }
}
