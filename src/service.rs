//! Data service facade
//!
//! The single entry point consumed by the presentation layer. Every read
//! fans out to the remote store and the local override cache, reduces the
//! tiers under fixed precedence (seed < remote < local) and applies tenant
//! scoping after the merge. Every write commits to the local cache first,
//! synchronously, then attempts the remote store; a remote failure is logged
//! and absorbed so the caller observes success whenever the local commit
//! succeeded.

use std::sync::Arc;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::assets::{AssetUploadGateway, BlobStore};
use crate::local::{merge_fields, LocalOverrideCache};
use crate::merge::{merge, scope_identities, scope_units, TenantScope};
use crate::model::{
    Identified, Identity, IdentityStatus, LearningUnit, Organization, ProgressionState, Role,
    Submission, Task, IDENTITY_COLLECTION, ORGANIZATION_COLLECTION, SUBMISSION_COLLECTION,
    TASK_COLLECTION, UNIT_COLLECTION,
};
use crate::probe::ConnectivityProbe;
use crate::progression::{AwardOutcome, ProgressionEngine};
use crate::remote::{decode_records, FieldFilter, RemoteStore};
use crate::seed::{SeedDataset, GLOBAL_TENANT};
use crate::types::{LumenError, Result};

/// Facade over the seed, local and remote tiers.
#[derive(Clone)]
pub struct DataService {
    seed: Arc<SeedDataset>,
    local: LocalOverrideCache,
    remote: Option<Arc<dyn RemoteStore>>,
    assets: AssetUploadGateway,
    probe: ConnectivityProbe,
    progression: ProgressionEngine,
}

impl DataService {
    pub fn new(
        seed: SeedDataset,
        local: LocalOverrideCache,
        remote: Option<Arc<dyn RemoteStore>>,
        blobs: Option<Arc<dyn BlobStore>>,
    ) -> Self {
        let seed = Arc::new(seed);
        Self {
            progression: ProgressionEngine::new(remote.clone(), local.clone(), seed.clone()),
            probe: ConnectivityProbe::new(remote.clone(), blobs.clone()),
            assets: AssetUploadGateway::new(blobs),
            seed,
            local,
            remote,
        }
    }

    /// List a remote collection, degrading to empty on any failure. An empty
    /// remote collection and an unreachable remote are indistinguishable
    /// here; both leave the seed and local tiers to carry the read.
    async fn remote_list(&self, collection: &str, filter: Option<&FieldFilter>) -> Vec<JsonValue> {
        let Some(remote) = &self.remote else {
            return Vec::new();
        };
        match remote.list(collection, filter).await {
            Ok(docs) => docs,
            Err(err) => {
                debug!(collection, error = %err, "Remote list failed, degrading to cached tiers");
                Vec::new()
            }
        }
    }

    /// Read one collection across all three tiers and merge.
    async fn fetch_merged<T>(&self, collection: &str, seed: Vec<T>) -> Vec<T>
    where
        T: Identified + DeserializeOwned,
    {
        let remote_docs = self.remote_list(collection, None).await;
        let remote = decode_records(collection, remote_docs);
        let local = self.local.load::<T>(collection);
        merge(seed, remote, local)
    }

    /// Write-path core: durable local commit first, remote upsert best-effort.
    async fn persist_keyed<T>(&self, collection: &str, record: &T) -> Result<()>
    where
        T: Identified + Serialize,
    {
        self.local.upsert(collection, record)?;
        if let Some(remote) = &self.remote {
            let doc = serde_json::to_value(record)?;
            if let Err(err) = remote.put(collection, record.id(), doc).await {
                warn!(
                    collection,
                    id = record.id(),
                    error = %err,
                    "Remote write failed, record kept in local override cache"
                );
            }
        }
        Ok(())
    }

    // ----- organizations -----

    /// All organizations across the three tiers. Organizations are the
    /// tenancy roots themselves, so the listing is never tenant-scoped.
    pub async fn list_organizations(&self) -> Vec<Organization> {
        self.fetch_merged(ORGANIZATION_COLLECTION, self.seed.organizations.clone())
            .await
    }

    pub async fn create_organization(&self, organization: Organization) -> Result<Organization> {
        self.persist_keyed(ORGANIZATION_COLLECTION, &organization).await?;
        info!(organization_id = %organization.id, "Organization created");
        Ok(organization)
    }

    // ----- identities -----

    /// Identities visible in one tenant, or the unscoped listing when no
    /// organization id is supplied (the operator view).
    pub async fn list_identities(&self, organization_id: Option<&str>) -> Vec<Identity> {
        let scope = match organization_id {
            Some(id) => TenantScope::Tenant(id.to_string()),
            None => TenantScope::All,
        };
        let merged = self
            .fetch_merged(IDENTITY_COLLECTION, self.seed.identities.clone())
            .await;
        scope_identities(merged, &scope)
    }

    pub async fn create_identity(&self, identity: Identity) -> Result<Identity> {
        self.persist_keyed(IDENTITY_COLLECTION, &identity).await?;
        info!(identity_id = %identity.id, "Identity created");
        Ok(identity)
    }

    /// Register a new identity.
    ///
    /// The email must be unique case-insensitively across every tier. When
    /// no organization id is supplied, the email domain is matched against
    /// the known organizations; identities in no organization land in the
    /// global tenant.
    pub async fn register_identity(
        &self,
        name: &str,
        email: &str,
        role: Role,
        organization_id: Option<&str>,
    ) -> Result<Identity> {
        if name.trim().is_empty() {
            return Err(LumenError::Validation("name must not be empty".into()));
        }
        if !email.contains('@') {
            return Err(LumenError::Validation(format!("invalid email '{email}'")));
        }

        let existing = self
            .fetch_merged::<Identity>(IDENTITY_COLLECTION, self.seed.identities.clone())
            .await;
        if existing.iter().any(|identity| identity.email_matches(email)) {
            return Err(LumenError::DuplicateEmail(email.to_string()));
        }

        let organization_id = match organization_id {
            Some(id) => id.to_string(),
            None => self
                .list_organizations()
                .await
                .iter()
                .find(|org| org.owns_email_domain(email))
                .map(|org| org.id.clone())
                .unwrap_or_else(|| GLOBAL_TENANT.to_string()),
        };

        let identity = Identity {
            id: format!("USR-{}", Uuid::new_v4()),
            name: name.to_string(),
            email: email.to_string(),
            role,
            organization_id,
            status: IdentityStatus::Active,
            progression: ProgressionState::default(),
        };

        self.persist_keyed(IDENTITY_COLLECTION, &identity).await?;
        info!(
            identity_id = %identity.id,
            organization_id = %identity.organization_id,
            "Identity registered"
        );
        Ok(identity)
    }

    // ----- learning units -----

    /// Learning units visible in one tenant: global units plus the tenant's
    /// own. Absent tenant means global units only.
    pub async fn list_learning_units(&self, organization_id: Option<&str>) -> Vec<LearningUnit> {
        self.list_learning_units_scoped(&TenantScope::from_option(organization_id))
            .await
    }

    /// Same read under an explicit scope, including the unscoped operator
    /// view (`TenantScope::All`).
    pub async fn list_learning_units_scoped(&self, scope: &TenantScope) -> Vec<LearningUnit> {
        let merged = self
            .fetch_merged(UNIT_COLLECTION, self.seed.learning_units.clone())
            .await;
        scope_units(merged, scope)
    }

    pub async fn create_learning_unit(&self, unit: LearningUnit) -> Result<LearningUnit> {
        self.persist_keyed(UNIT_COLLECTION, &unit).await?;
        info!(unit_id = %unit.id, "Learning unit created");
        Ok(unit)
    }

    /// Point lookup for one unit: remote first, then local, then seed.
    async fn resolve_unit(&self, unit_id: &str) -> Result<LearningUnit> {
        if let Some(remote) = &self.remote {
            match remote.get(UNIT_COLLECTION, unit_id).await {
                Ok(Some(doc)) => match serde_json::from_value::<LearningUnit>(doc) {
                    Ok(unit) => return Ok(unit),
                    Err(err) => {
                        warn!(unit_id, error = %err, "Undecodable remote unit, falling back");
                    }
                },
                Ok(None) => {}
                Err(err) => {
                    debug!(unit_id, error = %err, "Remote unit lookup failed, falling back");
                }
            }
        }

        if let Some(unit) = self
            .local
            .load::<LearningUnit>(UNIT_COLLECTION)
            .into_iter()
            .find(|unit| unit.id == unit_id)
        {
            return Ok(unit);
        }

        self.seed
            .learning_units
            .iter()
            .find(|unit| unit.id == unit_id)
            .cloned()
            .ok_or_else(|| LumenError::NotFound(format!("learning unit {unit_id}")))
    }

    /// Merge partial fields into one learning unit (status, progress, node
    /// completion). The patched record lands in the local cache whole, so
    /// subsequent merged reads serve it at local precedence; the remote
    /// update is best-effort.
    pub async fn patch_learning_unit(
        &self,
        unit_id: &str,
        fields: JsonValue,
    ) -> Result<LearningUnit> {
        let current = self.resolve_unit(unit_id).await?;

        let mut doc = serde_json::to_value(&current)?;
        merge_fields(&mut doc, &fields);
        let updated: LearningUnit = serde_json::from_value(doc)
            .map_err(|err| LumenError::Validation(format!("invalid unit patch: {err}")))?;
        if updated.progress > 100 {
            return Err(LumenError::Validation(format!(
                "progress {} out of range 0-100",
                updated.progress
            )));
        }

        self.local.upsert(UNIT_COLLECTION, &updated)?;
        if let Some(remote) = &self.remote {
            if let Err(err) = remote.update(UNIT_COLLECTION, unit_id, fields).await {
                warn!(unit_id, error = %err, "Remote unit patch failed, local override kept");
            }
        }
        info!(unit_id, "Learning unit patched");
        Ok(updated)
    }

    // ----- tasks -----

    /// Tasks attached to one unit. When neither the remote store nor the
    /// local cache holds any, the generated baseline pair stands in so a
    /// unit is never presented task-less.
    pub async fn list_tasks(&self, unit_id: &str) -> Vec<Task> {
        let filter = FieldFilter::new("unit_id", unit_id);
        let remote_docs = self.remote_list(TASK_COLLECTION, Some(&filter)).await;
        let remote = decode_records(TASK_COLLECTION, remote_docs);
        let local: Vec<Task> = self
            .local
            .load::<Task>(TASK_COLLECTION)
            .into_iter()
            .filter(|task| task.unit_id == unit_id)
            .collect();

        let merged = merge(Vec::new(), remote, local);
        if merged.is_empty() {
            return SeedDataset::baseline_tasks(unit_id);
        }
        merged
    }

    pub async fn create_task(&self, task: Task) -> Result<Task> {
        self.persist_keyed(TASK_COLLECTION, &task).await?;
        info!(task_id = %task.id, unit_id = %task.unit_id, "Task created");
        Ok(task)
    }

    // ----- submissions -----

    /// Record a submission: appended to the durable local log first, then
    /// appended remotely with a store-assigned key.
    pub async fn record_submission(&self, submission: Submission) -> Result<Submission> {
        self.local.append(SUBMISSION_COLLECTION, &submission)?;
        if let Some(remote) = &self.remote {
            let doc = serde_json::to_value(&submission)?;
            match remote.append(SUBMISSION_COLLECTION, doc).await {
                Ok(key) => {
                    debug!(submission_id = %submission.id, remote_key = %key, "Submission appended remotely");
                }
                Err(err) => {
                    warn!(
                        submission_id = %submission.id,
                        error = %err,
                        "Remote submission append failed, local log kept"
                    );
                }
            }
        }
        info!(
            submission_id = %submission.id,
            identity_id = %submission.identity_id,
            unit_id = %submission.unit_id,
            "Submission recorded"
        );
        Ok(submission)
    }

    // ----- progression -----

    pub async fn award_experience(&self, identity_id: &str, amount: u64) -> Result<AwardOutcome> {
        self.progression.award_experience(identity_id, amount).await
    }

    pub async fn award_badge(&self, identity_id: &str, badge_id: &str) -> Result<Vec<String>> {
        self.progression.award_badge(identity_id, badge_id).await
    }

    // ----- assets -----

    /// Upload bytes to the blob store, always yielding *some* resolvable URL.
    pub async fn upload_asset(&self, data: Bytes, destination_path: &str) -> String {
        self.assets.upload(data, destination_path).await
    }

    // ----- connectivity -----

    pub async fn is_remote_store_reachable(&self) -> bool {
        self.probe.is_remote_store_reachable().await
    }

    pub async fn is_blob_store_reachable(&self) -> bool {
        self.probe.is_blob_store_reachable().await
    }
}
