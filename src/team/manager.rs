//! Team registry: CRUD, API-key issuance, and the two caches the spec calls
//! out by name (`apiKeyCache`, `inactiveTeamsCache`).
//!
//! Grounded on the teacher's `auth/user_store.rs` (sqlite-backed account
//! store with a default-admin seed) generalized from single-process JWT
//! users to multi-tenant bearer-token teams, plus the cache-consistency
//! rule from spec.md §4.F / §9: every mutation that changes `active` or
//! `api_key` invalidates both caches before returning.

use chrono::Utc;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::crypto;
use crate::db::teams::TeamRepository;
use crate::error::{AppError, AppResult};
use crate::team::Team;

pub struct TeamManager {
    repo: TeamRepository,
    api_key_prefix: String,
    /// bearer token -> team, populated lazily on lookup.
    api_key_cache: RwLock<HashMap<String, Team>>,
    /// teamIds known to be inactive, for fast AuthZ rejection without a DB hit.
    inactive_teams_cache: RwLock<HashSet<Uuid>>,
}

impl TeamManager {
    pub fn new(repo: TeamRepository, api_key_prefix: String) -> Self {
        Self {
            repo,
            api_key_prefix,
            api_key_cache: RwLock::new(HashMap::new()),
            inactive_teams_cache: RwLock::new(HashSet::new()),
        }
    }

    fn invalidate_caches(&self, team: &Team) {
        self.api_key_cache.write().remove(&team.api_key);
        if team.active {
            self.inactive_teams_cache.write().remove(&team.id);
        } else {
            self.inactive_teams_cache.write().insert(team.id);
        }
    }

    /// Admin-initiated team creation. Returns the team with its plaintext
    /// API key populated (shown once).
    pub async fn register_team(
        &self,
        name: String,
        email: String,
        contact_person: String,
        is_admin: bool,
    ) -> AppResult<Team> {
        if self.repo.get_by_email(email.clone()).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "a team with email {email} already exists"
            )));
        }

        let now = Utc::now();
        let team = Team {
            id: Uuid::new_v4(),
            name,
            email,
            contact_person,
            wallet_address: None,
            api_key: crypto::generate_api_key(&self.api_key_prefix),
            is_admin,
            active: true,
            deactivation_reason: None,
            deactivation_date: None,
            metadata: Value::Object(Default::default()),
            created_at: now,
            updated_at: now,
        };

        let inserted = self.repo.insert(team).await?;
        self.invalidate_caches(&inserted);
        Ok(inserted)
    }

    /// Public self-registration; requires a syntactically valid EVM wallet.
    pub async fn public_register_team(
        &self,
        name: String,
        email: String,
        contact_person: String,
        wallet_address: String,
    ) -> AppResult<Team> {
        if !Team::is_valid_wallet_address(&wallet_address) {
            return Err(AppError::Validation(
                "walletAddress must be a 0x-prefixed 40-hex-digit address".to_string(),
            ));
        }
        if self.repo.get_by_email(email.clone()).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "a team with email {email} already exists"
            )));
        }

        let now = Utc::now();
        let team = Team {
            id: Uuid::new_v4(),
            name,
            email,
            contact_person,
            wallet_address: Some(wallet_address),
            api_key: crypto::generate_api_key(&self.api_key_prefix),
            is_admin: false,
            active: true,
            deactivation_reason: None,
            deactivation_date: None,
            metadata: Value::Object(Default::default()),
            created_at: now,
            updated_at: now,
        };

        let inserted = self.repo.insert(team).await?;
        self.invalidate_caches(&inserted);
        Ok(inserted)
    }

    pub async fn get_team_by_api_key(&self, api_key: &str) -> AppResult<Option<Team>> {
        if let Some(team) = self.api_key_cache.read().get(api_key).cloned() {
            return Ok(Some(team));
        }
        let team = self.repo.get_by_api_key(api_key.to_string()).await?;
        if let Some(ref t) = team {
            self.api_key_cache.write().insert(api_key.to_string(), t.clone());
            if !t.active {
                self.inactive_teams_cache.write().insert(t.id);
            }
        }
        Ok(team)
    }

    pub async fn get_team(&self, id: Uuid) -> AppResult<Team> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("team not found".to_string()))
    }

    pub async fn list_teams(&self) -> AppResult<Vec<Team>> {
        Ok(self.repo.list_all().await?)
    }

    pub async fn any_admin_exists(&self) -> AppResult<bool> {
        Ok(self.repo.any_admin_exists().await?)
    }

    pub async fn update_profile(
        &self,
        id: Uuid,
        contact_person: Option<String>,
        metadata: Option<Value>,
    ) -> AppResult<Team> {
        self.repo.update_profile(id, contact_person, metadata).await?;
        // Profile-only updates must not break subsequent authentication: the
        // api_key_cache entry (if any) is now stale on contact_person/metadata,
        // so refresh it rather than evict it.
        let team = self.get_team(id).await?;
        if let Some(existing_key) = self
            .api_key_cache
            .read()
            .iter()
            .find(|(_, t)| t.id == id)
            .map(|(k, _)| k.clone())
        {
            self.api_key_cache.write().insert(existing_key, team.clone());
        }
        Ok(team)
    }

    pub async fn deactivate_team(&self, id: Uuid, reason: String) -> AppResult<Team> {
        self.repo.set_active(id, false, Some(reason)).await?;
        let team = self.get_team(id).await?;
        self.invalidate_caches(&team);
        Ok(team)
    }

    pub async fn reactivate_team(&self, id: Uuid) -> AppResult<Team> {
        self.repo.set_active(id, true, None).await?;
        let team = self.get_team(id).await?;
        self.invalidate_caches(&team);
        Ok(team)
    }

    /// Called by the competition manager when a team is enrolled in a new
    /// competition: a team that was deactivated by a previous competition's
    /// end must be removed from the inactive cache even before its `active`
    /// DB flag has propagated, so a racing authorization check that reads
    /// the cache first does not reject it. This is the fix for the
    /// re-activation-on-enrollment bug class the spec calls out.
    pub fn clear_inactive_cache_entry(&self, team_id: Uuid) {
        self.inactive_teams_cache.write().remove(&team_id);
        self.api_key_cache.write().retain(|_, t| t.id != team_id);
    }

    pub async fn delete_team(&self, id: Uuid) -> AppResult<()> {
        let team = self.get_team(id).await?;
        if team.is_admin {
            return Err(AppError::BusinessRule(
                "cannot delete an admin team".to_string(),
            ));
        }
        self.repo.delete(id).await?;
        self.api_key_cache.write().remove(&team.api_key);
        self.inactive_teams_cache.write().remove(&id);
        Ok(())
    }

    /// Admin-only reveal of a team's current API key.
    pub async fn get_team_api_key(&self, id: Uuid) -> AppResult<String> {
        let team = self.get_team(id).await?;
        if team.is_admin {
            return Err(AppError::Authorization(
                "cannot reveal the API key of an admin team".to_string(),
            ));
        }
        Ok(team.api_key)
    }
}
