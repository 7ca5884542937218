// Path: crates/services/src/permissions/mod.rs
//! Actors, roles and effective-permission resolution.
//!
//! An actor's own blacklist beats everything, its own whitelist beats its roles, and
//! roles are consulted in ascending id order with the first matching rule winning.
//! Nothing matching means denied.

use bastion_api::state::{StateAccess, StateAccessExt};
use bastion_api::transaction::context::TxContext;
use bastion_types::app::{resolve_permission, AccountId, NetworkActor, PermValue, Role, RoleId};
use bastion_types::error::{GovernanceError, PermissionError, StateError, TransactionError};
use bastion_types::keys::{actor_key, role_key, ACTOR_PREFIX};

/// Stateless keeper for [`NetworkActor`] and [`Role`] records.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionKeeper;

impl PermissionKeeper {
    pub fn actor(
        &self,
        state: &dyn StateAccess,
        address: &AccountId,
    ) -> Result<Option<NetworkActor>, StateError> {
        state.get_decoded(&actor_key(address))
    }

    /// Loads the actor, or a fresh `Undefined` record joining at `height`.
    pub fn actor_or_new(
        &self,
        state: &dyn StateAccess,
        address: &AccountId,
        height: u64,
    ) -> Result<NetworkActor, StateError> {
        Ok(self
            .actor(state, address)?
            .unwrap_or_else(|| NetworkActor::new(*address, height)))
    }

    pub fn set_actor(
        &self,
        state: &mut dyn StateAccess,
        actor: &NetworkActor,
    ) -> Result<(), StateError> {
        state.put_encoded(&actor_key(&actor.address), actor)
    }

    /// Every stored actor, in address order.
    pub fn actors(&self, state: &dyn StateAccess) -> Result<Vec<NetworkActor>, StateError> {
        Ok(state
            .scan_decoded::<NetworkActor>(ACTOR_PREFIX)?
            .into_iter()
            .map(|(_, actor)| actor)
            .collect())
    }

    pub fn role(&self, state: &dyn StateAccess, id: RoleId) -> Result<Option<Role>, StateError> {
        state.get_decoded(&role_key(id))
    }

    pub fn set_role(&self, state: &mut dyn StateAccess, role: &Role) -> Result<(), StateError> {
        state.put_encoded(&role_key(role.id), role)
    }

    fn existing_role(&self, state: &dyn StateAccess, id: RoleId) -> Result<Role, TransactionError> {
        self.role(state, id)?
            .ok_or_else(|| GovernanceError::RoleNotFound(id).into())
    }

    /// Resolves `permission` for an actor record. Assigned roles that no longer exist
    /// are skipped.
    pub fn actor_has_permission(
        &self,
        state: &dyn StateAccess,
        actor: &NetworkActor,
        permission: PermValue,
    ) -> Result<bool, StateError> {
        // BTreeSet iteration gives ascending role ids.
        let mut roles = Vec::with_capacity(actor.roles.len());
        for id in &actor.roles {
            if let Some(role) = self.role(state, *id)? {
                roles.push(role);
            }
        }
        Ok(resolve_permission(
            &actor.permissions,
            roles.iter().map(|r| &r.permissions),
            permission,
        ))
    }

    /// Resolves `permission` for `address`. Unknown addresses hold no permissions.
    pub fn is_allowed(
        &self,
        state: &dyn StateAccess,
        address: &AccountId,
        permission: PermValue,
    ) -> Result<bool, StateError> {
        match self.actor(state, address)? {
            Some(actor) => self.actor_has_permission(state, &actor, permission),
            None => Ok(false),
        }
    }

    /// Fails with [`PermissionError::Denied`] unless `address` resolves `permission`.
    pub fn require(
        &self,
        state: &dyn StateAccess,
        address: &AccountId,
        permission: PermValue,
    ) -> Result<(), TransactionError> {
        if self.is_allowed(state, address, permission)? {
            Ok(())
        } else {
            Err(PermissionError::Denied {
                actor: address.to_string(),
                permission,
            }
            .into())
        }
    }

    /// Actors whose *own* whitelist contains `permission`, ignoring roles.
    pub fn actors_with_whitelisted_permission(
        &self,
        state: &dyn StateAccess,
        permission: PermValue,
    ) -> Result<Vec<AccountId>, StateError> {
        Ok(self
            .actors(state)?
            .into_iter()
            .filter(|a| a.permissions.is_whitelisted(permission))
            .map(|a| a.address)
            .collect())
    }

    /// Whitelists `permission` for `address` without checking the caller. Used by
    /// governance enactment and genesis.
    pub fn assign_permission(
        &self,
        state: &mut dyn StateAccess,
        address: &AccountId,
        permission: PermValue,
        height: u64,
    ) -> Result<(), TransactionError> {
        let mut actor = self.actor_or_new(state, address, height)?;
        actor.permissions.add_to_whitelist(permission)?;
        self.set_actor(state, &actor)?;
        tracing::info!(target: "gov", actor = %address, permission = %permission, "permission assigned");
        Ok(())
    }

    /// Stores a new role, failing if the id is taken.
    pub fn insert_role(&self, state: &mut dyn StateAccess, role: Role) -> Result<(), TransactionError> {
        if role.id == 0 {
            return Err(TransactionError::Invalid("role id must be non-zero".into()));
        }
        if self.role(state, role.id)?.is_some() {
            return Err(GovernanceError::RoleExists(role.id).into());
        }
        if !role.permissions.is_disjoint() {
            return Err(GovernanceError::InvalidContent(
                "role whitelist and blacklist overlap".into(),
            )
            .into());
        }
        self.set_role(state, &role)?;
        tracing::info!(target: "gov", role_id = role.id, name = %role.name, "role created");
        Ok(())
    }

    // --- Transaction handlers ---

    pub fn whitelist_permission(
        &self,
        state: &mut dyn StateAccess,
        ctx: &TxContext,
        address: &AccountId,
        permission: PermValue,
    ) -> Result<(), TransactionError> {
        self.require(state, &ctx.signer, PermValue::SetPermissions)?;
        self.assign_permission(state, address, permission, ctx.block_height)
    }

    pub fn blacklist_permission(
        &self,
        state: &mut dyn StateAccess,
        ctx: &TxContext,
        address: &AccountId,
        permission: PermValue,
    ) -> Result<(), TransactionError> {
        self.require(state, &ctx.signer, PermValue::SetPermissions)?;
        let mut actor = self.actor_or_new(state, address, ctx.block_height)?;
        actor.permissions.add_to_blacklist(permission)?;
        self.set_actor(state, &actor)?;
        tracing::info!(target: "gov", actor = %address, permission = %permission, "permission blacklisted");
        Ok(())
    }

    pub fn create_role(
        &self,
        state: &mut dyn StateAccess,
        ctx: &TxContext,
        role_id: RoleId,
        name: &str,
    ) -> Result<(), TransactionError> {
        self.require(state, &ctx.signer, PermValue::UpsertRole)?;
        self.insert_role(
            state,
            Role {
                id: role_id,
                name: name.to_string(),
                permissions: Default::default(),
            },
        )
    }

    pub fn assign_role(
        &self,
        state: &mut dyn StateAccess,
        ctx: &TxContext,
        address: &AccountId,
        role_id: RoleId,
    ) -> Result<(), TransactionError> {
        self.require(state, &ctx.signer, PermValue::UpsertRole)?;
        self.existing_role(state, role_id)?;
        let mut actor = self.actor_or_new(state, address, ctx.block_height)?;
        if !actor.roles.insert(role_id) {
            return Err(TransactionError::Invalid(format!(
                "role {} already assigned to {}",
                role_id, address
            )));
        }
        self.set_actor(state, &actor)?;
        Ok(())
    }

    pub fn remove_role(
        &self,
        state: &mut dyn StateAccess,
        ctx: &TxContext,
        address: &AccountId,
        role_id: RoleId,
    ) -> Result<(), TransactionError> {
        self.require(state, &ctx.signer, PermValue::UpsertRole)?;
        let mut actor = self.actor_or_new(state, address, ctx.block_height)?;
        if !actor.roles.remove(&role_id) {
            return Err(TransactionError::Invalid(format!(
                "role {} is not assigned to {}",
                role_id, address
            )));
        }
        self.set_actor(state, &actor)?;
        Ok(())
    }

    /// Applies `edit` to a role's permission set after the `UpsertRole` check.
    pub fn update_role_permissions<F>(
        &self,
        state: &mut dyn StateAccess,
        ctx: &TxContext,
        role_id: RoleId,
        edit: F,
    ) -> Result<(), TransactionError>
    where
        F: FnOnce(&mut bastion_types::app::PermissionSet) -> Result<(), PermissionError>,
    {
        self.require(state, &ctx.signer, PermValue::UpsertRole)?;
        let mut role = self.existing_role(state, role_id)?;
        edit(&mut role.permissions)?;
        self.set_role(state, &role)?;
        Ok(())
    }
}
