// Path: crates/services/src/properties/mod.rs
//! The network-property singleton, the execution-fee table, the poor-network
//! allowlist and the data registry.

use crate::permissions::PermissionKeeper;
use bastion_api::state::{StateAccess, StateAccessExt};
use bastion_api::transaction::context::TxContext;
use bastion_types::app::{
    paginate, DataRegistryEntry, ExecutionFee, NetworkProperties, NetworkProperty, PageRequest,
    PageResponse, PermValue, PoorNetworkMessages,
};
use bastion_types::error::{GovernanceError, StateError, TransactionError};
use bastion_types::keys::{
    data_registry_key, execution_fee_key, DATA_REGISTRY_PREFIX, EXECUTION_FEE_PREFIX,
    NETWORK_PROPERTIES_KEY, POOR_NETWORK_MESSAGES_KEY,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct PropertyKeeper {
    permissions: PermissionKeeper,
}

impl PropertyKeeper {
    pub fn new(permissions: PermissionKeeper) -> Self {
        Self { permissions }
    }

    /// The current network properties. The record is written at genesis, so a missing
    /// singleton means the store was never initialised.
    pub fn network_properties(
        &self,
        state: &dyn StateAccess,
    ) -> Result<NetworkProperties, StateError> {
        state
            .get_decoded(NETWORK_PROPERTIES_KEY)?
            .ok_or_else(|| StateError::KeyNotFound("network properties".into()))
    }

    pub fn set_network_properties(
        &self,
        state: &mut dyn StateAccess,
        properties: &NetworkProperties,
    ) -> Result<(), TransactionError> {
        properties.validate()?;
        state.put_encoded(NETWORK_PROPERTIES_KEY, properties)?;
        Ok(())
    }

    pub fn get_property(
        &self,
        state: &dyn StateAccess,
        key: NetworkProperty,
    ) -> Result<u64, StateError> {
        Ok(self.network_properties(state)?.get(key))
    }

    /// Looks a property up by its canonical name or numeric code.
    pub fn get_property_by_name(
        &self,
        state: &dyn StateAccess,
        name: &str,
    ) -> Result<u64, TransactionError> {
        let key: NetworkProperty = name.parse()?;
        Ok(self.get_property(state, key)?)
    }

    /// One read-modify-write of the singleton. Boolean properties treat any non-zero
    /// value as `true`.
    pub fn set_property(
        &self,
        state: &mut dyn StateAccess,
        key: NetworkProperty,
        value: u64,
    ) -> Result<(), TransactionError> {
        let mut properties = self.network_properties(state)?;
        properties.set(key, value)?;
        self.set_network_properties(state, &properties)?;
        tracing::info!(target: "gov", property = %key, value, "network property updated");
        Ok(())
    }

    pub fn execution_fee(
        &self,
        state: &dyn StateAccess,
        tx_type: &str,
    ) -> Result<Option<ExecutionFee>, StateError> {
        state.get_decoded(&execution_fee_key(tx_type))
    }

    pub fn set_execution_fee(
        &self,
        state: &mut dyn StateAccess,
        fee: &ExecutionFee,
    ) -> Result<(), TransactionError> {
        fee.validate()?;
        state.put_encoded(&execution_fee_key(&fee.transaction_type), fee)?;
        Ok(())
    }

    /// Every execution fee, ordered by transaction type.
    pub fn execution_fees(&self, state: &dyn StateAccess) -> Result<Vec<ExecutionFee>, StateError> {
        Ok(state
            .scan_decoded::<ExecutionFee>(EXECUTION_FEE_PREFIX)?
            .into_iter()
            .map(|(_, fee)| fee)
            .collect())
    }

    /// The poor-network allowlist; absent means empty, which restricts nothing.
    pub fn poor_network_messages(
        &self,
        state: &dyn StateAccess,
    ) -> Result<PoorNetworkMessages, StateError> {
        Ok(state
            .get_decoded(POOR_NETWORK_MESSAGES_KEY)?
            .unwrap_or_default())
    }

    pub fn set_poor_network_messages(
        &self,
        state: &mut dyn StateAccess,
        messages: &PoorNetworkMessages,
    ) -> Result<(), StateError> {
        state.put_encoded(POOR_NETWORK_MESSAGES_KEY, messages)
    }

    pub fn data_registry_entry(
        &self,
        state: &dyn StateAccess,
        key: &str,
    ) -> Result<DataRegistryEntry, TransactionError> {
        state
            .get_decoded(&data_registry_key(key))?
            .ok_or_else(|| GovernanceError::DataRegistryEntryNotFound(key.to_string()).into())
    }

    pub fn upsert_data_registry(
        &self,
        state: &mut dyn StateAccess,
        key: &str,
        entry: &DataRegistryEntry,
    ) -> Result<(), StateError> {
        state.put_encoded(&data_registry_key(key), entry)
    }

    /// Registry keys in ascending order.
    pub fn data_registry_keys(
        &self,
        state: &dyn StateAccess,
        page: &PageRequest,
    ) -> Result<(Vec<String>, PageResponse), StateError> {
        let mut keys = Vec::new();
        for entry in state.prefix_scan(DATA_REGISTRY_PREFIX)? {
            let (key, _) = entry?;
            let suffix = key.get(DATA_REGISTRY_PREFIX.len()..).unwrap_or_default();
            keys.push(String::from_utf8_lossy(suffix).into_owned());
        }
        Ok(paginate(keys.into_iter(), page))
    }

    // --- Transaction handlers ---

    pub fn handle_set_network_properties(
        &self,
        state: &mut dyn StateAccess,
        ctx: &TxContext,
        properties: &NetworkProperties,
    ) -> Result<(), TransactionError> {
        self.permissions
            .require(state, &ctx.signer, PermValue::ChangeTxFee)?;
        self.set_network_properties(state, properties)?;
        tracing::info!(target: "gov", signer = %ctx.signer, "network properties replaced");
        Ok(())
    }

    pub fn handle_set_execution_fee(
        &self,
        state: &mut dyn StateAccess,
        ctx: &TxContext,
        fee: &ExecutionFee,
    ) -> Result<(), TransactionError> {
        self.permissions
            .require(state, &ctx.signer, PermValue::ChangeTxFee)?;
        self.set_execution_fee(state, fee)
    }
}
