// Path: crates/tx/src/ante/fee_range.rs

use bastion_api::services::TokenRateRegistry;
use bastion_api::state::StateAccess;
use bastion_api::transaction::context::TxContext;
use bastion_api::transaction::decorator::AnteStage;
use async_trait::async_trait;
use bastion_services::PropertyKeeper;
use bastion_types::app::{Coin, Message, NetworkProperties, Transaction, RATE_PRECISION};
use bastion_types::error::{FeeError, StateError, TransactionError};
use std::sync::Arc;

/// Converts the attached fee into the bond denomination and checks it against the
/// network's fee range and the worst-case execution cost of the messages.
pub struct ValidateFeeRange {
    bond_denom: String,
    rates: Arc<dyn TokenRateRegistry>,
    properties: PropertyKeeper,
}

impl ValidateFeeRange {
    pub fn new(bond_denom: &str, rates: Arc<dyn TokenRateRegistry>, properties: PropertyKeeper) -> Self {
        Self {
            bond_denom: bond_denom.to_string(),
            rates,
            properties,
        }
    }

    /// The fee's value in bond-denomination units.
    pub fn fee_amount(
        &self,
        state: &dyn StateAccess,
        props: &NetworkProperties,
        fee: &[Coin],
    ) -> Result<u128, TransactionError> {
        let mut total = 0u128;
        for coin in fee {
            if coin.denom != self.bond_denom && !props.enable_foreign_fee_payments {
                return Err(FeeError::ForeignFeeDisabled {
                    denom: coin.denom.clone(),
                }
                .into());
            }
            let rate = match self.rates.rate(state, &coin.denom)? {
                Some(rate) if rate.fee_payments => rate,
                _ => {
                    return Err(FeeError::DenomNotFeeEligible {
                        denom: coin.denom.clone(),
                    }
                    .into())
                }
            };
            let converted = coin.amount.saturating_mul(u128::from(rate.rate)) / RATE_PRECISION;
            total = total.saturating_add(converted);
        }
        Ok(total)
    }

    /// Sum of `max(execution_fee, failure_fee)` over the messages; types without an
    /// entry contribute nothing.
    pub fn execution_max_fee(
        &self,
        state: &dyn StateAccess,
        messages: &[Message],
    ) -> Result<u128, StateError> {
        let mut total = 0u128;
        for msg in messages {
            if let Some(fee) = self.properties.execution_fee(state, msg.msg_type())? {
                total = total.saturating_add(u128::from(fee.max_cost()));
            }
        }
        Ok(total)
    }
}

#[async_trait]
impl AnteStage for ValidateFeeRange {
    fn name(&self) -> &'static str {
        "fee_range"
    }

    async fn validate(
        &self,
        state: &dyn StateAccess,
        tx: &Transaction,
        _ctx: &TxContext,
    ) -> Result<(), TransactionError> {
        let props = self.properties.network_properties(state)?;
        let fee = self.fee_amount(state, &props, &tx.fee)?;
        let required = self.execution_max_fee(state, &tx.messages)?;

        let (min, max) = (u128::from(props.min_tx_fee), u128::from(props.max_tx_fee));
        if fee < min || fee > max {
            return Err(FeeError::FeeOutOfRange { fee, min, max }.into());
        }
        if fee < required {
            return Err(FeeError::FeeBelowExecutionCost { fee, required }.into());
        }
        tracing::trace!(target: "ante", fee, required, "fee within range");
        Ok(())
    }
}
