// Path: crates/tx/src/ante/poor_network.rs

use async_trait::async_trait;
use bastion_api::services::{NetworkHealth, TokenRateRegistry};
use bastion_api::state::StateAccess;
use bastion_api::transaction::context::TxContext;
use bastion_api::transaction::decorator::AnteStage;
use bastion_services::PropertyKeeper;
use bastion_types::app::{Coin, Message, Transaction, RATE_PRECISION};
use bastion_types::error::{FeeError, TransactionError};
use std::sync::Arc;

/// While the network is poor, only allowlisted message types are admitted. Bank sends
/// are always admitted while their value stays within `poor_network_max_bank_send`.
///
/// A send is valued in the bond denomination: bond coins count one to one and other
/// denominations are converted at their registered token rate. A denomination with no
/// registered rate cannot be valued and is refused.
pub struct PoorNetworkGate {
    bond_denom: String,
    health: Arc<dyn NetworkHealth>,
    rates: Arc<dyn TokenRateRegistry>,
    properties: PropertyKeeper,
}

impl PoorNetworkGate {
    pub fn new(
        bond_denom: &str,
        health: Arc<dyn NetworkHealth>,
        rates: Arc<dyn TokenRateRegistry>,
        properties: PropertyKeeper,
    ) -> Self {
        Self {
            bond_denom: bond_denom.to_string(),
            health,
            rates,
            properties,
        }
    }

    /// Value of `coins` in bond-denomination units.
    pub fn send_value(&self, state: &dyn StateAccess, coins: &[Coin]) -> Result<u128, TransactionError> {
        let mut total = 0u128;
        for coin in coins {
            let converted = if coin.denom == self.bond_denom {
                coin.amount
            } else {
                let rate = self.rates.rate(state, &coin.denom)?.ok_or_else(|| {
                    FeeError::MessageNotAllowedOnPoorNetwork(format!(
                        "send of {} has no token rate",
                        coin.denom
                    ))
                })?;
                coin.amount.saturating_mul(u128::from(rate.rate)) / RATE_PRECISION
            };
            total = total.saturating_add(converted);
        }
        Ok(total)
    }
}

#[async_trait]
impl AnteStage for PoorNetworkGate {
    fn name(&self) -> &'static str {
        "poor_network"
    }

    async fn validate(
        &self,
        state: &dyn StateAccess,
        tx: &Transaction,
        _ctx: &TxContext,
    ) -> Result<(), TransactionError> {
        if !self.health.is_poor_network(state)? {
            return Ok(());
        }
        let cap = u128::from(self.properties.network_properties(state)?.poor_network_max_bank_send);
        let allowlist = self.properties.poor_network_messages(state)?;

        for msg in &tx.messages {
            if let Message::BankSend { amount, .. } = msg {
                let value = self.send_value(state, amount)?;
                if value > cap {
                    return Err(FeeError::MessageNotAllowedOnPoorNetwork(format!(
                        "send worth {} {} exceeds {}",
                        value,
                        self.bond_denom,
                        cap
                    ))
                    .into());
                }
            } else if !allowlist.allows(msg.msg_type()) {
                return Err(FeeError::MessageNotAllowedOnPoorNetwork(msg.msg_type().to_string()).into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bastion_api::state::MemoryStore;
    use bastion_types::app::{
        msg_types, AccountId, NetworkProperties, PoorNetworkMessages, TokenRate, VoteOption,
    };
    use bastion_types::error::StateError;

    struct Fixed(bool);

    impl NetworkHealth for Fixed {
        fn is_poor_network(&self, _state: &dyn StateAccess) -> Result<bool, StateError> {
            Ok(self.0)
        }
    }

    /// One `uatom` is worth two `ukex`.
    struct Rates;

    impl TokenRateRegistry for Rates {
        fn rate(&self, _state: &dyn StateAccess, denom: &str) -> Result<Option<TokenRate>, StateError> {
            Ok((denom == "uatom").then(|| TokenRate {
                denom: denom.to_string(),
                rate: 2 * RATE_PRECISION as u64,
                fee_payments: false,
            }))
        }
    }

    fn setup(allow: &[&str]) -> MemoryStore {
        let mut store = MemoryStore::default();
        let properties = PropertyKeeper::default();
        properties
            .set_network_properties(&mut store, &NetworkProperties::default())
            .unwrap();
        properties
            .set_poor_network_messages(
                &mut store,
                &PoorNetworkMessages {
                    messages: allow.iter().map(|s| s.to_string()).collect(),
                },
            )
            .unwrap();
        store
    }

    fn gate(poor: bool) -> PoorNetworkGate {
        PoorNetworkGate::new(
            "ukex",
            Arc::new(Fixed(poor)),
            Arc::new(Rates),
            PropertyKeeper::default(),
        )
    }

    fn send_of(denom: &str, amount: u128) -> Message {
        Message::BankSend {
            to: AccountId([2; 32]),
            amount: vec![Coin::new(denom, amount)],
        }
    }

    fn send(amount: u128) -> Message {
        send_of("ukex", amount)
    }

    async fn check(store: &MemoryStore, gate: &PoorNetworkGate, messages: Vec<Message>) -> Result<(), TransactionError> {
        let tx = Transaction::new(AccountId([1; 32]), messages, vec![]);
        gate.validate(store, &tx, &TxContext::for_block(1, 1)).await
    }

    #[tokio::test]
    async fn healthy_network_admits_everything() {
        let store = setup(&[msg_types::VOTE_PROPOSAL]);
        assert!(check(&store, &gate(false), vec![Message::Pause, send(u128::MAX)]).await.is_ok());
    }

    #[tokio::test]
    async fn poor_network_enforces_the_allowlist() {
        let store = setup(&[msg_types::VOTE_PROPOSAL]);
        let vote = Message::VoteProposal {
            proposal_id: 1,
            option: VoteOption::Yes,
        };
        assert!(check(&store, &gate(true), vec![vote.clone()]).await.is_ok());
        assert_eq!(
            check(&store, &gate(true), vec![vote, Message::Pause]).await,
            Err(FeeError::MessageNotAllowedOnPoorNetwork("pause".into()).into())
        );
    }

    #[tokio::test]
    async fn bank_sends_are_capped_not_listed() {
        let store = setup(&[msg_types::VOTE_PROPOSAL]);
        assert!(check(&store, &gate(true), vec![send(1_000_000)]).await.is_ok());
        assert!(matches!(
            check(&store, &gate(true), vec![send(1_000_001)]).await,
            Err(TransactionError::Fee(FeeError::MessageNotAllowedOnPoorNetwork(_)))
        ));
    }

    #[tokio::test]
    async fn empty_allowlist_restricts_nothing_but_the_cap() {
        let store = setup(&[]);
        assert!(check(&store, &gate(true), vec![Message::Pause]).await.is_ok());
        assert!(check(&store, &gate(true), vec![send(2_000_000)]).await.is_err());
    }

    #[tokio::test]
    async fn foreign_sends_are_valued_at_their_rate() {
        let store = setup(&[]);
        assert!(check(&store, &gate(true), vec![send_of("uatom", 500_000)]).await.is_ok());
        assert!(matches!(
            check(&store, &gate(true), vec![send_of("uatom", 500_001)]).await,
            Err(TransactionError::Fee(FeeError::MessageNotAllowedOnPoorNetwork(_)))
        ));
        assert!(matches!(
            check(&store, &gate(true), vec![send_of("uosmo", 1)]).await,
            Err(TransactionError::Fee(FeeError::MessageNotAllowedOnPoorNetwork(_)))
        ));
        assert!(check(&store, &gate(false), vec![send_of("uosmo", u128::MAX)]).await.is_ok());
    }
}
