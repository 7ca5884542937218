//! Deterministic identities, transactions and genesis documents.
//!
//! Actor `n` uses account `[n; 32]` and consensus key `[n; 33]`, so tests can refer to
//! participants by a small number.

use bastion_types::app::{
    AccountId, ActorStatus, ClaimValidatorParams, Coin, ConsAddress, Message,
    NetworkActor, NetworkProperties, SigningFact, Transaction, SUDO_ROLE_ID,
};
use bastion_types::config::GenesisState;

/// Fee denomination used by every fixture.
pub const BOND_DENOM: &str = "ukex";

/// Fee attached by [`tx`]. Covers the default fee range and every default execution fee.
pub const DEFAULT_FEE: u128 = 1_000;

pub fn account(n: u8) -> AccountId {
    AccountId([n; 32])
}

pub fn cons_pubkey(n: u8) -> Vec<u8> {
    vec![n; 33]
}

pub fn cons_address(n: u8) -> ConsAddress {
    ConsAddress::from_pubkey(&cons_pubkey(n))
}

pub fn validator_params(n: u8, moniker: &str) -> ClaimValidatorParams {
    ClaimValidatorParams {
        moniker: moniker.to_string(),
        website: String::new(),
        social: String::new(),
        identity: String::new(),
        commission: 0,
        val_key: account(n),
        cons_pubkey: cons_pubkey(n),
    }
}

/// `amount` of the bond denomination.
pub fn fee(amount: u128) -> Vec<Coin> {
    vec![Coin::new(BOND_DENOM, amount)]
}

/// A transaction from actor `signer` paying [`DEFAULT_FEE`].
pub fn tx(signer: u8, messages: Vec<Message>) -> Transaction {
    Transaction::new(account(signer), messages, fee(DEFAULT_FEE))
}

/// A signing fact for validator `n`.
pub fn signed(n: u8) -> SigningFact {
    SigningFact {
        address: cons_address(n),
        signed: true,
    }
}

/// A missed-signature fact for validator `n`.
pub fn missed(n: u8) -> SigningFact {
    SigningFact {
        address: cons_address(n),
        signed: false,
    }
}

/// Builds genesis documents on top of [`GenesisState::default`].
#[derive(Debug, Clone, Default)]
pub struct GenesisBuilder {
    genesis: GenesisState,
}

impl GenesisBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds actor `n` holding the Sudo role.
    pub fn sudo(mut self, n: u8) -> Self {
        let mut actor = NetworkActor::new(account(n), 0);
        actor.roles.insert(SUDO_ROLE_ID);
        actor.status = ActorStatus::Active;
        self.genesis.actors.push(actor);
        self
    }

    /// Adds an Active validator seat for actor `n`.
    pub fn validator(mut self, n: u8, moniker: &str) -> Self {
        self.genesis.validators.push(validator_params(n, moniker));
        self
    }

    pub fn properties(mut self, edit: impl FnOnce(&mut NetworkProperties)) -> Self {
        edit(&mut self.genesis.network_properties);
        self
    }

    /// Admits `msg_type` while the network is in poor mode.
    pub fn allow_in_poor_network(mut self, msg_type: &str) -> Self {
        self.genesis
            .poor_network_messages
            .messages
            .insert(msg_type.to_string());
        self
    }

    /// Installs an empty poor-network allowlist, which restricts nothing.
    pub fn unrestricted_poor_network(mut self) -> Self {
        self.genesis.poor_network_messages.messages.clear();
        self
    }

    pub fn build(self) -> GenesisState {
        self.genesis
    }
}
