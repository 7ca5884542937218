// Path: crates/services/src/lib.rs
#![forbid(unsafe_code)]
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented,
        clippy::indexing_slicing
    )
)]

//! # Bastion Services
//!
//! The keepers owning consensus state: actor permissions and roles, network
//! properties, the validator lifecycle, missed-block reputation and governance.
//! Every keeper is stateless and reads and writes through [`bastion_api::state::StateAccess`],
//! so the host decides which store or overlay a call runs against.

pub mod governance;
pub mod permissions;
pub mod properties;
pub mod slashing;
pub mod staking;

pub use governance::GovernanceModule;
pub use permissions::PermissionKeeper;
pub use properties::PropertyKeeper;
pub use slashing::SlashingKeeper;
pub use staking::{StakingKeeper, ValidatorQuery, ValidatorQueryResponse};
