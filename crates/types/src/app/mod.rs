// Path: crates/types/src/app/mod.rs
//! Core application-level data structures.

/// Governance proposals, votes, tallies and the data registry.
pub mod governance;
/// Account and consensus addresses.
pub mod identity;
/// Permission values, permission sets, actors and roles.
pub mod permissions;
/// Network properties, execution fees and the poor-network allowlist.
pub mod properties;
/// Validators, signing info and the missed-block window.
pub mod staking;
/// Transactions, messages, coins and token rates.
pub mod tx;

pub use governance::*;
pub use identity::{AccountId, ConsAddress};
pub use permissions::*;
pub use properties::*;
pub use staking::*;
pub use tx::*;

use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// A per-block report from the consensus layer: did the validator at `address`
/// sign the block?
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct SigningFact {
    /// Consensus address of the validator.
    pub address: ConsAddress,
    /// Whether its signature appeared in the commit.
    pub signed: bool,
}

/// The block context delivered by the host at the start of each block.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct BlockHeader {
    /// Block height.
    pub height: u64,
    /// Block time in UNIX seconds.
    pub time: u64,
    /// Signing facts for the previous block's commit.
    pub last_commit: Vec<SigningFact>,
}

/// Offset/limit pagination for listing queries.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Number of items to skip.
    pub offset: u64,
    /// Maximum number of items to return. Zero selects [`PageRequest::DEFAULT_LIMIT`].
    pub limit: u64,
    /// Whether to count every matching item.
    pub count_total: bool,
}

impl PageRequest {
    /// Limit applied when the request leaves it at zero.
    pub const DEFAULT_LIMIT: u64 = 100;

    /// The effective limit.
    pub fn effective_limit(&self) -> u64 {
        if self.limit == 0 {
            Self::DEFAULT_LIMIT
        } else {
            self.limit
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: Self::DEFAULT_LIMIT,
            count_total: false,
        }
    }
}

/// Pagination metadata returned with a page.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageResponse {
    /// Number of matching items, if requested.
    pub total: Option<u64>,
    /// Whether more items follow this page.
    pub has_more: bool,
}

/// Applies `page` to an iterator of matching items.
pub fn paginate<T>(items: impl Iterator<Item = T>, page: &PageRequest) -> (Vec<T>, PageResponse) {
    let offset = usize::try_from(page.offset).unwrap_or(usize::MAX);
    let limit = usize::try_from(page.effective_limit()).unwrap_or(usize::MAX);
    let mut total = 0u64;
    let mut out = Vec::new();
    let mut has_more = false;
    for (i, item) in items.enumerate() {
        total += 1;
        if i < offset {
            continue;
        }
        if out.len() < limit {
            out.push(item);
        } else {
            has_more = true;
            if !page.count_total {
                break;
            }
        }
    }
    (
        out,
        PageResponse {
            total: page.count_total.then_some(total),
            has_more,
        },
    )
}
