// Path: crates/test_utils/src/chain.rs

//! An in-memory chain: a [`MemoryStore`] and a [`BlockExecutor`] advanced one block at a
//! time with a fixed block interval.

use anyhow::Result;
use bastion_api::state::MemoryStore;
use bastion_execution::{BlockExecutor, TxOutcome};
use bastion_types::app::{BlockHeader, SigningFact, Transaction};
use bastion_types::config::{EngineConfig, GenesisState};

/// Time of the genesis block.
pub const GENESIS_TIME: u64 = 1_000;

/// Seconds between consecutive blocks unless changed with [`TestChain::set_block_interval`].
pub const DEFAULT_BLOCK_INTERVAL: u64 = 5;

#[derive(Debug)]
pub struct TestChain {
    pub store: MemoryStore,
    pub executor: BlockExecutor,
    height: u64,
    time: u64,
    block_interval: u64,
}

impl TestChain {
    /// Applies `genesis` to a fresh store. No block is open afterwards.
    pub fn new(config: EngineConfig, genesis: &GenesisState) -> Result<Self> {
        bastion_telemetry::init::init_test_tracing();
        let mut store = MemoryStore::default();
        let executor = BlockExecutor::new(config);
        executor.init_genesis(&mut store, genesis)?;
        Ok(Self {
            store,
            executor,
            height: 0,
            time: GENESIS_TIME,
            block_interval: DEFAULT_BLOCK_INTERVAL,
        })
    }

    pub fn with_genesis(genesis: &GenesisState) -> Result<Self> {
        Self::new(EngineConfig::default(), genesis)
    }

    /// Height of the last block begun.
    pub fn height(&self) -> u64 {
        self.height
    }

    /// Time of the last block begun.
    pub fn time(&self) -> u64 {
        self.time
    }

    pub fn set_block_interval(&mut self, secs: u64) {
        self.block_interval = secs;
    }

    /// Moves the clock forward so the next block is `secs` later than it would be.
    pub fn skip_time(&mut self, secs: u64) {
        self.time = self.time.saturating_add(secs);
    }

    /// Opens the next block with the given commit facts.
    pub async fn begin_block(&mut self, last_commit: Vec<SigningFact>) -> Result<()> {
        let header = BlockHeader {
            height: self.height + 1,
            time: self.time + self.block_interval,
            last_commit,
        };
        self.executor.begin_block(&mut self.store, &header).await?;
        self.height = header.height;
        self.time = header.time;
        Ok(())
    }

    pub async fn deliver(&mut self, tx: &Transaction) -> Result<TxOutcome> {
        Ok(self.executor.deliver_tx(&mut self.store, tx).await?)
    }

    pub async fn check(&self, tx: &Transaction) -> Result<TxOutcome> {
        Ok(self.executor.check_tx(&self.store, tx).await?)
    }

    pub async fn end_block(&mut self) -> Result<()> {
        self.executor.end_block(&mut self.store).await?;
        Ok(())
    }

    /// Runs a whole block and returns the outcome of each transaction.
    pub async fn produce_block(
        &mut self,
        last_commit: Vec<SigningFact>,
        txs: &[Transaction],
    ) -> Result<Vec<TxOutcome>> {
        self.begin_block(last_commit).await?;
        let mut outcomes = Vec::with_capacity(txs.len());
        for tx in txs {
            outcomes.push(self.deliver(tx).await?);
        }
        self.end_block().await?;
        Ok(outcomes)
    }

    /// Produces empty blocks, each carrying `commit`, until the clock reaches `time`.
    pub async fn advance_to(&mut self, time: u64, commit: &[SigningFact]) -> Result<()> {
        anyhow::ensure!(self.block_interval > 0, "block interval is zero");
        while self.time < time {
            self.produce_block(commit.to_vec(), &[]).await?;
        }
        tracing::debug!(height = self.height, time = self.time, "test chain advanced");
        Ok(())
    }
}
