// Path: crates/execution/tests/state_machine.rs

use async_trait::async_trait;
use bastion_api::services::ExternalMessageHandler;
use bastion_api::state::StateAccess;
use bastion_api::transaction::context::TxContext;
use bastion_execution::BlockExecutor;
use bastion_test_utils::fixtures::{account, fee, signed, tx, GenesisBuilder, BOND_DENOM};
use bastion_test_utils::{assert_err, assert_ok, assert_rejected, assert_tx_ok, TestChain};
use bastion_tx::PendingExecutionLedger;
use bastion_types::app::{
    BlockHeader, Coin, ExecutionFee, Message, Transaction, ValidatorStatus,
};
use bastion_types::config::{EngineConfig, GenesisState};
use bastion_types::error::ChainError;
use std::sync::Arc;

/// Records bank sends as `bank/<to hex>` keys holding the bond amount.
struct Bank;

#[async_trait]
impl ExternalMessageHandler for Bank {
    fn handles(&self, msg: &Message) -> bool {
        matches!(msg, Message::BankSend { .. })
    }

    async fn execute(
        &self,
        state: &mut dyn StateAccess,
        _ctx: &TxContext,
        msg: &Message,
    ) -> Result<(), bastion_types::error::TransactionError> {
        if let Message::BankSend { to, .. } = msg {
            let amount = msg.bank_send_amount(BOND_DENOM);
            state.insert(format!("bank/{}", to).as_bytes(), &amount.to_be_bytes())?;
        }
        Ok(())
    }
}

fn bank_send(signer: u8, to: u8, amount: u128) -> Transaction {
    tx(
        signer,
        vec![Message::BankSend {
            to: account(to),
            amount: vec![Coin::new(BOND_DENOM, amount)],
        }],
    )
}

fn with_bank(chain: &mut TestChain) {
    chain.executor =
        BlockExecutor::new(EngineConfig::default()).with_external_handler(Arc::new(Bank));
}

#[tokio::test]
async fn failed_messages_leave_only_admission_writes() {
    let genesis = GenesisBuilder::new()
        .validator(1, "alpha")
        .validator(2, "beta")
        .build();
    let mut chain = assert_ok!(TestChain::with_genesis(&genesis));

    let out = assert_ok!(
        chain
            .produce_block(vec![], &[tx(1, vec![Message::Pause, Message::Pause])])
            .await
    );
    assert_rejected!(&out[0], "VALIDATOR_NOT_ACTIVE");

    let v = assert_ok!(chain.executor.staking().validator(&chain.store, &account(1)));
    assert_eq!(v.status, ValidatorStatus::Active);

    let pending = assert_ok!(PendingExecutionLedger.pending(&chain.store, chain.height()));
    assert_eq!(pending.len(), 2);
    assert!(pending
        .iter()
        .all(|p| p.signer == account(1) && p.execution_fee == 10 && p.failure_fee == 100));
}

#[tokio::test]
async fn rejected_admission_writes_nothing() {
    let genesis = GenesisBuilder::new()
        .validator(1, "alpha")
        .properties(|p| p.enable_foreign_fee_payments = false)
        .build();
    let mut chain = assert_ok!(TestChain::with_genesis(&genesis));

    let underpaid = Transaction::new(account(1), vec![Message::Activate], fee(500));
    let foreign = Transaction::new(
        account(1),
        vec![Message::Pause],
        vec![Coin::new("uatom", 1_000)],
    );
    let out = assert_ok!(chain.produce_block(vec![], &[underpaid, foreign]).await);
    assert_rejected!(&out[0], "FEE_BELOW_EXECUTION_COST");
    assert_rejected!(&out[1], "FEE_FOREIGN_DISABLED");

    let pending = assert_ok!(PendingExecutionLedger.pending(&chain.store, chain.height()));
    assert!(pending.is_empty());
    let v = assert_ok!(chain.executor.staking().validator(&chain.store, &account(1)));
    assert_eq!(v.status, ValidatorStatus::Active);
}

#[tokio::test]
async fn unregistered_fee_denominations_are_refused() {
    let genesis = GenesisBuilder::new().validator(1, "alpha").build();
    assert!(genesis.network_properties.enable_foreign_fee_payments);
    let mut chain = assert_ok!(TestChain::with_genesis(&genesis));

    let foreign = Transaction::new(
        account(1),
        vec![Message::Pause],
        vec![Coin::new("uatom", 1_000)],
    );
    let out = assert_ok!(chain.produce_block(vec![], &[foreign]).await);
    assert_rejected!(&out[0], "FEE_DENOM_NOT_ELIGIBLE");

    let pending = assert_ok!(PendingExecutionLedger.pending(&chain.store, chain.height()));
    assert!(pending.is_empty());
    let v = assert_ok!(chain.executor.staking().validator(&chain.store, &account(1)));
    assert_eq!(v.status, ValidatorStatus::Active);
}

#[tokio::test]
async fn check_tx_never_touches_the_store() {
    let genesis = GenesisBuilder::new()
        .validator(1, "alpha")
        .validator(2, "beta")
        .build();
    let mut chain = assert_ok!(TestChain::with_genesis(&genesis));
    assert_ok!(chain.begin_block(vec![signed(1)]).await);

    let snapshot = chain.store.clone();
    let outcome = assert_ok!(chain.check(&tx(1, vec![Message::Pause])).await);
    assert_tx_ok!(&outcome);
    let outcome = assert_ok!(chain.check(&tx(1, vec![Message::Unpause])).await);
    assert_rejected!(&outcome, "VALIDATOR_NOT_PAUSED");
    assert_eq!(chain.store, snapshot);

    let outcome = assert_ok!(chain.deliver(&tx(1, vec![Message::Pause])).await);
    assert_tx_ok!(&outcome);
    assert_ne!(chain.store, snapshot);
    assert_ok!(chain.end_block().await);
}

#[tokio::test]
async fn transactions_need_an_open_block() {
    let genesis = GenesisBuilder::new().validator(1, "alpha").build();
    let mut chain = assert_ok!(TestChain::with_genesis(&genesis));
    assert_err!(chain.deliver(&tx(1, vec![Message::Pause])).await);

    assert_ok!(chain.produce_block(vec![], &[]).await);
    assert_err!(chain.check(&tx(1, vec![Message::Pause])).await);
    assert_err!(chain.end_block().await);
}

#[tokio::test]
async fn heights_must_be_consecutive() {
    let executor_genesis = GenesisBuilder::new().validator(1, "alpha").build();
    let mut store = bastion_api::state::MemoryStore::default();
    let mut executor = BlockExecutor::new(EngineConfig::default());
    assert_ok!(executor.init_genesis(&mut store, &executor_genesis));

    let header = |height: u64| BlockHeader {
        height,
        time: 1_000 + height,
        last_commit: vec![],
    };
    assert_ok!(executor.begin_block(&mut store, &header(7)).await);
    assert_ok!(executor.end_block(&mut store).await);
    assert_eq!(executor.last_height(), Some(7));

    let err = assert_err!(executor.begin_block(&mut store, &header(9)).await);
    assert!(matches!(err, ChainError::InvalidHeight { expected: 8, got: 9 }));
    assert_ok!(executor.begin_block(&mut store, &header(8)).await);
}

#[tokio::test]
async fn bank_sends_route_to_the_external_handler() {
    let genesis = GenesisBuilder::new().validator(1, "alpha").build();
    let mut chain = assert_ok!(TestChain::with_genesis(&genesis));

    let out = assert_ok!(chain.produce_block(vec![], &[bank_send(1, 2, 700)]).await);
    assert_rejected!(&out[0], "TX_UNSUPPORTED");

    with_bank(&mut chain);
    let out = assert_ok!(chain.produce_block(vec![], &[bank_send(1, 2, 700)]).await);
    assert_tx_ok!(&out[0]);
    let stored = assert_ok!(chain.store.get(format!("bank/{}", account(2)).as_bytes()));
    assert_eq!(stored, Some(700u128.to_be_bytes().to_vec()));
}

#[tokio::test]
async fn poor_network_caps_sends_and_filters_messages() {
    // No active validators: the network is poor from the first block.
    let genesis = GenesisBuilder::new()
        .sudo(1)
        .properties(|p| p.poor_network_max_bank_send = 1_000)
        .build();
    let mut chain = assert_ok!(TestChain::with_genesis(&genesis));
    with_bank(&mut chain);

    let set_fee = tx(
        1,
        vec![Message::SetExecutionFee(ExecutionFee::new(
            "Bank send", "send", 5, 5, 10,
        ))],
    );
    let out = assert_ok!(
        chain
            .produce_block(
                vec![],
                &[bank_send(1, 2, 1_000), bank_send(1, 3, 1_001), set_fee.clone()],
            )
            .await
    );
    assert_tx_ok!(&out[0]);
    assert_rejected!(&out[1], "FEE_POOR_NETWORK_MESSAGE");
    assert_rejected!(&out[2], "FEE_POOR_NETWORK_MESSAGE");

    // A healthy network admits both.
    let genesis = GenesisBuilder::new()
        .sudo(1)
        .validator(4, "alpha")
        .build();
    let mut chain = assert_ok!(TestChain::with_genesis(&genesis));
    with_bank(&mut chain);
    let out = assert_ok!(
        chain
            .produce_block(vec![], &[bank_send(1, 3, 5_000_000), set_fee])
            .await
    );
    assert_tx_ok!(&out[0]);
    assert_tx_ok!(&out[1]);
    let entry = assert_ok!(chain.executor.properties().execution_fee(&chain.store, "send"));
    assert_eq!(entry.map(|f| f.max_cost()), Some(5));
}

#[tokio::test]
async fn genesis_and_config_load_from_files() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("engine.toml");
    let genesis_path = dir.path().join("genesis.json");
    std::fs::write(
        &config_path,
        "bond_denom = \"ukex\"\npoor_network = \"never\"\n\n[signing]\nsigned_blocks_window = 100\n",
    )
    .unwrap();
    let genesis = GenesisBuilder::new().sudo(1).validator(2, "alpha").build();
    std::fs::write(&genesis_path, serde_json::to_string_pretty(&genesis).unwrap()).unwrap();

    let (executor, loaded) = assert_ok!(BlockExecutor::load(&config_path, &genesis_path));
    assert_eq!(executor.config().signing.signed_blocks_window, 100);
    assert_eq!(executor.config().signing.min_signed_per_window_percent, 50);
    assert_eq!(loaded, genesis);

    let mut store = bastion_api::state::MemoryStore::default();
    assert_ok!(executor.init_genesis(&mut store, &loaded));
    assert_eq!(assert_ok!(executor.staking().active_validator_count(&store)), 1);
    assert_eq!(assert_ok!(executor.permissions().actors(&store)).len(), 2);

    let missing = dir.path().join("absent.json");
    let err = assert_err!(BlockExecutor::load(&config_path, &missing));
    assert!(format!("{:#}", err).contains("absent.json"));
}

#[tokio::test]
async fn invalid_genesis_is_refused() {
    let mut store = bastion_api::state::MemoryStore::default();
    let executor = BlockExecutor::new(EngineConfig::default());
    let genesis = GenesisState {
        starting_proposal_id: 0,
        ..GenesisState::default()
    };
    let err = assert_err!(executor.init_genesis(&mut store, &genesis));
    assert!(matches!(err, ChainError::Config(_)));
    assert!(store.is_empty());

    let mut genesis = GenesisBuilder::new().validator(1, "alpha").build();
    genesis.validators.push(bastion_test_utils::fixtures::validator_params(2, "alpha"));
    let err = assert_err!(executor.init_genesis(&mut store, &genesis));
    assert!(matches!(err, ChainError::Genesis(_)));
}
