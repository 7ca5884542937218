// Path: crates/execution/tests/reputation.rs

use bastion_execution::TxOutcome;
use bastion_test_utils::fixtures::{account, cons_address, missed, signed, tx, GenesisBuilder};
use bastion_test_utils::randomness::TestRng;
use bastion_test_utils::{assert_in_range, assert_ok, assert_tx_ok, TestChain};
use bastion_types::app::{Message, Validator, ValidatorStatus};
use bastion_types::config::{EngineConfig, SigningParams};

fn validator(chain: &TestChain, n: u8) -> Validator {
    assert_ok!(chain.executor.staking().validator(&chain.store, &account(n)))
}

fn rank_streak(chain: &TestChain, n: u8) -> (i64, i64) {
    let v = validator(chain, n);
    (v.rank, v.streak)
}

async fn blocks(chain: &mut TestChain, n: usize, fact: bastion_types::app::SigningFact) {
    for _ in 0..n {
        assert_ok!(chain.produce_block(vec![fact], &[]).await);
    }
}

#[tokio::test]
async fn reputation_follows_the_reference_trajectory() {
    let genesis = GenesisBuilder::new().validator(1, "alpha").build();
    let mut chain = assert_ok!(TestChain::with_genesis(&genesis));

    blocks(&mut chain, 10, missed(1)).await;
    assert_eq!(rank_streak(&chain, 1), (0, 0));
    assert_eq!(validator(&chain, 1).mischance, 10);

    blocks(&mut chain, 1, signed(1)).await;
    assert_eq!(rank_streak(&chain, 1), (1, 1));

    blocks(&mut chain, 100, signed(1)).await;
    assert_eq!(rank_streak(&chain, 1), (101, 101));

    blocks(&mut chain, 1, missed(1)).await;
    assert_eq!(rank_streak(&chain, 1), (91, 0));

    let mut v = validator(&chain, 1);
    let now = chain.time();
    assert_ok!(chain
        .executor
        .staking()
        .inactivate(&mut chain.store, &mut v, now));
    let v = validator(&chain, 1);
    assert_eq!(v.rank, 45);
    assert_eq!(v.status, ValidatorStatus::Inactive);
    assert_eq!(v.inactive_until, now + 600);

    chain.skip_time(600);
    let outcomes = assert_ok!(chain.produce_block(vec![], &[tx(1, vec![Message::Activate])]).await);
    assert_tx_ok!(&outcomes[0]);
    assert_eq!(validator(&chain, 1).status, ValidatorStatus::Active);

    blocks(&mut chain, 5, missed(1)).await;
    assert_eq!(rank_streak(&chain, 1), (0, 0));
}

#[tokio::test]
async fn inactivation_happens_on_the_501st_miss() {
    let genesis = GenesisBuilder::new().validator(1, "alpha").build();
    let mut chain = assert_ok!(TestChain::with_genesis(&genesis));
    assert_eq!(chain.executor.config().signing, SigningParams::default());

    blocks(&mut chain, 500, missed(1)).await;
    assert_eq!(validator(&chain, 1).status, ValidatorStatus::Active);
    let info = assert_ok!(chain
        .executor
        .staking()
        .signing_info(&chain.store, &cons_address(1)));
    assert_eq!(info.missed_blocks_counter, 500);

    blocks(&mut chain, 1, missed(1)).await;
    let v = validator(&chain, 1);
    assert_eq!(v.status, ValidatorStatus::Inactive);
    assert_eq!(v.inactive_until, chain.time() + 600);

    let info = assert_ok!(chain
        .executor
        .staking()
        .signing_info(&chain.store, &cons_address(1)));
    assert_eq!(info.missed_blocks_counter, 0);
    assert_eq!(info.index_offset, 0);
    assert_eq!(info.inactive_until, v.inactive_until);
}

#[tokio::test]
async fn signing_recovers_slots_in_a_full_window() {
    let config = EngineConfig {
        signing: SigningParams {
            signed_blocks_window: 10,
            min_signed_per_window_percent: 50,
        },
        ..Default::default()
    };
    let genesis = GenesisBuilder::new().validator(1, "alpha").build();
    let mut chain = assert_ok!(TestChain::new(config, &genesis));

    // Five misses fill half the window; five signatures wrap around to the front.
    blocks(&mut chain, 5, missed(1)).await;
    blocks(&mut chain, 5, signed(1)).await;
    // The next five signatures overwrite the missed slots one by one.
    blocks(&mut chain, 5, signed(1)).await;

    let info = assert_ok!(chain
        .executor
        .staking()
        .signing_info(&chain.store, &cons_address(1)));
    assert_eq!(info.missed_blocks_counter, 0);
    assert_eq!(info.index_offset, 15);
    assert_eq!(validator(&chain, 1).status, ValidatorStatus::Active);
}

#[tokio::test]
async fn random_histories_never_drive_rank_negative() {
    let config = EngineConfig {
        signing: SigningParams {
            signed_blocks_window: 20,
            min_signed_per_window_percent: 50,
        },
        ..Default::default()
    };
    let genesis = GenesisBuilder::new()
        .validator(1, "alpha")
        .validator(2, "beta")
        .build();
    let mut chain = assert_ok!(TestChain::new(config, &genesis));
    let mut rng = TestRng::new(42);

    let history = rng.signing_history(400, 45);
    for (i, alpha_signed) in history.into_iter().enumerate() {
        let alpha = if alpha_signed { signed(1) } else { missed(1) };
        let beta = if i % 7 == 0 { missed(2) } else { signed(2) };
        assert_ok!(chain.produce_block(vec![alpha, beta], &[]).await);

        for n in [1, 2] {
            let (rank, streak) = rank_streak(&chain, n);
            // One fact per block moves rank up by at most one.
            let ceiling = i as i64 + 1;
            assert_in_range!(rank, 0, ceiling, "rank of validator {} at block {}", n, i);
            assert_in_range!(streak, 0, rank, "streak of validator {} at block {}", n, i);
            let info = assert_ok!(chain
                .executor
                .staking()
                .signing_info(&chain.store, &cons_address(n)));
            assert!(info.missed_blocks_counter <= 20);
        }
    }
    assert_eq!(validator(&chain, 2).status, ValidatorStatus::Active);
}

#[tokio::test]
async fn tombstoned_validators_ignore_facts_and_cannot_activate() {
    let genesis = GenesisBuilder::new()
        .validator(1, "alpha")
        .validator(2, "beta")
        .build();
    let mut chain = assert_ok!(TestChain::with_genesis(&genesis));
    blocks(&mut chain, 3, signed(1)).await;

    let now = chain.time();
    assert_ok!(chain
        .executor
        .staking()
        .tombstone(&mut chain.store, &cons_address(1), now));
    let v = validator(&chain, 1);
    assert!(v.tombstoned);
    assert_eq!(v.status, ValidatorStatus::Inactive);
    assert_eq!(v.rank, 1);

    blocks(&mut chain, 3, signed(1)).await;
    assert_eq!(validator(&chain, 1).rank, 1);

    chain.skip_time(10_000);
    let outcomes: Vec<TxOutcome> =
        assert_ok!(chain.produce_block(vec![], &[tx(1, vec![Message::Activate])]).await);
    assert_eq!(outcomes[0].code, "VALIDATOR_TOMBSTONED");
    assert!(validator(&chain, 1).tombstoned);
}

#[tokio::test]
async fn facts_for_unknown_validators_are_skipped() {
    let genesis = GenesisBuilder::new().validator(1, "alpha").build();
    let mut chain = assert_ok!(TestChain::with_genesis(&genesis));
    assert_ok!(chain.produce_block(vec![missed(9), signed(1)], &[]).await);
    assert_eq!(rank_streak(&chain, 1), (1, 1));
}
