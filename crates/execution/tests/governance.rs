// Path: crates/execution/tests/governance.rs

use bastion_test_utils::fixtures::{account, fee, missed, signed, tx, GenesisBuilder};
use bastion_test_utils::{assert_ok, assert_rejected, assert_tx_ok, TestChain};
use bastion_types::app::{
    Message, NetworkProperty, ProposalContent, ProposalResult, Transaction, ValidatorStatus,
    VoteOption,
};
use bastion_types::config::{EngineConfig, SigningParams};

fn submit(signer: u8, content: ProposalContent) -> Transaction {
    tx(
        signer,
        vec![Message::SubmitProposal {
            content,
            description: "test proposal".into(),
        }],
    )
}

fn vote(signer: u8, proposal_id: u64, option: VoteOption) -> Transaction {
    tx(signer, vec![Message::VoteProposal { proposal_id, option }])
}

fn council() -> GenesisBuilder {
    GenesisBuilder::new()
        .sudo(1)
        .sudo(2)
        .sudo(3)
        .validator(4, "alpha")
}

#[tokio::test]
async fn passed_fee_proposal_changes_admission() {
    let mut chain = assert_ok!(TestChain::with_genesis(&council().build()));
    let raise = ProposalContent::SetNetworkProperty {
        property: NetworkProperty::MinTxFee,
        value: 250,
    };

    let out = assert_ok!(
        chain
            .produce_block(vec![], &[submit(1, raise.clone()), submit(4, raise)])
            .await
    );
    assert_tx_ok!(&out[0]);
    assert_rejected!(&out[1], "GOV_UNAUTHORIZED");

    let out = assert_ok!(
        chain
            .produce_block(
                vec![signed(4)],
                &[
                    vote(1, 1, VoteOption::Yes),
                    vote(2, 1, VoteOption::Yes),
                    vote(4, 1, VoteOption::No),
                    vote(1, 9, VoteOption::Yes),
                ],
            )
            .await
    );
    assert_tx_ok!(&out[0]);
    assert_tx_ok!(&out[1]);
    assert_rejected!(&out[2], "GOV_UNAUTHORIZED");
    assert_rejected!(&out[3], "GOV_PROPOSAL_NOT_FOUND");

    let proposal = assert_ok!(chain.executor.governance().proposal(&chain.store, 1));
    assert_eq!(proposal.voting_end_time, proposal.submit_time + 600);
    assert_eq!(proposal.enactment_time, proposal.voting_end_time + 300);

    assert_ok!(chain.advance_to(proposal.voting_end_time, &[signed(4)]).await);
    let tallied = assert_ok!(chain.executor.governance().proposal(&chain.store, 1));
    assert_eq!(tallied.result, ProposalResult::Enacted);
    let tally = tallied.tally.unwrap();
    assert_eq!((tally.eligible, tally.yes, tally.no), (3, 2, 0));
    assert_eq!(tallied.applied_at, None);

    let out = assert_ok!(chain.produce_block(vec![], &[vote(3, 1, VoteOption::No)]).await);
    assert_rejected!(&out[0], "GOV_VOTING_CLOSED");

    assert_ok!(chain.advance_to(proposal.enactment_time, &[signed(4)]).await);
    let enacted = assert_ok!(chain.executor.governance().proposal(&chain.store, 1));
    assert!(enacted.applied_at.is_some());
    assert_eq!(enacted.enactment_error, None);
    let props = assert_ok!(chain.executor.properties().network_properties(&chain.store));
    assert_eq!(props.min_tx_fee, 250);

    let cheap = Transaction::new(account(4), vec![Message::Pause], fee(200));
    let out = assert_ok!(chain.produce_block(vec![], &[cheap]).await);
    assert_rejected!(&out[0], "FEE_OUT_OF_RANGE");
}

#[tokio::test]
async fn vetoed_proposal_is_never_applied() {
    let mut chain = assert_ok!(TestChain::with_genesis(&council().build()));
    let content = ProposalContent::SetNetworkProperty {
        property: NetworkProperty::VoteQuorum,
        value: 90,
    };
    assert_ok!(chain.produce_block(vec![], &[submit(1, content)]).await);
    assert_ok!(
        chain
            .produce_block(
                vec![],
                &[
                    vote(1, 1, VoteOption::Yes),
                    vote(2, 1, VoteOption::NoWithVeto),
                    vote(3, 1, VoteOption::Abstain),
                ],
            )
            .await
    );

    let proposal = assert_ok!(chain.executor.governance().proposal(&chain.store, 1));
    assert_ok!(chain.advance_to(proposal.enactment_time + 10, &[signed(4)]).await);

    let p = assert_ok!(chain.executor.governance().proposal(&chain.store, 1));
    assert_eq!(p.result, ProposalResult::Rejected);
    assert_eq!(p.applied_at, None);
    let props = assert_ok!(chain.executor.properties().network_properties(&chain.store));
    assert_eq!(props.vote_quorum, 33);
}

#[tokio::test]
async fn unjail_proposal_reinstates_a_jailed_validator() {
    let config = EngineConfig {
        signing: SigningParams {
            signed_blocks_window: 10,
            min_signed_per_window_percent: 50,
        },
        ..Default::default()
    };
    let genesis = council()
        .validator(5, "beta")
        .properties(|p| p.jail_max_time = 1_000_000)
        .build();
    let mut chain = assert_ok!(TestChain::new(config, &genesis));

    for _ in 0..6 {
        assert_ok!(chain.produce_block(vec![missed(4), signed(5)], &[]).await);
    }
    let jailed = assert_ok!(chain.executor.staking().validator(&chain.store, &account(4)));
    assert_eq!(jailed.status, ValidatorStatus::Inactive);

    let content = ProposalContent::UnjailValidator {
        val_key: account(4),
        reference: "operator fixed the signer".into(),
    };
    let out = assert_ok!(
        chain
            .produce_block(
                vec![signed(5)],
                &[
                    submit(1, content),
                    vote(1, 1, VoteOption::Yes),
                    vote(2, 1, VoteOption::Yes),
                ],
            )
            .await
    );
    for outcome in &out {
        assert_tx_ok!(outcome);
    }

    let proposal = assert_ok!(chain.executor.governance().proposal(&chain.store, 1));
    assert!(proposal.enactment_time < jailed.inactive_until);
    assert_ok!(chain.advance_to(proposal.enactment_time, &[signed(5)]).await);

    let p = assert_ok!(chain.executor.governance().proposal(&chain.store, 1));
    assert_eq!(p.result, ProposalResult::Enacted);
    assert_eq!(p.enactment_error, None);
    let v = assert_ok!(chain.executor.staking().validator(&chain.store, &account(4)));
    assert_eq!(v.status, ValidatorStatus::Active);
    assert_eq!(v.inactive_until, 0);
}

#[tokio::test]
async fn enactment_failure_is_recorded_without_partial_writes() {
    let mut chain = assert_ok!(TestChain::with_genesis(&council().build()));
    let content = ProposalContent::UnjailValidator {
        val_key: account(4),
        reference: String::new(),
    };
    // The validator is Active, so reinstating it fails at enactment.
    assert_ok!(
        chain
            .produce_block(
                vec![],
                &[
                    submit(1, content),
                    vote(1, 1, VoteOption::Yes),
                    vote(2, 1, VoteOption::Yes),
                    vote(3, 1, VoteOption::Yes),
                ],
            )
            .await
    );
    let proposal = assert_ok!(chain.executor.governance().proposal(&chain.store, 1));
    assert_ok!(chain.advance_to(proposal.enactment_time, &[signed(4)]).await);

    let p = assert_ok!(chain.executor.governance().proposal(&chain.store, 1));
    assert_eq!(p.result, ProposalResult::Enacted);
    assert!(p.applied_at.is_some());
    assert!(p.enactment_error.is_some());
    let v = assert_ok!(chain.executor.staking().validator(&chain.store, &account(4)));
    assert_eq!(v.status, ValidatorStatus::Active);
}
