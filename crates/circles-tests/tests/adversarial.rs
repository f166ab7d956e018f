//! Adversarial tests: atomicity, isolation between ledgers, and value
//! conservation under arbitrary call sequences.

use proptest::prelude::*;
use rand::{Rng, SeedableRng};

use circles_core::address::Address;
use circles_core::constants::{RATE_PRECISION, SECS_PER_DAY};
use circles_core::error::LedgerError;
use circles_core::types::{Amount, HubConfig};
use circles_tests::helpers::*;

#[derive(Clone, Debug)]
enum Op {
    Transfer { from: u8, to: u8, value: Amount },
    Approve { owner: u8, spender: u8, value: Amount },
    TransferFrom { spender: u8, from: u8, to: u8, value: Amount },
    Decrease { owner: u8, spender: u8, value: Amount },
    Increase { owner: u8, spender: u8, value: Amount },
}

/// Seeds 1..=4 are real accounts; 0 maps to the null account.
fn account(seed: u8) -> Address {
    if seed == 0 { Address::ZERO } else { addr(seed) }
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let who = 0u8..=4;
    let value = 0u128..=120;
    prop_oneof![
        (who.clone(), who.clone(), value.clone())
            .prop_map(|(from, to, value)| Op::Transfer { from, to, value }),
        (who.clone(), who.clone(), value.clone())
            .prop_map(|(owner, spender, value)| Op::Approve { owner, spender, value }),
        (who.clone(), who.clone(), who.clone(), value.clone()).prop_map(
            |(spender, from, to, value)| Op::TransferFrom { spender, from, to, value }
        ),
        (who.clone(), who.clone(), value.clone())
            .prop_map(|(owner, spender, value)| Op::Decrease { owner, spender, value }),
        (who.clone(), who, value)
            .prop_map(|(owner, spender, value)| Op::Increase { owner, spender, value }),
    ]
}

fn run(env: &TestEnv, op: &Op) -> Result<(), LedgerError> {
    let token = env.token;
    match *op {
        Op::Transfer { from, to, value } => env
            .exec
            .call_token(account(from), token, |t, ctx| t.transfer(ctx, account(to), value)),
        Op::Approve { owner, spender, value } => env
            .exec
            .call_token(account(owner), token, |t, ctx| t.approve(ctx, account(spender), value)),
        Op::TransferFrom { spender, from, to, value } => {
            env.exec.call_token(account(spender), token, |t, ctx| {
                t.transfer_from(ctx, account(from), account(to), value)
            })
        }
        Op::Decrease { owner, spender, value } => env.exec.call_token(account(owner), token, |t, ctx| {
            t.decrease_allowance(ctx, account(spender), value)
        }),
        Op::Increase { owner, spender, value } => env.exec.call_token(account(owner), token, |t, ctx| {
            t.increase_allowance(ctx, account(spender), value)
        }),
    }
    .map(|_| ())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn supply_is_conserved_and_failures_change_nothing(
        ops in proptest::collection::vec(op_strategy(), 1..40)
    ) {
        let env = TestEnv::new();
        for op in &ops {
            let before = env.exec.snapshot();
            let result = run(&env, op);
            if result.is_err() {
                prop_assert_eq!(&env.exec.snapshot(), &before, "failed {:?} mutated state", op);
            }
            prop_assert_eq!(env.total_supply(), 100);
            prop_assert_eq!(env.sum_of_balances(), 100);
            prop_assert_eq!(env.balance_of(Address::ZERO), 0);
        }
    }
}

#[test]
fn conservation_holds_under_demurrage_at_every_instant() {
    let config = HubConfig {
        issuance_rate: 0,
        demurrage_rate: RATE_PRECISION / 100 / SECS_PER_DAY as u128,
        initial_payout: 1_000_000_000_000,
        ..hub_config()
    };
    let env = TestEnv::with_config(config);
    let mut rng = rand::rngs::StdRng::seed_from_u64(7);

    let mut last_supply = env.total_supply();
    for _ in 0..200 {
        env.exec.clock().advance(rng.gen_range(0..3_600));
        let from = addr(rng.gen_range(1..=4));
        let to = addr(rng.gen_range(1..=4));
        let value = rng.gen_range(0..1_000_000u128);
        let _ = env
            .exec
            .call_token(from, env.token, |t, ctx| t.transfer(ctx, to, value));

        let supply = env.total_supply();
        assert_eq!(supply, env.sum_of_balances());
        assert!(supply <= last_supply, "demurrage alone increased supply");
        last_supply = supply;
    }
}

#[test]
fn failed_transfer_from_leaves_allowance_and_balances() {
    let env = TestEnv::new();
    env.exec
        .call_token(owner(), env.token, |t, ctx| t.approve(ctx, recipient(), 150))
        .unwrap();
    let before = env.exec.snapshot();

    let res = env.exec.call_token(recipient(), env.token, |t, ctx| {
        t.transfer_from(ctx, owner(), another_account(), 150)
    });
    assert!(matches!(res, Err(LedgerError::InsufficientBalance { .. })));
    assert_eq!(env.exec.snapshot(), before);
}

#[test]
fn spender_cannot_exceed_allowance_across_calls() {
    let env = TestEnv::new();
    env.exec
        .call_token(owner(), env.token, |t, ctx| t.approve(ctx, recipient(), 60))
        .unwrap();
    env.exec
        .call_token(recipient(), env.token, |t, ctx| {
            t.transfer_from(ctx, owner(), recipient(), 40)
        })
        .unwrap();
    let res = env.exec.call_token(recipient(), env.token, |t, ctx| {
        t.transfer_from(ctx, owner(), recipient(), 40)
    });
    assert_eq!(
        res,
        Err(LedgerError::InsufficientAllowance { have: 20, need: 40 })
    );
    assert_eq!(env.balance_of(owner()), 60);
    assert_eq!(env.balance_of(recipient()), 40);
}

#[test]
fn ledgers_are_isolated() {
    let env = TestEnv::new();
    let other = env.exec.signup(recipient(), "TheirCoin").unwrap().value;
    env.exec
        .call_token(owner(), env.token, |t, ctx| t.transfer(ctx, recipient(), 30))
        .unwrap();

    env.exec.view(|hub, now| {
        let theirs = hub.token(&other).unwrap();
        assert_eq!(theirs.balance_of(&recipient(), now).unwrap(), 100);
        assert_eq!(theirs.balance_of(&owner(), now).unwrap(), 0);
        assert_eq!(theirs.total_supply(now).unwrap(), 100);
    });
    assert_eq!(env.total_supply(), 100);
}

#[test]
fn spending_someone_elses_currency_needs_balance() {
    let env = TestEnv::new();
    let other = env.exec.signup(recipient(), "TheirCoin").unwrap().value;
    let res = env
        .exec
        .call_token(owner(), other, |t, ctx| t.transfer(ctx, owner(), 1));
    assert_eq!(res, Err(LedgerError::InsufficientBalance { have: 0, need: 1 }));
}

#[test]
fn many_signups_each_get_one_ledger() {
    let env = TestEnv::new();
    for seed in 10..60u8 {
        env.exec.signup(addr(seed), "Coin").unwrap();
        assert!(matches!(
            env.exec.signup(addr(seed), "Coin"),
            Err(LedgerError::AlreadyRegistered(_))
        ));
    }
    env.exec.view(|hub, now| {
        assert_eq!(hub.signup_count(), 51);
        for t in hub.tokens() {
            assert_eq!(hub.token_of(&t.owner()), Some(t.address()));
            assert_eq!(t.total_supply(now).unwrap(), 100);
        }
    });
}

#[test]
fn multi_call_transaction_is_all_or_nothing() {
    let env = TestEnv::new();
    let token = env.token;
    let before = env.exec.snapshot();
    let res = env.exec.transact(owner(), |hub, ctx| {
        let t = hub.token_mut(&token)?;
        t.approve(ctx, recipient(), 50)?;
        t.transfer(ctx, another_account(), 80)?;
        t.transfer(ctx, another_account(), 80)
    });
    assert!(res.is_err());
    assert_eq!(env.exec.snapshot(), before);
}
