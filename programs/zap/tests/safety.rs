mod common;

use std::rc::Rc;

use common::{setup, Env, FailingVenue, MisreportingVenue, RecordingVenue, ReentrantVenue};
use solana_sdk::pubkey::Pubkey;
use zap::{
    AddLiquidityParams, CallContext, DepositParams, Event, RemoveLiquidityParams, SwapParams,
    ZapError, NATIVE_ASSET,
};

/// Approve the entry amount and return the state a failed deposit must leave behind.
fn arm(env: &mut Env, params: &DepositParams) -> zap::State {
    env.rt
        .approve(CallContext::signed(env.alice), params.entry_asset, env.engine, params.entry_amount)
        .unwrap();
    env.rt.snapshot()
}

fn one_sided_through(env: &Env, venue: Pubkey) -> DepositParams {
    let mut params = env.deposit_params(env.usdc, 1_000_000, env.dai, env.usdc, env.bob);
    params.swap_venue = venue;
    params
}

// ─── Hostile venues ────────────────────────────────────────────────────────

#[test]
fn reentrant_venue_is_rejected_and_nothing_changes() {
    let mut env = setup(100, 5_000);
    let inner = env.deposit_params(env.usdc, 10, env.usdc, env.dai, env.bob);
    let hostile = env.rt.deploy_swap_venue(Rc::new(ReentrantVenue {
        address: Pubkey::new_unique(),
        engine: env.engine,
        params: inner,
    }));

    let params = one_sided_through(&env, hostile);
    let before = arm(&mut env, &params);
    let err = env
        .rt
        .deposit(CallContext::signed(env.alice), env.engine, &params)
        .unwrap_err();

    assert_eq!(err, ZapError::ReentrantCall);
    assert_eq!(env.rt.snapshot(), before);
    // the lock was released with the failed frame
    let params = env.deposit_params(env.usdc, 1_000_000, env.dai, env.usdc, env.bob);
    assert_eq!(env.deposit(env.alice, &params).unwrap(), 0);
}

#[test]
fn misreported_output_is_measured_not_trusted() {
    let mut env = setup(100, 5_000);
    let liar = env.rt.deploy_swap_venue(Rc::new(MisreportingVenue {
        address: Pubkey::new_unique(),
        claimed: 1_000_000,
    }));

    let params = one_sided_through(&env, liar);
    let before = arm(&mut env, &params);
    assert_eq!(
        env.rt.deposit(CallContext::signed(env.alice), env.engine, &params),
        Err(ZapError::ZeroOutput)
    );
    assert_eq!(env.rt.snapshot(), before);
}

#[test]
fn failing_venue_surfaces_as_swap_failure() {
    let mut env = setup(100, 5_000);
    let broken = env.rt.deploy_swap_venue(Rc::new(FailingVenue {
        address: Pubkey::new_unique(),
    }));

    let params = one_sided_through(&env, broken);
    let before = arm(&mut env, &params);
    let err = env
        .rt
        .deposit(CallContext::signed(env.alice), env.engine, &params)
        .unwrap_err();

    assert!(matches!(err, ZapError::SwapExecutionFailed(ref reason) if reason.contains("venue rejected")));
    assert_eq!(env.rt.snapshot(), before);
}

#[test]
fn undeployed_venue_is_unknown() {
    let mut env = setup(100, 5_000);
    let nowhere = Pubkey::new_unique();

    let params = one_sided_through(&env, nowhere);
    let before = arm(&mut env, &params);
    assert_eq!(
        env.rt.deposit(CallContext::signed(env.alice), env.engine, &params),
        Err(ZapError::UnknownVenue(nowhere))
    );
    assert_eq!(env.rt.snapshot(), before);
}

#[test]
fn call_data_reaches_the_venue_verbatim() {
    let mut env = setup(100, 5_000);
    let recorder = Rc::new(RecordingVenue {
        address: Pubkey::new_unique(),
        ..Default::default()
    });
    env.rt.deploy_swap_venue(recorder.clone());

    let mut params = one_sided_through(&env, recorder.address);
    params.swap_call_data = vec![7, 7, 7];
    arm(&mut env, &params);
    // it pays nothing, so the engine refuses the result
    assert_eq!(
        env.rt.deposit(CallContext::signed(env.alice), env.engine, &params),
        Err(ZapError::ZeroOutput)
    );
    assert_eq!(*recorder.seen.borrow(), vec![vec![7, 7, 7]]);
}

// ─── Partial fills ─────────────────────────────────────────────────────────

#[test]
fn partial_fill_refunds_unspent_entry() {
    let mut env = setup(0, 5_000);
    let mut params = env.deposit_params(env.usdc, 1_000_000, env.dai, env.usdc, env.bob);
    params.swap_call_data = env.order(env.usdc, env.dai, 500_000);
    let usdc_before = env.rt.balance(&env.usdc, &env.alice);

    assert_eq!(env.deposit(env.alice, &params).unwrap(), 0);

    assert_eq!(env.rt.balance(&env.usdc, &env.alice), usdc_before - 500_000);
    assert_eq!(env.rt.balance(&env.usdc, &env.engine), 0);
    let staged = env.rt.staged(&env.engine, &env.alice, &env.dai).unwrap();
    assert!(staged > 0);
    assert_eq!(env.rt.balance(&env.dai, &env.engine), staged);
}

#[test]
fn partial_fill_on_exit_pays_the_remainder_as_underlying() {
    let mut env = setup(0, 5_000);
    let units = env.zap_usdc_into_pool(2_000_000, env.bob);
    let (usdc_out, dai_out) = env.rt.quote_remove(&env.engine, &env.usdc_dai, units).unwrap();
    let half = dai_out / 2;
    let mut params = env.withdraw_to_usdc(units, env.bob);
    params
        .swap_call_data
        .insert(env.dai, env.order(env.dai, env.usdc, half));
    let dai_before = env.rt.balance(&env.dai, &env.alice);
    let usdc_before = env.rt.balance(&env.usdc, &env.alice);

    let returned = env.withdraw(env.alice, &params).unwrap();

    assert!(returned > usdc_out);
    assert_eq!(env.rt.balance(&env.usdc, &env.alice), usdc_before + returned);
    assert_eq!(env.rt.balance(&env.dai, &env.alice), dai_before + (dai_out - half));
    assert_eq!(env.rt.balance(&env.usdc, &env.engine), 0);
    assert_eq!(env.rt.balance(&env.dai, &env.engine), 0);
}

#[test]
fn partial_fill_on_direct_swap_refunds_input() {
    let mut env = setup(100, 5_000);
    env.rt
        .approve(CallContext::signed(env.alice), env.usdc, env.engine, 1_000_000)
        .unwrap();
    let params = SwapParams {
        asset_in: env.usdc,
        amount_in: 1_000_000,
        asset_out: env.dai,
        min_amount_out: 0,
        venue: env.router,
        call_data: env.order(env.usdc, env.dai, 400_000),
    };
    let usdc_before = env.rt.balance(&env.usdc, &env.alice);

    let out = env
        .rt
        .swap(CallContext::signed(env.alice), env.engine, &params)
        .unwrap();

    assert!(out > 0);
    assert_eq!(env.rt.balance(&env.usdc, &env.alice), usdc_before - 400_000);
    assert_eq!(env.rt.balance(&env.usdc, &env.engine), 0);
    assert!(matches!(
        env.rt.events().last().map(|r| &r.event),
        Some(Event::Swapped { amount_in: 400_000, .. })
    ));
}

// ─── Slippage ──────────────────────────────────────────────────────────────

#[test]
fn staging_cannot_satisfy_a_unit_floor() {
    let mut env = setup(100, 5_000);
    let mut params = env.deposit_params(env.usdc, 1_000_000, env.dai, env.usdc, env.bob);
    params.min_pool_output = 1_000;
    let before = arm(&mut env, &params);

    assert_eq!(
        env.rt.deposit(CallContext::signed(env.alice), env.engine, &params),
        Err(ZapError::SlippageExceeded { received: 0, min: 1_000 })
    );
    assert_eq!(env.rt.snapshot(), before);
    assert_eq!(env.rt.staged(&env.engine, &env.alice, &env.dai).unwrap(), 0);
}

#[test]
fn deposit_below_min_units_reverts_everything() {
    let mut env = setup(100, 5_000);
    let stage = env.deposit_params(env.usdc, 1_000_000, env.dai, env.usdc, env.bob);
    env.deposit(env.alice, &stage).unwrap();
    let staged = env.rt.staged(&env.engine, &env.alice, &env.dai).unwrap();

    let mut pair = env.deposit_params(env.usdc, 1_000_000, env.usdc, env.dai, env.bob);
    pair.min_pool_output = u64::MAX;
    let before = arm(&mut env, &pair);
    let err = env
        .rt
        .deposit(CallContext::signed(env.alice), env.engine, &pair)
        .unwrap_err();

    assert!(matches!(err, ZapError::SlippageExceeded { min: u64::MAX, .. }));
    assert_eq!(env.rt.snapshot(), before);
    assert_eq!(env.rt.staged(&env.engine, &env.alice, &env.dai).unwrap(), staged);
}

#[test]
fn withdraw_below_min_exit_reverts_everything() {
    let mut env = setup(100, 5_000);
    let units = env.zap_usdc_into_pool(2_000_000, env.bob);
    let mut params = env.withdraw_to_usdc(units, env.bob);
    params.min_exit_amount = u64::MAX;

    env.rt
        .approve(CallContext::signed(env.alice), env.usdc_dai, env.engine, units)
        .unwrap();
    let before = env.rt.snapshot();
    let err = env
        .rt
        .withdraw(CallContext::signed(env.alice), env.engine, &params)
        .unwrap_err();

    assert!(matches!(err, ZapError::SlippageExceeded { .. }));
    assert_eq!(env.rt.snapshot(), before);
    assert_eq!(env.rt.position(&env.alice, &env.usdc_dai), units);
}

#[test]
fn direct_swap_enforces_min_out() {
    let mut env = setup(100, 5_000);
    env.rt
        .approve(CallContext::signed(env.alice), env.usdc, env.engine, 1_000_000)
        .unwrap();
    let params = SwapParams {
        asset_in: env.usdc,
        amount_in: 1_000_000,
        asset_out: env.dai,
        min_amount_out: 1_000_000,
        venue: env.router,
        call_data: env.order(env.usdc, env.dai, 1_000_000),
    };
    let before = env.rt.snapshot();

    let err = env
        .rt
        .swap(CallContext::signed(env.alice), env.engine, &params)
        .unwrap_err();
    assert!(matches!(err, ZapError::SlippageExceeded { min: 1_000_000, .. }));
    assert_eq!(env.rt.snapshot(), before);
}

// ─── Pool entry points ─────────────────────────────────────────────────────

#[test]
fn add_liquidity_spends_staged_balances() {
    let mut env = setup(100, 5_000);
    // stage each side against an unpaired asset so neither completes a pair
    for asset in [env.usdc, env.dai] {
        let params = env.deposit_params(asset, 1_000_000, asset, NATIVE_ASSET, env.bob);
        env.deposit(env.alice, &params).unwrap();
    }
    let staged = env.net_of_goodwill(1_000_000);
    env.rt.set_time(1_000);

    let params = AddLiquidityParams {
        asset_a: env.usdc,
        asset_b: env.dai,
        amount_a: staged,
        amount_b: staged,
        min_a: 0,
        min_b: 0,
        recipient: env.alice,
        deadline: 1_060,
        pool_venue: None,
    };
    let added = env
        .rt
        .add_liquidity(CallContext::signed(env.alice), env.engine, &params)
        .unwrap();

    assert_eq!(added.pool, env.usdc_dai);
    assert!(added.units > 0);
    assert_eq!(env.rt.position(&env.alice, &env.usdc_dai), added.units);
    assert_eq!(
        env.rt.staged(&env.engine, &env.alice, &env.usdc).unwrap() + added.used_a,
        staged
    );
    assert_eq!(
        env.rt.staged(&env.engine, &env.alice, &env.dai).unwrap() + added.used_b,
        staged
    );

    // more than is staged
    assert!(matches!(
        env.rt
            .add_liquidity(CallContext::signed(env.alice), env.engine, &params),
        Err(ZapError::InsufficientBalance { .. })
    ));
}

#[test]
fn remove_liquidity_pays_both_sides_and_honours_deadline() {
    let mut env = setup(100, 5_000);
    let units = env.zap_usdc_into_pool(2_000_000, env.bob);
    let carol = Pubkey::new_unique();
    env.rt
        .approve(CallContext::signed(env.alice), env.usdc_dai, env.engine, units)
        .unwrap();
    env.rt.set_time(1_000);

    let mut params = RemoveLiquidityParams {
        pool: env.usdc_dai,
        units,
        min_a: 0,
        min_b: 0,
        recipient: carol,
        deadline: 999,
        pool_venue: None,
    };
    let before = env.rt.snapshot();
    assert!(matches!(
        env.rt
            .remove_liquidity(CallContext::signed(env.alice), env.engine, &params),
        Err(ZapError::Expired { deadline: 999, now: 1_000 })
    ));
    assert_eq!(env.rt.snapshot(), before);

    params.deadline = 1_000;
    let quoted = env.rt.quote_remove(&env.engine, &env.usdc_dai, units).unwrap();
    let (usdc_out, dai_out) = env
        .rt
        .remove_liquidity(CallContext::signed(env.alice), env.engine, &params)
        .unwrap();

    assert_eq!((usdc_out, dai_out), quoted);
    assert_eq!(env.rt.balance(&env.usdc, &carol), usdc_out);
    assert_eq!(env.rt.balance(&env.dai, &carol), dai_out);
    assert_eq!(env.rt.position(&env.alice, &env.usdc_dai), 0);
}

#[test]
fn pair_without_a_pool_is_rejected() {
    let mut env = setup(100, 5_000);
    let stage = env.deposit_params(env.dai, 1_000_000, env.dai, NATIVE_ASSET, env.bob);
    env.deposit(env.alice, &stage).unwrap();

    let pair = env.deposit_params(NATIVE_ASSET, 1_000_000, NATIVE_ASSET, env.dai, env.bob);
    let before = env.rt.snapshot();
    let err = env.deposit(env.alice, &pair).unwrap_err();

    assert!(matches!(err, ZapError::NoPoolForPair { asset_b, .. } if asset_b == env.dai));
    assert_eq!(env.rt.snapshot(), before);
}
