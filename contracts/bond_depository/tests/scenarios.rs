#![cfg(test)]

use bond_depository::{BondDepository, BondDepositoryClient, MarketTerms};
use protocol_common::{Error, SCALE};
use protocol_token::{ProtocolToken, ProtocolTokenClient};
use soroban_sdk::{
    testutils::{Address as _, Ledger},
    token::{StellarAssetClient, TokenClient},
    Address, Env, String,
};
use staking_ledger::{Epoch, StakingLedger, StakingLedgerClient};
use treasury::{Permission, Treasury, TreasuryClient};

const START: u64 = 1_000;

struct TestContext<'a> {
    env: Env,
    admin: Address,
    user1: Address,
    user2: Address,
    asset: ProtocolTokenClient<'a>,
    base: TokenClient<'a>,
    treasury: TreasuryClient<'a>,
    staking: StakingLedgerClient<'a>,
    bonds: BondDepositoryClient<'a>,
}

fn setup_test<'a>() -> TestContext<'a> {
    let env = Env::default();
    env.mock_all_auths();
    env.ledger().set_timestamp(START);

    let admin = Address::generate(&env);
    let user1 = Address::generate(&env);
    let user2 = Address::generate(&env);
    let calculator = Address::generate(&env);
    let lock_ref = Address::generate(&env);

    // Base asset for ETH markets
    let base_id = env
        .register_stellar_asset_contract_v2(admin.clone())
        .address();
    StellarAssetClient::new(&env, &base_id).mint(&user1, &(100 * SCALE));

    // Protocol asset
    let asset_id = env.register(ProtocolToken, ());
    let asset = ProtocolTokenClient::new(&env, &asset_id);
    asset.initialize(
        &admin,
        &String::from_str(&env, "Bond Token"),
        &String::from_str(&env, "BND"),
    );

    let treasury_id = env.register(Treasury, ());
    let treasury = TreasuryClient::new(&env, &treasury_id);
    treasury.bootstrap(&admin);
    treasury.initialize(&admin, &asset_id, &calculator);
    treasury.add_policy(&admin, &admin);
    asset.add_minter(&treasury_id);

    let staking_id = env.register(StakingLedger, ());
    let staking = StakingLedgerClient::new(&env, &staking_id);
    staking.bootstrap(&admin);
    staking.initialize(
        &admin,
        &asset_id,
        &Epoch {
            length: 20,
            number: 0,
            end_time: START + 20,
            unit: 60,
        },
        &lock_ref,
        &treasury_id,
    );
    staking.add_policy(&admin, &admin);
    staking.set_rebase_per_epoch(&admin, &(SCALE / 100));
    staking.set_basic_lock_period(&admin, &300);

    let bonds_id = env.register(BondDepository, ());
    let bonds = BondDepositoryClient::new(&env, &bonds_id);
    bonds.bootstrap(&admin);
    bonds.initialize(
        &admin,
        &asset_id,
        &base_id,
        &staking_id,
        &treasury_id,
        &calculator,
    );
    bonds.add_policy(&admin, &admin);

    treasury.enable(&admin, &Permission::Minter, &staking_id);
    treasury.enable(&admin, &Permission::Minter, &bonds_id);
    treasury.approve(&admin, &staking_id);
    treasury.approve(&admin, &bonds_id);
    staking.set_bonder(&admin, &bonds_id, &true);

    TestContext {
        env: env.clone(),
        admin,
        user1,
        user2,
        asset,
        base: TokenClient::new(&env, &base_id),
        treasury,
        staking,
        bonds,
    }
}

fn eth_market(ctx: &TestContext, capacity: i128) -> u32 {
    let pool = Address::generate(&ctx.env);
    ctx.bonds.create(
        &ctx.admin,
        &true,
        &ctx.admin,
        &pool,
        &pool,
        &0,
        &MarketTerms {
            capacity,
            finish_time: START + 1_000,
            base_price: 1_000_000,
            asset_price: 1_000,
            max_payout: 3_000 * SCALE,
        },
    )
}

#[test]
fn test_locked_deposit_opens_staking_position() {
    let ctx = setup_test();
    let id = eth_market(&ctx, 10_000 * SCALE);
    ctx.bonds.add_transfer(&ctx.admin, &ctx.user2, &5);

    assert_eq!(ctx.treasury.reserve_balance(), 0);

    let record = ctx
        .bonds
        .eth_deposit(&ctx.user1, &id, &(2 * SCALE), &500, &true);

    assert_eq!(record.payout, 2_000 * SCALE);
    assert_eq!(record.fees, 100 * SCALE);
    assert_eq!(record.stake_id, 1);
    assert_eq!(record.timestamp, START);

    let market = ctx.bonds.markets(&id);
    assert_eq!(market.capacity, 8_000 * SCALE);
    assert_eq!(market.sold, 2_000 * SCALE);
    assert!(market.active);

    let position = ctx.staking.staking_balances(&ctx.user1, &record.stake_id);
    assert_eq!(position.lock_end, START + 500);
    assert_eq!(position.deposited, 1_900 * SCALE);

    // Treasury keeps the payout minus the fee split.
    assert_eq!(ctx.treasury.reserve_balance(), 1_900 * SCALE);
    assert_eq!(ctx.asset.balance(&ctx.user2), 100 * SCALE);
    assert_eq!(ctx.asset.balance(&ctx.user1), 0);
    assert_eq!(ctx.staking.balance_of(&ctx.user1), 1_900 * SCALE);

    assert_eq!(ctx.base.balance(&ctx.treasury.address), 2 * SCALE);
    assert_eq!(ctx.base.balance(&ctx.user1), 98 * SCALE);

    assert_eq!(ctx.bonds.deposits_length(), 1);
    assert_eq!(ctx.bonds.deposit_record(&0), record);
}

#[test]
fn test_unlocked_deposit_pays_out_directly() {
    let ctx = setup_test();
    let id = eth_market(&ctx, 10_000 * SCALE);

    let record = ctx
        .bonds
        .eth_deposit(&ctx.user1, &id, &SCALE, &0, &false);

    assert_eq!(record.payout, 1_000 * SCALE);
    assert_eq!(record.stake_id, 0);
    assert_eq!(ctx.bonds.markets(&id).capacity, 9_000 * SCALE);
    assert_eq!(ctx.asset.balance(&ctx.user1), 1_000 * SCALE);
    assert_eq!(ctx.staking.staking_of(&ctx.user1).len(), 0);
    assert_eq!(ctx.treasury.reserve_balance(), 0);
}

#[test]
fn test_unstake_respects_bond_lock() {
    let ctx = setup_test();
    let id = eth_market(&ctx, 10_000 * SCALE);
    ctx.bonds.add_transfer(&ctx.admin, &ctx.user2, &5);

    let record = ctx
        .bonds
        .eth_deposit(&ctx.user1, &id, &(2 * SCALE), &500, &true);
    let stake = record.stake_id;

    let result = ctx.staking.try_unstake(&ctx.user1, &stake, &SCALE);
    assert_eq!(result, Err(Ok(Error::LockActive)));
    let result = ctx.staking.try_unstake_id(&ctx.user1, &stake);
    assert_eq!(result, Err(Ok(Error::LockActive)));

    ctx.env.ledger().set_timestamp(START + 500);
    // 25 epochs at 0.01 each
    assert_eq!(ctx.staking.index(), SCALE + SCALE / 4);

    let before_balance = ctx.staking.balance_of_id(&stake);
    let before_asset = ctx.asset.balance(&ctx.user1);

    let out = ctx.staking.unstake(&ctx.user1, &stake, &(1_000 * SCALE));
    assert_eq!(out, 1_250 * SCALE);

    assert!(ctx.staking.balance_of_id(&stake) < before_balance);
    assert!(ctx.asset.balance(&ctx.user1) > before_asset);
    assert_eq!(
        ctx.staking.position(&stake).unwrap().shares,
        900 * SCALE
    );

    // Remainder needs more than the reserve holds; the shortfall is minted.
    let out = ctx.staking.unstake_id(&ctx.user1, &stake);
    assert_eq!(out, 1_125 * SCALE);
    assert_eq!(ctx.asset.balance(&ctx.user1), 2_375 * SCALE);
    assert_eq!(ctx.treasury.reserve_balance(), 0);
}

#[test]
fn test_closed_market_rejects_deposits() {
    let ctx = setup_test();
    let id = eth_market(&ctx, 10_000 * SCALE);

    ctx.bonds.close(&ctx.admin, &id);

    let market = ctx.bonds.markets(&id);
    assert_eq!(market.capacity, 0);
    assert!(!market.active);
    assert!(market.finish_time > ctx.env.ledger().timestamp());

    let result = ctx
        .bonds
        .try_eth_deposit(&ctx.user1, &id, &SCALE, &0, &false);
    assert_eq!(result, Err(Ok(Error::MarketClosed)));
}

#[test]
fn test_over_max_payout_leaves_state_untouched() {
    let ctx = setup_test();
    let id = eth_market(&ctx, 10_000 * SCALE);

    let result = ctx
        .bonds
        .try_eth_deposit(&ctx.user1, &id, &(5 * SCALE), &1, &false);
    assert_eq!(result, Err(Ok(Error::ExceedsMaxPayout)));

    assert_eq!(ctx.bonds.markets(&id).capacity, 10_000 * SCALE);
    assert_eq!(ctx.treasury.reserve_balance(), 0);
    assert_eq!(ctx.base.balance(&ctx.user1), 100 * SCALE);

    // The same market still sells its full capacity afterwards.
    ctx.bonds
        .eth_deposit(&ctx.user1, &id, &(3 * SCALE), &0, &false);
    assert_eq!(ctx.bonds.markets(&id).capacity, 7_000 * SCALE);
}

#[test]
fn test_capacity_is_never_oversold() {
    let ctx = setup_test();
    let id = eth_market(&ctx, 2_500 * SCALE);

    let result = ctx
        .bonds
        .try_eth_deposit(&ctx.user1, &id, &(3 * SCALE), &0, &false);
    assert_eq!(result, Err(Ok(Error::CapacityExceeded)));
    assert_eq!(ctx.bonds.markets(&id).capacity, 2_500 * SCALE);

    ctx.bonds
        .eth_deposit(&ctx.user1, &id, &(2 * SCALE), &0, &false);
    let record = ctx
        .bonds
        .eth_deposit(&ctx.user1, &id, &(SCALE / 2), &0, &false);
    assert_eq!(record.payout, 500 * SCALE);

    let market = ctx.bonds.markets(&id);
    assert_eq!(market.capacity, 0);
    assert_eq!(market.sold, 2_500 * SCALE);
    assert!(!market.active);

    let result = ctx
        .bonds
        .try_eth_deposit(&ctx.user1, &id, &1, &0, &false);
    assert_eq!(result, Err(Ok(Error::MarketClosed)));
}

#[test]
fn test_mint_rate_grows_reserve() {
    let ctx = setup_test();
    let id = eth_market(&ctx, 10_000 * SCALE);
    ctx.bonds.set_mint_rate(&ctx.admin, &2_000);

    ctx.bonds
        .eth_deposit(&ctx.user1, &id, &(2 * SCALE), &0, &false);

    assert_eq!(ctx.asset.total_supply(), 4_000 * SCALE);
    assert_eq!(ctx.asset.balance(&ctx.user1), 2_000 * SCALE);
    assert_eq!(ctx.treasury.reserve_balance(), 2_000 * SCALE);
}

#[test]
fn test_token_market_takes_its_quote_token() {
    let ctx = setup_test();

    let quote_id = ctx
        .env
        .register_stellar_asset_contract_v2(ctx.admin.clone())
        .address();
    StellarAssetClient::new(&ctx.env, &quote_id).mint(&ctx.user1, &(10 * SCALE));

    let pool = Address::generate(&ctx.env);
    let id = ctx.bonds.create(
        &ctx.admin,
        &false,
        &ctx.admin,
        &quote_id,
        &pool,
        &3_000,
        &MarketTerms {
            capacity: 1_000 * SCALE,
            finish_time: START + 100,
            base_price: 1,
            asset_price: 2,
            max_payout: 1_000 * SCALE,
        },
    );

    let record = ctx
        .bonds
        .deposit(&ctx.user1, &id, &(4 * SCALE), &60, &true);
    assert_eq!(record.payout, 2 * SCALE);

    let quote = TokenClient::new(&ctx.env, &quote_id);
    assert_eq!(quote.balance(&ctx.treasury.address), 4 * SCALE);
    assert_eq!(ctx.base.balance(&ctx.treasury.address), 0);
    assert_eq!(
        ctx.staking.position(&record.stake_id).unwrap().lock_end,
        START + 60
    );
}

#[test]
fn test_deposit_fails_without_minter_permission() {
    let ctx = setup_test();
    let id = eth_market(&ctx, 10_000 * SCALE);

    ctx.treasury
        .disable(&ctx.admin, &Permission::Minter, &ctx.bonds.address);

    let result = ctx
        .bonds
        .try_eth_deposit(&ctx.user1, &id, &SCALE, &0, &false);
    assert!(result.is_err());
    assert_eq!(ctx.bonds.markets(&id).capacity, 10_000 * SCALE);
    assert_eq!(ctx.base.balance(&ctx.user1), 100 * SCALE);
}
