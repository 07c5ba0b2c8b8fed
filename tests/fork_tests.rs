//! Fork-dependent behavior: availability gating, schedule-driven costs,
//! fee settlement, access-list prepayments.

use bytes::Bytes;
use corevm::{
    account::Account,
    environment::{BlockContext, Environment, TxCall, TxKind},
    fork::{Fork, ForkRules},
    state::{InMemoryState, VmState},
    vm::VM,
    Address, U256,
};

const TX_GAS_LIMIT: u64 = 1_000_000;

fn sender() -> Address {
    Address::from_low_u64_be(0x100)
}

fn contract() -> Address {
    Address::from_low_u64_be(0x200)
}

fn state_with_contract(code: &[u8]) -> InMemoryState {
    let mut state = InMemoryState::new();
    state.seed_account(sender(), Account::with_balance(U256::MAX / 2));
    let code_hash = state.seed_code(Bytes::copy_from_slice(code));
    state.seed_account(contract(), Account::new(U256::zero(), 1, code_hash));
    state
}

fn run_with_rules(
    state: &mut InMemoryState,
    rules: ForkRules,
    block: BlockContext,
    gas_price: U256,
) -> corevm::ExecutionReport {
    let tx = TxCall {
        kind: TxKind::Call(contract()),
        from: sender(),
        value: U256::zero(),
        input: Bytes::new(),
        gas_limit: TX_GAS_LIMIT,
        gas_price,
        access_list: Vec::new(),
    };
    let env = Environment {
        origin: tx.from,
        gas_limit: tx.gas_limit,
        gas_price: tx.gas_price,
        block,
        rules,
    };
    VM::new(env, state, tx).execute().unwrap()
}

#[test]
fn sload_costs_800_under_istanbul() {
    // PUSH1 0, SLOAD, POP, STOP
    let code = [0x60, 0x00, 0x54, 0x50, 0x00];
    let mut state = state_with_contract(&code);
    let report = run_with_rules(
        &mut state,
        ForkRules::mainnet(Fork::Istanbul),
        BlockContext::default(),
        U256::zero(),
    );
    assert!(report.is_success());
    assert_eq!(report.gas_used - 21_000, 3 + 800 + 2);
}

#[test]
fn sload_costs_50_under_frontier() {
    let code = [0x60, 0x00, 0x54, 0x50, 0x00];
    let mut state = state_with_contract(&code);
    let report = run_with_rules(
        &mut state,
        ForkRules::mainnet(Fork::Frontier),
        BlockContext::default(),
        U256::zero(),
    );
    assert!(report.is_success());
    assert_eq!(report.gas_used - 21_000, 3 + 50 + 2);
}

#[test]
fn push0_is_invalid_before_shanghai() {
    let code = [0x5f, 0x00];
    let mut state = state_with_contract(&code);
    let report = run_with_rules(
        &mut state,
        ForkRules::mainnet(Fork::London),
        BlockContext::default(),
        U256::zero(),
    );
    assert!(!report.is_success());
    assert_eq!(report.gas_used, TX_GAS_LIMIT);

    let mut state = state_with_contract(&code);
    let report = run_with_rules(
        &mut state,
        ForkRules::mainnet(Fork::Shanghai),
        BlockContext::default(),
        U256::zero(),
    );
    assert!(report.is_success());
}

#[test]
fn tload_is_invalid_before_cancun() {
    // PUSH1 0, TLOAD, STOP
    let code = [0x60, 0x00, 0x5c, 0x00];
    let mut state = state_with_contract(&code);
    let report = run_with_rules(
        &mut state,
        ForkRules::mainnet(Fork::Shanghai),
        BlockContext::default(),
        U256::zero(),
    );
    assert!(!report.is_success());

    let mut state = state_with_contract(&code);
    let report = run_with_rules(
        &mut state,
        ForkRules::mainnet(Fork::Cancun),
        BlockContext::default(),
        U256::zero(),
    );
    assert!(report.is_success());
}

#[test]
fn transient_storage_round_trip_and_isolation() {
    // TSTORE(0, 7), TLOAD(0), STOP
    let code = [0x60, 0x07, 0x60, 0x00, 0x5d, 0x60, 0x00, 0x5c, 0x00];
    let mut state = state_with_contract(&code);
    let tx = TxCall {
        kind: TxKind::Call(contract()),
        from: sender(),
        value: U256::zero(),
        input: Bytes::new(),
        gas_limit: TX_GAS_LIMIT,
        gas_price: U256::zero(),
        access_list: Vec::new(),
    };
    let env = Environment {
        origin: sender(),
        gas_limit: TX_GAS_LIMIT,
        gas_price: U256::zero(),
        block: BlockContext::default(),
        rules: ForkRules::default(),
    };
    let mut vm = VM::new(env, &mut state, tx);
    let report = vm.execute().unwrap();
    assert!(report.is_success());
    assert_eq!(vm.current_call_frame.stack.peek(0).unwrap(), U256::from(7));

    // transient writes never reach persistent storage, and commit clears
    // the transient store for the next transaction
    state.commit_changes().unwrap();
    assert_eq!(state.get_storage(contract(), U256::zero()).unwrap(), U256::zero());
    assert_eq!(state.get_transient(contract(), U256::zero()).unwrap(), U256::zero());
}

#[test]
fn london_fee_settlement_pays_the_tip() {
    let code = [0x00]; // STOP
    let mut state = state_with_contract(&code);
    let coinbase = Address::from_low_u64_be(0xc01);
    let sender_balance_before = state.get_account(sender()).unwrap().unwrap().balance;

    let block = BlockContext {
        coinbase,
        base_fee: U256::from(3),
        ..Default::default()
    };
    let report = run_with_rules(
        &mut state,
        ForkRules::default(),
        block,
        U256::from(10),
    );
    assert!(report.is_success());
    assert_eq!(report.gas_used, 21_000);

    // coinbase earns gas_used * (gas_price - base_fee)
    assert_eq!(
        state.get_account(coinbase).unwrap().unwrap().balance,
        U256::from(21_000u64) * U256::from(7)
    );
    // the sender paid gas_used * gas_price
    assert_eq!(
        state.get_account(sender()).unwrap().unwrap().balance,
        sender_balance_before - U256::from(21_000u64) * U256::from(10)
    );
}

#[test]
fn declared_access_list_prewarms_and_prepays() {
    // PUSH1 0, SLOAD, POP, STOP
    let code = [0x60, 0x00, 0x54, 0x50, 0x00];
    let mut state = state_with_contract(&code);

    let tx = TxCall {
        kind: TxKind::Call(contract()),
        from: sender(),
        value: U256::zero(),
        input: Bytes::new(),
        gas_limit: TX_GAS_LIMIT,
        gas_price: U256::zero(),
        access_list: vec![(contract(), vec![U256::zero()])],
    };
    let env = Environment {
        origin: sender(),
        gas_limit: TX_GAS_LIMIT,
        gas_price: U256::zero(),
        block: BlockContext::default(),
        rules: ForkRules::default(),
    };
    let report = VM::new(env, &mut state, tx).execute().unwrap();

    assert!(report.is_success());
    // intrinsic picks up 2400 + 1900; the SLOAD itself is warm (100)
    assert_eq!(report.gas_used, 21_000 + 2400 + 1900 + 3 + 100 + 2);
}

#[test]
fn exp_byte_cost_is_10_before_spurious_dragon() {
    // PUSH2 0x0100 (exponent), PUSH1 2 (base), EXP, STOP
    let code = [0x61, 0x01, 0x00, 0x60, 0x02, 0x0a, 0x00];
    let mut state = state_with_contract(&code);
    let report = run_with_rules(
        &mut state,
        ForkRules::mainnet(Fork::Homestead),
        BlockContext::default(),
        U256::zero(),
    );
    assert!(report.is_success());
    // 3 + 3 + (10 + 10*2)
    assert_eq!(report.gas_used - 21_000, 36);
}

#[test]
fn calldata_costs_68_per_byte_before_istanbul() {
    let code = [0x00];
    let mut state = state_with_contract(&code);
    let tx = TxCall {
        kind: TxKind::Call(contract()),
        from: sender(),
        value: U256::zero(),
        input: Bytes::from_static(&[0xff, 0x00]),
        gas_limit: TX_GAS_LIMIT,
        gas_price: U256::zero(),
        access_list: Vec::new(),
    };
    let env = Environment {
        origin: sender(),
        gas_limit: TX_GAS_LIMIT,
        gas_price: U256::zero(),
        block: BlockContext::default(),
        rules: ForkRules::mainnet(Fork::Byzantium),
        ..Default::default()
    };
    let report = VM::new(env, &mut state, tx).execute().unwrap();
    assert_eq!(report.gas_used, 21_000 + 68 + 4);
}
