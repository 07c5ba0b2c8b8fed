//! End-to-end interpreter tests: small hand-assembled programs executed
//! over the in-memory state.

use bytes::Bytes;
use corevm::{
    account::Account,
    environment::{BlockContext, Environment, TxCall, TxKind},
    fork::ForkRules,
    state::{InMemoryState, VmState},
    vm::{calculate_create_address, VM},
    Address, U256,
};

const SENDER_BALANCE: u64 = u64::MAX;
const TX_GAS_LIMIT: u64 = 1_000_000;

fn sender() -> Address {
    Address::from_low_u64_be(0x100)
}

fn contract() -> Address {
    Address::from_low_u64_be(0x200)
}

/// State with a funded sender and one contract holding `code`.
fn state_with_contract(code: &[u8]) -> InMemoryState {
    let mut state = InMemoryState::new();
    state.seed_account(sender(), Account::with_balance(U256::from(SENDER_BALANCE)));
    let code_hash = state.seed_code(Bytes::copy_from_slice(code));
    state.seed_account(contract(), Account::new(U256::zero(), 1, code_hash));
    state
}

fn call_tx(to: Address) -> TxCall {
    TxCall {
        kind: TxKind::Call(to),
        from: sender(),
        value: U256::zero(),
        input: Bytes::new(),
        gas_limit: TX_GAS_LIMIT,
        gas_price: U256::zero(),
        access_list: Vec::new(),
    }
}

fn env_for(tx: &TxCall) -> Environment {
    Environment {
        origin: tx.from,
        gas_limit: tx.gas_limit,
        gas_price: tx.gas_price,
        block: BlockContext::default(),
        rules: ForkRules::default(),
    }
}

/// Runs `code` as a plain call and returns the VM (for stack inspection)
/// and the execution gas spent past the 21000 intrinsic base.
fn run_code(
    state: &mut InMemoryState,
    code_gas: &mut u64,
) -> (corevm::ExecutionReport, Vec<U256>) {
    let tx = call_tx(contract());
    let env = env_for(&tx);
    let mut vm = VM::new(env, state, tx);
    let report = vm.execute().expect("execution should not error internally");
    *code_gas = report.gas_used - 21_000;
    let stack_top = (0..vm.current_call_frame.stack.len())
        .map(|depth| vm.current_call_frame.stack.peek(depth).unwrap())
        .collect();
    (report, stack_top)
}

#[test]
fn add_wraps_around_modulo_2_256() {
    // PUSH1 1, PUSH32 MAX, ADD, STOP
    let mut code = vec![0x60, 0x01, 0x7f];
    code.extend_from_slice(&[0xff; 32]);
    code.extend_from_slice(&[0x01, 0x00]);

    let mut state = state_with_contract(&code);
    let mut code_gas = 0;
    let (report, stack) = run_code(&mut state, &mut code_gas);

    assert!(report.is_success());
    assert_eq!(stack[0], U256::zero());
    assert_eq!(code_gas, 3 + 3 + 3);
}

#[test]
fn sstore_cold_fresh_slot() {
    // PUSH1 42, PUSH1 0, SSTORE, STOP
    let code = [0x60, 0x2a, 0x60, 0x00, 0x55, 0x00];

    let mut state = state_with_contract(&code);
    let mut code_gas = 0;
    let (report, _) = run_code(&mut state, &mut code_gas);

    assert!(report.is_success());
    // 3 + 3 + (2100 cold + 20000 fresh set)
    assert_eq!(code_gas, 22_106);
    assert_eq!(
        state.get_storage(contract(), U256::zero()).unwrap(),
        U256::from(42)
    );
}

#[test]
fn sload_cold_then_warm() {
    // PUSH1 0, SLOAD, POP, PUSH1 0, SLOAD, POP, STOP
    let code = [0x60, 0x00, 0x54, 0x50, 0x60, 0x00, 0x54, 0x50, 0x00];

    let mut state = state_with_contract(&code);
    let mut code_gas = 0;
    let (report, _) = run_code(&mut state, &mut code_gas);

    assert!(report.is_success());
    // 3 + 2100 + 2 + 3 + 100 + 2
    assert_eq!(code_gas, 2210);
}

#[test]
fn exp_charges_per_exponent_byte() {
    // PUSH2 0x0100 (exponent), PUSH1 2 (base), EXP, STOP
    let code = [0x61, 0x01, 0x00, 0x60, 0x02, 0x0a, 0x00];

    let mut state = state_with_contract(&code);
    let mut code_gas = 0;
    let (report, stack) = run_code(&mut state, &mut code_gas);

    assert!(report.is_success());
    // 2^256 wraps to zero
    assert_eq!(stack[0], U256::zero());
    // 3 + 3 + (10 base + 50 * 2 exponent bytes)
    assert_eq!(code_gas, 116);
}

#[test]
fn mulmod_uses_the_full_512_bit_product() {
    // MULMOD(2^128, 2^128, 7): the true product is 2^256, which reduces to
    // 2 modulo 7. A wrapping implementation would see 0.
    let two_pow_128 = [
        0x70, // PUSH17
        0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00,
    ];
    let mut code = vec![0x60, 0x07]; // modulus
    code.extend_from_slice(&two_pow_128);
    code.extend_from_slice(&two_pow_128);
    code.extend_from_slice(&[0x09, 0x00]); // MULMOD, STOP

    let mut state = state_with_contract(&code);
    let mut code_gas = 0;
    let (report, stack) = run_code(&mut state, &mut code_gas);

    assert!(report.is_success());
    assert_eq!(stack[0], U256::from(2));
}

#[test]
fn jumpdest_inside_push_data_is_invalid() {
    // PUSH1 0x5B, JUMP: the only 0x5B byte is PUSH data
    let code = [0x60, 0x5b, 0x56];

    let mut state = state_with_contract(&code);
    let mut code_gas = 0;
    let (report, _) = run_code(&mut state, &mut code_gas);

    assert!(!report.is_success());
    // invalid jumps consume everything
    assert_eq!(report.gas_used, TX_GAS_LIMIT);
}

#[test]
fn jump_to_real_jumpdest() {
    // PUSH1 4, JUMP, INVALID, JUMPDEST, PUSH1 7, STOP
    let code = [0x60, 0x04, 0x56, 0xfe, 0x5b, 0x60, 0x07, 0x00];

    let mut state = state_with_contract(&code);
    let mut code_gas = 0;
    let (report, stack) = run_code(&mut state, &mut code_gas);

    assert!(report.is_success());
    assert_eq!(stack[0], U256::from(7));
    // 3 + 8 + 1 + 3
    assert_eq!(code_gas, 15);
}

#[test]
fn nested_call_revert_rolls_back_storage() {
    // child: PUSH1 1, PUSH1 0, SSTORE, PUSH1 0, PUSH1 0, REVERT
    let child_code = [0x60, 0x01, 0x60, 0x00, 0x55, 0x60, 0x00, 0x60, 0x00, 0xfd];
    let child = Address::from_low_u64_be(0x300);

    // parent: CALL(gas=0xffff, child, value=0, in=(0,0), out=(0,0)), STOP
    let mut parent_code = vec![
        0x60, 0x00, // ret size
        0x60, 0x00, // ret offset
        0x60, 0x00, // args size
        0x60, 0x00, // args offset
        0x60, 0x00, // value
        0x73, // PUSH20 child
    ];
    parent_code.extend_from_slice(child.as_bytes());
    parent_code.extend_from_slice(&[0x61, 0xff, 0xff, 0xf1, 0x00]); // PUSH2 gas, CALL, STOP

    let mut state = state_with_contract(&parent_code);
    let child_hash = state.seed_code(Bytes::copy_from_slice(&child_code));
    state.seed_account(child, Account::new(U256::zero(), 1, child_hash));

    let mut code_gas = 0;
    let (report, stack) = run_code(&mut state, &mut code_gas);

    // the parent itself succeeds; the failed sub-call pushed 0
    assert!(report.is_success());
    assert_eq!(stack[0], U256::zero());
    // the child's write is gone
    assert_eq!(state.get_storage(child, U256::zero()).unwrap(), U256::zero());
    // the child burnt gas up to the REVERT, the rest came back: far less
    // than the full 0xffff forwarded
    assert!(code_gas < 0xffff);
    // cold account access + child's SSTORE attempt are in the bill
    assert!(code_gas > 2600 + 2100);
}

#[test]
fn call_failure_preserves_parent_storage_writes() {
    let child = Address::from_low_u64_be(0x300);
    // parent: SSTORE(0, 7) then CALL child (which reverts), STOP
    let mut parent_code = vec![0x60, 0x07, 0x60, 0x00, 0x55];
    parent_code.extend_from_slice(&[0x60, 0x00, 0x60, 0x00, 0x60, 0x00, 0x60, 0x00, 0x60, 0x00]);
    parent_code.push(0x73);
    parent_code.extend_from_slice(child.as_bytes());
    parent_code.extend_from_slice(&[0x61, 0xff, 0xff, 0xf1, 0x00]);

    let child_code = [0x60, 0x00, 0x60, 0x00, 0xfd]; // REVERT(0,0)

    let mut state = state_with_contract(&parent_code);
    let child_hash = state.seed_code(Bytes::copy_from_slice(&child_code));
    state.seed_account(child, Account::new(U256::zero(), 1, child_hash));

    let mut code_gas = 0;
    let (report, _) = run_code(&mut state, &mut code_gas);

    assert!(report.is_success());
    assert_eq!(state.get_storage(contract(), U256::zero()).unwrap(), U256::from(7));
}

#[test]
fn staticcall_blocks_storage_writes() {
    let child = Address::from_low_u64_be(0x300);
    // child tries SSTORE(0, 1)
    let child_code = [0x60, 0x01, 0x60, 0x00, 0x55, 0x00];

    // parent: STATICCALL(gas, child, in=(0,0), out=(0,0)), STOP
    let mut parent_code = vec![
        0x60, 0x00, // ret size
        0x60, 0x00, // ret offset
        0x60, 0x00, // args size
        0x60, 0x00, // args offset
        0x73,
    ];
    parent_code.extend_from_slice(child.as_bytes());
    parent_code.extend_from_slice(&[0x61, 0xff, 0xff, 0xfa, 0x00]);

    let mut state = state_with_contract(&parent_code);
    let child_hash = state.seed_code(Bytes::copy_from_slice(&child_code));
    state.seed_account(child, Account::new(U256::zero(), 1, child_hash));

    let mut code_gas = 0;
    let (report, stack) = run_code(&mut state, &mut code_gas);

    assert!(report.is_success());
    // the write-protected child failed
    assert_eq!(stack[0], U256::zero());
    assert_eq!(state.get_storage(child, U256::zero()).unwrap(), U256::zero());
}

#[test]
fn memory_expansion_is_charged_quadratically() {
    // MSTORE at offset 0, then MSIZE
    let code = [0x60, 0x01, 0x60, 0x00, 0x52, 0x59, 0x00];

    let mut state = state_with_contract(&code);
    let mut code_gas = 0;
    let (report, stack) = run_code(&mut state, &mut code_gas);

    assert!(report.is_success());
    assert_eq!(stack[0], U256::from(32));
    // 3 + 3 + (3 mstore + 3 expansion to one word) + 2
    assert_eq!(code_gas, 14);
}

#[test]
fn refund_is_capped_at_a_fifth_of_gas_used() {
    // SSTORE(0, 1), SSTORE(0, 0): setting then clearing a fresh slot
    let code = [0x60, 0x01, 0x60, 0x00, 0x55, 0x60, 0x00, 0x60, 0x00, 0x55, 0x00];

    let mut state = state_with_contract(&code);
    let mut code_gas = 0;
    let (report, _) = run_code(&mut state, &mut code_gas);

    assert!(report.is_success());
    // execution cost: (3+3+22100) + (3+3+100) on top of the 21000 base;
    // clearing the dirty fresh slot earns a 19900 refund, capped at 1/5
    let uncapped_gas = 21_000 + 22_212;
    assert_eq!(report.gas_refunded, uncapped_gas / 5);
    assert_eq!(report.gas_used, uncapped_gas - uncapped_gas / 5);
}

#[test]
fn transfer_moves_balance() {
    let recipient = Address::from_low_u64_be(0x999);
    let mut state = InMemoryState::new();
    state.seed_account(sender(), Account::with_balance(U256::from(SENDER_BALANCE)));

    let mut tx = call_tx(recipient);
    tx.value = U256::from(1234);
    let env = env_for(&tx);
    let report = VM::new(env, &mut state, tx).execute().unwrap();

    assert!(report.is_success());
    assert_eq!(report.gas_used, 21_000);
    assert_eq!(
        state.get_account(recipient).unwrap().unwrap().balance,
        U256::from(1234)
    );
    let sender_account = state.get_account(sender()).unwrap().unwrap();
    assert_eq!(
        sender_account.balance,
        U256::from(SENDER_BALANCE) - U256::from(1234)
    );
    assert_eq!(sender_account.nonce, 1);
}

#[test]
fn create_transaction_deploys_code() {
    // initcode: PUSH1 1, PUSH1 0, RETURN -- deploys the single byte 0x00
    let initcode = [0x60, 0x01, 0x60, 0x00, 0xf3];

    let mut state = InMemoryState::new();
    state.seed_account(sender(), Account::with_balance(U256::from(SENDER_BALANCE)));

    let tx = TxCall {
        kind: TxKind::Create,
        from: sender(),
        value: U256::zero(),
        input: Bytes::copy_from_slice(&initcode),
        gas_limit: TX_GAS_LIMIT,
        gas_price: U256::zero(),
        access_list: Vec::new(),
    };
    let env = env_for(&tx);
    let report = VM::new(env, &mut state, tx).execute().unwrap();

    assert!(report.is_success());
    let created = report.created_address.expect("create reports its address");
    assert_eq!(created, calculate_create_address(sender(), 0));

    let account = state.get_account(created).unwrap().unwrap();
    assert_eq!(account.nonce, 1);
    let deployed = state.get_code(account.code_hash).unwrap();
    assert_eq!(&deployed[..], &[0x00]);
    assert_eq!(state.get_account(sender()).unwrap().unwrap().nonce, 1);
}

#[test]
fn create_opcode_deploys_and_pushes_the_address() {
    // memory[0..13]: the initcode for a trivial deployment, written with
    // MSTORE of a right-aligned word, then CREATE(0, 19, 13)
    //
    // initcode deploys a single STOP byte: PUSH1 1, PUSH1 0, RETURN
    // word = initcode right-aligned at bytes 27..32
    let mut code = vec![0x7f]; // PUSH32
    let mut word = [0u8; 32];
    word[27..32].copy_from_slice(&[0x60, 0x01, 0x60, 0x00, 0xf3]);
    code.extend_from_slice(&word);
    code.extend_from_slice(&[
        0x60, 0x00, // offset 0
        0x52, // MSTORE
        0x60, 0x05, // size 5
        0x60, 0x1b, // offset 27
        0x60, 0x00, // value 0
        0xf0, // CREATE
        0x00, // STOP
    ]);

    let mut state = state_with_contract(&code);
    let mut code_gas = 0;
    let (report, stack) = run_code(&mut state, &mut code_gas);

    assert!(report.is_success());
    let created = calculate_create_address(contract(), 1);
    assert_eq!(stack[0], corevm::utils::address_to_word(created));

    let account = state.get_account(created).unwrap().unwrap();
    assert_eq!(account.nonce, 1);
    assert_eq!(&state.get_code(account.code_hash).unwrap()[..], &[0x00]);
    // the deployer's nonce moved from 1 to 2
    assert_eq!(state.get_account(contract()).unwrap().unwrap().nonce, 2);
}

#[test]
fn identity_precompile_via_transaction() {
    let mut state = InMemoryState::new();
    state.seed_account(sender(), Account::with_balance(U256::from(SENDER_BALANCE)));

    let mut tx = call_tx(Address::from_low_u64_be(4));
    tx.input = Bytes::from_static(&[1, 2, 3]);
    let env = env_for(&tx);
    let report = VM::new(env, &mut state, tx).execute().unwrap();

    assert!(report.is_success());
    assert_eq!(&report.output[..], &[1, 2, 3]);
    // 21000 + 3*16 calldata + (15 + 3) identity
    assert_eq!(report.gas_used, 21_000 + 48 + 18);
}

#[test]
fn out_of_gas_consumes_everything() {
    // an infinite loop: JUMPDEST, PUSH1 0, JUMP
    let code = [0x5b, 0x60, 0x00, 0x56];

    let mut state = state_with_contract(&code);
    let mut code_gas = 0;
    let (report, _) = run_code(&mut state, &mut code_gas);

    assert!(!report.is_success());
    assert_eq!(report.gas_used, TX_GAS_LIMIT);
}

#[test]
fn revert_returns_data_and_remaining_gas() {
    // MSTORE8(0, 0xAB), REVERT(0, 1)
    let code = [0x60, 0xab, 0x60, 0x00, 0x53, 0x60, 0x01, 0x60, 0x00, 0xfd];

    let mut state = state_with_contract(&code);
    let mut code_gas = 0;
    let (report, _) = run_code(&mut state, &mut code_gas);

    assert!(!report.is_success());
    assert_eq!(&report.output[..], &[0xab]);
    // remaining gas was preserved, so far less than the limit was spent
    assert!(report.gas_used < 22_000);
}

#[test]
fn logs_are_recorded_in_the_report() {
    // LOG0 over one memory byte, then STOP
    let code = [0x60, 0xaa, 0x60, 0x00, 0x53, 0x60, 0x01, 0x60, 0x00, 0xa0, 0x00];

    let mut state = state_with_contract(&code);
    let mut code_gas = 0;
    let (report, _) = run_code(&mut state, &mut code_gas);

    assert!(report.is_success());
    assert_eq!(report.logs.len(), 1);
    assert_eq!(report.logs[0].address, contract());
    assert_eq!(&report.logs[0].data[..], &[0xaa]);
}

#[test]
fn calldata_opcodes_see_the_input() {
    // CALLDATASIZE, PUSH1 0, CALLDATALOAD, STOP
    let code = [0x36, 0x60, 0x00, 0x35, 0x00];

    let mut state = state_with_contract(&code);
    let tx = {
        let mut tx = call_tx(contract());
        tx.input = Bytes::from_static(&[0xff, 0x01]);
        tx
    };
    let env = env_for(&tx);
    let mut vm = VM::new(env, &mut state, tx);
    let report = vm.execute().unwrap();

    assert!(report.is_success());
    // CALLDATALOAD(0) left-aligns: 0xff01 << 240
    assert_eq!(
        vm.current_call_frame.stack.peek(0).unwrap(),
        U256::from_big_endian(&{
            let mut word = [0u8; 32];
            word[0] = 0xff;
            word[1] = 0x01;
            word
        })
    );
    assert_eq!(vm.current_call_frame.stack.peek(1).unwrap(), U256::from(2));
}
