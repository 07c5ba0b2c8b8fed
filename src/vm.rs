//! The interpreter and the transaction executor.
//!
//! The VM owns an explicit call-frame stack. Dispatch per step: fetch the
//! opcode byte, look up its table entry, validate the stack preconditions,
//! charge the base gas, run the handler. Call and create handlers push a
//! child frame and the loop keeps going; a frame that halts is folded back
//! into its parent by `handle_return`, committing or reverting the state
//! snapshot the child owned.

use crate::{
    account::{code_hash, Account},
    call_frame::{CallFrame, JumpTargets},
    constants::{
        CALL_DEPTH_LIMIT, EOF_PREFIX, FAIL, INIT_CODE_MAX_SIZE, MAX_CODE_SIZE,
        MAX_REFUND_QUOTIENT, MAX_REFUND_QUOTIENT_PRE_LONDON, SUCCESS,
    },
    environment::{BlockContext, Environment, TxCall, TxKind},
    errors::{
        ContextResult, ExceptionalHalt, ExecutionReport, InternalError, OpcodeResult, TxResult,
        TxValidationError, VMError,
    },
    fork::ForkRules,
    gas_cost,
    gas_schedule::GasSchedule,
    opcodes::{build_opcode_table, OpcodeEntry},
    precompiles::{self, precompiles_for_rules},
    state::VmState,
    substate::{LogEntry, Substate},
    utils::address_to_word,
};
use bytes::Bytes;
use ethereum_types::{Address, H256, U256};
use keccak_hash::keccak;
use rustc_hash::FxHashMap;
use std::{mem, sync::Arc};
use tracing::debug;

/// Result of the [`execute`] entry point.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub success: bool,
    pub gas_used: u64,
    pub return_data: Bytes,
    pub logs: Vec<LogEntry>,
    pub created_address: Option<Address>,
    pub state_root: H256,
}

/// Executes a single transaction-level call against `db` and commits the
/// resulting state, returning the report and the post-state root.
pub fn execute(
    tx: &TxCall,
    block: BlockContext,
    rules: ForkRules,
    db: &mut dyn VmState,
) -> Result<ExecutionResult, VMError> {
    let env = Environment {
        origin: tx.from,
        gas_limit: tx.gas_limit,
        gas_price: tx.gas_price,
        block,
        rules,
    };
    let report = VM::new(env, db, tx.clone()).execute()?;
    let state_root = db.commit_changes()?;
    Ok(ExecutionResult {
        success: report.is_success(),
        gas_used: report.gas_used,
        return_data: report.output.clone(),
        logs: report.logs,
        created_address: report.created_address,
        state_root,
    })
}

pub struct VM<'a> {
    /// Parent frames, outermost first. The running frame lives in
    /// `current_call_frame`.
    pub call_frames: Vec<CallFrame>,
    pub current_call_frame: CallFrame,
    pub env: Environment,
    pub substate: Substate,
    pub db: &'a mut dyn VmState,
    pub tx: TxCall,

    substate_backups: Vec<Substate>,
    /// Storage values at the start of the transaction, for SSTORE pricing.
    storage_original_values: FxHashMap<Address, FxHashMap<U256, U256>>,
    /// Jumpdest bitmaps cached by code hash.
    jump_targets_cache: FxHashMap<H256, Arc<JumpTargets>>,
    opcode_table: [OpcodeEntry; 256],

    intrinsic_gas: u64,
    created_address: Option<Address>,
}

impl<'a> VM<'a> {
    pub fn new(env: Environment, db: &'a mut dyn VmState, tx: TxCall) -> Self {
        let opcode_table = build_opcode_table(&env.rules);
        // placeholder until setup_root_frame runs
        let root = CallFrame::new(
            env.origin,
            Address::zero(),
            Address::zero(),
            Bytes::new(),
            crate::constants::EMPTY_CODE_HASH,
            U256::zero(),
            Bytes::new(),
            false,
            0,
            0,
            false,
            Arc::new(JumpTargets::default()),
        );
        Self {
            call_frames: Vec::new(),
            current_call_frame: root,
            env,
            substate: Substate::default(),
            db,
            tx,
            substate_backups: Vec::new(),
            storage_original_values: FxHashMap::default(),
            jump_targets_cache: FxHashMap::default(),
            opcode_table,
            intrinsic_gas: 0,
            created_address: None,
        }
    }

    #[inline]
    pub fn schedule(&self) -> &'static GasSchedule {
        GasSchedule::for_fork(self.env.rules.fork)
    }

    /// Executes the whole transaction: validation, intrinsic charge, root
    /// frame, finalization.
    pub fn execute(&mut self) -> Result<ExecutionReport, VMError> {
        self.prepare_execution()?;

        if let Some(report) = self.setup_root_frame()? {
            // create-address collision aborts before running any code
            return self.finalize_execution(report);
        }

        let ctx_result = self.run_execution()?;
        self.finalize_execution(ctx_result)
    }

    /// Transaction-level validation and irreversible up-front changes:
    /// intrinsic gas, fee debit, nonce bump, access-list warming.
    fn prepare_execution(&mut self) -> Result<(), VMError> {
        let rules = self.env.rules;
        let schedule = self.schedule();
        let is_create = self.tx.is_create();

        if is_create && rules.is_shanghai && self.tx.input.len() > INIT_CODE_MAX_SIZE {
            return Err(TxValidationError::InitcodeTooLarge.into());
        }

        let mut intrinsic = gas_cost::tx_intrinsic(&self.tx.input, is_create, &rules, schedule)?;
        if rules.is_berlin {
            let addresses = self.tx.access_list.len() as u64;
            let keys: u64 = self
                .tx
                .access_list
                .iter()
                .map(|(_, slots)| slots.len() as u64)
                .sum();
            intrinsic = intrinsic
                .checked_add(gas_cost::tx_access_list(addresses, keys)?)
                .ok_or(ExceptionalHalt::OutOfGas)?;
        }
        if self.env.gas_limit < intrinsic {
            return Err(TxValidationError::IntrinsicGasTooHigh.into());
        }
        self.intrinsic_gas = intrinsic;

        let sender = self.env.origin;
        let mut sender_account = self.get_account(sender)?;
        if sender_account.nonce == u64::MAX {
            return Err(TxValidationError::NonceOverflow.into());
        }

        let max_fee = U256::from(self.env.gas_limit)
            .checked_mul(self.env.gas_price)
            .ok_or(TxValidationError::InsufficientFunds)?;
        let up_front = max_fee
            .checked_add(self.tx.value)
            .ok_or(TxValidationError::InsufficientFunds)?;
        if sender_account.balance < up_front {
            return Err(TxValidationError::InsufficientFunds.into());
        }

        // the create address is derived from the pre-bump nonce
        if is_create {
            self.created_address = Some(match self.tx.kind {
                TxKind::Create2 { salt } => {
                    calculate_create2_address(sender, &self.tx.input, salt)
                }
                _ => calculate_create_address(sender, sender_account.nonce),
            });
        }

        sender_account.balance -= max_fee;
        sender_account.nonce += 1;
        self.db.set_account(sender, sender_account)?;

        // transaction-scoped warm sets
        self.substate.reset();
        self.substate.access_list.mark_address_warm(sender);
        if let Some(to) = self.tx.to() {
            self.substate.access_list.mark_address_warm(to);
        }
        if let Some(created) = self.created_address {
            self.substate.access_list.mark_address_warm(created);
        }
        if rules.is_shanghai {
            self.substate
                .access_list
                .mark_address_warm(self.env.block.coinbase);
        }
        for precompile in precompiles_for_rules(&rules) {
            self.substate.access_list.mark_address_warm(precompile.address);
        }
        let access_list = mem::take(&mut self.tx.access_list);
        for (address, keys) in &access_list {
            self.substate.access_list.mark_address_warm(*address);
            for key in keys {
                self.substate.access_list.mark_slot_warm(*address, *key);
            }
        }
        self.tx.access_list = access_list;

        Ok(())
    }

    /// Builds the root frame inside its own snapshot. Returns a failed
    /// context directly when a create transaction collides with an
    /// existing account.
    fn setup_root_frame(&mut self) -> Result<Option<ContextResult>, VMError> {
        let available_gas = self.env.gas_limit - self.intrinsic_gas;
        let sender = self.env.origin;
        let rules = self.env.rules;

        let snapshot = self.db.create_snapshot()?;
        self.substate_backups.push(self.substate.clone());

        let frame = if let Some(created) = self.created_address {
            let target = self.get_account(created)?;
            if target.create_would_collide() {
                debug!(address = ?created, "create transaction collides with existing account");
                self.db.revert_to_snapshot(snapshot)?;
                let _ = self.substate_backups.pop();
                return Ok(Some(ContextResult {
                    result: TxResult::Revert(ExceptionalHalt::InvalidOpcode.into()),
                    gas_used: available_gas,
                    output: Bytes::new(),
                }));
            }

            let initcode = self.tx.input.clone();
            let initcode_hash = code_hash(&initcode);
            let jump_targets = Arc::new(JumpTargets::analyze(&initcode));
            let mut frame = CallFrame::new(
                sender,
                created,
                created,
                initcode,
                initcode_hash,
                self.tx.value,
                Bytes::new(),
                false,
                available_gas,
                0,
                true,
                jump_targets,
            );
            frame.snapshot = Some(snapshot);

            self.substate.add_created_account(created);
            let mut account = self.get_account(created)?;
            if rules.is_spurious_dragon {
                account.nonce = 1;
            }
            self.db.set_account(created, account)?;
            self.transfer(sender, created, self.tx.value)?;
            frame
        } else {
            let to = self.tx.to().ok_or(InternalError::TypeConversion)?;
            let (bytecode, bytecode_hash) = self.code_of_account(to)?;
            let jump_targets = self.jump_targets_for(bytecode_hash, &bytecode);
            let mut frame = CallFrame::new(
                sender,
                to,
                to,
                bytecode,
                bytecode_hash,
                self.tx.value,
                self.tx.input.clone(),
                false,
                available_gas,
                0,
                false,
                jump_targets,
            );
            frame.snapshot = Some(snapshot);
            self.transfer(sender, to, self.tx.value)?;
            frame
        };

        self.current_call_frame = frame;
        Ok(None)
    }

    /// Main interpreter loop.
    pub fn run_execution(&mut self) -> Result<ContextResult, VMError> {
        // a transaction targeting a precompile bypasses the interpreter
        if !self.current_call_frame.is_create
            && precompiles::is_precompile(self.current_call_frame.code_address, &self.env.rules)
        {
            let ctx_result = self.run_root_precompile()?;
            self.handle_frame_state(&ctx_result)?;
            return Ok(ctx_result);
        }

        loop {
            let opcode = self.current_call_frame.next_opcode();
            let entry = self.opcode_table[opcode as usize];

            let op_result = self.step(&entry);

            let ctx_result = match op_result {
                Ok(OpcodeResult::Continue { pc_increment }) => {
                    self.current_call_frame.pc =
                        self.current_call_frame.pc.wrapping_add(pc_increment);
                    continue;
                }
                Ok(OpcodeResult::Halt) => self.handle_opcode_result()?,
                Err(error) => self.handle_opcode_error(error)?,
            };

            if self.call_frames.is_empty() {
                self.handle_frame_state(&ctx_result)?;
                return Ok(ctx_result);
            }

            self.handle_return(&ctx_result)?;
        }
    }

    /// One dispatch step: stack preconditions, base gas, handler.
    #[inline(always)]
    fn step(&mut self, entry: &OpcodeEntry) -> Result<OpcodeResult, VMError> {
        let stack_size = self.current_call_frame.stack.len();
        if stack_size < usize::from(entry.min_stack) {
            return Err(ExceptionalHalt::StackUnderflow.into());
        }
        if entry.stack_delta > 0
            && stack_size + entry.stack_delta as usize > crate::constants::STACK_LIMIT
        {
            return Err(ExceptionalHalt::StackOverflow.into());
        }
        self.current_call_frame
            .increase_consumed_gas(entry.base_gas)?;
        entry.handler.call(self)
    }

    /// A frame halted normally (STOP, RETURN, SELFDESTRUCT).
    fn handle_opcode_result(&mut self) -> Result<ContextResult, VMError> {
        let output = mem::take(&mut self.current_call_frame.output);
        let mut ctx_result = ContextResult {
            result: TxResult::Success,
            gas_used: self.current_call_frame.gas_used(),
            output,
        };
        if self.current_call_frame.is_create {
            self.validate_contract_creation(&mut ctx_result)?;
        }
        Ok(ctx_result)
    }

    /// A frame failed. Exceptional halts consume every unit of gas left;
    /// REVERT keeps the remainder and carries its payload.
    fn handle_opcode_error(&mut self, error: VMError) -> Result<ContextResult, VMError> {
        if error.should_propagate() {
            return Err(error);
        }
        if !error.is_revert_opcode() {
            self.current_call_frame.burn_all_gas();
        }
        let output = mem::take(&mut self.current_call_frame.output);
        Ok(ContextResult {
            result: TxResult::Revert(error),
            gas_used: self.current_call_frame.gas_used(),
            output,
        })
    }

    /// Commits or reverts the current frame's snapshot and substate backup.
    fn handle_frame_state(&mut self, ctx_result: &ContextResult) -> Result<(), VMError> {
        let snapshot = self
            .current_call_frame
            .snapshot
            .take()
            .ok_or(InternalError::MissingSnapshot)?;
        let backup = self
            .substate_backups
            .pop()
            .ok_or(InternalError::EmptySubstateBackups)?;
        if ctx_result.is_success() {
            self.db.commit_snapshot(snapshot)?;
        } else {
            self.db.revert_to_snapshot(snapshot)?;
            self.substate = backup;
        }
        Ok(())
    }

    /// Folds a finished child frame back into its parent.
    fn handle_return(&mut self, ctx_result: &ContextResult) -> Result<(), VMError> {
        self.handle_frame_state(ctx_result)?;

        let parent = self
            .call_frames
            .pop()
            .ok_or(InternalError::EmptyCallFrames)?;
        let child = mem::replace(&mut self.current_call_frame, parent);

        if child.is_create {
            self.handle_return_create(child, ctx_result)
        } else {
            self.handle_return_call(child, ctx_result)
        }
    }

    fn handle_return_call(
        &mut self,
        child: CallFrame,
        ctx_result: &ContextResult,
    ) -> Result<(), VMError> {
        let parent = &mut self.current_call_frame;

        let unused_gas = child
            .gas_limit
            .checked_sub(ctx_result.gas_used)
            .ok_or(InternalError::Underflow)?;
        parent.return_gas(unused_gas);

        // the output window was pre-expanded by the call handler
        let window = ctx_result.output.len().min(child.ret_len);
        parent
            .memory
            .store_data(child.ret_offset, &ctx_result.output[..window])?;
        parent.sub_return_data = ctx_result.output.clone();

        let status = if ctx_result.is_success() { SUCCESS } else { FAIL };
        parent.stack.push(status)?;
        Ok(())
    }

    fn handle_return_create(
        &mut self,
        child: CallFrame,
        ctx_result: &ContextResult,
    ) -> Result<(), VMError> {
        let parent = &mut self.current_call_frame;

        let unused_gas = child
            .gas_limit
            .checked_sub(ctx_result.gas_used)
            .ok_or(InternalError::Underflow)?;
        parent.return_gas(unused_gas);

        match &ctx_result.result {
            TxResult::Success => {
                parent.stack.push(address_to_word(child.to))?;
            }
            TxResult::Revert(error) => {
                // only REVERT exposes data through RETURNDATACOPY
                if error.is_revert_opcode() {
                    parent.sub_return_data = ctx_result.output.clone();
                }
                parent.stack.push(FAIL)?;
            }
        }
        Ok(())
    }

    /// Deposit-time checks of a create frame's result: [EIP-170] size cap,
    /// [EIP-3541] 0xEF rejection, the 200-gas-per-byte deposit charge.
    fn validate_contract_creation(&mut self, ctx_result: &mut ContextResult) -> Result<(), VMError> {
        let rules = self.env.rules;
        let deployed = mem::take(&mut ctx_result.output);

        let deposit_cost = gas_cost::CODE_DEPOSIT_COST.saturating_mul(deployed.len() as u64);
        let failure = if rules.is_spurious_dragon && deployed.len() > MAX_CODE_SIZE {
            Some(ExceptionalHalt::ContractOutputTooBig)
        } else if rules.is_london && deployed.first() == Some(&EOF_PREFIX) {
            Some(ExceptionalHalt::InvalidContractPrefix)
        } else if self
            .current_call_frame
            .increase_consumed_gas(deposit_cost)
            .is_err()
        {
            Some(ExceptionalHalt::OutOfGas)
        } else {
            None
        };

        match failure {
            Some(halt) => {
                self.current_call_frame.burn_all_gas();
                ctx_result.result = TxResult::Revert(halt.into());
                ctx_result.gas_used = self.current_call_frame.gas_used();
            }
            None => {
                let to = self.current_call_frame.to;
                let hash = self.db.set_code(deployed.clone())?;
                let mut account = self.get_account(to)?;
                account.code_hash = hash;
                self.db.set_account(to, account)?;
                ctx_result.gas_used = self.current_call_frame.gas_used();
                ctx_result.output = deployed;
            }
        }
        Ok(())
    }

    /// Runs a transaction whose target is a precompile address.
    fn run_root_precompile(&mut self) -> Result<ContextResult, VMError> {
        let frame = &self.current_call_frame;
        let mut gas_remaining = frame.gas_remaining;
        match precompiles::execute_precompile(
            frame.code_address,
            &frame.calldata,
            &mut gas_remaining,
            &self.env.rules,
        ) {
            Ok(output) => Ok(ContextResult {
                result: TxResult::Success,
                gas_used: self.current_call_frame.gas_limit - gas_remaining,
                output,
            }),
            Err(error) if error.should_propagate() => Err(error),
            Err(error) => Ok(ContextResult {
                result: TxResult::Revert(error),
                gas_used: self.current_call_frame.gas_limit,
                output: Bytes::new(),
            }),
        }
    }

    /// Refund capping and fee settlement.
    fn finalize_execution(&mut self, ctx_result: ContextResult) -> Result<ExecutionReport, VMError> {
        let rules = self.env.rules;
        let mut gas_used = self
            .intrinsic_gas
            .checked_add(ctx_result.gas_used)
            .ok_or(InternalError::Overflow)?;

        // [EIP-3529] caps the refund at gas_used/5 (gas_used/2 before London)
        let quotient = if rules.is_london {
            MAX_REFUND_QUOTIENT
        } else {
            MAX_REFUND_QUOTIENT_PRE_LONDON
        };
        let refund = self.substate.refunded_gas.min(gas_used / quotient);
        gas_used -= refund;

        // return the unspent part of the up-front fee
        let unspent = U256::from(self.env.gas_limit - gas_used) * self.env.gas_price;
        self.add_balance(self.env.origin, unspent)?;

        // coinbase earns the tip (the full price before London)
        let tip_per_gas = if rules.is_london {
            self.env
                .gas_price
                .checked_sub(self.env.block.base_fee)
                .unwrap_or_default()
        } else {
            self.env.gas_price
        };
        self.add_balance(self.env.block.coinbase, U256::from(gas_used) * tip_per_gas)?;

        // accounts marked by SELFDESTRUCT disappear at end of transaction
        let destroyed: Vec<Address> = self.substate.selfdestruct_set.iter().copied().collect();
        for address in destroyed {
            self.db.delete_account(address)?;
        }

        let created_address = if ctx_result.is_success() {
            self.created_address
        } else {
            None
        };

        debug!(
            success = ctx_result.is_success(),
            gas_used,
            refund,
            logs = self.substate.logs.len(),
            "transaction finalized"
        );

        Ok(ExecutionReport {
            result: ctx_result.result,
            gas_used,
            gas_refunded: refund,
            output: ctx_result.output,
            logs: mem::take(&mut self.substate.logs),
            created_address,
        })
    }

    // ===================== account helpers =====================

    /// Reads an account; absent accounts are the empty account.
    pub fn get_account(&mut self, address: Address) -> Result<Account, VMError> {
        Ok(self.db.get_account(address)?.unwrap_or_default())
    }

    /// Bytecode and code hash of an account.
    pub fn code_of_account(&mut self, address: Address) -> Result<(Bytes, H256), VMError> {
        let account = self.get_account(address)?;
        let code = self.db.get_code(account.code_hash)?;
        Ok((code, account.code_hash))
    }

    /// Bytecode of an account (EXTCODE* view).
    pub fn get_code_of(&mut self, address: Address) -> Result<Bytes, VMError> {
        Ok(self.code_of_account(address)?.0)
    }

    fn add_balance(&mut self, address: Address, amount: U256) -> Result<(), VMError> {
        let mut account = self.get_account(address)?;
        account.balance = account
            .balance
            .checked_add(amount)
            .ok_or(InternalError::Overflow)?;
        self.db.set_account(address, account)?;
        Ok(())
    }

    /// Moves `value` between accounts, materializing the recipient.
    pub fn transfer(&mut self, from: Address, to: Address, value: U256) -> Result<(), VMError> {
        if value.is_zero() || from == to {
            return Ok(());
        }
        let mut sender = self.get_account(from)?;
        sender.balance = sender
            .balance
            .checked_sub(value)
            .ok_or(InternalError::Underflow)?;
        self.db.set_account(from, sender)?;
        self.add_balance(to, value)
    }

    pub fn increment_account_nonce(&mut self, address: Address) -> Result<(), VMError> {
        let mut account = self.get_account(address)?;
        account.nonce = account.nonce.checked_add(1).ok_or(InternalError::Overflow)?;
        self.db.set_account(address, account)?;
        Ok(())
    }

    /// Storage value at the start of the transaction, memoized on first
    /// read of each slot.
    pub fn get_original_storage(&mut self, address: Address, key: U256) -> Result<U256, VMError> {
        if let Some(value) = self
            .storage_original_values
            .get(&address)
            .and_then(|slots| slots.get(&key))
        {
            return Ok(*value);
        }
        let value = self.db.get_storage(address, key)?;
        self.storage_original_values
            .entry(address)
            .or_default()
            .insert(key, value);
        Ok(value)
    }

    /// SSTORE refund bookkeeping per the EIP-2200/2929/3529 table. The
    /// per-fork deltas are derived from the schedule instead of being
    /// hardcoded (e.g. restore-to-empty is 19900 under Berlin but 19200
    /// under Istanbul).
    pub(crate) fn apply_sstore_refunds(
        &mut self,
        original_value: U256,
        current_value: U256,
        new_value: U256,
    ) {
        let rules = self.env.rules;
        let schedule = self.schedule();
        let net_metering = (rules.is_constantinople && !rules.is_petersburg) || rules.is_istanbul;
        let clears_refund = schedule.sstore_clears_refund;

        if !net_metering {
            if !current_value.is_zero() && new_value.is_zero() {
                self.substate.add_refund(clears_refund);
            }
            return;
        }

        if new_value == current_value {
            return;
        }

        let noop_gas = if schedule.has_access_lists {
            schedule.warm_sload
        } else if rules.is_istanbul {
            schedule.sload
        } else {
            200
        };

        if current_value == original_value {
            if !original_value.is_zero() && new_value.is_zero() {
                self.substate.add_refund(clears_refund);
            }
        } else {
            if !original_value.is_zero() {
                if current_value.is_zero() {
                    self.substate.remove_refund(clears_refund);
                } else if new_value.is_zero() {
                    self.substate.add_refund(clears_refund);
                }
            }
            if new_value == original_value {
                if original_value.is_zero() {
                    self.substate
                        .add_refund(schedule.sstore_set.saturating_sub(noop_gas));
                } else {
                    self.substate
                        .add_refund(schedule.sstore_reset.saturating_sub(noop_gas));
                }
            }
        }
    }

    fn jump_targets_for(&mut self, bytecode_hash: H256, bytecode: &Bytes) -> Arc<JumpTargets> {
        self.jump_targets_cache
            .entry(bytecode_hash)
            .or_insert_with(|| Arc::new(JumpTargets::analyze(bytecode)))
            .clone()
    }

    // ===================== call orchestration =====================

    /// Values the call handlers need for gas computation: the combined
    /// memory requirement of both windows, the EIP-2929 coldness, and
    /// whether the target counts as dead for G_newaccount.
    pub(crate) fn get_call_gas_params(
        &mut self,
        args_offset: usize,
        args_size: usize,
        ret_offset: usize,
        ret_size: usize,
        callee: Address,
    ) -> Result<(usize, bool, bool), VMError> {
        use crate::memory::calculate_memory_size;
        let address_was_cold = self.substate.access_list.mark_address_warm(callee);
        let account_is_dead = if self.env.rules.is_spurious_dragon {
            self.get_account(callee)?.is_empty()
        } else {
            !self.db.account_exists(callee)?
        };
        let new_memory_size =
            calculate_memory_size(args_offset, args_size)?.max(calculate_memory_size(
                ret_offset, ret_size,
            )?);
        Ok((new_memory_size, address_was_cold, account_is_dead))
    }

    /// Push-0-and-refund path for the non-fatal call failures (depth
    /// exceeded, insufficient balance): the forwarded gas goes back and
    /// the caller just observes a failed sub-call.
    fn early_revert_message_call(&mut self, reserved_gas: u64) -> Result<OpcodeResult, VMError> {
        self.current_call_frame.return_gas(reserved_gas);
        self.current_call_frame.stack.push(FAIL)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    /// Shared tail of the call family: depth and balance checks, the
    /// precompile shortcut, and the child frame push.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn generic_call(
        &mut self,
        forwarded_gas: u64,
        value: U256,
        msg_sender: Address,
        to: Address,
        code_address: Address,
        should_transfer_value: bool,
        is_static: bool,
        calldata: Bytes,
        ret_offset: usize,
        ret_size: usize,
    ) -> Result<OpcodeResult, VMError> {
        self.current_call_frame.sub_return_data = Bytes::new();

        let new_depth = self
            .current_call_frame
            .depth
            .checked_add(1)
            .ok_or(InternalError::Overflow)?;
        if new_depth > CALL_DEPTH_LIMIT {
            return self.early_revert_message_call(forwarded_gas);
        }

        if should_transfer_value
            && !value.is_zero()
            && self.get_account(msg_sender)?.balance < value
        {
            return self.early_revert_message_call(forwarded_gas);
        }

        if precompiles::is_precompile(code_address, &self.env.rules) {
            return self.call_precompile(
                forwarded_gas,
                value,
                msg_sender,
                to,
                code_address,
                should_transfer_value,
                &calldata,
                ret_offset,
                ret_size,
            );
        }

        let (bytecode, bytecode_hash) = self.code_of_account(code_address)?;
        let jump_targets = self.jump_targets_for(bytecode_hash, &bytecode);

        let snapshot = self.db.create_snapshot()?;
        let mut child = CallFrame::new(
            msg_sender,
            to,
            code_address,
            bytecode,
            bytecode_hash,
            value,
            calldata,
            is_static,
            forwarded_gas,
            new_depth,
            false,
            jump_targets,
        );
        child.snapshot = Some(snapshot);
        child.ret_offset = ret_offset;
        child.ret_len = ret_size;

        // the parent resumes past the call instruction once the child folds
        self.current_call_frame.pc = self.current_call_frame.pc.wrapping_add(1);
        let parent = mem::replace(&mut self.current_call_frame, child);
        self.call_frames.push(parent);
        self.substate_backups.push(self.substate.clone());

        if should_transfer_value {
            self.transfer(msg_sender, to, value)?;
        }

        Ok(OpcodeResult::Continue { pc_increment: 0 })
    }

    /// A sub-call that targets a precompile executes inline; no frame, no
    /// snapshot (the only state effect is the value transfer, which only
    /// happens on success).
    #[allow(clippy::too_many_arguments)]
    fn call_precompile(
        &mut self,
        forwarded_gas: u64,
        value: U256,
        msg_sender: Address,
        to: Address,
        code_address: Address,
        should_transfer_value: bool,
        calldata: &Bytes,
        ret_offset: usize,
        ret_size: usize,
    ) -> Result<OpcodeResult, VMError> {
        let mut gas_remaining = forwarded_gas;
        match precompiles::execute_precompile(
            code_address,
            calldata,
            &mut gas_remaining,
            &self.env.rules,
        ) {
            Ok(output) => {
                self.current_call_frame.return_gas(gas_remaining);

                let window = output.len().min(ret_size);
                self.current_call_frame
                    .memory
                    .store_data(ret_offset, &output[..window])?;
                self.current_call_frame.sub_return_data = output;
                self.current_call_frame.stack.push(SUCCESS)?;

                if should_transfer_value {
                    self.transfer(msg_sender, to, value)?;
                }
            }
            Err(error) if error.should_propagate() => return Err(error),
            Err(_) => {
                // the failed precompile consumed everything forwarded
                self.current_call_frame.stack.push(FAIL)?;
            }
        }
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    /// Shared tail of CREATE and CREATE2.
    pub(crate) fn generic_create(
        &mut self,
        value: U256,
        code_offset: usize,
        code_size: usize,
        salt: Option<U256>,
    ) -> Result<OpcodeResult, VMError> {
        // [EIP-3860]
        if self.env.rules.is_shanghai && code_size > INIT_CODE_MAX_SIZE {
            return Err(ExceptionalHalt::OutOfGas.into());
        }

        self.current_call_frame.sub_return_data = Bytes::new();

        // everything but one 64th is reserved for the child up front
        let reserved_gas = gas_cost::max_message_call_gas(
            self.current_call_frame.gas_remaining,
            self.schedule(),
        );
        self.current_call_frame.increase_consumed_gas(reserved_gas)?;

        let initcode = self
            .current_call_frame
            .memory
            .load_range(code_offset, code_size)?;

        let deployer = self.current_call_frame.to;
        let deployer_account = self.get_account(deployer)?;

        let new_address = match salt {
            Some(salt) => calculate_create2_address(deployer, &initcode, salt),
            None => calculate_create_address(deployer, deployer_account.nonce),
        };
        self.substate.access_list.mark_address_warm(new_address);

        let new_depth = self
            .current_call_frame
            .depth
            .checked_add(1)
            .ok_or(InternalError::Overflow)?;

        if deployer_account.balance < value
            || new_depth > CALL_DEPTH_LIMIT
            || deployer_account.nonce == u64::MAX
        {
            return self.early_revert_message_call(reserved_gas);
        }

        // the deployer's nonce bumps even when the deployment fails
        self.increment_account_nonce(deployer)?;

        if self.get_account(new_address)?.create_would_collide() {
            // a collision burns the reserved gas
            self.current_call_frame.stack.push(FAIL)?;
            return Ok(OpcodeResult::Continue { pc_increment: 1 });
        }

        let initcode_hash = code_hash(&initcode);
        let jump_targets = Arc::new(JumpTargets::analyze(&initcode));

        let snapshot = self.db.create_snapshot()?;
        let mut child = CallFrame::new(
            deployer,
            new_address,
            new_address,
            initcode,
            initcode_hash,
            value,
            Bytes::new(),
            false,
            reserved_gas,
            new_depth,
            true,
            jump_targets,
        );
        child.snapshot = Some(snapshot);

        self.current_call_frame.pc = self.current_call_frame.pc.wrapping_add(1);
        let parent = mem::replace(&mut self.current_call_frame, child);
        self.call_frames.push(parent);
        self.substate_backups.push(self.substate.clone());

        // changes that revert if the create fails
        self.substate.add_created_account(new_address);
        let mut created = self.get_account(new_address)?;
        if self.env.rules.is_spurious_dragon {
            created.nonce = 1;
        }
        self.db.set_account(new_address, created)?;
        self.transfer(deployer, new_address, value)?;

        Ok(OpcodeResult::Continue { pc_increment: 0 })
    }
}

/// CREATE address: `keccak256(rlp([sender, nonce]))[12..]`. The two-item
/// list is encoded inline; the full RLP codec is an external concern.
pub fn calculate_create_address(deployer: Address, nonce: u64) -> Address {
    let mut payload = Vec::with_capacity(30);
    payload.push(0x80 + 20);
    payload.extend_from_slice(deployer.as_bytes());
    if nonce == 0 {
        payload.push(0x80);
    } else if nonce < 0x80 {
        payload.push(nonce as u8);
    } else {
        let bytes = nonce.to_be_bytes();
        let skip = bytes.iter().take_while(|byte| **byte == 0).count();
        payload.push(0x80 + (8 - skip) as u8);
        payload.extend_from_slice(&bytes[skip..]);
    }
    let mut encoded = Vec::with_capacity(payload.len() + 1);
    encoded.push(0xc0 + payload.len() as u8);
    encoded.extend_from_slice(&payload);
    let hash = keccak(&encoded);
    Address::from_slice(&hash.as_bytes()[12..])
}

/// CREATE2 address ([EIP-1014]):
/// `keccak256(0xff ++ sender ++ salt ++ keccak256(initcode))[12..]`.
pub fn calculate_create2_address(deployer: Address, initcode: &Bytes, salt: U256) -> Address {
    let mut preimage = Vec::with_capacity(85);
    preimage.push(0xff);
    preimage.extend_from_slice(deployer.as_bytes());
    preimage.extend_from_slice(&salt.to_big_endian());
    preimage.extend_from_slice(keccak(initcode).as_bytes());
    let hash = keccak(&preimage);
    Address::from_slice(&hash.as_bytes()[12..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_address_known_vector() {
        // keccak(rlp([0x6ac7ea33f8831ea9dcc53393aaa88b25a785dbf0, 0]))[12..]
        // is the genesis deployment address of that well-known deployer
        let deployer = Address::from_slice(
            &hex_literal("6ac7ea33f8831ea9dcc53393aaa88b25a785dbf0"),
        );
        let created = calculate_create_address(deployer, 0);
        assert_eq!(
            created,
            Address::from_slice(&hex_literal("cd234a471b72ba2f1ccf0a70fcaba648a5eecd8d"))
        );
    }

    #[test]
    fn create2_address_eip_1014_vector() {
        // example 0 of EIP-1014: deployer 0x00..00, salt 0, initcode 0x00
        let created = calculate_create2_address(
            Address::zero(),
            &Bytes::from_static(&[0x00]),
            U256::zero(),
        );
        assert_eq!(
            created,
            Address::from_slice(&hex_literal("4d1a2e2bb4f88f0250f26ffff098b0b30b26bf38"))
        );
    }

    fn hex_literal(s: &str) -> Vec<u8> {
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect()
    }
}
