//! Per-call execution context.
//!
//! A frame owns its stack, memory and return buffers; the VM owns the
//! ordered sequence of frames as an explicit call stack so EVM depth 1024
//! can never overflow the host stack.

use crate::{
    errors::ExceptionalHalt,
    memory::Memory,
    stack::Stack,
    state::SnapshotId,
};
use bytes::Bytes;
use ethereum_types::{Address, H256, U256};
use std::sync::Arc;

/// One bit per code byte; set for JUMPDEST bytes that are real
/// instructions, clear for JUMPDEST bytes buried in PUSH data. Built once
/// per code blob and cached by code hash.
#[derive(Debug, Clone, Default)]
pub struct JumpTargets {
    bits: Box<[u64]>,
    code_len: usize,
}

impl JumpTargets {
    pub fn analyze(code: &[u8]) -> Self {
        let mut bits = vec![0u64; code.len().div_ceil(64)].into_boxed_slice();
        let mut i = 0;
        while i < code.len() {
            let op = code[i];
            if op == 0x5b {
                bits[i / 64] |= 1 << (i % 64);
            } else if (0x60..=0x7f).contains(&op) {
                // skip the PUSH immediate
                i += usize::from(op - 0x5f);
            }
            i += 1;
        }
        Self {
            bits,
            code_len: code.len(),
        }
    }

    #[inline]
    pub fn is_valid(&self, target: usize) -> bool {
        target < self.code_len
            && self
                .bits
                .get(target / 64)
                .is_some_and(|word| word & (1 << (target % 64)) != 0)
    }
}

#[derive(Debug, Clone)]
pub struct CallFrame {
    /// Immediate caller of this frame (not the transaction origin).
    pub msg_sender: Address,
    /// Account whose storage and balance this frame acts on.
    pub to: Address,
    /// Account whose code runs; differs from `to` under DELEGATECALL and
    /// CALLCODE.
    pub code_address: Address,
    pub bytecode: Bytes,
    pub code_hash: H256,
    pub msg_value: U256,
    pub calldata: Bytes,
    pub is_static: bool,
    pub depth: u16,
    pub is_create: bool,

    pub gas_limit: u64,
    pub gas_remaining: u64,

    pub pc: usize,
    pub stack: Stack,
    pub memory: Memory,

    /// RETURN/REVERT payload of this frame.
    pub output: Bytes,
    /// Return data of the most recent completed sub-call, exposed through
    /// RETURNDATASIZE/RETURNDATACOPY.
    pub sub_return_data: Bytes,

    /// Window in the parent's memory where this frame's output lands.
    pub ret_offset: usize,
    pub ret_len: usize,

    pub jump_targets: Arc<JumpTargets>,
    /// State snapshot opened when this frame was entered.
    pub snapshot: Option<SnapshotId>,
}

impl CallFrame {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        msg_sender: Address,
        to: Address,
        code_address: Address,
        bytecode: Bytes,
        code_hash: H256,
        msg_value: U256,
        calldata: Bytes,
        is_static: bool,
        gas_limit: u64,
        depth: u16,
        is_create: bool,
        jump_targets: Arc<JumpTargets>,
    ) -> Self {
        Self {
            msg_sender,
            to,
            code_address,
            bytecode,
            code_hash,
            msg_value,
            calldata,
            is_static,
            depth,
            is_create,
            gas_limit,
            gas_remaining: gas_limit,
            pc: 0,
            stack: Stack::new(),
            memory: Memory::new(),
            output: Bytes::new(),
            sub_return_data: Bytes::new(),
            ret_offset: 0,
            ret_len: 0,
            jump_targets,
            snapshot: None,
        }
    }

    /// Byte at the program counter; running off the end reads as STOP.
    #[inline]
    pub fn next_opcode(&self) -> u8 {
        self.bytecode.get(self.pc).copied().unwrap_or(0x00)
    }

    #[inline]
    pub fn increase_consumed_gas(&mut self, cost: u64) -> Result<(), ExceptionalHalt> {
        self.gas_remaining = self
            .gas_remaining
            .checked_sub(cost)
            .ok_or(ExceptionalHalt::OutOfGas)?;
        Ok(())
    }

    /// Refunds gas to this frame (a child returned with some left over).
    #[inline]
    pub fn return_gas(&mut self, amount: u64) {
        self.gas_remaining = self.gas_remaining.saturating_add(amount);
    }

    pub fn gas_used(&self) -> u64 {
        self.gas_limit.saturating_sub(self.gas_remaining)
    }

    /// Consumes everything left, as exceptional halts do.
    pub fn burn_all_gas(&mut self) {
        self.gas_remaining = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jumpdest_found() {
        // PUSH1 0x04, JUMP, STOP, JUMPDEST, STOP
        let code = [0x60, 0x04, 0x56, 0x00, 0x5b, 0x00];
        let targets = JumpTargets::analyze(&code);
        assert!(targets.is_valid(4));
        assert!(!targets.is_valid(0));
        assert!(!targets.is_valid(3));
        assert!(!targets.is_valid(6));
    }

    #[test]
    fn jumpdest_inside_push_data_is_invalid() {
        // PUSH1 0x5B, JUMP: the 0x5B at offset 1 is data
        let code = [0x60, 0x5b, 0x56];
        let targets = JumpTargets::analyze(&code);
        assert!(!targets.is_valid(1));
    }

    #[test]
    fn push32_swallows_a_full_word_of_data() {
        let mut code = vec![0x7f]; // PUSH32
        code.extend_from_slice(&[0x5b; 32]);
        code.push(0x5b); // a real JUMPDEST after the immediate
        let targets = JumpTargets::analyze(&code);
        for i in 1..=32 {
            assert!(!targets.is_valid(i));
        }
        assert!(targets.is_valid(33));
    }

    #[test]
    fn truncated_push_at_code_end() {
        // PUSH2 with a single data byte; analysis must not overrun
        let code = [0x61, 0x5b];
        let targets = JumpTargets::analyze(&code);
        assert!(!targets.is_valid(1));
    }

    #[test]
    fn gas_accounting() {
        let mut frame = CallFrame::new(
            Address::zero(),
            Address::zero(),
            Address::zero(),
            Bytes::new(),
            H256::zero(),
            U256::zero(),
            Bytes::new(),
            false,
            100,
            0,
            false,
            Arc::new(JumpTargets::default()),
        );
        frame.increase_consumed_gas(30).unwrap();
        assert_eq!(frame.gas_used(), 30);
        assert_eq!(
            frame.increase_consumed_gas(71),
            Err(ExceptionalHalt::OutOfGas)
        );
        frame.burn_all_gas();
        assert_eq!(frame.gas_used(), 100);
    }
}
