//! # corevm
//!
//! A deterministic, gas-metered implementation of the Ethereum Virtual
//! Machine: the 256-bit stack machine of the Yellow Paper plus the EIPs up
//! to Cancun.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                           VM                                │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐  │
//! │  │  CallFrame  │  │   Memory    │  │       Stack         │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────┘  │
//! │                                                             │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐  │
//! │  │  Substate   │  │ Precompiles │  │    Environment      │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     VmState (trait)                         │
//! │        accounts, storage, code, snapshots, batches          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key components
//!
//! - [`vm::VM`]: the interpreter and call/create orchestration
//! - [`vm::execute`]: the transaction-level entry point
//! - [`state::VmState`]: the world-state interface, with journaled
//!   snapshots and batch staging; [`state::InMemoryState`] is the
//!   reference implementation
//! - [`call_frame::CallFrame`]: per-call context
//! - [`fork::ForkRules`]: the hardfork flag set and the chain tag
//! - [`precompiles`]: native contracts at the reserved addresses
//!
//! ## Usage
//!
//! ```
//! use bytes::Bytes;
//! use corevm::{
//!     account::Account,
//!     environment::{BlockContext, TxCall, TxKind},
//!     fork::ForkRules,
//!     state::InMemoryState,
//!     vm::execute,
//!     Address, U256,
//! };
//!
//! let sender = Address::from_low_u64_be(1);
//! let mut state = InMemoryState::new();
//! state.seed_account(sender, Account::with_balance(U256::from(10u64).pow(U256::from(18))));
//!
//! let tx = TxCall {
//!     kind: TxKind::Call(Address::from_low_u64_be(2)),
//!     from: sender,
//!     value: U256::from(1000),
//!     input: Bytes::new(),
//!     gas_limit: 100_000,
//!     gas_price: U256::one(),
//!     access_list: Vec::new(),
//! };
//! let result = execute(&tx, BlockContext::default(), ForkRules::default(), &mut state).unwrap();
//! assert!(result.success);
//! assert_eq!(result.gas_used, 21_000);
//! ```

pub mod account;
pub mod call_frame;
pub mod constants;
pub mod environment;
pub mod errors;
pub mod fork;
pub mod gas_cost;
pub mod gas_schedule;
pub mod memory;
pub mod opcode_handlers;
pub mod opcodes;
pub mod precompiles;
pub mod stack;
pub mod state;
pub mod substate;
pub mod utils;
pub mod vm;

pub use ethereum_types::{Address, H256, U256, U512};

pub use crate::{
    errors::{ExecutionReport, VMError},
    vm::{execute, ExecutionResult, VM},
};
