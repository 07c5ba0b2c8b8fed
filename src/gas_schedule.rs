//! Fork-aware gas schedules.
//!
//! Only costs that changed across forks live here; everything constant
//! since Frontier stays in `gas_cost`. The dispatcher folds the schedule
//! into the per-fork opcode table at construction time, so the hot loop
//! never consults it directly.
//!
//! Fork history of the gas-relevant changes:
//! - **Tangerine Whistle (EIP-150)**: IO repricing, 63/64 forwarding rule
//! - **Spurious Dragon (EIP-160)**: EXP byte cost 10 -> 50
//! - **Istanbul (EIP-1884/2028)**: SLOAD/BALANCE increases, 16-gas calldata
//! - **Berlin (EIP-2929)**: cold/warm access lists
//! - **London (EIP-3529)**: refund reductions

use crate::fork::Fork;

#[derive(Debug, Clone, Copy)]
pub struct GasSchedule {
    // Storage
    pub sload: u64,
    pub sstore_set: u64,
    pub sstore_reset: u64,
    pub sstore_clears_refund: u64,

    // Account access
    pub balance: u64,
    pub extcodesize: u64,
    pub extcodecopy_base: u64,
    pub extcodehash: u64,

    // Call family base (not including memory/value/new-account extras)
    pub call_base: u64,

    pub selfdestruct: u64,
    pub selfdestruct_new_account: u64,
    /// Refund for SELFDESTRUCT, removed by London ([EIP-3529]).
    pub selfdestruct_refund: u64,

    /// Cost for CALLing a dead account with value (G_newaccount).
    pub call_new_account: u64,

    pub exp_byte: u64,

    pub calldata_zero: u64,
    pub calldata_nonzero: u64,

    /// Cold/warm tracking active ([EIP-2929]).
    pub has_access_lists: bool,
    pub cold_sload: u64,
    pub warm_sload: u64,
    pub cold_account_access: u64,
    pub warm_account_access: u64,

    /// 63/64 forwarding rule active ([EIP-150]).
    pub has_63_64_rule: bool,
}

impl GasSchedule {
    pub const fn for_fork(fork: Fork) -> &'static GasSchedule {
        match fork {
            Fork::Frontier | Fork::Homestead => &FRONTIER_SCHEDULE,
            Fork::TangerineWhistle => &TANGERINE_WHISTLE_SCHEDULE,
            Fork::SpuriousDragon | Fork::Byzantium | Fork::Constantinople | Fork::Petersburg => {
                &SPURIOUS_DRAGON_SCHEDULE
            }
            Fork::Istanbul => &ISTANBUL_SCHEDULE,
            Fork::Berlin => &BERLIN_SCHEDULE,
            // London reduced refunds; later forks kept the Berlin accounting
            _ => &LONDON_SCHEDULE,
        }
    }

    /// SLOAD cost, honouring cold/warm for Berlin and later.
    #[inline]
    pub const fn sload_cost(&self, was_cold: bool) -> u64 {
        if self.has_access_lists {
            if was_cold {
                self.cold_sload
            } else {
                self.warm_sload
            }
        } else {
            self.sload
        }
    }

    /// Extra cost of touching an external account on top of the opcode's
    /// table base (BALANCE, EXTCODE*, call family).
    #[inline]
    pub const fn account_access_cost(&self, was_cold: bool) -> u64 {
        if self.has_access_lists {
            if was_cold {
                self.cold_account_access
            } else {
                self.warm_account_access
            }
        } else {
            0
        }
    }
}

/// Frontier/Homestead: original Yellow Paper costs.
pub static FRONTIER_SCHEDULE: GasSchedule = GasSchedule {
    sload: 50,
    sstore_set: 20000,
    sstore_reset: 5000,
    sstore_clears_refund: 15000,

    balance: 20,
    extcodesize: 20,
    extcodecopy_base: 20,
    extcodehash: 20,

    call_base: 40,

    selfdestruct: 0,
    selfdestruct_new_account: 0,
    selfdestruct_refund: 24000,

    call_new_account: 25000,

    exp_byte: 10,

    calldata_zero: 4,
    calldata_nonzero: 68,

    has_access_lists: false,
    cold_sload: 0,
    warm_sload: 0,
    cold_account_access: 0,
    warm_account_access: 0,

    has_63_64_rule: false,
};

/// Tangerine Whistle (EIP-150): IO repricing against DoS.
pub static TANGERINE_WHISTLE_SCHEDULE: GasSchedule = GasSchedule {
    sload: 200,

    balance: 400,
    extcodesize: 700,
    extcodecopy_base: 700,
    extcodehash: 400,

    call_base: 700,

    selfdestruct: 5000,
    selfdestruct_new_account: 25000,

    has_63_64_rule: true,

    ..FRONTIER_SCHEDULE
};

/// Spurious Dragon (EIP-160): EXP byte repricing.
pub static SPURIOUS_DRAGON_SCHEDULE: GasSchedule = GasSchedule {
    exp_byte: 50,
    ..TANGERINE_WHISTLE_SCHEDULE
};

/// Istanbul (EIP-1884/2028).
pub static ISTANBUL_SCHEDULE: GasSchedule = GasSchedule {
    sload: 800,
    balance: 700,
    extcodehash: 700,
    calldata_nonzero: 16,
    ..SPURIOUS_DRAGON_SCHEDULE
};

/// Berlin (EIP-2929): the flat bases vanish into cold/warm accounting.
pub static BERLIN_SCHEDULE: GasSchedule = GasSchedule {
    sload: 0,
    balance: 0,
    extcodesize: 0,
    extcodecopy_base: 0,
    extcodehash: 0,
    call_base: 0,

    sstore_reset: 2900,

    has_access_lists: true,
    cold_sload: 2100,
    warm_sload: 100,
    cold_account_access: 2600,
    warm_account_access: 100,

    ..ISTANBUL_SCHEDULE
};

/// London (EIP-3529): refund reductions.
pub static LONDON_SCHEDULE: GasSchedule = GasSchedule {
    sstore_clears_refund: 4800,
    selfdestruct_refund: 0,
    ..BERLIN_SCHEDULE
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frontier_io_costs() {
        let schedule = GasSchedule::for_fork(Fork::Frontier);
        assert_eq!(schedule.sload, 50);
        assert_eq!(schedule.balance, 20);
        assert_eq!(schedule.call_base, 40);
        assert!(!schedule.has_63_64_rule);
        assert!(!schedule.has_access_lists);
    }

    #[test]
    fn tangerine_repricing() {
        let schedule = GasSchedule::for_fork(Fork::TangerineWhistle);
        assert_eq!(schedule.sload, 200);
        assert_eq!(schedule.call_base, 700);
        assert!(schedule.has_63_64_rule);
        // EXP repricing only lands in Spurious Dragon
        assert_eq!(schedule.exp_byte, 10);
        assert_eq!(GasSchedule::for_fork(Fork::SpuriousDragon).exp_byte, 50);
    }

    #[test]
    fn istanbul_calldata() {
        let schedule = GasSchedule::for_fork(Fork::Istanbul);
        assert_eq!(schedule.calldata_nonzero, 16);
        assert_eq!(GasSchedule::for_fork(Fork::Byzantium).calldata_nonzero, 68);
    }

    #[test]
    fn berlin_access_lists() {
        let schedule = GasSchedule::for_fork(Fork::Berlin);
        assert!(schedule.has_access_lists);
        assert_eq!(schedule.sload_cost(true), 2100);
        assert_eq!(schedule.sload_cost(false), 100);
        assert_eq!(schedule.account_access_cost(true), 2600);
        // pre-Berlin the access cost is part of the table base
        let istanbul = GasSchedule::for_fork(Fork::Istanbul);
        assert_eq!(istanbul.account_access_cost(true), 0);
        assert_eq!(istanbul.sload_cost(true), 800);
    }

    #[test]
    fn london_refund_cuts() {
        let schedule = GasSchedule::for_fork(Fork::London);
        assert_eq!(schedule.sstore_clears_refund, 4800);
        assert_eq!(schedule.selfdestruct_refund, 0);
        assert_eq!(GasSchedule::for_fork(Fork::Berlin).sstore_clears_refund, 15000);
    }
}
