//! Hardfork identifiers and the boolean rule set derived from them.
//!
//! Forks are totally ordered; a rule introduced at fork F stays active in
//! every later fork. The interpreter never matches on `Fork` directly in the
//! hot loop: availability is baked into the per-fork opcode table and costs
//! into the [`GasSchedule`](crate::gas_schedule::GasSchedule).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Fork {
    Frontier,
    Homestead,
    TangerineWhistle,
    SpuriousDragon,
    Byzantium,
    Constantinople,
    Petersburg,
    Istanbul,
    Berlin,
    London,
    Paris,
    Shanghai,
    Cancun,
}

impl Default for Fork {
    fn default() -> Self {
        Fork::Cancun
    }
}

/// Which chain flavour the VM runs as. The tag only selects the precompile
/// set; opcode semantics are identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChainKind {
    #[default]
    Mainnet,
    L2,
}

/// Monotone boolean view of a fork, plus the chain tag. This is the shape
/// consumed by handlers that need a single flag check instead of an
/// ordering comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForkRules {
    pub fork: Fork,
    pub chain: ChainKind,
    pub is_homestead: bool,
    pub is_tangerine_whistle: bool,
    pub is_spurious_dragon: bool,
    pub is_byzantium: bool,
    pub is_constantinople: bool,
    pub is_petersburg: bool,
    pub is_istanbul: bool,
    pub is_berlin: bool,
    pub is_london: bool,
    pub is_merge: bool,
    pub is_shanghai: bool,
    pub is_cancun: bool,
}

impl ForkRules {
    pub fn new(fork: Fork, chain: ChainKind) -> Self {
        Self {
            fork,
            chain,
            is_homestead: fork >= Fork::Homestead,
            is_tangerine_whistle: fork >= Fork::TangerineWhistle,
            is_spurious_dragon: fork >= Fork::SpuriousDragon,
            is_byzantium: fork >= Fork::Byzantium,
            is_constantinople: fork >= Fork::Constantinople,
            is_petersburg: fork >= Fork::Petersburg,
            is_istanbul: fork >= Fork::Istanbul,
            is_berlin: fork >= Fork::Berlin,
            is_london: fork >= Fork::London,
            is_merge: fork >= Fork::Paris,
            is_shanghai: fork >= Fork::Shanghai,
            is_cancun: fork >= Fork::Cancun,
        }
    }

    pub fn mainnet(fork: Fork) -> Self {
        Self::new(fork, ChainKind::Mainnet)
    }
}

impl Default for ForkRules {
    fn default() -> Self {
        Self::mainnet(Fork::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rules_are_monotone() {
        let berlin = ForkRules::mainnet(Fork::Berlin);
        assert!(berlin.is_istanbul);
        assert!(berlin.is_berlin);
        assert!(!berlin.is_london);
        assert!(!berlin.is_cancun);

        let cancun = ForkRules::mainnet(Fork::Cancun);
        assert!(cancun.is_homestead);
        assert!(cancun.is_shanghai);
        assert!(cancun.is_cancun);
    }

    #[test]
    fn fork_ordering() {
        assert!(Fork::Frontier < Fork::Homestead);
        assert!(Fork::Berlin < Fork::London);
        assert!(Fork::Shanghai < Fork::Cancun);
    }
}
