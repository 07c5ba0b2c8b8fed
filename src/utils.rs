use crate::errors::{ExceptionalHalt, VMError};
use ethereum_types::{Address, H256, U256};

/// Interprets the low 20 bytes of a word as an address, as the call family
/// and `EXTCODE*` opcodes do.
pub fn word_to_address(word: U256) -> Address {
    let bytes = word.to_big_endian();
    Address::from_slice(&bytes[12..])
}

pub fn address_to_word(address: Address) -> U256 {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_bytes());
    U256::from_big_endian(&word)
}

pub fn u256_to_h256(value: U256) -> H256 {
    H256(value.to_big_endian())
}

pub fn h256_to_u256(value: H256) -> U256 {
    U256::from_big_endian(value.as_bytes())
}

pub fn u256_to_usize(value: U256) -> Result<usize, VMError> {
    value
        .try_into()
        .map_err(|_| ExceptionalHalt::VeryLargeNumber.into())
}

/// Converts a (size, offset) pair popped off the stack. A zero size makes
/// the offset irrelevant, so it is clamped instead of rejected; otherwise
/// an oversized operand cannot be paid for and halts the frame.
pub fn size_offset_to_usize(size: U256, offset: U256) -> Result<(usize, usize), VMError> {
    let size = u256_to_usize(size)?;
    let offset = if size == 0 {
        0
    } else {
        u256_to_usize(offset)?
    };
    Ok((size, offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_address_round_trip() {
        let address = Address::from_low_u64_be(0xdeadbeef);
        assert_eq!(word_to_address(address_to_word(address)), address);
    }

    #[test]
    fn word_to_address_truncates_high_bytes() {
        let word = U256::MAX;
        assert_eq!(
            word_to_address(word),
            Address::from_slice(&[0xff; 20]),
        );
    }

    #[test]
    fn zero_size_ignores_huge_offset() {
        let (size, offset) = size_offset_to_usize(U256::zero(), U256::MAX).unwrap();
        assert_eq!((size, offset), (0, 0));
    }
}
