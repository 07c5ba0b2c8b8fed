//! Byte-addressable, word-granular call frame memory.
//!
//! The buffer grows lazily; [`expansion_cost`] charges the quadratic
//! schedule for the delta between the old and the new committed size. Every
//! access first resizes through [`calculate_memory_size`] so the committed
//! size is always a multiple of 32.

use crate::{
    constants::{MEMORY_EXPANSION_QUOTIENT, WORD_SIZE_IN_BYTES_USIZE},
    errors::{ExceptionalHalt, InternalError, VMError},
};
use bytes::Bytes;
use ethereum_types::U256;
use ExceptionalHalt::{OutOfBounds, OutOfGas};

#[derive(Debug, Clone, Default)]
pub struct Memory {
    buffer: Vec<u8>,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed size in bytes. Always a multiple of 32 once charged.
    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Grows the buffer to `new_size` bytes. `new_size` must already be
    /// word-aligned (callers go through [`calculate_memory_size`]); the
    /// corresponding expansion gas must have been charged beforehand.
    #[inline]
    pub fn resize(&mut self, new_size: usize) {
        if new_size > self.buffer.len() {
            self.buffer.resize(new_size, 0);
        }
    }

    pub fn load_word(&self, offset: usize) -> Result<U256, VMError> {
        let bytes: [u8; WORD_SIZE_IN_BYTES_USIZE] = self
            .buffer
            .get(offset..offset.checked_add(WORD_SIZE_IN_BYTES_USIZE).ok_or(OutOfBounds)?)
            .ok_or(OutOfBounds)?
            .try_into()
            .map_err(|_| InternalError::Slicing)?;
        Ok(U256::from_big_endian(&bytes))
    }

    pub fn load_range(&self, offset: usize, size: usize) -> Result<Bytes, VMError> {
        if size == 0 {
            return Ok(Bytes::new());
        }
        let end = offset.checked_add(size).ok_or(OutOfBounds)?;
        Ok(Bytes::copy_from_slice(
            self.buffer.get(offset..end).ok_or(OutOfBounds)?,
        ))
    }

    pub fn store_word(&mut self, offset: usize, word: U256) -> Result<(), VMError> {
        self.store_data(offset, &word.to_big_endian())
    }

    pub fn store_byte(&mut self, offset: usize, byte: u8) -> Result<(), VMError> {
        let slot = self.buffer.get_mut(offset).ok_or(OutOfBounds)?;
        *slot = byte;
        Ok(())
    }

    pub fn store_data(&mut self, offset: usize, data: &[u8]) -> Result<(), VMError> {
        if data.is_empty() {
            return Ok(());
        }
        let end = offset.checked_add(data.len()).ok_or(OutOfBounds)?;
        self.buffer
            .get_mut(offset..end)
            .ok_or(OutOfBounds)?
            .copy_from_slice(data);
        Ok(())
    }

    /// Writes `data` at `offset`, zero-filling up to `size` bytes when the
    /// source is shorter. This is the common shape of the `*COPY` opcodes.
    pub fn store_data_padded(
        &mut self,
        offset: usize,
        data: &[u8],
        size: usize,
    ) -> Result<(), VMError> {
        let data = data.get(..size).unwrap_or(data);
        self.store_data(offset, data)?;
        if data.len() < size {
            let start = offset.checked_add(data.len()).ok_or(OutOfBounds)?;
            let end = offset.checked_add(size).ok_or(OutOfBounds)?;
            self.buffer
                .get_mut(start..end)
                .ok_or(OutOfBounds)?
                .fill(0);
        }
        Ok(())
    }

    pub fn copy_within(&mut self, src: usize, dst: usize, size: usize) -> Result<(), VMError> {
        if size == 0 {
            return Ok(());
        }
        let src_end = src.checked_add(size).ok_or(OutOfBounds)?;
        let dst_end = dst.checked_add(size).ok_or(OutOfBounds)?;
        if src_end > self.buffer.len() || dst_end > self.buffer.len() {
            return Err(OutOfBounds.into());
        }
        self.buffer.copy_within(src..src_end, dst);
        Ok(())
    }
}

/// Word-aligned committed size required to touch `size` bytes at `offset`.
/// Zero-size accesses never expand memory regardless of the offset.
pub fn calculate_memory_size(offset: usize, size: usize) -> Result<usize, VMError> {
    if size == 0 {
        return Ok(0);
    }
    offset
        .checked_add(size)
        .and_then(|end| end.checked_next_multiple_of(WORD_SIZE_IN_BYTES_USIZE))
        .ok_or(OutOfBounds.into())
}

/// Gas for expanding the committed size; only the delta is paid for.
pub fn expansion_cost(new_memory_size: usize, current_memory_size: usize) -> Result<u64, VMError> {
    if new_memory_size <= current_memory_size {
        return Ok(0);
    }
    let cost = total_cost(new_memory_size)?
        .checked_sub(total_cost(current_memory_size)?)
        .ok_or(InternalError::Underflow)?;
    Ok(cost)
}

/// `3·w + w²/512` for a committed size of `w` words.
fn total_cost(memory_size: usize) -> Result<u64, VMError> {
    let words = memory_size
        .checked_add(WORD_SIZE_IN_BYTES_USIZE - 1)
        .ok_or(OutOfGas)?
        / WORD_SIZE_IN_BYTES_USIZE;

    let cost = words
        .checked_pow(2)
        .ok_or(OutOfGas)?
        .checked_div(MEMORY_EXPANSION_QUOTIENT)
        .ok_or(OutOfGas)?
        .checked_add(3usize.checked_mul(words).ok_or(OutOfGas)?)
        .ok_or(OutOfGas)?;

    cost.try_into()
        .map_err(|_| ExceptionalHalt::VeryLargeNumber.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expansion_cost_first_word() {
        // 1 word: 3*1 + 1/512 = 3
        assert_eq!(expansion_cost(32, 0).unwrap(), 3);
    }

    #[test]
    fn expansion_cost_is_delta_only() {
        let to_ten_words = expansion_cost(320, 0).unwrap();
        let first_five = expansion_cost(160, 0).unwrap();
        let next_five = expansion_cost(320, 160).unwrap();
        assert_eq!(first_five + next_five, to_ten_words);
        // shrinking or equal is free
        assert_eq!(expansion_cost(160, 320).unwrap(), 0);
    }

    #[test]
    fn quadratic_term_kicks_in() {
        // 1024 words = 32 KiB: 3*1024 + 1024^2/512 = 3072 + 2048
        assert_eq!(expansion_cost(32768, 0).unwrap(), 5120);
    }

    #[test]
    fn zero_size_never_expands() {
        assert_eq!(calculate_memory_size(usize::MAX, 0).unwrap(), 0);
    }

    #[test]
    fn size_is_word_aligned() {
        assert_eq!(calculate_memory_size(0, 1).unwrap(), 32);
        assert_eq!(calculate_memory_size(31, 2).unwrap(), 64);
        assert_eq!(calculate_memory_size(32, 32).unwrap(), 64);
    }

    #[test]
    fn store_load_round_trip() {
        let mut memory = Memory::new();
        memory.resize(64);
        memory.store_word(32, U256::from(0xdead)).unwrap();
        assert_eq!(memory.load_word(32).unwrap(), U256::from(0xdead));
        assert_eq!(memory.load_word(0).unwrap(), U256::zero());
    }

    #[test]
    fn padded_store_zero_fills() {
        let mut memory = Memory::new();
        memory.resize(32);
        memory.store_data(0, &[0xff; 32]).unwrap();
        memory.store_data_padded(0, &[1, 2], 8).unwrap();
        let out = memory.load_range(0, 8).unwrap();
        assert_eq!(&out[..], &[1, 2, 0, 0, 0, 0, 0, 0]);
    }
}
