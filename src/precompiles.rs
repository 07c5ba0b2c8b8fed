//! Precompiled contracts at the reserved addresses 0x01 through 0x0A,
//! plus the L2-only P-256 verifier at 0x100 ([RIP-7212]).
//!
//! Each precompile charges its gas from the forwarded budget first and only
//! then touches the input; a charge that does not fit fails the whole
//! sub-call with every forwarded unit consumed.

use crate::{
    errors::{InternalError, PrecompileError, VMError},
    fork::{ChainKind, Fork, ForkRules},
    gas_cost::{self, BLAKE2F_ROUND_COST, ECRECOVER_COST, POINT_EVALUATION_COST, P256_VERIFY_COST},
};
use bytes::{Buf, Bytes};
use ethereum_types::{Address, H160, U256};
use keccak_hash::keccak;
use malachite::base::num::arithmetic::traits::ModPow;
use malachite::base::num::basic::traits::Zero;
use malachite::base::num::conversion::traits::PowerOf2Digits;
use malachite::base::num::logic::traits::SignificantBits;
use malachite::Natural;
use sha2::Digest;
use std::borrow::Cow;

pub struct Precompile {
    pub address: H160,
    pub name: &'static str,
    pub active_since_fork: Fork,
}

const fn precompile_address(low: u16) -> H160 {
    let [hi, lo] = low.to_be_bytes();
    H160([0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, hi, lo])
}

pub const ECRECOVER: Precompile = Precompile {
    address: precompile_address(0x01),
    name: "ECREC",
    active_since_fork: Fork::Frontier,
};

pub const SHA2_256: Precompile = Precompile {
    address: precompile_address(0x02),
    name: "SHA256",
    active_since_fork: Fork::Frontier,
};

pub const RIPEMD_160: Precompile = Precompile {
    address: precompile_address(0x03),
    name: "RIPEMD160",
    active_since_fork: Fork::Frontier,
};

pub const IDENTITY: Precompile = Precompile {
    address: precompile_address(0x04),
    name: "ID",
    active_since_fork: Fork::Frontier,
};

pub const MODEXP: Precompile = Precompile {
    address: precompile_address(0x05),
    name: "MODEXP",
    active_since_fork: Fork::Byzantium,
};

pub const ECADD: Precompile = Precompile {
    address: precompile_address(0x06),
    name: "BN254_ADD",
    active_since_fork: Fork::Byzantium,
};

pub const ECMUL: Precompile = Precompile {
    address: precompile_address(0x07),
    name: "BN254_MUL",
    active_since_fork: Fork::Byzantium,
};

pub const ECPAIRING: Precompile = Precompile {
    address: precompile_address(0x08),
    name: "BN254_PAIRING",
    active_since_fork: Fork::Byzantium,
};

pub const BLAKE2F: Precompile = Precompile {
    address: precompile_address(0x09),
    name: "BLAKE2F",
    active_since_fork: Fork::Istanbul,
};

pub const POINT_EVALUATION: Precompile = Precompile {
    address: precompile_address(0x0a),
    name: "KZG_POINT_EVALUATION",
    active_since_fork: Fork::Cancun,
};

/// [RIP-7212]; only dispatched under the L2 chain tag.
pub const P256_VERIFY: Precompile = Precompile {
    address: precompile_address(0x100),
    name: "P256VERIFY",
    active_since_fork: Fork::Frontier,
};

pub const PRECOMPILES: [Precompile; 10] = [
    ECRECOVER,
    SHA2_256,
    RIPEMD_160,
    IDENTITY,
    MODEXP,
    ECADD,
    ECMUL,
    ECPAIRING,
    BLAKE2F,
    POINT_EVALUATION,
];

/// The precompiles active under the given rules, L2 extensions included.
pub fn precompiles_for_rules(rules: &ForkRules) -> impl Iterator<Item = Precompile> + '_ {
    let fork = rules.fork;
    let l2 = matches!(rules.chain, ChainKind::L2);
    PRECOMPILES
        .into_iter()
        .filter(move |precompile| precompile.active_since_fork <= fork)
        .chain(l2.then_some(P256_VERIFY))
}

pub fn is_precompile(address: Address, rules: &ForkRules) -> bool {
    if address.as_bytes()[..18] != [0u8; 18] {
        return false;
    }
    precompiles_for_rules(rules).any(|precompile| precompile.address == address)
}

/// Dispatches an already-validated precompile address. The remaining-gas
/// counter is decremented in place; on failure the caller burns whatever
/// is left of the forwarded budget.
pub fn execute_precompile(
    address: Address,
    calldata: &Bytes,
    gas_remaining: &mut u64,
    rules: &ForkRules,
) -> Result<Bytes, VMError> {
    let index = u16::from_be_bytes([address.as_bytes()[18], address.as_bytes()[19]]);
    match index {
        0x01 => ecrecover(calldata, gas_remaining),
        0x02 => sha2_256(calldata, gas_remaining),
        0x03 => ripemd_160(calldata, gas_remaining),
        0x04 => identity(calldata, gas_remaining),
        0x05 => modexp(calldata, gas_remaining, rules),
        0x06 => ecadd(calldata, gas_remaining, rules),
        0x07 => ecmul(calldata, gas_remaining, rules),
        0x08 => ecpairing(calldata, gas_remaining, rules),
        0x09 => blake2f(calldata, gas_remaining),
        0x0a => point_evaluation(calldata, gas_remaining),
        0x100 => p256_verify(calldata, gas_remaining),
        _ => Err(InternalError::TypeConversion.into()),
    }
}

fn charge(gas_cost: u64, gas_remaining: &mut u64) -> Result<(), VMError> {
    *gas_remaining = gas_remaining
        .checked_sub(gas_cost)
        .ok_or(PrecompileError::NotEnoughGas)?;
    Ok(())
}

/// Zero-extends the calldata to `target_len`; longer inputs pass through.
fn fill_with_zeros(calldata: &Bytes, target_len: usize) -> Bytes {
    if calldata.len() >= target_len {
        return calldata.clone();
    }
    let mut padded = calldata.to_vec();
    padded.resize(target_len, 0);
    padded.into()
}

/// ECDSA public key recovery over secp256k1.
///
/// Input (zero-padded to 128 bytes): hash ‖ v ‖ r ‖ s. Any malformed
/// component returns the empty output, not an error.
pub fn ecrecover(calldata: &Bytes, gas_remaining: &mut u64) -> Result<Bytes, VMError> {
    use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
    use k256::elliptic_curve::sec1::ToEncodedPoint;

    charge(ECRECOVER_COST, gas_remaining)?;

    let input = fill_with_zeros(calldata, 128);

    // v must be exactly 27 or 28 as a 32-byte big-endian integer
    if !(input[32..63].iter().all(|byte| *byte == 0) && matches!(input[63], 27 | 28)) {
        return Ok(Bytes::new());
    }
    let mut recovery_id = input[63] - 27;

    let mut signature = match Signature::from_slice(&input[64..128]) {
        Ok(signature) => signature,
        Err(_) => return Ok(Bytes::new()),
    };
    // the recovery routine wants low-s; flip the id to compensate
    if let Some(normalized) = signature.normalize_s() {
        signature = normalized;
        recovery_id ^= 1;
    }
    let recovery_id = match RecoveryId::from_byte(recovery_id) {
        Some(id) => id,
        None => return Ok(Bytes::new()),
    };

    let recovered = match VerifyingKey::recover_from_prehash(&input[0..32], &signature, recovery_id)
    {
        Ok(key) => key,
        Err(_) => return Ok(Bytes::new()),
    };

    let encoded = recovered.to_encoded_point(false);
    let hash = keccak(&encoded.as_bytes()[1..]);

    let mut output = [0u8; 32];
    output[12..].copy_from_slice(&hash.as_bytes()[12..]);
    Ok(Bytes::copy_from_slice(&output))
}

/// SHA-256 of the input.
pub fn sha2_256(calldata: &Bytes, gas_remaining: &mut u64) -> Result<Bytes, VMError> {
    charge(gas_cost::sha2_256(calldata.len())?, gas_remaining)?;
    let digest = sha2::Sha256::digest(calldata);
    Ok(Bytes::copy_from_slice(&digest))
}

/// RIPEMD-160 of the input, left-padded to a word.
pub fn ripemd_160(calldata: &Bytes, gas_remaining: &mut u64) -> Result<Bytes, VMError> {
    use ripemd::Ripemd160;

    charge(gas_cost::ripemd_160(calldata.len())?, gas_remaining)?;
    let mut hasher = Ripemd160::new();
    hasher.update(calldata);
    let mut output = [0u8; 32];
    output[12..].copy_from_slice(&hasher.finalize());
    Ok(Bytes::copy_from_slice(&output))
}

/// Returns the input unchanged.
pub fn identity(calldata: &Bytes, gas_remaining: &mut u64) -> Result<Bytes, VMError> {
    charge(gas_cost::identity(calldata.len())?, gas_remaining)?;
    Ok(calldata.clone())
}

/// Arbitrary-precision modular exponentiation ([EIP-198], repriced by
/// [EIP-2565] from Berlin).
pub fn modexp(calldata: &Bytes, gas_remaining: &mut u64, rules: &ForkRules) -> Result<Bytes, VMError> {
    let calldata = fill_with_zeros(calldata, 96);

    let base_size = U256::from_big_endian(&calldata[0..32]);
    let exponent_size = U256::from_big_endian(&calldata[32..64]);
    let modulus_size = U256::from_big_endian(&calldata[64..96]);

    if base_size.is_zero() && modulus_size.is_zero() {
        // [EIP-2565] floor still applies
        if rules.is_berlin {
            charge(gas_cost::MODEXP_STATIC_COST, gas_remaining)?;
        }
        return Ok(Bytes::new());
    }

    let base_size =
        usize::try_from(base_size).map_err(|_| PrecompileError::ParsingInputError)?;
    let exponent_size =
        usize::try_from(exponent_size).map_err(|_| PrecompileError::ParsingInputError)?;
    let modulus_size =
        usize::try_from(modulus_size).map_err(|_| PrecompileError::ParsingInputError)?;

    let base_limit = base_size.checked_add(96).ok_or(InternalError::Overflow)?;
    let exponent_limit = exponent_size
        .checked_add(base_limit)
        .ok_or(InternalError::Overflow)?;
    let modulus_limit = modulus_size
        .checked_add(exponent_limit)
        .ok_or(InternalError::Overflow)?;

    let base_bytes = get_slice_or_default(&calldata, 96, base_limit, base_size);
    let exponent_bytes = get_slice_or_default(&calldata, base_limit, exponent_limit, exponent_size);
    let modulus_bytes = get_slice_or_default(&calldata, exponent_limit, modulus_limit, modulus_size);

    // gas depends on the bit length of the first 32 exponent bytes
    let exponent_head = &exponent_bytes[..exponent_bytes.len().min(32)];
    let exponent_head = Natural::from_power_of_2_digits_desc(8, exponent_head.iter().cloned())
        .ok_or(InternalError::TypeConversion)?;
    let gas_cost = gas_cost::modexp(
        exponent_head.significant_bits(),
        base_size,
        exponent_size,
        modulus_size,
        rules,
    )?;
    charge(gas_cost, gas_remaining)?;

    if modulus_size == 0 {
        return Ok(Bytes::new());
    }

    let modulus = Natural::from_power_of_2_digits_desc(8, modulus_bytes.iter().cloned())
        .ok_or(InternalError::TypeConversion)?;
    if modulus == Natural::ZERO {
        return Ok(vec![0u8; modulus_size].into());
    }

    let base = Natural::from_power_of_2_digits_desc(8, base_bytes.iter().cloned())
        .ok_or(InternalError::TypeConversion)?;
    let exponent = Natural::from_power_of_2_digits_desc(8, exponent_bytes.iter().cloned())
        .ok_or(InternalError::TypeConversion)?;

    let result = base.mod_pow(exponent, modulus);
    let digits: Vec<u8> = result.to_power_of_2_digits_desc(8);

    // left-pad to the declared modulus size
    let mut output = vec![0u8; modulus_size];
    let offset = modulus_size.saturating_sub(digits.len());
    output[offset..].copy_from_slice(&digits[digits.len().saturating_sub(modulus_size)..]);
    Ok(output.into())
}

/// Slice of the calldata between the limits, zero-extended to
/// `size_to_expand` when the input runs short.
fn get_slice_or_default<'c>(
    calldata: &'c Bytes,
    lower_limit: usize,
    upper_limit: usize,
    size_to_expand: usize,
) -> Cow<'c, [u8]> {
    let upper_limit = calldata.len().min(upper_limit);
    if let Some(data) = calldata.get(lower_limit..upper_limit) {
        if !data.is_empty() {
            if data.len() == size_to_expand {
                return data.into();
            }
            let mut extended = vec![0u8; size_to_expand];
            let copy_size = size_to_expand.min(data.len());
            extended[..copy_size].copy_from_slice(&data[..copy_size]);
            return extended.into();
        }
    }
    vec![0u8; size_to_expand].into()
}

// ===================== BN254 ([EIP-196]/[EIP-197]) =====================

fn read_fq(input: &[u8]) -> Result<bn::Fq, VMError> {
    bn::Fq::from_slice(input).map_err(|_| PrecompileError::CoordinateExceedsFieldModulus.into())
}

fn read_g1_point(input: &[u8]) -> Result<bn::G1, VMError> {
    let x = read_fq(&input[0..32])?;
    let y = read_fq(&input[32..64])?;
    new_g1_point(x, y)
}

/// (0, 0) encodes the point at infinity.
fn new_g1_point(x: bn::Fq, y: bn::Fq) -> Result<bn::G1, VMError> {
    use bn::Group;
    if x == bn::Fq::zero() && y == bn::Fq::zero() {
        Ok(bn::G1::zero())
    } else {
        bn::AffineG1::new(x, y)
            .map(Into::into)
            .map_err(|_| PrecompileError::InvalidPoint.into())
    }
}

fn g1_to_bytes(point: bn::G1) -> Result<[u8; 64], VMError> {
    let mut output = [0u8; 64];
    if let Some(affine) = bn::AffineG1::from_jacobian(point) {
        affine
            .x()
            .to_big_endian(&mut output[..32])
            .map_err(|_| InternalError::Slicing)?;
        affine
            .y()
            .to_big_endian(&mut output[32..])
            .map_err(|_| InternalError::Slicing)?;
    }
    Ok(output)
}

/// Point addition on alt_bn128. Repriced by [EIP-1108] in Istanbul.
pub fn ecadd(calldata: &Bytes, gas_remaining: &mut u64, rules: &ForkRules) -> Result<Bytes, VMError> {
    let cost = if rules.is_istanbul {
        gas_cost::ECADD_COST
    } else {
        gas_cost::ECADD_COST_PRE_ISTANBUL
    };
    charge(cost, gas_remaining)?;
    let input = fill_with_zeros(calldata, 128);

    let first = read_g1_point(&input[..64])?;
    let second = read_g1_point(&input[64..128])?;
    let output = g1_to_bytes(first + second)?;
    Ok(Bytes::copy_from_slice(&output))
}

/// Scalar multiplication on alt_bn128. Repriced by [EIP-1108] in Istanbul.
pub fn ecmul(calldata: &Bytes, gas_remaining: &mut u64, rules: &ForkRules) -> Result<Bytes, VMError> {
    let cost = if rules.is_istanbul {
        gas_cost::ECMUL_COST
    } else {
        gas_cost::ECMUL_COST_PRE_ISTANBUL
    };
    charge(cost, gas_remaining)?;
    let input = fill_with_zeros(calldata, 96);

    let point = read_g1_point(&input[..64])?;
    let scalar =
        bn::Fr::from_slice(&input[64..96]).map_err(|_| PrecompileError::ParsingInputError)?;
    let output = g1_to_bytes(point * scalar)?;
    Ok(Bytes::copy_from_slice(&output))
}

/// Pairing check on alt_bn128; pushes 1 for success, 0 otherwise.
///
/// The input is a sequence of (G1, G2) pairs, 192 bytes each; G2
/// coordinates are encoded imaginary-part first.
pub fn ecpairing(
    calldata: &Bytes,
    gas_remaining: &mut u64,
    rules: &ForkRules,
) -> Result<Bytes, VMError> {
    use bn::Group;

    if calldata.len() % 192 != 0 {
        return Err(PrecompileError::ParsingInputError.into());
    }
    let group_count = calldata.len() / 192;
    charge(gas_cost::ecpairing(group_count, rules)?, gas_remaining)?;

    let mut pairs = Vec::with_capacity(group_count);
    for chunk in calldata.chunks_exact(192) {
        let g1 = read_g1_point(&chunk[..64])?;

        let x_imaginary = read_fq(&chunk[64..96])?;
        let x_real = read_fq(&chunk[96..128])?;
        let y_imaginary = read_fq(&chunk[128..160])?;
        let y_real = read_fq(&chunk[160..192])?;
        let x = bn::Fq2::new(x_real, x_imaginary);
        let y = bn::Fq2::new(y_real, y_imaginary);
        let g2 = if x.is_zero() && y.is_zero() {
            bn::G2::zero()
        } else {
            bn::AffineG2::new(x, y)
                .map(Into::into)
                .map_err(|_| VMError::from(PrecompileError::InvalidPoint))?
        };
        pairs.push((g1, g2));
    }

    let success = pairs.is_empty() || bn::pairing_batch(&pairs) == bn::Gt::one();
    let mut output = [0u8; 32];
    output[31] = u8::from(success);
    Ok(Bytes::copy_from_slice(&output))
}

// ===================== BLAKE2 F ([EIP-152]) =====================

const BLAKE2B_IV: [u64; 8] = [
    0x6a09e667f3bcc908,
    0xbb67ae8584caa73b,
    0x3c6ef372fe94f82b,
    0xa54ff53a5f1d36f1,
    0x510e527fade682d1,
    0x9b05688c2b3e6c1f,
    0x1f83d9abfb41bd6b,
    0x5be0cd19137e2179,
];

const SIGMA: [[usize; 16]; 10] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15],
    [14, 10, 4, 8, 9, 15, 13, 6, 1, 12, 0, 2, 11, 7, 5, 3],
    [11, 8, 12, 0, 5, 2, 15, 13, 10, 14, 3, 6, 7, 1, 9, 4],
    [7, 9, 3, 1, 13, 12, 11, 14, 2, 6, 5, 10, 4, 0, 15, 8],
    [9, 0, 5, 7, 2, 4, 10, 15, 14, 1, 11, 12, 6, 8, 3, 13],
    [2, 12, 6, 10, 0, 11, 8, 3, 4, 13, 7, 5, 15, 14, 1, 9],
    [12, 5, 1, 15, 14, 13, 4, 10, 0, 7, 6, 3, 9, 2, 8, 11],
    [13, 11, 7, 14, 12, 1, 3, 9, 5, 0, 15, 4, 8, 6, 2, 10],
    [6, 15, 14, 9, 11, 3, 0, 8, 12, 2, 13, 7, 1, 4, 10, 5],
    [10, 2, 8, 4, 7, 6, 1, 5, 15, 11, 9, 14, 3, 12, 13, 0],
];

#[allow(clippy::many_single_char_names)]
#[inline(always)]
fn blake2_g(v: &mut [u64; 16], a: usize, b: usize, c: usize, d: usize, x: u64, y: u64) {
    v[a] = v[a].wrapping_add(v[b]).wrapping_add(x);
    v[d] = (v[d] ^ v[a]).rotate_right(32);
    v[c] = v[c].wrapping_add(v[d]);
    v[b] = (v[b] ^ v[c]).rotate_right(24);
    v[a] = v[a].wrapping_add(v[b]).wrapping_add(y);
    v[d] = (v[d] ^ v[a]).rotate_right(16);
    v[c] = v[c].wrapping_add(v[d]);
    v[b] = (v[b] ^ v[c]).rotate_right(63);
}

/// The BLAKE2b compression function F.
fn blake2_compress(rounds: usize, h: &mut [u64; 8], m: [u64; 16], t: [u64; 2], f: bool) {
    let mut v = [0u64; 16];
    v[..8].copy_from_slice(h);
    v[8..].copy_from_slice(&BLAKE2B_IV);
    v[12] ^= t[0];
    v[13] ^= t[1];
    if f {
        v[14] = !v[14];
    }

    for i in 0..rounds {
        let s = &SIGMA[i % 10];
        blake2_g(&mut v, 0, 4, 8, 12, m[s[0]], m[s[1]]);
        blake2_g(&mut v, 1, 5, 9, 13, m[s[2]], m[s[3]]);
        blake2_g(&mut v, 2, 6, 10, 14, m[s[4]], m[s[5]]);
        blake2_g(&mut v, 3, 7, 11, 15, m[s[6]], m[s[7]]);
        blake2_g(&mut v, 0, 5, 10, 15, m[s[8]], m[s[9]]);
        blake2_g(&mut v, 1, 6, 11, 12, m[s[10]], m[s[11]]);
        blake2_g(&mut v, 2, 7, 8, 13, m[s[12]], m[s[13]]);
        blake2_g(&mut v, 3, 4, 9, 14, m[s[14]], m[s[15]]);
    }

    for i in 0..8 {
        h[i] ^= v[i] ^ v[i + 8];
    }
}

/// BLAKE2 compression precompile.
///
/// Input is exactly 213 bytes:
/// rounds(4, BE) ‖ h(64, LE words) ‖ m(128, LE words) ‖ t(16, LE) ‖ f(1).
pub fn blake2f(calldata: &Bytes, gas_remaining: &mut u64) -> Result<Bytes, VMError> {
    if calldata.len() != 213 {
        return Err(PrecompileError::ParsingInputError.into());
    }
    let mut input = calldata.slice(0..213);

    let rounds = input.get_u32();
    charge(u64::from(rounds) * BLAKE2F_ROUND_COST, gas_remaining)?;

    let mut h = [0u64; 8];
    for word in h.iter_mut() {
        *word = input.get_u64_le();
    }
    let mut m = [0u64; 16];
    for word in m.iter_mut() {
        *word = input.get_u64_le();
    }
    let t = [input.get_u64_le(), input.get_u64_le()];
    let f = match input.get_u8() {
        0 => false,
        1 => true,
        _ => return Err(PrecompileError::ParsingInputError.into()),
    };

    blake2_compress(rounds as usize, &mut h, m, t, f);

    let mut output = [0u8; 64];
    for (chunk, word) in output.chunks_exact_mut(8).zip(h.iter()) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
    Ok(Bytes::copy_from_slice(&output))
}

// ===================== KZG point evaluation ([EIP-4844]) =====================

/// Fixed success output: FIELD_ELEMENTS_PER_BLOB ‖ BLS_MODULUS.
const POINT_EVALUATION_RETURN: [u8; 64] = [
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x10, 0x00,
    0x73, 0xed, 0xa7, 0x53, 0x29, 0x9d, 0x7d, 0x48, 0x33, 0x39, 0xd8, 0x08, 0x09, 0xa1, 0xd8, 0x05,
    0x53, 0xbd, 0xa4, 0x02, 0xff, 0xfe, 0x5b, 0xfe, 0xff, 0xff, 0xff, 0xff, 0x00, 0x00, 0x00, 0x01,
];

const VERSIONED_HASH_VERSION_KZG: u8 = 0x01;

/// Verifies a KZG opening proof against a blob commitment.
///
/// Input is exactly 192 bytes:
/// versioned_hash(32) ‖ z(32) ‖ y(32) ‖ commitment(48) ‖ proof(48).
pub fn point_evaluation(calldata: &Bytes, gas_remaining: &mut u64) -> Result<Bytes, VMError> {
    charge(POINT_EVALUATION_COST, gas_remaining)?;

    if calldata.len() != 192 {
        return Err(PrecompileError::ParsingInputError.into());
    }

    // the commitment must hash to the claimed versioned hash
    let commitment = &calldata[96..144];
    let mut versioned_hash: [u8; 32] = sha2::Sha256::digest(commitment).into();
    versioned_hash[0] = VERSIONED_HASH_VERSION_KZG;
    if versioned_hash != calldata[0..32] {
        return Err(PrecompileError::VerificationFailed.into());
    }

    let commitment = c_kzg::Bytes48::from_bytes(commitment)
        .map_err(|_| PrecompileError::ParsingInputError)?;
    let z = c_kzg::Bytes32::from_bytes(&calldata[32..64])
        .map_err(|_| PrecompileError::ParsingInputError)?;
    let y = c_kzg::Bytes32::from_bytes(&calldata[64..96])
        .map_err(|_| PrecompileError::ParsingInputError)?;
    let proof = c_kzg::Bytes48::from_bytes(&calldata[144..192])
        .map_err(|_| PrecompileError::ParsingInputError)?;

    let settings = c_kzg::ethereum_kzg_settings(0);
    let valid = settings
        .verify_kzg_proof(&commitment, &z, &y, &proof)
        .map_err(|_| PrecompileError::VerificationFailed)?;
    if !valid {
        return Err(PrecompileError::VerificationFailed.into());
    }

    Ok(Bytes::copy_from_slice(&POINT_EVALUATION_RETURN))
}

// ===================== P-256 verify ([RIP-7212], L2 only) =====================

/// ECDSA verification over secp256r1. Returns a 32-byte 1 on success and
/// the empty output on any failure; the gas is charged either way.
pub fn p256_verify(calldata: &Bytes, gas_remaining: &mut u64) -> Result<Bytes, VMError> {
    use p256::ecdsa::signature::hazmat::PrehashVerifier;
    use p256::ecdsa::{Signature, VerifyingKey};

    charge(P256_VERIFY_COST, gas_remaining)?;

    if calldata.len() != 160 {
        return Ok(Bytes::new());
    }

    let message_hash = &calldata[0..32];
    let signature = match Signature::from_slice(&calldata[32..96]) {
        Ok(signature) => signature,
        Err(_) => return Ok(Bytes::new()),
    };

    let mut sec1_encoded = [0u8; 65];
    sec1_encoded[0] = 0x04;
    sec1_encoded[1..].copy_from_slice(&calldata[96..160]);
    let key = match VerifyingKey::from_sec1_bytes(&sec1_encoded) {
        Ok(key) => key,
        Err(_) => return Ok(Bytes::new()),
    };

    if key.verify_prehash(message_hash, &signature).is_ok() {
        let mut output = [0u8; 32];
        output[31] = 1;
        Ok(Bytes::copy_from_slice(&output))
    } else {
        Ok(Bytes::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fork::ForkRules;

    fn cancun() -> ForkRules {
        ForkRules::default()
    }

    #[test]
    fn availability_by_fork() {
        let frontier = ForkRules::mainnet(Fork::Frontier);
        let istanbul = ForkRules::mainnet(Fork::Istanbul);
        assert!(is_precompile(ECRECOVER.address, &frontier));
        assert!(!is_precompile(MODEXP.address, &frontier));
        assert!(is_precompile(BLAKE2F.address, &istanbul));
        assert!(!is_precompile(POINT_EVALUATION.address, &istanbul));
        assert!(is_precompile(POINT_EVALUATION.address, &cancun()));
    }

    #[test]
    fn l2_chain_gates_p256() {
        let mainnet = cancun();
        let l2 = ForkRules::new(Fork::Cancun, ChainKind::L2);
        assert!(!is_precompile(P256_VERIFY.address, &mainnet));
        assert!(is_precompile(P256_VERIFY.address, &l2));
    }

    #[test]
    fn identity_echoes_input() {
        let input = Bytes::from_static(b"hello world");
        let mut gas = 100;
        let output = identity(&input, &mut gas).unwrap();
        assert_eq!(output, input);
        // 15 static + 3 per word
        assert_eq!(gas, 100 - 18);
    }

    #[test]
    fn sha256_of_empty_input() {
        let mut gas = 100;
        let output = sha2_256(&Bytes::new(), &mut gas).unwrap();
        assert_eq!(
            hex::encode(&output),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(gas, 40);
    }

    #[test]
    fn ripemd_is_left_padded() {
        let mut gas = 1000;
        let output = ripemd_160(&Bytes::new(), &mut gas).unwrap();
        assert_eq!(
            hex::encode(&output),
            "0000000000000000000000009c1185a5c5e9fc54612808977ee8f548b2258d31"
        );
    }

    #[test]
    fn ecrecover_rejects_bad_v() {
        let mut input = vec![0u8; 128];
        input[63] = 29;
        let mut gas = 5000;
        let output = ecrecover(&Bytes::from(input), &mut gas).unwrap();
        assert!(output.is_empty());
        assert_eq!(gas, 2000);
    }

    #[test]
    fn ecrecover_charges_before_failing() {
        let mut gas = 2999;
        assert!(ecrecover(&Bytes::new(), &mut gas).is_err());
    }

    #[test]
    fn modexp_small_values() {
        // 3^2 mod 5 = 4, one-byte operands
        let mut input = vec![0u8; 96];
        input[31] = 1;
        input[63] = 1;
        input[95] = 1;
        input.extend_from_slice(&[3, 2, 5]);
        let mut gas = 100000;
        let output = modexp(&Bytes::from(input), &mut gas, &cancun()).unwrap();
        assert_eq!(&output[..], &[4]);
        // EIP-2565 floor
        assert_eq!(gas, 100000 - 200);
    }

    #[test]
    fn modexp_zero_modulus_yields_zeros() {
        let mut input = vec![0u8; 96];
        input[31] = 1;
        input[63] = 1;
        input[95] = 2; // modulus_size 2, value zero
        input.extend_from_slice(&[3, 2, 0, 0]);
        let mut gas = 100000;
        let output = modexp(&Bytes::from(input), &mut gas, &cancun()).unwrap();
        assert_eq!(&output[..], &[0, 0]);
    }

    #[test]
    fn modexp_output_is_modulus_sized() {
        // 2^10 mod 0xffff = 1024, declared modulus size 2
        let mut input = vec![0u8; 96];
        input[31] = 1;
        input[63] = 1;
        input[95] = 2;
        input.extend_from_slice(&[2, 10, 0xff, 0xff]);
        let mut gas = 100000;
        let output = modexp(&Bytes::from(input), &mut gas, &cancun()).unwrap();
        assert_eq!(&output[..], &[4, 0]);
    }

    #[test]
    fn ecadd_identity_plus_identity() {
        let mut gas = 1000;
        let output = ecadd(&Bytes::new(), &mut gas, &cancun()).unwrap();
        assert_eq!(&output[..], &[0u8; 64]);
        assert_eq!(gas, 1000 - 150);
    }

    #[test]
    fn ecadd_pre_istanbul_price() {
        let byzantium = ForkRules::mainnet(Fork::Byzantium);
        let mut gas = 1000;
        ecadd(&Bytes::new(), &mut gas, &byzantium).unwrap();
        assert_eq!(gas, 1000 - 500);
    }

    #[test]
    fn ecadd_point_plus_identity() {
        // generator (1, 2) plus infinity is the generator
        let mut input = vec![0u8; 128];
        input[31] = 1;
        input[63] = 2;
        let mut gas = 1000;
        let output = ecadd(&Bytes::from(input), &mut gas, &cancun()).unwrap();
        assert_eq!(output[31], 1);
        assert_eq!(output[63], 2);
    }

    #[test]
    fn ecmul_by_zero_scalar() {
        let mut input = vec![0u8; 96];
        input[31] = 1;
        input[63] = 2;
        let mut gas = 10000;
        let output = ecmul(&Bytes::from(input), &mut gas, &cancun()).unwrap();
        assert_eq!(&output[..], &[0u8; 64]);
        assert_eq!(gas, 10000 - 6000);
    }

    #[test]
    fn ecpairing_empty_input_is_success() {
        let mut gas = 50000;
        let output = ecpairing(&Bytes::new(), &mut gas, &cancun()).unwrap();
        assert_eq!(output[31], 1);
        assert_eq!(gas, 50000 - 45000);
    }

    #[test]
    fn ecpairing_rejects_ragged_input() {
        let mut gas = 500000;
        assert!(ecpairing(&Bytes::from(vec![0u8; 191]), &mut gas, &cancun()).is_err());
    }

    #[test]
    fn blake2f_rejects_wrong_length() {
        let mut gas = 100;
        assert!(blake2f(&Bytes::from(vec![0u8; 212]), &mut gas).is_err());
        assert!(blake2f(&Bytes::from(vec![0u8; 214]), &mut gas).is_err());
    }

    #[test]
    fn blake2f_rejects_bad_final_flag() {
        let mut input = vec![0u8; 213];
        input[212] = 2;
        let mut gas = 100;
        assert!(blake2f(&Bytes::from(input), &mut gas).is_err());
    }

    #[test]
    fn blake2f_charges_per_round() {
        let mut input = vec![0u8; 213];
        input[3] = 12; // 12 rounds
        let mut gas = 100;
        blake2f(&Bytes::from(input), &mut gas).unwrap();
        assert_eq!(gas, 88);
    }

    #[test]
    fn point_evaluation_rejects_wrong_length() {
        let mut gas = 60000;
        assert!(point_evaluation(&Bytes::from(vec![0u8; 191]), &mut gas).is_err());
        // the 50000 charge lands regardless
        assert_eq!(gas, 10000);
    }

    #[test]
    fn p256_verify_rejects_short_input() {
        let mut gas = 10000;
        let output = p256_verify(&Bytes::from(vec![0u8; 100]), &mut gas).unwrap();
        assert!(output.is_empty());
        assert_eq!(gas, 10000 - P256_VERIFY_COST);
    }
}
