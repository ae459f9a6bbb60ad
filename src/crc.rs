//! Cyclic redundancy checks of the FIC and of DAB+ superframes
//!
//! Every fast information block (FIB) carries a CRC-16 (generator `x^16 + x^12 + x^5 + 1`,
//! register preset to all ones, result inverted) over its first 30 bytes in its last 2 bytes. The
//! byte-oriented and the bit-serial checks below are two implementations of the same test.
//!
//! # Examples
//!
//! ```
//! use dabcore::crc;
//!
//! let mut fib = [0xFFu8; 32];
//! fib[0] = 0x05;
//! let crc = crc::fib_crc(&fib[.. 30]);
//! fib[30 ..].copy_from_slice(&crc.to_be_bytes());
//! assert!(crc::check_crc_bytes(&fib));
//! fib[7] ^= 0x10;
//! assert!(!crc::check_crc_bytes(&fib));
//! ```

/// Generator polynomial of the FIB CRC (`x^16` term implied)
pub const FIB_CRC_POLY: u16 = 0x1021;

/// Generator polynomial of the DAB+ superframe Fire code (`x^16` term implied)
pub const FIRE_CODE_POLY: u16 = 0x782F;

/// Number of bytes in a FIB, CRC included
pub const FIB_BYTES: usize = 32;

/// Returns the MSB-first CRC-16 of given bytes.
///
/// # Parameters
///
/// - `data`: Bytes to be checked.
///
/// - `poly`: Generator polynomial without its `x^16` term.
///
/// - `init`: Initial register contents.
#[must_use]
pub fn crc16(data: &[u8], poly: u16, init: u16) -> u16 {
    data.iter().fold(init, |crc, &byte| {
        (0 .. 8).fold(crc ^ (u16::from(byte) << 8), |crc, _| {
            if crc & 0x8000 == 0 {
                crc << 1
            } else {
                (crc << 1) ^ poly
            }
        })
    })
}

/// Returns the CRC word to be stored after the first 30 bytes of a FIB.
#[must_use]
pub fn fib_crc(data: &[u8]) -> u16 {
    !crc16(data, FIB_CRC_POLY, 0xFFFF)
}

/// Returns whether a 32-byte FIB passes its CRC.
#[must_use]
pub fn check_crc_bytes(fib: &[u8]) -> bool {
    if fib.len() != FIB_BYTES {
        return false;
    }
    let stored = u16::from_be_bytes([fib[30], fib[31]]);
    fib_crc(&fib[.. 30]) == stored
}

/// Returns whether a FIB given as 256 unpacked bits (`0` or `1`, MSB first) passes its CRC.
///
/// The bits are shifted through the CRC register one at a time, with the stored CRC inverted on
/// the way in; the register ends at zero if and only if the check passes.
#[must_use]
pub fn check_crc_bits(bits: &[u8]) -> bool {
    if bits.len() != 8 * FIB_BYTES {
        return false;
    }
    let crc_start = bits.len() - 16;
    let register = bits.iter().enumerate().fold(0xFFFFu16, |reg, (k, &bit)| {
        let bit = u16::from((bit != 0) ^ (k >= crc_start));
        let feedback = (reg >> 15) ^ bit;
        if feedback == 1 {
            (reg << 1) ^ FIB_CRC_POLY
        } else {
            reg << 1
        }
    });
    register == 0
}

/// Returns whether the first 11 bytes of a DAB+ superframe pass the Fire code check.
#[must_use]
pub fn check_fire_code(data: &[u8]) -> bool {
    if data.len() < 11 {
        return false;
    }
    let stored = u16::from_be_bytes([data[0], data[1]]);
    // A frame of zeros passes trivially and is rejected
    stored != 0 && crc16(&data[2 .. 11], FIRE_CODE_POLY, 0) == stored
}

#[cfg(test)]
mod tests_of_functions {
    use super::*;
    use crate::test_vectors::{ENSEMBLE_FIB, RADIO_2_FIB, RADIO_4_FIB};

    fn unpack(bytes: &[u8]) -> Vec<u8> {
        bytes
            .iter()
            .flat_map(|&byte| (0 .. 8).rev().map(move |k| (byte >> k) & 1))
            .collect()
    }

    fn valid_fib(seed: u8) -> [u8; 32] {
        let mut fib = [0u8; 32];
        for (k, byte) in fib[.. 30].iter_mut().enumerate() {
            *byte = seed.wrapping_mul(31).wrapping_add(u8::try_from(k).unwrap() * 7);
        }
        let crc = fib_crc(&fib[.. 30]);
        fib[30 ..].copy_from_slice(&crc.to_be_bytes());
        fib
    }

    #[test]
    fn test_crc16() {
        // CRC-16/GENIBUS check value
        assert_eq!(!crc16(b"123456789", FIB_CRC_POLY, 0xFFFF), 0xD64E);
        // CRC-16/XMODEM check value
        assert_eq!(crc16(b"123456789", FIB_CRC_POLY, 0), 0x31C3);
        assert_eq!(crc16(&[], FIB_CRC_POLY, 0xABCD), 0xABCD);
    }

    #[test]
    fn test_check_crc_bytes() {
        let fib = valid_fib(3);
        assert!(check_crc_bytes(&fib));
        assert!(!check_crc_bytes(&fib[.. 31]));
        for k in 0 .. 32 {
            let mut corrupted = fib;
            corrupted[k] ^= 0x01;
            assert!(!check_crc_bytes(&corrupted));
        }
    }

    #[test]
    fn test_check_crc_bits() {
        for seed in 0 .. 20 {
            let fib = valid_fib(seed);
            let bits = unpack(&fib);
            assert!(check_crc_bits(&bits));
            let mut corrupted = bits.clone();
            corrupted[usize::from(seed) * 11] ^= 1;
            assert!(!check_crc_bits(&corrupted));
            // Both checks agree on corrupted input
            let mut corrupted_bytes = fib;
            corrupted_bytes[usize::from(seed)] ^= 0x80;
            assert_eq!(
                check_crc_bits(&unpack(&corrupted_bytes)),
                check_crc_bytes(&corrupted_bytes)
            );
        }
        assert!(!check_crc_bits(&[0; 255]));
    }

    #[test]
    fn test_reference_fibs() {
        for fib in [ENSEMBLE_FIB, RADIO_4_FIB, RADIO_2_FIB] {
            assert!(check_crc_bits(&unpack(&fib)));
            assert!(check_crc_bytes(&fib));
            assert_eq!(fib_crc(&fib[.. 30]).to_be_bytes(), fib[30 ..]);
            let mut corrupted = unpack(&fib);
            corrupted[100] ^= 1;
            assert!(!check_crc_bits(&corrupted));
        }
    }

    #[test]
    fn test_check_fire_code() {
        let mut frame = [0u8; 11];
        for (k, byte) in frame[2 ..].iter_mut().enumerate() {
            *byte = u8::try_from(k).unwrap() + 1;
        }
        let crc = crc16(&frame[2 ..], FIRE_CODE_POLY, 0);
        frame[.. 2].copy_from_slice(&crc.to_be_bytes());
        assert!(check_fire_code(&frame));
        frame[5] ^= 4;
        assert!(!check_fire_code(&frame));
        assert!(!check_fire_code(&[0; 11]));
        assert!(!check_fire_code(&[0; 10]));
    }
}
