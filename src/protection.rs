//! Puncturing profiles of the DAB convolutional code and the de-puncturing decoder
//!
//! A punctured code is described by a sequence of blocks, each block being a number of 128-bit
//! units of the mother code (32 information bits each) together with one of the 24 puncturing
//! vectors `PI_1 ..= PI_24` (ETSI EN 300 401, Table 13), followed by the 24 tail positions punctured
//! with `PI_X`. Unequal error protection (UEP) profiles take their blocks from a fixed table of
//! 64 (bit rate, level) combinations; equal error protection (EEP) profiles compute them from the
//! bit rate for options A and B.
//!
//! # Examples
//!
//! ```
//! use dabcore::protection::{Protection, ProtectionProfile};
//! use dabcore::viterbi::Backend;
//!
//! // 128 kbit/s audio at UEP level 3 occupies 96 capacity units
//! let profile = ProtectionProfile::Uep(3);
//! assert_eq!(profile.sub_channel_size(128)?, 96);
//! let protection = Protection::new(profile, 128, Backend::Scalar)?;
//! assert_eq!(protection.frame_bits(), 128 * 24);
//! assert!(protection.input_len() <= 96 * 64);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::viterbi::{Backend, ViterbiDecoder, RATE, TAIL_BITS};
use crate::Error;

/// Puncturing vectors `PI_1 ..= PI_24`, MSB first; `PI_n` keeps `8 + n` of 32 positions
const PI_CODES: [u32; 24] = [
    0xC888_8888,
    0xC888_C888,
    0xC8C8_C888,
    0xC8C8_C8C8,
    0xCCC8_C8C8,
    0xCCC8_CCC8,
    0xCCCC_CCC8,
    0xCCCC_CCCC,
    0xECCC_CCCC,
    0xECCC_ECCC,
    0xECEC_ECCC,
    0xECEC_ECEC,
    0xEEEC_ECEC,
    0xEEEC_EEEC,
    0xEEEE_EEEC,
    0xEEEE_EEEE,
    0xFEEE_EEEE,
    0xFEEE_FEEE,
    0xFEFE_FEEE,
    0xFEFE_FEFE,
    0xFFFE_FEFE,
    0xFFFE_FFFE,
    0xFFFF_FFFE,
    0xFFFF_FFFF,
];

/// Puncturing of the 24 tail positions (`PI_X`)
const TAIL_PATTERN: [bool; RATE * TAIL_BITS] = [
    true, true, false, false, true, true, false, false, true, true, false, false, true, true,
    false, false, true, true, false, false, true, true, false, false,
];

/// Number of mother-code positions per puncturing unit
const UNIT_LEN: usize = 128;

/// Number of bits in a capacity unit
pub const CU_BITS: usize = 64;

/// Largest sub-channel, in capacity units
pub const MAX_SUB_CHANNEL_SIZE: usize = 864;

/// Returns whether position `k` is kept by puncturing vector `PI_pi`.
fn pi_keeps(pi: usize, k: usize) -> bool {
    (PI_CODES[pi - 1] >> (31 - k % 32)) & 1 == 1
}

/// Enumeration of protection profiles, with each variant holding the protection level
#[derive(Clone, Eq, Hash, PartialEq, Debug, Copy, Deserialize, Serialize)]
pub enum ProtectionProfile {
    /// Unequal error protection, levels 1 (strongest) to 5
    Uep(u8),
    /// Equal error protection option A, levels 1 (strongest) to 4
    EepA(u8),
    /// Equal error protection option B, levels 1 (strongest) to 4
    EepB(u8),
}

impl ProtectionProfile {
    /// Returns the protection level held in the variant.
    #[must_use]
    pub fn level(self) -> u8 {
        match self {
            ProtectionProfile::Uep(level)
            | ProtectionProfile::EepA(level)
            | ProtectionProfile::EepB(level) => level,
        }
    }

    /// Returns the EEP profile signalled in a FIG 0/1 long form.
    ///
    /// # Parameters
    ///
    /// - `option`: 3-bit option field (`0` for A, `1` for B).
    ///
    /// - `level`: 2-bit protection level field (`0` for level 1).
    ///
    /// # Errors
    ///
    /// Returns an error for a reserved option.
    pub fn from_long_form(option: u8, level: u8) -> Result<Self, Error> {
        match option {
            0 => Ok(ProtectionProfile::EepA(level + 1)),
            1 => Ok(ProtectionProfile::EepB(level + 1)),
            _ => Err(Error::InvalidProtection(format!(
                "Reserved EEP option {option}"
            ))),
        }
    }

    /// Returns the sub-channel size in capacity units for given bit rate.
    ///
    /// # Errors
    ///
    /// Returns an error if the bit rate is not allowed for this profile.
    pub fn sub_channel_size(self, bit_rate: u16) -> Result<usize, Error> {
        match self {
            ProtectionProfile::Uep(level) => {
                uep_profile(bit_rate, level).map(|profile| usize::from(profile.size))
            }
            ProtectionProfile::EepA(level) => {
                let n = eep_multiple(bit_rate, 8)?;
                let cus_per_multiple = [12, 8, 6, 4];
                check_eep_size(n * cus_per_multiple[eep_level_index(self, level)?])
            }
            ProtectionProfile::EepB(level) => {
                let n = eep_multiple(bit_rate, 32)?;
                let cus_per_multiple = [27, 21, 18, 15];
                check_eep_size(n * cus_per_multiple[eep_level_index(self, level)?])
            }
        }
    }

    /// Returns the bit rate (kbit/s) of an EEP sub-channel of given size.
    ///
    /// # Errors
    ///
    /// Returns an error for UEP profiles (whose bit rate is given by the table index instead), or
    /// if the size is not a valid multiple for the profile.
    pub fn eep_bit_rate(self, size: usize) -> Result<u16, Error> {
        let (cus_per_multiple, kbps_per_multiple) = match self {
            ProtectionProfile::EepA(level) => {
                ([12, 8, 6, 4][eep_level_index(self, level)?], 8)
            }
            ProtectionProfile::EepB(level) => {
                ([27, 21, 18, 15][eep_level_index(self, level)?], 32)
            }
            ProtectionProfile::Uep(_) => {
                return Err(Error::InvalidProtection(
                    "UEP bit rate is given by the table index".to_string(),
                ))
            }
        };
        if size == 0 || size > MAX_SUB_CHANNEL_SIZE || size % cus_per_multiple != 0 {
            return Err(Error::InvalidProtection(format!(
                "Size {size} CUs is not valid for {self}"
            )));
        }
        u16::try_from(size / cus_per_multiple * kbps_per_multiple)
            .map_err(|_| Error::InvalidProtection(format!("Size {size} CUs is too large")))
    }

    /// Returns the puncturing blocks `(units, pi)` for given bit rate.
    fn blocks(self, bit_rate: u16) -> Result<Vec<(usize, usize)>, Error> {
        match self {
            ProtectionProfile::Uep(level) => {
                let profile = uep_profile(bit_rate, level)?;
                Ok(profile
                    .units
                    .iter()
                    .zip(profile.pi.iter())
                    .filter(|&(&units, _)| units > 0)
                    .map(|(&units, &pi)| (usize::from(units), usize::from(pi)))
                    .collect())
            }
            ProtectionProfile::EepA(level) => {
                let n = eep_multiple(bit_rate, 8)?;
                self.sub_channel_size(bit_rate)?;
                Ok(match eep_level_index(self, level)? {
                    0 => vec![(6 * n - 3, 24), (3, 23)],
                    1 if n == 1 => vec![(5, 13), (1, 12)],
                    1 => vec![(2 * n - 3, 14), (4 * n + 3, 13)],
                    2 => vec![(6 * n - 3, 8), (3, 7)],
                    _ => vec![(4 * n - 3, 3), (2 * n + 3, 2)],
                })
            }
            ProtectionProfile::EepB(level) => {
                let n = eep_multiple(bit_rate, 32)?;
                self.sub_channel_size(bit_rate)?;
                let (pi1, pi2) = [(10, 9), (6, 5), (4, 3), (2, 1)][eep_level_index(self, level)?];
                Ok(vec![(24 * n - 3, pi1), (3, pi2)])
            }
        }
    }
}

impl std::fmt::Display for ProtectionProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtectionProfile::Uep(level) => write!(f, "UEP level {level}"),
            ProtectionProfile::EepA(level) => write!(f, "EEP {level}-A"),
            ProtectionProfile::EepB(level) => write!(f, "EEP {level}-B"),
        }
    }
}

/// Returns `bit_rate / unit`, checking that the bit rate is a positive multiple of `unit`.
fn eep_multiple(bit_rate: u16, unit: u16) -> Result<usize, Error> {
    if bit_rate == 0 || bit_rate % unit != 0 {
        return Err(Error::InvalidProtection(format!(
            "Bit rate {bit_rate} kbit/s is not a positive multiple of {unit}"
        )));
    }
    Ok(usize::from(bit_rate / unit))
}

/// Returns zero-based EEP level, checking its range.
fn eep_level_index(profile: ProtectionProfile, level: u8) -> Result<usize, Error> {
    if (1 ..= 4).contains(&level) {
        Ok(usize::from(level - 1))
    } else {
        Err(Error::InvalidProtection(format!(
            "Protection level {level} is not valid for {profile}"
        )))
    }
}

/// Checks that an EEP sub-channel fits in a CIF.
fn check_eep_size(size: usize) -> Result<usize, Error> {
    if size > MAX_SUB_CHANNEL_SIZE {
        return Err(Error::InvalidProtection(format!(
            "Sub-channel of {size} CUs does not fit in a CIF"
        )));
    }
    Ok(size)
}

/// Entry of the UEP table
#[derive(Clone, Eq, PartialEq, Debug, Copy)]
pub struct UepProfile {
    /// Bit rate (kbit/s)
    pub bit_rate: u16,
    /// Protection level (1 to 5)
    pub level: u8,
    /// Sub-channel size in capacity units
    pub size: u16,
    /// Number of 128-bit units punctured with each of the four vectors
    units: [u16; 4],
    /// Indices of the four puncturing vectors
    pi: [u8; 4],
}

/// Returns a UEP table entry.
const fn uep(bit_rate: u16, level: u8, size: u16, units: [u16; 4], pi: [u8; 4]) -> UepProfile {
    UepProfile {
        bit_rate,
        level,
        size,
        units,
        pi,
    }
}

/// UEP table, in the order of the 6-bit table index of the FIG 0/1 short form
const UEP_TABLE: [UepProfile; 64] = [
    uep(32, 5, 16, [3, 4, 17, 0], [5, 3, 2, 0]),
    uep(32, 4, 21, [3, 3, 18, 0], [11, 6, 5, 0]),
    uep(32, 3, 24, [3, 4, 14, 3], [15, 9, 6, 8]),
    uep(32, 2, 29, [3, 4, 14, 3], [22, 13, 8, 13]),
    uep(32, 1, 35, [3, 5, 13, 3], [24, 17, 12, 17]),
    uep(48, 5, 24, [4, 3, 26, 3], [5, 4, 2, 3]),
    uep(48, 4, 29, [3, 4, 26, 3], [9, 6, 4, 6]),
    uep(48, 3, 35, [3, 4, 26, 3], [15, 10, 6, 9]),
    uep(48, 2, 42, [3, 4, 26, 3], [24, 14, 8, 15]),
    uep(48, 1, 52, [3, 5, 25, 3], [24, 18, 13, 18]),
    uep(56, 5, 29, [6, 10, 23, 3], [5, 4, 2, 3]),
    uep(56, 4, 35, [6, 10, 23, 3], [9, 6, 4, 5]),
    uep(56, 3, 42, [6, 12, 21, 3], [16, 7, 6, 9]),
    uep(56, 2, 52, [6, 10, 23, 3], [23, 13, 8, 13]),
    uep(64, 5, 32, [6, 9, 31, 2], [5, 3, 2, 3]),
    uep(64, 4, 42, [6, 9, 33, 0], [11, 6, 5, 0]),
    uep(64, 3, 48, [6, 12, 27, 3], [16, 8, 6, 9]),
    uep(64, 2, 58, [6, 10, 29, 3], [23, 13, 8, 13]),
    uep(64, 1, 70, [6, 11, 28, 3], [24, 18, 12, 18]),
    uep(80, 5, 40, [6, 10, 41, 3], [6, 3, 2, 3]),
    uep(80, 4, 52, [6, 10, 41, 3], [11, 6, 5, 6]),
    uep(80, 3, 58, [6, 11, 40, 3], [16, 8, 6, 7]),
    uep(80, 2, 70, [6, 10, 41, 3], [23, 13, 8, 13]),
    uep(80, 1, 84, [6, 10, 41, 3], [24, 17, 12, 18]),
    uep(96, 5, 48, [7, 9, 53, 3], [5, 4, 2, 4]),
    uep(96, 4, 58, [7, 10, 52, 3], [9, 6, 4, 6]),
    uep(96, 3, 70, [6, 12, 51, 3], [16, 9, 6, 10]),
    uep(96, 2, 84, [6, 10, 53, 3], [22, 12, 9, 12]),
    uep(96, 1, 104, [6, 13, 50, 3], [24, 18, 13, 19]),
    uep(112, 5, 58, [14, 17, 50, 3], [5, 4, 2, 5]),
    uep(112, 4, 70, [11, 21, 49, 3], [9, 6, 4, 8]),
    uep(112, 3, 84, [11, 23, 47, 3], [16, 8, 6, 9]),
    uep(112, 2, 104, [11, 21, 49, 3], [23, 12, 9, 14]),
    uep(128, 5, 64, [12, 19, 62, 3], [5, 3, 2, 4]),
    uep(128, 4, 84, [11, 21, 61, 3], [11, 6, 5, 7]),
    uep(128, 3, 96, [11, 22, 60, 3], [16, 9, 6, 10]),
    uep(128, 2, 116, [11, 21, 61, 3], [22, 12, 9, 14]),
    uep(128, 1, 140, [11, 20, 62, 3], [24, 17, 13, 19]),
    uep(160, 5, 80, [11, 19, 87, 3], [5, 4, 2, 4]),
    uep(160, 4, 104, [11, 23, 83, 3], [11, 6, 5, 9]),
    uep(160, 3, 116, [11, 24, 82, 3], [16, 8, 6, 11]),
    uep(160, 2, 140, [11, 21, 85, 3], [22, 11, 9, 13]),
    uep(160, 1, 168, [11, 22, 84, 3], [24, 18, 12, 19]),
    uep(192, 5, 96, [11, 20, 110, 3], [6, 4, 2, 5]),
    uep(192, 4, 116, [11, 22, 108, 3], [10, 6, 4, 9]),
    uep(192, 3, 140, [11, 24, 106, 3], [16, 10, 6, 11]),
    uep(192, 2, 168, [11, 20, 110, 3], [22, 13, 9, 13]),
    uep(192, 1, 208, [11, 21, 109, 3], [24, 20, 13, 24]),
    uep(224, 5, 116, [12, 22, 131, 3], [8, 6, 2, 6]),
    uep(224, 4, 140, [12, 26, 127, 3], [12, 8, 4, 11]),
    uep(224, 3, 168, [11, 20, 134, 3], [16, 10, 7, 9]),
    uep(224, 2, 208, [11, 22, 132, 3], [24, 16, 10, 15]),
    uep(224, 1, 232, [11, 24, 130, 3], [24, 20, 12, 20]),
    uep(256, 5, 128, [11, 24, 154, 3], [6, 5, 2, 5]),
    uep(256, 4, 168, [11, 24, 154, 3], [12, 9, 5, 10]),
    uep(256, 3, 192, [11, 27, 151, 3], [16, 10, 7, 10]),
    uep(256, 2, 232, [11, 22, 156, 3], [24, 14, 10, 13]),
    uep(256, 1, 280, [11, 26, 152, 3], [24, 19, 14, 18]),
    uep(320, 5, 160, [11, 26, 200, 3], [8, 5, 2, 6]),
    uep(320, 4, 208, [11, 25, 201, 3], [13, 9, 5, 10]),
    uep(320, 2, 280, [11, 26, 200, 3], [24, 17, 9, 17]),
    uep(384, 5, 192, [11, 27, 247, 3], [8, 6, 2, 7]),
    uep(384, 3, 280, [11, 24, 250, 3], [16, 9, 7, 10]),
    uep(384, 1, 416, [12, 28, 245, 3], [24, 20, 14, 23]),
];

/// Returns the UEP table entry for given short-form table index.
///
/// # Errors
///
/// Returns an error if `index` is not in the range `[0, 63]`.
pub fn uep_table_entry(index: usize) -> Result<UepProfile, Error> {
    UEP_TABLE
        .get(index)
        .copied()
        .ok_or_else(|| Error::InvalidProtection(format!("UEP table index {index} out of range")))
}

/// Returns the UEP table entry for given bit rate and level.
fn uep_profile(bit_rate: u16, level: u8) -> Result<UepProfile, Error> {
    UEP_TABLE
        .iter()
        .find(|profile| profile.bit_rate == bit_rate && profile.level == level)
        .copied()
        .ok_or_else(|| {
            Error::InvalidProtection(format!(
                "No UEP profile for {bit_rate} kbit/s at level {level}"
            ))
        })
}

/// Mask of the mother-code positions kept by puncturing
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct PunctureTable {
    /// Whether each position is transmitted
    kept: Vec<bool>,
    /// Number of transmitted positions
    kept_count: usize,
}

impl PunctureTable {
    /// Returns table for given puncturing blocks.
    ///
    /// # Parameters
    ///
    /// - `blocks`: Sequence of `(units, pi)`, each applying `PI_pi` to `units` 128-bit units.
    ///
    /// # Errors
    ///
    /// Returns an error if a puncturing vector index is not in the range `[1, 24]` or if the
    /// blocks are empty.
    pub fn from_blocks(blocks: &[(usize, usize)]) -> Result<Self, Error> {
        if blocks.iter().all(|&(units, _)| units == 0) {
            return Err(Error::InvalidProtection(
                "Puncturing blocks are empty".to_string(),
            ));
        }
        if let Some(&(_, pi)) = blocks.iter().find(|&&(_, pi)| !(1 ..= 24).contains(&pi)) {
            return Err(Error::InvalidProtection(format!(
                "Puncturing vector PI_{pi} does not exist"
            )));
        }
        let num_units: usize = blocks.iter().map(|&(units, _)| units).sum();
        let mut kept = Vec::with_capacity(num_units * UNIT_LEN + TAIL_PATTERN.len());
        for &(units, pi) in blocks {
            for _ in 0 .. units {
                kept.extend((0 .. UNIT_LEN).map(|k| pi_keeps(pi, k)));
            }
        }
        kept.extend_from_slice(&TAIL_PATTERN);
        let kept_count = kept.iter().filter(|&&k| k).count();
        Ok(Self { kept, kept_count })
    }

    /// Returns mask of transmitted positions.
    #[must_use]
    pub fn mask(&self) -> &[bool] {
        &self.kept
    }

    /// Returns number of transmitted positions.
    #[must_use]
    pub fn kept_count(&self) -> usize {
        self.kept_count
    }

    /// Returns number of information bits protected by the table.
    #[must_use]
    pub fn frame_bits(&self) -> usize {
        (self.kept.len() - TAIL_PATTERN.len()) / RATE
    }

    /// Writes received soft decisions to their mother-code positions, zero-filling punctured
    /// positions.
    fn depuncture(&self, raw: &[i16], viterbi_block: &mut [i16]) {
        let mut raw_iter = raw.iter();
        for (dst, &is_kept) in viterbi_block.iter_mut().zip(self.kept.iter()) {
            *dst = if is_kept {
                raw_iter.next().copied().unwrap_or(0)
            } else {
                0
            };
        }
    }
}

/// De-puncturing Viterbi decoder for one puncturing table
#[derive(Debug)]
pub(crate) struct PuncturedDecoder {
    /// Puncturing applied by the transmitter
    table: PunctureTable,
    /// Viterbi decoder for the mother code
    viterbi: ViterbiDecoder,
    /// Buffer for the de-punctured soft decisions
    viterbi_block: Vec<i16>,
}

impl PuncturedDecoder {
    /// Returns decoder for given puncturing blocks.
    pub(crate) fn new(blocks: &[(usize, usize)], backend: Backend) -> Result<Self, Error> {
        let table = PunctureTable::from_blocks(blocks)?;
        let viterbi = ViterbiDecoder::new(table.frame_bits(), backend)?;
        let viterbi_block = vec![0; viterbi.input_len()];
        Ok(Self {
            table,
            viterbi,
            viterbi_block,
        })
    }

    /// Returns puncturing table.
    pub(crate) fn table(&self) -> &PunctureTable {
        &self.table
    }

    /// Returns number of decoded bits per call.
    pub(crate) fn frame_bits(&self) -> usize {
        self.table.frame_bits()
    }

    /// De-punctures and decodes soft decisions; trailing soft decisions beyond the kept count
    /// (sub-channel padding) are ignored.
    pub(crate) fn deconvolve(&mut self, raw: &[i16], output: &mut [u8]) -> Result<(), Error> {
        if raw.len() < self.table.kept_count() {
            return Err(Error::InvalidInput(format!(
                "Expected at least {} soft decisions (found {})",
                self.table.kept_count(),
                raw.len()
            )));
        }
        self.table.depuncture(raw, &mut self.viterbi_block);
        self.viterbi.deconvolve(&self.viterbi_block, output)
    }

    /// Returns `(num_bits, num_errors)` of the last decoded frame; see
    /// [`ViterbiDecoder::calculate_ber`].
    pub(crate) fn calculate_ber(&self, output: &[u8]) -> (usize, usize) {
        self.viterbi
            .calculate_ber(&self.viterbi_block, self.table.mask(), output)
    }
}

/// Sub-channel protection: de-puncturing followed by Viterbi decoding
#[derive(Debug)]
pub struct Protection {
    /// Profile in use
    profile: ProtectionProfile,
    /// Bit rate (kbit/s)
    bit_rate: u16,
    /// De-puncturing decoder
    decoder: PuncturedDecoder,
}

impl Protection {
    /// Returns protection for given profile and bit rate.
    ///
    /// # Parameters
    ///
    /// - `profile`: UEP or EEP profile with its level.
    ///
    /// - `bit_rate`: Sub-channel bit rate (kbit/s).
    ///
    /// - `backend`: Viterbi strategy to use.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidProtection`] if the profile, level and bit rate do not form a valid
    /// combination.
    pub fn new(profile: ProtectionProfile, bit_rate: u16, backend: Backend) -> Result<Self, Error> {
        let blocks = profile.blocks(bit_rate)?;
        let decoder = PuncturedDecoder::new(&blocks, backend)?;
        debug!(%profile, bit_rate, kept = decoder.table().kept_count(), "protection set up");
        Ok(Self {
            profile,
            bit_rate,
            decoder,
        })
    }

    /// Returns UEP protection.
    ///
    /// # Errors
    ///
    /// Returns an error if the (bit rate, level) combination is not in the UEP table.
    pub fn uep(bit_rate: u16, level: u8, backend: Backend) -> Result<Self, Error> {
        Self::new(ProtectionProfile::Uep(level), bit_rate, backend)
    }

    /// Returns EEP protection.
    ///
    /// # Parameters
    ///
    /// - `option_b`: `false` for option A (bit rates in multiples of 8 kbit/s), `true` for option
    ///   B (multiples of 32 kbit/s).
    ///
    /// # Errors
    ///
    /// Returns an error if the level or bit rate is not valid for the option.
    pub fn eep(option_b: bool, level: u8, bit_rate: u16, backend: Backend) -> Result<Self, Error> {
        let profile = if option_b {
            ProtectionProfile::EepB(level)
        } else {
            ProtectionProfile::EepA(level)
        };
        Self::new(profile, bit_rate, backend)
    }

    /// Returns profile in use.
    #[must_use]
    pub fn profile(&self) -> ProtectionProfile {
        self.profile
    }

    /// Returns bit rate (kbit/s).
    #[must_use]
    pub fn bit_rate(&self) -> u16 {
        self.bit_rate
    }

    /// Returns number of decoded bits per logical frame (24 ms).
    #[must_use]
    pub fn frame_bits(&self) -> usize {
        self.decoder.frame_bits()
    }

    /// Returns number of soft decisions consumed per logical frame.
    #[must_use]
    pub fn input_len(&self) -> usize {
        self.decoder.table().kept_count()
    }

    /// Returns puncturing table.
    #[must_use]
    pub fn puncture_table(&self) -> &PunctureTable {
        self.decoder.table()
    }

    /// Decodes one logical frame.
    ///
    /// # Parameters
    ///
    /// - `raw`: Received soft decisions of the sub-channel, at least [`Protection::input_len`]
    ///   of them; any excess (sub-channel padding) is ignored.
    ///
    /// - `output`: Buffer for the [`Protection::frame_bits`] decoded bits.
    ///
    /// # Errors
    ///
    /// Returns an error if either buffer is too short.
    pub fn deconvolve(&mut self, raw: &[i16], output: &mut [u8]) -> Result<(), Error> {
        self.decoder.deconvolve(raw, output)
    }
}
