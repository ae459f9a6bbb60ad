//! Transmission mode parameters and decoder configuration

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::viterbi::Backend;
use crate::Error;

/// Enumeration of DAB transmission modes
#[derive(Clone, Eq, Hash, PartialEq, Debug, Copy, Default, Deserialize, Serialize)]
pub enum DabMode {
    /// Mode I (1536 carriers, band III SFNs)
    #[default]
    I,
    /// Mode II (384 carriers)
    II,
    /// Mode III (192 carriers)
    III,
    /// Mode IV (768 carriers)
    IV,
}

impl DabMode {
    /// Returns mode for given number (`1` to `4`).
    ///
    /// # Errors
    ///
    /// Returns an error if `number` is not in the range `[1, 4]`.
    pub fn from_number(number: u8) -> Result<Self, Error> {
        match number {
            1 => Ok(DabMode::I),
            2 => Ok(DabMode::II),
            3 => Ok(DabMode::III),
            4 => Ok(DabMode::IV),
            _ => Err(Error::InvalidInput(format!(
                "Transmission mode {number} does not exist"
            ))),
        }
    }

    /// Returns number of active carriers per OFDM symbol.
    #[must_use]
    pub fn carriers(self) -> usize {
        match self {
            DabMode::I => 1536,
            DabMode::II => 384,
            DabMode::III => 192,
            DabMode::IV => 768,
        }
    }

    /// Returns number of soft bits per OFDM symbol.
    #[must_use]
    pub fn bits_per_symbol(self) -> usize {
        2 * self.carriers()
    }

    /// Returns number of OFDM symbols carrying the FIC in each frame.
    #[must_use]
    pub fn fic_symbols(self) -> usize {
        match self {
            DabMode::I | DabMode::II | DabMode::IV => 3,
            DabMode::III => 8,
        }
    }

    /// Returns number of FIBs per FIC block (one Viterbi frame).
    #[must_use]
    pub fn fibs_per_fic_block(self) -> usize {
        match self {
            DabMode::III => 4,
            _ => 3,
        }
    }

    /// Returns number of FIBs per transmission frame.
    #[must_use]
    pub fn fibs_per_frame(self) -> usize {
        match self {
            DabMode::I => 12,
            DabMode::II => 3,
            DabMode::III => 4,
            DabMode::IV => 6,
        }
    }

    /// Returns number of FIC blocks (and of CIFs) per transmission frame.
    #[must_use]
    pub fn fic_blocks_per_frame(self) -> usize {
        self.fibs_per_frame() / self.fibs_per_fic_block()
    }

    /// Returns number of punctured soft bits per FIC block.
    #[must_use]
    pub fn fic_block_bits(self) -> usize {
        self.fic_symbols() * self.bits_per_symbol() / self.fic_blocks_per_frame()
    }

    /// Returns number of decoded bits per FIC block.
    #[must_use]
    pub fn fic_frame_bits(self) -> usize {
        256 * self.fibs_per_fic_block()
    }

    /// Returns puncturing blocks `(units, pi)` of the FIC.
    pub(crate) fn fic_puncturing(self) -> [(usize, usize); 2] {
        match self {
            DabMode::III => [(29, 16), (3, 15)],
            _ => [(21, 16), (3, 15)],
        }
    }
}

impl std::fmt::Display for DabMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let number = match self {
            DabMode::I => 1,
            DabMode::II => 2,
            DabMode::III => 3,
            DabMode::IV => 4,
        };
        write!(f, "Mode {number}")
    }
}

/// Default number of FIC blocks between bit error rate reports (about one second in mode I)
pub const DEFAULT_BER_INTERVAL: usize = 40;

/// Settings of the FIC decoding chain
#[derive(Clone, Eq, PartialEq, Debug, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Transmission mode
    pub mode: DabMode,
    /// Viterbi strategy; detected from the CPU when absent
    pub backend: Option<Backend>,
    /// Number of FIC blocks between bit error rate reports
    pub ber_interval: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            mode: DabMode::I,
            backend: None,
            ber_interval: DEFAULT_BER_INTERVAL,
        }
    }
}

impl DecoderConfig {
    /// Returns the Viterbi strategy to use.
    #[must_use]
    pub fn backend(&self) -> Backend {
        self.backend.unwrap_or_else(Backend::detect)
    }

    /// Checks validity of the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the reporting interval is zero.
    pub fn check(&self) -> Result<(), Error> {
        if self.ber_interval == 0 {
            return Err(Error::InvalidInput(
                "Bit error rate reporting interval cannot be zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Reads settings from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the settings are invalid.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let reader = BufReader::new(File::open(path)?);
        let config: Self = serde_json::from_reader(reader)?;
        config.check()?;
        Ok(config)
    }

    /// Writes settings to a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests_of_dab_mode {
    use super::*;

    #[test]
    fn test_from_number() {
        assert!(DabMode::from_number(0).is_err());
        assert!(DabMode::from_number(5).is_err());
        assert_eq!(DabMode::from_number(3).unwrap(), DabMode::III);
    }

    #[test]
    fn test_fic_geometry() {
        for mode in [DabMode::I, DabMode::II, DabMode::IV] {
            assert_eq!(mode.fic_block_bits(), 2304);
            assert_eq!(mode.fic_frame_bits(), 768);
        }
        assert_eq!(DabMode::III.fic_block_bits(), 3072);
        assert_eq!(DabMode::III.fic_frame_bits(), 1024);
        assert_eq!(DabMode::I.fic_blocks_per_frame(), 4);
        assert_eq!(DabMode::IV.fic_blocks_per_frame(), 2);
        assert_eq!(DabMode::I.to_string(), "Mode 1");
    }
}

#[cfg(test)]
mod tests_of_decoder_config {
    use super::*;

    #[test]
    fn test_default() {
        let config = DecoderConfig::default();
        assert_eq!(config.mode, DabMode::I);
        assert_eq!(config.ber_interval, 40);
        assert!(config.check().is_ok());
        let config = DecoderConfig {
            ber_interval: 0,
            ..DecoderConfig::default()
        };
        assert!(config.check().is_err());
    }

    #[test]
    fn test_json() {
        let config: DecoderConfig =
            serde_json::from_str(r#"{"mode": "III", "backend": "Scalar"}"#).unwrap();
        assert_eq!(config.mode, DabMode::III);
        assert_eq!(config.backend(), Backend::Scalar);
        assert_eq!(config.ber_interval, DEFAULT_BER_INTERVAL);
        let path = std::env::temp_dir().join("dabcore_test_decoder_config.json");
        config.to_json_file(&path).unwrap();
        assert_eq!(DecoderConfig::from_json_file(&path).unwrap(), config);
        std::fs::remove_file(&path).unwrap();
        assert!(DecoderConfig::from_json_file(&path).is_err());
    }
}
