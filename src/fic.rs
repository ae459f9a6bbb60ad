//! Fast information channel handler
//!
//! Soft decisions of the FIC-bearing OFDM symbols are collected into FIC blocks. Each block is
//! de-punctured and Viterbi decoded, the energy dispersal is removed, and every FIB passing its
//! CRC is handed to the [`FibDecoder`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::config::{DabMode, DecoderConfig};
use crate::crc;
use crate::events::{emit, DabEvent, EventSender};
use crate::fib::FibDecoder;
use crate::prbs;
use crate::protection::PuncturedDecoder;
use crate::utils;
use crate::Error;

/// Number of bits in a FIB
pub const FIB_BITS: usize = 256;

/// Upper end of the FIB success ratio
pub const MAX_QUALITY: u8 = 10;

/// Handler of the FIC of one ensemble
#[derive(Debug)]
pub struct FicHandler {
    /// Transmission mode
    mode: DabMode,
    /// Receiver of the valid FIBs
    fib_decoder: Arc<FibDecoder>,
    /// De-puncturing Viterbi decoder for FIC blocks
    decoder: PuncturedDecoder,
    /// Energy dispersal sequence of one FIC block
    prbs: Vec<u8>,
    /// Soft decisions of the FIC block being collected
    buffer: Vec<i16>,
    /// Decoded bits of the last FIC block
    bits: Vec<u8>,
    /// Index of the FIC block within the transmission frame
    fic_index: usize,
    /// Saturating count of recent FIB successes
    quality: u8,
    /// Number of FIBs passing the CRC
    fibs_ok: u64,
    /// Number of FIBs failing the CRC
    fibs_failed: u64,
    /// FIC blocks between bit error rate reports
    ber_interval: usize,
    /// FIC blocks since the last report
    ber_blocks: usize,
    /// Decayed count of compared code bits
    ber_bits: usize,
    /// Decayed count of code bit errors
    ber_errors: usize,
    /// Cleared to stop decoding
    running: Arc<AtomicBool>,
    /// Event channel
    events: Option<EventSender>,
}

impl FicHandler {
    /// Returns FIC handler.
    ///
    /// # Parameters
    ///
    /// - `config`: Transmission mode, Viterbi strategy and reporting interval.
    ///
    /// - `fib_decoder`: Decoder receiving the valid FIBs.
    ///
    /// - `events`: Channel for quality reports, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(
        config: &DecoderConfig,
        fib_decoder: Arc<FibDecoder>,
        events: Option<EventSender>,
    ) -> Result<Self, Error> {
        config.check()?;
        let mode = config.mode;
        let decoder = PuncturedDecoder::new(&mode.fic_puncturing(), config.backend())?;
        if decoder.table().kept_count() != mode.fic_block_bits() {
            return Err(Error::InvalidInput(format!(
                "FIC puncturing keeps {} bits per block instead of {}",
                decoder.table().kept_count(),
                mode.fic_block_bits()
            )));
        }
        debug!(%mode, backend = %config.backend(), "FIC handler set up");
        Ok(Self {
            mode,
            fib_decoder,
            decoder,
            prbs: prbs::sequence(mode.fic_frame_bits()),
            buffer: Vec::with_capacity(mode.fic_block_bits()),
            bits: vec![0; mode.fic_frame_bits()],
            fic_index: 0,
            quality: 0,
            fibs_ok: 0,
            fibs_failed: 0,
            ber_interval: config.ber_interval,
            ber_blocks: 0,
            ber_bits: 0,
            ber_errors: 0,
            running: Arc::new(AtomicBool::new(true)),
            events,
        })
    }

    /// Returns transmission mode.
    #[must_use]
    pub fn mode(&self) -> DabMode {
        self.mode
    }

    /// Returns the FIB decoder fed by this handler.
    #[must_use]
    pub fn fib_decoder(&self) -> &Arc<FibDecoder> {
        &self.fib_decoder
    }

    /// Returns flag which stops decoding when cleared, for use from other threads.
    #[must_use]
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Stops decoding; blocks still being collected are dropped.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
        debug!("FIC handler stopped");
    }

    /// Resumes decoding after [`FicHandler::stop`].
    pub fn restart(&mut self) {
        self.buffer.clear();
        self.fic_index = 0;
        self.running.store(true, Ordering::Release);
    }

    /// Returns whether decoding is enabled.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Returns number of FIBs passing their CRC out of the last [`MAX_QUALITY`], roughly.
    #[must_use]
    pub fn fic_quality(&self) -> u8 {
        self.quality
    }

    /// Returns numbers of FIBs passing and failing the CRC since construction.
    #[must_use]
    pub fn fib_counts(&self) -> (u64, u64) {
        (self.fibs_ok, self.fibs_failed)
    }

    /// Takes the soft decisions of one FIC-bearing OFDM symbol.
    ///
    /// Complete FIC blocks are decoded before this returns.
    ///
    /// # Parameters
    ///
    /// - `soft`: Soft decisions of the symbol ([`DabMode::bits_per_symbol`] of them), with
    ///   positive values indicating that `0` is more likely.
    ///
    /// - `symbol_index`: Index of the symbol in the transmission frame, from `1` (first FIC
    ///   symbol, which restarts block collection) to [`DabMode::fic_symbols`].
    ///
    /// # Errors
    ///
    /// Returns an error if the symbol length or index does not fit the transmission mode.
    pub fn process_block(&mut self, soft: &[i16], symbol_index: usize) -> Result<(), Error> {
        if soft.len() != self.mode.bits_per_symbol() {
            return Err(Error::InvalidInput(format!(
                "Expected {} soft decisions per symbol (found {})",
                self.mode.bits_per_symbol(),
                soft.len()
            )));
        }
        if !(1 ..= self.mode.fic_symbols()).contains(&symbol_index) {
            return Err(Error::InvalidInput(format!(
                "Symbol {symbol_index} does not carry the FIC in {}",
                self.mode
            )));
        }
        if symbol_index == 1 {
            self.buffer.clear();
            self.fic_index = 0;
        }
        let block_bits = self.mode.fic_block_bits();
        let mut rest = soft;
        while !rest.is_empty() {
            let take = (block_bits - self.buffer.len()).min(rest.len());
            self.buffer.extend_from_slice(&rest[.. take]);
            rest = &rest[take ..];
            if self.buffer.len() == block_bits {
                if !self.is_running() {
                    self.buffer.clear();
                    return Ok(());
                }
                self.process_fic_block()?;
                self.buffer.clear();
                self.fic_index += 1;
            }
        }
        Ok(())
    }

    /// Decodes the collected FIC block and forwards its valid FIBs.
    fn process_fic_block(&mut self) -> Result<(), Error> {
        self.decoder.deconvolve(&self.buffer, &mut self.bits)?;
        let (num_bits, num_errors) = self.decoder.calculate_ber(&self.bits);
        prbs::descramble(&mut self.bits, &self.prbs);
        for fib_bits in self.bits.chunks_exact(FIB_BITS) {
            if crc::check_crc_bits(fib_bits) {
                self.fib_decoder
                    .process_fib(&utils::pack_bits(fib_bits), self.fic_index);
                self.fibs_ok += 1;
                self.quality = (self.quality + 1).min(MAX_QUALITY);
            } else {
                trace!(fic_index = self.fic_index, "FIB failed CRC");
                self.fibs_failed += 1;
                self.quality = self.quality.saturating_sub(1);
            }
        }
        self.update_ber(num_bits, num_errors);
        Ok(())
    }

    /// Accumulates bit error counts and reports them once per interval.
    fn update_ber(&mut self, num_bits: usize, num_errors: usize) {
        self.ber_blocks += 1;
        self.ber_bits += num_bits;
        self.ber_errors += num_errors;
        if self.ber_blocks < self.ber_interval {
            return;
        }
        let ber = ratio(self.ber_errors, self.ber_bits);
        debug!(ber, quality = self.quality, "FIC report");
        emit(self.events.as_ref(), DabEvent::FicBitErrorRate(ber));
        emit(self.events.as_ref(), DabEvent::FicQuality(self.quality));
        self.ber_blocks = 0;
        self.ber_bits /= 2;
        self.ber_errors /= 2;
    }
}

/// Returns `num / den`, or zero if `den` is zero.
#[allow(clippy::cast_precision_loss)]
fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

#[cfg(test)]
mod tests_of_fic_handler {
    use super::*;
    use crate::events;
    use crate::protection::PunctureTable;
    use crate::test_vectors::MODE_I_FIC_BLOCK;
    use crate::viterbi::{Backend, ConvolutionalEncoder};
    use float_eq::assert_float_eq;
    use std::sync::mpsc::Receiver;

    fn ensemble_fib() -> Vec<u8> {
        // FIG 1/0 with label "Test Ensemble", then the end marker
        let mut fib = vec![0x35, 0x00, 0xE1, 0xC1];
        let mut label = b"Test Ensemble".to_vec();
        label.resize(16, b' ');
        fib.extend(label);
        fib.extend([0xFF, 0x00]);
        fib.resize(30, 0xFF);
        let crc = crc::fib_crc(&fib);
        fib.extend(crc.to_be_bytes());
        fib
    }

    /// Returns the soft decisions of one FIC block carrying given FIBs.
    fn fic_block(mode: DabMode, fibs: &[Vec<u8>]) -> Vec<i16> {
        let mut bits: Vec<u8> = fibs.iter().flat_map(|fib| utils::unpack_bits(fib)).collect();
        assert_eq!(bits.len(), mode.fic_frame_bits());
        let sequence = prbs::sequence(bits.len());
        prbs::descramble(&mut bits, &sequence);
        let code_bits = ConvolutionalEncoder::encode(&bits);
        let table = PunctureTable::from_blocks(&mode.fic_puncturing()).unwrap();
        code_bits
            .iter()
            .zip(table.mask())
            .filter(|&(_, &kept)| kept)
            .map(|(&bit, _)| if bit == 0 { 100 } else { -100 })
            .collect()
    }

    fn handler(mode: DabMode) -> (FicHandler, Receiver<DabEvent>) {
        let (sender, receiver) = events::channel();
        let config = DecoderConfig {
            mode,
            backend: Some(Backend::Scalar),
            ber_interval: 4,
        };
        let fib_decoder = Arc::new(FibDecoder::new(Some(sender.clone())));
        (
            FicHandler::new(&config, fib_decoder, Some(sender)).unwrap(),
            receiver,
        )
    }

    #[test]
    fn test_mode_one_frame() {
        let mode = DabMode::I;
        let (mut fic, receiver) = handler(mode);
        let mut bad_fib = ensemble_fib();
        bad_fib[3] ^= 0x01;
        let mut frame = Vec::new();
        for block in 0 .. 4 {
            let fibs = if block == 2 {
                vec![ensemble_fib(), bad_fib.clone(), ensemble_fib()]
            } else {
                vec![ensemble_fib(); 3]
            };
            frame.extend(fic_block(mode, &fibs));
        }
        for (index, symbol) in frame.chunks(mode.bits_per_symbol()).enumerate() {
            fic.process_block(symbol, index + 1).unwrap();
        }
        assert_eq!(fic.fib_counts(), (11, 1));
        assert_eq!(fic.fic_quality(), MAX_QUALITY);
        assert!(fic.fib_decoder().sync_reached());
        assert_eq!(
            fic.fib_decoder().ensemble_name().as_deref(),
            Some("Test Ensemble")
        );
        let events: Vec<DabEvent> = receiver.try_iter().collect();
        assert!(events.contains(&DabEvent::FicQuality(MAX_QUALITY)));
        let bers: Vec<f64> = events
            .iter()
            .filter_map(|e| match e {
                DabEvent::FicBitErrorRate(ber) => Some(*ber),
                _ => None,
            })
            .collect();
        assert_eq!(bers.len(), 1);
        assert_float_eq!(bers[0], 0.0, abs <= 1e-12);
    }

    #[test]
    fn test_reference_frame() {
        let mode = DabMode::I;
        let (mut fic, receiver) = handler(mode);
        let block: Vec<i16> = utils::unpack_bits(&MODE_I_FIC_BLOCK)
            .iter()
            .map(|&bit| if bit == 0 { 100 } else { -100 })
            .collect();
        let frame = block.repeat(mode.fic_blocks_per_frame());
        for (index, symbol) in frame.chunks(mode.bits_per_symbol()).enumerate() {
            fic.process_block(symbol, index + 1).unwrap();
        }
        assert_eq!(fic.fib_counts(), (12, 0));
        let fib_decoder = fic.fib_decoder();
        assert_eq!(fib_decoder.ensemble_name().as_deref(), Some("BBC National DAB"));
        assert_eq!(fib_decoder.ensemble_id(), Some(0xCE15));
        let labels: Vec<String> = fib_decoder
            .get_services()
            .into_iter()
            .map(|s| s.label)
            .collect();
        assert_eq!(labels, ["BBC Radio 2", "BBC Radio 4"]);
        assert_eq!(fib_decoder.get_sub_channel_id(0xC222), Some(2));
        assert!(receiver
            .try_iter()
            .any(|e| e == DabEvent::FicBitErrorRate(0.0)));
    }

    #[test]
    fn test_mode_three_block() {
        let mode = DabMode::III;
        let (mut fic, _receiver) = handler(mode);
        let block = fic_block(mode, &vec![ensemble_fib(); 4]);
        for (index, symbol) in block.chunks(mode.bits_per_symbol()).enumerate() {
            fic.process_block(symbol, index + 1).unwrap();
        }
        assert_eq!(fic.fib_counts(), (4, 0));
        assert_eq!(fic.fic_quality(), 4);
    }

    #[test]
    fn test_symbol_one_restarts_block() {
        let mode = DabMode::I;
        let (mut fic, _receiver) = handler(mode);
        let block = fic_block(mode, &vec![ensemble_fib(); 3]);
        let mut symbol = vec![0i16; mode.bits_per_symbol()];
        symbol[.. 2304].copy_from_slice(&block);
        fic.process_block(&symbol, 1).unwrap();
        assert_eq!(fic.fib_counts(), (3, 0));
        // The partial block left by the first call is dropped
        fic.process_block(&symbol, 1).unwrap();
        assert_eq!(fic.fib_counts(), (6, 0));
    }

    #[test]
    fn test_invalid_input() {
        let (mut fic, _receiver) = handler(DabMode::I);
        assert!(fic.process_block(&[0; 100], 1).is_err());
        assert!(fic.process_block(&[0; 3072], 0).is_err());
        assert!(fic.process_block(&[0; 3072], 4).is_err());
        let config = DecoderConfig {
            ber_interval: 0,
            ..DecoderConfig::default()
        };
        assert!(FicHandler::new(&config, Arc::new(FibDecoder::new(None)), None).is_err());
    }

    #[test]
    fn test_stop() {
        let mode = DabMode::I;
        let (mut fic, _receiver) = handler(mode);
        let block = fic_block(mode, &vec![ensemble_fib(); 3]);
        let mut symbol = vec![0i16; mode.bits_per_symbol()];
        symbol[.. 2304].copy_from_slice(&block);
        let running = fic.running_flag();
        running.store(false, Ordering::Release);
        assert!(!fic.is_running());
        fic.process_block(&symbol, 1).unwrap();
        assert_eq!(fic.fib_counts(), (0, 0));
        fic.restart();
        fic.process_block(&symbol, 1).unwrap();
        assert_eq!(fic.fib_counts(), (3, 0));
        fic.stop();
        assert!(!fic.is_running());
    }

    #[test]
    fn test_ratio() {
        assert_float_eq!(ratio(1, 4), 0.25, abs <= 1e-12);
        assert_float_eq!(ratio(3, 0), 0.0, abs <= 1e-12);
    }
}
