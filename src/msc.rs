//! Main service channel: sub-channel extraction and decoding
//!
//! A sub-channel occupies `size` consecutive capacity units of every common interleaved frame
//! (CIF), starting at `start_address`. Its soft decisions are time de-interleaved over 16 CIFs,
//! de-punctured and Viterbi decoded, and freed from energy dispersal, giving one logical frame of
//! `24 * bit_rate` bits every 24 ms.
//!
//! # Examples
//!
//! ```
//! use dabcore::fib::SubChannel;
//! use dabcore::msc::{SubChannelDecoder, CIF_BITS};
//! use dabcore::protection::ProtectionProfile;
//! use dabcore::viterbi::Backend;
//!
//! let sub_channel = SubChannel {
//!     id: 1,
//!     start_address: 0,
//!     size: 12,
//!     short_form: false,
//!     protection: ProtectionProfile::EepA(1),
//!     bit_rate: 8,
//!     language: 0,
//!     fec_scheme: 0,
//! };
//! let mut decoder = SubChannelDecoder::new(&sub_channel, Backend::Scalar)?;
//! // Nothing comes out until the de-interleaver is primed
//! assert!(decoder.process_cif(&vec![0; CIF_BITS])?.is_none());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use tracing::debug;

use crate::fib::SubChannel;
use crate::prbs;
use crate::protection::{Protection, CU_BITS, MAX_SUB_CHANNEL_SIZE};
use crate::utils;
use crate::viterbi::Backend;
use crate::Error;

/// Number of soft decisions in a CIF
pub const CIF_BITS: usize = MAX_SUB_CHANNEL_SIZE * CU_BITS;

/// Number of branches of the time interleaver
pub const INTERLEAVER_BRANCHES: usize = 16;

/// Delay (CIFs) applied by the transmitter to bit `i` of a logical frame, indexed by `i % 16`
pub const INTERLEAVER_DELAYS: [usize; INTERLEAVER_BRANCHES] =
    [0, 8, 4, 12, 2, 10, 6, 14, 1, 9, 5, 13, 3, 11, 7, 15];

/// Longest interleaver delay (CIFs)
const MAX_DELAY: usize = INTERLEAVER_BRANCHES - 1;

/// Decoder for one sub-channel of the MSC
#[derive(Debug)]
pub struct SubChannelDecoder {
    /// Sub-channel being decoded
    sub_channel: SubChannel,
    /// De-puncturing Viterbi decoder
    protection: Protection,
    /// Soft decisions of the last 16 CIFs, indexed by CIF count modulo 16
    history: Vec<Vec<i16>>,
    /// Number of CIFs received
    num_cifs: usize,
    /// De-interleaved soft decisions
    deinterleaved: Vec<i16>,
    /// Decoded bits
    bits: Vec<u8>,
    /// Energy dispersal sequence of one logical frame
    prbs: Vec<u8>,
}

impl SubChannelDecoder {
    /// Returns decoder for given sub-channel.
    ///
    /// # Parameters
    ///
    /// - `sub_channel`: Sub-channel organisation, as announced in FIG 0/1.
    ///
    /// - `backend`: Viterbi strategy to use.
    ///
    /// # Errors
    ///
    /// Returns an error if the sub-channel does not fit in a CIF or if its protection is invalid.
    pub fn new(sub_channel: &SubChannel, backend: Backend) -> Result<Self, Error> {
        let end = usize::from(sub_channel.start_address) + usize::from(sub_channel.size);
        if sub_channel.size == 0 || end > MAX_SUB_CHANNEL_SIZE {
            return Err(Error::InvalidInput(format!(
                "Sub-channel {} (CUs {} to {end}) does not fit in a CIF",
                sub_channel.id, sub_channel.start_address
            )));
        }
        let protection = Protection::new(sub_channel.protection, sub_channel.bit_rate, backend)?;
        let fragment_bits = usize::from(sub_channel.size) * CU_BITS;
        if protection.input_len() > fragment_bits {
            return Err(Error::InvalidProtection(format!(
                "{} at {} kbit/s needs more than {} CUs",
                sub_channel.protection, sub_channel.bit_rate, sub_channel.size
            )));
        }
        debug!(
            id = sub_channel.id,
            start = sub_channel.start_address,
            size = sub_channel.size,
            "sub-channel decoder set up"
        );
        Ok(Self {
            sub_channel: *sub_channel,
            history: vec![vec![0; fragment_bits]; INTERLEAVER_BRANCHES],
            num_cifs: 0,
            deinterleaved: vec![0; fragment_bits],
            bits: vec![0; protection.frame_bits()],
            prbs: prbs::sequence(protection.frame_bits()),
            protection,
        })
    }

    /// Returns sub-channel being decoded.
    #[must_use]
    pub fn sub_channel(&self) -> &SubChannel {
        &self.sub_channel
    }

    /// Returns number of bytes per logical frame.
    #[must_use]
    pub fn frame_bytes(&self) -> usize {
        self.bits.len() / 8
    }

    /// Returns whether enough CIFs have been received for output.
    #[must_use]
    pub fn is_primed(&self) -> bool {
        self.num_cifs > MAX_DELAY
    }

    /// Forgets all received CIFs, as after retuning.
    pub fn reset(&mut self) {
        self.num_cifs = 0;
        for fragment in &mut self.history {
            fragment.fill(0);
        }
    }

    /// Takes the soft decisions of one CIF and returns the next logical frame, if any.
    ///
    /// # Parameters
    ///
    /// - `cif`: Soft decisions of the CIF, positive values indicating that `0` is more likely. Only
    ///   the capacity units of the sub-channel are read.
    ///
    /// # Returns
    ///
    /// - `frame`: Bytes of the logical frame sent 15 CIFs ago, or `None` while the de-interleaver
    ///   is being primed.
    ///
    /// # Errors
    ///
    /// Returns an error if the CIF is too short to hold the sub-channel.
    pub fn process_cif(&mut self, cif: &[i16]) -> Result<Option<Vec<u8>>, Error> {
        let start = usize::from(self.sub_channel.start_address) * CU_BITS;
        let len = self.deinterleaved.len();
        let fragment = cif.get(start .. start + len).ok_or_else(|| {
            Error::InvalidInput(format!(
                "CIF of {} soft decisions does not hold sub-channel {}",
                cif.len(),
                self.sub_channel.id
            ))
        })?;
        let slot = self.num_cifs % INTERLEAVER_BRANCHES;
        self.history[slot].copy_from_slice(fragment);
        self.num_cifs += 1;
        if !self.is_primed() {
            return Ok(None);
        }
        self.deinterleave(slot);
        self.protection.deconvolve(&self.deinterleaved, &mut self.bits)?;
        prbs::descramble(&mut self.bits, &self.prbs);
        Ok(Some(utils::pack_bits(&self.bits)))
    }

    /// Reassembles the logical frame completed by the CIF in history slot `newest`.
    fn deinterleave(&mut self, newest: usize) {
        for (k, soft) in self.deinterleaved.iter_mut().enumerate() {
            let age = MAX_DELAY - INTERLEAVER_DELAYS[k % INTERLEAVER_BRANCHES];
            let slot = (newest + INTERLEAVER_BRANCHES - age) % INTERLEAVER_BRANCHES;
            *soft = self.history[slot][k];
        }
    }
}

#[cfg(test)]
mod tests_of_sub_channel_decoder {
    use super::*;
    use crate::protection::ProtectionProfile;
    use crate::viterbi::ConvolutionalEncoder;
    use rand::Rng;

    fn sub_channel(profile: ProtectionProfile, bit_rate: u16, start_address: u16) -> SubChannel {
        SubChannel {
            id: 4,
            start_address,
            size: u16::try_from(profile.sub_channel_size(bit_rate).unwrap()).unwrap(),
            short_form: matches!(profile, ProtectionProfile::Uep(_)),
            protection: profile,
            bit_rate,
            language: 0,
            fec_scheme: 0,
        }
    }

    /// Returns transmitted soft decisions of a logical frame, padded to the sub-channel size.
    fn transmit(bytes: &[u8], sub_channel: &SubChannel) -> Vec<i16> {
        let protection =
            Protection::new(sub_channel.protection, sub_channel.bit_rate, Backend::Scalar)
                .unwrap();
        let mut bits = utils::unpack_bits(bytes);
        let sequence = prbs::sequence(bits.len());
        prbs::descramble(&mut bits, &sequence);
        let mut soft: Vec<i16> = ConvolutionalEncoder::encode(&bits)
            .iter()
            .zip(protection.puncture_table().mask())
            .filter(|&(_, &kept)| kept)
            .map(|(&bit, _)| if bit == 0 { 90 } else { -90 })
            .collect();
        soft.resize(usize::from(sub_channel.size) * CU_BITS, 0);
        soft
    }

    /// Returns CIFs carrying time-interleaved logical frames.
    fn interleave(frames: &[Vec<i16>], sub_channel: &SubChannel) -> Vec<Vec<i16>> {
        let start = usize::from(sub_channel.start_address) * CU_BITS;
        (0 .. frames.len())
            .map(|r| {
                let mut cif = vec![0i16; CIF_BITS];
                for (k, soft) in cif[start .. start + frames[0].len()].iter_mut().enumerate() {
                    let delay = INTERLEAVER_DELAYS[k % INTERLEAVER_BRANCHES];
                    if r >= delay {
                        *soft = frames[r - delay][k];
                    }
                }
                cif
            })
            .collect()
    }

    #[test]
    fn test_decode_interleaved_frames() {
        let mut rng = rand::rng();
        for (profile, bit_rate, start) in [
            (ProtectionProfile::EepA(3), 64, 100),
            (ProtectionProfile::Uep(3), 48, 600),
        ] {
            let sub_channel = sub_channel(profile, bit_rate, start);
            let mut decoder = SubChannelDecoder::new(&sub_channel, Backend::Scalar).unwrap();
            assert_eq!(decoder.frame_bytes(), 3 * usize::from(bit_rate));
            let num_frames = 19;
            let payloads: Vec<Vec<u8>> = (0 .. num_frames)
                .map(|_| (0 .. decoder.frame_bytes()).map(|_| rng.random()).collect())
                .collect();
            let frames: Vec<Vec<i16>> = payloads
                .iter()
                .map(|bytes| transmit(bytes, &sub_channel))
                .collect();
            for (r, cif) in interleave(&frames, &sub_channel).iter().enumerate() {
                let output = decoder.process_cif(cif).unwrap();
                if r < MAX_DELAY {
                    assert!(output.is_none());
                } else {
                    assert_eq!(output.unwrap(), payloads[r - MAX_DELAY], "{profile}");
                }
            }
            decoder.reset();
            assert!(!decoder.is_primed());
        }
    }

    #[test]
    fn test_invalid_sub_channels() {
        let mut bad = sub_channel(ProtectionProfile::EepA(3), 64, 0);
        bad.start_address = 850;
        assert!(SubChannelDecoder::new(&bad, Backend::Scalar).is_err());
        let mut bad = sub_channel(ProtectionProfile::EepA(3), 64, 0);
        bad.size -= 1;
        assert!(matches!(
            SubChannelDecoder::new(&bad, Backend::Scalar),
            Err(Error::InvalidProtection(_))
        ));
        let mut bad = sub_channel(ProtectionProfile::EepA(3), 64, 0);
        bad.bit_rate = 60;
        assert!(SubChannelDecoder::new(&bad, Backend::Scalar).is_err());
    }

    #[test]
    fn test_short_cif() {
        let sub_channel = sub_channel(ProtectionProfile::EepA(1), 8, 800);
        let mut decoder = SubChannelDecoder::new(&sub_channel, Backend::Scalar).unwrap();
        assert_eq!(decoder.sub_channel().id, 4);
        assert!(decoder.process_cif(&[0; 1000]).is_err());
        assert!(decoder.process_cif(&vec![0; CIF_BITS]).unwrap().is_none());
    }
}
