//! DAB+ superframe synchronisation and Reed-Solomon correction
//!
//! Five consecutive logical frames of a DAB+ sub-channel form an audio superframe of
//! `120 * s` bytes, where `s = bit_rate / 8`. The last `10 * s` bytes carry the parity of `s`
//! virtually interleaved RS(120, 110) codewords; codeword `k` consists of bytes
//! `k, k + s, k + 2 * s, ...`. The first two bytes hold a Fire code over the next nine, which
//! locates the superframe start.

use tracing::{debug, warn};

use crate::crc;
use crate::reed_solomon::ReedSolomon;
use crate::Error;

/// Number of logical frames in a superframe
pub const FRAMES_PER_SUPERFRAME: usize = 5;

/// Length of a virtually interleaved codeword
pub const CODEWORD_BYTES: usize = 120;

/// Number of data bytes per codeword
pub const DATA_BYTES: usize = 110;

/// Number of leading zero symbols removed from RS(255, 245)
pub const CUTLEN: usize = 135;

/// Corrected superframe
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Superframe {
    /// The `110 * s` payload bytes, Fire code included
    pub payload: Vec<u8>,
    /// Number of symbols corrected
    pub corrected: usize,
    /// Number of codewords found uncorrectable
    pub uncorrectable: usize,
}

/// Superframe decoder for one DAB+ sub-channel
#[derive(Debug)]
pub struct SuperframeDecoder {
    /// Shortened RS(255, 245) codec
    rs: ReedSolomon,
    /// Number of interleaved codewords
    num_codewords: usize,
    /// Bytes per logical frame
    frame_bytes: usize,
    /// Logical frames collected so far
    buffer: Vec<u8>,
    /// Whether the last complete superframe passed the Fire code
    synced: bool,
    /// Number of frames dropped while searching for sync
    frames_skipped: u64,
    /// Codeword buffer
    codeword: Vec<u8>,
}

impl SuperframeDecoder {
    /// Returns superframe decoder.
    ///
    /// # Parameters
    ///
    /// - `bit_rate`: Sub-channel bit rate (kbit/s), a multiple of 8.
    ///
    /// # Errors
    ///
    /// Returns an error if the bit rate is zero or not a multiple of 8.
    pub fn new(bit_rate: u16) -> Result<Self, Error> {
        if bit_rate == 0 || bit_rate % 8 != 0 {
            return Err(Error::InvalidInput(format!(
                "DAB+ bit rate must be a positive multiple of 8 kbit/s (found {bit_rate})"
            )));
        }
        let num_codewords = usize::from(bit_rate / 8);
        Ok(Self {
            rs: ReedSolomon::dab_plus()?,
            num_codewords,
            frame_bytes: 3 * usize::from(bit_rate),
            buffer: Vec::with_capacity(FRAMES_PER_SUPERFRAME * 3 * usize::from(bit_rate)),
            synced: false,
            frames_skipped: 0,
            codeword: vec![0; CODEWORD_BYTES],
        })
    }

    /// Returns number of bytes expected per logical frame.
    #[must_use]
    pub fn frame_bytes(&self) -> usize {
        self.frame_bytes
    }

    /// Returns whether the last complete superframe passed the Fire code.
    #[must_use]
    pub fn is_synced(&self) -> bool {
        self.synced
    }

    /// Returns number of logical frames dropped while searching for the superframe start.
    #[must_use]
    pub fn frames_skipped(&self) -> u64 {
        self.frames_skipped
    }

    /// Takes one logical frame and returns a superframe once five frames line up.
    ///
    /// # Parameters
    ///
    /// - `frame`: Bytes of a logical frame, as returned by the sub-channel decoder.
    ///
    /// # Returns
    ///
    /// - `superframe`: The corrected superframe, or `None` while frames are being collected or
    ///   the Fire code does not match.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame length does not match the bit rate.
    pub fn process_frame(&mut self, frame: &[u8]) -> Result<Option<Superframe>, Error> {
        if frame.len() != self.frame_bytes {
            return Err(Error::InvalidInput(format!(
                "Expected logical frame of {} bytes (found {})",
                self.frame_bytes,
                frame.len()
            )));
        }
        self.buffer.extend_from_slice(frame);
        if self.buffer.len() < FRAMES_PER_SUPERFRAME * self.frame_bytes {
            return Ok(None);
        }
        if !crc::check_fire_code(&self.buffer) {
            if self.synced {
                debug!("superframe sync lost");
            }
            self.synced = false;
            self.frames_skipped += 1;
            self.buffer.drain(.. self.frame_bytes);
            return Ok(None);
        }
        if !self.synced {
            debug!(skipped = self.frames_skipped, "superframe sync found");
        }
        self.synced = true;
        let superframe = self.correct()?;
        self.buffer.clear();
        Ok(Some(superframe))
    }

    /// Corrects the collected superframe in place and returns its payload.
    fn correct(&mut self) -> Result<Superframe, Error> {
        let stride = self.num_codewords;
        let mut corrected = 0;
        let mut uncorrectable = 0;
        for k in 0 .. stride {
            for (i, symbol) in self.codeword.iter_mut().enumerate() {
                *symbol = self.buffer[k + i * stride];
            }
            match self.rs.decode(&mut self.codeword, CUTLEN) {
                Ok(count) => {
                    corrected += count;
                    for (i, &symbol) in self.codeword.iter().enumerate() {
                        self.buffer[k + i * stride] = symbol;
                    }
                }
                Err(Error::Uncorrectable) => uncorrectable += 1,
                Err(error) => return Err(error),
            }
        }
        if uncorrectable > 0 {
            warn!(uncorrectable, corrected, "superframe has uncorrectable codewords");
        }
        Ok(Superframe {
            payload: self.buffer[.. DATA_BYTES * stride].to_vec(),
            corrected,
            uncorrectable,
        })
    }
}
