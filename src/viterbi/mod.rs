//! Viterbi decoder for the rate-1/4, constraint-length-7 convolutional code of DAB
//!
//! The mother code has generator polynomials `0o155, 0o117, 0o123, 0o155` (bit `k` of each
//! polynomial taps the input bit delayed by `k`), and every frame is terminated by six zero tail
//! bits that flush the encoder back to state `0`. Soft decisions are signed 16-bit values with
//! positive values favouring bit `0`; a zero value is an erasure (punctured position).
//!
//! Several interchangeable add-compare-select strategies implement [`VectorizedDeconvolver`].
//! They differ in metric width and renormalisation threshold but produce identical output for
//! identical input. The SIMD-named strategies are portable fixed-width lane loops written without
//! intrinsics: each one processes as many states per step as the named register set holds 16-bit
//! lanes, and leaves vectorisation to the compiler. Every strategy therefore runs on every target.
//! [`Backend::detect`] picks the lane width matching the registers of the running CPU.
//!
//! # Examples
//!
//! ```
//! use dabcore::viterbi::{Backend, ConvolutionalEncoder, ViterbiDecoder};
//!
//! let bits = [1, 0, 1, 1, 0, 0, 1, 0];
//! let code_bits = ConvolutionalEncoder::encode(&bits);
//! let soft: Vec<i16> = code_bits.iter().map(|&b| if b == 0 { 127 } else { -127 }).collect();
//! let mut decoder = ViterbiDecoder::new(bits.len(), Backend::Scalar)?;
//! let mut decoded = [0u8; 8];
//! decoder.deconvolve(&soft, &mut decoded)?;
//! assert_eq!(decoded, bits);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod encoder;
mod lanes;
mod scalar;

use serde::{Deserialize, Serialize};

pub use encoder::ConvolutionalEncoder;
use lanes::LaneDeconvolver;
use scalar::ScalarDeconvolver;

use crate::Error;

/// Constraint length of the mother code
pub const CONSTRAINT_LENGTH: usize = 7;

/// Number of code bits per information bit
pub const RATE: usize = 4;

/// Number of tail bits that flush the encoder
pub const TAIL_BITS: usize = CONSTRAINT_LENGTH - 1;

/// Number of encoder states
pub const NUM_STATES: usize = 1 << TAIL_BITS;

/// Generator polynomials of the mother code
pub const POLYNOMIALS: [usize; RATE] = [0o155, 0o117, 0o123, 0o155];

/// Magnitude of a fully confident soft decision
pub const MAX_SOFT: i16 = 127;

/// Path metric assigned to all states other than `0` at the start of a frame
const INITIAL_METRIC: i16 = 8192;

/// Enumeration of add-compare-select strategies
///
/// The variants other than `Scalar` are named after the register set whose width they match. They
/// are portable lane loops, not intrinsics, and run on any CPU.
#[derive(Clone, Eq, Hash, PartialEq, Debug, Copy, Deserialize, Serialize)]
pub enum Backend {
    /// One state at a time with 32-bit metrics
    Scalar,
    /// Eight 16-bit saturating lanes, the width of an SSE register
    Sse,
    /// Eight 16-bit saturating lanes, the width of a NEON register
    Neon,
    /// Sixteen 16-bit saturating lanes, the width of an AVX2 register
    Avx2,
}

impl Backend {
    /// Returns the lane width suited to the registers of the running CPU.
    ///
    /// The result only selects a lane width; any strategy may be used on any CPU.
    #[must_use]
    pub fn detect() -> Self {
        #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
        {
            if std::arch::is_x86_feature_detected!("avx2") {
                return Backend::Avx2;
            }
            if std::arch::is_x86_feature_detected!("sse2") {
                return Backend::Sse;
            }
        }
        #[cfg(target_arch = "aarch64")]
        {
            if std::arch::is_aarch64_feature_detected!("neon") {
                return Backend::Neon;
            }
        }
        Backend::Scalar
    }

    /// Returns all strategies.
    #[must_use]
    pub fn all() -> [Backend; 4] {
        [Backend::Scalar, Backend::Sse, Backend::Neon, Backend::Avx2]
    }

    /// Returns the number of states processed together.
    #[must_use]
    pub fn lanes(self) -> usize {
        match self {
            Backend::Scalar => 1,
            Backend::Sse | Backend::Neon => 8,
            Backend::Avx2 => 16,
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Backend::Scalar => "scalar",
            Backend::Sse => "SSE",
            Backend::Neon => "NEON",
            Backend::Avx2 => "AVX2",
        };
        write!(f, "{name}")
    }
}

/// Behaviour shared by all add-compare-select strategies
pub trait VectorizedDeconvolver: std::fmt::Debug + Send {
    /// Returns the number of information bits per frame.
    fn frame_bits(&self) -> usize;

    /// Returns the strategy implemented.
    fn backend(&self) -> Backend;

    /// Decodes one frame.
    ///
    /// # Parameters
    ///
    /// - `input`: `4 * (frame_bits + 6)` de-punctured soft decisions, erasures set to `0`.
    ///
    /// - `output`: Buffer for the `frame_bits` hard decisions (`0` or `1`).
    ///
    /// # Errors
    ///
    /// Returns an error if either buffer has the wrong length.
    fn deconvolve(&mut self, input: &[i16], output: &mut [u8]) -> Result<(), Error>;
}

/// Returns a strategy object for given frame length.
///
/// # Errors
///
/// Returns an error if `frame_bits` is zero.
pub fn new_deconvolver(
    frame_bits: usize,
    backend: Backend,
) -> Result<Box<dyn VectorizedDeconvolver>, Error> {
    if frame_bits == 0 {
        return Err(Error::InvalidInput(
            "Number of bits per frame cannot be zero".to_string(),
        ));
    }
    Ok(match backend {
        Backend::Scalar => Box::new(ScalarDeconvolver::new(frame_bits)),
        Backend::Sse | Backend::Neon => Box::new(LaneDeconvolver::<8>::new(frame_bits, backend)),
        Backend::Avx2 => Box::new(LaneDeconvolver::<16>::new(frame_bits, backend)),
    })
}

/// Viterbi decoder for frames of fixed length
#[derive(Debug)]
pub struct ViterbiDecoder {
    /// Strategy doing the work
    inner: Box<dyn VectorizedDeconvolver>,
}

impl ViterbiDecoder {
    /// Returns decoder for frames of given length.
    ///
    /// # Parameters
    ///
    /// - `frame_bits`: Number of information bits per frame (tail bits excluded).
    ///
    /// - `backend`: Add-compare-select strategy to use.
    ///
    /// # Errors
    ///
    /// Returns an error if `frame_bits` is zero.
    pub fn new(frame_bits: usize, backend: Backend) -> Result<Self, Error> {
        Ok(Self {
            inner: new_deconvolver(frame_bits, backend)?,
        })
    }

    /// Returns the number of information bits per frame.
    #[must_use]
    pub fn frame_bits(&self) -> usize {
        self.inner.frame_bits()
    }

    /// Returns the number of soft decisions expected per frame.
    #[must_use]
    pub fn input_len(&self) -> usize {
        RATE * (self.frame_bits() + TAIL_BITS)
    }

    /// Returns the strategy in use.
    #[must_use]
    pub fn backend(&self) -> Backend {
        self.inner.backend()
    }

    /// Decodes one frame; see [`VectorizedDeconvolver::deconvolve`].
    ///
    /// # Errors
    ///
    /// Returns an error if either buffer has the wrong length.
    pub fn deconvolve(&mut self, input: &[i16], output: &mut [u8]) -> Result<(), Error> {
        self.inner.deconvolve(input, output)
    }

    /// Returns `(num_bits, num_errors)`, an estimate of the channel bit error rate obtained by
    /// re-encoding decoded bits.
    ///
    /// # Parameters
    ///
    /// - `input`: De-punctured soft decisions given to [`ViterbiDecoder::deconvolve`].
    ///
    /// - `kept`: Mask of the positions actually transmitted (`true`), same length as `input`.
    ///
    /// - `output`: Hard decisions returned by [`ViterbiDecoder::deconvolve`].
    ///
    /// # Returns
    ///
    /// - `num_bits`: Number of transmitted positions compared.
    ///
    /// - `num_errors`: Number of those whose sign disagrees with the re-encoded bit.
    #[must_use]
    pub fn calculate_ber(&self, input: &[i16], kept: &[bool], output: &[u8]) -> (usize, usize) {
        let code_bits = ConvolutionalEncoder::encode(&output[.. output.len().min(self.frame_bits())]);
        code_bits
            .iter()
            .zip(input.iter().zip(kept.iter()))
            .filter(|&(_, (_, &is_kept))| is_kept)
            .fold((0, 0), |(num_bits, num_errors), (&bit, (&soft, _))| {
                let hard = u8::from(soft < 0);
                (num_bits + 1, num_errors + usize::from(hard != bit))
            })
    }
}

/// Checks buffer lengths given to a strategy.
fn check_buffers(frame_bits: usize, input: &[i16], output: &[u8]) -> Result<(), Error> {
    let expected = RATE * (frame_bits + TAIL_BITS);
    if input.len() != expected {
        return Err(Error::InvalidInput(format!(
            "Expected {expected} soft decisions (found {})",
            input.len()
        )));
    }
    if output.len() != frame_bits {
        return Err(Error::InvalidInput(format!(
            "Expected output buffer for {frame_bits} bits (found {})",
            output.len()
        )));
    }
    Ok(())
}

/// Returns the four code bits, packed MSB first, for each value of the 7-bit encoder register.
fn output_symbols() -> [u8; 2 * NUM_STATES] {
    let mut syms = [0u8; 2 * NUM_STATES];
    for (reg, sym) in syms.iter_mut().enumerate() {
        *sym = POLYNOMIALS
            .iter()
            .fold(0, |acc, &poly| (acc << 1) | parity(reg & poly));
    }
    syms
}

/// Returns the cost of each of the 16 four-bit code patterns for one group of soft decisions.
fn pattern_costs(soft: &[i16]) -> [i16; 16] {
    let mut costs = [0i16; 16];
    for (pattern, cost) in costs.iter_mut().enumerate() {
        *cost = soft.iter().enumerate().fold(0, |acc, (j, &s)| {
            let s = s.clamp(-MAX_SOFT, MAX_SOFT);
            if (pattern >> (RATE - 1 - j)) & 1 == 0 {
                acc + MAX_SOFT - s
            } else {
                acc + MAX_SOFT + s
            }
        });
    }
    costs
}

/// Traces back through packed decisions from state `0`, writing the information bits.
fn traceback(decisions: &[u64], output: &mut [u8]) {
    let mut state = 0usize;
    for (step, &word) in decisions.iter().enumerate().rev() {
        let decision = usize::from((word >> state) & 1 == 1);
        if step < output.len() {
            output[step] = u8::from(state & 1 == 1);
        }
        state = (state >> 1) | (decision << (TAIL_BITS - 1));
    }
}

/// Returns parity of the set bits.
fn parity(x: usize) -> u8 {
    u8::from(x.count_ones() % 2 == 1)
}
