//! Encoder for the mother code

use super::{output_symbols, NUM_STATES, RATE, TAIL_BITS};

/// Rate-1/4 convolutional encoder with zero-tail termination
#[derive(Clone, Eq, PartialEq, Debug, Copy)]
pub struct ConvolutionalEncoder;

impl ConvolutionalEncoder {
    /// Returns code bits for given information bits.
    ///
    /// # Parameters
    ///
    /// - `bits`: Information bits (`0` or `1`; any non-zero value counts as `1`).
    ///
    /// # Returns
    ///
    /// - `code_bits`: The `4 * (bits.len() + 6)` code bits, including those of the six tail bits
    ///   that return the encoder to state `0`.
    #[must_use]
    pub fn encode(bits: &[u8]) -> Vec<u8> {
        let syms = output_symbols();
        let mut code_bits = Vec::with_capacity(RATE * (bits.len() + TAIL_BITS));
        let mut state = 0usize;
        let tail = [0u8; TAIL_BITS];
        for &bit in bits.iter().chain(tail.iter()) {
            let reg = (state << 1) | usize::from(bit != 0);
            let sym = syms[reg];
            code_bits.extend((0 .. RATE).map(|j| (sym >> (RATE - 1 - j)) & 1));
            state = reg & (NUM_STATES - 1);
        }
        code_bits
    }
}

#[cfg(test)]
mod tests_of_encoder {
    use super::*;

    #[test]
    fn test_encode() {
        assert_eq!(ConvolutionalEncoder::encode(&[]), [0; 24]);
        // Impulse response: one group per tap position
        let code_bits = ConvolutionalEncoder::encode(&[1]);
        assert_eq!(code_bits.len(), 28);
        let groups: Vec<&[u8]> = code_bits.chunks(RATE).collect();
        assert_eq!(groups[0], [1, 1, 1, 1]);
        assert_eq!(groups[1], [0, 1, 1, 0]);
        assert_eq!(groups[2], [1, 1, 0, 1]);
        assert_eq!(groups[3], [1, 1, 0, 1]);
        assert_eq!(groups[4], [0, 0, 1, 0]);
        assert_eq!(groups[5], [1, 0, 0, 1]);
        assert_eq!(groups[6], [1, 1, 1, 1]);
    }
}
