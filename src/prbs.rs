//! Energy dispersal sequence
//!
//! The transmitter scrambles FIC and MSC data with the output of the 9-bit shift register
//! generating `x^9 + x^5 + 1`, preset to all ones at the start of each block. Descrambling is the
//! same XOR.

/// Returns the first `len` bits of the energy dispersal sequence.
///
/// # Examples
///
/// ```
/// use dabcore::prbs;
///
/// assert_eq!(
///     prbs::sequence(16),
///     [0, 0, 0, 0, 0, 1, 1, 1, 1, 0, 1, 1, 1, 1, 1, 0]
/// );
/// ```
#[must_use]
pub fn sequence(len: usize) -> Vec<u8> {
    let mut register = 0x1FFu16;
    (0 .. len)
        .map(|_| {
            let bit = ((register >> 8) ^ (register >> 4)) & 1;
            register = ((register << 1) | bit) & 0x1FF;
            u8::from(bit == 1)
        })
        .collect()
}

/// XORs unpacked bits with a dispersal sequence of at least the same length.
pub fn descramble(bits: &mut [u8], sequence: &[u8]) {
    for (bit, &p) in bits.iter_mut().zip(sequence.iter()) {
        *bit ^= p;
    }
}
