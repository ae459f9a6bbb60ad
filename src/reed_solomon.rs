//! Systematic Reed-Solomon encoder and errors-only decoder over GF(2^m)
//!
//! The decoder follows the classic chain: syndromes by Horner evaluation, the error-locator
//! polynomial by Berlekamp-Massey, error positions by Chien search, and error values by Forney's
//! algorithm. Shortened codes are supported through a `cutlen` argument giving the number of
//! leading zero symbols that are not transmitted.
//!
//! # Examples
//!
//! ```
//! use dabcore::ReedSolomon;
//!
//! // RS(120, 110) shortened from RS(255, 245), as used in DAB+ superframes
//! let rs = ReedSolomon::dab_plus()?;
//! let data: Vec<u8> = (0 .. 110).map(|i| (i * 7) as u8).collect();
//! let parity = rs.encode(&data, 135)?;
//! let mut codeword = [data.clone(), parity].concat();
//! codeword[3] ^= 0x5A;
//! codeword[100] ^= 0x01;
//! assert_eq!(rs.decode(&mut codeword, 135)?, 2);
//! assert_eq!(&codeword[.. 110], &data[..]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use tracing::trace;

use crate::{Error, Galois};

/// Reed-Solomon codec for 8-bit symbols
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ReedSolomon {
    /// Field arithmetic
    galois: Galois,
    /// Full code length `2^m - 1` (symbols)
    code_length: usize,
    /// First consecutive root of the generator, in power form
    fcr: usize,
    /// Primitive element used to generate the roots, in power form
    prim: usize,
    /// Inverse of `prim` modulo the code length
    iprim: usize,
    /// Number of parity symbols
    nroots: usize,
    /// Generator polynomial coefficients in power form, lowest degree first
    genpoly: Vec<u16>,
}

impl ReedSolomon {
    /// Returns codec for given code parameters.
    ///
    /// # Parameters
    ///
    /// - `symsize`: Symbol size in bits, at most `8`.
    ///
    /// - `gfpoly`: Primitive field polynomial.
    ///
    /// - `fcr`: First consecutive root of the generator polynomial, in power form.
    ///
    /// - `prim`: Primitive element used to generate the roots, in power form.
    ///
    /// - `nroots`: Number of parity symbols (roots of the generator polynomial).
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is out of range or `gfpoly` is not primitive.
    pub fn new(
        symsize: u32,
        gfpoly: u32,
        fcr: usize,
        prim: usize,
        nroots: usize,
    ) -> Result<Self, Error> {
        if symsize > 8 {
            return Err(Error::InvalidInput(format!(
                "Symbol size {symsize} exceeds 8 bits"
            )));
        }
        let galois = Galois::new(symsize, gfpoly)?;
        let code_length = usize::from(galois.code_length());
        if fcr > code_length || prim == 0 || prim > code_length || nroots >= code_length {
            return Err(Error::InvalidInput(format!(
                "Invalid Reed-Solomon parameters (fcr {fcr}, prim {prim}, nroots {nroots})"
            )));
        }
        let mut iprim = 1;
        while iprim % prim != 0 {
            iprim += code_length;
        }
        iprim /= prim;
        // Generator polynomial, built in polynomial form as the product of (x - alpha^root)
        let mut genpoly = vec![0u16; nroots + 1];
        genpoly[0] = 1;
        let mut root = fcr * prim;
        for i in 0 .. nroots {
            genpoly[i + 1] = 1;
            for j in (1 ..= i).rev() {
                genpoly[j] = if genpoly[j] == 0 {
                    genpoly[j - 1]
                } else {
                    genpoly[j - 1]
                        ^ galois.power2poly(galois.modnn(usize::from(galois.poly2power(genpoly[j])) + root))
                };
            }
            genpoly[0] =
                galois.power2poly(galois.modnn(usize::from(galois.poly2power(genpoly[0])) + root));
            root += prim;
        }
        for coeff in &mut genpoly {
            *coeff = galois.poly2power(*coeff);
        }
        Ok(Self {
            galois,
            code_length,
            fcr,
            prim,
            iprim,
            nroots,
            genpoly,
        })
    }

    /// Returns the RS(255, 245) codec over GF(256) used to protect DAB+ superframes.
    ///
    /// # Errors
    ///
    /// Never fails for these fixed parameters; the `Result` mirrors [`ReedSolomon::new`].
    pub fn dab_plus() -> Result<Self, Error> {
        Self::new(8, 0x11D, 0, 1, 10)
    }

    /// Returns the number of parity symbols.
    #[must_use]
    pub fn nroots(&self) -> usize {
        self.nroots
    }

    /// Returns the full (unshortened) code length.
    #[must_use]
    pub fn code_length(&self) -> usize {
        self.code_length
    }

    /// Returns parity symbols for given data symbols.
    ///
    /// # Parameters
    ///
    /// - `data`: Data symbols. Must have length `code_length - nroots - cutlen`.
    ///
    /// - `cutlen`: Number of leading zero data symbols removed by shortening.
    ///
    /// # Returns
    ///
    /// - `parity`: The `nroots` parity symbols, to be appended to `data`.
    ///
    /// # Errors
    ///
    /// Returns an error if the data length does not match the shortened code.
    pub fn encode(&self, data: &[u8], cutlen: usize) -> Result<Vec<u8>, Error> {
        let num_data = self.num_data_symbols(cutlen)?;
        if data.len() != num_data {
            return Err(Error::InvalidInput(format!(
                "Expected {num_data} data symbols (found {})",
                data.len()
            )));
        }
        let gf = &self.galois;
        let a0 = gf.code_length();
        let mut bb = vec![0u16; self.nroots];
        for &symbol in data {
            let feedback = gf.poly2power(u16::from(symbol) ^ bb[0]);
            if feedback != a0 {
                for j in 1 .. self.nroots {
                    bb[j] ^= gf.multiply_power_to_poly(feedback, self.genpoly[self.nroots - j]);
                }
            }
            bb.rotate_left(1);
            bb[self.nroots - 1] = if feedback == a0 {
                0
            } else {
                gf.multiply_power_to_poly(feedback, self.genpoly[0])
            };
        }
        Ok(bb.into_iter().map(to_byte).collect())
    }

    /// Corrects errors in a codeword in place.
    ///
    /// # Parameters
    ///
    /// - `codeword`: Data symbols followed by parity symbols. Must have length
    ///   `code_length - cutlen`.
    ///
    /// - `cutlen`: Number of leading zero data symbols removed by shortening.
    ///
    /// # Returns
    ///
    /// - `num_corrected`: Number of symbols corrected (`0` if the codeword was already valid).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Uncorrectable`] if the error pattern is beyond the correction capability of
    /// the code (the codeword is then left unchanged), or an input error if the codeword length
    /// does not match the shortened code.
    pub fn decode(&self, codeword: &mut [u8], cutlen: usize) -> Result<usize, Error> {
        let num_data = self.num_data_symbols(cutlen)?;
        if codeword.len() != num_data + self.nroots {
            return Err(Error::InvalidInput(format!(
                "Expected {} codeword symbols (found {})",
                num_data + self.nroots,
                codeword.len()
            )));
        }
        let mut full = vec![0u16; self.code_length];
        for (dst, &src) in full[cutlen ..].iter_mut().zip(codeword.iter()) {
            *dst = u16::from(src);
        }
        let syndromes = match self.syndromes(&full) {
            Some(syndromes) => syndromes,
            None => return Ok(0),
        };
        let lambda = self.error_locator(&syndromes);
        let (roots, locations) = self.chien_search(&lambda)?;
        let corrections = self.forney(&syndromes, &lambda, &roots, &locations)?;
        let mut num_corrected = 0;
        for &(location, value) in &corrections {
            if location < cutlen {
                trace!(location, "error located in shortened region");
                return Err(Error::Uncorrectable);
            }
            if value != 0 {
                num_corrected += 1;
            }
        }
        for (location, value) in corrections {
            codeword[location - cutlen] ^= to_byte(value);
        }
        Ok(num_corrected)
    }

    /// Returns number of data symbols for given shortening.
    fn num_data_symbols(&self, cutlen: usize) -> Result<usize, Error> {
        let num_data_full = self.code_length - self.nroots;
        if cutlen >= num_data_full {
            return Err(Error::InvalidInput(format!(
                "Shortening {cutlen} leaves no data symbols"
            )));
        }
        Ok(num_data_full - cutlen)
    }

    /// Returns syndromes in power form, or `None` if all of them are zero.
    fn syndromes(&self, full: &[u16]) -> Option<Vec<u16>> {
        let gf = &self.galois;
        let mut syndromes = vec![full[0]; self.nroots];
        for &symbol in &full[1 ..] {
            for (i, s) in syndromes.iter_mut().enumerate() {
                *s = if *s == 0 {
                    symbol
                } else {
                    symbol
                        ^ gf.multiply_power_to_poly(
                            gf.poly2power(*s),
                            gf.modnn((self.fcr + i) * self.prim),
                        )
                };
            }
        }
        if syndromes.iter().all(|&s| s == 0) {
            return None;
        }
        Some(syndromes.into_iter().map(|s| gf.poly2power(s)).collect())
    }

    /// Returns error-locator polynomial in power form (Berlekamp-Massey).
    fn error_locator(&self, syndromes: &[u16]) -> Vec<u16> {
        let gf = &self.galois;
        let a0 = gf.code_length();
        let nroots = self.nroots;
        let mut lambda = vec![0u16; nroots + 1];
        lambda[0] = 1;
        let mut b: Vec<u16> = lambda.iter().map(|&l| gf.poly2power(l)).collect();
        let mut t = vec![0u16; nroots + 1];
        let mut el = 0;
        for r in 1 ..= nroots {
            let mut discr_r = 0u16;
            for i in 0 .. r {
                if lambda[i] != 0 && syndromes[r - i - 1] != a0 {
                    discr_r ^= gf.multiply_power_to_poly(gf.poly2power(lambda[i]), syndromes[r - i - 1]);
                }
            }
            let discr_r = gf.poly2power(discr_r);
            if discr_r == a0 {
                b.rotate_right(1);
                b[0] = a0;
                continue;
            }
            t[0] = lambda[0];
            for i in 0 .. nroots {
                t[i + 1] = if b[i] == a0 {
                    lambda[i + 1]
                } else {
                    lambda[i + 1] ^ gf.multiply_power_to_poly(discr_r, b[i])
                };
            }
            if 2 * el < r {
                el = r - el;
                for (bi, &li) in b.iter_mut().zip(lambda.iter()) {
                    *bi = if li == 0 {
                        a0
                    } else {
                        gf.modnn(usize::from(gf.poly2power(li)) + self.code_length - usize::from(discr_r))
                    };
                }
            } else {
                b.rotate_right(1);
                b[0] = a0;
            }
            lambda.copy_from_slice(&t);
        }
        lambda.into_iter().map(|l| gf.poly2power(l)).collect()
    }

    /// Returns roots and error locations of the error-locator polynomial (Chien search).
    fn chien_search(&self, lambda: &[u16]) -> Result<(Vec<usize>, Vec<usize>), Error> {
        let gf = &self.galois;
        let a0 = gf.code_length();
        let deg_lambda = degree(lambda, a0);
        let mut reg = lambda.to_vec();
        let mut roots = Vec::with_capacity(deg_lambda);
        let mut locations = Vec::with_capacity(deg_lambda);
        let mut k = self.iprim - 1;
        for i in 1 ..= self.code_length {
            let mut q = 1u16;
            for j in (1 ..= deg_lambda).rev() {
                if reg[j] != a0 {
                    reg[j] = gf.modnn(usize::from(reg[j]) + j);
                    q ^= gf.power2poly(reg[j]);
                }
            }
            if q == 0 {
                roots.push(i);
                locations.push(k);
                if roots.len() == deg_lambda {
                    break;
                }
            }
            k = usize::from(gf.modnn(k + self.iprim));
        }
        if deg_lambda == 0 || roots.len() != deg_lambda {
            trace!(deg_lambda, num_roots = roots.len(), "Chien search failed");
            return Err(Error::Uncorrectable);
        }
        Ok((roots, locations))
    }

    /// Returns `(location, value)` pairs of the errors (Forney's algorithm).
    fn forney(
        &self,
        syndromes: &[u16],
        lambda: &[u16],
        roots: &[usize],
        locations: &[usize],
    ) -> Result<Vec<(usize, u16)>, Error> {
        let gf = &self.galois;
        let a0 = gf.code_length();
        let nn = self.code_length;
        let deg_lambda = degree(lambda, a0);
        let deg_omega = deg_lambda - 1;
        // Error-evaluator polynomial omega(x) = s(x) * lambda(x) mod x^nroots, in power form
        let omega: Vec<u16> = (0 ..= deg_omega)
            .map(|i| {
                let mut tmp = 0u16;
                for j in 0 ..= i {
                    if syndromes[i - j] != a0 && lambda[j] != a0 {
                        tmp ^= gf.multiply_power_to_poly(syndromes[i - j], lambda[j]);
                    }
                }
                gf.poly2power(tmp)
            })
            .collect();
        let mut corrections = Vec::with_capacity(roots.len());
        for (&root, &location) in roots.iter().zip(locations.iter()) {
            let mut num1 = 0u16;
            for (i, &om) in omega.iter().enumerate() {
                if om != a0 {
                    num1 ^= gf.power2poly(gf.modnn(usize::from(om) + i * root));
                }
            }
            let num2 = gf.power2poly(gf.modnn(root * self.fcr + nn - root));
            // Odd-degree terms of lambda form its formal derivative
            let mut den = 0u16;
            let mut i = deg_lambda.min(self.nroots - 1) & !1;
            loop {
                if lambda[i + 1] != a0 {
                    den ^= gf.power2poly(gf.modnn(usize::from(lambda[i + 1]) + i * root));
                }
                if i < 2 {
                    break;
                }
                i -= 2;
            }
            if den == 0 {
                trace!(location, "zero denominator in Forney's algorithm");
                return Err(Error::Uncorrectable);
            }
            let value = if num1 == 0 {
                0
            } else {
                gf.power2poly(gf.modnn(
                    usize::from(gf.poly2power(num1)) + usize::from(gf.poly2power(num2)) + nn
                        - usize::from(gf.poly2power(den)),
                ))
            };
            corrections.push((location, value));
        }
        Ok(corrections)
    }
}

impl Galois {
    /// Returns the polynomial form of the product of two elements given in power form.
    fn multiply_power_to_poly(&self, a: u16, b: u16) -> u16 {
        self.power2poly(self.multiply_power(a, b))
    }
}

/// Returns degree of a polynomial in power form.
fn degree(poly: &[u16], a0: u16) -> usize {
    poly.iter().rposition(|&c| c != a0).unwrap_or(0)
}

/// Narrows an 8-bit field symbol to a byte.
fn to_byte(symbol: u16) -> u8 {
    symbol.to_le_bytes()[0]
}

#[cfg(test)]
mod tests_of_reed_solomon {
    use super::*;
    use rand::seq::index::sample;
    use rand::Rng;

    const CUTLEN: usize = 135;

    fn random_data(rng: &mut impl Rng, len: usize) -> Vec<u8> {
        (0 .. len).map(|_| rng.random()).collect()
    }

    #[test]
    fn test_new() {
        // Invalid input
        assert!(ReedSolomon::new(9, 0x211, 0, 1, 10).is_err());
        assert!(ReedSolomon::new(8, 0x11D, 0, 0, 10).is_err());
        assert!(ReedSolomon::new(8, 0x11D, 0, 1, 255).is_err());
        assert!(ReedSolomon::new(8, 0x101, 0, 1, 10).is_err());
        // Valid input
        let rs = ReedSolomon::dab_plus().unwrap();
        assert_eq!(rs.code_length(), 255);
        assert_eq!(rs.nroots(), 10);
        assert_eq!(rs.genpoly.len(), 11);
        // Monic generator
        assert_eq!(rs.genpoly[10], 0);
    }

    #[test]
    fn test_encode() {
        let rs = ReedSolomon::dab_plus().unwrap();
        // Invalid input
        assert!(rs.encode(&[0; 109], CUTLEN).is_err());
        assert!(rs.encode(&[0; 245], 245).is_err());
        // All-zero data gives all-zero parity
        assert_eq!(rs.encode(&[0; 110], CUTLEN).unwrap(), [0; 10]);
        // Shortening does not change parity
        let mut rng = rand::rng();
        let data = random_data(&mut rng, 110);
        let mut padded = vec![0; CUTLEN];
        padded.extend_from_slice(&data);
        assert_eq!(
            rs.encode(&data, CUTLEN).unwrap(),
            rs.encode(&padded, 0).unwrap()
        );
    }

    #[test]
    fn test_decode_clean() {
        let rs = ReedSolomon::dab_plus().unwrap();
        let mut rng = rand::rng();
        for _ in 0 .. 20 {
            let data = random_data(&mut rng, 110);
            let mut codeword = [data.clone(), rs.encode(&data, CUTLEN).unwrap()].concat();
            assert_eq!(rs.decode(&mut codeword, CUTLEN).unwrap(), 0);
            assert_eq!(&codeword[.. 110], &data[..]);
        }
        // Invalid input
        assert!(rs.decode(&mut [0; 119], CUTLEN).is_err());
    }

    #[test]
    fn test_decode_correctable() {
        let rs = ReedSolomon::dab_plus().unwrap();
        let mut rng = rand::rng();
        for num_errors in 1 ..= 5 {
            for _ in 0 .. 20 {
                let data = random_data(&mut rng, 110);
                let reference = [data.clone(), rs.encode(&data, CUTLEN).unwrap()].concat();
                let mut codeword = reference.clone();
                for pos in sample(&mut rng, codeword.len(), num_errors) {
                    codeword[pos] ^= rng.random_range(1 ..= 255u8);
                }
                assert_eq!(rs.decode(&mut codeword, CUTLEN).unwrap(), num_errors);
                assert_eq!(codeword, reference);
            }
        }
    }

    #[test]
    fn test_decode_unshortened() {
        let rs = ReedSolomon::new(8, 0x11D, 1, 1, 4).unwrap();
        let mut rng = rand::rng();
        let data = random_data(&mut rng, 251);
        let reference = [data.clone(), rs.encode(&data, 0).unwrap()].concat();
        let mut codeword = reference.clone();
        codeword[0] ^= 0x80;
        codeword[254] ^= 0x01;
        assert_eq!(rs.decode(&mut codeword, 0).unwrap(), 2);
        assert_eq!(codeword, reference);
    }

    #[test]
    fn test_decode_uncorrectable() {
        let rs = ReedSolomon::dab_plus().unwrap();
        // The generator polynomial itself is a codeword; shifted so that its five highest-degree
        // coefficients fall in the shortened region, the visible part differs from a valid
        // shortened codeword in six symbols while lying within distance five of a codeword that
        // is non-zero in the shortened region.
        let mut message = vec![0u8; 245];
        message[244] = 1;
        let mut generator = [message.clone(), rs.encode(&message, 0).unwrap()].concat();
        generator.rotate_left(114);
        assert!(generator[.. 130].iter().all(|&s| s == 0));
        assert_eq!(generator[130], 1);
        let mut rng = rand::rng();
        let data = random_data(&mut rng, 110);
        let reference = [data.clone(), rs.encode(&data, CUTLEN).unwrap()].concat();
        let mut codeword: Vec<u8> = reference
            .iter()
            .zip(&generator[CUTLEN ..])
            .map(|(&a, &b)| a ^ b)
            .collect();
        let received = codeword.clone();
        assert!(matches!(
            rs.decode(&mut codeword, CUTLEN),
            Err(Error::Uncorrectable)
        ));
        // Left unchanged on failure
        assert_eq!(codeword, received);
    }
}
