//! Arithmetic over the Galois field GF(2^m)
//!
//! Field elements are held either in polynomial form (the `m`-bit vector of coefficients) or in
//! power form (the exponent `i` such that the element equals `alpha^i`, with `alpha` a root of the
//! field polynomial). The zero element has no power form; it is represented by the pseudo-exponent
//! `code_length` (`2^m - 1`), for which `power2poly` returns `0`.

use crate::Error;

/// Log/antilog tables for GF(2^m)
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Galois {
    /// Symbol size `m` (bits)
    symsize: u32,
    /// Number of non-zero field elements (`2^m - 1`)
    code_length: u16,
    /// Antilog table: power form to polynomial form
    alpha_to: Vec<u16>,
    /// Log table: polynomial form to power form
    index_of: Vec<u16>,
}

impl Galois {
    /// Returns log/antilog tables for the field generated by a primitive polynomial.
    ///
    /// # Parameters
    ///
    /// - `symsize`: Symbol size `m` in bits, in the range `[2, 16]`.
    ///
    /// - `gfpoly`: Field polynomial, including the `x^m` term (for example `0x11D` for the
    ///   GF(256) used by DAB+).
    ///
    /// # Errors
    ///
    /// Returns an error if `symsize` is out of range, or if `gfpoly` is not primitive.
    ///
    /// # Examples
    ///
    /// ```
    /// use dabcore::Galois;
    ///
    /// let gf = Galois::new(8, 0x11D)?;
    /// assert_eq!(gf.code_length(), 255);
    /// assert_eq!(gf.multiply_poly(0x80, 2), 0x1D);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn new(symsize: u32, gfpoly: u32) -> Result<Self, Error> {
        if !(2 ..= 16).contains(&symsize) {
            return Err(Error::InvalidInput(format!(
                "Symbol size {symsize} is not in the range [2, 16]"
            )));
        }
        let num_elements = 1u32 << symsize;
        let code_length = num_elements - 1;
        let mut alpha_to = vec![0u16; num_elements as usize];
        let mut index_of = vec![0u16; num_elements as usize];
        index_of[0] = to_symbol(code_length);
        alpha_to[code_length as usize] = 0;
        let mut sr = 1u32;
        for i in 0 .. code_length {
            index_of[sr as usize] = to_symbol(i);
            alpha_to[i as usize] = to_symbol(sr);
            sr <<= 1;
            if sr & num_elements != 0 {
                sr ^= gfpoly;
            }
            sr &= code_length;
        }
        if sr != 1 {
            return Err(Error::InvalidGaloisPolynomial(gfpoly));
        }
        Ok(Self {
            symsize,
            code_length: to_symbol(code_length),
            alpha_to,
            index_of,
        })
    }

    /// Returns the number of non-zero field elements, `2^m - 1`.
    #[must_use]
    pub fn code_length(&self) -> u16 {
        self.code_length
    }

    /// Returns the symbol size in bits.
    #[must_use]
    pub fn symsize(&self) -> u32 {
        self.symsize
    }

    /// Reduces a non-negative exponent modulo `2^m - 1`.
    #[must_use]
    pub fn modnn(&self, x: usize) -> u16 {
        let nn = usize::from(self.code_length);
        let mut x = x;
        while x >= nn {
            x -= nn;
            x = (x >> self.symsize) + (x & nn);
        }
        to_symbol(x)
    }

    /// Returns the sum of two elements in polynomial form.
    #[must_use]
    pub fn add_poly(&self, a: u16, b: u16) -> u16 {
        a ^ b
    }

    /// Returns the sum of two elements in power form, in power form.
    #[must_use]
    pub fn add_power(&self, a: u16, b: u16) -> u16 {
        self.poly2power(self.power2poly(a) ^ self.power2poly(b))
    }

    /// Returns the product of two elements in polynomial form.
    #[must_use]
    pub fn multiply_poly(&self, a: u16, b: u16) -> u16 {
        if a == 0 || b == 0 {
            return 0;
        }
        self.power2poly(self.multiply_power(self.poly2power(a), self.poly2power(b)))
    }

    /// Returns the product of two elements in power form.
    #[must_use]
    pub fn multiply_power(&self, a: u16, b: u16) -> u16 {
        self.modnn(usize::from(a) + usize::from(b))
    }

    /// Returns `a / b` for elements in polynomial form; division by zero yields `0`.
    #[must_use]
    pub fn divide_poly(&self, a: u16, b: u16) -> u16 {
        if a == 0 || b == 0 {
            return 0;
        }
        self.power2poly(self.divide_power(self.poly2power(a), self.poly2power(b)))
    }

    /// Returns `a / b` for elements in power form. Exponents above `2^m - 1` are reduced first.
    #[must_use]
    pub fn divide_power(&self, a: u16, b: u16) -> u16 {
        let b = self.modnn(usize::from(b));
        self.modnn(usize::from(self.code_length) + usize::from(a) - usize::from(b))
    }

    /// Returns `a^n` for an element in polynomial form.
    #[must_use]
    pub fn pow_poly(&self, a: u16, n: usize) -> u16 {
        if a == 0 {
            return 0;
        }
        self.power2poly(self.pow_power(self.poly2power(a), n))
    }

    /// Returns `a^n` for an element in power form.
    #[must_use]
    pub fn pow_power(&self, a: u16, n: usize) -> u16 {
        if a == 0 {
            return 0;
        }
        self.modnn(usize::from(a) * n)
    }

    /// Returns the multiplicative inverse of an element in polynomial form; the inverse of zero is
    /// taken to be `0`.
    #[must_use]
    pub fn inverse_poly(&self, a: u16) -> u16 {
        if a == 0 {
            return 0;
        }
        self.power2poly(self.inverse_power(self.poly2power(a)))
    }

    /// Returns the multiplicative inverse of an element in power form. Exponents above `2^m - 1`
    /// are reduced first.
    #[must_use]
    pub fn inverse_power(&self, a: u16) -> u16 {
        let a = self.modnn(usize::from(a));
        self.modnn(usize::from(self.code_length) - usize::from(a))
    }

    /// Converts an element from polynomial form to power form.
    #[must_use]
    pub fn poly2power(&self, a: u16) -> u16 {
        self.index_of[usize::from(a & self.code_length)]
    }

    /// Converts an element from power form to polynomial form.
    #[must_use]
    pub fn power2poly(&self, a: u16) -> u16 {
        let a = usize::from(a);
        if a > usize::from(self.code_length) {
            self.alpha_to[usize::from(self.modnn(a))]
        } else {
            self.alpha_to[a]
        }
    }
}

/// Narrows a table value known to fit in a symbol.
fn to_symbol<T: TryInto<u16>>(x: T) -> u16 {
    x.try_into().unwrap_or(u16::MAX)
}

#[cfg(test)]
mod tests_of_galois {
    use super::*;

    #[test]
    fn test_new() {
        // Invalid input
        assert!(Galois::new(1, 0x3).is_err());
        assert!(Galois::new(17, 0x1_0000B).is_err());
        assert!(matches!(
            Galois::new(8, 0x101),
            Err(Error::InvalidGaloisPolynomial(0x101))
        ));
        // Valid input
        let gf = Galois::new(8, 0x11D).unwrap();
        assert_eq!(gf.code_length(), 255);
        assert_eq!(gf.symsize(), 8);
        assert_eq!(gf.power2poly(0), 1);
        assert_eq!(gf.power2poly(1), 2);
        assert_eq!(gf.power2poly(8), 0x1D);
        assert_eq!(gf.poly2power(0), 255);
        assert_eq!(gf.power2poly(255), 0);
        let gf = Galois::new(4, 0x13).unwrap();
        assert_eq!(gf.code_length(), 15);
        assert_eq!(gf.power2poly(4), 0x3);
    }

    #[test]
    fn test_round_trip() {
        let gf = Galois::new(8, 0x11D).unwrap();
        for a in 1 ..= gf.code_length() {
            assert_eq!(gf.power2poly(gf.poly2power(a)), a);
        }
    }

    #[test]
    fn test_modnn() {
        let gf = Galois::new(8, 0x11D).unwrap();
        assert_eq!(gf.modnn(0), 0);
        assert_eq!(gf.modnn(254), 254);
        assert_eq!(gf.modnn(255), 0);
        assert_eq!(gf.modnn(256), 1);
        assert_eq!(gf.modnn(3 * 255 + 7), 7);
    }

    #[test]
    fn test_multiply_divide() {
        let gf = Galois::new(8, 0x11D).unwrap();
        assert_eq!(gf.multiply_poly(0x80, 2), 0x1D);
        assert_eq!(gf.multiply_poly(0, 7), 0);
        assert_eq!(gf.multiply_power(200, 100), 45);
        for a in 1 ..= 255 {
            for b in [1, 2, 0x53, 0xCA, 0xFF] {
                let p = gf.multiply_poly(a, b);
                assert_eq!(gf.divide_poly(p, b), a);
            }
        }
        // Division by zero yields zero
        assert_eq!(gf.divide_poly(0x53, 0), 0);
        assert_eq!(gf.divide_poly(0, 0x53), 0);
    }

    #[test]
    fn test_add() {
        let gf = Galois::new(8, 0x11D).unwrap();
        assert_eq!(gf.add_poly(0x53, 0xCA), 0x99);
        let (a, b) = (gf.poly2power(0x53), gf.poly2power(0xCA));
        assert_eq!(gf.power2poly(gf.add_power(a, b)), 0x99);
        // Adding an element to itself gives zero, whose power form is the pseudo-exponent
        assert_eq!(gf.add_power(a, a), 255);
    }

    #[test]
    fn test_inverse_and_pow() {
        let gf = Galois::new(8, 0x11D).unwrap();
        for a in 1 ..= 255 {
            assert_eq!(gf.multiply_poly(a, gf.inverse_poly(a)), 1);
        }
        assert_eq!(gf.inverse_poly(0), 0);
        assert_eq!(gf.pow_poly(2, 8), 0x1D);
        assert_eq!(gf.pow_poly(0x53, 0), 1);
        assert_eq!(gf.pow_poly(0, 5), 0);
        assert_eq!(gf.pow_poly(0x53, 255), 1);
        assert_eq!(gf.multiply_poly(gf.pow_poly(0x53, 2), 0x53), gf.pow_poly(0x53, 3));
    }

    #[test]
    fn test_large_exponents() {
        let gf = Galois::new(8, 0x11D).unwrap();
        // 300 = 45 (mod 255)
        assert_eq!(gf.divide_power(0, 300), gf.divide_power(0, 45));
        assert_eq!(gf.divide_power(0, 300), 210);
        assert_eq!(gf.divide_power(600, 300), gf.divide_power(90, 45));
        assert_eq!(gf.inverse_power(300), 210);
        assert_eq!(gf.inverse_power(u16::MAX), 0);
        assert_eq!(gf.divide_power(7, u16::MAX), 7);
    }
}
