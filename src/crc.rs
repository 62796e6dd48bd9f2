//! Cyclic redundancy checks for transport blocks and codeblocks

use crate::{Bit, Error};

/// CRC engine for one of the generator polynomials of 3GPP TS 36.212, Section 5.1.1.
///
/// The register starts at zero and bits enter most significant first, so the checksum of a
/// payload `a(x)` is the remainder of `a(x) * x^order` divided by the generator polynomial.
#[derive(Clone, Eq, PartialEq, Debug, Copy)]
pub struct Crc {
    /// Generator polynomial, including the leading term
    poly: u32,
    /// Number of checksum bits
    order: usize,
}

impl Crc {
    /// Returns the CRC24A engine (generator `0x1864CFB`), used for transport blocks.
    #[must_use]
    pub fn crc24a() -> Self {
        Self {
            poly: 0x0186_4CFB,
            order: 24,
        }
    }

    /// Returns the CRC24B engine (generator `0x1800063`), used for codeblocks.
    #[must_use]
    pub fn crc24b() -> Self {
        Self {
            poly: 0x0180_0063,
            order: 24,
        }
    }

    /// Returns the CRC16 engine (generator `0x11021`).
    #[must_use]
    pub fn crc16() -> Self {
        Self {
            poly: 0x0001_1021,
            order: 16,
        }
    }

    /// Returns the CRC8 engine (generator `0x19B`).
    #[must_use]
    pub fn crc8() -> Self {
        Self { poly: 0x19B, order: 8 }
    }

    /// Returns the number of checksum bits this engine appends.
    #[must_use]
    pub fn order(&self) -> usize {
        self.order
    }

    /// Returns the checksum of a payload.
    ///
    /// # Examples
    ///
    /// ```
    /// use lte_turbo::crc::Crc;
    /// use lte_turbo::Bit;
    ///
    /// // A payload of a single one bit leaves the generator itself in the register.
    /// assert_eq!(Crc::crc24a().checksum(&[Bit::One]), 0x0086_4CFB);
    /// ```
    #[must_use]
    pub fn checksum(&self, data: &[Bit]) -> u32 {
        let mask = (1u32 << self.order) - 1;
        let mut remainder = 0u32;
        for &bit in data {
            let top = (remainder >> (self.order - 1)) & 1;
            remainder = (remainder << 1) & mask;
            if top != bit_value(bit) {
                remainder ^= self.poly & mask;
            }
        }
        remainder
    }

    /// Appends the checksum of the current contents of `data` to it, most significant bit
    /// first.
    ///
    /// # Examples
    ///
    /// ```
    /// use lte_turbo::crc::Crc;
    /// use lte_turbo::Bit;
    ///
    /// let crc = Crc::crc24b();
    /// let mut data = vec![Bit::One, Bit::Zero, Bit::One];
    /// crc.attach(&mut data);
    /// assert_eq!(data.len(), 27);
    /// assert!(crc.check(&data));
    /// ```
    pub fn attach(&self, data: &mut Vec<Bit>) {
        let checksum = self.checksum(data);
        for shift in (0 .. self.order).rev() {
            data.push(if (checksum >> shift) & 1 == 1 {
                Bit::One
            } else {
                Bit::Zero
            });
        }
    }

    /// Checks a sequence whose last `self.order()` bits are the checksum of the rest.
    ///
    /// Returns `false` for sequences too short to carry a checksum.
    #[must_use]
    pub fn check(&self, data: &[Bit]) -> bool {
        if data.len() < self.order {
            return false;
        }
        let payload_len = data.len() - self.order;
        let mut received = 0u32;
        for &bit in &data[payload_len ..] {
            received = (received << 1) | bit_value(bit);
        }
        self.checksum(&data[.. payload_len]) == received
    }

    /// Checks the trailing checksum of a sequence, requiring room for a payload.
    ///
    /// # Errors
    ///
    /// Returns an error if `data` holds no more than `self.order()` bits.
    pub fn check_attached(&self, data: &[Bit]) -> Result<bool, Error> {
        if data.len() <= self.order {
            return Err(Error::InvalidInput(format!(
                "Sequence of {} bits cannot carry a payload and a {}-bit checksum",
                data.len(),
                self.order
            )));
        }
        Ok(self.check(data))
    }
}

/// Returns the numeric value of a bit.
fn bit_value(bit: Bit) -> u32 {
    match bit {
        Bit::Zero => 0,
        Bit::One => 1,
    }
}
