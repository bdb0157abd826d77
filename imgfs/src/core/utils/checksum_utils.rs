// SPDX-License-Identifier: MIT

//! Rolling "rotate right, then add" checksums used by FAT directory entries.

/// Word that supports the rotate-then-add step.
pub trait RollingWord: Copy + Default {
    fn ror1(self) -> Self;
    fn add_byte(self, b: u8) -> Self;
}

impl RollingWord for u8 {
    #[inline(always)]
    fn ror1(self) -> Self {
        self.rotate_right(1)
    }
    #[inline(always)]
    fn add_byte(self, b: u8) -> Self {
        self.wrapping_add(b)
    }
}

impl RollingWord for u16 {
    #[inline(always)]
    fn ror1(self) -> Self {
        self.rotate_right(1)
    }
    #[inline(always)]
    fn add_byte(self, b: u8) -> Self {
        self.wrapping_add(b as u16)
    }
}

#[inline(always)]
pub fn accumulate_checksum<T: RollingWord>(sum: &mut T, data: &[u8]) {
    for &b in data {
        *sum = sum.ror1().add_byte(b);
    }
}

#[inline(always)]
pub fn checksum<T: RollingWord>(data: &[u8]) -> T {
    let mut s = T::default();
    accumulate_checksum(&mut s, data);
    s
}

/// Checksum of an 11-byte short name, stored in every LFN slot of the set.
#[inline]
pub fn sfn_checksum(short_name: &[u8; 11]) -> u8 {
    checksum::<u8>(short_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sfn_checksum_known_value() {
        // "SETUP   BIN"
        let mut sum = 0u8;
        for &b in b"SETUP   BIN" {
            sum = (if sum & 1 != 0 { 0x80 } else { 0 }) + (sum >> 1);
            sum = sum.wrapping_add(b);
        }
        assert_eq!(sfn_checksum(b"SETUP   BIN"), sum);
    }

    #[test]
    fn empty_input_is_zero() {
        assert_eq!(checksum::<u8>(&[]), 0);
        assert_eq!(checksum::<u16>(&[]), 0);
    }
}
