use crate::cell::MAX_BIT_LEN;
use crate::error::Error;

const MAX_BYTE_LEN: usize = 128;

/// Bit-packed cell payload.
///
/// Stores up to [`MAX_BIT_LEN`] bits. All bits past the cursor
/// are always kept zeroed, so two strings with the same content
/// are equal byte-for-byte.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct BitString {
    data: [u8; MAX_BYTE_LEN],
    bit_len: u16,
}

impl Default for BitString {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl BitString {
    /// Creates an empty bit string.
    pub const fn new() -> Self {
        Self {
            data: [0; MAX_BYTE_LEN],
            bit_len: 0,
        }
    }

    /// Creates a bit string from the first `bit_len` bits of `data`.
    pub fn from_raw(data: &[u8], bit_len: u16) -> Result<Self, Error> {
        let mut res = Self::new();
        ok!(res.store_raw(data, bit_len));
        Ok(res)
    }

    /// Decodes a top-upped byte array.
    ///
    /// If `aligned` is `false`, the lowest set bit of the last byte
    /// is treated as a padding marker and is excluded from the data.
    pub fn from_top_upped(data: &[u8], aligned: bool) -> Result<Self, Error> {
        if data.len() > MAX_BYTE_LEN {
            return Err(Error::CellOverflow);
        }

        let mut bit_len = (data.len() * 8) as u16;
        if !aligned {
            match data.last() {
                Some(&last) if last != 0 => bit_len -= last.trailing_zeros() as u16 + 1,
                // Padding marker is required for unaligned data
                _ => return Err(Error::InvalidData),
            }
        }

        Self::from_raw(data, bit_len)
    }

    /// Number of used bits (the cursor position).
    #[inline]
    pub const fn bit_len(&self) -> u16 {
        self.bit_len
    }

    /// Returns `true` if no bits were stored.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.bit_len == 0
    }

    /// Number of bits that can still be stored.
    #[inline]
    pub const fn spare_capacity(&self) -> u16 {
        MAX_BIT_LEN - self.bit_len
    }

    /// Returns `true` if the data occupies a whole number of bytes.
    #[inline]
    pub const fn is_aligned(&self) -> bool {
        self.bit_len % 8 == 0
    }

    /// Underlying bytes without the padding marker.
    #[inline]
    pub fn as_raw_data(&self) -> &[u8] {
        &self.data[..self.top_upped_len()]
    }

    /// Length of the top-upped representation in bytes.
    #[inline]
    pub const fn top_upped_len(&self) -> usize {
        self.bit_len.div_ceil(8) as usize
    }

    /// Appends the top-upped representation to the target.
    pub fn write_top_upped(&self, target: &mut Vec<u8>) {
        target.extend_from_slice(self.as_raw_data());

        let rem = self.bit_len % 8;
        if rem > 0 {
            if let Some(last_byte) = target.last_mut() {
                // xxx00000 -> xxx10000
                *last_byte |= 1 << (7 - rem);
            }
        }
    }

    /// Returns the top-upped representation.
    pub fn to_top_upped(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(self.top_upped_len());
        self.write_top_upped(&mut result);
        result
    }

    /// Returns a bit at the specified position.
    pub fn get_bit(&self, index: u16) -> Option<bool> {
        if index < self.bit_len {
            let q = (index / 8) as usize;
            let r = index % 8;
            Some(self.data[q] & (0x80 >> r) != 0)
        } else {
            None
        }
    }

    /// Appends a single bit.
    pub fn store_bit(&mut self, bit: bool) -> Result<(), Error> {
        if self.bit_len >= MAX_BIT_LEN {
            return Err(Error::CellOverflow);
        }
        if bit {
            let q = (self.bit_len / 8) as usize;
            let r = self.bit_len % 8;
            self.data[q] |= 0x80 >> r;
        }
        self.bit_len += 1;
        Ok(())
    }

    /// Appends the specified number of zero bits.
    pub fn store_zeros(&mut self, bits: u16) -> Result<(), Error> {
        if bits > self.spare_capacity() {
            return Err(Error::CellOverflow);
        }
        self.bit_len += bits;
        Ok(())
    }

    /// Appends a byte.
    #[inline]
    pub fn store_u8(&mut self, value: u8) -> Result<(), Error> {
        self.store_raw(&[value], 8)
    }

    /// Appends a big-endian `u16`.
    #[inline]
    pub fn store_u16(&mut self, value: u16) -> Result<(), Error> {
        self.store_raw(&value.to_be_bytes(), 16)
    }

    /// Appends a big-endian `u32`.
    #[inline]
    pub fn store_u32(&mut self, value: u32) -> Result<(), Error> {
        self.store_raw(&value.to_be_bytes(), 32)
    }

    /// Appends a big-endian `u64`.
    #[inline]
    pub fn store_u64(&mut self, value: u64) -> Result<(), Error> {
        self.store_raw(&value.to_be_bytes(), 64)
    }

    /// Appends the lowest `bits` bits of the value, most significant first.
    pub fn store_uint(&mut self, value: u64, bits: u16) -> Result<(), Error> {
        if bits > 64 || bits < 64 && value >> bits != 0 {
            return Err(Error::InvalidData);
        }
        if bits == 0 {
            return Ok(());
        }
        self.store_raw(&(value << (64 - bits)).to_be_bytes(), bits)
    }

    /// Appends all bits of another bit string.
    #[inline]
    pub fn store_bits(&mut self, other: &BitString) -> Result<(), Error> {
        self.store_raw(other.as_raw_data(), other.bit_len)
    }

    /// Appends the first `bits` bits of `data`.
    pub fn store_raw(&mut self, data: &[u8], bits: u16) -> Result<(), Error> {
        if bits > self.spare_capacity() {
            return Err(Error::CellOverflow);
        }
        let byte_len = bits.div_ceil(8) as usize;
        if data.len() < byte_len {
            return Err(Error::CellUnderflow);
        }
        if bits == 0 {
            return Ok(());
        }

        let q = (self.bit_len / 8) as usize;
        let r = self.bit_len % 8;
        if r == 0 {
            self.data[q..q + byte_len].copy_from_slice(&data[..byte_len]);
        } else {
            // yyyxxxxx|xxx00000
            for (i, &byte) in data[..byte_len].iter().enumerate() {
                self.data[q + i] |= byte >> r;
                if let Some(next) = self.data.get_mut(q + i + 1) {
                    *next = byte << (8 - r);
                }
            }
        }
        self.bit_len += bits;
        self.clear_tail();
        Ok(())
    }

    fn clear_tail(&mut self) {
        let q = (self.bit_len / 8) as usize;
        let r = self.bit_len % 8;
        let mut tail = &mut self.data[q..];
        if r > 0 {
            tail[0] &= !(0xff >> r);
            tail = &mut tail[1..];
        }
        tail.fill(0);
    }
}

impl std::fmt::Display for BitString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let data = hex::encode(self.to_top_upped());
        if self.is_aligned() {
            f.write_str(&data)
        } else {
            write!(f, "{data}_")
        }
    }
}

impl std::fmt::Debug for BitString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitString")
            .field("bit_len", &self.bit_len)
            .field("data", &format_args!("{self}"))
            .finish()
    }
}
