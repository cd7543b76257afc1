use crate::cell::{Cell, MAX_REF_COUNT};

/// Two descriptor bytes which precede the cell data
/// both in the representation hash and in the serialized record.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[repr(C)]
pub struct CellDescriptor {
    /// `refs + 8 * is_exotic + 32 * level`
    pub d1: u8,
    /// `floor(bits / 8) + ceil(bits / 8)`
    pub d2: u8,
}

impl CellDescriptor {
    /// Bit mask to store the number of references in the descriptor.
    pub const REF_COUNT_MASK: u8 = 0b0000_0111;
    /// Bit mask to store the `is_exotic` flag in the descriptor.
    pub const IS_EXOTIC_MASK: u8 = 0b0000_1000;
    /// Bit mask to store the `store_hashes` flag in the descriptor.
    pub const STORE_HASHES_MASK: u8 = 0b0001_0000;
    /// Level mask shift in the first descriptor byte.
    pub const LEVEL_SHIFT: u8 = 5;

    /// Wraps raw descriptor bytes.
    #[inline(always)]
    pub const fn new(bytes: [u8; 2]) -> Self {
        Self {
            d1: bytes[0],
            d2: bytes[1],
        }
    }

    /// Computes descriptor bytes for the cell.
    ///
    /// NOTE: the exotic type byte is counted as part of the data.
    pub fn for_cell(cell: &Cell) -> Self {
        let ref_count = cell.references().len();
        debug_assert!(ref_count <= MAX_REF_COUNT);

        let is_exotic = cell.cell_type().is_exotic();
        let bit_len = cell.bits().bit_len() + if is_exotic { 8 } else { 0 };

        Self {
            d1: Self::compute_d1(cell.level(), is_exotic, ref_count as u8),
            d2: Self::compute_d2(bit_len),
        }
    }

    /// Computes the first descriptor byte.
    #[inline(always)]
    pub const fn compute_d1(level: u8, is_exotic: bool, ref_count: u8) -> u8 {
        (level << Self::LEVEL_SHIFT) | ((is_exotic as u8) << 3) | (ref_count & Self::REF_COUNT_MASK)
    }

    /// Computes the second descriptor byte.
    #[inline(always)]
    pub const fn compute_d2(bit_len: u16) -> u8 {
        (((bit_len >> 2) as u8) & !0b1) | ((bit_len % 8 != 0) as u8)
    }

    /// Number of child references.
    #[inline(always)]
    pub const fn reference_count(self) -> usize {
        (self.d1 & Self::REF_COUNT_MASK) as usize
    }

    /// Whether the cell has an exotic type byte.
    #[inline(always)]
    pub const fn is_exotic(self) -> bool {
        self.d1 & Self::IS_EXOTIC_MASK != 0
    }

    /// Whether hashes are stored inline. Not supported by this codec.
    #[inline(always)]
    pub const fn store_hashes(self) -> bool {
        self.d1 & Self::STORE_HASHES_MASK != 0
    }

    /// Cell level from the descriptor.
    #[inline(always)]
    pub const fn level(self) -> u8 {
        self.d1 >> Self::LEVEL_SHIFT
    }

    /// Whether the data occupies a whole number of bytes.
    #[inline(always)]
    pub const fn is_aligned(self) -> bool {
        self.d2 & 1 == 0
    }

    /// Data length in bytes (including the exotic type byte).
    #[inline(always)]
    pub const fn byte_len(self) -> u8 {
        (self.d2 & 1) + (self.d2 >> 1)
    }
}
