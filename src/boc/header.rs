//! Bag of cells header codec.

use bitflags::bitflags;
use smallvec::SmallVec;

use super::de::{BocSection, Error, Options};
use super::BocTag;
use crate::cell::{MAX_BIT_LEN, MAX_REF_COUNT};
use crate::util::{number_of_bytes_to_fit, read_be_uint, unlikely, write_be_uint};

bitflags! {
    /// Header flags of the generic BOC format.
    #[derive(Debug, Clone, Copy, Eq, PartialEq)]
    pub struct BocFlags: u8 {
        /// Offsets index is present after the root list.
        const HAS_INDEX = 0b1000_0000;
        /// CRC32C trailer is present after the cells data.
        const HAS_CRC32 = 0b0100_0000;
        /// Index entries carry cache bits.
        const HAS_CACHE_BITS = 0b0010_0000;
    }
}

const RESERVED_FLAGS_SHIFT: u8 = 3;
const RESERVED_FLAGS_MASK: u8 = 0b11;
const REF_SIZE_MASK: u8 = 0b111;

/// Size of the smallest cell record (two descriptor bytes).
const MIN_CELL_SIZE: u64 = 2;

/// Returns the width of reference indices for the specified number of cells.
#[inline]
pub const fn ref_size_for(cell_count: u32) -> usize {
    number_of_bytes_to_fit(cell_count as u64)
}

/// Returns the width of offsets for the specified size of cells data.
#[inline]
pub const fn offset_size_for(total_cells_size: u64) -> usize {
    number_of_bytes_to_fit(total_cells_size)
}

/// Parsed BOC header with slices of the remaining sections.
pub struct BocHeader<'a> {
    tag: BocTag,
    flags: BocFlags,
    reserved_flags: u8,
    ref_size: usize,
    offset_size: usize,
    cell_count: usize,
    roots: SmallVec<[u32; 2]>,
    index: &'a [u8],
    cells: &'a [u8],
    crc: Option<u32>,
}

impl<'a> BocHeader<'a> {
    /// Parses the whole container and splits it into sections.
    ///
    /// The length of each section is checked before it is read.
    /// If the container has a checksum, it is verified before
    /// the root list, the index and the cells are interpreted.
    pub fn decode(data: &'a [u8], options: &Options) -> Result<Self, Error> {
        let mut reader = BocReader::new(data);

        // 4 bytes - tag
        let tag = match BocTag::from_bytes(ok!(reader.read_array::<4>(BocSection::Magic))) {
            Some(tag) => tag,
            None => return Err(Error::UnknownBocTag),
        };

        // 1 byte - flags
        // 1 byte - offset size
        let [flags_byte, offset_size] = ok!(reader.read_array::<2>(BocSection::Header));

        let (flags, reserved_flags, ref_size) = match tag {
            BocTag::Generic => (
                BocFlags::from_bits_truncate(flags_byte),
                (flags_byte >> RESERVED_FLAGS_SHIFT) & RESERVED_FLAGS_MASK,
                (flags_byte & REF_SIZE_MASK) as usize,
            ),
            BocTag::Indexed => (BocFlags::HAS_INDEX, 0, flags_byte as usize),
            BocTag::IndexedCrc32 => (
                BocFlags::HAS_INDEX | BocFlags::HAS_CRC32,
                0,
                flags_byte as usize,
            ),
        };

        if unlikely(flags.contains(BocFlags::HAS_CACHE_BITS) && !flags.contains(BocFlags::HAS_INDEX))
        {
            return Err(Error::InvalidHeader);
        }
        if unlikely(ref_size == 0 || ref_size > std::mem::size_of::<u32>()) {
            return Err(Error::InvalidRefSize);
        }
        let offset_size = offset_size as usize;
        if unlikely(offset_size == 0 || offset_size > std::mem::size_of::<u64>()) {
            return Err(Error::InvalidOffsetSize);
        }

        // {ref_size} bytes - cell count
        // {ref_size} bytes - root count
        // {ref_size} bytes - absent cell count
        // {offset_size} bytes - total cells size
        let counters = ok!(reader.read_bytes(ref_size * 3 + offset_size, BocSection::Counters));
        let (counts, total_cells_size) = counters.split_at(ref_size * 3);
        let mut counts = counts.chunks_exact(ref_size).map(read_be_uint);
        let cell_count = counts.next().unwrap_or_default();
        let root_count = counts.next().unwrap_or_default();
        let absent_count = counts.next().unwrap_or_default();
        let total_cells_size = read_be_uint(total_cells_size);

        // Validate root or absent cells
        if unlikely(root_count == 0) {
            return Err(Error::RootCellNotFound);
        }
        if unlikely(root_count.saturating_add(absent_count) > cell_count) {
            return Err(Error::TooManyRootCells);
        }
        if unlikely(absent_count > 0) {
            return Err(Error::AbsentCellsNotSupported);
        }
        if let Some(min_roots) = options.min_roots {
            if unlikely(root_count < min_roots as u64) {
                return Err(Error::TooFewRootCells);
            }
        }
        if let Some(max_roots) = options.max_roots {
            if unlikely(root_count > max_roots as u64) {
                return Err(Error::TooManyRootCells);
            }
        }

        // NOTE: `cell_count` fits into 4 bytes, so these products fit into u64
        // 2 bytes - descriptor
        // 128 - max data length (including the exotic type byte)
        // MAX_REF_COUNT * {ref_size} - max references
        let max_cell_size = 2 + MAX_BIT_LEN.div_ceil(8) as u64 + (MAX_REF_COUNT * ref_size) as u64;
        if unlikely(
            total_cells_size < cell_count * MIN_CELL_SIZE
                || total_cells_size > cell_count * max_cell_size,
        ) {
            return Err(Error::InvalidTotalSize);
        }

        // {root_count} * {ref_size} - root indices
        let root_list = ok!(reader.read_bytes_u64(root_count * ref_size as u64, BocSection::RootList));

        // {cell_count} * {offset_size} - optional index
        let index = if flags.contains(BocFlags::HAS_INDEX) {
            ok!(reader.read_bytes_u64(cell_count * offset_size as u64, BocSection::Index))
        } else {
            &[]
        };

        // {total_cells_size} - cells
        let cells = ok!(reader.read_bytes_u64(total_cells_size, BocSection::CellData));

        // 4 bytes - optional CRC32C
        let crc_offset = reader.offset();
        let crc = if flags.contains(BocFlags::HAS_CRC32) {
            let crc = ok!(reader.read_array::<4>(BocSection::Checksum));
            Some(u32::from_le_bytes(crc))
        } else {
            None
        };

        if unlikely(reader.remaining() > 0) {
            return Err(Error::TrailingBytes);
        }

        if let Some(crc) = crc {
            if crc32c::crc32c(&data[..crc_offset]) != crc {
                return Err(Error::InvalidChecksum);
            }
        }

        let mut roots = SmallVec::with_capacity(root_count as usize);
        for root_index in root_list.chunks_exact(ref_size).map(read_be_uint) {
            if unlikely(root_index >= cell_count) {
                return Err(Error::RootOutOfBounds);
            }
            roots.push(root_index as u32);
        }

        tracing::debug!(
            cell_count,
            root_count,
            ref_size,
            offset_size,
            total_cells_size,
            has_index = flags.contains(BocFlags::HAS_INDEX),
            has_crc = crc.is_some(),
            "parsed BOC header"
        );

        Ok(Self {
            tag,
            flags,
            reserved_flags,
            ref_size,
            offset_size,
            cell_count: cell_count as usize,
            roots,
            index,
            cells,
            crc,
        })
    }

    /// Container format.
    #[inline]
    pub fn tag(&self) -> BocTag {
        self.tag
    }

    /// Header flags (implied by the tag for legacy formats).
    #[inline]
    pub fn flags(&self) -> BocFlags {
        self.flags
    }

    /// Two reserved flag bits of the generic format.
    #[inline]
    pub fn reserved_flags(&self) -> u8 {
        self.reserved_flags
    }

    /// Cell index size in bytes. Guaranteed to be 4 at max.
    #[inline]
    pub fn ref_size(&self) -> usize {
        self.ref_size
    }

    /// Offset size in bytes. Guaranteed to be 8 at max.
    #[inline]
    pub fn offset_size(&self) -> usize {
        self.offset_size
    }

    /// Number of serialized cells.
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.cell_count
    }

    /// Root indices.
    #[inline]
    pub fn roots(&self) -> &[u32] {
        &self.roots
    }

    /// Offsets index entries (empty if the index is absent).
    pub fn index(&self) -> impl Iterator<Item = u64> + '_ {
        self.index.chunks_exact(self.offset_size).map(read_be_uint)
    }

    /// Concatenated cell records.
    #[inline]
    pub fn cells(&self) -> &'a [u8] {
        self.cells
    }

    /// Verified checksum.
    #[inline]
    pub fn crc(&self) -> Option<u32> {
        self.crc
    }
}

/// Header fields of a single-root container in the generic format.
#[derive(Debug, Clone, Copy)]
pub struct HeaderParams<'a> {
    /// Total number of cells.
    pub cell_count: u32,
    /// Index of the root cell.
    pub root_index: u32,
    /// Size of all cell records in bytes.
    pub total_cells_size: u64,
    /// End offsets of each cell record.
    pub index: Option<&'a [u64]>,
    /// Whether CRC32C trailer will be appended.
    pub has_crc: bool,
    /// Whether index entries are marked as carrying cache bits.
    pub has_cache_bits: bool,
    /// Two reserved flag bits.
    pub reserved_flags: u8,
}

impl HeaderParams<'_> {
    /// Cell index size in bytes.
    #[inline]
    pub fn ref_size(&self) -> usize {
        ref_size_for(self.cell_count)
    }

    /// Offset size in bytes.
    #[inline]
    pub fn offset_size(&self) -> usize {
        offset_size_for(self.total_cells_size)
    }

    /// Length of the encoded header (including the index).
    pub fn encoded_len(&self) -> usize {
        let ref_size = self.ref_size();
        let offset_size = self.offset_size();
        let index_len = self.index.map(<[u64]>::len).unwrap_or_default();

        // 4 bytes - BOC tag
        // 1 byte - flags
        // 1 byte - offset size
        // {ref_size} - cell count
        // {ref_size} - root count
        // {ref_size} - absent cell count
        // {offset_size} - total cells size
        // {ref_size} - root index
        // {index_len} * {offset_size} - optional index
        4 + 2 + ref_size * 4 + offset_size + index_len * offset_size
    }

    /// Writes the header followed by the optional index.
    pub fn encode(&self, target: &mut Vec<u8>) {
        let ref_size = self.ref_size();
        let offset_size = self.offset_size();
        debug_assert!((1..=4).contains(&ref_size));
        debug_assert!((1..=8).contains(&offset_size));

        let mut flags = BocFlags::empty();
        flags.set(BocFlags::HAS_INDEX, self.index.is_some());
        flags.set(BocFlags::HAS_CRC32, self.has_crc);
        flags.set(
            BocFlags::HAS_CACHE_BITS,
            self.has_cache_bits && self.index.is_some(),
        );
        let flags = flags.bits()
            | ((self.reserved_flags & RESERVED_FLAGS_MASK) << RESERVED_FLAGS_SHIFT)
            | ref_size as u8;

        target.reserve(self.encoded_len());
        target.extend_from_slice(&BocTag::Generic.to_bytes());
        target.extend_from_slice(&[flags, offset_size as u8]);
        write_be_uint(target, self.cell_count as u64, ref_size);
        write_be_uint(target, 1, ref_size);
        write_be_uint(target, 0, ref_size);
        write_be_uint(target, self.total_cells_size, offset_size);
        write_be_uint(target, self.root_index as u64, ref_size);

        if let Some(index) = self.index {
            debug_assert_eq!(index.len(), self.cell_count as usize);
            for &offset in index {
                write_be_uint(target, offset, offset_size);
            }
        }
    }
}

/// Bounds-checked cursor over the container bytes.
struct BocReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> BocReader<'a> {
    #[inline(always)]
    const fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    #[inline(always)]
    const fn offset(&self) -> usize {
        self.offset
    }

    #[inline(always)]
    const fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    #[inline(always)]
    const fn require(&self, len: usize) -> bool {
        len <= self.remaining()
    }

    fn read_bytes(&mut self, len: usize, section: BocSection) -> Result<&'a [u8], Error> {
        if unlikely(!self.require(len)) {
            return Err(Error::UnexpectedEof(section));
        }
        let bytes = &self.data[self.offset..self.offset + len];
        self.offset += len;
        Ok(bytes)
    }

    #[inline]
    fn read_bytes_u64(&mut self, len: u64, section: BocSection) -> Result<&'a [u8], Error> {
        match usize::try_from(len) {
            Ok(len) => self.read_bytes(len, section),
            Err(_) => Err(Error::UnexpectedEof(section)),
        }
    }

    fn read_array<const N: usize>(&mut self, section: BocSection) -> Result<[u8; N], Error> {
        let bytes = ok!(self.read_bytes(N, section));
        let mut result = [0u8; N];
        result.copy_from_slice(bytes);
        Ok(result)
    }
}
