use super::header::{ref_size_for, HeaderParams};
use super::record::{encode_cell_record, record_size};
use super::topo;
use crate::cell::{Cell, HashContext};

/// BOC serialization options.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Options {
    /// Whether to include the offsets index.
    pub with_index: bool,
    /// Whether to append CRC32C of the whole container.
    pub with_crc: bool,
    /// Whether to set the cache bits flag (only with index).
    pub with_cache_bits: bool,
    /// Two reserved flag bits.
    pub flags: u8,
}

impl Default for Options {
    #[inline]
    fn default() -> Self {
        Self {
            with_index: true,
            with_crc: true,
            with_cache_bits: false,
            flags: 0,
        }
    }
}

/// BOC file builder.
pub struct BocHeader<'a> {
    root: &'a Cell,
    options: Options,
}

impl<'a> BocHeader<'a> {
    /// Creates a builder for the single-root container with default options.
    #[inline]
    pub fn with_root(root: &'a Cell) -> Self {
        Self {
            root,
            options: Options::default(),
        }
    }

    /// Replaces all options.
    #[inline]
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Includes the offsets index.
    #[inline]
    pub fn with_index(mut self, with_index: bool) -> Self {
        self.options.with_index = with_index;
        self
    }

    /// Includes the CRC32C trailer.
    #[inline]
    pub fn with_crc(mut self, with_crc: bool) -> Self {
        self.options.with_crc = with_crc;
        self
    }

    /// Sets the cache bits flag.
    #[inline]
    pub fn with_cache_bits(mut self, with_cache_bits: bool) -> Self {
        self.options.with_cache_bits = with_cache_bits;
        self
    }

    /// Sets two reserved flag bits.
    #[inline]
    pub fn with_flags(mut self, flags: u8) -> Self {
        self.options.flags = flags;
        self
    }

    /// Appends the encoded container to the target.
    #[inline]
    pub fn encode(self, target: &mut Vec<u8>) {
        self.encode_ext(target);
    }

    /// Appends the encoded container to the target.
    ///
    /// Returns the number of distinct cells hashed during this call.
    pub(crate) fn encode_ext(self, target: &mut Vec<u8>) -> usize {
        let options = self.options;

        // NOTE: hashes are computed only for this call
        let mut ctx = HashContext::new();
        let cells = topo::sort(self.root, &mut ctx);

        let cell_count = cells.len() as u32;
        let ref_size = ref_size_for(cell_count);

        let mut index = Vec::with_capacity(if options.with_index { cells.len() } else { 0 });
        let mut total_cells_size = 0u64;
        for sorted in &cells {
            total_cells_size += record_size(sorted.cell, ref_size);
            if options.with_index {
                index.push(total_cells_size);
            }
        }

        let params = HeaderParams {
            cell_count,
            root_index: 0,
            total_cells_size,
            index: options.with_index.then_some(index.as_slice()),
            has_crc: options.with_crc,
            has_cache_bits: options.with_cache_bits,
            reserved_flags: options.flags,
        };

        tracing::debug!(
            cell_count,
            total_cells_size,
            ref_size,
            offset_size = params.offset_size(),
            hashes_computed = ctx.hashes_computed(),
            with_index = options.with_index,
            with_crc = options.with_crc,
            "serializing BOC"
        );

        let start = target.len();
        let header_len = params.encoded_len();
        target.reserve(header_len + total_cells_size as usize + 4 * options.with_crc as usize);

        params.encode(target);
        for sorted in &cells {
            encode_cell_record(sorted.cell, &sorted.references, ref_size, target);
        }
        debug_assert_eq!(
            (target.len() - start) as u64,
            header_len as u64 + total_cells_size
        );

        if options.with_crc {
            let crc = crc32c::crc32c(&target[start..]);
            target.extend_from_slice(&crc.to_le_bytes());
        }

        ctx.hashes_computed()
    }
}
