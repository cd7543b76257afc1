use smallvec::SmallVec;

pub use super::header::{BocFlags, BocHeader};
use super::record::{decode_cell_record, CellRecord};
use crate::cell::{Cell, CellRef};
use crate::util::unlikely;

/// BOC deserialization options.
#[derive(Debug, Default, Clone)]
pub struct Options {
    /// The minimum allowed root count.
    pub min_roots: Option<usize>,
    /// The maximum allowed root count.
    pub max_roots: Option<usize>,
}

impl Options {
    /// Constructs decoder options to expect exactly the specified number of roots.
    pub const fn exact(number: usize) -> Self {
        Self {
            min_roots: Some(number),
            max_roots: Some(number),
        }
    }
}

impl BocHeader<'_> {
    /// Decodes all cell records and links them into a cell graph.
    ///
    /// Records are resolved from the last to the first one, so each
    /// reference must point to a record with a strictly greater index.
    pub fn finalize(&self) -> Result<ProcessedCells, Error> {
        let ref_size = self.ref_size();
        let cell_count = self.cell_count();

        let mut records = Vec::new();
        if records.try_reserve_exact(cell_count).is_err() {
            return Err(Error::InvalidTotalSize);
        }

        let mut data = self.cells();
        for _ in 0..cell_count {
            let (record, rest) = ok!(decode_cell_record(data, ref_size));
            tracing::trace!(
                index = records.len(),
                cell_type = ?record.cell_type,
                bits = record.bits.bit_len(),
                refs = record.references.len(),
                "decoded cell record"
            );
            records.push(record);
            data = rest;
        }

        // Check that `total_cells_size` is correct
        if unlikely(!data.is_empty()) {
            return Err(Error::InvalidTotalSize);
        }

        let mut res = Vec::with_capacity(cell_count);
        let mut depths = Vec::<u16>::with_capacity(cell_count);

        for (position, record) in records.into_iter().enumerate().rev() {
            let CellRecord {
                cell_type,
                bits,
                references: indices,
            } = record;

            let mut references = SmallVec::<[CellRef; 4]>::new();
            let mut depth = None::<u16>;
            for child_index in indices {
                let child_index = child_index as usize;
                if unlikely(child_index >= cell_count) {
                    return Err(Error::InvalidRef);
                }
                if unlikely(child_index <= position) {
                    return Err(Error::InvalidRefOrder);
                }

                // NOTE: cells are pushed in reverse order
                let rev_index = cell_count - child_index - 1;
                let (Some(child), Some(&child_depth)) = (res.get(rev_index), depths.get(rev_index))
                else {
                    return Err(Error::InvalidRefOrder);
                };

                references.push(CellRef::clone(child));
                depth = Some(depth.map_or(child_depth, |depth| depth.max(child_depth)));
            }

            let depth = match depth {
                Some(depth) => match depth.checked_add(1) {
                    Some(depth) => depth,
                    None => return Err(Error::DepthOverflow),
                },
                None => 0,
            };

            res.push(Cell::from_parts(cell_type, bits, references).into_ref());
            depths.push(depth);
        }

        Ok(ProcessedCells(res))
    }
}

/// Array of processed cells.
pub struct ProcessedCells(Vec<CellRef>);

impl ProcessedCells {
    /// Returns a processed cell by index.
    pub fn get(&self, index: u32) -> Option<CellRef> {
        let rev_index = self.0.len().checked_sub(index as usize + 1)?;
        self.0.get(rev_index).cloned()
    }

    /// Number of processed cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no cells.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Container section which was being read.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BocSection {
    /// Four magic bytes.
    Magic,
    /// Flags and offset size.
    Header,
    /// Cell, root and absent counts and the total cells size.
    Counters,
    /// Root indices.
    RootList,
    /// Offsets index.
    Index,
    /// Concatenated cell records.
    CellData,
    /// CRC32C trailer.
    Checksum,
}

impl std::fmt::Display for BocSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Magic => "magic",
            Self::Header => "header",
            Self::Counters => "counters",
            Self::RootList => "root list",
            Self::Index => "index",
            Self::CellData => "cell data",
            Self::Checksum => "checksum",
        })
    }
}

/// Error type for BOC decoding related errors.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    /// EOF encountered during another operation.
    #[error("unexpected EOF in {0}")]
    UnexpectedEof(BocSection),
    /// Invalid magic bytes.
    #[error("unknown BOC tag")]
    UnknownBocTag,
    /// Invalid BOC header.
    #[error("invalid header")]
    InvalidHeader,
    /// References size is not in range 1..=4.
    #[error("ref index does not fit in `u32` type")]
    InvalidRefSize,
    /// Offset size is not in range 1..=8.
    #[error("cell offset does not fit in `u64` type")]
    InvalidOffsetSize,
    /// Root cell not found.
    #[error("root cell not found")]
    RootCellNotFound,
    /// The number of roots in BOC is greater than expected.
    #[error("too many root cells")]
    TooManyRootCells,
    /// Absent cells are legacy therefore not supported.
    #[error("absent cells are not supported")]
    AbsentCellsNotSupported,
    /// The number of roots in BOC is less than expected.
    #[error("too few root cells")]
    TooFewRootCells,
    /// Total cells size mismatch.
    #[error("invalid total cells size")]
    InvalidTotalSize,
    /// Invalid root cell index.
    #[error("root index out of bounds")]
    RootOutOfBounds,
    /// Input is longer than the container.
    #[error("trailing bytes after the container")]
    TrailingBytes,
    /// Crc mismatch.
    #[error("invalid checksum")]
    InvalidChecksum,
    /// Exotic cell type byte is not recognized.
    #[error("unknown exotic cell type {0}")]
    UnknownCellType(u8),
    /// Suboptimal cells are treated as error.
    #[error("unnormalized cell")]
    UnnormalizedCell,
    /// Failed to parse cell.
    #[error("invalid cell")]
    InvalidCell,
    /// Invalid child reference.
    #[error("cell ref index out of bounds")]
    InvalidRef,
    /// Possible graph loop detected.
    #[error("invalid children order")]
    InvalidRefOrder,
    /// Cell tree is deeper than `u16::MAX`.
    #[error("cell depth overflow")]
    DepthOverflow,
    /// Invalid base64 input.
    #[cfg(any(feature = "base64", test))]
    #[error("invalid base64")]
    InvalidBase64,
}
