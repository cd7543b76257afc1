//! BOC (Bag Of Cells) implementation.

use crate::cell::{Cell, CellRef};

pub use self::header::{BocFlags, BocHeader, HeaderParams};
pub use self::record::{decode_cell_record, encode_cell_record, record_size, CellRecord};

/// BOC decoder implementation.
pub mod de;
/// BOC encoder implementation.
pub mod ser;

mod header;
mod record;
mod topo;

#[cfg(feature = "serde")]
mod serde;

#[cfg(test)]
mod tests;

/// BOC file magic number.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BocTag {
    /// Single root, cells index, no CRC32.
    Indexed,
    /// Single root, cells index, with CRC32.
    IndexedCrc32,
    /// Multiple roots, optional cells index, optional CRC32.
    Generic,
}

impl BocTag {
    const INDEXED: [u8; 4] = [0x68, 0xff, 0x65, 0xf3];
    const INDEXED_CRC32: [u8; 4] = [0xac, 0xc3, 0xa7, 0x28];
    const GENERIC: [u8; 4] = [0xb5, 0xee, 0x9c, 0x72];

    /// Tries to match bytes with BOC tag.
    pub const fn from_bytes(data: [u8; 4]) -> Option<Self> {
        match data {
            Self::GENERIC => Some(Self::Generic),
            Self::INDEXED_CRC32 => Some(Self::IndexedCrc32),
            Self::INDEXED => Some(Self::Indexed),
            _ => None,
        }
    }

    /// Converts BOC tag to bytes.
    pub const fn to_bytes(self) -> [u8; 4] {
        match self {
            Self::Indexed => Self::INDEXED,
            Self::IndexedCrc32 => Self::INDEXED_CRC32,
            Self::Generic => Self::GENERIC,
        }
    }
}

/// BOC (Bag Of Cells) helper.
pub struct Boc;

impl Boc {
    /// Encodes the specified cell tree as BOC with index and CRC32C.
    pub fn encode(cell: &Cell) -> Vec<u8> {
        Self::encode_with(cell, ser::Options::default())
    }

    /// Encodes the specified cell tree as BOC using the specified options.
    pub fn encode_with(cell: &Cell, options: ser::Options) -> Vec<u8> {
        let mut result = Vec::new();
        ser::BocHeader::with_root(cell)
            .with_options(options)
            .encode(&mut result);
        result
    }

    /// Encodes the specified cell tree as BOC and
    /// returns the `base64` encoded bytes as a string.
    #[cfg(any(feature = "base64", test))]
    pub fn encode_base64(cell: &Cell) -> String {
        crate::util::encode_base64(Self::encode(cell))
    }

    /// Decodes a cell from BOC with exactly one root.
    #[inline]
    pub fn decode<T>(data: T) -> Result<CellRef, de::Error>
    where
        T: AsRef<[u8]>,
    {
        fn decode_impl(data: &[u8]) -> Result<CellRef, de::Error> {
            let mut roots = ok!(Boc::decode_ext(data, &de::Options::exact(1)));
            match roots.pop() {
                Some(root) if roots.is_empty() => Ok(root),
                _ => Err(de::Error::RootCellNotFound),
            }
        }
        decode_impl(data.as_ref())
    }

    /// Decodes all root cells from BOC in the order of the root list.
    #[inline]
    pub fn decode_all<T>(data: T) -> Result<Vec<CellRef>, de::Error>
    where
        T: AsRef<[u8]>,
    {
        Self::decode_ext(data.as_ref(), &de::Options::default())
    }

    /// Decodes root cells from BOC using the specified options.
    pub fn decode_ext(data: &[u8], options: &de::Options) -> Result<Vec<CellRef>, de::Error> {
        let header = ok!(BocHeader::decode(data, options));
        let cells = ok!(header.finalize());

        let mut roots = Vec::with_capacity(header.roots().len());
        for &root in header.roots() {
            match cells.get(root) {
                Some(cell) => roots.push(cell),
                None => return Err(de::Error::RootOutOfBounds),
            }
        }

        tracing::debug!(
            len = data.len(),
            cell_count = cells.len(),
            root_count = roots.len(),
            "decoded BOC"
        );
        Ok(roots)
    }

    /// Decodes a `base64` encoded BOC with exactly one root.
    #[cfg(any(feature = "base64", test))]
    pub fn decode_base64<T: AsRef<[u8]>>(data: T) -> Result<CellRef, de::Error> {
        fn decode_base64_impl(data: &[u8]) -> Result<CellRef, de::Error> {
            match crate::util::decode_base64(data) {
                Ok(data) => Boc::decode(data),
                Err(_) => Err(de::Error::InvalidBase64),
            }
        }
        decode_base64_impl(data.as_ref())
    }

    /// Returns `true` if the data starts with a known BOC tag.
    pub fn has_tag(data: &[u8]) -> bool {
        match data.first_chunk::<4>() {
            Some(tag) => BocTag::from_bytes(*tag).is_some(),
            None => false,
        }
    }
}
