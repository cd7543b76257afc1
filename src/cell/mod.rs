//! Cell tree implementation.

use std::sync::Arc;

use smallvec::SmallVec;

pub use self::bits::BitString;
pub use self::descriptor::CellDescriptor;
pub use self::hasher::{CellHashInfo, HashContext};

use crate::error::Error;

mod bits;
mod descriptor;
mod hasher;

/// Maximum number of bits in the cell payload.
pub const MAX_BIT_LEN: u16 = 1023;

/// Maximum payload length of an exotic cell (one byte is reserved for its type).
pub const MAX_EXOTIC_BIT_LEN: u16 = MAX_BIT_LEN - 8;

/// Maximum number of child cells (the width of the refs descriptor field).
pub const MAX_REF_COUNT: usize = 7;

/// Shared reference to a cell.
pub type CellRef = Arc<Cell>;

/// Representation hash of an empty ordinary cell.
pub const EMPTY_CELL_HASH: HashBytes = HashBytes([
    0x96, 0xa2, 0x96, 0xd2, 0x24, 0xf2, 0x85, 0xc6, 0x7b, 0xee, 0x93, 0xc3, 0x0f, 0x8a, 0x30, 0x91,
    0x57, 0xf0, 0xda, 0xa3, 0x5d, 0xc5, 0xb8, 0x7e, 0x41, 0x0b, 0x78, 0x63, 0x0a, 0x09, 0xcf, 0xc7,
]);

/// Cell type.
#[derive(Default, Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub enum CellType {
    /// Cell of this type just stores data and references.
    #[default]
    Ordinary,
    /// Exotic cell which was pruned from the original tree of cells
    /// when a Merkle proof has been created.
    PrunedBranch,
    /// Exotic cell with a reference to the cell with a library.
    LibraryReference,
    /// Exotic cell with one hash and one reference.
    MerkleProof,
    /// Exotic cell with two hashes and two references.
    MerkleUpdate,
}

impl CellType {
    /// Returns whether this cell type is not [`CellType::Ordinary`].
    #[inline]
    pub const fn is_exotic(self) -> bool {
        !matches!(self, Self::Ordinary)
    }

    /// Encodes cell type as byte.
    ///
    /// NOTE: only exotic types have a byte on the wire,
    /// `0xff` is returned for ordinary cells.
    pub const fn to_byte(self) -> u8 {
        match self {
            CellType::Ordinary => 0xff,
            CellType::PrunedBranch => 1,
            CellType::LibraryReference => 2,
            CellType::MerkleProof => 3,
            CellType::MerkleUpdate => 4,
        }
    }

    /// Decodes exotic cell type from byte.
    pub const fn from_byte_exotic(byte: u8) -> Option<Self> {
        Some(match byte {
            1 => CellType::PrunedBranch,
            2 => CellType::LibraryReference,
            3 => CellType::MerkleProof,
            4 => CellType::MerkleUpdate,
            _ => return None,
        })
    }
}

/// A node of the cell graph: payload bits and up to [`MAX_REF_COUNT`] children.
///
/// Children are shared, so the same cell may be referenced by several parents.
#[derive(Default, Clone)]
pub struct Cell {
    cell_type: CellType,
    bits: BitString,
    references: SmallVec<[CellRef; 4]>,
}

impl Cell {
    /// Creates a new cell.
    pub fn new<I>(cell_type: CellType, bits: BitString, references: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = CellRef>,
    {
        let mut cell = Self::empty();
        ok!(cell.set_cell_type(cell_type));
        cell.bits = bits;
        ok!(check_bit_len(cell_type, &cell.bits));

        for child in references {
            ok!(cell.push_reference(child));
        }
        Ok(cell)
    }

    /// Creates an empty ordinary cell.
    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates an ordinary cell without references.
    #[inline]
    pub fn ordinary(bits: BitString) -> Self {
        Self {
            cell_type: CellType::Ordinary,
            bits,
            references: SmallVec::new(),
        }
    }

    /// Assembles a cell from parts which are already known to be valid.
    pub(crate) fn from_parts(
        cell_type: CellType,
        bits: BitString,
        references: SmallVec<[CellRef; 4]>,
    ) -> Self {
        debug_assert!(check_bit_len(cell_type, &bits).is_ok());
        debug_assert!(references.len() <= MAX_REF_COUNT);
        Self {
            cell_type,
            bits,
            references,
        }
    }

    /// Wraps this cell into a shared reference.
    #[inline]
    pub fn into_ref(self) -> CellRef {
        Arc::new(self)
    }

    /// Returns the type of this cell.
    #[inline]
    pub const fn cell_type(&self) -> CellType {
        self.cell_type
    }

    /// Returns whether this cell is not [`CellType::Ordinary`].
    #[inline]
    pub const fn is_exotic(&self) -> bool {
        self.cell_type.is_exotic()
    }

    /// Cell payload.
    #[inline]
    pub const fn bits(&self) -> &BitString {
        &self.bits
    }

    /// Child cells in the reference order.
    #[inline]
    pub fn references(&self) -> &[CellRef] {
        &self.references
    }

    /// Returns a child cell by index.
    #[inline]
    pub fn reference(&self, index: usize) -> Option<&Cell> {
        self.references.get(index).map(AsRef::as_ref)
    }

    /// Returns a shared child cell by index.
    #[inline]
    pub fn reference_cloned(&self, index: usize) -> Option<CellRef> {
        self.references.get(index).cloned()
    }

    /// Cell level.
    ///
    /// Always zero: level propagation for exotic cells is not implemented.
    #[inline]
    pub const fn level(&self) -> u8 {
        0
    }

    /// Computes descriptor bytes of this cell.
    #[inline]
    pub fn descriptor(&self) -> CellDescriptor {
        CellDescriptor::for_cell(self)
    }

    /// Replaces the payload.
    pub fn set_bits(&mut self, bits: BitString) -> Result<(), Error> {
        ok!(check_bit_len(self.cell_type, &bits));
        self.bits = bits;
        Ok(())
    }

    /// Replaces the cell type.
    pub fn set_cell_type(&mut self, cell_type: CellType) -> Result<(), Error> {
        ok!(check_bit_len(cell_type, &self.bits));
        self.cell_type = cell_type;
        Ok(())
    }

    /// Appends a child cell.
    pub fn push_reference(&mut self, cell: CellRef) -> Result<(), Error> {
        if self.references.len() >= MAX_REF_COUNT {
            return Err(Error::CellOverflow);
        }
        self.references.push(cell);
        Ok(())
    }

    /// Removes the last child cell.
    #[inline]
    pub fn pop_reference(&mut self) -> Option<CellRef> {
        self.references.pop()
    }

    /// Computes the representation hash of the cell tree.
    pub fn repr_hash(&self) -> HashBytes {
        HashContext::new().hash(self)
    }

    /// Computes the max depth of the cell tree.
    pub fn repr_depth(&self) -> u16 {
        HashContext::new().depth(self)
    }

    /// Returns an object that implements [`Display`] for printing only
    /// the root cell of the cell tree.
    ///
    /// [`Display`]: std::fmt::Display
    #[inline]
    pub fn display_root(&self) -> DisplayCellRoot<'_> {
        DisplayCellRoot(self)
    }

    /// Returns an object that implements [`Display`] for printing
    /// the whole cell tree.
    ///
    /// [`Display`]: std::fmt::Display
    #[inline]
    pub fn display_tree(&self) -> DisplayCellTree<'_> {
        DisplayCellTree(self)
    }
}

impl PartialEq for Cell {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.repr_hash() == other.repr_hash()
    }
}

impl Eq for Cell {}

impl Drop for Cell {
    fn drop(&mut self) {
        if self.references.is_empty() {
            return;
        }

        // Unlink uniquely owned subtrees without recursion
        let mut stack = self.references.drain(..).collect::<Vec<_>>();
        while let Some(child) = stack.pop() {
            if let Some(mut child) = Arc::into_inner(child) {
                stack.extend(child.references.drain(..));
            }
        }
    }
}

impl std::fmt::Debug for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cell")
            .field("ty", &self.cell_type)
            .field("bits", &self.bits)
            .field("references", &self.references)
            .finish()
    }
}

fn check_bit_len(cell_type: CellType, bits: &BitString) -> Result<(), Error> {
    if cell_type.is_exotic() && bits.bit_len() > MAX_EXOTIC_BIT_LEN {
        Err(Error::CellOverflow)
    } else {
        Ok(())
    }
}

/// Type alias for a cell hash.
#[derive(Default, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct HashBytes(pub [u8; 32]);

impl HashBytes {
    /// Array of zero bytes.
    pub const ZERO: Self = Self([0; 32]);

    /// Returns the underlying array.
    #[inline(always)]
    pub const fn as_array(&self) -> &[u8; 32] {
        &self.0
    }

    /// Returns the underlying bytes as a slice.
    #[inline(always)]
    pub const fn as_slice(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl From<[u8; 32]> for HashBytes {
    #[inline(always)]
    fn from(value: [u8; 32]) -> Self {
        Self(value)
    }
}

impl From<HashBytes> for [u8; 32] {
    #[inline(always)]
    fn from(value: HashBytes) -> Self {
        value.0
    }
}

impl AsRef<[u8]> for HashBytes {
    #[inline(always)]
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}

impl std::ops::Deref for HashBytes {
    type Target = [u8; 32];

    #[inline(always)]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for HashBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut output = [0u8; 64];
        // NOTE: output buffer is exactly twice the input size
        if hex::encode_to_slice(self.0, &mut output).is_err() {
            return Err(std::fmt::Error);
        }

        // SAFETY: output is guaranteed to contain only [0-9a-f]
        let output = unsafe { std::str::from_utf8_unchecked(&output) };
        f.write_str(output)
    }
}

impl std::fmt::Debug for HashBytes {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for HashBytes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        if serializer.is_human_readable() {
            let mut output = [0u8; 64];
            if hex::encode_to_slice(self.0, &mut output).is_err() {
                return Err(serde::ser::Error::custom("failed to encode hash"));
            }

            // SAFETY: output is guaranteed to contain only [0-9a-f]
            let output = unsafe { std::str::from_utf8_unchecked(&output) };
            serializer.serialize_str(output)
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for HashBytes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{Error, Visitor};

        struct HashBytesHexVisitor;

        impl<'de> Visitor<'de> for HashBytesHexVisitor {
            type Value = HashBytes;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("hex-encoded byte array of size 32")
            }

            fn visit_str<E: Error>(self, value: &str) -> Result<Self::Value, E> {
                let mut result = HashBytes::ZERO;
                match hex::decode_to_slice(value, &mut result.0) {
                    Ok(()) => Ok(result),
                    Err(_) => Err(Error::invalid_value(
                        serde::de::Unexpected::Str(value),
                        &self,
                    )),
                }
            }
        }

        struct HashBytesRawVisitor;

        impl<'de> Visitor<'de> for HashBytesRawVisitor {
            type Value = HashBytes;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("byte array of size 32")
            }

            fn visit_bytes<E: Error>(self, v: &[u8]) -> Result<Self::Value, E> {
                match <[u8; 32]>::try_from(v) {
                    Ok(bytes) => Ok(HashBytes(bytes)),
                    Err(_) => Err(Error::invalid_length(v.len(), &self)),
                }
            }
        }

        if deserializer.is_human_readable() {
            deserializer.deserialize_str(HashBytesHexVisitor)
        } else {
            deserializer.deserialize_bytes(HashBytesRawVisitor)
        }
    }
}

/// Helper struct to print only the root cell in the cell tree.
#[derive(Clone, Copy)]
pub struct DisplayCellRoot<'a>(&'a Cell);

impl std::fmt::Display for DisplayCellRoot<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cell = self.0;
        if f.alternate() {
            std::fmt::Display::fmt(cell.bits(), f)
        } else {
            write!(
                f,
                "{:?}: {}\nbits: {:>4}, refs: {}, hash: {}",
                cell.cell_type(),
                cell.bits(),
                cell.bits().bit_len(),
                cell.references().len(),
                cell.repr_hash(),
            )
        }
    }
}

/// Helper struct to print all cells in the cell tree.
#[derive(Clone, Copy)]
pub struct DisplayCellTree<'a>(&'a Cell);

impl std::fmt::Display for DisplayCellTree<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ctx = HashContext::new();
        let mut stack = vec![(0, self.0)];

        while let Some((level, cell)) = stack.pop() {
            writeln!(
                f,
                "{:level$}{:?} {} (bits: {}, refs: {}, hash: {})",
                "",
                cell.cell_type(),
                cell.bits(),
                cell.bits().bit_len(),
                cell.references().len(),
                ctx.hash(cell),
            )?;

            for child in cell.references().iter().rev() {
                stack.push((level + 1, child.as_ref()));
            }
        }

        Ok(())
    }
}
