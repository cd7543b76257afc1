//! More specific logic for generating arbitrary data.

use arbitrary::{Arbitrary, Result, Unstructured};
use smallvec::SmallVec;

use crate::boc::Boc;
use crate::cell::{BitString, Cell, CellRef, CellType, MAX_BIT_LEN, MAX_EXOTIC_BIT_LEN};

impl<'a> Arbitrary<'a> for BitString {
    fn arbitrary(u: &mut Unstructured<'a>) -> Result<Self> {
        let bit_len = u.int_in_range(0..=MAX_BIT_LEN)?;
        bits_with_len(u, bit_len)
    }

    #[inline]
    fn size_hint(_: usize) -> (usize, Option<usize>) {
        (2, Some(2 + 128))
    }
}

/// [`Arbitrary`] helper for generating trees of only ordinary cells.
#[repr(transparent)]
pub struct OrdinaryCell(pub CellRef);

impl std::fmt::Debug for OrdinaryCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&Boc::encode(&self.0), f)
    }
}

impl std::ops::Deref for OrdinaryCell {
    type Target = Cell;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<OrdinaryCell> for CellRef {
    #[inline]
    fn from(value: OrdinaryCell) -> Self {
        value.0
    }
}

impl<'a> Arbitrary<'a> for OrdinaryCell {
    fn arbitrary(u: &mut Unstructured<'a>) -> Result<Self> {
        let bits = u.arbitrary::<BitString>()?;
        let references = arbitrary_children(u, |u| Ok(u.arbitrary::<OrdinaryCell>()?.0))?;
        Ok(Self(
            Cell::from_parts(CellType::Ordinary, bits, references).into_ref(),
        ))
    }

    #[inline]
    fn size_hint(_: usize) -> (usize, Option<usize>) {
        (3, None)
    }
}

/// [`Arbitrary`] helper for generating trees of cells of any type.
///
/// NOTE: the payload of exotic cells is not validated against their type.
#[repr(transparent)]
pub struct AnyCell(pub CellRef);

impl std::fmt::Debug for AnyCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&Boc::encode(&self.0), f)
    }
}

impl From<AnyCell> for CellRef {
    #[inline]
    fn from(value: AnyCell) -> Self {
        value.0
    }
}

impl<'a> Arbitrary<'a> for AnyCell {
    fn arbitrary(u: &mut Unstructured<'a>) -> Result<Self> {
        let cell_type = u.arbitrary::<CellType>()?;
        let max_bit_len = if cell_type.is_exotic() {
            MAX_EXOTIC_BIT_LEN
        } else {
            MAX_BIT_LEN
        };
        let bit_len = u.int_in_range(0..=max_bit_len)?;
        let bits = bits_with_len(u, bit_len)?;
        let references = arbitrary_children(u, |u| Ok(u.arbitrary::<AnyCell>()?.0))?;
        Ok(Self(Cell::from_parts(cell_type, bits, references).into_ref()))
    }

    #[inline]
    fn size_hint(_: usize) -> (usize, Option<usize>) {
        (4, None)
    }
}

fn bits_with_len(u: &mut Unstructured<'_>, bit_len: u16) -> Result<BitString> {
    let data = u.bytes(bit_len.div_ceil(8) as usize)?;
    BitString::from_raw(data, bit_len).map_err(|_| arbitrary::Error::IncorrectFormat)
}

fn arbitrary_children<'a, F>(
    u: &mut Unstructured<'a>,
    mut child: F,
) -> Result<SmallVec<[CellRef; 4]>>
where
    F: FnMut(&mut Unstructured<'a>) -> Result<CellRef>,
{
    let refs = u.int_in_range(0..=4u8)?;

    let mut children = SmallVec::<[CellRef; 4]>::new();
    for i in 0..refs {
        if i > 0 {
            // Allow to reuse cells
            if let Some(i) = u.int_in_range(0..=i)?.checked_sub(1) {
                if let Some(cell) = children.get(i as usize).cloned() {
                    children.push(cell);
                    continue;
                }
            }
        }
        children.push(child(u)?);
    }
    Ok(children)
}
