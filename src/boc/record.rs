//! Serialized cell records.

use smallvec::SmallVec;

use super::de::{BocSection, Error};
use crate::cell::{BitString, Cell, CellDescriptor, CellType};
use crate::util::{read_be_uint, unlikely, write_be_uint};

/// Cell record with unresolved reference indices.
#[derive(Debug, Clone)]
pub struct CellRecord {
    /// Cell type (from the exotic type byte).
    pub cell_type: CellType,
    /// Cell payload.
    pub bits: BitString,
    /// Raw indices of child records.
    pub references: SmallVec<[u32; 4]>,
}

/// Decodes a single cell record from the beginning of `data`.
///
/// Returns the record and the remaining bytes.
pub fn decode_cell_record(data: &[u8], ref_size: usize) -> Result<(CellRecord, &[u8]), Error> {
    debug_assert!((1..=4).contains(&ref_size));

    let Some((descriptor, data)) = data.split_first_chunk::<2>() else {
        return Err(Error::UnexpectedEof(BocSection::CellData));
    };
    let descriptor = CellDescriptor::new(*descriptor);

    // Inline hashes are never produced by the encoder
    if unlikely(descriptor.store_hashes()) {
        return Err(Error::InvalidCell);
    }

    // 0b11111111 -> 0b01111111 + 1 = 0b10000000 = byte len 128, max bit len = 1023
    // 0b11111110 -> 0b01111111 = byte len 127, bit len = 1016
    let byte_len = descriptor.byte_len() as usize;
    let ref_count = descriptor.reference_count();

    let total_len = byte_len + ref_count * ref_size;
    if unlikely(data.len() < total_len) {
        return Err(Error::UnexpectedEof(BocSection::CellData));
    }
    let (payload, data) = data.split_at(byte_len);
    let (references, rest) = data.split_at(ref_count * ref_size);

    if !descriptor.is_aligned() {
        // NOTE: unaligned data always has at least one byte
        if let Some(&last) = payload.last() {
            if unlikely(last & 0x7f == 0) {
                return Err(Error::UnnormalizedCell);
            }
        }
    }

    let (cell_type, payload) = if descriptor.is_exotic() {
        match payload.split_first() {
            Some((&ty, payload)) => match CellType::from_byte_exotic(ty) {
                Some(cell_type) => (cell_type, payload),
                None => return Err(Error::UnknownCellType(ty)),
            },
            None => return Err(Error::InvalidCell),
        }
    } else {
        (CellType::Ordinary, payload)
    };

    let bits = match BitString::from_top_upped(payload, descriptor.is_aligned()) {
        Ok(bits) => bits,
        Err(_) => return Err(Error::InvalidCell),
    };

    let references = references
        .chunks_exact(ref_size)
        .map(|index| read_be_uint(index) as u32)
        .collect();

    Ok((
        CellRecord {
            cell_type,
            bits,
            references,
        },
        rest,
    ))
}

/// Writes the cell record with the specified child indices.
pub fn encode_cell_record(cell: &Cell, references: &[u32], ref_size: usize, target: &mut Vec<u8>) {
    debug_assert_eq!(cell.references().len(), references.len());

    let descriptor = cell.descriptor();
    target.extend_from_slice(&[descriptor.d1, descriptor.d2]);
    if cell.is_exotic() {
        target.push(cell.cell_type().to_byte());
    }
    cell.bits().write_top_upped(target);
    for &index in references {
        write_be_uint(target, index as u64, ref_size);
    }
}

/// Returns the size of the encoded cell record.
#[inline]
pub fn record_size(cell: &Cell, ref_size: usize) -> u64 {
    let descriptor = cell.descriptor();
    2 + descriptor.byte_len() as u64 + (descriptor.reference_count() * ref_size) as u64
}
