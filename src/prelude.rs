//! The `cellboc` prelude.
//!
//! This brings into scope commonly used types.

pub use crate::boc::Boc;
pub use crate::cell::{
    BitString, Cell, CellDescriptor, CellRef, CellType, HashBytes, HashContext,
};
