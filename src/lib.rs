//! Cell graph hashing and BOC (Bag Of Cells) codec.
//!
//! ## `Cell` vs `CellRef`
//!
//! - [`Cell`] is a node of the graph: an exotic or ordinary type,
//!   up to 1023 bits of payload and up to 7 child references.
//!   Cells are plain values which can be built and modified in place.
//!
//! - [`CellRef`] is a shared pointer to a cell. The same child can be
//!   referenced by several parents, so a tree of cells is a DAG.
//!
//! ## Hashing
//!
//! Representation hash and depth are computed by [`HashContext`], which
//! memoizes intermediate results by cell identity. A context lives only
//! as long as a single computation, so modified cells are always rehashed.
//!
//! ## BOC
//!
//! A cell tree is converted to bytes (and back) via [`Boc`]:
//!
//! ```
//! # use cellboc::prelude::*;
//! let mut bits = BitString::new();
//! bits.store_u32(0xdeadbeef)?;
//! let cell = Cell::ordinary(bits);
//!
//! let encoded = Boc::encode(&cell);
//! let decoded = Boc::decode(&encoded)?;
//! assert_eq!(decoded.repr_hash(), cell.repr_hash());
//! # Ok::<_, Box<dyn std::error::Error>>(())
//! ```
//!
//! [`Cell`]: cell::Cell
//! [`CellRef`]: cell::CellRef
//! [`HashContext`]: cell::HashContext
//! [`Boc`]: boc::Boc

/// Prevents using `From::from` for plain error conversion.
macro_rules! ok {
    ($e:expr $(,)?) => {
        match $e {
            core::result::Result::Ok(val) => val,
            core::result::Result::Err(err) => return core::result::Result::Err(err),
        }
    };
}

pub use self::boc::Boc;
pub use self::cell::{BitString, Cell, CellRef, CellType, HashBytes, HashContext};

pub mod boc;
pub mod cell;
pub mod error;
pub mod prelude;
pub mod util;

#[cfg(feature = "arbitrary")]
pub mod arbitrary;
