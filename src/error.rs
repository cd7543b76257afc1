//! Common error types.

/// Error type for cell related errors.
#[derive(Debug, Clone, Copy, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    /// There were not enough bits in the bit string.
    #[error("cell underflow")]
    CellUnderflow,
    /// There were not enough bits or refs capacity in the cell.
    #[error("cell overflow")]
    CellOverflow,
    /// Data does not satisfy some constraints.
    #[error("invalid data")]
    InvalidData,
}
