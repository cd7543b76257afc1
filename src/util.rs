//! General stuff.

/// Brings [unlikely](core::intrinsics::unlikely) to stable rust.
#[inline(always)]
pub(crate) const fn unlikely(b: bool) -> bool {
    #[allow(clippy::needless_bool, clippy::bool_to_int_with_if)]
    if (1i32).checked_div(if b { 0 } else { 1 }).is_none() {
        true
    } else {
        false
    }
}

/// Returns the minimal number of bytes (at least 1) required
/// to store the value as a big-endian unsigned integer.
#[inline]
pub const fn number_of_bytes_to_fit(value: u64) -> usize {
    let bytes = 8 - (value.leading_zeros() / 8) as usize;
    if bytes == 0 {
        1
    } else {
        bytes
    }
}

/// Reads an n-byte big-endian unsigned integer.
///
/// NOTE: `data` length must be in range 1..=8.
#[inline]
pub(crate) fn read_be_uint(data: &[u8]) -> u64 {
    debug_assert!((1..=8).contains(&data.len()));

    let mut bytes = [0u8; 8];
    bytes[8 - data.len()..].copy_from_slice(data);
    u64::from_be_bytes(bytes)
}

/// Writes the lowest `size` bytes of the value in big-endian order.
///
/// NOTE: `size` must be in range 1..=8.
#[inline]
pub(crate) fn write_be_uint(target: &mut Vec<u8>, value: u64, size: usize) {
    debug_assert!((1..=8).contains(&size));
    debug_assert!(size == 8 || value >> (size * 8) == 0);

    target.extend_from_slice(&value.to_be_bytes()[8 - size..]);
}

#[cfg(any(feature = "base64", test))]
#[inline]
pub(crate) fn encode_base64<T: AsRef<[u8]>>(data: T) -> String {
    use base64::Engine;
    fn encode_base64_impl(data: &[u8]) -> String {
        base64::engine::general_purpose::STANDARD.encode(data)
    }
    encode_base64_impl(data.as_ref())
}

#[cfg(any(feature = "base64", test))]
#[inline]
pub(crate) fn decode_base64<T: AsRef<[u8]>>(data: T) -> Result<Vec<u8>, base64::DecodeError> {
    use base64::Engine;
    fn decode_base64_impl(data: &[u8]) -> Result<Vec<u8>, base64::DecodeError> {
        base64::engine::general_purpose::STANDARD.decode(data)
    }
    decode_base64_impl(data.as_ref())
}
