//! Power-of-two alignment arithmetic for write cursors.

/// Returns `true` if `alignment` can be used as an alignment boundary: non-zero and a
/// power of two.
#[inline]
pub fn is_valid_alignment(alignment: usize) -> bool {
    alignment.is_power_of_two()
}

/// Aligns a position up to the next multiple of the specified alignment.
///
/// If the position is already aligned, it is returned unchanged. Returns `None` when the
/// aligned position does not fit in `usize`.
///
/// # Examples
///
/// ```
/// use fieldpack_bytes::align::align_up;
///
/// assert_eq!(align_up(0, 8), Some(0));
/// assert_eq!(align_up(1, 8), Some(8));
/// assert_eq!(align_up(8, 8), Some(8));
/// assert_eq!(align_up(9, 8), Some(16));
/// assert_eq!(align_up(usize::MAX, 2), None);
/// ```
///
/// # Panics
///
/// This function will panic in debug builds if `alignment` is not a non-zero power of 2.
#[inline]
pub fn align_up(pos: usize, alignment: usize) -> Option<usize> {
    debug_assert!(is_valid_alignment(alignment));
    pos.checked_add(alignment - 1)
        .map(|n| n & !(alignment - 1))
}

/// Number of padding bytes needed to move `pos` onto an `alignment` boundary.
///
/// # Examples
///
/// ```
/// use fieldpack_bytes::align::padding_len;
///
/// assert_eq!(padding_len(0, 4), 0);
/// assert_eq!(padding_len(1, 4), 3);
/// assert_eq!(padding_len(6, 4), 2);
/// assert_eq!(padding_len(5, 1), 0);
/// ```
#[inline]
pub fn padding_len(pos: usize, alignment: usize) -> usize {
    debug_assert!(is_valid_alignment(alignment));
    pos.wrapping_neg() & (alignment - 1)
}

/// Checks if a position lies exactly on an alignment boundary.
///
/// ```
/// use fieldpack_bytes::align::is_aligned;
///
/// assert!(is_aligned(0, 8));
/// assert!(!is_aligned(7, 8));
/// assert!(is_aligned(16, 8));
/// ```
#[inline]
pub fn is_aligned(pos: usize, alignment: usize) -> bool {
    debug_assert!(is_valid_alignment(alignment));
    (pos & (alignment - 1)) == 0
}
