//! # Raw Ownership Encoding
//!
//! Frame ownership crosses the kernel/user boundary as plain integers: the
//! diagnostics system call fills an `int` array of owners. Non-negative
//! values are process identifiers; the negative values below are sentinels.

/// Owner value of a free frame.
///
/// Also used to pad unused diagnostic slots.
pub const UNOWNED: i32 = -1;

/// Pseudo-owner requesting an allocation exempt from the locality policy.
///
/// Frames allocated this way are reported with this owner value.
pub const NO_LOCALITY: i32 = -2;

const _: () = {
    assert!(UNOWNED < 0);
    assert!(NO_LOCALITY < 0);
    assert!(UNOWNED != NO_LOCALITY);
};
