//! Physical addresses, dense frame indices and the managed range that
//! translates between them.

use crate::error::{FrameFault, RangeError};
use core::fmt;
use kernel_info::memory::{FRAME_SHIFT, FRAME_SIZE};

/// Physical memory address.
///
/// A thin wrapper around `u64` so that physical addresses cannot be confused
/// with frame numbers, dense indices or virtual addresses.
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PhysicalAddress(u64);

impl PhysicalAddress {
    #[inline]
    #[must_use]
    pub const fn new(v: u64) -> Self {
        Self(v)
    }

    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn is_frame_aligned(self) -> bool {
        self.0 & (FRAME_SIZE - 1) == 0
    }

    /// Round up to the next frame boundary (`PGROUNDUP`); saturates at the
    /// last aligned address instead of wrapping.
    #[inline]
    #[must_use]
    pub const fn align_up_to_frame(self) -> Self {
        match self.0.checked_add(FRAME_SIZE - 1) {
            Some(v) => Self(v & !(FRAME_SIZE - 1)),
            None => Self(u64::MAX & !(FRAME_SIZE - 1)),
        }
    }

    /// Physical frame number, i.e. the address shifted right by [`FRAME_SHIFT`].
    #[inline]
    #[must_use]
    pub const fn frame_number(self) -> u64 {
        self.0 >> FRAME_SHIFT
    }
}

impl fmt::Debug for PhysicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PA(0x{:016X})", self.0)
    }
}

impl fmt::Display for PhysicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}", self.0)
    }
}

impl From<u64> for PhysicalAddress {
    #[inline]
    fn from(v: u64) -> Self {
        Self::new(v)
    }
}

impl From<PhysicalAddress> for u64 {
    #[inline]
    fn from(a: PhysicalAddress) -> Self {
        a.as_u64()
    }
}

/// Dense index of a frame inside a [`ManagedRange`].
///
/// Index `0` is the frame at the start of the range; physical neighbors differ
/// by exactly one.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FrameIndex(u32);

impl FrameIndex {
    #[inline]
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    #[inline]
    #[must_use]
    pub const fn get(self) -> usize {
        self.0 as usize
    }

    /// The physically preceding frame, if this is not the first one.
    #[inline]
    #[must_use]
    pub const fn left(self) -> Option<Self> {
        match self.0.checked_sub(1) {
            Some(i) => Some(Self(i)),
            None => None,
        }
    }

    /// The physically following frame, if it is below `frame_count`.
    #[inline]
    #[must_use]
    pub const fn right(self, frame_count: usize) -> Option<Self> {
        let next = self.0 as usize + 1;
        if next < frame_count {
            Some(Self(self.0 + 1))
        } else {
            None
        }
    }
}

impl fmt::Display for FrameIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The half-open physical range `[start, end)` an allocator is responsible for.
///
/// `start` is rounded up and `end` rounded down to whole frames, so every
/// address inside the range belongs to exactly one whole frame.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ManagedRange {
    start: PhysicalAddress,
    end: PhysicalAddress,
}

impl ManagedRange {
    /// Build a range holding at most `capacity` frames.
    ///
    /// # Errors
    /// [`RangeError::Empty`] if not a single whole frame fits,
    /// [`RangeError::TooLarge`] if the range holds more than `capacity` frames,
    /// [`RangeError::FrameNumberOverflow`] if a frame number does not fit the
    /// `i32` slots of the diagnostics interface.
    pub const fn new(
        start: PhysicalAddress,
        end: PhysicalAddress,
        capacity: usize,
    ) -> Result<Self, RangeError> {
        let start = start.align_up_to_frame();
        let end = PhysicalAddress::new(end.as_u64() & !(FRAME_SIZE - 1));
        if end.as_u64() <= start.as_u64() {
            return Err(RangeError::Empty);
        }

        let frames = (end.as_u64() - start.as_u64()) >> FRAME_SHIFT;
        if frames > capacity as u64 || frames > u32::MAX as u64 {
            return Err(RangeError::TooLarge { frames, capacity });
        }
        if end.frame_number() - 1 > MAX_REPORTED_FRAME_NUMBER {
            return Err(RangeError::FrameNumberOverflow { end });
        }

        Ok(Self { start, end })
    }

    #[inline]
    #[must_use]
    pub const fn start(&self) -> PhysicalAddress {
        self.start
    }

    #[inline]
    #[must_use]
    pub const fn end(&self) -> PhysicalAddress {
        self.end
    }

    /// Number of whole frames in the range.
    #[inline]
    #[must_use]
    pub const fn frame_count(&self) -> usize {
        ((self.end.as_u64() - self.start.as_u64()) >> FRAME_SHIFT) as usize
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, addr: PhysicalAddress) -> bool {
        self.start <= addr && addr < self.end
    }

    /// Dense index of the frame starting at `addr`.
    ///
    /// Returns `None` for misaligned addresses and addresses outside the range.
    #[must_use]
    pub fn index_of(&self, addr: PhysicalAddress) -> Option<FrameIndex> {
        if !addr.is_frame_aligned() || !self.contains(addr) {
            return None;
        }
        let index = (addr.as_u64() - self.start.as_u64()) >> FRAME_SHIFT;
        u32::try_from(index).ok().map(FrameIndex::new)
    }

    /// Like [`index_of`](Self::index_of), but says why an address is rejected.
    ///
    /// # Errors
    /// [`FrameFault::Misaligned`] or [`FrameFault::OutOfRange`].
    pub fn checked_index(&self, addr: PhysicalAddress) -> Result<FrameIndex, FrameFault> {
        if !addr.is_frame_aligned() {
            return Err(FrameFault::Misaligned(addr));
        }
        self.index_of(addr).ok_or(FrameFault::OutOfRange(addr))
    }

    /// Base address of the frame at `index`.
    #[inline]
    #[must_use]
    pub const fn address_of(&self, index: FrameIndex) -> PhysicalAddress {
        PhysicalAddress::new(self.start.as_u64() + ((index.get() as u64) << FRAME_SHIFT))
    }

    /// Physical frame number of the frame at `index` in the diagnostics encoding.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub const fn frame_number_of(&self, index: FrameIndex) -> i32 {
        // `new` rejects ranges with frame numbers above `i32::MAX`.
        self.address_of(index).frame_number() as i32
    }
}

/// Largest physical frame number the diagnostics interface can carry.
const MAX_REPORTED_FRAME_NUMBER: u64 = i32::MAX as u64;

/// Base addresses of the whole frames in `[start, end)`, ascending.
///
/// `start` is rounded up to a frame boundary (`PGROUNDUP`); a trailing
/// partial frame is skipped.
pub fn frames_in(
    start: PhysicalAddress,
    end: PhysicalAddress,
) -> impl Iterator<Item = PhysicalAddress> {
    let first = start.align_up_to_frame().as_u64();
    let count = end.as_u64().saturating_sub(first) / FRAME_SIZE;
    (0..count).map(move |i| PhysicalAddress::new(first + i * FRAME_SIZE))
}

impl fmt::Display for ManagedRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: u64, end: u64) -> ManagedRange {
        ManagedRange::new(start.into(), end.into(), 64).unwrap()
    }

    #[test]
    fn alignment_helpers() {
        assert!(PhysicalAddress::new(0x3000).is_frame_aligned());
        assert!(!PhysicalAddress::new(0x3001).is_frame_aligned());
        assert_eq!(PhysicalAddress::new(0x3001).align_up_to_frame().as_u64(), 0x4000);
        assert_eq!(PhysicalAddress::new(0x4000).align_up_to_frame().as_u64(), 0x4000);
        assert_eq!(PhysicalAddress::new(0x0012_3000).frame_number(), 0x123);
    }

    #[test]
    fn range_rounds_to_whole_frames() {
        let r = range(0x1010, 0x5fff);
        assert_eq!(r.start().as_u64(), 0x2000);
        assert_eq!(r.end().as_u64(), 0x5000);
        assert_eq!(r.frame_count(), 3);
    }

    #[test]
    fn range_rejects_empty_and_oversized() {
        assert_eq!(
            ManagedRange::new(0x1001.into(), 0x2000.into(), 8),
            Err(RangeError::Empty)
        );
        assert_eq!(
            ManagedRange::new(0.into(), 0x10_000.into(), 8),
            Err(RangeError::TooLarge {
                frames: 16,
                capacity: 8
            })
        );
    }

    #[test]
    fn frame_numbers_must_fit_the_dump_encoding() {
        let last_ok = 0x7FFF_FFFF_u64 << FRAME_SHIFT;
        let r = ManagedRange::new(last_ok.into(), (last_ok + FRAME_SIZE).into(), 4).unwrap();
        assert_eq!(r.frame_number_of(FrameIndex::new(0)), i32::MAX);

        let end = PhysicalAddress::new(last_ok + 2 * FRAME_SIZE);
        assert_eq!(
            ManagedRange::new(last_ok.into(), end, 4),
            Err(RangeError::FrameNumberOverflow { end })
        );
    }

    #[test]
    fn range_can_be_built_in_const_context() {
        const R: ManagedRange = match ManagedRange::new(
            PhysicalAddress::new(0x10_0000),
            PhysicalAddress::new(0x10_4000),
            4,
        ) {
            Ok(r) => r,
            Err(_) => panic!("range does not fit"),
        };
        assert_eq!(R.frame_count(), 4);
        assert_eq!(R.frame_number_of(FrameIndex::new(3)), 0x103);
    }

    #[test]
    fn index_translation_round_trips() {
        let r = range(0x10_000, 0x20_000);
        let idx = r.index_of(0x13_000.into()).unwrap();
        assert_eq!(idx.get(), 3);
        assert_eq!(r.address_of(idx).as_u64(), 0x13_000);

        assert_eq!(r.index_of(0x13_008.into()), None, "misaligned");
        assert_eq!(r.index_of(0x0f_000.into()), None, "below range");
        assert_eq!(r.index_of(0x20_000.into()), None, "end is exclusive");
    }

    #[test]
    fn checked_index_reports_the_reason() {
        let r = range(0x10_000, 0x20_000);
        assert_eq!(
            r.checked_index(0x13_008.into()),
            Err(FrameFault::Misaligned(0x13_008.into()))
        );
        assert_eq!(
            r.checked_index(0x30_000.into()),
            Err(FrameFault::OutOfRange(0x30_000.into()))
        );
        assert_eq!(r.checked_index(0x10_000.into()), Ok(FrameIndex::new(0)));
    }

    #[test]
    fn boundary_frames_have_one_neighbor() {
        let r = range(0, 0x3000);
        let first = FrameIndex::new(0);
        let last = FrameIndex::new(2);
        assert_eq!(first.left(), None);
        assert_eq!(first.right(r.frame_count()), Some(FrameIndex::new(1)));
        assert_eq!(last.left(), Some(FrameIndex::new(1)));
        assert_eq!(last.right(r.frame_count()), None);
    }

    #[test]
    fn frames_in_skips_partial_frames() {
        let frames: Vec<u64> = frames_in(0x0800.into(), 0x3800.into())
            .map(PhysicalAddress::as_u64)
            .collect();
        assert_eq!(frames, vec![0x1000, 0x2000]);
    }
}
