//! Export of the allocation registry to caller buffers.
//!
//! The layout matches what the frame-dump system call hands to user space:
//! two parallel `int` arrays holding physical frame numbers and raw owner
//! values, padded with [`UNOWNED`] after the last tracked frame.

use crate::error::DumpError;
use crate::frame_alloc::LocalityFrameAlloc;
use crate::phys_mapper::PhysMapper;
use kernel_info::owner::UNOWNED;
use log::trace;

/// One exported registry row.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DumpEntry {
    /// Physical frame number (`address >> FRAME_SHIFT`).
    pub frame: i32,
    /// Raw owner value.
    pub owner: i32,
}

impl DumpEntry {
    pub const PADDING: Self = Self {
        frame: UNOWNED,
        owner: UNOWNED,
    };
}

impl<M: PhysMapper, const N: usize> LocalityFrameAlloc<M, N> {
    /// Write up to `capacity` registry entries, lowest frame first, into
    /// `frames` and `owners` and pad the remaining slots with `-1`.
    ///
    /// Returns the number of real entries written.
    ///
    /// # Errors
    /// [`DumpError::MissingBuffer`] if a buffer is absent and
    /// [`DumpError::BufferTooSmall`] if one holds fewer than `capacity`
    /// slots. Neither buffer is touched in that case.
    pub fn dump(
        &self,
        frames: Option<&mut [i32]>,
        owners: Option<&mut [i32]>,
        capacity: usize,
    ) -> Result<usize, DumpError> {
        let (Some(frames), Some(owners)) = (frames, owners) else {
            return Err(DumpError::MissingBuffer);
        };
        let len = frames.len().min(owners.len());
        if len < capacity {
            return Err(DumpError::BufferTooSmall { capacity, len });
        }

        let mut written = 0;
        self.for_each_entry(capacity, |slot, entry| {
            frames[slot] = entry.frame;
            owners[slot] = entry.owner;
            written += 1;
        });
        frames[written..capacity].fill(DumpEntry::PADDING.frame);
        owners[written..capacity].fill(DumpEntry::PADDING.owner);

        trace!("kmem: dumped {written} of {capacity} slots");
        Ok(written)
    }

    /// [`dump`](Self::dump) with the system call's calling convention.
    ///
    /// Returns `0` on success and `-1` for null buffers, a negative capacity
    /// or any other dump error.
    ///
    /// # Safety
    /// Non-null `frames` and `owners` must each point to `capacity` writable
    /// `i32`s that nothing else accesses during the call.
    pub unsafe fn dump_raw(&self, frames: *mut i32, owners: *mut i32, capacity: i32) -> i32 {
        let Ok(capacity) = usize::try_from(capacity) else {
            return -1;
        };
        if frames.is_null() || owners.is_null() {
            return -1;
        }

        // SAFETY: non-null and sized by the caller's contract.
        let (frames, owners) = unsafe {
            (
                core::slice::from_raw_parts_mut(frames, capacity),
                core::slice::from_raw_parts_mut(owners, capacity),
            )
        };
        match self.dump(Some(frames), Some(owners), capacity) {
            Ok(_) => 0,
            Err(_) => -1,
        }
    }

    /// Call `f(slot, entry)` for the first `limit` registry entries under the lock.
    fn for_each_entry(&self, limit: usize, mut f: impl FnMut(usize, DumpEntry)) {
        let state = self.state.lock();
        for (slot, entry) in state.registry.iter().take(limit).enumerate() {
            f(
                slot,
                DumpEntry {
                    frame: self.range.frame_number_of(entry.frame),
                    owner: entry.owner.raw(),
                },
            );
        }
    }
}
