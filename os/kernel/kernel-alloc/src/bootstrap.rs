//! Two-phase seeding of the free list.
//!
//! Boot runs before any other execution context exists, so neither phase
//! takes the `kmem` lock: both reach the protected state through
//! [`SpinLock::as_mut_ptr`](kernel_sync::SpinLock::as_mut_ptr) and leave the
//! lock word alone. Everything after phase 2 goes through the lock. The
//! phases take `&self` so a `static` allocator can be bootstrapped in place.
//!
//! ```text
//!   Cold ──phase1(early range)──▶ Early ──phase2(rest of RAM)──▶ Ready
//!                                  │
//!                                  └ allocate() hands out untracked boot frames
//! ```

use crate::error::{BootstrapError, FrameFault};
use crate::frame::{ManagedRange, PhysicalAddress, frames_in};
use crate::frame_alloc::{FrameState, LocalityFrameAlloc};
use crate::phys_mapper::{PhysMapper, fill_frame};
use log::{debug, info};

/// Bootstrap progress of an allocator.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum BootPhase {
    /// Nothing seeded.
    Cold,
    /// Phase 1 done; allocations are not tracked yet.
    Early,
    /// Phase 2 done; locality tracking is active.
    Ready,
}

impl<M: PhysMapper, const N: usize> LocalityFrameAlloc<M, N> {
    /// Seed the frames of `[start, end)` that are usable before the rest of
    /// physical memory is mapped.
    ///
    /// Returns the number of frames added to the free list.
    ///
    /// # Errors
    /// [`BootstrapError::OutOfOrder`] unless the allocator is [`BootPhase::Cold`];
    /// a fault if a frame lies outside the managed range or is seeded twice.
    /// Frames seeded before the fault stay free.
    ///
    /// # Safety
    /// Every frame in the range must be unused memory the allocator may
    /// overwrite and hand out. No other execution context may use the
    /// allocator until [`bootstrap_phase2`](Self::bootstrap_phase2) returns.
    pub unsafe fn bootstrap_phase1(
        &self,
        start: PhysicalAddress,
        end: PhysicalAddress,
    ) -> Result<usize, BootstrapError> {
        // SAFETY: the caller guarantees exclusive use during boot.
        let state = unsafe { &mut *self.state.as_mut_ptr() };
        expect_phase(state, BootPhase::Cold)?;
        info!("kmem: managing {}", self.range);
        // SAFETY: forwarded from the caller.
        let seeded = unsafe { seed(&self.mapper, self.range, state, start, end)? };
        state.phase = BootPhase::Early;
        info!("kmem: phase 1 seeded {seeded} frames from {start}..{end}");
        Ok(seeded)
    }

    /// Clear the registry, seed the frames of `[start, end)` and switch on
    /// locality tracking.
    ///
    /// Frames allocated between the two phases stay boot frames until they
    /// are released.
    ///
    /// # Errors
    /// [`BootstrapError::OutOfOrder`] unless the allocator is [`BootPhase::Early`];
    /// a fault as for [`bootstrap_phase1`](Self::bootstrap_phase1), or
    /// [`FrameFault::InUse`] if the range covers a boot frame.
    ///
    /// # Safety
    /// As for [`bootstrap_phase1`](Self::bootstrap_phase1).
    pub unsafe fn bootstrap_phase2(
        &self,
        start: PhysicalAddress,
        end: PhysicalAddress,
    ) -> Result<usize, BootstrapError> {
        // SAFETY: the caller guarantees exclusive use during boot.
        let state = unsafe { &mut *self.state.as_mut_ptr() };
        expect_phase(state, BootPhase::Early)?;
        state.registry.reset();
        // SAFETY: forwarded from the caller.
        let seeded = unsafe { seed(&self.mapper, self.range, state, start, end)? };
        state.phase = BootPhase::Ready;

        info!(
            "kmem: phase 2 seeded {seeded} frames from {start}..{end}; {} free, {} boot frames",
            state.free.len(),
            state.boot_frames
        );
        Ok(seeded)
    }
}

fn expect_phase<const N: usize>(
    state: &FrameState<N>,
    expected: BootPhase,
) -> Result<(), BootstrapError> {
    if state.phase == expected {
        Ok(())
    } else {
        Err(BootstrapError::OutOfOrder {
            expected,
            actual: state.phase,
        })
    }
}

/// Fill and free every whole frame of `[start, end)`.
unsafe fn seed<M: PhysMapper, const N: usize>(
    mapper: &M,
    range: ManagedRange,
    state: &mut FrameState<N>,
    start: PhysicalAddress,
    end: PhysicalAddress,
) -> Result<usize, FrameFault> {
    let mut seeded = 0;

    for pa in frames_in(start, end) {
        let frame = range.checked_index(pa)?;
        if state.free.contains(frame) {
            return Err(FrameFault::AlreadyFree(pa));
        }
        if state.free.is_boot(frame) {
            return Err(FrameFault::InUse(pa));
        }
        // SAFETY: the caller hands over every frame of the range.
        unsafe { fill_frame(mapper, pa) };
        state.free.insert(frame);
        seeded += 1;
    }

    debug!("kmem: seeded {seeded} frames, {} free", state.free.len());
    Ok(seeded)
}
