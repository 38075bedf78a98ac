//! # Locality-aware physical frame allocator
//!
//! [`LocalityFrameAlloc`] hands out 4 KiB frames from one contiguous
//! [`ManagedRange`]. Free frames sit on an address-ordered [`FreeList`];
//! allocated frames are recorded with their owner in a [`FrameRegistry`].
//! Both live behind a single [`SpinLock`] named `kmem`.
//!
//! Allocation is first-fit by ascending address. For a process requester a
//! candidate is only taken if the [`LocalityPolicy`] admits it, i.e. none of
//! its physical neighbors belongs to a different owner. When no free frame
//! qualifies the allocation fails instead of breaking the rule.
//!
//! ```text
//!   index:   0   1   2   3   4   5
//!   owner:   A   A   .   B   .   .      . = free
//!                    ^ rejected for A and B (neighbors A and B)
//!                            ^ first frame admitted for B
//!                                ^ first frame admitted for A or any new pid
//! ```

use crate::bootstrap::BootPhase;
use crate::error::{AllocError, FrameFault, RangeError};
use crate::frame::{ManagedRange, PhysicalAddress};
use crate::free_list::FreeList;
use crate::owner::{Owner, Requester};
use crate::phys_mapper::{PhysMapper, fill_frame};
use crate::policy::LocalityPolicy;
use crate::registry::FrameRegistry;
use kernel_info::memory::MAX_FRAME_COUNT;
use kernel_sync::SpinLock;
use log::{debug, trace, warn};

/// Source of single 4 KiB frames, e.g. for page-table construction.
pub trait FrameAlloc {
    fn alloc_4k(&mut self) -> Option<PhysicalAddress>;

    /// Return a frame obtained from [`alloc_4k`](Self::alloc_4k).
    ///
    /// # Safety
    /// The frame must not be used after this call.
    unsafe fn free_4k(&mut self, pa: PhysicalAddress);
}

/// Construction parameters of a [`LocalityFrameAlloc`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct AllocatorConfig {
    /// Lowest managed address; rounded up to a frame boundary.
    pub start: PhysicalAddress,
    /// Exclusive upper bound; rounded down to a frame boundary.
    pub end: PhysicalAddress,
    pub policy: LocalityPolicy,
}

impl AllocatorConfig {
    #[must_use]
    pub const fn new(start: PhysicalAddress, end: PhysicalAddress) -> Self {
        Self {
            start,
            end,
            policy: LocalityPolicy::STRICT,
        }
    }

    #[must_use]
    pub const fn with_policy(mut self, policy: LocalityPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// Snapshot of the allocator's bookkeeping.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct FrameStats {
    /// Frames in the managed range, seeded or not.
    pub managed: usize,
    pub free: usize,
    /// Frames recorded in the registry.
    pub allocated: usize,
    /// Frames handed out before locality tracking started and never returned.
    pub boot: usize,
}

/// Everything the `kmem` lock protects.
pub(crate) struct FrameState<const N: usize> {
    pub(crate) phase: BootPhase,
    pub(crate) free: FreeList<N>,
    pub(crate) registry: FrameRegistry<N>,
    /// Frames flagged as boot frames in `free`.
    pub(crate) boot_frames: usize,
}

impl<const N: usize> FrameState<N> {
    const fn new() -> Self {
        Self {
            phase: BootPhase::Cold,
            free: FreeList::new(),
            registry: FrameRegistry::new(),
            boot_frames: 0,
        }
    }
}

/// Physical frame allocator that keeps each process's frames away from
/// frames of other processes.
///
/// `N` bounds the number of managed frames; the managed range must fit.
/// The allocator must be bootstrapped (see [`bootstrap_phase1`] and
/// [`bootstrap_phase2`]) before it has anything to hand out.
///
/// With the default capacity the allocator is several hundred KiB large;
/// [`new`](Self::new) is `const` so the kernel can keep it in a `static`.
///
/// [`bootstrap_phase1`]: Self::bootstrap_phase1
/// [`bootstrap_phase2`]: Self::bootstrap_phase2
pub struct LocalityFrameAlloc<M: PhysMapper, const N: usize = MAX_FRAME_COUNT> {
    pub(crate) mapper: M,
    pub(crate) range: ManagedRange,
    pub(crate) policy: LocalityPolicy,
    pub(crate) state: SpinLock<FrameState<N>>,
}

impl<M: PhysMapper, const N: usize> LocalityFrameAlloc<M, N> {
    /// Create an empty allocator for the range in `config`.
    ///
    /// # Errors
    /// Any [`RangeError`] of [`ManagedRange::new`] with capacity `N`.
    pub const fn new(mapper: M, config: AllocatorConfig) -> Result<Self, RangeError> {
        let range = match ManagedRange::new(config.start, config.end, N) {
            Ok(range) => range,
            Err(e) => {
                // Dropping a generic value is not allowed in a const fn.
                core::mem::forget(mapper);
                return Err(e);
            }
        };
        Ok(Self {
            mapper,
            range,
            policy: config.policy,
            state: SpinLock::new("kmem", FrameState::new()),
        })
    }

    #[inline]
    #[must_use]
    pub const fn range(&self) -> ManagedRange {
        self.range
    }

    #[inline]
    #[must_use]
    pub const fn policy(&self) -> LocalityPolicy {
        self.policy
    }

    #[must_use]
    pub fn phase(&self) -> BootPhase {
        self.state.lock().phase
    }

    #[inline]
    #[must_use]
    pub const fn mapper(&self) -> &M {
        &self.mapper
    }

    /// Allocate one frame for `requester`.
    ///
    /// Before phase 2 of the bootstrap completes, the lowest free frame is
    /// handed out as a boot frame without recording an owner.
    ///
    /// # Errors
    /// [`AllocError::Exhausted`] when no frame is free,
    /// [`AllocError::NoEligibleFrame`] when every free frame has a foreign
    /// neighbor.
    ///
    /// # Panics
    /// Escalates [`FrameFault::Corrupted`] if the registry refuses the frame.
    pub fn allocate(&self, requester: Requester) -> Result<PhysicalAddress, AllocError> {
        let mut guard = self.state.lock();
        let FrameState {
            phase,
            free,
            registry,
            boot_frames,
        } = &mut *guard;

        if free.is_empty() {
            debug!("kmem: out of frames ({requester})");
            return Err(AllocError::Exhausted);
        }

        if *phase != BootPhase::Ready {
            let frame = free.pop_first().ok_or(AllocError::Exhausted)?;
            free.mark_boot(frame);
            *boot_frames += 1;
            let pa = self.range.address_of(frame);
            trace!("kmem: boot frame {pa}");
            return Ok(pa);
        }

        let frame_count = self.range.frame_count();
        let Some(frame) =
            free.take_first(|f| self.policy.admits(registry, f, frame_count, requester))
        else {
            warn!(
                "kmem: {} free frames, none admissible for {requester}",
                free.len()
            );
            return Err(AllocError::NoEligibleFrame(requester));
        };

        let pa = self.range.address_of(frame);
        if registry.insert(frame, requester.owner()).is_err() {
            FrameFault::Corrupted(pa).escalate();
        }

        trace!("kmem: {pa} -> {requester}");
        Ok(pa)
    }

    /// [`allocate`](Self::allocate) with the system call's calling convention:
    /// the requester is a raw pid or [`NO_LOCALITY`].
    ///
    /// Returns `None` for negative ids other than [`NO_LOCALITY`] and when the
    /// allocation fails.
    ///
    /// [`NO_LOCALITY`]: kernel_info::owner::NO_LOCALITY
    #[must_use]
    pub fn allocate_raw(&self, requester: i32) -> Option<PhysicalAddress> {
        let Some(requester) = Requester::from_raw(requester) else {
            debug!("kmem: rejected raw requester {requester}");
            return None;
        };
        self.allocate(requester).ok()
    }

    /// Return the frame at `pa` to the free list, overwriting its contents
    /// with the fill pattern.
    ///
    /// Boot frames are taken back in any phase. Every other frame must be
    /// registered, which is only possible after phase 2.
    ///
    /// # Errors
    /// A [`FrameFault`] if `pa` is not the base of a managed frame or the
    /// frame is not currently handed out. Nothing is changed in that case.
    ///
    /// # Safety
    /// The frame must not be accessed by anyone after this call until it is
    /// handed out again.
    pub unsafe fn release(&self, pa: PhysicalAddress) -> Result<(), FrameFault> {
        let frame = self.range.checked_index(pa)?;
        let mut guard = self.state.lock();
        let state = &mut *guard;

        if state.free.contains(frame) {
            return Err(FrameFault::AlreadyFree(pa));
        }
        if state.free.clear_boot(frame) {
            state.boot_frames -= 1;
            trace!("kmem: boot frame {pa} returned");
        } else {
            let Some(owner) = state.registry.remove(frame) else {
                return Err(FrameFault::NotAllocated(pa));
            };
            trace!("kmem: {pa} <- {owner}");
        }

        // SAFETY: the frame is managed and the caller gave up access to it.
        unsafe { fill_frame(&self.mapper, pa) };

        if !state.free.insert(frame) {
            return Err(FrameFault::AlreadyFree(pa));
        }
        Ok(())
    }

    /// Current owner of the frame at `pa`; [`Owner::Unowned`] for free frames,
    /// boot frames and addresses outside the managed range.
    #[must_use]
    pub fn owner_of(&self, pa: PhysicalAddress) -> Owner {
        self.range
            .index_of(pa)
            .map_or(Owner::Unowned, |frame| self.state.lock().registry.owner_of(frame))
    }

    #[must_use]
    pub fn stats(&self) -> FrameStats {
        let state = self.state.lock();
        FrameStats {
            managed: self.range.frame_count(),
            free: state.free.len(),
            allocated: state.registry.len(),
            boot: state.boot_frames,
        }
    }

    /// Call `f` with every free frame, in ascending address order, while
    /// holding the lock.
    pub fn for_each_free(&self, mut f: impl FnMut(PhysicalAddress)) {
        let state = self.state.lock();
        for frame in state.free.iter() {
            f(self.range.address_of(frame));
        }
    }

    /// Allocate on behalf of `requester` through the [`FrameAlloc`] interface.
    #[must_use]
    pub const fn frames_for(&self, requester: Requester) -> RequesterFrames<'_, M, N> {
        RequesterFrames {
            alloc: self,
            requester,
        }
    }
}

/// [`FrameAlloc`] view of a [`LocalityFrameAlloc`] bound to one requester.
pub struct RequesterFrames<'a, M: PhysMapper, const N: usize> {
    alloc: &'a LocalityFrameAlloc<M, N>,
    requester: Requester,
}

impl<M: PhysMapper, const N: usize> RequesterFrames<'_, M, N> {
    #[must_use]
    pub const fn requester(&self) -> Requester {
        self.requester
    }
}

impl<M: PhysMapper, const N: usize> FrameAlloc for RequesterFrames<'_, M, N> {
    fn alloc_4k(&mut self) -> Option<PhysicalAddress> {
        self.alloc.allocate(self.requester).ok()
    }

    unsafe fn free_4k(&mut self, pa: PhysicalAddress) {
        // SAFETY: forwarded from the caller.
        if let Err(fault) = unsafe { self.alloc.release(pa) } {
            fault.escalate();
        }
    }
}
