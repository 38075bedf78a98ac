//! Error types of the frame allocator.
//!
//! [`AllocError`] is an ordinary, recoverable outcome. [`FrameFault`] is an
//! invariant violation: the allocator reports it instead of halting, and the
//! host decides how to escalate it (normally [`FrameFault::escalate`]).

use crate::bootstrap::BootPhase;
use crate::frame::PhysicalAddress;
use crate::owner::Requester;

/// Allocation failed; nothing was changed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AllocError {
    #[error("out of physical frames")]
    Exhausted,
    /// Free frames exist, but every one of them has a foreign neighbor.
    #[error("no free frame satisfies the locality policy for {0}")]
    NoEligibleFrame(Requester),
}

/// Fatal allocator fault. Continuing after one means running with a corrupt
/// view of physical memory.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameFault {
    #[error("frame address {0} is not frame aligned")]
    Misaligned(PhysicalAddress),
    #[error("frame address {0} is outside the managed range")]
    OutOfRange(PhysicalAddress),
    /// The frame is neither registered nor a boot frame: release of a frame
    /// that was never handed out, or corruption.
    #[error("frame {0} is not allocated")]
    NotAllocated(PhysicalAddress),
    #[error("frame {0} is already free")]
    AlreadyFree(PhysicalAddress),
    /// Seeding reached a frame that is still handed out.
    #[error("frame {0} is still in use")]
    InUse(PhysicalAddress),
    /// The registry refused a frame that was just taken off the free list.
    #[error("allocation registry rejected frame {0}")]
    Corrupted(PhysicalAddress),
}

impl FrameFault {
    /// Default escalation: log the fault and panic.
    #[cold]
    #[track_caller]
    pub fn escalate(self) -> ! {
        log::error!("kmem: {self}");
        panic!("kmem: {self}");
    }
}

/// Registry mutation rejected; always a sign of corrupted bookkeeping.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("allocation registry is full")]
    Full,
    #[error("frame is already registered")]
    Duplicate,
}

/// The managed range cannot be represented.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    #[error("managed range holds no whole frame")]
    Empty,
    #[error("managed range holds {frames} frames, capacity is {capacity}")]
    TooLarge { frames: u64, capacity: usize },
    #[error("managed range ends at {end}, past the frame numbers diagnostics can report")]
    FrameNumberOverflow { end: PhysicalAddress },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BootstrapError {
    #[error("bootstrap step expects phase {expected:?}, allocator is in {actual:?}")]
    OutOfOrder { expected: BootPhase, actual: BootPhase },
    #[error(transparent)]
    Fault(#[from] FrameFault),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DumpError {
    #[error("diagnostics buffer missing")]
    MissingBuffer,
    #[error("diagnostics buffer holds {len} entries, {capacity} requested")]
    BufferTooSmall { capacity: usize, len: usize },
}
