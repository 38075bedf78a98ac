//! # Access to the bytes of a physical frame
//!
//! The allocator only ever touches frame contents for one reason: released
//! frames are overwritten with [`FRAME_FILL_BYTE`] so that dangling accesses
//! read garbage instead of stale data. To do that it has to turn a physical
//! address into something it can write through, and how that works depends on
//! the environment:
//!
//! - **Kernel**: physical memory is visible at a fixed offset (a higher-half
//!   direct map); [`OffsetPhysMapper`] adds that offset.
//! - **Tests**: a heap buffer stands in for RAM and the mapper indexes into it.
//!
//! ## Example
//! ```rust
//! use kernel_alloc::phys_mapper::{OffsetPhysMapper, PhysMapper};
//! use kernel_info::memory::HHDM_BASE;
//!
//! let mapper = OffsetPhysMapper::new(HHDM_BASE);
//! assert_eq!(mapper.offset(), HHDM_BASE);
//! ```

use crate::frame::PhysicalAddress;
use kernel_info::memory::{FRAME_FILL_BYTE, FRAME_SIZE};

/// Raw contents of one frame.
pub type FrameBytes = [u8; FRAME_SIZE as usize];

/// Converts physical frame addresses to writable memory in the current
/// address space.
///
/// # Safety
/// Implementors guarantee that for every frame the allocator manages,
/// [`frame_mut`](Self::frame_mut) returns a pointer to `FRAME_SIZE` writable
/// bytes that stay mapped for as long as the mapper is alive.
pub unsafe trait PhysMapper {
    /// Pointer to the first byte of the frame at `pa`.
    ///
    /// # Safety
    /// `pa` must be the frame-aligned base of a frame the allocator manages.
    unsafe fn frame_mut(&self, pa: PhysicalAddress) -> *mut FrameBytes;
}

/// Overwrite the whole frame at `pa` with [`FRAME_FILL_BYTE`].
///
/// # Safety
/// - The requirements of [`PhysMapper::frame_mut`] hold for `pa`.
/// - Nothing else reads or writes the frame while it is being filled.
pub(crate) unsafe fn fill_frame<M: PhysMapper>(mapper: &M, pa: PhysicalAddress) {
    unsafe {
        let frame = mapper.frame_mut(pa);
        frame.cast::<u8>().write_bytes(FRAME_FILL_BYTE, FRAME_SIZE as usize);
    }
}

/// [`PhysMapper`] for kernels that map all physical memory at a fixed virtual
/// offset (a higher-half direct map, HHDM).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct OffsetPhysMapper {
    offset: u64,
}

impl OffsetPhysMapper {
    /// # Example
    /// ```rust
    /// # use kernel_alloc::phys_mapper::OffsetPhysMapper;
    /// let identity = OffsetPhysMapper::new(0);
    /// assert_eq!(identity.offset(), 0);
    /// ```
    #[must_use]
    pub const fn new(offset: u64) -> Self {
        Self { offset }
    }

    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.offset
    }
}

// SAFETY: the owner of the direct map guarantees it covers every managed frame.
unsafe impl PhysMapper for OffsetPhysMapper {
    unsafe fn frame_mut(&self, pa: PhysicalAddress) -> *mut FrameBytes {
        (self.offset + pa.as_u64()) as *mut FrameBytes
    }
}
