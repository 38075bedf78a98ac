//! # Locality-Aware Physical Frame Allocation
//!
//! This crate manages the kernel's pool of 4 KiB physical frames. Beyond
//! handing out free frames it remembers which process owns each allocated
//! frame and uses that to keep the frames of different processes physically
//! apart: a frame is only given to a process if neither of its neighbors
//! belongs to another process.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              LocalityFrameAlloc                     │
//! │    • allocate / release / owner_of / stats          │
//! │    • bootstrap phases 1 and 2                       │
//! │    • registry dump for the diagnostics syscall      │
//! └─────────┬────────────────────────────┬──────────────┘
//!           │ SpinLock "kmem"            │
//! ┌─────────▼──────────┐      ┌──────────▼──────────────┐
//! │     FreeList       │      │     FrameRegistry       │
//! │ ascending free     │      │ sorted frame → owner    │
//! │ frames, index arena│      │ table, binary search    │
//! └────────────────────┘      └──────────▲──────────────┘
//!                                        │ neighbor owners
//!                             ┌──────────┴──────────────┐
//!                             │     LocalityPolicy      │
//!                             └─────────────────────────┘
//! ```
//!
//! ## Core Components
//!
//! ### Allocator ([`frame_alloc`])
//!
//! [`LocalityFrameAlloc`] owns one contiguous managed range:
//! * **First fit**: candidates are tried in ascending address order.
//! * **Locality**: process requests skip frames next to foreign frames and
//!   fail with [`AllocError::NoEligibleFrame`] rather than break the rule.
//! * **Privileged path**: [`Requester::Unconstrained`] takes the first free
//!   frame and records it as kernel owned.
//! * **Poisoning**: released frames are overwritten with `0x01`.
//!
//! ### Bootstrap ([`bootstrap`])
//!
//! Free memory is seeded in two steps, because only a small window of RAM is
//! usable before the kernel has mapped the rest. Frames allocated between the
//! two steps are boot frames: they have no owner, but can still be released.
//!
//! ### Diagnostics ([`diagnostics`])
//!
//! Exports `(frame number, owner)` pairs to caller buffers.
//!
//! ### Physical Mapper ([`phys_mapper`])
//!
//! Turns physical addresses into writable pointers; only used to fill
//! released frames.
//!
//! ## Usage
//!
//! The default capacity makes the allocator too large for a kernel stack, so
//! it lives in a `static` and is bootstrapped in place:
//!
//! ```rust,no_run
//! use kernel_alloc::{AllocatorConfig, LocalityFrameAlloc, PhysicalAddress};
//! use kernel_alloc::owner::Pid;
//! use kernel_alloc::phys_mapper::OffsetPhysMapper;
//! use kernel_info::memory::{EARLY_END, HHDM_BASE, PHYS_LOAD, PHYS_TOP};
//!
//! static KMEM: LocalityFrameAlloc<OffsetPhysMapper> = match LocalityFrameAlloc::new(
//!     OffsetPhysMapper::new(HHDM_BASE),
//!     AllocatorConfig::new(PhysicalAddress::new(PHYS_LOAD), PhysicalAddress::new(PHYS_TOP)),
//! ) {
//!     Ok(kmem) => kmem,
//!     Err(_) => panic!("physical layout exceeds the allocator capacity"),
//! };
//!
//! // Single context until phase 2 returns.
//! unsafe { KMEM.bootstrap_phase1(PHYS_LOAD.into(), EARLY_END.into())? };
//! // ... map the rest of physical memory ...
//! unsafe { KMEM.bootstrap_phase2(EARLY_END.into(), PHYS_TOP.into())? };
//!
//! let pid = Pid::new(3).ok_or("bad pid")?;
//! let frame = KMEM.allocate(pid.into())?;
//! if let Err(fault) = unsafe { KMEM.release(frame) } {
//!     fault.escalate();
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Integration Points
//!
//! * **kernel-info**: frame size, capacity, fill byte, owner sentinels and
//!   the physical layout of the bootstrap ranges
//! * **kernel-sync**: the `kmem` spin lock

#![cfg_attr(not(any(test, doctest)), no_std)]

pub mod bootstrap;
pub mod diagnostics;
pub mod error;
pub mod frame;
pub mod frame_alloc;
pub mod free_list;
pub mod owner;
pub mod phys_mapper;
pub mod policy;
pub mod registry;

pub use bootstrap::BootPhase;
pub use diagnostics::DumpEntry;
pub use error::{AllocError, BootstrapError, DumpError, FrameFault, RangeError, RegistryError};
pub use frame::{FrameIndex, ManagedRange, PhysicalAddress};
pub use frame_alloc::{AllocatorConfig, FrameAlloc, FrameStats, LocalityFrameAlloc, RequesterFrames};
pub use owner::{Owner, Pid, Requester};
pub use phys_mapper::{OffsetPhysMapper, PhysMapper};
pub use policy::LocalityPolicy;
