//! # Kernel Memory Configuration
//!
//! Compile-time configuration shared by the kernel's physical memory
//! management: the physical memory layout handed to the frame allocator
//! during boot, the frame geometry, and the raw ownership encoding used by
//! the allocator's diagnostics interface.
//!
//! ## Physical Memory Layout
//!
//! ```text
//! Physical Memory Layout:
//! 0x0000_0000 ┌─────────────────────────────────┐
//!             │     Low Memory (< 1MiB)         │
//!             │  (BIOS, VGA, DMA buffers)       │
//! PHYS_LOAD   ├─────────────────────────────────┤ 0x0010_0000 (1 MiB)
//!             │       Kernel Image              │
//!             │   (Text, Data, BSS)             │
//! kernel end  ├─────────────────────────────────┤
//!             │   Early frames (phase 1)        │
//!             │  (mapped by the boot tables)    │
//! EARLY_END   ├─────────────────────────────────┤ 0x0040_0000 (4 MiB)
//!             │   Remaining frames (phase 2)    │
//!             │  (mapped once paging is final)  │
//! PHYS_TOP    └─────────────────────────────────┘ 0x0400_0000 (64 MiB)
//! ```
//!
//! The frame allocator is seeded in two phases: the first covers the frames
//! that are reachable through the boot page tables, the second covers the rest
//! of physical memory once the kernel has installed its final mappings on all
//! cores. See the `kernel-alloc` crate for the allocator itself.
//!
//! ## Usage
//!
//! ```rust
//! use kernel_info::memory::{FRAME_SIZE, MAX_FRAME_COUNT, PHYS_LOAD, PHYS_TOP};
//!
//! let frames = (PHYS_TOP - PHYS_LOAD) / FRAME_SIZE;
//! assert!(frames as usize <= MAX_FRAME_COUNT);
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

pub mod memory;
pub mod owner;
