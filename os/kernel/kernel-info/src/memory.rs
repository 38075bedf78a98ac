//! # Memory Layout

/// Size of a physical frame in bytes.
pub const FRAME_SIZE: u64 = 4096;

/// log2([`FRAME_SIZE`]); shifting a physical address right by this yields its frame number.
pub const FRAME_SHIFT: u32 = 12;

/// Upper bound on the number of frames a single allocator instance manages.
///
/// This also bounds the allocation registry, which holds at most one entry per frame.
pub const MAX_FRAME_COUNT: usize = 16384;

/// Byte written over every frame when it is released, to make
/// use-after-free accesses show up as garbage instead of stale data.
pub const FRAME_FILL_BYTE: u8 = 0x01;

/// Where the kernel image is placed in *physical* memory.
///
/// Nothing below this address is ever handed to the frame allocator.
pub const PHYS_LOAD: u64 = 0x0010_0000; // 1 MiB

/// End of the physical range reachable through the boot page tables.
///
/// Frames between the end of the kernel image and this address are seeded in
/// bootstrap phase 1; frames above it in phase 2.
pub const EARLY_END: u64 = 0x0040_0000; // 4 MiB

/// Top of usable physical memory (exclusive).
pub const PHYS_TOP: u64 = 0x0400_0000; // 64 MiB

/// A simple Higher Half Direct Map (HHDM) base.
/// Anything you map at [`HHDM_BASE`] + `pa` lets the kernel
/// access physical memory via a fixed offset.
pub const HHDM_BASE: u64 = 0xffff_8880_0000_0000;

const _: () = {
    assert!(FRAME_SIZE == 1 << FRAME_SHIFT);
    assert!(PHYS_LOAD.is_multiple_of(FRAME_SIZE));
    assert!(EARLY_END.is_multiple_of(FRAME_SIZE));
    assert!(PHYS_TOP.is_multiple_of(FRAME_SIZE));
    assert!(PHYS_LOAD < EARLY_END && EARLY_END < PHYS_TOP);
    assert!(((PHYS_TOP - PHYS_LOAD) / FRAME_SIZE) as usize <= MAX_FRAME_COUNT);
};
