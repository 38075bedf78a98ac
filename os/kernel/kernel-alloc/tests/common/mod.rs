#![allow(dead_code)]

use kernel_alloc::phys_mapper::{FrameBytes, PhysMapper};
use kernel_alloc::{AllocatorConfig, LocalityFrameAlloc, LocalityPolicy, PhysicalAddress};
use kernel_info::memory::FRAME_SIZE;
use std::cell::UnsafeCell;

pub const BASE: u64 = 0x10_0000;

#[repr(C, align(4096))]
struct Page(UnsafeCell<FrameBytes>);

/// Heap pages posing as physical memory at [`BASE`].
pub struct Ram {
    pages: Box<[Page]>,
}

// SAFETY: frames are only written through the allocator, under its lock.
unsafe impl Sync for Ram {}

impl Ram {
    pub fn new(frames: usize) -> Self {
        Self {
            pages: (0..frames)
                .map(|_| Page(UnsafeCell::new([0; FRAME_SIZE as usize])))
                .collect(),
        }
    }

    fn page(&self, pa: PhysicalAddress) -> &Page {
        &self.pages[usize::try_from((pa.as_u64() - BASE) / FRAME_SIZE).unwrap()]
    }

    pub fn read(&self, pa: PhysicalAddress) -> FrameBytes {
        unsafe { *self.page(pa).0.get() }
    }

    pub fn write(&self, pa: PhysicalAddress, byte: u8) {
        unsafe { (*self.page(pa).0.get()).fill(byte) }
    }
}

unsafe impl PhysMapper for Ram {
    unsafe fn frame_mut(&self, pa: PhysicalAddress) -> *mut FrameBytes {
        self.page(pa).0.get()
    }
}

pub fn pa(frame: u64) -> PhysicalAddress {
    PhysicalAddress::new(BASE + frame * FRAME_SIZE)
}

/// Allocator over `frames` frames, all seeded in phase 2.
pub fn ready<const N: usize>(frames: u64, policy: LocalityPolicy) -> LocalityFrameAlloc<Ram, N> {
    let config = AllocatorConfig::new(pa(0), pa(frames)).with_policy(policy);
    let kmem = LocalityFrameAlloc::new(Ram::new(usize::try_from(frames).unwrap()), config)
        .expect("range fits");
    unsafe {
        kmem.bootstrap_phase1(pa(0), pa(0)).unwrap();
        kmem.bootstrap_phase2(pa(0), pa(frames)).unwrap();
    }
    kmem
}

/// Registry contents as `(frame number, owner)` pairs.
pub fn registry<const N: usize>(kmem: &LocalityFrameAlloc<Ram, N>) -> Vec<(i32, i32)> {
    let mut frames = vec![0; N];
    let mut owners = vec![0; N];
    let n = kmem
        .dump(Some(frames.as_mut_slice()), Some(owners.as_mut_slice()), N)
        .unwrap();
    frames.into_iter().zip(owners).take(n).collect()
}

/// No two physically adjacent frames belong to different processes.
pub fn assert_locality(entries: &[(i32, i32)]) {
    for w in entries.windows(2) {
        let ((f0, o0), (f1, o1)) = (w[0], w[1]);
        if f1 == f0 + 1 && o0 >= 0 && o1 >= 0 {
            assert_eq!(o0, o1, "frames {f0} and {f1} belong to pids {o0} and {o1}");
        }
    }
}
