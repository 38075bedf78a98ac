//! # Kernel synchronization primitives
//!
//! A single coarse-grained [`SpinLock`] is all the physical memory manager
//! needs: every allocator operation holds it for its whole critical section.
//! The lock is **not** reentrant; acquiring it twice from the same context
//! spins forever.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod spin_lock;

pub use spin_lock::{SpinLock, SpinLockGuard};
