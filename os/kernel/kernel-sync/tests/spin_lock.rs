use kernel_sync::SpinLock;
use std::{panic, thread};

#[test]
fn basic_lock_and_raii() {
    let l = SpinLock::new("counter", 0_u32);

    {
        let mut g = l.lock();
        *g = 41;
        assert!(l.is_locked());
    }

    // previous drop must have unlocked
    assert!(!l.is_locked());
    {
        let mut g = l.lock();
        *g += 1;
        assert_eq!(*g, 42);
    }
}

#[test]
fn try_lock_fails_while_held() {
    let l = SpinLock::new("kmem", 1u8);

    let g1 = l.try_lock();
    assert!(g1.is_some());
    assert_eq!(**g1.as_ref().unwrap(), 1);

    assert!(l.try_lock().is_none());

    drop(g1);
    assert!(l.try_lock().is_some());
}

#[test]
fn name_is_reported_by_lock_and_guard() {
    let l = SpinLock::new("kmem", ());
    assert_eq!(l.name(), "kmem");
    assert_eq!(l.lock().lock_name(), "kmem");
    let dbg = format!("{l:?}");
    assert!(dbg.contains("kmem"), "{dbg}");
}

#[test]
fn with_lock_works_and_unlocks() {
    let l = SpinLock::new("s", String::from("a"));
    let len = l.with_lock(|s| {
        s.push('b');
        s.len()
    });
    assert_eq!(len, 2);

    let got = l.with_lock(|s| s.clone());
    assert_eq!(got, "ab");
}

#[test]
fn raw_pointer_bypasses_the_lock() {
    static BOOT: SpinLock<u32> = SpinLock::new("boot", 1);
    unsafe { *BOOT.as_mut_ptr() += 1 };
    assert!(!BOOT.is_locked());
    assert_eq!(*BOOT.lock(), 2);

    let l = SpinLock::new("boot", vec![1, 2, 3]);
    unsafe { (*l.as_mut_ptr()).push(4) };
    assert!(!l.is_locked());
    assert_eq!(l.lock().as_slice(), &[1, 2, 3, 4]);
    assert_eq!(l.into_inner(), vec![1, 2, 3, 4]);
}

#[test]
fn contended_increments_are_exact_and_exclusive() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};

    let threads = 8;
    let iters = 5_000;

    let lock = Arc::new(SpinLock::new("contended", 0usize));
    let in_cs = Arc::new(AtomicUsize::new(0));
    let start = Arc::new(Barrier::new(threads));

    let mut handles = Vec::with_capacity(threads);
    for _ in 0..threads {
        let lock = Arc::clone(&lock);
        let in_cs = Arc::clone(&in_cs);
        let start = Arc::clone(&start);
        handles.push(thread::spawn(move || {
            start.wait();
            for _ in 0..iters {
                lock.with_lock(|v| {
                    let prev = in_cs.fetch_add(1, Ordering::SeqCst);
                    assert_eq!(prev, 0, "mutual exclusion violated");
                    *v += 1;
                    in_cs.fetch_sub(1, Ordering::SeqCst);
                });

                // yield only AFTER releasing the lock to reduce convoy effects
                thread::yield_now();
            }
        }));
    }

    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(lock.with_lock(|v| *v), threads * iters);
    assert_eq!(in_cs.load(Ordering::SeqCst), 0);
}

#[test]
fn lock_is_released_on_panic() {
    let l = SpinLock::new("panicky", 0u32);

    let res = panic::catch_unwind(panic::AssertUnwindSafe(|| {
        l.with_lock(|v| {
            *v = 123;
            panic!("boom");
        });
    }));
    assert!(res.is_err(), "expected panic");

    assert_eq!(l.with_lock(|v| *v), 123);
}

#[test]
fn spinlock_is_sync_for_send_t() {
    fn takes_sync<S: Sync>(_s: &S) {}
    let l = SpinLock::new("sync", 0u8);
    takes_sync(&l);
}
