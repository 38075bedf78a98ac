use crate::frame::FrameIndex;

/// Descriptor stored for every frame of the arena.
///
/// Only frames on the free list carry meaningful links; `linked` tells the two
/// states apart so membership tests are O(1). `boot` marks frames handed out
/// before the registry existed and is never set on a linked frame.
#[derive(Copy, Clone, Debug)]
struct FreeNode {
    /// Next free frame in ascending order (or `None` at the tail).
    next: Option<FrameIndex>,
    linked: bool,
    boot: bool,
}

impl FreeNode {
    const UNLINKED: Self = Self {
        next: None,
        linked: false,
        boot: false,
    };

    const fn linked(next: Option<FrameIndex>) -> Self {
        Self {
            next,
            linked: true,
            boot: false,
        }
    }
}

/// Singly linked, address-ordered set of free frames.
///
/// The links live in a preallocated arena indexed by [`FrameIndex`] rather
/// than inside the free frames, so no freed memory is ever reinterpreted as
/// list storage.
///
/// # Invariants
/// - Following `next` from `head` visits every linked frame exactly once, in
///   strictly ascending order, and ends at `tail`.
/// - `len` equals the number of linked frames.
/// - Every frame index passed in is `< N`.
pub struct FreeList<const N: usize> {
    nodes: [FreeNode; N],
    head: Option<FrameIndex>,
    tail: Option<FrameIndex>,
    len: usize,
}

impl<const N: usize> Default for FreeList<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> FreeList<N> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            nodes: [FreeNode::UNLINKED; N],
            head: None,
            tail: None,
            len: 0,
        }
    }

    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    #[inline]
    #[must_use]
    pub const fn first(&self) -> Option<FrameIndex> {
        self.head
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, frame: FrameIndex) -> bool {
        self.nodes[frame.get()].linked
    }

    #[inline]
    #[must_use]
    pub fn is_boot(&self, frame: FrameIndex) -> bool {
        self.nodes[frame.get()].boot
    }

    /// Flag an unlinked `frame` as handed out without a registry entry.
    ///
    /// Returns `false` (and changes nothing) if the frame is on the list.
    pub fn mark_boot(&mut self, frame: FrameIndex) -> bool {
        let node = &mut self.nodes[frame.get()];
        if node.linked {
            return false;
        }
        node.boot = true;
        true
    }

    /// Clear the boot flag of `frame`; returns whether it was set.
    pub fn clear_boot(&mut self, frame: FrameIndex) -> bool {
        core::mem::replace(&mut self.nodes[frame.get()].boot, false)
    }

    /// Free frames in ascending order.
    pub fn iter(&self) -> FreeIter<'_, N> {
        FreeIter {
            list: self,
            cursor: self.head,
        }
    }

    /// Insert `frame` at its address-ordered position, dropping any boot flag.
    ///
    /// Returns `false` (and changes nothing) if the frame is already free.
    /// Appending past the current tail is O(1), so seeding a range in
    /// ascending order is linear overall; any other insert scans from the head.
    pub fn insert(&mut self, frame: FrameIndex) -> bool {
        if self.contains(frame) {
            return false;
        }

        match self.tail {
            None => {
                self.head = Some(frame);
                self.tail = Some(frame);
                self.nodes[frame.get()] = FreeNode::linked(None);
            }
            Some(tail) if tail < frame => {
                self.nodes[tail.get()].next = Some(frame);
                self.tail = Some(frame);
                self.nodes[frame.get()] = FreeNode::linked(None);
            }
            Some(_) => {
                // Find the last node below `frame`; the tail is known to be above it.
                let mut prev = None;
                let mut current = self.head;
                while let Some(c) = current {
                    if c > frame {
                        break;
                    }
                    prev = Some(c);
                    current = self.nodes[c.get()].next;
                }

                self.nodes[frame.get()] = FreeNode::linked(current);
                match prev {
                    None => self.head = Some(frame),
                    Some(p) => self.nodes[p.get()].next = Some(frame),
                }
            }
        }

        self.len += 1;
        true
    }

    /// Unlink and return the lowest free frame.
    pub fn pop_first(&mut self) -> Option<FrameIndex> {
        self.take_first(|_| true)
    }

    /// Unlink and return the lowest free frame for which `admit` holds.
    ///
    /// Candidates are offered in ascending order; the first admitted one wins.
    pub fn take_first(&mut self, mut admit: impl FnMut(FrameIndex) -> bool) -> Option<FrameIndex> {
        let mut prev: Option<FrameIndex> = None;
        let mut current = self.head;

        while let Some(c) = current {
            let next = self.nodes[c.get()].next;
            if admit(c) {
                match prev {
                    None => self.head = next,
                    Some(p) => self.nodes[p.get()].next = next,
                }
                if self.tail == Some(c) {
                    self.tail = prev;
                }
                self.nodes[c.get()] = FreeNode::UNLINKED;
                self.len -= 1;
                return Some(c);
            }
            prev = current;
            current = next;
        }

        None
    }
}

/// Ascending iterator over a [`FreeList`].
pub struct FreeIter<'a, const N: usize> {
    list: &'a FreeList<N>,
    cursor: Option<FrameIndex>,
}

impl<const N: usize> Iterator for FreeIter<'_, N> {
    type Item = FrameIndex;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.cursor?;
        self.cursor = self.list.nodes[current.get()].next;
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idx(i: u32) -> FrameIndex {
        FrameIndex::new(i)
    }

    fn contents<const N: usize>(l: &FreeList<N>) -> Vec<usize> {
        l.iter().map(FrameIndex::get).collect()
    }

    #[test]
    fn ascending_seed_appends() {
        let mut l = FreeList::<8>::new();
        for i in 0..8 {
            assert!(l.insert(idx(i)));
        }
        assert_eq!(contents(&l), (0..8).collect::<Vec<_>>());
        assert_eq!(l.len(), 8);
    }

    #[test]
    fn out_of_order_inserts_stay_sorted() {
        let mut l = FreeList::<8>::new();
        for i in [4, 1, 6, 0, 5, 2] {
            assert!(l.insert(idx(i)));
        }
        assert_eq!(contents(&l), vec![0, 1, 2, 4, 5, 6]);
        assert_eq!(l.first(), Some(idx(0)));
    }

    #[test]
    fn double_insert_is_rejected() {
        let mut l = FreeList::<4>::new();
        assert!(l.insert(idx(2)));
        assert!(!l.insert(idx(2)));
        assert_eq!(l.len(), 1);
    }

    #[test]
    fn take_first_unlinks_the_first_admitted() {
        let mut l = FreeList::<8>::new();
        for i in [1, 3, 5, 7] {
            l.insert(idx(i));
        }
        assert_eq!(l.take_first(|f| f.get() > 2), Some(idx(3)));
        assert_eq!(contents(&l), vec![1, 5, 7]);
        assert!(!l.contains(idx(3)));
        assert_eq!(l.take_first(|f| f.get() == 4), None);
        assert_eq!(l.len(), 3);
    }

    #[test]
    fn taking_the_tail_moves_it_back() {
        let mut l = FreeList::<8>::new();
        for i in [1, 3, 5] {
            l.insert(idx(i));
        }
        assert_eq!(l.take_first(|f| f.get() == 5), Some(idx(5)));
        // Append after the new tail must still work.
        assert!(l.insert(idx(6)));
        assert!(l.insert(idx(4)));
        assert_eq!(contents(&l), vec![1, 3, 4, 6]);
    }

    #[test]
    fn boot_flags_belong_to_unlinked_frames() {
        let mut l = FreeList::<4>::new();
        l.insert(idx(1));
        assert!(!l.mark_boot(idx(1)), "free frames cannot be boot frames");

        let taken = l.pop_first().unwrap();
        assert!(l.mark_boot(taken));
        assert!(l.is_boot(taken));
        assert!(l.clear_boot(taken));
        assert!(!l.clear_boot(taken));

        l.mark_boot(idx(2));
        l.insert(idx(2));
        assert!(!l.is_boot(idx(2)));
    }

    #[test]
    fn pop_drains_in_order() {
        let mut l = FreeList::<4>::new();
        for i in [3, 0, 2] {
            l.insert(idx(i));
        }
        assert_eq!(l.pop_first(), Some(idx(0)));
        assert_eq!(l.pop_first(), Some(idx(2)));
        assert_eq!(l.pop_first(), Some(idx(3)));
        assert_eq!(l.pop_first(), None);
        assert!(l.is_empty());
        assert_eq!(l.len(), 0);
    }
}
