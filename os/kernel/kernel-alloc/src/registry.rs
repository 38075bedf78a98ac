//! Sorted table of allocated frames and their owners.
//!
//! The registry is a dense array kept in ascending frame order with no gaps
//! below `count`. Lookups are binary searches; insertion and removal shift the
//! tail of the array, which is O(count) and fine for a few tens of thousands of
//! frames.

use crate::error::RegistryError;
use crate::frame::FrameIndex;
use crate::owner::Owner;

/// One allocated frame.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RegistryEntry {
    pub frame: FrameIndex,
    pub owner: Owner,
}

impl RegistryEntry {
    /// Content of an unused slot.
    pub const VACANT: Self = Self {
        frame: FrameIndex::new(0),
        owner: Owner::Unowned,
    };
}

/// Bounded, sorted `frame → owner` table with room for `N` entries.
///
/// # Invariants
/// - `entries[..count]` is strictly ascending by frame (no duplicates).
/// - `entries[count..]` are [`RegistryEntry::VACANT`].
pub struct FrameRegistry<const N: usize> {
    entries: [RegistryEntry; N],
    count: usize,
}

impl<const N: usize> Default for FrameRegistry<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> FrameRegistry<N> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: [RegistryEntry::VACANT; N],
            count: 0,
        }
    }

    /// Forget every entry and mark all slots unowned.
    pub fn reset(&mut self) {
        self.entries.fill(RegistryEntry::VACANT);
        self.count = 0;
    }

    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.count
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Registered entries in ascending frame order.
    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &RegistryEntry> {
        self.entries[..self.count].iter()
    }

    fn search(&self, frame: FrameIndex) -> Result<usize, usize> {
        self.entries[..self.count].binary_search_by_key(&frame, |e| e.frame)
    }

    /// Owner of `frame`; [`Owner::Unowned`] if it is not registered.
    #[must_use]
    pub fn owner_of(&self, frame: FrameIndex) -> Owner {
        self.search(frame)
            .map_or(Owner::Unowned, |pos| self.entries[pos].owner)
    }

    #[must_use]
    pub fn contains(&self, frame: FrameIndex) -> bool {
        self.search(frame).is_ok()
    }

    /// Register `frame` as held by `owner`, keeping the table sorted.
    ///
    /// # Errors
    /// [`RegistryError::Duplicate`] if the frame is already registered,
    /// [`RegistryError::Full`] if all `N` slots are taken.
    pub fn insert(&mut self, frame: FrameIndex, owner: Owner) -> Result<(), RegistryError> {
        let pos = match self.search(frame) {
            Ok(_) => return Err(RegistryError::Duplicate),
            Err(pos) => pos,
        };
        if self.count == N {
            return Err(RegistryError::Full);
        }

        self.entries.copy_within(pos..self.count, pos + 1);
        self.entries[pos] = RegistryEntry { frame, owner };
        self.count += 1;
        Ok(())
    }

    /// Unregister `frame`, closing the gap. Returns its former owner, or
    /// `None` if it was not registered.
    pub fn remove(&mut self, frame: FrameIndex) -> Option<Owner> {
        let pos = self.search(frame).ok()?;
        let owner = self.entries[pos].owner;

        self.entries.copy_within(pos + 1..self.count, pos);
        self.count -= 1;
        self.entries[self.count] = RegistryEntry::VACANT;
        Some(owner)
    }
}
