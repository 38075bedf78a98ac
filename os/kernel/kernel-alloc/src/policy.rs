//! Neighbor-based admission rule for process allocations.
//!
//! A free frame is admissible for a process if none of its physical neighbors
//! belongs to somebody else. This is a local, greedy rule: it keeps unrelated
//! processes from interleaving frame by frame, but it never moves frames and
//! does not look beyond the immediate neighbors.

use crate::frame::FrameIndex;
use crate::owner::{Owner, Requester};
use crate::registry::FrameRegistry;

/// Configuration of the locality rule.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct LocalityPolicy {
    /// Treat neighbors allocated through [`Requester::Unconstrained`] like
    /// free frames instead of foreign ones.
    pub kernel_neighbors_are_neutral: bool,
}

impl LocalityPolicy {
    /// Only unowned neighbors and the requester's own frames are compatible.
    pub const STRICT: Self = Self {
        kernel_neighbors_are_neutral: false,
    };

    /// Kernel frames do not count against a process.
    pub const KERNEL_NEUTRAL: Self = Self {
        kernel_neighbors_are_neutral: true,
    };

    /// Whether a neighbor owned by `neighbor` may sit next to a frame of `requester`.
    #[must_use]
    pub const fn compatible(&self, neighbor: Owner, requester: Requester) -> bool {
        match (neighbor, requester) {
            (Owner::Unowned, _) => true,
            (Owner::Kernel, _) => self.kernel_neighbors_are_neutral,
            (Owner::Process(n), Requester::Process(r)) => n.get() == r.get(),
            (Owner::Process(_), Requester::Unconstrained) => true,
        }
    }

    /// Whether `frame` may be handed to `requester`.
    ///
    /// `frame_count` is the number of managed frames; the first and the last
    /// frame only have one neighbor. [`Requester::Unconstrained`] is always
    /// admitted.
    #[must_use]
    pub fn admits<const N: usize>(
        &self,
        registry: &FrameRegistry<N>,
        frame: FrameIndex,
        frame_count: usize,
        requester: Requester,
    ) -> bool {
        if requester == Requester::Unconstrained {
            return true;
        }

        [frame.left(), frame.right(frame_count)]
            .into_iter()
            .flatten()
            .all(|n| self.compatible(registry.owner_of(n), requester))
    }
}
