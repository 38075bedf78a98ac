//! Who asks for frames and who holds them.
//!
//! [`Requester`] is the input side of an allocation; [`Owner`] is what the
//! registry reports for a frame. Requesters are decoded from, and owners
//! encoded to, the raw integers of [`kernel_info::owner`] that cross the
//! system-call boundary.

use core::fmt;
use kernel_info::owner::{NO_LOCALITY, UNOWNED};

/// Non-negative process identifier.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Pid(i32);

impl Pid {
    /// Returns `None` for negative values, which are reserved for sentinels.
    #[inline]
    #[must_use]
    pub const fn new(raw: i32) -> Option<Self> {
        if raw >= 0 { Some(Self(raw)) } else { None }
    }

    #[inline]
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pid {}", self.0)
    }
}

/// The party an allocation is made for.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Requester {
    /// A process; the locality policy applies.
    Process(Pid),
    /// Privileged caller ([`NO_LOCALITY`]); the locality policy is skipped.
    Unconstrained,
}

impl Requester {
    /// Decode the raw requester id passed across the kernel ABI.
    ///
    /// [`UNOWNED`] and any other negative value except [`NO_LOCALITY`] are rejected.
    #[must_use]
    pub const fn from_raw(raw: i32) -> Option<Self> {
        if raw == NO_LOCALITY {
            return Some(Self::Unconstrained);
        }
        match Pid::new(raw) {
            Some(pid) => Some(Self::Process(pid)),
            None => None,
        }
    }

    /// The owner recorded for a frame allocated on behalf of this requester.
    #[inline]
    #[must_use]
    pub const fn owner(self) -> Owner {
        match self {
            Self::Process(pid) => Owner::Process(pid),
            Self::Unconstrained => Owner::Kernel,
        }
    }
}

impl From<Pid> for Requester {
    fn from(pid: Pid) -> Self {
        Self::Process(pid)
    }
}

impl fmt::Display for Requester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Process(pid) => fmt::Display::fmt(pid, f),
            Self::Unconstrained => f.write_str("unconstrained"),
        }
    }
}

/// Owner of a frame as seen by the registry.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum Owner {
    /// Not allocated (or not tracked).
    #[default]
    Unowned,
    /// Allocated through [`Requester::Unconstrained`].
    Kernel,
    Process(Pid),
}

impl Owner {
    #[inline]
    #[must_use]
    pub const fn raw(self) -> i32 {
        match self {
            Self::Unowned => UNOWNED,
            Self::Kernel => NO_LOCALITY,
            Self::Process(pid) => pid.get(),
        }
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unowned => f.write_str("unowned"),
            Self::Kernel => f.write_str("kernel"),
            Self::Process(pid) => fmt::Display::fmt(pid, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requester_raw_encoding() {
        assert_eq!(Requester::from_raw(NO_LOCALITY), Some(Requester::Unconstrained));
        assert_eq!(
            Requester::from_raw(7),
            Some(Requester::Process(Pid::new(7).unwrap()))
        );
        assert_eq!(Requester::from_raw(UNOWNED), None);
        assert_eq!(Requester::from_raw(-5), None);
    }

    #[test]
    fn owner_raw_encoding() {
        assert_eq!(Owner::Process(Pid::new(0).unwrap()).raw(), 0);
        assert_eq!(Owner::Kernel.raw(), NO_LOCALITY);
        assert_eq!(Owner::default().raw(), UNOWNED);
    }

    #[test]
    fn requester_maps_to_owner() {
        let pid = Pid::new(3).unwrap();
        assert_eq!(Requester::Process(pid).owner(), Owner::Process(pid));
        assert_eq!(Requester::Unconstrained.owner(), Owner::Kernel);
    }
}
