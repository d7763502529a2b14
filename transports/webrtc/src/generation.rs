//! Connection generation tags
//!
//! Every connection attempt gets a fresh [`Generation`]. The signaling
//! channel and the peer session created for that attempt stamp all of their
//! asynchronous events with it, so a late callback from a torn-down pair can
//! be recognised and dropped instead of touching the current pair.

use std::fmt;

/// Identifier of one signaling channel + peer session pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// The generation following this one
    pub fn next(&self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An event stamped with the generation that produced it
#[derive(Debug)]
pub struct Tagged<T> {
    pub generation: Generation,
    pub event: T,
}

impl<T> Tagged<T> {
    pub fn new(generation: Generation, event: T) -> Self {
        Self { generation, event }
    }

    /// True if this event belongs to the live pair identified by `current`
    pub fn is_current(&self, current: Option<Generation>) -> bool {
        current == Some(self.generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_increments() {
        let g = Generation::default();
        assert_eq!(g.value(), 0);
        assert_eq!(g.next().value(), 1);
        assert!(g.next() > g);
        assert_eq!(g.next().to_string(), "#1");
    }

    #[test]
    fn test_stale_events_are_not_current() {
        let old = Tagged::new(Generation::new(3), ());
        assert!(old.is_current(Some(Generation::new(3))));
        assert!(!old.is_current(Some(Generation::new(4))));
        assert!(!old.is_current(None));
    }
}
