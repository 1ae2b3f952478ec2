//! Source identification type.

/// Unique identifier for a source registered with a mixer.
///
/// Identifiers are allocated by the mixer in registration order and are never
/// reused within one mixer, so a stale `SourceId` can never alias a newer
/// source. `SourceId` is `Copy` and cheap to compare and hash.
///
/// # Example
///
/// ```
/// use stream_mix::SourceId;
///
/// let a = SourceId::from_raw(1);
/// let b = SourceId::from_raw(2);
///
/// assert_ne!(a, b);
/// assert!(a < b);
/// assert_eq!(a.to_string(), "src#1");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(u64);

impl SourceId {
    /// Creates a source ID from a raw value.
    ///
    /// Mostly useful in tests; mixers hand out their own IDs.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw numeric value.
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "src#{}", self.0)
    }
}

/// Allocates monotonically increasing source IDs.
#[derive(Debug, Default)]
pub(crate) struct SourceIdAllocator {
    next: u64,
}

impl SourceIdAllocator {
    pub(crate) fn next_id(&mut self) -> SourceId {
        self.next += 1;
        SourceId(self.next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_id_equality() {
        assert_eq!(SourceId::from_raw(7), SourceId::from_raw(7));
        assert_ne!(SourceId::from_raw(7), SourceId::from_raw(8));
    }

    #[test]
    fn test_source_id_display() {
        assert_eq!(format!("{}", SourceId::from_raw(42)), "src#42");
    }

    #[test]
    fn test_allocator_never_reuses() {
        let mut alloc = SourceIdAllocator::default();
        let a = alloc.next_id();
        let b = alloc.next_id();
        let c = alloc.next_id();
        assert!(a < b && b < c);
        assert_eq!(a.as_u64(), 1);
    }

    #[test]
    fn test_source_id_hash() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(SourceId::from_raw(1));
        set.insert(SourceId::from_raw(2));
        set.insert(SourceId::from_raw(1));

        assert_eq!(set.len(), 2);
    }
}
