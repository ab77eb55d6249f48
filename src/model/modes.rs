//! Traversal mode flags.

/// Independent traversal mode flags for cursor navigation.
///
/// `only_seen` and `skip_seen` are mutually exclusive at the UI level; the
/// store does not enforce that, it simply applies whichever filters are set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraversalModes {
    /// Traverse the fixed shuffle permutation instead of the canonical order.
    pub shuffled: bool,
    /// Skip frames already marked as seen.
    pub skip_seen: bool,
    /// Visit only frames already marked as seen.
    pub only_seen: bool,
    /// Visit only frames marked as difficult.
    pub only_difficult: bool,
}
