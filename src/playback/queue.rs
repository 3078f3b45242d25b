//! Helpers for walking the engine queue.

/// Queue position that follows `index`, or `None` at the end of the queue.
pub(crate) fn following(index: Option<usize>, len: usize) -> Option<usize> {
    index.map(|i| i + 1).filter(|&next| next < len)
}
