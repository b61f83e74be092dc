//! Tagged state of an asynchronous read, shared by every data slot.

/// State of a single fetchable data slot.
///
/// Exactly one variant holds at a time: a slot is untouched, in flight,
/// resolved with data, or resolved with a failure reason.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchState<T> {
    /// No fetch has been issued for this slot.
    Idle,
    /// A fetch is in flight.
    Loading,
    /// The last fetch resolved successfully.
    Ready(T),
    /// The last fetch failed; the reason is kept for display.
    Failed(String),
}

impl<T> FetchState<T> {
    pub fn is_idle(&self) -> bool {
        matches!(self, FetchState::Idle)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, FetchState::Loading)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, FetchState::Ready(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, FetchState::Failed(_))
    }

    /// Resolved value, if any.
    pub fn ready(&self) -> Option<&T> {
        match self {
            FetchState::Ready(value) => Some(value),
            _ => None,
        }
    }

    /// Failure reason, if any.
    pub fn failure(&self) -> Option<&str> {
        match self {
            FetchState::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        FetchState::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_tag_at_a_time() {
        let state: FetchState<u32> = FetchState::Ready(7);
        assert!(state.is_ready());
        assert!(!state.is_idle());
        assert!(!state.is_loading());
        assert!(!state.is_failed());
        assert_eq!(state.ready(), Some(&7));
        assert_eq!(state.failure(), None);
    }

    #[test]
    fn test_failed_keeps_reason() {
        let state: FetchState<u32> = FetchState::Failed("server returned 500".to_string());
        assert!(state.is_failed());
        assert_eq!(state.failure(), Some("server returned 500"));
        assert_eq!(state.ready(), None);
    }

    #[test]
    fn test_default_is_idle() {
        let state: FetchState<Vec<u32>> = FetchState::default();
        assert!(state.is_idle());
    }
}
