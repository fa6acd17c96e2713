use std::{
    cell::Cell,
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

// Identities are handed out lazily, the first time a thread asks for
// one. `0` is reserved for the sentinel.
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static CURRENT: Cell<u64> = const { Cell::new(0) };
}

/// An opaque identifier for the thread which produced a record.
///
/// Every thread gets a distinct, stable identity for its whole
/// lifetime. Threads in a pool keep their identity across tasks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CallerId(u64);

impl CallerId {
    /// The identity used for the header record written at construction.
    pub const SENTINEL: Self = Self(0);

    /// Creates a caller identity from a raw value.
    #[inline]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Gets the identity of the calling thread.
    pub fn current() -> Self {
        CURRENT.with(|current| {
            let mut id = current.get();
            if id == 0 {
                id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
                current.set(id);
            }

            Self(id)
        })
    }

    /// Gets the raw value of this identity.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Whether this is the [`CallerId::SENTINEL`] identity.
    #[inline]
    pub const fn is_sentinel(self) -> bool {
        self.0 == Self::SENTINEL.0
    }
}

impl fmt::Display for CallerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn stable_per_thread() {
        let id = CallerId::current();
        assert_eq!(id, CallerId::current());
        assert!(!id.is_sentinel());
    }

    #[test]
    fn distinct_across_threads() {
        let here = CallerId::current();
        let there = thread::spawn(CallerId::current).join().unwrap();

        assert_ne!(here, there);
    }
}
