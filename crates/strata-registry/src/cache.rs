//! Memoizing, single-flight load-or-compute cache.
//!
//! [`ResolutionCache::get_or_load`] guarantees that concurrent first requests
//! for the same key run the loader exactly once: the first caller becomes the
//! leader and runs it, every other caller blocks until the leader settles and
//! then receives the same value or the same error.
//!
//! Successful values are kept for the lifetime of the cache. Errors are handed
//! to the callers that were waiting and then forgotten, so the next request
//! runs the loader again. Callers get the loader's own error value back; there
//! is no wrapping layer to strip.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use tracing::trace;

// =============================================================================
// Flights
// =============================================================================

enum FlightState<V, E> {
    Pending,
    Finished(Result<V, E>),
    /// The leader unwound without settling; waiters must retry.
    Abandoned,
}

struct Flight<V, E> {
    state: Mutex<FlightState<V, E>>,
    done: Condvar,
}

impl<V: Clone, E: Clone> Flight<V, E> {
    fn new() -> Self {
        Self {
            state: Mutex::new(FlightState::Pending),
            done: Condvar::new(),
        }
    }

    /// Blocks until settled. `None` means the flight was abandoned.
    fn wait(&self) -> Option<Result<V, E>> {
        let mut state = self.state.lock();
        while matches!(*state, FlightState::Pending) {
            self.done.wait(&mut state);
        }
        match &*state {
            FlightState::Finished(result) => Some(result.clone()),
            _ => None,
        }
    }

    fn settle(&self, outcome: FlightState<V, E>) {
        *self.state.lock() = outcome;
        self.done.notify_all();
    }
}

enum Slot<V, E> {
    Ready(V),
    Loading(Arc<Flight<V, E>>),
}

enum Claim<V, E> {
    Ready(V),
    Wait(Arc<Flight<V, E>>),
    Lead(Arc<Flight<V, E>>),
}

/// Settles the leader's flight, or abandons it if the loader unwinds.
struct Lead<'a, K: Eq + Hash + Clone, V: Clone, E: Clone> {
    cache: &'a ResolutionCache<K, V, E>,
    key: &'a K,
    flight: Arc<Flight<V, E>>,
    settled: bool,
}

impl<K: Eq + Hash + Clone, V: Clone, E: Clone> Lead<'_, K, V, E> {
    fn settle(&mut self, result: &Result<V, E>) {
        {
            let mut slots = self.cache.slots.lock();
            match result {
                Ok(value) => {
                    slots.insert(self.key.clone(), Slot::Ready(value.clone()));
                }
                Err(_) => {
                    slots.remove(self.key);
                }
            }
        }
        self.flight.settle(FlightState::Finished(result.clone()));
        self.settled = true;
    }
}

impl<K: Eq + Hash + Clone, V: Clone, E: Clone> Drop for Lead<'_, K, V, E> {
    fn drop(&mut self) {
        if !self.settled {
            self.cache.slots.lock().remove(self.key);
            self.flight.settle(FlightState::Abandoned);
        }
    }
}

// =============================================================================
// ResolutionCache
// =============================================================================

/// Thread-safe compute-if-absent cache with single-flight loading.
pub struct ResolutionCache<K, V, E> {
    name: &'static str,
    slots: Mutex<HashMap<K, Slot<V, E>>>,
}

impl<K, V, E> ResolutionCache<K, V, E>
where
    K: Eq + Hash + Clone,
    V: Clone,
    E: Clone,
{
    /// Creates an empty cache. `name` only appears in logs.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached value for `key`, running `load` on a miss.
    ///
    /// Concurrent callers for the same missing key block until the single
    /// in-flight load finishes. `load` must not request the same key from
    /// this cache.
    pub fn get_or_load<F>(&self, key: &K, load: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        let flight = loop {
            match self.claim(key) {
                Claim::Ready(value) => {
                    trace!(cache = self.name, "Cache hit");
                    return Ok(value);
                }
                Claim::Wait(flight) => {
                    trace!(cache = self.name, "Waiting for in-flight load");
                    if let Some(result) = flight.wait() {
                        return result;
                    }
                }
                Claim::Lead(flight) => break flight,
            }
        };

        trace!(cache = self.name, "Cache miss, loading");
        let mut lead = Lead {
            cache: self,
            key,
            flight,
            settled: false,
        };
        let result = load();
        lead.settle(&result);
        result
    }

    fn claim(&self, key: &K) -> Claim<V, E> {
        let mut slots = self.slots.lock();
        match slots.get(key) {
            Some(Slot::Ready(value)) => Claim::Ready(value.clone()),
            Some(Slot::Loading(flight)) => Claim::Wait(Arc::clone(flight)),
            None => {
                let flight = Arc::new(Flight::new());
                slots.insert(key.clone(), Slot::Loading(Arc::clone(&flight)));
                Claim::Lead(flight)
            }
        }
    }

    /// Returns the value for `key` if it has already been loaded.
    pub fn get_if_present(&self, key: &K) -> Option<V> {
        match self.slots.lock().get(key) {
            Some(Slot::Ready(value)) => Some(value.clone()),
            _ => None,
        }
    }

    /// Returns the number of loaded entries.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .values()
            .filter(|slot| matches!(slot, Slot::Ready(_)))
            .count()
    }

    /// Returns `true` if nothing has been loaded yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the cache name.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<K, V, E> fmt::Debug for ResolutionCache<K, V, E>
where
    K: Eq + Hash + Clone,
    V: Clone,
    E: Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolutionCache")
            .field("name", &self.name)
            .field("len", &self.len())
            .finish()
    }
}
