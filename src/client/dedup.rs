//! Coalescing of concurrent identical requests.
//!
//! Only in-flight calls are shared. Once a call settles its key is dropped and
//! the next caller starts a fresh request; response caching is the
//! [`QueryCache`](crate::cache::QueryCache)'s job.

use futures::future::{BoxFuture, FutureExt, Shared};
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::errors::ApiError;

type SharedResult<T> = Shared<BoxFuture<'static, Result<T, ApiError>>>;

struct InFlight {
    generation: u64,
    shared: Box<dyn Any + Send + Sync>,
}

type InFlightMap = Arc<Mutex<HashMap<String, InFlight>>>;

/// Shares one pending request among all callers using the same key.
#[derive(Default)]
pub struct RequestDeduplicator {
    in_flight: InFlightMap,
    generation: AtomicU64,
}

impl RequestDeduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `factory`'s request under `key`, or join the one already in flight.
    ///
    /// `factory` is only invoked when no call with this key is pending. All
    /// joined callers receive a clone of the same result, failures included.
    pub async fn run<T, F, Fut>(&self, key: &str, factory: F) -> Result<T, ApiError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let shared = {
            let mut in_flight = lock(&self.in_flight);
            match in_flight
                .get(key)
                .and_then(|entry| entry.shared.downcast_ref::<SharedResult<T>>())
            {
                Some(pending) => {
                    tracing::debug!(key, "Joining in-flight request");
                    pending.clone()
                }
                None => {
                    let generation = self.generation.fetch_add(1, Ordering::Relaxed);
                    let shared = settle_then_forget(
                        factory(),
                        Arc::clone(&self.in_flight),
                        key.to_string(),
                        generation,
                    );
                    in_flight.insert(
                        key.to_string(),
                        InFlight {
                            generation,
                            shared: Box::new(shared.clone()),
                        },
                    );
                    shared
                }
            }
        };

        shared.await
    }

    /// Number of keys with a pending request.
    pub fn in_flight(&self) -> usize {
        lock(&self.in_flight).len()
    }
}

fn settle_then_forget<T, Fut>(
    request: Fut,
    in_flight: InFlightMap,
    key: String,
    generation: u64,
) -> SharedResult<T>
where
    T: Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
{
    async move {
        let result = request.await;
        let mut map = lock(&in_flight);
        if map.get(&key).map(|entry| entry.generation) == Some(generation) {
            map.remove(&key);
        }
        result
    }
    .boxed()
    .shared()
}

fn lock(map: &InFlightMap) -> MutexGuard<'_, HashMap<String, InFlight>> {
    map.lock().unwrap_or_else(|e| e.into_inner())
}
