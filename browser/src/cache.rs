//! Namespace and set metadata cache.
//!
//! Set listings are fetched at most once per namespace for the lifetime of a
//! session. Concurrent callers asking for the same uncached namespace share a
//! single in-flight fetch and all observe its result, success or failure. A
//! failed fetch leaves no entry behind, so the next call fetches again.
//!
//! # Components
//!
//! - [`MetadataCache`]: the cache, owned by a session and dropped with it.
//! - `Slot`: per-namespace state, either a finished listing or a shared
//!   in-flight fetch.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};

use crate::driver::ClusterDriver;
use crate::error::Result;
use crate::model::{Namespace, SetDescriptor};

type SetListing = Arc<Vec<SetDescriptor>>;
type PendingFetch = Shared<BoxFuture<'static, Result<SetListing>>>;

enum Slot {
    Ready(SetListing),
    Pending(PendingFetch),
}

/// Memoizes set listings keyed by namespace name.
pub struct MetadataCache {
    driver: Arc<dyn ClusterDriver>,
    slots: Arc<Mutex<HashMap<String, Slot>>>,
}

impl MetadataCache {
    /// Creates an empty cache over a connected driver.
    pub fn new(driver: Arc<dyn ClusterDriver>) -> Self {
        Self {
            driver,
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Lists namespaces. Not cached.
    pub async fn list_namespaces(&self) -> Result<Vec<Namespace>> {
        let names = self.driver.fetch_namespaces().await?;
        Ok(names.into_iter().map(Namespace::new).collect())
    }

    /// Lists the sets of a namespace, fetching them on first use.
    ///
    /// If a fetch for the namespace is already in flight, waits for it
    /// instead of starting another.
    pub async fn list_sets(&self, namespace: &str) -> Result<SetListing> {
        let pending = {
            let mut slots = self.slots.lock().expect("lock poisoned");
            match slots.get(namespace) {
                Some(Slot::Ready(sets)) => {
                    tracing::debug!(namespace, "set listing cache hit");
                    return Ok(sets.clone());
                }
                Some(Slot::Pending(fetch)) => {
                    tracing::debug!(namespace, "joining in-flight set listing fetch");
                    fetch.clone()
                }
                None => {
                    tracing::debug!(namespace, "set listing cache miss");
                    let fetch = self.fetch(namespace.to_string());
                    slots.insert(namespace.to_string(), Slot::Pending(fetch.clone()));
                    fetch
                }
            }
        };
        pending.await
    }

    /// Returns the cached listing for a namespace without fetching.
    pub fn cached_sets(&self, namespace: &str) -> Option<SetListing> {
        match self.slots.lock().expect("lock poisoned").get(namespace) {
            Some(Slot::Ready(sets)) => Some(sets.clone()),
            _ => None,
        }
    }

    /// Builds the shared fetch for a namespace.
    ///
    /// The fetch itself records its outcome: a listing replaces the pending
    /// slot, a failure removes it. Whichever waiter drives the shared future
    /// to completion performs the update exactly once.
    ///
    /// The future is stored in the map it updates, so it only holds a weak
    /// reference to the map. Dropping the cache frees the map, the pending
    /// fetch and its driver handle even if no waiter is left to finish it.
    fn fetch(&self, namespace: String) -> PendingFetch {
        let driver = self.driver.clone();
        let slots = Arc::downgrade(&self.slots);
        async move {
            let result = driver.fetch_sets(&namespace).await.map(Arc::new);
            record_outcome(&slots, namespace, &result);
            result
        }
        .boxed()
        .shared()
    }
}

fn record_outcome(
    slots: &Weak<Mutex<HashMap<String, Slot>>>,
    namespace: String,
    result: &Result<SetListing>,
) {
    let Some(slots) = slots.upgrade() else {
        return;
    };
    let mut slots = slots.lock().expect("lock poisoned");
    match result {
        Ok(sets) => {
            slots.insert(namespace, Slot::Ready(sets.clone()));
        }
        Err(e) => {
            tracing::warn!(namespace = %namespace, error = %e, "set listing fetch failed");
            slots.remove(&namespace);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::cursor::ScanCursor;
    use crate::driver::ScanPage;
    use crate::error::Error;

    /// Driver stub that counts set listing fetches and can be told to fail.
    struct CountingDriver {
        fetches: AtomicUsize,
        failures_left: AtomicUsize,
        delay: Duration,
    }

    impl CountingDriver {
        fn new() -> Self {
            Self {
                fetches: AtomicUsize::new(0),
                failures_left: AtomicUsize::new(0),
                delay: Duration::ZERO,
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn failing_once(self) -> Self {
            self.failures_left.store(1, Ordering::SeqCst);
            self
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ClusterDriver for CountingDriver {
        async fn info(&self, _command: &str) -> Result<String> {
            Ok("test;users".to_string())
        }

        async fn scan_page(
            &self,
            _namespace: &str,
            _set: &str,
            _cursor: Option<ScanCursor>,
            _limit: usize,
        ) -> Result<ScanPage> {
            unreachable!("the metadata cache never scans")
        }

        async fn fetch_sets(&self, namespace: &str) -> Result<Vec<SetDescriptor>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let fail = self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if fail {
                return Err(Error::Driver("node unreachable".to_string()));
            }
            Ok(vec![SetDescriptor {
                namespace: namespace.to_string(),
                name: "profiles".to_string(),
                objects: 250,
                data_used_bytes: 1024,
            }])
        }
    }

    #[tokio::test]
    async fn should_list_namespaces_from_driver() {
        // given
        let cache = MetadataCache::new(Arc::new(CountingDriver::new()));

        // when
        let namespaces = cache.list_namespaces().await.unwrap();

        // then
        assert_eq!(namespaces, vec![Namespace::new("test"), Namespace::new("users")]);
    }

    #[tokio::test]
    async fn should_fetch_sets_once_for_sequential_calls() {
        // given
        let driver = Arc::new(CountingDriver::new());
        let cache = MetadataCache::new(driver.clone());

        // when
        let first = cache.list_sets("users").await.unwrap();
        let second = cache.list_sets("users").await.unwrap();

        // then
        assert_eq!(driver.fetches(), 1);
        assert_eq!(first, second);
        assert!(cache.cached_sets("users").is_some());
    }

    #[tokio::test]
    async fn should_collapse_concurrent_fetches_for_same_namespace() {
        // given
        let driver = Arc::new(CountingDriver::new().with_delay(Duration::from_millis(50)));
        let cache = MetadataCache::new(driver.clone());

        // when
        let (a, b) = tokio::join!(cache.list_sets("users"), cache.list_sets("users"));

        // then
        assert_eq!(driver.fetches(), 1);
        let (a, b) = (a.unwrap(), b.unwrap());
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn should_collapse_concurrent_fetches_across_tasks() {
        // given
        let driver = Arc::new(CountingDriver::new().with_delay(Duration::from_millis(50)));
        let cache = Arc::new(MetadataCache::new(driver.clone()));

        // when
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.list_sets("users").await })
            })
            .collect();
        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap().unwrap());
        }

        // then
        assert_eq!(driver.fetches(), 1);
        assert!(results.iter().all(|r| Arc::ptr_eq(r, &results[0])));
    }

    #[tokio::test]
    async fn should_fetch_different_namespaces_independently() {
        // given
        let driver = Arc::new(CountingDriver::new().with_delay(Duration::from_millis(10)));
        let cache = MetadataCache::new(driver.clone());

        // when
        let (users, test) = tokio::join!(cache.list_sets("users"), cache.list_sets("test"));

        // then
        assert_eq!(driver.fetches(), 2);
        assert_eq!(users.unwrap()[0].namespace, "users");
        assert_eq!(test.unwrap()[0].namespace, "test");
    }

    #[tokio::test]
    async fn should_fan_out_failure_and_allow_retry() {
        // given
        let driver = Arc::new(
            CountingDriver::new()
                .with_delay(Duration::from_millis(20))
                .failing_once(),
        );
        let cache = MetadataCache::new(driver.clone());

        // when
        let (a, b) = tokio::join!(cache.list_sets("users"), cache.list_sets("users"));

        // then - both waiters see the single failure and nothing is cached
        assert_eq!(driver.fetches(), 1);
        assert_eq!(a, Err(Error::Driver("node unreachable".to_string())));
        assert_eq!(a, b);
        assert!(cache.cached_sets("users").is_none());

        // when - retry
        let retried = cache.list_sets("users").await;

        // then
        assert_eq!(driver.fetches(), 2);
        assert_eq!(retried.unwrap()[0].name, "profiles");
    }

    #[tokio::test]
    async fn should_resume_fetch_abandoned_by_first_caller() {
        // given
        let driver = Arc::new(CountingDriver::new().with_delay(Duration::from_millis(20)));
        let cache = MetadataCache::new(driver.clone());

        // when - the first caller gives up before the fetch completes
        let abandoned =
            tokio::time::timeout(Duration::from_millis(1), cache.list_sets("users")).await;
        let sets = cache.list_sets("users").await.unwrap();

        // then
        assert!(abandoned.is_err());
        assert_eq!(driver.fetches(), 1);
        assert_eq!(sets.len(), 1);
    }

    #[tokio::test]
    async fn should_release_driver_when_cache_dropped_mid_fetch() {
        // given
        let driver = Arc::new(CountingDriver::new().with_delay(Duration::from_millis(50)));
        let cache = MetadataCache::new(driver.clone());
        let abandoned =
            tokio::time::timeout(Duration::from_millis(1), cache.list_sets("users")).await;
        assert!(abandoned.is_err());

        // when
        drop(cache);

        // then
        assert_eq!(Arc::strong_count(&driver), 1);
    }
}
