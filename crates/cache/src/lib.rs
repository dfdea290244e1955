//! Process-wide, load-once cache of materialized handbook documents.
//!
//! Every key moves through a small state machine:
//!
//! ```text
//! Absent ──get_or_load──▶ Loading ──ok──▶ Present
//!    ▲                       │
//!    └───────────err/panic───┘
//! ```
//!
//! The map itself is guarded by a short-lived reader/writer lock that is
//! never held across an `.await`. A key in the `Loading` state carries a gate
//! that callers for the same key wait on, so a document is materialized at
//! most once no matter how many requests race for it, while loads of other
//! keys and reads of present keys carry on untouched.
//!
//! Loaders run in their own task. A caller that gives up waiting does not
//! cancel the load; the result still lands in the cache for whoever asks next.

pub mod error;

use parking_lot::RwLock;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::Instrument;

use crate::error::{ErrorKind, Result};

/// Observable state of one cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum CacheState {
    #[display("absent")]
    Absent,
    #[display("loading")]
    Loading,
    #[display("present")]
    Present,
}

enum Slot<V> {
    /// Dropping the matching sender wakes every waiter.
    Loading(watch::Receiver<()>),
    Present(V),
}

type Entries<V> = Arc<RwLock<HashMap<String, Slot<V>>>>;

enum Acquired<V> {
    Present(V),
    Wait(watch::Receiver<()>),
    Load(watch::Sender<()>),
}

/// Concurrency-safe map from document key to materialized value.
///
/// Values are handed out by clone, so `V` is normally something cheap to
/// clone such as `Arc<str>`. Cloning the cache itself yields another handle
/// to the same map.
pub struct DocumentCache<V> {
    entries: Entries<V>,
}

impl<V> Default for DocumentCache<V> {
    fn default() -> Self {
        Self { entries: Arc::default() }
    }
}

impl<V> Clone for DocumentCache<V> {
    fn clone(&self) -> Self {
        Self { entries: Arc::clone(&self.entries) }
    }
}

impl<V: Clone + Send + Sync + 'static> DocumentCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the value for `key`, running `load` to produce it if no other
    /// caller has done so yet.
    ///
    /// Concurrent callers for the same key share a single run of the first
    /// caller's loader; theirs are never invoked unless that run fails, in
    /// which case the next waiter retries with its own.
    ///
    /// # Errors
    ///
    /// [`Load`](ErrorKind::Load) wrapping the loader's error tree, or
    /// [`Aborted`](ErrorKind::Aborted) if the loader panicked. Either way the
    /// key is absent again afterwards.
    #[tracing::instrument(level = "debug", skip(self, load))]
    pub async fn get_or_load<F, Fut, E>(&self, key: &str, load: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<V, exn::Exn<E>>> + Send + 'static,
        E: std::error::Error + Send + Sync + 'static,
    {
        let done = loop {
            match self.acquire(key) {
                Acquired::Present(value) => {
                    tracing::debug!("Cache hit");
                    return Ok(value);
                },
                Acquired::Wait(mut gate) => {
                    tracing::debug!("Waiting for in-flight load");
                    // Never sent on; resolves once the loader drops its sender.
                    _ = gate.changed().await;
                },
                Acquired::Load(done) => break done,
            }
        };

        let guard = LoadGuard {
            entries: Arc::clone(&self.entries),
            key: key.to_owned(),
            outcome: None,
            _done: done,
        };
        let pending = load();
        let task = tokio::spawn(
            async move {
                let mut guard = guard;
                let result = pending.await;
                if let Ok(value) = &result {
                    guard.outcome = Some(value.clone());
                }
                result
            }
            .in_current_span(),
        );

        match task.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(err.raise(ErrorKind::Load(key.to_owned()))),
            Err(err) => {
                tracing::error!(error = %err, "Cache loader did not finish");
                exn::bail!(ErrorKind::Aborted(key.to_owned()))
            },
        }
    }

    /// Current value for `key`, without loading.
    pub fn get(&self, key: &str) -> Option<V> {
        match self.entries.read().get(key) {
            Some(Slot::Present(value)) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn state(&self, key: &str) -> CacheState {
        match self.entries.read().get(key) {
            None => CacheState::Absent,
            Some(Slot::Loading(_)) => CacheState::Loading,
            Some(Slot::Present(_)) => CacheState::Present,
        }
    }

    /// Number of present entries.
    pub fn len(&self) -> usize {
        self.entries.read().values().filter(|slot| matches!(slot, Slot::Present(_))).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn acquire(&self, key: &str) -> Acquired<V> {
        if let Some(found) = Self::inspect(&self.entries.read(), key) {
            return found;
        }
        let mut entries = self.entries.write();
        // Someone may have claimed the key between the two locks.
        if let Some(found) = Self::inspect(&entries, key) {
            return found;
        }
        let (done, gate) = watch::channel(());
        entries.insert(key.to_owned(), Slot::Loading(gate));
        Acquired::Load(done)
    }

    fn inspect(entries: &HashMap<String, Slot<V>>, key: &str) -> Option<Acquired<V>> {
        match entries.get(key)? {
            Slot::Present(value) => Some(Acquired::Present(value.clone())),
            Slot::Loading(gate) => Some(Acquired::Wait(gate.clone())),
        }
    }
}

/// Owned by the loader task. Settles the key when dropped, whether the task
/// finished, failed, panicked or was torn down with the runtime.
struct LoadGuard<V> {
    entries: Entries<V>,
    key: String,
    outcome: Option<V>,
    // Dropped after `drop` has updated the map, so woken waiters see the
    // settled state.
    _done: watch::Sender<()>,
}

impl<V> Drop for LoadGuard<V> {
    fn drop(&mut self) {
        let mut entries = self.entries.write();
        match self.outcome.take() {
            Some(value) => {
                entries.insert(std::mem::take(&mut self.key), Slot::Present(value));
            },
            None => {
                entries.remove(&self.key);
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::oneshot;

    type LoadResult = std::result::Result<Arc<str>, exn::Exn<io::Error>>;

    fn failure() -> LoadResult {
        Err(exn::Exn::from(io::Error::other("pdfinfo reported no pages")))
    }

    async fn loaded(text: &'static str) -> LoadResult {
        Ok(Arc::from(text))
    }

    async fn crash() -> LoadResult {
        panic!("pdftotext crashed")
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_share_one_load() {
        let cache = DocumentCache::<Arc<str>>::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let cache = cache.clone();
                let calls = Arc::clone(&calls);
                tokio::spawn(async move {
                    cache
                        .get_or_load("engineering", move || async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(50)).await;
                            Ok::<_, exn::Exn<io::Error>>(Arc::from("--- PAGE 1 ---\n"))
                        })
                        .await
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(&*handle.await.unwrap().unwrap(), "--- PAGE 1 ---\n");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.state("engineering"), CacheState::Present);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_failure_returns_to_absent() {
        let cache = DocumentCache::<Arc<str>>::new();
        let err = cache.get_or_load("science", || async { failure() }).await.unwrap_err();
        assert_eq!(*err, ErrorKind::Load("science".to_string()));
        assert_eq!(cache.state("science"), CacheState::Absent);
        assert!(cache.is_empty());

        let value = cache.get_or_load("science", || loaded("理学部")).await.unwrap();
        assert_eq!(&*value, "理学部");
        assert_eq!(cache.state("science"), CacheState::Present);
    }

    #[tokio::test]
    async fn test_present_value_skips_loader() {
        let cache = DocumentCache::<Arc<str>>::new();
        cache.get_or_load("letters", || loaded("first")).await.unwrap();
        let value = cache.get_or_load("letters", crash).await.unwrap();
        assert_eq!(&*value, "first");
        assert_eq!(cache.get("letters").as_deref(), Some("first"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_keys_load_independently() {
        let cache = DocumentCache::<Arc<str>>::new();
        cache.get_or_load("science", || loaded("ready")).await.unwrap();

        let (release, blocked) = oneshot::channel::<()>();
        let slow = {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache
                    .get_or_load("engineering", move || async move {
                        _ = blocked.await;
                        loaded("slow").await
                    })
                    .await
            })
        };
        while cache.state("engineering") != CacheState::Loading {
            tokio::task::yield_now().await;
        }

        // Neither a present key nor a different absent key waits on the slow load.
        let quick = tokio::time::timeout(Duration::from_secs(5), async {
            let hit = cache.get_or_load("science", || async { failure() }).await.unwrap();
            let other = cache.get_or_load("letters", || loaded("quick")).await.unwrap();
            (hit, other)
        })
        .await
        .unwrap();
        assert_eq!((&*quick.0, &*quick.1), ("ready", "quick"));
        assert_eq!(cache.state("engineering"), CacheState::Loading);

        release.send(()).unwrap();
        assert_eq!(&*slow.await.unwrap().unwrap(), "slow");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_abandoned_caller_still_populates() {
        let cache = DocumentCache::<Arc<str>>::new();
        let (release, blocked) = oneshot::channel::<()>();
        let caller = {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache
                    .get_or_load("medicine", move || async move {
                        _ = blocked.await;
                        loaded("医学部").await
                    })
                    .await
            })
        };
        while cache.state("medicine") != CacheState::Loading {
            tokio::task::yield_now().await;
        }
        caller.abort();
        assert!(caller.await.unwrap_err().is_cancelled());

        release.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), async {
            while cache.state("medicine") != CacheState::Present {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        assert_eq!(cache.get("medicine").as_deref(), Some("医学部"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_waiter_retries_after_failed_load() {
        let cache = DocumentCache::<Arc<str>>::new();
        let (release, blocked) = oneshot::channel::<()>();
        let first = {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache
                    .get_or_load("agriculture", move || async move {
                        _ = blocked.await;
                        failure()
                    })
                    .await
            })
        };
        while cache.state("agriculture") != CacheState::Loading {
            tokio::task::yield_now().await;
        }
        let second = {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache.get_or_load("agriculture", || loaded("農学部")).await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        release.send(()).unwrap();

        assert!(first.await.unwrap().is_err());
        assert_eq!(&*second.await.unwrap().unwrap(), "農学部");
    }

    #[tokio::test]
    async fn test_panicking_loader_is_aborted() {
        let cache = DocumentCache::<Arc<str>>::new();
        let err = cache.get_or_load("maritime_sciences", crash).await.unwrap_err();
        assert_eq!(*err, ErrorKind::Aborted("maritime_sciences".to_string()));
        assert_eq!(cache.state("maritime_sciences"), CacheState::Absent);
    }

    #[rstest]
    #[case(CacheState::Absent, "absent")]
    #[case(CacheState::Loading, "loading")]
    #[case(CacheState::Present, "present")]
    fn test_state_display(#[case] state: CacheState, #[case] expected: &str) {
        assert_eq!(state.to_string(), expected);
    }
}
