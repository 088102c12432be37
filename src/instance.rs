// Construct-once holder for the process-wide auth engine instance.
//
// Hot-reloading hosts re-evaluate modules without restarting the process;
// keeping the instance in an explicit holder that is passed into handlers
// lets the engine survive reloads, and `reset` gives tests and reload
// harnesses a deliberate way to rebuild it. Construction is single-flight:
// concurrent first callers share one initialization attempt.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::Result;

/// Holds at most one shared instance of `T` for the process lifetime.
#[derive(Debug)]
pub struct InstanceHolder<T> {
    slot: Mutex<Option<Arc<T>>>,
}

impl<T> Default for InstanceHolder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> InstanceHolder<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// The current instance, if one has been constructed.
    pub async fn get(&self) -> Option<Arc<T>> {
        self.slot.lock().await.clone()
    }

    /// Return the instance, constructing it on first use. The slot lock is
    /// held across construction, so racing callers wait for the one
    /// in-flight attempt instead of constructing duplicates. A failed
    /// attempt leaves the slot empty for the next caller.
    pub async fn get_or_try_init<F, Fut>(&self, init: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut slot = self.slot.lock().await;
        if let Some(instance) = slot.as_ref() {
            return Ok(Arc::clone(instance));
        }
        let instance = Arc::new(init().await?);
        *slot = Some(Arc::clone(&instance));
        Ok(instance)
    }

    /// Drop the held instance so the next `get_or_try_init` rebuilds it.
    /// Returns the evicted instance, if any.
    pub async fn reset(&self) -> Option<Arc<T>> {
        self.slot.lock().await.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_constructs_once() {
        let holder = Arc::new(InstanceHolder::<String>::new());
        let builds = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let holder = Arc::clone(&holder);
            let builds = Arc::clone(&builds);
            handles.push(tokio::spawn(async move {
                holder
                    .get_or_try_init(|| async {
                        builds.fetch_add(1, Ordering::SeqCst);
                        Ok("engine".to_string())
                    })
                    .await
            }));
        }
        for handle in handles {
            assert_eq!(*handle.await.unwrap().unwrap(), "engine");
        }
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_reset_allows_rebuild() {
        let holder = InstanceHolder::<i32>::new();
        holder.get_or_try_init(|| async { Ok(1) }).await.unwrap();
        assert_eq!(holder.reset().await.as_deref(), Some(&1));
        assert!(holder.get().await.is_none());

        let rebuilt = holder.get_or_try_init(|| async { Ok(2) }).await.unwrap();
        assert_eq!(*rebuilt, 2);
    }

    #[tokio::test]
    async fn test_failed_init_leaves_slot_empty() {
        let holder = InstanceHolder::<i32>::new();
        let failed = holder
            .get_or_try_init(|| async {
                Err(crate::error::PayloadAuthError::Config("boom".into()))
            })
            .await;
        assert!(failed.is_err());

        let ok = holder.get_or_try_init(|| async { Ok(5) }).await.unwrap();
        assert_eq!(*ok, 5);
    }
}
