//! Request pipeline stages
//!
//! Interceptors run around every request sent through an [`ApiClient`]. A stage
//! is installed under its key and stays installed while at least one
//! [`StageGuard`] for it is alive, so components that mount the same stage
//! concurrently share a single registration.
//!
//! [`ApiClient`]: super::client::ApiClient

use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::{Arc, Weak};
use tracing::debug;

use crate::error::Result;

#[async_trait]
pub trait Interceptor: Send + Sync {
    /// Stable key; installing a second interceptor with the same key shares the stage
    fn key(&self) -> &'static str;

    /// Runs before the request is sent. An error aborts the request.
    async fn on_request(&self, _request: &mut reqwest::Request) -> Result<()> {
        Ok(())
    }

    /// Runs once the response status is known, before the body is read
    async fn on_response(&self, _response: &reqwest::Response) -> Result<()> {
        Ok(())
    }
}

struct Stage {
    interceptor: Arc<dyn Interceptor>,
    mounts: usize,
}

#[derive(Default)]
pub struct Pipeline {
    stages: RwLock<Vec<Stage>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `interceptor`, or add a mount to the stage already holding its key
    pub fn install(self: &Arc<Self>, interceptor: Arc<dyn Interceptor>) -> StageGuard {
        let key = interceptor.key();
        let mut stages = self.stages.write();

        match stages.iter_mut().find(|stage| stage.interceptor.key() == key) {
            Some(stage) => stage.mounts += 1,
            None => {
                stages.push(Stage { interceptor, mounts: 1 });
                debug!("Installed pipeline stage '{}'", key);
            }
        }

        StageGuard {
            pipeline: Arc::downgrade(self),
            key,
        }
    }

    fn release(&self, key: &'static str) {
        let mut stages = self.stages.write();
        if let Some(pos) = stages.iter().position(|stage| stage.interceptor.key() == key) {
            stages[pos].mounts -= 1;
            if stages[pos].mounts == 0 {
                stages.remove(pos);
                debug!("Removed pipeline stage '{}'", key);
            }
        }
    }

    /// Number of installed stages
    pub fn len(&self) -> usize {
        self.stages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.read().is_empty()
    }

    /// How many live mounts hold the stage with `key`
    pub fn mounts(&self, key: &str) -> usize {
        self.stages
            .read()
            .iter()
            .find(|stage| stage.interceptor.key() == key)
            .map(|stage| stage.mounts)
            .unwrap_or(0)
    }

    /// Interceptors installed right now, in installation order
    pub(crate) fn snapshot(&self) -> Vec<Arc<dyn Interceptor>> {
        self.stages
            .read()
            .iter()
            .map(|stage| stage.interceptor.clone())
            .collect()
    }
}

/// Keeps a stage mounted; dropping it unmounts
#[must_use = "the stage is uninstalled as soon as the guard is dropped"]
pub struct StageGuard {
    pipeline: Weak<Pipeline>,
    key: &'static str,
}

impl StageGuard {
    pub fn key(&self) -> &'static str {
        self.key
    }
}

impl Drop for StageGuard {
    fn drop(&mut self) {
        if let Some(pipeline) = self.pipeline.upgrade() {
            pipeline.release(self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str);

    #[async_trait]
    impl Interceptor for Named {
        fn key(&self) -> &'static str {
            self.0
        }
    }

    #[test]
    fn test_install_and_drop_restores_count() {
        let pipeline = Arc::new(Pipeline::new());
        assert_eq!(pipeline.len(), 0);

        let guard = pipeline.install(Arc::new(Named("auth")));
        assert_eq!(pipeline.len(), 1);
        drop(guard);
        assert_eq!(pipeline.len(), 0);
    }

    #[test]
    fn test_same_key_shares_stage() {
        let pipeline = Arc::new(Pipeline::new());
        let first = pipeline.install(Arc::new(Named("auth")));
        let second = pipeline.install(Arc::new(Named("auth")));
        let other = pipeline.install(Arc::new(Named("trace")));

        assert_eq!(pipeline.len(), 2);
        assert_eq!(pipeline.mounts("auth"), 2);

        drop(first);
        assert_eq!(pipeline.mounts("auth"), 1);
        drop(second);
        assert_eq!(pipeline.mounts("auth"), 0);
        assert_eq!(pipeline.len(), 1);
        drop(other);
        assert!(pipeline.is_empty());
    }

    #[test]
    fn test_repeated_remounts_do_not_accumulate() {
        let pipeline = Arc::new(Pipeline::new());
        for _ in 0..50 {
            let _guard = pipeline.install(Arc::new(Named("auth")));
            assert_eq!(pipeline.len(), 1);
        }
        assert_eq!(pipeline.len(), 0);
    }

    #[test]
    fn test_guard_outliving_pipeline_is_harmless() {
        let pipeline = Arc::new(Pipeline::new());
        let guard = pipeline.install(Arc::new(Named("auth")));
        drop(pipeline);
        drop(guard);
    }
}
