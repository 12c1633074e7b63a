//! Shared registry snapshot with atomic reload
//!
//! Readers take a cheap `Arc` clone of the current registry and release the
//! lock immediately, so a dispatch always works against one complete
//! snapshot. A reload builds the new registry off to the side and publishes
//! it with a single write.

use skillroute_skills::{RegistryBuilder, SkillRegistry};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{Result, RouteError};

/// Clonable handle to the current registry
#[derive(Debug, Clone)]
pub struct RegistryHandle {
    current: Arc<RwLock<Arc<SkillRegistry>>>,
    builder: Option<RegistryBuilder>,
}

impl RegistryHandle {
    /// Wrap a prebuilt registry; such a handle cannot reload
    pub fn new(registry: SkillRegistry) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(registry))),
            builder: None,
        }
    }

    /// Build the initial registry from `builder` and keep it for reloads
    pub async fn load(builder: RegistryBuilder) -> Result<Self> {
        let registry = build_blocking(builder.clone()).await?;
        info!(skills = registry.len(), "skill registry loaded");
        Ok(Self {
            current: Arc::new(RwLock::new(Arc::new(registry))),
            builder: Some(builder),
        })
    }

    /// Builder used for reloads; `None` for a fixed registry
    pub fn builder(&self) -> Option<&RegistryBuilder> {
        self.builder.as_ref()
    }

    /// Current snapshot
    pub async fn current(&self) -> Arc<SkillRegistry> {
        self.current.read().await.clone()
    }

    /// Publish `registry`, returning the previous snapshot
    pub async fn replace(&self, registry: SkillRegistry) -> Arc<SkillRegistry> {
        let mut guard = self.current.write().await;
        std::mem::replace(&mut *guard, Arc::new(registry))
    }

    /// Rebuild from the original directories and publish on success
    ///
    /// On failure the previous snapshot stays in place. Returns the number of
    /// skills in the new registry.
    pub async fn reload(&self) -> Result<usize> {
        let builder = self
            .builder
            .clone()
            .ok_or_else(|| RouteError::Reload("registry was not loaded from directories".to_string()))?;

        let registry = build_blocking(builder).await?;
        let count = registry.len();
        self.replace(registry).await;
        info!(skills = count, "skill registry reloaded");
        Ok(count)
    }
}

async fn build_blocking(builder: RegistryBuilder) -> Result<SkillRegistry> {
    let registry = tokio::task::spawn_blocking(move || builder.build())
        .await
        .map_err(|e| RouteError::Reload(e.to_string()))??;
    Ok(registry)
}

async fn fingerprint_blocking(builder: RegistryBuilder) -> Option<u64> {
    tokio::task::spawn_blocking(move || builder.fingerprint())
        .await
        .ok()
}

/// Poll the skill directories every `interval` and reload on change
///
/// Does nothing useful for handles built with [`RegistryHandle::new`]. Stops
/// when `cancel` fires.
pub fn spawn_reload_watcher(
    handle: RegistryHandle,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let Some(builder) = handle.builder().cloned() else {
            warn!("reload watcher started for a registry without directories, exiting");
            return;
        };

        let mut last = fingerprint_blocking(builder.clone()).await;
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticker.tick().await;

        info!(interval_secs = interval.as_secs_f64(), "skill reload watcher started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("skill reload watcher stopping");
                    break;
                }
                _ = ticker.tick() => {
                    let now = fingerprint_blocking(builder.clone()).await;
                    if now == last {
                        continue;
                    }
                    last = now;

                    match handle.reload().await {
                        Ok(count) => debug!(skills = count, "reload after change"),
                        Err(e) => warn!("Skill reload failed, keeping previous registry: {}", e),
                    }
                }
            }
        }
    })
}
