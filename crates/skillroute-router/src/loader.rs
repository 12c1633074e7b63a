//! Context loading
//!
//! Produces the content handed to the agent for a selected skill: the body
//! always, plus the referenced documents in deep mode. Reference failures
//! never fail the load; each one becomes a [`MissingReference`] warning.

use async_trait::async_trait;
use futures::future::join_all;
use skillroute_skills::references::is_contained_relative;
use skillroute_types::{ContentBlock, MissingReference, SkillDefinition};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::RouterConfig;

/// Read access to skill files
#[async_trait]
pub trait FileAccessor: Send + Sync {
    /// Read a whole UTF-8 file
    async fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// Reads from the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FsAccessor;

#[async_trait]
impl FileAccessor for FsAccessor {
    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        tokio::fs::read_to_string(path).await
    }
}

/// In-memory files, for embedded bundles and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryAccessor {
    files: HashMap<PathBuf, String>,
}

impl MemoryAccessor {
    /// Empty bundle
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file
    pub fn insert(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }

    /// Builder-style [`MemoryAccessor::insert`]
    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.insert(path, content);
        self
    }
}

#[async_trait]
impl FileAccessor for MemoryAccessor {
    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("{} not in bundle", path.display()))
        })
    }
}

/// Result of resolving one skill
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedContent {
    /// Body first, then references in declaration order
    pub blocks: Vec<ContentBlock>,
    /// One entry per reference that could not be read
    pub warnings: Vec<MissingReference>,
}

/// Resolves skill content through a [`FileAccessor`]
#[derive(Debug, Clone)]
pub struct ContextLoader {
    timeout: Duration,
    retries: u32,
}

impl ContextLoader {
    /// `timeout` bounds each read attempt; transient failures are retried `retries` times
    pub fn new(timeout: Duration, retries: u32) -> Self {
        Self { timeout, retries }
    }

    /// Loader using the configured timeout and retry count
    pub fn from_config(config: &RouterConfig) -> Self {
        Self::new(config.load_timeout(), config.read_retries)
    }

    /// Body block, plus every referenced document when `deep`
    ///
    /// References are read concurrently but emitted in declaration order.
    pub async fn resolve(
        &self,
        skill: &SkillDefinition,
        fs: &dyn FileAccessor,
        deep: bool,
    ) -> LoadedContent {
        let mut loaded = LoadedContent {
            blocks: vec![ContentBlock::body(skill.body.clone())],
            warnings: Vec::new(),
        };

        if !deep || skill.referenced_docs.is_empty() {
            return loaded;
        }

        let reads = skill
            .referenced_docs
            .iter()
            .map(|path| self.read_reference(skill, path, fs));
        let results = join_all(reads).await;

        for (path, result) in skill.referenced_docs.iter().zip(results) {
            match result {
                Ok(text) => loaded.blocks.push(ContentBlock::reference(path.clone(), text)),
                Err(reason) => {
                    warn!(skill = %skill.id, path = %path, reason = %reason, "reference not loaded");
                    loaded.warnings.push(MissingReference {
                        skill_id: skill.id.clone(),
                        path: path.clone(),
                        reason,
                    });
                }
            }
        }

        debug!(
            skill = %skill.id,
            blocks = loaded.blocks.len(),
            missing = loaded.warnings.len(),
            "context loaded"
        );
        loaded
    }

    async fn read_reference(
        &self,
        skill: &SkillDefinition,
        relative: &str,
        fs: &dyn FileAccessor,
    ) -> Result<String, String> {
        if !is_contained_relative(relative) {
            return Err("path escapes the skill directory".to_string());
        }

        let path = skill.root.join(relative);
        let attempts = self.retries.saturating_add(1);

        for attempt in 1..=attempts {
            let last = attempt == attempts;
            match tokio::time::timeout(self.timeout, fs.read_to_string(&path)).await {
                Ok(Ok(text)) => return Ok(text),
                Ok(Err(e)) if is_transient(&e) && !last => {
                    debug!(path = %path.display(), attempt, error = %e, "transient read failure, retrying");
                }
                Ok(Err(e)) => return Err(e.to_string()),
                Err(_) if !last => {
                    debug!(path = %path.display(), attempt, "read timed out, retrying");
                }
                Err(_) => return Err(format!("timed out after {}ms", self.timeout.as_millis())),
            }
        }

        Err("no read attempted".to_string())
    }
}

impl Default for ContextLoader {
    fn default() -> Self {
        Self::from_config(&RouterConfig::default())
    }
}

fn is_transient(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::Interrupted | io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use skillroute_types::{Category, ContentSource};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn skill(references: &[&str]) -> SkillDefinition {
        SkillDefinition {
            id: "api-docs".to_string(),
            description: "Use when documenting APIs.".to_string(),
            trigger_phrases: vec!["documenting apis".to_string()],
            body: "# API Docs\n".to_string(),
            referenced_docs: references.iter().map(|r| r.to_string()).collect(),
            category: Category::Documentation,
            root: PathBuf::from("/bundle/api-docs"),
            manifest_path: PathBuf::from("/bundle/api-docs/SKILL.md"),
        }
    }

    /// Fails the first read of every path with the given kind
    struct Flaky {
        inner: MemoryAccessor,
        kind: io::ErrorKind,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl FileAccessor for Flaky {
        async fn read_to_string(&self, path: &Path) -> io::Result<String> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(io::Error::new(self.kind, "flaky"));
            }
            self.inner.read_to_string(path).await
        }
    }

    struct Stalled;

    #[async_trait]
    impl FileAccessor for Stalled {
        async fn read_to_string(&self, _path: &Path) -> io::Result<String> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(String::new())
        }
    }

    #[tokio::test]
    async fn test_shallow_load_is_body_only() {
        let loaded = ContextLoader::default()
            .resolve(&skill(&["references/a.md"]), &MemoryAccessor::new(), false)
            .await;
        assert_eq!(loaded.blocks, vec![ContentBlock::body("# API Docs\n")]);
        assert!(loaded.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_deep_load_keeps_declaration_order() {
        let fs = MemoryAccessor::new()
            .with_file("/bundle/api-docs/references/b.md", "B")
            .with_file("/bundle/api-docs/references/a.md", "A");
        let loaded = ContextLoader::default()
            .resolve(&skill(&["references/b.md", "references/a.md"]), &fs, true)
            .await;

        let sources: Vec<_> = loaded.blocks.iter().map(|b| b.source.clone()).collect();
        assert_eq!(
            sources,
            vec![
                ContentSource::Body,
                ContentSource::Reference("references/b.md".to_string()),
                ContentSource::Reference("references/a.md".to_string()),
            ]
        );
        assert_eq!(loaded.blocks[1].text, "B");
    }

    #[tokio::test]
    async fn test_one_warning_per_missing_reference() {
        let fs = MemoryAccessor::new().with_file("/bundle/api-docs/references/a.md", "A");
        let loaded = ContextLoader::default()
            .resolve(
                &skill(&["references/a.md", "references/gone.md", "references/also-gone.md"]),
                &fs,
                true,
            )
            .await;

        assert_eq!(loaded.blocks.len(), 2);
        let missing: Vec<_> = loaded.warnings.iter().map(|w| w.path.as_str()).collect();
        assert_eq!(missing, vec!["references/gone.md", "references/also-gone.md"]);
        assert!(loaded.warnings.iter().all(|w| w.skill_id == "api-docs"));
    }

    #[tokio::test]
    async fn test_escaping_reference_refused() {
        let fs = MemoryAccessor::new().with_file("/bundle/secret.md", "nope");
        let loaded = ContextLoader::default()
            .resolve(&skill(&["../secret.md"]), &fs, true)
            .await;
        assert_eq!(loaded.blocks.len(), 1);
        assert_eq!(loaded.warnings[0].reason, "path escapes the skill directory");
    }

    #[tokio::test]
    async fn test_transient_failure_retried_once() {
        let fs = Flaky {
            inner: MemoryAccessor::new().with_file("/bundle/api-docs/references/a.md", "A"),
            kind: io::ErrorKind::Interrupted,
            calls: AtomicUsize::new(0),
        };
        let loaded = ContextLoader::default()
            .resolve(&skill(&["references/a.md"]), &fs, true)
            .await;
        assert_eq!(loaded.blocks.len(), 2);
        assert_eq!(fs.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_permanent_failure_not_retried() {
        let fs = Flaky {
            inner: MemoryAccessor::new().with_file("/bundle/api-docs/references/a.md", "A"),
            kind: io::ErrorKind::PermissionDenied,
            calls: AtomicUsize::new(0),
        };
        let loaded = ContextLoader::default()
            .resolve(&skill(&["references/a.md"]), &fs, true)
            .await;
        assert_eq!(loaded.warnings.len(), 1);
        assert_eq!(fs.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_read_times_out() {
        let loader = ContextLoader::new(Duration::from_millis(50), 1);
        let loaded = loader.resolve(&skill(&["references/a.md"]), &Stalled, true).await;
        assert_eq!(loaded.blocks.len(), 1);
        assert_eq!(loaded.warnings[0].reason, "timed out after 50ms");
    }

    #[tokio::test]
    async fn test_fs_accessor_reads_disk() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("a.md"), "disk").unwrap();
        let text = FsAccessor.read_to_string(&tmp.path().join("a.md")).await.unwrap();
        assert_eq!(text, "disk");
    }
}
