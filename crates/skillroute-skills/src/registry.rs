//! Skills registry
//!
//! A registry is built in one go from one or more skills directories (or an
//! embedded bundle) and is immutable afterwards. Reloading means building a
//! new registry and swapping it in.

use skillroute_types::{Category, SkillDefinition};
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeSet, HashMap};
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::{debug, info, warn};

use crate::error::{LoadError, SkillError};
use crate::index::TriggerIndex;
use crate::manifest::{category_from_path, ManifestParser, MANIFEST_FILE};
use crate::text::{content_tokens, normalize};

/// Maximum directory depth scanned below a skills root
const MAX_SCAN_DEPTH: usize = 8;

/// A directory to scan for skills
#[derive(Debug, Clone, PartialEq, Eq)]
struct SkillSource {
    path: PathBuf,
    /// Missing required directories fail the build; optional ones are skipped
    required: bool,
}

/// Describes where skills come from; can build a registry any number of times
#[derive(Debug, Clone, Default)]
pub struct RegistryBuilder {
    sources: Vec<SkillSource>,
}

impl RegistryBuilder {
    /// Create a builder with no directories
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a skills directory that must exist
    pub fn add_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.sources.push(SkillSource {
            path: dir.into(),
            required: true,
        });
        self
    }

    /// Add a skills directory that is skipped when absent
    pub fn add_optional_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.sources.push(SkillSource {
            path: dir.into(),
            required: false,
        });
        self
    }

    /// Add personal skills directory: ~/.skillroute/skills/
    pub fn with_personal_skills(self) -> Self {
        if let Some(home) = dirs::home_dir() {
            self.add_optional_directory(home.join(".skillroute").join("skills"))
        } else {
            warn!("Could not find home directory for personal skills");
            self
        }
    }

    /// Add project skills directory: ./.skillroute/skills/
    pub fn with_project_skills(self) -> Self {
        self.add_optional_directory(PathBuf::from(".skillroute/skills"))
    }

    /// Configured directories, in scan order
    pub fn directories(&self) -> impl Iterator<Item = &Path> {
        self.sources.iter().map(|s| s.path.as_path())
    }

    /// Scan all configured directories and build a registry
    pub fn build(&self) -> Result<SkillRegistry, LoadError> {
        info!(
            "Starting skills discovery in {} directories",
            self.sources.len()
        );

        let parser = ManifestParser::new()?;
        let mut assembler = Assembler::default();

        for source in &self.sources {
            if !source.path.is_dir() {
                if source.required {
                    return Err(LoadError::RootNotFound(source.path.clone()));
                }
                debug!("Skills directory does not exist: {:?}", source.path);
                continue;
            }

            let mut manifests = Vec::new();
            collect_manifests(&source.path, 0, &mut manifests)?;

            for manifest_path in manifests {
                let content =
                    std::fs::read_to_string(&manifest_path).map_err(|source| LoadError::Io {
                        path: manifest_path.clone(),
                        source,
                    })?;
                let skill =
                    parser.parse(&manifest_path, &content, category_from_path(&manifest_path))?;
                debug!("Discovered skill: {} at {:?}", skill.id, skill.root);
                assembler.insert(skill)?;
            }
        }

        let registry = assembler.finish()?;
        info!("Discovered {} skills", registry.len());
        Ok(registry)
    }

    /// Hash of every manifest path, size and modification time
    ///
    /// Cheap change detection for reload polling; reference files are read on
    /// demand and do not contribute.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        for source in &self.sources {
            source.path.hash(&mut hasher);
            let mut manifests = Vec::new();
            if source.path.is_dir() && collect_manifests(&source.path, 0, &mut manifests).is_ok() {
                for manifest in manifests {
                    manifest.hash(&mut hasher);
                    if let Ok(meta) = std::fs::metadata(&manifest) {
                        meta.len().hash(&mut hasher);
                        if let Ok(modified) = meta.modified() {
                            modified
                                .duration_since(UNIX_EPOCH)
                                .unwrap_or_default()
                                .hash(&mut hasher);
                        }
                    }
                }
            } else {
                "missing".hash(&mut hasher);
            }
        }

        hasher.finish()
    }
}

/// Recursively collect manifest paths in sorted order
///
/// A directory containing SKILL.md is a skill; its subdirectories
/// (references/, assets/, scripts/) are not scanned further.
fn collect_manifests(dir: &Path, depth: usize, out: &mut Vec<PathBuf>) -> Result<(), LoadError> {
    let manifest = dir.join(MANIFEST_FILE);
    if manifest.is_file() {
        out.push(manifest);
        return Ok(());
    }

    if depth >= MAX_SCAN_DEPTH {
        warn!("Skipping {:?}: deeper than {} levels", dir, MAX_SCAN_DEPTH);
        return Ok(());
    }

    let io_err = |source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut subdirs = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let hidden = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with('.'));
        if path.is_dir() && !hidden {
            subdirs.push(path);
        }
    }
    subdirs.sort();

    for subdir in subdirs {
        collect_manifests(&subdir, depth + 1, out)?;
    }

    Ok(())
}

/// Accumulates skills, enforcing id uniqueness
#[derive(Default)]
struct Assembler {
    skills: Vec<SkillDefinition>,
    by_id: HashMap<String, usize>,
}

impl Assembler {
    fn insert(&mut self, skill: SkillDefinition) -> Result<(), LoadError> {
        if let Some(&existing) = self.by_id.get(&skill.id) {
            return Err(LoadError::DuplicateId {
                id: skill.id,
                first: self.skills[existing].manifest_path.clone(),
                second: skill.manifest_path,
            });
        }

        self.by_id.insert(skill.id.clone(), self.skills.len());
        self.skills.push(skill);
        Ok(())
    }

    fn finish(self) -> Result<SkillRegistry, LoadError> {
        let trigger_index = TriggerIndex::build(&self.skills)?;
        let keywords = self
            .skills
            .iter()
            .map(|s| {
                let mut tokens = content_tokens(&s.description);
                tokens.extend(content_tokens(&normalize(&s.id)));
                tokens
            })
            .collect();

        Ok(SkillRegistry {
            skills: self.skills,
            by_id: self.by_id,
            keywords,
            trigger_index,
        })
    }
}

/// Read-only registry of skill definitions
#[derive(Debug, Clone, Default)]
pub struct SkillRegistry {
    /// Definitions in insertion (scan) order
    skills: Vec<SkillDefinition>,
    by_id: HashMap<String, usize>,
    /// Description + id tokens per skill, parallel to `skills`
    keywords: Vec<BTreeSet<String>>,
    trigger_index: TriggerIndex,
}

impl SkillRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Start describing the directories to load from
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Load every skill below `root`
    pub fn load(root: impl Into<PathBuf>) -> Result<Self, LoadError> {
        RegistryBuilder::new().add_directory(root).build()
    }

    /// Build from in-memory manifests (embedded bundle), keyed by manifest path
    pub fn from_manifests<I, P, S>(manifests: I) -> Result<Self, LoadError>
    where
        I: IntoIterator<Item = (P, S)>,
        P: Into<PathBuf>,
        S: AsRef<str>,
    {
        let parser = ManifestParser::new()?;
        let mut assembler = Assembler::default();

        for (path, content) in manifests {
            let path = path.into();
            let skill = parser.parse(&path, content.as_ref(), category_from_path(&path))?;
            assembler.insert(skill)?;
        }

        assembler.finish()
    }

    /// Get a skill by id
    pub fn get(&self, id: &str) -> Option<&SkillDefinition> {
        self.by_id.get(id).map(|&i| &self.skills[i])
    }

    /// Get a skill by id, failing with `NotFound`
    pub fn lookup(&self, id: &str) -> Result<&SkillDefinition, SkillError> {
        self.get(id)
            .ok_or_else(|| SkillError::NotFound(id.to_string()))
    }

    /// Check whether an id is registered
    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// All skills in stable insertion order
    pub fn all(&self) -> &[SkillDefinition] {
        &self.skills
    }

    /// Position of a skill in insertion order
    pub fn position(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    /// Description and id tokens of the skill at `index`
    pub fn keywords(&self, index: usize) -> Option<&BTreeSet<String>> {
        self.keywords.get(index)
    }

    /// Compiled trigger phrase index
    pub fn trigger_index(&self) -> &TriggerIndex {
        &self.trigger_index
    }

    /// All skill ids in insertion order
    pub fn skill_ids(&self) -> impl Iterator<Item = &str> {
        self.skills.iter().map(|s| s.id.as_str())
    }

    /// Get number of skills
    pub fn len(&self) -> usize {
        self.skills.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    /// Generate the skills list for an agent system prompt
    /// Format:
    /// Available skills (use /{skill-name} to activate):
    /// - skill-name: Description of what this skill does and when to use it
    pub fn summary_listing(&self, sigil: &str) -> String {
        if self.skills.is_empty() {
            return String::new();
        }

        let mut listing = format!("Available skills (use {}{{skill-name}} to activate):\n", sigil);

        let mut sorted: Vec<_> = self.skills.iter().collect();
        sorted.sort_by(|a, b| a.id.cmp(&b.id));

        for skill in sorted {
            listing.push_str(&skill.to_summary());
            listing.push('\n');
        }

        listing
    }

    /// Skills grouped by category, ids sorted within a group
    pub fn by_category(&self) -> Vec<(Category, Vec<&str>)> {
        let mut groups: Vec<(Category, Vec<&str>)> = Vec::new();
        for skill in &self.skills {
            match groups.iter_mut().find(|(c, _)| *c == skill.category) {
                Some((_, ids)) => ids.push(skill.id.as_str()),
                None => groups.push((skill.category, vec![skill.id.as_str()])),
            }
        }
        for (_, ids) in &mut groups {
            ids.sort_unstable();
        }
        groups.sort_by_key(|(c, _)| c.as_str());
        groups
    }
}
