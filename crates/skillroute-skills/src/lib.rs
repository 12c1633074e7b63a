//! `SkillRoute` Skills Registry
//!
//! Discovers skill manifests (`SKILL.md` with YAML front-matter) and turns them
//! into an immutable, indexed registry.
//!
//! ## Features
//!
//! - Recursive discovery under one or more skills directories, or from an
//!   embedded bundle
//! - Trigger phrase extraction from descriptions ("should be used when X, Y, or Z")
//! - "Load `references/...`" detection for on-demand context
//! - Aho-Corasick trigger index built once per registry
//! - Authoring tools: validation reports and new-skill scaffolding
//!
//! ## Layout
//!
//! ```text
//! skills/
//!   engineering/
//!     code-review/
//!       SKILL.md
//!       references/checklist.md
//! ```

#![deny(unsafe_code, dead_code, unused_imports, unused_variables, missing_docs)]

pub mod error;
pub mod index;
pub mod manifest;
pub mod references;
pub mod registry;
pub mod scaffold;
pub mod text;
pub mod triggers;
pub mod validate;

pub use error::{LoadError, SkillError};
pub use index::{TriggerHit, TriggerIndex};
pub use manifest::{ManifestParser, MANIFEST_FILE};
pub use registry::{RegistryBuilder, SkillRegistry};
pub use scaffold::scaffold_skill;
pub use validate::{validate_skill_dir, Severity, ValidationIssue, ValidationReport};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{LoadError, RegistryBuilder, SkillError, SkillRegistry};
}
