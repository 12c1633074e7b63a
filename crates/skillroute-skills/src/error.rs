//! Error types for skill loading and lookup

use std::path::PathBuf;
use thiserror::Error;

/// Registry construction errors
///
/// Any of these is fatal to the registry build: a partially loaded registry
/// is never published.
#[derive(Debug, Error)]
pub enum LoadError {
    /// A required skills directory is missing
    #[error("Skills directory {0:?} does not exist or is not a directory")]
    RootNotFound(PathBuf),

    /// A manifest or directory could not be read
    #[error("Failed to read {path:?}: {source}")]
    Io {
        /// Path being read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Front-matter is absent or cannot be parsed
    #[error("Invalid manifest {path:?}: {reason}")]
    InvalidManifest {
        /// Manifest path
        path: PathBuf,
        /// What is wrong with it
        reason: String,
    },

    /// A required front-matter field is absent or empty
    #[error("Manifest {path:?} is missing required field '{field}'")]
    MissingField {
        /// Manifest path
        path: PathBuf,
        /// Field name
        field: &'static str,
    },

    /// The skill name is not a lowercase slug
    #[error(
        "Manifest {path:?} declares invalid skill name '{name}': use lowercase letters, numbers, and hyphens"
    )]
    InvalidName {
        /// Manifest path
        path: PathBuf,
        /// Offending name
        name: String,
    },

    /// Two manifests declare the same id
    #[error("Duplicate skill id '{id}' declared by {first:?} and {second:?}")]
    DuplicateId {
        /// Skill id
        id: String,
        /// Manifest registered first
        first: PathBuf,
        /// Manifest that collided
        second: PathBuf,
    },

    /// A built-in pattern or the trigger automaton failed to compile
    #[error("Failed to compile matcher: {0}")]
    Pattern(String),
}

/// Skills subsystem errors
#[derive(Debug, Error)]
pub enum SkillError {
    /// Registry construction failed
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Lookup of an id that is not registered
    #[error("Skill '{0}' not found")]
    NotFound(String),

    /// A new skill could not be scaffolded
    #[error("Cannot create skill: {0}")]
    Scaffold(String),

    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenient Result type alias
pub type Result<T> = std::result::Result<T, SkillError>;
