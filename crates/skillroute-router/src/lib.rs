//! `SkillRoute` Router
//!
//! Picks the skill an utterance is asking for and loads its content.
//!
//! ## Flow
//!
//! ```text
//! utterance ─▶ ExplicitParser ──(/skill-id args)──────────────┐
//!                  │ otherwise                                 ▼
//!                  └─▶ IntentMatcher ─▶ candidates ─▶ ContextLoader ─▶ DispatchResult
//! ```
//!
//! The registry is read through a [`RegistryHandle`], so a reload never
//! exposes a half-built registry to an in-flight dispatch.

#![deny(unsafe_code, dead_code, unused_imports, unused_variables, missing_docs)]

pub mod config;
pub mod dispatch;
pub mod error;
pub mod explicit;
pub mod handle;
pub mod loader;
pub mod matcher;

pub use config::RouterConfig;
pub use dispatch::{assemble, Dispatcher, Route};
pub use error::{ConfigError, Result, RouteError};
pub use explicit::ExplicitParser;
pub use handle::{spawn_reload_watcher, RegistryHandle};
pub use loader::{ContextLoader, FileAccessor, FsAccessor, LoadedContent, MemoryAccessor};
pub use matcher::IntentMatcher;
