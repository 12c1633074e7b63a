//! SkillRoute Types - Core types shared by the registry, router and CLI
//!
//! Everything here is plain data: skill definitions produced by the registry,
//! match candidates produced by the matcher and the dispatch result handed to
//! the calling agent.

pub mod dispatch;
pub mod skill;

pub use dispatch::{
    ContentBlock, ContentSource, DispatchMode, DispatchResult, ExplicitInvocation,
    MatchCandidate, MissingReference,
};
pub use skill::{Category, SkillDefinition, SkillId};
