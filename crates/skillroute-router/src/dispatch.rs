//! Dispatch: explicit override, matching, loading and result assembly

use skillroute_skills::SkillRegistry;
use skillroute_types::{DispatchMode, DispatchResult, ExplicitInvocation, MatchCandidate};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::RouterConfig;
use crate::error::Result;
use crate::explicit::ExplicitParser;
use crate::handle::RegistryHandle;
use crate::loader::{ContextLoader, FileAccessor, FsAccessor, LoadedContent};
use crate::matcher::IntentMatcher;

/// How an utterance was routed, before any content is loaded
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    /// `<sigil><id> args` naming a registered skill
    Explicit(ExplicitInvocation),
    /// Ranked candidates, possibly empty
    Matched(Vec<MatchCandidate>),
}

impl Route {
    /// Skill whose content should be loaded, if one was selected
    pub fn selection(&self) -> Option<&str> {
        match self {
            Route::Explicit(invocation) => Some(invocation.skill_id.as_str()),
            Route::Matched(candidates) => candidates
                .first()
                .filter(|top| !top.ambiguous)
                .map(|top| top.skill_id.as_str()),
        }
    }
}

/// Build the result for a route
///
/// `loaded` is only used when the route selects a skill. Alternatives are
/// cut to `max_alternatives`, but ambiguous candidates are always kept.
pub fn assemble(route: Route, loaded: Option<LoadedContent>, max_alternatives: usize) -> DispatchResult {
    match route {
        Route::Explicit(invocation) => {
            let mut result = DispatchResult::new(DispatchMode::Explicit);
            result.alternatives = vec![MatchCandidate::explicit(invocation.skill_id.clone())];
            result.selected_skill_id = Some(invocation.skill_id);
            result.confidence = Some(1.0);
            result.args = Some(invocation.args);
            attach(&mut result, loaded);
            result
        }
        Route::Matched(mut candidates) => {
            let Some(top) = candidates.first().cloned() else {
                return DispatchResult::new(DispatchMode::NoMatch);
            };

            let ambiguous = candidates.iter().take_while(|c| c.ambiguous).count();
            candidates.truncate(max_alternatives.max(ambiguous).max(1));

            if top.ambiguous {
                let mut result = DispatchResult::new(DispatchMode::Ambiguous);
                result.alternatives = candidates;
                return result;
            }

            let mut result = DispatchResult::new(DispatchMode::Matched);
            result.selected_skill_id = Some(top.skill_id);
            result.confidence = Some(top.score);
            result.alternatives = candidates;
            attach(&mut result, loaded);
            result
        }
    }
}

fn attach(result: &mut DispatchResult, loaded: Option<LoadedContent>) {
    if let Some(loaded) = loaded {
        result.loaded_content = loaded.blocks;
        result.warnings = loaded.warnings;
    }
}

/// Routes utterances against the handle's current registry
pub struct Dispatcher {
    handle: RegistryHandle,
    matcher: IntentMatcher,
    explicit: ExplicitParser,
    loader: ContextLoader,
    accessor: Arc<dyn FileAccessor>,
    deep_default: bool,
    max_alternatives: usize,
}

impl Dispatcher {
    /// Validate `config` and read skill files from disk
    pub fn new(handle: RegistryHandle, config: &RouterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            handle,
            matcher: IntentMatcher::from_config(config),
            explicit: ExplicitParser::new(config.explicit_sigil.clone()),
            loader: ContextLoader::from_config(config),
            accessor: Arc::new(FsAccessor),
            deep_default: config.deep_context_load,
            max_alternatives: config.max_alternatives,
        })
    }

    /// Read skill files through `accessor` instead of the filesystem
    pub fn with_accessor(mut self, accessor: Arc<dyn FileAccessor>) -> Self {
        self.accessor = accessor;
        self
    }

    /// Registry handle shared with the reload watcher
    pub fn handle(&self) -> &RegistryHandle {
        &self.handle
    }

    /// Prefix marking an explicit invocation
    pub fn sigil(&self) -> &str {
        self.explicit.sigil()
    }

    /// Explicit override first, then intent matching
    pub fn route(&self, utterance: &str, registry: &SkillRegistry) -> Result<Route> {
        if let Some(invocation) = self.explicit.parse(utterance, registry)? {
            debug!(skill = %invocation.skill_id, "explicit invocation");
            return Ok(Route::Explicit(invocation));
        }
        Ok(Route::Matched(self.matcher.rank(utterance, registry)))
    }

    /// Dispatch with the configured context depth
    pub async fn dispatch(&self, utterance: &str) -> Result<DispatchResult> {
        self.dispatch_with(utterance, self.deep_default).await
    }

    /// Dispatch, loading references when `deep`
    pub async fn dispatch_with(&self, utterance: &str, deep: bool) -> Result<DispatchResult> {
        let registry = self.handle.current().await;
        let route = self.route(utterance, &registry)?;

        let loaded = match route.selection() {
            Some(id) => {
                let skill = registry.lookup(id)?;
                Some(self.loader.resolve(skill, self.accessor.as_ref(), deep).await)
            }
            None => None,
        };

        let result = assemble(route, loaded, self.max_alternatives);
        info!(
            request_id = %result.request_id,
            mode = ?result.mode,
            selected = result.selected_skill_id.as_deref().unwrap_or("-"),
            alternatives = result.alternatives.len(),
            warnings = result.warnings.len(),
            "dispatched"
        );
        Ok(result)
    }
}
