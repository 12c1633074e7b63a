use crate::cli::Commands;
use crate::config::Config;
use anyhow::{Context, Result};
use skillroute_router::{spawn_reload_watcher, Dispatcher, RegistryHandle};
use skillroute_skills::{scaffold_skill, validate_skill_dir};
use skillroute_types::{ContentSource, DispatchResult};
use std::fmt;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Command runner - owns the configuration for one invocation
pub struct SkillRouteService {
    config: Config,
}

impl SkillRouteService {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run one command; `Ok(false)` means the command ran but failed its check
    pub async fn run(self, command: Commands) -> Result<bool> {
        match command {
            Commands::Route {
                utterance,
                deep,
                json,
            } => {
                self.route(&utterance.join(" "), deep, json).await?;
                Ok(true)
            }
            Commands::Serve { deep } => {
                self.serve(deep).await?;
                Ok(true)
            }
            Commands::List { json } => {
                self.list(json).await?;
                Ok(true)
            }
            Commands::Show { id } => {
                self.show(&id).await?;
                Ok(true)
            }
            Commands::Validate { path, strict } => Ok(validate(&path, strict)),
            Commands::Init { name, path } => {
                let created = scaffold_skill(&name, &path)?;
                println!("Created skill '{}' at {}", name, created.display());
                println!("Edit {} and run `skillroute validate` when done.", created.join("SKILL.md").display());
                Ok(true)
            }
        }
    }

    async fn load_handle(&self) -> Result<RegistryHandle> {
        let builder = self.config.skills.builder();
        let handle = RegistryHandle::load(builder)
            .await
            .context("Failed to load skills")?;
        Ok(handle)
    }

    async fn dispatcher(&self) -> Result<Dispatcher> {
        let handle = self.load_handle().await?;
        Ok(Dispatcher::new(handle, &self.config.router)?)
    }

    async fn route(&self, utterance: &str, deep: bool, json: bool) -> Result<()> {
        let dispatcher = self.dispatcher().await?;
        let deep = deep || self.config.router.deep_context_load;
        let result = dispatcher.dispatch_with(utterance, deep).await?;

        if json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            print!("{}", Rendered(&result));
        }
        Ok(())
    }

    /// One JSON result per stdin line until EOF or Ctrl+C
    async fn serve(&self, deep: bool) -> Result<()> {
        let dispatcher = self.dispatcher().await?;
        let deep = deep || self.config.router.deep_context_load;

        let cancel = CancellationToken::new();
        let watcher = self
            .config
            .router
            .reload_interval()
            .map(|interval| spawn_reload_watcher(dispatcher.handle().clone(), interval, cancel.clone()));

        info!(
            skills = dispatcher.handle().current().await.len(),
            deep, "Serving dispatch requests on stdin"
        );

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();

        loop {
            let line = tokio::select! {
                _ = signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
                line = lines.next_line() => line.context("Failed to read stdin")?,
            };

            let Some(line) = line else {
                break;
            };
            let utterance = line.trim();
            if utterance.is_empty() {
                continue;
            }

            let output = match dispatcher.dispatch_with(utterance, deep).await {
                Ok(result) => serde_json::to_string(&result)?,
                Err(e) => {
                    warn!("Dispatch failed: {}", e);
                    serde_json::json!({ "error": e.to_string() }).to_string()
                }
            };

            stdout.write_all(output.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }

        cancel.cancel();
        if let Some(watcher) = watcher {
            if let Err(e) = watcher.await {
                error!("Reload watcher ended abnormally: {}", e);
            }
        }

        info!("Shutting down");
        Ok(())
    }

    async fn list(&self, json: bool) -> Result<()> {
        let registry = self.load_handle().await?.current().await;

        if json {
            let skills: Vec<_> = registry
                .all()
                .iter()
                .map(|s| {
                    serde_json::json!({
                        "id": s.id,
                        "category": s.category,
                        "description": s.description,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&skills)?);
            return Ok(());
        }

        if registry.is_empty() {
            println!("No skills found");
            return Ok(());
        }

        print!("{}", registry.summary_listing(&self.config.router.explicit_sigil));
        println!();
        for (category, ids) in registry.by_category() {
            println!("{}: {}", category, ids.join(", "));
        }
        Ok(())
    }

    async fn show(&self, id: &str) -> Result<()> {
        let registry = self.load_handle().await?.current().await;
        let skill = registry.lookup(id)?;

        println!("id:          {}", skill.id);
        println!("category:    {}", skill.category);
        println!("manifest:    {}", skill.manifest_path.display());
        println!("description: {}", skill.description);
        println!("triggers:");
        for phrase in &skill.trigger_phrases {
            println!("  - {}", phrase);
        }
        if !skill.referenced_docs.is_empty() {
            println!("references:");
            for path in &skill.referenced_docs {
                println!("  - {}", path);
            }
        }
        Ok(())
    }
}

fn validate(path: &Path, strict: bool) -> bool {
    let report = validate_skill_dir(path);
    print!("{}", report);

    let passed = report.passed(strict);
    if passed {
        println!("Skill is valid");
    } else if strict && report.errors().next().is_none() {
        println!("Validation failed (strict mode treats warnings as errors)");
    } else {
        println!("Validation failed");
    }
    passed
}

/// Human-readable dispatch result
struct Rendered<'a>(&'a DispatchResult);

impl fmt::Display for Rendered<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.0;
        let mode = serde_json::to_value(result.mode)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();

        writeln!(f, "mode: {}", mode)?;
        if let Some(id) = &result.selected_skill_id {
            writeln!(f, "selected: {} (confidence {:.2})", id, result.confidence.unwrap_or_default())?;
        }
        if let Some(args) = result.args.as_deref().filter(|a| !a.is_empty()) {
            writeln!(f, "args: {}", args)?;
        }

        if !result.alternatives.is_empty() {
            writeln!(f, "candidates:")?;
            for candidate in &result.alternatives {
                write!(f, "  - {} {:.3}", candidate.skill_id, candidate.score)?;
                if let Some(phrase) = &candidate.matched_phrase {
                    write!(f, " [{}]", phrase)?;
                }
                if candidate.ambiguous {
                    write!(f, " (ambiguous)")?;
                }
                writeln!(f)?;
            }
        }

        for block in &result.loaded_content {
            match &block.source {
                ContentSource::Body => writeln!(f, "--- SKILL.md ---")?,
                ContentSource::Reference(path) => writeln!(f, "--- {} ---", path)?,
            }
            f.write_str(&block.text)?;
            if !block.text.ends_with('\n') {
                writeln!(f)?;
            }
        }

        for warning in &result.warnings {
            writeln!(f, "warning: {}", warning)?;
        }
        Ok(())
    }
}
