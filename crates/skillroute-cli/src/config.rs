use anyhow::{Context, Result};
use serde::Deserialize;
use skillroute_logging::LogFormat;
use skillroute_router::RouterConfig;
use skillroute_skills::RegistryBuilder;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default config template created when no config exists
const DEFAULT_CONFIG: &str = r#"
[skills]
directories = []               # Extra skills directories; missing ones are an error
include_personal = true        # ~/.skillroute/skills
include_project = true         # ./.skillroute/skills

[router]
match_threshold = 0.15
ambiguity_epsilon = 0.05
deep_context_load = false
explicit_sigil = "/"
max_alternatives = 5
load_timeout_ms = 5000
read_retries = 1
reload_interval_secs = 0       # > 0 enables the reload watcher in `serve`

[logging]
level = "info"  # trace, debug, info, warn, error
format = "pretty"  # or "json"
"#;

#[derive(Debug, Deserialize, Clone)]
pub struct SkillsConfig {
    #[serde(default)]
    pub directories: Vec<String>,
    #[serde(default = "default_true")]
    pub include_personal: bool,
    #[serde(default = "default_true")]
    pub include_project: bool,
}

fn default_true() -> bool {
    true
}

impl Default for SkillsConfig {
    fn default() -> Self {
        Self {
            directories: Vec::new(),
            include_personal: true,
            include_project: true,
        }
    }
}

impl SkillsConfig {
    /// Registry builder for the configured directories
    pub fn builder(&self) -> RegistryBuilder {
        let mut builder = RegistryBuilder::new();
        for dir in &self.directories {
            builder = builder.add_directory(expand_tilde(dir));
        }
        if self.include_personal {
            builder = builder.with_personal_skills();
        }
        if self.include_project {
            builder = builder.with_project_skills();
        }
        builder
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub skills: SkillsConfig,
    #[serde(default)]
    pub router: RouterConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `~/skills` -> `/home/me/skills`; other paths unchanged
pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix('~'), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest.trim_start_matches(['/', '\\'])),
        _ => PathBuf::from(path),
    }
}

impl Config {
    /// Get the global config path: ~/.skillroute/skillroute.toml
    fn global_config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        Ok(home.join(".skillroute").join("skillroute.toml"))
    }

    /// Ensure global config directory and file exist, creating defaults if needed
    fn ensure_global_config() -> Result<PathBuf> {
        let config_path = Self::global_config_path()?;
        let config_dir = config_path
            .parent()
            .context("Global config path has no parent directory")?;

        if !config_dir.exists() {
            fs::create_dir_all(config_dir)
                .with_context(|| format!("Failed to create {}", config_dir.display()))?;
            eprintln!("Created config directory: {}", config_dir.display());
        }

        if !config_path.exists() {
            fs::write(&config_path, DEFAULT_CONFIG.trim())
                .with_context(|| format!("Failed to write {}", config_path.display()))?;
            eprintln!("Created default config: {}", config_path.display());
        }

        Ok(config_path)
    }

    /// Load configuration with layered approach:
    /// 1. Global config: ~/.skillroute/skillroute.toml (auto-created if missing)
    /// 2. Local override: ./skillroute.toml (optional)
    /// 3. `--config FILE` (required when given)
    /// 4. Environment variables with the SKILLROUTE__ prefix
    /// 5. SKILLROUTE_SKILLS_DIR (highest priority)
    pub fn load(extra: Option<&Path>) -> Result<Self> {
        // Load .env file from current directory
        dotenvy::dotenv().ok();

        let global_config_path = Self::ensure_global_config()?;

        let mut config_builder = config::Config::builder()
            .add_source(config::File::from(global_config_path))
            .add_source(config::File::with_name("skillroute").required(false));

        if let Some(path) = extra {
            config_builder = config_builder.add_source(config::File::from(path.to_path_buf()));
        }

        config_builder = config_builder.add_source(
            config::Environment::with_prefix("SKILLROUTE")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        if let Ok(dir) = env::var("SKILLROUTE_SKILLS_DIR") {
            config_builder = config_builder.set_override("skills.directories", vec![dir])?;
        }

        let config: Self = config_builder
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        config.router.validate()?;
        Ok(config)
    }
}
