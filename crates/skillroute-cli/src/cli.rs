//! Command-line arguments

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// skillroute -- pick the right skill for a request
#[derive(Parser, Debug)]
#[command(
    name = "skillroute",
    version,
    about = "Route requests to SKILL.md skills and load their context"
)]
pub struct Cli {
    /// Extra configuration file, layered over the global and local ones
    #[arg(long, short, global = true, env = "SKILLROUTE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Dispatch a single utterance
    Route {
        /// The request, e.g. `search confluence for auth docs` or `/code-review`
        #[arg(required = true)]
        utterance: Vec<String>,

        /// Also load referenced documents
        #[arg(long)]
        deep: bool,

        /// Print the dispatch result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Read utterances from stdin, one per line, and write one JSON result per line
    Serve {
        /// Also load referenced documents
        #[arg(long)]
        deep: bool,
    },

    /// List registered skills
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one skill definition
    Show {
        /// Skill id
        id: String,
    },

    /// Check a skill directory for authoring problems
    Validate {
        /// Skill directory containing SKILL.md
        path: PathBuf,

        /// Treat warnings as failures
        #[arg(long)]
        strict: bool,
    },

    /// Create a new skill from the template
    Init {
        /// Skill name (lowercase letters, digits and hyphens)
        name: String,

        /// Parent directory for the new skill
        #[arg(long, default_value = ".")]
        path: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_route_collects_words_and_flags() {
        let cli = Cli::try_parse_from([
            "skillroute",
            "route",
            "/docker-deploy",
            "generate",
            "--deep",
            "manifests",
        ])
        .unwrap_or_else(|e| panic!("{e}"));
        match cli.command {
            Commands::Route {
                utterance, deep, json,
            } => {
                assert_eq!(utterance, vec!["/docker-deploy", "generate", "manifests"]);
                assert!(deep);
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_init_default_path() {
        let cli = Cli::try_parse_from(["skillroute", "init", "my-skill"]).unwrap_or_else(|e| panic!("{e}"));
        assert!(matches!(
            cli.command,
            Commands::Init { ref name, ref path } if name == "my-skill" && path == &PathBuf::from(".")
        ));
    }
}
