//! CLI argument parsing and command definitions.

use clap::{Parser, Subcommand};

use assessa_engine::RetrievalStrategy;

// ============================================================================
// CLI argument types
// ============================================================================

/// Top-level CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "assessa", author, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file.
    #[arg(short, long, env = "ASSESSA_CONFIG")]
    pub config: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-essential output.
    #[arg(short, long)]
    pub quiet: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Embed the catalog and write the index artifacts.
    Index {
        /// Catalog records file (JSON array). Defaults to `catalog_path` in
        /// the config.
        #[arg(long)]
        catalog: Option<String>,

        /// Rebuild even if the index is fresh.
        #[arg(short, long)]
        force: bool,

        /// Report index freshness without rebuilding.
        #[arg(long)]
        check: bool,
    },

    /// Rank the catalog for a hiring query.
    Query {
        /// Query text or job description.
        text: String,

        /// Number of results.
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Retrieval strategy: hybrid or ensemble.
        #[arg(short, long, default_value = "hybrid")]
        strategy: RetrievalStrategy,

        /// Skip the learned reranker for this query.
        #[arg(long)]
        no_learned: bool,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Train the learned reranker from labeled queries.
    Train {
        /// Labeled queries CSV (`Query`, `Assessment_url`).
        #[arg(short, long)]
        labels: String,

        /// Model output path. Defaults to the configured model path.
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Measure recall@k against labeled queries.
    Evaluate {
        /// Labeled queries CSV (`Query`, `Assessment_url`).
        #[arg(short, long)]
        labels: String,

        /// Cutoff.
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Retrieval strategy: hybrid or ensemble.
        #[arg(short, long, default_value = "hybrid")]
        strategy: RetrievalStrategy,

        /// Skip the learned reranker.
        #[arg(long)]
        no_learned: bool,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print version information.
    Version,

    /// Load the engine and report its status.
    Health,

    /// Configuration operations.
    Config(ConfigCommand),
}

/// Config-specific subcommands.
#[derive(Parser, Debug)]
pub struct ConfigCommand {
    /// Config subcommand to execute.
    #[command(subcommand)]
    pub command: ConfigAction,
}

/// Available config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the resolved config file path.
    Path,

    /// Get a configuration value by dotted key.
    Get {
        /// Dotted key (e.g., "engine.retrieval.search_depth").
        key: String,
    },

    /// Set a configuration value by dotted key.
    Set {
        /// Dotted key (e.g., "engine.retrieval.search_depth").
        key: String,

        /// Value to set.
        value: String,
    },

    /// Create a default configuration file.
    Init {
        /// Output file path (defaults to XDG config path).
        #[arg(short, long)]
        file: Option<String>,

        /// Overwrite existing file.
        #[arg(long)]
        force: bool,
    },

    /// Export configuration as environment variables.
    Export {
        /// Format as Docker --env flags.
        #[arg(long)]
        docker_env: bool,
    },
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_args_default() {
        let args = CliArgs::parse_from(["assessa"]);
        assert!(args.config.is_none());
        assert!(!args.verbose);
        assert!(!args.quiet);
        assert!(args.command.is_none());
    }

    #[test]
    fn test_global_flags() {
        let args = CliArgs::parse_from(["assessa", "-v", "--config", "/tmp/a.toml", "version"]);
        assert!(args.verbose);
        assert_eq!(args.config.as_deref(), Some("/tmp/a.toml"));
        assert!(matches!(args.command, Some(Command::Version)));
    }

    #[test]
    fn test_query_command() {
        let args = CliArgs::parse_from([
            "assessa",
            "query",
            "Java developer, 40 minutes",
            "-k",
            "5",
            "--strategy",
            "ensemble",
            "--no-learned",
        ]);
        match args.command {
            Some(Command::Query {
                text,
                top_k,
                strategy,
                no_learned,
                json,
            }) => {
                assert_eq!(text, "Java developer, 40 minutes");
                assert_eq!(top_k, Some(5));
                assert_eq!(strategy, RetrievalStrategy::Ensemble);
                assert!(no_learned);
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_query_rejects_unknown_strategy() {
        let result = CliArgs::try_parse_from(["assessa", "query", "x", "--strategy", "fused"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_index_command() {
        let args = CliArgs::parse_from(["assessa", "index", "--catalog", "items.json", "--force"]);
        match args.command {
            Some(Command::Index {
                catalog,
                force,
                check,
            }) => {
                assert_eq!(catalog.as_deref(), Some("items.json"));
                assert!(force);
                assert!(!check);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_train_and_evaluate_commands() {
        let args = CliArgs::parse_from(["assessa", "train", "--labels", "train.csv"]);
        assert!(matches!(args.command, Some(Command::Train { output: None, .. })));

        let args = CliArgs::parse_from(["assessa", "evaluate", "-l", "test.csv", "-k", "10"]);
        match args.command {
            Some(Command::Evaluate { labels, top_k, strategy, .. }) => {
                assert_eq!(labels, "test.csv");
                assert_eq!(top_k, Some(10));
                assert_eq!(strategy, RetrievalStrategy::Hybrid);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_config_set() {
        let args = CliArgs::parse_from(["assessa", "config", "set", "vector.model", "bge"]);
        match args.command {
            Some(Command::Config(ConfigCommand {
                command: ConfigAction::Set { key, value },
            })) => {
                assert_eq!(key, "vector.model");
                assert_eq!(value, "bge");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
