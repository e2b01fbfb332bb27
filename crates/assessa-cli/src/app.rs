//! The Assessa CLI application.

use tracing_subscriber::EnvFilter;

use assessa_core::Result;

use crate::cli::{CliArgs, Command};
use crate::config::AssessaConfig;
use crate::config_handlers;
use crate::handlers::{self, EvaluateOptions, IndexOptions, QueryOptions};

// ============================================================================
// AssessaCli
// ============================================================================

/// CLI application holding the loaded configuration.
pub struct AssessaCli {
    name: String,
    config: AssessaConfig,
    version: String,
}

impl AssessaCli {
    /// Create from CLI args, loading config from file/env.
    pub fn from_args(args: &CliArgs) -> Result<Self> {
        let config = AssessaConfig::load(args.config.as_deref())?;
        Ok(Self::new(config))
    }

    /// Create an application around an already-loaded config.
    pub fn new(config: AssessaConfig) -> Self {
        Self {
            name: "assessa".to_string(),
            config,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Get a reference to the loaded config.
    pub fn config(&self) -> &AssessaConfig {
        &self.config
    }

    /// Initialise tracing-based logging.
    ///
    /// Uses `RUST_LOG` if set, otherwise defaults based on verbosity flags.
    /// Library crates log through `log`; the subscriber bridges those records.
    pub fn init_logging(verbose: bool, quiet: bool) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else if quiet {
            EnvFilter::new("warn")
        } else if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        };

        // A subscriber may already be set (e.g. in tests).
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }

    /// Run the CLI with the given arguments.
    pub async fn run(&self, args: CliArgs) -> Result<()> {
        let config = &self.config;

        match args.command {
            Some(Command::Index {
                catalog,
                force,
                check,
            }) => {
                let options = IndexOptions {
                    catalog,
                    force,
                    check,
                };
                handlers::handle_index(config, options).await
            }
            Some(Command::Query {
                text,
                top_k,
                strategy,
                no_learned,
                json,
            }) => {
                let options = QueryOptions {
                    text,
                    top_k,
                    strategy,
                    use_learned: !no_learned,
                    json,
                };
                handlers::handle_query(config, options).await
            }
            Some(Command::Train { labels, output }) => {
                handlers::handle_train(config, &labels, output.as_deref()).await
            }
            Some(Command::Evaluate {
                labels,
                top_k,
                strategy,
                no_learned,
                json,
            }) => {
                let options = EvaluateOptions {
                    labels,
                    top_k,
                    strategy,
                    use_learned: !no_learned,
                    json,
                };
                handlers::handle_evaluate(config, options).await
            }
            Some(Command::Version) => {
                println!("{} {}", self.name, self.version);
                Ok(())
            }
            Some(Command::Health) => handlers::handle_health(config).await,
            Some(Command::Config(config_cmd)) => {
                config_handlers::handle_config_command(args.config.as_deref(), config_cmd.command)
            }
            None => {
                println!("{} {}: use --help for usage", self.name, self.version);
                Ok(())
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::Parser;

    fn app(dir: &std::path::Path) -> AssessaCli {
        AssessaCli::new(AssessaConfig {
            data_dir: Some(dir.to_string_lossy().into_owned()),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_run_version_and_no_command() {
        let dir = tempfile::TempDir::new().unwrap();
        let cli = app(dir.path());
        cli.run(CliArgs::parse_from(["assessa", "version"])).await.unwrap();
        cli.run(CliArgs::parse_from(["assessa"])).await.unwrap();
    }

    #[tokio::test]
    async fn test_run_query_without_index_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let cli = app(dir.path());
        let result = cli
            .run(CliArgs::parse_from(["assessa", "query", "java developer"]))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_run_index_then_query() {
        let dir = tempfile::TempDir::new().unwrap();
        let catalog = dir.path().join("items.json");
        std::fs::write(
            &catalog,
            r#"[{"canonical_url": "https://www.shl.com/products/product-catalog/view/java-8-new/",
                 "name": "Java 8 (New)"}]"#,
        )
        .unwrap();
        let cli = app(dir.path());

        cli.run(CliArgs::parse_from([
            "assessa",
            "index",
            "--catalog",
            catalog.to_str().unwrap(),
        ]))
        .await
        .unwrap();
        cli.run(CliArgs::parse_from(["assessa", "query", "java", "--json"]))
            .await
            .unwrap();
    }

    #[test]
    fn test_config_accessor() {
        let cli = AssessaCli::new(AssessaConfig::default());
        assert_eq!(cli.config().project_name, "assessa");
    }
}
