//! CLI runner - executes commands

use crate::catalog::Catalog;
use crate::cli::commands::{Cli, Commands};
use crate::config::TapConfig;
use crate::context::RunContext;
use crate::error::{Error, Result};
use crate::state::State;
use crate::sync::Tap;
use std::path::Path;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Discover => self.discover(),
            Commands::Sync { catalog } => self.sync(catalog).await,
        }
    }

    /// Load configuration from inline JSON or file
    fn load_config(&self) -> Result<TapConfig> {
        if let Some(json) = &self.cli.config_json {
            return TapConfig::from_json(json);
        }
        if let Some(path) = &self.cli.config {
            return TapConfig::from_file(path);
        }
        Err(Error::config(
            "Config not specified (use --config or --config-json)",
        ))
    }

    /// Load input state from inline JSON or file; a fresh run starts empty
    fn load_state(&self) -> Result<State> {
        if let Some(json) = &self.cli.state_json {
            return serde_json::from_str(json)
                .map_err(|e| Error::state(format!("Failed to parse state JSON: {e}")));
        }
        if let Some(path) = &self.cli.state {
            if path.exists() {
                let contents = std::fs::read_to_string(path).map_err(|e| {
                    Error::state(format!("Failed to read state file {}: {e}", path.display()))
                })?;
                return serde_json::from_str(&contents)
                    .map_err(|e| Error::state(format!("Failed to parse state file: {e}")));
            }
        }
        Ok(State::new())
    }

    /// Print the catalog of available streams
    fn discover(&self) -> Result<()> {
        let config = self.load_config()?;
        let tap = Tap::from_config(&config);
        let catalog = tap.discover();
        println!("{}", serde_json::to_string_pretty(&catalog)?);
        Ok(())
    }

    /// Run a sync against a catalog
    async fn sync(&self, catalog_path: &Path) -> Result<()> {
        let config = self.load_config()?;
        let state = self.load_state()?;
        let catalog = Catalog::from_file(catalog_path)?;

        let tap = Tap::from_config(&config);
        let mut ctx = RunContext::new(config, state)?;
        ctx.set_catalog(catalog);

        let stats = tap.sync(&mut ctx).await?;
        info!(
            records = stats.records_synced,
            streams = stats.streams_synced,
            skipped = stats.streams_skipped,
            duration_ms = stats.duration_ms,
            "Sync complete"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn cli_with(config_json: Option<&str>, state_json: Option<&str>) -> Cli {
        Cli {
            config: None,
            config_json: config_json.map(String::from),
            state: None,
            state_json: state_json.map(String::from),
            command: Commands::Discover,
        }
    }

    #[test]
    fn test_load_config_inline() {
        let runner = Runner::new(cli_with(Some(r#"{ "start_date": "2021-01-01" }"#), None));
        let config = runner.load_config().unwrap();
        assert_eq!(config.start_date().unwrap(), "2021-01-01");
    }

    #[test]
    fn test_load_config_missing() {
        let runner = Runner::new(cli_with(None, None));
        assert!(runner.load_config().is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "start_date": "2021-01-01" }}"#).unwrap();

        let mut cli = cli_with(None, None);
        cli.config = Some(file.path().to_path_buf());
        let config = Runner::new(cli).load_config().unwrap();
        assert_eq!(config.start_date().unwrap(), "2021-01-01");
    }

    #[test]
    fn test_load_state_defaults_to_empty() {
        let runner = Runner::new(cli_with(None, None));
        let state = runner.load_state().unwrap();
        assert!(state.streams.is_empty());
    }

    #[test]
    fn test_load_state_missing_file_is_fresh_run() {
        let mut cli = cli_with(None, None);
        cli.state = Some("/nonexistent/state.json".into());
        let state = Runner::new(cli).load_state().unwrap();
        assert!(state.streams.is_empty());
    }

    #[test]
    fn test_load_state_inline() {
        let runner = Runner::new(cli_with(
            None,
            Some(r#"{ "contacts": { "bookmarks": { "updated_at": "2021-01-01" } } }"#),
        ));
        let state = runner.load_state().unwrap();
        assert!(state.get_bookmark("contacts", "updated_at").is_some());
    }

    #[test]
    fn test_load_state_invalid_json() {
        let runner = Runner::new(cli_with(None, Some("{ nope")));
        assert!(runner.load_state().is_err());
    }
}
