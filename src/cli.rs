//! Command-line interface: argument parsing and command handlers.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::config::{load_config, RosterSearchConfig};
use crate::error::Result;
use crate::graph::store::GraphStore;
use crate::http::run_http_server;
use crate::search::{SearchEngine, SearchOutcome, NO_RESULTS};
use crate::types::SearchResult;

#[derive(Debug, Parser)]
#[command(name = "roster-search")]
#[command(about = "Full-text search over officers, agencies and units", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file, merged over user and project config
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// SQLite graph database (overrides config and ROSTER_SEARCH_DB)
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create or upgrade the database schema and print statistics
    Init,

    /// Run one search and print the results
    Search {
        #[arg(value_name = "QUERY")]
        query: String,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Serve the HTTP search endpoint
    Serve {
        /// Address to bind, e.g. 0.0.0.0:8080
        #[arg(long, value_name = "ADDR")]
        addr: Option<String>,
    },
}

impl Cli {
    /// Load config from every source and apply flags on top.
    pub fn resolve_config(&self, project_root: &Path) -> Result<RosterSearchConfig> {
        let mut config = load_config(self.config.as_deref(), project_root)?;
        self.apply_flags(&mut config);
        config.server.validate()?;
        Ok(config)
    }

    pub fn apply_flags(&self, config: &mut RosterSearchConfig) {
        if let Some(db) = &self.db {
            config.database.path = db.clone();
        }
        if let Command::Serve { addr: Some(addr) } = &self.command {
            config.server.addr = addr.clone();
        }
    }
}

/// Dispatch one command.
pub fn run(command: &Command, config: &RosterSearchConfig) -> Result<()> {
    match command {
        Command::Init => {
            println!("{}", cmd_init(config)?);
            Ok(())
        }
        Command::Search { query, json } => {
            println!("{}", cmd_search(config, query, *json)?);
            Ok(())
        }
        Command::Serve { .. } => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(run_http_server(config))
        }
    }
}

/// Apply the schema and describe the store.
pub fn cmd_init(config: &RosterSearchConfig) -> Result<String> {
    let store = GraphStore::new(&config.database.path)?;
    let stats = store.get_stats()?;
    tracing::info!(path = %config.database.path, "schema applied");
    Ok(format!(
        "Database ready at {}: {} entities, {} edges",
        config.database.path, stats.entities, stats.edges
    ))
}

/// Run one search and render the outcome.
pub fn cmd_search(config: &RosterSearchConfig, query: &str, json: bool) -> Result<String> {
    let store = GraphStore::connect(&config.database.path)?;
    let outcome = SearchEngine::new(&store)
        .with_href_prefix(config.server.api_prefix.clone())
        .search(query)?;

    Ok(match (outcome, json) {
        (SearchOutcome::NoResults, true) => {
            serde_json::to_string_pretty(&serde_json::json!({ "message": NO_RESULTS }))?
        }
        (SearchOutcome::NoResults, false) => NO_RESULTS.to_string(),
        (SearchOutcome::Results(results), true) => serde_json::to_string_pretty(&results)?,
        (SearchOutcome::Results(results), false) => render_results(&results),
    })
}

/// Plain-text listing, one block per result.
pub fn render_results(results: &[SearchResult]) -> String {
    let mut out = String::new();
    for (i, r) in results.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&format!("{}. [{}] {}\n", i + 1, r.content_type, r.title));
        if let Some(subtitle) = &r.subtitle {
            out.push_str(&format!("   {subtitle}\n"));
        }
        for detail in r.details.iter().flatten() {
            out.push_str(&format!("   {detail}\n"));
        }
        let updated = r
            .last_updated
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!("   source: {} (updated {updated})\n", r.source));
        out.push_str(&format!("   {}\n", r.href));
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Entity, EntityKind};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn config_for(dir: &TempDir) -> RosterSearchConfig {
        let mut config = RosterSearchConfig::default();
        config.database.path = dir.path().join("roster.db").to_string_lossy().to_string();
        config
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "roster-search",
            "search",
            "smith",
            "--json",
            "--db",
            "x.db",
        ])
        .unwrap();
        assert_eq!(cli.db.as_deref(), Some("x.db"));
        match cli.command {
            Command::Search { query, json } => {
                assert_eq!(query, "smith");
                assert!(json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from([
            "roster-search",
            "--db",
            "flag.db",
            "serve",
            "--addr",
            "0.0.0.0:9999",
        ])
        .unwrap();
        let mut config = RosterSearchConfig::default();
        cli.apply_flags(&mut config);
        assert_eq!(config.database.path, "flag.db");
        assert_eq!(config.server.addr, "0.0.0.0:9999");
    }

    #[test]
    fn search_requires_query_argument() {
        assert!(Cli::try_parse_from(["roster-search", "search"]).is_err());
    }

    #[test]
    fn init_then_search() {
        let dir = TempDir::new().unwrap();
        let config = config_for(&dir);
        let summary = cmd_init(&config).unwrap();
        assert!(summary.contains("0 entities, 0 edges"), "{summary}");

        GraphStore::new(&config.database.path)
            .unwrap()
            .upsert_entity(&Entity::new("u1", &["Unit"]).with_property("name", "Harbor Patrol"))
            .unwrap();

        let text = cmd_search(&config, "harbor", false).unwrap();
        assert!(text.starts_with("1. [Unit] Harbor Patrol"), "{text}");
        assert!(text.contains("Commander: Unknown"));
        assert!(text.contains("/api/v1/units/u1"));

        assert_eq!(cmd_search(&config, "nothing", false).unwrap(), NO_RESULTS);
    }

    #[test]
    fn json_output_keeps_no_results_distinct_from_empty() {
        let dir = TempDir::new().unwrap();
        let config = config_for(&dir);
        let store = GraphStore::new(&config.database.path).unwrap();
        store
            .upsert_entity(&Entity::new("x1", &["Officer", "Unit"]).with_property("name", "Zed"))
            .unwrap();

        let none: serde_json::Value =
            serde_json::from_str(&cmd_search(&config, "nothing", true).unwrap()).unwrap();
        assert_eq!(
            none,
            serde_json::json!({ "message": "No results found matching the query" })
        );

        // An ambiguous hit is dropped, leaving a successful empty list.
        let empty = cmd_search(&config, "zed", true).unwrap();
        assert_eq!(empty, "[]");
    }

    #[test]
    fn blank_search_is_validation_error() {
        let dir = TempDir::new().unwrap();
        let config = config_for(&dir);
        cmd_init(&config).unwrap();
        assert!(cmd_search(&config, "   ", false).unwrap_err().is_validation());
    }

    #[test]
    fn render_officer_without_timestamp() {
        let result = SearchResult {
            uid: "o1".into(),
            title: "John Smith".into(),
            subtitle: Some("White Male, Officer at the Metro PD".into()),
            details: None,
            content_type: EntityKind::Officer,
            source: "Unknown Source".into(),
            last_updated: None,
            href: "/api/v1/officers/o1".into(),
        };
        assert_eq!(
            render_results(&[result]),
            "1. [Officer] John Smith\n   White Male, Officer at the Metro PD\n   source: Unknown Source (updated -)\n   /api/v1/officers/o1"
        );
    }
}
