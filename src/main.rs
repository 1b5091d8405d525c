//! Mock Resolver - CLI Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use mock_resolver::{InMemoryRuleStore, MockRequest, MockResolver, RuleSetConfig};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(
    name = "mock-resolver",
    about = "Resolve a request against a mock rule set and print the mock result",
    version
)]
struct Args {
    /// Path to rule-set file
    #[arg(short, long, default_value = "mock-rules.yaml")]
    rules: PathBuf,

    /// Project the request belongs to
    #[arg(short, long, default_value = "")]
    project: String,

    /// Environment id (defaults to the project's default environment)
    #[arg(short, long)]
    environment: Option<String>,

    /// HTTP method
    #[arg(short, long, default_value = "GET")]
    method: String,

    /// Request path
    #[arg(long, default_value = "")]
    path: String,

    /// Query parameter as name=value (repeatable)
    #[arg(short, long = "query", value_name = "NAME=VALUE")]
    queries: Vec<String>,

    /// Header as "Name: value" (repeatable)
    #[arg(short = 'H', long = "header", value_name = "NAME: VALUE")]
    headers: Vec<String>,

    /// Request body (parsed as JSON when possible)
    #[arg(short, long)]
    body: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, default_value = "warn")]
    log_level: Level,

    /// Print a sample rule set and exit
    #[arg(long)]
    print_config: bool,

    /// Validate the rule set and exit
    #[arg(long)]
    validate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if args.print_config {
        let sample = include_str!("../demos/default-rules.yaml");
        println!("{}", sample);
        return Ok(());
    }

    info!(path = ?args.rules, "Loading rule set");
    let config = RuleSetConfig::from_file(&args.rules)
        .with_context(|| format!("Failed to load rule set {:?}", args.rules))?;

    if args.validate {
        println!(
            "Rule set is valid ({} environments, {} endpoints defined)",
            config.environments.len(),
            config.endpoint_count()
        );
        return Ok(());
    }

    let request = MockRequest {
        project_id: args.project,
        environment_id: args.environment,
        path: args.path,
        method: args.method,
        query: parse_pairs(&args.queries, '=')?,
        headers: parse_pairs(&args.headers, ':')?,
        body: args.body.map(parse_body).unwrap_or_default(),
    };
    if request.validate().is_err() {
        anyhow::bail!("--path and --method are required");
    }

    let store = InMemoryRuleStore::from_config(&config);
    let resolver = MockResolver::with_settings(store, config.settings.clone());

    let result = resolver.resolve(&request).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}

/// Split `name<sep>value` arguments into a map, trimming whitespace.
fn parse_pairs(items: &[String], separator: char) -> Result<HashMap<String, String>> {
    items
        .iter()
        .map(|item| {
            let (name, value) = item
                .split_once(separator)
                .with_context(|| format!("Expected NAME{}VALUE, got {:?}", separator, item))?;
            Ok((name.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

fn parse_body(raw: String) -> serde_json::Value {
    serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw))
}
