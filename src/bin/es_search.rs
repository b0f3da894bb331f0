//! es-search: run search queries through the throttled client
//!
//! Usage:
//!   es-search query <file|-> [--parallel N]   Run a query N times concurrently
//!   es-search version                         Show version information
//!   es-search help                            Show usage

use anyhow::{bail, Context};
use search_throttle::{SearchClient, SearchConfig};
use std::io::Read;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let result = match args[1].as_str() {
        "query" => cmd_query(&args[2..]).await,
        "version" | "--version" | "-V" => {
            println!("es-search {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn print_usage() {
    println!(
        r#"es-search: throttled search client

USAGE:
    es-search <COMMAND> [OPTIONS]

COMMANDS:
    query <file|-> [--parallel N]   Run the JSON query in <file> (or stdin) N times
    version                         Show version information
    help                            Show this help message

ENVIRONMENT:
    ES_ENDPOINT, ES_INDEX, ES_USER, ES_PASSWORD   Backend and credentials (required)
    ES_MAX_CONCURRENT, ES_MAX_RETRIES, ES_BASE_DELAY_MS, ES_STRICT_STATUS
    ES_DEBUG=true                                 Per-attempt debug logging
    RUST_LOG                                      Log filter override"#
    );
}

fn init_tracing(debug: bool) {
    let default = if debug {
        "search_throttle=debug"
    } else {
        "search_throttle=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn cmd_query(args: &[String]) -> anyhow::Result<()> {
    let mut source: Option<&str> = None;
    let mut parallel: usize = 1;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--parallel" | "-p" => {
                let raw = args.get(i + 1).context("--parallel requires a value")?;
                parallel = raw
                    .parse()
                    .with_context(|| format!("invalid --parallel value: {raw}"))?;
                if parallel == 0 {
                    bail!("--parallel must be at least 1");
                }
                i += 2;
            }
            other if source.is_none() => {
                source = Some(other);
                i += 1;
            }
            other => bail!("unexpected argument: {other}"),
        }
    }

    let source = source.context("query requires a file path or '-' for stdin")?;
    let raw = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read query from stdin")?;
        buf
    } else {
        std::fs::read_to_string(source).with_context(|| format!("failed to read {source}"))?
    };
    let query: serde_json::Value = serde_json::from_str(&raw).context("query is not valid JSON")?;

    let config = SearchConfig::from_env()?;
    init_tracing(config.debug);
    let client = Arc::new(SearchClient::new(config)?);

    let runs = (0..parallel).map(|_| {
        let client = Arc::clone(&client);
        let query = query.clone();
        async move { client.search(&query).await }
    });
    let results = futures::future::join_all(runs).await;

    let mut failures = 0;
    for result in results {
        match result {
            Ok(body) => println!("{}", serde_json::to_string_pretty(&body)?),
            Err(e) => {
                failures += 1;
                eprintln!("search failed: {e}");
            }
        }
    }

    eprintln!("{}", serde_json::to_string_pretty(&client.stats())?);

    if failures > 0 {
        bail!("{failures} of {parallel} searches failed");
    }
    Ok(())
}
