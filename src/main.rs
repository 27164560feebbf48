use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::debug;

use spf_allowlist::common::dns::HickoryResolver;
use spf_allowlist::{logging, ResolverSettings, SpfResolver};

#[derive(Parser)]
#[command(name = "spf")]
#[command(version)]
#[command(about = "Check whether an IP address is a permitted sender for a domain")]
struct Cli {
    /// Domain whose SPF policy is checked
    domain: String,

    /// Sending IP address
    ip: String,

    /// DNS server to query, as `ip` or `ip:port`
    #[arg(short = 'r', long, env = "SPF_RESOLVER")]
    resolver: Option<String>,

    /// Per-query timeout in milliseconds when --resolver is set
    #[arg(long, env = "SPF_TIMEOUT_MS", default_value_t = 1500)]
    timeout_ms: u64,

    /// Maximum include nesting
    #[arg(long, env = "SPF_MAX_INCLUDE_DEPTH", default_value_t = spf_allowlist::spf::DEFAULT_MAX_INCLUDE_DEPTH)]
    max_include_depth: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "SPF_LOG")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.log_level.as_deref());

    match run(&cli).await {
        Ok(line) => {
            println!("{}", line);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> anyhow::Result<String> {
    let settings = match &cli.resolver {
        Some(endpoint) => ResolverSettings::with_endpoint(endpoint)?,
        None => ResolverSettings::default(),
    }
    .timeout(Duration::from_millis(cli.timeout_ms));

    let resolver = HickoryResolver::from_settings(&settings).context("could not set up DNS resolver")?;
    let spf = SpfResolver::new(Arc::new(resolver)).max_include_depth(cli.max_include_depth);

    let record = spf.get(&cli.domain).await?;
    for err in record.all_errors() {
        debug!(error = %err, "partial resolution");
    }

    let (verdict, matched) = record.try_validate(&cli.ip)?;
    let not = if matched { "" } else { "not " };
    Ok(format!(
        "{}: {} is {}a permitted sender for {}",
        verdict, cli.ip, not, cli.domain
    ))
}
