//! anysched - Entry Point
//!
//! Drives one configured scheduler environment from the command line:
//!
//! ```text
//! anysched --config=settings.json --env=dev svc-list
//! anysched --config=settings.json --env=dev deploy --id=httpbin --image=kennethreitz/httpbin --count=3
//! ```

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use colored::Colorize;
use serde::Serialize;
use tracing::{error, info};

use anysched::logs::{init_logging, LogOptions};
use anysched::settings::Settings;
use anysched::{registry, Manager, Operation, ServiceSpec};

const USAGE: &str = "usage: anysched --config=<settings.json> --env=<name> \
<svc-list|task-list|svc-tasks|deploy|destroy> [--id=<id>] [--image=<image>] [--count=<n>] [--timeout=<secs>]";

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let mut cli_args: HashMap<String, String> = HashMap::new();
    let mut command: Option<String> = None;

    for arg in env::args().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            // Handle standalone flags like --json-logs
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        } else {
            command = Some(arg);
        }
    }

    if cli_args.contains_key("help") {
        println!("{USAGE}");
        return;
    }

    if let Err(e) = run(command, &cli_args).await {
        error!("{:#}", e);
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(command: Option<String>, cli_args: &HashMap<String, String>) -> Result<()> {
    let command = command.ok_or_else(|| anyhow!("missing command\n{USAGE}"))?;
    let config_path = arg(cli_args, "config")?;
    let env_name = arg(cli_args, "env")?;

    let settings = Settings::load(config_path)
        .await
        .with_context(|| format!("unable to read settings file {config_path}"))?;

    // Initialize logging
    let log_options = LogOptions {
        log_level: settings.log_level.clone(),
        json_format: cli_args.contains_key("json-logs"),
    };
    if let Err(e) = init_logging(log_options) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let config = settings.manager_config(env_name)?;
    info!("Using {} backend at {:?} ({})", config.kind, config.address, env_name);
    let manager = registry::global().resolve(config)?;
    let wait = settings.wait.to_options();

    match command.as_str() {
        "svc-list" => print_json(&manager.list_services().await?),
        "task-list" => print_json(&manager.list_all_tasks().await?),
        "svc-tasks" => {
            let spec = ServiceSpec::new(arg(cli_args, "id")?, "", 0);
            print_json(&manager.list_service_tasks(&spec).await?)
        }
        "deploy" => {
            let spec = service_spec(cli_args)?;
            let operation = manager
                .deploy_service(&spec)
                .await?
                .with_poll_interval(wait.poll_interval);
            let operation = if spec.deploy_timeout.is_some() {
                operation
            } else {
                operation.with_timeout(wait.default_timeout)
            };
            follow(manager.as_ref(), operation).await
        }
        "destroy" => {
            let operation = manager
                .destroy_service(arg(cli_args, "id")?)
                .await?
                .with_poll_interval(wait.poll_interval)
                .with_timeout(wait.default_timeout);
            follow(manager.as_ref(), operation).await
        }
        other => bail!("unknown command {other:?}\n{USAGE}"),
    }
}

fn arg<'a>(cli_args: &'a HashMap<String, String>, key: &str) -> Result<&'a str> {
    cli_args
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("missing --{key}=...\n{USAGE}"))
}

fn service_spec(cli_args: &HashMap<String, String>) -> Result<ServiceSpec> {
    let count = match cli_args.get("count") {
        Some(count) => count
            .parse()
            .with_context(|| format!("invalid --count={count}"))?,
        None => 1,
    };
    let mut spec = ServiceSpec::new(arg(cli_args, "id")?, arg(cli_args, "image")?, count);
    if let Some(timeout) = cli_args.get("timeout") {
        let secs: u64 = timeout
            .parse()
            .with_context(|| format!("invalid --timeout={timeout}"))?;
        spec = spec.with_deploy_timeout(Duration::from_secs(secs));
    }
    Ok(spec)
}

/// Print the operation properties, then wait for it when the backend can report progress
async fn follow(manager: &dyn Manager, operation: Operation) -> Result<()> {
    print_json(operation.properties())?;

    if !operation.is_tracked() {
        eprintln!(
            "{} {} does not report progress; not waiting",
            "note:".yellow().bold(),
            manager.backend()
        );
        return Ok(());
    }

    let status = operation.wait_until(await_interrupt()).await?;
    eprintln!("{} {}", "done:".green().bold(), status.message);
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn await_interrupt() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Ctrl+C received, giving up on the wait...");
    } else {
        std::future::pending::<()>().await;
    }
}
