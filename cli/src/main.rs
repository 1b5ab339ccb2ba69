//! Callgate CLI - invoke one registered function and print its JSON result.
//!
//! ```text
//! callgate greet --args '{"name":"world"}'   ->  "hello world"
//! callgate add --args - < args.json          ->  5
//! callgate --list
//! ```
//!
//! The encoded result is the only thing written to stdout. Logs go to stderr
//! (`RUST_LOG` controls the filter, default `warn`).

use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use callgate_config::CallgateConfig;
use callgate_core::Invoker;
use callgate_registry::CallableRegistry;
use callgate_registry::builtins::register_builtins;

#[derive(Debug, Parser)]
#[command(name = "callgate")]
#[command(about = "Invoke a registered function by name with JSON environment and arguments")]
struct Cli {
    /// Function to invoke
    function: Option<String>,
    /// Environment payload as JSON text (`-` reads stdin). Defaults to `{}`
    #[arg(long = "env", value_name = "JSON")]
    environment: Option<String>,
    /// Arguments payload as JSON text (`-` reads stdin). Defaults to `{}`
    #[arg(long = "args", value_name = "JSON")]
    arguments: Option<String>,
    /// Config file (defaults to ~/.callgate/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// List invocable functions and exit
    #[arg(long, conflicts_with = "function")]
    list: bool,
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("warn"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .with(env_filter)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<CallgateConfig> {
    let loaded = match path {
        Some(path) => CallgateConfig::load_from(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => CallgateConfig::load()?,
    };
    Ok(loaded.unwrap_or_default())
}

/// Resolve `-` to stdin. Only one payload may come from stdin.
fn read_payloads(
    environment: Option<String>,
    arguments: Option<String>,
    stdin: impl FnOnce() -> io::Result<String>,
) -> Result<(Option<String>, Option<String>)> {
    let env_from_stdin = environment.as_deref() == Some("-");
    let args_from_stdin = arguments.as_deref() == Some("-");
    if env_from_stdin && args_from_stdin {
        bail!("--env and --args cannot both read from stdin");
    }
    if !env_from_stdin && !args_from_stdin {
        return Ok((environment, arguments));
    }

    let text = stdin().context("reading payload from stdin")?;
    if env_from_stdin {
        Ok((Some(text), arguments))
    } else {
        Ok((environment, Some(text)))
    }
}

fn build_invoker(config: &CallgateConfig) -> Result<Invoker> {
    let mut registry = CallableRegistry::new();
    register_builtins(&mut registry)?;
    Ok(Invoker::from_config(registry, config)?)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    let invoker = build_invoker(&config)?;

    if cli.list {
        for def in invoker.definitions() {
            println!("{}\t{}", def.name, def.description);
        }
        return Ok(());
    }

    let Some(function) = cli.function else {
        bail!("no function given (use --list to see what is available)");
    };

    let (environment, arguments) = read_payloads(cli.environment, cli.arguments, || {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    })?;

    let output = invoker
        .invoke(&function, environment.as_deref(), arguments.as_deref())
        .await?;
    println!("{output}");
    Ok(())
}
