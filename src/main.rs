use anyhow::Context;
use clap::{Parser, Subcommand};
use gallery_manifest::storage::{LocalStore, ObjectStore, S3Store};
use gallery_manifest::{GeneratorConfig, ManifestGenerator, config, handle, output};
use lambda_runtime::{LambdaEvent, service_fn};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Set by the Lambda execution environment.
const LAMBDA_ENV_MARKER: &str = "AWS_LAMBDA_FUNCTION_NAME";

#[derive(clap::Args, Clone)]
struct RunArgs {
    /// JSON file with the event payload (logged, not interpreted)
    #[arg(long)]
    event: Option<PathBuf>,

    /// Treat this directory as the object store: <DIR>/<bucket>/<key>
    #[arg(long)]
    local_root: Option<PathBuf>,
}

#[derive(Parser)]
#[command(name = "gallery-manifest")]
#[command(about = "Generate a JSON manifest of the images in a storage bucket")]
#[command(long_about = "\
Generate a JSON manifest of the images in a storage bucket

Lists every object under the gallery prefix, keeps .webp .jpg .jpeg .png and
.gif files (any case), and writes <prefix>manifest.json:

  {
    \"images\": [
      {\"name\": \"a.jpg\", \"path\": \"gallery/a.jpg\", \"size\": 12345,
       \"modified\": \"2024-01-01T00:00:00.000Z\"}
    ],
    \"generated\": \"2024-01-02T00:00:00.000Z\",
    \"count\": 1
  }

Configuration (environment overrides the config file):
  AWS_REGION       region    (default us-east-1)
  BUCKET_NAME      bucket    (required)
  GALLERY_PREFIX   prefix    (default empty)

With no subcommand the binary serves Lambda invocations.
Run 'gallery-manifest gen-config' to print a documented config file.")]
#[command(version)]
struct Cli {
    /// Config file, merged under environment variables if it exists
    #[arg(long, default_value = config::CONFIG_FILENAME, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve invocations from the Lambda runtime API
    Serve,
    /// Generate the manifest once and print the result
    Run(RunArgs),
    /// Resolve and validate configuration without touching storage
    Check,
    /// Print a stock config file with all options documented
    GenConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let config = config::load_config(&cli.config)?;
            serve(config).await?;
        }
        Command::Run(args) => {
            let config = config::load_config(&cli.config)?;
            run_once(config, args).await?;
        }
        Command::Check => {
            let config = config::load_config(&cli.config)?;
            output::print_config(&config);
            println!("==> Config is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Logs go to stderr so `run` output on stdout stays machine-readable.
/// Under Lambda, colour codes would end up in CloudWatch verbatim.
fn init_tracing() {
    let in_lambda = std::env::var_os(LAMBDA_ENV_MARKER).is_some();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(!in_lambda)
                .with_target(!in_lambda),
        )
        .init();
}

async fn serve(config: GeneratorConfig) -> anyhow::Result<()> {
    tracing::info!(region = %config.region, bucket = %config.bucket, prefix = %config.prefix, "Starting Lambda handler");
    let store = S3Store::from_region(&config.region).await;
    let generator = Arc::new(ManifestGenerator::new(store, config));

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let generator = Arc::clone(&generator);
        async move {
            let (result, _) = handle(&*generator, &event.payload).await;
            Ok::<_, lambda_runtime::Error>(result)
        }
    }))
    .await
    .map_err(|e| anyhow::anyhow!("Lambda runtime stopped: {e}"))
}

async fn run_once(config: GeneratorConfig, args: RunArgs) -> anyhow::Result<()> {
    let event: Value = match &args.event {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading event file {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("parsing event file {}", path.display()))?
        }
        None => Value::Object(Default::default()),
    };

    let store: Box<dyn ObjectStore> = match &args.local_root {
        Some(root) => Box::new(LocalStore::new(root)),
        None => Box::new(S3Store::from_region(&config.region).await),
    };
    let generator = ManifestGenerator::new(store, config);

    let (result, summary) = handle(&generator, &event).await;
    println!("{}", serde_json::to_string_pretty(&result)?);
    if let Some(summary) = summary {
        println!();
        output::print_summary(&summary);
    }

    if !result.is_success() {
        anyhow::bail!("manifest generation failed (status {})", result.status_code);
    }
    Ok(())
}
