use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use eggshop::config::Config;
use eggshop::error::Error;
use eggshop::shop::SecretKey;

mod commands;

use commands::{
    announce, preview, rotate, show, watch, AnnounceParams, PreviewParams, RotateParams,
    ShopParams,
};

#[derive(Parser)]
#[command(
    name = "eggshop",
    version,
    about = "Deterministic rotating egg shop",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); defaults to the configured format
    #[arg(long, global = true)]
    log_format: Option<String>,

    /// TOML configuration file; environment variables are used when absent
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

/// Options shared by every command that computes shops
#[derive(Args, Debug, Clone)]
struct ShopArgs {
    /// Secret key mixed into every seed
    #[arg(long, env = "EGGSHOP_SECRET_KEY", hide_env_values = true)]
    secret_key: String,

    /// Egg catalog CSV
    #[arg(long)]
    eggs: Option<PathBuf>,

    /// Slot length in minutes (must divide 60)
    #[arg(long)]
    interval: Option<u32>,

    /// Eggs per shop
    #[arg(long)]
    shop_size: Option<usize>,
}

#[derive(Args, Debug, Clone)]
struct RotateArgs {
    #[command(flatten)]
    shop: ShopArgs,

    /// State file path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Wait for the current slot to end before writing
    #[arg(long, default_value = "false")]
    wait: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Advance the shop state for the current slot
    Rotate(RotateArgs),

    /// Rotate at every slot boundary until interrupted
    Watch {
        #[command(flatten)]
        rotate: RotateArgs,

        /// Stop after this many rotations
        #[arg(long)]
        max_runs: Option<usize>,
    },

    /// Compute shops for arbitrary slots without touching the state file
    Preview {
        #[command(flatten)]
        shop: ShopArgs,

        /// RFC 3339 timestamp, floored to the slot interval (default: now)
        #[arg(long)]
        at: Option<String>,

        /// Number of consecutive slots to preview
        #[arg(short = 'n', long, default_value = "1")]
        count: u32,
    },

    /// Print the persisted shop state
    Show {
        /// State file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Post the current shop to a Discord channel
    Announce {
        /// State file path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Egg catalog CSV
        #[arg(long)]
        eggs: Option<PathBuf>,

        /// Discord channel id
        #[arg(long)]
        channel_id: Option<String>,

        /// Discord bot token
        #[arg(long, env = "DISCORD_BOT_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Print the message instead of posting it
        #[arg(long, default_value = "false")]
        dry_run: bool,
    },
}

impl ShopArgs {
    fn resolve(self, config: &mut Config) -> eggshop::error::Result<ShopParams> {
        if let Some(eggs) = self.eggs {
            config.catalog.eggs_csv = eggs;
        }
        if let Some(interval) = self.interval {
            config.shop.interval_minutes = interval;
        }
        if let Some(shop_size) = self.shop_size {
            config.shop.shop_size = shop_size;
        }
        config.validate().map_err(Error::from_config)?;

        Ok(ShopParams {
            secret_key: SecretKey::new(self.secret_key),
            eggs_csv: config.catalog.eggs_csv.clone(),
            interval: config.interval().map_err(Error::from_config)?,
            shop_size: config.shop.shop_size,
        })
    }
}

impl RotateArgs {
    fn resolve(self, config: &mut Config) -> eggshop::error::Result<RotateParams> {
        if let Some(output) = self.output {
            config.storage.output_path = output;
        }
        if self.wait {
            config.shop.wait_for_boundary = true;
        }
        let shop = self.shop.resolve(config)?;

        Ok(RotateParams {
            shop,
            output: config.storage.output_path.clone(),
            wait_for_boundary: config.shop.wait_for_boundary,
        })
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path),
        None => Config::from_env(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref()).context("Failed to load configuration")?;

    let log_format = cli
        .log_format
        .clone()
        .unwrap_or_else(|| config.logging.format.clone());
    setup_tracing(&log_format, &config.logging.level, cli.verbose)?;

    tracing::info!("eggshop starting");

    if let Err(err) = run(cli.command, config).await {
        let category = err.category();
        tracing::error!(
            category = category.label(),
            recoverable = err.is_recoverable(),
            error = %err,
            "eggshop failed"
        );
        eprintln!("Error ({}): {err}", category.label());
        std::process::exit(category.exit_code());
    }

    tracing::info!("eggshop completed successfully");
    Ok(())
}

async fn run(command: Commands, mut config: Config) -> eggshop::error::Result<()> {
    match command {
        Commands::Rotate(args) => {
            let params = args.resolve(&mut config)?;
            tracing::info!(
                eggs = %params.shop.eggs_csv.display(),
                output = %params.output.display(),
                interval = %params.shop.interval,
                shop_size = %params.shop.shop_size,
                wait = %params.wait_for_boundary,
                "Starting rotate command"
            );
            rotate(params).await
        }

        Commands::Watch { rotate, max_runs } => {
            let params = rotate.resolve(&mut config)?;
            tracing::info!(
                output = %params.output.display(),
                interval = %params.shop.interval,
                "Starting watch command"
            );
            watch(params, max_runs).await
        }

        Commands::Preview { shop, at, count } => {
            let shop = shop.resolve(&mut config)?;
            tracing::info!(at = ?at, count = %count, "Starting preview command");
            preview(PreviewParams { shop, at, count }).await
        }

        Commands::Show { output } => {
            if let Some(output) = output {
                config.storage.output_path = output;
            }
            config.validate().map_err(Error::from_config)?;
            tracing::info!(output = %config.storage.output_path.display(), "Starting show command");
            show(
                config.storage.output_path.clone(),
                config.interval().map_err(Error::from_config)?,
                config.shop.shop_size,
            )
            .await
        }

        Commands::Announce {
            output,
            eggs,
            channel_id,
            token,
            dry_run,
        } => {
            if let Some(output) = output {
                config.storage.output_path = output;
            }
            if let Some(eggs) = eggs {
                config.catalog.eggs_csv = eggs;
            }
            if channel_id.is_some() {
                config.discord.channel_id = channel_id;
            }
            config.validate().map_err(Error::from_config)?;
            tracing::info!(
                output = %config.storage.output_path.display(),
                channel_id = ?config.discord.channel_id,
                dry_run = %dry_run,
                "Starting announce command"
            );
            let params = AnnounceParams {
                output: config.storage.output_path.clone(),
                eggs_csv: config.catalog.eggs_csv.clone(),
                discord: config.discord.clone(),
                dry_run,
            };
            announce(params, token).await
        }
    }
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("eggshop=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_new(format!("eggshop={level},warn"))
            .context("Invalid log level")?
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
