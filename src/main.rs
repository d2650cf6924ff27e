use clap::{Parser, Subcommand};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use switchyard::application::Bot;
use switchyard::domain::entities::Actor;
use switchyard::infrastructure::adapters::{ConsoleGateway, ConsoleInput};
use switchyard::infrastructure::config::Config;
use switchyard::plugins::bundled;

#[derive(Parser)]
#[command(name = "switchyard")]
#[command(about = "A plugin-hosted chat bot runtime", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Bot token (overrides config)
    #[arg(short, long)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot on the console gateway
    Run,
    /// Discover plugins and show their load order and state
    Plugins,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

fn main() {
    let cli = Cli::parse();

    let (mut config, load_error) = load_config(&cli.config);
    if let Some(token) = cli.token {
        config.credentials.token = Some(token);
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.bot.log_level)),
        )
        .init();

    if let Some(e) = load_error {
        tracing::warn!("Failed to load config: {}, using defaults", e);
    }

    match cli.command {
        Commands::Run => run_bot(config),
        Commands::Plugins => list_plugins(config),
        Commands::Version => {
            println!("switchyard v{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::InitConfig => init_config(),
    }
}

fn load_config(path: &str) -> (Config, Option<String>) {
    if !Path::new(path).exists() {
        return (Config::load_env(), None);
    }
    match Config::load(path) {
        Ok(config) => (config, None),
        Err(e) => (Config::load_env(), Some(e.to_string())),
    }
}

fn runtime() -> Option<tokio::runtime::Runtime> {
    match tokio::runtime::Runtime::new() {
        Ok(rt) => Some(rt),
        Err(e) => {
            tracing::error!("Failed to start async runtime: {}", e);
            None
        }
    }
}

fn run_bot(config: Config) {
    let Some(rt) = runtime() else { return };

    rt.block_on(async {
        tracing::info!("Starting switchyard: {}", config.bot.name);

        let owner_id = if config.bot.owner_id.is_empty() {
            "console".to_string()
        } else {
            config.bot.owner_id.clone()
        };
        let gateway = Arc::new(ConsoleGateway::new(config.bot.name.clone()));
        let bot = Bot::new(config, gateway, bundled::registry());

        if let Err(e) = bot.start().await {
            tracing::error!("Failed to start bot: {}", e);
            return;
        }

        println!("Type messages below; prefix commands with {:?}. Ctrl-D to quit.", bot.config().bot.command_prefix);
        let mut input = ConsoleInput::new(Actor::new(owner_id, "owner"));
        loop {
            tokio::select! {
                notification = input.next() => match notification {
                    Some(notification) => {
                        bot.handle(notification);
                    }
                    None => break,
                },
                _ = tokio::signal::ctrl_c() => break,
            }
        }

        bot.shutdown().await;
    });
}

fn list_plugins(config: Config) {
    let Some(rt) = runtime() else { return };

    rt.block_on(async {
        let gateway = Arc::new(ConsoleGateway::new(config.bot.name.clone()));
        let directory = config.plugins.directory.clone();
        let bot = Bot::new(config, gateway, bundled::registry());

        if let Err(e) = bot.plugins().discover() {
            tracing::error!("Failed to discover plugins: {}", e);
            return;
        }

        println!("Plugins in {}:", directory.display());
        println!("Load order: {}", bot.plugins().order().join(" -> "));
        for plugin in bot.plugins().summaries() {
            let deps = if plugin.dependencies.is_empty() {
                "-".to_string()
            } else {
                plugin.dependencies.join(", ")
            };
            match plugin.reason {
                Some(reason) => println!("  {} v{} [{}] deps: {} ({})", plugin.name, plugin.version, plugin.state, deps, reason),
                None => println!("  {} v{} [{}] deps: {}", plugin.name, plugin.version, plugin.state, deps),
            }
        }
    });
}

fn init_config() {
    match Config::default().to_yaml() {
        Ok(yaml) => {
            println!("{}", yaml);
            println!("\nSave this to config.yaml and adjust as needed.");
        }
        Err(e) => eprintln!("Failed to render config: {}", e),
    }
}
