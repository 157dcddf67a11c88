use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use vkbridge::bridge::{Bridge, IdentityCache};
use vkbridge::inbox::{self, InboxClient};
use vkbridge::vk::{profile_or_default, VkProfileClient};

#[derive(Parser)]
#[command(name = "vk-bridge")]
#[command(about = "Relay VK community messages into a support inbox", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Run the gateway: VK Callback API endpoint plus status/test endpoints.
    Serve {
        /// Config file path (default: VK_BRIDGE_CONFIG_PATH or ~/.vk-bridge/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// HTTP port (default from config, PORT env, or 3000)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Bridge one message directly (no gateway), as if VK had delivered it.
    SendTest {
        /// Config file path (default: VK_BRIDGE_CONFIG_PATH or ~/.vk-bridge/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// VK user id (default: vk.defaultUserId from config)
        #[arg(long, value_name = "ID")]
        user: Option<i64>,

        /// Message text
        #[arg(long, short, default_value = "Test message from VK integration")]
        message: String,
    },

    /// Probe the inbox API connection.
    Check {
        /// Config file path (default: VK_BRIDGE_CONFIG_PATH or ~/.vk-bridge/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("vk-bridge {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Serve { config, port }) => {
            if let Err(e) = run_serve(config, port).await {
                log::error!("gateway failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::SendTest {
            config,
            user,
            message,
        }) => match run_send_test(config, user, message).await {
            Ok(true) => {}
            Ok(false) => std::process::exit(2),
            Err(e) => {
                log::error!("send-test failed: {:#}", e);
                std::process::exit(1);
            }
        },
        Some(Commands::Check { config }) => match run_check(config).await {
            Ok(true) => println!("inbox API connection: ok"),
            Ok(false) => {
                println!("inbox API connection: FAILED");
                std::process::exit(2);
            }
            Err(e) => {
                log::error!("check failed: {:#}", e);
                std::process::exit(1);
            }
        },
        None => {
            println!("Run with --help for usage");
        }
    }
}

async fn run_serve(config_path: Option<PathBuf>, port: Option<u16>) -> anyhow::Result<()> {
    let (mut config, path) = vkbridge::config::load_config(config_path)?;
    if let Some(p) = port {
        config.gateway.port = p;
    }
    log::info!(
        "starting gateway on {}:{} (config {})",
        config.gateway.bind,
        config.gateway.port,
        path.display()
    );
    vkbridge::gateway::run_gateway(config).await
}

async fn run_send_test(
    config_path: Option<PathBuf>,
    user: Option<i64>,
    message: String,
) -> anyhow::Result<bool> {
    let (config, _) = vkbridge::config::load_config(config_path)?;
    let inbox = InboxClient::from_config(&config.inbox)?;
    let profiles = VkProfileClient::from_config(&config)?;
    let bridge = Bridge::new(Arc::new(inbox), Arc::new(IdentityCache::new()));

    let user_id = user.unwrap_or(config.vk.default_user_id);
    let profile = profile_or_default(&profiles, user_id).await;
    let outcome = bridge.run(user_id, &profile, &message).await;
    let report = match &outcome {
        Ok(d) => serde_json::json!({
            "status": "success",
            "user_id": user_id,
            "contact_id": d.contact.contact_id,
            "conversation_id": d.conversation_id,
        }),
        Err(e) => serde_json::json!({
            "status": "error",
            "user_id": user_id,
            "stage": e.stage(),
            "message": e.to_string(),
        }),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(outcome.is_ok())
}

async fn run_check(config_path: Option<PathBuf>) -> anyhow::Result<bool> {
    let (config, _) = vkbridge::config::load_config(config_path)?;
    let client = InboxClient::from_config(&config.inbox)?;
    log::info!("testing inbox API connection: {}", client.inbox_url());
    Ok(inbox::probe(&client).await)
}
