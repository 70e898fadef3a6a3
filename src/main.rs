use chat_review::core::annotation::GatingPolicy;
use chat_review::core::config;
use chat_review::core::review::ReviewPayload;
use chat_review::tui;
use clap::{Parser, Subcommand};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::fs::File;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "chat-review", about = "Chat and review UI for human-feedback tasks")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Chat with an agent, annotating each of its messages (default)
    Chat {
        /// Task server base URL; without one a local agent answers
        #[arg(short, long)]
        endpoint: Option<String>,
        /// Which unannotated messages block sending
        #[arg(short, long, value_enum)]
        gating: Option<GatingPolicy>,
    },
    /// Review a finished task inside an embedded frame
    Review {
        /// JSON file holding `inputs` and `outputs`
        payload: PathBuf,
    },
}

fn read_payload(path: &Path) -> std::io::Result<ReviewPayload> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Initialize file logger - writes to chat-review.log in current directory
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();

    if let Ok(log_file) = File::create("chat-review.log") {
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }

    let file_config = config::load_config().unwrap_or_else(|e| {
        eprintln!("Warning: {}; using defaults", e);
        log::warn!("Config load failed, using defaults: {}", e);
        Default::default()
    });

    match args.command {
        Some(Command::Review { payload }) => {
            let resolved = config::resolve(&file_config, None, None);
            let payload = read_payload(&payload)?;
            log::info!("chat-review starting review screen");
            tui::run_review(resolved, payload)
        }
        Some(Command::Chat { endpoint, gating }) => {
            let resolved = config::resolve(&file_config, endpoint.as_deref(), gating);
            log::info!("chat-review starting chat (gating: {})", resolved.gating.label());
            tui::run_chat(resolved)
        }
        None => {
            let resolved = config::resolve(&file_config, None, None);
            log::info!("chat-review starting chat (gating: {})", resolved.gating.label());
            tui::run_chat(resolved)
        }
    }
}
