// Polyglot Chat - terminal chat with language detection and on-demand translation

use clap::Parser;
use polyglot::config::AppConfig;
use polyglot::conversation::{
    Capability, ConversationOrchestrator, DetectorService, LanguageServiceGateway, Message,
    NoticeLevel, OllamaBackend, TranslatorService,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Ollama API endpoint (overrides config)
    #[arg(long)]
    endpoint: Option<String>,

    /// Ollama model (overrides config)
    #[arg(long)]
    model: Option<String>,

    /// Initial target language code (overrides config)
    #[arg(short, long)]
    target: Option<String>,

    /// Run without a language detector
    #[arg(long)]
    no_detection: bool,

    /// Run without a translator
    #[arg(long)]
    no_translation: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(endpoint) = args.endpoint {
        config.ollama.endpoint = endpoint;
    }
    if let Some(model) = args.model {
        config.ollama.model = model;
    }
    if let Some(target) = args.target {
        config.conversation.target_language = target.into();
    }
    config.conversation.validate()?;

    let backend = Arc::new(OllamaBackend::new(&config.ollama, config.conversation.languages.clone())?);
    let detector: Capability<dyn DetectorService> = if args.no_detection {
        Capability::Unavailable
    } else {
        Capability::Available(backend.clone() as Arc<dyn DetectorService>)
    };
    let translator: Capability<dyn TranslatorService> = if args.no_translation {
        Capability::Unavailable
    } else {
        Capability::Available(backend as Arc<dyn TranslatorService>)
    };

    let gateway = LanguageServiceGateway::with_config(detector, translator, &config.gateway);
    let orchestrator = ConversationOrchestrator::bootstrap(Arc::new(gateway), config.conversation).await;

    println!("Polyglot v{} - {} via {}\n", env!("CARGO_PKG_VERSION"), config.ollama.model, config.ollama.endpoint);
    if !orchestrator.detection_supported() {
        println!("Language detection is not available, messages will not be tagged.\n");
    }
    println!("Target language: {}", orchestrator.target_language().await);
    println!("Commands: /translate <n>, /target <code>, /languages, /history, /quit\n");

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let line = input.trim_end_matches(['\r', '\n']);
        let command = line.trim();

        if command == "/quit" || command == "/exit" {
            break;
        }

        if let Some(rest) = command.strip_prefix('/') {
            run_command(&orchestrator, rest).await;
            continue;
        }

        orchestrator.set_draft(line).await;
        if let Some(index) = orchestrator.send_draft().await {
            if let Some(message) = orchestrator.message(index).await {
                print_message(index, &message);
            }
        }
    }

    println!("Goodbye!");
    Ok(())
}

async fn run_command(orchestrator: &ConversationOrchestrator, command: &str) {
    let mut parts = command.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("translate") | Some("t"), Some(number)) => {
            let Some(index) = number.parse::<usize>().ok().and_then(|n| n.checked_sub(1)) else {
                println!("Usage: /translate <message number>\n");
                return;
            };

            match orchestrator.request_translation(index).await {
                Ok(()) => {
                    if let Some(message) = orchestrator.message(index).await {
                        print_message(index, &message);
                    }
                }
                Err(e) => match e.notice() {
                    Some(notice) => {
                        let marker = match notice.level {
                            NoticeLevel::Warning => "!",
                            NoticeLevel::Error => "✗",
                        };
                        println!("{} {}\n", marker, notice);
                    }
                    None => println!("{}\n", e),
                },
            }
        }
        (Some("target"), Some(code)) => match orchestrator.set_target_language(code).await {
            Ok(()) => println!("Target language: {}\n", code),
            Err(e) => println!("{} (see /languages)\n", e),
        },
        (Some("languages"), None) => {
            let current = orchestrator.target_language().await;
            println!("\nSupported languages:");
            for language in orchestrator.supported_languages() {
                let marker = if language.code == current { "*" } else { " " };
                println!(" {} {}", marker, language);
            }
            println!();
        }
        (Some("history"), None) => {
            for (index, message) in orchestrator.messages().await.iter().enumerate() {
                print_message(index, message);
            }
        }
        _ => println!("Commands: /translate <n>, /target <code>, /languages, /history, /quit\n"),
    }
}

fn print_message(index: usize, message: &Message) {
    println!("[{}] {} {}", index + 1, message.sent_at().format("%H:%M"), message.text());
    if let Some(language) = message.detected_language() {
        println!("    Detected Language: {}", language);
    }
    if let Some(translation) = message.translation() {
        println!("    {}", translation);
    } else if message.translation_offered() {
        println!("    (/translate {} to translate)", index + 1);
    }
    println!();
}
