mod config;
mod error;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use mcp::{Client, ToolServer};
use runtime::{
    AnthropicBackend, Backend, OpenAiBackend, Orchestrator, ProviderBackend, ToolHost,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use config::{Config, Provider};
use error::{Error, Result};

const MODEL_ENV: &str = "RELAY_MODEL";

#[derive(Parser)]
#[command(name = "relay")]
#[command(about = "Connect a completion model to MCP tools", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, default_value = "relay.toml")]
    config: PathBuf,

    /// More logging on stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the tool host
    Serve {
        #[arg(long, value_enum, default_value_t = ServeTransport::Stdio)]
        transport: ServeTransport,
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value_t = 8050)]
        port: u16,
        /// Endpoint path for the http transport
        #[arg(long, default_value = "/mcp")]
        path: String,
        /// JSON file served by get_knowledge_base
        #[arg(long)]
        knowledge_base: Option<PathBuf>,
    },
    /// Connect to the tool host and print its catalog
    Tools,
    /// Answer a single query
    Ask {
        query: String,
    },
    /// Start an interactive session
    Chat,
}

#[derive(Clone, Copy, ValueEnum)]
enum ServeTransport {
    Stdio,
    Http,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let _ = dotenvy::dotenv();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Logs go to stderr; stdout belongs to the stdio transport.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Serve {
            transport,
            host,
            port,
            path,
            knowledge_base,
        } => cmd_serve(transport, &host, port, &path, knowledge_base).await,
        Commands::Tools => cmd_tools(&Config::load_or_default(&cli.config)?).await,
        Commands::Ask { query } => cmd_ask(&Config::load_or_default(&cli.config)?, &query).await,
        Commands::Chat => cmd_chat(&Config::load_or_default(&cli.config)?).await,
    }
}

async fn cmd_serve(
    transport: ServeTransport,
    host: &str,
    port: u16,
    path: &str,
    knowledge_base: Option<PathBuf>,
) -> Result<()> {
    let kb_path = knowledge_base.unwrap_or_else(|| PathBuf::from(toolbox::SAMPLE_KNOWLEDGE_BASE));
    let server = ToolServer::new("relay", toolbox::registry(&kb_path)?);

    match transport {
        ServeTransport::Stdio => server.serve_stdio().await?,
        ServeTransport::Http => {
            let listener = TcpListener::bind((host, port)).await?;
            server.serve_http(listener, path).await?
        }
    }
    Ok(())
}

async fn cmd_tools(config: &Config) -> Result<()> {
    let client = connect(config).await?;
    let listed = client.list_tools().await;
    client.close().await?;

    for tool in listed? {
        match tool.description {
            Some(description) => println!("{}: {description}", tool.name),
            None => println!("{}", tool.name),
        }
    }
    Ok(())
}

async fn cmd_ask(config: &Config, query: &str) -> Result<()> {
    let mut orchestrator = orchestrator(config)?;
    orchestrator
        .connect(config.host.server_config(&config.timeouts))
        .await?;

    answer(&mut orchestrator, query, &mut io::stdout()).await
}

/// Print the reply to `out`, then end the session.
///
/// A failed teardown is logged; the answer has already been written.
async fn answer<B: Backend, H: ToolHost>(
    orchestrator: &mut Orchestrator<B, H>,
    query: &str,
    out: &mut impl Write,
) -> Result<()> {
    let outcome = orchestrator.process_query(query).await;
    if let Ok(reply) = &outcome {
        writeln!(out, "{reply}")?;
        out.flush()?;
    }

    if let Err(e) = orchestrator.shutdown().await {
        tracing::warn!(error = %e, "tool host shutdown failed");
    }
    outcome?;
    Ok(())
}

async fn cmd_chat(config: &Config) -> Result<()> {
    println!("relay v{}", env!("CARGO_PKG_VERSION"));

    let mut orchestrator = orchestrator(config)?;
    orchestrator
        .connect(config.host.server_config(&config.timeouts))
        .await?;

    println!("Model: {}", orchestrator.backend());
    println!("Type 'quit' or Ctrl+D to exit.\n");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            // EOF
            break;
        }

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input == "quit" || input == "exit" {
            break;
        }

        if orchestrator.host().is_none() {
            tracing::info!("reconnecting to tool host");
            if let Err(e) = orchestrator
                .connect(config.host.server_config(&config.timeouts))
                .await
            {
                eprintln!("Error: {e}\n");
                continue;
            }
        }

        match orchestrator.process_query(input).await {
            Ok(reply) => println!("\n{reply}\n"),
            Err(e) => eprintln!("Error: {e}\n"),
        }
    }

    orchestrator.shutdown().await?;
    println!("\nSession ended.");
    Ok(())
}

async fn connect(config: &Config) -> Result<Client> {
    let server = config.host.server_config(&config.timeouts);
    let handshake = config.timeouts.to_timeouts().handshake;
    match tokio::time::timeout(handshake, Client::connect(server)).await {
        Ok(client) => Ok(client?),
        Err(_) => Err(Error::Mcp(mcp::Error::Timeout)),
    }
}

fn orchestrator(config: &Config) -> Result<Orchestrator<ProviderBackend, Client>> {
    Ok(Orchestrator::new(backend(config)?)
        .with_mode(config.backend.decision)
        .with_timeouts(config.timeouts.to_timeouts()))
}

fn backend(config: &Config) -> Result<ProviderBackend> {
    let settings = &config.backend;
    let var = settings.provider.api_key_var();
    let api_key = std::env::var(var).map_err(|_| Error::MissingApiKey { var })?;
    let model = std::env::var(MODEL_ENV).unwrap_or_else(|_| settings.model().to_string());

    let backend = match settings.provider {
        Provider::Anthropic => {
            let mut builder =
                AnthropicBackend::builder(api_key, model).max_tokens(settings.max_tokens);
            if let Some(url) = &settings.base_url {
                builder = builder.base_url(url);
            }
            if let Some(system) = &settings.system {
                builder = builder.system(system);
            }
            builder.build().into()
        }
        Provider::OpenAi => {
            let mut builder =
                OpenAiBackend::builder(api_key, model).max_tokens(settings.max_tokens);
            if let Some(url) = &settings.base_url {
                builder = builder.base_url(url);
            }
            if let Some(system) = &settings.system {
                builder = builder.system(system);
            }
            builder.build().into()
        }
    };
    Ok(backend)
}
