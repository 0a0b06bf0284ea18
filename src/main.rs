use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use mcp_host::console::run_interactive;
use mcp_host::{HostArgs, HostConfig, McpHost, QueryContext};

#[derive(Parser)]
#[command(
    name = "mcp-host",
    about = "Plans one MCP tool call per natural-language request and routes it across backends"
)]
struct Cli {
    #[command(flatten)]
    host: HostArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run a single request and print the result
    Query {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Run the built-in sample requests
    Demo,
    /// Print every backend's tool catalog as JSON
    Tools,
    /// Read requests from stdin (default)
    Interactive,
}

fn demo_queries() -> Vec<String> {
    let id = chrono::Utc::now().timestamp_millis();
    vec![
        "Read user with Id 2".to_string(),
        format!(
            "Create a new user with Id {id}, name 'John Doe', email 'jhondoe@email.com', age 30"
        ),
        "Add two numbers 5 and 10".to_string(),
    ]
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("mcp_host=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = match cli.host.into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, shutting down");
            signal_token.cancel();
        }
    });

    let host = match McpHost::connect(&config, &shutdown).await {
        Ok(host) => host,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let command = cli.command.unwrap_or(Command::Interactive);
    let code = run_command(command, &host, &config, &shutdown).await;
    host.shutdown().await;
    code
}

async fn run_command(
    command: Command,
    host: &McpHost,
    config: &HostConfig,
    shutdown: &CancellationToken,
) -> ExitCode {
    let new_context =
        || QueryContext::child_of(shutdown).with_optional_timeout(config.query_timeout);

    match command {
        Command::Query { text } => {
            let query = text.join(" ");
            match host.dispatcher().run(&query, &new_context()).await {
                Ok(result) => {
                    println!("{result}");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("error: {e}");
                    ExitCode::FAILURE
                }
            }
        }
        Command::Demo => {
            let dispatcher = host.dispatcher();
            for query in demo_queries() {
                if shutdown.is_cancelled() {
                    break;
                }
                println!("Query: {query}");
                match dispatcher.run(&query, &new_context()).await {
                    Ok(result) => println!("Response: {result}\n"),
                    Err(e) => println!("Error: {e}\n"),
                }
            }
            ExitCode::SUCCESS
        }
        Command::Tools => match serde_json::to_string_pretty(host.catalogs()) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: {e}");
                ExitCode::FAILURE
            }
        },
        Command::Interactive => {
            match run_interactive(
                host.dispatcher(),
                host.catalogs(),
                shutdown.clone(),
                config.query_timeout,
            )
            .await
            {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("error: {e}");
                    ExitCode::FAILURE
                }
            }
        }
    }
}
