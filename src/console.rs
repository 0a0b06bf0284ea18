//! Line-oriented interactive front end.
//!
//! A single session task owns the "query in flight" state. The display loop
//! talks to it only through [`ConsoleCommand`] and [`ConsoleEvent`] channels
//! and blocks on them together with the shutdown token.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::{Dispatcher, QueryContext};
use crate::error::ErrorKind;
use crate::mcp::tools::BackendCatalog;

const CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Submit(String),
    /// Forget the last answer.
    Reset,
    /// Stop accepting commands, let the query in flight finish, then close.
    Drain,
    /// Close now, cancelling the query in flight.
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryReport {
    pub query: String,
    /// The tool result, or the rendered error.
    pub response: String,
    pub error_kind: Option<ErrorKind>,
}

impl QueryReport {
    pub fn is_error(&self) -> bool {
        self.error_kind.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleEvent {
    Accepted { query: String },
    /// A query was submitted while another one was still running.
    Busy { query: String },
    Completed(QueryReport),
    Reset,
    Closed,
}

pub struct SessionHandle {
    pub commands: mpsc::Sender<ConsoleCommand>,
    pub events: mpsc::Receiver<ConsoleEvent>,
    pub task: JoinHandle<Option<QueryReport>>,
}

/// Starts the session task. It stops on [`ConsoleCommand::Quit`] or when
/// `shutdown` fires. [`ConsoleCommand::Drain`] and dropping every command
/// sender stop it once the query in flight has reported. Returns the last
/// answer it held.
pub fn spawn_session(
    dispatcher: Arc<Dispatcher>,
    shutdown: CancellationToken,
    query_timeout: Option<Duration>,
) -> SessionHandle {
    let (command_tx, command_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (event_tx, event_rx) = mpsc::channel(CHANNEL_CAPACITY);

    let task = tokio::spawn(run_session(
        dispatcher,
        shutdown,
        query_timeout,
        command_rx,
        event_tx,
    ));

    SessionHandle {
        commands: command_tx,
        events: event_rx,
        task,
    }
}

async fn run_session(
    dispatcher: Arc<Dispatcher>,
    shutdown: CancellationToken,
    query_timeout: Option<Duration>,
    mut commands: mpsc::Receiver<ConsoleCommand>,
    events: mpsc::Sender<ConsoleEvent>,
) -> Option<QueryReport> {
    let (done_tx, mut done_rx) = mpsc::channel::<QueryReport>(1);
    let mut in_flight: Option<QueryContext> = None;
    let mut last: Option<QueryReport> = None;
    let mut draining = false;

    loop {
        if draining && in_flight.is_none() {
            break;
        }

        let event = tokio::select! {
            _ = shutdown.cancelled() => break,
            command = commands.recv(), if !draining => match command {
                None | Some(ConsoleCommand::Drain) => {
                    draining = true;
                    continue;
                }
                Some(ConsoleCommand::Quit) => break,
                Some(ConsoleCommand::Reset) => {
                    last = None;
                    ConsoleEvent::Reset
                }
                Some(ConsoleCommand::Submit(query)) => {
                    if in_flight.is_some() {
                        ConsoleEvent::Busy { query }
                    } else {
                        let ctx = QueryContext::child_of(&shutdown)
                            .with_optional_timeout(query_timeout);
                        in_flight = Some(ctx.clone());
                        spawn_query(Arc::clone(&dispatcher), query.clone(), ctx, done_tx.clone());
                        ConsoleEvent::Accepted { query }
                    }
                }
            },
            Some(report) = done_rx.recv() => {
                in_flight = None;
                last = Some(report.clone());
                ConsoleEvent::Completed(report)
            }
        };

        if events.send(event).await.is_err() {
            break;
        }
    }

    if let Some(ctx) = in_flight.take() {
        ctx.cancel();
    }
    let _ = events.send(ConsoleEvent::Closed).await;
    last
}

fn spawn_query(
    dispatcher: Arc<Dispatcher>,
    query: String,
    ctx: QueryContext,
    done: mpsc::Sender<QueryReport>,
) {
    tokio::spawn(async move {
        let report = match dispatcher.run(&query, &ctx).await {
            Ok(response) => QueryReport {
                query,
                response,
                error_kind: None,
            },
            Err(e) => QueryReport {
                query,
                response: e.to_string(),
                error_kind: Some(e.kind()),
            },
        };
        let _ = done.send(report).await;
    });
}

/// Reads queries from stdin until `:quit`, end of input or `shutdown`.
pub async fn run_interactive(
    dispatcher: Arc<Dispatcher>,
    catalogs: &[BackendCatalog],
    shutdown: CancellationToken,
    query_timeout: Option<Duration>,
) -> std::io::Result<()> {
    println!("Type a request, :tools to list tools, :reset to clear, :quit to exit.");
    let input = BufReader::new(tokio::io::stdin());
    run_console(input, dispatcher, catalogs, shutdown, query_timeout).await?;
    Ok(())
}

/// Drives a session from `input`, one request per line, printing every
/// event. Returns the last answer the session held when it closed.
///
/// A read error stops the session before it is returned.
pub async fn run_console<R>(
    input: R,
    dispatcher: Arc<Dispatcher>,
    catalogs: &[BackendCatalog],
    shutdown: CancellationToken,
    query_timeout: Option<Duration>,
) -> std::io::Result<Option<QueryReport>>
where
    R: AsyncBufRead + Unpin,
{
    let SessionHandle {
        commands,
        mut events,
        task,
    } = spawn_session(dispatcher, shutdown.clone(), query_timeout);
    let mut lines = input.lines();
    let mut input_open = true;
    let mut read_error = None;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            line = lines.next_line(), if input_open => {
                let command = match line {
                    Err(e) => {
                        read_error = Some(e);
                        break;
                    }
                    // End of input: the session closes after the last answer is shown.
                    Ok(None) => {
                        input_open = false;
                        ConsoleCommand::Drain
                    }
                    Ok(Some(line)) => match line.trim() {
                        "" => continue,
                        ":quit" | "q" => ConsoleCommand::Quit,
                        ":reset" => ConsoleCommand::Reset,
                        ":tools" => {
                            print_catalogs(catalogs);
                            continue;
                        }
                        query => ConsoleCommand::Submit(query.to_string()),
                    },
                };
                if commands.send(command).await.is_err() {
                    break;
                }
            }
            event = events.recv() => match event {
                None | Some(ConsoleEvent::Closed) => break,
                Some(ConsoleEvent::Accepted { query }) => println!("> {query}\nThinking..."),
                Some(ConsoleEvent::Busy { .. }) => {
                    println!("Still working on the previous request, please wait.")
                }
                Some(ConsoleEvent::Completed(report)) if report.is_error() => {
                    println!("Error: {}", report.response)
                }
                Some(ConsoleEvent::Completed(report)) => println!("{}", report.response),
                Some(ConsoleEvent::Reset) => println!("Cleared."),
            },
        }
    }

    drop(events);
    if read_error.is_some() {
        let _ = commands.send(ConsoleCommand::Quit).await;
    }
    drop(commands);
    let last = match task.await {
        Ok(last) => last,
        Err(e) => {
            tracing::warn!(error = %e, "console session task failed");
            None
        }
    };
    match read_error {
        Some(e) => Err(e),
        None => Ok(last),
    }
}

fn print_catalogs(catalogs: &[BackendCatalog]) {
    for catalog in catalogs {
        println!("[{}]", catalog.backend);
        for tool in &catalog.tools {
            println!("  {} - {}", tool.name, tool.description);
        }
    }
}
