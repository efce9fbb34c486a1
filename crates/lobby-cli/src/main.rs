//! Lobby CLI - terminal lobby client
//!
//! Connects to a lobby server, prints lobby and game updates as they arrive
//! and reads commands from stdin.

use anyhow::Context;
use clap::Parser;
use lobby_core::AlphanumericPolicy;
use lobby_network::{ClientConfig, Foreground, LobbyClient, ViewKind};
use std::process::ExitCode;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod command;
mod view;

use command::{Command, HELP};
use view::TerminalView;

/// Terminal client for the lobby server
#[derive(Parser, Debug)]
#[command(name = "lobby")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Server host name or address
    #[arg(long)]
    host: String,

    /// Server port
    #[arg(short, long)]
    port: u16,

    /// Nickname shown to other players (letters, digits, '_' and '-')
    #[arg(short, long)]
    nickname: String,

    /// Seconds without data before a keepalive is sent
    #[arg(long, default_value_t = 15)]
    read_timeout_secs: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config =
        ClientConfig::default().with_read_timeout(Duration::from_secs(cli.read_timeout_secs));
    let (client, mut foreground) =
        LobbyClient::new(config, AlphanumericPolicy::with_extra(['_', '-']));

    if let Err(e) = client.connect(&cli.host, cli.port, &cli.nickname).await {
        eprintln!("Connection failed (code {}): {}", e.code(), e);
        return Ok(ExitCode::from(e.code() as u8));
    }
    let session = client.session();
    println!(
        "Connected to {}:{} as {} (id {})",
        session.host_address, session.port, session.nickname, session.id
    );
    println!("{HELP}");

    let mut view = TerminalView::new();
    run(&client, &mut foreground, &mut view).await?;

    client.disconnect().await;
    info!("Bye");
    Ok(ExitCode::SUCCESS)
}

/// Apply view events and stdin commands until the session ends.
async fn run(
    client: &LobbyClient,
    foreground: &mut Foreground,
    view: &mut TerminalView,
) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            event = foreground.next_event() => {
                let Some(event) = event else {
                    debug!("Event queue closed");
                    return Ok(());
                };
                foreground.apply(view, event).await;
                if view.showing() == Some(ViewKind::ConnectionForm) {
                    println!("Disconnected from server.");
                    return Ok(());
                }
            }
            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin")? else {
                    client.leave_server().await;
                    return Ok(());
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Command>() {
                    Ok(Command::Quit) => {
                        client.leave_server().await;
                        return Ok(());
                    }
                    Ok(command) => execute(client, view, command).await,
                    Err(e) => println!("{e:#}"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted");
                client.leave_server().await;
                return Ok(());
            }
        }
    }
}

async fn execute(client: &LobbyClient, view: &TerminalView, command: Command) {
    match command {
        Command::Games => client.request_games().await,
        Command::Create(goal) => client.create_game(goal).await,
        Command::Join(game_id) => client.join_game(&game_id).await,
        Command::Leave(game_id) => client.leave_game(&game_id).await,
        Command::Choose(choice) => {
            if view.active_game().is_none() {
                println!("Not in a game.");
                return;
            }
            client.select_choice(choice).await;
        }
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
    }
}
