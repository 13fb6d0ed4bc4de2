//! Quizreader console: play a multiplayer room from the terminal.
//!
//! Usage:
//!   cargo run -p quizreader-console -- --room literature --username Ann \
//!       [--user-id ID] [--server ws://host/play/mp]
//!
//! Question words pushed by the room are revealed as they arrive. Type
//! `/buzz`, `/answer TEXT`, `/next`, `/pause`, `/bonus` or `/quit`; any other
//! line is sent as chat.

mod commands;

use anyhow::{bail, Context};
use commands::{parse_command, Command};
use quizreader_room::{Directive, RoomClient, RoomConfig, ServerEvent, DISCONNECTED};
use quizreader_voice::{PlaceholderSynthesizer, PlatformCapabilities, RevealEngine, Settings};
use std::io::Write;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "info,quizreader_voice=info,quizreader_room=info";

#[derive(Debug, Default)]
struct ConsoleArgs {
    room: Option<String>,
    username: Option<String>,
    user_id: Option<String>,
    server: Option<String>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> ConsoleArgs {
    let mut parsed = ConsoleArgs::default();
    while let Some(a) = args.next() {
        match a.as_str() {
            "--room" => parsed.room = args.next(),
            "--username" => parsed.username = args.next(),
            "--user-id" => parsed.user_id = args.next(),
            "--server" => parsed.server = args.next(),
            _ => {}
        }
    }
    parsed
}

fn print_usage() {
    eprintln!("Quizreader console");
    eprintln!("  --room NAME        Room to join (required)");
    eprintln!("  --username NAME    Display name (required)");
    eprintln!("  --user-id ID       Reuse a user id (default: generated)");
    eprintln!("  --server URL       WebSocket endpoint (default: QUIZREADER_SERVER_URL)");
    eprintln!();
    eprintln!("Reader settings are read from {} when present.", Settings::FILE_NAME);
}

enum Inbound {
    Event(ServerEvent),
    Closed(serde_json::Value),
}

fn verdict(directive: Directive) -> &'static str {
    match directive {
        Directive::Accept => "correct",
        Directive::Reject => "incorrect",
        Directive::Prompt => "prompt",
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[quizreader-console] .env not loaded: {} (using system environment)", e);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = parse_args(std::env::args().skip(1));
    let (Some(room), Some(username)) = (args.room.clone(), args.username.clone()) else {
        print_usage();
        bail!("--room and --username are required");
    };

    let mut room_config = RoomConfig::from_env();
    if let Some(server) = args.server {
        room_config.server_url = server;
    }
    let settings = Settings::load_from_path(Path::new(Settings::FILE_NAME))
        .context("loading reader settings")?;

    let (mut reader, _notices) = RevealEngine::new(
        PlaceholderSynthesizer,
        settings.reader,
        PlatformCapabilities::desktop(),
    )?;

    let mut client = RoomClient::new(room_config)?;
    let (inbound_tx, mut inbound) = mpsc::unbounded_channel();
    let events_tx = inbound_tx.clone();
    client.on_event(move |event| {
        let _ = events_tx.send(Inbound::Event(event.clone()));
    });
    client.on(DISCONNECTED, move |payload| {
        let _ = inbound_tx.send(Inbound::Closed(payload.clone()));
    });
    client.set_error_sink(|e| warn!(error = %e, "Room event problem"));

    client
        .connect(&room, &username, args.user_id)
        .await
        .with_context(|| format!("joining room '{room}'"))?;
    info!(room = %room, username = %username, "Joined. Type /quit to leave.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut paused = false;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_command(&line) {
                    Command::Buzz => {
                        let index = reader.stop();
                        client.buzz();
                        info!(word = ?index, "Buzzed");
                    }
                    Command::Answer(answer) => {
                        client.give_answer(&answer);
                    }
                    Command::Next => {
                        client.next();
                    }
                    Command::Pause => {
                        paused = !paused;
                        client.pause(paused);
                    }
                    Command::Bonus => {
                        client.start_bonus_answer();
                    }
                    Command::Chat(message) => {
                        client.chat(&message);
                    }
                    Command::Quit => break,
                    Command::Nothing => {}
                }
            }
            inbound_event = inbound.recv() => {
                let Some(inbound_event) = inbound_event else { break };
                match inbound_event {
                    Inbound::Closed(payload) => {
                        let code = payload["code"].clone();
                        let reason = payload["reason"].as_str().unwrap_or_default().to_string();
                        println!();
                        warn!(%code, %reason, "Room closed the connection");
                        break;
                    }
                    Inbound::Event(event) => {
                        if !show_event(&mut reader, event) {
                            break;
                        }
                    }
                }
            }
        }
    }

    reader.reset();
    client.disconnect();
    Ok(())
}

/// Apply one room event to the reveal timeline and print it. Returns `false`
/// when the session should end.
fn show_event(reader: &mut RevealEngine<PlaceholderSynthesizer>, event: ServerEvent) -> bool {
    if event.starts_question() {
        reader.reset();
    }
    match event {
        ServerEvent::StartNextTossup { .. } => {
            reader.begin_feed();
            println!("\n── tossup ──");
        }
        ServerEvent::StartNextBonus { .. } => println!("\n── bonus ──"),
        ServerEvent::UpdateQuestion { word } => {
            reader.feed_word(&word);
            print!("{word} ");
            let _ = std::io::stdout().flush();
        }
        ServerEvent::Buzz { username, .. } => {
            let index = reader.stop();
            println!("\n🔔 {username} buzzed (after word {})", index.map_or(0, |i| i + 1));
        }
        ServerEvent::GiveTossupAnswer {
            username,
            given_answer,
            directive,
            directed_prompt,
            ..
        }
        | ServerEvent::GiveBonusAnswer {
            username,
            given_answer,
            directive,
            directed_prompt,
            ..
        } => {
            println!("{username}: \"{given_answer}\" → {}", verdict(directive));
            if let Some(prompt) = directed_prompt {
                println!("   prompt: {prompt}");
            }
        }
        ServerEvent::RevealTossupAnswer { answer } => {
            reader.finish_feed();
            println!("\nANSWER: {answer}");
        }
        ServerEvent::EndCurrentTossup => reader.finish_feed(),
        ServerEvent::RevealLeadin { leadin } => println!("{leadin}"),
        ServerEvent::RevealNextPart { part, .. } => println!("[10] {part}"),
        ServerEvent::Chat {
            username, message, ..
        } => println!("<{username}> {message}"),
        ServerEvent::Join { username, .. } => println!("→ {username} joined"),
        ServerEvent::Leave { username, .. } => println!("← {username} left"),
        ServerEvent::Pause { username, pausing, .. } => {
            let who = username.unwrap_or_else(|| "someone".to_string());
            let verb = if pausing.unwrap_or(true) { "paused" } else { "resumed" };
            println!("⏸ {who} {verb}");
        }
        ServerEvent::Error { message } => eprintln!("room error: {message}"),
        ServerEvent::ForcedRemoval { reason } => {
            let reason = reason.map(|r| format!(": {r}")).unwrap_or_default();
            println!("\nRemoved from room{reason}");
            return false;
        }
        ServerEvent::ConnectionAcknowledged { .. }
        | ServerEvent::EndCurrentBonus
        | ServerEvent::Other => {}
    }
    true
}
