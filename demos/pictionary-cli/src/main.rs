//! Terminal Pictionary. Start one copy with `host`, then `join <code>`
//! from other terminals on the same machine.
//!
//! Rooms are found through a JSON file in the temp directory; set
//! `PARLOR_RENDEZVOUS_FILE` to share one elsewhere. Logs go to stderr and
//! follow `RUST_LOG` (default `info`).

use std::time::{SystemTime, UNIX_EPOCH};

use parlor::prelude::*;
use parlor::{Wake, session::WithFallback};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

type Client = PictionaryClient<WithFallback<DirectoryRendezvous, DirectoryRendezvous>>;

const INVITE_BASE: &str = "https://parlor.games/pictionary";

const HELP: &str = "\
commands:
  host              open a room
  join <code|url>   join a room by code or invite link
  ready             toggle ready in the lobby
  name <name>       change your display name
  start             host: start the first round
  clear             drawer: clear the canvas
  guess <word>      guess the word
  continue          host: next round from the scoreboard
  finish            host: end the game for everyone
  status            show the room
  leave             leave the room
  quit              leave and exit";

enum Input {
    Line(Option<String>),
    Client(Wake),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ClientConfig::from_env()?;
    let rendezvous = config.rendezvous();
    let mut client = PictionaryClient::new(rendezvous, config)?;
    info!(peer_id = %client.local_id(), "pictionary ready");
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let input = tokio::select! {
            line = lines.next_line() => Input::Line(line?),
            wake = client.wait() => Input::Client(wake),
        };

        match input {
            Input::Line(None) => break,
            Input::Line(Some(line)) => {
                if !run_command(&mut client, line.trim()).await {
                    break;
                }
            }
            Input::Client(wake) => {
                if let Some(update) = client.handle(wake).await {
                    show(&client, &update);
                }
            }
        }
    }

    client.leave().await;
    Ok(())
}

/// Runs one command line. Returns `false` to exit.
async fn run_command(client: &mut Client, line: &str) -> bool {
    let (command, arg) = match line.split_once(' ') {
        Some((command, arg)) => (command, arg.trim()),
        None => (line, ""),
    };

    let result = match command {
        "" => Ok(()),
        "help" => {
            println!("{HELP}");
            Ok(())
        }
        "host" => {
            client.create_room().await;
            Ok(())
        }
        "join" => {
            let code = RoomCode::from_url(arg).map_or_else(|| RoomCode::parse(arg), Ok);
            match code {
                Ok(code) => {
                    client.join_room(code).await;
                    Ok(())
                }
                Err(e) => Err(e.into()),
            }
        }
        "ready" => client.toggle_ready().await,
        "name" => client.rename(arg).await,
        "start" => client.start_game().await,
        "clear" => client.draw(DrawingEvent::Clear { timestamp: now_millis() }).await,
        "guess" => client.guess(arg).await,
        "continue" => client.continue_game().await,
        "finish" => client.finish_game().await,
        "status" => {
            print_room(client);
            Ok(())
        }
        "leave" => {
            client.leave().await;
            println!("back at the menu");
            Ok(())
        }
        "quit" | "exit" => return false,
        other => {
            println!("unknown command {other:?}, try `help`");
            Ok(())
        }
    };

    if let Err(e) = result {
        warn!(command, error = %e, "command failed");
        println!("! {e}");
    }
    true
}

fn show(client: &Client, update: &ClientUpdate) {
    match update {
        ClientUpdate::RoomReady(code) => {
            println!("in room {code}");
            println!("invite: {}", code.invite_url(INVITE_BASE));
            print_room(client);
        }
        ClientUpdate::StateChanged => print_room(client),
        ClientUpdate::Tick(secs) if *secs <= 5 || secs % 10 == 0 => println!("{secs}s left"),
        ClientUpdate::Tick(_) => {}
        ClientUpdate::Notice(text) => println!("! {text}"),
        ClientUpdate::SessionEnded => println!("game over, back at the menu"),
    }
}

fn print_room(client: &Client) {
    let state = client.state();
    println!("-- {} --", state.phase());
    for player in state.players().values() {
        let mut tags = Vec::new();
        if &player.id == client.local_id() {
            tags.push("you");
        }
        if state.current_drawer_id() == Some(&player.id) {
            tags.push("drawing");
        }
        if state.phase() == Phase::Lobby && player.is_ready {
            tags.push("ready");
        }
        println!("  {:<20} {:>4}  {}", player.name, player.score, tags.join(", "));
    }

    match state.phase() {
        Phase::Drawing if state.active_drawer() == Some(client.local_id()) => {
            println!("your word: {}", state.current_word().unwrap_or_default());
        }
        Phase::Drawing => println!(
            "{} strokes so far, {}s left",
            state.drawings().len(),
            state.time_remaining()
        ),
        Phase::RoundEnd => {
            let word = state.current_word().unwrap_or_default();
            match state.round_winner_id().and_then(|id| state.player(id)) {
                Some(winner) => println!("{} guessed {word:?}", winner.name),
                None => println!("time's up, the word was {word:?}"),
            }
        }
        _ => {}
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}
