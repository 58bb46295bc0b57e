use clap::Parser;
use client::backend::RecordingBackend;
use client::game::{ClientConfig, GameClient, Phase};
use client::network::{Connection, TransportEvent};
use log::{info, warn};
use shared::{ClientMessage, Direction, ServerMessage};
use std::path::PathBuf;

/// Connects without a window, logs in and reports what the server sends.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:3000")]
    server: String,

    /// Directory holding tilesets/
    #[arg(short = 'a', long, default_value = "assets")]
    assets: PathBuf,

    /// Name to log in with
    #[arg(short = 'u', long, default_value = "probe")]
    username: String,

    /// Keypad directions to send once the first level arrives, e.g. "8,8,6"
    #[arg(short = 'm', long, value_delimiter = ',')]
    moves: Vec<char>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let mut moves = Vec::new();
    for key in &args.moves {
        match Direction::from_key(*key) {
            Some(dir) => moves.push(ClientMessage::movement(dir)),
            None => warn!("Ignoring '{}': not a movement key", key),
        }
    }

    let mut connection = Connection::open(&args.server)?;
    let mut game = GameClient::new(ClientConfig {
        asset_dir: args.assets,
        username: Some(args.username),
        ..ClientConfig::default()
    });
    let mut backend = RecordingBackend::new();

    while let Some(event) = connection.recv_blocking() {
        let first_level = matches!(event, TransportEvent::Message(ServerMessage::PresentLevel(_)))
            && !game.session().is_loaded();

        game.handle_event(event, &mut backend);

        if first_level {
            info!(
                "Level loaded: {} entities, {} visuals",
                game.session().entities().map_or(0, |store| store.len()),
                backend.live_visuals()
            );
            for intent in moves.drain(..) {
                connection.send(intent)?;
            }
        }

        if game.phase() == Phase::Disconnected {
            break;
        }
        for message in game.drain_outbox() {
            connection.send(message)?;
        }
    }

    for line in game.messages().visible() {
        info!("{}", line);
    }
    info!(
        "Backend calls: {} tiles placed, {} visuals created, {} moved, {} destroyed",
        backend.tiles_placed(),
        backend.visuals_created(),
        backend.visuals_moved(),
        backend.visuals_destroyed()
    );

    connection.close();
    Ok(())
}
