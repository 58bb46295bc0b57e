use clap::Parser;
use client::game::{ClientConfig, GameClient, Phase};
use client::network::Connection;
use client::rendering::Renderer;
use log::{error, info, warn};
use macroquad::prelude::*;
use std::path::PathBuf;
use std::sync::OnceLock;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:3000")]
    server: String,

    /// Directory holding tilesets/ and sprites/
    #[arg(short = 'a', long, default_value = "assets")]
    assets: PathBuf,

    /// Log in with this name as soon as the connection is up
    #[arg(short = 'u', long)]
    username: Option<String>,

    /// Window width
    #[arg(short = 'w', long, default_value = "800")]
    width: i32,

    /// Window height (no short flag to avoid conflict with --help)
    #[arg(long, default_value = "600")]
    height: i32,

    /// Number of messages shown in the message log
    #[arg(long, default_value = "20")]
    message_window: usize,
}

static ARGS: OnceLock<Args> = OnceLock::new();

fn args() -> &'static Args {
    ARGS.get_or_init(Args::parse)
}

fn window_conf() -> Conf {
    let args = args();
    Conf {
        window_title: "Prismal Totality".to_string(),
        window_width: args.width,
        window_height: args.height,
        window_resizable: true,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    if let Err(e) = run(args().clone()).await {
        error!("Client stopped: {}", e);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting client...");
    info!("Connecting to: {}", args.server);
    info!("Controls: numpad or digits 1-4, 6-9 to move");

    let mut connection = Connection::open(&args.server)?;
    let mut renderer = Renderer::new(&args.assets);
    let mut game = GameClient::new(ClientConfig {
        asset_dir: args.assets,
        message_window: args.message_window,
        username: args.username,
    });

    loop {
        while let Some(event) = connection.try_recv() {
            game.handle_event(event, &mut renderer);
        }

        game.poll_input();

        if game.phase() != Phase::Disconnected {
            for message in game.drain_outbox() {
                if let Err(e) = connection.send(message) {
                    warn!("Could not send: {}", e);
                }
            }
        }

        if is_key_pressed(KeyCode::Escape) {
            break;
        }

        renderer.load_pending_textures().await;
        renderer.draw(&game);
        next_frame().await;
    }

    connection.close();
    Ok(())
}
