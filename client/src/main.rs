//! Headless replica client: connects to a server and mirrors its
//! snapshots, logging lifecycle events and game state.

use clap::Parser;
use log::{debug, info};
use shared::collision::GameResult;
use shared::session::{GameConfig, GameSession, SessionEvents, SessionState};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short, long, default_value = "127.0.0.1")]
    server: String,

    /// Server port
    #[arg(short, long, default_value_t = shared::DEFAULT_PORT)]
    port: u16,
}

struct LogEvents;

impl SessionEvents for LogEvents {
    fn on_connected(&mut self) {
        info!("connected, waiting for the server to start a match");
    }

    fn on_disconnected(&mut self) {
        info!("disconnected from server");
    }

    fn on_start_received(&mut self) {
        info!("match started");
    }

    fn on_game_over(&mut self, result: GameResult) {
        info!("match finished: {result:?}");
    }
}

const FRAME: Duration = Duration::from_millis(16);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let mut session = GameSession::client(
        GameConfig::default(),
        &args.server,
        args.port,
        Box::new(LogEvents),
    )?;
    info!("replicating from {}:{}", args.server, args.port);

    let mut last_frame = Instant::now();
    let mut was_connected = false;
    loop {
        thread::sleep(FRAME);
        let now = Instant::now();
        let delta_time = now.duration_since(last_frame).as_secs_f32();
        last_frame = now;

        session.tick(delta_time);

        if session.state() != SessionState::NonActive {
            was_connected = true;
        } else if was_connected {
            info!("session over");
            return Ok(());
        }
        if session.state() == SessionState::Active {
            debug!(
                "snake1 {:?} snake2 {:?} apple {:?}",
                session.snake1().head(),
                session.snake2().head(),
                session.apple()
            );
        }
    }
}
