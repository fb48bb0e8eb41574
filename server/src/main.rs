//! Headless authoritative server: hosts the session, starts a match when
//! the peer connects and restarts after a short game-over screen.

use clap::Parser;
use log::info;
use shared::collision::GameResult;
use shared::session::{GameConfig, GameSession, SessionEvents, SessionState};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on (auto-increments when taken)
    #[arg(short, long, default_value_t = shared::DEFAULT_PORT)]
    port: u16,

    /// Grid width in cells (clamped to 4..=40)
    #[arg(long, default_value_t = shared::DEFAULT_GRID_WIDTH)]
    grid_width: u32,

    /// Grid height in cells (clamped to 4..=40)
    #[arg(long, default_value_t = shared::DEFAULT_GRID_HEIGHT)]
    grid_height: u32,
}

struct LogEvents;

impl SessionEvents for LogEvents {
    fn on_connected(&mut self) {
        info!("peer connected");
    }

    fn on_disconnected(&mut self) {
        info!("peer disconnected, waiting for a new one");
    }

    fn on_game_over(&mut self, result: GameResult) {
        info!("match finished: {result:?}");
    }
}

const FRAME: Duration = Duration::from_millis(16);
const RESTART_DELAY: Duration = Duration::from_secs(3);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let config = GameConfig::new(args.grid_width, args.grid_height);
    let (mut session, port) =
        GameSession::server(config, args.port, Box::new(LogEvents))?;
    info!(
        "serving a {}x{} grid on port {port}",
        config.grid_width, config.grid_height
    );

    let mut last_frame = Instant::now();
    let mut restart_at: Option<Instant> = None;

    loop {
        thread::sleep(FRAME);
        let now = Instant::now();
        let delta_time = now.duration_since(last_frame).as_secs_f32();
        last_frame = now;

        session.tick(delta_time);

        if session.state() == SessionState::Pause && session.is_connected() {
            if !session.is_game_over() {
                session.start_game();
            } else {
                // Leave the game-over screen up before the next match.
                let at = *restart_at.get_or_insert(now + RESTART_DELAY);
                if now >= at {
                    restart_at = None;
                    session.start_game();
                }
            }
        } else {
            restart_at = None;
        }
    }
}
