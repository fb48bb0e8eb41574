//! Game session: authoritative simulation or thin replica, plus the
//! connection/lifecycle state machine shared by both roles.
//!
//! The external frame loop calls [`GameSession::tick`] every frame; the
//! session gates the actual work to a fixed interval. On the server a gated
//! tick drains the network, advances both snakes, resolves collisions and
//! apple consumption and broadcasts a snapshot. On the client it waits
//! (bounded) for a fresh snapshot and applies it; local input is forwarded
//! as a direction change, never applied locally.

use crate::codec::{CodecError, Quantizer};
use crate::collision::{self, GameResult};
use crate::net::{ChannelEvent, NetChannel, NetError};
use crate::position::{Direction, GridPos};
use crate::protocol::{Message, WirePos};
use crate::snake::Snake;
use crate::{GRID_MAX, GRID_MIN, MAX_SNAKE_SIZE, SEED_BODY_LEN, TICK_INTERVAL};
use log::{error, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::thread;
use std::time::{Duration, Instant};

/// How long the client waits inside one gated tick for a snapshot before
/// treating the silence as a disconnect.
const SNAPSHOT_WAIT: Duration = Duration::from_secs(1);
const SNAPSHOT_POLL_PAUSE: Duration = Duration::from_millis(1);

/// Rejection-sampling attempts before apple placement falls back to a
/// full-grid scan.
const APPLE_SAMPLE_ATTEMPTS: u32 = 1000;

/// Connection/game lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No peer connected.
    NonActive,
    /// Peer connected; simulation not running (or frozen on a game-over
    /// screen).
    Pause,
    /// Simulation advancing.
    Active,
}

/// Lifecycle callbacks consumed by the renderer/UI layer. Implementations
/// run synchronously inside `tick` and must not call back into the session.
pub trait SessionEvents {
    fn on_connected(&mut self) {}
    fn on_disconnected(&mut self) {}
    fn on_start_received(&mut self) {}
    fn on_game_over(&mut self, _result: GameResult) {}
}

/// Observer that ignores everything.
pub struct NullEvents;

impl SessionEvents for NullEvents {}

#[derive(Debug, Clone, Copy)]
pub struct GameConfig {
    pub grid_width: u32,
    pub grid_height: u32,
    pub tick_interval: f32,
}

impl GameConfig {
    /// Grid axes are clamped into `[GRID_MIN, GRID_MAX]` independently.
    pub fn new(grid_width: u32, grid_height: u32) -> Self {
        Self {
            grid_width: grid_width.clamp(GRID_MIN, GRID_MAX),
            grid_height: grid_height.clamp(GRID_MIN, GRID_MAX),
            tick_interval: TICK_INTERVAL,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new(crate::DEFAULT_GRID_WIDTH, crate::DEFAULT_GRID_HEIGHT)
    }
}

pub struct GameSession {
    snake1: Snake,
    snake2: Snake,
    apple: GridPos,
    grid: GridPos,
    state: SessionState,
    result: GameResult,
    game_over: bool,
    freeze_frame: bool,
    tick_timer: f32,
    tick_interval: f32,
    have_snapshot: bool,
    quantizer: Quantizer,
    rng: StdRng,
    channel: NetChannel,
    events: Box<dyn SessionEvents>,
}

impl GameSession {
    /// Authoritative host. Returns the session and the port actually bound
    /// (the requested one, or the next free one after it).
    pub fn server(
        config: GameConfig,
        port: u16,
        events: Box<dyn SessionEvents>,
    ) -> Result<(GameSession, u16), NetError> {
        let (channel, bound) = NetChannel::server(port)?;
        Ok((Self::with_channel(config, channel, events), bound))
    }

    /// Thin replica connected to `address:port`.
    pub fn client(
        config: GameConfig,
        address: &str,
        port: u16,
        events: Box<dyn SessionEvents>,
    ) -> Result<GameSession, NetError> {
        let channel = NetChannel::client(address, port)?;
        Ok(Self::with_channel(config, channel, events))
    }

    fn with_channel(
        config: GameConfig,
        channel: NetChannel,
        events: Box<dyn SessionEvents>,
    ) -> GameSession {
        GameSession {
            snake1: Snake::new(),
            snake2: Snake::new(),
            apple: GridPos::default(),
            grid: GridPos::new(config.grid_width as f32, config.grid_height as f32),
            state: SessionState::NonActive,
            result: GameResult::Tie,
            game_over: false,
            freeze_frame: false,
            tick_timer: 0.0,
            tick_interval: config.tick_interval,
            have_snapshot: true,
            quantizer: Quantizer::default(),
            rng: StdRng::from_entropy(),
            channel,
            events,
        }
    }

    /// Called once per frame; the tick body runs only when the accumulated
    /// delta time crosses the fixed interval. The accumulator resets to
    /// zero on firing, so surplus time is discarded rather than replayed.
    pub fn tick(&mut self, delta_time: f32) {
        self.tick_timer += delta_time;
        if self.tick_timer < self.tick_interval {
            return;
        }
        self.tick_timer = 0.0;

        if self.channel.is_server() {
            let events = self.channel.poll();
            self.apply_events(events);
            if self.state == SessionState::Active {
                self.step();
            }
        } else {
            self.client_wait();
        }
    }

    /// Local steering input: applied to snake1 on the server, forwarded to
    /// the server from the client.
    pub fn steer(&mut self, direction: Direction) {
        if self.channel.is_server() {
            self.snake1.set_direction(direction);
        } else if let Err(e) = self.channel.send_direction_change(direction) {
            warn!("direction change not sent: {e}");
        }
    }

    /// Seeds both snakes, places the apple, broadcasts StartGame and goes
    /// Active. Server role only.
    pub fn start_game(&mut self) {
        if !self.channel.is_server() {
            error!("start_game is a server operation");
            return;
        }
        self.reset();

        let snake1_seed = seed_body(GridPos::new(2.0, 2.0));
        let snake2_seed = seed_body(GridPos::new(8.0, 8.0));
        self.seed_snakes(&snake1_seed, &snake2_seed);
        self.spawn_apple();
        self.state = SessionState::Active;

        match self.build_start_message() {
            Ok(msg) => {
                if let Err(e) = self.channel.send_start_game(msg) {
                    error!("failed to send StartGame: {e}");
                }
            }
            Err(e) => error!("StartGame encode failed: {e}"),
        }
        info!(
            "match started on {}x{} grid",
            self.grid.x as u32, self.grid.z as u32
        );
    }

    /// Explicit per-match reset: clears snakes, flags and the tick timer.
    pub fn reset(&mut self) {
        self.snake1.reset();
        self.snake2.reset();
        self.game_over = false;
        self.freeze_frame = false;
        self.tick_timer = 0.0;
        self.have_snapshot = true;
    }

    pub fn disconnect(&mut self) {
        self.channel.disconnect();
        self.connection_changed(false);
    }

    // --- read-only surface for the renderer/UI -------------------------

    pub fn snake1(&self) -> &Snake {
        &self.snake1
    }

    pub fn snake2(&self) -> &Snake {
        &self.snake2
    }

    pub fn apple(&self) -> GridPos {
        self.apple
    }

    pub fn grid(&self) -> GridPos {
        self.grid
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn result(&self) -> GameResult {
        self.result
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// True while the last simulated frame should stay on screen.
    pub fn freeze_frame(&self) -> bool {
        self.freeze_frame
    }

    pub fn is_server(&self) -> bool {
        self.channel.is_server()
    }

    pub fn is_connected(&self) -> bool {
        self.channel.is_connected()
    }

    // --- tick internals -------------------------------------------------

    /// One authoritative simulation step. At most one collision outcome is
    /// produced per tick; the first rule that fires ends the match.
    fn step(&mut self) {
        self.snake1.advance(self.grid);
        self.snake2.advance(self.grid);

        if let Some(result) = collision::resolve(self.snake1.body(), self.snake2.body()) {
            self.finish_game(result);
            return;
        }
        if self.snake1.check_collision() {
            self.finish_game(GameResult::Snake2);
            return;
        }
        if self.snake2.check_collision() {
            self.finish_game(GameResult::Snake1);
            return;
        }

        if self.snake1.has_eaten(self.apple) {
            self.snake1.grow();
            self.spawn_apple();
        } else if self.snake2.has_eaten(self.apple) {
            self.snake2.grow();
            self.spawn_apple();
        }

        self.broadcast_snapshot();
    }

    /// The replica may not render without a fresh snapshot, so poll until
    /// one arrives. The wait is bounded: a server that goes silent without
    /// a clean disconnect is treated as disconnected.
    fn client_wait(&mut self) {
        let deadline = Instant::now() + SNAPSHOT_WAIT;
        loop {
            let events = self.channel.poll();
            self.apply_events(events);
            if self.have_snapshot {
                break;
            }
            if Instant::now() >= deadline {
                warn!(
                    "no snapshot from server within {:?}, treating as disconnect",
                    SNAPSHOT_WAIT
                );
                self.channel.disconnect();
                self.connection_changed(false);
                return;
            }
            thread::sleep(SNAPSHOT_POLL_PAUSE);
        }
        // Consume the snapshot so the next gated tick waits again.
        if self.state == SessionState::Active {
            self.have_snapshot = false;
        }
    }

    fn apply_events(&mut self, events: Vec<ChannelEvent>) {
        for event in events {
            match event {
                ChannelEvent::Connected => self.connection_changed(true),
                ChannelEvent::Disconnected => self.connection_changed(false),
                ChannelEvent::Message(msg) => self.handle_message(msg),
            }
        }
    }

    fn handle_message(&mut self, msg: Message) {
        let server = self.channel.is_server();
        match msg {
            Message::DirectionChange { direction } if server => {
                self.snake2.set_direction(direction);
            }
            Message::StartGame {
                grid_width,
                grid_height,
                snake1_seed,
                snake2_seed,
                apple,
            } if !server => {
                self.on_start_game(grid_width, grid_height, snake1_seed, snake2_seed, apple);
            }
            Message::GameState {
                snake1_len,
                snake2_len,
                snake1_dir,
                snake2_dir,
                snake1_body,
                snake2_body,
                apple,
            } if !server => {
                self.on_game_state(
                    snake1_len,
                    snake2_len,
                    snake1_dir,
                    snake2_dir,
                    &snake1_body,
                    &snake2_body,
                    apple,
                );
            }
            Message::StopGame { result } if !server => self.on_stop_game(result),
            other => warn!("ignoring {} not meant for this role", other.name()),
        }
    }

    fn connection_changed(&mut self, connected: bool) {
        if connected {
            if self.state != SessionState::Active {
                self.state = SessionState::Pause;
                self.events.on_connected();
            }
        } else if self.state != SessionState::NonActive {
            self.state = SessionState::NonActive;
            self.events.on_disconnected();
        }
        self.have_snapshot = true;
    }

    fn finish_game(&mut self, result: GameResult) {
        info!("game over: {result:?}");
        self.result = result;
        self.game_over = true;
        self.state = SessionState::Pause;
        self.freeze_frame = true;
        self.broadcast_snapshot();
        if let Err(e) = self.channel.send_stop_game(result) {
            error!("failed to send StopGame: {e}");
        }
        self.events.on_game_over(result);
    }

    fn on_start_game(
        &mut self,
        grid_width: u8,
        grid_height: u8,
        snake1_seed: [WirePos; 3],
        snake2_seed: [WirePos; 3],
        apple: WirePos,
    ) {
        // Decode everything before touching any state so a bad message
        // leaves the session untouched.
        let decoded = (|| -> Result<_, CodecError> {
            let mut s1 = [GridPos::default(); SEED_BODY_LEN];
            let mut s2 = [GridPos::default(); SEED_BODY_LEN];
            for (slot, wire) in s1.iter_mut().zip(snake1_seed) {
                *slot = self.quantizer.decode_pos(wire)?;
            }
            for (slot, wire) in s2.iter_mut().zip(snake2_seed) {
                *slot = self.quantizer.decode_pos(wire)?;
            }
            Ok((s1, s2, self.quantizer.decode_pos(apple)?))
        })();
        let (s1, s2, apple_pos) = match decoded {
            Ok(parts) => parts,
            Err(e) => {
                warn!("dropping StartGame: {e}");
                return;
            }
        };

        self.reset();
        let config = GameConfig::new(u32::from(grid_width), u32::from(grid_height));
        self.grid = GridPos::new(config.grid_width as f32, config.grid_height as f32);
        self.seed_snakes(&s1, &s2);
        self.apple = apple_pos;
        self.state = SessionState::Active;
        self.events.on_start_received();
    }

    #[allow(clippy::too_many_arguments)]
    fn on_game_state(
        &mut self,
        snake1_len: u8,
        snake2_len: u8,
        snake1_dir: Direction,
        snake2_dir: Direction,
        snake1_body: &[WirePos],
        snake2_body: &[WirePos],
        apple: WirePos,
    ) {
        let decoded = (|| -> Result<_, CodecError> {
            let mut s1 = Vec::with_capacity(usize::from(snake1_len));
            let mut s2 = Vec::with_capacity(usize::from(snake2_len));
            for wire in &snake1_body[..usize::from(snake1_len)] {
                s1.push(self.quantizer.decode_pos(*wire)?);
            }
            for wire in &snake2_body[..usize::from(snake2_len)] {
                s2.push(self.quantizer.decode_pos(*wire)?);
            }
            Ok((s1, s2, self.quantizer.decode_pos(apple)?))
        })();
        let (s1, s2, apple_pos) = match decoded {
            Ok(parts) => parts,
            Err(e) => {
                warn!("dropping GameState: {e}");
                return;
            }
        };

        self.have_snapshot = true;
        self.apple = apple_pos;
        self.snake1.apply_snapshot(&s1);
        self.snake2.apply_snapshot(&s2);
        self.snake1.set_direction(snake1_dir);
        self.snake2.set_direction(snake2_dir);
    }

    fn on_stop_game(&mut self, result: GameResult) {
        info!("game over (from server): {result:?}");
        self.result = result;
        self.game_over = true;
        self.state = SessionState::Pause;
        self.freeze_frame = true;
        self.have_snapshot = true;
        self.events.on_game_over(result);
    }

    fn seed_snakes(&mut self, snake1_seed: &[GridPos], snake2_seed: &[GridPos]) {
        self.snake1.reset();
        self.snake2.reset();
        for &pos in snake1_seed {
            self.snake1.add_body_part(pos);
        }
        for &pos in snake2_seed {
            self.snake2.add_body_part(pos);
        }
    }

    fn spawn_apple(&mut self) {
        match random_apple_position(
            &mut self.rng,
            self.grid,
            self.snake1.body(),
            self.snake2.body(),
        ) {
            Some(pos) => self.apple = pos,
            None => error!(
                "no free cell for an apple on the {}x{} grid",
                self.grid.x as u32, self.grid.z as u32
            ),
        }
    }

    fn broadcast_snapshot(&mut self) {
        match self.build_snapshot() {
            Ok(msg) => {
                if let Err(e) = self.channel.send_game_state(msg) {
                    error!("failed to send snapshot: {e}");
                }
            }
            Err(e) => error!("snapshot encode failed: {e}"),
        }
    }

    fn build_snapshot(&self) -> Result<Message, CodecError> {
        let mut snake1_body = [WirePos::default(); MAX_SNAKE_SIZE];
        let mut snake2_body = [WirePos::default(); MAX_SNAKE_SIZE];
        for (slot, part) in snake1_body.iter_mut().zip(self.snake1.body()) {
            *slot = self.quantizer.encode_pos(*part)?;
        }
        for (slot, part) in snake2_body.iter_mut().zip(self.snake2.body()) {
            *slot = self.quantizer.encode_pos(*part)?;
        }
        Ok(Message::GameState {
            snake1_len: self.snake1.body().len() as u8,
            snake2_len: self.snake2.body().len() as u8,
            snake1_dir: self.snake1.current_direction(),
            snake2_dir: self.snake2.current_direction(),
            snake1_body,
            snake2_body,
            apple: self.quantizer.encode_pos(self.apple)?,
        })
    }

    fn build_start_message(&self) -> Result<Message, CodecError> {
        let mut snake1_seed = [WirePos::default(); 3];
        let mut snake2_seed = [WirePos::default(); 3];
        for (slot, part) in snake1_seed.iter_mut().zip(self.snake1.body()) {
            *slot = self.quantizer.encode_pos(*part)?;
        }
        for (slot, part) in snake2_seed.iter_mut().zip(self.snake2.body()) {
            *slot = self.quantizer.encode_pos(*part)?;
        }
        Ok(Message::StartGame {
            grid_width: self.grid.x as u8,
            grid_height: self.grid.z as u8,
            snake1_seed,
            snake2_seed,
            apple: self.quantizer.encode_pos(self.apple)?,
        })
    }
}

fn seed_body(head: GridPos) -> [GridPos; SEED_BODY_LEN] {
    [
        head,
        GridPos::new(head.x - 1.0, head.z),
        GridPos::new(head.x - 2.0, head.z),
    ]
}

/// Uniform draw over the grid, rejecting cells occupied by either snake.
/// Falls back to a deterministic full-grid scan when sampling keeps
/// missing; returns `None` only for a completely full board.
pub fn random_apple_position<R: Rng>(
    rng: &mut R,
    grid: GridPos,
    snake1: &[GridPos],
    snake2: &[GridPos],
) -> Option<GridPos> {
    let width = grid.x as u32;
    let height = grid.z as u32;
    let occupied = |pos: &GridPos| snake1.contains(pos) || snake2.contains(pos);

    for _ in 0..APPLE_SAMPLE_ATTEMPTS {
        let pos = GridPos::new(
            rng.gen_range(0..width) as f32,
            rng.gen_range(0..height) as f32,
        );
        if !occupied(&pos) {
            return Some(pos);
        }
    }

    for x in 0..width {
        for z in 0..height {
            let pos = GridPos::new(x as f32, z as f32);
            if !occupied(&pos) {
                return Some(pos);
            }
        }
    }
    None
}
