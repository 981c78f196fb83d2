//! Session state machine.
//!
//! Translates transport lifecycle events and decoded packets into session
//! state, feeds tick updates into the world and queues outbound packets.
//! Pure state: the async driver in `client.rs` owns the socket and calls in.
//!
//! `Idle -> Connecting -> Started -> {Spectating | Over} -> Closed`, with an
//! orthogonal `errored` flag.

use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, info, warn};
use worldsync_shared::{
    config::ClientConfig,
    console::Console,
    net::{
        DisconnectReason, GameOverPacket, JoinPacket, JoinedPacket, KillFeedPacket, MapPacket, Packet,
        PacketReader, MAX_PACKETS_PER_FRAME, PROTOCOL_VERSION,
    },
    render::Scene,
};

use crate::{
    interp::TickClock,
    notify::{EffectEvent, SoundCue, UiEvent},
    settings::{register_cvars, FrameContext, FrameSettings},
    world::GameWorld,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No connection attempt yet.
    Idle,
    /// Transport opening or join pending.
    Connecting,
    /// Joined; updates are applied.
    Started,
    /// Watching after game over; updates are applied.
    Spectating,
    /// Game over; the world is kept for the end screen.
    Over,
    /// Torn down.
    Closed,
}

pub struct Session {
    state: SessionState,
    errored: bool,
    cfg: ClientConfig,
    pub console: Console,
    world: GameWorld,
    outbound: Vec<Packet>,
    tick_clock: TickClock,
    ping_sent_at: Option<Instant>,
    rtt: Option<Duration>,
    team: Option<JoinedPacket>,
    map: Option<MapPacket>,
    disconnect_reason: Option<DisconnectReason>,
}

impl Session {
    pub fn new(cfg: ClientConfig, scene: Box<dyn Scene>) -> Self {
        let mut console = Console::new();
        register_cvars(&mut console, &cfg);
        Self {
            state: SessionState::Idle,
            errored: false,
            tick_clock: TickClock::new(cfg.nominal_tick_interval()),
            cfg,
            console,
            world: GameWorld::new(scene),
            outbound: Vec::new(),
            ping_sent_at: None,
            rtt: None,
            team: None,
            map: None,
            disconnect_reason: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn errored(&self) -> bool {
        self.errored
    }

    /// A game is running (joined, possibly spectating).
    pub fn is_started(&self) -> bool {
        matches!(self.state, SessionState::Started | SessionState::Spectating)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.cfg
    }

    pub fn world(&self) -> &GameWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut GameWorld {
        &mut self.world
    }

    /// Last measured round-trip time.
    pub fn rtt(&self) -> Option<Duration> {
        self.rtt
    }

    pub fn team(&self) -> Option<&JoinedPacket> {
        self.team.as_ref()
    }

    pub fn map(&self) -> Option<&MapPacket> {
        self.map.as_ref()
    }

    pub fn disconnect_reason(&self) -> Option<&DisconnectReason> {
        self.disconnect_reason.as_ref()
    }

    /// Measured server tick spacing.
    pub fn tick_interval(&self) -> Duration {
        self.tick_clock.interval()
    }

    /// Console toggles as of now.
    pub fn settings(&self) -> FrameSettings {
        FrameSettings::from_console(&self.console)
    }

    pub fn exec_console(&mut self, line: &str) -> anyhow::Result<Vec<String>> {
        self.console.exec(line)
    }

    /// Starts a connection attempt. Returns false if a game is already
    /// running or a connection is already opening.
    pub fn begin_connect(&mut self) -> bool {
        if self.is_started() || self.state == SessionState::Connecting {
            debug!(state = ?self.state, "Connect ignored");
            return false;
        }
        self.state = SessionState::Connecting;
        self.errored = false;
        self.disconnect_reason = None;
        true
    }

    /// Transport is open: send the join request and a first RTT probe.
    pub fn on_open(&mut self, now: Instant) {
        info!(name = %self.cfg.player_name, "Connection open, joining");
        self.outbound.push(Packet::Join(JoinPacket {
            protocol: PROTOCOL_VERSION,
            name: self.cfg.player_name.clone(),
            skin: self.cfg.skin.clone(),
            badge: self.cfg.badge.clone(),
            emotes: self.cfg.emotes.clone(),
        }));
        self.send_ping(now);
    }

    pub fn send_ping(&mut self, now: Instant) {
        self.ping_sent_at = Some(now);
        self.outbound.push(Packet::Ping);
    }

    /// Queues a gameplay packet produced elsewhere (e.g. input).
    pub fn send_packet(&mut self, packet: Packet) {
        self.outbound.push(packet);
    }

    /// Packets queued since the last call, oldest first.
    pub fn take_outbound(&mut self) -> Vec<Packet> {
        std::mem::take(&mut self.outbound)
    }

    /// Drains every packet in one inbound frame.
    pub fn on_frame(&mut self, frame: &[u8], now: Instant) {
        let mut reader = PacketReader::new(frame);
        for _ in 0..MAX_PACKETS_PER_FRAME {
            match reader.next_packet() {
                Ok(Some(packet)) => self.handle_packet(packet, now),
                Ok(None) => return,
                Err(e) => warn!(error = %e, "Skipping malformed packet"),
            }
        }
        if reader.remaining() > 0 {
            warn!(
                limit = MAX_PACKETS_PER_FRAME,
                remaining = reader.remaining(),
                "Packet stream did not terminate, abandoning frame"
            );
        }
    }

    pub fn handle_packet(&mut self, packet: Packet, now: Instant) {
        match packet {
            Packet::Joined(joined) => {
                info!(team = joined.team_id, team_mode = joined.team_mode, "Joined game");
                self.state = SessionState::Started;
                self.tick_clock.reset();
                self.ui(UiEvent::GameStarted {
                    team_id: joined.team_id,
                    team_mode: joined.team_mode,
                });
                self.team = Some(joined);
            }
            Packet::Map(map) => {
                debug!(seed = map.seed, width = map.width, height = map.height, "Map received");
                self.ui(UiEvent::MapLoaded {
                    seed: map.seed,
                    width: map.width,
                    height: map.height,
                });
                self.map = Some(map);
            }
            Packet::Update(delta) => {
                if !self.is_started() {
                    debug!(state = ?self.state, "Ignoring update outside a running game");
                    return;
                }
                self.tick_clock.on_update(now);
                let settings = self.settings();
                self.world.apply_delta(&delta, settings, now);
            }
            Packet::GameOver(GameOverPacket { won, rank, kills }) => {
                info!(won, rank, kills, "Game over");
                self.state = SessionState::Over;
                self.ui(UiEvent::GameOver { won, rank, kills });
            }
            Packet::KillFeed(kill) => {
                let line = self.kill_feed_line(&kill);
                self.ui(UiEvent::KillFeed(line));
            }
            Packet::Report(report) => {
                let player = self.world.names().display(report.player);
                self.ui(UiEvent::Report {
                    player,
                    report_id: report.report_id,
                });
            }
            Packet::Pickup(pickup) => {
                self.ui(UiEvent::Pickup {
                    item: pickup.item,
                    message: pickup.message,
                });
            }
            Packet::Disconnect(disconnect) => {
                info!(reason = %disconnect.reason, "Server announced disconnect");
                self.disconnect_reason = Some(disconnect.reason);
            }
            Packet::Ping => match self.ping_sent_at.take() {
                Some(sent) => {
                    let rtt = now.saturating_duration_since(sent);
                    debug!(rtt_ms = rtt.as_millis() as u64, "Ping echo");
                    self.rtt = Some(rtt);
                    self.ui(UiEvent::Ping(rtt));
                }
                None => debug!("Unsolicited ping echo"),
            },
            other @ (Packet::Join(_) | Packet::Input(_) | Packet::Spectate) => {
                debug!(?other, "Unexpected client-bound packet");
            }
        }
    }

    fn kill_feed_line(&self, kill: &KillFeedPacket) -> String {
        let names = self.world.names();
        let victim = names.display(kill.victim);
        match (kill.attacker, &kill.weapon) {
            (Some(attacker), Some(weapon)) if attacker != kill.victim => {
                format!("{} killed {} with {}", names.display(attacker), victim, weapon)
            }
            (Some(attacker), None) if attacker != kill.victim => {
                format!("{} killed {}", names.display(attacker), victim)
            }
            (Some(_), _) => format!("{victim} killed themselves"),
            (None, _) => format!("{victim} died"),
        }
    }

    /// The transport failed to open or errored mid-stream.
    pub fn on_transport_error(&mut self, error: &anyhow::Error) {
        warn!(error = %error, state = ?self.state, "Transport error");
        self.errored = true;
        if matches!(
            self.state,
            SessionState::Connecting | SessionState::Started | SessionState::Spectating
        ) {
            self.state = SessionState::Idle;
        }
        self.ui(UiEvent::Splash(format!("Connection error: {error:#}")));
        self.ui(UiEvent::EnablePlay);
    }

    /// The transport closed.
    pub fn on_close(&mut self) {
        if self.disconnect_reason == Some(DisconnectReason::VersionMismatch) {
            let query = format!("?v={}", Utc::now().timestamp_millis());
            warn!(query = %query, "Client version mismatch, forcing reload");
            self.ui(UiEvent::ForceReload { query });
            self.end_game();
            return;
        }
        match self.state {
            SessionState::Over => {
                info!("Connection closed after game over");
            }
            SessionState::Closed => {
                debug!("Close after teardown");
            }
            _ => {
                if !self.errored {
                    warn!(state = ?self.state, reason = ?self.disconnect_reason, "Connection lost");
                    self.ui(UiEvent::ConnectionLost);
                }
                self.end_game();
            }
        }
    }

    /// Switches from the end screen to spectating.
    pub fn spectate(&mut self) -> bool {
        if self.state != SessionState::Over {
            return false;
        }
        self.outbound.push(Packet::Spectate);
        self.state = SessionState::Spectating;
        self.ui(UiEvent::Spectating);
        true
    }

    /// The end screen was dismissed; tear the game down.
    pub fn finish_end_screen(&mut self) {
        if self.state == SessionState::Over {
            self.end_game();
        }
    }

    /// Teardown: destroys the world and resets per-game state. Idempotent.
    pub fn end_game(&mut self) {
        if self.state != SessionState::Closed {
            info!(state = ?self.state, "Ending game");
        }
        self.world.clear();
        self.state = SessionState::Closed;
        self.outbound.clear();
        self.team = None;
        self.map = None;
        self.ping_sent_at = None;
        self.tick_clock.reset();
    }

    /// One render pass at `now`.
    pub fn render_frame(&mut self, now: Instant) {
        let frame = FrameContext {
            now,
            tick_interval: self.tick_clock.interval(),
            settings: self.settings(),
        };
        self.world.render_frame(&frame);
    }

    /// UI notifications queued since the last call.
    pub fn drain_ui(&mut self) -> Vec<UiEvent> {
        self.world.notifications_mut().drain::<UiEvent>()
    }

    /// Visual effects queued since the last call.
    pub fn drain_effects(&mut self) -> Vec<EffectEvent> {
        self.world.notifications_mut().drain::<EffectEvent>()
    }

    /// Sounds queued since the last call.
    pub fn drain_sounds(&mut self) -> Vec<SoundCue> {
        self.world.notifications_mut().drain::<SoundCue>()
    }

    fn ui(&mut self, event: UiEvent) {
        self.world.notifications_mut().emit(event);
    }
}
