//! Async driver.
//!
//! `GameClient` owns the one transport connection and multiplexes three
//! clocks on a single task: inbound frames, render passes and RTT probes.
//! Each wakeup runs to completion against the `Session` before the next one,
//! so a half-applied delta is never rendered.

use std::time::{Duration, Instant};

use tokio::time::{interval, interval_at, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};
use worldsync_shared::{
    config::ClientConfig,
    net::{PacketWriter, TcpTransport, Transport},
    render::Scene,
};

use crate::session::{Session, SessionState};

struct Link<T> {
    transport: T,
    frames: Interval,
    pings: Interval,
}

enum Wakeup {
    Frame(anyhow::Result<Option<bytes::Bytes>>),
    Render,
    Ping,
}

/// Connection/session driver.
pub struct GameClient<T: Transport = TcpTransport> {
    pub session: Session,
    link: Option<Link<T>>,
    writer: PacketWriter,
}

impl GameClient<TcpTransport> {
    /// Opens a TCP connection to `addr` and joins.
    ///
    /// Does nothing if a game is already running. Connection failures are
    /// reported through the session (splash + play re-enabled), not returned.
    pub async fn connect(&mut self, addr: &str) -> bool {
        if !self.session.begin_connect() {
            return false;
        }
        info!(server = %addr, "Connecting to server");
        match TcpTransport::connect(addr).await {
            Ok(transport) => self.attach(transport).await,
            Err(e) => {
                self.session.on_transport_error(&e);
                self.session.on_close();
                false
            }
        }
    }
}

impl<T: Transport> GameClient<T> {
    pub fn new(cfg: ClientConfig, scene: Box<dyn Scene>) -> Self {
        Self {
            session: Session::new(cfg, scene),
            link: None,
            writer: PacketWriter::default(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    /// Adopts an already-open transport and sends the join request.
    pub async fn attach(&mut self, transport: T) -> bool {
        if self.session.state() != SessionState::Connecting && !self.session.begin_connect() {
            return false;
        }
        let cfg = self.session.config();
        let frame_period = Duration::from_secs_f64(1.0 / f64::from(cfg.frame_hz.max(1)));
        let ping_period = Duration::from_millis(cfg.ping_interval_ms.max(1));

        let mut frames = interval(frame_period);
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut pings = interval_at(tokio::time::Instant::now() + ping_period, ping_period);
        pings.set_missed_tick_behavior(MissedTickBehavior::Delay);

        self.link = Some(Link {
            transport,
            frames,
            pings,
        });
        self.session.on_open(Instant::now());
        self.flush().await;
        self.link.is_some()
    }

    /// Waits for the next wakeup and handles it. Returns false once the
    /// connection is gone.
    pub async fn pump(&mut self) -> bool {
        let Some(link) = self.link.as_mut() else {
            return false;
        };
        let wakeup = tokio::select! {
            frame = link.transport.recv() => Wakeup::Frame(frame),
            _ = link.frames.tick() => Wakeup::Render,
            _ = link.pings.tick() => Wakeup::Ping,
        };

        let now = Instant::now();
        match wakeup {
            Wakeup::Frame(Ok(Some(frame))) => self.session.on_frame(&frame, now),
            Wakeup::Frame(Ok(None)) => {
                info!("Server closed the connection");
                self.link = None;
                self.session.on_close();
            }
            Wakeup::Frame(Err(e)) => {
                self.session.on_transport_error(&e);
                self.link = None;
                self.session.on_close();
            }
            Wakeup::Render => self.session.render_frame(now),
            Wakeup::Ping => {
                if self.session.is_started() {
                    self.session.send_ping(now);
                }
            }
        }

        if self.session.state() == SessionState::Closed {
            self.close_link().await;
        }
        self.flush().await;
        self.link.is_some()
    }

    /// Pumps until the connection is gone.
    pub async fn run(&mut self) {
        while self.pump().await {}
    }

    /// Leaves the game: closes the socket and tears the world down.
    pub async fn disconnect(&mut self) {
        self.close_link().await;
        self.session.end_game();
    }

    /// Sends every queued outbound packet, one frame each, through the
    /// reusable scratch buffer.
    async fn flush(&mut self) {
        let packets = self.session.take_outbound();
        let Some(link) = self.link.as_mut() else {
            if !packets.is_empty() {
                debug!(count = packets.len(), "Dropping outbound packets, not connected");
            }
            return;
        };

        let mut failure = None;
        for packet in &packets {
            self.writer.clear();
            if let Err(e) = self.writer.write(packet) {
                warn!(error = %e, "Dropping unserializable packet");
                continue;
            }
            if let Err(e) = link.transport.send(self.writer.frame()).await {
                failure = Some(e);
                break;
            }
        }

        if let Some(e) = failure {
            self.session.on_transport_error(&e);
            self.close_link().await;
            self.session.on_close();
        }
    }

    async fn close_link(&mut self) {
        if let Some(mut link) = self.link.take() {
            if let Err(e) = link.transport.close().await {
                debug!(error = %e, "Transport close failed");
            }
        }
    }
}
