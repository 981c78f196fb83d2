//! Networking primitives.
//!
//! - One transport message carries one binary frame.
//! - A frame holds a sequence of self-delimiting packets: a big-endian `u16`
//!   length followed by the JSON body. A zero length marks the end of the
//!   stream; running out of bytes does too.
//! - Frames travel over TCP with a big-endian `u32` length prefix.

use anyhow::{bail, ensure, Context};
use async_trait::async_trait;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpStream,
    },
    sync::mpsc,
    task::JoinHandle,
};
use tracing::debug;

use crate::{
    math::Vec2,
    protocol::{ObjectId, WorldDelta},
};

/// Protocol version sent with the join request.
pub const PROTOCOL_VERSION: u32 = 3;

/// Upper bound on packets drained from a single frame before the frame is
/// treated as a runaway stream and abandoned.
pub const MAX_PACKETS_PER_FRAME: usize = 128;

/// Largest frame accepted from the wire.
pub const MAX_FRAME_LEN: usize = 1 << 20;

/// Size of the reusable outbound scratch buffer.
pub const SCRATCH_CAPACITY: usize = 4096;

/// Packet envelope, both directions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Packet {
    // ─── Client -> server ───
    Join(JoinPacket),
    /// Gameplay action produced by the input layer; routed, not interpreted.
    Input(InputPacket),
    /// Switch to spectating after game over.
    Spectate,

    // ─── Server -> client ───
    Joined(JoinedPacket),
    Map(MapPacket),
    Update(Box<WorldDelta>),
    GameOver(GameOverPacket),
    KillFeed(KillFeedPacket),
    Report(ReportPacket),
    Pickup(PickupPacket),
    Disconnect(DisconnectPacket),

    // ─── Both ───
    /// RTT probe; the server echoes it back.
    Ping,
}

/// Join request carrying player customization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JoinPacket {
    pub protocol: u32,
    pub name: String,
    pub skin: String,
    pub badge: Option<String>,
    pub emotes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InputPacket {
    pub sequence: u32,
    pub actions: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JoinedPacket {
    pub team_id: u8,
    pub team_mode: bool,
    pub max_team_size: u8,
    #[serde(default)]
    pub emotes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MapPacket {
    pub seed: u32,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub places: Vec<(String, Vec2)>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameOverPacket {
    pub won: bool,
    pub rank: u32,
    pub kills: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KillFeedPacket {
    pub victim: ObjectId,
    pub attacker: Option<ObjectId>,
    pub weapon: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportPacket {
    pub player: ObjectId,
    pub report_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PickupPacket {
    pub item: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum DisconnectReason {
    VersionMismatch,
    Kicked,
    Banned(String),
    ServerShutdown,
    Other(String),
}

impl std::fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisconnectReason::VersionMismatch => write!(f, "client version is out of date"),
            DisconnectReason::Kicked => write!(f, "kicked by the server"),
            DisconnectReason::Banned(why) => write!(f, "banned: {why}"),
            DisconnectReason::ServerShutdown => write!(f, "server shutting down"),
            DisconnectReason::Other(why) => write!(f, "{why}"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DisconnectPacket {
    pub reason: DisconnectReason,
}

/// Serializes packets into one reusable scratch buffer.
#[derive(Debug)]
pub struct PacketWriter {
    scratch: BytesMut,
}

impl Default for PacketWriter {
    fn default() -> Self {
        Self::with_capacity(SCRATCH_CAPACITY)
    }
}

impl PacketWriter {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            scratch: BytesMut::with_capacity(capacity),
        }
    }

    /// Drops the buffered bytes but keeps the allocation.
    pub fn clear(&mut self) {
        self.scratch.clear();
    }

    /// Appends one packet to the current frame.
    pub fn write(&mut self, packet: &Packet) -> anyhow::Result<()> {
        let start = self.scratch.len();
        self.scratch.put_u16(0);
        if let Err(e) = serde_json::to_writer((&mut self.scratch).writer(), packet) {
            self.scratch.truncate(start);
            return Err(e).context("serialize packet");
        }
        let len = self.scratch.len() - start - 2;
        if len > u16::MAX as usize {
            self.scratch.truncate(start);
            bail!("packet body too large: {len} bytes");
        }
        self.scratch[start..start + 2].copy_from_slice(&(len as u16).to_be_bytes());
        Ok(())
    }

    /// The frame assembled so far.
    pub fn frame(&self) -> &[u8] {
        &self.scratch
    }

    pub fn is_empty(&self) -> bool {
        self.scratch.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.scratch.capacity()
    }
}

/// Reads packets back out of one frame.
pub struct PacketReader<'a> {
    buf: &'a [u8],
}

impl<'a> PacketReader<'a> {
    pub fn new(frame: &'a [u8]) -> Self {
        Self { buf: frame }
    }

    /// Bytes not consumed yet.
    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    /// Returns the next packet, `Ok(None)` at end of stream.
    ///
    /// A garbage body is skipped and reported as an error; the reader stays
    /// positioned on the next entry. A truncated entry ends the stream.
    pub fn next_packet(&mut self) -> anyhow::Result<Option<Packet>> {
        if self.buf.len() < 2 {
            return Ok(None);
        }
        let len = self.buf.get_u16() as usize;
        if len == 0 {
            self.buf = &[];
            return Ok(None);
        }
        if len > self.buf.len() {
            let available = self.buf.len();
            self.buf = &[];
            bail!("truncated packet: need {len} bytes, have {available}");
        }
        let (body, rest) = self.buf.split_at(len);
        self.buf = rest;
        let packet = serde_json::from_slice(body).context("deserialize packet")?;
        Ok(Some(packet))
    }
}

/// Encodes packets into a standalone frame.
pub fn encode_frame(packets: &[Packet]) -> anyhow::Result<Bytes> {
    let mut writer = PacketWriter::default();
    for packet in packets {
        writer.write(packet)?;
    }
    Ok(Bytes::copy_from_slice(writer.frame()))
}

/// Reads one length-prefixed frame; `Ok(None)` on clean EOF.
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> anyhow::Result<Option<Bytes>> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e).context("read frame len"),
    }
    let len = u32::from_be_bytes(len_buf) as usize;
    ensure!(len <= MAX_FRAME_LEN, "frame too large: {len} bytes");
    let mut payload = vec![0u8; len];
    reader
        .read_exact(&mut payload)
        .await
        .context("read frame payload")?;
    Ok(Some(Bytes::from(payload)))
}

/// Writes one length-prefixed frame.
pub async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, frame: &[u8]) -> anyhow::Result<()> {
    ensure!(frame.len() <= MAX_FRAME_LEN, "frame too large: {} bytes", frame.len());
    let mut buf = BytesMut::with_capacity(4 + frame.len());
    buf.put_u32(frame.len() as u32);
    buf.extend_from_slice(frame);
    writer.write_all(&buf).await.context("write frame")?;
    Ok(())
}

/// Bidirectional frame transport.
#[async_trait]
pub trait Transport: Send {
    async fn send(&mut self, frame: &[u8]) -> anyhow::Result<()>;

    /// Next inbound frame, `Ok(None)` once the peer closed.
    ///
    /// Must be cancel-safe: the driver polls it inside `select!`.
    async fn recv(&mut self) -> anyhow::Result<Option<Bytes>>;

    async fn close(&mut self) -> anyhow::Result<()>;
}

/// TCP transport with a background reader task.
pub struct TcpTransport {
    writer: OwnedWriteHalf,
    frames: mpsc::Receiver<anyhow::Result<Bytes>>,
    reader: JoinHandle<()>,
}

impl TcpTransport {
    pub async fn connect(addr: &str) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr)
            .await
            .with_context(|| format!("tcp connect {addr}"))?;
        stream.set_nodelay(true).context("set nodelay")?;
        Ok(Self::from_stream(stream))
    }

    pub fn from_stream(stream: TcpStream) -> Self {
        let (read_half, writer) = stream.into_split();
        let (tx, frames) = mpsc::channel(64);
        let reader = tokio::spawn(read_loop(read_half, tx));
        Self {
            writer,
            frames,
            reader,
        }
    }
}

async fn read_loop(mut read_half: OwnedReadHalf, tx: mpsc::Sender<anyhow::Result<Bytes>>) {
    loop {
        match read_frame(&mut read_half).await {
            Ok(Some(frame)) => {
                if tx.send(Ok(frame)).await.is_err() {
                    break;
                }
            }
            Ok(None) => {
                debug!("Peer closed connection");
                break;
            }
            Err(e) => {
                let _ = tx.send(Err(e)).await;
                break;
            }
        }
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn send(&mut self, frame: &[u8]) -> anyhow::Result<()> {
        write_frame(&mut self.writer, frame).await
    }

    async fn recv(&mut self) -> anyhow::Result<Option<Bytes>> {
        match self.frames.recv().await {
            Some(Ok(frame)) => Ok(Some(frame)),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        self.reader.abort();
        self.writer.shutdown().await.context("tcp shutdown")?;
        Ok(())
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        self.reader.abort();
    }
}
