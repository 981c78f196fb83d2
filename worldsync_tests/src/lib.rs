//! Test support: a scripted in-process server and payload builders.
//!
//! The server does not simulate anything. Tests accept the client's
//! connection, read what it sent and replay canned frames back.

use anyhow::Context;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use worldsync_shared::{
    math::Vec2,
    net::{encode_frame, read_frame, write_frame, JoinPacket, JoinedPacket, Packet, PacketReader},
    protocol::{FullObject, LootData, ObjectData, PartialObject, PlayerData},
};

/// Installs a test-friendly tracing subscriber once per process.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_test_writer()
        .try_init();
}

pub struct ScriptedServer {
    listener: TcpListener,
    pub addr: String,
}

impl ScriptedServer {
    /// Binds to an ephemeral localhost port.
    pub async fn bind() -> anyhow::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("bind scripted server")?;
        let addr = listener.local_addr().context("local_addr")?.to_string();
        Ok(Self { listener, addr })
    }

    pub async fn accept(&self) -> anyhow::Result<ServerConn> {
        let (stream, peer) = self.listener.accept().await.context("accept")?;
        tracing::debug!(peer = %peer, "Scripted server accepted client");
        Ok(ServerConn { stream })
    }
}

/// Server end of one client connection.
pub struct ServerConn {
    stream: TcpStream,
}

impl ServerConn {
    /// Sends the packets as one frame.
    pub async fn send(&mut self, packets: &[Packet]) -> anyhow::Result<()> {
        let frame = encode_frame(packets)?;
        write_frame(&mut self.stream, &frame).await
    }

    /// Reads one frame from the client and decodes every packet in it.
    pub async fn recv(&mut self) -> anyhow::Result<Vec<Packet>> {
        let frame = read_frame(&mut self.stream)
            .await?
            .context("client closed the connection")?;
        let mut reader = PacketReader::new(&frame);
        let mut packets = Vec::new();
        while let Some(packet) = reader.next_packet()? {
            packets.push(packet);
        }
        Ok(packets)
    }

    /// Reads until the join request arrives.
    pub async fn expect_join(&mut self) -> anyhow::Result<JoinPacket> {
        loop {
            for packet in self.recv().await? {
                if let Packet::Join(join) = packet {
                    return Ok(join);
                }
            }
        }
    }

    /// Half-closes toward the client and discards whatever it still sends.
    ///
    /// Dropping a socket with unread input makes the kernel answer with a
    /// reset, which the client would report as an error instead of a close.
    pub async fn close(mut self) -> anyhow::Result<()> {
        self.stream.shutdown().await.context("shutdown")?;
        tokio::spawn(async move {
            let mut sink = [0u8; 1024];
            while let Ok(n) = self.stream.read(&mut sink).await {
                if n == 0 {
                    break;
                }
            }
        });
        Ok(())
    }
}

pub fn joined(team_id: u8) -> Packet {
    Packet::Joined(JoinedPacket {
        team_id,
        team_mode: false,
        max_team_size: 1,
        emotes: Vec::new(),
    })
}

pub fn player_full(id: u16, position: Vec2, hp: f32) -> FullObject {
    FullObject::new(
        id,
        ObjectData::Player(PlayerData {
            position: Some(position),
            rotation: Some(0.0),
            hp: Some(hp),
            dead: Some(false),
            ..Default::default()
        }),
    )
}

pub fn player_partial(id: u16, f: impl FnOnce(&mut PlayerData)) -> PartialObject {
    let mut data = PlayerData::default();
    f(&mut data);
    PartialObject::new(id, ObjectData::Player(data))
}

pub fn loot_full(id: u16, definition: &str, position: Vec2) -> FullObject {
    FullObject::new(
        id,
        ObjectData::Loot(LootData {
            definition: Some(definition.to_string()),
            position: Some(position),
            count: Some(1),
            ..Default::default()
        }),
    )
}
