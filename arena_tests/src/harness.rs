//! Scripted server harness.
//!
//! Binds real sockets, performs the arena handshake, and then replays
//! whatever snapshots and lifecycle events a test scripts. Determinism
//! notes: keep message order fixed and avoid wall-clock-dependent branching.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use anyhow::Context;
use arena_shared::{
    config::ClientConfig,
    mockup::Mockup,
    net::{
        ClientId, EntityId, NetMsg, ReliableConn, ReliableListener, Snapshot, PROTOCOL_VERSION,
    },
};
use tokio::net::UdpSocket;
use tracing::info;

/// Encodes templates into the hex wire format the decoder consumes.
pub fn encode_mockups(mockups: &[Mockup]) -> String {
    let mut buf = Vec::new();
    for mockup in mockups {
        buf.extend_from_slice(&mockup.id.0.to_le_bytes());
        buf.extend_from_slice(&mockup.size.to_le_bytes());
        buf.push(mockup.shape);

        buf.extend_from_slice(&(mockup.guns.len() as i32).to_le_bytes());
        for gun in &mockup.guns {
            buf.extend_from_slice(&gun.length.to_le_bytes());
            buf.extend_from_slice(&gun.width.to_le_bytes());
            buf.extend_from_slice(&gun.x.to_le_bytes());
            buf.extend_from_slice(&gun.y.to_le_bytes());
            buf.extend_from_slice(&gun.angle.to_le_bytes());
            buf.extend_from_slice(&gun.aspect.to_le_bytes());
        }

        buf.extend_from_slice(&(mockup.turrets.len() as i32).to_le_bytes());
        for turret in &mockup.turrets {
            buf.extend_from_slice(&turret.size.to_le_bytes());
            buf.extend_from_slice(&turret.x.to_le_bytes());
            buf.extend_from_slice(&turret.y.to_le_bytes());
            buf.push(turret.shape);
        }
    }
    buf.iter().map(|b| format!("{:02x}", b)).collect()
}

/// A bound, not-yet-accepted scripted server.
pub struct ScriptedServer {
    tcp: ReliableListener,
    udp: UdpSocket,
}

/// Binds TCP and UDP on an ephemeral localhost port and returns the matching
/// client config.
pub async fn bind_ephemeral() -> anyhow::Result<(ScriptedServer, ClientConfig)> {
    // Bind TCP first to get an ephemeral port, then bind UDP to that same port.
    let bind = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0);
    let tcp = ReliableListener::bind(bind).await?;
    let addr = tcp.local_addr()?;

    let udp_bind = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), addr.port());
    let udp = UdpSocket::bind(udp_bind).await.context("udp bind")?;

    let cfg = ClientConfig {
        server_addr: addr.to_string(),
        ..Default::default()
    };

    Ok((ScriptedServer { tcp, udp }, cfg))
}

impl ScriptedServer {
    /// Accepts one client, runs the handshake, and delivers the mockup blob.
    pub async fn accept_one(
        self,
        player_entity: EntityId,
        mockup_hex: &str,
    ) -> anyhow::Result<ScriptedSession> {
        let (mut conn, peer) = self.tcp.accept().await?;

        let msg = conn.recv().await?;
        let protocol = match msg {
            NetMsg::Hello { protocol } => protocol,
            other => anyhow::bail!("expected Hello, got {other:?}"),
        };
        anyhow::ensure!(protocol == PROTOCOL_VERSION, "protocol mismatch");

        let udp_hello = conn.recv().await?;
        let client_udp_port = match udp_hello {
            NetMsg::UdpHello { client_udp_port } => client_udp_port,
            other => anyhow::bail!("expected UdpHello, got {other:?}"),
        };

        let client_id = ClientId::new_unique();
        conn.send(&NetMsg::Welcome {
            client_id,
            player_entity,
        })
        .await?;
        conn.send(&NetMsg::MockupData {
            hex: mockup_hex.to_string(),
        })
        .await?;

        let udp_peer = SocketAddr::new(peer.ip(), client_udp_port);
        info!(client_id = ?client_id, %udp_peer, "Scripted client connected");

        Ok(ScriptedSession {
            reliable: conn,
            udp: self.udp,
            udp_peer,
        })
    }
}

/// One accepted client the test can script messages to.
pub struct ScriptedSession {
    reliable: ReliableConn,
    udp: UdpSocket,
    udp_peer: SocketAddr,
}

impl ScriptedSession {
    /// Sends a snapshot over the unreliable channel.
    pub async fn send_snapshot(&self, snap: Snapshot) -> anyhow::Result<()> {
        let payload =
            serde_json::to_vec(&NetMsg::Snapshot(snap)).context("serialize snapshot")?;
        self.udp
            .send_to(&payload, self.udp_peer)
            .await
            .context("udp send_to")?;
        Ok(())
    }

    /// Sends a lifecycle or control message over the reliable channel.
    pub async fn send_reliable(&mut self, msg: &NetMsg) -> anyhow::Result<()> {
        self.reliable.send(msg).await
    }

    /// Receives one client datagram (e.g. a `PlayerCommand`) within the
    /// timeout. Returns `None` on timeout.
    pub async fn recv_datagram(&self, timeout: Duration) -> anyhow::Result<Option<NetMsg>> {
        let mut buf = vec![0u8; 64 * 1024];
        match tokio::time::timeout(timeout, self.udp.recv_from(&mut buf)).await {
            Ok(Ok((n, _addr))) => {
                let msg = serde_json::from_slice(&buf[..n]).context("deserialize datagram")?;
                Ok(Some(msg))
            }
            Ok(Err(e)) => Err(e).context("udp recv_from")?,
            Err(_) => Ok(None),
        }
    }
}
