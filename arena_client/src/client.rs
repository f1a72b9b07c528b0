//! Client implementation.
//!
//! The client maintains:
//! - A reliable control stream (handshake + mockup blob + lifecycle events)
//! - An unreliable datagram socket (snapshots, input commands)
//! - The world context that reconciliation runs over
//!
//! The network pump here is the sole writer of authoritative entity fields,
//! lifecycle triggers, and the player binding; presentation fields belong to
//! the reconciler.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use anyhow::Context;
use arena_shared::{
    config::ClientConfig,
    net::{ClientId, NetMsg, ReliableConn, UnreliableConn, PROTOCOL_VERSION},
};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::{
    input::{build_command, InputState},
    reconcile::Viewport,
    world::World,
};

/// Client connection state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientState {
    /// Not connected to any server.
    Disconnected,
    /// Connecting to server (handshake in progress).
    Connecting,
    /// Connected, waiting for the mockup blob.
    Connected,
    /// Templates loaded, rendering the arena.
    Ready,
}

/// High-level game client.
pub struct GameClient {
    pub client_id: ClientId,
    pub state: ClientState,
    pub world: World,

    reliable: ReliableConn,
    pub unreliable: UnreliableConn,
    frame: u32,

    /// Server messages to display.
    pub server_messages: Vec<String>,
}

impl GameClient {
    /// Connects to a server and performs handshake.
    pub async fn connect(cfg: &ClientConfig) -> anyhow::Result<Self> {
        let server_addr: SocketAddr = cfg.server_addr.parse().context("parse server_addr")?;

        info!(server = %server_addr, "Connecting to server");

        // Bind UDP first so we can tell the server where to send snapshots.
        let bind = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0);
        let unreliable = UnreliableConn::connect(bind, server_addr).await?;
        let client_udp_port = unreliable.local_addr().context("udp local_addr")?.port();

        let stream = TcpStream::connect(server_addr)
            .await
            .context("tcp connect")?;
        let mut reliable = ReliableConn::new(stream);

        reliable
            .send(&NetMsg::Hello {
                protocol: PROTOCOL_VERSION,
            })
            .await?;

        reliable.send(&NetMsg::UdpHello { client_udp_port }).await?;

        let welcome = reliable.recv().await?;
        let (client_id, player_entity) = match welcome {
            NetMsg::Welcome {
                client_id,
                player_entity,
            } => (client_id, player_entity),
            other => anyhow::bail!("expected Welcome, got {other:?}"),
        };

        info!(client_id = ?client_id, player = player_entity.0, "Connected to server");

        let mut world = World::default();
        world.set_player(player_entity);

        let mut client = Self {
            client_id,
            state: ClientState::Connected,
            world,
            reliable,
            unreliable,
            frame: 0,
            server_messages: Vec::new(),
        };

        // Check for an immediate MockupData.
        client.poll_reliable().await?;

        Ok(client)
    }

    /// Polls the reliable connection for messages.
    ///
    /// A malformed mockup blob is the one fatal case here: template loading
    /// gates game start, so its decode failure propagates to the caller.
    pub async fn poll_reliable(&mut self) -> anyhow::Result<()> {
        // Use a short timeout to avoid blocking.
        match tokio::time::timeout(std::time::Duration::from_millis(10), self.reliable.recv()).await
        {
            Ok(Ok(msg)) => {
                self.handle_reliable_message(msg)?;
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Reliable connection error");
                self.state = ClientState::Disconnected;
            }
            Err(_) => {
                // Timeout, no message available.
            }
        }
        Ok(())
    }

    fn handle_reliable_message(&mut self, msg: NetMsg) -> anyhow::Result<()> {
        match msg {
            NetMsg::MockupData { hex } => {
                let count = self
                    .world
                    .load_mockups(&hex)
                    .context("decode mockup stream")?;
                info!(templates = count, "Mockups loaded");
                self.state = ClientState::Ready;
            }
            NetMsg::EntityDying { id } => {
                debug!(id = id.0, "Entity dying");
                self.world.mark_dying(id);
            }
            NetMsg::EntityDelete { id } => {
                debug!(id = id.0, "Entity deleted");
                self.world.remove(id);
            }
            NetMsg::SetPlayer { entity_id } => {
                info!(player = entity_id.0, "Player rebound");
                self.world.set_player(entity_id);
            }
            NetMsg::ServerPrint { message } => {
                info!(message = %message, "Server message");
                self.server_messages.push(message);
            }
            NetMsg::Disconnect { reason } => {
                info!(reason = %reason, "Disconnected from server");
                self.state = ClientState::Disconnected;
            }
            other => {
                debug!(?other, "Unhandled reliable message");
            }
        }
        Ok(())
    }

    /// Advances one client frame: build the aim command and send it.
    pub async fn frame(&mut self, input: InputState, viewport: Viewport) -> anyhow::Result<()> {
        let cmd = build_command(self.client_id, self.frame, input, viewport);
        self.unreliable.send(&NetMsg::PlayerCommand(cmd)).await?;
        self.frame = self.frame.wrapping_add(1);
        Ok(())
    }

    /// Receives messages over the unreliable channel.
    pub async fn recv_snapshot(&mut self) -> anyhow::Result<()> {
        if let Some(msg) = self
            .unreliable
            .recv_timeout(std::time::Duration::from_millis(20))
            .await?
        {
            match msg {
                NetMsg::Snapshot(s) => {
                    self.world.apply_snapshot(&s);
                }
                other => {
                    debug!(?other, "Unexpected UDP message");
                }
            }
        }
        Ok(())
    }

    /// Returns the underlying reliable connection peer.
    pub fn server_peer(&self) -> anyhow::Result<SocketAddr> {
        self.reliable.peer_addr()
    }
}
