//! Peer Sync Layer: the point-to-point link between the two players of a match
//!
//! One side hosts (binds, then accepts exactly one peer) and the other
//! connects. Once connected, a background task owns the read half of the
//! socket, decodes newline-framed [`PeerMessage`]s and forwards them as
//! [`PeerEvent`]s over a channel. The tick loop is the only consumer: it
//! drains the channel once per tick, so the opponent mirror fleet and the
//! match tally are only ever mutated from the tick loop.

use log::{debug, error, info, warn};
use serde::Serialize;
use shared::protocol::MAX_FRAME_LEN;
use shared::{AlienSpawn, PeerMessage, ProtocolError};
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::timeout;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PeerRole {
    Host,
    Client,
}

/// Events sent from the receive task to the tick loop
#[derive(Debug, Clone, PartialEq)]
pub enum PeerEvent {
    AlienSpawned(AlienSpawn),
    OpponentGameOver,
    ConnectionLost,
}

/// How a match ended from the local player's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchOutcome {
    Won,
    Lost,
    /// The peer vanished without a `GAME_OVER`. Kept apart from `Lost` so
    /// callers can score it differently.
    Disconnected,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MatchTally {
    pub wins: u32,
    /// Includes disconnects.
    pub losses: u32,
    pub disconnects: u32,
}

impl MatchTally {
    pub fn record(&mut self, outcome: MatchOutcome) {
        match outcome {
            MatchOutcome::Won => self.wins += 1,
            MatchOutcome::Lost => self.losses += 1,
            MatchOutcome::Disconnected => {
                self.losses += 1;
                self.disconnects += 1;
            }
        }
    }
}

/// Everything the tick loop needs from one drain of the event channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeerUpdate {
    pub spawns: Vec<AlienSpawn>,
    /// Set on the drain that ended the match.
    pub ended: Option<MatchOutcome>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchReport {
    pub role: PeerRole,
    pub outcome: Option<MatchOutcome>,
    pub tally: MatchTally,
}

#[derive(Debug)]
pub enum PeerError {
    Io(std::io::Error),
    Protocol(ProtocolError),
    SendTimeout(Duration),
    Closed,
}

impl fmt::Display for PeerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeerError::Io(e) => write!(f, "peer I/O error: {}", e),
            PeerError::Protocol(e) => write!(f, "peer protocol error: {}", e),
            PeerError::SendTimeout(limit) => write!(f, "peer send timed out after {:?}", limit),
            PeerError::Closed => write!(f, "peer link already closed"),
        }
    }
}

impl std::error::Error for PeerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PeerError::Io(e) => Some(e),
            PeerError::Protocol(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PeerError {
    fn from(e: std::io::Error) -> Self {
        PeerError::Io(e)
    }
}

impl From<ProtocolError> for PeerError {
    fn from(e: ProtocolError) -> Self {
        PeerError::Protocol(e)
    }
}

/// A bound host socket waiting for its single opponent.
pub struct PeerListener {
    listener: TcpListener,
}

impl PeerListener {
    pub async fn bind(addr: &str) -> Result<Self, PeerError> {
        let listener = TcpListener::bind(addr).await?;
        info!("Hosting match on {}", listener.local_addr()?);
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, PeerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts exactly one peer; the listening socket is closed afterwards.
    pub async fn accept(self, send_timeout: Duration) -> Result<PeerSession, PeerError> {
        let (stream, addr) = self.listener.accept().await?;
        info!("Opponent connected from {}", addr);
        PeerSession::from_stream(stream, PeerRole::Host, send_timeout)
    }
}

/// The active multiplayer session: connection, receive task and tally.
pub struct PeerSession {
    role: PeerRole,
    peer_addr: SocketAddr,
    writer: OwnedWriteHalf,
    events: mpsc::UnboundedReceiver<PeerEvent>,
    shutdown: Option<oneshot::Sender<()>>,
    receiver: Option<JoinHandle<()>>,
    send_timeout: Duration,
    running: bool,
    outcome: Option<MatchOutcome>,
    tally: MatchTally,
}

impl PeerSession {
    pub async fn connect(addr: &str, send_timeout: Duration) -> Result<Self, PeerError> {
        let stream = TcpStream::connect(addr).await?;
        info!("Connected to host at {}", addr);
        Self::from_stream(stream, PeerRole::Client, send_timeout)
    }

    fn from_stream(
        stream: TcpStream,
        role: PeerRole,
        send_timeout: Duration,
    ) -> Result<Self, PeerError> {
        stream.set_nodelay(true)?;
        let peer_addr = stream.peer_addr()?;
        let (reader, writer) = stream.into_split();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let receiver = tokio::spawn(receive_loop(reader, event_tx, shutdown_rx));

        Ok(Self {
            role,
            peer_addr,
            writer,
            events: event_rx,
            shutdown: Some(shutdown_tx),
            receiver: Some(receiver),
            send_timeout,
            running: true,
            outcome: None,
            tally: MatchTally::default(),
        })
    }

    pub fn role(&self) -> PeerRole {
        self.role
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn outcome(&self) -> Option<MatchOutcome> {
        self.outcome
    }

    pub fn tally(&self) -> &MatchTally {
        &self.tally
    }

    /// Writes one frame, bounded by the send timeout.
    pub async fn send(&mut self, message: &PeerMessage) -> Result<(), PeerError> {
        if !self.running {
            return Err(PeerError::Closed);
        }

        let mut frame = message.encode()?;
        frame.push('\n');

        match timeout(self.send_timeout, self.writer.write_all(frame.as_bytes())).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(PeerError::Io(e)),
            Err(_) => Err(PeerError::SendTimeout(self.send_timeout)),
        }
    }

    /// Collects everything received since the last drain. Spawns arriving
    /// after the match ended are discarded.
    pub fn drain(&mut self) -> PeerUpdate {
        let mut update = PeerUpdate::default();

        while let Ok(event) = self.events.try_recv() {
            if !self.running {
                continue;
            }
            match event {
                PeerEvent::AlienSpawned(spawn) => update.spawns.push(spawn),
                PeerEvent::OpponentGameOver => {
                    info!("Opponent reported game over");
                    self.end_match(MatchOutcome::Won);
                    update.ended = Some(MatchOutcome::Won);
                }
                PeerEvent::ConnectionLost => {
                    warn!("Lost connection to opponent at {}", self.peer_addr);
                    self.end_match(MatchOutcome::Disconnected);
                    update.ended = Some(MatchOutcome::Disconnected);
                }
            }
        }
        update
    }

    /// Records the outcome once; later calls are ignored.
    pub fn end_match(&mut self, outcome: MatchOutcome) {
        if self.outcome.is_some() {
            return;
        }
        self.outcome = Some(outcome);
        self.tally.record(outcome);
        self.running = false;
        info!("Match ended: {:?} ({:?})", outcome, self.tally);
    }

    /// Closes the socket and waits for the receive task to finish.
    pub async fn close(mut self) -> MatchReport {
        self.running = false;

        if let Err(e) = self.writer.shutdown().await {
            debug!("Peer socket shutdown: {}", e);
        }
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(receiver) = self.receiver.take() {
            if let Err(e) = receiver.await {
                error!("Peer receive task failed: {}", e);
            }
        }

        debug!("Peer link to {} closed", self.peer_addr);
        MatchReport {
            role: self.role,
            outcome: self.outcome,
            tally: self.tally,
        }
    }
}

/// Turns one raw frame into an event. Frames that are not UTF-8, do not
/// parse or carry nothing for the tick loop yield `None`.
fn frame_event(frame: &[u8]) -> Option<PeerEvent> {
    let text = match std::str::from_utf8(frame) {
        Ok(text) => text,
        Err(e) => {
            debug!("Ignoring non UTF-8 peer frame: {}", e);
            return None;
        }
    };

    match PeerMessage::decode(text) {
        Ok(PeerMessage::Alien(spawn)) => Some(PeerEvent::AlienSpawned(spawn)),
        Ok(PeerMessage::GameOver) => Some(PeerEvent::OpponentGameOver),
        Ok(PeerMessage::Ping) => None,
        Err(e) => {
            debug!("Ignoring peer frame: {}", e);
            None
        }
    }
}

/// Reads frames until the peer goes away or shutdown is signalled.
///
/// A line longer than [`MAX_FRAME_LEN`] is dropped up to its newline and
/// reading resumes with the next frame.
async fn receive_loop(
    reader: OwnedReadHalf,
    events: mpsc::UnboundedSender<PeerEvent>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut reader = BufReader::new(reader);
    let mut frame = Vec::with_capacity(128);
    let mut oversized = false;

    loop {
        frame.clear();
        let mut limited = (&mut reader).take(MAX_FRAME_LEN as u64 + 1);

        let read = tokio::select! {
            _ = &mut shutdown => {
                debug!("Receive task stopping on shutdown");
                break;
            }
            read = limited.read_until(b'\n', &mut frame) => read,
        };

        match read {
            Ok(0) => {
                debug!("Peer closed the connection");
                let _ = events.send(PeerEvent::ConnectionLost);
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Error receiving from peer: {}", e);
                let _ = events.send(PeerEvent::ConnectionLost);
                break;
            }
        }

        let complete = frame.last() == Some(&b'\n');
        if oversized {
            // Still inside the line that overran; it ends at its newline.
            oversized = !complete;
            continue;
        }
        if !complete && frame.len() > MAX_FRAME_LEN {
            debug!("Dropping peer frame longer than {} bytes", MAX_FRAME_LEN);
            oversized = true;
            continue;
        }

        if let Some(event) = frame_event(&frame) {
            if events.send(event).is_err() {
                break;
            }
        }
    }
}
