// ═══════════════════════════════════════════════════════════════════════
// Kingpin session server — one WebSocket endpoint, many rooms
//
// Each room is a single-writer aggregate: a mutex-guarded Room with a
// broadcast fan-out. Connections push (seat, Action) pairs through the
// mutex; after every committed mutation both seats get a fresh per-seat
// state projection. Cursor frames are relayed, never stored.
// ═══════════════════════════════════════════════════════════════════════

mod messages;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Context;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State as AxumState;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use kingpin_engine::{catalog, visibility, ActionError, Card, CatalogSource, Room, Seat};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use messages::{Inbound, InboundBody, ServerMessage, SessionRequest};

#[derive(Parser, Clone)]
#[command(name = "kingpin-server", about = "Kingpin card-table WebSocket server")]
struct Cli {
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    #[arg(long, default_value_t = 9300)]
    port: u16,
    /// YAML catalog path
    #[arg(long, default_value = "config/cards.yaml")]
    yaml: PathBuf,
    /// CSV catalog path
    #[arg(long, default_value = "config/cards.csv")]
    csv: PathBuf,
    /// Default catalog source for new rooms: "yaml" or "csv"
    #[arg(long, default_value = "yaml")]
    source: String,
    /// Base RNG seed; each room derives its own
    #[arg(long)]
    seed: Option<u64>,
}

/// Room-scoped broadcast frame. `seat: None` goes to everyone in the
/// room, otherwise only to the connection holding that seat; `skip`
/// suppresses echo back to the sender (cursor relay).
#[derive(Debug, Clone)]
struct Envelope {
    seat: Option<Seat>,
    skip: Option<u64>,
    text: String,
}

struct RoomHandle {
    room: Mutex<Room>,
    tx: broadcast::Sender<Envelope>,
}

#[derive(Clone)]
struct AppState {
    cli: Arc<Cli>,
    rooms: Arc<Mutex<HashMap<String, Arc<RoomHandle>>>>,
    conn_counter: Arc<AtomicU64>,
    seed_counter: Arc<AtomicU64>,
}

fn load_catalog(cli: &Cli, source: CatalogSource) -> anyhow::Result<Vec<Card>> {
    let path = match source {
        CatalogSource::Yaml => &cli.yaml,
        CatalogSource::Csv => &cli.csv,
    };
    catalog::load_file(path, source)
        .with_context(|| format!("loading {} catalog from {}", source.as_str(), path.display()))
}

fn resolve_source(cli: &Cli, requested: Option<&str>) -> Option<CatalogSource> {
    match requested {
        Some(tag) => CatalogSource::parse(tag),
        None => CatalogSource::parse(&cli.source),
    }
}

impl AppState {
    fn room(&self, name: &str) -> Option<Arc<RoomHandle>> {
        self.rooms.lock().unwrap().get(name).cloned()
    }

    /// Get or lazily create a room, loading its catalog on first join.
    fn room_or_create(
        &self,
        name: &str,
        source: CatalogSource,
    ) -> anyhow::Result<Arc<RoomHandle>> {
        if let Some(handle) = self.room(name) {
            return Ok(handle);
        }
        let cards = load_catalog(&self.cli, source)?;
        let seed = self
            .cli
            .seed
            .unwrap_or_else(rand_seed)
            .wrapping_add(self.seed_counter.fetch_add(1, Ordering::Relaxed));
        let (tx, _) = broadcast::channel::<Envelope>(256);
        let handle = Arc::new(RoomHandle {
            room: Mutex::new(Room::new(cards, source, seed)),
            tx,
        });
        let mut rooms = self.rooms.lock().unwrap();
        // lost the race: keep the first one
        Ok(rooms.entry(name.to_string()).or_insert(handle).clone())
    }
}

fn rand_seed() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

// ── Connection handling ────────────────────────────────────────────────

async fn ws_handler(ws: WebSocketUpgrade, AxumState(state): AxumState<AppState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// What a single connection knows once seated.
struct Session {
    room_name: String,
    handle: Arc<RoomHandle>,
    seat: Seat,
    fanout: JoinHandle<()>,
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let conn_id = state.conn_counter.fetch_add(1, Ordering::Relaxed);
    let client_id = format!("conn-{conn_id}");
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    let write_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let mut session: Option<Session> = None;

    while let Some(Ok(message)) = receiver.next().await {
        match message {
            Message::Text(text) => match serde_json::from_str::<Inbound>(&text) {
                Ok(inbound) => {
                    handle_inbound(inbound, &state, &tx, conn_id, &client_id, &mut session);
                }
                Err(err) => {
                    warn!(%client_id, ?err, "invalid inbound frame");
                    send_message(&tx, &ServerMessage::Error { msg: "invalid_payload".to_string() });
                }
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    // seat frees up on disconnect; the survivor sees it in the next state
    if let Some(session) = session.take() {
        session.fanout.abort();
        {
            let mut room = session.handle.room.lock().unwrap();
            room.vacate(&client_id);
        }
        broadcast_states(&session.handle);
        info!(%client_id, room = %session.room_name, "client disconnected");
    }
    write_task.abort();
}

fn handle_inbound(
    inbound: Inbound,
    state: &AppState,
    tx: &mpsc::UnboundedSender<Message>,
    conn_id: u64,
    client_id: &str,
    session: &mut Option<Session>,
) {
    match inbound.body {
        InboundBody::Session(SessionRequest::JoinRoom { source }) => {
            let Some(source) = resolve_source(&state.cli, source.as_deref()) else {
                send_message(tx, &ServerMessage::Error { msg: "invalid_payload".to_string() });
                return;
            };
            let handle = match state.room_or_create(&inbound.room, source) {
                Ok(handle) => handle,
                Err(err) => {
                    warn!(room = %inbound.room, ?err, "catalog load failed");
                    send_message(tx, &ServerMessage::Error { msg: "catalog_error".to_string() });
                    return;
                }
            };

            // subscribe before the join is visible so no state frame is lost
            let rx = handle.tx.subscribe();
            let (seat, actual_source, window) = {
                let mut room = handle.room.lock().unwrap();
                match room.join(client_id) {
                    Ok(seat) => (seat, room.source, room.visible_slots[seat.index()]),
                    Err(_) => {
                        send_message(tx, &ServerMessage::RoomFull { room: inbound.room.clone() });
                        return;
                    }
                }
            };

            if let Some(old) = session.take() {
                old.fanout.abort();
                if old.room_name != inbound.room {
                    let mut room = old.handle.room.lock().unwrap();
                    room.vacate(client_id);
                }
            }
            let fanout = spawn_fanout(rx, tx.clone(), conn_id, seat);
            *session = Some(Session {
                room_name: inbound.room.clone(),
                handle: handle.clone(),
                seat,
                fanout,
            });

            send_message(
                tx,
                &ServerMessage::Joined {
                    room: inbound.room.clone(),
                    seat,
                    source: actual_source.as_str(),
                    visible_slots: window,
                },
            );
            info!(%client_id, room = %inbound.room, %seat, "client joined");
            broadcast_states(&handle);
        }
        InboundBody::Session(SessionRequest::ResetRoom { source }) => {
            let Some(session) = session.as_ref() else {
                send_message(tx, &ServerMessage::Error { msg: "not_in_room".to_string() });
                return;
            };
            let Some(source) = resolve_source(&state.cli, source.as_deref()) else {
                send_message(tx, &ServerMessage::Error { msg: "invalid_payload".to_string() });
                return;
            };
            let cards = match load_catalog(&state.cli, source) {
                Ok(cards) => cards,
                Err(err) => {
                    warn!(room = %session.room_name, ?err, "catalog load failed");
                    send_message(tx, &ServerMessage::Error { msg: "catalog_error".to_string() });
                    return;
                }
            };
            {
                let mut room = session.handle.room.lock().unwrap();
                room.reset(cards, source);
                // both seats get a fresh joined frame, original-handshake style
                for seat in room.occupied_seats() {
                    let msg = ServerMessage::Joined {
                        room: session.room_name.clone(),
                        seat,
                        source: source.as_str(),
                        visible_slots: room.visible_slots[seat.index()],
                    };
                    if let Ok(text) = serde_json::to_string(&msg) {
                        let _ = session.handle.tx.send(Envelope {
                            seat: Some(seat),
                            skip: None,
                            text,
                        });
                    }
                }
            }
            info!(room = %session.room_name, source = source.as_str(), "room reset");
            broadcast_states(&session.handle);
        }
        InboundBody::Session(SessionRequest::Cursor { x, y, visible }) => {
            let Some(session) = session.as_ref() else { return };
            let msg = ServerMessage::Cursor {
                seat: session.seat,
                x: x.clamp(0.0, 1.0),
                y: y.clamp(0.0, 1.0),
                visible,
            };
            if let Ok(text) = serde_json::to_string(&msg) {
                let _ = session.handle.tx.send(Envelope {
                    seat: None,
                    skip: Some(conn_id),
                    text,
                });
            }
        }
        InboundBody::Game(action) => {
            let Some(session) = session.as_ref() else {
                send_message(tx, &ServerMessage::Error { msg: "not_in_room".to_string() });
                return;
            };
            let result: Result<(), ActionError> = {
                let mut room = session.handle.room.lock().unwrap();
                room.apply(session.seat, action)
            };
            match result {
                Ok(()) => broadcast_states(&session.handle),
                Err(err) => {
                    send_message(tx, &ServerMessage::Error { msg: err.code().to_string() })
                }
            }
        }
    }
}

/// Push a per-seat state frame to both seats.
fn broadcast_states(handle: &RoomHandle) {
    let room = handle.room.lock().unwrap();
    for seat in Seat::BOTH {
        let view = visibility::project(&room, seat);
        let msg = ServerMessage::State { view: Box::new(view) };
        if let Ok(text) = serde_json::to_string(&msg) {
            let _ = handle.tx.send(Envelope {
                seat: Some(seat),
                skip: None,
                text,
            });
        }
    }
}

fn spawn_fanout(
    mut rx: broadcast::Receiver<Envelope>,
    tx: mpsc::UnboundedSender<Message>,
    conn_id: u64,
    seat: Seat,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Ok(envelope) = rx.recv().await {
            if envelope.skip == Some(conn_id) {
                continue;
            }
            if let Some(target) = envelope.seat {
                if target != seat {
                    continue;
                }
            }
            if tx.send(Message::Text(envelope.text)).is_err() {
                break;
            }
        }
    })
}

fn send_message(tx: &mpsc::UnboundedSender<Message>, msg: &ServerMessage) {
    if let Ok(text) = serde_json::to_string(msg) {
        let _ = tx.send(Message::Text(text));
    }
}

async fn healthz() -> &'static str {
    "ok"
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let state = AppState {
        cli: Arc::new(cli.clone()),
        rooms: Arc::new(Mutex::new(HashMap::new())),
        conn_counter: Arc::new(AtomicU64::new(1)),
        seed_counter: Arc::new(AtomicU64::new(0)),
    };

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/healthz", get(healthz))
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port)
        .parse()
        .context("invalid listen addr")?;
    info!(%addr, "kingpin server listening");

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}
