//! Kairo event room server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin kairo-server
//! cargo run --bin kairo-server -- --host 0.0.0.0 --port 3000 --presence-scope room
//! ```

use std::sync::Arc;

use clap::Parser;
use kairo_server::{
    config::{PresenceScope, SessionConfig},
    domain::{Connection, Event, EventDispatcher, EventName, RoomId, RoomRegistry, SessionCounter},
    infrastructure::{dispatcher::FanoutDispatcher, registry::InMemoryRoomRegistry},
    ui::Server,
    usecase::{
        CloseSessionUseCase, DispatchEventUseCase, GetRoomDetailUseCase, GetRoomsUseCase,
        GetStatsUseCase, OpenSessionUseCase,
    },
};
use kairo_shared::logger::setup_logger;

/// クライアント側のカスタムイベント名
const CLIENT_SIDE_EVENT: &str = "myCustomEventClientSide";

#[derive(Parser, Debug)]
#[command(name = "kairo-server")]
#[command(about = "Real-time event room server over WebSocket", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "3000")]
    port: u16,

    /// Room every new connection joins
    #[arg(long, default_value = "room-1")]
    default_room: String,

    /// Who receives the "<n> Users connected" presence updates
    #[arg(long, value_enum, default_value_t = PresenceScope::Global)]
    presence_scope: PresenceScope,

    /// Disable the timed demo events sent after connecting
    #[arg(long)]
    no_demo_events: bool,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    let default_room = match RoomId::new(args.default_room) {
        Ok(room_id) => room_id,
        Err(e) => {
            tracing::error!("Invalid --default-room: {}", e);
            std::process::exit(1);
        }
    };
    let mut config =
        SessionConfig::new(default_room.clone()).with_presence_scope(args.presence_scope);
    if !args.no_demo_events {
        config = config.with_demo_events();
    }
    let config = Arc::new(config);

    // Initialize dependencies in order:
    // 1. Registry
    // 2. Dispatcher (+ handlers)
    // 3. UseCases
    // 4. Server

    // 1. Create Registry (in-memory)
    let registry = Arc::new(InMemoryRoomRegistry::new());
    registry.declare(default_room.clone()).await;
    tracing::info!("Room {} created!", default_room);

    // 2. Create Dispatcher and register server-side handlers
    let dispatcher = Arc::new(FanoutDispatcher::new(registry.clone()));
    let log_client_event = |from: &Arc<Connection>, event: &Event| {
        tracing::info!("{} from '{}': {}", CLIENT_SIDE_EVENT, from.id(), event.payload);
    };
    match EventName::new(CLIENT_SIDE_EVENT.to_string()) {
        Ok(name) => {
            dispatcher
                .register_handler(name, Arc::new(log_client_event))
                .await
        }
        Err(e) => tracing::warn!("Handler not registered: {}", e),
    }

    // 3. Create UseCases
    let counter = Arc::new(SessionCounter::new());
    let open_session_usecase = Arc::new(OpenSessionUseCase::new(
        registry.clone(),
        dispatcher.clone(),
        counter.clone(),
        config.clone(),
    ));
    let close_session_usecase = Arc::new(CloseSessionUseCase::new(
        registry.clone(),
        dispatcher.clone(),
        counter.clone(),
        config.clone(),
    ));
    let dispatch_event_usecase = Arc::new(DispatchEventUseCase::new(
        registry.clone(),
        dispatcher.clone(),
        config.clone(),
    ));
    let get_rooms_usecase = Arc::new(GetRoomsUseCase::new(registry.clone()));
    let get_room_detail_usecase = Arc::new(GetRoomDetailUseCase::new(registry.clone()));
    let get_stats_usecase = Arc::new(GetStatsUseCase::new(registry.clone(), counter.clone()));

    // 4. Create and run the server
    let server = Server::new(
        open_session_usecase,
        close_session_usecase,
        dispatch_event_usecase,
        get_rooms_usecase,
        get_room_detail_usecase,
        get_stats_usecase,
    );
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
