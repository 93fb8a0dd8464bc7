//! AI chat relay server.
//!
//! Relays room-scoped chat messages between WebSocket clients and augments
//! every chat message with an AI-generated reply.
//!
//! Run with:
//! ```not_rust
//! MODEL_TYPE=openai OPENAI_API_KEY=... cargo run --bin server
//! cargo run --bin server -- --host 0.0.0.0 --port 3000
//! ```

use std::sync::Arc;

use ai_chat_relay::{
    common::logger::setup_logger,
    config::BackendConfig,
    infrastructure::{
        backend::build_backend, connection::ChannelConnectionManager,
        registry::InMemoryRoomRegistry,
    },
    ui::Server,
    usecase::{
        ConnectParticipantUseCase, CreateRoomUseCase, DisconnectParticipantUseCase, GetRoomUseCase,
        RelayMessageUseCase,
    },
};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "Room-scoped chat relay with AI-generated replies", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    // Initialize dependencies in order:
    // 1. Registry + ConnectionManager
    // 2. GenerationBackend (initialization runs in the background)
    // 3. UseCases
    // 4. Server

    // 1. Create Registry and ConnectionManager (in-memory implementations)
    let registry = Arc::new(InMemoryRoomRegistry::new());
    let connections = Arc::new(ChannelConnectionManager::new());

    // 2. Select and build the GenerationBackend from MODEL_TYPE
    let backend_config = match BackendConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid backend configuration: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!("Selected generation backend: {}", backend_config.kind);
    let backend = match build_backend(&backend_config) {
        Ok(backend) => backend,
        Err(e) => {
            tracing::error!("Failed to build generation backend: {}", e);
            std::process::exit(1);
        }
    };

    // サーバの起動をブロックしないようバックグラウンドで初期化する。
    // 完了前のチャットは NotReady になり、その接続だけが閉じられる。
    let backend_for_init = backend.clone();
    tokio::spawn(async move {
        let state = backend_for_init.initialize().await;
        tracing::info!("Generation backend initialization finished: {:?}", state);
    });

    // 3. Create UseCases
    let create_room_usecase = Arc::new(CreateRoomUseCase::new(registry.clone()));
    let get_room_usecase = Arc::new(GetRoomUseCase::new(registry.clone()));
    let connect_participant_usecase =
        Arc::new(ConnectParticipantUseCase::new(connections.clone()));
    let disconnect_participant_usecase =
        Arc::new(DisconnectParticipantUseCase::new(connections.clone()));
    let relay_message_usecase = Arc::new(RelayMessageUseCase::new(
        connections.clone(),
        backend,
        backend_config.max_new_tokens,
    ));

    // 4. Create and run the server
    let server = Server::new(
        create_room_usecase,
        get_room_usecase,
        connect_participant_usecase,
        disconnect_participant_usecase,
        relay_message_usecase,
    );
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
