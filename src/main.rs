// Copyright 2026 Tobin Edwards
//
//    Licensed under the Apache License, Version 2.0 (the "License");
//    you may not use this file except in compliance with the License.
//    You may obtain a copy of the License at
//
//        http://www.apache.org/licenses/LICENSE-2.0
//
//    Unless required by applicable law or agreed to in writing, software
//    distributed under the License is distributed on an "AS IS" BASIS,
//    WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//    See the License for the specific language governing permissions and
//    limitations under the License.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tracing_subscriber::EnvFilter;

use chess_service_core::auth::AuthService;
use chess_service_core::broker::{ws_handler, AppState};
use chess_service_core::config::Config;
use chess_service_core::player::InMemoryPlayerStore;
use chess_service_core::room_service::RoomService;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();
    let store = Arc::new(InMemoryPlayerStore::new());
    let rooms = RoomService::new(store.clone());
    rooms.spawn_matchmaking_loop(config.matchmaking_sweep_interval);

    let state = Arc::new(AppState {
        auth: AuthService::new(store),
        rooms,
        config: config.clone(),
    });

    let app = Router::new().route("/ws", get(ws_handler)).with_state(state);

    let addr = format!("{}:{}", config.listen_addr, config.port);
    tracing::info!(%addr, "starting chess service");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|err| panic!("failed to bind {addr}: {err}"));
    axum::serve(listener, app).await.expect("server error");
}
