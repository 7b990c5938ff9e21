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

//! The connection broker: one task pair (read + write) per WebSocket.
//!
//! Every connection starts anonymous and may only send `SignUp`/`SignIn`
//! until one succeeds; an anonymous connection that idles past
//! [`Config::unauth_reap_after`] is closed by its own lobby loop, checked
//! every [`Config::unauth_reap_interval`]. Once authenticated, the
//! connection owns a [`Player`] and its frames are dispatched against the
//! shared [`RoomService`].

use std::sync::Arc;
use std::time::Instant;

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::sync::Mutex;
use tracing::info;

use crate::auth::{AuthService, AuthStatus};
use crate::config::Config;
use crate::messages::{parse_client_request, ClientRequest, MessageCode};
use crate::player::Player;
use crate::room_service::RoomService;

pub struct AppState {
    pub auth: AuthService,
    pub rooms: Arc<RoomService>,
    pub config: Config,
}

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

type Sink = Arc<Mutex<SplitSink<WebSocket, Message>>>;

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (ws_sink, mut ws_stream) = socket.split();
    let ws_sink: Sink = Arc::new(Mutex::new(ws_sink));
    let connected_at = Instant::now();

    let session: Option<(Arc<Player>, UnboundedReceiver<String>)>;
    let mut reap_ticker = tokio::time::interval(state.config.unauth_reap_interval);
    reap_ticker.tick().await; // first tick fires immediately

    loop {
        tokio::select! {
            frame = ws_stream.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(authenticated) = handle_lobby_frame(&text, &state, &ws_sink).await {
                            session = Some(authenticated);
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => return,
                    Some(Err(_)) => return,
                    _ => continue,
                }
            }
            _ = reap_ticker.tick() => {
                if connected_at.elapsed() > state.config.unauth_reap_after {
                    close(&ws_sink, "anonymous session timed out").await;
                    return;
                }
            }
        }
    }

    let Some((player, mut rx)) = session else { return };

    let write_sink = ws_sink.clone();
    let write_handle = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let mut sink = write_sink.lock().await;
            if sink.send(Message::Text(message.into())).await.is_err() {
                break;
            }
        }
    });

    loop {
        match ws_stream.next().await {
            Some(Ok(Message::Text(text))) => match parse_client_request(&text) {
                Ok(request) => dispatch(request, &player, &state).await,
                Err(_) => {
                    close(&ws_sink, "invalid request").await;
                    break;
                }
            },
            Some(Ok(Message::Close(_))) | None => break,
            Some(Err(_)) => break,
            _ => continue,
        }
    }

    write_handle.abort();
    state.rooms.disconnect(&player).await;
    info!(nick = %player.nick, "player disconnected");
}

/// Processes one lobby-phase frame. Returns `Some` once sign-in succeeds
/// and the connection is ready to enter the authenticated dispatch loop.
async fn handle_lobby_frame(
    text: &str,
    state: &Arc<AppState>,
    sink: &Sink,
) -> Option<(Arc<Player>, UnboundedReceiver<String>)> {
    match parse_client_request(text) {
        Ok(ClientRequest::SignUp { nick, email, password }) => {
            let status = state.auth.sign_up(&nick, &email, &password).await;
            send_one(sink, &auth_status_payload(MessageCode::SignUp, status)).await;
            None
        }
        Ok(ClientRequest::SignIn { email, password }) => {
            let (status, model) = state.auth.sign_in(&email, &password).await;
            match (status, model) {
                (AuthStatus::Ok, Some(model)) => {
                    let (tx, rx) = mpsc::unbounded_channel();
                    let player = Arc::new(Player::with_sender(model.nick.clone(), model.elo.clone(), tx));
                    send_one(
                        sink,
                        &json!({
                            "code": MessageCode::SignIn as i32,
                            "status": "OK",
                            "player": player.descriptor(),
                        }),
                    )
                    .await;
                    Some((player, rx))
                }
                (status, _) => {
                    send_one(sink, &auth_status_payload(MessageCode::SignIn, status)).await;
                    None
                }
            }
        }
        Ok(_) => {
            send_one(
                sink,
                &json!({"code": -1, "status": "PRECONDITION_NOT_MET", "reason": "sign in first"}),
            )
            .await;
            None
        }
        Err(_) => {
            send_one(sink, &json!({"code": -1, "status": "INVALID_REQUEST"})).await;
            None
        }
    }
}

async fn dispatch(request: ClientRequest, player: &Arc<Player>, state: &Arc<AppState>) {
    match request {
        ClientRequest::SignUp { .. } | ClientRequest::SignIn { .. } => {
            player.send(json!({"code": -1, "status": "ALREADY_AUTHENTICATED"}).to_string());
        }
        ClientRequest::JoinRankedQueue { game_type } => {
            state.rooms.join_ranked_queue(player.clone(), game_type).await;
        }
        ClientRequest::CancelJoiningRanked => {
            state.rooms.cancel_joining_ranked(player).await;
        }
        ClientRequest::CreatePrivateRoom => {
            state.rooms.create_private_room(player.clone()).await;
        }
        ClientRequest::JoinPrivateRoom { access_key } => {
            state.rooms.join_private_room(player.clone(), &access_key).await;
        }
        ClientRequest::LeavePrivateRoom => {
            state.rooms.leave_private_room(player).await;
        }
        ClientRequest::KickFromPrivateRoom => {
            state.rooms.kick_from_private_room(player).await;
        }
        ClientRequest::StartPrivateGame { game_type } => {
            state.rooms.start_private_game(player, game_type).await;
        }
        ClientRequest::GameSurrender => {
            state.rooms.surrender(player).await;
        }
        ClientRequest::GameOfferDraw => {
            state.rooms.offer_draw(player).await;
        }
        ClientRequest::GameRespondToDrawOffer { accepted } => {
            state.rooms.respond_to_draw_offer(player, accepted).await;
        }
        ClientRequest::GameClaimDraw => {
            state.rooms.claim_draw(player).await;
        }
        ClientRequest::GameMove { mv } => {
            state.rooms.make_move(player, mv).await;
        }
    }
}

fn auth_status_payload(code: MessageCode, status: AuthStatus) -> Value {
    json!({"code": code as i32, "status": format!("{status:?}")})
}

async fn send_one(sink: &Sink, message: &Value) {
    let mut sink = sink.lock().await;
    let _ = sink.send(Message::Text(message.to_string().into())).await;
}

async fn close(sink: &Sink, reason: &'static str) {
    let mut sink = sink.lock().await;
    let _ = sink
        .send(Message::Close(Some(CloseFrame {
            code: 1008,
            reason: reason.into(),
        })))
        .await;
}
