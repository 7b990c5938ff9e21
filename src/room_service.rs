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

//! The central orchestrator: room indexes, the ranked queue, and every
//! handler named in the room-service component. All mutable state lives
//! behind one `tokio::sync::Mutex`; a handler holds the lock for its whole
//! turn, which is how §5's "no preemption between suspension points" rule
//! is realized concretely (see `SPEC_FULL.md` §5).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "random")]
use rand::Rng;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::chess_move::Move;
use crate::elo::elo_delta;
use crate::game_runner::GameEndStatus;
use crate::game_type::GameType;
use crate::matchmaking::RankedQueue;
use crate::messages::MessageCode;
use crate::piece::Team;
use crate::player::{Player, PlayerStore};
use crate::room::Room;

pub type RoomId = u64;

struct State {
    next_room_id: RoomId,
    queue: RankedQueue,
    rooms: HashMap<RoomId, Room>,
    ranked_rooms: HashMap<String, RoomId>,
    private_rooms_by_player: HashMap<String, RoomId>,
    private_rooms_by_key: HashMap<String, RoomId>,
}

impl State {
    fn new() -> Self {
        Self {
            next_room_id: 0,
            queue: RankedQueue::new(),
            rooms: HashMap::new(),
            ranked_rooms: HashMap::new(),
            private_rooms_by_key: HashMap::new(),
            private_rooms_by_player: HashMap::new(),
        }
    }

    fn room_id_for(&self, nick: &str) -> Option<RoomId> {
        self.ranked_rooms
            .get(nick)
            .or_else(|| self.private_rooms_by_player.get(nick))
            .copied()
    }

    /// Whether a player is already in a room or sitting in the ranked queue.
    fn is_occupied(&self, player: &Player) -> bool {
        self.room_id_for(&player.nick).is_some() || self.queue.contains(player)
    }

    fn remove_room(&mut self, room_id: RoomId) -> Option<Room> {
        let room = self.rooms.remove(&room_id)?;
        match &room {
            Room::Ranked { player1, player2, .. } => {
                self.ranked_rooms.remove(&player1.nick);
                self.ranked_rooms.remove(&player2.nick);
            }
            Room::Private { host, guest, access_key, .. } => {
                self.private_rooms_by_player.remove(&host.nick);
                if let Some(guest) = guest {
                    self.private_rooms_by_player.remove(&guest.nick);
                }
                self.private_rooms_by_key.remove(access_key);
            }
        }
        Some(room)
    }

    fn allocate_room_id(&mut self) -> RoomId {
        let id = self.next_room_id;
        self.next_room_id += 1;
        id
    }
}

pub struct RoomService {
    store: Arc<dyn PlayerStore>,
    state: Mutex<State>,
}

impl RoomService {
    pub fn new(store: Arc<dyn PlayerStore>) -> Arc<Self> {
        Arc::new(Self {
            store,
            state: Mutex::new(State::new()),
        })
    }

    /// Sweeps the ranked queue on `interval`, pairing players and starting
    /// their rooms. Runs until the returned handle is aborted or the
    /// service is dropped.
    pub fn spawn_matchmaking_loop(self: &Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        let service = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                service.sweep_matchmaking().await;
            }
        })
    }

    async fn sweep_matchmaking(self: &Arc<Self>) {
        let pairings = {
            let mut state = self.state.lock().await;
            state.queue.sweep()
        };
        for pairing in pairings {
            self.start_ranked_room(pairing.player1, pairing.player2, pairing.game_type).await;
        }
    }

    async fn start_ranked_room(self: &Arc<Self>, player1: Arc<Player>, player2: Arc<Player>, game_type: GameType) {
        let room_id = {
            let mut state = self.state.lock().await;
            let id = state.allocate_room_id();
            let mut room = Room::new_ranked(player1.clone(), player2.clone());
            room.start_ranked(game_type, self.time_end_callback_arc(id));
            state.ranked_rooms.insert(player1.nick.clone(), id);
            state.ranked_rooms.insert(player2.nick.clone(), id);
            state.rooms.insert(id, room);
            id
        };

        let state = self.state.lock().await;
        if let Some(room) = state.rooms.get(&room_id) {
            let runner = room.runner();
            let white = runner.player_of(Team::White);
            let black = runner.player_of(Team::Black);
            let message = json!({
                "code": MessageCode::JoinedRankedRoom as i32,
                "gameType": game_type,
                "teams": {
                    "WHITE": white.map(|p| p.descriptor()),
                    "BLACK": black.map(|p| p.descriptor()),
                },
            });
            room.broadcast(&message.to_string());
        }
        info!(room_id, ?game_type, "ranked room started");
    }

    // ---- queue -----------------------------------------------------

    pub async fn join_ranked_queue(&self, sender: Arc<Player>, game_type: GameType) {
        let mut state = self.state.lock().await;
        if state.is_occupied(&sender) {
            return;
        }
        state.queue.enqueue(sender.clone(), game_type);
        drop(state);
        sender.send(json!({"code": MessageCode::JoinRankedQueue as i32, "status": "SUCCESS"}).to_string());
    }

    pub async fn cancel_joining_ranked(&self, sender: &Player) {
        let mut state = self.state.lock().await;
        state.queue.dequeue_any(sender);
        drop(state);
        sender.send(json!({"code": MessageCode::CancelJoiningRanked as i32, "status": "SUCCESS"}).to_string());
    }

    // ---- private rooms ----------------------------------------------

    pub async fn create_private_room(&self, sender: Arc<Player>) {
        let mut state = self.state.lock().await;
        if state.is_occupied(&sender) {
            return;
        }
        let key = loop {
            let candidate = random_access_key();
            if !state.private_rooms_by_key.contains_key(&candidate) {
                break candidate;
            }
        };
        let room = Room::new_private(sender.clone(), key.clone());
        let id = state.allocate_room_id();
        state.private_rooms_by_player.insert(sender.nick.clone(), id);
        state.private_rooms_by_key.insert(key.clone(), id);
        state.rooms.insert(id, room);
        drop(state);

        sender.send(
            json!({
                "code": MessageCode::CreatePrivateRoom as i32,
                "status": "SUCCESS",
                "accessKey": key,
            })
            .to_string(),
        );
    }

    pub async fn join_private_room(&self, sender: Arc<Player>, access_key: &str) {
        let mut state = self.state.lock().await;
        if state.is_occupied(&sender) {
            return;
        }
        let Some(&room_id) = state.private_rooms_by_key.get(access_key) else {
            drop(state);
            sender.send(json!({"code": MessageCode::JoinPrivateRoom as i32, "status": "ROOM_NOT_EXIST"}).to_string());
            return;
        };
        let room = state.rooms.get_mut(&room_id).expect("index is consistent");
        if room.is_full() {
            drop(state);
            sender.send(json!({"code": MessageCode::JoinPrivateRoom as i32, "status": "ROOM_FULL"}).to_string());
            return;
        }
        if !room.join_private(sender.clone()) {
            drop(state);
            sender.send(json!({"code": MessageCode::JoinPrivateRoom as i32, "status": "KICKED_FROM_ROOM"}).to_string());
            return;
        }
        state.private_rooms_by_player.insert(sender.nick.clone(), room_id);
        let host = room.players().into_iter().find(|p| p.nick != sender.nick);
        let message = json!({
            "code": MessageCode::JoinPrivateRoom as i32,
            "status": "SUCCESS",
            "host": host.map(|p| p.descriptor()),
        });
        let room = state.rooms.get(&room_id).expect("still present");
        room.broadcast(&message.to_string());
    }

    pub async fn leave_private_room(&self, sender: &Player) {
        let mut state = self.state.lock().await;
        let Some(&room_id) = state.private_rooms_by_player.get(&sender.nick) else {
            return;
        };
        let leave_message = json!({
            "code": MessageCode::LeavePrivateRoom as i32,
            "player": sender.descriptor(),
        })
        .to_string();

        let tear_down = {
            let room = state.rooms.get_mut(&room_id).expect("index is consistent");
            room.leave_private(&sender.nick)
        };

        if tear_down {
            let room = state.remove_room(room_id).expect("just looked up");
            room.broadcast(&leave_message);
        } else {
            state.private_rooms_by_player.remove(&sender.nick);
            let room = state.rooms.get(&room_id).expect("guest left, host remains");
            room.broadcast(&leave_message);
        }
    }

    pub async fn kick_from_private_room(&self, sender: &Player) {
        let mut state = self.state.lock().await;
        let Some(&room_id) = state.private_rooms_by_player.get(&sender.nick) else {
            return;
        };
        let Some(room) = state.rooms.get_mut(&room_id) else { return };
        let Some(guest) = room.opponent_of(&sender.nick) else {
            return;
        };
        if !room.kick(&sender.nick, &guest.nick) {
            return;
        }
        state.private_rooms_by_player.remove(&guest.nick);
        let message = json!({"code": MessageCode::KickFromPrivateRoom as i32}).to_string();
        sender.send(message.clone());
        guest.send(message);
    }

    pub async fn start_private_game(self: &Arc<Self>, sender: &Player, game_type: GameType) {
        let mut state = self.state.lock().await;
        let Some(&room_id) = state.private_rooms_by_player.get(&sender.nick) else {
            return;
        };
        let callback = self.time_end_callback_arc(room_id);
        let Some(room) = state.rooms.get_mut(&room_id) else { return };
        if !room.contains(&sender.nick) || !matches!(room, Room::Private { host, .. } if host.nick == sender.nick) {
            return;
        }
        if !room.start_private(game_type, callback) {
            return;
        }
        let runner = room.runner();
        let white = runner.player_of(Team::White);
        let black = runner.player_of(Team::Black);
        let message = json!({
            "code": MessageCode::StartPrivateGame as i32,
            "gameType": game_type,
            "teams": {
                "WHITE": white.map(|p| p.descriptor()),
                "BLACK": black.map(|p| p.descriptor()),
            },
        });
        room.broadcast(&message.to_string());
    }

    // ---- game actions -------------------------------------------------

    pub async fn surrender(&self, sender: &Player) {
        let mut state = self.state.lock().await;
        let Some(room_id) = state.room_id_for(&sender.nick) else { return };
        let Some(room) = state.rooms.get_mut(&room_id) else { return };
        let Some(status) = room.runner().on_surrender(sender) else { return };
        self.finish_game(&mut state, room_id, status, MessageCode::GameSurrender).await;
    }

    pub async fn offer_draw(&self, sender: &Player) {
        let mut state = self.state.lock().await;
        let Some(room_id) = state.room_id_for(&sender.nick) else { return };
        let Some(room) = state.rooms.get_mut(&room_id) else { return };
        if !room.runner_mut().offer_draw(sender) {
            return;
        }
        let message = json!({"code": MessageCode::GameOfferDraw as i32, "offeredBy": sender.nick}).to_string();
        room.broadcast(&message);
    }

    pub async fn respond_to_draw_offer(&self, sender: &Player, accepted: bool) {
        let mut state = self.state.lock().await;
        let Some(room_id) = state.room_id_for(&sender.nick) else { return };
        let Some(room) = state.rooms.get_mut(&room_id) else { return };
        let Some(accepted) = room.runner_mut().respond_to_draw_offer(sender, accepted) else {
            return;
        };
        if accepted {
            let status = room.runner().on_draw_accepted().expect("game is running");
            self.finish_game(&mut state, room_id, status, MessageCode::GameRespondToDrawOffer).await;
        } else {
            let message = json!({"code": MessageCode::GameRespondToDrawOffer as i32, "accepted": false}).to_string();
            room.broadcast(&message);
        }
    }

    pub async fn claim_draw(&self, sender: &Player) {
        let mut state = self.state.lock().await;
        let Some(room_id) = state.room_id_for(&sender.nick) else { return };
        let Some(room) = state.rooms.get_mut(&room_id) else { return };
        let Some(status) = room.runner().on_draw_claim(sender) else { return };
        self.finish_game(&mut state, room_id, status, MessageCode::GameClaimDraw).await;
    }

    pub async fn make_move(&self, sender: &Player, mv: Move) {
        let mut state = self.state.lock().await;
        let Some(room_id) = state.room_id_for(&sender.nick) else { return };
        let Some(room) = state.rooms.get_mut(&room_id) else { return };
        let Ok((end_status, move_status)) = room.runner_mut().on_move(sender, mv) else {
            return;
        };

        let move_message = json!({
            "code": MessageCode::GameMove as i32,
            "move": mv,
            "timeLeft": move_status.time_left,
        })
        .to_string();
        room.broadcast(&move_message);

        if let Some(status) = end_status {
            self.finish_without_broadcast(&mut state, room_id, status).await;
        }
    }

    /// Handles a clock expiring. Invoked from the `GameTimer`'s task via a
    /// closure bound to `room_id`; runs its own turn under the same lock
    /// every handler uses.
    pub async fn handle_time_end(&self, room_id: RoomId, team: Team) {
        let mut state = self.state.lock().await;
        let Some(room) = state.rooms.get(&room_id) else { return };
        let Some(status) = room.runner().on_time_end(team) else { return };
        let message = json!({"code": MessageCode::GameTimeEnd as i32}).to_string();
        room.broadcast(&message);
        self.finish_without_broadcast(&mut state, room_id, status).await;
    }

    pub async fn disconnect(&self, sender: &Player) {
        let mut state = self.state.lock().await;
        state.queue.dequeue_any(sender);

        let Some(room_id) = state.room_id_for(&sender.nick) else { return };
        let is_ranked = matches!(state.rooms.get(&room_id), Some(Room::Ranked { .. }));

        if is_ranked {
            let room = state.rooms.get(&room_id).expect("looked up above");
            if let Some(status) = room.runner().on_surrender(sender) {
                let notice = json!({"code": MessageCode::PlayerDisconnected as i32, "player": sender.nick}).to_string();
                room.broadcast(&notice);
                self.finish_without_broadcast(&mut state, room_id, status).await;
            }
            return;
        }

        // Private room: host leaving tears it down; guest leaving frees the
        // slot. Either way the remaining participant is notified.
        let notice = json!({"code": MessageCode::PlayerDisconnected as i32, "player": sender.nick}).to_string();
        let tear_down = {
            let room = state.rooms.get_mut(&room_id).expect("index is consistent");
            if room.is_running() {
                room.runner_mut().clean();
            }
            room.leave_private(&sender.nick)
        };
        if tear_down {
            let room = state.remove_room(room_id).expect("just looked up");
            room.broadcast(&notice);
        } else {
            state.private_rooms_by_player.remove(&sender.nick);
            let room = state.rooms.get(&room_id).expect("guest left, host remains");
            room.broadcast(&notice);
        }
    }

    /// Applies Elo (ranked only) and removes the room (ranked) or cleans up
    /// its runner (private), without emitting the caller's own broadcast —
    /// used where the caller already sent one (e.g. `GAME_MOVE` carries the
    /// end status alongside the move itself).
    async fn finish_without_broadcast(&self, state: &mut State, room_id: RoomId, status: GameEndStatus) {
        self.settle(state, room_id, &status).await;
    }

    /// Applies Elo (ranked only), removes the room (ranked) or cleans up its
    /// runner (private), and broadcasts a dedicated end-of-game message
    /// tagged with `code`.
    async fn finish_game(&self, state: &mut State, room_id: RoomId, status: GameEndStatus, code: MessageCode) {
        let message = end_game_message(code, &status);
        if let Some(room) = state.rooms.get(&room_id) {
            room.broadcast(&message);
        }
        self.settle(state, room_id, &status).await;
    }

    /// Ranked rooms are one game only: tear the room down and settle Elo.
    /// Private rooms survive a finished game so the host can start another
    /// one, so only the runner is cleaned up.
    async fn settle(&self, state: &mut State, room_id: RoomId, status: &GameEndStatus) {
        let is_ranked = matches!(state.rooms.get(&room_id), Some(Room::Ranked { .. }));
        if !is_ranked {
            if let Some(room) = state.rooms.get_mut(&room_id) {
                room.runner_mut().clean();
            }
            return;
        }
        let Some(room) = state.remove_room(room_id) else { return };
        let Room::Ranked { player1, player2, .. } = room else {
            return;
        };
        self.apply_elo(player1, player2, status).await;
    }

    async fn apply_elo(&self, player1: Arc<Player>, player2: Arc<Player>, status: &GameEndStatus) {
        let game_type = status.game_type;
        let score = if status.draw {
            0.5
        } else {
            match &status.winner {
                Some(winner) if winner.nick == player1.nick => 1.0,
                Some(_) => 0.0,
                None => 0.5,
            }
        };
        let elo1 = player1.elo(game_type);
        let elo2 = player2.elo(game_type);
        let delta = elo_delta(elo1, elo2, score);

        let new_elo1 = elo1 + delta;
        let new_elo2 = elo2 - delta;
        player1.set_elo(game_type, new_elo1);
        player2.set_elo(game_type, new_elo2);

        let (r1, r2) = tokio::join!(
            self.store.update_elo(&player1.nick, game_type, new_elo1),
            self.store.update_elo(&player2.nick, game_type, new_elo2),
        );
        if let Err(err) = r1 {
            warn!(nick = %player1.nick, %err, "failed to persist elo update");
        }
        if let Err(err) = r2 {
            warn!(nick = %player2.nick, %err, "failed to persist elo update");
        }
    }

    fn time_end_callback_arc(self: &Arc<Self>, room_id: RoomId) -> Arc<dyn Fn(Team) + Send + Sync> {
        let service = self.clone();
        Arc::new(move |team| {
            let service = service.clone();
            tokio::spawn(async move {
                service.handle_time_end(room_id, team).await;
            });
        })
    }
}

fn end_game_message(code: MessageCode, status: &GameEndStatus) -> String {
    json!({
        "code": code as i32,
        "draw": status.draw,
        "winner": status.winner.as_ref().map(|p| p.nick.clone()),
        "loser": status.loser.as_ref().map(|p| p.nick.clone()),
    })
    .to_string()
}

#[cfg(feature = "random")]
fn random_access_key() -> String {
    let mut rng = rand::thread_rng();
    (0..5).map(|_| rng.gen_range(b'A'..=b'Z') as char).collect()
}

#[cfg(not(feature = "random"))]
fn random_access_key() -> String {
    "AAAAA".to_string()
}
