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

//! A room holds the two participants of one game, ranked or private, and
//! the `GameRunner` that plays it out.

use std::collections::HashSet;
use std::sync::Arc;

use crate::game_runner::GameRunner;
use crate::game_type::GameType;
use crate::piece::Team;
use crate::player::Player;

pub enum Room {
    Ranked {
        player1: Arc<Player>,
        player2: Arc<Player>,
        runner: GameRunner,
    },
    Private {
        host: Arc<Player>,
        guest: Option<Arc<Player>>,
        /// Chosen by the host with `START_PRIVATE_GAME`; a freshly created
        /// private room has no game type until then.
        game_type: Option<GameType>,
        access_key: String,
        kicked: HashSet<String>,
        runner: GameRunner,
    },
}

impl Room {
    pub fn new_ranked(player1: Arc<Player>, player2: Arc<Player>) -> Self {
        Room::Ranked {
            player1,
            player2,
            runner: GameRunner::new(),
        }
    }

    pub fn new_private(host: Arc<Player>, access_key: String) -> Self {
        Room::Private {
            host,
            guest: None,
            game_type: None,
            access_key,
            kicked: HashSet::new(),
            runner: GameRunner::new(),
        }
    }

    pub fn game_type(&self) -> Option<GameType> {
        match self {
            Room::Ranked { runner, .. } => runner.game_type,
            Room::Private { game_type, runner, .. } => runner.game_type.or(*game_type),
        }
    }

    pub fn runner(&self) -> &GameRunner {
        match self {
            Room::Ranked { runner, .. } => runner,
            Room::Private { runner, .. } => runner,
        }
    }

    pub fn runner_mut(&mut self) -> &mut GameRunner {
        match self {
            Room::Ranked { runner, .. } => runner,
            Room::Private { runner, .. } => runner,
        }
    }

    pub fn is_ranked(&self) -> bool {
        matches!(self, Room::Ranked { .. })
    }

    pub fn access_key(&self) -> Option<&str> {
        match self {
            Room::Private { access_key, .. } => Some(access_key.as_str()),
            Room::Ranked { .. } => None,
        }
    }

    pub fn players(&self) -> Vec<Arc<Player>> {
        match self {
            Room::Ranked { player1, player2, .. } => vec![player1.clone(), player2.clone()],
            Room::Private { host, guest, .. } => {
                let mut players = vec![host.clone()];
                if let Some(guest) = guest {
                    players.push(guest.clone());
                }
                players
            }
        }
    }

    pub fn contains(&self, nick: &str) -> bool {
        self.players().iter().any(|p| p.nick == nick)
    }

    pub fn opponent_of(&self, nick: &str) -> Option<Arc<Player>> {
        self.players().into_iter().find(|p| p.nick != nick)
    }

    pub fn is_full(&self) -> bool {
        match self {
            Room::Ranked { .. } => true,
            Room::Private { guest, .. } => guest.is_some(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.runner().running()
    }

    /// Adds `player` as the private room's guest. Rejects the host
    /// rejoining, a previously kicked nick, or a room that already has a
    /// guest.
    pub fn join_private(&mut self, player: Arc<Player>) -> bool {
        match self {
            Room::Private {
                host, guest, kicked, ..
            } => {
                if guest.is_some() || host.nick == player.nick || kicked.contains(&player.nick) {
                    false
                } else {
                    *guest = Some(player);
                    true
                }
            }
            Room::Ranked { .. } => false,
        }
    }

    /// Removes `nick` from a not-yet-started private room. Returns `true`
    /// if the room should be torn down entirely (the host left).
    pub fn leave_private(&mut self, nick: &str) -> bool {
        match self {
            Room::Private { host, guest, .. } => {
                if host.nick == nick {
                    true
                } else {
                    if guest.as_ref().is_some_and(|g| g.nick == nick) {
                        *guest = None;
                    }
                    false
                }
            }
            Room::Ranked { .. } => false,
        }
    }

    /// Only the host may kick, and only before the game has started.
    pub fn kick(&mut self, host_nick: &str, target_nick: &str) -> bool {
        match self {
            Room::Private {
                host,
                guest,
                kicked,
                runner,
                ..
            } => {
                if runner.running() || host.nick != host_nick {
                    return false;
                }
                if guest.as_ref().is_some_and(|g| g.nick == target_nick) {
                    *guest = None;
                    kicked.insert(target_nick.to_string());
                    true
                } else {
                    false
                }
            }
            Room::Ranked { .. } => false,
        }
    }

    /// Starts a private room's game with the host-chosen `game_type`;
    /// requires a guest to be present and the room not already running.
    /// `on_time_end` is the room service's own callback, already bound to
    /// this room's identity (typically a clone of a shared
    /// `Arc<Mutex<Room>>`), since `GameTimer` only knows the `Team` whose
    /// clock expired, not which room it belongs to.
    pub fn start_private(&mut self, chosen_game_type: GameType, on_time_end: Arc<dyn Fn(Team) + Send + Sync>) -> bool {
        match self {
            Room::Private {
                host,
                guest,
                game_type,
                runner,
                ..
            } => {
                let Some(guest) = guest.clone() else {
                    return false;
                };
                if runner.running() {
                    return false;
                }
                *game_type = Some(chosen_game_type);
                runner.start(host.clone(), guest, chosen_game_type, on_time_end);
                true
            }
            Room::Ranked { .. } => false,
        }
    }

    pub fn start_ranked(&mut self, game_type: GameType, on_time_end: Arc<dyn Fn(Team) + Send + Sync>) {
        if let Room::Ranked {
            player1,
            player2,
            runner,
        } = self
        {
            debug_assert!(!runner.running());
            runner.start(player1.clone(), player2.clone(), game_type, on_time_end);
        }
    }

    pub fn broadcast(&self, message: &str) {
        for player in self.players() {
            player.send(message.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn player(nick: &str) -> Arc<Player> {
        Arc::new(Player::new(nick.to_string(), HashMap::new()))
    }

    #[test]
    fn private_room_join_rejects_host_and_full_room() {
        let mut room = Room::new_private(player("host"), "ABCDE".to_string());
        assert!(!room.join_private(player("host")));
        assert!(room.join_private(player("guest")));
        assert!(!room.join_private(player("other")));
    }

    #[test]
    fn kicked_guest_cannot_rejoin() {
        let mut room = Room::new_private(player("host"), "ABCDE".to_string());
        room.join_private(player("guest"));
        assert!(room.kick("host", "guest"));
        assert!(!room.join_private(player("guest")));
    }

    #[test]
    fn host_leaving_tears_down_the_room() {
        let mut room = Room::new_private(player("host"), "ABCDE".to_string());
        room.join_private(player("guest"));
        assert!(room.leave_private("host"));
    }

    #[test]
    fn guest_leaving_frees_the_slot() {
        let mut room = Room::new_private(player("host"), "ABCDE".to_string());
        room.join_private(player("guest"));
        assert!(!room.leave_private("guest"));
        assert!(room.join_private(player("guest")));
    }
}
