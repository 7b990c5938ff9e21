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

//! A connected player's identity and rating, the persisted player-store
//! contract, and the input validators guarding sign-up.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::RwLock;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tracing::warn;

use crate::game_type::GameType;

/// A live player. Identity and hashing are by `nick` alone, resolvable by
/// nick rather than by shared mutable reference.
pub struct Player {
    pub nick: String,
    elo: RwLock<HashMap<GameType, i32>>,
    sender: Option<UnboundedSender<String>>,
}

impl Player {
    pub fn new(nick: String, elo: HashMap<GameType, i32>) -> Self {
        Self {
            nick,
            elo: RwLock::new(elo),
            sender: None,
        }
    }

    pub fn with_sender(nick: String, elo: HashMap<GameType, i32>, sender: UnboundedSender<String>) -> Self {
        Self {
            nick,
            elo: RwLock::new(elo),
            sender: Some(sender),
        }
    }

    pub fn elo(&self, game_type: GameType) -> i32 {
        *self.elo.read().unwrap().get(&game_type).unwrap_or(&1000)
    }

    pub fn set_elo(&self, game_type: GameType, value: i32) {
        self.elo.write().unwrap().insert(game_type, value);
    }

    /// Pushes a pre-serialized JSON frame to this player's outbound
    /// channel. Failure (a closed channel) is absorbed here: the
    /// connection's own disconnect path is responsible for cleanup, per
    /// the broadcast backpressure policy.
    pub fn send(&self, message: String) {
        if let Some(sender) = &self.sender {
            if sender.send(message).is_err() {
                warn!(nick = %self.nick, "send to disconnected player dropped");
            }
        }
    }

    pub fn descriptor(&self) -> PlayerDescriptor {
        PlayerDescriptor {
            nick: self.nick.clone(),
            elo: EloByGameType {
                blitz: self.elo(GameType::Blitz),
                rapid: self.elo(GameType::Rapid),
                classic: self.elo(GameType::Classic),
            },
        }
    }
}

impl PartialEq for Player {
    fn eq(&self, other: &Self) -> bool {
        self.nick == other.nick
    }
}

impl Eq for Player {}

impl Hash for Player {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.nick.hash(state);
    }
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player").field("nick", &self.nick).finish()
    }
}

#[derive(Debug, Serialize)]
pub struct EloByGameType {
    #[serde(rename = "BLITZ")]
    pub blitz: i32,
    #[serde(rename = "RAPID")]
    pub rapid: i32,
    #[serde(rename = "CLASSIC")]
    pub classic: i32,
}

#[derive(Debug, Serialize)]
pub struct PlayerDescriptor {
    pub nick: String,
    pub elo: EloByGameType,
}

/// The persisted shape of a player document: keyed by `nick` and `email`,
/// each unique.
#[derive(Debug, Clone)]
pub struct PlayerModel {
    pub nick: String,
    pub elo: HashMap<GameType, i32>,
    pub email: String,
    pub password_hash: String,
}

impl PlayerModel {
    pub fn new(nick: String, email: String, password_hash: String) -> Self {
        let mut elo = HashMap::new();
        elo.insert(GameType::Blitz, 1000);
        elo.insert(GameType::Rapid, 1000);
        elo.insert(GameType::Classic, 1000);
        Self {
            nick,
            elo,
            email,
            password_hash,
        }
    }
}

/// Async interface to the persistent player store. This crate treats the
/// concrete document database as an external collaborator; only the
/// contract lives here, plus an in-memory implementation for tests and for
/// running the service without one.
#[async_trait]
pub trait PlayerStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Option<PlayerModel>;
    async fn exists_by_nick(&self, nick: &str) -> bool;
    async fn exists_by_email(&self, email: &str) -> bool;
    async fn insert(&self, model: PlayerModel) -> anyhow::Result<()>;
    async fn update_elo(&self, nick: &str, game_type: GameType, new_elo: i32) -> anyhow::Result<()>;
}

#[derive(Default)]
pub struct InMemoryPlayerStore {
    players: RwLock<Vec<PlayerModel>>,
}

impl InMemoryPlayerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(players: Vec<PlayerModel>) -> Self {
        Self {
            players: RwLock::new(players),
        }
    }
}

#[async_trait]
impl PlayerStore for InMemoryPlayerStore {
    async fn find_by_email(&self, email: &str) -> Option<PlayerModel> {
        self.players
            .read()
            .unwrap()
            .iter()
            .find(|p| p.email == email)
            .cloned()
    }

    async fn exists_by_nick(&self, nick: &str) -> bool {
        self.players.read().unwrap().iter().any(|p| p.nick == nick)
    }

    async fn exists_by_email(&self, email: &str) -> bool {
        self.players.read().unwrap().iter().any(|p| p.email == email)
    }

    async fn insert(&self, model: PlayerModel) -> anyhow::Result<()> {
        self.players.write().unwrap().push(model);
        Ok(())
    }

    async fn update_elo(&self, nick: &str, game_type: GameType, new_elo: i32) -> anyhow::Result<()> {
        let mut players = self.players.write().unwrap();
        if let Some(p) = players.iter_mut().find(|p| p.nick == nick) {
            p.elo.insert(game_type, new_elo);
        }
        Ok(())
    }
}

/// `^\w{3,16}$` — word characters only, 3 to 16 of them.
pub fn is_valid_nick(nick: &str) -> bool {
    let len = nick.chars().count();
    (3..=16).contains(&len) && nick.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// `^.{1,50}@.{1,25}\..{1,25}$` — exactly one `@` with a dotted domain,
/// local part up to 50 characters, host and TLD up to 25 each.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || local.chars().count() > 50 {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !host.is_empty()
        && host.chars().count() <= 25
        && !tld.is_empty()
        && tld.chars().count() <= 25
}

/// Password length 7-75, no character-class restriction.
pub fn is_valid_password(password: &str) -> bool {
    (7..=75).contains(&password.chars().count())
}

/// `^[A-Z]{5}$`
pub fn is_valid_access_key(key: &str) -> bool {
    key.chars().count() == 5 && key.chars().all(|c| c.is_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nick_validation_enforces_length_and_charset() {
        assert!(is_valid_nick("abc"));
        assert!(is_valid_nick("player_one_12345"[..16].into()));
        assert!(!is_valid_nick("ab"));
        assert!(!is_valid_nick("has space"));
    }

    #[test]
    fn email_validation_requires_dotted_domain() {
        assert!(is_valid_email("a@b.com"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a@b"));
    }

    #[test]
    fn password_validation_enforces_length_bounds() {
        assert!(is_valid_password("1234567"));
        assert!(!is_valid_password("short"));
        assert!(!is_valid_password(&"a".repeat(76)));
    }

    #[test]
    fn access_key_validation_requires_five_uppercase_letters() {
        assert!(is_valid_access_key("ABCDE"));
        assert!(!is_valid_access_key("abcde"));
        assert!(!is_valid_access_key("ABCD"));
    }
}
