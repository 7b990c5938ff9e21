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

//! The ranked queue: 30 Elo-width buckets per game type, swept periodically
//! to pair up waiting players.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use strum::IntoEnumIterator;

use crate::game_type::GameType;
use crate::player::Player;

const NUM_BUCKETS: usize = 30;
const BUCKET_WIDTH: i32 = 3000 / NUM_BUCKETS as i32;

fn elo_bucket(elo: i32) -> usize {
    let bucket = elo / BUCKET_WIDTH;
    bucket.clamp(0, NUM_BUCKETS as i32 - 1) as usize
}

/// A pairing produced by a sweep: `player1` always carries the Elo that was
/// waiting longest in its bucket chain (the carried-over "left" player,
/// when one existed); there is no seating significance beyond that.
pub struct Pairing {
    pub player1: Arc<Player>,
    pub player2: Arc<Player>,
    pub game_type: GameType,
}

pub struct RankedQueue {
    buckets: HashMap<GameType, Vec<HashSet<Arc<Player>>>>,
}

impl RankedQueue {
    pub fn new() -> Self {
        let mut buckets = HashMap::new();
        for game_type in GameType::iter() {
            buckets.insert(game_type, (0..NUM_BUCKETS).map(|_| HashSet::new()).collect());
        }
        Self { buckets }
    }

    pub fn enqueue(&mut self, player: Arc<Player>, game_type: GameType) {
        let bucket = elo_bucket(player.elo(game_type));
        self.buckets.get_mut(&game_type).unwrap()[bucket].insert(player);
    }

    /// Removes `player` from whichever game type's queue it is waiting in,
    /// if any, returning that game type.
    pub fn dequeue_any(&mut self, player: &Player) -> Option<GameType> {
        for game_type in GameType::iter() {
            let bucket = elo_bucket(player.elo(game_type));
            if self.buckets.get_mut(&game_type).unwrap()[bucket].remove(player) {
                return Some(game_type);
            }
        }
        None
    }

    pub fn dequeue(&mut self, player: &Player, game_type: GameType) -> bool {
        let bucket = elo_bucket(player.elo(game_type));
        self.buckets.get_mut(&game_type).unwrap()[bucket].remove(player)
    }

    pub fn contains(&self, player: &Player) -> bool {
        GameType::iter().any(|game_type| {
            let bucket = elo_bucket(player.elo(game_type));
            self.buckets[&game_type][bucket].contains(player)
        })
    }

    /// One matchmaking pass. For each game type, walks its buckets in
    /// ascending Elo order carrying at most one unpaired player ("left")
    /// forward: a non-empty bucket immediately absorbs `left` if one is
    /// being carried, then pairs off its own players two at a time; an
    /// empty bucket flushes any carried player back into its own bucket
    /// rather than carrying it further.
    pub fn sweep(&mut self) -> Vec<Pairing> {
        let mut pairings = Vec::new();

        for game_type in GameType::iter() {
            let buckets = self.buckets.get_mut(&game_type).unwrap();
            let mut left: Option<Arc<Player>> = None;

            for bucket in buckets.iter_mut() {
                if let Some(carried) = left.take() {
                    if !bucket.is_empty() {
                        let partner = pop_one(bucket);
                        pairings.push(Pairing {
                            player1: carried,
                            player2: partner,
                            game_type,
                        });
                    } else {
                        left = Some(carried);
                    }
                }

                while bucket.len() >= 2 {
                    let p1 = pop_one(bucket);
                    let p2 = pop_one(bucket);
                    pairings.push(Pairing {
                        player1: p1,
                        player2: p2,
                        game_type,
                    });
                }

                if bucket.is_empty() {
                    if let Some(carried) = left.take() {
                        let home = elo_bucket(carried.elo(game_type));
                        buckets[home].insert(carried);
                    }
                } else {
                    left = Some(pop_one(bucket));
                }
            }
        }

        pairings
    }
}

impl Default for RankedQueue {
    fn default() -> Self {
        Self::new()
    }
}

fn pop_one(set: &mut HashSet<Arc<Player>>) -> Arc<Player> {
    let player = set.iter().next().cloned().expect("caller checked non-empty");
    set.remove(&player);
    player
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as StdHashMap;

    fn player(nick: &str, elo: i32) -> Arc<Player> {
        let mut elos = StdHashMap::new();
        elos.insert(GameType::Rapid, elo);
        Arc::new(Player::new(nick.to_string(), elos))
    }

    #[test]
    fn carried_player_pairs_with_the_next_non_empty_bucket() {
        let mut queue = RankedQueue::new();
        // 1000 -> bucket 10, 1213 -> bucket 12, 1200 -> bucket 12,
        // 1100 -> bucket 11, 948 -> bucket 9.
        queue.enqueue(player("a", 1000), GameType::Rapid);
        queue.enqueue(player("b", 1213), GameType::Rapid);
        queue.enqueue(player("c", 1200), GameType::Rapid);
        queue.enqueue(player("d", 1100), GameType::Rapid);
        queue.enqueue(player("e", 948), GameType::Rapid);

        let pairings = queue.sweep();
        assert_eq!(pairings.len(), 2);
        for p in &pairings {
            assert_eq!(p.game_type, GameType::Rapid);
        }
    }

    #[test]
    fn lone_player_is_returned_to_its_own_bucket_after_an_empty_gap() {
        let mut queue = RankedQueue::new();
        queue.enqueue(player("solo", 1000), GameType::Rapid);

        let pairings = queue.sweep();
        assert!(pairings.is_empty());
        assert!(queue.contains(&Player::new("solo".to_string(), {
            let mut m = StdHashMap::new();
            m.insert(GameType::Rapid, 1000);
            m
        })));
    }

    #[test]
    fn two_players_in_the_same_bucket_pair_immediately() {
        let mut queue = RankedQueue::new();
        queue.enqueue(player("a", 1005), GameType::Blitz);
        queue.enqueue(player("b", 1050), GameType::Blitz);

        let pairings = queue.sweep();
        assert_eq!(pairings.len(), 1);
    }

    #[test]
    fn dequeue_removes_a_waiting_player() {
        let mut queue = RankedQueue::new();
        let p = player("a", 1000);
        queue.enqueue(p.clone(), GameType::Rapid);
        assert!(queue.contains(&p));
        assert!(queue.dequeue(&p, GameType::Rapid));
        assert!(!queue.contains(&p));
    }
}
