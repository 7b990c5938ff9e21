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

//! A single game's clock, draw-offer protocol and result classification.
//!
//! `GameTimer` owns the per-team clock as a cancellable `tokio` task per
//! side; `GameRunner` owns the timer plus a live `ChessEngine`, the team
//! assignment, and the draw-offer state machine.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[cfg(feature = "random")]
use rand::{thread_rng, Rng};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::chess_engine::ChessEngine;
use crate::chess_move::Move;
use crate::game_type::{GameType, FIRST_MOVE_GRACE_MS};
use crate::piece::Team;
use crate::player::Player;

pub type OnGameEnd = Arc<dyn Fn(GameEndStatus) + Send + Sync>;

#[derive(Debug, Clone)]
pub struct GameEndStatus {
    pub draw: bool,
    pub winner: Option<Arc<Player>>,
    pub loser: Option<Arc<Player>>,
    pub game_type: GameType,
}

impl GameEndStatus {
    pub fn draw(game_type: GameType) -> Self {
        Self {
            draw: true,
            winner: None,
            loser: None,
            game_type,
        }
    }

    pub fn win(winner: Arc<Player>, loser: Arc<Player>, game_type: GameType) -> Self {
        Self {
            draw: false,
            winner: Some(winner),
            loser: Some(loser),
            game_type,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MoveStatus {
    pub successful: bool,
    pub time_left: i64,
}

/// Draw-offer finite state machine: either nobody has offered, or one team
/// has, awaiting the other's response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawOffer {
    #[default]
    None,
    OfferedBy(Team),
}

/// Per-team countdown clock. Each side's remaining milliseconds only ticks
/// while that side is to move; `next()` is called once per completed move
/// and returns the mover's remaining time (for broadcast to both clients).
pub struct GameTimer {
    times_left_ms: HashMap<Team, i64>,
    current_team: Team,
    move_start: Instant,
    is_first_move: bool,
    current_job: Option<JoinHandle<()>>,
    on_time_end: Arc<dyn Fn(Team) + Send + Sync>,
}

impl GameTimer {
    pub fn new(team_time_ms: i64, on_time_end: Arc<dyn Fn(Team) + Send + Sync>) -> Self {
        let mut times_left_ms = HashMap::with_capacity(2);
        times_left_ms.insert(Team::White, team_time_ms);
        times_left_ms.insert(Team::Black, team_time_ms);

        let mut timer = Self {
            times_left_ms,
            current_team: Team::White,
            move_start: Instant::now(),
            is_first_move: true,
            current_job: None,
            on_time_end,
        };
        timer.measure(FIRST_MOVE_GRACE_MS);
        timer
    }

    fn measure(&mut self, delay_ms: i64) {
        let team = self.current_team;
        let callback = self.on_time_end.clone();
        let delay = Duration::from_millis(delay_ms.max(0) as u64);
        self.current_job = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            callback(team);
        }));
    }

    /// Called once a move by `current_team` has been validated. Cancels the
    /// pending expiry, charges the elapsed time, flips the active side,
    /// schedules the new side's expiry, and returns the time remaining for
    /// the side that just moved.
    pub fn next(&mut self) -> i64 {
        if let Some(job) = self.current_job.take() {
            job.abort();
        }

        let now = Instant::now();
        if self.is_first_move {
            self.is_first_move = false;
        } else {
            let elapsed_ms = now.duration_since(self.move_start).as_millis() as i64;
            *self.times_left_ms.get_mut(&self.current_team).unwrap() -= elapsed_ms;
        }

        let time_left = self.times_left_ms[&self.current_team];
        self.current_team = self.current_team.opposite();
        self.move_start = now;
        let next_delay = self.times_left_ms[&self.current_team];
        self.measure(next_delay);

        time_left
    }

    pub fn cancel(&mut self) {
        if let Some(job) = self.current_job.take() {
            job.abort();
        }
    }

    pub fn time_left_ms(&self, team: Team) -> i64 {
        self.times_left_ms[&team]
    }
}

impl Drop for GameTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Owns a live chess engine plus the clock, team assignment and draw-offer
/// state for one game. `running()` is true iff an engine is currently
/// installed.
pub struct GameRunner {
    pub game_type: Option<GameType>,
    engine: Option<ChessEngine>,
    teams: HashMap<String, (Arc<Player>, Team)>,
    timer: Option<GameTimer>,
    draw_offer: DrawOffer,
}

impl GameRunner {
    pub fn new() -> Self {
        Self {
            game_type: None,
            engine: None,
            teams: HashMap::new(),
            timer: None,
            draw_offer: DrawOffer::None,
        }
    }

    pub fn running(&self) -> bool {
        self.engine.is_some()
    }

    pub fn engine(&self) -> Option<&ChessEngine> {
        self.engine.as_ref()
    }

    pub fn team_of(&self, player: &Player) -> Option<Team> {
        self.teams.get(&player.nick).map(|(_, team)| *team)
    }

    pub fn player_of(&self, team: Team) -> Option<Arc<Player>> {
        self.teams
            .values()
            .find(|(_, t)| *t == team)
            .map(|(p, _)| p.clone())
    }

    pub fn opponent_of(&self, player: &Player) -> Option<Arc<Player>> {
        self.teams
            .values()
            .find(|(p, _)| p.nick != player.nick)
            .map(|(p, _)| p.clone())
    }

    /// Randomly assigns White/Black to the two players (coin flip), allocates
    /// a fresh engine, and starts the clock. `on_time_end` is invoked synchronously
    /// from the timer task when a side's clock reaches zero; callers
    /// typically `tokio::spawn` any async follow-up (Elo update, broadcast,
    /// room teardown) from inside it.
    pub fn start(
        &mut self,
        player1: Arc<Player>,
        player2: Arc<Player>,
        game_type: GameType,
        on_time_end: Arc<dyn Fn(Team) + Send + Sync>,
    ) {
        let white_is_player1 = coin_flip();
        let (white, black) = if white_is_player1 {
            (player1, player2)
        } else {
            (player2, player1)
        };

        self.teams.clear();
        self.teams
            .insert(white.nick.clone(), (white.clone(), Team::White));
        self.teams
            .insert(black.nick.clone(), (black.clone(), Team::Black));

        self.game_type = Some(game_type);
        self.engine = Some(ChessEngine::new());
        self.draw_offer = DrawOffer::None;
        self.timer = Some(GameTimer::new(game_type.total_time_ms(), on_time_end));
    }

    pub fn clean(&mut self) {
        if let Some(timer) = self.timer.as_mut() {
            timer.cancel();
        }
        self.engine = None;
        self.timer = None;
        self.teams.clear();
        self.draw_offer = DrawOffer::None;
    }

    pub fn offer_draw(&mut self, player: &Player) -> bool {
        let Some(team) = self.team_of(player) else {
            return false;
        };
        if self.draw_offer != DrawOffer::None {
            return false;
        }
        self.draw_offer = DrawOffer::OfferedBy(team);
        true
    }

    /// Only the side that did not offer may respond. `true` ends the game
    /// as a draw (caller classifies the `GameEndStatus`); `false` just
    /// clears the offer.
    pub fn respond_to_draw_offer(&mut self, player: &Player, accepted: bool) -> Option<bool> {
        let team = self.team_of(player)?;
        match self.draw_offer {
            DrawOffer::OfferedBy(offering_team) if offering_team != team => {
                self.draw_offer = DrawOffer::None;
                Some(accepted)
            }
            _ => None,
        }
    }

    fn clear_stale_offer(&mut self, mover_team: Team) {
        if let DrawOffer::OfferedBy(offering_team) = self.draw_offer {
            if offering_team != mover_team {
                self.draw_offer = DrawOffer::None;
            }
        }
    }

    /// Applies `mv` if `player` is to move and the move validates. Returns
    /// `Ok(Some(status))` on checkmate/tie (caller removes the room),
    /// `Ok(None)` with a `MoveStatus` on an ordinary move, or `Err(())` if
    /// the move was illegal or it isn't `player`'s turn.
    pub fn on_move(
        &mut self,
        player: &Player,
        mv: Move,
    ) -> Result<(Option<GameEndStatus>, MoveStatus), ()> {
        let team = self.team_of(player).ok_or(())?;
        let engine = self.engine.as_mut().ok_or(())?;
        if engine.side_to_move != team || !engine.validate_move(mv) {
            return Err(());
        }

        engine.process_move(mv);
        self.clear_stale_offer(team);

        let game_type = self.game_type.expect("running");
        let time_left = self.timer.as_mut().map(|t| t.next()).unwrap_or(0);

        if engine.is_checkmate() {
            let winner = self.player_of(team).expect("mover has a team");
            let loser = self.player_of(team.opposite()).expect("opponent has a team");
            return Ok((
                Some(GameEndStatus::win(winner, loser, game_type)),
                MoveStatus {
                    successful: true,
                    time_left,
                },
            ));
        }
        if engine.is_tie() {
            return Ok((
                Some(GameEndStatus::draw(game_type)),
                MoveStatus {
                    successful: true,
                    time_left,
                },
            ));
        }

        Ok((None, MoveStatus {
            successful: true,
            time_left,
        }))
    }

    pub fn on_surrender(&self, player: &Player) -> Option<GameEndStatus> {
        let game_type = self.game_type?;
        let loser = self.player_of(self.team_of(player)?)?;
        let winner = self.opponent_of(player)?;
        Some(GameEndStatus::win(winner, loser, game_type))
    }

    pub fn on_draw_claim(&self, player: &Player) -> Option<GameEndStatus> {
        let game_type = self.game_type?;
        let engine = self.engine.as_ref()?;
        self.team_of(player)?;
        if engine.can_claim_draw() {
            Some(GameEndStatus::draw(game_type))
        } else {
            None
        }
    }

    pub fn on_draw_accepted(&self) -> Option<GameEndStatus> {
        Some(GameEndStatus::draw(self.game_type?))
    }

    /// Determines the outcome when `team`'s clock has run out: the
    /// opponent wins unless they lack sufficient mating material, in which
    /// case the game is a draw.
    pub fn on_time_end(&self, team: Team) -> Option<GameEndStatus> {
        let game_type = self.game_type?;
        let engine = self.engine.as_ref()?;
        let opponent_team = team.opposite();
        debug!(?team, "clock expired");
        if engine.has_sufficient_material(opponent_team) {
            let winner = self.player_of(opponent_team)?;
            let loser = self.player_of(team)?;
            Some(GameEndStatus::win(winner, loser, game_type))
        } else {
            Some(GameEndStatus::draw(game_type))
        }
    }

    pub fn time_left_ms(&self, team: Team) -> Option<i64> {
        self.timer.as_ref().map(|t| t.time_left_ms(team))
    }
}

impl Default for GameRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "random")]
fn coin_flip() -> bool {
    thread_rng().gen_bool(0.5)
}

#[cfg(not(feature = "random"))]
fn coin_flip() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::Player;
    use std::collections::HashMap as StdHashMap;

    fn player(nick: &str) -> Arc<Player> {
        Arc::new(Player::new(nick.to_string(), StdHashMap::new()))
    }

    #[tokio::test]
    async fn starting_assigns_opposite_teams() {
        let mut runner = GameRunner::new();
        let p1 = player("p1");
        let p2 = player("p2");
        runner.start(p1.clone(), p2.clone(), GameType::Blitz, Arc::new(|_| {}));
        assert!(runner.running());
        assert_ne!(runner.team_of(&p1), runner.team_of(&p2));
        runner.clean();
        assert!(!runner.running());
    }

    #[tokio::test]
    async fn draw_offer_requires_the_other_side_to_respond() {
        let mut runner = GameRunner::new();
        let p1 = player("p1");
        let p2 = player("p2");
        runner.start(p1.clone(), p2.clone(), GameType::Blitz, Arc::new(|_| {}));

        assert!(runner.offer_draw(&p1));
        assert!(runner.respond_to_draw_offer(&p1, true).is_none());
        assert!(runner.respond_to_draw_offer(&p2, true).is_some());
    }
}
