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

//! Elo rating update applied to both participants of a ranked game.

const K_FACTOR: f64 = 30.0;

/// `score` is player1's result: `1.0` win, `0.5` draw, `0.0` loss. Returns
/// the signed delta applied to player1's rating; player2's delta is its
/// negation.
pub fn elo_delta(elo1: i32, elo2: i32, score: f64) -> i32 {
    let expected = 1.0 / (1.0 + 10f64.powf((elo2 - elo1) as f64 / 400.0));
    (K_FACTOR * (score - expected)).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn underdog_win_gains_more_than_half_k() {
        let delta = elo_delta(1000, 1240, 1.0);
        assert!(delta > 15);
    }

    #[test]
    fn favourite_loss_matches_literal_scenario() {
        // Player A (1000) loses to Player B (1240) at RAPID.
        let delta = elo_delta(1000, 1240, 0.0);
        assert_eq!(delta, -6);
    }

    #[test]
    fn equal_rated_draw_is_a_no_op() {
        assert_eq!(elo_delta(1200, 1200, 0.5), 0);
    }
}
