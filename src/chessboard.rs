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

//! The 8-by-8 cell map plus the per-team piece sets kept in sync with it,
//! and the canonical snapshot used for repetition detection.

use std::collections::HashMap;

use crate::geometry::{unit_vector_to, Vector2d};
use crate::piece::{Piece, PieceType, PlayerPieceSet, Team};

/// First rank (0-indexed) each team's pieces start on. Black's value is 7,
/// not 8: the board's own `within_board` invariant requires `0 <= y < 8`.
pub fn first_rank(team: Team) -> i32 {
    match team {
        Team::White => 0,
        Team::Black => 7,
    }
}

/// Rank a team's pawns start on before their first push.
pub fn second_rank(team: Team) -> i32 {
    match team {
        Team::White => 1,
        Team::Black => 6,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum CastleRights {
    None,
    Short,
    Long,
    Both,
}

#[derive(Debug, Clone)]
pub struct Board {
    fields: HashMap<Vector2d, Option<Piece>>,
    pub white: PlayerPieceSet,
    pub black: PlayerPieceSet,
}

impl Board {
    pub fn empty() -> Self {
        let mut fields = HashMap::with_capacity(64);
        for x in 0..8 {
            for y in 0..8 {
                fields.insert(Vector2d::new(x, y), None);
            }
        }
        Self {
            fields,
            white: PlayerPieceSet::default(),
            black: PlayerPieceSet::default(),
        }
    }

    pub fn from_pieces(pieces: Vec<Piece>) -> Self {
        let mut board = Self::empty();
        for piece in pieces {
            board.set_piece(piece);
        }
        board
    }

    pub fn standard_setup() -> Self {
        let mut pieces = Vec::with_capacity(32);
        for team in [Team::White, Team::Black] {
            let back = first_rank(team);
            let pawn_rank = second_rank(team);
            let order = [
                PieceType::Rook,
                PieceType::Knight,
                PieceType::Bishop,
                PieceType::Queen,
                PieceType::King,
                PieceType::Bishop,
                PieceType::Knight,
                PieceType::Rook,
            ];
            for (x, kind) in order.into_iter().enumerate() {
                pieces.push(Piece::new(kind, team, Vector2d::new(x as i32, back)));
            }
            for x in 0..8 {
                pieces.push(Piece::new(
                    PieceType::Pawn,
                    team,
                    Vector2d::new(x, pawn_rank),
                ));
            }
        }
        Self::from_pieces(pieces)
    }

    pub fn piece_at(&self, position: Vector2d) -> Option<Piece> {
        self.fields.get(&position).copied().flatten()
    }

    fn set_of_mut(&mut self, team: Team) -> &mut PlayerPieceSet {
        match team {
            Team::White => &mut self.white,
            Team::Black => &mut self.black,
        }
    }

    pub fn set_of(&self, team: Team) -> &PlayerPieceSet {
        match team {
            Team::White => &self.white,
            Team::Black => &self.black,
        }
    }

    pub fn set_piece(&mut self, piece: Piece) {
        self.fields.insert(piece.position, Some(piece));
        self.set_of_mut(piece.team).add(piece);
    }

    pub fn remove_piece(&mut self, position: Vector2d) {
        if let Some(piece) = self.piece_at(position) {
            self.fields.insert(position, None);
            self.set_of_mut(piece.team).remove(piece.kind, position);
        }
    }

    /// Moves whatever piece occupies `from` to `to`, updating `has_moved`
    /// and the piece set in lockstep with the cell map. Does not remove a
    /// piece that may already occupy `to` — callers capture first.
    pub fn make_move(&mut self, from: Vector2d, to: Vector2d) {
        if let Some(mut piece) = self.piece_at(from) {
            self.fields.insert(from, None);
            let set = self.set_of_mut(piece.team);
            set.remove(piece.kind, from);
            piece.move_to(to);
            self.fields.insert(to, Some(piece));
            set.add(piece);
        }
    }

    /// Assumes `a` and `b` share a line. Walks unit steps strictly between
    /// them.
    pub fn any_piece_between(&self, a: Vector2d, b: Vector2d) -> bool {
        let step = unit_vector_to(a, b);
        let mut pos = a + step;
        while pos != b {
            if self.piece_at(pos).is_some() {
                return true;
            }
            pos = pos + step;
        }
        false
    }

    /// Assumes `from` and `toward` share a line. Walks unit steps from
    /// `from` in the direction of `toward` until a piece is found or the
    /// ray leaves the board.
    pub fn next_piece_on_line(&self, from: Vector2d, toward: Vector2d) -> Option<Piece> {
        let step = unit_vector_to(from, toward);
        let mut pos = from + step;
        while pos.within_board() {
            if let Some(piece) = self.piece_at(pos) {
                return Some(piece);
            }
            pos = pos + step;
        }
        None
    }

    /// Computes a team's castling rights purely from board state: an
    /// unmoved king and an unmoved rook on its home square, derived from
    /// fixed squares rather than tracked via separate flags.
    pub fn castle_rights(&self, team: Team) -> CastleRights {
        let back = first_rank(team);
        let king_sq = Vector2d::new(4, back);
        let king_unmoved = matches!(
            self.piece_at(king_sq),
            Some(Piece { kind: PieceType::King, has_moved: false, .. })
        );
        if !king_unmoved {
            return CastleRights::None;
        }
        let rook_unmoved = |x| {
            matches!(
                self.piece_at(Vector2d::new(x, back)),
                Some(Piece { kind: PieceType::Rook, has_moved: false, .. })
            )
        };
        let short = rook_unmoved(7);
        let long = rook_unmoved(0);
        match (short, long) {
            (true, true) => CastleRights::Both,
            (true, false) => CastleRights::Short,
            (false, true) => CastleRights::Long,
            (false, false) => CastleRights::None,
        }
    }
}

pub fn within_board(position: Vector2d) -> bool {
    position.within_board()
}

/// A canonicalized description of a complete game state, used as the key
/// for threefold/fivefold repetition counting. Two snapshots are equal iff
/// all four components are equal; the placement vector is sorted by
/// position so hashing is independent of board iteration order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BoardSnapshot {
    placement: Vec<(Vector2d, Piece)>,
    pub side_to_move: Team,
    pub white_castle_rights: CastleRights,
    pub black_castle_rights: CastleRights,
    pub en_passant_available: bool,
}

impl BoardSnapshot {
    pub fn capture(board: &Board, side_to_move: Team, en_passant_available: bool) -> Self {
        let mut placement: Vec<(Vector2d, Piece)> = (0..8)
            .flat_map(|x| (0..8).map(move |y| Vector2d::new(x, y)))
            .filter_map(|pos| board.piece_at(pos).map(|p| (pos, p)))
            .collect();
        placement.sort_by_key(|(pos, _)| (pos.x, pos.y));
        Self {
            placement,
            side_to_move,
            white_castle_rights: board.castle_rights(Team::White),
            black_castle_rights: board.castle_rights(Team::Black),
            en_passant_available,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_setup_places_32_pieces() {
        let board = Board::standard_setup();
        assert_eq!(board.white.all().len(), 16);
        assert_eq!(board.black.all().len(), 16);
        assert!(board.white.king.is_some());
        assert!(board.black.king.is_some());
    }

    #[test]
    fn snapshot_ignores_placement_iteration_order() {
        let board = Board::standard_setup();
        let a = BoardSnapshot::capture(&board, Team::White, false);
        let b = BoardSnapshot::capture(&board, Team::White, false);
        assert_eq!(a, b);
    }

    #[test]
    fn castle_rights_both_on_fresh_board() {
        let board = Board::standard_setup();
        assert_eq!(board.castle_rights(Team::White), CastleRights::Both);
        assert_eq!(board.castle_rights(Team::Black), CastleRights::Both);
    }

    #[test]
    fn moving_rook_drops_that_side_rights() {
        let mut board = Board::standard_setup();
        board.make_move(Vector2d::new(0, 0), Vector2d::new(0, 3));
        assert_eq!(board.castle_rights(Team::White), CastleRights::Short);
    }
}
