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

//! Pieces, teams and the per-team piece groupings the engine enumerates
//! legal moves over.

use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};
use strum_macros::{Display, EnumIter};

use crate::geometry::{
    Vector2d, DOWN, DOWN_LEFT, DOWN_RIGHT, UP, UP_LEFT, UP_RIGHT,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize)]
pub enum Team {
    #[strum(serialize = "WHITE")]
    #[serde(rename = "WHITE")]
    White,
    #[strum(serialize = "BLACK")]
    #[serde(rename = "BLACK")]
    Black,
}

impl Team {
    #[inline]
    pub fn opposite(self) -> Team {
        match self {
            Team::White => Team::Black,
            Team::Black => Team::White,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum PieceType {
    Pawn = 1,
    Knight = 2,
    Bishop = 3,
    Rook = 4,
    Queen = 5,
    King = 6,
}

impl PieceType {
    /// Whether the piece slides arbitrarily far along its move vectors
    /// (bishop/rook/queen) rather than stepping a single square
    /// (knight/king) or depending on team (pawn).
    #[inline]
    pub fn is_slider(self) -> bool {
        matches!(self, PieceType::Bishop | PieceType::Rook | PieceType::Queen)
    }

    #[inline]
    pub fn attacks_on_line(self, diagonal: bool) -> bool {
        match self {
            PieceType::Queen => true,
            PieceType::Bishop => diagonal,
            PieceType::Rook => !diagonal,
            _ => false,
        }
    }
}

pub const KNIGHT_OFFSETS: [Vector2d; 8] = [
    Vector2d::new(-2, -1),
    Vector2d::new(-2, 1),
    Vector2d::new(-1, -2),
    Vector2d::new(-1, 2),
    Vector2d::new(1, -2),
    Vector2d::new(1, 2),
    Vector2d::new(2, -1),
    Vector2d::new(2, 1),
];

pub const BISHOP_DIRECTIONS: [Vector2d; 4] = [UP_RIGHT, DOWN_RIGHT, DOWN_LEFT, UP_LEFT];
pub const ROOK_DIRECTIONS: [Vector2d; 4] = [UP, RIGHT, DOWN, LEFT];
pub const QUEEN_DIRECTIONS: [Vector2d; 8] = [
    UP_RIGHT, DOWN_RIGHT, DOWN_LEFT, UP_LEFT, UP, RIGHT, DOWN, LEFT,
];

#[inline]
pub fn pawn_push_vector(team: Team) -> Vector2d {
    match team {
        Team::White => UP,
        Team::Black => DOWN,
    }
}

#[inline]
pub fn pawn_attack_vectors(team: Team) -> [Vector2d; 2] {
    match team {
        Team::White => [UP_LEFT, UP_RIGHT],
        Team::Black => [DOWN_LEFT, DOWN_RIGHT],
    }
}

/// A piece on the board. `position` and `has_moved` are mutated in place as
/// the board plays moves; the move-direction data for a given `kind` is
/// static and looked up by variant rather than stored per-instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub kind: PieceType,
    pub team: Team,
    pub position: Vector2d,
    pub has_moved: bool,
}

impl Piece {
    pub fn new(kind: PieceType, team: Team, position: Vector2d) -> Self {
        Self {
            kind,
            team,
            position,
            has_moved: false,
        }
    }

    pub fn move_to(&mut self, position: Vector2d) {
        self.position = position;
        self.has_moved = true;
    }
}

/// Per-team groupings of live pieces, maintained alongside the board's cell
/// map so the engine can enumerate "every piece of this team" in O(team)
/// rather than scanning all 64 squares.
#[derive(Debug, Clone, Default)]
pub struct PlayerPieceSet {
    pub pawns: Vec<Piece>,
    pub knights: Vec<Piece>,
    pub bishops: Vec<Piece>,
    pub rooks: Vec<Piece>,
    pub queens: Vec<Piece>,
    pub king: Option<Piece>,
}

impl PlayerPieceSet {
    pub fn add(&mut self, piece: Piece) {
        match piece.kind {
            PieceType::Pawn => self.pawns.push(piece),
            PieceType::Knight => self.knights.push(piece),
            PieceType::Bishop => self.bishops.push(piece),
            PieceType::Rook => self.rooks.push(piece),
            PieceType::Queen => self.queens.push(piece),
            PieceType::King => self.king = Some(piece),
        }
    }

    /// Removes the piece previously at `at` for the given kind. Panics if
    /// asked to remove a king: a team's king is replaced in place, never
    /// removed from the set.
    pub fn remove(&mut self, kind: PieceType, at: Vector2d) {
        let retain = |v: &mut Vec<Piece>| v.retain(|p| p.position != at);
        match kind {
            PieceType::Pawn => retain(&mut self.pawns),
            PieceType::Knight => retain(&mut self.knights),
            PieceType::Bishop => retain(&mut self.bishops),
            PieceType::Rook => retain(&mut self.rooks),
            PieceType::Queen => retain(&mut self.queens),
            PieceType::King => panic!("cannot remove the king from a piece set"),
        }
    }

    pub fn all(&self) -> Vec<Piece> {
        let mut pieces = Vec::with_capacity(16);
        pieces.extend(self.pawns.iter().copied());
        pieces.extend(self.knights.iter().copied());
        pieces.extend(self.bishops.iter().copied());
        pieces.extend(self.rooks.iter().copied());
        pieces.extend(self.queens.iter().copied());
        if let Some(king) = self.king {
            pieces.push(king);
        }
        pieces
    }

    pub fn has_only_king(&self) -> bool {
        self.pawns.is_empty()
            && self.knights.is_empty()
            && self.bishops.is_empty()
            && self.rooks.is_empty()
            && self.queens.is_empty()
    }

    pub fn has_only_king_and_knight(&self) -> bool {
        self.pawns.is_empty()
            && self.bishops.is_empty()
            && self.rooks.is_empty()
            && self.queens.is_empty()
            && self.knights.len() == 1
    }

    pub fn has_only_king_and_bishop(&self) -> bool {
        self.pawns.is_empty()
            && self.knights.is_empty()
            && self.rooks.is_empty()
            && self.queens.is_empty()
            && self.bishops.len() == 1
    }
}
