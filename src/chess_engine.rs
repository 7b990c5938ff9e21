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

//! Move legality, check detection, and the game-end and draw conditions
//! that sit on top of the board and move history.

use std::collections::HashSet;

use crate::chess_move::{Move, MoveHistory};
use crate::chessboard::{first_rank, Board, BoardSnapshot};
use crate::geometry::{
    is_between, same_line, same_line_3, unit_vector_to, Vector2d,
};
use crate::piece::{
    pawn_attack_vectors, pawn_push_vector, Piece, PieceType, Team, BISHOP_DIRECTIONS,
    KNIGHT_OFFSETS, QUEEN_DIRECTIONS, ROOK_DIRECTIONS,
};

#[derive(Debug, Clone, Default)]
pub struct CheckStatus {
    checkers: Vec<Piece>,
}

impl CheckStatus {
    pub fn checked(&self) -> bool {
        !self.checkers.is_empty()
    }

    pub fn double_checked(&self) -> bool {
        self.checkers.len() >= 2
    }

    pub fn checkers(&self) -> &[Piece] {
        &self.checkers
    }

    fn single_checker(&self) -> Option<Piece> {
        if self.checkers.len() == 1 {
            Some(self.checkers[0])
        } else {
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChessEngine {
    pub board: Board,
    pub history: MoveHistory,
    pub side_to_move: Team,
    pub check_status: CheckStatus,
}

impl ChessEngine {
    pub fn new() -> Self {
        let board = Board::standard_setup();
        let mut engine = Self {
            board,
            history: MoveHistory::new(),
            side_to_move: Team::White,
            check_status: CheckStatus::default(),
        };
        engine.check_status = CheckStatus {
            checkers: engine.checking_pieces(engine.side_to_move),
        };
        let snapshot = engine.snapshot();
        engine.history.record_snapshot(snapshot);
        engine
    }

    /// Builds an engine from an explicit position and a move history already
    /// played into it. Side-to-move is derived from the last move's mover;
    /// check status is recomputed from scratch.
    pub fn from_position(pieces: Vec<Piece>, history: MoveHistory) -> Self {
        let board = Board::from_pieces(pieces);
        let side_to_move = match history.last() {
            Some(mv) => {
                let mover = board.piece_at(mv.to());
                match mover {
                    Some(p) => p.team.opposite(),
                    None => Team::White,
                }
            }
            None => Team::White,
        };
        let mut engine = Self {
            board,
            history,
            side_to_move,
            check_status: CheckStatus::default(),
        };
        engine.check_status = CheckStatus {
            checkers: engine.checking_pieces(engine.side_to_move),
        };
        engine
    }

    fn king_square(&self, team: Team) -> Vector2d {
        self.board
            .set_of(team)
            .king
            .expect("a team always has a king on the board")
            .position
    }

    fn last_moving_piece(&self) -> Option<Piece> {
        self.history.last().and_then(|mv| self.board.piece_at(mv.to()))
    }

    /// Probes outward from `team`'s king as if it were each attacker type,
    /// collecting the pieces of the opposing team that currently give check.
    fn checking_pieces(&self, team: Team) -> Vec<Piece> {
        let king_sq = self.king_square(team);
        let opponent = team.opposite();
        let mut checkers = Vec::new();

        for offset in KNIGHT_OFFSETS {
            let sq = king_sq + offset;
            if sq.within_board() {
                if let Some(p) = self.board.piece_at(sq) {
                    if p.team == opponent && p.kind == PieceType::Knight {
                        checkers.push(p);
                    }
                }
            }
        }

        for attack_vector in pawn_attack_vectors(team) {
            let sq = king_sq + attack_vector;
            if sq.within_board() {
                if let Some(p) = self.board.piece_at(sq) {
                    if p.team == opponent && p.kind == PieceType::Pawn {
                        checkers.push(p);
                    }
                }
            }
        }

        for dir in BISHOP_DIRECTIONS {
            if let Some(p) = self.board.next_piece_on_line(king_sq, king_sq + dir) {
                if p.team == opponent && matches!(p.kind, PieceType::Bishop | PieceType::Queen) {
                    checkers.push(p);
                }
            }
        }

        for dir in ROOK_DIRECTIONS {
            if let Some(p) = self.board.next_piece_on_line(king_sq, king_sq + dir) {
                if p.team == opponent && matches!(p.kind, PieceType::Rook | PieceType::Queen) {
                    checkers.push(p);
                }
            }
        }

        checkers
    }

    /// True iff moving the piece at `from` to `to` would expose `team`'s
    /// king to a slider, i.e. `from` is pinned along the king's line of
    /// sight and `to` does not stay on that same line.
    fn will_move_reveal_king(&self, team: Team, from: Vector2d, to: Vector2d) -> bool {
        let king_sq = self.king_square(team);
        if from == king_sq || !same_line(king_sq, from) {
            return false;
        }
        if same_line_3(king_sq, from, to) {
            return false;
        }
        if self.board.any_piece_between(king_sq, from) {
            return false;
        }

        let dir = unit_vector_to(king_sq, from);
        let diagonal = dir.x != 0 && dir.y != 0;
        let mut sq = from + dir;
        while sq.within_board() {
            if let Some(p) = self.board.piece_at(sq) {
                if p.team != team {
                    let pins = p.kind == PieceType::Queen
                        || (diagonal && p.kind == PieceType::Bishop)
                        || (!diagonal && p.kind == PieceType::Rook);
                    return pins;
                }
                return false;
            }
            sq = sq + dir;
        }
        false
    }

    fn will_move_cover_king(&self, team: Team, to: Vector2d) -> bool {
        match self.check_status.single_checker() {
            Some(checker) if checker.kind != PieceType::Knight => {
                let king_sq = self.king_square(team);
                same_line_3(to, king_sq, checker.position) && is_between(to, king_sq, checker.position)
            }
            _ => false,
        }
    }

    fn will_capture_checking_piece(&self, to: Vector2d) -> bool {
        match self.check_status.single_checker() {
            Some(checker) => checker.position == to,
            None => false,
        }
    }

    /// Whether, while in single check, moving to `to` resolves it (by
    /// blocking or capturing the sole checker). Meaningless while not in
    /// check or double-checked; callers only consult this when
    /// `check_status.checked()` and not double-checked.
    fn resolves_check(&self, team: Team, to: Vector2d) -> bool {
        self.will_move_cover_king(team, to) || self.will_capture_checking_piece(to)
    }

    /// Union of squares the given team's pieces could move onto, with the
    /// opposing king treated as transparent so sliders see past it (this is
    /// the set king moves are filtered against, so a king cannot retreat
    /// along a ray it is currently blocking).
    fn attacked_squares(&self, by_team: Team, transparent_king: Vector2d) -> HashSet<Vector2d> {
        let mut squares = HashSet::new();
        let set = self.board.set_of(by_team);

        for pawn in &set.pawns {
            for v in pawn_attack_vectors(by_team) {
                let sq = pawn.position + v;
                if sq.within_board() {
                    squares.insert(sq);
                }
            }
        }

        for knight in &set.knights {
            for v in KNIGHT_OFFSETS {
                let sq = knight.position + v;
                if sq.within_board() {
                    squares.insert(sq);
                }
            }
        }
        if let Some(king) = set.king {
            for v in QUEEN_DIRECTIONS {
                let sq = king.position + v;
                if sq.within_board() {
                    squares.insert(sq);
                }
            }
        }

        for piece in set
            .bishops
            .iter()
            .chain(set.rooks.iter())
            .chain(set.queens.iter())
        {
            let dirs: &[Vector2d] = match piece.kind {
                PieceType::Bishop => &BISHOP_DIRECTIONS,
                PieceType::Rook => &ROOK_DIRECTIONS,
                _ => &QUEEN_DIRECTIONS,
            };
            for &dir in dirs {
                let mut sq = piece.position + dir;
                while sq.within_board() {
                    squares.insert(sq);
                    if sq == transparent_king {
                        sq = sq + dir;
                        continue;
                    }
                    if self.board.piece_at(sq).is_some() {
                        break;
                    }
                    sq = sq + dir;
                }
            }
        }

        squares
    }

    pub fn available_moves(&self, from: Vector2d) -> Vec<Move> {
        let piece = match self.board.piece_at(from) {
            Some(p) => p,
            None => return Vec::new(),
        };
        if piece.team != self.side_to_move {
            return Vec::new();
        }
        if self.check_status.double_checked() && piece.kind != PieceType::King {
            return Vec::new();
        }

        match piece.kind {
            PieceType::Pawn => self.pawn_moves(piece),
            PieceType::Knight => self.knight_moves(piece),
            PieceType::King => self.king_moves(piece),
            _ => self.slider_moves(piece),
        }
    }

    fn pawn_moves(&self, pawn: Piece) -> Vec<Move> {
        let mut moves = Vec::new();
        let team = pawn.team;
        let push = pawn_push_vector(team);
        let promotion_rank = first_rank(team.opposite());
        let small = pawn.position + push;

        if small.within_board()
            && !self.will_move_reveal_king(team, pawn.position, small)
            && self.board.piece_at(small).is_none()
        {
            if !self.check_status.checked() || self.resolves_check(team, small) {
                if small.y == promotion_rank {
                    moves.push(Move::Promotion {
                        from: pawn.position,
                        to: small,
                        piece_type: PieceType::Queen,
                    });
                } else {
                    moves.push(Move::Normal {
                        from: pawn.position,
                        to: small,
                    });
                }
            }

            let big = small + push;
            if !pawn.has_moved
                && big.within_board()
                && self.board.piece_at(big).is_none()
                && (!self.check_status.checked() || self.resolves_check(team, big))
            {
                moves.push(Move::Normal {
                    from: pawn.position,
                    to: big,
                });
            }
        }

        for attack_vector in pawn_attack_vectors(team) {
            let attack_pos = pawn.position + attack_vector;
            if !attack_pos.within_board() || self.will_move_reveal_king(team, pawn.position, attack_pos) {
                continue;
            }

            if let Some(target) = self.board.piece_at(attack_pos) {
                if target.team != team
                    && (!self.check_status.checked() || self.resolves_check(team, attack_pos))
                {
                    if attack_pos.y == promotion_rank {
                        moves.push(Move::PromotionWithCapture {
                            from: pawn.position,
                            to: attack_pos,
                            piece_type: PieceType::Queen,
                        });
                    } else {
                        moves.push(Move::Capture {
                            from: pawn.position,
                            to: attack_pos,
                        });
                    }
                }
            } else if let Some(last) = self.history.last() {
                if let Some(last_mover) = self.last_moving_piece() {
                    if last_mover.kind == PieceType::Pawn
                        && (last.from().y - last.to().y).abs() == 2
                        && last.to().x == attack_pos.x
                    {
                        let captured_position = last.to();
                        // The captured pawn sits on `pawn`'s rank, not the
                        // (empty) landing square, so resolving a check by
                        // capture is tested against that square too.
                        let resolves = self.will_move_cover_king(team, attack_pos)
                            || self.will_capture_checking_piece(captured_position);
                        if !self.check_status.checked() || resolves {
                            moves.push(Move::EnPassant {
                                from: pawn.position,
                                to: attack_pos,
                                captured_position,
                            });
                        }
                    }
                }
            }
        }

        moves
    }

    fn knight_moves(&self, knight: Piece) -> Vec<Move> {
        let mut moves = Vec::new();
        for offset in KNIGHT_OFFSETS {
            let to = knight.position + offset;
            if !to.within_board() {
                continue;
            }
            if self.will_move_reveal_king(knight.team, knight.position, to) {
                continue;
            }
            if self.check_status.checked() && !self.resolves_check(knight.team, to) {
                continue;
            }
            match self.board.piece_at(to) {
                Some(occupant) if occupant.team == knight.team => continue,
                Some(_) => moves.push(Move::Capture {
                    from: knight.position,
                    to,
                }),
                None => moves.push(Move::Normal {
                    from: knight.position,
                    to,
                }),
            }
        }
        moves
    }

    fn king_moves(&self, king: Piece) -> Vec<Move> {
        let mut moves = Vec::new();
        let attacked = self.attacked_squares(king.team.opposite(), king.position);

        for offset in QUEEN_DIRECTIONS {
            let to = king.position + offset;
            if !to.within_board() {
                continue;
            }
            if let Some(occupant) = self.board.piece_at(to) {
                if occupant.team == king.team {
                    continue;
                }
            }
            if attacked.contains(&to) {
                continue;
            }
            match self.board.piece_at(to) {
                Some(_) => moves.push(Move::Capture {
                    from: king.position,
                    to,
                }),
                None => moves.push(Move::Normal {
                    from: king.position,
                    to,
                }),
            }
        }

        if king.has_moved || self.check_status.checked() {
            return moves;
        }

        for rook in self.board.set_of(king.team).rooks.clone() {
            if rook.has_moved || self.board.any_piece_between(king.position, rook.position) {
                continue;
            }
            let unit = unit_vector_to(king.position, rook.position);
            let new_rook_pos = king.position + unit;
            let new_king_pos = king.position + unit * 2;
            if attacked.contains(&new_rook_pos) || attacked.contains(&new_king_pos) {
                continue;
            }
            moves.push(Move::Castling {
                from: king.position,
                to: new_king_pos,
                rook_from: rook.position,
                rook_to: new_rook_pos,
            });
        }

        moves
    }

    fn slider_moves(&self, piece: Piece) -> Vec<Move> {
        let mut moves = Vec::new();
        let dirs: &[Vector2d] = match piece.kind {
            PieceType::Bishop => &BISHOP_DIRECTIONS,
            PieceType::Rook => &ROOK_DIRECTIONS,
            _ => &QUEEN_DIRECTIONS,
        };

        for &dir in dirs {
            let first = piece.position + dir;
            if !first.within_board()
                || self.will_move_reveal_king(piece.team, piece.position, first)
            {
                continue;
            }

            let mut to = first;
            while to.within_board() {
                if self.check_status.checked() && !self.resolves_check(piece.team, to) {
                    to = to + dir;
                    continue;
                }

                match self.board.piece_at(to) {
                    Some(occupant) => {
                        if occupant.team != piece.team {
                            moves.push(Move::Capture {
                                from: piece.position,
                                to,
                            });
                        }
                        break;
                    }
                    None => {
                        moves.push(Move::Normal {
                            from: piece.position,
                            to,
                        });
                        to = to + dir;
                    }
                }
            }
        }

        moves
    }

    fn snapshot(&self) -> BoardSnapshot {
        let en_passant_available = self.board.set_of(self.side_to_move).pawns.iter().any(|p| {
            self.available_moves(p.position)
                .iter()
                .any(|mv| matches!(mv, Move::EnPassant { .. }))
        });
        BoardSnapshot::capture(&self.board, self.side_to_move, en_passant_available)
    }

    /// Applies `mv` to the board, flips the side to move, appends it to the
    /// history, and recomputes check status. Assumes `mv` is legal; callers
    /// should gate on `validate_move` first.
    pub fn process_move(&mut self, mv: Move) {
        let mover_kind = self.board.piece_at(mv.from()).map(|p| p.kind);

        match mv {
            Move::Capture { to, .. } => {
                self.board.remove_piece(to);
                self.board.make_move(mv.from(), to);
            }
            Move::Castling {
                from,
                to,
                rook_from,
                rook_to,
            } => {
                self.board.make_move(from, to);
                self.board.make_move(rook_from, rook_to);
            }
            Move::EnPassant {
                from,
                to,
                captured_position,
            } => {
                self.board.remove_piece(captured_position);
                self.board.make_move(from, to);
            }
            Move::Promotion {
                from,
                to,
                piece_type,
            } => {
                let team = self.side_to_move;
                self.board.remove_piece(from);
                let mut piece = Piece::new(piece_type, team, to);
                piece.has_moved = true;
                self.board.set_piece(piece);
            }
            Move::PromotionWithCapture {
                from,
                to,
                piece_type,
            } => {
                let team = self.side_to_move;
                self.board.remove_piece(to);
                self.board.remove_piece(from);
                let mut piece = Piece::new(piece_type, team, to);
                piece.has_moved = true;
                self.board.set_piece(piece);
            }
            Move::Normal { from, to } => {
                self.board.make_move(from, to);
            }
        }

        self.side_to_move = self.side_to_move.opposite();
        self.history
            .record_move(mv, mover_kind == Some(PieceType::Pawn));
        let snapshot = self.snapshot();
        self.history.record_snapshot(snapshot);
        self.check_status = CheckStatus {
            checkers: self.checking_pieces(self.side_to_move),
        };
    }

    pub fn validate_move(&self, mv: Move) -> bool {
        self.available_moves(mv.from()).contains(&mv)
    }

    pub fn is_checkmate(&self) -> bool {
        if self.check_status.double_checked() {
            return self.available_moves(self.king_square(self.side_to_move)).is_empty();
        }
        if self.check_status.checked() {
            return !self
                .board
                .set_of(self.side_to_move)
                .all()
                .iter()
                .any(|p| !self.available_moves(p.position).is_empty());
        }
        false
    }

    pub fn is_stalemate(&self) -> bool {
        !self.check_status.checked()
            && !self
                .board
                .set_of(self.side_to_move)
                .all()
                .iter()
                .any(|p| !self.available_moves(p.position).is_empty())
    }

    pub fn is_tie(&self) -> bool {
        (!self.has_sufficient_material(Team::White) && !self.has_sufficient_material(Team::Black))
            || self.history.repeated_five_times()
    }

    pub fn can_claim_draw(&self) -> bool {
        self.history.repeated_three_times() || self.history.fifty_moves_rule_satisfied()
    }

    pub fn has_sufficient_material(&self, team: Team) -> bool {
        let pieces = self.board.set_of(team);
        let opposite = self.board.set_of(team.opposite());
        let pieces_len = pieces.all().len();

        if pieces_len == 1 {
            return false;
        }
        if pieces_len == 2 {
            if pieces.has_only_king_and_knight() {
                return false;
            }
            if pieces.has_only_king_and_bishop()
                && opposite.has_only_king_and_bishop()
                && pieces.bishops[0]
                    .position
                    .same_square_color(opposite.bishops[0].position)
            {
                return false;
            }
        }

        true
    }
}

impl Default for ChessEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply_sequence(engine: &mut ChessEngine, moves: &[Move]) {
        for &mv in moves {
            assert!(engine.validate_move(mv), "move {:?} should be legal", mv);
            engine.process_move(mv);
        }
    }

    #[test]
    fn fresh_engine_has_thirty_two_pieces_and_white_to_move() {
        let engine = ChessEngine::new();
        assert_eq!(engine.side_to_move, Team::White);
        assert!(!engine.check_status.checked());
        assert_eq!(engine.board.white.all().len(), 16);
    }

    #[test]
    fn fools_mate_ends_in_checkmate_for_black() {
        let mut engine = ChessEngine::new();
        let moves = [
            Move::Normal {
                from: Vector2d::new(5, 1),
                to: Vector2d::new(5, 2),
            },
            Move::Normal {
                from: Vector2d::new(4, 6),
                to: Vector2d::new(4, 4),
            },
            Move::Normal {
                from: Vector2d::new(6, 1),
                to: Vector2d::new(6, 3),
            },
            Move::Normal {
                from: Vector2d::new(3, 7),
                to: Vector2d::new(7, 3),
            },
        ];
        apply_sequence(&mut engine, &moves);

        assert!(engine.is_checkmate());
        assert!(engine
            .available_moves(Vector2d::new(4, 0))
            .is_empty());
    }

    #[test]
    fn pawn_cannot_move_if_pinned_along_file() {
        // King e1, white pawn e2, black rook e8: the pawn may push but not
        // step off the file.
        let pieces = vec![
            Piece::new(PieceType::King, Team::White, Vector2d::new(4, 0)),
            Piece::new(PieceType::Pawn, Team::White, Vector2d::new(4, 1)),
            Piece::new(PieceType::Rook, Team::Black, Vector2d::new(4, 7)),
            Piece::new(PieceType::King, Team::Black, Vector2d::new(0, 7)),
        ];
        let engine = ChessEngine::from_position(pieces, MoveHistory::new());
        let moves = engine.available_moves(Vector2d::new(4, 1));
        assert!(moves.iter().all(|m| m.to().x == 4));
    }

    #[test]
    fn en_passant_is_available_immediately_after_double_step() {
        let mut engine = ChessEngine::new();
        apply_sequence(
            &mut engine,
            &[
                Move::Normal {
                    from: Vector2d::new(4, 1),
                    to: Vector2d::new(4, 3),
                },
                Move::Normal {
                    from: Vector2d::new(0, 6),
                    to: Vector2d::new(0, 5),
                },
                Move::Normal {
                    from: Vector2d::new(4, 3),
                    to: Vector2d::new(4, 4),
                },
                Move::Normal {
                    from: Vector2d::new(3, 6),
                    to: Vector2d::new(3, 4),
                },
            ],
        );
        let moves = engine.available_moves(Vector2d::new(4, 4));
        assert!(moves.iter().any(|m| matches!(m, Move::EnPassant { .. })));
    }

    #[test]
    fn en_passant_can_resolve_a_check_from_the_double_stepped_pawn() {
        // Black's e7-e5 double step lands the pawn diagonally adjacent to
        // the white king, giving check; white's only way out is to capture
        // it en passant with the d5 pawn.
        let mut history = MoveHistory::new();
        history.record_move(
            Move::Normal {
                from: Vector2d::new(4, 6),
                to: Vector2d::new(4, 4),
            },
            true,
        );
        let mut black_pawn = Piece::new(PieceType::Pawn, Team::Black, Vector2d::new(4, 4));
        black_pawn.has_moved = true;
        let pieces = vec![
            Piece::new(PieceType::King, Team::White, Vector2d::new(3, 3)),
            Piece::new(PieceType::Pawn, Team::White, Vector2d::new(3, 4)),
            black_pawn,
            Piece::new(PieceType::King, Team::Black, Vector2d::new(0, 7)),
        ];
        let engine = ChessEngine::from_position(pieces, history);
        assert!(engine.check_status.checked());

        let moves = engine.available_moves(Vector2d::new(3, 4));
        assert!(moves.iter().any(|m| matches!(
            m,
            Move::EnPassant { captured_position, .. } if *captured_position == Vector2d::new(4, 4)
        )));
    }

    #[test]
    fn insufficient_material_king_vs_king() {
        let pieces = vec![
            Piece::new(PieceType::King, Team::White, Vector2d::new(4, 0)),
            Piece::new(PieceType::King, Team::Black, Vector2d::new(4, 7)),
        ];
        let engine = ChessEngine::from_position(pieces, MoveHistory::new());
        assert!(!engine.has_sufficient_material(Team::White));
        assert!(!engine.has_sufficient_material(Team::Black));
        assert!(engine.is_tie());
    }

    #[test]
    fn same_color_bishops_are_insufficient_material() {
        let pieces = vec![
            Piece::new(PieceType::King, Team::White, Vector2d::new(4, 0)),
            Piece::new(PieceType::Bishop, Team::White, Vector2d::new(2, 0)),
            Piece::new(PieceType::King, Team::Black, Vector2d::new(4, 7)),
            Piece::new(PieceType::Bishop, Team::Black, Vector2d::new(2, 7)),
        ];
        let engine = ChessEngine::from_position(pieces, MoveHistory::new());
        assert!(!engine.has_sufficient_material(Team::White));
    }
}
