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

//! 8-by-8 coordinate geometry: a signed `Vector2d`, the eight unit
//! directions, and the line/diagonal predicates the chess engine builds on.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::ops::{Add, Div, Mul, Neg, Sub};

/// A signed board coordinate. Positions actually placed on a board satisfy
/// `0 <= x < 8 && 0 <= y < 8`, but the type itself is unconstrained so that
/// offsets and direction arithmetic stay simple additions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Vector2d {
    pub x: i32,
    pub y: i32,
}

/// The external interface encodes positions as a two-element `[x, y]` array
/// rather than an `{x, y}` object, so `Vector2d`'s wire shape is hand-written
/// against that instead of derived.
impl Serialize for Vector2d {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        [self.x, self.y].serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Vector2d {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let [x, y] = <[i32; 2]>::deserialize(deserializer)?;
        if !(0..8).contains(&x) || !(0..8).contains(&y) {
            return Err(D::Error::custom(format!("position [{x}, {y}] out of board bounds")));
        }
        Ok(Vector2d::new(x, y))
    }
}

impl Vector2d {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn within_board(self) -> bool {
        (0..8).contains(&self.x) && (0..8).contains(&self.y)
    }

    /// Chess board coloring convention: (0,0) is a dark square, and squares
    /// alternate color with each step in x or y.
    #[inline]
    pub fn same_square_color(self, other: Vector2d) -> bool {
        (self.x + self.y).rem_euclid(2) == (other.x + other.y).rem_euclid(2)
    }
}

impl Add for Vector2d {
    type Output = Vector2d;
    fn add(self, rhs: Vector2d) -> Vector2d {
        Vector2d::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vector2d {
    type Output = Vector2d;
    fn sub(self, rhs: Vector2d) -> Vector2d {
        Vector2d::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Vector2d {
    type Output = Vector2d;
    fn neg(self) -> Vector2d {
        Vector2d::new(-self.x, -self.y)
    }
}

impl Mul<i32> for Vector2d {
    type Output = Vector2d;
    fn mul(self, rhs: i32) -> Vector2d {
        Vector2d::new(self.x * rhs, self.y * rhs)
    }
}

/// Floor division, as used by `unit_vector_to` when dividing a displacement
/// by its (always positive) Chebyshev distance.
impl Div<i32> for Vector2d {
    type Output = Vector2d;
    fn div(self, rhs: i32) -> Vector2d {
        Vector2d::new(self.x / rhs, self.y / rhs)
    }
}

pub const UP: Vector2d = Vector2d::new(0, 1);
pub const DOWN: Vector2d = Vector2d::new(0, -1);
pub const LEFT: Vector2d = Vector2d::new(-1, 0);
pub const RIGHT: Vector2d = Vector2d::new(1, 0);
pub const UP_LEFT: Vector2d = Vector2d::new(-1, 1);
pub const UP_RIGHT: Vector2d = Vector2d::new(1, 1);
pub const DOWN_LEFT: Vector2d = Vector2d::new(-1, -1);
pub const DOWN_RIGHT: Vector2d = Vector2d::new(1, -1);

pub const DIRECTIONS_8: [Vector2d; 8] = [
    UP, DOWN, LEFT, RIGHT, UP_LEFT, UP_RIGHT, DOWN_LEFT, DOWN_RIGHT,
];

#[inline]
pub fn same_file(a: Vector2d, b: Vector2d) -> bool {
    a.x == b.x
}

#[inline]
pub fn same_rank(a: Vector2d, b: Vector2d) -> bool {
    a.y == b.y
}

/// Right-up diagonal: greater x pairs with greater y.
#[inline]
fn same_right_up_diagonal(a: Vector2d, b: Vector2d) -> bool {
    a.x - b.x == a.y - b.y
}

/// Left-down diagonal: greater x pairs with lower y.
#[inline]
fn same_left_down_diagonal(a: Vector2d, b: Vector2d) -> bool {
    a.x - b.x == b.y - a.y
}

#[inline]
pub fn same_diagonal(a: Vector2d, b: Vector2d) -> bool {
    same_right_up_diagonal(a, b) || same_left_down_diagonal(a, b)
}

#[inline]
pub fn same_row(a: Vector2d, b: Vector2d) -> bool {
    same_file(a, b) || same_rank(a, b)
}

#[inline]
pub fn same_line(a: Vector2d, b: Vector2d) -> bool {
    same_row(a, b) || same_diagonal(a, b)
}

/// Three-point variant: true iff all three points share the same *kind* of
/// line (all on one file, all on one rank, or all on one of the two
/// diagonal families).
pub fn same_line_3(a: Vector2d, b: Vector2d, c: Vector2d) -> bool {
    (same_file(a, b) && same_file(a, c))
        || (same_rank(a, b) && same_rank(a, c))
        || (same_right_up_diagonal(a, b) && same_right_up_diagonal(a, c))
        || (same_left_down_diagonal(a, b) && same_left_down_diagonal(a, c))
}

/// Chebyshev step count between two colinear points.
pub fn distance(a: Vector2d, b: Vector2d) -> i32 {
    if same_file(a, b) {
        (a.y - b.y).abs()
    } else {
        (a.x - b.x).abs()
    }
}

/// True iff `pos` lies strictly between `other_1` and `other_2` on their
/// shared line. Assumes the three points are colinear.
pub fn is_between(pos: Vector2d, other_1: Vector2d, other_2: Vector2d) -> bool {
    let span = distance(other_1, other_2);
    distance(pos, other_1) < span && distance(pos, other_2) < span
}

/// Unit vector pointing from `a` towards `b`. Assumes `a` and `b` are
/// colinear and distinct.
pub fn unit_vector_to(a: Vector2d, b: Vector2d) -> Vector2d {
    (b - a) / distance(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagonal_detection_matches_both_families() {
        assert!(same_diagonal(Vector2d::new(2, 2), Vector2d::new(5, 5)));
        assert!(same_diagonal(Vector2d::new(2, 5), Vector2d::new(5, 2)));
        assert!(!same_diagonal(Vector2d::new(2, 2), Vector2d::new(5, 6)));
    }

    #[test]
    fn is_between_checks_strict_containment() {
        let a = Vector2d::new(0, 0);
        let b = Vector2d::new(0, 7);
        let mid = Vector2d::new(0, 3);
        assert!(is_between(mid, a, b));
        assert!(!is_between(a, a, b));
        assert!(!is_between(b, a, b));
    }

    #[test]
    fn unit_vector_to_points_toward_target() {
        assert_eq!(
            unit_vector_to(Vector2d::new(0, 0), Vector2d::new(0, 5)),
            UP
        );
        assert_eq!(
            unit_vector_to(Vector2d::new(4, 4), Vector2d::new(1, 1)),
            DOWN_LEFT
        );
    }

    #[test]
    fn same_square_color_alternates() {
        let a = Vector2d::new(0, 0);
        let b = Vector2d::new(1, 0);
        let c = Vector2d::new(2, 0);
        assert!(!a.same_square_color(b));
        assert!(a.same_square_color(c));
    }
}
