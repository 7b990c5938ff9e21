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

//! The three ranked time controls and their per-team clock allotments.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize)]
pub enum GameType {
    #[strum(serialize = "BLITZ")]
    #[serde(rename = "BLITZ")]
    Blitz,
    #[strum(serialize = "RAPID")]
    #[serde(rename = "RAPID")]
    Rapid,
    #[strum(serialize = "CLASSIC")]
    #[serde(rename = "CLASSIC")]
    Classic,
}

impl GameType {
    /// Per-team clock allotment in milliseconds.
    pub fn total_time_ms(self) -> i64 {
        match self {
            GameType::Blitz => 5 * 60 * 1000,
            GameType::Rapid => 30 * 60 * 1000,
            GameType::Classic => 2 * 60 * 60 * 1000,
        }
    }
}

pub const FIRST_MOVE_GRACE_MS: i64 = 30 * 1000;
