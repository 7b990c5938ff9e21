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

//! Server core for an online chess service: rules engine, per-game clock
//! and draw-offer state machine, ranked matchmaking, private rooms, and
//! the WebSocket broker tying a connection to an authenticated player.

pub mod auth;
pub mod broker;
pub mod chess_engine;
pub mod chess_move;
pub mod chessboard;
pub mod config;
pub mod elo;
pub mod errors;
pub mod game_runner;
pub mod game_type;
pub mod geometry;
pub mod matchmaking;
pub mod messages;
pub mod piece;
pub mod player;
pub mod room;
pub mod room_service;
