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

//! The stable numeric message codes and the client→server request shapes
//! they tag. Every frame is a JSON object carrying a mandatory `code`; the
//! remaining fields depend on which code it is, so parsing is two-staged:
//! read `code` out of a generic [`serde_json::Value`] first, then
//! deserialize the rest against the shape that code implies.

use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::auth::AuthStatus;
use crate::chess_move::Move;
use crate::errors::AppError;
use crate::game_type::GameType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(i32)]
pub enum MessageCode {
    SignUp = 0,
    SignIn = 1,
    JoinRankedQueue = 2,
    CancelJoiningRanked = 3,
    CreatePrivateRoom = 4,
    JoinPrivateRoom = 5,
    LeavePrivateRoom = 6,
    KickFromPrivateRoom = 7,
    StartPrivateGame = 8,
    GameSurrender = 9,
    GameOfferDraw = 10,
    GameRespondToDrawOffer = 11,
    GameClaimDraw = 12,
    GameMove = 13,
    JoinedRankedRoom = 14,
    PlayerDisconnected = 15,
    GameTimeEnd = 16,
}

/// A fully parsed, type-checked client request. Anonymous sessions may
/// only ever produce `SignUp`/`SignIn`; the broker enforces that before a
/// request reaches the authenticated dispatch table.
#[derive(Debug, Clone)]
pub enum ClientRequest {
    SignUp { nick: String, email: String, password: String },
    SignIn { email: String, password: String },
    JoinRankedQueue { game_type: GameType },
    CancelJoiningRanked,
    CreatePrivateRoom,
    JoinPrivateRoom { access_key: String },
    LeavePrivateRoom,
    KickFromPrivateRoom,
    StartPrivateGame { game_type: GameType },
    GameSurrender,
    GameOfferDraw,
    GameRespondToDrawOffer { accepted: bool },
    GameClaimDraw,
    GameMove { mv: Move },
}

#[derive(Deserialize)]
struct SignUpPayload {
    nick: String,
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct SignInPayload {
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct GameTypePayload {
    #[serde(rename = "gameType")]
    game_type: GameType,
}

#[derive(Deserialize)]
struct AccessKeyPayload {
    #[serde(rename = "accessKey")]
    access_key: String,
}

#[derive(Deserialize)]
struct RespondPayload {
    accepted: bool,
}

#[derive(Deserialize)]
struct MovePayload {
    #[serde(rename = "move")]
    mv: Move,
}

/// Parses a raw JSON frame into a [`ClientRequest`]. Any malformed shape —
/// missing/mistyped `code`, unknown code, or a payload that doesn't match
/// what that code requires — is `AppError::InvalidRequest`.
pub fn parse_client_request(raw: &str) -> Result<ClientRequest, AppError> {
    let value: serde_json::Value = serde_json::from_str(raw).map_err(|_| AppError::InvalidRequest)?;
    let code = value
        .get("code")
        .and_then(serde_json::Value::as_i64)
        .ok_or(AppError::InvalidRequest)?;

    match code {
        0 => {
            let p: SignUpPayload = serde_json::from_value(value).map_err(|_| AppError::InvalidRequest)?;
            Ok(ClientRequest::SignUp { nick: p.nick, email: p.email, password: p.password })
        }
        1 => {
            let p: SignInPayload = serde_json::from_value(value).map_err(|_| AppError::InvalidRequest)?;
            Ok(ClientRequest::SignIn { email: p.email, password: p.password })
        }
        2 => {
            let p: GameTypePayload = serde_json::from_value(value).map_err(|_| AppError::InvalidRequest)?;
            Ok(ClientRequest::JoinRankedQueue { game_type: p.game_type })
        }
        3 => Ok(ClientRequest::CancelJoiningRanked),
        4 => Ok(ClientRequest::CreatePrivateRoom),
        5 => {
            let p: AccessKeyPayload = serde_json::from_value(value).map_err(|_| AppError::InvalidRequest)?;
            if !crate::player::is_valid_access_key(&p.access_key) {
                return Err(AppError::InvalidRequest);
            }
            Ok(ClientRequest::JoinPrivateRoom { access_key: p.access_key })
        }
        6 => Ok(ClientRequest::LeavePrivateRoom),
        7 => Ok(ClientRequest::KickFromPrivateRoom),
        8 => {
            let p: GameTypePayload = serde_json::from_value(value).map_err(|_| AppError::InvalidRequest)?;
            Ok(ClientRequest::StartPrivateGame { game_type: p.game_type })
        }
        9 => Ok(ClientRequest::GameSurrender),
        10 => Ok(ClientRequest::GameOfferDraw),
        11 => {
            let p: RespondPayload = serde_json::from_value(value).map_err(|_| AppError::InvalidRequest)?;
            Ok(ClientRequest::GameRespondToDrawOffer { accepted: p.accepted })
        }
        12 => Ok(ClientRequest::GameClaimDraw),
        13 => {
            let p: MovePayload = serde_json::from_value(value).map_err(|_| AppError::InvalidRequest)?;
            Ok(ClientRequest::GameMove { mv: p.mv })
        }
        _ => Err(AppError::InvalidRequest),
    }
}

/// JSON payload describing a sign-up/sign-in outcome, sent as an ordinary
/// response on success and as the close-frame reason on failure.
pub fn auth_status_payload(code: MessageCode, status: AuthStatus) -> serde_json::Value {
    serde_json::json!({"code": code as i32, "status": format!("{status:?}")})
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sign_in_request() {
        let raw = r#"{"code":1,"email":"a@b.com","password":"hunter2x"}"#;
        match parse_client_request(raw).unwrap() {
            ClientRequest::SignIn { email, password } => {
                assert_eq!(email, "a@b.com");
                assert_eq!(password, "hunter2x");
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_code() {
        let raw = r#"{"code":999}"#;
        assert!(parse_client_request(raw).is_err());
    }

    #[test]
    fn rejects_missing_code() {
        let raw = r#"{"foo":1}"#;
        assert!(parse_client_request(raw).is_err());
    }

    #[test]
    fn rejects_malformed_access_key() {
        let raw = r#"{"code":5,"accessKey":"abcde"}"#;
        assert!(parse_client_request(raw).is_err());
    }

    #[test]
    fn parses_game_move_request() {
        let raw = r#"{"code":13,"move":{"type":1,"positionFrom":[4,1],"positionTo":[4,3]}}"#;
        match parse_client_request(raw).unwrap() {
            ClientRequest::GameMove { mv } => assert!(matches!(mv, Move::Normal { .. })),
            other => panic!("wrong variant: {other:?}"),
        }
    }
}
