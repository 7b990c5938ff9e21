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

//! The error taxonomy the broker and room service classify failures into.
//!
//! Only [`AppError::InvalidRequest`] ever crosses the broker boundary as a
//! connection-closing error; [`AppError::AuthFailure`] closes the
//! connection too, but carries a JSON status payload instead of a bare
//! reason string. The other variants are handled entirely within the room
//! service and never reach the connection loop.

use thiserror::Error;

use crate::auth::AuthStatus;

#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed JSON, a missing/mistyped field, an unknown `code`, an
    /// out-of-board coordinate, or an unrecognized piece/game/move type.
    /// Propagation: close the offending connection with reason
    /// `"invalid request"`.
    #[error("invalid request")]
    InvalidRequest,

    /// Sign-up/sign-in failed validation or the store's uniqueness checks.
    /// Propagation: close the connection with a JSON status payload.
    #[error("auth failure: {0:?}")]
    AuthFailure(AuthStatus),

    /// Sender isn't in the state a handler requires (already in a room,
    /// room not owned by sender, guest absent, kicked, room full).
    /// Propagation: silently ignored, or a status code to the sender alone.
    #[error("precondition not met")]
    PreconditionNotMet,

    /// A send to one participant failed. Propagation: absorbed; the other
    /// participants still receive the broadcast, and the failed socket
    /// runs its own disconnect path independently.
    #[error("transient send failure")]
    TransientIo,
}

impl AppError {
    /// The close-frame reason carried for connection-terminating errors.
    /// `AuthFailure` additionally carries a JSON status payload; see
    /// [`crate::messages::auth_status_payload`].
    pub fn close_reason(&self) -> &'static str {
        match self {
            AppError::InvalidRequest => "invalid request",
            AppError::AuthFailure(_) => "auth failure",
            AppError::PreconditionNotMet | AppError::TransientIo => "",
        }
    }
}
