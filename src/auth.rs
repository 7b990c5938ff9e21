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

//! Sign-up and sign-in, independent of the transport that carries them.

use std::sync::Arc;

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use crate::player::{is_valid_email, is_valid_nick, is_valid_password, PlayerModel, PlayerStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    Ok,
    EmailExists,
    NickExists,
    EmailNotFound,
    WrongPassword,
    InvalidNick,
    InvalidEmail,
    InvalidPassword,
}

pub struct AuthService {
    store: Arc<dyn PlayerStore>,
}

impl AuthService {
    pub fn new(store: Arc<dyn PlayerStore>) -> Self {
        Self { store }
    }

    pub async fn sign_up(&self, nick: &str, email: &str, password: &str) -> AuthStatus {
        if !is_valid_nick(nick) {
            return AuthStatus::InvalidNick;
        }
        if !is_valid_email(email) {
            return AuthStatus::InvalidEmail;
        }
        if !is_valid_password(password) {
            return AuthStatus::InvalidPassword;
        }
        if self.store.exists_by_nick(nick).await {
            return AuthStatus::NickExists;
        }
        if self.store.exists_by_email(email).await {
            return AuthStatus::EmailExists;
        }

        let hash = hash_password(password);
        match self
            .store
            .insert(PlayerModel::new(nick.to_string(), email.to_string(), hash))
            .await
        {
            Ok(()) => AuthStatus::Ok,
            Err(_) => AuthStatus::EmailExists,
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> (AuthStatus, Option<PlayerModel>) {
        let Some(model) = self.store.find_by_email(email).await else {
            return (AuthStatus::EmailNotFound, None);
        };
        if verify_password(password, &model.password_hash) {
            (AuthStatus::Ok, Some(model))
        } else {
            (AuthStatus::WrongPassword, None)
        }
    }
}

fn hash_password(password: &str) -> String {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .expect("argon2 hashing never fails for well-formed input")
        .to_string()
}

fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::InMemoryPlayerStore;

    fn service() -> AuthService {
        AuthService::new(Arc::new(InMemoryPlayerStore::new()))
    }

    #[tokio::test]
    async fn sign_up_then_sign_in_round_trips() {
        let auth = service();
        assert_eq!(
            auth.sign_up("newplayer", "new@player.com", "hunter2x").await,
            AuthStatus::Ok
        );
        let (status, model) = auth.sign_in("new@player.com", "hunter2x").await;
        assert_eq!(status, AuthStatus::Ok);
        assert_eq!(model.unwrap().nick, "newplayer");
    }

    #[tokio::test]
    async fn sign_in_with_wrong_password_is_rejected() {
        let auth = service();
        auth.sign_up("newplayer", "new@player.com", "hunter2x").await;
        let (status, _) = auth.sign_in("new@player.com", "wrongpass").await;
        assert_eq!(status, AuthStatus::WrongPassword);
    }

    #[tokio::test]
    async fn sign_up_rejects_duplicate_nick_and_email() {
        let auth = service();
        auth.sign_up("newplayer", "new@player.com", "hunter2x").await;
        assert_eq!(
            auth.sign_up("newplayer", "other@player.com", "hunter2x").await,
            AuthStatus::NickExists
        );
        assert_eq!(
            auth.sign_up("another", "new@player.com", "hunter2x").await,
            AuthStatus::EmailExists
        );
    }

    #[tokio::test]
    async fn sign_up_rejects_malformed_input() {
        let auth = service();
        assert_eq!(
            auth.sign_up("ab", "new@player.com", "hunter2x").await,
            AuthStatus::InvalidNick
        );
        assert_eq!(
            auth.sign_up("newplayer", "not-an-email", "hunter2x").await,
            AuthStatus::InvalidEmail
        );
        assert_eq!(
            auth.sign_up("newplayer", "new@player.com", "short").await,
            AuthStatus::InvalidPassword
        );
    }
}
