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

//! Runtime configuration, loaded from the environment rather than a config
//! file — the on-disk *format* is out of scope for this core, not
//! configuration itself.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: String,
    pub port: u16,
    pub unauth_reap_interval: Duration,
    pub unauth_reap_after: Duration,
    pub matchmaking_sweep_interval: Duration,
}

impl Config {
    /// Reads `CHESS_LISTEN_ADDR`, `CHESS_PORT`, `CHESS_UNAUTH_REAP_INTERVAL_MS`,
    /// `CHESS_UNAUTH_REAP_AFTER_MS` and `CHESS_MATCHMAKING_SWEEP_INTERVAL_MS`,
    /// falling back to 2s / 10s / 5s respectively.
    pub fn from_env() -> Self {
        Self {
            listen_addr: env_or("CHESS_LISTEN_ADDR", "0.0.0.0".to_string()),
            port: env_parsed_or("CHESS_PORT", 8080),
            unauth_reap_interval: Duration::from_millis(env_parsed_or(
                "CHESS_UNAUTH_REAP_INTERVAL_MS",
                2_000,
            )),
            unauth_reap_after: Duration::from_millis(env_parsed_or(
                "CHESS_UNAUTH_REAP_AFTER_MS",
                10_000,
            )),
            matchmaking_sweep_interval: Duration::from_millis(env_parsed_or(
                "CHESS_MATCHMAKING_SWEEP_INTERVAL_MS",
                5_000,
            )),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

fn env_parsed_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_intervals() {
        std::env::remove_var("CHESS_UNAUTH_REAP_INTERVAL_MS");
        std::env::remove_var("CHESS_UNAUTH_REAP_AFTER_MS");
        std::env::remove_var("CHESS_MATCHMAKING_SWEEP_INTERVAL_MS");
        let config = Config::from_env();
        assert_eq!(config.unauth_reap_interval, Duration::from_secs(2));
        assert_eq!(config.unauth_reap_after, Duration::from_secs(10));
        assert_eq!(config.matchmaking_sweep_interval, Duration::from_secs(5));
    }
}
