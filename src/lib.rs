// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Deck-Tracker: record card-game matches and see how your decks perform
//!
//! This crate provides the backend API: per-user match logs and deck
//! catalogs stored as JSON documents (on local disk or in a hosted
//! repository), plus win-rate statistics computed over them.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod time_utils;

use config::Config;
use services::session::IDLE_SWEEP_INTERVAL;
use services::SessionRegistry;
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub sessions: SessionRegistry,
}

impl AppState {
    /// Start the periodic idle-session sweep.
    pub fn spawn_background_tasks(self: &Arc<Self>) {
        let state = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(IDLE_SWEEP_INTERVAL);
            loop {
                interval.tick().await;
                let evicted = state.sessions.evict_idle(state.config.session_idle_timeout);
                if evicted > 0 {
                    tracing::debug!(
                        evicted,
                        open_sessions = state.sessions.len(),
                        "Idle sessions swept"
                    );
                }
            }
        });
    }
}
