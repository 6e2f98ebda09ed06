//! DJ session tokens
//!
//! Sessions live in process memory; a restart signs every dashboard out,
//! which is acceptable for a single-venue deployment.

use rand::distributions::Alphanumeric;
use rand::Rng;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

const TOKEN_LEN: usize = 32;

/// In-memory set of active DJ session tokens
#[derive(Clone, Default)]
pub struct SessionStore {
    tokens: Arc<Mutex<HashSet<String>>>,
}

impl SessionStore {
    /// Issue a fresh random token
    pub fn issue(&self) -> String {
        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LEN)
            .map(char::from)
            .collect();
        self.tokens.lock().expect("session lock").insert(token.clone());
        token
    }

    /// Check whether a token belongs to an active session
    pub fn is_valid(&self, token: &str) -> bool {
        self.tokens.lock().expect("session lock").contains(token)
    }

    /// Revoke a token. Returns false when it was not active.
    pub fn revoke(&self, token: &str) -> bool {
        self.tokens.lock().expect("session lock").remove(token)
    }
}
