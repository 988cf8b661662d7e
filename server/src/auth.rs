use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderMap, header};
use common::id_generator::generate_sign_in_key;
use common::{SignInKey, log};
use tokio::sync::Mutex;
use tokio::time::Instant;

pub const SESSION_COOKIE: &str = "ttt_session";

/// How long a sign-in stays valid.
pub const SIGN_IN_TTL: Duration = Duration::from_secs(12 * 60 * 60);

/// Upper bound on live sign-ins; the oldest one is dropped to make room.
pub const MAX_SIGN_INS: usize = 1024;

#[derive(Debug, PartialEq, Eq)]
pub enum SignIn {
    /// No tokens configured, nothing to remember.
    NotRequired,
    Granted(SignInKey),
    Rejected,
}

/// Decides whether a request may reach the game.
///
/// Signing in exchanges one of the configured access tokens for a random key that is
/// kept in memory until it expires and handed to the browser as a cookie. With no
/// tokens configured the gate is open and stores nothing.
#[derive(Clone)]
pub struct AuthGate {
    access_tokens: Arc<HashSet<String>>,
    signed_in: Arc<Mutex<HashMap<SignInKey, Instant>>>,
    ttl: Duration,
}

impl AuthGate {
    pub fn new(access_tokens: &[String]) -> Self {
        Self::with_ttl(access_tokens, SIGN_IN_TTL)
    }

    pub fn with_ttl(access_tokens: &[String], ttl: Duration) -> Self {
        Self {
            access_tokens: Arc::new(access_tokens.iter().cloned().collect()),
            signed_in: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    pub fn is_open(&self) -> bool {
        self.access_tokens.is_empty()
    }

    pub async fn sign_in(&self, token: &str) -> SignIn {
        if self.is_open() {
            return SignIn::NotRequired;
        }
        if !self.access_tokens.contains(token) {
            log!("Sign-in rejected");
            return SignIn::Rejected;
        }

        let now = Instant::now();
        let key = generate_sign_in_key();
        let mut signed_in = self.signed_in.lock().await;

        signed_in.retain(|_, expires_at| *expires_at > now);
        if signed_in.len() >= MAX_SIGN_INS {
            let oldest = signed_in
                .iter()
                .min_by_key(|(_, expires_at)| **expires_at)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                signed_in.remove(&oldest);
                log!("Sign-in limit reached, dropped the oldest sign-in");
            }
        }

        signed_in.insert(key.clone(), now + self.ttl);
        log!("Signed in, {} active sign-ins", signed_in.len());
        SignIn::Granted(key)
    }

    pub async fn sign_out(&self, key: &SignInKey) {
        if self.signed_in.lock().await.remove(key).is_some() {
            log!("Signed out");
        }
    }

    pub async fn is_signed_in(&self, key: &SignInKey) -> bool {
        let mut signed_in = self.signed_in.lock().await;
        match signed_in.get(key) {
            Some(expires_at) if *expires_at > Instant::now() => true,
            Some(_) => {
                signed_in.remove(key);
                false
            }
            None => false,
        }
    }

    pub async fn active_sign_ins(&self) -> usize {
        self.signed_in.lock().await.len()
    }

    pub async fn may_play(&self, headers: &HeaderMap) -> bool {
        if self.is_open() {
            return true;
        }
        match sign_in_key_from_headers(headers) {
            Some(key) => self.is_signed_in(&key).await,
            None => false,
        }
    }
}

pub fn sign_in_key_from_headers(headers: &HeaderMap) -> Option<SignInKey> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| SignInKey::new(value.to_string()))
}

pub fn session_cookie(key: &SignInKey) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, key)
}

pub fn expired_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}
