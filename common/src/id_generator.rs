use rand::Rng;

use crate::{SessionId, SignInKey};

const ADJECTIVES: &[&str] = &[
    "Swift", "Brave", "Clever", "Mighty", "Silent", "Golden", "Wild", "Noble",
    "Fierce", "Gentle", "Quick", "Wise", "Bold", "Proud", "Cunning", "Sly",
];

const NOUNS: &[&str] = &[
    "Falcon", "Bear", "Tiger", "Wolf", "Eagle", "Dragon", "Lion", "Panther",
    "Hawk", "Fox", "Raven", "Cobra", "Shark", "Phoenix", "Lynx", "Viper",
];

const SIGN_IN_KEY_BYTES: usize = 16;

pub fn generate_session_id() -> SessionId {
    let mut rng = rand::rng();
    let adjective = ADJECTIVES[rng.random_range(0..ADJECTIVES.len())];
    let noun = NOUNS[rng.random_range(0..NOUNS.len())];
    let suffix: u16 = rng.random_range(0..10_000);
    SessionId::new(format!("{}-{}-{:04}", adjective, noun, suffix))
}

pub fn generate_sign_in_key() -> SignInKey {
    let mut rng = rand::rng();
    let key: String = (0..SIGN_IN_KEY_BYTES)
        .map(|_| format!("{:02x}", rng.random::<u8>()))
        .collect();
    SignInKey::new(key)
}
