//! Room codes: six characters of Crockford base32.
//!
//! Codes are shown to players and typed back in, so parsing is forgiving:
//! case is ignored and the look-alikes I, L and O read as 1, 1 and 0.

use rand::rngs::OsRng;
use rand::{Rng, TryRngCore};

const CROCKFORD: &[u8] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ"; // no I, L, O, U

pub const ROOM_CODE_LEN: usize = 6;

/// Random room code from the operating system CSPRNG.
pub fn generate_room_code() -> String {
    generate_room_code_with(&mut OsRng.unwrap_err())
}

pub fn generate_room_code_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..ROOM_CODE_LEN)
        .map(|_| CROCKFORD[rng.random_range(0..CROCKFORD.len())] as char)
        .collect()
}

/// Canonical form of a user-typed code, or `None` if it cannot be one.
pub fn normalize_room_code(raw: &str) -> Option<String> {
    let code: String = raw
        .trim()
        .chars()
        .map(|c| match c.to_ascii_uppercase() {
            'I' | 'L' => '1',
            'O' => '0',
            other => other,
        })
        .collect();

    let valid = code.len() == ROOM_CODE_LEN && code.bytes().all(|b| CROCKFORD.contains(&b));
    valid.then_some(code)
}
