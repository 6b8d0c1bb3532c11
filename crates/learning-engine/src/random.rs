//! Random bytes for identifiers and certificate codes.
//!
//! Uses the operating system's random source via `rand`.

use rand::RngCore;

/// Fill a buffer with random bytes.
pub fn fill_random(buf: &mut [u8]) {
    rand::thread_rng().fill_bytes(buf);
}

/// Generate a fixed-size array of random bytes.
pub fn random_bytes<const N: usize>() -> [u8; N] {
    let mut buf = [0u8; N];
    fill_random(&mut buf);
    buf
}
