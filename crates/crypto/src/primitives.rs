use rand::{RngCore, SeedableRng};

/// The salt size fed to argon2id alongside the passphrase
pub const SALT_LEN: usize = 16;

/// `XChaCha20-Poly1305` nonce length
pub const NONCE_LEN: usize = 24;

/// Length of a derived key, and of a raw BLAKE3 digest
pub const KEY_LEN: usize = 32;

/// Length of the AEAD authentication tag appended to every cipher text
pub const AEAD_TAG_LEN: usize = 16;

/// This function uses `ChaCha20Rng` for cryptographically-securely generating random data
#[must_use]
pub fn generate_salt() -> [u8; SALT_LEN] {
	let mut salt = [0u8; SALT_LEN];
	rand_chacha::ChaCha20Rng::from_entropy().fill_bytes(&mut salt);
	salt
}

/// 192 bit nonces are large enough to be picked at random for every seal
#[must_use]
pub fn generate_nonce() -> [u8; NONCE_LEN] {
	let mut nonce = [0u8; NONCE_LEN];
	rand_chacha::ChaCha20Rng::from_entropy().fill_bytes(&mut nonce);
	nonce
}
