//! Passphrase-sealed envelopes.
//!
//! Layout of a sealed blob:
//!
//! ```text
//! | magic "TTE" | version (1) | kdf params id (1) | salt (16) | nonce (24) | cipher text + tag |
//! ```
//!
//! Everything before the nonce is authenticated as associated data, so flipping the
//! declared kdf strength or salt is detected exactly like a wrong passphrase.
//!
//! # Examples
//!
//! ```rust
//! use tt_crypto::{envelope, Params, Protected};
//!
//! let passphrase = Protected::from("correct horse".to_string());
//! let sealed = envelope::seal(b"hello", &passphrase, Params::Interactive).unwrap();
//! let opened = envelope::open(&sealed, &passphrase).unwrap();
//! assert_eq!(opened.expose(), b"hello");
//! ```
use crate::{
	kdf::{derive_key, Params},
	primitives::{generate_nonce, generate_salt, AEAD_TAG_LEN, NONCE_LEN, SALT_LEN},
	Error, Protected, Result,
};

use chacha20poly1305::{
	aead::{Aead, KeyInit, Payload},
	Key, XChaCha20Poly1305, XNonce,
};

const MAGIC: &[u8; 3] = b"TTE";

/// Current envelope layout version
pub const ENVELOPE_VERSION: u8 = 1;

/// magic, version and params id
const PREFIX_LEN: usize = MAGIC.len() + 2;
const AAD_LEN: usize = PREFIX_LEN + SALT_LEN;
const HEADER_LEN: usize = AAD_LEN + NONCE_LEN;

struct Header<'a> {
	params: Params,
	salt: [u8; SALT_LEN],
	nonce: &'a [u8],
	aad: &'a [u8],
	cipher_text: &'a [u8],
}

impl<'a> Header<'a> {
	fn parse(sealed: &'a [u8]) -> Result<Self> {
		if sealed.len() < HEADER_LEN + AEAD_TAG_LEN || &sealed[..MAGIC.len()] != MAGIC {
			return Err(Error::MalformedEnvelope);
		}

		let version = sealed[MAGIC.len()];
		if version != ENVELOPE_VERSION {
			return Err(Error::UnsupportedEnvelopeVersion(version));
		}

		let params = Params::from_id(sealed[MAGIC.len() + 1])?;

		let mut salt = [0u8; SALT_LEN];
		salt.copy_from_slice(&sealed[PREFIX_LEN..AAD_LEN]);

		Ok(Self {
			params,
			salt,
			nonce: &sealed[AAD_LEN..HEADER_LEN],
			aad: &sealed[..AAD_LEN],
			cipher_text: &sealed[HEADER_LEN..],
		})
	}
}

/// Seal `plain_text` under `passphrase`, with a fresh salt and nonce on every call.
pub fn seal(
	plain_text: &[u8],
	passphrase: &Protected<Vec<u8>>,
	params: Params,
) -> Result<Vec<u8>> {
	let salt = generate_salt();
	let nonce = generate_nonce();
	let key = derive_key(passphrase, &salt, params)?;

	let mut sealed = Vec::with_capacity(HEADER_LEN + plain_text.len() + AEAD_TAG_LEN);
	sealed.extend_from_slice(MAGIC);
	sealed.push(ENVELOPE_VERSION);
	sealed.push(params.id());
	sealed.extend_from_slice(&salt);

	let cipher_text = XChaCha20Poly1305::new(Key::from_slice(key.expose()))
		.encrypt(
			XNonce::from_slice(&nonce),
			Payload {
				msg: plain_text,
				aad: &sealed,
			},
		)
		.map_err(|_| Error::Encrypt)?;

	sealed.extend_from_slice(&nonce);
	sealed.extend_from_slice(&cipher_text);

	Ok(sealed)
}

/// Open a blob produced by [`seal`].
///
/// A wrong passphrase never yields garbage: authentication fails and
/// [`Error::IncorrectPassphrase`] is returned instead.
pub fn open(sealed: &[u8], passphrase: &Protected<Vec<u8>>) -> Result<Protected<Vec<u8>>> {
	let header = Header::parse(sealed)?;
	let key = derive_key(passphrase, &header.salt, header.params)?;

	XChaCha20Poly1305::new(Key::from_slice(key.expose()))
		.decrypt(
			XNonce::from_slice(header.nonce),
			Payload {
				msg: header.cipher_text,
				aad: header.aad,
			},
		)
		.map(Protected::new)
		.map_err(|_| Error::IncorrectPassphrase)
}

/// [`seal`], rendered as lowercase hex for text-only transports
pub fn seal_hex(
	plain_text: &[u8],
	passphrase: &Protected<Vec<u8>>,
	params: Params,
) -> Result<String> {
	seal(plain_text, passphrase, params).map(hex::encode)
}

/// [`open`] for blobs produced by [`seal_hex`]
pub fn open_hex(sealed_hex: &str, passphrase: &Protected<Vec<u8>>) -> Result<Protected<Vec<u8>>> {
	open(&hex::decode(sealed_hex)?, passphrase)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn passphrase(p: &str) -> Protected<Vec<u8>> {
		Protected::from(p.to_string())
	}

	#[test]
	fn seal_then_open() {
		let blob = br#"{"state":{},"ledger":[]}"#;

		let sealed = seal(blob, &passphrase("p1"), Params::Interactive).unwrap();
		assert_eq!(sealed.len(), HEADER_LEN + blob.len() + AEAD_TAG_LEN);

		let opened = open(&sealed, &passphrase("p1")).unwrap();
		assert_eq!(opened.expose().as_slice(), blob);
	}

	#[test]
	fn wrong_passphrase_fails() {
		let sealed = seal_hex(b"secret tasks", &passphrase("p1"), Params::Interactive).unwrap();

		assert!(matches!(
			open_hex(&sealed, &passphrase("p2")),
			Err(Error::IncorrectPassphrase)
		));
	}

	#[test]
	fn salts_and_nonces_are_fresh() {
		let a = seal(b"same", &passphrase("p1"), Params::Interactive).unwrap();
		let b = seal(b"same", &passphrase("p1"), Params::Interactive).unwrap();

		assert_ne!(a, b);
	}

	#[test]
	fn tampered_header_is_detected() {
		let mut sealed = seal(b"payload", &passphrase("p1"), Params::Interactive).unwrap();
		sealed[PREFIX_LEN] ^= 0x01; // first salt byte

		assert!(matches!(
			open(&sealed, &passphrase("p1")),
			Err(Error::IncorrectPassphrase)
		));
	}

	#[test]
	fn truncated_and_foreign_blobs_are_malformed() {
		assert!(matches!(
			open(b"TTE", &passphrase("p1")),
			Err(Error::MalformedEnvelope)
		));
		assert!(matches!(
			open(&[0u8; HEADER_LEN + AEAD_TAG_LEN], &passphrase("p1")),
			Err(Error::MalformedEnvelope)
		));
		assert!(matches!(
			open_hex("zz", &passphrase("p1")),
			Err(Error::Hex(_))
		));
	}

	#[test]
	fn newer_envelope_version_is_refused() {
		let mut sealed = seal(b"payload", &passphrase("p1"), Params::Interactive).unwrap();
		sealed[MAGIC.len()] = ENVELOPE_VERSION + 1;

		assert!(matches!(
			open(&sealed, &passphrase("p1")),
			Err(Error::UnsupportedEnvelopeVersion(2))
		));
	}
}
