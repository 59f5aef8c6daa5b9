//! Content hashing.
//!
//! Every persisted state version is named by the BLAKE3 digest of its serialized
//! data, rendered as lowercase hex. The digest doubles as the storage key suffix and
//! as the version identifier exchanged with remote devices, so it must be stable
//! across platforms and releases.
//!
//! # Examples
//!
//! ```rust
//! use tt_crypto::Hasher;
//!
//! let a = Hasher::content_hash(r#"{"tasks":[]}"#);
//! let b = Hasher::content_hash(r#"{"tasks":[]}"#);
//! assert_eq!(a, b);
//! assert_eq!(a.len(), 64);
//! ```

pub struct Hasher;

impl Hasher {
	/// BLAKE3 digest of `bytes` as a lowercase hex `String`
	#[must_use]
	pub fn blake3_hex(bytes: &[u8]) -> String {
		blake3::hash(bytes).to_hex().to_string()
	}

	/// Hash of a serialized state blob. Accepts any string, including the empty one.
	#[must_use]
	pub fn content_hash(serialized: &str) -> String {
		Self::blake3_hex(serialized.as_bytes())
	}

	/// Whether `candidate` has the shape of a content hash (64 lowercase hex characters)
	#[must_use]
	pub fn is_content_hash(candidate: &str) -> bool {
		candidate.len() == 64
			&& candidate
				.bytes()
				.all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
	}
}

#[cfg(test)]
mod tests {
	use super::Hasher;

	const PASSWORD: [u8; 8] = [0x70, 0x61, 0x73, 0x73, 0x77, 0x6f, 0x72, 0x64];

	#[test]
	fn blake3_hex_is_lowercase() {
		assert_eq!(
			Hasher::blake3_hex(&PASSWORD),
			"7f2611ba158b6dcea4a69c229c303358c5e04493abeadee106a4bfa464d55787"
		);
	}

	#[test]
	fn empty_input_is_accepted() {
		assert_eq!(
			Hasher::content_hash(""),
			"af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262"
		);
	}

	#[test]
	fn content_hash_tracks_every_byte() {
		let a = Hasher::content_hash(r#"{"tasks":["t1"]}"#);
		let b = Hasher::content_hash(r#"{"tasks":["t2"]}"#);

		assert_ne!(a, b);
		assert_eq!(a, Hasher::content_hash(r#"{"tasks":["t1"]}"#));
		assert!(Hasher::is_content_hash(&a));
		assert!(!Hasher::is_content_hash("not-a-hash"));
		assert!(!Hasher::is_content_hash(&a.to_uppercase()));
	}
}
