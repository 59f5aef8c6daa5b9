//! A wrapper for passphrases and derived keys.
//!
//! It zeroizes its contents on drop and prints `[REDACTED]` from `fmt::Debug`.
//! The only way to read the data is `.expose()`, which keeps every access site easy to audit.
//!
//! # Examples
//!
//! ```rust
//! use tt_crypto::Protected;
//!
//! let passphrase: Protected<Vec<u8>> = Protected::from("correct horse".to_string());
//! assert_eq!(passphrase.expose(), b"correct horse");
//! assert_eq!(format!("{passphrase:?}"), "[REDACTED]");
//! ```
use std::fmt::Debug;
use zeroize::Zeroize;

#[derive(Clone)]
pub struct Protected<T>
where
	T: Zeroize,
{
	data: T,
}

impl<T> Protected<T>
where
	T: Zeroize,
{
	pub const fn new(value: T) -> Self {
		Self { data: value }
	}

	pub const fn expose(&self) -> &T {
		&self.data
	}
}

impl<T> From<T> for Protected<T>
where
	T: Zeroize,
{
	fn from(value: T) -> Self {
		Self::new(value)
	}
}

impl From<String> for Protected<Vec<u8>> {
	fn from(value: String) -> Self {
		Self::new(value.into_bytes())
	}
}

impl<T> Drop for Protected<T>
where
	T: Zeroize,
{
	fn drop(&mut self) {
		self.data.zeroize();
	}
}

impl<T> Debug for Protected<T>
where
	T: Zeroize,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str("[REDACTED]")
	}
}
