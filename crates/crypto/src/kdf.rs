//! Passphrase-based key derivation.
//!
//! A sync passphrase is stretched with argon2id into a key suitable for sealing
//! the remote document. The chosen strength travels inside the envelope header, so a
//! device can always open what another device sealed regardless of its own setting.
use crate::{
	primitives::{KEY_LEN, SALT_LEN},
	Error, Protected, Result,
};
use argon2::Argon2;
use zeroize::Zeroizing;

/// These parameters define the password-hashing level.
///
/// The harder the parameter, the longer the passphrase will take to hash.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Params {
	/// Minimum recommended cost, for constrained devices
	Interactive,
	#[default]
	Standard,
	Hardened,
	Paranoid,
}

impl Params {
	/// Identifier written into envelope headers
	#[must_use]
	pub const fn id(self) -> u8 {
		match self {
			Self::Interactive => 0,
			Self::Standard => 1,
			Self::Hardened => 2,
			Self::Paranoid => 3,
		}
	}

	pub const fn from_id(id: u8) -> Result<Self> {
		match id {
			0 => Ok(Self::Interactive),
			1 => Ok(Self::Standard),
			2 => Ok(Self::Hardened),
			3 => Ok(Self::Paranoid),
			other => Err(Error::UnknownParams(other)),
		}
	}

	/// Memory cost in KiB, iterations, parallelism
	const fn costs(self) -> (u32, u32, u32) {
		match self {
			Self::Interactive => (19_456, 2, 1),
			Self::Standard => (131_072, 8, 4),
			Self::Hardened => (262_144, 8, 4),
			Self::Paranoid => (524_288, 8, 4),
		}
	}

	fn argon2_params(self) -> Result<argon2::Params> {
		let (m_cost, t_cost, p_cost) = self.costs();
		argon2::Params::new(m_cost, t_cost, p_cost, Some(KEY_LEN)).map_err(|_| Error::KeyDerivation)
	}
}

impl std::str::FromStr for Params {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		match s {
			"interactive" => Ok(Self::Interactive),
			"standard" => Ok(Self::Standard),
			"hardened" => Ok(Self::Hardened),
			"paranoid" => Ok(Self::Paranoid),
			other => Err(Error::UnknownParamsName(other.to_string())),
		}
	}
}

/// Stretch `passphrase` into a sealing key.
pub fn derive_key(
	passphrase: &Protected<Vec<u8>>,
	salt: &[u8; SALT_LEN],
	params: Params,
) -> Result<Protected<[u8; KEY_LEN]>> {
	if passphrase.expose().is_empty() {
		return Err(Error::EmptyPassphrase);
	}

	let mut key = Zeroizing::new([0u8; KEY_LEN]);

	Argon2::new(
		argon2::Algorithm::Argon2id,
		argon2::Version::V0x13,
		params.argon2_params()?,
	)
	.hash_password_into(passphrase.expose(), salt, key.as_mut_slice())
	.map_or(Err(Error::KeyDerivation), |()| Ok(Protected::new(*key)))
}

#[cfg(test)]
mod tests {
	use super::*;

	const SALT: [u8; SALT_LEN] = [0xFF; SALT_LEN];

	#[test]
	fn derivation_is_deterministic_per_salt() {
		let passphrase = Protected::from("hunter2".to_string());

		let a = derive_key(&passphrase, &SALT, Params::Interactive).unwrap();
		let b = derive_key(&passphrase, &SALT, Params::Interactive).unwrap();
		let c = derive_key(&passphrase, &[0x00; SALT_LEN], Params::Interactive).unwrap();

		assert_eq!(a.expose(), b.expose());
		assert_ne!(a.expose(), c.expose());
	}

	#[test]
	fn empty_passphrase_is_rejected() {
		assert!(matches!(
			derive_key(&Protected::new(Vec::new()), &SALT, Params::Interactive),
			Err(Error::EmptyPassphrase)
		));
	}

	#[test]
	fn params_ids_round_trip() {
		for params in [
			Params::Interactive,
			Params::Standard,
			Params::Hardened,
			Params::Paranoid,
		] {
			assert_eq!(Params::from_id(params.id()).unwrap(), params);
		}

		assert!(matches!(Params::from_id(9), Err(Error::UnknownParams(9))));
	}
}
