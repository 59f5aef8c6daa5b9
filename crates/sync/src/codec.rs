//! Sealing the `{ state, ledger }` bundle into a [`RemoteDocument`] and back.
//!
//! Key derivation is deliberately slow, so both directions run on the blocking pool.

use tt_crypto::{envelope, Params, Protected};
use tt_store::ExportBundle;
use tt_utils::now_millis;

use tokio::task::spawn_blocking;

use crate::{RemoteDocument, SyncError};

pub(crate) async fn seal_bundle(
	bundle: &ExportBundle,
	passphrase: Protected<Vec<u8>>,
	params: Params,
) -> Result<RemoteDocument, SyncError> {
	let plain_text = serde_json::to_vec(bundle).map_err(SyncError::Encode)?;

	let data =
		spawn_blocking(move || envelope::seal_hex(&plain_text, &passphrase, params)).await??;

	Ok(RemoteDocument {
		version: bundle.state.hash.clone(),
		timestamp: now_millis(),
		data,
	})
}

/// Decrypt and validate a remote document. Anything that decrypts but doesn't
/// describe a verifiable state is reported as [`SyncError::Malformed`].
pub(crate) async fn open_document(
	document: RemoteDocument,
	passphrase: Protected<Vec<u8>>,
) -> Result<ExportBundle, SyncError> {
	let RemoteDocument { version, data, .. } = document;

	let plain_text = spawn_blocking(move || envelope::open_hex(&data, &passphrase)).await??;

	let bundle = serde_json::from_slice::<ExportBundle>(plain_text.expose())
		.map_err(|e| SyncError::Malformed(e.to_string()))?;

	if bundle.state.hash != version {
		return Err(SyncError::Malformed(format!(
			"document claims version {version} but holds {}",
			bundle.state.hash
		)));
	}

	bundle
		.state
		.verify()
		.map_err(|e| SyncError::Malformed(e.to_string()))?;

	if bundle.ledger.head() != Some(&bundle.state.hash) {
		return Err(SyncError::Malformed(
			"ledger does not end with the document's state".into(),
		));
	}

	Ok(bundle)
}

#[cfg(test)]
mod tests {
	use super::*;

	use serde_json::json;
	use tt_store::{Domain, StateSnapshot, VersionLedger, VersionedState};

	fn bundle() -> ExportBundle {
		let state = VersionedState::new(
			StateSnapshot::default().with_slice(Domain::Tasks, json!([{ "id": "t1" }])),
			1,
		)
		.unwrap();

		ExportBundle {
			ledger: VersionLedger::from(vec![state.hash.clone()]),
			state,
		}
	}

	fn passphrase(value: &str) -> Protected<Vec<u8>> {
		Protected::from(value.to_string())
	}

	#[tokio::test]
	async fn sealed_bundle_opens_with_the_same_passphrase() {
		let original = bundle();
		let document = seal_bundle(&original, passphrase("hunter2"), Params::Interactive)
			.await
			.unwrap();

		assert_eq!(document.version, original.state.hash);
		assert!(!document.data.contains("t1"));

		let opened = open_document(document, passphrase("hunter2")).await.unwrap();
		assert_eq!(opened, original);
	}

	#[tokio::test]
	async fn floats_survive_sealing() {
		// Shortest decimal form of this value only parses back exactly with a
		// round-tripping float parser
		let estimate = 0.100_000_000_000_769_29_f64;

		let state = VersionedState::new(
			StateSnapshot::default()
				.with_slice(Domain::Tasks, json!([{ "id": "t1", "estimate": estimate }])),
			1,
		)
		.unwrap();
		let original = ExportBundle {
			ledger: VersionLedger::from(vec![state.hash.clone()]),
			state,
		};

		let document = seal_bundle(&original, passphrase("hunter2"), Params::Interactive)
			.await
			.unwrap();
		let opened = open_document(document, passphrase("hunter2")).await.unwrap();

		assert_eq!(opened, original);
		assert_eq!(
			opened.state.data.slice(Domain::Tasks).unwrap()[0]["estimate"].as_f64(),
			Some(estimate)
		);
	}

	#[tokio::test]
	async fn wrong_passphrase_is_typed() {
		let document = seal_bundle(&bundle(), passphrase("hunter2"), Params::Interactive)
			.await
			.unwrap();

		assert!(matches!(
			open_document(document, passphrase("hunter3")).await,
			Err(SyncError::IncorrectPassphrase)
		));
	}

	#[tokio::test]
	async fn mismatched_version_is_malformed() {
		let mut document = seal_bundle(&bundle(), passphrase("hunter2"), Params::Interactive)
			.await
			.unwrap();
		document.version = "something else".into();

		assert!(matches!(
			open_document(document, passphrase("hunter2")).await,
			Err(SyncError::Malformed(_))
		));
	}

	#[tokio::test]
	async fn non_hex_data_is_malformed() {
		let document = RemoteDocument {
			version: "v".into(),
			timestamp: 0,
			data: "zz".into(),
		};

		assert!(matches!(
			open_document(document, passphrase("hunter2")).await,
			Err(SyncError::Malformed(_))
		));
	}
}
