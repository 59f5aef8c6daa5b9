use tt_crypto::Error as CryptoError;

use thiserror::Error;

use crate::{remote, Relationship};

#[derive(Debug, Error)]
pub enum SyncError {
	#[error("sign in before syncing")]
	NeedsLogin,
	#[error("the passphrase does not decrypt the remote state")]
	IncorrectPassphrase,
	#[error("a sync operation is already running")]
	CheckInProgress,
	#[error("run a sync check first")]
	NoCheck,
	#[error("not permitted while the remote is {0}")]
	NotPermitted(Relationship),
	#[error("remote store error: {0}")]
	Remote(#[from] remote::Error),
	#[error("remote document is malformed: {0}")]
	Malformed(String),
	#[error("failed to seal state for upload: {0}")]
	Crypto(CryptoError),
	#[error("failed to serialize state for upload: {0}")]
	Encode(serde_json::Error),
	#[error(transparent)]
	Store(#[from] tt_store::Error),
	#[error("sync task panicked or was cancelled")]
	Join(#[from] tokio::task::JoinError),
}

impl From<CryptoError> for SyncError {
	fn from(e: CryptoError) -> Self {
		match e {
			CryptoError::IncorrectPassphrase => Self::IncorrectPassphrase,
			CryptoError::MalformedEnvelope
			| CryptoError::UnsupportedEnvelopeVersion(_)
			| CryptoError::UnknownParams(_)
			| CryptoError::Hex(_) => Self::Malformed(e.to_string()),
			e => Self::Crypto(e),
		}
	}
}
