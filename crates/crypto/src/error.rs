use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
	#[error("error while encrypting")]
	Encrypt,
	#[error("wrong passphrase provided, or the sealed data was tampered with")]
	IncorrectPassphrase,
	#[error("there was an error deriving a key from the passphrase")]
	KeyDerivation,
	#[error("a passphrase must not be empty")]
	EmptyPassphrase,
	#[error("sealed data is truncated or has an invalid header")]
	MalformedEnvelope,
	#[error("unsupported envelope version: {0}")]
	UnsupportedEnvelopeVersion(u8),
	#[error("unknown key derivation parameters id: {0}")]
	UnknownParams(u8),
	#[error("unknown key derivation strength: '{0}'")]
	UnknownParamsName(String),
	#[error("hex decoding error: {0}")]
	Hex(#[from] hex::FromHexError),
}

pub type Result<T> = std::result::Result<T, Error>;
