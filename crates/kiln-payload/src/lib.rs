//! Payload tokens for test expectations.
//!
//! A token is the JSON form of an [`AnnotatedTest`] written as lowercase
//! hexadecimal. The result is a single line of `[0-9a-f]`, so it survives a
//! build-file variable assignment and a shell command line without quoting,
//! and multi-line expected output or negative return codes pass through
//! unchanged.
//!
//! ```
//! use kiln_model::AnnotatedTest;
//! use kiln_payload::{decode, encode};
//!
//! let mut record = AnnotatedTest::new("test/hello.c");
//! record.expected_text = "hello\nworld\n".to_string();
//! let token = encode(&record).unwrap();
//! assert!(token.bytes().all(|b| b.is_ascii_hexdigit()));
//! assert_eq!(decode(&token).unwrap(), record);
//! ```

use kiln_model::AnnotatedTest;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("failed to serialize test record: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("payload token is not valid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("payload token does not contain a test record: {0}")]
    Deserialize(#[source] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PayloadError>;

/// Encodes a record into an opaque single-line token.
pub fn encode(record: &AnnotatedTest) -> Result<String> {
    let json = serde_json::to_vec(record).map_err(PayloadError::Serialize)?;
    Ok(hex::encode(json))
}

/// Decodes a token produced by [`encode`].
pub fn decode(token: &str) -> Result<AnnotatedTest> {
    let json = hex::decode(token.trim())?;
    serde_json::from_slice(&json).map_err(PayloadError::Deserialize)
}
