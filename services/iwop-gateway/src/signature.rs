use iwopsign_core::hash::{base64_hmac_sha1, hex_hmac_sha1};
use iwopsign_core::{Result, SignatureMode};
use log::debug;
use serde::Serialize;

use crate::canonical::{canonical_string, SignatureOption};

/// Encoding applied to the HMAC digest.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum SignatureEncoding {
    /// Standard base64 with padding. This is what the gateway expects.
    #[default]
    Base64,
    /// Lowercase hex.
    Hex,
}

/// SignedData keeps the exact string that was signed next to its signature.
///
/// When the gateway rejects a signature, compare `signable` with the
/// `StringToSign` it returns in the error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedData {
    /// The canonical string fed into HMAC.
    pub signable: String,
    /// Encoded HMAC-SHA1 of `signable`.
    pub signature: String,
}

/// Sign `signable` with `secret` using HMAC-SHA1.
pub fn sign(signable: &str, secret: &str, encoding: SignatureEncoding) -> String {
    match encoding {
        SignatureEncoding::Base64 => base64_hmac_sha1(secret.as_bytes(), signable.as_bytes()),
        SignatureEncoding::Hex => hex_hmac_sha1(secret.as_bytes(), signable.as_bytes()),
    }
}

/// Canonicalize `option` at `time` and sign the result.
pub(crate) fn compute_signature(
    mode: SignatureMode,
    option: &SignatureOption,
    time: &str,
    encoding: SignatureEncoding,
) -> Result<SignedData> {
    let signable = canonical_string(mode, option, time)?;
    debug!("calculated string to sign: {signable:?}");

    let signature = sign(&signable, &option.secret, encoding);
    Ok(SignedData {
        signable,
        signature,
    })
}
