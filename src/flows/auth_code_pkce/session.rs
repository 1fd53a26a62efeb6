//! PKCE verifier and challenge generation.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::Rng;
use sha2::{Digest, Sha256};

const PKCE_VERIFIER_BYTES: usize = 32;

/// Supported PKCE challenge methods.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PkceCodeChallengeMethod {
	/// SHA-256 based PKCE (RFC 7636 S256).
	S256,
}
impl PkceCodeChallengeMethod {
	/// Returns the RFC 7636 identifier for the challenge method.
	pub fn as_str(self) -> &'static str {
		match self {
			PkceCodeChallengeMethod::S256 => "S256",
		}
	}
}

#[derive(Clone)]
pub(crate) struct PkcePair {
	pub(crate) verifier: String,
	pub(crate) challenge: String,
	pub(crate) method: PkceCodeChallengeMethod,
}
impl PkcePair {
	/// 32 random bytes, base64url without padding (43 characters).
	pub(crate) fn generate() -> Self {
		let mut bytes = [0_u8; PKCE_VERIFIER_BYTES];

		rand::rng().fill(&mut bytes);

		let verifier = URL_SAFE_NO_PAD.encode(bytes);
		let challenge = compute_pkce_challenge(&verifier);

		Self { verifier, challenge, method: PkceCodeChallengeMethod::S256 }
	}
}

/// `base64url(SHA-256(verifier))` without padding.
pub fn compute_pkce_challenge(verifier: &str) -> String {
	let digest = Sha256::digest(verifier.as_bytes());

	URL_SAFE_NO_PAD.encode(digest)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn challenge_matches_rfc_7636_vector() {
		assert_eq!(
			compute_pkce_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
			"E9Melhoa2OwvFUYEQ9Nz6RSyNxhbY3ZQ6cOTe2RYzsk"
		);
	}

	#[test]
	fn verifiers_are_url_safe_and_unique() {
		let first = PkcePair::generate();
		let second = PkcePair::generate();

		assert_eq!(first.verifier.len(), 43);
		assert!(
			first.verifier.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
		);
		assert_ne!(first.verifier, second.verifier);
		assert_eq!(first.challenge, compute_pkce_challenge(&first.verifier));
		assert_eq!(first.method.as_str(), "S256");
	}
}
