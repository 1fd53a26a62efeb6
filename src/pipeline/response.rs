//! Response envelopes, body decoding, and error message extraction.

// crates.io
use oauth2::http::StatusCode;
use serde::de::DeserializeOwned;
// self
use crate::_prelude::*;

/// Successful API response with its JSON-decoded body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiResponse<T> {
	/// HTTP status code (always 2xx).
	pub status: u16,
	/// Decoded body.
	pub body: T,
}
impl<T> ApiResponse<T> {
	/// Discards the status and returns the body.
	pub fn into_body(self) -> T {
		self.body
	}

	/// Transforms the body while keeping the status.
	pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
		ApiResponse { status: self.status, body: f(self.body) }
	}
}

#[derive(Deserialize)]
struct ErrorBody {
	#[serde(default)]
	message: Option<String>,
	#[serde(default)]
	error_description: Option<String>,
}

/// Most specific human-readable message for a failed response: the body's `message`, then its
/// `error_description`, then the canonical reason of `status`.
pub(crate) fn error_message(status: StatusCode, body: &[u8]) -> String {
	let parsed = serde_json::from_slice::<ErrorBody>(body).ok();
	let from_body = parsed.and_then(|body| {
		body.message
			.filter(|m| !m.trim().is_empty())
			.or(body.error_description.filter(|d| !d.trim().is_empty()))
	});

	from_body
		.or_else(|| status.canonical_reason().map(str::to_owned))
		.unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}

/// Decodes a JSON body, treating an empty body as `null` and reporting the path of any mismatch.
pub(crate) fn decode_body<T>(body: &[u8]) -> Result<T>
where
	T: DeserializeOwned,
{
	let bytes: &[u8] = if body.iter().all(u8::is_ascii_whitespace) { b"null" } else { body };
	let mut deserializer = serde_json::Deserializer::from_slice(bytes);

	serde_path_to_error::deserialize(&mut deserializer).map_err(|source| Error::Decode { source })
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::Value;
	// self
	use super::*;

	#[test]
	fn message_priority_prefers_body_fields() {
		let status = StatusCode::BAD_REQUEST;

		assert_eq!(
			error_message(status, br#"{"message":"bad filter","error_description":"ignored"}"#),
			"bad filter"
		);
		assert_eq!(error_message(status, br#"{"error_description":"expired code"}"#), "expired code");
		assert_eq!(error_message(status, br#"{"message":""}"#), "Bad Request");
		assert_eq!(error_message(StatusCode::NOT_FOUND, b"<html>nope</html>"), "Not Found");
	}

	#[test]
	fn empty_body_decodes_as_null() {
		let unit: Option<Value> = decode_body(b"").expect("Empty body should decode as null.");

		assert!(unit.is_none());

		let value: Value = decode_body(b"  ").expect("Whitespace body should decode as null.");

		assert_eq!(value, Value::Null);
	}

	#[test]
	fn decode_errors_report_the_path() {
		#[derive(Debug, Deserialize)]
		struct Page {
			#[allow(dead_code)]
			items: Vec<Item>,
		}
		#[derive(Debug, Deserialize)]
		struct Item {
			#[allow(dead_code)]
			id: String,
		}

		let err = decode_body::<Page>(br#"{"items":[{"id":"a"},{"id":7}]}"#)
			.expect_err("Numeric id must not decode as a string.");

		match err {
			Error::Decode { source } => assert_eq!(source.path().to_string(), "items[1].id"),
			other => panic!("Unexpected error: {other:?}."),
		}
	}
}
