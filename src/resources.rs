//! Typed clients for the agreements and document-management APIs.

pub mod agreements;
pub mod documents;

// crates.io
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};

pub use agreements::{
	Agreement, AgreementList, AgreementsClient, ListAgreementsParams, SortDirection,
};
pub use documents::{Document, DocumentList, DocumentsClient, Folder, ListDocumentsParams};

/// Bytes escaped inside a single path segment (RFC 3986 unreserved characters pass through).
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

/// Percent-encodes a caller-supplied identifier so it stays one path segment.
pub(crate) fn segment(raw: &str) -> String {
	percent_encoding::utf8_percent_encode(raw, SEGMENT).to_string()
}
