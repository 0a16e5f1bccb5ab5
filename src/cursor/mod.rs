//! Cursor module
//!
//! Opaque pagination cursors for keyset traversal.
//!
//! # Overview
//!
//! A cursor is the base64 (standard alphabet) rendering of a small ordered
//! mapping of field values, serialized as a compact JSON object. Tokens are
//! not signed: they are not tamper-evident and must be treated as
//! caller-trusted input, never as a security boundary.

mod codec;
mod page;

pub use codec::{comparison_value, decode, encode, CursorValues};
pub use page::CursorPage;
