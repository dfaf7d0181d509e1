//! The JSON-shaped output model.
//!
//! Conversion produces a plain [`serde_json::Value`]. The crate enables two
//! `serde_json` features that give the value the properties the converter
//! relies on:
//!
//! * `preserve_order` keeps object keys in insertion order, so the first
//!   occurrence of a tag name decides where its key lands. `Map` equality
//!   still ignores key order.
//! * `arbitrary_precision` keeps integers that fit in 64 bits exact and stores
//!   every other number as its decimal literal, so `12345678901234567890123`
//!   or `1.50` reach the serializer unchanged and no NaN or infinity can ever
//!   be produced. Exponents are normalized to a lowercase `e` with an explicit
//!   sign: `6.02e23` is written as `6.02e+23`, with the same value.

use std::str::FromStr;

pub use serde_json::{Map, Number, Value};

/// Builds a [`Number`] from `literal` if, and only if, it is a valid JSON
/// number literal: optional `-`, no leading zeros other than a bare `0`,
/// optional fraction and exponent, no surrounding whitespace.
pub fn number_from_literal(literal: &str) -> Option<Number> {
    Number::from_str(literal).ok()
}
