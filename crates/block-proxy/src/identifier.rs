//! Normalization of user-supplied block identifiers.
//!
//! The upstream node accepts either the `latest` tag or a `0x`-prefixed hex
//! quantity. Callers may additionally hand us decimal numbers; everything
//! else is rejected before it can reach the cache or the node.

use std::{
    fmt,
    str::FromStr,
};

use crate::error::{
    BlockClientError,
    Result,
};

/// The tag resolving to the chain head.
pub const LATEST_TAG: &str = "latest";

/// A block identifier in canonical form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockIdentifier {
    Latest,
    Number(u64),
}

impl BlockIdentifier {
    pub fn is_latest(&self) -> bool {
        matches!(self, Self::Latest)
    }

    pub fn number(&self) -> Option<u64> {
        match self {
            Self::Latest => None,
            Self::Number(number) => Some(*number),
        }
    }

    /// Canonical string form, also used as the cache key.
    pub fn canonical(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for BlockIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => f.write_str(LATEST_TAG),
            Self::Number(number) => write!(f, "{number:#x}"),
        }
    }
}

impl FromStr for BlockIdentifier {
    type Err = BlockClientError;

    fn from_str(raw: &str) -> Result<Self> {
        normalize(raw)
    }
}

/// Normalizes `raw` into a [`BlockIdentifier`].
///
/// Accepts `latest`, unsigned decimal numbers and `0x`-prefixed hex numbers.
/// Bare hex digits such as `ff` are rejected.
pub fn normalize(raw: &str) -> Result<BlockIdentifier> {
    if raw == LATEST_TAG {
        return Ok(BlockIdentifier::Latest);
    }
    parse_quantity(raw)
        .map(BlockIdentifier::Number)
        .ok_or_else(|| BlockClientError::invalid_identifier(raw))
}

/// How a transaction is looked up inside a block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransactionIdentifier {
    Hash(String),
    Index(u64),
}

impl TransactionIdentifier {
    /// Anything `0x`-prefixed is taken as a hash. Everything else must be an
    /// unsigned decimal position.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.starts_with("0x") {
            return Ok(Self::Hash(raw.to_string()));
        }
        parse_digits(raw, 10)
            .map(Self::Index)
            .ok_or_else(|| BlockClientError::invalid_identifier(raw))
    }
}

/// Parses a decimal or `0x`-prefixed hex quantity into a `u64`.
pub(crate) fn parse_quantity(raw: &str) -> Option<u64> {
    match raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
    {
        Some(hex) => parse_digits(hex, 16),
        None => parse_digits(raw, 10),
    }
}

fn parse_digits(digits: &str, radix: u32) -> Option<u64> {
    // `from_str_radix` tolerates a leading `+`.
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    u64::from_str_radix(digits, radix).ok()
}
