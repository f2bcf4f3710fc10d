//! Variant keys.
//!
//! A [`VariantKey`] names one purchasable variant of a product (e.g. a
//! color). It is the identity of a cart line: the cart holds at most one
//! line per key.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`VariantKey`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum VariantKeyError {
    /// The input is empty or only whitespace.
    #[error("variant key cannot be empty")]
    Empty,
    /// The input is too long.
    #[error("variant key must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// Identifier of a product variant, unique within a cart.
///
/// Keys are not restricted to the catalog: an unknown key still identifies
/// a valid cart line, it just renders with the raw key as its label.
///
/// ## Examples
///
/// ```
/// use brume_core::VariantKey;
///
/// let silver = VariantKey::parse(" silver ").unwrap();
/// assert_eq!(silver.as_str(), "silver");
///
/// assert!(VariantKey::parse("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariantKey(String);

impl VariantKey {
    /// Maximum length of a parsed key.
    pub const MAX_LENGTH: usize = 64;

    /// Wrap a raw key without validation.
    ///
    /// Used for keys that are already trusted, such as catalog entries.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Parse a key from user-facing input (e.g. a swatch `data-color`
    /// attribute), trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty or longer than
    /// [`Self::MAX_LENGTH`].
    pub fn parse(s: &str) -> Result<Self, VariantKeyError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(VariantKeyError::Empty);
        }
        if trimmed.chars().count() > Self::MAX_LENGTH {
            return Err(VariantKeyError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Get the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VariantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VariantKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for VariantKey {
    type Err = VariantKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<VariantKey> for String {
    fn from(key: VariantKey) -> Self {
        key.0
    }
}
