//! Catalog item name type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`ItemName`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ItemNameError {
    /// The input string is empty or whitespace.
    #[error("item_name is required")]
    Empty,
    /// The input string is too long.
    #[error("item_name must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// The unique key of a price record.
///
/// ## Constraints
///
/// - Not empty after trimming surrounding whitespace
/// - At most 255 characters
///
/// ```
/// use tally_core::ItemName;
///
/// assert_eq!(ItemName::parse("  apple ").unwrap().as_str(), "apple");
/// assert!(ItemName::parse("   ").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ItemName(String);

impl ItemName {
    /// Maximum length of an item name.
    pub const MAX_LENGTH: usize = 255;

    /// Parse an `ItemName` from user input.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty or longer than
    /// [`ItemName::MAX_LENGTH`].
    pub fn parse(s: &str) -> Result<Self, ItemNameError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ItemNameError::Empty);
        }

        if trimmed.chars().count() > Self::MAX_LENGTH {
            return Err(ItemNameError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the item name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `ItemName` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ItemName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ItemName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
