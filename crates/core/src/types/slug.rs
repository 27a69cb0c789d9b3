//! URL-safe category slugs.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Slug`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    /// The input is empty.
    #[error("slug is required")]
    Empty,
    /// The input is not lowercase words joined by single hyphens.
    #[error("slug must be lowercase with hyphens only")]
    Malformed,
}

/// A category slug such as `sarees` or `bridal-lehengas`.
///
/// Valid slugs match `^[a-z0-9]+(?:-[a-z0-9]+)*$`. Slugs appear in storefront
/// URLs and are referenced by products, so they cannot change once the
/// category exists.
///
/// Deserialization does not validate: values coming back from the API are
/// trusted as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Parse and validate a slug.
    ///
    /// # Errors
    ///
    /// Returns [`SlugError::Empty`] for an empty string and
    /// [`SlugError::Malformed`] for anything outside the slug alphabet, a
    /// leading or trailing hyphen, or repeated hyphens.
    pub fn parse(s: &str) -> Result<Self, SlugError> {
        if s.is_empty() {
            return Err(SlugError::Empty);
        }

        let well_formed = s
            .split('-')
            .all(|word| !word.is_empty() && word.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit()));
        if !well_formed {
            return Err(SlugError::Malformed);
        }

        Ok(Self(s.to_owned()))
    }

    /// Derive a slug from a display name.
    ///
    /// Lowercases ASCII letters, turns every run of other characters into a
    /// single hyphen, and trims hyphens from both ends. Returns `None` when
    /// nothing slug-worthy remains.
    ///
    /// ```
    /// use srisri_core::Slug;
    ///
    /// assert_eq!(Slug::slugify("Bridal Lehengas!").unwrap().as_str(), "bridal-lehengas");
    /// assert!(Slug::slugify("---").is_none());
    /// ```
    #[must_use]
    pub fn slugify(name: &str) -> Option<Self> {
        let mut out = String::with_capacity(name.len());
        let mut pending_hyphen = false;

        for c in name.chars() {
            if c.is_ascii_alphanumeric() {
                if pending_hyphen && !out.is_empty() {
                    out.push('-');
                }
                pending_hyphen = false;
                out.push(c.to_ascii_lowercase());
            } else {
                pending_hyphen = true;
            }
        }

        if out.is_empty() { None } else { Some(Self(out)) }
    }

    /// Returns the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Slug {
    type Err = SlugError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
