/// Errors that can occur when creating validated identifier types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TypesError {
    /// The input was empty or contained only whitespace
    #[error("identifier cannot be empty")]
    Empty,
    /// The input was longer than a REST resource identifier may be
    #[error("identifier exceeds maximum length of {max} characters (got {len})")]
    TooLong { len: usize, max: usize },
    /// The input contained characters outside `[0-9A-Za-z-]`
    #[error("identifier contains invalid characters: {0}")]
    InvalidCharacters(String),
}

/// Maximum length of a REST resource identifier.
///
/// Concept dictionary identifiers are 36 characters (either a hyphenated UUID or a
/// CIEL-style `162402AAAA...` code); a little headroom is allowed for legacy values.
pub const MAX_RESOURCE_UUID_LEN: usize = 38;

/// An identifier of a REST resource (concept, order, order type, provider, ...).
///
/// Identifiers are not required to be RFC 4122 UUIDs: concept dictionaries frequently use
/// fixed-width codes such as `162402AAAAAAAAAAAAAAAAAAAAAAAAAAAAAA`. The type guarantees the
/// value is non-empty, trimmed, bounded in length and made only of ASCII alphanumerics and `-`,
/// which makes it safe to embed in a URL path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceUuid(String);

impl ResourceUuid {
    /// Creates a new `ResourceUuid` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace before validation.
    ///
    /// # Errors
    ///
    /// Returns [`TypesError`] if the trimmed input is empty, too long, or contains characters
    /// other than ASCII alphanumerics and `-`.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TypesError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TypesError::Empty);
        }

        if trimmed.len() > MAX_RESOURCE_UUID_LEN {
            return Err(TypesError::TooLong {
                len: trimmed.len(),
                max: MAX_RESOURCE_UUID_LEN,
            });
        }

        let ok = trimmed
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'-'));
        if !ok {
            return Err(TypesError::InvalidCharacters(trimmed.to_owned()));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Wraps a compile-time identifier constant without returning an error.
    ///
    /// Only for literals known to be valid; debug builds assert the value passes
    /// [`ResourceUuid::new`].
    pub fn from_static(value: &'static str) -> Self {
        debug_assert!(
            Self::new(value).is_ok_and(|id| id.as_str() == value),
            "invalid static identifier: {value}"
        );
        Self(value.to_owned())
    }

    /// Returns the inner identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the identifier, returning the owned string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for ResourceUuid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResourceUuid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for ResourceUuid {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl serde::Serialize for ResourceUuid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for ResourceUuid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ResourceUuid::new(&s).map_err(serde::de::Error::custom)
    }
}
