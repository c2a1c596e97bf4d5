use std::fmt;

use crate::normalize::normalize_species;

/// Species name in the canonical form used for index queries and file names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedName(String);

impl NormalizedName {
    pub fn new(raw: &str) -> Self {
        normalize_species(raw)
    }

    pub(crate) fn from_normalized(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Output file prefix. Spaces, path separators and control characters
    /// become underscores so the name always stays a single path component.
    pub fn file_stem(&self) -> String {
        self.0
            .chars()
            .map(|ch| match ch {
                ' ' | '/' | '\\' | ':' => '_',
                ch if ch.is_control() => '_',
                ch => ch,
            })
            .collect()
    }
}

impl fmt::Display for NormalizedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageUuid(String);

impl ImageUuid {
    /// Extracts the identifier from a resource path shaped like
    /// `/images/{uuid}/...`. Any `?query` suffix is ignored.
    pub fn from_href(href: &str) -> Option<Self> {
        let path = href.split('?').next().unwrap_or_default();
        let mut segments = path.split('/');
        let _root = segments.next()?;
        if segments.next()? != "images" {
            return None;
        }
        let uuid = segments.next()?;
        if uuid.is_empty() {
            return None;
        }
        Some(Self(uuid.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
