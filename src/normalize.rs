use tracing::debug;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::domain::NormalizedName;

/// Lowercases `raw`, strips diacritics and collapses whitespace.
///
/// Never fails. When diacritic stripping leaves nothing usable the
/// lowercased text is kept as is; see [`strip_diacritics`].
pub fn normalize_species(raw: &str) -> NormalizedName {
    let lowered = raw.to_lowercase();
    let stripped = match strip_diacritics(&lowered) {
        Some(stripped) => stripped,
        None => {
            debug!(input = raw, "diacritic stripping degraded; using lowercased name");
            lowered
        }
    };
    NormalizedName::from_normalized(collapse_whitespace(&stripped))
}

/// NFD, drop combining marks, NFC.
///
/// Returns `None` when a non-blank input is reduced to blank text, which
/// happens for input made only of combining marks.
pub fn strip_diacritics(text: &str) -> Option<String> {
    let stripped = text
        .nfd()
        .filter(|ch| !is_combining_mark(*ch))
        .nfc()
        .collect::<String>();
    if stripped.trim().is_empty() && !text.trim().is_empty() {
        return None;
    }
    Some(stripped)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
