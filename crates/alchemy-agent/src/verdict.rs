//! Interpretation of free-text model verdicts.

/// Whether a classifier or reviewer reply counts as a positive verdict.
///
/// Any case-insensitive occurrence of `yes` counts, so "Yes, this is
/// detailed enough" passes. This is loose on purpose and also accepts
/// "yes, but only if..."; swap this function out for a stricter contract.
pub fn is_affirmative(text: &str) -> bool {
    text.to_lowercase().contains("yes")
}
