/// Canonical form of a currency code: trimmed and upper-cased.
///
/// Codes are compared after this normalization everywhere, so `" usd"` on an
/// asset matches a rate recorded for `"USD"`.
pub fn normalize_currency_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Three ASCII letters after normalization.
pub fn is_valid_currency_code(code: &str) -> bool {
    let code = code.trim();
    code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic())
}
