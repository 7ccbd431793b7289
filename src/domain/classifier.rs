//! Account Classifier
//!
//! Heuristic mapping from an opaque account reference (usually an account
//! URL, sometimes annotated with an upstream type hint) to an account type.
//! Substring matching is best-effort by contract: unrecognized reference
//! shapes classify as `Individual`, and downstream consumers must treat the
//! tag accordingly.

use crate::domain::position::AccountType;

/// Markers that flag a reference as a retirement account (case-insensitive).
const RETIREMENT_MARKERS: &[&str] = &["ira", "roth", "retirement", "401k", "pension"];

/// Classify an account reference string.
///
/// Empty references are `Unknown`. Any retirement marker anywhere in the
/// reference wins; everything else is treated as an individual taxable
/// account.
pub fn classify_account_ref(account_ref: &str) -> AccountType {
    if account_ref.trim().is_empty() {
        return AccountType::Unknown;
    }
    let lowered = account_ref.to_lowercase();
    if RETIREMENT_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
    {
        AccountType::Retirement
    } else {
        AccountType::Individual
    }
}
