//! Duplicate removal by identity key.
//!
//! The key is `(phone, email)` compared verbatim. Rows where both are empty
//! share the key `("", "")` and collapse to the first such row.

use std::collections::HashSet;

use crate::model::CanonicalRow;

/// Keep the first row for each identity key, preserving order.
/// Returns the kept rows and the number dropped.
pub fn dedup(rows: Vec<CanonicalRow>) -> (Vec<CanonicalRow>, usize) {
    let before = rows.len();
    let mut seen: HashSet<(String, String)> = HashSet::with_capacity(before);
    let kept: Vec<CanonicalRow> = rows
        .into_iter()
        .filter(|row| seen.insert((row.phone.clone(), row.email.clone())))
        .collect();
    let dropped = before - kept.len();
    if dropped > 0 {
        log::debug!("dedup dropped {dropped} of {before} row(s)");
    }
    (kept, dropped)
}
