//! Serde predicates for boolean CLI flags.
//!
//! Flags such as `--all` parse to `false` when absent. Skipping them while
//! serialising the CLI layer keeps an unset flag from overriding `true` in
//! `.lens.toml` or `LENSCMDS_*`.

/// `true` when `flag` is unset.
///
/// ```
/// assert!(lens::bool_predicates::not(&false));
/// assert!(!lens::bool_predicates::not(&true));
/// ```
#[must_use]
pub fn not(flag: &bool) -> bool {
    !*flag
}
