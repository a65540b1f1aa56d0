//! Helpers shared by unit and integration tests.
//!
//! Environment mutation goes through [`environment`] so concurrent tests do
//! not race on the process environment.

use crate::environment;

/// Remove ANSI escape sequences from a string.
///
/// # Examples
///
/// ```
/// use lens::test_utils::strip_ansi_codes;
/// let coloured = "\x1b[48;2;215;58;74m[bug]\x1b[0m";
/// assert_eq!(strip_ansi_codes(coloured), "[bug]");
/// ```
#[must_use]
pub fn strip_ansi_codes(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(ch) = chars.next() {
        if ch == '\x1b' && skip_ansi_sequence(&mut chars) {
            continue;
        }
        out.push(ch);
    }
    out
}

fn skip_ansi_sequence(chars: &mut impl Iterator<Item = char>) -> bool {
    if !matches!(chars.next(), Some('[')) {
        return false;
    }
    chars.any(|c| ('@'..='~').contains(&c))
}

/// Set an environment variable for the duration of a test.
pub fn set_var<K: AsRef<std::ffi::OsStr>, V: AsRef<std::ffi::OsStr>>(key: K, value: V) {
    environment::set_var(key, value);
}

/// Remove an environment variable set during a test.
pub fn remove_var<K: AsRef<std::ffi::OsStr>>(key: K) {
    environment::remove_var(key);
}

/// Restores the previous value of an environment variable on drop.
#[must_use = "the variable is restored when the guard drops"]
pub struct EnvGuard {
    key: String,
    previous: Option<String>,
}

impl EnvGuard {
    /// Set `key` to `value`, remembering what was there before.
    pub fn set(key: &str, value: impl AsRef<std::ffi::OsStr>) -> Self {
        let previous = environment::var(key).ok();
        environment::set_var(key, value);
        Self {
            key: key.to_string(),
            previous,
        }
    }

    /// Unset `key`, remembering what was there before.
    pub fn remove(key: &str) -> Self {
        let previous = environment::var(key).ok();
        environment::remove_var(key);
        Self {
            key: key.to_string(),
            previous,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match self.previous.take() {
            Some(value) => environment::set_var(&self.key, value),
            None => environment::remove_var(&self.key),
        }
    }
}
