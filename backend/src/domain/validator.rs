//! Form validation helpers.
//!
//! A [`Validator`] accumulates per-field and form-wide messages while a
//! handler checks submitted values. The first message recorded for a field
//! wins so users see the most fundamental problem first.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Minimum password length in characters.
pub const PASSWORD_MIN_CHARS: usize = 8;
/// Maximum snippet title length in characters.
pub const TITLE_MAX_CHARS: usize = 100;

/// WHATWG HTML e-mail address grammar.
const EMAIL_PATTERN: &str = concat!(
    r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])",
    r"?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
);

#[expect(
    clippy::expect_used,
    reason = "the pattern is a compile-time constant covered by unit tests"
)]
fn compile_email_rx() -> Regex {
    Regex::new(EMAIL_PATTERN).expect("e-mail pattern is a valid regex")
}

static EMAIL_RX: LazyLock<Regex> = LazyLock::new(compile_email_rx);

/// Pattern for a valid e-mail address as defined by the WHATWG HTML standard.
pub fn email_rx() -> &'static Regex {
    &EMAIL_RX
}

/// Accumulated validation messages for one form submission.
///
/// # Examples
/// ```
/// use snippetbox::domain::validator::{Validator, not_blank};
///
/// let mut form = Validator::default();
/// form.check_field(not_blank(""), "title", "This field cannot be blank");
/// form.check_field(false, "title", "ignored");
/// assert!(!form.is_valid());
/// assert_eq!(form.field_error("title"), Some("This field cannot be blank"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Validator {
    field_errors: BTreeMap<String, String>,
    non_field_errors: Vec<String>,
}

impl Validator {
    /// True when neither field nor form-wide errors were recorded.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.field_errors.is_empty() && self.non_field_errors.is_empty()
    }

    /// Record `message` against `field` unless the field already has one.
    pub fn add_field_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.field_errors
            .entry(field.into())
            .or_insert_with(|| message.into());
    }

    /// Record a message that does not belong to any single field.
    pub fn add_non_field_error(&mut self, message: impl Into<String>) {
        self.non_field_errors.push(message.into());
    }

    /// Record `message` against `field` when `ok` is false.
    pub fn check_field(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add_field_error(field, message);
        }
    }

    /// Message recorded for `field`, if any.
    #[must_use]
    pub fn field_error(&self, field: &str) -> Option<&str> {
        self.field_errors.get(field).map(String::as_str)
    }

    /// Form-wide messages in insertion order.
    #[must_use]
    pub fn non_field_errors(&self) -> &[String] {
        &self.non_field_errors
    }
}

/// True when `value` contains a non-whitespace character.
#[must_use]
pub fn not_blank(value: &str) -> bool {
    !value.trim().is_empty()
}

/// True when `value` has at most `n` characters (Unicode scalar values).
#[must_use]
pub fn max_chars(value: &str, n: usize) -> bool {
    value.chars().count() <= n
}

/// True when `value` has at least `n` characters (Unicode scalar values).
#[must_use]
pub fn min_chars(value: &str, n: usize) -> bool {
    value.chars().count() >= n
}

/// True when `value` is one of `permitted`.
#[must_use]
pub fn permitted_value<T: PartialEq>(value: &T, permitted: &[T]) -> bool {
    permitted.contains(value)
}

/// True when `value` matches `rx`.
#[must_use]
pub fn matches(value: &str, rx: &Regex) -> bool {
    rx.is_match(value)
}
