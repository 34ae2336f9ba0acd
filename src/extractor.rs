//! Verification code extraction from message text.
//!
//! A code is a run of exactly N digits bounded by word boundaries on both
//! sides, so digits embedded in a longer number or glued to letters are
//! ignored.
//!
//! # Example
//!
//! ```
//! use otp_inbox::extractor::{extract_code, CodeExtractor};
//!
//! assert_eq!(extract_code("your code is 482913 today"), Some("482913"));
//! assert_eq!(extract_code("order 1234567"), None);
//!
//! let pin = CodeExtractor::n_digit(4);
//! assert_eq!(pin.extract("PIN: 0042"), Some("0042"));
//! ```

use regex::Regex;
use std::sync::LazyLock;

static SIX_DIGIT: LazyLock<CodeExtractor> = LazyLock::new(CodeExtractor::six_digit);

/// Returns the first word-bounded 6-digit run in `text`.
#[must_use]
pub fn extract_code(text: &str) -> Option<&str> {
    SIX_DIGIT.extract(text)
}

/// Extracts fixed-length numeric codes.
#[derive(Debug, Clone)]
pub struct CodeExtractor {
    regex: Regex,
    digits: usize,
}

impl CodeExtractor {
    /// Creates an extractor for 6-digit codes.
    #[must_use]
    pub fn six_digit() -> Self {
        Self::n_digit(6)
    }

    /// Creates an extractor for N-digit codes.
    ///
    /// # Panics
    ///
    /// Panics if `digits` is 0.
    #[must_use]
    pub fn n_digit(digits: usize) -> Self {
        assert!(digits > 0, "digits must be > 0");
        let pattern = format!(r"\b\d{{{digits}}}\b");
        Self {
            regex: Regex::new(&pattern).expect("valid regex"),
            digits,
        }
    }

    /// Returns the first code in `text`, borrowed from it.
    #[must_use]
    pub fn extract<'a>(&self, text: &'a str) -> Option<&'a str> {
        self.regex.find(text).map(|m| m.as_str())
    }

    /// Number of digits this extractor looks for.
    #[must_use]
    pub fn digits(&self) -> usize {
        self.digits
    }
}

impl Default for CodeExtractor {
    fn default() -> Self {
        Self::six_digit()
    }
}
