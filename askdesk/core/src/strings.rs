//! Localized UI Strings
//!
//! Every piece of text the session controller writes into state comes from
//! here, so a surface can switch language without touching the reducer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Display language
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// English
    #[default]
    En,
    /// Japanese
    Ja,
}

impl Locale {
    /// String table for this locale
    pub fn strings(self) -> &'static Strings {
        match self {
            Self::En => &EN,
            Self::Ja => &JA,
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::En => write!(f, "en"),
            Self::Ja => write!(f, "ja"),
        }
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Self::En),
            "ja" | "japanese" => Ok(Self::Ja),
            other => Err(format!("unknown locale '{other}' (expected 'en' or 'ja')")),
        }
    }
}

/// Text table used by the session reducer
#[derive(Debug)]
pub struct Strings {
    /// Validation error for blank input
    pub empty_input: &'static str,
    /// Prefix for JSON parse failures; the parser detail follows
    pub invalid_json: &'static str,
    /// Prefix for over-long input; the limit follows
    pub input_too_long: &'static str,
    /// Agent text used when a chat reply has no answer
    pub empty_answer: &'static str,
    /// Tag prepended to inline chat errors
    pub error_tag: &'static str,
    /// Prefix for HTTP failures
    pub http_error: &'static str,
    /// Prefix for network failures
    pub network_error: &'static str,
}

static EN: Strings = Strings {
    empty_input: "Please enter a request.",
    invalid_json: "Invalid JSON",
    input_too_long: "Input is too long; the limit is",
    empty_answer: "response was empty",
    error_tag: "[Error]",
    http_error: "Request failed with HTTP",
    network_error: "Network error",
};

static JA: Strings = Strings {
    empty_input: "リクエストを入力してください。",
    invalid_json: "JSONの形式が正しくありません",
    input_too_long: "入力が長すぎます。上限は",
    empty_answer: "応答が空でした",
    error_tag: "[エラー]",
    http_error: "リクエストが失敗しました HTTP",
    network_error: "ネットワークエラー",
};

impl Strings {
    /// "Invalid JSON: <detail>"
    pub fn format_invalid_json(&self, detail: &str) -> String {
        format!("{}: {detail}", self.invalid_json)
    }

    /// "Input is too long; the limit is <max>"
    pub fn format_input_too_long(&self, max_chars: usize) -> String {
        format!("{} {max_chars}", self.input_too_long)
    }

    /// "Request failed with HTTP <status>: <excerpt>"
    pub fn format_http_failure(&self, status: u16, body_excerpt: &str) -> String {
        if body_excerpt.trim().is_empty() {
            format!("{} {status}", self.http_error)
        } else {
            format!("{} {status}: {body_excerpt}", self.http_error)
        }
    }

    /// "Network error: <cause>"
    pub fn format_network_failure(&self, cause: &str) -> String {
        format!("{}: {cause}", self.network_error)
    }

    /// "[Error] <detail>", used for inline chat failures
    pub fn tag_error(&self, detail: &str) -> String {
        format!("{} {detail}", self.error_tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_parsing() {
        assert_eq!("en".parse::<Locale>().unwrap(), Locale::En);
        assert_eq!(" JA ".parse::<Locale>().unwrap(), Locale::Ja);
        assert!("fr".parse::<Locale>().is_err());
        assert_eq!(Locale::default(), Locale::En);
    }

    #[test]
    fn test_http_failure_formatting() {
        let s = Locale::En.strings();
        assert_eq!(
            s.format_http_failure(503, "busy"),
            "Request failed with HTTP 503: busy"
        );
        assert_eq!(s.format_http_failure(404, ""), "Request failed with HTTP 404");
    }

    #[test]
    fn test_error_tag_per_locale() {
        assert_eq!(Locale::En.strings().tag_error("boom"), "[Error] boom");
        assert!(Locale::Ja.strings().tag_error("boom").starts_with("[エラー]"));
    }
}
