use std::fmt;

use regex::Regex;

const WORDS_PER_MINUTE: usize = 200;

/// URL-friendly identifier derived from a post title
#[derive(Debug, PartialEq, Clone)]
pub struct Slug(String);

impl Slug {
    /// Lowercase the title, drop everything that is not a word character or
    /// whitespace, then join the remaining words with dashes
    pub fn from_title(title: &str) -> Self {
        lazy_static::lazy_static! {
            static ref STRIP_REGEX: Regex = Regex::new(r"[^\w\s]").unwrap();
            static ref SPACE_REGEX: Regex = Regex::new(r"\s+").unwrap();
        }

        let lowered = title.to_lowercase();
        let stripped = STRIP_REGEX.replace_all(&lowered, "");
        let slug = SPACE_REGEX.replace_all(stripped.trim(), "-");

        Self(slug.into_owned())
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Estimated reading time in whole minutes, never less than one
pub fn read_time_minutes(content: &str) -> i32 {
    let words = content.split_whitespace().count();
    let minutes = (words + WORDS_PER_MINUTE - 1) / WORDS_PER_MINUTE;

    minutes.max(1) as i32
}
