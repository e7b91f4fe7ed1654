//! Video identifier extraction from user-supplied URLs.

use crate::error::{Result, TubeQaError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use tracing::debug;

/// Recognised input shapes, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlShape {
    /// `https://www.youtube.com/watch?v=<id>`
    Watch,
    /// `https://youtu.be/<id>`
    Short,
    /// `https://www.youtube.com/embed/<id>`
    Embed,
    /// The bare 11-character identifier.
    Bare,
}

static PATTERNS: LazyLock<Vec<(UrlShape, Regex)>> = LazyLock::new(|| {
    [
        (UrlShape::Watch, r"youtube\.com/watch\?(?:[^#\s]*&)?v=([0-9A-Za-z_-]{11})"),
        (UrlShape::Short, r"youtu\.be/([0-9A-Za-z_-]{11})"),
        (UrlShape::Embed, r"youtube\.com/embed/([0-9A-Za-z_-]{11})"),
        (UrlShape::Bare, r"^([0-9A-Za-z_-]{11})$"),
    ]
    .into_iter()
    .map(|(shape, pattern)| (shape, Regex::new(pattern).expect("Invalid regex")))
    .collect()
});

/// An 11-character video identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    /// Extract the identifier from a URL or bare ID.
    pub fn parse(input: &str) -> Result<Self> {
        Self::parse_with_shape(input).map(|(id, _)| id)
    }

    /// Extract the identifier and report which shape matched.
    pub fn parse_with_shape(input: &str) -> Result<(Self, UrlShape)> {
        let input = input.trim();
        if input.is_empty() {
            return Err(TubeQaError::InvalidInput("URL cannot be empty".to_string()));
        }

        for (shape, regex) in PATTERNS.iter() {
            if let Some(id) = regex.captures(input).and_then(|caps| caps.get(1)) {
                debug!("{:?} pattern matched -> video ID {}", shape, id.as_str());
                return Ok((Self(id.as_str().to_string()), *shape));
            }
        }

        Err(TubeQaError::UnrecognizedUrl(input.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VideoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "AdI_XWv-ZTk";

    #[test]
    fn test_all_shapes_yield_same_id() {
        let inputs = [
            ("https://www.youtube.com/watch?v=AdI_XWv-ZTk", UrlShape::Watch),
            ("https://youtu.be/AdI_XWv-ZTk", UrlShape::Short),
            ("https://www.youtube.com/embed/AdI_XWv-ZTk", UrlShape::Embed),
            ("AdI_XWv-ZTk", UrlShape::Bare),
        ];

        for (input, expected_shape) in inputs {
            let (id, shape) = VideoId::parse_with_shape(input).unwrap();
            assert_eq!(id.as_str(), ID, "input: {}", input);
            assert_eq!(shape, expected_shape, "input: {}", input);
        }
    }

    #[test]
    fn test_extra_query_parameters() {
        let id = VideoId::parse("https://www.youtube.com/watch?v=AdI_XWv-ZTk&t=42s").unwrap();
        assert_eq!(id.as_str(), ID);

        let id = VideoId::parse("https://m.youtube.com/watch?feature=share&v=AdI_XWv-ZTk").unwrap();
        assert_eq!(id.as_str(), ID);

        let id = VideoId::parse("https://youtu.be/AdI_XWv-ZTk?si=abcdef").unwrap();
        assert_eq!(id.as_str(), ID);
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        let id = VideoId::parse("   AdI_XWv-ZTk \n").unwrap();
        assert_eq!(id.as_str(), ID);
    }

    #[test]
    fn test_empty_input_is_invalid() {
        assert!(matches!(VideoId::parse(""), Err(TubeQaError::InvalidInput(_))));
        assert!(matches!(VideoId::parse("   \t"), Err(TubeQaError::InvalidInput(_))));
    }

    #[test]
    fn test_unrecognized_format() {
        for input in [
            "not-a-vid",
            "https://vimeo.com/123456789",
            "https://www.youtube.com/watch?v=short",
            "AdI_XWv-ZTk-and-more",
        ] {
            assert!(
                matches!(VideoId::parse(input), Err(TubeQaError::UnrecognizedUrl(_))),
                "input: {}",
                input
            );
        }
    }

    #[test]
    fn test_any_eleven_character_token_is_bare() {
        let (id, shape) = VideoId::parse_with_shape("not-a-video").unwrap();
        assert_eq!(id.as_str(), "not-a-video");
        assert_eq!(shape, UrlShape::Bare);
        assert_eq!(id.to_string(), "not-a-video");
    }
}
