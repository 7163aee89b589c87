//! Token extraction and per-frame validation of recognized overlay text.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

/// Number of axis readings the overlay shows per frame.
pub const TOKENS_PER_FRAME: usize = 3;

/// A signed decimal with a mandatory fractional part, or a run of 4-5 `*`
/// the recognizer emits for digits it could not resolve.
static NUM_OR_STAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[+-]?\d+\.\d+|\*{4,5}").expect("Invalid token regex"));

#[derive(Debug, Clone, PartialEq)]
pub enum RawToken {
    Number(String),
    Corruption(String),
}

impl RawToken {
    pub fn as_str(&self) -> &str {
        match self {
            RawToken::Number(s) | RawToken::Corruption(s) => s,
        }
    }

    pub fn is_corruption(&self) -> bool {
        matches!(self, RawToken::Corruption(_))
    }
}

/// Why a sampled frame produced no reading.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    TooFewTokens { found: usize },
    Corrupted { token: String },
    NotNumeric { token: String },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::TooFewTokens { found } => {
                write!(f, "expected {} tokens, found {}", TOKENS_PER_FRAME, found)
            }
            Rejection::Corrupted { token } => write!(f, "corruption marker '{}'", token),
            Rejection::NotNumeric { token } => write!(f, "non-numeric token '{}'", token),
        }
    }
}

/// Scans `text` left to right and keeps the first three matches.
pub fn extract_tokens(text: &str) -> Vec<RawToken> {
    NUM_OR_STAR_RE
        .find_iter(text)
        .take(TOKENS_PER_FRAME)
        .map(|m| {
            let s = m.as_str().to_string();
            if s.starts_with('*') {
                RawToken::Corruption(s)
            } else {
                RawToken::Number(s)
            }
        })
        .collect()
}

/// Accepts exactly three parseable, non-corrupted tokens.
pub fn validate_tokens(tokens: &[RawToken]) -> Result<[f64; TOKENS_PER_FRAME], Rejection> {
    if tokens.len() != TOKENS_PER_FRAME {
        return Err(Rejection::TooFewTokens {
            found: tokens.len(),
        });
    }

    if let Some(bad) = tokens.iter().find(|t| t.is_corruption()) {
        return Err(Rejection::Corrupted {
            token: bad.as_str().to_string(),
        });
    }

    let mut values = [0.0f64; TOKENS_PER_FRAME];
    for (slot, token) in values.iter_mut().zip(tokens) {
        *slot = token
            .as_str()
            .parse::<f64>()
            .map_err(|_| Rejection::NotNumeric {
                token: token.as_str().to_string(),
            })?;
    }

    Ok(values)
}

/// Convenience: extract then validate.
pub fn read_axes(text: &str) -> Result<[f64; TOKENS_PER_FRAME], Rejection> {
    validate_tokens(&extract_tokens(text))
}
