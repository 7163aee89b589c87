//! Overlay text recognition: the recognizer capability plus token parsing.

pub mod recognizer;
pub mod tokens;

pub use recognizer::{MockTextRecognizer, TesseractCli, TextRecognizer, CHAR_WHITELIST};
pub use tokens::{extract_tokens, read_axes, validate_tokens, RawToken, Rejection};
