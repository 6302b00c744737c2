//! Encoding detection from a short prefix of the input.
//!
//! Only the first few lines are handed to the statistical guesser; large
//! exports are never scanned in full just to pick a decoder. A guess below
//! the confidence floor is discarded in favour of the configured default.

use std::path::Path;

use encoding_rs::{Encoding, SHIFT_JIS, UTF_8};
use log::{info, warn};

use crate::{config::AuditConfig, error::Result, io_utils};

/// A raw guess as reported by a detector, before label resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodingGuess {
    pub label: String,
    pub confidence: f32,
}

/// Statistical encoding guesser. Implementations see only the sampled bytes.
pub trait EncodingGuesser {
    fn guess(&self, sample: &[u8]) -> Option<EncodingGuess>;
}

/// Guesser backed by the `chardet` crate (a port of the Universal Charset
/// Detector).
#[derive(Debug, Default, Clone, Copy)]
pub struct ChardetGuesser;

impl EncodingGuesser for ChardetGuesser {
    fn guess(&self, sample: &[u8]) -> Option<EncodingGuess> {
        let bytes = sample.to_vec();
        let (charset, confidence, _language) = chardet::detect(&bytes);
        if charset.is_empty() {
            return None;
        }
        let label = chardet::charset2encoding(&charset).to_string();
        Some(EncodingGuess { label, confidence })
    }
}

/// Guesser that always reports the same result. Handy for pinning behaviour
/// in tests and for callers who already know the source system.
#[derive(Debug, Clone)]
pub struct FixedGuesser(pub Option<EncodingGuess>);

impl FixedGuesser {
    pub fn new(label: &str, confidence: f32) -> Self {
        Self(Some(EncodingGuess {
            label: label.to_string(),
            confidence,
        }))
    }
}

impl EncodingGuesser for FixedGuesser {
    fn guess(&self, _sample: &[u8]) -> Option<EncodingGuess> {
        self.0.clone()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EncodingDecision {
    pub encoding: &'static Encoding,
    pub confidence: f32,
    pub fallback_used: bool,
}

impl EncodingDecision {
    pub fn detected_encoding(&self) -> &'static str {
        self.encoding.name()
    }

    fn fallback(encoding: &'static Encoding, confidence: f32) -> Self {
        Self {
            encoding,
            confidence,
            fallback_used: true,
        }
    }
}

/// Chooses the encoding for `path`.
///
/// An explicit `override_label` wins outright. Otherwise the guesser sees at
/// most `config.detection_sample_lines` lines; a guess is used when its
/// confidence is at least `config.min_confidence` and its label names a
/// known encoding.
pub fn detect_encoding(
    path: &Path,
    override_label: Option<&str>,
    config: &AuditConfig,
    guesser: &dyn EncodingGuesser,
) -> Result<EncodingDecision> {
    io_utils::ensure_exists(path)?;
    if let Some(label) = override_label {
        let encoding = io_utils::encoding_for_label(label)?;
        info!("Using requested encoding {} for {path:?}", encoding.name());
        return Ok(EncodingDecision {
            encoding,
            confidence: 1.0,
            fallback_used: false,
        });
    }

    let default = config.default_encoding()?;
    let sample = io_utils::read_leading_lines(path, config.detection_sample_lines)?;
    if sample.is_empty() {
        warn!("{path:?} is empty; using default encoding {}", default.name());
        return Ok(EncodingDecision::fallback(default, 0.0));
    }

    let Some(guess) = guesser.guess(&sample) else {
        warn!(
            "Could not detect the encoding of {path:?}; using default {}",
            default.name()
        );
        return Ok(EncodingDecision::fallback(default, 0.0));
    };
    info!(
        "Detected encoding for {path:?}: {} (confidence {:.2})",
        guess.label, guess.confidence
    );

    if guess.confidence < config.min_confidence {
        warn!(
            "Detection confidence {:.2} is below {:.2}; using default {}",
            guess.confidence,
            config.min_confidence,
            default.name()
        );
        return Ok(EncodingDecision::fallback(default, guess.confidence));
    }

    match resolve_guess_label(&guess.label) {
        Some(encoding) => Ok(EncodingDecision {
            encoding,
            confidence: guess.confidence,
            fallback_used: false,
        }),
        None => {
            warn!(
                "Detected label '{}' has no decoder; using default {}",
                guess.label,
                default.name()
            );
            Ok(EncodingDecision::fallback(default, guess.confidence))
        }
    }
}

/// Plain ASCII is read as UTF-8 so later non-ASCII rows still decode.
fn resolve_guess_label(label: &str) -> Option<&'static Encoding> {
    let lowered = label.trim().to_ascii_lowercase();
    if matches!(lowered.as_str(), "ascii" | "us-ascii") {
        return Some(UTF_8);
    }
    io_utils::encoding_for_label(&lowered).ok()
}

/// Encoding tried after `primary` fails to decode the whole file. Never
/// equal to `primary`: UTF-8 for any legacy primary, else the configured
/// default, else Shift_JIS when the default is UTF-8 as well.
pub fn secondary_encoding(
    primary: &'static Encoding,
    default: &'static Encoding,
) -> &'static Encoding {
    if primary != UTF_8 {
        UTF_8
    } else if default != UTF_8 {
        default
    } else {
        SHIFT_JIS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{EUC_JP, WINDOWS_1252};

    #[test]
    fn ascii_guess_resolves_to_utf8() {
        assert_eq!(resolve_guess_label("ascii"), Some(UTF_8));
        assert_eq!(resolve_guess_label("SHIFT_JIS"), Some(SHIFT_JIS));
        assert_eq!(resolve_guess_label("windows-31j"), Some(SHIFT_JIS));
        assert_eq!(resolve_guess_label("not-a-charset"), None);
    }

    #[test]
    fn secondary_never_repeats_the_primary() {
        assert_eq!(secondary_encoding(SHIFT_JIS, SHIFT_JIS), UTF_8);
        assert_eq!(secondary_encoding(WINDOWS_1252, SHIFT_JIS), UTF_8);
        assert_eq!(secondary_encoding(UTF_8, SHIFT_JIS), SHIFT_JIS);
        assert_eq!(secondary_encoding(UTF_8, EUC_JP), EUC_JP);
        assert_eq!(secondary_encoding(UTF_8, UTF_8), SHIFT_JIS);
    }

    #[test]
    fn fixed_guesser_ignores_sample() {
        let guesser = FixedGuesser::new("utf-8", 0.5);
        let guess = guesser.guess(b"anything").unwrap();
        assert_eq!(guess.label, "utf-8");
        assert_eq!(guess.confidence, 0.5);
    }
}
