//! Output policy applied to every answer before it reaches the user.

use crate::types::Answer;

/// Placeholder substituted for redacted terms.
pub const REDACTION_PLACEHOLDER: &str = "[REDACTED]";

/// Disclaimer appended to every reviewed answer.
pub const DISCLAIMER: &str = "\n\n[Note: This response is generated based on provided documents and may not replace official policies.]";

/// Terms redacted by default. Matching is case-sensitive.
pub const DEFAULT_REDACTIONS: &[&str] = &["confidential"];

/// Deterministic text rewrite: literal substitutions, then a disclaimer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplianceFilter {
    redactions: Vec<(String, String)>,
    disclaimer: String,
}

impl Default for ComplianceFilter {
    fn default() -> Self {
        Self::with_terms(std::iter::empty::<String>())
    }
}

impl ComplianceFilter {
    /// Default rules plus `extra_terms`, each replaced by `[REDACTED]`.
    pub fn with_terms<I, S>(extra_terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let redactions = DEFAULT_REDACTIONS
            .iter()
            .map(|t| t.to_string())
            .chain(extra_terms.into_iter().map(Into::into))
            .filter(|t| !t.is_empty())
            .map(|t| (t, REDACTION_PLACEHOLDER.to_string()))
            .collect();

        Self {
            redactions,
            disclaimer: DISCLAIMER.to_string(),
        }
    }

    /// Apply substitutions in order and append the disclaimer. Never fails.
    pub fn review_text(&self, text: &str) -> String {
        let mut reviewed = self.redact(text);
        reviewed.push_str(&self.disclaimer);
        reviewed
    }

    /// Review the answer text; sources pass through untouched.
    pub fn review(&self, answer: Answer) -> Answer {
        let mut text = self.redact(&answer.text);
        if text != answer.text {
            tracing::info!("Compliance filter redacted answer text");
        }
        text.push_str(&self.disclaimer);

        Answer {
            text,
            sources: answer.sources,
        }
    }

    fn redact(&self, text: &str) -> String {
        self.redactions
            .iter()
            .fold(text.to_string(), |acc, (term, replacement)| {
                acc.replace(term.as_str(), replacement)
            })
    }
}
