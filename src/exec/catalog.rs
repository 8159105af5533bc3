// src/exec/catalog.rs

//! Catalog of output phrases that mark a failure as transient.

/// Phrases seen in provider/network failures that usually succeed on retry.
pub const DEFAULT_RETRIABLE_ERRORS: &[&str] = &[
    "RequestError: send request failed",
    "unexpected EOF",
    "Throttling",
    "timeout while waiting for state",
    "ServiceUnavailable: Service Unavailable",
    "failed to decode query XML error response",
    "connection reset",
    "Connection reset",
    "Please try again.",
    "Client.Timeout exceeded",
    "Request limit for operation",
    "try again later",
    "handshake timeout",
    "SSL_ERROR_SYSCALL",
    "ConditionalCheckFailedException",
    "Api Rate Limit Exceeded",
    "TooManyUpdates",
];

/// Allow-list of case-sensitive substrings.
///
/// Built once at startup and shared with the retry scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransientErrorCatalog {
    phrases: Vec<String>,
}

impl Default for TransientErrorCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_RETRIABLE_ERRORS.iter().copied())
    }
}

impl TransientErrorCatalog {
    /// Empty phrases are ignored; they would match every line.
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut catalog = Self {
            phrases: Vec::new(),
        };
        catalog.extend(phrases);
        catalog
    }

    /// Default catalog plus `extra`.
    pub fn with_extra<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extend(extra);
        self
    }

    fn extend<I, S>(&mut self, phrases: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for phrase in phrases {
            let phrase = phrase.into();
            if !phrase.is_empty() && !self.phrases.contains(&phrase) {
                self.phrases.push(phrase);
            }
        }
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    /// Lines of `output` containing at least one catalog phrase.
    pub fn matching_lines<'a>(&self, output: &'a [String]) -> Vec<&'a str> {
        output
            .iter()
            .filter(|line| self.phrases.iter().any(|p| line.contains(p.as_str())))
            .map(String::as_str)
            .collect()
    }

    pub fn is_transient(&self, output: &[String]) -> bool {
        output
            .iter()
            .any(|line| self.phrases.iter().any(|p| line.contains(p.as_str())))
    }
}
