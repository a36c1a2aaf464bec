//! Terminator patterns for response completion detection.

use regex::Regex;

use crate::error::ChannelError;

/// How a terminator is interpreted when it completes a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminatorRole {
    /// Normal completion (a prompt, an expected banner).
    Complete,
    /// Completion that means the command did not do what was asked.
    Failure,
    /// The device paused output and waits for a keystroke.
    Continuation,
}

#[derive(Debug, Clone)]
struct Terminator {
    source: String,
    search: Regex,
    role: TerminatorRole,
}

/// An ordered set of terminator patterns.
///
/// The set matches only when one of its patterns sits at the very end of
/// the output, optionally followed by whitespace. A prompt string that
/// merely appears in the middle of the output (quoted in a log line, say)
/// does not complete the response.
#[derive(Debug, Clone)]
pub struct TerminatorSet {
    terminators: Vec<Terminator>,
    anchored: Option<Regex>,
}

impl TerminatorSet {
    /// Create an empty set. An empty set never matches.
    pub fn new() -> Self {
        Self {
            terminators: Vec::new(),
            anchored: None,
        }
    }

    /// Build a set of literal completion strings.
    pub fn literals<I, S>(items: I) -> Result<Self, ChannelError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        items
            .into_iter()
            .try_fold(Self::new(), |set, item| set.literal(item.as_ref()))
    }

    /// Add a literal completion string.
    pub fn literal(self, text: &str) -> Result<Self, ChannelError> {
        self.push(regex::escape(text), TerminatorRole::Complete)
    }

    /// Add a regex completion pattern.
    pub fn regex(self, pattern: &str) -> Result<Self, ChannelError> {
        self.push(pattern.to_string(), TerminatorRole::Complete)
    }

    /// Add a literal string whose appearance means the command failed.
    pub fn failure_literal(self, text: &str) -> Result<Self, ChannelError> {
        self.push(regex::escape(text), TerminatorRole::Failure)
    }

    /// Add a literal pagination marker.
    pub fn continuation_literal(self, text: &str) -> Result<Self, ChannelError> {
        self.push(regex::escape(text), TerminatorRole::Continuation)
    }

    fn push(mut self, source: String, role: TerminatorRole) -> Result<Self, ChannelError> {
        let search = Regex::new(&source)?;
        self.terminators.push(Terminator {
            source,
            search,
            role,
        });

        let alternatives: Vec<&str> = self
            .terminators
            .iter()
            .map(|t| t.source.as_str())
            .collect();
        self.anchored = Some(Regex::new(&format!(
            r"(?:{})\s*$",
            alternatives.join("|")
        ))?);

        Ok(self)
    }

    /// Whether `text` ends with one of the terminators.
    pub fn matches_end(&self, text: &str) -> bool {
        self.anchored
            .as_ref()
            .is_some_and(|re| re.is_match(text))
    }

    /// Byte offset where the trailing terminator starts, if any.
    pub fn end_match_start(&self, text: &str) -> Option<usize> {
        self.anchored
            .as_ref()
            .and_then(|re| re.find(text))
            .map(|m| m.start())
    }

    /// Index of the first non-continuation pattern, in set order, that
    /// occurs anywhere in `text`.
    ///
    /// This is the tie-break when several patterns could have completed
    /// the response, e.g. a reboot banner followed by a prompt.
    pub fn first_found(&self, text: &str) -> Option<usize> {
        self.terminators
            .iter()
            .position(|t| t.role != TerminatorRole::Continuation && t.search.is_match(text))
    }

    /// Role of the pattern at `index`.
    pub fn role(&self, index: usize) -> Option<TerminatorRole> {
        self.terminators.get(index).map(|t| t.role)
    }

    /// Source pattern at `index`.
    pub fn pattern(&self, index: usize) -> Option<&str> {
        self.terminators.get(index).map(|t| t.source.as_str())
    }

    /// Number of patterns in the set.
    pub fn len(&self) -> usize {
        self.terminators.len()
    }

    /// Whether the set has no patterns.
    pub fn is_empty(&self) -> bool {
        self.terminators.is_empty()
    }

    /// Human-readable list of the patterns, for log messages.
    pub fn describe(&self) -> String {
        self.terminators
            .iter()
            .map(|t| t.source.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Default for TerminatorSet {
    fn default() -> Self {
        Self::new()
    }
}
