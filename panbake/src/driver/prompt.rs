//! Prompt tracking for operational and configuration modes.

/// CLI mode the session is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Operational mode (`admin@PA-VM>`).
    Operational,
    /// Configuration mode (`admin@PA-VM#`).
    Configuration,
}

/// Tracks the prompt the device is expected to print next.
///
/// The operational prompt is learned from the device during session setup;
/// until then no prompt is assumed. The configuration prompt is always
/// derived from the operational one.
#[derive(Debug, Clone)]
pub struct PromptTracker {
    operational: Option<String>,
    indicator: char,
    mode: Mode,
}

impl PromptTracker {
    /// Create a tracker using `indicator` as the configuration-mode prompt
    /// suffix.
    pub fn new(indicator: char) -> Self {
        Self {
            operational: None,
            indicator,
            mode: Mode::Operational,
        }
    }

    /// Record the operational prompt seen on the device.
    pub fn observe(&mut self, prompt: impl Into<String>) {
        self.operational = Some(prompt.into());
        self.mode = Mode::Operational;
    }

    /// Whether the operational prompt has been learned.
    pub fn is_bootstrapped(&self) -> bool {
        self.operational.is_some()
    }

    /// The operational prompt, once known.
    pub fn operational(&self) -> Option<&str> {
        self.operational.as_deref()
    }

    /// The configuration prompt: the operational prompt with its last
    /// character replaced by the configuration indicator.
    pub fn configuration(&self) -> Option<String> {
        let prompt = self.operational.as_deref()?;
        let mut chars = prompt.chars();
        chars.next_back();
        Some(format!("{}{}", chars.as_str(), self.indicator))
    }

    /// The prompt for the current mode.
    pub fn current(&self) -> Option<String> {
        match self.mode {
            Mode::Operational => self.operational.clone(),
            Mode::Configuration => self.configuration(),
        }
    }

    /// The current mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Switch modes.
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }
}

/// Extract the prompt from the end of a response: its last non-empty line,
/// with surrounding whitespace removed.
pub(crate) fn last_line(text: &str) -> Option<&str> {
    text.lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty())
}
