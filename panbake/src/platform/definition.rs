//! Platform definition for device-specific CLI vocabulary.

/// Everything the session engine needs to know about a device's CLI.
///
/// The engine itself is vocabulary-free: prompts, markers, banners and
/// failure strings all come from here.
#[derive(Debug, Clone)]
pub struct PlatformDefinition {
    /// Platform name (e.g., "paloalto_panos").
    pub name: String,

    /// Regex matching any prompt, used before the real prompt is known.
    pub prompt_pattern: String,

    /// Commands that prepare the CLI for scripting after login.
    pub setup_commands: Vec<String>,

    /// Strings in a response that mark the command as failed.
    pub failed_when_contains: Vec<String>,

    /// In-band marker for paused, paginated output.
    pub pagination_marker: String,

    /// Keystroke that resumes paginated output.
    pub continuation_keystroke: String,

    /// Command entering configuration mode.
    pub configure_command: String,

    /// Command leaving configuration mode.
    pub exit_command: String,

    /// Command committing the candidate configuration.
    pub commit_command: String,

    /// Text that must appear in the commit output for success.
    pub commit_success: String,

    /// Last character of the prompt in configuration mode.
    pub config_prompt_indicator: char,

    /// Banners printed when the device starts rebooting.
    pub reboot_banners: Vec<String>,

    /// Terminal width for PTY.
    pub terminal_width: u32,

    /// Terminal height for PTY.
    pub terminal_height: u32,
}

impl PlatformDefinition {
    /// Create a new platform definition with minimal required fields.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prompt_pattern: r"[>#]".to_string(),
            setup_commands: vec![],
            failed_when_contains: vec![],
            pagination_marker: String::new(),
            continuation_keystroke: "\r".to_string(),
            configure_command: "configure".to_string(),
            exit_command: "exit".to_string(),
            commit_command: "commit".to_string(),
            commit_success: String::new(),
            config_prompt_indicator: '#',
            reboot_banners: vec![],
            terminal_width: 160,
            terminal_height: 24,
        }
    }

    /// Set the generic prompt regex.
    pub fn with_prompt_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.prompt_pattern = pattern.into();
        self
    }

    /// Add a session setup command.
    pub fn with_setup_command(mut self, command: impl Into<String>) -> Self {
        self.setup_commands.push(command.into());
        self
    }

    /// Add a failure pattern.
    pub fn with_failure_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.failed_when_contains.push(pattern.into());
        self
    }

    /// Set the pagination marker and the keystroke that dismisses it.
    pub fn with_pagination(
        mut self,
        marker: impl Into<String>,
        keystroke: impl Into<String>,
    ) -> Self {
        self.pagination_marker = marker.into();
        self.continuation_keystroke = keystroke.into();
        self
    }

    /// Set the commit success text.
    pub fn with_commit_success(mut self, text: impl Into<String>) -> Self {
        self.commit_success = text.into();
        self
    }

    /// Set the configuration-mode prompt indicator.
    pub fn with_config_prompt_indicator(mut self, indicator: char) -> Self {
        self.config_prompt_indicator = indicator;
        self
    }

    /// Add a reboot banner.
    pub fn with_reboot_banner(mut self, banner: impl Into<String>) -> Self {
        self.reboot_banners.push(banner.into());
        self
    }

    /// Set terminal dimensions.
    pub fn with_terminal_size(mut self, width: u32, height: u32) -> Self {
        self.terminal_width = width;
        self.terminal_height = height;
        self
    }

    /// The first failure pattern contained in `output`, if any.
    pub fn detect_failure(&self, output: &str) -> Option<&str> {
        self.failed_when_contains
            .iter()
            .find(|pattern| output.contains(pattern.as_str()))
            .map(String::as_str)
    }
}
