//! Palo Alto Networks PAN-OS platform definition.
//!
//! # Prompt Examples
//!
//! ```text
//! admin@PA-VM>              # operational mode
//! [edit]                    # configuration context (separate line)
//! admin@PA-VM#              # configuration mode
//! ```
//!
//! The operational prompt is not predictable (it carries the hostname and,
//! on HA pairs, the HA state), so it is read from the device after login
//! instead of being configured here.

use super::PlatformDefinition;

/// Platform name for PAN-OS.
pub const PLATFORM_NAME: &str = "paloalto_panos";

/// CLI environment setup sent after every login.
pub const SETUP_COMMANDS: [&str; 4] = [
    "set cli scripting-mode on",
    "set cli confirmation-prompt off",
    "set cli terminal width 500",
    "set cli terminal height 500",
];

/// Create the PAN-OS platform definition.
pub fn platform() -> PlatformDefinition {
    let platform = PlatformDefinition::new(PLATFORM_NAME)
        .with_prompt_pattern(r"[>#]")
        .with_pagination("--(more)--", "\r")
        .with_commit_success("Configuration committed successfully")
        .with_config_prompt_indicator('#')
        .with_reboot_banner("NOW!")
        .with_reboot_banner("Broadcast message from root")
        .with_failure_pattern("Invalid syntax")
        .with_failure_pattern("Unknown command")
        .with_failure_pattern("Server error")
        .with_failure_pattern("Validation Error")
        .with_terminal_size(160, 24);

    SETUP_COMMANDS
        .iter()
        .fold(platform, |p, cmd| p.with_setup_command(*cmd))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panos_platform() {
        let platform = platform();
        assert_eq!(platform.name, "paloalto_panos");
        assert_eq!(platform.setup_commands.len(), 4);
        assert_eq!(platform.setup_commands[1], "set cli confirmation-prompt off");
        assert_eq!(platform.pagination_marker, "--(more)--");
    }

    #[test]
    fn test_reboot_banners_in_order() {
        let platform = platform();
        assert_eq!(
            platform.reboot_banners,
            vec!["NOW!".to_string(), "Broadcast message from root".to_string()]
        );
    }

    #[test]
    fn test_failed_when_contains() {
        let platform = platform();
        assert!(platform.detect_failure("Invalid syntax.").is_some());
        assert!(
            platform
                .detect_failure("Server error : permission denied")
                .is_some()
        );
        assert!(platform.detect_failure("Configuration committed successfully").is_none());
    }
}
