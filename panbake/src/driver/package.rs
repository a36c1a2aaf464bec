//! Upgradable packages and the commands that install them.

use std::fmt;

/// Something the appliance can download and install as a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Package {
    /// Applications and threats content, latest version.
    Content,
    /// Anti-virus signatures, latest version.
    AntiVirus,
    /// GlobalProtect clientless VPN applications, latest version.
    GlobalProtectClientlessVpn,
    /// WildFire signatures, latest version.
    Wildfire,
    /// VM-Series plugin file, e.g. `vm_series-2.1.3`.
    Plugin(String),
    /// PAN-OS software image, e.g. `PanOS_vm-10.1.3`.
    Software(String),
}

impl Package {
    /// Refreshes the list of available versions.
    pub fn check_command(&self) -> String {
        match self {
            Package::Plugin(_) => "request plugins check".to_string(),
            Package::Software(_) => "request system software check".to_string(),
            _ => format!("request {} upgrade check", self.upgrade_keyword()),
        }
    }

    /// Starts the download job.
    pub fn download_command(&self) -> String {
        match self {
            Package::Plugin(file) => format!("request plugins download file {file}"),
            Package::Software(image) => format!("request system software download file {image}"),
            _ => format!("request {} upgrade download latest", self.upgrade_keyword()),
        }
    }

    /// Starts the install job.
    pub fn install_command(&self) -> String {
        match self {
            Package::Plugin(file) => format!("request plugins install {file}"),
            Package::Software(image) => format!(
                "request system software install version {}",
                software_version(image)
            ),
            _ => format!(
                "request {} upgrade install version latest",
                self.upgrade_keyword()
            ),
        }
    }

    /// Whether the device must be restarted after installing.
    pub fn requires_restart(&self) -> bool {
        matches!(self, Package::Software(_))
    }

    fn upgrade_keyword(&self) -> &'static str {
        match self {
            Package::Content => "content",
            Package::AntiVirus => "anti-virus",
            Package::GlobalProtectClientlessVpn => "global-protect-clientless-vpn",
            Package::Wildfire => "wildfire",
            Package::Plugin(_) => "plugins",
            Package::Software(_) => "system software",
        }
    }
}

/// Version part of an image name: everything after `vm-`.
fn software_version(image: &str) -> &str {
    image
        .split_once("vm-")
        .map(|(_, version)| version)
        .unwrap_or(image)
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Package::Plugin(file) => write!(f, "plugin {file}"),
            Package::Software(image) => write!(f, "software {image}"),
            other => write!(f, "{}", other.upgrade_keyword()),
        }
    }
}
