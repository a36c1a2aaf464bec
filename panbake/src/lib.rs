//! # Panbake
//!
//! Async interactive-CLI automation for PAN-OS VM-Series appliances.
//!
//! Panbake drives the appliance's SSH shell the way an operator would and
//! turns it into a reliable request/response protocol: prompt-anchored
//! completion detection, automatic `--(more)--` pagination, configuration
//! transactions, job polling and reconnect-after-reboot. On top of that it
//! provides the maintenance steps used when baking appliance images:
//! licensing, content and software upgrades, verification and
//! private-data reset.
//!
//! ## Features
//!
//! - Async SSH connections via russh
//! - End-anchored tail search over decoded, escape-free output
//! - Typed command requests and layered, matchable errors
//! - Session replacement after restarts, with observable state history
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use panbake::{DeviceBuilder, Package};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), panbake::Error> {
//!     let mut device = DeviceBuilder::new("203.0.113.10")
//!         .username("admin")
//!         .private_key("/home/me/.ssh/vmseries.pem")
//!         .build()?;
//!
//!     device.open_when_ready().await?;
//!     device.license("I1234567").await?;
//!     device.install(&Package::Content).await?;
//!
//!     let output = device.exec("show system info").await?;
//!     println!("{}", output.result);
//!
//!     device.close().await?;
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod driver;
pub mod error;
pub mod platform;
pub mod transport;

// Re-export main types for convenience
pub use driver::{
    CommandRequest, ConfigSession, DeviceBuilder, Output, Package, PanosDevice, Session,
    SystemInfo,
};
pub use error::Error;
pub use platform::PlatformDefinition;
pub use transport::{AuthMethod, HostKeyVerification, SshConfig};
