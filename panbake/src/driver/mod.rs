//! High-level driver for device interaction.
//!
//! The driver layer turns the raw shell stream into a request/response
//! protocol: a [`Session`] runs one command at a time, a [`ConfigSession`]
//! scopes configuration changes, a [`JobPoller`] waits for device jobs and
//! a [`ReconnectManager`] rebuilds the session after a reboot. The
//! [`PanosDevice`] facade ties them together.

mod builder;
pub mod config_session;
mod device;
mod executor;
pub mod job;
mod package;
mod prompt;
pub mod reconnect;
mod request;
pub(crate) mod response;
pub(crate) mod session;
mod system_info;

pub use builder::DeviceBuilder;
pub use config_session::ConfigSession;
pub use device::PanosDevice;
pub use job::{Job, JobPoller, JobPolicy, JobState};
pub use package::Package;
pub use prompt::{Mode, PromptTracker};
pub use reconnect::{ReconnectManager, ReconnectPolicy, ReconnectState};
pub use request::CommandRequest;
pub use response::Output;
pub use session::{Session, SessionFactory, SessionOptions, Timeouts};
pub use system_info::SystemInfo;
