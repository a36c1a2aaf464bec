//! Platform definitions: the device vocabulary the session engine speaks.

mod definition;
pub mod panos;

pub use definition::PlatformDefinition;
