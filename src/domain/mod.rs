//! Domain layer - Tri-state values and handler contracts
//!
//! The value model shared by every layer, and the traits (ports) the
//! generic handlers implement for the host.

pub mod ports;
pub mod value;

pub use ports::*;
pub use value::Value;
