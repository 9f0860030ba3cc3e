//! MCP tool parameter types and result helpers.
//!
//! All parameter structs derive `Deserialize + JsonSchema` for MCP tool
//! registration and convert into the sdk's unvalidated specs.

pub mod helpers;
pub mod params;

pub use helpers::*;
pub use params::*;
