#![deny(clippy::all)]

pub mod common;
pub mod csharp;
pub mod error;
pub mod generator;
pub mod walker;

use napi_derive::napi;

// Re-export main types
pub use common::*;
pub use error::{GeneratorError, Result};
pub use generator::config::GeneratorConfig;
pub use generator::Generator;

/// Get the version of the native module
#[napi]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Check if the native module is available
#[napi]
pub fn is_native_available() -> bool {
    true
}

/// PascalCase stem used in callback names (`m_health` → `Health`)
#[napi]
pub fn format_variable_name(name: String) -> String {
    generator::naming::format_variable_name(&name)
}

/// Name of the partial callback method for a raw kind (0-5) and phase (1 = Changing, 2 = Changed)
#[napi]
pub fn get_callback_name(kind: u32, phase: u32, name: String) -> napi::Result<String> {
    Ok(generator::naming::callback_name_from_raw(kind, phase, &name)?)
}

/// Mask enum backing type for a number of callbacks: byte, ushort, uint or ulong
#[napi]
pub fn get_mask_backing_type(count: u32) -> napi::Result<String> {
    let mask = generator::naming::mask_backing_type(count as usize)?;
    Ok(mask.keyword().to_string())
}
