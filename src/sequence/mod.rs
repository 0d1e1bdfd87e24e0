//! Image entries and their ordering.

/// Image entries and incoming files.
pub mod entry;
/// Revocable displayable references.
pub mod handles;
/// The ordered sequence itself.
pub mod list;
/// Ordering modes.
pub mod order;
