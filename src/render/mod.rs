//! Frame rendering: letterbox placement and painting onto a CPU surface.

/// Decoding and painting one still.
pub mod frame;
/// Aspect-preserving placement.
pub mod letterbox;
/// CPU drawing surface.
pub mod surface;
