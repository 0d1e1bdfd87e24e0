//! Capture: the stream derived from the drawing surface, the runtime seam and the export
//! pipeline that ties sequence, renderer and encoder together.

/// In-process runtime.
pub mod memory;
/// Output blobs, files and naming.
pub mod output;
/// The export pipeline.
pub mod pipeline;
/// Platform services (`MediaRuntime`) and the native runtime.
pub mod runtime;
/// Sampled capture stream.
pub mod stream;
