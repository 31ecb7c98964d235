/*
[INPUT]:  Public API exports for logdeck-tui crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - terminal host library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod bridge;
pub mod config;
pub mod demo;
pub mod tui;

// Re-export main types for convenience
pub use bridge::RecorderLayer;
pub use config::ViewerConfig;
