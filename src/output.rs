//! Offline outputs for the granular engine.

#[cfg(feature = "wav-output")]
pub mod wav;
