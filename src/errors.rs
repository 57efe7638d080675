//! Error Types
//!
//! This module defines the error types used throughout the crate.
//!
//! Most of the velocity/HBAO frame protocol cannot fail: resource-lifecycle
//! hiccups (stale bone textures, mid-frame resizes, a noise texture that is
//! still loading) are handled by local degradation, never by aborting the
//! frame. The variants below cover the few genuinely invalid inputs, all of
//! them construction-time validation of caller-provided texel data.

use thiserror::Error;

/// The main error type for the Wisp crate.
#[derive(Error, Debug)]
pub enum WispError {
    /// A texel buffer's length does not match its declared dimensions.
    #[error(
        "texel buffer size mismatch for {width}x{height} ({context}): expected {expected} elements, got {actual}"
    )]
    TexelSizeMismatch {
        /// Description of the resource being built
        context: &'static str,
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    /// A resource was constructed with a zero-sized dimension.
    #[error("zero-sized {0} resource")]
    EmptyResource(&'static str),
}

/// Alias for `Result<T, WispError>`.
pub type Result<T> = std::result::Result<T, WispError>;
