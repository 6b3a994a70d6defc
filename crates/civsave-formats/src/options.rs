//! Parse configuration

use serde::{Deserialize, Serialize};

use crate::framing::MAX_DECOMPRESSION_SIZE;
use crate::record::DEFAULT_MAX_DEPTH;

/// Options controlling how a save file is parsed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Reject input that does not start with `CIV6`
    pub require_signature: bool,

    /// Maximum nesting of arrays inside array elements
    pub max_depth: usize,

    /// Upper bound for the inflated compressed section (in bytes)
    pub max_decompressed_size: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            require_signature: true,
            max_depth: DEFAULT_MAX_DEPTH,
            max_decompressed_size: MAX_DECOMPRESSION_SIZE, // 1 GiB
        }
    }
}

impl ParseOptions {
    /// Enable or disable the signature check
    #[must_use]
    pub const fn with_signature_check(mut self, enable: bool) -> Self {
        self.require_signature = enable;
        self
    }

    /// Set the array nesting limit
    #[must_use]
    pub const fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set the decompression limit
    #[must_use]
    pub const fn with_max_decompressed_size(mut self, size: usize) -> Self {
        self.max_decompressed_size = size;
        self
    }
}
