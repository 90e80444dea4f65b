use serde::{Deserialize, Serialize};

/// Largest body a 3-byte length prefix can describe.
pub const MAX_FRAME_LEN: usize = 0xFF_FFFF;

/// Default bound on node nesting while decoding.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Limits applied by the frame codec.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CodecConfig {
    /// Largest frame body accepted from the peer or produced for it.
    pub max_frame_len: usize,
    /// Deepest node nesting accepted while decoding.
    pub max_depth: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_frame_len: MAX_FRAME_LEN,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl CodecConfig {
    /// Parse a JSON config; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Override the frame body limit. Values above the 24-bit ceiling are
    /// clamped to it.
    pub fn with_max_frame_len(mut self, len: usize) -> Self {
        self.max_frame_len = len.min(MAX_FRAME_LEN);
        self
    }

    /// Override the nesting limit.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Frame body limit, never above the 24-bit ceiling.
    pub fn frame_limit(&self) -> usize {
        self.max_frame_len.min(MAX_FRAME_LEN)
    }
}
