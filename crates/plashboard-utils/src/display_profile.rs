//! The display profile: six positive integers describing the
//! target screen that the external writer lays the dashboard out against.
//! Lives in `plashboard-utils` because both the config crate (defaults) and
//! the store crate (persisted overrides) need the same shape.

use serde::{Deserialize, Serialize};

/// Minimum viewport width enforced by `displayProfileSet`.
pub const MIN_WIDTH_PX: u32 = 320;
/// Minimum viewport height enforced by `displayProfileSet`.
pub const MIN_HEIGHT_PX: u32 = 240;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayProfile {
    pub width_px: u32,
    pub height_px: u32,
    pub safe_top_px: u32,
    pub safe_bottom_px: u32,
    pub safe_side_px: u32,
    pub layout_safety_margin_px: u32,
}

impl Default for DisplayProfile {
    fn default() -> Self {
        Self {
            width_px: 1920,
            height_px: 1080,
            safe_top_px: 96,
            safe_bottom_px: 106,
            safe_side_px: 28,
            layout_safety_margin_px: 24,
        }
    }
}

/// Partial override for `displayProfileSet`: every field is
/// optional, unset fields keep the current effective value.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DisplayProfilePatch {
    pub width_px: Option<u32>,
    pub height_px: Option<u32>,
    pub safe_top_px: Option<u32>,
    pub safe_bottom_px: Option<u32>,
    pub safe_side_px: Option<u32>,
    pub layout_safety_margin_px: Option<u32>,
}

impl DisplayProfile {
    /// Apply a partial patch, clamping to the documented minimums:
    /// width >= 320, height >= 240, every safe-area/margin value >= 0 (always
    /// true for `u32`, kept explicit for readability at the call site).
    #[must_use]
    pub fn merge_patch(mut self, patch: DisplayProfilePatch) -> Self {
        if let Some(v) = patch.width_px {
            self.width_px = v.max(MIN_WIDTH_PX);
        }
        if let Some(v) = patch.height_px {
            self.height_px = v.max(MIN_HEIGHT_PX);
        }
        if let Some(v) = patch.safe_top_px {
            self.safe_top_px = v;
        }
        if let Some(v) = patch.safe_bottom_px {
            self.safe_bottom_px = v;
        }
        if let Some(v) = patch.safe_side_px {
            self.safe_side_px = v;
        }
        if let Some(v) = patch.layout_safety_margin_px {
            self.layout_safety_margin_px = v;
        }
        self
    }
}
