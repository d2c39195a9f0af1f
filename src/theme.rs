//! Navy/indigo palette of the portfolio backgrounds

use crate::core::Rgba;

/// Default starfield palette. blue-800 appears twice.
pub const FIELD_PALETTE: &[&str] = &["#1e40af", "#1e3a8a", "#312e81", "#1e40af"];

pub mod colors {
    use super::Rgba;

    // === Starfield ===
    pub const BACKDROP_INNER: Rgba = Rgba::from_rgb8_alpha(30, 64, 175, 0.05);  // blue-800 @ 5%
    pub const BACKDROP_OUTER: Rgba = Rgba::from_rgb8_alpha(30, 58, 138, 0.02);  // blue-900 @ 2%
    pub const LINK: Rgba = Rgba::from_rgb8(30, 64, 175);                         // alpha set per line
    pub const LINK_WIDTH: f64 = 0.5;

    // === Wave scene ===
    pub const WAVE_CLEAR: Rgba = Rgba::from_rgb8_alpha(0x0a, 0x16, 0x28, 0.8);
    pub const WAVE_LOW: Rgba = Rgba::from_hex(0x1e3a8a);                         // color at the troughs
    pub const WAVE_HIGH: Rgba = Rgba::from_hex(0x0f172a);                        // color at the crests
    pub const WAVE_ALPHA: f32 = 0.6;

    // === Page ===
    pub const PAGE_BG: Rgba = Rgba::from_hex(0x0f172a);                          // slate-900
    pub const TEXT_SECONDARY: Rgba = Rgba::from_rgb8(148, 163, 184);             // slate-400
    pub const TEXT_MUTED: Rgba = Rgba::from_rgb8(100, 116, 139);                 // slate-500
    pub const TEXT_ERROR: Rgba = Rgba::from_rgb8(200, 100, 100);
}
