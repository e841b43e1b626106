//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use crate::grid::Rgb;
use crate::paint::hex_to_rgb;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Number of quick-pick swatches (keys 1..=6).
pub const SWATCH_COUNT: usize = 6;

/// One Dark UI colours plus the paint swatches, optionally loaded from a theme file.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Quick-pick paint colours: black, green, yellow, red, blue, magenta.
    pub swatches: [Rgb; SWATCH_COUNT],
    /// Empty board cells.
    pub bg: Color,
    /// Grid / border.
    pub div_line: Color,
    /// Text (status, counts).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Key hints and disabled controls.
    pub inactive_fg: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::onedark_default()
    }
}

const ONEDARK_SWATCHES: [Rgb; SWATCH_COUNT] = [
    Rgb(0x00, 0x00, 0x00),
    Rgb(0x98, 0xC3, 0x79), // green
    Rgb(0xE5, 0xC0, 0x7B), // yellow
    Rgb(0xE0, 0x6C, 0x75), // red
    Rgb(0x61, 0xAF, 0xEF), // blue
    Rgb(0xC6, 0x78, 0xDD), // magenta
];

impl Theme {
    /// Hardcoded One Dark defaults (hex values from onedark.theme).
    pub fn onedark_default() -> Self {
        Self {
            swatches: ONEDARK_SWATCHES,
            bg: Color::Rgb(0x31, 0x35, 0x3F),       // meter_bg
            div_line: Color::Rgb(0x3F, 0x44, 0x4F), // div_line
            main_fg: Color::Rgb(0xAB, 0xB2, 0xBF),  // main_fg
            title: Color::Rgb(0xE5, 0xC0, 0x7B),    // title
            inactive_fg: Color::Rgb(0x5C, 0x63, 0x70),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to One Dark defaults if path is None or the file does not exist.
    /// `palette` then swaps the swatches for a high-contrast or colorblind set.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let path = match path {
            Some(p) if p.exists() => p,
            _ => return Ok(Self::default_for_palette(palette)),
        };
        let s = std::fs::read_to_string(path)?;
        let map = parse_theme_file(&s);
        let mut theme = Self::from_map(&map);
        theme.apply_palette(palette);
        Ok(theme)
    }

    fn default_for_palette(palette: crate::Palette) -> Self {
        let mut t = Self::onedark_default();
        t.apply_palette(palette);
        t
    }

    pub fn apply_palette(&mut self, palette: crate::Palette) {
        match palette {
            crate::Palette::Normal => {}
            crate::Palette::HighContrast => {
                self.swatches = [
                    Rgb(0x00, 0x00, 0x00),
                    Rgb(0x00, 0xFF, 0x00),
                    Rgb(0xFF, 0xFF, 0x00),
                    Rgb(0xFF, 0x00, 0x00),
                    Rgb(0x00, 0x88, 0xFF),
                    Rgb(0xFF, 0x00, 0xFF),
                ];
            }
            crate::Palette::Colorblind => {
                // Paul Tol's vibrant set; avoids red/green pairs.
                self.swatches = [
                    Rgb(0x00, 0x00, 0x00),
                    Rgb(0x00, 0x77, 0xBB),
                    Rgb(0xEE, 0x77, 0x33),
                    Rgb(0x00, 0x99, 0x88),
                    Rgb(0xCC, 0x33, 0x11),
                    Rgb(0xEE, 0x33, 0x77),
                ];
            }
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| map.get(key).and_then(|v| parse_hex(v).ok());
        let get_rgb = |key: &str| map.get(key).and_then(|v| hex_to_rgb(v.trim()).ok());
        let d = Self::onedark_default();
        let s = ONEDARK_SWATCHES;
        Self {
            swatches: [
                s[0],
                get_rgb("mem_box").or_else(|| get_rgb("cpu_start")).unwrap_or(s[1]),
                get_rgb("title").or_else(|| get_rgb("cpu_mid")).unwrap_or(s[2]),
                get_rgb("cpu_end").or_else(|| get_rgb("temp_end")).unwrap_or(s[3]),
                get_rgb("cpu_box").unwrap_or(s[4]),
                get_rgb("net_box").unwrap_or(s[5]),
            ],
            bg: get("meter_bg").unwrap_or(d.bg),
            div_line: get("div_line").unwrap_or(d.div_line),
            main_fg: get("main_fg").unwrap_or(d.main_fg),
            title: get("title").unwrap_or(d.title),
            inactive_fg: get("inactive_fg").unwrap_or(d.inactive_fg),
        }
    }

    /// Swatch `index` (wraps).
    #[inline]
    pub fn swatch(&self, index: usize) -> Rgb {
        self.swatches[index % SWATCH_COUNT]
    }
}

/// Cell colour as ratatui sees it.
#[inline]
pub fn to_color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(stripped) = line.strip_prefix("theme[") {
            if let Some(end) = stripped.find(']') {
                let key = stripped[..end].trim();
                let rest = stripped[end + 1..].trim();
                if let Some(eq) = rest.find('=') {
                    let value = rest[eq + 1..]
                        .trim()
                        .trim_matches('"')
                        .trim_matches('\'')
                        .to_string();
                    if !value.is_empty() {
                        map.insert(key.to_string(), value);
                    }
                }
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim();
    let digits = s.trim_start_matches('#');
    if digits.len() == 3 && digits.is_ascii() {
        let mut rgb = [0u8; 3];
        for (i, slot) in rgb.iter_mut().enumerate() {
            *slot = u8::from_str_radix(&digits[i..i + 1], 16)
                .map_err(|_| ThemeError::InvalidHex(s.to_string()))?
                * 17;
        }
        return Ok(Color::Rgb(rgb[0], rgb[1], rgb[2]));
    }
    hex_to_rgb(digits)
        .map(to_color)
        .map_err(|_| ThemeError::InvalidHex(s.to_string()))
}
