//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use crate::Palette;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Piece palette and UI colours.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    /// Block colours for colour classes 1..=7 (index 0 is class 1).
    pub pieces: [Color; 7],
    /// Playfield background.
    pub bg: Color,
    /// Grid / border.
    pub div_line: Color,
    /// Text (score, lines).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

const fn rgb(hex: u32) -> Color {
    Color::Rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

/// Classic palette, indexed by colour class - 1.
const CLASSIC: [Color; 7] = [
    rgb(0xFF0D72),
    rgb(0x0DC2FF),
    rgb(0x0DFF72),
    rgb(0xF538FF),
    rgb(0xFF8E0D),
    rgb(0xFFE138),
    rgb(0x3877FF),
];

const HIGH_CONTRAST: [Color; 7] = [
    rgb(0xFF00FF),
    rgb(0x00FFFF),
    rgb(0x00FF00),
    rgb(0xFF0000),
    rgb(0xFF8800),
    rgb(0xFFFF00),
    rgb(0x0088FF),
];

// Okabe-Ito style set; avoids relying on red/green alone.
const COLORBLIND: [Color; 7] = [
    rgb(0xCC79A7),
    rgb(0x56B4E9),
    rgb(0x009E73),
    rgb(0xF0E442),
    rgb(0xE69F00),
    rgb(0xD55E00),
    rgb(0x0072B2),
];

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}

impl Theme {
    pub fn classic() -> Self {
        Self {
            pieces: CLASSIC,
            bg: rgb(0x000000),
            div_line: rgb(0x3F444F),
            main_fg: rgb(0xABB2BF),
            title: rgb(0xE5C07B),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Missing keys keep the classic colours. With no path the classic theme is used.
    /// `palette` then overrides the piece colours for HighContrast or Colorblind.
    pub fn load(path: Option<&Path>, palette: Palette) -> Result<Self, ThemeError> {
        let mut theme = match path {
            Some(p) => {
                let s = std::fs::read_to_string(p)?;
                Self::from_map(&parse_theme_file(&s))?
            }
            None => Self::classic(),
        };
        theme.apply_palette(palette);
        Ok(theme)
    }

    pub fn apply_palette(&mut self, palette: Palette) {
        match palette {
            Palette::Normal => {}
            Palette::HighContrast => self.pieces = HIGH_CONTRAST,
            Palette::Colorblind => self.pieces = COLORBLIND,
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Result<Self, ThemeError> {
        let mut theme = Self::classic();
        let get = |key: &str| map.get(key).map(|v| parse_hex(v)).transpose();
        for (i, slot) in theme.pieces.iter_mut().enumerate() {
            if let Some(c) = get(&format!("piece{}", i + 1))? {
                *slot = c;
            }
        }
        for (key, slot) in [
            ("bg", &mut theme.bg),
            ("div_line", &mut theme.div_line),
            ("main_fg", &mut theme.main_fg),
            ("title", &mut theme.title),
        ] {
            if let Some(c) = get(key)? {
                *slot = c;
            }
        }
        Ok(theme)
    }

    /// Colour for a grid value; `None` for empty (0) cells.
    #[inline]
    pub fn block_color(&self, class: u8) -> Option<Color> {
        match class {
            0 => None,
            c => self.pieces.get(usize::from(c) - 1).copied(),
        }
    }
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
    let s = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.to_string());
    let channel = |range: std::ops::Range<usize>| {
        s.get(range)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .ok_or_else(invalid)
    };
    let (r, g, b) = match s.len() {
        6 => (channel(0..2)?, channel(2..4)?, channel(4..6)?),
        3 => (channel(0..1)? * 17, channel(1..2)? * 17, channel(2..3)? * 17),
        _ => return Err(invalid()),
    };
    Ok(Color::Rgb(r, g, b))
}
