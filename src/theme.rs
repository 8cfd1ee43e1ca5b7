// SPDX-License-Identifier: MPL-2.0

//! Theme and accent color lookup
//!
//! The glyph color follows the desktop theme: with a light theme and a
//! readable accent color the glyph is tinted with the accent, otherwise it
//! falls back to a fixed bright green. Both settings are re-read on demand at
//! every render because the desktop theme can change at any point in the
//! process's lifetime.
//!
//! The light/dark preference comes from `gsettings` (probed as a subprocess,
//! tolerating its absence), the accent from the `AccentColor` entry in
//! `~/.config/kdeglobals`. Either lookup failing substitutes the documented
//! default: light theme, no accent.

use log::debug;
use std::fs;
use std::process::Command;

/// A straight-alpha color, one byte per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub a: u8,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Fallback glyph color for dark themes or a missing accent.
pub const GLYPH_FALLBACK: Rgba = Rgba {
    a: 255,
    r: 0,
    g: 255,
    b: 0,
};

/// Desktop theme as observed at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeState {
    pub is_light: bool,
    /// Accent color packed as 32-bit alpha-red-green-blue, if obtainable.
    pub accent: Option<u32>,
}

impl Default for ThemeState {
    fn default() -> Self {
        Self {
            is_light: true,
            accent: None,
        }
    }
}

/// Split a packed alpha-red-green-blue value into channels.
pub fn decode_color(packed: u32) -> Rgba {
    Rgba {
        a: (packed >> 24) as u8,
        r: (packed >> 16) as u8,
        g: (packed >> 8) as u8,
        b: packed as u8,
    }
}

/// Color the glyph is drawn in for the given theme.
///
/// The accent is only used when the theme is light and the accent was
/// obtainable; dark themes and missing accents both select the fallback.
pub fn glyph_color(theme: &ThemeState) -> Rgba {
    if theme.is_light {
        theme.accent.map(decode_color).unwrap_or(GLYPH_FALLBACK)
    } else {
        GLYPH_FALLBACK
    }
}

/// Source of the current theme state, injectable for tests.
pub trait ThemeSource {
    fn read_theme(&self) -> ThemeState;
}

/// Reads the live desktop settings.
pub struct DesktopThemeSource;

impl ThemeSource for DesktopThemeSource {
    fn read_theme(&self) -> ThemeState {
        let state = ThemeState {
            is_light: read_color_scheme().unwrap_or(true),
            accent: read_accent_color(),
        };
        debug!("theme: {state:?}");
        state
    }
}

/// Light/dark preference via gsettings. `None` when the probe fails.
fn read_color_scheme() -> Option<bool> {
    let output = Command::new("gsettings")
        .args(["get", "org.gnome.desktop.interface", "color-scheme"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let scheme = String::from_utf8_lossy(&output.stdout);
    Some(!scheme.contains("prefer-dark"))
}

/// Accent color from kdeglobals, packed as alpha-red-green-blue.
fn read_accent_color() -> Option<u32> {
    let path = dirs::config_dir()?.join("kdeglobals");
    let contents = fs::read_to_string(path).ok()?;
    parse_accent_entry(&contents)
}

/// Find `AccentColor=r,g,b` in kdeglobals-style contents and pack it with an
/// opaque alpha.
fn parse_accent_entry(contents: &str) -> Option<u32> {
    for line in contents.lines() {
        let Some(value) = line.trim().strip_prefix("AccentColor=") else {
            continue;
        };
        let mut channels = value.split(',').map(|c| c.trim().parse::<u8>());
        let (r, g, b) = match (channels.next(), channels.next(), channels.next()) {
            (Some(Ok(r)), Some(Ok(g)), Some(Ok(b))) => (r, g, b),
            _ => return None,
        };
        return Some(0xFF00_0000 | (r as u32) << 16 | (g as u32) << 8 | b as u32);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_splits_channels_exactly() {
        let color = decode_color(0xFF00FF00);
        assert_eq!(
            color,
            Rgba {
                a: 255,
                r: 0,
                g: 255,
                b: 0
            }
        );

        let color = decode_color(0x80123456);
        assert_eq!(
            color,
            Rgba {
                a: 0x80,
                r: 0x12,
                g: 0x34,
                b: 0x56
            }
        );
    }

    #[test]
    fn dark_theme_without_accent_uses_the_fallback() {
        let theme = ThemeState {
            is_light: false,
            accent: None,
        };
        assert_eq!(glyph_color(&theme), GLYPH_FALLBACK);
    }

    #[test]
    fn dark_theme_ignores_the_accent() {
        let theme = ThemeState {
            is_light: false,
            accent: Some(0xFF336699),
        };
        assert_eq!(glyph_color(&theme), GLYPH_FALLBACK);
    }

    #[test]
    fn light_theme_with_accent_uses_it() {
        let theme = ThemeState {
            is_light: true,
            accent: Some(0xFF336699),
        };
        assert_eq!(glyph_color(&theme), decode_color(0xFF336699));
    }

    #[test]
    fn light_theme_without_accent_uses_the_fallback() {
        let theme = ThemeState {
            is_light: true,
            accent: None,
        };
        assert_eq!(glyph_color(&theme), GLYPH_FALLBACK);
    }

    #[test]
    fn default_theme_is_light_without_accent() {
        assert_eq!(
            ThemeState::default(),
            ThemeState {
                is_light: true,
                accent: None
            }
        );
    }

    #[test]
    fn accent_entry_parses_and_packs() {
        let contents = "[General]\nAccentColor=61,174,233\nColorScheme=Breeze\n";
        assert_eq!(parse_accent_entry(contents), Some(0xFF3DAEE9));
    }

    #[test]
    fn malformed_accent_entries_yield_none() {
        assert_eq!(parse_accent_entry(""), None);
        assert_eq!(parse_accent_entry("AccentColor=\n"), None);
        assert_eq!(parse_accent_entry("AccentColor=1,2\n"), None);
        assert_eq!(parse_accent_entry("AccentColor=300,0,0\n"), None);
        assert_eq!(parse_accent_entry("[General]\nNothingHere=1\n"), None);
    }
}
