// SPDX-License-Identifier: MPL-2.0

//! Icon rendering
//!
//! Formats the smoothed download rate as a whole-Mbps string and rasterizes
//! it into a 16×16 ARGB bitmap with a transparent background. Rendering is a
//! pure function of the text and the glyph color: no state is kept between
//! frames, and a rasterization fault only skips that frame.

use crate::theme::Rgba;
use thiserror::Error;

/// Tray icons are a fixed 16×16 raster.
pub const ICON_SIZE: i32 = 16;

/// Extra x-offset that keeps single-digit glyphs visually centered.
const SINGLE_DIGIT_PADDING: f64 = 4.0;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("cairo: {0}")]
    Cairo(#[from] cairo::Error),
    #[error("icon surface busy")]
    SurfaceBusy(#[from] cairo::BorrowError),
}

/// A rendered icon frame: unpremultiplied ARGB32 in network byte order,
/// ready for the tray host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconBitmap {
    pub width: i32,
    pub height: i32,
    pub argb: Vec<u8>,
}

impl IconBitmap {
    /// Fully transparent frame, shown until the first emission arrives.
    pub fn blank() -> Self {
        Self {
            width: ICON_SIZE,
            height: ICON_SIZE,
            argb: vec![0; (ICON_SIZE * ICON_SIZE * 4) as usize],
        }
    }
}

/// Format a byte rate as a whole number of Mbps.
///
/// Bytes/s → bits/s → /1024/1024, rounded to the nearest integer. Values are
/// not clamped; anything past the glyph area simply overflows it.
pub fn format_mbps(bytes_per_sec: f64) -> String {
    let mbps = bytes_per_sec * 8.0 / 1024.0 / 1024.0;
    format!("{}", mbps.round() as i64)
}

/// X-offset for the glyph.
///
/// Single-digit values (0–9) get a fixed 4 px shift; everything else starts
/// at the left edge. A fixed lookup rather than measured text width, so 3+
/// digit values still overflow to the right.
pub fn glyph_padding(text: &str) -> f64 {
    match text.parse::<u64>() {
        Ok(value) if value <= 9 => SINGLE_DIGIT_PADDING,
        _ => 0.0,
    }
}

/// Two-line hover text carrying both directions at full precision of the
/// formatted values.
pub fn tooltip_text(up: &str, down: &str) -> String {
    format!("Up: {up} Mbps\nDown: {down} Mbps")
}

/// Rasterize `text` into a transparent 16×16 bitmap in the given color.
pub fn render_icon(text: &str, color: Rgba) -> Result<IconBitmap, RenderError> {
    let mut surface = cairo::ImageSurface::create(cairo::Format::ARgb32, ICON_SIZE, ICON_SIZE)?;

    {
        let cr = cairo::Context::new(&surface)?;

        // Clear to fully transparent so the glyph overlays the tray
        // background.
        cr.save()?;
        cr.set_operator(cairo::Operator::Source);
        cr.set_source_rgba(0.0, 0.0, 0.0, 0.0);
        cr.paint()?;
        cr.restore()?;

        let layout = pangocairo::functions::create_layout(&cr);
        let mut font_desc = pango::FontDescription::from_string("Sans");
        font_desc.set_absolute_size(12.0 * pango::SCALE as f64);
        layout.set_font_description(Some(&font_desc));
        layout.set_text(text);

        cr.set_source_rgba(
            color.r as f64 / 255.0,
            color.g as f64 / 255.0,
            color.b as f64 / 255.0,
            color.a as f64 / 255.0,
        );
        cr.move_to(glyph_padding(text), 0.0);
        pangocairo::functions::show_layout(&cr, &layout);
    }

    surface.flush();
    let data = surface.data()?;

    // Cairo hands back premultiplied ARGB in native endianness; the tray
    // protocol wants straight alpha in network byte order.
    let mut argb = Vec::with_capacity(data.len());
    for px in data.chunks_exact(4) {
        let value = u32::from_ne_bytes([px[0], px[1], px[2], px[3]]);
        let a = (value >> 24) as u8;
        if a == 0 {
            argb.extend_from_slice(&[0, 0, 0, 0]);
            continue;
        }
        let unmul = |c: u32| ((c * 255 + a as u32 / 2) / a as u32).min(255) as u8;
        let r = unmul((value >> 16) & 0xFF);
        let g = unmul((value >> 8) & 0xFF);
        let b = unmul(value & 0xFF);
        argb.extend_from_slice(&[a, r, g, b]);
    }

    Ok(IconBitmap {
        width: ICON_SIZE,
        height: ICON_SIZE,
        argb,
    })
}
