//! Text-on-path layout.
//!
//! Glyphs use a fixed advance (`font_size * glyph_advance_ratio`). Each
//! glyph is centered on its midpoint along the path and rotated to the
//! path tangent there; glyphs whose midpoint falls before the start or past
//! the end of the path are not rendered.

use tracing::trace;

use crate::config::SvgConfig;
use crate::length::{LengthContext, LengthMode, LengthUnit, SvgLength};
use crate::path::PathGeometry;
use crate::property::{LengthAdjust, TextPathMethod, TextPathSpacing};

/// Inputs from the `<textPath>` element and its referenced path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextPathParams {
    pub start_offset: SvgLength,
    pub method: TextPathMethod,
    pub spacing: TextPathSpacing,
    /// Zero (the default) means no `textLength` adjustment.
    pub text_length: SvgLength,
    pub length_adjust: LengthAdjust,
    pub font_size: f32,
    /// The path's `pathLength`, if the author set one.
    pub path_length: Option<f32>,
}

impl Default for TextPathParams {
    fn default() -> Self {
        Self {
            start_offset: SvgLength::zero(LengthMode::Other),
            method: TextPathMethod::default(),
            spacing: TextPathSpacing::default(),
            text_length: SvgLength::zero(LengthMode::Width),
            length_adjust: LengthAdjust::default(),
            font_size: 16.0,
            path_length: None,
        }
    }
}

/// One laid-out character.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionedGlyph {
    pub character: char,
    /// Index into the collapsed text.
    pub index: usize,
    /// Glyph origin on the baseline.
    pub x: f32,
    pub y: f32,
    /// Rotation in degrees.
    pub angle: f32,
    pub advance: f32,
    /// Horizontal glyph scale from `lengthAdjust="spacingAndGlyphs"`.
    pub scale_x: f32,
}

/// Collapse whitespace the way `xml:space="default"` does.
pub fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\n' | '\r' => {}
            c if c.is_whitespace() => {
                if !out.is_empty() && !out.ends_with(' ') {
                    out.push(' ');
                }
            }
            c => out.push(c),
        }
    }
    let trimmed = out.trim_end().len();
    out.truncate(trimmed);
    out
}

/// Lay `text` out along `path`.
pub fn layout_text_on_path(
    text: &str,
    path: &PathGeometry,
    params: &TextPathParams,
    config: &SvgConfig,
) -> Vec<PositionedGlyph> {
    let text = collapse_whitespace(text);
    let total = path.length();
    if text.is_empty() || path.is_empty() || total <= 0.0 {
        return Vec::new();
    }
    if params.method == TextPathMethod::Stretch || params.spacing == TextPathSpacing::Auto {
        trace!(method = ?params.method, spacing = ?params.spacing, "laid out as align/exact");
    }

    let ctx = LengthContext {
        viewport_width: config.viewport_width,
        viewport_height: config.viewport_height,
        font_size: params.font_size,
        reference_length: Some(total),
    };

    let mut offset = params.start_offset.to_user_units(&ctx);
    // Absolute offsets are in pathLength units; percentages already use the real length.
    if params.start_offset.unit() != LengthUnit::Percentage {
        if let Some(authored) = params.path_length.filter(|l| *l > 0.0) {
            offset *= total / authored;
        }
    }

    let count = text.chars().count();
    let natural_advance = params.font_size * config.glyph_advance_ratio;
    let natural_width = natural_advance * count as f32;
    let desired = params.text_length.to_user_units(&ctx);

    let (advance, scale_x) = if desired > 0.0 && natural_width > 0.0 {
        match params.length_adjust {
            LengthAdjust::SpacingAndGlyphs => {
                let scale = desired / natural_width;
                (natural_advance * scale, scale)
            }
            LengthAdjust::Spacing | LengthAdjust::Unknown => {
                (natural_advance + (desired - natural_width) / count as f32, 1.0)
            }
        }
    } else {
        (natural_advance, 1.0)
    };

    let mut glyphs = Vec::with_capacity(count);
    let mut position = offset;
    for (index, character) in text.chars().enumerate() {
        let mid = position + advance / 2.0;
        position += advance;

        let Some(point) = path.point_at_length(mid) else {
            continue;
        };
        let (sin, cos) = point.angle.sin_cos();
        let half = advance / 2.0;
        glyphs.push(PositionedGlyph {
            character,
            index,
            x: point.x - cos * half,
            y: point.y - sin * half,
            angle: point.angle.to_degrees(),
            advance,
            scale_x,
        });
    }

    trace!(
        chars = count,
        placed = glyphs.len(),
        offset,
        path_length = total,
        "text laid out on path"
    );
    glyphs
}
