//! SVG lengths (`<length>` / `<percentage>` values).

use std::fmt;

use crate::SvgError;

/// Which viewport dimension percentages refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LengthMode {
    Width,
    Height,
    #[default]
    Other,
}

/// Length unit, numbered like the `SVGLength` IDL constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LengthUnit {
    Unknown = 0,
    #[default]
    Number = 1,
    Percentage = 2,
    Ems = 3,
    Exs = 4,
    Px = 5,
    Cm = 6,
    Mm = 7,
    In = 8,
    Pt = 9,
    Pc = 10,
}

impl LengthUnit {
    /// Unit suffix as written in attributes.
    pub fn suffix(self) -> &'static str {
        match self {
            LengthUnit::Unknown | LengthUnit::Number => "",
            LengthUnit::Percentage => "%",
            LengthUnit::Ems => "em",
            LengthUnit::Exs => "ex",
            LengthUnit::Px => "px",
            LengthUnit::Cm => "cm",
            LengthUnit::Mm => "mm",
            LengthUnit::In => "in",
            LengthUnit::Pt => "pt",
            LengthUnit::Pc => "pc",
        }
    }

    fn from_suffix(suffix: &str) -> Option<Self> {
        Some(match suffix {
            "" => LengthUnit::Number,
            "%" => LengthUnit::Percentage,
            "em" => LengthUnit::Ems,
            "ex" => LengthUnit::Exs,
            "px" => LengthUnit::Px,
            "cm" => LengthUnit::Cm,
            "mm" => LengthUnit::Mm,
            "in" => LengthUnit::In,
            "pt" => LengthUnit::Pt,
            "pc" => LengthUnit::Pc,
            _ => return None,
        })
    }

    /// Map an IDL unit type back to a unit. `Unknown` is not settable.
    pub fn from_u16(value: u16) -> Option<Self> {
        Some(match value {
            1 => LengthUnit::Number,
            2 => LengthUnit::Percentage,
            3 => LengthUnit::Ems,
            4 => LengthUnit::Exs,
            5 => LengthUnit::Px,
            6 => LengthUnit::Cm,
            7 => LengthUnit::Mm,
            8 => LengthUnit::In,
            9 => LengthUnit::Pt,
            10 => LengthUnit::Pc,
            _ => return None,
        })
    }
}

/// What relative units resolve against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LengthContext {
    pub viewport_width: f32,
    pub viewport_height: f32,
    pub font_size: f32,
    /// Base for percentages in [`LengthMode::Other`] (e.g. a path length).
    /// Falls back to the normalized viewport diagonal.
    pub reference_length: Option<f32>,
}

impl Default for LengthContext {
    fn default() -> Self {
        Self {
            viewport_width: 300.0,
            viewport_height: 150.0,
            font_size: 16.0,
            reference_length: None,
        }
    }
}

/// An SVG length value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SvgLength {
    value: f32,
    unit: LengthUnit,
    mode: LengthMode,
}

impl SvgLength {
    /// Zero user units.
    pub fn zero(mode: LengthMode) -> Self {
        Self {
            value: 0.0,
            unit: LengthUnit::Number,
            mode,
        }
    }

    /// Build from a value in the given unit.
    pub fn new(mode: LengthMode, value: f32, unit: LengthUnit) -> Self {
        Self { value, unit, mode }
    }

    /// Parse attribute text. An empty string is a zero length.
    pub fn parse(mode: LengthMode, text: &str) -> Result<Self, SvgError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Self::zero(mode));
        }

        let (value, rest) = split_number(text)
            .ok_or_else(|| SvgError::InvalidLength(text.to_string()))?;
        let unit = LengthUnit::from_suffix(rest)
            .ok_or_else(|| SvgError::InvalidLength(text.to_string()))?;

        if !value.is_finite() {
            return Err(SvgError::InvalidLength(text.to_string()));
        }

        Ok(Self { value, unit, mode })
    }

    /// Value in the specified unit.
    pub fn value_in_specified_units(&self) -> f32 {
        self.value
    }

    pub fn unit(&self) -> LengthUnit {
        self.unit
    }

    pub fn mode(&self) -> LengthMode {
        self.mode
    }

    /// Serialized form used when reflecting into an attribute.
    pub fn value_as_string(&self) -> String {
        format!("{}{}", self.value, self.unit.suffix())
    }

    /// Whether the value depends on font size or a reference size.
    pub fn is_relative(&self) -> bool {
        matches!(
            self.unit,
            LengthUnit::Percentage | LengthUnit::Ems | LengthUnit::Exs
        )
    }

    /// Resolve to user units.
    pub fn to_user_units(&self, ctx: &LengthContext) -> f32 {
        match self.unit {
            LengthUnit::Unknown | LengthUnit::Number | LengthUnit::Px => self.value,
            LengthUnit::Percentage => self.value / 100.0 * self.percentage_base(ctx),
            LengthUnit::Ems => self.value * ctx.font_size,
            // No font metrics available; use the conventional half-em.
            LengthUnit::Exs => self.value * ctx.font_size / 2.0,
            LengthUnit::Cm => self.value * 96.0 / 2.54,
            LengthUnit::Mm => self.value * 96.0 / 25.4,
            LengthUnit::In => self.value * 96.0,
            LengthUnit::Pt => self.value * 4.0 / 3.0,
            LengthUnit::Pc => self.value * 16.0,
        }
    }

    fn percentage_base(&self, ctx: &LengthContext) -> f32 {
        match self.mode {
            LengthMode::Width => ctx.viewport_width,
            LengthMode::Height => ctx.viewport_height,
            LengthMode::Other => ctx.reference_length.unwrap_or_else(|| {
                ((ctx.viewport_width.powi(2) + ctx.viewport_height.powi(2)) / 2.0).sqrt()
            }),
        }
    }
}

impl fmt::Display for SvgLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value_as_string())
    }
}

/// Split a leading SVG number off `text`.
fn split_number(text: &str) -> Option<(f32, &str)> {
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut has_digits = end > digits_start;
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        let frac_start = end;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        has_digits |= end > frac_start;
    }
    if !has_digits {
        return None;
    }
    // Exponent, but not the "e" of an "em"/"ex" unit.
    if end < bytes.len()
        && matches!(bytes[end], b'e' | b'E')
        && !matches!(bytes.get(end + 1), Some(b'm' | b'x'))
    {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }

    let value = text[..end].parse().ok()?;
    Some((value, &text[end..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_units() {
        let l = SvgLength::parse(LengthMode::Other, "10").unwrap();
        assert_eq!(l.unit(), LengthUnit::Number);
        assert_eq!(l.value_in_specified_units(), 10.0);

        let l = SvgLength::parse(LengthMode::Other, "50%").unwrap();
        assert_eq!(l.unit(), LengthUnit::Percentage);

        let l = SvgLength::parse(LengthMode::Other, "1.5em").unwrap();
        assert_eq!(l.unit(), LengthUnit::Ems);
        assert_eq!(l.value_in_specified_units(), 1.5);

        let l = SvgLength::parse(LengthMode::Other, "2ex").unwrap();
        assert_eq!(l.unit(), LengthUnit::Exs);

        let l = SvgLength::parse(LengthMode::Other, "1e2px").unwrap();
        assert_eq!(l.unit(), LengthUnit::Px);
        assert_eq!(l.value_in_specified_units(), 100.0);

        let l = SvgLength::parse(LengthMode::Other, " -.5 ").unwrap();
        assert_eq!(l.value_in_specified_units(), -0.5);
    }

    #[test]
    fn test_parse_errors() {
        assert!(SvgLength::parse(LengthMode::Other, "abc").is_err());
        assert!(SvgLength::parse(LengthMode::Other, "10 px").is_err());
        assert!(SvgLength::parse(LengthMode::Other, "10furlongs").is_err());
        assert!(SvgLength::parse(LengthMode::Other, ".").is_err());
    }

    #[test]
    fn test_empty_is_zero() {
        let l = SvgLength::parse(LengthMode::Other, "").unwrap();
        assert_eq!(l, SvgLength::zero(LengthMode::Other));
    }

    #[test]
    fn test_relative_units() {
        assert!(SvgLength::parse(LengthMode::Other, "5%").unwrap().is_relative());
        assert!(SvgLength::parse(LengthMode::Other, "1em").unwrap().is_relative());
        assert!(!SvgLength::parse(LengthMode::Other, "5px").unwrap().is_relative());
        assert!(!SvgLength::parse(LengthMode::Other, "5cm").unwrap().is_relative());
    }

    #[test]
    fn test_to_user_units() {
        let ctx = LengthContext {
            reference_length: Some(200.0),
            font_size: 10.0,
            ..Default::default()
        };
        let pct = SvgLength::parse(LengthMode::Other, "25%").unwrap();
        assert_eq!(pct.to_user_units(&ctx), 50.0);

        let em = SvgLength::parse(LengthMode::Other, "2em").unwrap();
        assert_eq!(em.to_user_units(&ctx), 20.0);

        let inch = SvgLength::parse(LengthMode::Other, "1in").unwrap();
        assert_eq!(inch.to_user_units(&ctx), 96.0);

        let width_pct = SvgLength::parse(LengthMode::Width, "50%").unwrap();
        assert_eq!(width_pct.to_user_units(&ctx), 150.0);
    }

    #[test]
    fn test_value_as_string() {
        assert_eq!(
            SvgLength::new(LengthMode::Other, 50.0, LengthUnit::Percentage).value_as_string(),
            "50%"
        );
        assert_eq!(
            SvgLength::new(LengthMode::Other, 12.5, LengthUnit::Number).to_string(),
            "12.5"
        );
    }

    #[test]
    fn test_unit_from_idl_value() {
        assert_eq!(LengthUnit::from_u16(2), Some(LengthUnit::Percentage));
        assert_eq!(LengthUnit::from_u16(0), None);
        assert_eq!(LengthUnit::from_u16(11), None);
        assert_eq!(LengthUnit::Pc as u16, 10);
    }
}
