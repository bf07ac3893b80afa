//! String <-> enumeration mapping for SVG enumerated attributes.
//!
//! Every enumeration reserves `0` for an *unknown* sentinel. Parsing never
//! fails: unrecognized text maps to the sentinel, and the sentinel
//! serializes to an empty string.

use std::fmt;

use crate::SvgError;

/// An SVG enumerated attribute value.
pub trait SvgEnumeration: Copy + Eq + Default + fmt::Debug + 'static {
    /// Largest valid IDL value.
    fn highest_value() -> u16;

    /// Parse attribute text (exact, case-sensitive match).
    fn from_str_value(value: &str) -> Self;

    /// Attribute text for the value; empty for the unknown sentinel.
    fn as_str(self) -> &'static str;

    /// IDL numeric value.
    fn to_u16(self) -> u16;

    /// Value for an IDL number, `None` when out of range.
    fn from_u16(value: u16) -> Option<Self>;

    fn is_unknown(self) -> bool {
        self.to_u16() == 0
    }
}

/// Check an IDL value for an enumeration setter.
///
/// The unknown sentinel and anything above the highest value are rejected.
pub fn validate_enum_value<E: SvgEnumeration>(value: u16) -> Result<E, SvgError> {
    match E::from_u16(value) {
        Some(e) if !e.is_unknown() => Ok(e),
        _ => Err(SvgError::InvalidEnumValue {
            value,
            highest: E::highest_value(),
        }),
    }
}

/// `method` on `<textPath>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextPathMethod {
    Unknown = 0,
    #[default]
    Align = 1,
    Stretch = 2,
}

impl SvgEnumeration for TextPathMethod {
    fn highest_value() -> u16 {
        TextPathMethod::Stretch as u16
    }

    fn from_str_value(value: &str) -> Self {
        match value {
            "align" => TextPathMethod::Align,
            "stretch" => TextPathMethod::Stretch,
            _ => TextPathMethod::Unknown,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            TextPathMethod::Unknown => "",
            TextPathMethod::Align => "align",
            TextPathMethod::Stretch => "stretch",
        }
    }

    fn to_u16(self) -> u16 {
        self as u16
    }

    fn from_u16(value: u16) -> Option<Self> {
        match value {
            0 => Some(TextPathMethod::Unknown),
            1 => Some(TextPathMethod::Align),
            2 => Some(TextPathMethod::Stretch),
            _ => None,
        }
    }
}

/// `spacing` on `<textPath>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextPathSpacing {
    Unknown = 0,
    Auto = 1,
    #[default]
    Exact = 2,
}

impl SvgEnumeration for TextPathSpacing {
    fn highest_value() -> u16 {
        TextPathSpacing::Exact as u16
    }

    fn from_str_value(value: &str) -> Self {
        match value {
            "auto" => TextPathSpacing::Auto,
            "exact" => TextPathSpacing::Exact,
            _ => TextPathSpacing::Unknown,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            TextPathSpacing::Unknown => "",
            TextPathSpacing::Auto => "auto",
            TextPathSpacing::Exact => "exact",
        }
    }

    fn to_u16(self) -> u16 {
        self as u16
    }

    fn from_u16(value: u16) -> Option<Self> {
        match value {
            0 => Some(TextPathSpacing::Unknown),
            1 => Some(TextPathSpacing::Auto),
            2 => Some(TextPathSpacing::Exact),
            _ => None,
        }
    }
}

/// `lengthAdjust` on text content elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LengthAdjust {
    Unknown = 0,
    #[default]
    Spacing = 1,
    SpacingAndGlyphs = 2,
}

impl SvgEnumeration for LengthAdjust {
    fn highest_value() -> u16 {
        LengthAdjust::SpacingAndGlyphs as u16
    }

    fn from_str_value(value: &str) -> Self {
        match value {
            "spacing" => LengthAdjust::Spacing,
            "spacingAndGlyphs" => LengthAdjust::SpacingAndGlyphs,
            _ => LengthAdjust::Unknown,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            LengthAdjust::Unknown => "",
            LengthAdjust::Spacing => "spacing",
            LengthAdjust::SpacingAndGlyphs => "spacingAndGlyphs",
        }
    }

    fn to_u16(self) -> u16 {
        self as u16
    }

    fn from_u16(value: u16) -> Option<Self> {
        match value {
            0 => Some(LengthAdjust::Unknown),
            1 => Some(LengthAdjust::Spacing),
            2 => Some(LengthAdjust::SpacingAndGlyphs),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_strings_are_lossless() {
        for s in ["align", "stretch"] {
            assert_eq!(TextPathMethod::from_str_value(s).as_str(), s);
        }
    }

    #[test]
    fn test_spacing_strings_are_lossless() {
        for s in ["auto", "exact"] {
            assert_eq!(TextPathSpacing::from_str_value(s).as_str(), s);
        }
    }

    #[test]
    fn test_other_strings_map_to_unknown() {
        for s in ["", "Align", "STRETCH", " align", "exact ", "none"] {
            let method = TextPathMethod::from_str_value(s);
            assert_eq!(method, TextPathMethod::Unknown, "{s:?}");
            assert!(method.is_unknown());
            assert_eq!(method.as_str(), "");
        }
        assert_eq!(TextPathSpacing::from_str_value("Auto"), TextPathSpacing::Unknown);
        assert_eq!(TextPathSpacing::Unknown.as_str(), "");
    }

    #[test]
    fn test_defaults_and_highest_values() {
        assert_eq!(TextPathMethod::default(), TextPathMethod::Align);
        assert_eq!(TextPathSpacing::default(), TextPathSpacing::Exact);
        assert_eq!(LengthAdjust::default(), LengthAdjust::Spacing);
        assert_eq!(TextPathMethod::highest_value(), 2);
        assert_eq!(TextPathSpacing::highest_value(), 2);
    }

    #[test]
    fn test_numeric_mapping() {
        assert_eq!(TextPathMethod::from_u16(2), Some(TextPathMethod::Stretch));
        assert_eq!(TextPathMethod::from_u16(3), None);
        assert_eq!(TextPathSpacing::Auto.to_u16(), 1);
        assert_eq!(
            LengthAdjust::from_str_value("spacingAndGlyphs").to_u16(),
            2
        );
    }

    #[test]
    fn test_validate_enum_value() {
        assert_eq!(
            validate_enum_value::<TextPathMethod>(2).unwrap(),
            TextPathMethod::Stretch
        );
        assert!(matches!(
            validate_enum_value::<TextPathMethod>(0),
            Err(SvgError::InvalidEnumValue { value: 0, highest: 2 })
        ));
        assert!(validate_enum_value::<TextPathSpacing>(3).is_err());
    }
}
