//! Attributes shared by SVG text content elements (`textLength`,
//! `lengthAdjust`).

use rustkit_dom::QualName;
use tracing::{trace, warn};

use crate::animated::{AnimatedEnumeration, AnimatedLength};
use crate::length::{LengthMode, SvgLength};
use crate::property::{LengthAdjust, SvgEnumeration};
use crate::SvgError;

#[derive(Debug, Clone)]
pub struct TextContentAttributes {
    text_length: AnimatedLength,
    length_adjust: AnimatedEnumeration<LengthAdjust>,
}

impl Default for TextContentAttributes {
    fn default() -> Self {
        Self {
            text_length: AnimatedLength::new(SvgLength::zero(LengthMode::Width)),
            length_adjust: AnimatedEnumeration::new(LengthAdjust::default()),
        }
    }
}

impl TextContentAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_known_attribute(name: &QualName) -> bool {
        name.ns.is_empty() && matches!(&*name.local, "textLength" | "lengthAdjust")
    }

    /// Apply an attribute change. Returns false for unrelated attributes.
    pub fn parse_attribute(&mut self, name: &QualName, value: Option<&str>) -> bool {
        if !name.ns.is_empty() {
            return false;
        }
        match &*name.local {
            "textLength" => {
                let length = match value.map(parse_text_length) {
                    None => SvgLength::zero(LengthMode::Width),
                    Some(Ok(length)) => length,
                    Some(Err(err)) => {
                        warn!(error = %err, "invalid textLength, using 0");
                        SvgLength::zero(LengthMode::Width)
                    }
                };
                self.text_length.set_base_value(length);
                true
            }
            "lengthAdjust" => {
                match value {
                    None => self.length_adjust.set_base_value(LengthAdjust::default()),
                    Some(text) => {
                        let adjust = LengthAdjust::from_str_value(text);
                        if adjust.is_unknown() {
                            trace!(value = text, "ignoring unknown lengthAdjust");
                        } else {
                            self.length_adjust.set_base_value(adjust);
                        }
                    }
                }
                true
            }
            _ => false,
        }
    }

    pub fn text_length(&self) -> SvgLength {
        *self.text_length.animated_value()
    }

    pub fn length_adjust(&self) -> LengthAdjust {
        *self.length_adjust.animated_value()
    }

    pub fn text_length_animated(&mut self) -> &mut AnimatedLength {
        &mut self.text_length
    }

    pub fn length_adjust_animated(&mut self) -> &mut AnimatedEnumeration<LengthAdjust> {
        &mut self.length_adjust
    }

    pub fn self_has_relative_lengths(&self) -> bool {
        self.text_length().is_relative()
    }
}

fn parse_text_length(text: &str) -> Result<SvgLength, SvgError> {
    let length = SvgLength::parse(LengthMode::Width, text)?;
    if length.value_in_specified_units() < 0.0 {
        return Err(SvgError::InvalidAttribute(format!(
            "textLength cannot be negative: {text}"
        )));
    }
    Ok(length)
}
