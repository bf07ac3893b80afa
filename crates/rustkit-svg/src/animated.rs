//! Animated SVG properties.
//!
//! Every animatable attribute carries a *base* value (parsed from the DOM
//! attribute or set through the IDL) and an *animated* value. While no
//! animation runs the animated value is the base value; once an animation
//! starts it can diverge until the animation stops.

use crate::length::SvgLength;
use crate::property::SvgEnumeration;
use crate::SvgError;

/// A base value plus an optional animation override.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimatedProperty<T> {
    base: T,
    animated: Option<T>,
}

impl<T: Clone> AnimatedProperty<T> {
    pub fn new(initial: T) -> Self {
        Self {
            base: initial,
            animated: None,
        }
    }

    pub fn base_value(&self) -> &T {
        &self.base
    }

    /// The animated value, or the base value when not animating.
    pub fn animated_value(&self) -> &T {
        self.animated.as_ref().unwrap_or(&self.base)
    }

    /// Replace the base value. A running animation keeps its own value.
    pub fn set_base_value(&mut self, value: T) {
        self.base = value;
    }

    pub fn is_animating(&self) -> bool {
        self.animated.is_some()
    }

    /// Begin animating, starting from the current base value.
    pub fn start_animation(&mut self) {
        if self.animated.is_none() {
            self.animated = Some(self.base.clone());
        }
    }

    /// Override the animated value. Only valid while animating.
    pub fn set_animated_value(&mut self, value: T) -> Result<(), SvgError> {
        match self.animated.as_mut() {
            Some(animated) => {
                *animated = value;
                Ok(())
            }
            None => Err(SvgError::NotAnimating(
                "set_animated_value called without start_animation".into(),
            )),
        }
    }

    /// End the animation; the animated value tracks the base value again.
    pub fn stop_animation(&mut self) {
        self.animated = None;
    }
}

impl<T: Clone + Default> Default for AnimatedProperty<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

pub type AnimatedLength = AnimatedProperty<SvgLength>;
pub type AnimatedEnumeration<E> = AnimatedProperty<E>;

impl<E: SvgEnumeration> AnimatedProperty<E> {
    /// Set the animated value from an IDL number.
    pub fn set_animated_enum_value(&mut self, value: u16) -> Result<(), SvgError> {
        let e = E::from_u16(value).ok_or(SvgError::InvalidEnumValue {
            value,
            highest: E::highest_value(),
        })?;
        self.set_animated_value(e)
    }
}

/// Value type of an animatable attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimatedPropertyKind {
    Length,
    Enumeration,
}

/// A value handed across the animation boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnimatedValue {
    Length(SvgLength),
    Enumeration(u16),
}

impl AnimatedValue {
    pub fn kind(&self) -> AnimatedPropertyKind {
        match self {
            AnimatedValue::Length(_) => AnimatedPropertyKind::Length,
            AnimatedValue::Enumeration(_) => AnimatedPropertyKind::Enumeration,
        }
    }
}

/// Drive an element's animated properties by attribute name.
///
/// Unknown names fail with [`SvgError::UnknownAttribute`]; a value of the
/// wrong kind fails with [`SvgError::InvalidAttribute`].
pub trait AnimatedAttributes {
    /// Kind of the animatable attribute `name`, if the element has one.
    fn animated_property_kind(&self, name: &str) -> Option<AnimatedPropertyKind>;

    fn animated_value(&self, name: &str) -> Option<AnimatedValue>;

    fn start_animation(&self, name: &str) -> Result<(), SvgError>;

    fn set_animated_value(&self, name: &str, value: AnimatedValue) -> Result<(), SvgError>;

    fn stop_animation(&self, name: &str) -> Result<(), SvgError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::length::{LengthMode, LengthUnit};
    use crate::property::TextPathMethod;

    #[test]
    fn test_animated_tracks_base_when_idle() {
        let mut prop = AnimatedLength::new(SvgLength::zero(LengthMode::Other));
        let ten = SvgLength::new(LengthMode::Other, 10.0, LengthUnit::Px);
        prop.set_base_value(ten);
        assert!(!prop.is_animating());
        assert_eq!(prop.animated_value(), &ten);
    }

    #[test]
    fn test_animation_overrides_then_restores() {
        let mut prop = AnimatedEnumeration::new(TextPathMethod::Align);
        prop.start_animation();
        assert_eq!(*prop.animated_value(), TextPathMethod::Align);

        prop.set_animated_value(TextPathMethod::Stretch).unwrap();
        assert_eq!(*prop.animated_value(), TextPathMethod::Stretch);
        assert_eq!(*prop.base_value(), TextPathMethod::Align);

        // Base changes do not disturb the running animation.
        prop.set_base_value(TextPathMethod::Unknown);
        assert_eq!(*prop.animated_value(), TextPathMethod::Stretch);

        prop.stop_animation();
        assert_eq!(*prop.animated_value(), TextPathMethod::Unknown);
    }

    #[test]
    fn test_set_animated_requires_animation() {
        let mut prop = AnimatedEnumeration::new(TextPathMethod::Align);
        assert!(matches!(
            prop.set_animated_value(TextPathMethod::Stretch),
            Err(SvgError::NotAnimating(_))
        ));
    }

    #[test]
    fn test_animated_enum_from_number() {
        let mut prop = AnimatedEnumeration::new(TextPathMethod::Align);
        prop.start_animation();
        prop.set_animated_enum_value(2).unwrap();
        assert_eq!(*prop.animated_value(), TextPathMethod::Stretch);
        assert!(prop.set_animated_enum_value(9).is_err());
    }
}
