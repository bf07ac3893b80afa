//! # RustKit SVG
//!
//! SVG text-on-path support for the RustKit browser engine.
//!
//! ## Features
//!
//! - **`<textPath>`**: animated `startOffset` / `method` / `spacing`
//!   attributes, href resolution with pending resources, render-tree
//!   eligibility rules, IDL constants and setters
//! - **`<path>`**: path data parsing (M, L, H, V, C, S, Q, T, A, Z),
//!   `pathLength`, `transform`, flattened geometry with tangents
//! - **Lengths**: SVG length parsing and resolution to user units
//! - **Animation**: base/animated values driven by attribute name
//! - **Layout**: glyph placement along a path
//!
//! ## Architecture
//!
//! ```text
//! rustkit_dom::Document
//!    └── ElementFactory (register_svg_elements)
//!           ├── TextPathElement ──href──▶ PathElement
//!           │      ├── AnimatedProperty<SvgLength / enum>
//!           │      ├── TextContentAttributes
//!           │      └── UriReference
//!           └── RenderTree
//!                  └── TextPathRenderer ── layout_text_on_path
//! ```

pub mod animated;
pub mod config;
pub mod layout;
pub mod length;
pub mod path;
pub mod property;
pub mod render;
pub mod text_content;
pub mod text_path;
pub mod transform;
pub mod uri_reference;

pub use animated::{
    AnimatedAttributes, AnimatedEnumeration, AnimatedLength, AnimatedProperty,
    AnimatedPropertyKind, AnimatedValue,
};
pub use config::SvgConfig;
pub use layout::{layout_text_on_path, PositionedGlyph, TextPathParams};
pub use length::{LengthContext, LengthMode, LengthUnit, SvgLength};
pub use path::{PathCommand, PathData, PathElement, PathGeometry, PathPoint};
pub use property::{LengthAdjust, SvgEnumeration, TextPathMethod, TextPathSpacing};
pub use render::{RenderTree, TextPathRenderer};
pub use text_content::TextContentAttributes;
pub use text_path::{
    TextPathElement, TEXTPATH_METHODTYPE_ALIGN, TEXTPATH_METHODTYPE_STRETCH,
    TEXTPATH_METHODTYPE_UNKNOWN, TEXTPATH_SPACINGTYPE_AUTO, TEXTPATH_SPACINGTYPE_EXACT,
    TEXTPATH_SPACINGTYPE_UNKNOWN,
};
pub use transform::Transform2D;
pub use uri_reference::{target_element_from_iri, TargetElement, UriReference};

use rustkit_dom::{qual_name, Document, DomError, ElementFactory, QualName, SVG_NAMESPACE};
use thiserror::Error;
use tracing::debug;

// ==================== Errors ====================

/// Errors that can occur in SVG operations.
#[derive(Error, Debug)]
pub enum SvgError {
    #[error("Invalid length: {0:?}")]
    InvalidLength(String),

    #[error("Invalid enumeration value {value} (expected 1..={highest})")]
    InvalidEnumValue { value: u16, highest: u16 },

    #[error("Invalid attribute: {0}")]
    InvalidAttribute(String),

    #[error("Not animating: {0}")]
    NotAnimating(String),

    #[error("Unknown animated attribute: {0}")]
    UnknownAttribute(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error(transparent)]
    Dom(#[from] DomError),
}

impl From<SvgError> for rustkit_common::RustKitError {
    fn from(err: SvgError) -> Self {
        match err {
            SvgError::InvalidConfig(message) => rustkit_common::RustKitError::config(message),
            SvgError::ConfigParse(source) => {
                rustkit_common::RustKitError::config_with_source("SVG config parse failed", source)
            }
            SvgError::Dom(source) => source.into(),
            other => rustkit_common::RustKitError::svg_with_source("SVG operation failed", other),
        }
    }
}

// ==================== Element Registration ====================

/// A qualified name in the SVG namespace.
pub fn svg_name(local: &str) -> QualName {
    qual_name(SVG_NAMESPACE, local)
}

/// Register the SVG element behaviors with `factory`.
pub fn register_svg_elements(factory: &mut ElementFactory) {
    factory.register(SVG_NAMESPACE, "textPath", TextPathElement::create);
    factory.register(SVG_NAMESPACE, "path", PathElement::create);
}

/// A factory with only the SVG element behaviors registered.
pub fn svg_element_factory() -> ElementFactory {
    let mut factory = ElementFactory::new();
    register_svg_elements(&mut factory);
    factory
}

/// Parse an HTML document with inline SVG behaviors attached.
pub fn parse_document(html: &str) -> Result<Document, SvgError> {
    let document = Document::parse_html_with_factory(html, svg_element_factory())?;
    debug!(
        text_paths = document.get_elements_by_tag_name("textPath").len(),
        "document parsed with SVG behaviors"
    );
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustkit_common::RustKitError;

    #[test]
    fn test_factory_registers_svg_elements() {
        let factory = svg_element_factory();
        assert!(factory.is_registered(&svg_name("textPath")));
        assert!(factory.is_registered(&svg_name("path")));
        assert!(!factory.is_registered(&qual_name(rustkit_dom::HTML_NAMESPACE, "path")));
    }

    #[test]
    fn test_error_conversion() {
        let err: RustKitError = SvgError::InvalidLength("x".into()).into();
        assert_eq!(err.category(), "svg");

        let err: RustKitError = SvgError::InvalidConfig("bad".into()).into();
        assert_eq!(err.category(), "config");

        let err: RustKitError = SvgError::Dom(DomError::NodeNotFound).into();
        assert_eq!(err.category(), "dom");
    }

    #[test]
    fn test_parse_document_attaches_behaviors() {
        let doc = parse_document(
            r##"<svg><path id="p" d="M0 0 H50"/><text><textPath href="#p">x</textPath></text></svg>"##,
        )
        .unwrap();
        let tp = &doc.get_elements_by_tag_name("textPath")[0];
        assert!(tp.behavior_as::<TextPathElement>().is_some());
        let path = doc.get_element_by_id("p").unwrap();
        assert!(path.behavior_as::<PathElement>().is_some());
    }
}
