//! The SVG `<textPath>` element.
//!
//! `TextPathElement` is the behavior the element factory attaches to every
//! `textPath` node in the SVG namespace. It keeps the element's animated
//! attributes (`startOffset`, `method`, `spacing`, plus the inherited
//! text-content and href attributes) in sync with the DOM, and resolves its
//! href to a `<path>` through the document's resource registry.
//!
//! ## Attribute handling
//!
//! - `startOffset` parses as a length; invalid text logs a warning and
//!   resets to the default.
//! - `method` / `spacing` ignore values they do not recognize.
//! - Removing an attribute resets it to its initial value.

use std::any::Any;
use std::cell::{Cell, RefCell, RefMut};
use std::rc::Rc;

use rustkit_dom::{
    Document, ElementBehavior, InsertedIntoAncestorResult, InsertionType, Node, QualName,
    RemovalType, SVG_NAMESPACE,
};
use tracing::{debug, trace, warn};

use crate::animated::{
    AnimatedAttributes, AnimatedEnumeration, AnimatedLength, AnimatedPropertyKind, AnimatedValue,
};
use crate::length::{LengthMode, LengthUnit, SvgLength};
use crate::property::{
    validate_enum_value, LengthAdjust, SvgEnumeration, TextPathMethod, TextPathSpacing,
};
use crate::text_content::TextContentAttributes;
use crate::uri_reference::{target_element_from_iri, UriReference};
use crate::SvgError;

// ==================== IDL Constants ====================

pub const TEXTPATH_METHODTYPE_UNKNOWN: u16 = TextPathMethod::Unknown as u16;
pub const TEXTPATH_METHODTYPE_ALIGN: u16 = TextPathMethod::Align as u16;
pub const TEXTPATH_METHODTYPE_STRETCH: u16 = TextPathMethod::Stretch as u16;
pub const TEXTPATH_SPACINGTYPE_UNKNOWN: u16 = TextPathSpacing::Unknown as u16;
pub const TEXTPATH_SPACINGTYPE_AUTO: u16 = TextPathSpacing::Auto as u16;
pub const TEXTPATH_SPACINGTYPE_EXACT: u16 = TextPathSpacing::Exact as u16;

const START_OFFSET: &str = "startOffset";
const METHOD: &str = "method";
const SPACING: &str = "spacing";

// ==================== Element ====================

/// Behavior for SVG `<textPath>`.
#[derive(Debug)]
pub struct TextPathElement {
    start_offset: RefCell<AnimatedLength>,
    method: RefCell<AnimatedEnumeration<TextPathMethod>>,
    spacing: RefCell<AnimatedEnumeration<TextPathSpacing>>,
    text_content: RefCell<TextContentAttributes>,
    uri: RefCell<UriReference>,
    has_relative_lengths: Cell<bool>,
    has_renderer: Cell<bool>,
    needs_layout: Cell<bool>,
}

impl Default for TextPathElement {
    fn default() -> Self {
        Self {
            start_offset: RefCell::new(AnimatedLength::new(SvgLength::zero(LengthMode::Other))),
            method: RefCell::new(AnimatedEnumeration::new(TextPathMethod::default())),
            spacing: RefCell::new(AnimatedEnumeration::new(TextPathSpacing::default())),
            text_content: RefCell::new(TextContentAttributes::new()),
            uri: RefCell::new(UriReference::new()),
            has_relative_lengths: Cell::new(false),
            has_renderer: Cell::new(false),
            needs_layout: Cell::new(false),
        }
    }
}

impl TextPathElement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Element constructor for the [`ElementFactory`](rustkit_dom::ElementFactory).
    pub fn create(name: &QualName) -> Rc<dyn ElementBehavior> {
        trace!(element = %name.local, "creating textPath behavior");
        Rc::new(Self::new())
    }

    // ==================== Accessors ====================

    /// Current `startOffset` (animated value while animating).
    pub fn start_offset(&self) -> SvgLength {
        *self.start_offset.borrow().animated_value()
    }

    pub fn method(&self) -> TextPathMethod {
        *self.method.borrow().animated_value()
    }

    pub fn spacing(&self) -> TextPathSpacing {
        *self.spacing.borrow().animated_value()
    }

    pub fn text_length(&self) -> SvgLength {
        self.text_content.borrow().text_length()
    }

    pub fn length_adjust(&self) -> LengthAdjust {
        self.text_content.borrow().length_adjust()
    }

    /// Effective href (`href` over `xlink:href`).
    pub fn href(&self) -> String {
        self.uri.borrow().href().to_string()
    }

    /// Animation handle for `startOffset`. Do not hold across DOM calls.
    pub fn start_offset_animated(&self) -> RefMut<'_, AnimatedLength> {
        self.start_offset.borrow_mut()
    }

    pub fn method_animated(&self) -> RefMut<'_, AnimatedEnumeration<TextPathMethod>> {
        self.method.borrow_mut()
    }

    pub fn spacing_animated(&self) -> RefMut<'_, AnimatedEnumeration<TextPathSpacing>> {
        self.spacing.borrow_mut()
    }

    pub fn text_content_animated(&self) -> RefMut<'_, TextContentAttributes> {
        self.text_content.borrow_mut()
    }

    /// Whether `name` is an attribute this element reacts to.
    pub fn is_known_attribute(name: &QualName) -> bool {
        is_own_attribute(name)
            || TextContentAttributes::is_known_attribute(name)
            || UriReference::is_known_attribute(name)
    }

    // ==================== IDL Setters ====================

    /// `method.baseVal = value`. Reflects into the `method` attribute.
    pub fn set_method_base_val(
        &self,
        element: &Rc<Node>,
        document: &Document,
        value: u16,
    ) -> Result<(), SvgError> {
        let method = validate_enum_value::<TextPathMethod>(value)?;
        document.set_attribute(element, METHOD, method.as_str())?;
        Ok(())
    }

    /// `spacing.baseVal = value`. Reflects into the `spacing` attribute.
    pub fn set_spacing_base_val(
        &self,
        element: &Rc<Node>,
        document: &Document,
        value: u16,
    ) -> Result<(), SvgError> {
        let spacing = validate_enum_value::<TextPathSpacing>(value)?;
        document.set_attribute(element, SPACING, spacing.as_str())?;
        Ok(())
    }

    /// `startOffset.baseVal = length`. Reflects into the `startOffset` attribute.
    pub fn set_start_offset_base_val(
        &self,
        element: &Rc<Node>,
        document: &Document,
        length: SvgLength,
    ) -> Result<(), SvgError> {
        let value = length.value_in_specified_units();
        if !value.is_finite() || length.unit() == LengthUnit::Unknown {
            return Err(SvgError::InvalidLength(length.value_as_string()));
        }
        let length = SvgLength::new(LengthMode::Other, value, length.unit());
        document.set_attribute(element, START_OFFSET, &length.value_as_string())?;
        Ok(())
    }

    // ==================== Lengths & Layout State ====================

    /// Whether any of the element's own lengths is relative.
    pub fn self_has_relative_lengths(&self) -> bool {
        self.start_offset().is_relative() || self.text_content.borrow().self_has_relative_lengths()
    }

    /// Cached result of [`self_has_relative_lengths`](Self::self_has_relative_lengths),
    /// refreshed when a length attribute changes.
    pub fn has_relative_lengths(&self) -> bool {
        self.has_relative_lengths.get()
    }

    fn update_relative_lengths_information(&self) {
        self.has_relative_lengths
            .set(self.self_has_relative_lengths());
    }

    /// Whether the render tree created a renderer for the element.
    pub fn has_renderer(&self) -> bool {
        self.has_renderer.get()
    }

    pub(crate) fn set_has_renderer(&self, has_renderer: bool) {
        self.has_renderer.set(has_renderer);
        self.needs_layout.set(has_renderer);
    }

    pub fn needs_layout(&self) -> bool {
        self.needs_layout.get()
    }

    pub(crate) fn clear_needs_layout(&self) {
        self.needs_layout.set(false);
    }

    /// Dirty the renderer, if there is one.
    pub fn mark_for_layout(&self) {
        if self.has_renderer.get() {
            self.needs_layout.set(true);
        }
    }

    // ==================== Attribute Changes ====================

    /// React to a changed attribute after it has been parsed.
    pub fn svg_attribute_changed(&self, element: &Rc<Node>, document: &Document, name: &QualName) {
        if is_own_attribute(name) {
            if &*name.local == START_OFFSET {
                self.update_relative_lengths_information();
            }
            self.mark_for_layout();
            return;
        }

        if UriReference::is_known_attribute(name) {
            self.build_pending_resource(element, document);
            self.mark_for_layout();
            return;
        }

        if TextContentAttributes::is_known_attribute(name) {
            if &*name.local == "textLength" {
                self.update_relative_lengths_information();
            }
            self.mark_for_layout();
        }
    }

    fn parse_start_offset(&self, element: &Node, value: Option<&str>) {
        let length = match value.map(|text| SvgLength::parse(LengthMode::Other, text)) {
            None => SvgLength::zero(LengthMode::Other),
            Some(Ok(length)) => length,
            Some(Err(err)) => {
                warn!(
                    element = element.id.raw(),
                    error = %err,
                    "invalid startOffset, using default"
                );
                SvgLength::zero(LengthMode::Other)
            }
        };
        self.start_offset.borrow_mut().set_base_value(length);
    }

    fn clear_resource_references(&self, element: &Rc<Node>, document: &Document) {
        document
            .resources_mut()
            .remove_all_target_references_for_element(element);
    }
}

fn is_own_attribute(name: &QualName) -> bool {
    name.ns.is_empty() && matches!(&*name.local, START_OFFSET | METHOD | SPACING)
}

/// Apply an enumeration attribute change. Unknown values keep the previous value.
fn parse_enum<E: SvgEnumeration>(
    property: &RefCell<AnimatedEnumeration<E>>,
    name: &str,
    value: Option<&str>,
) {
    let Some(text) = value else {
        property.borrow_mut().set_base_value(E::default());
        return;
    };
    let parsed = E::from_str_value(text);
    if parsed.is_unknown() {
        trace!(attribute = name, value = text, "ignoring unknown enumeration value");
        return;
    }
    property.borrow_mut().set_base_value(parsed);
}

impl ElementBehavior for TextPathElement {
    fn parse_attribute(&self, element: &Rc<Node>, name: &QualName, value: Option<&str>) {
        if name.ns.is_empty() {
            match &*name.local {
                START_OFFSET => return self.parse_start_offset(element, value),
                METHOD => return parse_enum(&self.method, METHOD, value),
                SPACING => return parse_enum(&self.spacing, SPACING, value),
                _ => {}
            }
        }

        if self.text_content.borrow_mut().parse_attribute(name, value) {
            return;
        }
        self.uri.borrow_mut().parse_attribute(name, value);
    }

    fn attribute_changed(&self, element: &Rc<Node>, document: &Document, name: &QualName) {
        self.svg_attribute_changed(element, document, name);
    }

    fn inserted_into_ancestor(
        &self,
        _element: &Rc<Node>,
        _document: &Document,
        _insertion: InsertionType,
    ) -> InsertedIntoAncestorResult {
        InsertedIntoAncestorResult::NeedsPostInsertionCallback
    }

    fn did_finish_inserting_node(&self, element: &Rc<Node>, document: &Document) {
        self.build_pending_resource(element, document);
    }

    fn removed_from_ancestor(&self, element: &Rc<Node>, document: &Document, removal: RemovalType) {
        if removal.disconnected_from_document {
            self.clear_resource_references(element, document);
            self.set_has_renderer(false);
        }
    }

    fn build_pending_resource(&self, element: &Rc<Node>, document: &Document) {
        self.clear_resource_references(element, document);
        if !element.is_connected() {
            return;
        }

        let href = self.href();
        let target = target_element_from_iri(&href, document);
        match target.element {
            None => {
                if target.identifier.is_empty() {
                    return;
                }
                let mut resources = document.resources_mut();
                if !resources.is_pending_resource(element, &target.identifier) {
                    debug!(
                        element = element.id.raw(),
                        id = %target.identifier,
                        "textPath target missing, waiting for it"
                    );
                    resources.add_pending_resource(&target.identifier, element);
                }
            }
            Some(path) if path.has_tag_name(SVG_NAMESPACE, "path") => {
                trace!(element = element.id.raw(), path = path.id.raw(), "textPath target resolved");
                document
                    .resources_mut()
                    .add_element_referencing_target(element, &path);
            }
            Some(other) => {
                trace!(
                    element = element.id.raw(),
                    target = ?other.tag_name(),
                    "textPath target is not a path"
                );
            }
        }
    }

    fn referenced_target_changed(&self, _element: &Rc<Node>, _document: &Document, _target: &Rc<Node>) {
        self.mark_for_layout();
    }

    fn renderer_is_needed(&self, element: &Node) -> bool {
        element.parent().is_some_and(|parent| {
            parent.has_tag_name(SVG_NAMESPACE, "a") || parent.has_tag_name(SVG_NAMESPACE, "text")
        })
    }

    fn child_should_create_renderer(&self, _element: &Node, child: &Node) -> bool {
        child.is_text()
            || child.has_tag_name(SVG_NAMESPACE, "a")
            || child.has_tag_name(SVG_NAMESPACE, "tref")
            || child.has_tag_name(SVG_NAMESPACE, "tspan")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ==================== Animation ====================

impl AnimatedAttributes for TextPathElement {
    fn animated_property_kind(&self, name: &str) -> Option<AnimatedPropertyKind> {
        match name {
            START_OFFSET | "textLength" => Some(AnimatedPropertyKind::Length),
            METHOD | SPACING | "lengthAdjust" => Some(AnimatedPropertyKind::Enumeration),
            _ => None,
        }
    }

    fn animated_value(&self, name: &str) -> Option<AnimatedValue> {
        Some(match name {
            START_OFFSET => AnimatedValue::Length(self.start_offset()),
            "textLength" => AnimatedValue::Length(self.text_length()),
            METHOD => AnimatedValue::Enumeration(self.method().to_u16()),
            SPACING => AnimatedValue::Enumeration(self.spacing().to_u16()),
            "lengthAdjust" => AnimatedValue::Enumeration(self.length_adjust().to_u16()),
            _ => return None,
        })
    }

    fn start_animation(&self, name: &str) -> Result<(), SvgError> {
        match name {
            START_OFFSET => self.start_offset.borrow_mut().start_animation(),
            METHOD => self.method.borrow_mut().start_animation(),
            SPACING => self.spacing.borrow_mut().start_animation(),
            "textLength" => self.text_content.borrow_mut().text_length_animated().start_animation(),
            "lengthAdjust" => self
                .text_content
                .borrow_mut()
                .length_adjust_animated()
                .start_animation(),
            _ => return Err(SvgError::UnknownAttribute(name.to_string())),
        }
        Ok(())
    }

    fn set_animated_value(&self, name: &str, value: AnimatedValue) -> Result<(), SvgError> {
        match (name, value) {
            (START_OFFSET, AnimatedValue::Length(length)) => {
                self.start_offset.borrow_mut().set_animated_value(length)?;
                self.update_relative_lengths_information();
            }
            ("textLength", AnimatedValue::Length(length)) => {
                self.text_content
                    .borrow_mut()
                    .text_length_animated()
                    .set_animated_value(length)?;
                self.update_relative_lengths_information();
            }
            (METHOD, AnimatedValue::Enumeration(v)) => {
                self.method.borrow_mut().set_animated_enum_value(v)?
            }
            (SPACING, AnimatedValue::Enumeration(v)) => {
                self.spacing.borrow_mut().set_animated_enum_value(v)?
            }
            ("lengthAdjust", AnimatedValue::Enumeration(v)) => self
                .text_content
                .borrow_mut()
                .length_adjust_animated()
                .set_animated_enum_value(v)?,
            _ => {
                return Err(match self.animated_property_kind(name) {
                    None => SvgError::UnknownAttribute(name.to_string()),
                    Some(kind) => SvgError::InvalidAttribute(format!(
                        "{name} expects a {kind:?} value, got {:?}",
                        value.kind()
                    )),
                })
            }
        }
        self.mark_for_layout();
        Ok(())
    }

    fn stop_animation(&self, name: &str) -> Result<(), SvgError> {
        match name {
            START_OFFSET => self.start_offset.borrow_mut().stop_animation(),
            METHOD => self.method.borrow_mut().stop_animation(),
            SPACING => self.spacing.borrow_mut().stop_animation(),
            "textLength" => self.text_content.borrow_mut().text_length_animated().stop_animation(),
            "lengthAdjust" => self
                .text_content
                .borrow_mut()
                .length_adjust_animated()
                .stop_animation(),
            _ => return Err(SvgError::UnknownAttribute(name.to_string())),
        }
        self.update_relative_lengths_information();
        self.mark_for_layout();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::svg_element_factory;
    use rustkit_dom::{local_attr, qual_name, XLINK_NAMESPACE};

    fn svg_document() -> (Document, Rc<Node>) {
        let doc = Document::with_factory(svg_element_factory());
        let svg = doc.create_element(qual_name(SVG_NAMESPACE, "svg"));
        doc.append_child(doc.root(), svg.clone()).unwrap();
        (doc, svg)
    }

    fn text_path(doc: &Document) -> Rc<Node> {
        doc.create_element(qual_name(SVG_NAMESPACE, "textPath"))
    }

    fn behavior(node: &Node) -> &TextPathElement {
        node.behavior_as::<TextPathElement>().unwrap()
    }

    #[test]
    fn test_defaults() {
        let (doc, _svg) = svg_document();
        let tp = text_path(&doc);
        let el = behavior(&tp);
        assert_eq!(el.start_offset(), SvgLength::zero(LengthMode::Other));
        assert_eq!(el.method(), TextPathMethod::Align);
        assert_eq!(el.spacing(), TextPathSpacing::Exact);
        assert_eq!(el.href(), "");
        assert!(!el.self_has_relative_lengths());
    }

    #[test]
    fn test_idl_constants() {
        assert_eq!(TEXTPATH_METHODTYPE_UNKNOWN, 0);
        assert_eq!(TEXTPATH_METHODTYPE_ALIGN, 1);
        assert_eq!(TEXTPATH_METHODTYPE_STRETCH, 2);
        assert_eq!(TEXTPATH_SPACINGTYPE_UNKNOWN, 0);
        assert_eq!(TEXTPATH_SPACINGTYPE_AUTO, 1);
        assert_eq!(TEXTPATH_SPACINGTYPE_EXACT, 2);
    }

    #[test]
    fn test_enum_attributes() {
        let (doc, _svg) = svg_document();
        let tp = text_path(&doc);

        doc.set_attribute(&tp, "method", "stretch").unwrap();
        doc.set_attribute(&tp, "spacing", "auto").unwrap();
        assert_eq!(behavior(&tp).method(), TextPathMethod::Stretch);
        assert_eq!(behavior(&tp).spacing(), TextPathSpacing::Auto);

        // Unknown values leave the previous value in place.
        doc.set_attribute(&tp, "method", "Align").unwrap();
        doc.set_attribute(&tp, "spacing", "").unwrap();
        assert_eq!(behavior(&tp).method(), TextPathMethod::Stretch);
        assert_eq!(behavior(&tp).spacing(), TextPathSpacing::Auto);

        doc.remove_attribute(&tp, &local_attr("method")).unwrap();
        assert_eq!(behavior(&tp).method(), TextPathMethod::Align);
    }

    #[test]
    fn test_start_offset_parsing() {
        let (doc, _svg) = svg_document();
        let tp = text_path(&doc);

        doc.set_attribute(&tp, "startOffset", "25%").unwrap();
        let offset = behavior(&tp).start_offset();
        assert_eq!(offset.unit(), LengthUnit::Percentage);
        assert_eq!(offset.value_in_specified_units(), 25.0);
        assert!(behavior(&tp).self_has_relative_lengths());
        assert!(behavior(&tp).has_relative_lengths());

        doc.set_attribute(&tp, "startOffset", "bogus").unwrap();
        assert_eq!(behavior(&tp).start_offset(), SvgLength::zero(LengthMode::Other));
        assert!(!behavior(&tp).has_relative_lengths());
    }

    #[test]
    fn test_namespaced_lookalikes_are_ignored() {
        let (doc, _svg) = svg_document();
        let tp = text_path(&doc);
        doc.set_attribute_ns(&tp, &qual_name(SVG_NAMESPACE, "method"), "stretch")
            .unwrap();
        assert_eq!(behavior(&tp).method(), TextPathMethod::Align);
        assert!(!TextPathElement::is_known_attribute(&qual_name(SVG_NAMESPACE, "method")));
        assert!(TextPathElement::is_known_attribute(&qual_name(XLINK_NAMESPACE, "href")));
        assert!(TextPathElement::is_known_attribute(&local_attr("lengthAdjust")));
    }

    #[test]
    fn test_idl_setters_reflect() {
        let (doc, _svg) = svg_document();
        let tp = text_path(&doc);
        let el = behavior(&tp);

        el.set_method_base_val(&tp, &doc, TEXTPATH_METHODTYPE_STRETCH).unwrap();
        assert_eq!(tp.get_attribute("method").as_deref(), Some("stretch"));
        assert_eq!(el.method(), TextPathMethod::Stretch);

        el.set_spacing_base_val(&tp, &doc, TEXTPATH_SPACINGTYPE_AUTO).unwrap();
        assert_eq!(tp.get_attribute("spacing").as_deref(), Some("auto"));

        assert!(matches!(
            el.set_method_base_val(&tp, &doc, TEXTPATH_METHODTYPE_UNKNOWN),
            Err(SvgError::InvalidEnumValue { .. })
        ));
        assert!(el.set_spacing_base_val(&tp, &doc, 7).is_err());
        assert_eq!(el.method(), TextPathMethod::Stretch);

        let length = SvgLength::new(LengthMode::Width, 12.0, LengthUnit::Px);
        el.set_start_offset_base_val(&tp, &doc, length).unwrap();
        assert_eq!(tp.get_attribute("startOffset").as_deref(), Some("12px"));
        assert_eq!(el.start_offset().mode(), LengthMode::Other);
    }

    #[test]
    fn test_start_offset_setter_rejects_non_finite() {
        let (doc, _svg) = svg_document();
        let tp = text_path(&doc);
        let el = behavior(&tp);
        doc.set_attribute(&tp, "startOffset", "5").unwrap();

        for value in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            let length = SvgLength::new(LengthMode::Other, value, LengthUnit::Px);
            assert!(matches!(
                el.set_start_offset_base_val(&tp, &doc, length),
                Err(SvgError::InvalidLength(_))
            ));
        }
        let unknown = SvgLength::new(LengthMode::Other, 3.0, LengthUnit::Unknown);
        assert!(el.set_start_offset_base_val(&tp, &doc, unknown).is_err());

        assert_eq!(tp.get_attribute("startOffset").as_deref(), Some("5"));
        assert_eq!(el.start_offset().value_in_specified_units(), 5.0);
    }

    #[test]
    fn test_renderer_eligibility() {
        let (doc, svg) = svg_document();
        let text = doc.create_element(qual_name(SVG_NAMESPACE, "text"));
        doc.append_child(&svg, text.clone()).unwrap();

        let inside = text_path(&doc);
        doc.append_child(&text, inside.clone()).unwrap();
        assert!(behavior(&inside).renderer_is_needed(&inside));

        let stray = text_path(&doc);
        doc.append_child(&svg, stray.clone()).unwrap();
        assert!(!behavior(&stray).renderer_is_needed(&stray));

        let detached = text_path(&doc);
        assert!(!behavior(&detached).renderer_is_needed(&detached));

        let el = behavior(&inside);
        let run = doc.create_text_node("hi");
        let tspan = doc.create_element(qual_name(SVG_NAMESPACE, "tspan"));
        let rect = doc.create_element(qual_name(SVG_NAMESPACE, "rect"));
        let html_a = doc.create_element(qual_name(rustkit_dom::HTML_NAMESPACE, "a"));
        assert!(el.child_should_create_renderer(&inside, &run));
        assert!(el.child_should_create_renderer(&inside, &tspan));
        assert!(!el.child_should_create_renderer(&inside, &rect));
        assert!(!el.child_should_create_renderer(&inside, &html_a));
    }

    #[test]
    fn test_resolves_existing_path() {
        let (doc, svg) = svg_document();
        let path = doc.create_element(qual_name(SVG_NAMESPACE, "path"));
        doc.set_attribute(&path, "id", "curve").unwrap();
        doc.append_child(&svg, path.clone()).unwrap();

        let tp = text_path(&doc);
        doc.set_attribute(&tp, "href", "#curve").unwrap();
        // Not connected yet: nothing registered.
        assert!(doc.resources().referencing_elements(&path).is_empty());

        doc.append_child(&svg, tp.clone()).unwrap();
        assert_eq!(doc.resources().referenced_targets(&tp), vec![path.id]);
        assert!(!doc.resources().has_pending_resources(&tp));
    }

    #[test]
    fn test_pending_until_target_appears() {
        let (doc, svg) = svg_document();
        let tp = text_path(&doc);
        doc.set_attribute_ns(&tp, &qual_name(XLINK_NAMESPACE, "href"), "#later")
            .unwrap();
        doc.append_child(&svg, tp.clone()).unwrap();
        assert!(doc.resources().is_pending_resource(&tp, "later"));

        let path = doc.create_element(qual_name(SVG_NAMESPACE, "path"));
        doc.set_attribute(&path, "id", "later").unwrap();
        doc.append_child(&svg, path.clone()).unwrap();

        assert!(!doc.resources().has_pending_resources(&tp));
        assert_eq!(doc.resources().referenced_targets(&tp), vec![path.id]);
    }

    #[test]
    fn test_non_path_target_is_not_referenced() {
        let (doc, svg) = svg_document();
        let rect = doc.create_element(qual_name(SVG_NAMESPACE, "rect"));
        doc.set_attribute(&rect, "id", "box").unwrap();
        doc.append_child(&svg, rect).unwrap();

        let tp = text_path(&doc);
        doc.set_attribute(&tp, "href", "#box").unwrap();
        doc.append_child(&svg, tp.clone()).unwrap();
        assert!(doc.resources().referenced_targets(&tp).is_empty());
        assert!(!doc.resources().has_pending_resources(&tp));
    }

    #[test]
    fn test_href_change_rebuilds_reference() {
        let (doc, svg) = svg_document();
        let a = doc.create_element(qual_name(SVG_NAMESPACE, "path"));
        doc.set_attribute(&a, "id", "a").unwrap();
        let b = doc.create_element(qual_name(SVG_NAMESPACE, "path"));
        doc.set_attribute(&b, "id", "b").unwrap();
        doc.append_child(&svg, a.clone()).unwrap();
        doc.append_child(&svg, b.clone()).unwrap();

        let tp = text_path(&doc);
        doc.set_attribute(&tp, "href", "#a").unwrap();
        doc.append_child(&svg, tp.clone()).unwrap();
        assert_eq!(doc.resources().referenced_targets(&tp), vec![a.id]);

        doc.set_attribute(&tp, "href", "#b").unwrap();
        assert_eq!(doc.resources().referenced_targets(&tp), vec![b.id]);
        assert!(doc.resources().referencing_elements(&a).is_empty());
    }

    #[test]
    fn test_removal_clears_references() {
        let (doc, svg) = svg_document();
        let path = doc.create_element(qual_name(SVG_NAMESPACE, "path"));
        doc.set_attribute(&path, "id", "curve").unwrap();
        doc.append_child(&svg, path.clone()).unwrap();
        let tp = text_path(&doc);
        doc.set_attribute(&tp, "href", "#curve").unwrap();
        doc.append_child(&svg, tp.clone()).unwrap();

        doc.remove_child(&svg, &tp).unwrap();
        assert!(doc.resources().referencing_elements(&path).is_empty());
        assert!(doc.resources().referenced_targets(&tp).is_empty());
    }

    #[test]
    fn test_removed_target_makes_reference_pending() {
        let (doc, svg) = svg_document();
        let path = doc.create_element(qual_name(SVG_NAMESPACE, "path"));
        doc.set_attribute(&path, "id", "curve").unwrap();
        doc.append_child(&svg, path.clone()).unwrap();
        let tp = text_path(&doc);
        doc.set_attribute(&tp, "href", "#curve").unwrap();
        doc.append_child(&svg, tp.clone()).unwrap();

        doc.remove_child(&svg, &path).unwrap();
        assert!(doc.resources().is_pending_resource(&tp, "curve"));

        doc.append_child(&svg, path.clone()).unwrap();
        assert_eq!(doc.resources().referenced_targets(&tp), vec![path.id]);
    }

    #[test]
    fn test_mark_for_layout_needs_renderer() {
        let (doc, _svg) = svg_document();
        let tp = text_path(&doc);
        let el = behavior(&tp);

        doc.set_attribute(&tp, "method", "stretch").unwrap();
        assert!(!el.needs_layout());

        el.set_has_renderer(true);
        el.clear_needs_layout();
        doc.set_attribute(&tp, "spacing", "auto").unwrap();
        assert!(el.needs_layout());
    }

    #[test]
    fn test_animation_by_name() {
        let (doc, _svg) = svg_document();
        let tp = text_path(&doc);
        doc.set_attribute(&tp, "startOffset", "10").unwrap();
        let el = behavior(&tp);

        el.start_animation("startOffset").unwrap();
        let animated = SvgLength::new(LengthMode::Other, 50.0, LengthUnit::Percentage);
        el.set_animated_value("startOffset", AnimatedValue::Length(animated))
            .unwrap();
        assert_eq!(el.start_offset(), animated);
        assert!(el.has_relative_lengths());
        assert_eq!(
            el.start_offset_animated().base_value().value_in_specified_units(),
            10.0
        );

        el.stop_animation("startOffset").unwrap();
        assert_eq!(el.start_offset().value_in_specified_units(), 10.0);
        assert!(!el.has_relative_lengths());

        el.start_animation("method").unwrap();
        el.set_animated_value("method", AnimatedValue::Enumeration(2))
            .unwrap();
        assert_eq!(el.method(), TextPathMethod::Stretch);
        assert_eq!(*el.method_animated().base_value(), TextPathMethod::Align);

        assert!(matches!(
            el.set_animated_value("method", AnimatedValue::Length(animated)),
            Err(SvgError::InvalidAttribute(_))
        ));
        assert!(matches!(
            el.start_animation("d"),
            Err(SvgError::UnknownAttribute(_))
        ));
        assert!(matches!(
            el.set_animated_value("spacing", AnimatedValue::Enumeration(1)),
            Err(SvgError::NotAnimating(_))
        ));
    }
}
