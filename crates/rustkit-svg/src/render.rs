//! Render tree for SVG text on a path.
//!
//! Only `<textPath>` renderers are modeled. A renderer exists for a
//! `textPath` inside an SVG `<text>` when every element on the way down
//! agrees (`renderer_is_needed`), and its text comes from the children the
//! element accepts (`child_should_create_renderer`).

use std::rc::Rc;

use rustkit_dom::{Document, ElementBehavior, Node, NodeId, SVG_NAMESPACE};
use tracing::{debug, trace};

use crate::config::SvgConfig;
use crate::layout::{layout_text_on_path, PositionedGlyph, TextPathParams};
use crate::length::{LengthContext, LengthMode, SvgLength};
use crate::path::{PathElement, PathGeometry};
use crate::text_path::TextPathElement;
use crate::uri_reference::target_element_from_iri;

/// Laid-out text of one `<textPath>`.
#[derive(Debug, Clone)]
pub struct TextPathRenderer {
    element: Rc<Node>,
    text: String,
    path: Option<NodeId>,
    glyphs: Vec<PositionedGlyph>,
}

impl TextPathRenderer {
    pub fn element(&self) -> &Rc<Node> {
        &self.element
    }

    /// Text gathered from the accepted children, before whitespace collapsing.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The `<path>` the text is laid out on, if the href resolved.
    pub fn path(&self) -> Option<NodeId> {
        self.path
    }

    pub fn glyphs(&self) -> &[PositionedGlyph] {
        &self.glyphs
    }
}

/// All text-path renderers of a document.
#[derive(Debug)]
pub struct RenderTree {
    renderers: Vec<TextPathRenderer>,
    config: SvgConfig,
}

impl RenderTree {
    /// Build renderers for every eligible `textPath` and lay them out.
    pub fn build(document: &Document, config: &SvgConfig) -> Self {
        let mut text_paths = Vec::new();
        let mut text_roots = Vec::new();
        document.traverse(|node| {
            if let Some(el) = node.behavior_as::<TextPathElement>() {
                el.set_has_renderer(false);
                text_paths.push(node.clone());
            }
            if is_svg_text(node) && !has_text_ancestor(node) {
                text_roots.push(node.clone());
            }
        });

        let mut tree = Self {
            renderers: Vec::new(),
            config: config.clone(),
        };
        for root in &text_roots {
            tree.collect(document, root);
        }

        debug!(
            text_paths = text_paths.len(),
            renderers = tree.renderers.len(),
            "SVG render tree built"
        );
        tree
    }

    fn collect(&mut self, document: &Document, parent: &Rc<Node>) {
        for child in parent.children() {
            if !child.is_element() {
                continue;
            }
            if let Some(behavior) = child.behavior() {
                if !behavior.renderer_is_needed(&child) {
                    trace!(element = child.id.raw(), "no renderer needed");
                    continue;
                }
            }
            match child.behavior_as::<TextPathElement>() {
                Some(el) => {
                    el.set_has_renderer(true);
                    let mut renderer = TextPathRenderer {
                        element: child.clone(),
                        text: String::new(),
                        path: None,
                        glyphs: Vec::new(),
                    };
                    self.layout(document, el, &mut renderer);
                    self.renderers.push(renderer);
                }
                None => self.collect(document, &child),
            }
        }
    }

    fn layout(&self, document: &Document, el: &TextPathElement, renderer: &mut TextPathRenderer) {
        let element = renderer.element.clone();
        renderer.text = element
            .children()
            .iter()
            .filter(|child| el.child_should_create_renderer(&element, child))
            .map(|child| child.text_content())
            .collect();

        let target = target_element_from_iri(&el.href(), document).element;
        let path = target
            .as_ref()
            .and_then(|node| node.behavior_as::<PathElement>().map(|p| (node.id, p)));

        let (geometry, path_length) = match path {
            Some((_, path_el)) => (path_el.geometry(&self.config), path_el.path_length()),
            None => (PathGeometry::default(), None),
        };
        renderer.path = path.map(|(id, _)| id);

        let params = TextPathParams {
            start_offset: el.start_offset(),
            method: el.method(),
            spacing: el.spacing(),
            text_length: el.text_length(),
            length_adjust: el.length_adjust(),
            font_size: font_size_for(&element, &self.config),
            path_length,
        };
        renderer.glyphs = layout_text_on_path(&renderer.text, &geometry, &params, &self.config);
        el.clear_needs_layout();
    }

    /// Lay out again every renderer whose element was marked for layout.
    /// Renderers of elements that left the document are dropped first.
    /// Returns how many were redone.
    pub fn relayout(&mut self, document: &Document) -> usize {
        let mut renderers = std::mem::take(&mut self.renderers);
        let before = renderers.len();
        renderers.retain(|renderer| {
            renderer.element.is_connected()
                && renderer
                    .element
                    .behavior_as::<TextPathElement>()
                    .is_some_and(TextPathElement::has_renderer)
        });
        let dropped = before - renderers.len();

        let mut count = 0;
        for renderer in &mut renderers {
            let element = renderer.element.clone();
            let Some(el) = element.behavior_as::<TextPathElement>() else {
                continue;
            };
            if el.needs_layout() {
                self.layout(document, el, renderer);
                count += 1;
            }
        }
        self.renderers = renderers;
        if count > 0 || dropped > 0 {
            debug!(count, dropped, "text paths laid out again");
        }
        count
    }

    pub fn renderers(&self) -> &[TextPathRenderer] {
        &self.renderers
    }

    /// Renderer of a `textPath` element, if it has one.
    pub fn renderer_for(&self, element: &Node) -> Option<&TextPathRenderer> {
        self.renderers.iter().find(|r| r.element.id == element.id)
    }
}

fn is_svg_text(node: &Node) -> bool {
    node.has_tag_name(SVG_NAMESPACE, "text")
}

fn has_text_ancestor(node: &Node) -> bool {
    let mut current = node.parent();
    while let Some(ancestor) = current {
        if is_svg_text(&ancestor) {
            return true;
        }
        current = ancestor.parent();
    }
    false
}

/// Resolve `font-size` down the ancestor chain. Relative sizes resolve
/// against the parent's size; unparsable or negative sizes are skipped.
fn font_size_for(element: &Rc<Node>, config: &SvgConfig) -> f32 {
    let mut chain = Vec::new();
    let mut current = Some(element.clone());
    while let Some(node) = current {
        current = node.parent();
        chain.push(node);
    }

    chain.iter().rev().fold(config.default_font_size, |inherited, node| {
        let Some(value) = node.get_attribute("font-size") else {
            return inherited;
        };
        let ctx = LengthContext {
            viewport_width: config.viewport_width,
            viewport_height: config.viewport_height,
            font_size: inherited,
            reference_length: Some(inherited),
        };
        match SvgLength::parse(LengthMode::Other, &value) {
            Ok(length) if length.value_in_specified_units() >= 0.0 => length.to_user_units(&ctx),
            _ => {
                trace!(element = node.id.raw(), value = %value, "ignoring font-size");
                inherited
            }
        }
    })
}
