//! `href` / `xlink:href` handling and IRI target resolution.

use std::rc::Rc;

use rustkit_dom::{Document, Node, QualName, XLINK_NAMESPACE};
use tracing::trace;
use url::Url;

/// The href attributes of an element that references another element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UriReference {
    href: Option<String>,
    xlink_href: Option<String>,
}

impl UriReference {
    pub fn new() -> Self {
        Self::default()
    }

    /// `href` (no namespace) or `xlink:href`.
    pub fn is_known_attribute(name: &QualName) -> bool {
        &*name.local == "href" && (name.ns.is_empty() || &*name.ns == XLINK_NAMESPACE)
    }

    /// Store an href change. Returns false for unrelated attributes.
    pub fn parse_attribute(&mut self, name: &QualName, value: Option<&str>) -> bool {
        if &*name.local != "href" {
            return false;
        }
        let slot = if name.ns.is_empty() {
            &mut self.href
        } else if &*name.ns == XLINK_NAMESPACE {
            &mut self.xlink_href
        } else {
            return false;
        };
        *slot = value.map(str::to_string);
        true
    }

    /// Effective reference: plain `href` wins over `xlink:href`.
    pub fn href(&self) -> &str {
        self.href
            .as_deref()
            .or(self.xlink_href.as_deref())
            .unwrap_or("")
    }
}

/// Result of resolving an IRI against a document.
#[derive(Debug, Clone, Default)]
pub struct TargetElement {
    /// The connected element with the referenced id, if any.
    pub element: Option<Rc<Node>>,
    /// The referenced id; empty for external or fragment-less IRIs.
    pub identifier: String,
}

/// Resolve `iri` to an element of `document`.
///
/// Accepts `#id`, `url(#id)`, and URLs whose document part matches the
/// document URL. References into other documents resolve to nothing.
pub fn target_element_from_iri(iri: &str, document: &Document) -> TargetElement {
    let identifier = fragment_identifier(iri, document.url().as_ref()).unwrap_or_default();
    let element = if identifier.is_empty() {
        None
    } else {
        document.get_element_by_id(&identifier)
    };
    trace!(iri, identifier = %identifier, found = element.is_some(), "resolved IRI");
    TargetElement {
        element,
        identifier,
    }
}

fn fragment_identifier(iri: &str, base: Option<&Url>) -> Option<String> {
    let mut iri = iri.trim();
    if let Some(inner) = iri.strip_prefix("url(").and_then(|s| s.strip_suffix(')')) {
        iri = inner.trim().trim_matches(|c| c == '"' || c == '\'');
    }

    let raw = match iri.strip_prefix('#') {
        Some(fragment) => fragment.to_string(),
        None => {
            let base = base?;
            let resolved = base.join(iri).ok()?;
            if !same_document(&resolved, base) {
                return None;
            }
            resolved.fragment()?.to_string()
        }
    };

    Some(match urlencoding::decode(&raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw,
    })
}

fn same_document(a: &Url, b: &Url) -> bool {
    let mut a = a.clone();
    let mut b = b.clone();
    a.set_fragment(None);
    b.set_fragment(None);
    a == b
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustkit_dom::{local_attr, qual_name, SVG_NAMESPACE};

    fn xlink_href() -> QualName {
        qual_name(XLINK_NAMESPACE, "href")
    }

    #[test]
    fn test_href_wins_over_xlink() {
        let mut uri = UriReference::new();
        assert_eq!(uri.href(), "");

        uri.parse_attribute(&xlink_href(), Some("#a"));
        assert_eq!(uri.href(), "#a");

        uri.parse_attribute(&local_attr("href"), Some("#b"));
        assert_eq!(uri.href(), "#b");

        uri.parse_attribute(&local_attr("href"), None);
        assert_eq!(uri.href(), "#a");
    }

    #[test]
    fn test_known_attributes() {
        assert!(UriReference::is_known_attribute(&local_attr("href")));
        assert!(UriReference::is_known_attribute(&xlink_href()));
        assert!(!UriReference::is_known_attribute(&qual_name(SVG_NAMESPACE, "href")));
        assert!(!UriReference::is_known_attribute(&local_attr("src")));
        assert!(!UriReference::new().parse_attribute(&local_attr("d"), Some("x")));
    }

    #[test]
    fn test_fragment_forms() {
        assert_eq!(fragment_identifier("#p", None).as_deref(), Some("p"));
        assert_eq!(fragment_identifier("  #p ", None).as_deref(), Some("p"));
        assert_eq!(fragment_identifier("url(#p)", None).as_deref(), Some("p"));
        assert_eq!(fragment_identifier("#a%20b", None).as_deref(), Some("a b"));
        assert_eq!(fragment_identifier("other.svg#p", None), None);
    }

    #[test]
    fn test_same_document_urls() {
        let base = Url::parse("https://example.com/doc.html").unwrap();
        assert_eq!(
            fragment_identifier("doc.html#p", Some(&base)).as_deref(),
            Some("p")
        );
        assert_eq!(
            fragment_identifier("https://example.com/doc.html#q", Some(&base)).as_deref(),
            Some("q")
        );
        assert_eq!(fragment_identifier("other.svg#p", Some(&base)), None);
        assert_eq!(fragment_identifier("doc.html", Some(&base)), None);
    }

    #[test]
    fn test_target_element_lookup() {
        let doc = Document::new();
        let path = doc.create_element(qual_name(SVG_NAMESPACE, "path"));
        doc.set_attribute(&path, "id", "curve").unwrap();

        // Detached elements are not in the id index yet.
        let target = target_element_from_iri("#curve", &doc);
        assert!(target.element.is_none());
        assert_eq!(target.identifier, "curve");

        doc.append_child(doc.root(), path.clone()).unwrap();
        let target = target_element_from_iri("#curve", &doc);
        assert_eq!(target.element.map(|n| n.id), Some(path.id));

        let external = target_element_from_iri("http://elsewhere/x.svg#curve", &doc);
        assert!(external.element.is_none());
        assert!(external.identifier.is_empty());
    }
}
