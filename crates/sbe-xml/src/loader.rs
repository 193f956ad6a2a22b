//! Document loading with XInclude processing.
//!
//! `xi:include` elements are replaced by the referenced content before the
//! tree is handed out: `parse="xml"` splices in the root element of the
//! target document, `parse="text"` splices in its characters. A failed
//! inclusion falls back to the children of `xi:fallback` when present.
//! References are resolved against the location of the document containing
//! the include, never the working directory.

use std::path::Path;

use tracing::debug;
use url::Url;

use sbe_resources::{ResourceLocator, ResourceResolver};

use crate::error::XmlError;
use crate::parse::{decode, parse_document};
use crate::tree::{Document, Element, MAX_ELEMENT_DEPTH, Node};

pub const XINCLUDE_NAMESPACE: &str = "http://www.w3.org/2001/XInclude";

const MAX_INCLUDE_DEPTH: usize = 32;

#[derive(Debug, Clone)]
pub struct DocumentLoader {
    locator: ResourceLocator,
    xinclude: bool,
}

impl Default for DocumentLoader {
    fn default() -> Self {
        Self::new(ResourceLocator::empty())
    }
}

impl DocumentLoader {
    /// Loader with XInclude processing enabled.
    pub fn new(locator: ResourceLocator) -> Self {
        Self {
            locator,
            xinclude: true,
        }
    }

    #[must_use]
    pub fn with_xinclude(mut self, enable: bool) -> Self {
        self.xinclude = enable;
        self
    }

    pub fn locator(&self) -> &ResourceLocator {
        &self.locator
    }

    pub fn load_path(&self, path: &Path) -> Result<Document, XmlError> {
        let bytes = std::fs::read(path).map_err(|source| XmlError::io(path, source))?;
        let url = std::fs::canonicalize(path)
            .ok()
            .and_then(|absolute| Url::from_file_path(absolute).ok());
        self.parse_bytes(&bytes, url)
    }

    pub fn load_url(&self, url: &Url) -> Result<Document, XmlError> {
        let resource = self.locator.open(url)?;
        self.parse_bytes(&resource.bytes, Some(resource.url))
    }

    /// Parse in-memory content; `url` anchors relative include references.
    pub fn parse_bytes(&self, bytes: &[u8], url: Option<Url>) -> Result<Document, XmlError> {
        let location = url.as_ref().map_or_else(|| "<memory>".to_string(), Url::to_string);
        let text = decode(bytes, &location)?;
        self.parse_str(&text, url)
    }

    pub fn parse_str(&self, text: &str, url: Option<Url>) -> Result<Document, XmlError> {
        let document = parse_document(text, url)?;
        if !self.xinclude {
            return Ok(document);
        }
        let Document { root, url } = document;
        let mut stack: Vec<Url> = url.iter().cloned().collect();
        let root = self.expand_root(root, url.as_ref(), &mut stack, 1)?;
        Ok(Document { root, url })
    }

    /// Expand `root`, which sits at nesting level `depth` of the final tree.
    fn expand_root(
        &self,
        root: Element,
        base: Option<&Url>,
        stack: &mut Vec<Url>,
        depth: usize,
    ) -> Result<Element, XmlError> {
        if !is_include(&root) {
            return self.expand_children(root, base, stack, depth);
        }
        let position = root.position;
        let mut nodes = self.include(&root, base, stack, depth - 1)?;
        let elements = nodes
            .iter()
            .filter(|node| matches!(node, Node::Element(_)))
            .count();
        match nodes.pop() {
            Some(Node::Element(element)) if elements == 1 && nodes.is_empty() => Ok(element),
            _ => Err(XmlError::include(
                position,
                "an include at the document root must produce exactly one element",
            )),
        }
    }

    fn expand_children(
        &self,
        mut element: Element,
        base: Option<&Url>,
        stack: &mut Vec<Url>,
        depth: usize,
    ) -> Result<Element, XmlError> {
        if depth > MAX_ELEMENT_DEPTH {
            return Err(XmlError::depth(element.position));
        }
        let children = std::mem::take(&mut element.children);
        for child in children {
            match child {
                Node::Element(child) if is_include(&child) => {
                    let nodes = self.include(&child, base, stack, depth)?;
                    element.children.extend(nodes);
                }
                Node::Element(child) if child.is(Some(XINCLUDE_NAMESPACE), "fallback") => {
                    return Err(XmlError::include(
                        child.position,
                        "xi:fallback must be a child of xi:include",
                    ));
                }
                Node::Element(child) => {
                    let expanded = self.expand_children(child, base, stack, depth + 1)?;
                    element.children.push(Node::Element(expanded));
                }
                text @ Node::Text(_) => element.children.push(text),
            }
        }
        Ok(element)
    }

    /// Content replacing `include`, whose parent sits at level `depth`.
    fn include(
        &self,
        include: &Element,
        base: Option<&Url>,
        stack: &mut Vec<Url>,
        depth: usize,
    ) -> Result<Vec<Node>, XmlError> {
        match self.include_target(include, base, stack, depth) {
            Ok(nodes) => Ok(nodes),
            Err(error) => {
                let Some(fallback) = include
                    .child_elements()
                    .find(|child| child.is(Some(XINCLUDE_NAMESPACE), "fallback"))
                else {
                    return Err(error);
                };
                debug!(%error, "using xi:fallback");
                let fallback = self.expand_children(fallback.clone(), base, stack, depth)?;
                Ok(fallback.children)
            }
        }
    }

    fn include_target(
        &self,
        include: &Element,
        base: Option<&Url>,
        stack: &mut Vec<Url>,
        depth: usize,
    ) -> Result<Vec<Node>, XmlError> {
        let position = include.position;
        if include.attribute("xpointer").is_some() {
            return Err(XmlError::include(position, "xpointer is not supported"));
        }
        let href = include.attribute("href").map(str::trim).unwrap_or_default();
        if href.is_empty() {
            return Err(XmlError::include(position, "xi:include requires an href"));
        }
        let target = match base {
            Some(base) => ResourceResolver::for_artifact(base)?.resolve(href)?,
            None => self.locator.locate(href)?,
        };
        let parse = include.attribute("parse").map_or("xml", str::trim);
        debug!(%target, parse, "resolving xi:include");
        match parse {
            "xml" => {
                if stack.contains(&target) || stack.len() >= MAX_INCLUDE_DEPTH {
                    return Err(XmlError::include(
                        position,
                        format!("inclusion loop detected at {target}"),
                    ));
                }
                let resource = self.locator.open(&target)?;
                let text = decode(&resource.bytes, target.as_str())?;
                let included = parse_document(&text, Some(target.clone()))?;
                stack.push(target.clone());
                let root = self.expand_root(included.root, Some(&target), stack, depth + 1);
                stack.pop();
                Ok(vec![Node::Element(root?)])
            }
            "text" => {
                let resource = self.locator.open(&target)?;
                let text = decode(&resource.bytes, target.as_str())?;
                Ok(vec![Node::Text(text)])
            }
            other => Err(XmlError::include(
                position,
                format!("unsupported parse attribute value '{other}'"),
            )),
        }
    }
}

fn is_include(element: &Element) -> bool {
    element.is(Some(XINCLUDE_NAMESPACE), "include")
}
