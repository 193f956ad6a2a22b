//! Loading a schema document and everything it includes or imports.

use std::collections::{HashSet, VecDeque};

use tracing::debug;
use url::Url;

use sbe_resources::{ResourceLocator, ResourceResolver};
use sbe_xml::{Document, DocumentLoader, Element};

use crate::error::SchemaError;
use crate::problem::Problem;
use crate::schema::XS_NAMESPACE;

/// One schema document with the context its components are read in.
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    pub document: Document,
    pub url: Url,
    pub target_namespace: Option<String>,
    /// Included without a target namespace and adopting the includer's.
    pub chameleon: bool,
    pub element_qualified: bool,
    pub attribute_qualified: bool,
}

impl SchemaDocument {
    pub fn root(&self) -> &Element {
        &self.document.root
    }

    /// File name of the document, for messages.
    pub fn file_name(&self) -> &str {
        self.url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|name| !name.is_empty())
            .unwrap_or(self.url.as_str())
    }
}

/// The primary schema document followed by every document reachable from
/// it, each loaded once per target namespace.
#[derive(Debug, Clone)]
pub struct SchemaSet {
    pub documents: Vec<SchemaDocument>,
    pub warnings: Vec<Problem>,
}

struct Pending {
    url: Url,
    /// Target namespace of the including document, for `xs:include`.
    includer: Option<Option<String>>,
}

impl SchemaSet {
    pub fn load(locator: &ResourceLocator, name: &str) -> Result<Self, SchemaError> {
        let url = locator.locate(name)?;
        let loader = DocumentLoader::new(locator.clone()).with_xinclude(false);
        let mut set = SchemaSet {
            documents: Vec::new(),
            warnings: Vec::new(),
        };
        let mut seen: HashSet<(String, Option<String>)> = HashSet::new();
        let mut queue = VecDeque::from([Pending {
            url,
            includer: None,
        }]);
        while let Some(pending) = queue.pop_front() {
            let document = loader.load_url(&pending.url)?;
            let schema = document_context(document, &pending)?;
            let key = (schema.url.to_string(), schema.target_namespace.clone());
            if !seen.insert(key) {
                continue;
            }
            debug!(url = %schema.url, namespace = ?schema.target_namespace, "loaded schema document");
            queue.extend(set.references(&schema)?);
            set.documents.push(schema);
        }
        Ok(set)
    }

    /// Documents referenced by `schema`, resolved against its location.
    fn references(&mut self, schema: &SchemaDocument) -> Result<Vec<Pending>, SchemaError> {
        let resolver = ResourceResolver::for_artifact(&schema.url)?;
        let mut pending = Vec::new();
        for child in schema.root().child_elements() {
            if child.name.namespace() != Some(XS_NAMESPACE) {
                continue;
            }
            let local = child.name.local.as_str();
            let includer = match local {
                "include" => Some(schema.target_namespace.clone()),
                "redefine" | "override" => {
                    self.warnings.push(Problem::warning(
                        child.position,
                        format!(
                            "xs:{local} in {} is read as xs:include; redefinitions are not applied",
                            schema.file_name()
                        ),
                    ));
                    Some(schema.target_namespace.clone())
                }
                "import" => None,
                _ => continue,
            };
            let Some(location) = child.attribute("schemaLocation") else {
                if includer.is_some() {
                    return Err(SchemaError::invalid(
                        schema.url.as_str(),
                        child.position,
                        format!("xs:{local} requires a schemaLocation"),
                    ));
                }
                continue;
            };
            pending.push(Pending {
                url: resolver.resolve(location)?,
                includer,
            });
        }
        Ok(pending)
    }
}

fn document_context(document: Document, pending: &Pending) -> Result<SchemaDocument, SchemaError> {
    let url = document.url.clone().unwrap_or_else(|| pending.url.clone());
    let root = &document.root;
    if !root.is(Some(XS_NAMESPACE), "schema") {
        return Err(SchemaError::NotASchema {
            location: url.to_string(),
        });
    }
    let own = root
        .attribute("targetNamespace")
        .map(str::trim)
        .filter(|namespace| !namespace.is_empty())
        .map(str::to_string);
    let (target_namespace, chameleon) = match (&pending.includer, own) {
        (Some(Some(includer)), None) => (Some(includer.clone()), true),
        (Some(includer), Some(own)) if includer.as_deref() != Some(own.as_str()) => {
            return Err(SchemaError::invalid(
                url.as_str(),
                root.position,
                format!(
                    "included schema has targetNamespace '{own}' but the including schema has '{}'",
                    includer.as_deref().unwrap_or("")
                ),
            ));
        }
        (_, own) => (own, false),
    };
    let qualified = |attribute: &str| root.attribute(attribute).map(str::trim) == Some("qualified");
    let element_qualified = qualified("elementFormDefault");
    let attribute_qualified = qualified("attributeFormDefault");
    Ok(SchemaDocument {
        document,
        url,
        target_namespace,
        chameleon,
        element_qualified,
        attribute_qualified,
    })
}
