//! Compiled XML Schema components.
//!
//! A [`Schema`] is an arena of type definitions and element declarations
//! addressed by [`TypeId`] and [`ElementId`]. Recursive structures (an
//! element whose type contains the element again) are expressed through
//! ids, so the arena is built once and never mutated afterwards.

mod compile;
mod load;

use std::collections::HashMap;
use std::fmt;

use url::Url;

use sbe_resources::ResourceLocator;
use sbe_xml::QName;

use crate::content::ContentModel;
use crate::datatype::SimpleType;
use crate::error::SchemaError;
use crate::problem::Problem;

pub use load::{SchemaDocument, SchemaSet};

pub const XS_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(usize);

impl TypeId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

impl ElementId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub enum TypeDef {
    Simple(SimpleType),
    Complex(ComplexType),
}

impl TypeDef {
    pub fn name(&self) -> Option<&QName> {
        match self {
            TypeDef::Simple(simple) => simple.name.as_ref(),
            TypeDef::Complex(complex) => complex.name.as_ref(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ComplexType {
    pub name: Option<QName>,
    pub content: Content,
    pub attributes: Vec<AttributeUse>,
    pub attribute_wildcard: Option<Wildcard>,
}

#[derive(Debug, Clone)]
pub enum Content {
    Empty,
    /// Character data of the given simple type.
    Simple(TypeId),
    Elements {
        particle: Option<Particle>,
        model: ContentModel,
        mixed: bool,
    },
}

impl Content {
    pub fn particle(&self) -> Option<&Particle> {
        match self {
            Content::Elements { particle, .. } => particle.as_ref(),
            _ => None,
        }
    }

    pub fn is_mixed(&self) -> bool {
        matches!(self, Content::Elements { mixed: true, .. })
    }
}

#[derive(Debug, Clone)]
pub struct Particle {
    pub min: u32,
    /// `None` is unbounded.
    pub max: Option<u32>,
    pub term: Term,
}

#[derive(Debug, Clone)]
pub enum Term {
    Element(ElementId),
    Wildcard(Wildcard),
    Sequence(Vec<Particle>),
    Choice(Vec<Particle>),
    All(Vec<Particle>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceConstraint {
    Any,
    /// `##other`: any namespace except this one, and not unqualified.
    Not(Option<String>),
    Set(Vec<Option<String>>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessContents {
    Strict,
    Lax,
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wildcard {
    pub namespaces: NamespaceConstraint,
    pub process: ProcessContents,
}

impl Wildcard {
    pub fn any(process: ProcessContents) -> Self {
        Self {
            namespaces: NamespaceConstraint::Any,
            process,
        }
    }

    pub fn allows(&self, namespace: Option<&str>) -> bool {
        match &self.namespaces {
            NamespaceConstraint::Any => true,
            NamespaceConstraint::Not(excluded) => {
                namespace.is_some() && namespace != excluded.as_deref()
            }
            NamespaceConstraint::Set(allowed) => {
                allowed.iter().any(|candidate| candidate.as_deref() == namespace)
            }
        }
    }
}

impl fmt::Display for Wildcard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespaces {
            NamespaceConstraint::Any => f.write_str("WC[##any]"),
            NamespaceConstraint::Not(namespace) => {
                write!(f, "WC[##other:\"{}\"]", namespace.as_deref().unwrap_or(""))
            }
            NamespaceConstraint::Set(namespaces) => {
                let list = namespaces
                    .iter()
                    .map(|namespace| format!("\"{}\"", namespace.as_deref().unwrap_or("")))
                    .collect::<Vec<_>>()
                    .join(",");
                write!(f, "WC[{list}]")
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ElementDecl {
    pub name: QName,
    pub type_id: TypeId,
    pub nillable: bool,
    pub is_abstract: bool,
    pub default: Option<String>,
    pub fixed: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AttributeUse {
    pub name: QName,
    pub type_id: TypeId,
    pub required: bool,
    pub default: Option<String>,
    pub fixed: Option<String>,
}

/// A compiled schema, ready to validate documents.
#[derive(Debug, Clone)]
pub struct Schema {
    location: Url,
    types: Vec<TypeDef>,
    elements: Vec<ElementDecl>,
    global_elements: HashMap<QName, ElementId>,
    global_attributes: HashMap<QName, AttributeUse>,
    global_types: HashMap<QName, TypeId>,
    warnings: Vec<Problem>,
}

impl Schema {
    /// Locate, load and compile the schema named `name`.
    ///
    /// Nested `xs:include`/`xs:import` references resolve against the
    /// location of the document that contains them.
    pub fn load(locator: &ResourceLocator, name: &str) -> Result<Self, SchemaError> {
        let set = SchemaSet::load(locator, name)?;
        Self::compile(&set)
    }

    pub fn compile(set: &SchemaSet) -> Result<Self, SchemaError> {
        compile::Compiler::new(set).finish()
    }

    /// Where the primary schema document was loaded from.
    pub fn location(&self) -> &Url {
        &self.location
    }

    /// Advisories about constructs that are read but not enforced.
    pub fn warnings(&self) -> &[Problem] {
        &self.warnings
    }

    pub fn type_def(&self, id: TypeId) -> Option<&TypeDef> {
        self.types.get(id.0)
    }

    pub fn element(&self, id: ElementId) -> Option<&ElementDecl> {
        self.elements.get(id.0)
    }

    pub fn global_element(&self, name: &QName) -> Option<ElementId> {
        self.global_elements.get(name).copied()
    }

    pub fn global_attribute(&self, name: &QName) -> Option<&AttributeUse> {
        self.global_attributes.get(name)
    }

    pub fn global_type(&self, name: &QName) -> Option<TypeId> {
        self.global_types.get(name).copied()
    }

    /// Names of the global element declarations, sorted.
    pub fn root_elements(&self) -> Vec<&QName> {
        let mut names: Vec<&QName> = self.global_elements.keys().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_namespace_constraints() {
        let other = Wildcard {
            namespaces: NamespaceConstraint::Not(Some("urn:sbe".into())),
            process: ProcessContents::Lax,
        };
        assert!(other.allows(Some("urn:ext")));
        assert!(!other.allows(Some("urn:sbe")));
        assert!(!other.allows(None));

        let local = Wildcard {
            namespaces: NamespaceConstraint::Set(vec![None]),
            process: ProcessContents::Strict,
        };
        assert!(local.allows(None));
        assert!(!local.allows(Some("urn:sbe")));
        assert_eq!(Wildcard::any(ProcessContents::Skip).to_string(), "WC[##any]");
    }
}
