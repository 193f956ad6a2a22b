//! Simple types: built-ins, facets and value checking.

pub mod builtin;
pub mod facet;
pub mod pattern;
pub mod value;
pub mod whitespace;

use sbe_xml::QName;

pub use builtin::Builtin;
pub use facet::{Bound, FacetInput, Facets, PatternStep};
pub use value::{DecimalValue, OrderedValue};
pub use whitespace::WhiteSpace;

use crate::schema::{Schema, TypeDef, TypeId};

#[derive(Debug, Clone)]
pub enum Variety {
    Atomic(Builtin),
    List(TypeId),
    Union(Vec<TypeId>),
}

#[derive(Debug, Clone)]
pub struct SimpleType {
    pub name: Option<QName>,
    pub variety: Variety,
    pub facets: Facets,
}

impl SimpleType {
    pub fn builtin(name: QName, builtin: Builtin) -> Self {
        Self {
            name: Some(name),
            variety: Variety::Atomic(builtin),
            facets: Facets::default(),
        }
    }

    /// Name used in messages; anonymous types get a placeholder.
    pub fn display_name(&self) -> &str {
        self.name
            .as_ref()
            .map_or("#AnonType", |name| name.local.as_str())
    }

    pub fn whitespace(&self) -> WhiteSpace {
        self.facets.whitespace.unwrap_or(match self.variety {
            Variety::Atomic(builtin) => builtin.whitespace(),
            Variety::List(_) => WhiteSpace::Collapse,
            Variety::Union(_) => WhiteSpace::Preserve,
        })
    }

    /// The built-in type at the root of an atomic derivation chain.
    pub fn primitive(&self) -> Option<Builtin> {
        match self.variety {
            Variety::Atomic(builtin) => Some(builtin),
            _ => None,
        }
    }
}

impl Schema {
    /// Normalize `raw` for the simple type `id`; values of complex types
    /// are returned unchanged.
    pub fn normalize_value(&self, id: TypeId, raw: &str) -> String {
        match self.type_def(id) {
            Some(TypeDef::Simple(simple)) => simple.whitespace().normalize(raw),
            _ => raw.to_string(),
        }
    }

    /// Whether values of `id` are QNames, whose prefixes resolve against
    /// the element they appear on.
    pub fn is_qname_type(&self, id: TypeId) -> bool {
        matches!(
            self.type_def(id),
            Some(TypeDef::Simple(simple))
                if matches!(simple.primitive(), Some(Builtin::QName | Builtin::Notation))
        )
    }

    /// Validate `raw` against the simple type `id`.
    ///
    /// Returns the first violation as a message. Complex types accept any
    /// value here; their content is checked by the instance validator.
    pub fn check_simple_value(&self, id: TypeId, raw: &str) -> Result<(), String> {
        let Some(TypeDef::Simple(simple)) = self.type_def(id) else {
            return Ok(());
        };
        let value = simple.whitespace().normalize(raw);
        let type_name = simple.display_name();
        match &simple.variety {
            Variety::Atomic(builtin) => {
                builtin.check(&value)?;
                simple.facets.check(&FacetInput {
                    value: &value,
                    length: builtin.length_of(&value),
                    ordered: builtin.ordered_value(&value),
                    numeric: builtin.is_numeric(),
                    type_name,
                })
            }
            Variety::List(item) => {
                let items: Vec<&str> = value.split(' ').filter(|item| !item.is_empty()).collect();
                for item_value in &items {
                    self.check_simple_value(*item, item_value)?;
                }
                simple.facets.check(&FacetInput {
                    value: &value,
                    length: items.len(),
                    ordered: None,
                    numeric: false,
                    type_name,
                })
            }
            Variety::Union(members) => {
                if !members
                    .iter()
                    .any(|member| self.check_simple_value(*member, raw).is_ok())
                {
                    return Err(format!(
                        "cvc-datatype-valid.1.2.3: '{value}' is not a valid value of union type '{type_name}'."
                    ));
                }
                let value = WhiteSpace::Collapse.normalize(raw);
                simple.facets.check(&FacetInput {
                    value: &value,
                    length: value.chars().count(),
                    ordered: None,
                    numeric: false,
                    type_name,
                })
            }
        }
    }
}
