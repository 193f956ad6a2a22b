//! Schema documents to compiled components.
//!
//! Global components are indexed first and given ids up front, so
//! references are resolved without compiling the target. A type is
//! compiled on first use as a derivation base (or at the end); meeting a
//! type that is already being compiled means its derivation is circular.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use sbe_xml::{Element, QName};

use crate::content::ContentModel;
use crate::datatype::builtin::LIST_BUILTINS;
use crate::datatype::{Bound, Builtin, Facets, PatternStep, SimpleType, Variety, pattern};
use crate::error::SchemaError;
use crate::problem::Problem;
use crate::schema::load::{SchemaDocument, SchemaSet};
use crate::schema::{
    AttributeUse, ComplexType, Content, ElementDecl, ElementId, NamespaceConstraint, Particle,
    ProcessContents, Schema, Term, TypeDef, TypeId, Wildcard, XS_NAMESPACE,
};

#[derive(Clone, Copy)]
struct Global<'a> {
    element: &'a Element,
    document: &'a SchemaDocument,
}

enum TypeSlot<'a> {
    Pending(Global<'a>),
    InProgress(Global<'a>),
    Ready(TypeDef),
}

enum ElementSlot<'a> {
    Pending(Global<'a>),
    Ready(ElementDecl),
}

pub(super) struct Compiler<'a> {
    set: &'a SchemaSet,
    types: Vec<TypeSlot<'a>>,
    elements: Vec<ElementSlot<'a>>,
    element_names: Vec<QName>,
    global_types: HashMap<QName, TypeId>,
    global_elements: HashMap<QName, ElementId>,
    global_attributes: HashMap<QName, Global<'a>>,
    attribute_groups: HashMap<QName, Global<'a>>,
    model_groups: HashMap<QName, Global<'a>>,
    /// Named groups currently being expanded.
    expanding: Vec<QName>,
    warnings: Vec<Problem>,
    reported: HashSet<String>,
    any_type: TypeId,
    any_simple_type: TypeId,
}

fn xs_children(element: &Element) -> impl Iterator<Item = &Element> {
    element
        .child_elements()
        .filter(|child| child.name.namespace() == Some(XS_NAMESPACE) && child.name.local != "annotation")
}

fn xs_child<'e>(element: &'e Element, local: &str) -> Option<&'e Element> {
    xs_children(element).find(|child| child.name.local == local)
}

fn local_name(element: &Element) -> &str {
    element.name.local.as_str()
}

fn flag(element: &Element, attribute: &str) -> bool {
    matches!(element.attribute(attribute).map(str::trim), Some("true" | "1"))
}

fn invalid(document: &SchemaDocument, element: &Element, message: impl Into<String>) -> SchemaError {
    SchemaError::invalid(document.url.as_str(), element.position, message)
}

impl<'a> Compiler<'a> {
    pub(super) fn new(set: &'a SchemaSet) -> Self {
        let mut compiler = Self {
            set,
            types: Vec::new(),
            elements: Vec::new(),
            element_names: Vec::new(),
            global_types: HashMap::new(),
            global_elements: HashMap::new(),
            global_attributes: HashMap::new(),
            attribute_groups: HashMap::new(),
            model_groups: HashMap::new(),
            expanding: Vec::new(),
            warnings: Vec::new(),
            reported: HashSet::new(),
            any_type: TypeId::new(0),
            any_simple_type: TypeId::new(0),
        };
        compiler.register_builtins();
        compiler.index_globals();
        compiler
    }

    fn register_builtins(&mut self) {
        for builtin in Builtin::ALL {
            let name = QName::new(Some(XS_NAMESPACE), builtin.name());
            let id = self.push_type(TypeDef::Simple(SimpleType::builtin(name.clone(), builtin)));
            self.global_types.insert(name, id);
            if builtin == Builtin::AnySimpleType {
                self.any_simple_type = id;
            }
        }
        for (list, item) in LIST_BUILTINS {
            let Some(item) = self.global_types.get(&QName::new(Some(XS_NAMESPACE), item.name())).copied() else {
                continue;
            };
            let name = QName::new(Some(XS_NAMESPACE), list);
            let id = self.push_type(TypeDef::Simple(SimpleType {
                name: Some(name.clone()),
                variety: Variety::List(item),
                facets: Facets {
                    min_length: Some(1),
                    ..Facets::default()
                },
            }));
            self.global_types.insert(name, id);
        }
        let name = QName::new(Some(XS_NAMESPACE), "anyType");
        let particle = Particle {
            min: 0,
            max: None,
            term: Term::Wildcard(Wildcard::any(ProcessContents::Lax)),
        };
        let content = self.element_content(Some(particle), true);
        self.any_type = self.push_type(TypeDef::Complex(ComplexType {
            name: Some(name.clone()),
            content,
            attributes: Vec::new(),
            attribute_wildcard: Some(Wildcard::any(ProcessContents::Lax)),
        }));
        self.global_types.insert(name, self.any_type);
    }

    fn index_globals(&mut self) {
        let set = self.set;
        for document in &set.documents {
            for child in xs_children(document.root()) {
                let Some(name) = child.attribute("name") else {
                    continue;
                };
                let name = QName::new(document.target_namespace.as_deref(), name.trim());
                let global = Global {
                    element: child,
                    document,
                };
                match local_name(child) {
                    "element" if !self.global_elements.contains_key(&name) => {
                        let id = ElementId::new(self.elements.len());
                        self.elements.push(ElementSlot::Pending(global));
                        self.element_names.push(name.clone());
                        self.global_elements.insert(name, id);
                    }
                    "complexType" | "simpleType" if !self.global_types.contains_key(&name) => {
                        let id = TypeId::new(self.types.len());
                        self.types.push(TypeSlot::Pending(global));
                        self.global_types.insert(name, id);
                    }
                    "attribute" => {
                        self.global_attributes.entry(name).or_insert(global);
                    }
                    "attributeGroup" => {
                        self.attribute_groups.entry(name).or_insert(global);
                    }
                    "group" => {
                        self.model_groups.entry(name).or_insert(global);
                    }
                    _ => {}
                }
            }
        }
    }

    pub(super) fn finish(mut self) -> Result<Schema, SchemaError> {
        let set = self.set;
        let Some(primary) = set.documents.first() else {
            return Err(SchemaError::NotASchema {
                location: "<empty schema set>".to_string(),
            });
        };
        for index in 0..self.types.len() {
            self.ensure_type(TypeId::new(index))?;
        }
        let mut index = 0;
        while index < self.elements.len() {
            self.ensure_element(ElementId::new(index))?;
            index += 1;
        }
        let mut global_attributes = HashMap::new();
        let attributes: Vec<(QName, Global<'a>)> = self
            .global_attributes
            .iter()
            .map(|(name, global)| (name.clone(), *global))
            .collect();
        for (name, global) in attributes {
            let attribute = self.attribute_decl(global.element, global.document, name.clone())?;
            global_attributes.insert(name, attribute);
        }

        let mut types = Vec::with_capacity(self.types.len());
        for slot in self.types {
            match slot {
                TypeSlot::Ready(def) => types.push(def),
                TypeSlot::Pending(global) | TypeSlot::InProgress(global) => {
                    return Err(invalid(global.document, global.element, "type definition was not compiled"));
                }
            }
        }
        let mut elements = Vec::with_capacity(self.elements.len());
        for slot in self.elements {
            match slot {
                ElementSlot::Ready(decl) => elements.push(decl),
                ElementSlot::Pending(global) => {
                    return Err(invalid(global.document, global.element, "element declaration was not compiled"));
                }
            }
        }
        let mut warnings = set.warnings.clone();
        warnings.extend(self.warnings);
        debug!(
            location = %primary.url,
            documents = set.documents.len(),
            types = types.len(),
            elements = elements.len(),
            warnings = warnings.len(),
            "schema compiled"
        );
        Ok(Schema {
            location: primary.url.clone(),
            types,
            elements,
            global_elements: self.global_elements,
            global_attributes,
            global_types: self.global_types,
            warnings,
        })
    }

    fn push_type(&mut self, def: TypeDef) -> TypeId {
        self.types.push(TypeSlot::Ready(def));
        TypeId::new(self.types.len() - 1)
    }

    fn ready(&self, id: TypeId) -> Option<&TypeDef> {
        match self.types.get(id.index()) {
            Some(TypeSlot::Ready(def)) => Some(def),
            _ => None,
        }
    }

    fn ensure_type(&mut self, id: TypeId) -> Result<(), SchemaError> {
        let global = match self.types.get(id.index()) {
            Some(TypeSlot::Pending(global)) => *global,
            Some(TypeSlot::InProgress(global)) => {
                let name = global.element.attribute("name").unwrap_or_default();
                return Err(invalid(
                    global.document,
                    global.element,
                    format!("ct-props-correct.3: Circular definitions detected for type '{name}'."),
                ));
            }
            _ => return Ok(()),
        };
        self.types[id.index()] = TypeSlot::InProgress(global);
        let Global { element, document } = global;
        let name = element
            .attribute("name")
            .map(|name| QName::new(document.target_namespace.as_deref(), name.trim()));
        let def = match local_name(element) {
            "simpleType" => TypeDef::Simple(self.simple_type(element, document, name)?),
            _ => TypeDef::Complex(self.complex_type(element, document, name)?),
        };
        self.types[id.index()] = TypeSlot::Ready(def);
        Ok(())
    }

    fn ensure_element(&mut self, id: ElementId) -> Result<(), SchemaError> {
        let Some(ElementSlot::Pending(global)) = self.elements.get(id.index()) else {
            return Ok(());
        };
        let global = *global;
        let name = self.element_names[id.index()].clone();
        let decl = self.element_decl(global.element, global.document, name)?;
        self.elements[id.index()] = ElementSlot::Ready(decl);
        Ok(())
    }

    fn unsupported(&mut self, element: &Element, document: &SchemaDocument, construct: String) {
        if self.reported.insert(construct.clone()) {
            self.warnings.push(Problem::warning(
                element.position,
                format!("{construct} in {} is not enforced", document.file_name()),
            ));
        }
    }

    fn resolve_qname(
        &self,
        element: &Element,
        document: &SchemaDocument,
        lexical: &str,
    ) -> Result<QName, SchemaError> {
        let Some(mut name) = element.resolve_qname(lexical) else {
            return Err(invalid(
                document,
                element,
                format!("The prefix of '{}' is not bound to a namespace.", lexical.trim()),
            ));
        };
        if name.namespace.is_none() && document.chameleon {
            name.namespace = document.target_namespace.clone();
        }
        Ok(name)
    }

    fn type_ref(
        &self,
        element: &Element,
        document: &SchemaDocument,
        lexical: &str,
    ) -> Result<TypeId, SchemaError> {
        let name = self.resolve_qname(element, document, lexical)?;
        self.global_types.get(&name).copied().ok_or_else(|| {
            invalid(
                document,
                element,
                format!(
                    "src-resolve: Cannot resolve the name '{}' to a(n) 'type definition' component.",
                    lexical.trim()
                ),
            )
        })
    }

    fn occurs(&self, element: &Element, document: &SchemaDocument) -> Result<(u32, Option<u32>), SchemaError> {
        let parse = |attribute: &str, value: &str| {
            value.trim().parse::<u32>().map_err(|_| {
                invalid(
                    document,
                    element,
                    format!("'{value}' is not a valid value for {attribute}"),
                )
            })
        };
        let min = match element.attribute("minOccurs") {
            Some(value) => parse("minOccurs", value)?,
            None => 1,
        };
        let max = match element.attribute("maxOccurs").map(str::trim) {
            Some("unbounded") => None,
            Some(value) => Some(parse("maxOccurs", value)?),
            None => Some(1),
        };
        Ok((min, max))
    }

    // Simple types

    fn simple_type(
        &mut self,
        element: &'a Element,
        document: &'a SchemaDocument,
        name: Option<QName>,
    ) -> Result<SimpleType, SchemaError> {
        let Some(body) = xs_children(element).next() else {
            return Err(invalid(document, element, "xs:simpleType requires xs:restriction, xs:list or xs:union"));
        };
        match local_name(body) {
            "restriction" => {
                let base = self.simple_base(body, document)?;
                let mut simple = SimpleType {
                    name,
                    variety: base.variety,
                    facets: base.facets,
                };
                self.apply_facets(&mut simple, body, document)?;
                Ok(simple)
            }
            "list" => {
                let item = match body.attribute("itemType") {
                    Some(lexical) => self.type_ref(body, document, lexical)?,
                    None => {
                        let Some(inner) = xs_child(body, "simpleType") else {
                            return Err(invalid(document, body, "xs:list requires an item type"));
                        };
                        self.anonymous_simple(inner, document)?
                    }
                };
                Ok(SimpleType {
                    name,
                    variety: Variety::List(item),
                    facets: Facets::default(),
                })
            }
            "union" => {
                let mut members = Vec::new();
                if let Some(list) = body.attribute("memberTypes") {
                    for lexical in list.split_whitespace() {
                        members.push(self.type_ref(body, document, lexical)?);
                    }
                }
                for inner in xs_children(body).filter(|child| local_name(child) == "simpleType") {
                    members.push(self.anonymous_simple(inner, document)?);
                }
                Ok(SimpleType {
                    name,
                    variety: Variety::Union(members),
                    facets: Facets::default(),
                })
            }
            other => Err(invalid(document, body, format!("unexpected xs:{other} in xs:simpleType"))),
        }
    }

    fn simple_base(&mut self, restriction: &'a Element, document: &'a SchemaDocument) -> Result<SimpleType, SchemaError> {
        let Some(lexical) = restriction.attribute("base") else {
            let Some(inner) = xs_child(restriction, "simpleType") else {
                return Err(invalid(document, restriction, "xs:restriction requires a base type"));
            };
            return self.simple_type(inner, document, None);
        };
        let base = self.type_ref(restriction, document, lexical)?;
        self.ensure_type(base)?;
        match self.ready(base) {
            Some(TypeDef::Simple(simple)) => Ok(simple.clone()),
            Some(TypeDef::Complex(_)) if base == self.any_type => match self.ready(self.any_simple_type) {
                Some(TypeDef::Simple(simple)) => Ok(simple.clone()),
                _ => Err(invalid(document, restriction, "xs:anySimpleType is unavailable")),
            },
            _ => Err(invalid(
                document,
                restriction,
                format!("the base '{}' of a simple type must be a simple type", lexical.trim()),
            )),
        }
    }

    fn anonymous_simple(&mut self, element: &'a Element, document: &'a SchemaDocument) -> Result<TypeId, SchemaError> {
        let simple = self.simple_type(element, document, None)?;
        Ok(self.push_type(TypeDef::Simple(simple)))
    }

    fn apply_facets(
        &mut self,
        simple: &mut SimpleType,
        restriction: &'a Element,
        document: &'a SchemaDocument,
    ) -> Result<(), SchemaError> {
        let mut enumeration = Vec::new();
        let mut patterns = Vec::new();
        for facet in xs_children(restriction) {
            let local = local_name(facet);
            if matches!(
                local,
                "simpleType" | "attribute" | "attributeGroup" | "anyAttribute" | "sequence" | "choice" | "all" | "group"
            ) {
                continue;
            }
            let Some(value) = facet.attribute("value") else {
                self.unsupported(facet, document, format!("xs:{local}"));
                continue;
            };
            match local {
                "enumeration" => enumeration.push(simple.whitespace().normalize(value)),
                "pattern" => patterns.push(value.to_string()),
                "length" => simple.facets.length = Some(Self::facet_number(document, facet, value)?),
                "minLength" => simple.facets.min_length = Some(Self::facet_number(document, facet, value)?),
                "maxLength" => simple.facets.max_length = Some(Self::facet_number(document, facet, value)?),
                "totalDigits" => simple.facets.total_digits = Some(Self::facet_number(document, facet, value)?),
                "fractionDigits" => {
                    simple.facets.fraction_digits = Some(Self::facet_number(document, facet, value)?);
                }
                "minInclusive" => simple.facets.min_inclusive = Some(Self::bound(document, facet, simple, value)?),
                "maxInclusive" => simple.facets.max_inclusive = Some(Self::bound(document, facet, simple, value)?),
                "minExclusive" => simple.facets.min_exclusive = Some(Self::bound(document, facet, simple, value)?),
                "maxExclusive" => simple.facets.max_exclusive = Some(Self::bound(document, facet, simple, value)?),
                "whiteSpace" => {
                    let whitespace = value
                        .parse()
                        .map_err(|()| invalid(document, facet, format!("'{value}' is not a valid whiteSpace value")))?;
                    simple.facets.whitespace = Some(whitespace);
                }
                other => self.unsupported(facet, document, format!("xs:{other}")),
            }
        }
        if !enumeration.is_empty() {
            simple.facets.enumerations.push(enumeration);
        }
        if !patterns.is_empty() {
            match pattern::compile(&patterns) {
                Ok(regex) => simple.facets.patterns.push(PatternStep {
                    sources: patterns,
                    regex,
                }),
                Err(error) => self.warnings.push(Problem::warning(
                    restriction.position,
                    format!(
                        "pattern '{}' in {} cannot be enforced: {error}",
                        patterns.join("|"),
                        document.file_name()
                    ),
                )),
            }
        }
        Ok(())
    }

    fn facet_number(document: &SchemaDocument, facet: &Element, value: &str) -> Result<usize, SchemaError> {
        value.trim().parse().map_err(|_| {
            invalid(
                document,
                facet,
                format!("'{value}' is not a valid value for xs:{}", local_name(facet)),
            )
        })
    }

    fn bound(document: &SchemaDocument, facet: &Element, simple: &SimpleType, value: &str) -> Result<Bound, SchemaError> {
        let ordered = simple.primitive().and_then(|builtin| {
            let lexical = builtin.whitespace().normalize(value);
            builtin.ordered_value(&lexical).map(|ordered| (lexical, ordered))
        });
        match ordered {
            Some((lexical, value)) => Ok(Bound { lexical, value }),
            None => Err(invalid(
                document,
                facet,
                format!("'{value}' is not a valid value for xs:{}", local_name(facet)),
            )),
        }
    }

    // Complex types

    fn complex_type(
        &mut self,
        element: &'a Element,
        document: &'a SchemaDocument,
        name: Option<QName>,
    ) -> Result<ComplexType, SchemaError> {
        let mut mixed = flag(element, "mixed");
        let mut attributes = Vec::new();
        let mut wildcard = None;
        let first = xs_children(element).find(|child| {
            matches!(
                local_name(child),
                "simpleContent" | "complexContent" | "group" | "all" | "choice" | "sequence"
            )
        });
        let content = match first {
            Some(child) if local_name(child) == "simpleContent" => {
                let derivation = Self::derivation(child, document)?;
                self.simple_content(derivation, document, &mut attributes, &mut wildcard)?
            }
            Some(child) if local_name(child) == "complexContent" => {
                if child.attribute("mixed").is_some() {
                    mixed = flag(child, "mixed");
                }
                let derivation = Self::derivation(child, document)?;
                self.complex_content(derivation, document, mixed, &mut attributes, &mut wildcard)?
            }
            group => {
                let particle = match group {
                    Some(group) => self.particle(group, document)?,
                    None => None,
                };
                self.attribute_uses(element, document, &mut attributes, &mut wildcard)?;
                self.element_content(particle, mixed)
            }
        };
        Ok(ComplexType {
            name,
            content,
            attributes,
            attribute_wildcard: wildcard,
        })
    }

    fn derivation(content: &'a Element, document: &SchemaDocument) -> Result<&'a Element, SchemaError> {
        xs_children(content)
            .find(|child| matches!(local_name(child), "extension" | "restriction"))
            .ok_or_else(|| {
                invalid(
                    document,
                    content,
                    format!("xs:{} requires xs:extension or xs:restriction", local_name(content)),
                )
            })
    }

    fn element_content(&self, particle: Option<Particle>, mixed: bool) -> Content {
        if particle.is_none() && !mixed {
            return Content::Empty;
        }
        let names = &self.element_names;
        let model = ContentModel::build(particle.as_ref(), &|id: ElementId| names[id.index()].clone());
        Content::Elements {
            particle,
            model,
            mixed,
        }
    }

    fn simple_content(
        &mut self,
        derivation: &'a Element,
        document: &'a SchemaDocument,
        attributes: &mut Vec<AttributeUse>,
        wildcard: &mut Option<Wildcard>,
    ) -> Result<Content, SchemaError> {
        let Some(lexical) = derivation.attribute("base") else {
            return Err(invalid(document, derivation, "simple content derivation requires a base type"));
        };
        let base = self.type_ref(derivation, document, lexical)?;
        self.ensure_type(base)?;
        let value_type = match self.ready(base) {
            Some(TypeDef::Simple(_)) => base,
            Some(TypeDef::Complex(complex)) => {
                attributes.clone_from(&complex.attributes);
                wildcard.clone_from(&complex.attribute_wildcard);
                match complex.content {
                    Content::Simple(value_type) => value_type,
                    _ if base == self.any_type => self.any_simple_type,
                    _ => {
                        return Err(invalid(
                            document,
                            derivation,
                            format!("the base '{}' of simple content must have simple content", lexical.trim()),
                        ));
                    }
                }
            }
            None => return Err(invalid(document, derivation, "base type was not compiled")),
        };
        let value_type = if local_name(derivation) == "extension" {
            value_type
        } else {
            let mut simple = match xs_child(derivation, "simpleType") {
                Some(inner) => self.simple_type(inner, document, None)?,
                None => match self.ready(value_type) {
                    Some(TypeDef::Simple(simple)) => simple.clone(),
                    _ => return Err(invalid(document, derivation, "simple content requires a simple value type")),
                },
            };
            simple.name = None;
            self.apply_facets(&mut simple, derivation, document)?;
            self.push_type(TypeDef::Simple(simple))
        };
        self.attribute_uses(derivation, document, attributes, wildcard)?;
        Ok(Content::Simple(value_type))
    }

    fn complex_content(
        &mut self,
        derivation: &'a Element,
        document: &'a SchemaDocument,
        mixed: bool,
        attributes: &mut Vec<AttributeUse>,
        wildcard: &mut Option<Wildcard>,
    ) -> Result<Content, SchemaError> {
        let Some(lexical) = derivation.attribute("base") else {
            return Err(invalid(document, derivation, "complex content derivation requires a base type"));
        };
        let base = self.type_ref(derivation, document, lexical)?;
        self.ensure_type(base)?;
        let own = match xs_children(derivation)
            .find(|child| matches!(local_name(child), "group" | "all" | "choice" | "sequence"))
        {
            Some(group) => self.particle(group, document)?,
            None => None,
        };
        let Some(TypeDef::Complex(base_type)) = self.ready(base) else {
            return Err(invalid(
                document,
                derivation,
                format!("the base '{}' of complex content must be a complex type", lexical.trim()),
            ));
        };
        attributes.clone_from(&base_type.attributes);
        let (particle, mixed) = if local_name(derivation) == "extension" && base != self.any_type {
            wildcard.clone_from(&base_type.attribute_wildcard);
            let particle = match (base_type.content.particle().cloned(), own) {
                (None, particle) | (particle, None) => particle,
                (Some(inherited), Some(own)) => Some(Particle {
                    min: 1,
                    max: Some(1),
                    term: Term::Sequence(vec![inherited, own]),
                }),
            };
            (particle, mixed || base_type.content.is_mixed())
        } else {
            (own, mixed)
        };
        self.attribute_uses(derivation, document, attributes, wildcard)?;
        Ok(self.element_content(particle, mixed))
    }

    // Particles and element declarations

    fn particle(&mut self, element: &'a Element, document: &'a SchemaDocument) -> Result<Option<Particle>, SchemaError> {
        let (min, max) = self.occurs(element, document)?;
        if max == Some(0) {
            return Ok(None);
        }
        let term = match local_name(element) {
            "element" => Term::Element(self.local_element(element, document)?),
            local @ ("sequence" | "choice" | "all") => {
                let mut particles = Vec::new();
                for child in xs_children(element) {
                    if let Some(particle) = self.particle(child, document)? {
                        particles.push(particle);
                    }
                }
                match local {
                    "sequence" => Term::Sequence(particles),
                    "choice" => Term::Choice(particles),
                    _ => Term::All(particles),
                }
            }
            "group" => {
                let Some(lexical) = element.attribute("ref") else {
                    return Err(invalid(document, element, "a local xs:group requires a ref"));
                };
                let name = self.resolve_qname(element, document, lexical)?;
                let Some(group) = self.model_groups.get(&name).copied() else {
                    return Err(invalid(
                        document,
                        element,
                        format!("src-resolve: Cannot resolve the name '{}' to a(n) 'group' component.", lexical.trim()),
                    ));
                };
                if self.expanding.contains(&name) {
                    return Err(invalid(document, element, format!("model group '{}' refers to itself", lexical.trim())));
                }
                let Some(model) = xs_children(group.element)
                    .find(|child| matches!(local_name(child), "sequence" | "choice" | "all"))
                else {
                    return Ok(None);
                };
                self.expanding.push(name);
                let inner = self.particle(model, group.document);
                self.expanding.pop();
                match inner? {
                    Some(particle) => particle.term,
                    None => return Ok(None),
                }
            }
            "any" => Term::Wildcard(Self::wildcard(element, document)),
            other => {
                self.unsupported(element, document, format!("xs:{other}"));
                return Ok(None);
            }
        };
        Ok(Some(Particle { min, max, term }))
    }

    fn local_element(&mut self, element: &'a Element, document: &'a SchemaDocument) -> Result<ElementId, SchemaError> {
        if let Some(lexical) = element.attribute("ref") {
            let name = self.resolve_qname(element, document, lexical)?;
            return self.global_elements.get(&name).copied().ok_or_else(|| {
                invalid(
                    document,
                    element,
                    format!("src-resolve: Cannot resolve the name '{}' to a(n) 'element declaration' component.", lexical.trim()),
                )
            });
        }
        let Some(local) = element.attribute("name") else {
            return Err(invalid(document, element, "a local xs:element requires a name or ref"));
        };
        let qualified = element
            .attribute("form")
            .map_or(document.element_qualified, |form| form.trim() == "qualified");
        let namespace = if qualified {
            document.target_namespace.as_deref()
        } else {
            None
        };
        let name = QName::new(namespace, local.trim());
        let decl = self.element_decl(element, document, name.clone())?;
        self.elements.push(ElementSlot::Ready(decl));
        self.element_names.push(name);
        Ok(ElementId::new(self.elements.len() - 1))
    }

    fn element_decl(
        &mut self,
        element: &'a Element,
        document: &'a SchemaDocument,
        name: QName,
    ) -> Result<ElementDecl, SchemaError> {
        for child in xs_children(element) {
            let local = local_name(child);
            if matches!(local, "key" | "keyref" | "unique") {
                self.unsupported(child, document, format!("xs:{local}"));
            }
        }
        if element.attribute("substitutionGroup").is_some() {
            self.unsupported(element, document, "substitutionGroup".to_string());
        }
        let inline = xs_children(element).find(|child| matches!(local_name(child), "complexType" | "simpleType"));
        let type_id = match (element.attribute("type"), inline) {
            (Some(lexical), _) => self.type_ref(element, document, lexical)?,
            (None, Some(inner)) if local_name(inner) == "simpleType" => self.anonymous_simple(inner, document)?,
            (None, Some(inner)) => {
                let complex = self.complex_type(inner, document, None)?;
                self.push_type(TypeDef::Complex(complex))
            }
            (None, None) => self.any_type,
        };
        Ok(ElementDecl {
            name,
            type_id,
            nillable: flag(element, "nillable"),
            is_abstract: flag(element, "abstract"),
            default: element.attribute("default").map(str::to_string),
            fixed: element.attribute("fixed").map(str::to_string),
        })
    }

    fn wildcard(element: &Element, document: &SchemaDocument) -> Wildcard {
        let target = document.target_namespace.clone();
        let namespaces = match element.attribute("namespace").map_or("##any", str::trim) {
            "##any" => NamespaceConstraint::Any,
            "##other" => NamespaceConstraint::Not(target),
            list => NamespaceConstraint::Set(
                list.split_whitespace()
                    .map(|token| match token {
                        "##targetNamespace" => target.clone(),
                        "##local" => None,
                        uri => Some(uri.to_string()),
                    })
                    .collect(),
            ),
        };
        let process = match element.attribute("processContents").map(str::trim) {
            Some("lax") => ProcessContents::Lax,
            Some("skip") => ProcessContents::Skip,
            _ => ProcessContents::Strict,
        };
        Wildcard { namespaces, process }
    }

    // Attributes

    fn attribute_uses(
        &mut self,
        container: &'a Element,
        document: &'a SchemaDocument,
        uses: &mut Vec<AttributeUse>,
        wildcard: &mut Option<Wildcard>,
    ) -> Result<(), SchemaError> {
        for child in xs_children(container) {
            match local_name(child) {
                "attribute" => {
                    let (attribute, prohibited) = self.attribute_use(child, document)?;
                    uses.retain(|existing| existing.name != attribute.name);
                    if !prohibited {
                        uses.push(attribute);
                    }
                }
                "attributeGroup" => {
                    let Some(lexical) = child.attribute("ref") else {
                        continue;
                    };
                    let name = self.resolve_qname(child, document, lexical)?;
                    let Some(group) = self.attribute_groups.get(&name).copied() else {
                        return Err(invalid(
                            document,
                            child,
                            format!(
                                "src-resolve: Cannot resolve the name '{}' to a(n) 'attribute group' component.",
                                lexical.trim()
                            ),
                        ));
                    };
                    if self.expanding.contains(&name) {
                        return Err(invalid(document, child, format!("attribute group '{}' refers to itself", lexical.trim())));
                    }
                    self.expanding.push(name);
                    let result = self.attribute_uses(group.element, group.document, uses, wildcard);
                    self.expanding.pop();
                    result?;
                }
                "anyAttribute" => *wildcard = Some(Self::wildcard(child, document)),
                _ => {}
            }
        }
        Ok(())
    }

    fn attribute_use(&mut self, element: &'a Element, document: &'a SchemaDocument) -> Result<(AttributeUse, bool), SchemaError> {
        let usage = element.attribute("use").map_or("optional", str::trim);
        let mut attribute = if let Some(lexical) = element.attribute("ref") {
            let name = self.resolve_qname(element, document, lexical)?;
            let Some(global) = self.global_attributes.get(&name).copied() else {
                return Err(invalid(
                    document,
                    element,
                    format!("src-resolve: Cannot resolve the name '{}' to a(n) 'attribute declaration' component.", lexical.trim()),
                ));
            };
            let mut attribute = self.attribute_decl(global.element, global.document, name)?;
            if let Some(default) = element.attribute("default") {
                attribute.default = Some(default.to_string());
            }
            if let Some(fixed) = element.attribute("fixed") {
                attribute.fixed = Some(fixed.to_string());
            }
            attribute
        } else {
            let Some(local) = element.attribute("name") else {
                return Err(invalid(document, element, "a local xs:attribute requires a name or ref"));
            };
            let qualified = element
                .attribute("form")
                .map_or(document.attribute_qualified, |form| form.trim() == "qualified");
            let namespace = if qualified {
                document.target_namespace.as_deref()
            } else {
                None
            };
            self.attribute_decl(element, document, QName::new(namespace, local.trim()))?
        };
        attribute.required = usage == "required";
        Ok((attribute, usage == "prohibited"))
    }

    fn attribute_decl(
        &mut self,
        element: &'a Element,
        document: &'a SchemaDocument,
        name: QName,
    ) -> Result<AttributeUse, SchemaError> {
        let type_id = match element.attribute("type") {
            Some(lexical) => self.type_ref(element, document, lexical)?,
            None => match xs_child(element, "simpleType") {
                Some(inner) => self.anonymous_simple(inner, document)?,
                None => self.any_simple_type,
            },
        };
        Ok(AttributeUse {
            name,
            type_id,
            required: false,
            default: element.attribute("default").map(str::to_string),
            fixed: element.attribute("fixed").map(str::to_string),
        })
    }
}
