//! Validation of an instance document against a compiled [`Schema`].
//!
//! Problems are reported through a callback as they are found; validation
//! always runs to the end of the document. Once a child element breaks its
//! parent's content model, later siblings are still validated against the
//! declaration that matches their name, but the content model of that
//! parent is not reported on again.

use sbe_model::Severity;
use sbe_xml::{
    Attribute, Document, Element, MAX_ELEMENT_DEPTH, Node, QName, TextPosition, XSI_NAMESPACE,
};

use crate::content::{ContentModel, Leaf, Step};
use crate::problem::Problem;
use crate::schema::{
    AttributeUse, ComplexType, Content, ElementDecl, ElementId, ProcessContents, Schema, TypeDef,
    TypeId, Wildcard,
};

impl Schema {
    /// Validate `document`, passing every problem found to `report`.
    pub fn validate(&self, document: &Document, report: &mut dyn FnMut(Problem)) {
        let root = &document.root;
        let mut validation = Validation {
            schema: self,
            report,
            depth: 1,
            truncated: false,
        };
        match self.global_element(&root.name) {
            Some(id) => validation.element(root, id),
            None => validation.error(
                root.position,
                format!(
                    "cvc-elt.1.a: Cannot find the declaration of element '{}'.",
                    root.name.local
                ),
            ),
        }
    }

    /// Validate `document` and collect the problems found.
    pub fn problems(&self, document: &Document) -> Vec<Problem> {
        let mut problems = Vec::new();
        self.validate(document, &mut |problem| problems.push(problem));
        problems
    }
}

/// Element name as it appears in content model messages.
fn label(name: &QName) -> String {
    match name.namespace() {
        Some(_) => format!("{{{name}}}"),
        None => name.local.clone(),
    }
}

fn has_text(element: &Element) -> bool {
    element
        .children
        .iter()
        .any(|node| matches!(node, Node::Text(text) if !text.trim().is_empty()))
}

struct Validation<'s, 'r> {
    schema: &'s Schema,
    report: &'r mut dyn FnMut(Problem),
    /// Nesting level of the element being validated; the root is 1.
    depth: usize,
    /// Whether the nesting limit has been reported.
    truncated: bool,
}

impl<'s> Validation<'s, '_> {
    fn error(&mut self, position: TextPosition, message: String) {
        (self.report)(Problem::error(position, message));
    }

    fn element(&mut self, element: &Element, id: ElementId) {
        let Some(decl) = self.schema.element(id) else {
            return;
        };
        let name = &element.name.local;
        if decl.is_abstract {
            self.error(
                element.position,
                format!("cvc-elt.2: The value of {{abstract}} in the element declaration for '{name}' must be false."),
            );
        }
        let Some(type_id) = self.element_type(element, decl) else {
            return;
        };

        let nil = element.attribute_ns(Some(XSI_NAMESPACE), "nil").map(str::trim);
        if nil.is_some() && !decl.nillable {
            self.error(
                element.position,
                format!(
                    "cvc-elt.3.1: Attribute '{XSI_NAMESPACE},nil' must not appear on element '{name}', because the {{nillable}} property of '{name}' is false."
                ),
            );
        }
        if decl.nillable && matches!(nil, Some("true" | "1")) {
            if has_text(element) || element.has_child_elements() {
                self.error(
                    element.position,
                    format!(
                        "cvc-elt.3.2.1: Element '{name}' cannot have character or element information [children], because '{XSI_NAMESPACE},nil' is specified."
                    ),
                );
            }
            if let Some(TypeDef::Complex(complex)) = self.schema.type_def(type_id) {
                self.attributes(element, complex);
            }
            return;
        }

        match self.schema.type_def(type_id) {
            Some(TypeDef::Simple(_)) => self.simple_element(element, decl, type_id),
            Some(TypeDef::Complex(complex)) => {
                self.attributes(element, complex);
                self.content(element, decl, complex);
            }
            None => {}
        }
    }

    /// The declared type, or the one named by `xsi:type`.
    fn element_type(&mut self, element: &Element, decl: &ElementDecl) -> Option<TypeId> {
        let Some(lexical) = element.attribute_ns(Some(XSI_NAMESPACE), "type") else {
            return Some(decl.type_id);
        };
        let resolved = element
            .resolve_qname(lexical)
            .and_then(|name| self.schema.global_type(&name));
        if resolved.is_none() {
            self.error(
                element.position,
                format!(
                    "cvc-elt.4.2: Cannot resolve '{}' to a type definition for element '{}'.",
                    lexical.trim(),
                    element.name.local
                ),
            );
        }
        resolved
    }

    fn simple_element(&mut self, element: &Element, decl: &ElementDecl, type_id: TypeId) {
        let name = &element.name.local;
        if let Some(attribute) = element
            .attributes
            .iter()
            .find(|attribute| attribute.name.namespace() != Some(XSI_NAMESPACE))
        {
            self.error(
                element.position,
                format!(
                    "cvc-type.3.1.1: Element '{name}' is a simple type, so it cannot have attributes, excepting those whose namespace name is identical to '{XSI_NAMESPACE}' and whose [local name] is one of 'type', 'nil', 'schemaLocation' or 'noNamespaceSchemaLocation'. However, the attribute, '{}' was found.",
                    attribute.name.local
                ),
            );
        }
        if element.has_child_elements() {
            self.error(
                element.position,
                format!("cvc-type.3.1.2: Element '{name}' is a simple type, so it must have no element information item [children]."),
            );
            return;
        }
        self.element_value(element, decl, type_id);
    }

    /// Check the character data of an element with a simple value.
    fn element_value(&mut self, element: &Element, decl: &ElementDecl, type_id: TypeId) {
        let text = element.text();
        let value = match (&decl.default, text.is_empty()) {
            (Some(default), true) => default.clone(),
            _ => text,
        };
        if let Err(message) = self.schema.check_simple_value(type_id, &value) {
            self.error(element.position, message);
            return;
        }
        if !self.check_prefix(element, element.position, type_id, &value) {
            return;
        }
        if let Some(fixed) = &decl.fixed {
            let actual = self.schema.normalize_value(type_id, &value);
            if actual != self.schema.normalize_value(type_id, fixed) {
                self.error(
                    element.position,
                    format!(
                        "cvc-elt.5.2.2.2.2: The value '{actual}' of element '{}' does not match the {{value constraint}} value '{fixed}'.",
                        element.name.local
                    ),
                );
            }
        }
    }

    fn attributes(&mut self, element: &Element, complex: &ComplexType) {
        for attribute in &element.attributes {
            if attribute.name.namespace() == Some(XSI_NAMESPACE) {
                continue;
            }
            if let Some(declared) = complex
                .attributes
                .iter()
                .find(|declared| declared.name == attribute.name)
            {
                self.attribute_value(element, attribute, declared);
                continue;
            }
            let wildcard = complex
                .attribute_wildcard
                .as_ref()
                .filter(|wildcard| wildcard.allows(attribute.name.namespace()));
            match wildcard.map(|wildcard| wildcard.process) {
                Some(ProcessContents::Skip) => {}
                Some(process) => match self.schema.global_attribute(&attribute.name) {
                    Some(declared) => self.attribute_value(element, attribute, declared),
                    None if process == ProcessContents::Strict => self.not_allowed(element, attribute),
                    None => {}
                },
                None => self.not_allowed(element, attribute),
            }
        }
        for declared in complex.attributes.iter().filter(|declared| declared.required) {
            if element
                .attribute_ns(declared.name.namespace(), &declared.name.local)
                .is_none()
            {
                self.error(
                    element.position,
                    format!(
                        "cvc-complex-type.4: Attribute '{}' must appear on element '{}'.",
                        declared.name.local, element.name.local
                    ),
                );
            }
        }
    }

    fn not_allowed(&mut self, element: &Element, attribute: &Attribute) {
        self.error(
            attribute.position,
            format!(
                "cvc-complex-type.3.2.2: Attribute '{}' is not allowed to appear in element '{}'.",
                attribute.name.local, element.name.local
            ),
        );
    }

    fn attribute_value(&mut self, element: &Element, attribute: &Attribute, declared: &AttributeUse) {
        if let Err(message) = self.schema.check_simple_value(declared.type_id, &attribute.value) {
            self.error(attribute.position, message);
            return;
        }
        if !self.check_prefix(element, attribute.position, declared.type_id, &attribute.value) {
            return;
        }
        if let Some(fixed) = &declared.fixed {
            let actual = self.schema.normalize_value(declared.type_id, &attribute.value);
            if actual != self.schema.normalize_value(declared.type_id, fixed) {
                self.error(
                    attribute.position,
                    format!(
                        "cvc-attribute.4: The value '{actual}' of attribute '{}' on element '{}' does not match its fixed {{value constraint}}, '{fixed}'.",
                        attribute.name.local, element.name.local
                    ),
                );
            }
        }
    }

    fn content(&mut self, element: &Element, decl: &ElementDecl, complex: &'s ComplexType) {
        let name = &element.name.local;
        match &complex.content {
            Content::Empty => {
                if has_text(element) || element.has_child_elements() {
                    self.error(
                        element.position,
                        format!("cvc-complex-type.2.1: Element '{name}' must have no character or element information item [children], because the type's content type is empty."),
                    );
                }
            }
            Content::Simple(value_type) => {
                if element.has_child_elements() {
                    self.error(
                        element.position,
                        format!("cvc-complex-type.2.2: Element '{name}' must have no element [children], and the value must be valid."),
                    );
                    return;
                }
                self.element_value(element, decl, *value_type);
            }
            Content::Elements { model, mixed, .. } => {
                if !mixed && has_text(element) {
                    self.error(
                        element.position,
                        format!("cvc-complex-type.2.3: Element '{name}' cannot have character [children], because the type's content type is element-only."),
                    );
                }
                self.children(element, model);
            }
        }
    }

    fn children(&mut self, element: &Element, model: &'s ContentModel) {
        let mut matcher = model.matcher();
        let mut broken = false;
        for child in element.child_elements() {
            let target = if broken {
                self.fallback(model, &child.name)
            } else {
                match matcher.step(&child.name) {
                    Step::Matched(Leaf::Element { decl, .. }) => Some(*decl),
                    Step::Matched(Leaf::Wildcard(wildcard)) => self.wildcard_target(wildcard, child),
                    Step::Unexpected { expected } => {
                        broken = true;
                        self.unexpected(child, &expected);
                        self.fallback(model, &child.name)
                    }
                }
            };
            if let Some(id) = target {
                self.descend(child, id);
            }
        }
        if !broken && let Err(expected) = matcher.finish() {
            self.error(
                element.position,
                format!(
                    "cvc-complex-type.2.4.b: The content of element '{}' is not complete. One of '{{{}}}' is expected.",
                    element.name.local,
                    expected.join(", ")
                ),
            );
        }
    }

    fn descend(&mut self, child: &Element, id: ElementId) {
        if self.depth >= MAX_ELEMENT_DEPTH {
            if !std::mem::replace(&mut self.truncated, true) {
                (self.report)(Problem::new(
                    Severity::Fatal,
                    Some(child.position),
                    format!("element nesting exceeds {MAX_ELEMENT_DEPTH} levels"),
                ));
            }
            return;
        }
        self.depth += 1;
        self.element(child, id);
        self.depth -= 1;
    }

    /// Prefixes in QName values must be bound where the value appears.
    fn check_prefix(
        &mut self,
        scope: &Element,
        position: TextPosition,
        type_id: TypeId,
        raw: &str,
    ) -> bool {
        if !self.schema.is_qname_type(type_id) {
            return true;
        }
        let value = raw.trim();
        let Some((prefix, _)) = value.split_once(':') else {
            return true;
        };
        if scope.resolve_qname(value).is_some() {
            return true;
        }
        self.error(
            position,
            format!("UndeclaredPrefix: Cannot resolve '{value}' as a QName: the prefix '{prefix}' is not declared."),
        );
        false
    }

    fn unexpected(&mut self, child: &Element, expected: &[String]) {
        let message = if expected.is_empty() {
            format!(
                "cvc-complex-type.2.4.d: Invalid content was found starting with element '{}'. No child element is expected at this point.",
                label(&child.name)
            )
        } else {
            format!(
                "cvc-complex-type.2.4.a: Invalid content was found starting with element '{}'. One of '{{{}}}' is expected.",
                label(&child.name),
                expected.join(", ")
            )
        };
        self.error(child.position, message);
    }

    /// Declaration for a child that did not fit the content model.
    fn fallback(&self, model: &ContentModel, name: &QName) -> Option<ElementId> {
        model
            .find_element(name)
            .or_else(|| self.schema.global_element(name))
    }

    fn wildcard_target(&mut self, wildcard: &Wildcard, child: &Element) -> Option<ElementId> {
        let declared = self.schema.global_element(&child.name);
        match wildcard.process {
            ProcessContents::Skip => None,
            ProcessContents::Lax => declared,
            ProcessContents::Strict => {
                if declared.is_none() {
                    self.error(
                        child.position,
                        format!(
                            "cvc-complex-type.2.4.c: The matching wildcard is strict, but no declaration can be found for element '{}'.",
                            child.name.local
                        ),
                    );
                }
                declared
            }
        }
    }
}
