//! Element content models compiled to automata.
//!
//! A particle tree is expanded into a small NFA whose transitions are
//! element declarations or wildcards. Matching keeps the set of reachable
//! transitions, so children are checked in one pass without backtracking.
//! Occurrence ranges too wide to expand are tracked with counters carried
//! alongside each state. `xs:all` groups are matched separately since their
//! members may occur in any order.

use std::collections::HashSet;

use sbe_xml::QName;

use crate::schema::{ElementId, Particle, Term, Wildcard};

/// Occurrence ranges wider than this are counted rather than expanded.
const MAX_EXPANDED_OCCURS: u32 = 256;

#[derive(Debug, Clone)]
pub enum Leaf {
    Element { name: QName, decl: ElementId },
    Wildcard(Wildcard),
}

impl Leaf {
    fn accepts(&self, name: &QName) -> bool {
        match self {
            Leaf::Element { name: declared, .. } => declared == name,
            Leaf::Wildcard(wildcard) => wildcard.allows(name.namespace()),
        }
    }

    fn describe(&self) -> String {
        match self {
            Leaf::Element { name, .. } => name.to_string(),
            Leaf::Wildcard(wildcard) => wildcard.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum CounterOp {
    Reset,
    /// Pass while fewer iterations than this have completed.
    Below(u32),
    /// Count one completed iteration, saturating at this value.
    Increment(u32),
    /// Pass once at least this many iterations have completed.
    AtLeast(u32),
}

#[derive(Debug, Clone)]
enum State {
    Split(Vec<usize>),
    Match { leaf: usize, next: usize },
    Count { counter: usize, op: CounterOp, next: usize },
    Accept,
}

#[derive(Debug, Clone)]
pub struct Automaton {
    states: Vec<State>,
    leaves: Vec<Leaf>,
    start: usize,
    counters: usize,
}

/// A reachable state with the values of every counter on the way to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Config {
    state: usize,
    counts: Vec<u32>,
}

#[derive(Debug, Clone)]
pub struct AllMember {
    leaf: Leaf,
    required: bool,
}

#[derive(Debug, Clone)]
pub enum ContentModel {
    Automaton(Automaton),
    All { members: Vec<AllMember>, required: bool },
}

impl ContentModel {
    /// Build the model for `particle`; `None` accepts only empty content.
    /// `name_of` supplies the name of each referenced declaration.
    pub fn build(particle: Option<&Particle>, name_of: &dyn Fn(ElementId) -> QName) -> Self {
        if let Some(particle) = particle
            && let Term::All(members) = &particle.term
        {
            let members = members
                .iter()
                .filter_map(|member| {
                    let leaf = match &member.term {
                        Term::Element(decl) => Leaf::Element {
                            name: name_of(*decl),
                            decl: *decl,
                        },
                        Term::Wildcard(wildcard) => Leaf::Wildcard(wildcard.clone()),
                        _ => return None,
                    };
                    Some(AllMember {
                        leaf,
                        required: member.min > 0,
                    })
                })
                .collect();
            return ContentModel::All {
                members,
                required: particle.min > 0,
            };
        }
        let mut builder = Builder {
            states: vec![State::Accept],
            leaves: Vec::new(),
            counters: 0,
            name_of,
        };
        let start = match particle {
            Some(particle) => builder.particle(particle, 0),
            None => 0,
        };
        ContentModel::Automaton(Automaton {
            states: builder.states,
            leaves: builder.leaves,
            start,
            counters: builder.counters,
        })
    }

    pub fn matcher(&self) -> Matcher<'_> {
        let current = match self {
            ContentModel::Automaton(automaton) => automaton.closure(vec![Config {
                state: automaton.start,
                counts: vec![0; automaton.counters],
            }]),
            ContentModel::All { .. } => Vec::new(),
        };
        Matcher {
            model: self,
            current,
            seen: Vec::new(),
        }
    }

    /// Find a declaration for `name` anywhere in the model.
    pub fn find_element(&self, name: &QName) -> Option<ElementId> {
        let leaves: Vec<&Leaf> = match self {
            ContentModel::Automaton(automaton) => automaton.leaves.iter().collect(),
            ContentModel::All { members, .. } => members.iter().map(|member| &member.leaf).collect(),
        };
        leaves.into_iter().find_map(|leaf| match leaf {
            Leaf::Element { name: declared, decl } if declared == name => Some(*decl),
            _ => None,
        })
    }
}

struct Builder<'a> {
    states: Vec<State>,
    leaves: Vec<Leaf>,
    counters: usize,
    name_of: &'a dyn Fn(ElementId) -> QName,
}

impl Builder<'_> {
    fn push(&mut self, state: State) -> usize {
        self.states.push(state);
        self.states.len() - 1
    }

    /// Compile `particle` so that it continues at `next`; returns its entry.
    fn particle(&mut self, particle: &Particle, next: usize) -> usize {
        let min = particle.min;
        let wide = min > MAX_EXPANDED_OCCURS
            || particle
                .max
                .is_some_and(|max| max.saturating_sub(min) > MAX_EXPANDED_OCCURS);
        if wide {
            return self.counted(particle, next);
        }
        let mut entry = match particle.max {
            Some(max) => {
                let mut entry = next;
                for _ in min..max {
                    let body = self.term(&particle.term, entry);
                    entry = self.push(State::Split(vec![body, next]));
                }
                entry
            }
            None => {
                let repeat = self.push(State::Split(Vec::new()));
                let body = self.term(&particle.term, repeat);
                self.states[repeat] = State::Split(vec![body, next]);
                repeat
            }
        };
        for _ in 0..min {
            entry = self.term(&particle.term, entry);
        }
        entry
    }

    /// Compile `particle` as one loop over its term guarded by a counter.
    fn counted(&mut self, particle: &Particle, next: usize) -> usize {
        let counter = self.counters;
        self.counters += 1;
        let exit = self.push(State::Count {
            counter,
            op: CounterOp::AtLeast(particle.min),
            next,
        });
        let repeat = self.push(State::Split(Vec::new()));
        let increment = self.push(State::Count {
            counter,
            op: CounterOp::Increment(particle.max.unwrap_or(particle.min)),
            next: repeat,
        });
        let body = self.term(&particle.term, increment);
        let body = match particle.max {
            Some(max) => self.push(State::Count {
                counter,
                op: CounterOp::Below(max),
                next: body,
            }),
            None => body,
        };
        self.states[repeat] = State::Split(vec![body, exit]);
        self.push(State::Count {
            counter,
            op: CounterOp::Reset,
            next: repeat,
        })
    }

    fn term(&mut self, term: &Term, next: usize) -> usize {
        match term {
            Term::Element(decl) => {
                let leaf = Leaf::Element {
                    name: (self.name_of)(*decl),
                    decl: *decl,
                };
                self.leaf(leaf, next)
            }
            Term::Wildcard(wildcard) => self.leaf(Leaf::Wildcard(wildcard.clone()), next),
            Term::Sequence(particles) => particles
                .iter()
                .rev()
                .fold(next, |entry, particle| self.particle(particle, entry)),
            Term::Choice(particles) => {
                let branches = particles
                    .iter()
                    .map(|particle| self.particle(particle, next))
                    .collect();
                self.push(State::Split(branches))
            }
            // A nested all group is not valid XML Schema 1.0; accept its
            // members in any order and number.
            Term::All(particles) => {
                let repeat = self.push(State::Split(Vec::new()));
                let mut branches: Vec<usize> = particles
                    .iter()
                    .map(|particle| self.term(&particle.term, repeat))
                    .collect();
                branches.push(next);
                self.states[repeat] = State::Split(branches);
                repeat
            }
        }
    }

    fn leaf(&mut self, leaf: Leaf, next: usize) -> usize {
        self.leaves.push(leaf);
        let leaf = self.leaves.len() - 1;
        self.push(State::Match { leaf, next })
    }
}

impl Automaton {
    /// Match and accept configurations reachable from `from` through splits
    /// and counters, in discovery order.
    fn closure(&self, from: Vec<Config>) -> Vec<Config> {
        let mut visited = HashSet::new();
        let mut out = Vec::new();
        let mut stack: Vec<Config> = from.into_iter().rev().collect();
        while let Some(config) = stack.pop() {
            if !visited.insert(config.clone()) {
                continue;
            }
            match &self.states[config.state] {
                State::Split(targets) => stack.extend(targets.iter().rev().map(|&state| Config {
                    state,
                    counts: config.counts.clone(),
                })),
                State::Match { .. } | State::Accept => out.push(config),
                State::Count { counter, op, next } => {
                    let mut counts = config.counts;
                    let count = counts[*counter];
                    let pass = match *op {
                        CounterOp::Reset => {
                            counts[*counter] = 0;
                            true
                        }
                        CounterOp::Below(max) => count < max,
                        CounterOp::Increment(cap) => {
                            counts[*counter] = count.saturating_add(1).min(cap);
                            true
                        }
                        CounterOp::AtLeast(min) => count >= min,
                    };
                    if pass {
                        stack.push(Config {
                            state: *next,
                            counts,
                        });
                    }
                }
            }
        }
        out
    }
}

/// Outcome of feeding one child element to a [`Matcher`].
#[derive(Debug)]
pub enum Step<'m> {
    Matched(&'m Leaf),
    /// The child is not allowed here; `expected` lists what would have been.
    Unexpected { expected: Vec<String> },
}

pub struct Matcher<'m> {
    model: &'m ContentModel,
    /// Reachable automaton states.
    current: Vec<Config>,
    /// Members of an all group already matched.
    seen: Vec<usize>,
}

impl<'m> Matcher<'m> {
    pub fn step(&mut self, name: &QName) -> Step<'m> {
        let model = self.model;
        match model {
            ContentModel::Automaton(automaton) => self.step_automaton(automaton, name),
            ContentModel::All { members, .. } => self.step_all(members, name),
        }
    }

    fn step_automaton(&mut self, automaton: &'m Automaton, name: &QName) -> Step<'m> {
        let mut matched: Option<&'m Leaf> = None;
        let mut next = Vec::new();
        for config in &self.current {
            if let State::Match { leaf, next: target } = &automaton.states[config.state] {
                let candidate = &automaton.leaves[*leaf];
                if !candidate.accepts(name) {
                    continue;
                }
                // Prefer a declaration over a wildcard.
                if matched.is_none_or(|chosen| {
                    matches!(chosen, Leaf::Wildcard(_)) && matches!(candidate, Leaf::Element { .. })
                }) {
                    matched = Some(candidate);
                }
                next.push(Config {
                    state: *target,
                    counts: config.counts.clone(),
                });
            }
        }
        match matched {
            Some(leaf) => {
                self.current = automaton.closure(next);
                Step::Matched(leaf)
            }
            None => Step::Unexpected {
                expected: self.expected(),
            },
        }
    }

    fn step_all(&mut self, members: &'m [AllMember], name: &QName) -> Step<'m> {
        let found = members
            .iter()
            .enumerate()
            .find(|(index, member)| !self.seen.contains(index) && member.leaf.accepts(name));
        match found {
            Some((index, member)) => {
                self.seen.push(index);
                Step::Matched(&member.leaf)
            }
            None => Step::Unexpected {
                expected: self.expected(),
            },
        }
    }

    /// Names acceptable at the current position.
    pub fn expected(&self) -> Vec<String> {
        let mut expected: Vec<String> = Vec::new();
        let mut push = |text: String| {
            if !expected.contains(&text) {
                expected.push(text);
            }
        };
        match self.model {
            ContentModel::Automaton(automaton) => {
                for config in &self.current {
                    if let State::Match { leaf, .. } = &automaton.states[config.state] {
                        push(automaton.leaves[*leaf].describe());
                    }
                }
            }
            ContentModel::All { members, .. } => {
                for (index, member) in members.iter().enumerate() {
                    if !self.seen.contains(&index) {
                        push(member.leaf.describe());
                    }
                }
            }
        }
        expected
    }

    /// Check that the content seen so far is complete.
    pub fn finish(&self) -> Result<(), Vec<String>> {
        let complete = match self.model {
            ContentModel::Automaton(automaton) => self
                .current
                .iter()
                .any(|config| matches!(automaton.states[config.state], State::Accept)),
            ContentModel::All { members, required } => {
                let missing = members
                    .iter()
                    .enumerate()
                    .any(|(index, member)| member.required && !self.seen.contains(&index));
                !missing || (!required && self.seen.is_empty())
            }
        };
        if complete {
            Ok(())
        } else {
            Err(self.expected())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{NamespaceConstraint, ProcessContents};

    fn names() -> impl Fn(ElementId) -> QName {
        |id: ElementId| QName::local(["field", "group", "data", "extra"][id.index()])
    }

    fn element(id: usize, min: u32, max: Option<u32>) -> Particle {
        Particle {
            min,
            max,
            term: Term::Element(ElementId::new(id)),
        }
    }

    fn sequence(particles: Vec<Particle>) -> Particle {
        Particle {
            min: 1,
            max: Some(1),
            term: Term::Sequence(particles),
        }
    }

    fn run(model: &ContentModel, children: &[&str]) -> Result<(), String> {
        let mut matcher = model.matcher();
        for child in children {
            if let Step::Unexpected { expected } = matcher.step(&QName::local(child)) {
                return Err(format!("{child}: {}", expected.join(", ")));
            }
        }
        matcher
            .finish()
            .map_err(|expected| format!("incomplete: {}", expected.join(", ")))
    }

    #[test]
    fn block_sequence_accepts_ordered_repetitions() {
        let particle = sequence(vec![
            element(0, 0, None),
            element(1, 0, None),
            element(2, 0, None),
        ]);
        let model = ContentModel::build(Some(&particle), &names());
        assert!(run(&model, &[]).is_ok());
        assert!(run(&model, &["field", "field", "group", "data"]).is_ok());
        assert_eq!(
            run(&model, &["group", "field"]),
            Err("field: group, data".to_string())
        );
    }

    #[test]
    fn bounded_occurrences() {
        let particle = sequence(vec![element(0, 1, Some(2)), element(1, 1, Some(1))]);
        let model = ContentModel::build(Some(&particle), &names());
        assert!(run(&model, &["field", "group"]).is_ok());
        assert!(run(&model, &["field", "field", "group"]).is_ok());
        assert_eq!(
            run(&model, &["field", "field", "field"]),
            Err("field: group".to_string())
        );
        assert_eq!(run(&model, &["field"]), Err("incomplete: field, group".to_string()));
    }

    #[test]
    fn wide_upper_bounds_are_counted() {
        let particle = sequence(vec![element(0, 0, Some(300)), element(1, 0, Some(1))]);
        let model = ContentModel::build(Some(&particle), &names());
        let fields = vec!["field"; 300];
        assert!(run(&model, &fields).is_ok());

        let mut grouped = fields.clone();
        grouped.push("group");
        assert!(run(&model, &grouped).is_ok());

        let mut too_many = fields;
        too_many.push("field");
        assert_eq!(run(&model, &too_many), Err("field: group".to_string()));
    }

    #[test]
    fn wide_lower_bounds_are_counted() {
        let particle = sequence(vec![element(0, 300, None)]);
        let model = ContentModel::build(Some(&particle), &names());
        assert_eq!(
            run(&model, &["field"; 299]),
            Err("incomplete: field".to_string())
        );
        assert!(run(&model, &["field"; 300]).is_ok());
        assert!(run(&model, &["field"; 1000]).is_ok());
    }

    #[test]
    fn counted_sequences_reset_on_reentry() {
        let inner = Particle {
            min: 0,
            max: Some(1000),
            term: Term::Sequence(vec![element(0, 1, Some(1))]),
        };
        let particle = Particle {
            min: 1,
            max: None,
            term: Term::Sequence(vec![inner, element(1, 1, Some(1))]),
        };
        let model = ContentModel::build(Some(&particle), &names());
        assert!(run(&model, &["field", "field", "group", "field", "group"]).is_ok());
        assert_eq!(
            run(&model, &["group", "data"]),
            Err("data: field, group".to_string())
        );
    }

    #[test]
    fn choice_repetition() {
        let particle = Particle {
            min: 1,
            max: None,
            term: Term::Choice(vec![element(0, 1, Some(1)), element(1, 1, Some(1))]),
        };
        let model = ContentModel::build(Some(&particle), &names());
        assert!(run(&model, &["group", "field", "group"]).is_ok());
        assert!(run(&model, &[]).is_err());
    }

    #[test]
    fn declarations_win_over_wildcards() {
        let particle = sequence(vec![
            element(3, 0, Some(1)),
            Particle {
                min: 0,
                max: None,
                term: Term::Wildcard(Wildcard {
                    namespaces: NamespaceConstraint::Any,
                    process: ProcessContents::Lax,
                }),
            },
        ]);
        let model = ContentModel::build(Some(&particle), &names());
        let mut matcher = model.matcher();
        assert!(matches!(
            matcher.step(&QName::local("extra")),
            Step::Matched(Leaf::Element { .. })
        ));
        assert!(matches!(
            matcher.step(&QName::local("anything")),
            Step::Matched(Leaf::Wildcard(_))
        ));
    }

    #[test]
    fn all_groups_accept_any_order_once() {
        let particle = Particle {
            min: 1,
            max: Some(1),
            term: Term::All(vec![element(0, 1, Some(1)), element(1, 0, Some(1))]),
        };
        let model = ContentModel::build(Some(&particle), &names());
        assert!(run(&model, &["group", "field"]).is_ok());
        assert!(run(&model, &["field"]).is_ok());
        assert!(run(&model, &["field", "field"]).is_err());
        assert!(run(&model, &["group"]).is_err());
    }

    #[test]
    fn empty_model_rejects_children() {
        let model = ContentModel::build(None, &names());
        assert!(run(&model, &[]).is_ok());
        assert_eq!(run(&model, &["field"]), Err("field: ".to_string()));
    }
}
