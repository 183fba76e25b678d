//! Ordered collections of filter specs.
//!
//! A [`RuleSet`] compiles each spec on its own, so a spec that fails to
//! compile is reported as a [`Diagnostic`] without stopping its siblings. In
//! the fold it stands in as [`ElementFilter::Never`]: a failure can empty its
//! AND group but never widen the selection. Filters are folded left to right
//! by their [`Operator`]: AND binds tighter than OR, and the operator of the
//! first spec is ignored.
//!
//! ```text
//! A, AND B, OR C, AND D   =>   (A and B) or (C and D)
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::compile::Compiler;
use crate::error::FilterError;
use crate::filter::{self, ElementFilter};
use crate::model::Element;
use crate::spec::{FilterSpec, Operator};
use crate::store::ElementStore;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    specs: Vec<FilterSpec>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FilterSpec> {
        self.specs.iter()
    }

    /// Append `spec` and return its id.
    pub fn push(&mut self, spec: FilterSpec) -> Uuid {
        let id = spec.id();
        self.specs.push(spec);
        id
    }

    pub fn get(&self, id: Uuid) -> Option<&FilterSpec> {
        self.specs.iter().find(|s| s.id() == id)
    }

    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut FilterSpec> {
        self.specs.iter_mut().find(|s| s.id() == id)
    }

    pub fn remove(&mut self, id: Uuid) -> Option<FilterSpec> {
        let index = self.position(id)?;
        Some(self.specs.remove(index))
    }

    /// Insert a copy of the spec right after it. Returns the copy's id.
    pub fn duplicate(&mut self, id: Uuid) -> Option<Uuid> {
        let index = self.position(id)?;
        let copy = self.specs[index].duplicate();
        let copy_id = copy.id();
        self.specs.insert(index + 1, copy);
        Some(copy_id)
    }

    pub fn can_move_up(&self, id: Uuid) -> bool {
        self.position(id).is_some_and(|i| i > 0)
    }

    pub fn can_move_down(&self, id: Uuid) -> bool {
        self.position(id).is_some_and(|i| i + 1 < self.specs.len())
    }

    pub fn move_up(&mut self, id: Uuid) -> bool {
        match self.position(id) {
            Some(i) if i > 0 => {
                self.specs.swap(i, i - 1);
                true
            }
            _ => false,
        }
    }

    pub fn move_down(&mut self, id: Uuid) -> bool {
        match self.position(id) {
            Some(i) if i + 1 < self.specs.len() => {
                self.specs.swap(i, i + 1);
                true
            }
            _ => false,
        }
    }

    fn position(&self, id: Uuid) -> Option<usize> {
        self.specs.iter().position(|s| s.id() == id)
    }

    /// Compile every spec, collecting failures instead of stopping at them.
    pub fn compile<S>(&self, compiler: &Compiler<'_, S>) -> CompiledRuleSet
    where
        S: ElementStore + ?Sized,
    {
        let mut compiled = CompiledRuleSet::default();
        let mut groups: Vec<Vec<ElementFilter>> = Vec::new();

        for spec in &self.specs {
            let filter = match compiler.compile(spec) {
                Ok(filter) => {
                    compiled.filters.push((spec.id(), filter.clone()));
                    filter
                }
                Err(error) => {
                    warn!(spec = %spec.id(), %error, "filter failed to compile");
                    compiled.diagnostics.push(Diagnostic {
                        spec_id: spec.id(),
                        error,
                    });
                    // A failed spec still holds its place in the fold.
                    ElementFilter::Never
                }
            };
            match groups.last_mut() {
                Some(group) if spec.operator() == Operator::And => group.push(filter),
                _ => groups.push(vec![filter]),
            }
        }

        let groups: Vec<ElementFilter> = groups
            .into_iter()
            .filter_map(|group| filter::and(group).ok())
            .collect();
        if !groups.is_empty() {
            compiled.combined = Some(filter::or(groups));
        }
        debug!(
            compiled = compiled.filters.len(),
            failed = compiled.diagnostics.len(),
            "compiled rule set"
        );
        compiled
    }
}

/// A spec that could not be compiled.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub spec_id: Uuid,
    pub error: FilterError,
}

#[derive(Debug, Clone, Default)]
pub struct CompiledRuleSet {
    /// Filters of the specs that compiled, in rule set order.
    pub filters: Vec<(Uuid, ElementFilter)>,
    pub diagnostics: Vec<Diagnostic>,
    /// The operator fold of every spec, failed ones as `Never`; `None` for an
    /// empty rule set.
    pub combined: Option<ElementFilter>,
}

impl CompiledRuleSet {
    /// True when every spec compiled.
    pub fn is_complete(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn filter(&self, id: Uuid) -> Option<&ElementFilter> {
        self.filters.iter().find(|(spec, _)| *spec == id).map(|(_, f)| f)
    }

    /// Elements selected by the combined filter.
    pub fn select<'s, S>(&self, store: &'s S) -> Vec<&'s Element>
    where
        S: ElementStore + ?Sized,
    {
        match &self.combined {
            Some(filter) => filter.select(store),
            None => Vec::new(),
        }
    }
}
