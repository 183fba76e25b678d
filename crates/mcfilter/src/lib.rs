//! # mcfilter
//!
//! Rule-based element selection for building-model checks.
//!
//! Users author [`FilterSpec`]s ("elements whose *Level* / *Elevation* is
//! *Greater Than* *10*"). The crate keeps each spec inside the grammar of its
//! category and compiles it into an [`ElementFilter`] that selects elements
//! from an [`ElementStore`] snapshot.
//!
//! ## Architecture
//!
//! ```text
//! schema ──► spec ──► compile ──► filter
//!   │          │         │
//!   │        units     matcher ──► text
//!   │                    │
//!   └───────────────► store / model
//! ```
//!
//! - [`schema`]: the category grammar. Which properties a category offers and
//!   which conditions each (category, property) pair accepts. Both the spec
//!   and the compiler read it; neither re-derives it.
//! - [`spec`]: [`FilterSpec`], mutated through a reducer that re-normalises
//!   dependent fields and reports which fields changed.
//! - [`compile`]: dispatch by category to predicate construction.
//! - [`filter`]: predicate leaves, AND/OR nodes and the never-matching
//!   sentinel.
//! - [`ruleset`]: ordered specs compiled with partial success and folded by
//!   their operators.
//! - [`store`]: the read-only model snapshot the compiler and filters consume.
//!
//! ## Example
//!
//! ```
//! use mcfilter::{compile, Category, Condition, Element, FilterSpec, MemoryStore};
//! use mcfilter::schema::props;
//!
//! let mut store = MemoryStore::new();
//! let low = store.add_level("Level 1", 0.0);
//! let high = store.add_level("Level 2", 15.0);
//! store.add_element(Element::new("Slab").on_level(low));
//! store.add_element(Element::new("Roof").on_level(high));
//!
//! let mut spec = FilterSpec::new(Category::Level);
//! spec.set_property(props::ELEVATION);
//! spec.set_condition(Condition::GreaterThan);
//! spec.set_value("10.0");
//!
//! let filter = compile(&spec, &store).unwrap();
//! let names: Vec<_> = filter.select(&store).iter().map(|e| e.name.as_str()).collect();
//! assert_eq!(names, ["Roof"]);
//! ```
//!
//! ## Concurrency
//!
//! Compilation and evaluation are pure: compiled filters own their data and
//! can be evaluated across threads. A `FilterSpec` models one editing session
//! and is mutated through `&mut self`.

pub mod compile;
pub mod config;
pub mod error;
pub mod filter;
pub mod matcher;
pub mod model;
pub mod ruleset;
pub mod schema;
pub mod spec;
pub mod store;
pub mod text;
pub mod units;

pub use compile::{compile, Compiler};
pub use config::EngineConfig;
pub use error::{FilterError, Result};
pub use filter::{ElementFilter, Predicate};
pub use model::{Element, ElementId, ParamValue};
pub use ruleset::{CompiledRuleSet, Diagnostic, RuleSet};
pub use schema::{Category, Condition};
pub use spec::{ChangedFields, Field, FieldChange, FilterSpec, Operator};
pub use store::memory::MemoryStore;
pub use store::ElementStore;
pub use units::{Unit, UnitClass};
