//! # Compilation
//!
//! [`Compiler::compile`] turns one valid [`FilterSpec`] into an
//! [`ElementFilter`] over a store snapshot. It neither keeps nor changes the
//! spec.
//!
//! ## Strategy by category family
//!
//! **Named entities** (categories, families, types, levels, phases, design
//! options, views, worksets): the entities whose name passes the spec's
//! [`TextTest`] are resolved up front, and each becomes one or more
//! [`Predicate`] leaves joined with OR. `Defined` resolves every entity;
//! `Undefined` tests that the element has no association at all.
//!
//! **Numbers** (level elevation, numeric parameters): the value is parsed once,
//! converted to internal units, and compared against the rounded model value.
//!
//! **Booleans and fixed vocabularies** (type or instance, host, view "Is
//! Defined", structural type, phase status): the literal maps directly to one
//! predicate.
//!
//! **Parameters**: a [`ParameterTest`] evaluated per element. Conditions that
//! need the whole store (`Duplicated`, host parameters) are resolved into an
//! id set at compile time.
//!
//! ## Results
//!
//! | Outcome | Returned as |
//! |---------|-------------|
//! | Entities resolved | `Ok(filter)` |
//! | Valid spec, nothing resolved | `Ok(ElementFilter::Never)` |
//! | Value cannot be read | `Err(FilterError::Parse)` / `Err(FilterError::InvalidPattern)` |
//! | No rule for the triple | `Err(FilterError::Unsupported)` |
//! | Spec outside the grammar | `Err(FilterError::Validation)` |
//!
//! A missing rule is never turned into a filter that matches everything.

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::{FilterError, Result};
use crate::filter::{self, any_of, ElementFilter, Predicate};
use crate::matcher::{self, NumericTest, ParameterTest, TextTest};
use crate::model::{
    Element, ElementId, FamilyInfo, LevelInfo, NamedEntity, PhaseStatus, StructuralType,
};
use crate::schema::{props, Category, Condition};
use crate::spec::FilterSpec;
use crate::store::ElementStore;
use crate::text;
use crate::units::UnitClass;

/// Compile `spec` against `store` with the default configuration.
pub fn compile<S>(spec: &FilterSpec, store: &S) -> Result<ElementFilter>
where
    S: ElementStore + ?Sized,
{
    Compiler::new(store).compile(spec)
}

pub struct Compiler<'a, S: ElementStore + ?Sized> {
    store: &'a S,
    config: EngineConfig,
}

impl<'a, S: ElementStore + ?Sized> Compiler<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    pub fn with_config(store: &'a S, config: EngineConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn compile(&self, spec: &FilterSpec) -> Result<ElementFilter> {
        spec.validate()?;
        debug!(
            category = %spec.category(),
            property = spec.property(),
            condition = %spec.condition(),
            "compiling filter"
        );

        let filter = match spec.category() {
            Category::Category => self.category(spec),
            Category::Family => self.family(spec),
            Category::Type => self.element_type(spec),
            Category::TypeOrInstance => self.type_or_instance(spec),
            Category::ApiType => self.api_type(spec),
            Category::Level => self.level(spec),
            Category::PhaseCreated | Category::PhaseDemolished => self.phase(spec),
            Category::PhaseStatus => self.phase_status(spec),
            Category::DesignOption => self.design_option(spec),
            Category::View => self.view(spec),
            Category::Workset => self.workset(spec),
            Category::Parameter | Category::ApiParameter => self.parameter(spec),
            Category::HostParameter => self.host_parameter(spec),
            Category::StructuralType => self.structural_type(spec),
            Category::Host => self.host(spec),
            Category::Room | Category::Space | Category::Redundant => Err(unsupported(spec)),
        }?;

        if filter.is_never() {
            warn!(
                category = %spec.category(),
                property = spec.property(),
                value = spec.value(),
                "filter resolved no entities, selecting nothing"
            );
        }
        Ok(filter)
    }

    fn text_test(&self, spec: &FilterSpec) -> Result<TextTest> {
        if !spec.condition().is_text_comparison() {
            return Err(unsupported(spec));
        }
        TextTest::new(
            spec.condition(),
            spec.value(),
            spec.case_insensitive(),
            self.config.locale(),
        )
    }

    /// Entities whose name passes the spec's text test.
    fn matching<'e, T>(
        &self,
        spec: &FilterSpec,
        entities: &'e [T],
        name: impl Fn(&T) -> String,
    ) -> Result<Vec<&'e T>> {
        let test = self.text_test(spec)?;
        let matched: Vec<&T> = entities.iter().filter(|e| test.matches(&name(*e))).collect();
        debug!(
            candidates = entities.len(),
            matched = matched.len(),
            "resolved entities by name"
        );
        Ok(matched)
    }

    // --- Named entities ---

    fn category(&self, spec: &FilterSpec) -> Result<ElementFilter> {
        let categories = self.store.categories();
        if spec.property() == props::NAME {
            let matched = self.matching(spec, categories, |c| c.name.clone())?;
            return Ok(any_of(matched.into_iter().map(|c| Predicate::InCategory {
                id: c.id,
                inverted: false,
            })));
        }
        if spec.condition() != Condition::Included {
            return Err(unsupported(spec));
        }
        let included = matcher::parse_bool(spec.value())?;
        let Some(category) = categories.iter().find(|c| c.name == spec.property()) else {
            return Ok(ElementFilter::Never);
        };
        Ok(Predicate::InCategory {
            id: category.id,
            inverted: !included,
        }
        .into())
    }

    fn family(&self, spec: &FilterSpec) -> Result<ElementFilter> {
        let families = self.store.families();
        let matched: Vec<&FamilyInfo> = if spec.property() == props::IS_IN_PLACE {
            let flag = matcher::parse_bool(spec.value())?;
            let wanted = match spec.condition() {
                Condition::Equal => flag,
                Condition::NotEqual => !flag,
                _ => return Err(unsupported(spec)),
            };
            families.iter().filter(|f| f.is_in_place == wanted).collect()
        } else {
            self.matching(spec, families, |f| f.name.clone())?
        };

        let predicates = matched.into_iter().flat_map(|family| {
            std::iter::once(Predicate::TypeInFamily(family.id))
                .chain(family.type_ids.iter().map(|id| Predicate::InstanceOf(*id)))
        });
        Ok(any_of(predicates))
    }

    fn element_type(&self, spec: &FilterSpec) -> Result<ElementFilter> {
        let types = self.store.element_types();
        let matched = self.matching(spec, &types, |t| t.name.clone())?;
        Ok(any_of(
            matched.into_iter().map(|t| Predicate::TypeOrInstanceOf(t.id)),
        ))
    }

    fn level(&self, spec: &FilterSpec) -> Result<ElementFilter> {
        let levels = self.store.levels();
        let matched: Vec<&LevelInfo> = match (spec.property(), spec.condition()) {
            (props::NAME, Condition::Defined) => levels.iter().collect(),
            (props::NAME, Condition::Undefined) => {
                return Ok(Predicate::WithoutLevel.into());
            }
            (props::NAME, _) => self.matching(spec, levels, |l| l.name.clone())?,
            (props::ELEVATION, condition) => {
                let threshold = matcher::parse_number(spec.value())?;
                let test = NumericTest::new(condition, threshold, &self.config)
                    .map_err(|_| unsupported(spec))?;
                levels.iter().filter(|l| test.matches(l.elevation)).collect()
            }
            _ => return Err(unsupported(spec)),
        };

        let prefix = &self.config.level_sketch_plane_prefix;
        let predicates = matched.into_iter().flat_map(|level| {
            [
                Predicate::OnLevel(level.id),
                Predicate::SketchPlaneNamed(format!("{}{}", prefix, level.name)),
            ]
        });
        Ok(any_of(predicates))
    }

    fn phase(&self, spec: &FilterSpec) -> Result<ElementFilter> {
        let demolished = spec.category() == Category::PhaseDemolished;
        let phases = self.store.phases();
        let matched: Vec<&NamedEntity> = match spec.condition() {
            Condition::Defined => phases.iter().collect(),
            Condition::Undefined if demolished => {
                return Ok(Predicate::WithoutPhaseDemolished.into());
            }
            Condition::Undefined => return Ok(Predicate::WithoutPhaseCreated.into()),
            _ => self.matching(spec, phases, |p| p.name.clone())?,
        };
        Ok(any_of(matched.into_iter().map(|phase| {
            if demolished {
                Predicate::DemolishedInPhase(phase.id)
            } else {
                Predicate::CreatedInPhase(phase.id)
            }
        })))
    }

    fn phase_status(&self, spec: &FilterSpec) -> Result<ElementFilter> {
        if spec.property().is_empty() {
            return Err(unsupported(spec));
        }
        let inverted = match spec.condition() {
            Condition::Equal => false,
            Condition::NotEqual => true,
            _ => return Err(unsupported(spec)),
        };
        let status = PhaseStatus::parse(spec.value())
            .ok_or_else(|| FilterError::parse(spec.value(), "a phase status"))?;

        let phases: Vec<ElementId> = self.store.phases().iter().map(|p| p.id).collect();
        let Some(phase) = self
            .store
            .phases()
            .iter()
            .position(|p| p.name == spec.property())
        else {
            return Ok(ElementFilter::Never);
        };
        Ok(Predicate::PhaseStatus {
            phases,
            phase,
            status,
            inverted,
        }
        .into())
    }

    fn design_option(&self, spec: &FilterSpec) -> Result<ElementFilter> {
        let options = self.store.design_options();
        let tag = &self.config.design_option_primary_tag;
        let normalized = |name: &str| name.replace(tag.as_str(), "").trim().to_string();

        match spec.condition() {
            Condition::Equal | Condition::NotEqual => {
                let target = spec.value().trim();
                let matched: Vec<_> = options
                    .iter()
                    .filter(|o| text::equals(&normalized(&o.name), target, spec.case_insensitive()))
                    .collect();
                if matched.is_empty() {
                    return Ok(ElementFilter::Never);
                }
                if spec.condition() == Condition::Equal {
                    return Ok(any_of(matched.into_iter().map(|o| {
                        Predicate::InDesignOption {
                            id: o.id,
                            inverted: false,
                        }
                    })));
                }
                filter::and(
                    matched
                        .into_iter()
                        .map(|o| {
                            Predicate::InDesignOption {
                                id: o.id,
                                inverted: true,
                            }
                            .into()
                        })
                        .collect(),
                )
            }
            Condition::Defined => Ok(any_of(options.iter().map(|o| Predicate::InDesignOption {
                id: o.id,
                inverted: false,
            }))),
            Condition::Undefined => Ok(Predicate::WithoutDesignOption.into()),
            _ => {
                let matched = self.matching(spec, options, |o| normalized(&o.name))?;
                Ok(any_of(matched.into_iter().map(|o| {
                    Predicate::InDesignOption {
                        id: o.id,
                        inverted: false,
                    }
                })))
            }
        }
    }

    fn view(&self, spec: &FilterSpec) -> Result<ElementFilter> {
        if spec.property() == props::IS_DEFINED {
            let flag = matcher::parse_bool(spec.value())?;
            let owned = match spec.condition() {
                Condition::Equal => flag,
                Condition::NotEqual => !flag,
                _ => return Err(unsupported(spec)),
            };
            return Ok(Predicate::HasOwnerView(owned).into());
        }
        match spec.condition() {
            Condition::Defined => Ok(Predicate::HasOwnerView(true).into()),
            Condition::Undefined => Ok(Predicate::HasOwnerView(false).into()),
            _ => {
                let matched = self.matching(spec, self.store.views(), |v| v.name.clone())?;
                Ok(any_of(
                    matched.into_iter().map(|v| Predicate::OwnedByView(v.id)),
                ))
            }
        }
    }

    fn workset(&self, spec: &FilterSpec) -> Result<ElementFilter> {
        let matched = self.matching(spec, self.store.worksets(), |w| w.name.clone())?;
        Ok(any_of(
            matched.into_iter().map(|w| Predicate::InWorkset(w.id)),
        ))
    }

    // --- Booleans and fixed vocabularies ---

    fn type_or_instance(&self, spec: &FilterSpec) -> Result<ElementFilter> {
        if spec.condition() != Condition::Equal {
            return Err(unsupported(spec));
        }
        let is_type = matcher::parse_bool(spec.value())?;
        Ok(Predicate::IsElementType(is_type).into())
    }

    fn host(&self, spec: &FilterSpec) -> Result<ElementFilter> {
        if spec.condition() != Condition::Equal {
            return Err(unsupported(spec));
        }
        let hosted = matcher::parse_bool(spec.value())?;
        Ok(Predicate::HasHost(hosted).into())
    }

    fn structural_type(&self, spec: &FilterSpec) -> Result<ElementFilter> {
        let inverted = match spec.condition() {
            Condition::Equal => false,
            Condition::NotEqual => true,
            _ => return Err(unsupported(spec)),
        };
        let kind = StructuralType::parse(spec.value())
            .ok_or_else(|| FilterError::parse(spec.value(), "a structural type"))?;
        Ok(Predicate::StructuralType { kind, inverted }.into())
    }

    fn api_type(&self, spec: &FilterSpec) -> Result<ElementFilter> {
        if spec.condition() != Condition::Equal {
            return Err(unsupported(spec));
        }
        let class_name = spec.value().trim();
        if class_name.is_empty() {
            return Err(FilterError::parse(spec.value(), "a class name"));
        }
        let known = self
            .store
            .elements()
            .iter()
            .any(|e| e.class_name == class_name);
        if !known {
            return Ok(ElementFilter::Never);
        }
        Ok(Predicate::ClassName(class_name.to_string()).into())
    }

    // --- Parameters ---

    fn parameter(&self, spec: &FilterSpec) -> Result<ElementFilter> {
        let name = spec.property();
        if name.is_empty() {
            return Err(unsupported(spec));
        }
        if spec.condition() == Condition::Duplicated {
            return Ok(self.duplicated(name));
        }
        let test = self.parameter_test(spec)?;
        Ok(Predicate::Parameter {
            name: name.to_string(),
            test,
        }
        .into())
    }

    /// Elements whose host passes the parameter test.
    fn host_parameter(&self, spec: &FilterSpec) -> Result<ElementFilter> {
        let name = spec.property();
        if name.is_empty() {
            return Err(unsupported(spec));
        }
        let hosted: BTreeSet<ElementId> = if spec.condition() == Condition::Duplicated {
            let hosts = self.duplicated_ids(name);
            self.hosted_by(|host| hosts.contains(&host.id))
        } else {
            let test = self.parameter_test(spec)?;
            self.hosted_by(|host| test.matches(host, name))
        };
        debug!(matched = hosted.len(), "resolved hosted elements");
        if hosted.is_empty() {
            return Ok(ElementFilter::Never);
        }
        Ok(Predicate::ElementIn(hosted).into())
    }

    fn hosted_by(&self, host_passes: impl Fn(&Element) -> bool) -> BTreeSet<ElementId> {
        self.store
            .elements()
            .iter()
            .filter(|element| {
                element
                    .host_id
                    .and_then(|host| self.store.element(host))
                    .is_some_and(|host| host_passes(host))
            })
            .map(|element| element.id)
            .collect()
    }

    fn duplicated(&self, name: &str) -> ElementFilter {
        let duplicates = self.duplicated_ids(name);
        debug!(matched = duplicates.len(), "resolved duplicated values");
        if duplicates.is_empty() {
            return ElementFilter::Never;
        }
        Predicate::ElementIn(duplicates).into()
    }

    /// Elements sharing a non-empty value of `name` with at least one other element.
    fn duplicated_ids(&self, name: &str) -> BTreeSet<ElementId> {
        let mut by_value: HashMap<String, Vec<ElementId>> = HashMap::new();
        for element in self.store.elements() {
            if let Some(value) = element.parameter(name).filter(|v| v.has_value()) {
                by_value.entry(value.as_text()).or_default().push(element.id);
            }
        }
        by_value
            .into_values()
            .filter(|ids| ids.len() > 1)
            .flatten()
            .collect()
    }

    fn parameter_test(&self, spec: &FilterSpec) -> Result<ParameterTest> {
        let condition = spec.condition();
        let test = match condition {
            Condition::Defined => ParameterTest::Defined,
            Condition::Undefined => ParameterTest::Undefined,
            Condition::HasValue => ParameterTest::HasValue,
            Condition::HasNoValue => ParameterTest::HasNoValue,
            Condition::Equal | Condition::NotEqual => {
                // With a unit selected the value has to be a number.
                let number = if spec.unit_class() != UnitClass::None {
                    Some(spec.numeric_value()?)
                } else {
                    spec.numeric_value().ok()
                };
                let number = number
                    .map(|threshold| NumericTest::new(condition, threshold, &self.config))
                    .transpose()?;
                ParameterTest::Compare {
                    text: self.text_test(spec)?,
                    number,
                }
            }
            c if c.is_ordering() => {
                let threshold = spec.numeric_value()?;
                ParameterTest::Ordering(NumericTest::new(c, threshold, &self.config)?)
            }
            Condition::Contains
            | Condition::DoesNotContain
            | Condition::WildCard
            | Condition::WildCardNoMatch => ParameterTest::Compare {
                text: self.text_test(spec)?,
                number: None,
            },
            Condition::MatchesParameter | Condition::DoesNotMatchParameter => {
                let other = spec.value().trim();
                if other.is_empty() {
                    return Err(FilterError::parse(spec.value(), "a parameter name"));
                }
                ParameterTest::SameAs {
                    other: other.to_string(),
                    case_insensitive: spec.case_insensitive(),
                    negate: condition == Condition::DoesNotMatchParameter,
                }
            }
            _ => return Err(unsupported(spec)),
        };
        Ok(test)
    }
}

fn unsupported(spec: &FilterSpec) -> FilterError {
    FilterError::unsupported(spec.category(), spec.property(), spec.condition())
}
