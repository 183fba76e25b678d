use std::collections::HashMap;

use super::ElementStore;
use crate::model::{Element, ElementId, FamilyInfo, LevelInfo, NamedEntity};

/// An owned model snapshot.
///
/// Ids are allocated from a single counter, so entities and elements never
/// share an id.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    next_id: u64,
    elements: Vec<Element>,
    index: HashMap<ElementId, usize>,
    categories: Vec<NamedEntity>,
    levels: Vec<LevelInfo>,
    phases: Vec<NamedEntity>,
    design_options: Vec<NamedEntity>,
    worksets: Vec<NamedEntity>,
    views: Vec<NamedEntity>,
    families: Vec<FamilyInfo>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> ElementId {
        self.next_id += 1;
        ElementId(self.next_id)
    }

    fn named(&mut self, name: &str) -> NamedEntity {
        NamedEntity {
            id: self.allocate(),
            name: name.to_string(),
        }
    }

    pub fn add_category(&mut self, name: &str) -> ElementId {
        let entity = self.named(name);
        let id = entity.id;
        self.categories.push(entity);
        id
    }

    pub fn add_level(&mut self, name: &str, elevation: f64) -> ElementId {
        let id = self.allocate();
        self.levels.push(LevelInfo {
            id,
            name: name.to_string(),
            elevation,
        });
        id
    }

    /// Phases are sequenced in insertion order.
    pub fn add_phase(&mut self, name: &str) -> ElementId {
        let entity = self.named(name);
        let id = entity.id;
        self.phases.push(entity);
        id
    }

    pub fn add_design_option(&mut self, name: &str) -> ElementId {
        let entity = self.named(name);
        let id = entity.id;
        self.design_options.push(entity);
        id
    }

    pub fn add_workset(&mut self, name: &str) -> ElementId {
        let entity = self.named(name);
        let id = entity.id;
        self.worksets.push(entity);
        id
    }

    pub fn add_view(&mut self, name: &str) -> ElementId {
        let entity = self.named(name);
        let id = entity.id;
        self.views.push(entity);
        id
    }

    pub fn add_family(&mut self, name: &str, is_in_place: bool) -> ElementId {
        let id = self.allocate();
        self.families.push(FamilyInfo {
            id,
            name: name.to_string(),
            is_in_place,
            type_ids: Vec::new(),
        });
        id
    }

    /// Add an element type, registering it with its family when given.
    pub fn add_type(&mut self, name: &str, family: Option<ElementId>) -> ElementId {
        let id = self.add_element(Element::new_type(name, family));
        if let Some(family) = family {
            if let Some(info) = self.families.iter_mut().find(|f| f.id == family) {
                info.type_ids.push(id);
            }
        }
        id
    }

    /// Add an element. Its `id` is overwritten with a freshly allocated one.
    pub fn add_element(&mut self, mut element: Element) -> ElementId {
        let id = self.allocate();
        element.id = id;
        self.index.insert(id, self.elements.len());
        self.elements.push(element);
        id
    }
}

impl ElementStore for MemoryStore {
    fn elements(&self) -> &[Element] {
        &self.elements
    }

    fn element(&self, id: ElementId) -> Option<&Element> {
        self.index.get(&id).map(|&i| &self.elements[i])
    }

    fn categories(&self) -> &[NamedEntity] {
        &self.categories
    }

    fn levels(&self) -> &[LevelInfo] {
        &self.levels
    }

    fn phases(&self) -> &[NamedEntity] {
        &self.phases
    }

    fn design_options(&self) -> &[NamedEntity] {
        &self.design_options
    }

    fn worksets(&self) -> &[NamedEntity] {
        &self.worksets
    }

    fn views(&self) -> &[NamedEntity] {
        &self.views
    }

    fn families(&self) -> &[FamilyInfo] {
        &self.families
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;

    /// Builds a [`MemoryStore`] and remembers ids by name.
    #[derive(Default)]
    pub struct StoreFixture {
        pub store: MemoryStore,
        ids: HashMap<String, ElementId>,
    }

    impl StoreFixture {
        pub fn new() -> Self {
            Self::default()
        }

        /// Id of the entity or element registered under `name`.
        pub fn id(&self, name: &str) -> ElementId {
            *self
                .ids
                .get(name)
                .unwrap_or_else(|| panic!("fixture has no entry named {name:?}"))
        }

        fn remember(mut self, name: &str, id: ElementId) -> Self {
            self.ids.insert(name.to_string(), id);
            self
        }

        pub fn with_category(mut self, name: &str) -> Self {
            let id = self.store.add_category(name);
            self.remember(name, id)
        }

        pub fn with_level(mut self, name: &str, elevation: f64) -> Self {
            let id = self.store.add_level(name, elevation);
            self.remember(name, id)
        }

        pub fn with_phase(mut self, name: &str) -> Self {
            let id = self.store.add_phase(name);
            self.remember(name, id)
        }

        pub fn with_design_option(mut self, name: &str) -> Self {
            let id = self.store.add_design_option(name);
            self.remember(name, id)
        }

        pub fn with_workset(mut self, name: &str) -> Self {
            let id = self.store.add_workset(name);
            self.remember(name, id)
        }

        pub fn with_view(mut self, name: &str) -> Self {
            let id = self.store.add_view(name);
            self.remember(name, id)
        }

        pub fn with_family(mut self, name: &str, is_in_place: bool) -> Self {
            let id = self.store.add_family(name, is_in_place);
            self.remember(name, id)
        }

        /// Adds a type under the family registered as `family`.
        pub fn with_type(mut self, name: &str, family: &str) -> Self {
            let family = self.id(family);
            let id = self.store.add_type(name, Some(family));
            self.remember(name, id)
        }

        /// Adds `element`, remembered under its name.
        pub fn with_element(mut self, element: Element) -> Self {
            let name = element.name.clone();
            let id = self.store.add_element(element);
            self.remember(&name, id)
        }
    }
}
