use mcfilter::schema::props::{ELEVATION, NAME};
use mcfilter::{
    compile, Category, Compiler, Condition, Element, ElementFilter, ElementId, ElementStore,
    EngineConfig, FilterError, FilterSpec, MemoryStore,
};

fn spec(category: Category, property: &str, condition: Condition, value: &str) -> FilterSpec {
    let mut spec = FilterSpec::new(category);
    spec.set_property(property);
    spec.set_condition(condition);
    spec.set_value(value);
    spec
}

fn selected(filter: &ElementFilter, store: &MemoryStore) -> Vec<String> {
    filter
        .select(store)
        .into_iter()
        .map(|e| e.name.clone())
        .collect()
}

/// Three levels with one element on each.
fn levels_store() -> (MemoryStore, [ElementId; 3]) {
    let mut store = MemoryStore::new();
    let levels = [
        store.add_level("Level 5", 5.0),
        store.add_level("Level 10", 10.0),
        store.add_level("Level 15", 15.0),
    ];
    for (level, name) in levels.iter().zip(["On 5", "On 10", "On 15"]) {
        store.add_element(Element::new(name).on_level(*level));
    }
    (store, levels)
}

/// Families with one type and one instance each.
fn families_store() -> MemoryStore {
    let mut store = MemoryStore::new();
    for family in ["Door-Single", "WINDOW-A", "door-double"] {
        let family_id = store.add_family(family, false);
        let type_id = store.add_type(&format!("{family} Type"), Some(family_id));
        store.add_element(Element::new(format!("{family} Instance")).of_type(type_id));
    }
    store
}

#[test]
fn test_level_elevation_greater_than() {
    let (store, _) = levels_store();
    let filter = compile(
        &spec(Category::Level, ELEVATION, Condition::GreaterThan, "10.0"),
        &store,
    )
    .unwrap();
    assert_eq!(selected(&filter, &store), vec!["On 15"]);
}

#[test]
fn test_family_contains_case_insensitive() {
    let store = families_store();
    let mut door = spec(Category::Family, NAME, Condition::Contains, "Door");
    door.set_case_insensitive(true);

    let filter = compile(&door, &store).unwrap();
    let names = selected(&filter, &store);

    assert_eq!(
        names,
        vec![
            "Door-Single Type",
            "Door-Single Instance",
            "door-double Type",
            "door-double Instance"
        ]
    );
    assert!(names.iter().all(|n| !n.contains("WINDOW")));
}

#[test]
fn test_no_match_is_never_not_unsupported() {
    let store = families_store();
    for category in [Category::Family, Category::Type, Category::Workset, Category::Level] {
        let filter = compile(
            &spec(category, NAME, Condition::Contains, "zzz_no_match"),
            &store,
        )
        .unwrap();
        assert!(filter.is_never(), "{category}");
        assert!(filter.select(&store).is_empty());
    }
}

#[test]
fn test_elevation_equality_tolerance() {
    let mut store = MemoryStore::new();
    let near = store.add_level("Near", 10.00004);
    let off = store.add_level("Off", 10.01);
    store.add_element(Element::new("Near element").on_level(near));
    store.add_element(Element::new("Off element").on_level(off));

    let filter = compile(
        &spec(Category::Level, ELEVATION, Condition::Equal, "10.0"),
        &store,
    )
    .unwrap();
    assert_eq!(selected(&filter, &store), vec!["Near element"]);
}

#[test]
fn test_equal_and_not_equal_are_complementary() {
    let (store, _) = levels_store();
    let cases = [
        (Category::Level, NAME, "Level 10"),
        (Category::Level, ELEVATION, "10"),
    ];
    for (category, property, value) in cases {
        for ci in [false, true] {
            let mut equal = spec(category, property, Condition::Equal, value);
            equal.set_case_insensitive(ci);
            let mut not_equal = spec(category, property, Condition::NotEqual, value);
            not_equal.set_case_insensitive(ci);

            let equal = compile(&equal, &store).unwrap();
            let not_equal = compile(&not_equal, &store).unwrap();
            for element in store.elements() {
                assert_ne!(
                    equal.matches(element),
                    not_equal.matches(element),
                    "{} on {property} = {value}",
                    element.name
                );
            }
        }
    }
}

#[test]
fn test_wildcard_case_tracks_contains() {
    let store = families_store();
    for ci in [false, true] {
        let mut contains = spec(Category::Family, NAME, Condition::Contains, "door");
        contains.set_case_insensitive(ci);
        let mut wildcard = spec(Category::Family, NAME, Condition::WildCard, "door");
        wildcard.set_case_insensitive(ci);

        let contains = compile(&contains, &store).unwrap();
        let wildcard = compile(&wildcard, &store).unwrap();
        assert_eq!(selected(&contains, &store), selected(&wildcard, &store), "ci={ci}");
    }
}

#[test]
fn test_compilation_is_deterministic() {
    let store = families_store();
    let mut door = spec(Category::Family, NAME, Condition::WildCard, "^[Dd]oor");
    door.set_case_insensitive(true);

    let first = compile(&door, &store).unwrap();
    let second = compile(&door, &store).unwrap();
    for element in store.elements() {
        assert_eq!(first.matches(element), second.matches(element));
    }
}

#[test]
fn test_unsupported_is_an_error_not_a_match_all() {
    let (store, _) = levels_store();
    let err = compile(&FilterSpec::new(Category::Room), &store).unwrap_err();
    assert!(matches!(err, FilterError::Unsupported { category: Category::Room, .. }));
}

#[test]
fn test_unparsable_number_fails_only_that_spec() {
    let (store, _) = levels_store();
    let err = compile(
        &spec(Category::Level, ELEVATION, Condition::LessThan, "ten"),
        &store,
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "Cannot read 'ten' as a number");

    let ok = compile(
        &spec(Category::Level, ELEVATION, Condition::LessThan, "10"),
        &store,
    )
    .unwrap();
    assert_eq!(selected(&ok, &store), vec!["On 5"]);
}

#[test]
fn test_tolerance_from_config() {
    let mut store = MemoryStore::new();
    let level = store.add_level("Slightly off", 10.004);
    store.add_element(Element::new("Slab").on_level(level));
    let equal = spec(Category::Level, ELEVATION, Condition::Equal, "10");

    assert!(compile(&equal, &store).unwrap().is_never());

    let config = EngineConfig {
        numeric_tolerance: 0.01,
        ..EngineConfig::default()
    };
    let filter = Compiler::with_config(&store, config).compile(&equal).unwrap();
    assert_eq!(selected(&filter, &store), vec!["Slab"]);
}

#[test]
fn test_turkish_locale_changes_substring_folding() {
    let mut store = MemoryStore::new();
    let workset = store.add_workset("KAPI");
    store.add_element(Element::new("Door").in_workset(workset));

    let mut contains = spec(Category::Workset, NAME, Condition::Contains, "kapi");
    contains.set_case_insensitive(true);
    let mut equal = spec(Category::Workset, NAME, Condition::Equal, "kapi");
    equal.set_case_insensitive(true);

    let turkish = EngineConfig {
        locale: "tr-TR".into(),
        ..EngineConfig::default()
    };
    let compiler = Compiler::with_config(&store, turkish);

    assert!(compiler.compile(&contains).unwrap().is_never());
    // Equality folds invariantly whatever the locale.
    assert_eq!(selected(&compiler.compile(&equal).unwrap(), &store), vec!["Door"]);
    assert_eq!(selected(&compile(&contains, &store).unwrap(), &store), vec!["Door"]);
}
