//! 种类求解测试

use quickcheck::{quickcheck, Arbitrary, Gen, TestResult};

use crate::middle::schema::kind_solver::ImplicationGraph;
use crate::middle::schema::*;

#[test]
fn test_pinned_class_does_not_force_parent() {
    let schema = Schema::new()
        .with(Element::new("A"))
        .with(Element::new("B").parent("A"))
        .with(Element::new("C").parent("A").pin(ElementKind::Class));
    let resolved = resolve(&schema).unwrap();
    assert_eq!(resolved.kind_of("A"), Some(StorageKind::Interface));
    assert_eq!(resolved.kind_of("B"), Some(StorageKind::Interface));
    assert_eq!(resolved.kind_of("C"), Some(StorageKind::Class));
}

#[test]
fn test_class_pin_propagates_to_descendants() {
    let schema = Schema::new()
        .with(Element::new("Base").pin(ElementKind::Class))
        .with(Element::new("Mid").parent("Base"))
        .with(Element::new("Leaf").parent("Mid"));
    let resolved = resolve(&schema).unwrap();
    assert_eq!(resolved.kind_of("Mid"), Some(StorageKind::Class));
    assert_eq!(resolved.kind_of("Leaf"), Some(StorageKind::Class));
}

#[test]
fn test_interface_pin_propagates_to_ancestors() {
    let schema = Schema::new()
        .with(Element::new("Root"))
        .with(Element::new("Mid").parent("Root"))
        .with(Element::new("Leaf").parent("Mid").pin(ElementKind::Interface));
    let resolved = resolve(&schema).unwrap();
    for name in ["Root", "Mid", "Leaf"] {
        assert_eq!(resolved.kind_of(name), Some(StorageKind::Interface));
    }
}

#[test]
fn test_interface_under_class_conflicts() {
    let schema = Schema::new()
        .with(Element::new("Base").pin(ElementKind::Class))
        .with(Element::new("Leaf").parent("Base").pin(ElementKind::Interface));
    match resolve(&schema) {
        Err(SchemaError::PinnedConflict { element, .. }) => {
            assert!(element == "Leaf" || element == "Base")
        }
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn test_two_class_parents_unsatisfiable() {
    let schema = Schema::new()
        .with(Element::new("X").pin(ElementKind::Class))
        .with(Element::new("Y").pin(ElementKind::Class))
        .with(Element::new("Z").parent("X").parent("Y"));
    assert!(matches!(
        resolve(&schema),
        Err(SchemaError::Unsatisfiable { .. })
    ));
}

#[test]
fn test_mutual_exclusion_picks_one_class_parent() {
    let schema = Schema::new()
        .with(Element::new("X"))
        .with(Element::new("Y"))
        .with(Element::new("Z").parent("X").parent("Y"))
        .with(Element::new("W").parent("X").pin(ElementKind::Class));
    let resolved = resolve(&schema).unwrap();
    assert_eq!(resolved.kind_of("X"), Some(StorageKind::Interface));
    assert_eq!(resolved.kind_of("Y"), Some(StorageKind::Interface));
}

#[test]
fn test_unknown_parent_and_cycle() {
    let schema = Schema::new().with(Element::new("A").parent("Missing"));
    assert_eq!(
        resolve(&schema).unwrap_err(),
        SchemaError::UnknownParent {
            element: "A".to_string(),
            parent: "Missing".to_string(),
        }
    );

    let schema = Schema::new()
        .with(Element::new("A").parent("B"))
        .with(Element::new("B").parent("A"));
    assert!(matches!(
        resolve(&schema),
        Err(SchemaError::InheritanceCycle { .. })
    ));
}

#[test]
fn test_graph_detects_contradiction() {
    // x → ¬x 且 ¬x → x
    let mut graph = ImplicationGraph::new(1);
    graph.imply(0, true, 0, false);
    graph.imply(0, false, 0, true);
    assert_eq!(graph.solve(), Err(0));
}

#[test]
fn test_topological_order() {
    let schema = Schema::new()
        .with(Element::new("Leaf").parent("Mid"))
        .with(Element::new("Mid").parent("Root"))
        .with(Element::new("Root"));
    let resolved = resolve(&schema).unwrap();
    let names: Vec<&str> = resolved.elements().iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["Root", "Mid", "Leaf"]);
}

/// 随机父关系 DAG（父元素下标总小于自身）
#[derive(Debug, Clone)]
struct RandomDag {
    parents: Vec<Vec<usize>>,
    pins: Vec<ElementKind>,
}

impl Arbitrary for RandomDag {
    fn arbitrary(g: &mut Gen) -> Self {
        let n = usize::arbitrary(g) % 12 + 1;
        let mut parents = Vec::with_capacity(n);
        let mut pins = Vec::with_capacity(n);
        for i in 0..n {
            let mut ps = Vec::new();
            if i > 0 {
                for _ in 0..(usize::arbitrary(g) % 3) {
                    let p = usize::arbitrary(g) % i;
                    if !ps.contains(&p) {
                        ps.push(p);
                    }
                }
            }
            parents.push(ps);
            pins.push(match u8::arbitrary(g) % 6 {
                0 => ElementKind::Class,
                1 => ElementKind::Interface,
                _ => ElementKind::None,
            });
        }
        RandomDag { parents, pins }
    }
}

impl RandomDag {
    fn schema(
        &self,
        with_pins: bool,
    ) -> Schema {
        let mut schema = Schema::new();
        for (i, ps) in self.parents.iter().enumerate() {
            let mut e = Element::new(&format!("E{}", i));
            for p in ps {
                e = e.parent(&format!("E{}", p));
            }
            if with_pins {
                e = e.pin(self.pins[i]);
            }
            schema = schema.with(e);
        }
        schema
    }
}

fn prop_resolution_is_consistent(dag: RandomDag) -> TestResult {
    let schema = dag.schema(true);
    let resolved = match resolve(&schema) {
        Ok(r) => r,
        Err(SchemaError::Unsatisfiable { .. }) | Err(SchemaError::PinnedConflict { .. }) => {
            return TestResult::discard()
        }
        Err(e) => return TestResult::error(e.to_string()),
    };
    for element in &schema.elements {
        let kind = resolved.kind_of(&element.name);
        if let Some(pinned) = element.pin.pinned() {
            if kind != Some(pinned) {
                return TestResult::failed();
            }
        }
        let class_parents = element
            .parents
            .iter()
            .filter(|p| resolved.kind_of(p) == Some(StorageKind::Class))
            .count();
        if class_parents > 1 {
            return TestResult::failed();
        }
        if class_parents == 1 && kind != Some(StorageKind::Class) {
            return TestResult::failed();
        }
    }
    TestResult::passed()
}

fn prop_unpinned_is_all_interface(dag: RandomDag) -> bool {
    match resolve(&dag.schema(false)) {
        Ok(resolved) => resolved
            .elements()
            .iter()
            .all(|e| e.kind == StorageKind::Interface),
        Err(_) => false,
    }
}

#[test]
fn quickcheck_resolution_is_consistent() {
    quickcheck(prop_resolution_is_consistent as fn(RandomDag) -> TestResult);
}

#[test]
fn quickcheck_unpinned_is_all_interface() {
    quickcheck(prop_unpinned_is_all_interface as fn(RandomDag) -> bool);
}
