//! IR 树 schema 与节点子表一致性测试

use crate::middle::ir::NodeKind;
use crate::middle::schema::tree::{ir_tree_schema, resolved_ir_tree_schema};
use crate::middle::schema::*;

#[test]
fn test_ir_tree_schema_resolves() {
    let resolved = resolved_ir_tree_schema().unwrap();
    assert_eq!(resolved.kind_of("element"), Some(StorageKind::Interface));
    assert_eq!(resolved.kind_of("declaration_base"), Some(StorageKind::Class));
    assert_eq!(resolved.kind_of("class"), Some(StorageKind::Class));
    assert_eq!(resolved.kind_of("declaration_container"), Some(StorageKind::Interface));
    assert_eq!(resolved.kind_of("overridable_declaration"), Some(StorageKind::Interface));
    assert_eq!(resolved.kind_of("call"), Some(StorageKind::Class));
}

#[test]
fn test_node_kinds_match_schema_children() {
    let resolved = resolved_ir_tree_schema().unwrap();
    for kind in NodeKind::ALL {
        let element = resolved
            .element(kind.schema_name())
            .unwrap_or_else(|| panic!("missing element {}", kind.schema_name()));
        assert_eq!(
            element.walkable_children,
            kind.child_fields().to_vec(),
            "child table mismatch for {:?}",
            kind
        );
    }
}

#[test]
fn test_every_node_kind_is_class_like() {
    let resolved = resolved_ir_tree_schema().unwrap();
    for kind in NodeKind::ALL {
        assert_eq!(
            resolved.kind_of(kind.schema_name()),
            Some(StorageKind::Class),
            "{:?}",
            kind
        );
    }
}

#[test]
fn test_member_access_walk_is_inherited() {
    let resolved = resolve(&ir_tree_schema()).unwrap();
    let call = resolved.element("call").unwrap();
    assert!(call.direct_walkable_children.is_empty());
    let set_field = resolved.element("set_field").unwrap();
    assert_eq!(set_field.direct_walkable_children, vec!["value"]);
}

#[test]
fn test_format_lists_every_element() {
    let resolved = resolved_ir_tree_schema().unwrap();
    let text = resolved.format();
    assert_eq!(text.lines().count(), resolved.len());
    assert!(text.contains("class simple_function : [function_base, overridable_declaration]"));
}
