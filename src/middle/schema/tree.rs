//! IR 树自身的 schema
//!
//! 叶子元素与 [`NodeKind`](crate::middle::ir::NodeKind) 一一对应，
//! 其可遍历子节点字段与 `NodeKind::child_fields` 一致（由测试保证）。

use once_cell::sync::Lazy;

use super::{resolve, Element, ElementKind, Field, FieldType, ResolvedSchema, Schema, SchemaError};

fn scalar(
    name: &str,
    ty: &str,
) -> Field {
    Field::new(name, FieldType::Scalar(ty.to_string()))
}

fn child(
    name: &str,
    ty: &str,
) -> Field {
    Field::new(name, FieldType::Child(ty.to_string()))
}

fn optional_child(
    name: &str,
    ty: &str,
) -> Field {
    Field::optional(name, FieldType::Child(ty.to_string()))
}

fn children(
    name: &str,
    ty: &str,
) -> Field {
    Field::new(name, FieldType::ChildList(ty.to_string()))
}

fn symbol(name: &str) -> Field {
    Field::new(name, FieldType::Symbol("declaration".to_string()))
}

fn optional_symbol(name: &str) -> Field {
    Field::optional(name, FieldType::Symbol("declaration".to_string()))
}

fn symbols(name: &str) -> Field {
    Field::new(name, FieldType::SymbolList("declaration".to_string()))
}

fn element(
    name: &str,
    parents: &[&str],
) -> Element {
    parents
        .iter()
        .fold(Element::new(name), |e, p| e.parent(p))
}

/// 构造 IR 树 schema
pub fn ir_tree_schema() -> Schema {
    let member_access = ["member_access_expression"];
    let named_declaration = ["declaration_base", "declaration_with_name", "symbol_owner"];

    Schema::new()
        // 公共契约
        .with(
            element("element", &[])
                .field(scalar("start_offset", "i32"))
                .field(scalar("end_offset", "i32")),
        )
        .with(element("annotation_container", &[]).field(children("annotations", "constructor_call")))
        .with(element("symbol_owner", &[]).field(symbol("symbol")))
        .with(element("declaration_with_name", &[]).field(scalar("name", "String")))
        .with(element("declaration_container", &[]).field(children("declarations", "declaration_base")))
        .with(element("type_parameters_container", &[]).field(children("type_parameters", "type_parameter")))
        .with(element("statement_container", &[]).field(children("statements", "element")))
        .with(
            element("overridable_declaration", &["declaration_with_name", "symbol_owner"])
                .field(scalar("modality", "Modality"))
                .field(symbols("overridden_symbols"))
                .field(scalar("is_fake_override", "bool")),
        )
        // 模块与文件
        .with(
            element("module_fragment", &["element"])
                .pin(ElementKind::Class)
                .field(scalar("name", "String"))
                .field(children("files", "file")),
        )
        .with(
            element(
                "file",
                &["element", "annotation_container", "declaration_container", "symbol_owner"],
            )
            .pin(ElementKind::Class)
            .field(scalar("package", "String"))
            .field(scalar("path", "String")),
        )
        // 声明
        .with(
            element("declaration_base", &["element", "annotation_container"])
                .pin(ElementKind::Class)
                .field(scalar("origin", "DeclarationOrigin")),
        )
        .with(
            element(
                "class",
                &[
                    "declaration_base",
                    "declaration_with_name",
                    "symbol_owner",
                    "type_parameters_container",
                    "declaration_container",
                ],
            )
            .field(scalar("class_kind", "ClassKind"))
            .field(scalar("modality", "Modality"))
            .field(scalar("super_types", "Vec<IrType>"))
            .field(optional_symbol("instance_accessor")),
        )
        .with(
            element(
                "function_base",
                &[
                    "declaration_base",
                    "declaration_with_name",
                    "symbol_owner",
                    "type_parameters_container",
                ],
            )
            .field(optional_child("dispatch_receiver_parameter", "value_parameter"))
            .field(children("value_parameters", "value_parameter"))
            .field(optional_child("body", "body"))
            .field(scalar("return_type", "IrType")),
        )
        .with(
            element("simple_function", &["function_base", "overridable_declaration"])
                .field(optional_symbol("corresponding_property")),
        )
        .with(element("constructor", &["function_base"]).field(scalar("is_primary", "bool")))
        .with(
            element("property", &["declaration_base", "overridable_declaration"])
                .field(optional_child("backing_field", "field"))
                .field(optional_child("getter", "simple_function"))
                .field(optional_child("setter", "simple_function"))
                .field(scalar("is_var", "bool")),
        )
        .with(
            element("field", &named_declaration)
                .field(scalar("ty", "IrType"))
                .field(optional_child("initializer", "element"))
                .field(optional_symbol("corresponding_property")),
        )
        .with(
            element("type_parameter", &named_declaration)
                .field(scalar("index", "usize"))
                .field(scalar("super_types", "Vec<IrType>")),
        )
        .with(
            element("value_parameter", &named_declaration)
                .field(scalar("ty", "IrType"))
                .field(optional_child("default_value", "element")),
        )
        .with(
            element("enum_entry", &named_declaration)
                .field(optional_child("initializer_expression", "expression"))
                .field(optional_child("corresponding_class", "class")),
        )
        .with(
            element(
                "type_alias",
                &[
                    "declaration_base",
                    "declaration_with_name",
                    "symbol_owner",
                    "type_parameters_container",
                ],
            )
            .field(scalar("expanded_type", "IrType")),
        )
        .with(
            element("variable", &named_declaration)
                .field(scalar("ty", "IrType"))
                .field(optional_child("initializer", "expression")),
        )
        .with(
            element("anonymous_initializer", &["declaration_base", "symbol_owner"])
                .field(scalar("is_static", "bool"))
                .field(child("body", "block_body")),
        )
        .with(element("error_declaration", &["declaration_base"]).field(scalar("description", "String")))
        // 函数体
        .with(element("body", &["element"]).pin(ElementKind::Class))
        .with(element("block_body", &["body", "statement_container"]))
        .with(element("expression_body", &["body"]).field(child("expression", "expression")))
        .with(element("synthetic_body", &["body"]).field(scalar("kind", "SyntheticBodyKind")))
        // 表达式
        .with(
            element("expression", &["element"])
                .pin(ElementKind::Class)
                .field(scalar("ty", "IrType")),
        )
        .with(element("container_expression", &["expression", "statement_container"]))
        .with(element("block", &["container_expression"]))
        .with(element("composite", &["container_expression"]))
        .with(
            element("return", &["expression"])
                .field(child("value", "expression"))
                .field(symbol("target")),
        )
        .with(element("throw", &["expression"]).field(child("value", "expression")))
        .with(
            element("member_access_expression", &["expression"])
                .field(symbol("symbol"))
                .field(optional_child("dispatch_receiver", "expression"))
                .field(optional_child("extension_receiver", "expression"))
                .field(children("arguments", "expression"))
                .field(scalar("type_arguments", "Vec<IrType>"))
                .field(optional_symbol("super_qualifier")),
        )
        .with(element("call", &member_access))
        .with(element("constructor_call", &member_access))
        .with(element("delegating_constructor_call", &member_access))
        .with(element("enum_constructor_call", &member_access))
        .with(element("function_reference", &member_access))
        .with(
            element("property_reference", &member_access)
                .field(optional_symbol("getter"))
                .field(optional_symbol("setter"))
                .field(optional_symbol("field")),
        )
        .with(element("instance_initializer_call", &["expression"]).field(symbol("class_symbol")))
        .with(
            element("field_access_expression", &["expression"])
                .field(symbol("symbol"))
                .field(optional_child("receiver", "expression")),
        )
        .with(element("get_field", &["field_access_expression"]))
        .with(element("set_field", &["field_access_expression"]).field(child("value", "expression")))
        .with(element("value_access_expression", &["expression"]).field(symbol("symbol")))
        .with(element("get_value", &["value_access_expression"]))
        .with(element("set_value", &["value_access_expression"]).field(child("value", "expression")))
        .with(element("get_singleton_value", &["expression"]).field(symbol("symbol")))
        .with(element("get_object_value", &["get_singleton_value"]))
        .with(element("get_enum_value", &["get_singleton_value"]))
        .with(element("const", &["expression"]).field(scalar("value", "ConstValue")))
        .with(element("string_concatenation", &["expression"]).field(children("arguments", "expression")))
        .with(
            element("type_operator_call", &["expression"])
                .field(scalar("operator", "TypeOperator"))
                .field(child("argument", "expression"))
                .field(scalar("type_operand", "IrType")),
        )
        .with(element("when", &["expression"]).field(children("branches", "branch")))
        .with(
            element("loop", &["expression"])
                .field(scalar("label", "Option<String>"))
                .field(child("condition", "expression"))
                .field(optional_child("body", "expression")),
        )
        .with(element("while_loop", &["loop"]))
        .with(element("do_while_loop", &["loop"]))
        .with(element("break_continue", &["expression"]).field(scalar("label", "Option<String>")))
        .with(element("break", &["break_continue"]))
        .with(element("continue", &["break_continue"]))
        .with(
            element("try", &["expression"])
                .field(child("try_result", "expression"))
                .field(children("catches", "catch"))
                .field(optional_child("finally_expression", "expression")),
        )
        .with(
            element("vararg", &["expression"])
                .field(scalar("element_type", "IrType"))
                .field(children("elements", "element")),
        )
        .with(element("function_expression", &["expression"]).field(child("function", "simple_function")))
        .with(
            element("class_reference", &["expression"])
                .field(symbol("symbol"))
                .field(scalar("class_type", "IrType")),
        )
        .with(element("raw_function_reference", &["expression"]).field(symbol("symbol")))
        .with(element("error_expression", &["expression"]).field(scalar("description", "String")))
        .with(
            element("error_call_expression", &["error_expression"])
                .field(optional_child("explicit_receiver", "expression"))
                .field(children("arguments", "expression")),
        )
        // 分支、catch、spread
        .with(
            element("branch", &["element"])
                .pin(ElementKind::Class)
                .field(child("condition", "expression"))
                .field(child("result", "expression")),
        )
        .with(element("else_branch", &["branch"]))
        .with(
            element("catch", &["element"])
                .pin(ElementKind::Class)
                .field(child("catch_parameter", "variable"))
                .field(child("result", "expression")),
        )
        .with(
            element("spread_element", &["element"])
                .pin(ElementKind::Class)
                .field(child("expression", "expression")),
        )
}

static IR_TREE_SCHEMA: Lazy<Result<ResolvedSchema, SchemaError>> =
    Lazy::new(|| resolve(&ir_tree_schema()));

/// 解析后的 IR 树 schema（只解析一次）
pub fn resolved_ir_tree_schema() -> Result<&'static ResolvedSchema, SchemaError> {
    IR_TREE_SCHEMA.as_ref().map_err(Clone::clone)
}
