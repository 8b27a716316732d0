//! 字段类型继承
//!
//! 按拓扑序处理元素：先合并父元素的全部字段（同名字段类型必须一致），
//! 再应用自身字段。未写类型的字段沿父元素继承类型。

use std::collections::HashMap;

use indexmap::IndexMap;

use super::{ResolvedField, Schema, SchemaError};

/// 每个元素（按 `schema.elements` 下标）的完整字段表
pub fn resolve_fields(
    schema: &Schema,
    index: &HashMap<&str, usize>,
    order: &[usize],
) -> Result<Vec<Vec<ResolvedField>>, SchemaError> {
    let mut resolved: Vec<Vec<ResolvedField>> = vec![Vec::new(); schema.elements.len()];

    for &i in order {
        let element = &schema.elements[i];
        let mut fields: IndexMap<String, ResolvedField> = IndexMap::new();

        for parent in &element.parents {
            for field in &resolved[index[parent.as_str()]] {
                match fields.get(&field.name) {
                    Some(existing) if existing.ty != field.ty => {
                        return Err(SchemaError::ConflictingFieldType {
                            element: element.name.clone(),
                            field: field.name.clone(),
                            first: existing.ty.clone(),
                            second: field.ty.clone(),
                        });
                    }
                    Some(_) => {}
                    None => {
                        fields.insert(field.name.clone(), field.clone());
                    }
                }
            }
        }

        for field in &element.fields {
            match (&field.ty, fields.get_mut(&field.name)) {
                (Some(ty), Some(existing)) => {
                    existing.ty = ty.clone();
                    existing.nullable = field.nullable;
                }
                (Some(ty), None) => {
                    fields.insert(
                        field.name.clone(),
                        ResolvedField {
                            name: field.name.clone(),
                            ty: ty.clone(),
                            nullable: field.nullable,
                            declared_in: element.name.clone(),
                        },
                    );
                }
                (None, Some(existing)) => {
                    existing.nullable |= field.nullable;
                }
                (None, None) => {
                    return Err(SchemaError::MissingFieldType {
                        element: element.name.clone(),
                        field: field.name.clone(),
                    });
                }
            }
        }

        resolved[i] = fields.into_values().collect();
    }
    Ok(resolved)
}
