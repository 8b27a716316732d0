//! 节点 schema 模型
//!
//! 以声明式方式描述每种 IR 节点元素：字段（标量、子节点、子节点列表、符号引用）
//! 和父元素。[`resolve`] 为每个元素求出：
//!
//! 1. 存储种类：类（携带共享状态）或接口（纯契约），满足"单继承状态 + 多接口"；
//! 2. 每个字段的最终类型，未声明类型的字段沿父元素继承；
//! 3. 直接可遍历的子节点字段（不含父类遍历已覆盖的字段）。
//!
//! 种类求解编码为 2-SAT，见 [`kind_solver`]。

pub mod fields;
pub mod kind_solver;
pub mod tree;

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// 元素的存储种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageKind {
    /// 携带共享可变状态，只能单继承
    Class,
    /// 纯契约
    Interface,
}

impl fmt::Display for StorageKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            StorageKind::Class => write!(f, "class"),
            StorageKind::Interface => write!(f, "interface"),
        }
    }
}

/// 元素上的显式种类钉选
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ElementKind {
    #[default]
    None,
    Class,
    Interface,
}

impl ElementKind {
    pub fn pinned(&self) -> Option<StorageKind> {
        match self {
            ElementKind::None => None,
            ElementKind::Class => Some(StorageKind::Class),
            ElementKind::Interface => Some(StorageKind::Interface),
        }
    }
}

/// 字段类型
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    /// 标量（偏移、标志、名字、字面量）
    Scalar(String),
    /// 拥有的单个子节点
    Child(String),
    /// 拥有的子节点列表
    ChildList(String),
    /// 非拥有的符号引用
    Symbol(String),
    /// 符号引用列表
    SymbolList(String),
}

impl FieldType {
    /// 是否为拥有的子节点字段
    pub fn is_child(&self) -> bool {
        matches!(self, FieldType::Child(_) | FieldType::ChildList(_))
    }
}

/// 字段声明
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    /// `None` 表示沿父元素继承类型
    #[serde(default)]
    pub ty: Option<FieldType>,
    #[serde(default)]
    pub nullable: bool,
}

impl Field {
    pub fn new(
        name: &str,
        ty: FieldType,
    ) -> Self {
        Self {
            name: name.to_string(),
            ty: Some(ty),
            nullable: false,
        }
    }

    /// 可空字段
    pub fn optional(
        name: &str,
        ty: FieldType,
    ) -> Self {
        Self {
            nullable: true,
            ..Self::new(name, ty)
        }
    }

    /// 继承父元素类型的覆盖字段
    pub fn inherited(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ty: None,
            nullable: false,
        }
    }
}

/// 元素声明
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub name: String,
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default)]
    pub pin: ElementKind,
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl Element {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parents: Vec::new(),
            pin: ElementKind::None,
            fields: Vec::new(),
        }
    }

    pub fn parent(
        mut self,
        parent: &str,
    ) -> Self {
        self.parents.push(parent.to_string());
        self
    }

    pub fn pin(
        mut self,
        pin: ElementKind,
    ) -> Self {
        self.pin = pin;
        self
    }

    pub fn field(
        mut self,
        field: Field,
    ) -> Self {
        self.fields.push(field);
        self
    }
}

/// schema
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub elements: Vec<Element>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(
        mut self,
        element: Element,
    ) -> Self {
        self.elements.push(element);
        self
    }

    /// 从 RON 文本加载
    pub fn from_ron(text: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(text)
    }
}

/// schema 错误
///
/// 都是 schema 作者的错误，不可恢复。
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// 2-SAT 无解：单继承约束无法满足
    #[error("Cannot resolve class/interface kind of element '{element}': single inheritance of state is violated")]
    Unsatisfiable { element: String },

    /// 钉选与推导结果冲突
    #[error("Element '{element}' is pinned as {pinned} but must be {inferred}")]
    PinnedConflict {
        element: String,
        pinned: StorageKind,
        inferred: StorageKind,
    },

    /// 父元素不存在
    #[error("Element '{element}' has unknown parent '{parent}'")]
    UnknownParent { element: String, parent: String },

    /// 元素不存在
    #[error("Unknown element '{0}'")]
    UnknownElement(String),

    /// 重复的元素名
    #[error("Duplicate element '{0}'")]
    DuplicateElement(String),

    /// 继承关系成环
    #[error("Inheritance cycle through element '{element}'")]
    InheritanceCycle { element: String },

    /// 多个父元素给出了不同的字段类型
    #[error("Field '{field}' of element '{element}' inherits conflicting types {first:?} and {second:?}")]
    ConflictingFieldType {
        element: String,
        field: String,
        first: FieldType,
        second: FieldType,
    },

    /// 字段类型未声明且无法继承
    #[error("Field '{field}' of element '{element}' has no type and no parent declares it")]
    MissingFieldType { element: String, field: String },
}

/// 解析后的字段
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedField {
    pub name: String,
    pub ty: FieldType,
    pub nullable: bool,
    /// 最初声明该字段的元素
    pub declared_in: String,
}

/// 解析后的元素
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedElement {
    pub name: String,
    pub kind: StorageKind,
    pub parents: Vec<String>,
    /// 全部字段（继承的在前，按父元素顺序）
    pub fields: Vec<ResolvedField>,
    /// 全部可遍历子节点字段
    pub walkable_children: Vec<String>,
    /// 自身需要遍历的子节点字段（去掉父类已遍历的）
    pub direct_walkable_children: Vec<String>,
}

impl ResolvedElement {
    pub fn field(
        &self,
        name: &str,
    ) -> Option<&ResolvedField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// 唯一的类父元素
    pub fn class_parent<'a>(
        &self,
        schema: &'a ResolvedSchema,
    ) -> Option<&'a ResolvedElement> {
        self.parents
            .iter()
            .filter_map(|p| schema.element(p))
            .find(|p| p.kind == StorageKind::Class)
    }
}

/// 解析后的 schema，元素按拓扑序（父元素在前）排列
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedSchema {
    elements: Vec<ResolvedElement>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl ResolvedSchema {
    pub fn element(
        &self,
        name: &str,
    ) -> Option<&ResolvedElement> {
        self.index.get(name).map(|i| &self.elements[*i])
    }

    pub fn kind_of(
        &self,
        name: &str,
    ) -> Option<StorageKind> {
        self.element(name).map(|e| e.kind)
    }

    pub fn elements(&self) -> &[ResolvedElement] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// 文本摘要，每个元素一行
    pub fn format(&self) -> String {
        let mut out = String::new();
        for e in &self.elements {
            out.push_str(&format!(
                "{} {} : [{}] walk [{}]\n",
                e.kind,
                e.name,
                e.parents.join(", "),
                e.direct_walkable_children.join(", ")
            ));
        }
        out
    }
}

/// 按名字索引的元素表，并检查父元素存在
pub(crate) fn index_elements(schema: &Schema) -> Result<HashMap<&str, usize>, SchemaError> {
    let mut index = HashMap::with_capacity(schema.elements.len());
    for (i, e) in schema.elements.iter().enumerate() {
        if index.insert(e.name.as_str(), i).is_some() {
            return Err(SchemaError::DuplicateElement(e.name.clone()));
        }
    }
    for e in &schema.elements {
        for p in &e.parents {
            if !index.contains_key(p.as_str()) {
                return Err(SchemaError::UnknownParent {
                    element: e.name.clone(),
                    parent: p.clone(),
                });
            }
        }
    }
    Ok(index)
}

/// 拓扑序：父元素在前，同层保持声明顺序
pub(crate) fn topological_order(
    schema: &Schema,
    index: &HashMap<&str, usize>,
) -> Result<Vec<usize>, SchemaError> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        New,
        Active,
        Done,
    }

    let mut marks = vec![Mark::New; schema.elements.len()];
    let mut order = Vec::with_capacity(schema.elements.len());

    for start in 0..schema.elements.len() {
        if marks[start] != Mark::New {
            continue;
        }
        // (元素, 下一个待访问的父元素下标)
        let mut stack = vec![(start, 0usize)];
        marks[start] = Mark::Active;
        while let Some((current, next)) = stack.last().copied() {
            let parents = &schema.elements[current].parents;
            if next < parents.len() {
                if let Some(top) = stack.last_mut() {
                    top.1 += 1;
                }
                let p = index[parents[next].as_str()];
                match marks[p] {
                    Mark::New => {
                        marks[p] = Mark::Active;
                        stack.push((p, 0));
                    }
                    Mark::Active => {
                        return Err(SchemaError::InheritanceCycle {
                            element: schema.elements[p].name.clone(),
                        })
                    }
                    Mark::Done => {}
                }
            } else {
                marks[current] = Mark::Done;
                order.push(current);
                stack.pop();
            }
        }
    }
    Ok(order)
}

/// 解析 schema
pub fn resolve(schema: &Schema) -> Result<ResolvedSchema, SchemaError> {
    let index = index_elements(schema)?;
    let order = topological_order(schema, &index)?;
    let kinds = kind_solver::solve_kinds(schema, &index)?;
    let fields = fields::resolve_fields(schema, &index, &order)?;

    let mut elements: Vec<ResolvedElement> = Vec::with_capacity(order.len());
    let mut resolved_index = HashMap::with_capacity(order.len());
    for &i in &order {
        let element = &schema.elements[i];
        let all_fields = fields[i].clone();
        let walkable: Vec<String> = all_fields
            .iter()
            .filter(|f| f.ty.is_child())
            .map(|f| f.name.clone())
            .collect();

        // 唯一的类父元素已经遍历过的字段不再重复遍历
        let covered: Vec<String> = element
            .parents
            .iter()
            .map(|p| index[p.as_str()])
            .find(|p| kinds[*p] == StorageKind::Class)
            .and_then(|p| resolved_index.get(&schema.elements[p].name).copied())
            .map(|pos: usize| elements[pos].walkable_children.clone())
            .unwrap_or_default();
        let direct = walkable
            .iter()
            .filter(|f| !covered.contains(f))
            .cloned()
            .collect();

        resolved_index.insert(element.name.clone(), elements.len());
        elements.push(ResolvedElement {
            name: element.name.clone(),
            kind: kinds[i],
            parents: element.parents.clone(),
            fields: all_fields,
            walkable_children: walkable,
            direct_walkable_children: direct,
        });
    }

    let classes = elements
        .iter()
        .filter(|e| e.kind == StorageKind::Class)
        .count();
    debug!(
        "schema resolved: {} elements, {} classes, {} interfaces",
        elements.len(),
        classes,
        elements.len() - classes
    );

    Ok(ResolvedSchema {
        elements,
        index: resolved_index,
    })
}

#[cfg(test)]
mod tests;
