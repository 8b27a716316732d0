//! IR 节点数据
//!
//! 每个节点 = 公共基础记录 [`NodeBase`] + 按种类区分的 [`NodeData`]。
//! 深层继承层次被扁平化为 tagged variant：共享字段放进基础记录或
//! [`DeclarationInfo`]，跨种类的字段访问通过 [`traits`](super::traits) 中的能力 trait 完成。

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::ids::{NodeId, SymbolId};
use super::kind::NodeKind;
use super::types::{
    ClassKind, ConstValue, DeclarationOrigin, IrType, Modality, SyntheticBodyKind, TypeOperator,
    Visibility,
};

/// 未知源码位置
pub const UNDEFINED_OFFSET: i32 = -1;

/// 子节点列表
pub type Children = SmallVec<[NodeId; 4]>;

/// 引用符号列表
pub type References = SmallVec<[SymbolId; 2]>;

/// 节点
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub base: NodeBase,
    pub data: NodeData,
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }
}

/// 所有节点共享的基础记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeBase {
    pub start_offset: i32,
    pub end_offset: i32,
    pub origin: DeclarationOrigin,
    /// 拥有者；由 arena 在挂接/摘除时同步维护
    #[serde(default)]
    pub parent: Option<NodeId>,
}

impl Default for NodeBase {
    fn default() -> Self {
        Self {
            start_offset: UNDEFINED_OFFSET,
            end_offset: UNDEFINED_OFFSET,
            origin: DeclarationOrigin::Defined,
            parent: None,
        }
    }
}

impl NodeBase {
    pub fn with_origin(origin: DeclarationOrigin) -> Self {
        Self {
            origin,
            ..Self::default()
        }
    }
}

/// 声明标志
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeclarationFlags {
    /// 对外导出
    pub exported: bool,
    /// 外部声明（由宿主平台提供实现）
    pub external: bool,
    /// 要求启动时立即初始化
    pub eager_initialization: bool,
    pub is_const: bool,
    pub is_inline: bool,
}

/// 声明的公共记录
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DeclarationInfo {
    pub name: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub flags: DeclarationFlags,
    /// 注解（拥有的构造器调用表达式）
    #[serde(default)]
    pub annotations: Vec<NodeId>,
}

impl DeclarationInfo {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleFragmentData {
    pub name: String,
    pub files: Vec<NodeId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileData {
    pub symbol: SymbolId,
    pub package: String,
    pub path: String,
    pub annotations: Vec<NodeId>,
    pub declarations: Vec<NodeId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDecl {
    pub info: DeclarationInfo,
    pub symbol: SymbolId,
    pub class_kind: ClassKind,
    pub modality: Modality,
    /// 内联值类
    pub is_value: bool,
    pub super_types: Vec<IrType>,
    pub type_parameters: Vec<NodeId>,
    pub declarations: Vec<NodeId>,
    /// 单例对象的实例获取函数
    pub instance_accessor: Option<SymbolId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub info: DeclarationInfo,
    pub symbol: SymbolId,
    pub modality: Modality,
    pub type_parameters: Vec<NodeId>,
    pub dispatch_receiver_parameter: Option<NodeId>,
    pub value_parameters: Vec<NodeId>,
    pub return_type: IrType,
    pub body: Option<NodeId>,
    pub overridden_symbols: Vec<SymbolId>,
    pub is_fake_override: bool,
    pub corresponding_property: Option<SymbolId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstructorDecl {
    pub info: DeclarationInfo,
    pub symbol: SymbolId,
    pub is_primary: bool,
    pub type_parameters: Vec<NodeId>,
    pub dispatch_receiver_parameter: Option<NodeId>,
    pub value_parameters: Vec<NodeId>,
    pub return_type: IrType,
    pub body: Option<NodeId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyDecl {
    pub info: DeclarationInfo,
    pub symbol: SymbolId,
    pub modality: Modality,
    pub is_var: bool,
    pub backing_field: Option<NodeId>,
    pub getter: Option<NodeId>,
    pub setter: Option<NodeId>,
    pub overridden_symbols: Vec<SymbolId>,
    pub is_fake_override: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDecl {
    pub info: DeclarationInfo,
    pub symbol: SymbolId,
    pub ty: IrType,
    pub is_static: bool,
    pub is_final: bool,
    pub initializer: Option<NodeId>,
    pub corresponding_property: Option<SymbolId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeParameterDecl {
    pub info: DeclarationInfo,
    pub symbol: SymbolId,
    pub index: usize,
    pub super_types: Vec<IrType>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueParameterDecl {
    pub info: DeclarationInfo,
    pub symbol: SymbolId,
    pub index: usize,
    pub ty: IrType,
    pub default_value: Option<NodeId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumEntryDecl {
    pub info: DeclarationInfo,
    pub symbol: SymbolId,
    pub initializer_expression: Option<NodeId>,
    pub corresponding_class: Option<NodeId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeAliasDecl {
    pub info: DeclarationInfo,
    pub symbol: SymbolId,
    pub type_parameters: Vec<NodeId>,
    pub expanded_type: IrType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableDecl {
    pub info: DeclarationInfo,
    pub symbol: SymbolId,
    pub ty: IrType,
    pub is_var: bool,
    pub initializer: Option<NodeId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnonymousInitializerDecl {
    pub info: DeclarationInfo,
    pub symbol: SymbolId,
    pub is_static: bool,
    pub body: NodeId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDeclarationData {
    pub info: DeclarationInfo,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementList {
    pub statements: Vec<NodeId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpressionBodyData {
    pub expression: NodeId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntheticBodyData {
    pub kind: SyntheticBodyKind,
}

/// Block / Composite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerExpression {
    pub ty: IrType,
    pub statements: Vec<NodeId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnExpr {
    pub ty: IrType,
    /// 返回目标函数
    pub target: SymbolId,
    pub value: NodeId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThrowExpr {
    pub ty: IrType,
    pub value: NodeId,
}

/// 成员访问：调用、构造器调用、函数引用共享的形状
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberAccess {
    pub ty: IrType,
    pub symbol: SymbolId,
    pub dispatch_receiver: Option<NodeId>,
    pub extension_receiver: Option<NodeId>,
    pub arguments: Vec<NodeId>,
    pub type_arguments: Vec<IrType>,
    /// `super.f()` 形式的限定类
    pub super_qualifier: Option<SymbolId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyReferenceExpr {
    pub access: MemberAccess,
    pub getter: Option<SymbolId>,
    pub setter: Option<SymbolId>,
    pub field: Option<SymbolId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceInitializerCallExpr {
    pub ty: IrType,
    pub class_symbol: SymbolId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetFieldExpr {
    pub ty: IrType,
    pub symbol: SymbolId,
    pub receiver: Option<NodeId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetFieldExpr {
    pub ty: IrType,
    pub symbol: SymbolId,
    pub receiver: Option<NodeId>,
    pub value: NodeId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetValueExpr {
    pub ty: IrType,
    pub symbol: SymbolId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetValueExpr {
    pub ty: IrType,
    pub symbol: SymbolId,
    pub value: NodeId,
}

/// GetObjectValue / GetEnumValue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SingletonValueExpr {
    pub ty: IrType,
    pub symbol: SymbolId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstExpr {
    pub ty: IrType,
    pub value: ConstValue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StringConcatenationExpr {
    pub ty: IrType,
    pub arguments: Vec<NodeId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeOperatorCallExpr {
    pub ty: IrType,
    pub operator: TypeOperator,
    pub argument: NodeId,
    pub type_operand: IrType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhenExpr {
    pub ty: IrType,
    pub branches: Vec<NodeId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchData {
    pub condition: NodeId,
    pub result: NodeId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopExpr {
    pub ty: IrType,
    pub label: Option<String>,
    pub condition: NodeId,
    pub body: Option<NodeId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JumpExpr {
    pub ty: IrType,
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TryExpr {
    pub ty: IrType,
    pub try_result: NodeId,
    pub catches: Vec<NodeId>,
    pub finally_expression: Option<NodeId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatchData {
    pub catch_parameter: NodeId,
    pub result: NodeId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarargExpr {
    pub ty: IrType,
    pub element_type: IrType,
    pub elements: Vec<NodeId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpreadElementData {
    pub expression: NodeId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionExpressionData {
    pub ty: IrType,
    pub function: NodeId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassReferenceExpr {
    pub ty: IrType,
    pub symbol: SymbolId,
    pub class_type: IrType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawFunctionReferenceExpr {
    pub ty: IrType,
    pub symbol: SymbolId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorExpressionData {
    pub ty: IrType,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorCallExpressionData {
    pub ty: IrType,
    pub description: String,
    pub explicit_receiver: Option<NodeId>,
    pub arguments: Vec<NodeId>,
}

/// 按种类区分的节点数据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NodeData {
    ModuleFragment(ModuleFragmentData),
    File(FileData),

    Class(ClassDecl),
    SimpleFunction(FunctionDecl),
    Constructor(ConstructorDecl),
    Property(PropertyDecl),
    Field(FieldDecl),
    TypeParameter(TypeParameterDecl),
    ValueParameter(ValueParameterDecl),
    EnumEntry(EnumEntryDecl),
    TypeAlias(TypeAliasDecl),
    Variable(VariableDecl),
    AnonymousInitializer(AnonymousInitializerDecl),
    ErrorDeclaration(ErrorDeclarationData),

    BlockBody(StatementList),
    ExpressionBody(ExpressionBodyData),
    SyntheticBody(SyntheticBodyData),

    Block(ContainerExpression),
    Composite(ContainerExpression),
    Return(ReturnExpr),
    Throw(ThrowExpr),
    Call(MemberAccess),
    ConstructorCall(MemberAccess),
    DelegatingConstructorCall(MemberAccess),
    EnumConstructorCall(MemberAccess),
    InstanceInitializerCall(InstanceInitializerCallExpr),
    GetField(GetFieldExpr),
    SetField(SetFieldExpr),
    GetValue(GetValueExpr),
    SetValue(SetValueExpr),
    GetObjectValue(SingletonValueExpr),
    GetEnumValue(SingletonValueExpr),
    Const(ConstExpr),
    StringConcatenation(StringConcatenationExpr),
    TypeOperatorCall(TypeOperatorCallExpr),
    When(WhenExpr),
    WhileLoop(LoopExpr),
    DoWhileLoop(LoopExpr),
    Break(JumpExpr),
    Continue(JumpExpr),
    Try(TryExpr),
    Vararg(VarargExpr),
    FunctionReference(MemberAccess),
    PropertyReference(PropertyReferenceExpr),
    FunctionExpression(FunctionExpressionData),
    ClassReference(ClassReferenceExpr),
    RawFunctionReference(RawFunctionReferenceExpr),
    ErrorExpression(ErrorExpressionData),
    ErrorCallExpression(ErrorCallExpressionData),

    Branch(BranchData),
    ElseBranch(BranchData),
    Catch(CatchData),
    SpreadElement(SpreadElementData),
}

fn push_opt(
    out: &mut Children,
    slot: &Option<NodeId>,
) {
    if let Some(id) = slot {
        out.push(*id);
    }
}

fn access_children(
    out: &mut Children,
    access: &MemberAccess,
) {
    push_opt(out, &access.dispatch_receiver);
    push_opt(out, &access.extension_receiver);
    out.extend(access.arguments.iter().copied());
}

fn access_children_mut(
    access: &mut MemberAccess,
    f: &mut dyn FnMut(&mut NodeId),
) {
    if let Some(id) = access.dispatch_receiver.as_mut() {
        f(id);
    }
    if let Some(id) = access.extension_receiver.as_mut() {
        f(id);
    }
    access.arguments.iter_mut().for_each(|id| f(id));
}

fn remove_from(
    list: &mut Vec<NodeId>,
    child: NodeId,
) -> bool {
    let before = list.len();
    list.retain(|id| *id != child);
    list.len() != before
}

fn clear_slot(
    slot: &mut Option<NodeId>,
    child: NodeId,
) -> bool {
    if *slot == Some(child) {
        *slot = None;
        true
    } else {
        false
    }
}

impl NodeData {
    /// 种类标签
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeData::ModuleFragment(_) => NodeKind::ModuleFragment,
            NodeData::File(_) => NodeKind::File,
            NodeData::Class(_) => NodeKind::Class,
            NodeData::SimpleFunction(_) => NodeKind::SimpleFunction,
            NodeData::Constructor(_) => NodeKind::Constructor,
            NodeData::Property(_) => NodeKind::Property,
            NodeData::Field(_) => NodeKind::Field,
            NodeData::TypeParameter(_) => NodeKind::TypeParameter,
            NodeData::ValueParameter(_) => NodeKind::ValueParameter,
            NodeData::EnumEntry(_) => NodeKind::EnumEntry,
            NodeData::TypeAlias(_) => NodeKind::TypeAlias,
            NodeData::Variable(_) => NodeKind::Variable,
            NodeData::AnonymousInitializer(_) => NodeKind::AnonymousInitializer,
            NodeData::ErrorDeclaration(_) => NodeKind::ErrorDeclaration,
            NodeData::BlockBody(_) => NodeKind::BlockBody,
            NodeData::ExpressionBody(_) => NodeKind::ExpressionBody,
            NodeData::SyntheticBody(_) => NodeKind::SyntheticBody,
            NodeData::Block(_) => NodeKind::Block,
            NodeData::Composite(_) => NodeKind::Composite,
            NodeData::Return(_) => NodeKind::Return,
            NodeData::Throw(_) => NodeKind::Throw,
            NodeData::Call(_) => NodeKind::Call,
            NodeData::ConstructorCall(_) => NodeKind::ConstructorCall,
            NodeData::DelegatingConstructorCall(_) => NodeKind::DelegatingConstructorCall,
            NodeData::EnumConstructorCall(_) => NodeKind::EnumConstructorCall,
            NodeData::InstanceInitializerCall(_) => NodeKind::InstanceInitializerCall,
            NodeData::GetField(_) => NodeKind::GetField,
            NodeData::SetField(_) => NodeKind::SetField,
            NodeData::GetValue(_) => NodeKind::GetValue,
            NodeData::SetValue(_) => NodeKind::SetValue,
            NodeData::GetObjectValue(_) => NodeKind::GetObjectValue,
            NodeData::GetEnumValue(_) => NodeKind::GetEnumValue,
            NodeData::Const(_) => NodeKind::Const,
            NodeData::StringConcatenation(_) => NodeKind::StringConcatenation,
            NodeData::TypeOperatorCall(_) => NodeKind::TypeOperatorCall,
            NodeData::When(_) => NodeKind::When,
            NodeData::WhileLoop(_) => NodeKind::WhileLoop,
            NodeData::DoWhileLoop(_) => NodeKind::DoWhileLoop,
            NodeData::Break(_) => NodeKind::Break,
            NodeData::Continue(_) => NodeKind::Continue,
            NodeData::Try(_) => NodeKind::Try,
            NodeData::Vararg(_) => NodeKind::Vararg,
            NodeData::FunctionReference(_) => NodeKind::FunctionReference,
            NodeData::PropertyReference(_) => NodeKind::PropertyReference,
            NodeData::FunctionExpression(_) => NodeKind::FunctionExpression,
            NodeData::ClassReference(_) => NodeKind::ClassReference,
            NodeData::RawFunctionReference(_) => NodeKind::RawFunctionReference,
            NodeData::ErrorExpression(_) => NodeKind::ErrorExpression,
            NodeData::ErrorCallExpression(_) => NodeKind::ErrorCallExpression,
            NodeData::Branch(_) => NodeKind::Branch,
            NodeData::ElseBranch(_) => NodeKind::ElseBranch,
            NodeData::Catch(_) => NodeKind::Catch,
            NodeData::SpreadElement(_) => NodeKind::SpreadElement,
        }
    }

    /// 拥有的子节点，顺序与 [`NodeKind::child_fields`] 一致
    pub fn children(&self) -> Children {
        let mut out = Children::new();
        match self {
            NodeData::ModuleFragment(m) => out.extend(m.files.iter().copied()),
            NodeData::File(f) => {
                out.extend(f.annotations.iter().copied());
                out.extend(f.declarations.iter().copied());
            }
            NodeData::Class(c) => {
                out.extend(c.info.annotations.iter().copied());
                out.extend(c.type_parameters.iter().copied());
                out.extend(c.declarations.iter().copied());
            }
            NodeData::SimpleFunction(f) => {
                out.extend(f.info.annotations.iter().copied());
                out.extend(f.type_parameters.iter().copied());
                push_opt(&mut out, &f.dispatch_receiver_parameter);
                out.extend(f.value_parameters.iter().copied());
                push_opt(&mut out, &f.body);
            }
            NodeData::Constructor(c) => {
                out.extend(c.info.annotations.iter().copied());
                out.extend(c.type_parameters.iter().copied());
                push_opt(&mut out, &c.dispatch_receiver_parameter);
                out.extend(c.value_parameters.iter().copied());
                push_opt(&mut out, &c.body);
            }
            NodeData::Property(p) => {
                out.extend(p.info.annotations.iter().copied());
                push_opt(&mut out, &p.backing_field);
                push_opt(&mut out, &p.getter);
                push_opt(&mut out, &p.setter);
            }
            NodeData::Field(f) => {
                out.extend(f.info.annotations.iter().copied());
                push_opt(&mut out, &f.initializer);
            }
            NodeData::TypeParameter(t) => out.extend(t.info.annotations.iter().copied()),
            NodeData::ValueParameter(v) => {
                out.extend(v.info.annotations.iter().copied());
                push_opt(&mut out, &v.default_value);
            }
            NodeData::EnumEntry(e) => {
                out.extend(e.info.annotations.iter().copied());
                push_opt(&mut out, &e.initializer_expression);
                push_opt(&mut out, &e.corresponding_class);
            }
            NodeData::TypeAlias(t) => {
                out.extend(t.info.annotations.iter().copied());
                out.extend(t.type_parameters.iter().copied());
            }
            NodeData::Variable(v) => {
                out.extend(v.info.annotations.iter().copied());
                push_opt(&mut out, &v.initializer);
            }
            NodeData::AnonymousInitializer(a) => {
                out.extend(a.info.annotations.iter().copied());
                out.push(a.body);
            }
            NodeData::ErrorDeclaration(e) => out.extend(e.info.annotations.iter().copied()),
            NodeData::BlockBody(b) => out.extend(b.statements.iter().copied()),
            NodeData::ExpressionBody(b) => out.push(b.expression),
            NodeData::SyntheticBody(_) => {}
            NodeData::Block(b) | NodeData::Composite(b) => out.extend(b.statements.iter().copied()),
            NodeData::Return(r) => out.push(r.value),
            NodeData::Throw(t) => out.push(t.value),
            NodeData::Call(a)
            | NodeData::ConstructorCall(a)
            | NodeData::DelegatingConstructorCall(a)
            | NodeData::EnumConstructorCall(a)
            | NodeData::FunctionReference(a) => access_children(&mut out, a),
            NodeData::PropertyReference(p) => access_children(&mut out, &p.access),
            NodeData::InstanceInitializerCall(_) => {}
            NodeData::GetField(g) => push_opt(&mut out, &g.receiver),
            NodeData::SetField(s) => {
                push_opt(&mut out, &s.receiver);
                out.push(s.value);
            }
            NodeData::GetValue(_) => {}
            NodeData::SetValue(s) => out.push(s.value),
            NodeData::GetObjectValue(_) | NodeData::GetEnumValue(_) => {}
            NodeData::Const(_) => {}
            NodeData::StringConcatenation(s) => out.extend(s.arguments.iter().copied()),
            NodeData::TypeOperatorCall(t) => out.push(t.argument),
            NodeData::When(w) => out.extend(w.branches.iter().copied()),
            NodeData::WhileLoop(l) | NodeData::DoWhileLoop(l) => {
                out.push(l.condition);
                push_opt(&mut out, &l.body);
            }
            NodeData::Break(_) | NodeData::Continue(_) => {}
            NodeData::Try(t) => {
                out.push(t.try_result);
                out.extend(t.catches.iter().copied());
                push_opt(&mut out, &t.finally_expression);
            }
            NodeData::Vararg(v) => out.extend(v.elements.iter().copied()),
            NodeData::FunctionExpression(f) => out.push(f.function),
            NodeData::ClassReference(_) | NodeData::RawFunctionReference(_) => {}
            NodeData::ErrorExpression(_) => {}
            NodeData::ErrorCallExpression(e) => {
                push_opt(&mut out, &e.explicit_receiver);
                out.extend(e.arguments.iter().copied());
            }
            NodeData::Branch(b) | NodeData::ElseBranch(b) => {
                out.push(b.condition);
                out.push(b.result);
            }
            NodeData::Catch(c) => {
                out.push(c.catch_parameter);
                out.push(c.result);
            }
            NodeData::SpreadElement(s) => out.push(s.expression),
        }
        out
    }

    /// 以可变方式逐个访问子节点槽位，顺序与 [`children`](Self::children) 一致
    pub fn for_each_child_mut(
        &mut self,
        f: &mut dyn FnMut(&mut NodeId),
    ) {
        fn opt(
            slot: &mut Option<NodeId>,
            f: &mut dyn FnMut(&mut NodeId),
        ) {
            if let Some(id) = slot.as_mut() {
                f(id);
            }
        }
        fn list(
            items: &mut [NodeId],
            f: &mut dyn FnMut(&mut NodeId),
        ) {
            items.iter_mut().for_each(|id| f(id));
        }

        match self {
            NodeData::ModuleFragment(m) => list(&mut m.files, f),
            NodeData::File(file) => {
                list(&mut file.annotations, f);
                list(&mut file.declarations, f);
            }
            NodeData::Class(c) => {
                list(&mut c.info.annotations, f);
                list(&mut c.type_parameters, f);
                list(&mut c.declarations, f);
            }
            NodeData::SimpleFunction(func) => {
                list(&mut func.info.annotations, f);
                list(&mut func.type_parameters, f);
                opt(&mut func.dispatch_receiver_parameter, f);
                list(&mut func.value_parameters, f);
                opt(&mut func.body, f);
            }
            NodeData::Constructor(c) => {
                list(&mut c.info.annotations, f);
                list(&mut c.type_parameters, f);
                opt(&mut c.dispatch_receiver_parameter, f);
                list(&mut c.value_parameters, f);
                opt(&mut c.body, f);
            }
            NodeData::Property(p) => {
                list(&mut p.info.annotations, f);
                opt(&mut p.backing_field, f);
                opt(&mut p.getter, f);
                opt(&mut p.setter, f);
            }
            NodeData::Field(field) => {
                list(&mut field.info.annotations, f);
                opt(&mut field.initializer, f);
            }
            NodeData::TypeParameter(t) => list(&mut t.info.annotations, f),
            NodeData::ValueParameter(v) => {
                list(&mut v.info.annotations, f);
                opt(&mut v.default_value, f);
            }
            NodeData::EnumEntry(e) => {
                list(&mut e.info.annotations, f);
                opt(&mut e.initializer_expression, f);
                opt(&mut e.corresponding_class, f);
            }
            NodeData::TypeAlias(t) => {
                list(&mut t.info.annotations, f);
                list(&mut t.type_parameters, f);
            }
            NodeData::Variable(v) => {
                list(&mut v.info.annotations, f);
                opt(&mut v.initializer, f);
            }
            NodeData::AnonymousInitializer(a) => {
                list(&mut a.info.annotations, f);
                f(&mut a.body);
            }
            NodeData::ErrorDeclaration(e) => list(&mut e.info.annotations, f),
            NodeData::BlockBody(b) => list(&mut b.statements, f),
            NodeData::ExpressionBody(b) => f(&mut b.expression),
            NodeData::SyntheticBody(_) => {}
            NodeData::Block(b) | NodeData::Composite(b) => list(&mut b.statements, f),
            NodeData::Return(r) => f(&mut r.value),
            NodeData::Throw(t) => f(&mut t.value),
            NodeData::Call(a)
            | NodeData::ConstructorCall(a)
            | NodeData::DelegatingConstructorCall(a)
            | NodeData::EnumConstructorCall(a)
            | NodeData::FunctionReference(a) => access_children_mut(a, f),
            NodeData::PropertyReference(p) => access_children_mut(&mut p.access, f),
            NodeData::InstanceInitializerCall(_) => {}
            NodeData::GetField(g) => opt(&mut g.receiver, f),
            NodeData::SetField(s) => {
                opt(&mut s.receiver, f);
                f(&mut s.value);
            }
            NodeData::GetValue(_) => {}
            NodeData::SetValue(s) => f(&mut s.value),
            NodeData::GetObjectValue(_) | NodeData::GetEnumValue(_) => {}
            NodeData::Const(_) => {}
            NodeData::StringConcatenation(s) => list(&mut s.arguments, f),
            NodeData::TypeOperatorCall(t) => f(&mut t.argument),
            NodeData::When(w) => list(&mut w.branches, f),
            NodeData::WhileLoop(l) | NodeData::DoWhileLoop(l) => {
                f(&mut l.condition);
                opt(&mut l.body, f);
            }
            NodeData::Break(_) | NodeData::Continue(_) => {}
            NodeData::Try(t) => {
                f(&mut t.try_result);
                list(&mut t.catches, f);
                opt(&mut t.finally_expression, f);
            }
            NodeData::Vararg(v) => list(&mut v.elements, f),
            NodeData::FunctionExpression(fe) => f(&mut fe.function),
            NodeData::ClassReference(_) | NodeData::RawFunctionReference(_) => {}
            NodeData::ErrorExpression(_) => {}
            NodeData::ErrorCallExpression(e) => {
                opt(&mut e.explicit_receiver, f);
                list(&mut e.arguments, f);
            }
            NodeData::Branch(b) | NodeData::ElseBranch(b) => {
                f(&mut b.condition);
                f(&mut b.result);
            }
            NodeData::Catch(c) => {
                f(&mut c.catch_parameter);
                f(&mut c.result);
            }
            NodeData::SpreadElement(s) => f(&mut s.expression),
        }
    }

    /// 摘除可选或列表中的子节点槽位
    ///
    /// 必填槽位（如 `SetField.value`）无法摘除，返回 `false`。
    pub fn detach_child(
        &mut self,
        child: NodeId,
    ) -> bool {
        match self {
            NodeData::ModuleFragment(m) => remove_from(&mut m.files, child),
            NodeData::File(f) => {
                remove_from(&mut f.annotations, child) || remove_from(&mut f.declarations, child)
            }
            NodeData::Class(c) => {
                remove_from(&mut c.info.annotations, child)
                    || remove_from(&mut c.type_parameters, child)
                    || remove_from(&mut c.declarations, child)
            }
            NodeData::SimpleFunction(f) => {
                remove_from(&mut f.info.annotations, child)
                    || remove_from(&mut f.type_parameters, child)
                    || clear_slot(&mut f.dispatch_receiver_parameter, child)
                    || remove_from(&mut f.value_parameters, child)
                    || clear_slot(&mut f.body, child)
            }
            NodeData::Constructor(c) => {
                remove_from(&mut c.info.annotations, child)
                    || remove_from(&mut c.type_parameters, child)
                    || clear_slot(&mut c.dispatch_receiver_parameter, child)
                    || remove_from(&mut c.value_parameters, child)
                    || clear_slot(&mut c.body, child)
            }
            NodeData::Property(p) => {
                remove_from(&mut p.info.annotations, child)
                    || clear_slot(&mut p.backing_field, child)
                    || clear_slot(&mut p.getter, child)
                    || clear_slot(&mut p.setter, child)
            }
            NodeData::Field(f) => {
                remove_from(&mut f.info.annotations, child) || clear_slot(&mut f.initializer, child)
            }
            NodeData::ValueParameter(v) => {
                remove_from(&mut v.info.annotations, child)
                    || clear_slot(&mut v.default_value, child)
            }
            NodeData::EnumEntry(e) => {
                remove_from(&mut e.info.annotations, child)
                    || clear_slot(&mut e.initializer_expression, child)
                    || clear_slot(&mut e.corresponding_class, child)
            }
            NodeData::Variable(v) => {
                remove_from(&mut v.info.annotations, child) || clear_slot(&mut v.initializer, child)
            }
            NodeData::BlockBody(b) => remove_from(&mut b.statements, child),
            NodeData::Block(b) | NodeData::Composite(b) => remove_from(&mut b.statements, child),
            NodeData::StringConcatenation(s) => remove_from(&mut s.arguments, child),
            NodeData::When(w) => remove_from(&mut w.branches, child),
            NodeData::Try(t) => {
                remove_from(&mut t.catches, child) || clear_slot(&mut t.finally_expression, child)
            }
            NodeData::Vararg(v) => remove_from(&mut v.elements, child),
            _ => match self.declaration_info_mut() {
                Some(info) => remove_from(&mut info.annotations, child),
                None => false,
            },
        }
    }

    /// 非拥有的声明引用（不含类型中的分类器）
    pub fn referenced_symbols(&self) -> References {
        let mut out = References::new();
        let access = |a: &MemberAccess, out: &mut References| {
            out.push(a.symbol);
            if let Some(q) = a.super_qualifier {
                out.push(q);
            }
        };
        match self {
            NodeData::Class(c) => out.extend(c.instance_accessor),
            NodeData::SimpleFunction(f) => {
                out.extend(f.overridden_symbols.iter().copied());
                out.extend(f.corresponding_property);
            }
            NodeData::Property(p) => out.extend(p.overridden_symbols.iter().copied()),
            NodeData::Field(f) => out.extend(f.corresponding_property),
            NodeData::Return(r) => out.push(r.target),
            NodeData::Call(a)
            | NodeData::ConstructorCall(a)
            | NodeData::DelegatingConstructorCall(a)
            | NodeData::EnumConstructorCall(a)
            | NodeData::FunctionReference(a) => access(a, &mut out),
            NodeData::PropertyReference(p) => {
                access(&p.access, &mut out);
                out.extend(p.getter);
                out.extend(p.setter);
                out.extend(p.field);
            }
            NodeData::InstanceInitializerCall(i) => out.push(i.class_symbol),
            NodeData::GetField(g) => out.push(g.symbol),
            NodeData::SetField(s) => out.push(s.symbol),
            NodeData::GetValue(g) => out.push(g.symbol),
            NodeData::SetValue(s) => out.push(s.symbol),
            NodeData::GetObjectValue(s) | NodeData::GetEnumValue(s) => out.push(s.symbol),
            NodeData::ClassReference(c) => out.push(c.symbol),
            NodeData::RawFunctionReference(r) => out.push(r.symbol),
            _ => {}
        }
        out
    }

    /// 声明持有的身份符号
    pub fn symbol(&self) -> Option<SymbolId> {
        match self {
            NodeData::File(f) => Some(f.symbol),
            NodeData::Class(c) => Some(c.symbol),
            NodeData::SimpleFunction(f) => Some(f.symbol),
            NodeData::Constructor(c) => Some(c.symbol),
            NodeData::Property(p) => Some(p.symbol),
            NodeData::Field(f) => Some(f.symbol),
            NodeData::TypeParameter(t) => Some(t.symbol),
            NodeData::ValueParameter(v) => Some(v.symbol),
            NodeData::EnumEntry(e) => Some(e.symbol),
            NodeData::TypeAlias(t) => Some(t.symbol),
            NodeData::Variable(v) => Some(v.symbol),
            NodeData::AnonymousInitializer(a) => Some(a.symbol),
            _ => None,
        }
    }

    /// 声明公共记录
    pub fn declaration_info(&self) -> Option<&DeclarationInfo> {
        match self {
            NodeData::Class(c) => Some(&c.info),
            NodeData::SimpleFunction(f) => Some(&f.info),
            NodeData::Constructor(c) => Some(&c.info),
            NodeData::Property(p) => Some(&p.info),
            NodeData::Field(f) => Some(&f.info),
            NodeData::TypeParameter(t) => Some(&t.info),
            NodeData::ValueParameter(v) => Some(&v.info),
            NodeData::EnumEntry(e) => Some(&e.info),
            NodeData::TypeAlias(t) => Some(&t.info),
            NodeData::Variable(v) => Some(&v.info),
            NodeData::AnonymousInitializer(a) => Some(&a.info),
            NodeData::ErrorDeclaration(e) => Some(&e.info),
            _ => None,
        }
    }

    pub fn declaration_info_mut(&mut self) -> Option<&mut DeclarationInfo> {
        match self {
            NodeData::Class(c) => Some(&mut c.info),
            NodeData::SimpleFunction(f) => Some(&mut f.info),
            NodeData::Constructor(c) => Some(&mut c.info),
            NodeData::Property(p) => Some(&mut p.info),
            NodeData::Field(f) => Some(&mut f.info),
            NodeData::TypeParameter(t) => Some(&mut t.info),
            NodeData::ValueParameter(v) => Some(&mut v.info),
            NodeData::EnumEntry(e) => Some(&mut e.info),
            NodeData::TypeAlias(t) => Some(&mut t.info),
            NodeData::Variable(v) => Some(&mut v.info),
            NodeData::AnonymousInitializer(a) => Some(&mut a.info),
            NodeData::ErrorDeclaration(e) => Some(&mut e.info),
            _ => None,
        }
    }

    /// 表达式的类型
    pub fn expression_type(&self) -> Option<&IrType> {
        match self {
            NodeData::Block(b) | NodeData::Composite(b) => Some(&b.ty),
            NodeData::Return(r) => Some(&r.ty),
            NodeData::Throw(t) => Some(&t.ty),
            NodeData::Call(a)
            | NodeData::ConstructorCall(a)
            | NodeData::DelegatingConstructorCall(a)
            | NodeData::EnumConstructorCall(a)
            | NodeData::FunctionReference(a) => Some(&a.ty),
            NodeData::PropertyReference(p) => Some(&p.access.ty),
            NodeData::InstanceInitializerCall(i) => Some(&i.ty),
            NodeData::GetField(g) => Some(&g.ty),
            NodeData::SetField(s) => Some(&s.ty),
            NodeData::GetValue(g) => Some(&g.ty),
            NodeData::SetValue(s) => Some(&s.ty),
            NodeData::GetObjectValue(s) | NodeData::GetEnumValue(s) => Some(&s.ty),
            NodeData::Const(c) => Some(&c.ty),
            NodeData::StringConcatenation(s) => Some(&s.ty),
            NodeData::TypeOperatorCall(t) => Some(&t.ty),
            NodeData::When(w) => Some(&w.ty),
            NodeData::WhileLoop(l) | NodeData::DoWhileLoop(l) => Some(&l.ty),
            NodeData::Break(j) | NodeData::Continue(j) => Some(&j.ty),
            NodeData::Try(t) => Some(&t.ty),
            NodeData::Vararg(v) => Some(&v.ty),
            NodeData::FunctionExpression(f) => Some(&f.ty),
            NodeData::ClassReference(c) => Some(&c.ty),
            NodeData::RawFunctionReference(r) => Some(&r.ty),
            NodeData::ErrorExpression(e) => Some(&e.ty),
            NodeData::ErrorCallExpression(e) => Some(&e.ty),
            _ => None,
        }
    }

    /// 函数体（函数、构造器、匿名初始化块）
    pub fn body(&self) -> Option<NodeId> {
        match self {
            NodeData::SimpleFunction(f) => f.body,
            NodeData::Constructor(c) => c.body,
            NodeData::AnonymousInitializer(a) => Some(a.body),
            _ => None,
        }
    }

    /// 调用类表达式的成员访问记录
    pub fn member_access(&self) -> Option<&MemberAccess> {
        match self {
            NodeData::Call(a)
            | NodeData::ConstructorCall(a)
            | NodeData::DelegatingConstructorCall(a)
            | NodeData::EnumConstructorCall(a)
            | NodeData::FunctionReference(a) => Some(a),
            NodeData::PropertyReference(p) => Some(&p.access),
            _ => None,
        }
    }

    /// 语句列表（块体、Block、Composite）
    pub fn statements_mut(&mut self) -> Option<&mut Vec<NodeId>> {
        match self {
            NodeData::BlockBody(b) => Some(&mut b.statements),
            NodeData::Block(b) | NodeData::Composite(b) => Some(&mut b.statements),
            _ => None,
        }
    }

    pub fn statements(&self) -> Option<&[NodeId]> {
        match self {
            NodeData::BlockBody(b) => Some(&b.statements),
            NodeData::Block(b) | NodeData::Composite(b) => Some(&b.statements),
            _ => None,
        }
    }
}
