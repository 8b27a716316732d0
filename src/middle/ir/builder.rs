//! IR 构建器
//!
//! 负责创建符号、构造节点并挂到容器上。声明方法会立即把新声明
//! 加入容器；表达式方法返回尚未挂接的节点，由调用方通过
//! [`IrBuilder::add_statement`] 等方法挂接。

use super::arena::IrArena;
use super::error::{IrError, IrResult};
use super::ids::{NodeId, SymbolId};
use super::node::*;
use super::symbol::SymbolKind;
use super::types::{
    ClassKind, ConstValue, DeclarationOrigin, IrType, Modality, TypeOperator,
};

/// 函数声明选项
#[derive(Debug, Clone, Default)]
pub struct FunctionOptions {
    pub modality: Modality,
    /// 被覆盖的函数
    pub overrides: Vec<NodeId>,
    pub fake_override: bool,
    pub flags: DeclarationFlags,
    pub origin: DeclarationOrigin,
}

/// IR 构建器
pub struct IrBuilder<'a> {
    arena: &'a mut IrArena,
}

impl<'a> IrBuilder<'a> {
    pub fn new(arena: &'a mut IrArena) -> Self {
        Self { arena }
    }

    pub fn arena(&mut self) -> &mut IrArena {
        self.arena
    }

    fn type_of(
        &self,
        class: NodeId,
    ) -> IrResult<IrType> {
        Ok(IrType::simple(self.arena.symbol_of(class)?))
    }

    fn symbols_of(
        &self,
        nodes: &[NodeId],
    ) -> IrResult<Vec<SymbolId>> {
        nodes.iter().map(|n| self.arena.symbol_of(*n)).collect()
    }

    fn declare(
        &mut self,
        container: NodeId,
        base: NodeBase,
        data: NodeData,
    ) -> IrResult<NodeId> {
        let id = self.arena.add_node(base, data)?;
        self.arena.add_declaration(container, id)?;
        Ok(id)
    }

    // ---- 模块与文件 ----

    pub fn module(
        &mut self,
        name: impl Into<String>,
    ) -> IrResult<NodeId> {
        self.arena.add_node(
            NodeBase::default(),
            NodeData::ModuleFragment(ModuleFragmentData {
                name: name.into(),
                files: Vec::new(),
            }),
        )
    }

    pub fn file(
        &mut self,
        module: NodeId,
        package: impl Into<String>,
        path: impl Into<String>,
    ) -> IrResult<NodeId> {
        let path = path.into();
        let symbol = self.arena.declare_symbol(SymbolKind::File, path.clone());
        let file = self.arena.add_node(
            NodeBase::default(),
            NodeData::File(FileData {
                symbol,
                package: package.into(),
                path,
                annotations: Vec::new(),
                declarations: Vec::new(),
            }),
        )?;
        self.arena.add_file(module, file)?;
        Ok(file)
    }

    // ---- 声明 ----

    /// 普通 final 类
    pub fn class(
        &mut self,
        container: NodeId,
        name: &str,
    ) -> IrResult<NodeId> {
        self.class_with(container, name, ClassKind::Class, Modality::Final, &[])
    }

    pub fn class_with(
        &mut self,
        container: NodeId,
        name: &str,
        class_kind: ClassKind,
        modality: Modality,
        supers: &[NodeId],
    ) -> IrResult<NodeId> {
        let super_types = supers
            .iter()
            .map(|s| self.type_of(*s))
            .collect::<IrResult<Vec<_>>>()?;
        let symbol = self.arena.declare_symbol(SymbolKind::Class, name);
        self.declare(
            container,
            NodeBase::default(),
            NodeData::Class(ClassDecl {
                info: DeclarationInfo::named(name),
                symbol,
                class_kind,
                modality,
                is_value: false,
                super_types,
                type_parameters: Vec::new(),
                declarations: Vec::new(),
                instance_accessor: None,
            }),
        )
    }

    /// 带空块体的 final 函数
    pub fn function(
        &mut self,
        container: NodeId,
        name: &str,
    ) -> IrResult<NodeId> {
        self.function_with(container, name, FunctionOptions::default())
    }

    pub fn function_with(
        &mut self,
        container: NodeId,
        name: &str,
        options: FunctionOptions,
    ) -> IrResult<NodeId> {
        let overridden_symbols = self.symbols_of(&options.overrides)?;
        let body = if options.fake_override || options.modality == Modality::Abstract {
            None
        } else {
            Some(self.block_body(Vec::new())?)
        };
        let origin = if options.fake_override {
            DeclarationOrigin::FakeOverride
        } else {
            options.origin
        };
        let symbol = self.arena.declare_symbol(SymbolKind::SimpleFunction, name);
        let info = DeclarationInfo {
            flags: options.flags,
            ..DeclarationInfo::named(name)
        };
        self.declare(
            container,
            NodeBase::with_origin(origin),
            NodeData::SimpleFunction(FunctionDecl {
                info,
                symbol,
                modality: options.modality,
                type_parameters: Vec::new(),
                dispatch_receiver_parameter: None,
                value_parameters: Vec::new(),
                return_type: IrType::Dynamic,
                body,
                overridden_symbols,
                is_fake_override: options.fake_override,
                corresponding_property: None,
            }),
        )
    }

    /// 覆盖 `overrides` 的 open 函数
    pub fn override_function(
        &mut self,
        class: NodeId,
        name: &str,
        overrides: &[NodeId],
    ) -> IrResult<NodeId> {
        self.function_with(
            class,
            name,
            FunctionOptions {
                modality: Modality::Open,
                overrides: overrides.to_vec(),
                ..FunctionOptions::default()
            },
        )
    }

    /// 继承而未重新声明的伪覆盖
    pub fn fake_override(
        &mut self,
        class: NodeId,
        name: &str,
        overrides: &[NodeId],
    ) -> IrResult<NodeId> {
        self.function_with(
            class,
            name,
            FunctionOptions {
                modality: Modality::Open,
                overrides: overrides.to_vec(),
                fake_override: true,
                ..FunctionOptions::default()
            },
        )
    }

    /// 带空块体的构造器；类中的第一个构造器为主构造器
    pub fn constructor(
        &mut self,
        class: NodeId,
    ) -> IrResult<NodeId> {
        let class_symbol = self.arena.symbol_of(class)?;
        let is_primary = !self
            .arena
            .declarations(class)?
            .iter()
            .any(|d| matches!(self.arena.data(*d), Ok(NodeData::Constructor(_))));
        let name = format!("<init:{}>", self.arena.symbol_entry(class_symbol)?.name);
        let body = self.block_body(Vec::new())?;
        let symbol = self.arena.declare_symbol(SymbolKind::Constructor, name.clone());
        self.declare(
            class,
            NodeBase::default(),
            NodeData::Constructor(ConstructorDecl {
                info: DeclarationInfo::named(name),
                symbol,
                is_primary,
                type_parameters: Vec::new(),
                dispatch_receiver_parameter: None,
                value_parameters: Vec::new(),
                return_type: IrType::simple(class_symbol),
                body: Some(body),
            }),
        )
    }

    pub fn field(
        &mut self,
        container: NodeId,
        name: &str,
        initializer: Option<NodeId>,
    ) -> IrResult<NodeId> {
        let symbol = self.arena.declare_symbol(SymbolKind::Field, name);
        self.declare(
            container,
            NodeBase::default(),
            NodeData::Field(FieldDecl {
                info: DeclarationInfo::named(name),
                symbol,
                ty: IrType::Dynamic,
                is_static: false,
                is_final: true,
                initializer,
                corresponding_property: None,
            }),
        )
    }

    /// 属性及其幕后字段和访问器
    pub fn property(
        &mut self,
        container: NodeId,
        name: &str,
        with_field: bool,
        with_getter: bool,
        with_setter: bool,
    ) -> IrResult<NodeId> {
        let symbol = self.arena.declare_symbol(SymbolKind::Property, name);

        let part = |builder: &mut Self, kind: SymbolKind, part_name: String| -> IrResult<NodeId> {
            let part_symbol = builder.arena.declare_symbol(kind, part_name.clone());
            let info = DeclarationInfo::named(part_name);
            let data = match kind {
                SymbolKind::Field => NodeData::Field(FieldDecl {
                    info,
                    symbol: part_symbol,
                    ty: IrType::Dynamic,
                    is_static: false,
                    is_final: !with_setter,
                    initializer: None,
                    corresponding_property: Some(symbol),
                }),
                _ => NodeData::SimpleFunction(FunctionDecl {
                    info,
                    symbol: part_symbol,
                    modality: Modality::Final,
                    type_parameters: Vec::new(),
                    dispatch_receiver_parameter: None,
                    value_parameters: Vec::new(),
                    return_type: IrType::Dynamic,
                    body: Some(builder.block_body(Vec::new())?),
                    overridden_symbols: Vec::new(),
                    is_fake_override: false,
                    corresponding_property: Some(symbol),
                }),
            };
            let origin = match kind {
                SymbolKind::Field => DeclarationOrigin::BackingField,
                _ => DeclarationOrigin::DefaultAccessor,
            };
            builder.arena.add_node(NodeBase::with_origin(origin), data)
        };

        let backing_field = if with_field {
            Some(part(self, SymbolKind::Field, format!("{}$field", name))?)
        } else {
            None
        };
        let getter = if with_getter {
            Some(part(self, SymbolKind::SimpleFunction, format!("<get-{}>", name))?)
        } else {
            None
        };
        let setter = if with_setter {
            Some(part(self, SymbolKind::SimpleFunction, format!("<set-{}>", name))?)
        } else {
            None
        };

        self.declare(
            container,
            NodeBase::default(),
            NodeData::Property(PropertyDecl {
                info: DeclarationInfo::named(name),
                symbol,
                modality: Modality::Final,
                is_var: with_setter,
                backing_field,
                getter,
                setter,
                overridden_symbols: Vec::new(),
                is_fake_override: false,
            }),
        )
    }

    pub fn anonymous_initializer(
        &mut self,
        class: NodeId,
        is_static: bool,
    ) -> IrResult<NodeId> {
        let body = self.block_body(Vec::new())?;
        let symbol = self
            .arena
            .declare_symbol(SymbolKind::AnonymousInitializer, "<anonymous>");
        self.declare(
            class,
            NodeBase::default(),
            NodeData::AnonymousInitializer(AnonymousInitializerDecl {
                info: DeclarationInfo::named("<anonymous>"),
                symbol,
                is_static,
                body,
            }),
        )
    }

    pub fn enum_entry(
        &mut self,
        class: NodeId,
        name: &str,
        initializer_expression: Option<NodeId>,
    ) -> IrResult<NodeId> {
        let symbol = self.arena.declare_symbol(SymbolKind::EnumEntry, name);
        self.declare(
            class,
            NodeBase::default(),
            NodeData::EnumEntry(EnumEntryDecl {
                info: DeclarationInfo::named(name),
                symbol,
                initializer_expression,
                corresponding_class: None,
            }),
        )
    }

    pub fn error_declaration(
        &mut self,
        container: NodeId,
        description: &str,
    ) -> IrResult<NodeId> {
        self.declare(
            container,
            NodeBase::default(),
            NodeData::ErrorDeclaration(ErrorDeclarationData {
                info: DeclarationInfo::named("<error>"),
                description: description.to_string(),
            }),
        )
    }

    /// 局部变量（语句）
    pub fn variable(
        &mut self,
        name: &str,
        initializer: Option<NodeId>,
    ) -> IrResult<NodeId> {
        let symbol = self.arena.declare_symbol(SymbolKind::Variable, name);
        self.arena.add_node(
            NodeBase::default(),
            NodeData::Variable(VariableDecl {
                info: DeclarationInfo::named(name),
                symbol,
                ty: IrType::Dynamic,
                is_var: false,
                initializer,
            }),
        )
    }

    /// 修改声明标志
    pub fn set_flags(
        &mut self,
        decl: NodeId,
        update: impl FnOnce(&mut DeclarationFlags),
    ) -> IrResult<()> {
        let kind = self.arena.kind(decl)?;
        let info = self
            .arena
            .data_mut(decl)?
            .declaration_info_mut()
            .ok_or(IrError::NotADeclaration { node: decl, kind })?;
        update(&mut info.flags);
        Ok(())
    }

    pub fn export(
        &mut self,
        decl: NodeId,
    ) -> IrResult<()> {
        self.set_flags(decl, |f| f.exported = true)
    }

    pub fn set_origin(
        &mut self,
        node: NodeId,
        origin: DeclarationOrigin,
    ) -> IrResult<()> {
        self.arena.node_mut(node)?.base.origin = origin;
        Ok(())
    }

    /// 单例对象的实例获取函数
    pub fn set_instance_accessor(
        &mut self,
        object: NodeId,
        accessor: NodeId,
    ) -> IrResult<()> {
        let symbol = self.arena.symbol_of(accessor)?;
        let kind = self.arena.kind(object)?;
        match self.arena.data_mut(object)? {
            NodeData::Class(class) => {
                class.instance_accessor = Some(symbol);
                Ok(())
            }
            _ => Err(IrError::NotADeclaration { node: object, kind }),
        }
    }

    /// 在函数或构造器的参数列表末尾追加值参数
    pub fn value_parameter(
        &mut self,
        function: NodeId,
        name: &str,
        default_value: Option<NodeId>,
    ) -> IrResult<NodeId> {
        let kind = self.arena.kind(function)?;
        let index = match self.arena.data(function)? {
            NodeData::SimpleFunction(f) => f.value_parameters.len(),
            NodeData::Constructor(c) => c.value_parameters.len(),
            _ => return Err(IrError::NotAContainer { node: function, kind }),
        };
        let symbol = self.arena.declare_symbol(SymbolKind::ValueParameter, name);
        let parameter = self.arena.add_node(
            NodeBase::default(),
            NodeData::ValueParameter(ValueParameterDecl {
                info: DeclarationInfo::named(name),
                symbol,
                index,
                ty: IrType::Dynamic,
                default_value,
            }),
        )?;
        match self.arena.data_mut(function)? {
            NodeData::SimpleFunction(f) => f.value_parameters.push(parameter),
            NodeData::Constructor(c) => c.value_parameters.push(parameter),
            _ => {}
        }
        self.arena.node_mut(parameter)?.base.parent = Some(function);
        Ok(parameter)
    }

    // ---- 函数体与语句 ----

    pub fn block_body(
        &mut self,
        statements: Vec<NodeId>,
    ) -> IrResult<NodeId> {
        self.arena.add_node(
            NodeBase::default(),
            NodeData::BlockBody(StatementList { statements }),
        )
    }

    /// 在函数/构造器/初始化块的函数体末尾追加语句
    pub fn add_statement(
        &mut self,
        owner: NodeId,
        statement: NodeId,
    ) -> IrResult<()> {
        let target = match self.arena.data(owner)?.body() {
            Some(body) => body,
            None => owner,
        };
        self.arena.add_statement(target, statement)
    }

    pub fn annotate(
        &mut self,
        decl: NodeId,
        annotation_class_constructor: NodeId,
    ) -> IrResult<NodeId> {
        let call = self.constructor_call(annotation_class_constructor, Vec::new())?;
        self.arena.add_annotation(decl, call)?;
        Ok(call)
    }

    // ---- 表达式 ----

    fn access(
        &self,
        callee: NodeId,
        ty: IrType,
        dispatch_receiver: Option<NodeId>,
        arguments: Vec<NodeId>,
    ) -> IrResult<MemberAccess> {
        Ok(MemberAccess {
            ty,
            symbol: self.arena.symbol_of(callee)?,
            dispatch_receiver,
            extension_receiver: None,
            arguments,
            type_arguments: Vec::new(),
            super_qualifier: None,
        })
    }

    pub fn call(
        &mut self,
        callee: NodeId,
        arguments: Vec<NodeId>,
    ) -> IrResult<NodeId> {
        let access = self.access(callee, IrType::Dynamic, None, arguments)?;
        self.arena.add_node(NodeBase::default(), NodeData::Call(access))
    }

    /// 带派发接收者的虚调用
    pub fn virtual_call(
        &mut self,
        callee: NodeId,
        receiver: NodeId,
        arguments: Vec<NodeId>,
    ) -> IrResult<NodeId> {
        let access = self.access(callee, IrType::Dynamic, Some(receiver), arguments)?;
        self.arena.add_node(NodeBase::default(), NodeData::Call(access))
    }

    /// 带类型实参的调用（装箱/拆箱等内建函数）
    pub fn call_with_type_arguments(
        &mut self,
        callee: NodeId,
        type_arguments: Vec<IrType>,
        arguments: Vec<NodeId>,
    ) -> IrResult<NodeId> {
        let mut access = self.access(callee, IrType::Dynamic, None, arguments)?;
        access.type_arguments = type_arguments;
        self.arena.add_node(NodeBase::default(), NodeData::Call(access))
    }

    pub fn constructor_call(
        &mut self,
        constructor: NodeId,
        arguments: Vec<NodeId>,
    ) -> IrResult<NodeId> {
        let ty = match self.arena.data(constructor)? {
            NodeData::Constructor(c) => c.return_type.clone(),
            _ => IrType::Dynamic,
        };
        let access = self.access(constructor, ty, None, arguments)?;
        self.arena
            .add_node(NodeBase::default(), NodeData::ConstructorCall(access))
    }

    pub fn delegating_constructor_call(
        &mut self,
        constructor: NodeId,
    ) -> IrResult<NodeId> {
        let access = self.access(constructor, IrType::Dynamic, None, Vec::new())?;
        self.arena.add_node(
            NodeBase::default(),
            NodeData::DelegatingConstructorCall(access),
        )
    }

    pub fn enum_constructor_call(
        &mut self,
        constructor: NodeId,
    ) -> IrResult<NodeId> {
        let access = self.access(constructor, IrType::Dynamic, None, Vec::new())?;
        self.arena
            .add_node(NodeBase::default(), NodeData::EnumConstructorCall(access))
    }

    pub fn instance_initializer_call(
        &mut self,
        class: NodeId,
    ) -> IrResult<NodeId> {
        let class_symbol = self.arena.symbol_of(class)?;
        self.arena.add_node(
            NodeBase::default(),
            NodeData::InstanceInitializerCall(InstanceInitializerCallExpr {
                ty: IrType::Dynamic,
                class_symbol,
            }),
        )
    }

    pub fn function_reference(
        &mut self,
        function: NodeId,
    ) -> IrResult<NodeId> {
        let access = self.access(function, IrType::Dynamic, None, Vec::new())?;
        self.arena
            .add_node(NodeBase::default(), NodeData::FunctionReference(access))
    }

    pub fn property_reference(
        &mut self,
        property: NodeId,
    ) -> IrResult<NodeId> {
        let (getter, setter, field) = match self.arena.data(property)? {
            NodeData::Property(p) => (p.getter, p.setter, p.backing_field),
            _ => (None, None, None),
        };
        let symbol_of = |id: Option<NodeId>| -> IrResult<Option<SymbolId>> {
            id.map(|n| self.arena.symbol_of(n)).transpose()
        };
        let data = PropertyReferenceExpr {
            access: self.access(property, IrType::Dynamic, None, Vec::new())?,
            getter: symbol_of(getter)?,
            setter: symbol_of(setter)?,
            field: symbol_of(field)?,
        };
        self.arena
            .add_node(NodeBase::default(), NodeData::PropertyReference(data))
    }

    pub fn raw_function_reference(
        &mut self,
        function: NodeId,
    ) -> IrResult<NodeId> {
        let symbol = self.arena.symbol_of(function)?;
        self.arena.add_node(
            NodeBase::default(),
            NodeData::RawFunctionReference(RawFunctionReferenceExpr {
                ty: IrType::Dynamic,
                symbol,
            }),
        )
    }

    pub fn class_reference(
        &mut self,
        class: NodeId,
    ) -> IrResult<NodeId> {
        let class_type = self.type_of(class)?;
        let symbol = self.arena.symbol_of(class)?;
        self.arena.add_node(
            NodeBase::default(),
            NodeData::ClassReference(ClassReferenceExpr {
                ty: IrType::Dynamic,
                symbol,
                class_type,
            }),
        )
    }

    pub fn get_field(
        &mut self,
        field: NodeId,
        receiver: Option<NodeId>,
    ) -> IrResult<NodeId> {
        let symbol = self.arena.symbol_of(field)?;
        self.arena.add_node(
            NodeBase::default(),
            NodeData::GetField(GetFieldExpr {
                ty: IrType::Dynamic,
                symbol,
                receiver,
            }),
        )
    }

    pub fn set_field(
        &mut self,
        field: NodeId,
        receiver: Option<NodeId>,
        value: NodeId,
    ) -> IrResult<NodeId> {
        let symbol = self.arena.symbol_of(field)?;
        self.arena.add_node(
            NodeBase::default(),
            NodeData::SetField(SetFieldExpr {
                ty: IrType::Dynamic,
                symbol,
                receiver,
                value,
            }),
        )
    }

    pub fn get_value(
        &mut self,
        decl: NodeId,
    ) -> IrResult<NodeId> {
        let symbol = self.arena.symbol_of(decl)?;
        self.arena.add_node(
            NodeBase::default(),
            NodeData::GetValue(GetValueExpr {
                ty: IrType::Dynamic,
                symbol,
            }),
        )
    }

    pub fn set_value(
        &mut self,
        decl: NodeId,
        value: NodeId,
    ) -> IrResult<NodeId> {
        let symbol = self.arena.symbol_of(decl)?;
        self.arena.add_node(
            NodeBase::default(),
            NodeData::SetValue(SetValueExpr {
                ty: IrType::Dynamic,
                symbol,
                value,
            }),
        )
    }

    pub fn get_object_value(
        &mut self,
        object: NodeId,
    ) -> IrResult<NodeId> {
        let ty = self.type_of(object)?;
        let symbol = self.arena.symbol_of(object)?;
        self.arena.add_node(
            NodeBase::default(),
            NodeData::GetObjectValue(SingletonValueExpr { ty, symbol }),
        )
    }

    pub fn get_enum_value(
        &mut self,
        entry: NodeId,
    ) -> IrResult<NodeId> {
        let symbol = self.arena.symbol_of(entry)?;
        self.arena.add_node(
            NodeBase::default(),
            NodeData::GetEnumValue(SingletonValueExpr {
                ty: IrType::Dynamic,
                symbol,
            }),
        )
    }

    pub fn constant(
        &mut self,
        value: ConstValue,
    ) -> IrResult<NodeId> {
        self.arena.add_node(
            NodeBase::default(),
            NodeData::Const(ConstExpr {
                ty: IrType::Dynamic,
                value,
            }),
        )
    }

    pub fn const_int(
        &mut self,
        value: i64,
    ) -> IrResult<NodeId> {
        self.constant(ConstValue::Int(value))
    }

    pub fn const_string(
        &mut self,
        value: &str,
    ) -> IrResult<NodeId> {
        self.constant(ConstValue::String(value.to_string()))
    }

    pub fn string_concatenation(
        &mut self,
        arguments: Vec<NodeId>,
    ) -> IrResult<NodeId> {
        self.arena.add_node(
            NodeBase::default(),
            NodeData::StringConcatenation(StringConcatenationExpr {
                ty: IrType::Dynamic,
                arguments,
            }),
        )
    }

    pub fn type_operator(
        &mut self,
        operator: TypeOperator,
        argument: NodeId,
        operand_class: NodeId,
    ) -> IrResult<NodeId> {
        let type_operand = self.type_of(operand_class)?;
        self.arena.add_node(
            NodeBase::default(),
            NodeData::TypeOperatorCall(TypeOperatorCallExpr {
                ty: IrType::Dynamic,
                operator,
                argument,
                type_operand,
            }),
        )
    }

    pub fn return_from(
        &mut self,
        function: NodeId,
        value: NodeId,
    ) -> IrResult<NodeId> {
        let target = self.arena.symbol_of(function)?;
        self.arena.add_node(
            NodeBase::default(),
            NodeData::Return(ReturnExpr {
                ty: IrType::Dynamic,
                target,
                value,
            }),
        )
    }

    pub fn block(
        &mut self,
        statements: Vec<NodeId>,
    ) -> IrResult<NodeId> {
        self.arena.add_node(
            NodeBase::default(),
            NodeData::Block(ContainerExpression {
                ty: IrType::Dynamic,
                statements,
            }),
        )
    }

    pub fn error_expression(
        &mut self,
        description: &str,
    ) -> IrResult<NodeId> {
        self.arena.add_node(
            NodeBase::default(),
            NodeData::ErrorExpression(ErrorExpressionData {
                ty: IrType::Error,
                description: description.to_string(),
            }),
        )
    }
}
