//! 根声明收集
//!
//! 导出与"实际外部"判断由上游给出（[`RootOracle`]），这里只负责按声明顺序
//! 把满足条件的声明挑出来。文件级属性被拆成幕后字段与访问器逐个判断。

use regex::Regex;
use tracing::debug;

use crate::middle::ir::{IrArena, IrResult, NodeData, NodeId, NodeKind};
use crate::util::config::DceConfig;

use super::policy::ReachabilityPolicy;
use super::DceError;

/// 导出与外部性判断
pub trait RootOracle {
    /// 声明是否对外导出
    fn is_exported(
        &self,
        arena: &IrArena,
        decl: NodeId,
    ) -> IrResult<bool>;

    /// 声明自身或任一外层声明是否为外部声明
    fn is_effectively_external(
        &self,
        arena: &IrArena,
        decl: NodeId,
    ) -> IrResult<bool>;
}

/// 直接读取声明标志的默认实现
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclarationFlagsOracle;

impl RootOracle for DeclarationFlagsOracle {
    fn is_exported(
        &self,
        arena: &IrArena,
        decl: NodeId,
    ) -> IrResult<bool> {
        Ok(arena
            .data(decl)?
            .declaration_info()
            .is_some_and(|info| info.flags.exported))
    }

    fn is_effectively_external(
        &self,
        arena: &IrArena,
        decl: NodeId,
    ) -> IrResult<bool> {
        let mut current = Some(decl);
        while let Some(node) = current {
            let data = arena.data(node)?;
            if data.declaration_info().is_some_and(|info| info.flags.external) {
                return Ok(true);
            }
            if !data.kind().is_declaration() {
                break;
            }
            current = arena.parent(node)?;
        }
        Ok(false)
    }
}

/// 根收集器
pub struct RootCollector<'a> {
    arena: &'a IrArena,
    oracle: &'a dyn RootOracle,
    policy: &'a dyn ReachabilityPolicy,
    entry_point: &'a str,
    extra_roots: &'a [String],
    keep_patterns: Vec<Regex>,
}

impl<'a> RootCollector<'a> {
    pub fn new(
        arena: &'a IrArena,
        oracle: &'a dyn RootOracle,
        policy: &'a dyn ReachabilityPolicy,
        config: &'a DceConfig,
    ) -> Result<Self, DceError> {
        let keep_patterns = config
            .keep_patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| DceError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            arena,
            oracle,
            policy,
            entry_point: &config.entry_point,
            extra_roots: &config.extra_roots,
            keep_patterns,
        })
    }

    /// 按声明顺序收集根
    pub fn collect(&self) -> Result<Vec<NodeId>, DceError> {
        let mut roots = Vec::new();
        let mut matched_extra = vec![false; self.extra_roots.len()];

        for module in self.arena.modules() {
            for file in self.arena.children(*module)? {
                if self.arena.kind(file)? != NodeKind::File {
                    continue;
                }
                for decl in self.arena.declarations(file)? {
                    self.collect_declaration(*decl, true, &mut roots, &mut matched_extra)?;
                }
            }
        }

        if let Some(index) = matched_extra.iter().position(|m| !m) {
            return Err(DceError::UnknownRoot(self.extra_roots[index].clone()));
        }
        debug!("collected {} roots", roots.len());
        Ok(roots)
    }

    fn collect_declaration(
        &self,
        decl: NodeId,
        top_level: bool,
        roots: &mut Vec<NodeId>,
        matched_extra: &mut [bool],
    ) -> Result<(), DceError> {
        match self.arena.data(decl)? {
            NodeData::Property(property) => {
                // 属性名本身也可以出现在 extra_roots 中
                let property_is_root = self.match_by_name(decl, matched_extra)?
                    || self.oracle.is_exported(self.arena, decl)?
                    || self.oracle.is_effectively_external(self.arena, decl)?
                    || self.is_eager(decl)?;
                let parts = [property.backing_field, property.getter, property.setter];
                for part in parts.into_iter().flatten() {
                    // 先判断部件，保证部件名也参与 extra_roots 匹配
                    if self.is_root(part, false, matched_extra)? || property_is_root {
                        roots.push(part);
                    }
                }
            }
            NodeData::Class(class) => {
                let members = class.declarations.clone();
                if self.is_root(decl, top_level, matched_extra)? {
                    roots.push(decl);
                }
                for member in members {
                    self.collect_declaration(member, false, roots, matched_extra)?;
                }
            }
            _ => {
                if self.is_root(decl, top_level, matched_extra)? {
                    roots.push(decl);
                }
            }
        }
        Ok(())
    }

    fn is_root(
        &self,
        decl: NodeId,
        top_level: bool,
        matched_extra: &mut [bool],
    ) -> Result<bool, DceError> {
        // 名字匹配要对每个声明都做，才能发现未知的 extra_roots
        let by_name = self.match_by_name(decl, matched_extra)?;
        if by_name {
            return Ok(true);
        }
        if self.arena.kind(decl)? == NodeKind::ErrorDeclaration {
            return Ok(false);
        }
        if self.oracle.is_exported(self.arena, decl)?
            || self.oracle.is_effectively_external(self.arena, decl)?
            || self.is_eager(decl)?
            || self.is_part_of_exported_property(decl)?
            || self.policy.is_root(self.arena, decl)?
        {
            return Ok(true);
        }
        Ok(top_level
            && self.arena.kind(decl)? == NodeKind::SimpleFunction
            && self
                .arena
                .data(decl)?
                .declaration_info()
                .is_some_and(|info| info.name == self.entry_point))
    }

    fn match_by_name(
        &self,
        decl: NodeId,
        matched_extra: &mut [bool],
    ) -> Result<bool, DceError> {
        if self.extra_roots.is_empty() && self.keep_patterns.is_empty() {
            return Ok(false);
        }
        if self.arena.kind(decl)? == NodeKind::ErrorDeclaration {
            return Ok(false);
        }
        let name = self.arena.fq_name(decl)?;
        let mut matched = false;
        for (i, root) in self.extra_roots.iter().enumerate() {
            if *root == name {
                matched_extra[i] = true;
                matched = true;
            }
        }
        Ok(matched || self.keep_patterns.iter().any(|p| p.is_match(&name)))
    }

    fn is_eager(
        &self,
        decl: NodeId,
    ) -> IrResult<bool> {
        Ok(self
            .arena
            .data(decl)?
            .declaration_info()
            .is_some_and(|info| info.flags.eager_initialization))
    }

    /// 字段或访问器所属的属性是否导出
    fn is_part_of_exported_property(
        &self,
        decl: NodeId,
    ) -> IrResult<bool> {
        let property = match self.arena.data(decl)? {
            NodeData::Field(field) => field.corresponding_property,
            NodeData::SimpleFunction(function) => function.corresponding_property,
            _ => None,
        };
        match property {
            Some(symbol) => {
                let owner = self.arena.owner(symbol)?;
                self.oracle.is_exported(self.arena, owner)
            }
            None => Ok(false),
        }
    }
}

/// 按声明顺序收集根
pub fn collect_roots(
    arena: &IrArena,
    oracle: &dyn RootOracle,
    policy: &dyn ReachabilityPolicy,
    config: &DceConfig,
) -> Result<Vec<NodeId>, DceError> {
    RootCollector::new(arena, oracle, policy, config)?.collect()
}
