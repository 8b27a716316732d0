//! 类/接口种类求解（2-SAT）
//!
//! 每个元素 E 一个布尔变量（真 = 类）。约束：
//!
//! - 父元素是类，则 E 是类：`Pi → E`，逆否 `¬E → ¬Pi`；
//! - 直接父元素中至多一个是类：每对父元素 `Pi → ¬Pj`、`Pj → ¬Pi`；
//! - 钉选：类 `¬E → E`，接口 `E → ¬E`。
//!
//! 用 Tarjan 强连通分量判定可满足性（x 与 ¬x 同分量即无解），
//! 然后按声明顺序给变量赋值：优先取"接口"，沿蕴含传播，冲突时改取"类"。
//! 因此没有任何约束迫使其成为类的元素都解析为接口。

use std::collections::HashMap;

use tracing::trace;

use super::{Schema, SchemaError, StorageKind};

/// 变量 `var` 取值 `value` 的文字编号
fn lit(
    var: usize,
    value: bool,
) -> usize {
    2 * var + usize::from(!value)
}

fn var_of(literal: usize) -> usize {
    literal / 2
}

fn negate(literal: usize) -> usize {
    literal ^ 1
}

/// 蕴含图
#[derive(Debug, Clone)]
pub struct ImplicationGraph {
    edges: Vec<Vec<usize>>,
}

impl ImplicationGraph {
    pub fn new(vars: usize) -> Self {
        Self {
            edges: vec![Vec::new(); vars * 2],
        }
    }

    pub fn vars(&self) -> usize {
        self.edges.len() / 2
    }

    /// 加入蕴含 `(a = va) → (b = vb)` 及其逆否
    pub fn imply(
        &mut self,
        a: usize,
        va: bool,
        b: usize,
        vb: bool,
    ) {
        let from = lit(a, va);
        let to = lit(b, vb);
        self.edges[from].push(to);
        self.edges[negate(to)].push(negate(from));
    }

    /// 强连通分量编号（Tarjan，迭代实现）
    ///
    /// 分量按完成顺序编号，即逆拓扑序。
    pub fn components(&self) -> Vec<usize> {
        const UNVISITED: usize = usize::MAX;
        let n = self.edges.len();
        let mut index = vec![UNVISITED; n];
        let mut low = vec![0; n];
        let mut on_stack = vec![false; n];
        let mut comp = vec![UNVISITED; n];
        let mut stack = Vec::new();
        let mut counter = 0;
        let mut comp_count = 0;

        for start in 0..n {
            if index[start] != UNVISITED {
                continue;
            }
            // (节点, 下一条待访问边)
            let mut call_stack = vec![(start, 0usize)];
            index[start] = counter;
            low[start] = counter;
            counter += 1;
            stack.push(start);
            on_stack[start] = true;

            while let Some(&(v, next)) = call_stack.last() {
                if next < self.edges[v].len() {
                    if let Some(top) = call_stack.last_mut() {
                        top.1 += 1;
                    }
                    let w = self.edges[v][next];
                    if index[w] == UNVISITED {
                        index[w] = counter;
                        low[w] = counter;
                        counter += 1;
                        stack.push(w);
                        on_stack[w] = true;
                        call_stack.push((w, 0));
                    } else if on_stack[w] {
                        low[v] = low[v].min(index[w]);
                    }
                } else {
                    call_stack.pop();
                    if let Some(&(parent, _)) = call_stack.last() {
                        low[parent] = low[parent].min(low[v]);
                    }
                    if low[v] == index[v] {
                        while let Some(w) = stack.pop() {
                            on_stack[w] = false;
                            comp[w] = comp_count;
                            if w == v {
                                break;
                            }
                        }
                        comp_count += 1;
                    }
                }
            }
        }
        comp
    }

    /// 从 `start` 出发沿蕴含传播，返回必须为真的文字；与 `assigned` 冲突时返回 `None`
    fn propagate(
        &self,
        start: usize,
        assigned: &[Option<bool>],
    ) -> Option<Vec<usize>> {
        let mut seen = vec![false; self.edges.len()];
        let mut out = Vec::new();
        let mut stack = vec![start];
        seen[start] = true;
        while let Some(l) = stack.pop() {
            let value = l % 2 == 0;
            match assigned[var_of(l)] {
                Some(existing) if existing != value => return None,
                Some(_) => continue,
                None => {}
            }
            if seen[negate(l)] {
                return None;
            }
            out.push(l);
            for &next in &self.edges[l] {
                if !seen[next] {
                    seen[next] = true;
                    stack.push(next);
                }
            }
        }
        Some(out)
    }

    /// 求解；无解时返回冲突变量
    ///
    /// 赋值偏向假：每个变量先尝试取假，传播冲突才取真。
    pub fn solve(&self) -> Result<Vec<bool>, usize> {
        let comp = self.components();
        for var in 0..self.vars() {
            if comp[lit(var, true)] == comp[lit(var, false)] {
                return Err(var);
            }
        }

        let mut assigned: Vec<Option<bool>> = vec![None; self.vars()];
        for var in 0..self.vars() {
            if assigned[var].is_some() {
                continue;
            }
            let forced = self
                .propagate(lit(var, false), &assigned)
                .or_else(|| self.propagate(lit(var, true), &assigned))
                .ok_or(var)?;
            for l in forced {
                assigned[var_of(l)] = Some(l % 2 == 0);
            }
        }
        Ok(assigned.into_iter().map(|v| v.unwrap_or(false)).collect())
    }
}

/// 钉选的强制集合：类钉选向后代传播，接口钉选向祖先传播
fn forced_kinds(
    schema: &Schema,
    index: &HashMap<&str, usize>,
) -> Result<Vec<Option<(StorageKind, usize)>>, SchemaError> {
    let n = schema.elements.len();
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (i, e) in schema.elements.iter().enumerate() {
        for p in &e.parents {
            children[index[p.as_str()]].push(i);
        }
    }

    // (种类, 来源钉选元素)
    let mut forced: Vec<Option<(StorageKind, usize)>> = vec![None; n];
    for (origin, e) in schema.elements.iter().enumerate() {
        let Some(kind) = e.pin.pinned() else {
            continue;
        };
        let mut stack = vec![origin];
        while let Some(current) = stack.pop() {
            match forced[current] {
                Some((existing, _)) if existing == kind => continue,
                Some((existing, from)) => {
                    // 有钉选的一方报告冲突
                    let (element, pinned, inferred) = if schema.elements[current].pin.pinned() == Some(existing) {
                        (current, existing, kind)
                    } else if schema.elements[current].pin.pinned() == Some(kind) {
                        (current, kind, existing)
                    } else {
                        (from, existing, kind)
                    };
                    return Err(SchemaError::PinnedConflict {
                        element: schema.elements[element].name.clone(),
                        pinned,
                        inferred,
                    });
                }
                None => forced[current] = Some((kind, origin)),
            }
            match kind {
                StorageKind::Class => stack.extend(children[current].iter().copied()),
                StorageKind::Interface => stack.extend(
                    schema.elements[current]
                        .parents
                        .iter()
                        .map(|p| index[p.as_str()]),
                ),
            }
        }
    }
    Ok(forced)
}

/// 求出每个元素的存储种类（按 `schema.elements` 下标）
pub fn solve_kinds(
    schema: &Schema,
    index: &HashMap<&str, usize>,
) -> Result<Vec<StorageKind>, SchemaError> {
    let forced = forced_kinds(schema, index)?;

    let mut graph = ImplicationGraph::new(schema.elements.len());
    for (e, element) in schema.elements.iter().enumerate() {
        let parents: Vec<usize> = element.parents.iter().map(|p| index[p.as_str()]).collect();
        for &p in &parents {
            graph.imply(p, true, e, true);
        }
        for (i, &a) in parents.iter().enumerate() {
            for &b in &parents[i + 1..] {
                graph.imply(a, true, b, false);
            }
        }
        match forced[e] {
            Some((StorageKind::Class, _)) => graph.imply(e, false, e, true),
            Some((StorageKind::Interface, _)) => graph.imply(e, true, e, false),
            None => {}
        }
    }

    let values = graph.solve().map_err(|var| SchemaError::Unsatisfiable {
        element: schema.elements[var].name.clone(),
    })?;
    let kinds: Vec<StorageKind> = values
        .iter()
        .map(|&class| {
            if class {
                StorageKind::Class
            } else {
                StorageKind::Interface
            }
        })
        .collect();

    // 校验：钉选与结果一致，类的子元素是类，至多一个类父元素
    for (e, element) in schema.elements.iter().enumerate() {
        if let Some(pinned) = element.pin.pinned() {
            if pinned != kinds[e] {
                return Err(SchemaError::PinnedConflict {
                    element: element.name.clone(),
                    pinned,
                    inferred: kinds[e],
                });
            }
        }
        let class_parents = element
            .parents
            .iter()
            .filter(|p| kinds[index[p.as_str()]] == StorageKind::Class)
            .count();
        if class_parents > 1 || (class_parents == 1 && kinds[e] != StorageKind::Class) {
            return Err(SchemaError::Unsatisfiable {
                element: element.name.clone(),
            });
        }
    }

    trace!(
        "kind solve: {:?}",
        schema
            .elements
            .iter()
            .zip(&kinds)
            .map(|(e, k)| format!("{}={}", e.name, k))
            .collect::<Vec<_>>()
    );
    Ok(kinds)
}
