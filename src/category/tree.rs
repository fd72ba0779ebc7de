use std::collections::HashSet;

use rust_decimal::Decimal;
use tracing::warn;

use super::{blueprint::CategoryBlueprint, predicate::Predicate};
use crate::{domain::Record, errors::CategoryError};

/// Suffix of the catch-all bucket computed under every node with children.
pub const OTHER_SUFFIX: &str = "other";

/// A compiled category: its predicate plus compiled children.
#[derive(Debug, Clone)]
pub struct CategoryNode {
    name: String,
    path: String,
    predicate: Predicate,
    children: Vec<CategoryNode>,
}

impl CategoryNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fully-qualified dotted name, the key used in [`CategorizationResult`].
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    pub fn children(&self) -> &[CategoryNode] {
        &self.children
    }

    /// Key of the synthetic bucket under this node, when it has children.
    pub fn other_path(&self) -> Option<String> {
        (!self.children.is_empty()).then(|| format!("{}.{}", self.path, OTHER_SUFFIX))
    }

    fn compile(blueprint: &CategoryBlueprint, parent: Option<&str>) -> Result<Self, CategoryError> {
        let name = blueprint.name.trim().to_string();
        if name.is_empty() {
            return Err(CategoryError::EmptyName(parent.unwrap_or_default().to_string()));
        }
        if name.contains('.') {
            return Err(CategoryError::DottedName(name));
        }
        let path = match parent {
            Some(parent) => format!("{parent}.{name}"),
            None => name.clone(),
        };
        if parent.is_some() && name == OTHER_SUFFIX {
            return Err(CategoryError::ReservedName(path));
        }

        let predicate = Predicate::compile(blueprint).unwrap_or_else(|reason| {
            warn!(
                target: "bankviz::category",
                category = %path,
                %reason,
                "invalid filter, category will match nothing"
            );
            Predicate::Never
        });
        let children = compile_level(&blueprint.sub, Some(&path))?;
        Ok(Self {
            name,
            path,
            predicate,
            children,
        })
    }
}

fn compile_level(
    blueprints: &[CategoryBlueprint],
    parent: Option<&str>,
) -> Result<Vec<CategoryNode>, CategoryError> {
    let mut seen = HashSet::new();
    let mut nodes = Vec::with_capacity(blueprints.len());
    for blueprint in blueprints {
        let node = CategoryNode::compile(blueprint, parent)?;
        if !seen.insert(node.name.clone()) {
            return Err(CategoryError::Duplicate(node.path));
        }
        nodes.push(node);
    }
    Ok(nodes)
}

/// Compiled forest of categories, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct CategoryTree {
    roots: Vec<CategoryNode>,
}

impl CategoryTree {
    /// Compiles `blueprints`, rejecting name collisions.
    ///
    /// Filters that fail to compile do not fail the build; they log and match nothing.
    pub fn build(blueprints: &[CategoryBlueprint]) -> Result<Self, CategoryError> {
        Ok(Self {
            roots: compile_level(blueprints, None)?,
        })
    }

    pub fn roots(&self) -> &[CategoryNode] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Every key `categorize` produces, in result order.
    pub fn keys(&self) -> Vec<String> {
        fn walk(nodes: &[CategoryNode], out: &mut Vec<String>) {
            for node in nodes {
                out.push(node.path.clone());
                walk(&node.children, out);
                out.extend(node.other_path());
            }
        }
        let mut keys = Vec::new();
        walk(&self.roots, &mut keys);
        keys
    }

    pub fn categorize(&self, records: &[&Record]) -> CategorizationResult {
        categorize(records, self)
    }
}

/// Flat sum per fully-qualified category name, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorizationResult {
    entries: Vec<(String, Decimal)>,
}

impl CategorizationResult {
    pub fn get(&self, name: &str) -> Option<Decimal> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, total)| *total)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Decimal)> {
        self.entries.iter().map(|(key, total)| (key.as_str(), *total))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(&mut self, key: String, total: Decimal) {
        debug_assert!(self.get(&key).is_none(), "duplicate category key {key}");
        self.entries.push((key, total));
    }
}

/// Sums `records` per category.
///
/// Every node sees all records of its level, so siblings may count the same record.
/// Below a parent, records matched by none of the children land in `<parent>.other`;
/// the top level has no such bucket.
pub fn categorize(records: &[&Record], tree: &CategoryTree) -> CategorizationResult {
    let mut result = CategorizationResult::default();
    categorize_level(records, &tree.roots, None, &mut result);
    result
}

fn categorize_level(
    records: &[&Record],
    nodes: &[CategoryNode],
    parent: Option<&CategoryNode>,
    result: &mut CategorizationResult,
) {
    let mut used = vec![false; records.len()];
    for node in nodes {
        let mut matched = Vec::new();
        for (index, record) in records.iter().enumerate() {
            if node.predicate.matches(record) {
                used[index] = true;
                matched.push(*record);
            }
        }
        result.push(node.path.clone(), sum(&matched));
        if !node.children.is_empty() {
            categorize_level(&matched, &node.children, Some(node), result);
        }
    }
    if let Some(other) = parent.and_then(CategoryNode::other_path) {
        let unused: Vec<&Record> = records
            .iter()
            .zip(&used)
            .filter(|(_, used)| !**used)
            .map(|(record, _)| *record)
            .collect();
        result.push(other, sum(&unused));
    }
}

fn sum(records: &[&Record]) -> Decimal {
    records.iter().map(|record| record.amount()).sum()
}
