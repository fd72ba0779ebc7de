//! User-authored, serializable category descriptions.

use serde::{Deserialize, Serialize};
use serde_json::{json, Number, Value};

use super::predicate::CompareOp;

/// Which filter a blueprint's `config` feeds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum FilterKind {
    /// `config = [pattern, column]`
    Regex,
    /// `config = [operator, number]` tested against the amount.
    Comparison,
    /// `config = pattern` searched in both labels.
    MovementTarget,
    /// `config = expression`
    Custom,
}

/// A category description as stored in `bankviz-category` files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBlueprint {
    pub name: String,
    pub filter: FilterKind,
    #[serde(default)]
    pub config: Value,
    #[serde(default)]
    pub sub: Vec<CategoryBlueprint>,
}

impl Default for CategoryBlueprint {
    fn default() -> Self {
        Self::regex("unnamed", "", "")
    }
}

impl CategoryBlueprint {
    pub fn regex(name: impl Into<String>, pattern: &str, column: &str) -> Self {
        Self::with_config(name, FilterKind::Regex, json!([pattern, column]))
    }

    pub fn comparison(name: impl Into<String>, op: CompareOp, operand: f64) -> Self {
        let operand = Number::from_f64(operand)
            .map(Value::Number)
            .unwrap_or(Value::Null);
        Self::with_config(name, FilterKind::Comparison, json!([op.symbol(), operand]))
    }

    pub fn movement_target(name: impl Into<String>, pattern: &str) -> Self {
        Self::with_config(name, FilterKind::MovementTarget, json!(pattern))
    }

    pub fn custom(name: impl Into<String>, expression: &str) -> Self {
        Self::with_config(name, FilterKind::Custom, json!(expression))
    }

    fn with_config(name: impl Into<String>, filter: FilterKind, config: Value) -> Self {
        Self {
            name: name.into(),
            filter,
            config,
            sub: Vec::new(),
        }
    }

    pub fn with_sub(mut self, sub: Vec<CategoryBlueprint>) -> Self {
        self.sub = sub;
        self
    }

    pub fn push_sub(&mut self, child: CategoryBlueprint) -> &mut CategoryBlueprint {
        self.sub.push(child);
        let last = self.sub.len() - 1;
        &mut self.sub[last]
    }

    /// Number of blueprints in this subtree, itself included.
    pub fn subtree_size(&self) -> usize {
        1 + self
            .sub
            .iter()
            .map(CategoryBlueprint::subtree_size)
            .sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_to_category_file_shape() {
        let blueprint = CategoryBlueprint::movement_target("Family", "MUM|DAD")
            .with_sub(vec![CategoryBlueprint::comparison("Gifts", CompareOp::Gt, 50.0)]);
        let value = serde_json::to_value(&blueprint).expect("serialize");
        assert_eq!(
            value,
            json!({
                "name": "Family",
                "filter": "MovementTarget",
                "config": "MUM|DAD",
                "sub": [{
                    "name": "Gifts",
                    "filter": "Comparison",
                    "config": [">", 50.0],
                    "sub": []
                }]
            })
        );
        let back: CategoryBlueprint = serde_json::from_value(value).expect("deserialize");
        assert_eq!(back, blueprint);
        assert_eq!(back.subtree_size(), 2);
    }

    #[test]
    fn default_blueprint_is_an_empty_regex() {
        let blueprint = CategoryBlueprint::default();
        assert_eq!(blueprint.name, "unnamed");
        assert_eq!(blueprint.filter, FilterKind::Regex);
        assert_eq!(blueprint.config, json!(["", ""]));
    }

    #[test]
    fn missing_sub_defaults_to_empty() {
        let blueprint: CategoryBlueprint = serde_json::from_str(
            r#"{"name": "Rent", "filter": "Custom", "config": "note contains 'rent'"}"#,
        )
        .expect("deserialize");
        assert!(blueprint.sub.is_empty());
    }
}
