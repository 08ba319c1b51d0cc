//! Conditional formatting rules.
//!
//! A [`ConditionalFormat`] applies an ordered list of rules to a range.
//! Rules are evaluated by ascending `priority`; a matched rule with
//! `stop_if_true` ends evaluation for that cell.

use serde::{Deserialize, Serialize};

use crate::cell::{CellStyle, CellValue};
use crate::ids::ObjectId;

fn is_false(b: &bool) -> bool {
    !*b
}

/// Comparison used by value rules and data validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ComparisonOperator {
    Between,
    NotBetween,
    Equal,
    NotEqual,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
}

impl ComparisonOperator {
    /// Compare `value` against `bounds`.
    ///
    /// Range operators need two bounds (order-insensitive), the rest need one;
    /// missing bounds never match.
    pub fn compare(&self, value: f64, bounds: &[f64]) -> bool {
        match self {
            ComparisonOperator::Between | ComparisonOperator::NotBetween => {
                let [a, b] = match bounds {
                    [a, b, ..] => [*a, *b],
                    _ => return false,
                };
                let inside = value >= a.min(b) && value <= a.max(b);
                if *self == ComparisonOperator::Between { inside } else { !inside }
            }
            _ => {
                let Some(&bound) = bounds.first() else {
                    return false;
                };
                match self {
                    ComparisonOperator::Equal => value == bound,
                    ComparisonOperator::NotEqual => value != bound,
                    ComparisonOperator::GreaterThan => value > bound,
                    ComparisonOperator::LessThan => value < bound,
                    ComparisonOperator::GreaterThanOrEqual => value >= bound,
                    ComparisonOperator::LessThanOrEqual => value <= bound,
                    ComparisonOperator::Between | ComparisonOperator::NotBetween => false,
                }
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RuleKind {
    CellValue,
    ContainsText,
    Expression,
    ColorScale,
    DataBar,
    IconSet,
    Top10,
    Duplicate,
}

/// One rule of a conditional format.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalRule {
    #[serde(rename = "type")]
    pub kind: RuleKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<ComparisonOperator>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<CellStyle>,
    /// Lower evaluates first.
    #[serde(default)]
    pub priority: i32,
    #[serde(default, skip_serializing_if = "is_false")]
    pub stop_if_true: bool,
}

impl ConditionalRule {
    /// Built-in evaluation for `cellValue` and `containsText` rules.
    ///
    /// Other kinds depend on the whole range or on formula evaluation and
    /// report `false` here.
    pub fn matches_value(&self, value: &CellValue) -> bool {
        match self.kind {
            RuleKind::CellValue => {
                let Some(n) = value.as_number() else {
                    return false;
                };
                let bounds: Vec<f64> =
                    self.values.iter().filter_map(|v| v.trim().parse().ok()).collect();
                self.operator
                    .unwrap_or(ComparisonOperator::Equal)
                    .compare(n, &bounds)
            }
            RuleKind::ContainsText => {
                let haystack = value.as_text().to_lowercase();
                self.values
                    .first()
                    .is_some_and(|needle| haystack.contains(&needle.to_lowercase()))
            }
            _ => false,
        }
    }
}

/// Ordered rules applied to a cell range.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalFormat {
    pub id: ObjectId,
    /// Range in A1 notation (`"A1:C10"`).
    pub range: String,
    #[serde(default)]
    pub rules: Vec<ConditionalRule>,
}

impl ConditionalFormat {
    /// Rules sorted by ascending priority; ties keep their list order.
    pub fn evaluation_order(&self) -> Vec<&ConditionalRule> {
        let mut rules: Vec<&ConditionalRule> = self.rules.iter().collect();
        rules.sort_by_key(|r| r.priority);
        rules
    }

    /// Walk rules in evaluation order, collecting those `matched` accepts.
    ///
    /// Evaluation stops after the first matched rule with `stop_if_true`.
    pub fn applicable_rules<F>(&self, mut matched: F) -> Vec<&ConditionalRule>
    where
        F: FnMut(&ConditionalRule) -> bool,
    {
        let mut hits = Vec::new();
        for rule in self.evaluation_order() {
            if matched(rule) {
                hits.push(rule);
                if rule.stop_if_true {
                    break;
                }
            }
        }
        hits
    }

    /// Effective style for a cell value: styles of the applicable rules
    /// layered so the earliest-evaluated rule wins.
    pub fn style_for(&self, value: &CellValue) -> Option<CellStyle> {
        let hits = self.applicable_rules(|rule| rule.matches_value(value));
        hits.iter()
            .rev()
            .filter_map(|rule| rule.style.as_ref())
            .fold(None, |acc: Option<CellStyle>, style| {
                Some(match acc {
                    Some(base) => base.merged(style),
                    None => style.clone(),
                })
            })
    }
}
