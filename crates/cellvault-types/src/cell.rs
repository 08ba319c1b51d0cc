//! Cell contents, styles and per-cell attachments.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::format::ComparisonOperator;
use crate::ids::CellKey;

fn is_false(b: &bool) -> bool {
    !*b
}

/// Display/computed value of a cell.
///
/// Untagged on the wire: a JSON string, number, boolean or `null`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Boolean(bool),
    Number(f64),
    Text(String),
    #[default]
    Null,
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Null or the empty string.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Numeric view: numbers as-is, numeric text parsed, booleans as 0/1.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => s.trim().parse().ok(),
            CellValue::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            CellValue::Null => None,
        }
    }

    /// Text rendering used for text comparisons and length checks.
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Boolean(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            CellValue::Null => String::new(),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

/// Explicit type tag carried alongside a value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum CellType {
    Text,
    Number,
    Boolean,
    Date,
    Currency,
    Percentage,
    Formula,
    Error,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAlign {
    Left,
    Center,
    Right,
    Justify,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlign {
    Top,
    Middle,
    Bottom,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorderStyle {
    Thin,
    Medium,
    Thick,
    Dashed,
    Dotted,
    Double,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorderSide {
    pub style: BorderStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Borders {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<BorderSide>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<BorderSide>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom: Option<BorderSide>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<BorderSide>,
}

impl Borders {
    /// Side-by-side merge: sides present in `patch` win.
    pub fn merged(&self, patch: &Borders) -> Borders {
        Borders {
            top: patch.top.clone().or_else(|| self.top.clone()),
            right: patch.right.clone().or_else(|| self.right.clone()),
            bottom: patch.bottom.clone().or_else(|| self.bottom.clone()),
            left: patch.left.clone().or_else(|| self.left.clone()),
        }
    }
}

/// Visual style of a cell.
///
/// Every field is optional so a style doubles as a partial update: absent
/// fields inherit from whatever the style is merged into.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strikethrough: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horizontal_align: Option<HorizontalAlign>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertical_align: Option<VerticalAlign>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrap_text: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_rotation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indent: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub borders: Option<Borders>,
}

impl CellStyle {
    /// Merge `patch` over `self`. Fields present in the patch win; borders
    /// merge per side.
    pub fn merged(&self, patch: &CellStyle) -> CellStyle {
        macro_rules! pick {
            ($field:ident) => {
                patch.$field.clone().or_else(|| self.$field.clone())
            };
        }
        let borders = match (&self.borders, &patch.borders) {
            (Some(base), Some(over)) => Some(base.merged(over)),
            (base, over) => over.clone().or_else(|| base.clone()),
        };
        CellStyle {
            font_family: pick!(font_family),
            font_size: pick!(font_size),
            font_color: pick!(font_color),
            bold: pick!(bold),
            italic: pick!(italic),
            underline: pick!(underline),
            strikethrough: pick!(strikethrough),
            background_color: pick!(background_color),
            horizontal_align: pick!(horizontal_align),
            vertical_align: pick!(vertical_align),
            wrap_text: pick!(wrap_text),
            text_rotation: pick!(text_rotation),
            indent: pick!(indent),
            number_format: pick!(number_format),
            borders,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == CellStyle::default()
    }
}

/// Extent of a merged region, counted from the merge parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeSpan {
    pub rows: u32,
    pub cols: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidationKind {
    List,
    WholeNumber,
    Decimal,
    Date,
    TextLength,
    Custom,
}

/// Data-entry rule attached to a cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataValidation {
    #[serde(rename = "type")]
    pub kind: ValidationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<ComparisonOperator>,
    /// List items for `list`, comparison bounds otherwise.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(default = "default_true")]
    pub allow_blank: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub show_dropdown: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

fn default_true() -> bool {
    true
}

impl DataValidation {
    /// A list rule accepting exactly `items`.
    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: ValidationKind::List,
            operator: None,
            values: items.into_iter().map(Into::into).collect(),
            formula: None,
            allow_blank: true,
            show_dropdown: true,
            input_message: None,
            error_message: None,
        }
    }

    /// Check a candidate value against this rule.
    ///
    /// `date` and `custom` rules need formula evaluation and always accept.
    pub fn accepts(&self, value: &CellValue) -> bool {
        if value.is_blank() {
            return self.allow_blank;
        }
        let bounds: Vec<f64> = self.values.iter().filter_map(|v| v.trim().parse().ok()).collect();
        let op = self.operator.unwrap_or(ComparisonOperator::Between);
        match self.kind {
            ValidationKind::List => {
                let text = value.as_text();
                self.values.iter().any(|item| *item == text)
            }
            ValidationKind::WholeNumber => match value.as_number() {
                Some(n) if n.fract() == 0.0 => op.compare(n, &bounds),
                _ => false,
            },
            ValidationKind::Decimal => value.as_number().is_some_and(|n| op.compare(n, &bounds)),
            ValidationKind::TextLength => op.compare(value.as_text().chars().count() as f64, &bounds),
            ValidationKind::Date | ValidationKind::Custom => true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SparklineKind {
    Line,
    Column,
    WinLoss,
}

/// In-cell miniature chart over a data range.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sparkline {
    #[serde(rename = "type")]
    pub kind: SparklineKind,
    pub data_range: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_color: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub show_markers: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_width: Option<f64>,
}

/// Everything stored for one cell.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellData {
    #[serde(default)]
    pub value: CellValue,
    /// Raw formula text including the leading `=`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub cell_type: Option<CellType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<CellStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hyperlink: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<DataValidation>,
    /// Key of the merge parent this cell is covered by.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merged_with: Option<CellKey>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_merge_parent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_span: Option<MergeSpan>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub locked: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sparkline: Option<Sparkline>,
}

impl CellData {
    /// A cell holding just a value.
    pub fn with_value(value: impl Into<CellValue>) -> Self {
        Self {
            value: value.into(),
            ..Default::default()
        }
    }

    pub fn has_formula(&self) -> bool {
        self.formula.as_deref().is_some_and(|f| !f.is_empty())
    }
}
