//! Floating objects placed on a sheet: images, shapes, charts, links, symbols.
//!
//! Images, shapes and charts are positioned, sized, rotatable and layered
//! (`layer` is the z-index). Each may be anchored to a cell so it moves with
//! the grid. Ids are unique within their collection on one sheet.

use serde::{Deserialize, Serialize};

use crate::ids::{CellKey, ObjectId};

fn is_false(b: &bool) -> bool {
    !*b
}

/// Common surface of sheet-scoped objects kept in id-addressed lists.
pub trait SheetObject {
    fn id(&self) -> &str;
}

/// Objects drawn above the grid.
pub trait VisualObject: SheetObject {
    fn layer(&self) -> i32;
}

/// Position and size in grid pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Placement {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageObject {
    pub id: ObjectId,
    /// URL or content id of the image bytes.
    pub src: String,
    #[serde(flatten)]
    pub placement: Placement,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub layer: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor_cell: Option<CellKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

impl ImageObject {
    pub fn new(id: impl Into<ObjectId>, src: impl Into<String>, placement: Placement) -> Self {
        Self {
            id: id.into(),
            src: src.into(),
            placement,
            rotation: 0.0,
            layer: 0,
            anchor_cell: None,
            alt: None,
            opacity: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShapeKind {
    Rectangle,
    RoundedRectangle,
    Ellipse,
    Triangle,
    Line,
    Arrow,
    Star,
    TextBox,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeObject {
    pub id: ObjectId,
    #[serde(rename = "type")]
    pub kind: ShapeKind,
    #[serde(flatten)]
    pub placement: Placement,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub layer: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor_cell: Option<CellKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ShapeObject {
    pub fn new(id: impl Into<ObjectId>, kind: ShapeKind, placement: Placement) -> Self {
        Self {
            id: id.into(),
            kind,
            placement,
            rotation: 0.0,
            layer: 0,
            anchor_cell: None,
            fill: None,
            stroke: None,
            stroke_width: None,
            text: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartKind {
    Bar,
    Column,
    Line,
    Area,
    Pie,
    Doughnut,
    Scatter,
    Radar,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegendPosition {
    Top,
    Bottom,
    Left,
    Right,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegendOptions {
    #[serde(default = "default_true")]
    pub show: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<LegendPosition>,
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub show_grid_lines: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesOptions {
    pub name: String,
    /// Range holding this series' values.
    pub data_range: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legend: Option<LegendOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_axis: Option<AxisOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_axis: Option<AxisOptions>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub series: Vec<SeriesOptions>,
    /// Color palette, applied to series in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub colors: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartObject {
    pub id: ObjectId,
    #[serde(rename = "type")]
    pub kind: ChartKind,
    /// Source range in A1 notation.
    pub data_range: String,
    #[serde(flatten)]
    pub placement: Placement,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub layer: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor_cell: Option<CellKey>,
    #[serde(default)]
    pub options: ChartOptions,
}

impl ChartObject {
    pub fn new(
        id: impl Into<ObjectId>,
        kind: ChartKind,
        data_range: impl Into<String>,
        placement: Placement,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            data_range: data_range.into(),
            placement,
            rotation: 0.0,
            layer: 0,
            anchor_cell: None,
            options: ChartOptions::default(),
        }
    }
}

/// A hyperlink object attached to a cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkObject {
    pub id: ObjectId,
    pub cell_key: CellKey,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// A special character or icon inserted into a cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolObject {
    pub id: ObjectId,
    pub cell_key: CellKey,
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
}

macro_rules! impl_sheet_object {
    ($($T:ty),*) => {
        $(impl SheetObject for $T {
            fn id(&self) -> &str {
                &self.id
            }
        })*
    };
}

macro_rules! impl_visual_object {
    ($($T:ty),*) => {
        $(impl VisualObject for $T {
            fn layer(&self) -> i32 {
                self.layer
            }
        })*
    };
}

impl_sheet_object!(ImageObject, ShapeObject, ChartObject, LinkObject, SymbolObject);
impl_visual_object!(ImageObject, ShapeObject, ChartObject);

impl SheetObject for crate::format::ConditionalFormat {
    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placement_is_flattened_on_the_wire() {
        let img = ImageObject::new("img-1", "b3abc", Placement::new(1.0, 2.0, 30.0, 40.0));
        let v = serde_json::to_value(&img).unwrap();
        assert_eq!(v["x"], 1.0);
        assert_eq!(v["height"], 40.0);
        assert!(v.get("placement").is_none());
        let back: ImageObject = serde_json::from_value(v).unwrap();
        assert_eq!(back, img);
    }

    #[test]
    fn test_chart_options_roundtrip() {
        let mut chart = ChartObject::new("c1", ChartKind::Line, "A1:B10", Placement::default());
        chart.options = ChartOptions {
            title: Some("Revenue".into()),
            legend: Some(LegendOptions { show: true, position: Some(LegendPosition::Bottom) }),
            x_axis: None,
            y_axis: Some(AxisOptions { min: Some(0.0), ..Default::default() }),
            series: vec![SeriesOptions {
                name: "2024".into(),
                data_range: "B1:B10".into(),
                color: None,
            }],
            colors: vec!["#336699".into()],
        };
        let json = serde_json::to_string(&chart).unwrap();
        assert!(json.contains("\"dataRange\":\"A1:B10\""));
        assert!(json.contains("\"yAxis\""));
        let back: ChartObject = serde_json::from_str(&json).unwrap();
        assert_eq!(back, chart);
    }

    #[test]
    fn test_object_traits() {
        let shape = ShapeObject {
            layer: 4,
            ..ShapeObject::new("s1", ShapeKind::Arrow, Placement::default())
        };
        assert_eq!(shape.id(), "s1");
        assert_eq!(shape.layer(), 4);
    }
}
