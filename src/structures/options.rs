//! The flat options record accepted by every structure builder, and its
//! resolution into per-structure settings.

use super::generate::{CellValue, Generation};
use crate::error::SceneError;
use crate::geometry::Point;
use crate::scene::ShapeStyle;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationKind {
    Param,
    Succeeding,
    Random,
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    Shuffle,
    Sorted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeStyle {
    #[default]
    Circles,
    /// Rectangular data blocks with left/right pointer blocks.
    Nice,
}

/// Caller-supplied ordering applied after generation.
#[derive(Clone)]
pub struct Comparator(Arc<dyn Fn(&CellValue, &CellValue) -> Ordering + Send + Sync>);

impl Comparator {
    pub fn new(compare: impl Fn(&CellValue, &CellValue) -> Ordering + Send + Sync + 'static) -> Self {
        Self(Arc::new(compare))
    }

    pub fn compare(&self, a: &CellValue, b: &CellValue) -> Ordering {
        (self.0)(a, b)
    }
}

impl fmt::Debug for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Comparator(..)")
    }
}

/// Options shared by arrays, lists and trees. Unknown keys are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StructureOptions {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub radius: Option<f32>,
    pub size: Option<f32>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub class: Option<String>,
    pub stroke: Option<String>,
    pub stroke_width: Option<f32>,
    pub fill: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<GenerationKind>,
    pub num: Option<usize>,
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub sort: Option<SortMode>,
    pub tree: Option<TreeStyle>,
    #[serde(skip)]
    pub comparator: Option<Comparator>,
}

impl StructureOptions {
    fn origin(&self) -> Point {
        Point::new(self.x.unwrap_or(0.0), self.y.unwrap_or(0.0))
    }

    fn style(&self) -> ShapeStyle {
        ShapeStyle {
            stroke: self.stroke.clone(),
            stroke_width: self.stroke_width,
            fill: self.fill.clone(),
        }
    }

    /// Caller classes followed by the structure's own class names.
    fn classes(&self, own: &[&str]) -> String {
        let mut classes: Vec<&str> = self
            .class
            .as_deref()
            .map(|class| class.split_whitespace().collect())
            .unwrap_or_default();
        classes.extend_from_slice(own);
        classes.join(" ")
    }
}

fn positive(field: &'static str, value: Option<f32>) -> Result<Option<f32>, SceneError> {
    match value {
        Some(v) if v <= 0.0 || v.is_nan() => Err(SceneError::InvalidOption {
            field,
            reason: format!("must be positive, got {v}"),
        }),
        other => Ok(other),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellShape {
    Circle { radius: f32 },
    Rect { width: f32, height: f32 },
}

#[derive(Debug, Clone)]
pub struct ArrayConfig {
    pub origin: Point,
    pub cell: CellShape,
    pub class: String,
    pub style: ShapeStyle,
    pub generation: Generation,
}

impl ArrayConfig {
    pub fn resolve(options: &StructureOptions, has_values: bool) -> Result<Self, SceneError> {
        let generation = Generation::resolve(options, has_values)?;
        let cell = match positive("radius", options.radius)? {
            Some(radius) => CellShape::Circle { radius },
            None => {
                let width = positive("width", options.width)?.ok_or(SceneError::MissingOption("radius"))?;
                let height = positive("height", options.height)?.unwrap_or(width);
                CellShape::Rect { width, height }
            }
        };
        Ok(Self {
            origin: options.origin(),
            cell,
            class: options.classes(&["array"]),
            style: options.style(),
            generation,
        })
    }

    /// Horizontal distance between neighbouring cells.
    pub fn pitch(&self) -> f32 {
        match self.cell {
            CellShape::Circle { radius } => 2.5 * radius,
            CellShape::Rect { width, .. } => width,
        }
    }

    /// Vertical offset of the swap arc.
    pub fn lift(&self) -> f32 {
        match self.cell {
            CellShape::Circle { radius } => 3.0 * radius,
            CellShape::Rect { height, .. } => 1.5 * height,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ListConfig {
    pub origin: Point,
    pub size: f32,
    pub class: String,
    pub style: ShapeStyle,
    pub generation: Generation,
}

impl ListConfig {
    pub fn resolve(options: &StructureOptions, has_values: bool, own: &str) -> Result<Self, SceneError> {
        let generation = Generation::resolve(options, has_values)?;
        let size = positive("size", options.size)?.ok_or(SceneError::MissingOption("size"))?;
        Ok(Self {
            origin: options.origin(),
            size,
            class: options.classes(&[own]),
            style: options.style(),
            generation,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TreeShape {
    Circle { radius: f32 },
    Block { size: f32 },
}

#[derive(Debug, Clone)]
pub struct TreeConfig {
    /// Horizontal span the levels are spread over.
    pub width: f32,
    pub x: f32,
    pub y: f32,
    pub shape: TreeShape,
    pub class: String,
    pub style: ShapeStyle,
    /// Absent when the tree is given as a nested description.
    pub generation: Option<Generation>,
}

impl TreeConfig {
    pub fn resolve(
        options: &StructureOptions,
        canvas_width: f32,
        generated: bool,
        has_values: bool,
    ) -> Result<Self, SceneError> {
        let generation = if generated {
            Some(Generation::resolve(options, has_values)?)
        } else {
            None
        };
        let shape = match options.tree.unwrap_or_default() {
            TreeStyle::Nice => TreeShape::Block {
                size: positive("size", options.size)?.ok_or(SceneError::MissingOption("size"))?,
            },
            TreeStyle::Circles => TreeShape::Circle {
                radius: positive("radius", options.radius)?
                    .ok_or(SceneError::MissingOption("radius"))?,
            },
        };
        Ok(Self {
            width: positive("width", options.width)?.unwrap_or(canvas_width),
            x: options.x.unwrap_or(0.0),
            y: options.y.unwrap_or(0.0),
            shape,
            class: options.classes(&["bTree"]),
            style: options.style(),
            generation,
        })
    }

    /// Horizontal centre of the `position`-th slot on `level`.
    pub fn slot(&self, level: u32, position: u32) -> f32 {
        let slots = 2f32.powi(level as i32) + 1.0;
        self.x + self.width / slots * (position as f32 + 1.0)
    }

    /// Vertical coordinate of `level`.
    pub fn level_y(&self, level: u32) -> f32 {
        let pitch = match self.shape {
            TreeShape::Circle { radius } => 4.0 * radius,
            TreeShape::Block { size } => 2.0 * size,
        };
        self.y + level as f32 * pitch
    }
}
