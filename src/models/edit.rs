//! 笔画编辑（Edit）
//!
//! 一次编辑 = 一种颜色 + 一条折线；创建后不可变

use serde::{Deserialize, Serialize};

pub type Point = [f64; 2];

pub const STROKE_LABEL: &str = "Stroke";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Black,
    White,
    Red,
    Green,
    Blue,
}

impl Color {
    pub fn as_str(self) -> &'static str {
        match self {
            Color::Black => "black",
            Color::White => "white",
            Color::Red => "red",
            Color::Green => "green",
            Color::Blue => "blue",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edit {
    color: Color,
    stroke: Vec<Point>,
}

impl Edit {
    pub fn new(color: Color, stroke: Vec<Point>) -> Self {
        Self { color, stroke }
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn stroke(&self) -> &[Point] {
        &self.stroke
    }

    /// Label shown in the host's undo stack.
    pub fn label(&self) -> &'static str {
        STROKE_LABEL
    }
}
