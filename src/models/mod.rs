//! 数据模型层

pub mod edit;
pub mod edit_history;
pub mod resource;

pub use edit::{Color, Edit, Point, STROKE_LABEL};
pub use edit_history::EditHistory;
pub use resource::{ResourceUri, FILE_SCHEME, UNTITLED_SCHEME};
