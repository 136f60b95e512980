//! 选择器层：候选表 + 解析器

pub mod candidates;
pub mod resolver;

pub use candidates::{Target, DETAIL_PATH_MARKER};
pub use resolver::{Resolution, SelectorResolver};
