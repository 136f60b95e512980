//! 基础设施层：持有页面资源，只暴露能力

pub mod chromium_driver;
pub mod js_executor;
pub mod mock_page;
pub mod page_driver;

pub use chromium_driver::ChromiumDriver;
pub use js_executor::JsExecutor;
pub use mock_page::{MockDocument, MockElement, MockNode, MockPage};
pub use page_driver::{FieldSchema, PageDriver, Scope};
