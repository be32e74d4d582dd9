//! zdraw - 二进制绘图文档的编辑器核心
//!
//! 模块结构：
//! - core: 事件发布/订阅
//! - models: 数据模型（Edit, EditHistory, ResourceUri）
//! - services: 服务层（文件 Provider、备份、配置）
//! - webview: 渲染端句柄、注册表、请求/响应桥
//! - document: 文档生命周期与持久化
//! - provider: 编辑器编排（打开、绑定、保存、还原、备份）
//! - host: 按行驱动的宿主会话（stdio 二进制使用）

pub mod core;
pub mod document;
pub mod error;
pub mod host;
pub mod models;
pub mod provider;
pub mod services;
pub mod webview;

pub use document::{Document, DocumentDelegate, DocumentEditEvent};
pub use error::{EditorError, Result};
pub use provider::{BackupContext, CustomDocumentEditEvent, EditorProvider, OpenContext};
