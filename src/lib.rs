//! XML树查看器库
//!
//! 提供XML文件加载、节点检查、递归节点视图渲染与本地化标签，
//! 遵循MVVM架构模式：model 负责数据与视图树，vm 负责UI无关的展示文本。

pub mod model;
pub mod utils;
pub mod vm;

// 重新导出主要类型
pub use model::config::ViewerConfig;
pub use model::data_core::{AppError, AppState};
pub use model::l8n::{L8nError, L8nTable, Localizer};
pub use model::node_view::{render_tree, NodeView, RowKind, Section, ViewRow};
pub use model::xml_doc::{XmlAttribute, XmlDocument, XmlElement, XmlNode};
