//! AppState：应用核心状态——已加载文档、节点视图树与本地化

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::model::config::ViewerConfig;
use crate::model::inspect::child_elements;
use crate::model::l8n::{L8nError, L8nTable, Localizer};
use crate::model::node_view::{path_indices, render_tree, NodeView, Section, ViewRow};
use crate::model::xml_doc::{XmlDocument, XmlElement};
use crate::utils::fs::read_xml_file;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("XML parse error at {line}:{column}: {message}")]
    Parse { line: u32, column: u32, message: String },
    #[error("XML nesting exceeds {limit} levels")]
    TooDeep { limit: usize },
    #[error(transparent)]
    L8n(#[from] L8nError),
    #[error("{0}")]
    State(String),
}

impl From<roxmltree::Error> for AppError {
    fn from(e: roxmltree::Error) -> Self {
        let pos = e.pos();
        AppError::Parse {
            line: pos.row,
            column: pos.col,
            message: e.to_string(),
        }
    }
}

#[derive(Debug)]
pub struct AppState {
    pub config: ViewerConfig,
    l8n: Localizer,
    pub source_path: Option<PathBuf>,
    pub document: Option<XmlDocument>,
    pub view: Option<NodeView>,
    load_error: Option<String>,
}

impl AppState {
    pub fn new(config: ViewerConfig, table: &L8nTable) -> Result<Self, AppError> {
        let l8n = Localizer::new(&config.region, table)?;
        Ok(Self {
            config,
            l8n,
            source_path: None,
            document: None,
            view: None,
            load_error: None,
        })
    }

    pub fn l8n(&self) -> &Localizer {
        &self.l8n
    }

    /// 同步加载XML文件并渲染视图树
    pub fn load_file(&mut self, p: &Path) -> Result<(), AppError> {
        let result = read_xml_file(p);
        self.apply_load_result(p, result)
    }

    /// 应用一次加载结果（异步加载在UI线程回调中调用）
    ///
    /// 失败时清空旧文档并记录本地化的失败信息，界面据此显示错误而不是空白。
    pub fn apply_load_result(
        &mut self,
        p: &Path,
        result: Result<XmlDocument, AppError>,
    ) -> Result<(), AppError> {
        self.source_path = Some(p.to_path_buf());

        let rendered = result.and_then(|doc| {
            let view = render_tree(doc.root(), &self.l8n, &self.config)?;
            Ok((doc, view))
        });

        match rendered {
            Ok((doc, view)) => {
                tracing::info!("文档已渲染: {}，{} 个元素", p.display(), view.element_count());
                self.document = Some(doc);
                self.view = Some(view);
                self.load_error = None;
                Ok(())
            }
            Err(e) => {
                let reason = e.to_string();
                self.document = None;
                self.view = None;
                self.load_error = Some(
                    self.l8n
                        .format("loadFailed", &[("reason", reason.as_str())])
                        .unwrap_or_else(|_| reason.clone()),
                );
                tracing::error!("文件加载失败: {}: {}", p.display(), e);
                Err(e)
            }
        }
    }

    /// 最近一次加载失败的提示文本
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    /// 点击区域标题：切换该节点的属性或子节点区域，返回切换后是否展开
    pub fn toggle_section(&mut self, path: &str, section: Section) -> Result<bool, AppError> {
        if !section.is_toggleable() {
            return Err(AppError::State(format!(
                "section '{}' is not interactive",
                section.as_str()
            )));
        }
        let view = self
            .view
            .as_mut()
            .ok_or_else(|| AppError::State("no document loaded".into()))?;
        let node = view
            .find_mut(path)
            .ok_or_else(|| AppError::State(format!("unknown node path: {}", path)))?;
        let expanded = node.toggle(section).ok_or_else(|| {
            AppError::State(format!("node {} has no {} section", path, section.as_str()))
        })?;

        tracing::debug!("切换 {} {} -> {}", path, section.as_str(), expanded);
        Ok(expanded)
    }

    pub fn set_all_expanded(&mut self, expanded: bool) -> Result<(), AppError> {
        let view = self
            .view
            .as_mut()
            .ok_or_else(|| AppError::State("no document loaded".into()))?;
        view.set_all_expanded(expanded);
        Ok(())
    }

    /// 当前可见的行
    pub fn rows(&self) -> Vec<ViewRow> {
        self.view.as_ref().map(NodeView::rows).unwrap_or_default()
    }

    pub fn node_name(&self, path: &str) -> Option<&str> {
        self.view.as_ref()?.find(path).map(|n| n.name.as_str())
    }

    /// 按路径取元素的原始XML片段（用于复制节点）
    pub fn element_source(&self, path: &str) -> Result<&str, AppError> {
        let doc = self
            .document
            .as_ref()
            .ok_or_else(|| AppError::State("no document loaded".into()))?;
        let element = element_at(doc.root(), path)
            .ok_or_else(|| AppError::State(format!("unknown node path: {}", path)))?;
        Ok(doc.source_of(element))
    }
}

fn element_at<'a>(root: &'a XmlElement, path: &str) -> Option<&'a XmlElement> {
    let mut element = root;
    for index in path_indices(path)? {
        element = child_elements(element).get(index).copied()?;
    }
    Some(element)
}
