//! 节点视图树：递归渲染XML元素，每个节点自己持有三个可折叠面板的状态
//!
//! 视图树与文档树一一对应；`rows()` 把可见部分展平为列表行供UI显示。

use crate::model::config::ViewerConfig;
use crate::model::data_core::AppError;
use crate::model::inspect::{attributes, child_elements, text_segments};
use crate::model::l8n::{L8nError, Localizer};
use crate::model::xml_doc::{XmlAttribute, XmlElement, MAX_NESTING_DEPTH};

/// 根节点路径
pub const ROOT_PATH: &str = "/";

/// 节点内的可折叠区域
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Attributes,
    Text,
    Children,
}

impl Section {
    /// 文本区域没有点击处理，只有属性和子节点可以通过标签切换
    pub fn is_toggleable(self) -> bool {
        !matches!(self, Section::Text)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Section::Attributes => "attributes",
            Section::Text => "text",
            Section::Children => "children",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "attributes" => Some(Section::Attributes),
            "text" => Some(Section::Text),
            "children" => Some(Section::Children),
            _ => None,
        }
    }
}

/// 标签的展开/折叠外观
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelState {
    Expanded,
    Collapsed,
}

/// 一个可折叠面板：面板的隐藏标记与其标签外观总是一起切换
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collapsible {
    pub hidden: bool,
    pub label: LabelState,
}

impl Default for Collapsible {
    fn default() -> Self {
        Self {
            hidden: false,
            label: LabelState::Expanded,
        }
    }
}

impl Collapsible {
    /// 切换并返回切换后是否展开
    pub fn toggle(&mut self) -> bool {
        self.set_expanded(self.hidden);
        self.is_expanded()
    }

    pub fn set_expanded(&mut self, expanded: bool) {
        self.hidden = !expanded;
        self.label = if expanded {
            LabelState::Expanded
        } else {
            LabelState::Collapsed
        };
    }

    pub fn is_expanded(&self) -> bool {
        !self.hidden
    }
}

/// 带标题的面板
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Panel<T> {
    pub header: String,
    pub items: T,
    pub state: Collapsible,
}

impl<T> Panel<T> {
    fn new(header: String, items: T) -> Self {
        Self {
            header,
            items,
            state: Collapsible::default(),
        }
    }
}

/// 列表行类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    NodeName,
    SectionHeader,
    Attribute,
    Text,
}

impl RowKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RowKind::NodeName => "node",
            RowKind::SectionHeader => "section",
            RowKind::Attribute => "attribute",
            RowKind::Text => "text",
        }
    }
}

/// 展平后的一行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewRow {
    pub kind: RowKind,
    /// 缩进层级
    pub depth: u32,
    pub label: String,
    pub value: String,
    /// 所属节点路径
    pub node_path: String,
    /// 标题行对应的区域
    pub section: Option<Section>,
    pub expanded: bool,
    pub toggleable: bool,
}

/// 一个元素的渲染结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeView {
    pub path: String,
    /// XML深度，根为0
    pub depth: u32,
    pub name_label: String,
    pub name: String,
    pub attribute_labels: (String, String),
    pub attributes: Option<Panel<Vec<XmlAttribute>>>,
    pub text: Option<Panel<Vec<String>>>,
    pub children: Panel<Vec<NodeView>>,
}

/// 每棵树只解析一次的固定标签
struct Labels {
    node_name: String,
    attributes: String,
    attribute_name: String,
    attribute_value: String,
    text: String,
}

impl Labels {
    fn resolve(l8n: &Localizer) -> Result<Self, L8nError> {
        Ok(Self {
            node_name: l8n.text("nodeNameLabel")?,
            attributes: l8n.text("attributesLabel")?,
            attribute_name: l8n.text("attributeNameLabel")?,
            attribute_value: l8n.text("attributeValueLabel")?,
            text: l8n.text("textContentLabel")?,
        })
    }
}

/// 从根元素渲染整棵视图树
///
/// 嵌套超过 `MAX_NESTING_DEPTH` 时返回 `AppError::TooDeep`，行展平与状态重置因此不会过深递归。
pub fn render_tree(
    root: &XmlElement,
    l8n: &Localizer,
    config: &ViewerConfig,
) -> Result<NodeView, AppError> {
    let labels = Labels::resolve(l8n)?;
    render_node(root, ROOT_PATH.to_string(), 0, &labels, l8n, config)
}

fn child_path(parent: &str, index: usize) -> String {
    if parent == ROOT_PATH {
        format!("/{}", index)
    } else {
        format!("{}/{}", parent, index)
    }
}

fn render_node(
    element: &XmlElement,
    path: String,
    depth: u32,
    labels: &Labels,
    l8n: &Localizer,
    config: &ViewerConfig,
) -> Result<NodeView, AppError> {
    if depth as usize >= MAX_NESTING_DEPTH {
        return Err(AppError::TooDeep {
            limit: MAX_NESTING_DEPTH,
        });
    }
    let attrs = attributes(element);
    let attributes = (!attrs.is_empty()).then(|| Panel::new(labels.attributes.clone(), attrs.to_vec()));

    let segments: Vec<String> = text_segments(element)
        .into_iter()
        .filter(|s| config.keep_whitespace_text || !s.trim().is_empty())
        .map(str::to_string)
        .collect();
    let text = (!segments.is_empty()).then(|| Panel::new(labels.text.clone(), segments));

    let kids = child_elements(element);
    let count = kids.len().to_string();
    let header = l8n.format("childNodesLabel", &[("count", count.as_str())])?;
    let children = kids
        .into_iter()
        .enumerate()
        .map(|(i, child)| render_node(child, child_path(&path, i), depth + 1, labels, l8n, config))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(NodeView {
        path,
        depth,
        name_label: labels.node_name.clone(),
        name: element.name.clone(),
        attribute_labels: (labels.attribute_name.clone(), labels.attribute_value.clone()),
        attributes,
        text,
        children: Panel::new(header, children),
    })
}

impl NodeView {
    /// 查找本节点持有的某个区域面板；该区域未渲染时返回 None
    pub fn panel(&self, section: Section) -> Option<&Collapsible> {
        match section {
            Section::Attributes => self.attributes.as_ref().map(|p| &p.state),
            Section::Text => self.text.as_ref().map(|p| &p.state),
            Section::Children => Some(&self.children.state),
        }
    }

    pub fn panel_mut(&mut self, section: Section) -> Option<&mut Collapsible> {
        match section {
            Section::Attributes => self.attributes.as_mut().map(|p| &mut p.state),
            Section::Text => self.text.as_mut().map(|p| &mut p.state),
            Section::Children => Some(&mut self.children.state),
        }
    }

    /// 切换本节点的一个区域，返回切换后是否展开
    ///
    /// 折叠子节点区域相当于卸载子树：后代的折叠状态恢复为默认。
    pub fn toggle(&mut self, section: Section) -> Option<bool> {
        let expanded = self.panel_mut(section)?.toggle();
        if section == Section::Children && !expanded {
            for child in &mut self.children.items {
                child.reset_state();
            }
        }
        Some(expanded)
    }

    fn reset_state(&mut self) {
        for section in [Section::Attributes, Section::Text, Section::Children] {
            if let Some(state) = self.panel_mut(section) {
                *state = Collapsible::default();
            }
        }
        for child in &mut self.children.items {
            child.reset_state();
        }
    }

    /// 全部展开/折叠属性与子节点区域（文本区域不受影响）
    pub fn set_all_expanded(&mut self, expanded: bool) {
        if let Some(p) = self.attributes.as_mut() {
            p.state.set_expanded(expanded);
        }
        self.children.state.set_expanded(expanded);
        for child in &mut self.children.items {
            child.set_all_expanded(expanded);
        }
    }

    /// 按路径查找节点，如 `/`、`/0/2`
    pub fn find(&self, path: &str) -> Option<&NodeView> {
        let mut node = self;
        for index in path_indices(path)? {
            node = node.children.items.get(index)?;
        }
        Some(node)
    }

    pub fn find_mut(&mut self, path: &str) -> Option<&mut NodeView> {
        let mut node = self;
        for index in path_indices(path)? {
            node = node.children.items.get_mut(index)?;
        }
        Some(node)
    }

    /// 子树中的元素数量（含自身）
    pub fn element_count(&self) -> usize {
        1 + self
            .children
            .items
            .iter()
            .map(NodeView::element_count)
            .sum::<usize>()
    }

    /// 展平可见内容
    pub fn rows(&self) -> Vec<ViewRow> {
        let mut out = Vec::with_capacity(64);
        self.push_rows(&mut out);
        out
    }

    fn header_row(&self, section: Section, header: &str, state: &Collapsible) -> ViewRow {
        ViewRow {
            kind: RowKind::SectionHeader,
            depth: self.depth * 2 + 1,
            label: header.to_string(),
            value: String::new(),
            node_path: self.path.clone(),
            section: Some(section),
            expanded: state.is_expanded(),
            toggleable: section.is_toggleable(),
        }
    }

    fn entry_row(&self, kind: RowKind, label: String, value: String) -> ViewRow {
        ViewRow {
            kind,
            depth: self.depth * 2 + 2,
            label,
            value,
            node_path: self.path.clone(),
            section: None,
            expanded: false,
            toggleable: false,
        }
    }

    fn push_rows(&self, out: &mut Vec<ViewRow>) {
        out.push(ViewRow {
            kind: RowKind::NodeName,
            depth: self.depth * 2,
            label: self.name_label.clone(),
            value: self.name.clone(),
            node_path: self.path.clone(),
            section: None,
            expanded: self.children.state.is_expanded(),
            toggleable: false,
        });

        if let Some(panel) = &self.attributes {
            out.push(self.header_row(Section::Attributes, &panel.header, &panel.state));
            if panel.state.is_expanded() {
                let (name_label, value_label) = &self.attribute_labels;
                for attr in &panel.items {
                    out.push(self.entry_row(
                        RowKind::Attribute,
                        format!("{} {}", name_label, attr.name),
                        format!("{} {}", value_label, attr.value),
                    ));
                }
            }
        }

        if let Some(panel) = &self.text {
            out.push(self.header_row(Section::Text, &panel.header, &panel.state));
            if panel.state.is_expanded() {
                for segment in &panel.items {
                    out.push(self.entry_row(RowKind::Text, String::new(), segment.clone()));
                }
            }
        }

        out.push(self.header_row(Section::Children, &self.children.header, &self.children.state));
        if self.children.state.is_expanded() {
            for child in &self.children.items {
                child.push_rows(out);
            }
        }
    }
}

pub(crate) fn path_indices(path: &str) -> Option<Vec<usize>> {
    let rest = path.strip_prefix('/')?;
    rest.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().ok())
        .collect()
}
