//! VM桥接层：连接Slint UI与AppState数据模型
//!
//! 注意：窗口回调的具体实现在main.rs中，因为依赖于Slint生成的类型。
//! 这里放与UI类型无关的部分：状态栏文本的本地化键与格式化。

use std::path::Path;
use std::time::Duration;

use crate::model::l8n::{L8nError, Localizer};

// === 本地化键（消除魔法值） ===
pub const KEY_WINDOW_TITLE: &str = "windowTitle";
pub const KEY_OPEN_FILE: &str = "openFileButton";
pub const KEY_EXPAND_ALL: &str = "expandAllButton";
pub const KEY_COLLAPSE_ALL: &str = "collapseAllButton";
pub const KEY_COPY_NODE: &str = "copyNodeButton";
pub const KEY_DIALOG_TITLE: &str = "fileDialogTitle";
pub const KEY_FILTER_XML: &str = "fileFilterXml";
pub const KEY_FILTER_ALL: &str = "fileFilterAll";
pub const KEY_STATUS_READY: &str = "statusReady";
pub const KEY_STATUS_NO_FILE: &str = "statusNoFileSelected";
pub const KEY_STATUS_BUSY: &str = "statusBusy";
pub const KEY_STATUS_NOTHING_TO_COPY: &str = "statusNothingToCopy";
pub const KEY_STATUS_EXPANDED_ALL: &str = "statusExpandedAll";
pub const KEY_STATUS_COLLAPSED_ALL: &str = "statusCollapsedAll";

/// 文件对话框可选的扩展名
pub const XML_EXTENSIONS: &[&str] = &["xml", "xsd", "xsl", "xslt", "svg", "rss", "atom", "plist"];

/// 显示用的文件名
pub fn display_name(p: &Path) -> String {
    p.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| p.display().to_string())
}

pub fn status_loading(l8n: &Localizer, p: &Path) -> Result<String, L8nError> {
    let file = display_name(p);
    l8n.format("statusLoading", &[("file", file.as_str())])
}

pub fn status_loaded(
    l8n: &Localizer,
    p: &Path,
    elements: usize,
    elapsed: Duration,
) -> Result<String, L8nError> {
    let file = display_name(p);
    let count = elements.to_string();
    let millis = elapsed.as_millis().to_string();
    l8n.format(
        "statusLoaded",
        &[("file", file.as_str()), ("count", count.as_str()), ("millis", millis.as_str())],
    )
}

pub fn status_toggled(l8n: &Localizer, node: &str, expanded: bool) -> Result<String, L8nError> {
    let action = l8n.text(if expanded { "actionExpanded" } else { "actionCollapsed" })?;
    l8n.format("statusSectionToggled", &[("action", action.as_str()), ("node", node)])
}

pub fn status_copied(l8n: &Localizer, node: &str) -> Result<String, L8nError> {
    l8n.format("statusCopied", &[("node", node)])
}

pub fn status_error(l8n: &Localizer, reason: &str) -> Result<String, L8nError> {
    l8n.format("errorPrefix", &[("reason", reason)])
}
