//! 查看器配置：启动时构建一次，按引用传给各使用方

use crate::model::l8n::DEFAULT_REGION;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerConfig {
    /// 本地化区域
    pub region: String,
    /// 是否显示纯空白的文本段（格式化缩进产生的换行与空格）
    pub keep_whitespace_text: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            keep_whitespace_text: false,
        }
    }
}

impl ViewerConfig {
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_whitespace_text(mut self, keep: bool) -> Self {
        self.keep_whitespace_text = keep;
        self
    }
}
