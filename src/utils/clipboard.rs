//! Clipboard helpers for copying a node's XML source

use copypasta::{ClipboardContext, ClipboardProvider};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClipboardError {
    #[error("nothing to copy")]
    Empty,
    #[error("clipboard error: {0}")]
    Clip(String),
}

/// 将XML片段复制到系统剪贴板；空白内容不复制
pub fn copy_to_clipboard(text: &str) -> Result<(), ClipboardError> {
    if text.trim().is_empty() {
        return Err(ClipboardError::Empty);
    }
    let mut ctx = ClipboardContext::new().map_err(|e| ClipboardError::Clip(e.to_string()))?;
    ctx.set_contents(text.to_string())
        .map_err(|e| ClipboardError::Clip(e.to_string()))?;
    tracing::info!("已复制到剪贴板，长度: {} 字节", text.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_text_is_rejected_before_touching_clipboard() {
        assert!(matches!(copy_to_clipboard(""), Err(ClipboardError::Empty)));
        assert!(matches!(copy_to_clipboard(" \n\t"), Err(ClipboardError::Empty)));
    }
}
