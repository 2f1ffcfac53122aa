//! IO helper: read an XML file as text and parse it

use std::{fs, path::Path, path::PathBuf, thread};

use crate::model::data_core::AppError;
use crate::model::xml_doc::XmlDocument;

/// 读取整个文件为文本（非法UTF-8按替换字符处理）并解析为文档
pub fn read_xml_file(p: &Path) -> Result<XmlDocument, AppError> {
    let bytes = fs::read(p)?;
    let text = String::from_utf8_lossy(&bytes).into_owned();
    XmlDocument::parse(text)
}

/// 加载线程的栈大小；解析是递归的，默认栈对深层文档不够
const LOADER_STACK_SIZE: usize = 64 * 1024 * 1024;

/// 在后台线程读取并解析，完成后调用一次 `on_load`
///
/// 回调在工作线程上执行；UI侧需自行切回事件循环。
pub fn read_xml_file_async<F>(p: PathBuf, on_load: F) -> Result<(), AppError>
where
    F: FnOnce(Result<XmlDocument, AppError>) + Send + 'static,
{
    thread::Builder::new()
        .name("xml-loader".into())
        .stack_size(LOADER_STACK_SIZE)
        .spawn(move || {
            let result = read_xml_file(&p);
            on_load(result);
        })?;
    Ok(())
}
