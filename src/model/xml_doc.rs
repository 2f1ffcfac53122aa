//! 只读XML文档模型：由 roxmltree 解析后转换为自有树，保存每个元素在源文本中的范围

use std::ops::Range;

use crate::model::data_core::AppError;

/// 允许的最大元素嵌套层数；解析、转换与渲染都是递归的，超过此深度直接拒绝
pub const MAX_NESTING_DEPTH: usize = 256;

/// 属性（名称保留书写时的前缀）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub name: String,
    pub value: String,
}

/// 元素的直接子节点
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    Comment(String),
    ProcessingInstruction { target: String, value: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    /// 限定名，如 `svg:rect`
    pub name: String,
    pub attributes: Vec<XmlAttribute>,
    pub children: Vec<XmlNode>,
    /// 元素在源文本中的字节范围
    pub range: Range<usize>,
}

/// 解析后的文档，创建后不再修改
#[derive(Debug, Clone)]
pub struct XmlDocument {
    source: String,
    root: XmlElement,
}

impl XmlDocument {
    /// 解析XML文本；允许DTD，不做校验
    pub fn parse(text: impl Into<String>) -> Result<Self, AppError> {
        let mut source: String = text.into();
        if source.starts_with('\u{feff}') {
            source.replace_range(..'\u{feff}'.len_utf8(), "");
        }

        let opts = roxmltree::ParsingOptions {
            allow_dtd: true,
            ..roxmltree::ParsingOptions::default()
        };
        check_nesting(&source, MAX_NESTING_DEPTH)?;
        let root = {
            let doc = roxmltree::Document::parse_with_options(&source, opts)?;
            convert_element(&source, doc.root_element())
        };

        Ok(Self { source, root })
    }

    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// 元素的原始XML片段
    pub fn source_of(&self, element: &XmlElement) -> &str {
        self.source.get(element.range.clone()).unwrap_or_default()
    }

    /// 文档中元素总数
    pub fn element_count(&self) -> usize {
        fn count(e: &XmlElement) -> usize {
            1 + e
                .children
                .iter()
                .map(|c| match c {
                    XmlNode::Element(child) => count(child),
                    _ => 0,
                })
                .sum::<usize>()
        }
        count(&self.root)
    }
}

/// 粗略扫描元素嵌套深度，超过 `limit` 时尽早返回错误
///
/// 只识别标签边界，不校验文档；格式错误留给解析器报告。
fn check_nesting(text: &str, limit: usize) -> Result<(), AppError> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = 0usize;

    while let Some(off) = text[i..].find('<') {
        let start = i + off;
        let rest = &text[start..];
        i = if rest.starts_with("<!--") {
            skip_past(text, start + 4, "-->")
        } else if rest.starts_with("<![CDATA[") {
            skip_past(text, start + 9, "]]>")
        } else if rest.starts_with("<?") {
            skip_past(text, start + 2, "?>")
        } else if rest.starts_with("<!") {
            skip_declaration(bytes, start + 2)
        } else if rest.starts_with("</") {
            depth = depth.saturating_sub(1);
            skip_past(text, start + 2, ">")
        } else {
            let (end, self_closing) = scan_start_tag(bytes, start + 1);
            if !self_closing {
                depth += 1;
                if depth > limit {
                    return Err(AppError::TooDeep { limit });
                }
            }
            end
        };
    }
    Ok(())
}

fn skip_past(text: &str, from: usize, pat: &str) -> usize {
    text[from..].find(pat).map_or(text.len(), |p| from + p + pat.len())
}

/// 跳过 `<!DOCTYPE ...>`，内部子集里的 `>` 不算结束
fn skip_declaration(bytes: &[u8], from: usize) -> usize {
    let mut brackets = 0usize;
    let mut quote = None;
    for (i, &b) in bytes.iter().enumerate().skip(from) {
        match (quote, b) {
            (Some(q), _) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'') => quote = Some(b),
            (None, b'[') => brackets += 1,
            (None, b']') => brackets = brackets.saturating_sub(1),
            (None, b'>') if brackets == 0 => return i + 1,
            _ => {}
        }
    }
    bytes.len()
}

/// 返回开始标签之后的位置，以及是否自闭合
fn scan_start_tag(bytes: &[u8], from: usize) -> (usize, bool) {
    let mut quote = None;
    for (i, &b) in bytes.iter().enumerate().skip(from) {
        match (quote, b) {
            (Some(q), _) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'') => quote = Some(b),
            (None, b'>') => return (i + 1, bytes[i - 1] == b'/'),
            _ => {}
        }
    }
    (bytes.len(), false)
}

/// 元素的限定名：取 `<` 之后书写的原文，前缀与源文件一致
fn element_qname<'a>(source: &'a str, node: roxmltree::Node<'_, '_>) -> &'a str {
    let start = node.range().start + 1;
    let rest = source.get(start..).unwrap_or_default();
    let end = rest
        .find(|c: char| c.is_whitespace() || c == '/' || c == '>')
        .unwrap_or(rest.len());
    &rest[..end]
}

fn convert_element(source: &str, node: roxmltree::Node<'_, '_>) -> XmlElement {
    let attributes = node
        .attributes()
        .map(|a| XmlAttribute {
            name: source.get(a.range_qname()).unwrap_or(a.name()).to_string(),
            value: a.value().to_string(),
        })
        .collect();

    let children = node
        .children()
        .filter_map(|child| match child.node_type() {
            roxmltree::NodeType::Element => Some(XmlNode::Element(convert_element(source, child))),
            roxmltree::NodeType::Text => Some(XmlNode::Text(child.text().unwrap_or_default().to_string())),
            roxmltree::NodeType::Comment => {
                Some(XmlNode::Comment(child.text().unwrap_or_default().to_string()))
            }
            roxmltree::NodeType::PI => child.pi().map(|pi| XmlNode::ProcessingInstruction {
                target: pi.target.to_string(),
                value: pi.value.map(str::to_string),
            }),
            roxmltree::NodeType::Root => None,
        })
        .collect();

    XmlElement {
        name: element_qname(source, node).to_string(),
        attributes,
        children,
        range: node.range(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_document() {
        let doc = XmlDocument::parse(r#"<root a="1"><child>text</child></root>"#).unwrap();
        let root = doc.root();
        assert_eq!(root.name, "root");
        assert_eq!(root.attributes.len(), 1);
        assert_eq!(root.children.len(), 1);
        assert_eq!(doc.element_count(), 2);
    }

    #[test]
    fn test_mixed_children_kept_in_order() {
        let doc = XmlDocument::parse("<a>one<!--note--><b/>two<?pi data?></a>").unwrap();
        let kinds: Vec<&str> = doc
            .root()
            .children
            .iter()
            .map(|c| match c {
                XmlNode::Element(_) => "element",
                XmlNode::Text(_) => "text",
                XmlNode::Comment(_) => "comment",
                XmlNode::ProcessingInstruction { .. } => "pi",
            })
            .collect();
        assert_eq!(kinds, vec!["text", "comment", "element", "text", "pi"]);
    }

    #[test]
    fn test_prefix_kept_in_names() {
        let xml = r#"<svg:svg xmlns:svg="http://www.w3.org/2000/svg" xmlns:x="urn:x"><svg:rect x:id="r1"/></svg:svg>"#;
        let doc = XmlDocument::parse(xml).unwrap();
        assert_eq!(doc.root().name, "svg:svg");
        match &doc.root().children[0] {
            XmlNode::Element(rect) => {
                assert_eq!(rect.name, "svg:rect");
                assert_eq!(rect.attributes[0].name, "x:id");
            }
            other => panic!("应为元素: {:?}", other),
        }
    }

    #[test]
    fn test_prefix_taken_from_source_when_uri_shared() {
        let xml = r#"<root xmlns="urn:a" xmlns:p="urn:a"><p:child p:x="1" y="2"/></root>"#;
        let doc = XmlDocument::parse(xml).unwrap();
        assert_eq!(doc.root().name, "root");
        match &doc.root().children[0] {
            XmlNode::Element(child) => {
                assert_eq!(child.name, "p:child");
                let names: Vec<&str> = child.attributes.iter().map(|a| a.name.as_str()).collect();
                assert_eq!(names, vec!["p:x", "y"]);
            }
            other => panic!("应为元素: {:?}", other),
        }

        let doc = XmlDocument::parse(r#"<q:root xmlns:p="urn:a" xmlns:q="urn:a"/>"#).unwrap();
        assert_eq!(doc.root().name, "q:root");
    }

    #[test]
    fn test_nesting_at_limit_is_accepted() {
        let depth = MAX_NESTING_DEPTH;
        let xml = format!("{}{}", "<a>".repeat(depth), "</a>".repeat(depth));
        let doc = XmlDocument::parse(xml).expect("限制以内的嵌套应能解析");
        assert_eq!(doc.element_count(), depth);
    }

    #[test]
    fn test_deep_nesting_is_typed_error() {
        for depth in [MAX_NESTING_DEPTH + 1, 10_000] {
            let xml = format!("{}{}", "<a>".repeat(depth), "</a>".repeat(depth));
            let err = XmlDocument::parse(xml).unwrap_err();
            assert!(
                matches!(err, AppError::TooDeep { limit } if limit == MAX_NESTING_DEPTH),
                "深度 {} 应被拒绝: {:?}",
                depth,
                err
            );
        }
    }

    #[test]
    fn test_nesting_scan_ignores_markup_lookalikes() {
        // 注释、CDATA、DTD 与属性值中的尖括号不计入层数，自闭合标签不加深
        let many = "<x>".repeat(MAX_NESTING_DEPTH * 2);
        let xml = format!(
            "<!DOCTYPE r [<!ENTITY e \"x>y\">]>\n<r><!--{many}--><![CDATA[{many}]]><e v='a>b'/>{}</r>",
            "<b/>".repeat(MAX_NESTING_DEPTH * 2)
        );
        let doc = XmlDocument::parse(xml).expect("应能解析");
        assert_eq!(doc.root().name, "r");
        assert_eq!(doc.element_count(), 2 + MAX_NESTING_DEPTH * 2);
    }

    #[test]
    fn test_source_of_element() {
        let xml = "<root>\n  <item id=\"7\">x</item>\n</root>";
        let doc = XmlDocument::parse(xml).unwrap();
        let item = doc
            .root()
            .children
            .iter()
            .find_map(|c| match c {
                XmlNode::Element(e) => Some(e),
                _ => None,
            })
            .unwrap();
        assert_eq!(doc.source_of(item), "<item id=\"7\">x</item>");
        assert_eq!(doc.source_of(doc.root()), xml);
    }

    #[test]
    fn test_bom_and_dtd_accepted() {
        let xml = "\u{feff}<?xml version=\"1.0\"?>\n<!DOCTYPE note [<!ENTITY who \"me\">]>\n<note>&who;</note>";
        let doc = XmlDocument::parse(xml).unwrap();
        assert_eq!(doc.root().name, "note");
        assert_eq!(doc.root().children, vec![XmlNode::Text("me".into())]);
    }

    #[test]
    fn test_malformed_document_is_parse_error() {
        let err = XmlDocument::parse("<root><open></root>").unwrap_err();
        assert!(matches!(err, AppError::Parse { .. }), "应为解析错误: {:?}", err);

        let err = XmlDocument::parse("").unwrap_err();
        assert!(matches!(err, AppError::Parse { .. }));
    }
}
