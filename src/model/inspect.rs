//! 节点检查：无状态地读取元素的属性、直接文本、直接子元素

use crate::model::xml_doc::{XmlAttribute, XmlElement, XmlNode};

/// 按文档顺序返回全部属性
pub fn attributes(node: &XmlElement) -> &[XmlAttribute] {
    &node.attributes
}

/// 直接文本子节点（不递归进入子元素，不含注释）
pub fn text_segments(node: &XmlElement) -> Vec<&str> {
    node.children
        .iter()
        .filter_map(|c| match c {
            XmlNode::Text(t) => Some(t.as_str()),
            _ => None,
        })
        .collect()
}

/// 直接子元素（跳过文本、注释和处理指令）
pub fn child_elements(node: &XmlElement) -> Vec<&XmlElement> {
    node.children
        .iter()
        .filter_map(|c| match c {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::xml_doc::XmlDocument;

    #[test]
    fn test_attributes_empty_and_ordered() {
        let doc = XmlDocument::parse("<a/>").unwrap();
        assert!(attributes(doc.root()).is_empty());

        let doc = XmlDocument::parse(r#"<a z="1" b="2" m="3"/>"#).unwrap();
        let pairs: Vec<(&str, &str)> = attributes(doc.root())
            .iter()
            .map(|a| (a.name.as_str(), a.value.as_str()))
            .collect();
        assert_eq!(pairs, vec![("z", "1"), ("b", "2"), ("m", "3")]);
    }

    #[test]
    fn test_text_segments_are_direct_only() {
        let doc = XmlDocument::parse("<a>head<b>inner</b><!--c-->tail<c> </c></a>").unwrap();
        assert_eq!(text_segments(doc.root()), vec!["head", "tail"]);

        let doc = XmlDocument::parse("<a><b>only nested</b></a>").unwrap();
        assert!(text_segments(doc.root()).is_empty());
    }

    #[test]
    fn test_child_elements_skip_other_kinds() {
        let doc = XmlDocument::parse("<a>x<b/><!--c--><?p?><d>y</d>z</a>").unwrap();
        let names: Vec<&str> = child_elements(doc.root()).iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["b", "d"]);

        let doc = XmlDocument::parse("<a>text only</a>").unwrap();
        assert!(child_elements(doc.root()).is_empty());
    }
}
