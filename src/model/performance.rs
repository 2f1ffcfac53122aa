//! 性能基准测试模块
//!
//! 用于测试大文档解析、视图树渲染与行展平的耗时

use std::fmt::Write as _;
use std::time::Instant;

use crate::model::config::ViewerConfig;
use crate::model::l8n::{L8nTable, Localizer};
use crate::model::node_view::render_tree;
use crate::model::xml_doc::XmlDocument;

const MAX_CAPACITY_HINT: usize = 64 * 1024 * 1024;

/// 性能测试结果
#[derive(Debug)]
pub struct PerformanceResult {
    pub operation: String,
    pub duration_ms: u128,
    pub success: bool,
    pub details: String,
}

impl PerformanceResult {
    pub fn new(operation: &str, duration_ms: u128, success: bool, details: &str) -> Self {
        Self {
            operation: operation.to_string(),
            duration_ms,
            success,
            details: details.to_string(),
        }
    }
}

/// 输出长度的预估值；大参数时饱和并封顶，不会溢出
fn capacity_hint(depth: usize, width: usize) -> usize {
    u32::try_from(depth)
        .map(|d| width.saturating_pow(d))
        .unwrap_or(usize::MAX)
        .saturating_mul(48)
        .min(MAX_CAPACITY_HINT)
}

/// 生成指定深度与宽度的测试XML
pub fn generate_large_xml(depth: usize, width: usize) -> String {
    fn write_level(out: &mut String, current: usize, max_depth: usize, width: usize) {
        for i in 0..width {
            let _ = write!(out, "<item id=\"{}\" level=\"{}\">", i, current);
            if current + 1 >= max_depth {
                let _ = write!(out, "叶子节点值_{}", i);
            } else {
                out.push_str("<!-- nested -->");
                write_level(out, current + 1, max_depth, width);
            }
            out.push_str("</item>");
        }
    }

    let mut out = String::with_capacity(capacity_hint(depth, width));
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<dataset generated=\"2025-01-09T10:00:00Z\">");
    write_level(&mut out, 0, depth, width);
    out.push_str("</dataset>");
    out
}

/// 测试XML解析性能
pub fn benchmark_xml_parsing(xml: &str) -> (PerformanceResult, Option<XmlDocument>) {
    let start = Instant::now();
    let parse_result = XmlDocument::parse(xml);
    let duration = start.elapsed();

    match parse_result {
        Ok(doc) => (
            PerformanceResult::new(
                "XML解析",
                duration.as_millis(),
                true,
                &format!("解析了 {} 字节，{} 个元素", xml.len(), doc.element_count()),
            ),
            Some(doc),
        ),
        Err(e) => (
            PerformanceResult::new("XML解析", duration.as_millis(), false, &format!("解析失败: {}", e)),
            None,
        ),
    }
}

/// 测试视图树渲染与展平性能
pub fn benchmark_render(doc: &XmlDocument, l8n: &Localizer) -> PerformanceResult {
    let start = Instant::now();
    let result = render_tree(doc.root(), l8n, &ViewerConfig::default()).map(|view| view.rows().len());
    let duration = start.elapsed();

    match result {
        Ok(rows) => PerformanceResult::new("视图渲染", duration.as_millis(), true, &format!("生成了 {} 行", rows)),
        Err(e) => PerformanceResult::new("视图渲染", duration.as_millis(), false, &format!("渲染失败: {}", e)),
    }
}

/// 运行综合性能测试
pub fn run_performance_suite() -> Vec<PerformanceResult> {
    let mut results = Vec::new();

    let l8n = match L8nTable::builtin().and_then(|t| Localizer::new("default", &t)) {
        Ok(l8n) => l8n,
        Err(e) => {
            results.push(PerformanceResult::new("本地化加载", 0, false, &e.to_string()));
            return results;
        }
    };

    // 小型 / 中型 / 大型
    let test_cases = [(3, 10), (4, 12), (5, 12)];

    for (depth, width) in test_cases {
        tracing::info!("测试规模：深度{}，宽度{}", depth, width);

        let start = Instant::now();
        let xml = generate_large_xml(depth, width);
        results.push(PerformanceResult::new(
            &format!("数据生成({}x{})", depth, width),
            start.elapsed().as_millis(),
            true,
            &format!("生成了 {} 字节", xml.len()),
        ));

        let (parse_result, doc) = benchmark_xml_parsing(&xml);
        results.push(parse_result);

        if let Some(doc) = doc {
            results.push(benchmark_render(&doc, &l8n));
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_large_xml() {
        let xml = generate_large_xml(2, 3);
        let doc = XmlDocument::parse(xml).expect("生成的XML应合法");
        // dataset + 3 + 3*3
        assert_eq!(doc.element_count(), 13);
        assert_eq!(doc.root().name, "dataset");
    }

    #[test]
    fn test_capacity_hint_saturates() {
        assert_eq!(capacity_hint(2, 3), 9 * 48);
        assert_eq!(capacity_hint(64, 1000), MAX_CAPACITY_HINT);
        assert_eq!(capacity_hint(usize::MAX, 2), MAX_CAPACITY_HINT);
        assert_eq!(capacity_hint(usize::MAX, 0), 0);
    }

    #[test]
    fn test_performance_benchmarks() {
        let xml = generate_large_xml(3, 5);

        let (parse_result, doc) = benchmark_xml_parsing(&xml);
        assert!(parse_result.success);
        assert!(parse_result.duration_ms < 1000); // 应该在1秒内完成

        let l8n = Localizer::new("default", &L8nTable::builtin().unwrap()).unwrap();
        let render_result = benchmark_render(&doc.unwrap(), &l8n);
        assert!(render_result.success);
        assert!(render_result.duration_ms < 1000);
    }

    #[test]
    fn test_parse_failure_reported() {
        let (result, doc) = benchmark_xml_parsing("<broken>");
        assert!(!result.success);
        assert!(doc.is_none());
    }
}
