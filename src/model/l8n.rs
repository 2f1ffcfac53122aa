//! 本地化：编译期内嵌的字符串表 + 按区域合并的解析器
//!
//! 字符串表结构为 区域 → 键 → { string, substitutions }。
//! `default` 区域必须存在且包含全部键，其他区域只能覆盖已有键的文本。
//! 占位符写作 `{name}`，只替换条目声明过的名称，不做任何表达式求值。

use std::collections::HashMap;

use regex::{Captures, Regex};
use serde::Deserialize;
use thiserror::Error;

/// 默认区域名
pub const DEFAULT_REGION: &str = "default";

const BUILTIN_TABLE: &str = include_str!("../../assets/l8n.json");

#[derive(Error, Debug)]
pub enum L8nError {
    #[error("Localization string not found. Name: \"{key}\"; Region: {region}")]
    NotFound { key: String, region: String },
    #[error("region {region} overrides unknown key: {key}")]
    UnknownOverrideKey { region: String, key: String },
    #[error("localization table has no default region")]
    MissingDefault,
    #[error("invalid localization table: {0}")]
    Table(#[from] serde_json::Error),
    #[error("invalid placeholder pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// 单条本地化字符串
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct L8nEntry {
    pub string: String,
    /// 声明的占位符名称（有序）；区域覆盖条目通常省略，沿用默认表的声明
    #[serde(default)]
    pub substitutions: Vec<String>,
}

/// 完整的多区域字符串表
#[derive(Debug, Clone)]
pub struct L8nTable {
    regions: HashMap<String, HashMap<String, L8nEntry>>,
}

impl L8nTable {
    /// 加载内嵌的字符串表
    pub fn builtin() -> Result<Self, L8nError> {
        Self::from_json_str(BUILTIN_TABLE)
    }

    /// 从JSON文本加载字符串表并校验区域覆盖不引入新键
    pub fn from_json_str(json: &str) -> Result<Self, L8nError> {
        let regions: HashMap<String, HashMap<String, L8nEntry>> = serde_json::from_str(json)?;
        let defaults = regions.get(DEFAULT_REGION).ok_or(L8nError::MissingDefault)?;

        for (region, entries) in regions.iter().filter(|(r, _)| r.as_str() != DEFAULT_REGION) {
            if let Some(key) = entries.keys().find(|k| !defaults.contains_key(*k)) {
                return Err(L8nError::UnknownOverrideKey {
                    region: region.clone(),
                    key: key.clone(),
                });
            }
        }

        Ok(Self { regions })
    }

    /// 表中定义的区域（排序后）
    pub fn regions(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.regions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn defaults(&self) -> &HashMap<String, L8nEntry> {
        // from_json_str 已保证 default 区域存在
        &self.regions[DEFAULT_REGION]
    }
}

/// 已解析的条目：文本 + 由声明名称构成的占位符模式
#[derive(Debug, Clone)]
struct ResolvedEntry {
    string: String,
    pattern: Option<Regex>,
}

/// 某个区域的扁平查找表
#[derive(Debug, Clone)]
pub struct Localizer {
    region: String,
    strings: HashMap<String, ResolvedEntry>,
}

impl Localizer {
    /// 以默认表为基础，逐键应用区域覆盖；未知区域等同于默认区域
    pub fn new(region: &str, table: &L8nTable) -> Result<Self, L8nError> {
        let overrides = table.regions.get(region);
        let mut strings = HashMap::with_capacity(table.defaults().len());

        for (key, entry) in table.defaults() {
            let string = overrides
                .and_then(|o| o.get(key))
                .map(|o| o.string.clone())
                .unwrap_or_else(|| entry.string.clone());

            let pattern = if entry.substitutions.is_empty() {
                None
            } else {
                let names: Vec<String> = entry.substitutions.iter().map(|n| regex::escape(n)).collect();
                Some(Regex::new(&format!(r"\{{({})\}}", names.join("|")))?)
            };

            strings.insert(key.clone(), ResolvedEntry { string, pattern });
        }

        if overrides.is_none() && region != DEFAULT_REGION {
            tracing::warn!("未找到区域 {}，使用默认字符串", region);
        }

        Ok(Self {
            region: region.to_string(),
            strings,
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// 查找键对应的文本并替换声明过的占位符
    ///
    /// 未提供的替换值按空字符串处理；未声明的 `{...}` 原样保留。
    pub fn resolve(
        &self,
        key: &str,
        substitutions: Option<&HashMap<&str, &str>>,
    ) -> Result<String, L8nError> {
        let entry = self.strings.get(key).ok_or_else(|| L8nError::NotFound {
            key: key.to_string(),
            region: self.region.clone(),
        })?;

        let Some(re) = &entry.pattern else {
            return Ok(entry.string.clone());
        };

        // 单遍替换，替换值本身不会再被展开
        let out = re.replace_all(&entry.string, |caps: &Captures<'_>| {
            substitutions
                .and_then(|s| s.get(&caps[1]))
                .copied()
                .unwrap_or("")
                .to_string()
        });
        Ok(out.into_owned())
    }

    /// 不带替换值的简写
    pub fn text(&self, key: &str) -> Result<String, L8nError> {
        self.resolve(key, None)
    }

    /// 以 (名称, 值) 列表提供替换值的简写
    pub fn format(&self, key: &str, values: &[(&str, &str)]) -> Result<String, L8nError> {
        let map: HashMap<&str, &str> = values.iter().copied().collect();
        self.resolve(key, Some(&map))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"{
        "default": {
            "greeting": { "string": "Hello, {name}!", "substitutions": ["name"] },
            "farewell": { "string": "Goodbye" },
            "braces": { "string": "{a.b} and {other}", "substitutions": ["a.b"] }
        },
        "fr": {
            "farewell": { "string": "Au revoir" }
        }
    }"#;

    fn table() -> L8nTable {
        L8nTable::from_json_str(TABLE).expect("加载测试字符串表失败")
    }

    #[test]
    fn test_default_literal_without_override() {
        let l8n = Localizer::new("fr", &table()).unwrap();
        assert_eq!(l8n.text("greeting").unwrap(), "Hello, !");

        let l8n = Localizer::new(DEFAULT_REGION, &table()).unwrap();
        assert_eq!(l8n.text("farewell").unwrap(), "Goodbye");
    }

    #[test]
    fn test_region_override() {
        let l8n = Localizer::new("fr", &table()).unwrap();
        assert_eq!(l8n.text("farewell").unwrap(), "Au revoir");
        assert_eq!(l8n.region(), "fr");
    }

    #[test]
    fn test_unknown_region_falls_back_to_default() {
        let l8n = Localizer::new("xx-YY", &table()).unwrap();
        assert_eq!(l8n.text("farewell").unwrap(), "Goodbye");
    }

    #[test]
    fn test_substitution() {
        let l8n = Localizer::new(DEFAULT_REGION, &table()).unwrap();
        assert_eq!(l8n.format("greeting", &[("name", "World")]).unwrap(), "Hello, World!");
        assert_eq!(l8n.format("greeting", &[]).unwrap(), "Hello, !");
        assert_eq!(l8n.resolve("greeting", None).unwrap(), "Hello, !");
    }

    #[test]
    fn test_substitution_value_is_literal() {
        let l8n = Localizer::new(DEFAULT_REGION, &table()).unwrap();
        // 替换值中的 $ 不应被当作捕获组引用
        assert_eq!(l8n.format("greeting", &[("name", "$1 ${x}")]).unwrap(), "Hello, $1 ${x}!");
    }

    #[test]
    fn test_substituted_value_not_expanded_again() {
        let json = r#"{ "default": { "pair": { "string": "{a}-{b}", "substitutions": ["a", "b"] } } }"#;
        let l8n = Localizer::new(DEFAULT_REGION, &L8nTable::from_json_str(json).unwrap()).unwrap();
        assert_eq!(l8n.format("pair", &[("a", "{b}"), ("b", "2")]).unwrap(), "{b}-2");
    }

    #[test]
    fn test_only_declared_placeholders_replaced() {
        let l8n = Localizer::new(DEFAULT_REGION, &table()).unwrap();
        let out = l8n.format("braces", &[("a.b", "X"), ("other", "Y")]).unwrap();
        assert_eq!(out, "X and {other}");
    }

    #[test]
    fn test_unknown_key_error_names_key_and_region() {
        let l8n = Localizer::new("fr", &table()).unwrap();
        let err = l8n.text("missing").unwrap_err();
        assert!(matches!(err, L8nError::NotFound { .. }));
        let msg = err.to_string();
        assert!(msg.contains("missing"), "错误信息应包含键名: {}", msg);
        assert!(msg.contains("fr"), "错误信息应包含区域: {}", msg);
    }

    #[test]
    fn test_override_must_not_add_keys() {
        let json = r#"{
            "default": { "a": { "string": "A" } },
            "fr": { "b": { "string": "B" } }
        }"#;
        let err = L8nTable::from_json_str(json).unwrap_err();
        assert!(matches!(err, L8nError::UnknownOverrideKey { ref key, .. } if key == "b"));
    }

    #[test]
    fn test_missing_default_region() {
        let err = L8nTable::from_json_str(r#"{ "fr": {} }"#).unwrap_err();
        assert!(matches!(err, L8nError::MissingDefault));
    }

    #[test]
    fn test_builtin_table_loads_every_region() {
        let table = L8nTable::builtin().expect("内嵌字符串表应能加载");
        assert_eq!(table.regions(), vec!["de", DEFAULT_REGION, "zh-CN"]);

        let zh = Localizer::new("zh-CN", &table).unwrap();
        assert_eq!(zh.text("nodeNameLabel").unwrap(), "节点名称：");
        assert_eq!(zh.format("childNodesLabel", &[("count", "3")]).unwrap(), "子节点（3）");

        // de 未覆盖 attributeNameLabel，回退默认
        let de = Localizer::new("de", &table).unwrap();
        assert_eq!(de.text("attributeNameLabel").unwrap(), "Name:");
        assert_eq!(de.text("attributeValueLabel").unwrap(), "Wert:");
    }
}
