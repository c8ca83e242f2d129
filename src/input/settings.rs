//! # 作业设置
//!
//! 解析请求中的 `settings` 字典。识别 `CMDLINE` 与 `ADDITIONAL_RETRIEVE_LIST`，
//! 其余键只记录警告。
//!
//! ## 依赖关系
//! - 被 `input/validate.rs`, `calculations/openmx.rs` 使用
//! - 使用 `input/dict.rs`

use crate::error::{OmxError, Result};
use crate::input::dict::uppercase_keys;

use log::warn;
use serde_json::Value;
use std::collections::BTreeMap;

/// 附加命令行参数
pub const CMDLINE: &str = "CMDLINE";
/// 额外取回的文件
pub const ADDITIONAL_RETRIEVE_LIST: &str = "ADDITIONAL_RETRIEVE_LIST";

/// 已解析的设置
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    pub cmdline: Vec<String>,
    pub additional_retrieve_list: Vec<String>,
}

impl Settings {
    /// 从原始字典解析
    pub fn from_map(raw: &BTreeMap<String, Value>) -> Result<Self> {
        let dict = uppercase_keys(raw, "settings")?;
        let mut settings = Settings::default();

        for (key, value) in &dict {
            match key.as_str() {
                CMDLINE => settings.cmdline = string_list(key, value)?,
                ADDITIONAL_RETRIEVE_LIST => {
                    settings.additional_retrieve_list = string_list(key, value)?
                }
                other => warn!("Ignoring unrecognized setting '{}'", other),
            }
        }

        Ok(settings)
    }
}

fn string_list(key: &str, value: &Value) -> Result<Vec<String>> {
    let items = value.as_array().ok_or_else(|| {
        OmxError::InputValidation(format!("setting '{}' must be a list of strings", key))
    })?;

    items
        .iter()
        .map(|item| {
            item.as_str().map(str::to_string).ok_or_else(|| {
                OmxError::InputValidation(format!(
                    "setting '{}' must contain only strings, found {}",
                    key, item
                ))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_known_settings() {
        let mut raw = BTreeMap::new();
        raw.insert("cmdline".to_string(), json!(["-nt", "4"]));
        raw.insert("Additional_Retrieve_List".to_string(), json!(["aiida.md"]));

        let s = Settings::from_map(&raw).unwrap();
        assert_eq!(s.cmdline, vec!["-nt", "4"]);
        assert_eq!(s.additional_retrieve_list, vec!["aiida.md"]);
    }

    #[test]
    fn test_unknown_setting_is_not_an_error() {
        let mut raw = BTreeMap::new();
        raw.insert("PARENT_FOLDER_SYMLINK".to_string(), json!(true));
        assert_eq!(Settings::from_map(&raw).unwrap(), Settings::default());
    }

    #[test]
    fn test_malformed_cmdline() {
        let mut raw = BTreeMap::new();
        raw.insert("CMDLINE".to_string(), json!("-nt 4"));
        assert!(Settings::from_map(&raw).is_err());

        raw.insert("CMDLINE".to_string(), json!(["-nt", 4]));
        assert!(Settings::from_map(&raw).is_err());
    }
}
