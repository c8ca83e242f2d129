//! # 字典键归一化
//!
//! 参数与设置字典的键在比较前统一变换；变换后重复的键视为输入错误
//! （例如同时给出 `scf.maxIter` 与 `SCF_MAXITER`）。
//!
//! ## 依赖关系
//! - 被 `input/validate.rs`, `input/settings.rs` 使用

use crate::error::{OmxError, Result};

use serde_json::Value;
use std::collections::BTreeMap;

/// 按 `transform` 变换所有键，检测变换后的重复
///
/// `what` 用于错误信息，如 `"parameters"`。
pub fn normalize_keys<F>(
    dict: &BTreeMap<String, Value>,
    what: &str,
    transform: F,
) -> Result<BTreeMap<String, Value>>
where
    F: Fn(&str) -> String,
{
    let mut out: BTreeMap<String, Value> = BTreeMap::new();
    let mut origin: BTreeMap<String, &str> = BTreeMap::new();

    for (key, value) in dict {
        let new_key = transform(key);
        if let Some(previous) = origin.get(&new_key) {
            return Err(OmxError::InputValidation(format!(
                "duplicate {} keys after normalization: '{}' and '{}'",
                what, previous, key
            )));
        }
        origin.insert(new_key.clone(), key);
        out.insert(new_key, value.clone());
    }

    Ok(out)
}

/// 键转为大写
pub fn uppercase_keys(dict: &BTreeMap<String, Value>, what: &str) -> Result<BTreeMap<String, Value>> {
    normalize_keys(dict, what, |k| k.trim().to_uppercase())
}
