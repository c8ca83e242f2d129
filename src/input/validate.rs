//! # 计算请求校验
//!
//! 在渲染输入前检查请求：结构完整性、截断能、k 点网格、赝势与基组覆盖、
//! 交换关联类型一致性，以及每个用户参数的键名、类型、范围、可选值和依赖。
//! 任一检查失败都返回 `OmxError::InputValidation`，不会产生部分输入文件。
//!
//! ## 依赖关系
//! - 被 `input/writer.rs` 使用
//! - 使用 `input/keywords.rs`, `input/dict.rs`, `input/settings.rs`

use crate::error::{OmxError, Result};
use crate::input::dict::normalize_keys;
use crate::input::keywords::{self, Keyword, ValueKind, XC_TYPES};
use crate::input::settings::Settings;
use crate::models::{CalculationRequest, MAX_ORBITAL_CHANNELS};

use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// 通过校验的请求视图
#[derive(Debug)]
pub struct ValidatedRequest<'a> {
    /// 按关键字名排序的用户参数
    pub parameters: Vec<(&'static Keyword, &'a Value)>,
    /// 由赝势推出的 `scf.XcType`
    pub xc_type: &'static str,
    pub settings: Settings,
}

fn invalid(msg: impl Into<String>) -> OmxError {
    OmxError::InputValidation(msg.into())
}

/// 校验整个请求
pub fn validate_request(request: &CalculationRequest) -> Result<ValidatedRequest<'_>> {
    validate_structure(request)?;
    validate_kpoints(request)?;
    let xc_type = validate_pseudos_and_orbitals(request)?;
    let parameters = validate_parameters(&request.parameters)?;
    let settings = Settings::from_map(&request.settings)?;

    Ok(ValidatedRequest {
        parameters,
        xc_type,
        settings,
    })
}

fn validate_structure(request: &CalculationRequest) -> Result<()> {
    let structure = &request.structure;

    if structure.kinds.is_empty() {
        return Err(invalid("structure defines no kinds"));
    }
    if structure.sites.is_empty() {
        return Err(invalid("structure has no sites"));
    }
    for (i, site) in structure.sites.iter().enumerate() {
        if structure.get_kind(&site.kind_name).is_none() {
            return Err(invalid(format!(
                "site {} references undefined kind '{}'",
                i + 1,
                site.kind_name
            )));
        }
        if site.position.iter().any(|x| !x.is_finite()) {
            return Err(invalid(format!("site {} has a non-finite coordinate", i + 1)));
        }
    }
    if structure.cell.is_singular() {
        return Err(invalid("cell vectors are linearly dependent"));
    }

    Ok(())
}

fn validate_kpoints(request: &CalculationRequest) -> Result<()> {
    if request.kpoints.mesh.iter().any(|&n| n == 0) {
        return Err(invalid(format!(
            "k-point mesh entries must be at least 1, got {:?}",
            request.kpoints.mesh
        )));
    }
    Ok(())
}

/// 检查赝势/基组覆盖所有种类，返回统一的交换关联类型
fn validate_pseudos_and_orbitals(request: &CalculationRequest) -> Result<&'static str> {
    let kinds: BTreeSet<&str> = request.structure.kind_names().into_iter().collect();

    for (what, keys) in [
        ("pseudos", request.pseudos.keys().map(String::as_str).collect::<BTreeSet<_>>()),
        ("orbitals", request.orbitals.keys().map(String::as_str).collect::<BTreeSet<_>>()),
    ] {
        if keys != kinds {
            let missing: Vec<_> = kinds.difference(&keys).collect();
            let extra: Vec<_> = keys.difference(&kinds).collect();
            return Err(invalid(format!(
                "{} do not match structure kinds (missing: {:?}, extra: {:?})",
                what, missing, extra
            )));
        }
    }

    for (kind, orbital) in &request.orbitals {
        let n = orbital.orbital_configuration.len();
        if n == 0 || n > MAX_ORBITAL_CHANNELS {
            return Err(invalid(format!(
                "orbital configuration of kind '{}' must list 1 to {} channels, got {}",
                kind, MAX_ORBITAL_CHANNELS, n
            )));
        }
        if !orbital.z_valence.is_finite() || orbital.z_valence < 0.0 {
            return Err(invalid(format!(
                "z_valence of kind '{}' must be a non-negative number, got {}",
                kind, orbital.z_valence
            )));
        }
    }

    let xc_types: BTreeSet<String> = request
        .pseudos
        .values()
        .map(|p| p.xc_type.trim().to_uppercase())
        .collect();
    if xc_types.len() != 1 {
        return Err(invalid(format!(
            "pseudopotentials must share one xc type, found {:?}",
            xc_types
        )));
    }

    let xc = xc_types.iter().next().map(String::as_str).unwrap_or_default();
    keywords::known_xc_type(xc).ok_or_else(|| {
        invalid(format!(
            "xc type '{}' is not supported by OpenMX (expected one of {:?})",
            xc, XC_TYPES
        ))
    })
}

/// 校验用户参数，返回按关键字名排序的 (关键字, 值)
pub fn validate_parameters(
    parameters: &BTreeMap<String, Value>,
) -> Result<Vec<(&'static Keyword, &Value)>> {
    normalize_keys(parameters, "parameters", keywords::normalize_key)?;

    let mut resolved = Vec::with_capacity(parameters.len());
    for (key, value) in parameters {
        let kw = keywords::lookup(key)
            .ok_or_else(|| invalid(format!("unknown OpenMX keyword '{}'", key)))?;
        if keywords::is_reserved(kw.name) {
            return Err(invalid(format!(
                "keyword '{}' is generated automatically and may not be set",
                kw.name
            )));
        }
        check_value(kw, value)?;
        resolved.push((kw, value));
    }

    let cutoff = resolved
        .iter()
        .find(|(kw, _)| kw.name == "scf.energycutoff")
        .and_then(|(_, v)| v.as_f64());
    match cutoff {
        Some(ec) if ec > 0.0 => {}
        Some(ec) => {
            return Err(invalid(format!(
                "scf.energycutoff must be positive, got {}",
                ec
            )))
        }
        None => return Err(invalid("scf.energycutoff is required")),
    }

    for (kw, _) in &resolved {
        for (dep, wanted) in kw.requires {
            let satisfied = resolved
                .iter()
                .find(|(other, _)| other.name == *dep)
                .and_then(|(other, v)| format_scalar(other.kind, v))
                .map(|text| text.eq_ignore_ascii_case(wanted))
                .unwrap_or(false);
            if !satisfied {
                return Err(invalid(format!(
                    "keyword '{}' requires '{}' to be {}",
                    kw.name, dep, wanted
                )));
            }
        }
    }

    resolved.sort_by(|a, b| a.0.name.cmp(b.0.name));
    Ok(resolved)
}

fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::Bool(_) | Value::Number(_) | Value::String(_))
}

fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.to_lowercase().as_str() {
            "on" | "true" => Some(true),
            "off" | "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn check_value(kw: &Keyword, value: &Value) -> Result<()> {
    let type_error = |expected: &str| {
        invalid(format!(
            "keyword '{}' expects {}, got {}",
            kw.name, expected, value
        ))
    };

    match kw.kind {
        ValueKind::Bool => {
            as_bool(value).ok_or_else(|| type_error("a boolean"))?;
        }
        ValueKind::Int => {
            value.as_i64().ok_or_else(|| type_error("an integer"))?;
        }
        ValueKind::Float => {
            value.as_f64().ok_or_else(|| type_error("a number"))?;
        }
        ValueKind::Str => {
            value.as_str().ok_or_else(|| type_error("a string"))?;
        }
        ValueKind::IntVec(n) => {
            let ok = value
                .as_array()
                .map(|items| items.len() == n && items.iter().all(|v| v.as_i64().is_some()))
                .unwrap_or(false);
            if !ok {
                return Err(type_error(&format!("a list of {} integers", n)));
            }
        }
        ValueKind::Any => {
            let ok = match value {
                Value::Array(rows) => rows.iter().all(|row| match row {
                    Value::Array(cells) => cells.iter().all(is_scalar),
                    other => is_scalar(other),
                }),
                other => is_scalar(other),
            };
            if !ok {
                return Err(type_error("a scalar, a list or a list of lists"));
            }
        }
    }

    if let (Some((lo, hi)), Some(x)) = (kw.lims, value.as_f64()) {
        if x < lo || x > hi {
            return Err(invalid(format!(
                "keyword '{}' = {} is outside [{}, {}]",
                kw.name, x, lo, hi
            )));
        }
    }

    if !kw.available.is_empty() {
        let text = value.as_str().unwrap_or_default();
        if !kw.available.iter().any(|a| a.eq_ignore_ascii_case(text)) {
            return Err(invalid(format!(
                "keyword '{}' = '{}' is not one of {:?}",
                kw.name, text, kw.available
            )));
        }
    }

    Ok(())
}

/// 按关键字类型格式化标量值
///
/// 布尔值写作 `on`/`off`，浮点 `%.12f`，整数 `%d`，字符串原样输出。
pub fn format_scalar(kind: ValueKind, value: &Value) -> Option<String> {
    if kind == ValueKind::Bool {
        return as_bool(value).map(|b| if b { "on" } else { "off" }.to_string());
    }
    match value {
        Value::Bool(b) => Some(if *b { "on" } else { "off" }.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => {
            if kind != ValueKind::Float {
                if let Some(i) = n.as_i64() {
                    return Some(i.to_string());
                }
            }
            n.as_f64().map(|f| format!("{:.12}", f))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
        let mut map: BTreeMap<String, Value> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        map.entry("scf.energycutoff".to_string())
            .or_insert(json!(150.0));
        map
    }

    #[test]
    fn test_parameters_sorted_by_keyword() {
        let p = params(&[("SCF_MAXITER", json!(40)), ("MD_TYPE", json!("nomd"))]);
        let resolved = validate_parameters(&p).unwrap();
        let names: Vec<_> = resolved.iter().map(|(k, _)| k.name).collect();
        assert_eq!(names, vec!["MD.Type", "scf.energycutoff", "scf.maxIter"]);
    }

    #[test]
    fn test_energycutoff_required_and_positive() {
        let mut p = BTreeMap::new();
        p.insert("scf.maxIter".to_string(), json!(40));
        assert!(validate_parameters(&p).is_err());

        p.insert("scf.energycutoff".to_string(), json!(0.0));
        let err = validate_parameters(&p).unwrap_err();
        assert!(err.to_string().contains("must be positive"));
    }

    #[test]
    fn test_unknown_and_reserved_keys() {
        let err = validate_parameters(&params(&[("scf.FooBar", json!(1))])).unwrap_err();
        assert!(err.to_string().contains("unknown OpenMX keyword"));

        let err = validate_parameters(&params(&[("SCF_KGRID", json!([2, 2, 2]))])).unwrap_err();
        assert!(err.to_string().contains("generated automatically"));
    }

    #[test]
    fn test_duplicate_spellings_rejected() {
        let p = params(&[("scf.maxIter", json!(40)), ("SCF_MAXITER", json!(50))]);
        assert!(validate_parameters(&p).is_err());
    }

    #[test]
    fn test_type_limits_and_choices() {
        assert!(validate_parameters(&params(&[("scf.maxIter", json!(1.5))])).is_err());
        assert!(validate_parameters(&params(&[("level.of.stdout", json!(1))])).is_err());
        assert!(validate_parameters(&params(&[("MD.Opt.DIIS.History", json!(25))])).is_err());
        assert!(validate_parameters(&params(&[("scf.eigen.lib", json!("mkl"))])).is_err());
        assert!(validate_parameters(&params(&[("scf.eigen.lib", json!("LAPACK"))])).is_ok());
        assert!(validate_parameters(&params(&[("scf.Ngrid", json!([1, 2]))])).is_err());
        assert!(validate_parameters(&params(&[("Dos.Erange", json!({"a": 1}))])).is_err());
    }

    #[test]
    fn test_requires_preconditions() {
        let p = params(&[("scf.DFTU.Type", json!(1))]);
        assert!(validate_parameters(&p).is_err());

        let p = params(&[("scf.DFTU.Type", json!(1)), ("scf.Hubbard.U", json!(true))]);
        assert!(validate_parameters(&p).is_ok());

        let p = params(&[
            ("scf.dc.Type", json!("sFLL")),
            ("scf.DFTU.Type", json!(1)),
            ("scf.Hubbard.U", json!("on")),
        ]);
        let err = validate_parameters(&p).unwrap_err();
        assert!(err.to_string().contains("scf.DFTU.Type"));
    }

    #[test]
    fn test_format_scalar() {
        assert_eq!(format_scalar(ValueKind::Bool, &json!(true)).unwrap(), "on");
        assert_eq!(format_scalar(ValueKind::Bool, &json!("OFF")).unwrap(), "off");
        assert_eq!(format_scalar(ValueKind::Int, &json!(40)).unwrap(), "40");
        assert_eq!(
            format_scalar(ValueKind::Float, &json!(150)).unwrap(),
            "150.000000000000"
        );
        assert_eq!(format_scalar(ValueKind::Any, &json!(300.5)).unwrap(), "300.500000000000");
        assert_eq!(format_scalar(ValueKind::Str, &json!("Band")).unwrap(), "Band");
        assert!(format_scalar(ValueKind::Any, &json!(null)).is_none());
    }
}
