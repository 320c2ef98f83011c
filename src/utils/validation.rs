use crate::utils::error::{BenchError, Result};
use std::collections::HashSet;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(BenchError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(BenchError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(BenchError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    // NaN 也會落在這裡
    if !(value >= min && value <= max) {
        return Err(BenchError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// 後端名稱必須非空、已知且不重複
pub fn validate_backend_names(field_name: &str, names: &[String], known: &[&str]) -> Result<()> {
    if names.is_empty() {
        return Err(BenchError::ConfigValidationError {
            field: field_name.to_string(),
            message: "At least one backend must be selected".to_string(),
        });
    }

    let known_set: HashSet<&str> = known.iter().copied().collect();
    let mut seen = HashSet::new();

    for name in names {
        if !known_set.contains(name.as_str()) {
            return Err(BenchError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: name.clone(),
                reason: format!("Unknown backend. Known backends: {}", known.join(", ")),
            });
        }
        if !seen.insert(name.as_str()) {
            return Err(BenchError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: name.clone(),
                reason: "Backend listed more than once".to_string(),
            });
        }
    }

    Ok(())
}
