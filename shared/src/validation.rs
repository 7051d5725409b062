//! 表单校验
//!
//! 纯函数：输入字段值，返回可读的错误或 `None`。校验错误是普通的值，不是异常。

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

pub const NAME_MIN_LEN: usize = 2;
pub const DESCRIPTION_MIN_LEN: usize = 10;
pub const DESCRIPTION_MAX_LEN: usize = 1000;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"));

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\p{L}\s'-]+$").expect("valid name pattern"));

/// 需要校验的表单字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Email,
    FirstName,
    LastName,
    Description,
}

impl Field {
    /// 用于“必填”提示的完整名称
    pub fn label(&self) -> &'static str {
        match self {
            Field::Email => "Email",
            Field::FirstName => "First name",
            Field::LastName => "Last name",
            Field::Description => "Analysis description",
        }
    }

    fn short_label(&self) -> &'static str {
        match self {
            Field::Description => "Description",
            other => other.label(),
        }
    }

    /// 最小长度提示的单位，描述字段多一个 "long"
    fn length_unit(&self) -> &'static str {
        match self {
            Field::Description => "characters long",
            _ => "characters",
        }
    }

    pub fn validate(&self, value: &str) -> Option<ValidationError> {
        match self {
            Field::Email => validate_email(value),
            Field::FirstName | Field::LastName => validate_name(*self, value),
            Field::Description => validate_description(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{label} is required", label = .0.label())]
    Required(Field),
    #[error("{label} must be at least {min} {unit}", label = .field.short_label(), unit = .field.length_unit())]
    TooShort { field: Field, min: usize },
    #[error("{label} must be at most {max} characters", label = .field.short_label())]
    TooLong { field: Field, max: usize },
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("{label} can only contain letters, spaces, hyphens, and apostrophes", label = .0.label())]
    InvalidNameCharacters(Field),
    #[error("Please provide a meaningful analysis description")]
    Repetitive,
}

pub fn validate_email(value: &str) -> Option<ValidationError> {
    if value.trim().is_empty() {
        return Some(ValidationError::Required(Field::Email));
    }
    if !EMAIL_RE.is_match(value) {
        return Some(ValidationError::InvalidEmail);
    }
    None
}

/// 名字：去空白后至少 2 个字符，只允许字母、空白、连字符和撇号
pub fn validate_name(field: Field, value: &str) -> Option<ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Some(ValidationError::Required(field));
    }
    if trimmed.chars().count() < NAME_MIN_LEN {
        return Some(ValidationError::TooShort {
            field,
            min: NAME_MIN_LEN,
        });
    }
    if !NAME_RE.is_match(value) {
        return Some(ValidationError::InvalidNameCharacters(field));
    }
    None
}

pub fn validate_description(value: &str) -> Option<ValidationError> {
    let trimmed = value.trim();
    let len = trimmed.chars().count();
    if len == 0 {
        return Some(ValidationError::Required(Field::Description));
    }
    if len < DESCRIPTION_MIN_LEN {
        return Some(ValidationError::TooShort {
            field: Field::Description,
            min: DESCRIPTION_MIN_LEN,
        });
    }
    if len > DESCRIPTION_MAX_LEN {
        return Some(ValidationError::TooLong {
            field: Field::Description,
            max: DESCRIPTION_MAX_LEN,
        });
    }
    if is_single_char_repeat(trimmed) {
        return Some(ValidationError::Repetitive);
    }
    None
}

/// 整个字符串是否由同一个字符重复 10 次以上构成
///
/// 只识别单字符重复，重复的单词不在此列。
fn is_single_char_repeat(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    let mut count = 1;
    for c in chars {
        if c != first {
            return false;
        }
        count += 1;
    }
    count >= DESCRIPTION_MIN_LEN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email() {
        assert_eq!(validate_email("user@example.com"), None);
        assert_eq!(validate_email("user@example"), Some(ValidationError::InvalidEmail));
        assert_eq!(validate_email("us er@example.com"), Some(ValidationError::InvalidEmail));
        assert_eq!(validate_email("a@b@c.com"), Some(ValidationError::InvalidEmail));

        let err = validate_email("").unwrap();
        assert_eq!(err, ValidationError::Required(Field::Email));
        assert_eq!(err.to_string(), "Email is required");
        assert_eq!(validate_email("   "), Some(ValidationError::Required(Field::Email)));
    }

    #[test]
    fn test_names() {
        assert_eq!(validate_name(Field::LastName, "O'Brien"), None);
        assert_eq!(validate_name(Field::FirstName, "Mary Jane"), None);
        assert_eq!(validate_name(Field::LastName, "Smith-Jones"), None);
        assert_eq!(validate_name(Field::FirstName, "José"), None);

        let err = validate_name(Field::FirstName, "Bob3").unwrap();
        assert_eq!(err, ValidationError::InvalidNameCharacters(Field::FirstName));
        assert_eq!(
            err.to_string(),
            "First name can only contain letters, spaces, hyphens, and apostrophes"
        );

        let err = validate_name(Field::FirstName, "A").unwrap();
        assert_eq!(err.to_string(), "First name must be at least 2 characters");
        assert_eq!(
            validate_name(Field::LastName, " A "),
            Some(ValidationError::TooShort { field: Field::LastName, min: 2 })
        );
        assert_eq!(
            validate_name(Field::LastName, "").map(|e| e.to_string()),
            Some("Last name is required".to_string())
        );
        assert!(validate_name(Field::LastName, "Doe!").is_some());
    }

    #[test]
    fn test_description_length_bounds() {
        assert_eq!(
            validate_description("   ").map(|e| e.to_string()),
            Some("Analysis description is required".to_string())
        );
        assert_eq!(
            validate_description("too short"),
            Some(ValidationError::TooShort { field: Field::Description, min: 10 })
        );
        // 首尾空白不计入长度
        assert_eq!(
            validate_description("too short").map(|e| e.to_string()),
            Some("Description must be at least 10 characters long".to_string())
        );
        assert!(validate_description("   short text   ").is_none());
        assert!(validate_description("  abcdefghi  ").is_some());

        assert!(validate_description("Peak at 40").is_none());

        let max = "ab".repeat(500);
        assert!(validate_description(&max).is_none());
        let over = format!("{max}c");
        assert_eq!(
            validate_description(&over).map(|e| e.to_string()),
            Some("Description must be at most 1000 characters".to_string())
        );
    }

    #[test]
    fn test_description_rejects_single_char_repeat() {
        assert_eq!(validate_description("aaaaaaaaaa"), Some(ValidationError::Repetitive));
        assert_eq!(validate_description(&"z".repeat(999)), Some(ValidationError::Repetitive));
        assert_eq!(validate_description("  ..........  "), Some(ValidationError::Repetitive));
        // 重复的单词不会被识别
        assert!(validate_description("abababababab").is_none());
        assert!(validate_description("aaaaaaaaaab").is_none());
    }

    #[test]
    fn test_field_dispatch() {
        assert!(Field::Email.validate("a@b.co").is_none());
        assert!(Field::FirstName.validate("Al").is_none());
        assert!(Field::Description.validate("x").is_some());
    }
}
