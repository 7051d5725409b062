//! 表单状态机
//!
//! 单个字段的校验规则：
//! - 输入时：字段被 touch 过才实时校验
//! - 失焦时：无条件校验并标记 touched
//! - 提交时：强制 touch 全部字段并重新校验
//!
//! 初次渲染不显示任何错误，即使必填字段为空。

use crate::Identity;
use crate::validation::{Field, ValidationError};

#[derive(Debug, Clone, PartialEq)]
pub struct FieldState {
    field: Field,
    value: String,
    touched: bool,
    error: Option<ValidationError>,
}

impl FieldState {
    pub fn new(field: Field) -> Self {
        Self {
            field,
            value: String::new(),
            touched: false,
            error: None,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_touched(&self) -> bool {
        self.touched
    }

    /// 当前显示给用户的错误
    pub fn error(&self) -> Option<&ValidationError> {
        self.error.as_ref()
    }

    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }

    /// 忽略 touched 状态的真实校验结果
    pub fn is_valid(&self) -> bool {
        self.field.validate(&self.value).is_none()
    }

    pub fn is_blank(&self) -> bool {
        self.value.trim().is_empty()
    }

    pub fn input(&mut self, value: impl Into<String>) {
        self.value = value.into();
        if self.touched {
            self.revalidate();
        }
    }

    pub fn blur(&mut self) {
        self.touched = true;
        self.revalidate();
    }

    pub fn reset(&mut self) {
        self.value.clear();
        self.touched = false;
        self.error = None;
    }

    fn revalidate(&mut self) {
        self.error = self.field.validate(&self.value);
    }
}

// =========================================================
// 登录表单
// =========================================================

#[derive(Debug, Clone, PartialEq)]
pub struct LoginForm {
    pub email: FieldState,
    pub first_name: FieldState,
    pub last_name: FieldState,
}

impl LoginForm {
    pub fn new() -> Self {
        Self {
            email: FieldState::new(Field::Email),
            first_name: FieldState::new(Field::FirstName),
            last_name: FieldState::new(Field::LastName),
        }
    }

    pub fn field_mut(&mut self, field: Field) -> Option<&mut FieldState> {
        match field {
            Field::Email => Some(&mut self.email),
            Field::FirstName => Some(&mut self.first_name),
            Field::LastName => Some(&mut self.last_name),
            Field::Description => None,
        }
    }

    pub fn field(&self, field: Field) -> Option<&FieldState> {
        match field {
            Field::Email => Some(&self.email),
            Field::FirstName => Some(&self.first_name),
            Field::LastName => Some(&self.last_name),
            Field::Description => None,
        }
    }

    fn fields(&self) -> [&FieldState; 3] {
        [&self.email, &self.first_name, &self.last_name]
    }

    /// 表单整体有效：所有字段校验通过且必填字段均非空
    pub fn is_valid(&self) -> bool {
        self.fields()
            .iter()
            .all(|f| !f.is_blank() && f.error().is_none() && f.is_valid())
    }

    /// 登录按钮是否可用：没有正在显示的错误，且三个字段去空白后都非空
    ///
    /// 只看已显示的错误，未 touch 的字段不会因为内容不合法而禁用按钮。
    pub fn can_submit(&self) -> bool {
        self.fields()
            .iter()
            .all(|f| f.error().is_none() && !f.is_blank())
    }

    /// 提交前调用：强制 touch 全部字段并重新校验，返回表单是否可提交
    pub fn submit(&mut self) -> bool {
        self.email.blur();
        self.first_name.blur();
        self.last_name.blur();
        self.is_valid()
    }

    /// 由表单内容构造身份（字段值去除首尾空白）
    pub fn identity(&self) -> Identity {
        Identity::new(
            self.email.value().trim(),
            self.first_name.value().trim(),
            self.last_name.value().trim(),
        )
    }
}

impl Default for LoginForm {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================
// 分析描述表单
// =========================================================

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisForm {
    pub description: FieldState,
}

impl AnalysisForm {
    pub fn new() -> Self {
        Self {
            description: FieldState::new(Field::Description),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.description.is_valid()
    }

    pub fn submit(&mut self) -> bool {
        self.description.blur();
        self.is_valid()
    }

    pub fn trimmed(&self) -> &str {
        self.description.value().trim()
    }

    /// 字符计数（未去空白），对应 “n/1000 characters”
    pub fn char_count(&self) -> usize {
        self.description.value().chars().count()
    }

    /// 已输入内容但还不足最小长度时给出提示
    pub fn needs_more_chars(&self) -> bool {
        let len = self.trimmed().chars().count();
        len > 0 && len < crate::validation::DESCRIPTION_MIN_LEN
    }

    pub fn reset(&mut self) {
        self.description.reset();
    }
}

impl Default for AnalysisForm {
    fn default() -> Self {
        Self::new()
    }
}
