//! 作用域变量值 - 动态类型的标签变体

use serde_json::Value as JsonValue;

/// 作用域变量的值
///
/// 强制转换规则：
/// - 显示转换：数字去掉多余的 `.0`，`Nil` 渲染为空串，列表按逗号连接
/// - 真值判断：`Nil`、`false`、`0`、空串、空列表为假
/// - 数值转换：字符串尝试解析，布尔为 0/1，其余为 `None`
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Str(String),
    Bool(bool),
    List(Vec<Value>),
    Nil,
}

impl Value {
    /// 按属性字面量规则解释字符串：整数/小数 -> Number，true/false -> Bool
    pub fn from_literal(text: &str) -> Value {
        let trimmed = text.trim();

        if trimmed == "true" {
            return Value::Bool(true);
        }
        if trimmed == "false" {
            return Value::Bool(false);
        }
        if let Ok(num) = trimmed.parse::<f64>() {
            if !trimmed.is_empty() {
                return Value::Number(num);
            }
        }

        Value::Str(text.to_string())
    }

    /// 字符串强制转换，用于插值和表单序列化
    pub fn display(&self) -> String {
        match self {
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            Value::Str(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::List(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.display()).collect();
                parts.join(", ")
            }
            Value::Nil => String::new(),
        }
    }

    /// 真值判断
    pub fn truthy(&self) -> bool {
        match self {
            Value::Number(n) => *n != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Bool(b) => *b,
            Value::List(items) => !items.is_empty(),
            Value::Nil => false,
        }
    }

    /// 数值强制转换，用于比较
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Str(s) => s.trim().parse().ok(),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// 转换为 JSON，用于远程指令的请求体
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Value::Str(s) => JsonValue::String(s.clone()),
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::List(items) => JsonValue::Array(items.iter().map(|v| v.to_json()).collect()),
            Value::Nil => JsonValue::Null,
        }
    }

    pub fn from_json(json: &JsonValue) -> Value {
        match json {
            JsonValue::Null => Value::Nil,
            JsonValue::Bool(b) => Value::Bool(*b),
            JsonValue::Number(n) => Value::Number(n.as_f64().unwrap_or(0.0)),
            JsonValue::String(s) => Value::Str(s.clone()),
            JsonValue::Array(items) => Value::List(items.iter().map(Value::from_json).collect()),
            JsonValue::Object(_) => Value::Str(json.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_coercion() {
        assert_eq!(Value::from_literal("42"), Value::Number(42.0));
        assert_eq!(Value::from_literal("-1.5"), Value::Number(-1.5));
        assert_eq!(Value::from_literal("true"), Value::Bool(true));
        assert_eq!(Value::from_literal("hello"), Value::Str("hello".to_string()));
    }

    #[test]
    fn test_display_drops_trailing_zero() {
        assert_eq!(Value::Number(4.0).display(), "4");
        assert_eq!(Value::Number(4.5).display(), "4.5");
        assert_eq!(Value::Nil.display(), "");
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Nil.truthy());
        assert!(!Value::Number(0.0).truthy());
        assert!(!Value::Str(String::new()).truthy());
        assert!(Value::Str("x".to_string()).truthy());
        assert!(Value::List(vec![Value::Nil]).truthy());
    }
}
