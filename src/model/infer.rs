//! 值推断：将编辑后的原始文本转换为带类型的JSON值

use serde_json::Value;

/// 判断是否为数字字面量：可选负号 + 整数部分 + 可选小数部分
/// （简单模式手写匹配，避免正则表达式开销）
fn is_numeric_literal(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() {
        return false;
    }
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (digits, None),
    };
    if int_part.is_empty() || !int_part.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    match frac_part {
        Some(frac) => !frac.is_empty() && frac.chars().all(|c| c.is_ascii_digit()),
        None => true,
    }
}

/// 推断编辑值的类型
///
/// 回退链按固定顺序执行：空串→null；严格JSON字面量→解析结果（允许把
/// 结构化JSON直接写进叶子字段并还原为对象/数组）；数字字面量→数值；
/// true/false→布尔；其余原样保留为字符串。任何输入都有确定结果，
/// 解析失败只是内部分支，不向外抛错
pub fn infer(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }
    if let Ok(parsed) = serde_json::from_str::<Value>(raw) {
        return parsed;
    }
    if is_numeric_literal(raw) {
        if let Some(n) = raw.parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
            return Value::Number(n);
        }
    }
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(raw.to_string()),
    }
}
