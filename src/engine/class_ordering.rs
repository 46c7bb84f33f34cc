// ==========================================
// 学校教务管理系统 - 班级排序引擎
// ==========================================
// 职责: 由班级名称推断年级, 计算班级的确定性全序
// 排序键: (sort_order 升序, 空值最后) → (年级升序)
// 红线: 稳定排序, 幂等（对已排序序列排序不改变顺序）
// ==========================================

use crate::domain::class::ClassNode;
use std::cmp::Ordering;

/// 无法识别的班级名称的年级（排在最后）
pub const UNKNOWN_LEVEL: f64 = 1000.0;

/// "…Passed" 变体排在其基础班级之后
pub const PASSED_OFFSET: f64 = 0.5;

// 学前关键字（按优先级检查, 子串匹配）
const KEYWORD_LEVELS: [(&str, f64); 5] = [
    ("playgroup", -5.0),
    ("nursery", -4.0),
    ("kg", -3.0),
    ("junior", -2.0),
    ("senior", -1.0),
];

const WORD_NUMBERS: [(&str, f64); 12] = [
    ("one", 1.0),
    ("two", 2.0),
    ("three", 3.0),
    ("four", 4.0),
    ("five", 5.0),
    ("six", 6.0),
    ("seven", 7.0),
    ("eight", 8.0),
    ("nine", 9.0),
    ("ten", 10.0),
    ("eleven", 11.0),
    ("twelve", 12.0),
];

/// 由班级名称推断年级
///
/// # 规则
/// 1. 小写并去掉空格/连字符后, 依次匹配学前关键字
/// 2. 否则取原名称中第一段连续数字
/// 3. 否则按空白/连字符分词, 匹配英文数字词（第一个命中为准）
/// 4. 均不匹配: UNKNOWN_LEVEL
/// 5. 名称含 "passed"（大小写不敏感）: 结果 + 0.5
pub fn compute_level(name: &str) -> f64 {
    let lower = name.to_lowercase();
    let base = keyword_level(&lower)
        .or_else(|| first_digit_run(name))
        .or_else(|| word_number_level(&lower))
        .unwrap_or(UNKNOWN_LEVEL);

    if lower.contains("passed") {
        base + PASSED_OFFSET
    } else {
        base
    }
}

fn keyword_level(lower: &str) -> Option<f64> {
    let compact: String = lower.chars().filter(|c| *c != ' ' && *c != '-').collect();
    KEYWORD_LEVELS
        .iter()
        .find(|(keyword, _)| compact.contains(keyword))
        .map(|(_, level)| *level)
}

fn first_digit_run(name: &str) -> Option<f64> {
    let digits: String = name
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        None
    } else {
        digits.parse::<f64>().ok()
    }
}

fn word_number_level(lower: &str) -> Option<f64> {
    lower
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|token| !token.is_empty())
        .find_map(|token| {
            WORD_NUMBERS
                .iter()
                .find(|(word, _)| *word == token)
                .map(|(_, level)| *level)
        })
}

/// 比较两个班级的排序位置
pub fn compare_classes(a: &ClassNode, b: &ClassNode) -> Ordering {
    let order_a = a.sort_order.map(|v| v as f64).unwrap_or(f64::INFINITY);
    let order_b = b.sort_order.map(|v| v as f64).unwrap_or(f64::INFINITY);

    order_a
        .total_cmp(&order_b)
        .then_with(|| compute_level(&a.name).total_cmp(&compute_level(&b.name)))
}

/// 班级排序（稳定）
pub fn sort_classes(mut classes: Vec<ClassNode>) -> Vec<ClassNode> {
    classes.sort_by(compare_classes);
    classes
}
