// ==========================================
// 加气混凝土质量分析 - 批次记录模型
// ==========================================
// 职责: 对松散结构的批次文档提供类型化访问
// 红线: 访问器永不失败; 缺失键/类型不符一律返回"缺失"
// ==========================================
// 文档形状（上游导入生成）:
// { batchId, mouldId, date,
//   processSteps: { cutting: {...}, segregation: { totalBlocks, totalDefects,
//                   defects: { "1": { rainCracksCuts: n, ... }, ... } } } }
// ==========================================

use crate::domain::types::{DefectType, Position, RejectionField};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 日期文本格式 (YYYY-MM-DD)
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// 缺少 mouldId 的批次归入此分组
pub const UNKNOWN_MOULD_ID: &str = "UNKNOWN";

// ==========================================
// FieldValue - 单个字段的类型化视图
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Null,
    Bool(bool),
    Number(f64),
    Text(&'a str),
    /// 数组或对象
    Composite,
}

impl<'a> FieldValue<'a> {
    pub fn from_json(value: &'a Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(*b),
            Value::Number(n) => n.as_f64().map(FieldValue::Number).unwrap_or(FieldValue::Composite),
            Value::String(s) => FieldValue::Text(s.as_str()),
            Value::Array(_) | Value::Object(_) => FieldValue::Composite,
        }
    }

    /// 哨兵缺失值: {null, 0, "", "No", "N/A"}
    ///
    /// false 与 0 等价（上游表格把空勾选导出为 false）
    pub fn is_sentinel_absent(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Bool(b) => !b,
            FieldValue::Number(n) => *n == 0.0,
            FieldValue::Text(s) => s.is_empty() || *s == "No" || *s == "N/A",
            FieldValue::Composite => false,
        }
    }
}

/// 单项计数上限; 超出视为无法解析
pub const MAX_COUNT: u64 = 1_000_000_000;

/// 解析缺陷计数/块数
///
/// 只接受 0..=MAX_COUNT 的整数（数字或整数文本）; null、""、"-"、小数、负数、
/// 超限值、非数字文本一律视为缺失。
pub fn parse_count(value: &Value) -> Option<u64> {
    let count = match value {
        Value::Number(n) => match n.as_u64() {
            Some(u) => u,
            None => match n.as_f64() {
                Some(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= MAX_COUNT as f64 => {
                    f as u64
                }
                _ => return None,
            },
        },
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() || trimmed == "-" {
                return None;
            }
            trimmed.parse::<u64>().ok()?
        }
        _ => return None,
    };

    if count > MAX_COUNT {
        tracing::debug!(count, "计数超出上限, 视为缺失");
        return None;
    }
    Some(count)
}

/// 解析日期文本; 时间部分（如有）忽略
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let head = text.trim().get(..10)?;
    NaiveDate::parse_from_str(head, DATE_FORMAT).ok()
}

/// 标识符转文本: 字符串原样（去空白）, 数字转十进制文本
pub fn identifier_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(match n.as_i64() {
            Some(i) => i.to_string(),
            None => n.to_string(),
        }),
        _ => None,
    }
}

// ==========================================
// BatchRecord - 批次记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchRecord {
    doc: Value,
}

impl BatchRecord {
    pub fn new(doc: Value) -> Self {
        Self { doc }
    }

    pub fn batch_id(&self) -> Option<String> {
        self.doc.get("batchId").and_then(identifier_text)
    }

    pub fn mould_id(&self) -> Option<String> {
        self.doc.get("mouldId").and_then(identifier_text)
    }

    /// 模具分组键
    pub fn mould_key(&self) -> String {
        self.mould_id()
            .unwrap_or_else(|| UNKNOWN_MOULD_ID.to_string())
    }

    /// 日期原文（支持 {"$date": "..."} 形式）
    pub fn date_text(&self) -> Option<&str> {
        match self.doc.get("date")? {
            Value::String(s) => Some(s.as_str()),
            Value::Object(obj) => obj.get("$date").and_then(Value::as_str),
            _ => None,
        }
    }

    /// 批次日期; 缺失或无法解析时为 None
    pub fn date(&self) -> Option<NaiveDate> {
        self.date_text().and_then(parse_date_text)
    }

    fn process_step(&self, step: &str) -> Option<&Map<String, Value>> {
        self.doc
            .get("processSteps")?
            .as_object()?
            .get(step)?
            .as_object()
    }

    /// 切割工序数据块
    pub fn cutting(&self) -> Option<&Map<String, Value>> {
        self.process_step("cutting")
    }

    /// 切割剔除字段; 键不存在时为 None
    pub fn cutting_field(&self, field: RejectionField) -> Option<FieldValue<'_>> {
        self.cutting()?.get(field.key()).map(FieldValue::from_json)
    }

    /// 该字段是否记录了剔除（存在且不是哨兵缺失值）
    pub fn rejection_present(&self, field: RejectionField) -> bool {
        self.cutting_field(field)
            .map(|v| !v.is_sentinel_absent())
            .unwrap_or(false)
    }

    /// 分拣工序数据块
    pub fn segregation(&self) -> Option<SegregationBlock<'_>> {
        self.process_step("segregation")
            .map(|block| SegregationBlock { block })
    }
}

impl From<Value> for BatchRecord {
    fn from(doc: Value) -> Self {
        Self::new(doc)
    }
}

// ==========================================
// SegregationBlock - 分拣数据视图
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct SegregationBlock<'a> {
    block: &'a Map<String, Value>,
}

/// 单个 (位置, 缺陷类型) 的计数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefectCount {
    pub position: Position,
    pub defect_type: DefectType,
    pub count: u64,
}

impl<'a> SegregationBlock<'a> {
    pub fn total_blocks(&self) -> Option<u64> {
        self.block.get("totalBlocks").and_then(parse_count)
    }

    /// 可识别的缺陷计数
    ///
    /// 未知位置/未知缺陷类型/无法解析的计数均被跳过。
    pub fn defect_counts(&self) -> Vec<DefectCount> {
        let Some(defects) = self.block.get("defects").and_then(Value::as_object) else {
            return Vec::new();
        };

        let mut counts = Vec::new();
        for (position_key, by_type) in defects {
            let Some(position) = Position::from_key(position_key) else {
                tracing::debug!(position = %position_key, "忽略未知分拣位置");
                continue;
            };
            let Some(by_type) = by_type.as_object() else {
                continue;
            };

            for (type_key, raw) in by_type {
                let Some(defect_type) = DefectType::from_key(type_key) else {
                    tracing::debug!(defect_type = %type_key, "忽略未知缺陷类型");
                    continue;
                };
                if let Some(count) = parse_count(raw) {
                    counts.push(DefectCount {
                        position,
                        defect_type,
                        count,
                    });
                }
            }
        }
        counts
    }

    /// 重新累加的缺陷总数
    pub fn recomputed_total_defects(&self) -> u64 {
        self.defect_counts()
            .iter()
            .fold(0u64, |acc, c| acc.saturating_add(c.count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sentinel_values() {
        for v in [json!(null), json!(0), json!(0.0), json!(""), json!("No"), json!("N/A"), json!(false)] {
            assert!(FieldValue::from_json(&v).is_sentinel_absent(), "{:?}", v);
        }
        for v in [json!("Yes"), json!(1), json!(2.5), json!("crack"), json!("no"), json!(true), json!([])] {
            assert!(!FieldValue::from_json(&v).is_sentinel_absent(), "{:?}", v);
        }
    }

    #[test]
    fn test_missing_process_steps() {
        let record = BatchRecord::new(json!({ "batchId": "1", "mouldId": "M1" }));
        assert!(record.cutting().is_none());
        assert!(record.segregation().is_none());
        assert!(!record.rejection_present(RejectionField::ChippingRejection));
        assert!(record.date().is_none());
    }

    #[test]
    fn test_identifier_coercion() {
        let record = BatchRecord::new(json!({ "batchId": 1520, "mouldId": " 7 ", "date": "2024-01-03T08:15:00Z" }));
        assert_eq!(record.batch_id().as_deref(), Some("1520"));
        assert_eq!(record.mould_id().as_deref(), Some("7"));
        assert_eq!(record.date(), NaiveDate::from_ymd_opt(2024, 1, 3));
    }

    #[test]
    fn test_extended_json_date() {
        let record = BatchRecord::new(json!({ "date": { "$date": "2024-02-29T00:00:00Z" } }));
        assert_eq!(record.date(), NaiveDate::from_ymd_opt(2024, 2, 29));

        let bad = BatchRecord::new(json!({ "date": "29/02/2024" }));
        assert!(bad.date().is_none());
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count(&json!(3)), Some(3));
        assert_eq!(parse_count(&json!("2")), Some(2));
        assert_eq!(parse_count(&json!(" 4 ")), Some(4));
        assert_eq!(parse_count(&json!(5.0)), Some(5));
        assert_eq!(parse_count(&json!("-")), None);
        assert_eq!(parse_count(&json!("")), None);
        assert_eq!(parse_count(&json!(null)), None);
        assert_eq!(parse_count(&json!("abc")), None);
        assert_eq!(parse_count(&json!(-1)), None);
        assert_eq!(parse_count(&json!(1.5)), None);
    }

    #[test]
    fn test_parse_count_rejects_out_of_range() {
        assert_eq!(parse_count(&json!(MAX_COUNT)), Some(MAX_COUNT));
        assert_eq!(parse_count(&json!(MAX_COUNT + 1)), None);
        assert_eq!(parse_count(&json!("18446744073709551615")), None);
        assert_eq!(parse_count(&json!(u64::MAX)), None);
        assert_eq!(parse_count(&json!(1e30)), None);
        assert_eq!(parse_count(&json!("99999999999999999999999")), None);
    }

    #[test]
    fn test_segregation_lenient_parsing() {
        let record = BatchRecord::new(json!({
            "processSteps": { "segregation": {
                "totalBlocks": 250,
                "totalDefects": 99,
                "defects": {
                    "1": { "cornerDamage": "2", "unknownType": 4, "chippedBlocks": "-" },
                    "7": { "cornerDamage": "5" },
                    "2": "garbage"
                }
            }}
        }));

        let seg = record.segregation().unwrap();
        assert_eq!(seg.total_blocks(), Some(250));

        let counts = seg.defect_counts();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0].position.number(), 1);
        assert_eq!(counts[0].defect_type, DefectType::CornerDamage);
        assert_eq!(counts[0].count, 2);
        assert_eq!(seg.recomputed_total_defects(), 2);
    }
}
