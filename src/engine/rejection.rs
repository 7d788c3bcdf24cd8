// ==========================================
// 加气混凝土质量分析 - 切割剔除判定引擎
// ==========================================
// 职责: 判定批次是否发生切割剔除, 按字段累加剔除计数
// 输入: BatchRecord 序列
// 输出: bool / RejectionCounters
// ==========================================
// 红线: 判定只看七个字段; 计数覆盖九个字段
//       (wireBrokenHC / wireBrokenVC 只计数不判定)
// ==========================================

use crate::domain::batch::BatchRecord;
use crate::domain::counters::RejectionCounters;
use crate::domain::types::RejectionField;
use tracing::instrument;

// ==========================================
// RejectionClassifier - 剔除判定引擎
// ==========================================
// 无状态引擎, 所有方法都是纯函数
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectionClassifier;

impl RejectionClassifier {
    pub fn new() -> Self {
        Self
    }

    /// 批次是否发生剔除: 七个判定字段中至少一个不是哨兵缺失值
    pub fn has_rejection(&self, batch: &BatchRecord) -> bool {
        RejectionField::CLASSIFIER
            .iter()
            .any(|field| batch.rejection_present(*field))
    }

    /// 单批次的字段命中情况（每字段 0/1）
    pub fn rejection_flags(&self, batch: &BatchRecord) -> RejectionCounters {
        let mut flags = RejectionCounters::new();
        for field in RejectionField::ALL {
            if batch.rejection_present(field) {
                flags.increment(field);
            }
        }
        flags
    }

    /// 累加整个批次序列的剔除计数
    #[instrument(skip(self, batches), fields(count = batches.len()))]
    pub fn count_rejections(&self, batches: &[BatchRecord]) -> RejectionCounters {
        batches.iter().fold(RejectionCounters::new(), |mut acc, batch| {
            acc.merge(&self.rejection_flags(batch));
            acc
        })
    }
}

/// 剔除字段名转展示名称
///
/// 去掉 "Rejection" 后缀, 在 "Due" 处拆分, 再按驼峰拆词,
/// 每个词首字母大写后以空格连接:
/// - tiltingCraneRejection → "Tilting Crane"
/// - rejectedDueToHC → "Rejected To HC"
pub fn format_rejection_label(field_key: &str) -> String {
    field_key
        .replace("Rejection", "")
        .split("Due")
        .flat_map(split_camel_case)
        .map(|word| capitalize_first(&word))
        .collect::<Vec<_>>()
        .join(" ")
}

/// 驼峰拆词; 连续大写（缩写）保持为一个词
fn split_camel_case(text: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for ch in text.chars() {
        if ch.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        current.push(ch);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn capitalize_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn batch_with_cutting(cutting: Value) -> BatchRecord {
        BatchRecord::new(json!({
            "batchId": "B1",
            "mouldId": "M1",
            "date": "2024-01-01",
            "processSteps": { "cutting": cutting }
        }))
    }

    #[test]
    fn test_single_present_field() {
        let classifier = RejectionClassifier::new();
        let batch = batch_with_cutting(json!({ "chippingRejection": "Yes" }));

        assert!(classifier.has_rejection(&batch));
        let counters = classifier.count_rejections(std::slice::from_ref(&batch));
        for (field, count) in counters.iter() {
            let expected = if field == RejectionField::ChippingRejection { 1 } else { 0 };
            assert_eq!(count, expected, "{}", field);
        }
    }

    #[test]
    fn test_sentinels_are_not_rejections() {
        let classifier = RejectionClassifier::new();
        let batch = batch_with_cutting(json!({
            "tiltingCraneRejection": 0,
            "sideCutterRejection": "N/A",
            "joinedRejection": null,
            "trimmingRejection": "",
            "rejectedDueToHC": "No"
        }));
        assert!(!classifier.has_rejection(&batch));
        assert_eq!(classifier.rejection_flags(&batch).total(), 0);
    }

    #[test]
    fn test_wire_broken_counted_but_not_classified() {
        let classifier = RejectionClassifier::new();
        let batch = batch_with_cutting(json!({ "wireBrokenHC": 2, "wireBrokenVC": "Yes" }));

        assert!(!classifier.has_rejection(&batch));
        let counters = classifier.count_rejections(&[batch]);
        assert_eq!(counters.get(RejectionField::WireBrokenHC), 1);
        assert_eq!(counters.get(RejectionField::WireBrokenVC), 1);
    }

    #[test]
    fn test_missing_cutting_block() {
        let classifier = RejectionClassifier::new();
        let batch = BatchRecord::new(json!({ "batchId": "B2", "processSteps": {} }));
        assert!(!classifier.has_rejection(&batch));
        assert_eq!(classifier.count_rejections(&[batch]).total(), 0);
    }

    #[test]
    fn test_format_rejection_label() {
        assert_eq!(format_rejection_label("rejectedDueToHC"), "Rejected To HC");
        assert_eq!(format_rejection_label("rejectedDueToVC"), "Rejected To VC");
        assert_eq!(format_rejection_label("tiltingCraneRejection"), "Tilting Crane");
        assert_eq!(format_rejection_label("chippingRejection"), "Chipping");
        assert_eq!(format_rejection_label("sideCutterRejection"), "Side Cutter");
        assert_eq!(format_rejection_label("wireBrokenHC"), "Wire Broken HC");
    }
}
