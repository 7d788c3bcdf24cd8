// ==========================================
// 加气混凝土质量分析 - 分组聚合引擎
// ==========================================
// 职责: 通用分组累加 + 比率计算
// 红线: 所有百分比统一走 safe_rate, 分母为 0 时结果为 0
// ==========================================
// 分组保持首次出现顺序; 需要排序的输出在下游显式排序
// 累加器满足结合律, 分片结果可通过 merge 合并
// ==========================================

use crate::domain::batch::BatchRecord;
use crate::domain::counters::RejectionCounters;
use crate::engine::rejection::RejectionClassifier;
use std::collections::HashMap;
use std::hash::Hash;

// ==========================================
// 比率与取整
// ==========================================

/// numerator / denominator; 分母为 0 时返回 0
pub fn safe_ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator > 0 {
        numerator as f64 / denominator as f64
    } else {
        0.0
    }
}

/// 百分比: numerator / denominator * 100; 分母为 0 时返回 0
pub fn safe_rate(numerator: u64, denominator: u64) -> f64 {
    safe_ratio(numerator, denominator) * 100.0
}

/// 保留两位小数（四舍五入, 0.5 远离零）
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ==========================================
// Grouped - 保序分组结果
// ==========================================
#[derive(Debug, Clone)]
pub struct Grouped<K, A> {
    entries: Vec<(K, A)>,
    index: HashMap<K, usize>,
}

impl<K, A> Default for Grouped<K, A> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone, A> Grouped<K, A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 取得(或按 init 创建)某键的累加器
    pub fn entry_or_insert_with<F: FnOnce(&K) -> A>(&mut self, key: K, init: F) -> &mut A {
        let idx = match self.index.get(&key).copied() {
            Some(idx) => idx,
            None => {
                let acc = init(&key);
                self.entries.push((key.clone(), acc));
                self.index.insert(key, self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        &mut self.entries[idx].1
    }

    pub fn get(&self, key: &K) -> Option<&A> {
        self.index.get(key).map(|idx| &self.entries[*idx].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &A)> {
        self.entries.iter().map(|(k, a)| (k, a))
    }

    /// 合并另一分片; 本分片已有的组保持原位置, 新组追加在后
    pub fn merge_with<F>(mut self, other: Grouped<K, A>, mut merge: F) -> Self
    where
        F: FnMut(&mut A, A),
    {
        for (key, acc) in other.entries {
            match self.index.get(&key).copied() {
                Some(idx) => merge(&mut self.entries[idx].1, acc),
                None => {
                    self.index.insert(key.clone(), self.entries.len());
                    self.entries.push((key, acc));
                }
            }
        }
        self
    }

    pub fn into_vec(self) -> Vec<(K, A)> {
        self.entries
    }
}

/// 通用分组累加
///
/// # 参数
/// - `items`: 输入序列
/// - `key_fn`: 分组键
/// - `init`: 新分组的初始累加器
/// - `fold`: (累加器, 元素) → 累加器
pub fn group_by<T, K, A, KF, IF, FF>(
    items: impl IntoIterator<Item = T>,
    mut key_fn: KF,
    mut init: IF,
    mut fold: FF,
) -> Grouped<K, A>
where
    K: Eq + Hash + Clone,
    KF: FnMut(&T) -> K,
    IF: FnMut(&K) -> A,
    FF: FnMut(&mut A, T),
{
    let mut grouped = Grouped::new();
    for item in items {
        let key = key_fn(&item);
        let acc = grouped.entry_or_insert_with(key, &mut init);
        fold(acc, item);
    }
    grouped
}

// ==========================================
// RejectionTally - 剔除统计累加器
// ==========================================
// 批次质量汇总 / 趋势分段 / 模具分组共用
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RejectionTally {
    pub total_batches: u64,
    pub rejected_batches: u64,
    pub counters: RejectionCounters,
}

impl RejectionTally {
    pub fn absorb(&mut self, batch: &BatchRecord, classifier: &RejectionClassifier) {
        self.total_batches += 1;
        if classifier.has_rejection(batch) {
            self.rejected_batches += 1;
        }
        self.counters.merge(&classifier.rejection_flags(batch));
    }

    pub fn merge(&mut self, other: &RejectionTally) {
        self.total_batches += other.total_batches;
        self.rejected_batches += other.rejected_batches;
        self.counters.merge(&other.counters);
    }

    /// 剔除率（未取整）
    pub fn rejection_rate(&self) -> f64 {
        safe_rate(self.rejected_batches, self.total_batches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_safe_rate_zero_denominator() {
        for x in [0, 1, 7, 1_000_000] {
            assert_eq!(safe_rate(x, 0), 0.0);
            assert_eq!(safe_ratio(x, 0), 0.0);
        }
        assert!((safe_rate(3, 10) - 30.0).abs() < 1e-9);
        assert_eq!(round2(safe_rate(3, 10)), 30.0);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(33.333333), 33.33);
        assert_eq!(round2(66.666666), 66.67);
        assert_eq!(round2(0.0), 0.0);
        assert_eq!(round2(100.0), 100.0);
    }

    #[test]
    fn test_group_by_preserves_first_seen_order() {
        let items = vec![("b", 1), ("a", 2), ("b", 3), ("c", 4), ("a", 5)];
        let grouped = group_by(items, |(k, _)| k.to_string(), |_| 0, |acc, (_, v)| *acc += v);

        let result = grouped.into_vec();
        assert_eq!(
            result,
            vec![("b".to_string(), 4), ("a".to_string(), 7), ("c".to_string(), 4)]
        );
    }

    #[test]
    fn test_grouped_merge_is_equivalent_to_single_pass() {
        let items: Vec<(u32, u64)> = (0..40).map(|i| (i % 7, i as u64)).collect();
        let full = group_by(items.clone(), |(k, _)| *k, |_| 0u64, |acc, (_, v)| *acc += v);

        let (left, right) = items.split_at(17);
        let a = group_by(left.to_vec(), |(k, _)| *k, |_| 0u64, |acc, (_, v)| *acc += v);
        let b = group_by(right.to_vec(), |(k, _)| *k, |_| 0u64, |acc, (_, v)| *acc += v);
        let merged = a.merge_with(b, |acc, other| *acc += other);

        assert_eq!(merged.len(), full.len());
        for (key, total) in full.iter() {
            assert_eq!(merged.get(key), Some(total));
        }
    }

    #[test]
    fn test_rejection_tally() {
        let classifier = RejectionClassifier::new();
        let rejected = BatchRecord::new(json!({ "processSteps": { "cutting": { "joinedRejection": 3 } } }));
        let clean = BatchRecord::new(json!({ "processSteps": { "cutting": { "joinedRejection": 0 } } }));

        let mut tally = RejectionTally::default();
        tally.absorb(&rejected, &classifier);
        tally.absorb(&clean, &classifier);

        assert_eq!(tally.total_batches, 2);
        assert_eq!(tally.rejected_batches, 1);
        assert_eq!(tally.rejection_rate(), 50.0);
    }
}
