// ==========================================
// 加气混凝土质量分析 - 计数器
// ==========================================
// 职责: 固定维度的计数累加器（剔除字段 / 缺陷类型）
// 红线: 累加满足结合律与交换律, 分片结果可安全合并
// ==========================================

use crate::domain::types::{DefectType, RejectionField};
use serde::ser::{Serialize, SerializeMap, Serializer};

// ==========================================
// RejectionCounters - 剔除字段计数
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RejectionCounters {
    counts: [u64; 9],
}

impl RejectionCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, field: RejectionField) {
        let slot = &mut self.counts[field.index()];
        *slot = slot.saturating_add(1);
    }

    pub fn get(&self, field: RejectionField) -> u64 {
        self.counts[field.index()]
    }

    /// 按声明顺序迭代
    pub fn iter(&self) -> impl Iterator<Item = (RejectionField, u64)> + '_ {
        RejectionField::ALL.iter().map(|f| (*f, self.get(*f)))
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().fold(0u64, |acc, c| acc.saturating_add(*c))
    }

    pub fn merge(&mut self, other: &RejectionCounters) {
        for (mine, theirs) in self.counts.iter_mut().zip(other.counts.iter()) {
            *mine = mine.saturating_add(*theirs);
        }
    }
}

impl Serialize for RejectionCounters {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(RejectionField::ALL.len()))?;
        for (field, count) in self.iter() {
            map.serialize_entry(field.key(), &count)?;
        }
        map.end()
    }
}

// ==========================================
// DefectCounters - 缺陷类型计数
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefectCounters {
    counts: [u64; 4],
}

impl DefectCounters {
    pub fn add(&mut self, defect_type: DefectType, count: u64) {
        let slot = &mut self.counts[defect_type.index()];
        *slot = slot.saturating_add(count);
    }

    pub fn get(&self, defect_type: DefectType) -> u64 {
        self.counts[defect_type.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (DefectType, u64)> + '_ {
        DefectType::ALL.iter().map(|t| (*t, self.get(*t)))
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().fold(0u64, |acc, c| acc.saturating_add(*c))
    }

    pub fn merge(&mut self, other: &DefectCounters) {
        for (mine, theirs) in self.counts.iter_mut().zip(other.counts.iter()) {
            *mine = mine.saturating_add(*theirs);
        }
    }
}
