// ==========================================
// 加气混凝土质量分析 - 分拣缺陷分析引擎
// ==========================================
// 职责: 按 缺陷类型 × 分拣位置 × 模具 三个维度统计缺陷,
//       并给出最差模具 / 最差批次排行
// 输入: BatchRecord 序列
// 输出: SegregationReport
// ==========================================
// 红线:
// - 每个批次都计入模具的 totalBatches（无论有无分拣数据）
// - 缺陷总数一律由类型计数重新累加, 不采信上游 totalDefects
// - batchesWithDefects 的分子/分母只统计有分拣数据的批次
// ==========================================

use crate::domain::batch::BatchRecord;
use crate::domain::counters::DefectCounters;
use crate::domain::report::{
    DefectTypeCount, DefectTypeShare, MouldDefectProfile, PositionBreakdown, SegregationEntry,
    SegregationReport, SegregationSummary,
};
use crate::domain::types::{DefectType, Position};
use crate::engine::aggregator::{round2, safe_rate, safe_ratio, Grouped};
use crate::engine::error::AnalysisOutcome;
use crate::engine::ranker::top_n;
use tracing::instrument;

/// 最差模具排行默认条数
pub const DEFAULT_TOP_MOULD_LIMIT: usize = 10;
/// 最差批次排行默认条数
pub const DEFAULT_WORST_BATCH_LIMIT: usize = 10;

// ==========================================
// MouldGroup - 模具缺陷累加器
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MouldGroup {
    pub total_batches: u64,
    pub total_defects: u64,
    pub defect_counters: DefectCounters,
}

impl MouldGroup {
    pub fn merge(&mut self, other: &MouldGroup) {
        self.total_batches += other.total_batches;
        self.total_defects = self.total_defects.saturating_add(other.total_defects);
        self.defect_counters.merge(&other.defect_counters);
    }

    /// 每批次平均缺陷数（每个分组至少 1 个批次）
    pub fn average_defects_per_batch(&self) -> f64 {
        safe_ratio(self.total_defects, self.total_batches)
    }
}

// ==========================================
// SegregationAccumulator - 分拣统计累加器
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct SegregationAccumulator {
    pub total_batches: u64,
    /// 带分拣数据的批次数
    pub inspected_batches: u64,
    pub batches_with_defects: u64,
    pub type_totals: DefectCounters,
    pub position_totals: [DefectCounters; Position::COUNT],
    pub moulds: Grouped<String, MouldGroup>,
    /// 单批次结果, defect_rate 未取整
    pub entries: Vec<SegregationEntry>,
}

impl SegregationAccumulator {
    /// 单批次折叠
    pub fn absorb(&mut self, batch: &BatchRecord) {
        self.total_batches += 1;

        let mould_id = batch.mould_key();
        let group = self
            .moulds
            .entry_or_insert_with(mould_id.clone(), |_| MouldGroup::default());
        group.total_batches += 1;

        let Some(segregation) = batch.segregation() else {
            return;
        };
        self.inspected_batches += 1;

        let mut batch_defects = 0u64;
        for defect in segregation.defect_counts() {
            self.type_totals.add(defect.defect_type, defect.count);
            self.position_totals[defect.position.index()].add(defect.defect_type, defect.count);
            group.defect_counters.add(defect.defect_type, defect.count);
            group.total_defects = group.total_defects.saturating_add(defect.count);
            batch_defects = batch_defects.saturating_add(defect.count);
        }

        if batch_defects > 0 {
            self.batches_with_defects += 1;
        }

        let total_blocks = segregation.total_blocks().unwrap_or(0);
        self.entries.push(SegregationEntry {
            batch_id: batch.batch_id().unwrap_or_default(),
            mould_id,
            date: batch.date(),
            total_blocks,
            total_defects: batch_defects,
            defect_rate: safe_rate(batch_defects, total_blocks),
        });
    }

    /// 合并另一分片（分片按输入顺序相邻时与单次折叠等价）
    pub fn merge(mut self, other: SegregationAccumulator) -> Self {
        self.total_batches += other.total_batches;
        self.inspected_batches += other.inspected_batches;
        self.batches_with_defects += other.batches_with_defects;
        self.type_totals.merge(&other.type_totals);
        for (mine, theirs) in self.position_totals.iter_mut().zip(other.position_totals.iter()) {
            mine.merge(theirs);
        }
        self.moulds = self.moulds.merge_with(other.moulds, |acc, g| acc.merge(&g));
        self.entries.extend(other.entries);
        self
    }

    /// 总缺陷数 = 各类型计数之和
    pub fn total_defects(&self) -> u64 {
        self.type_totals.total()
    }
}

// ==========================================
// SegregationAnalyzer - 分拣缺陷分析引擎
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct SegregationAnalyzer {
    top_mould_limit: usize,
    worst_batch_limit: usize,
}

impl Default for SegregationAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SegregationAnalyzer {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_TOP_MOULD_LIMIT, DEFAULT_WORST_BATCH_LIMIT)
    }

    pub fn with_limits(top_mould_limit: usize, worst_batch_limit: usize) -> Self {
        Self {
            top_mould_limit,
            worst_batch_limit,
        }
    }

    /// 折叠整个批次序列
    pub fn accumulate(&self, batches: &[BatchRecord]) -> SegregationAccumulator {
        batches
            .iter()
            .fold(SegregationAccumulator::default(), |mut acc, batch| {
                acc.absorb(batch);
                acc
            })
    }

    /// 生成分拣缺陷报表; 空输入返回 NoData
    #[instrument(skip(self, batches), fields(count = batches.len()))]
    pub fn analyze(&self, batches: &[BatchRecord]) -> AnalysisOutcome<SegregationReport> {
        if batches.is_empty() {
            return AnalysisOutcome::NoData;
        }
        let acc = self.accumulate(batches);
        tracing::debug!(
            inspected = acc.inspected_batches,
            moulds = acc.moulds.len(),
            "分拣统计完成"
        );
        AnalysisOutcome::Report(self.assemble(acc))
    }

    /// 累加器 → 报表
    pub fn assemble(&self, acc: SegregationAccumulator) -> SegregationReport {
        let total_defects = acc.total_defects();

        let summary = SegregationSummary {
            total_batches: acc.total_batches,
            batches_with_defects: acc.batches_with_defects,
            total_defects,
            defect_rate: round2(safe_rate(acc.batches_with_defects, acc.inspected_batches)),
        };

        let defects_by_type = acc
            .type_totals
            .iter()
            .map(|(defect_type, count)| DefectTypeShare {
                defect_type: defect_type.label().to_string(),
                count,
                percentage: round2(safe_rate(count, total_defects)),
            })
            .collect();

        let defects_by_position = Position::all()
            .map(|position| {
                let counters = &acc.position_totals[position.index()];
                let total = counters.total();
                PositionBreakdown {
                    position: position.to_string(),
                    rain_cracks_cuts: counters.get(DefectType::RainCracksCuts),
                    corner_cracks_cuts: counters.get(DefectType::CornerCracksCuts),
                    corner_damage: counters.get(DefectType::CornerDamage),
                    chipped_blocks: counters.get(DefectType::ChippedBlocks),
                    total,
                    percentage: round2(safe_rate(total, total_defects)),
                }
            })
            .collect();

        let mould_performance = top_n(
            acc.moulds.into_vec(),
            |(_, group)| group.average_defects_per_batch(),
            self.top_mould_limit,
        )
        .into_iter()
        .map(|(mould_id, group)| MouldDefectProfile {
            mould_id,
            total_batches: group.total_batches,
            total_defects: group.total_defects,
            average_defects_per_batch: round2(group.average_defects_per_batch()),
            defect_types: group
                .defect_counters
                .iter()
                .map(|(defect_type, count)| DefectTypeCount {
                    defect_type: defect_type.label().to_string(),
                    count,
                })
                .collect(),
        })
        .collect();

        let worst_batches = top_n(acc.entries, |entry| entry.defect_rate, self.worst_batch_limit)
            .into_iter()
            .map(|entry| SegregationEntry {
                defect_rate: round2(entry.defect_rate),
                ..entry
            })
            .collect();

        SegregationReport {
            summary,
            defects_by_type,
            defects_by_position,
            mould_performance,
            worst_batches,
        }
    }
}
