// ==========================================
// 加气混凝土质量分析 - 报表组装引擎
// ==========================================
// 职责: 基于同一批已取回的批次序列生成四类报表
// - 批次质量汇总 (batch quality)
// - 剔除趋势 (rejection trends)
// - 模具表现 (mould performance)
// - 分拣缺陷分析 (segregation analysis)
// ==========================================
// 红线: 纯函数, 不回查数据源; 空输入一律返回 NoData
// ==========================================

use crate::domain::batch::BatchRecord;
use crate::domain::report::{
    BatchQualityStats, MouldPerformanceRow, RejectionSummary, RejectionTrendRow,
    SegregationReport,
};
use crate::domain::types::{Granularity, RejectionField};
use crate::engine::aggregator::{group_by, round2, safe_rate, RejectionTally};
use crate::engine::error::AnalysisOutcome;
use crate::engine::period::bucket;
use crate::engine::ranker::sort_descending;
use crate::engine::rejection::{format_rejection_label, RejectionClassifier};
use crate::engine::segregation::SegregationAnalyzer;
use chrono::NaiveDate;
use tracing::instrument;

/// 无任何剔除时的 most_common_rejection
pub const NO_REJECTION_LABEL: &str = "None";

// ==========================================
// ReportAssembler - 报表组装引擎
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportAssembler {
    classifier: RejectionClassifier,
    segregation: SegregationAnalyzer,
}

impl ReportAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_segregation_analyzer(segregation: SegregationAnalyzer) -> Self {
        Self {
            classifier: RejectionClassifier::new(),
            segregation,
        }
    }

    // ==========================================
    // 批次质量汇总
    // ==========================================

    #[instrument(skip(self, batches), fields(count = batches.len()))]
    pub fn batch_quality(&self, batches: &[BatchRecord]) -> AnalysisOutcome<BatchQualityStats> {
        if batches.is_empty() {
            return AnalysisOutcome::NoData;
        }

        let tally = batches.iter().fold(RejectionTally::default(), |mut acc, batch| {
            acc.absorb(batch, &self.classifier);
            acc
        });

        let mut rejection_by_type = Vec::new();
        let mut most_common: Option<(String, u64)> = None;

        for (field, count) in tally.counters.iter() {
            if count == 0 {
                continue;
            }
            let label = format_rejection_label(field.key());

            // 并列时保留枚举顺序中先出现者
            if most_common.as_ref().map_or(true, |(_, max)| count > *max) {
                most_common = Some((label.clone(), count));
            }

            rejection_by_type.push(RejectionSummary {
                rejection_type: label,
                count,
                percentage: round2(safe_rate(count, tally.total_batches)),
            });
        }

        sort_descending(&mut rejection_by_type, |summary| summary.count as f64);

        AnalysisOutcome::Report(BatchQualityStats {
            total_batches: tally.total_batches,
            rejected_batches: tally.rejected_batches,
            rejection_rate: round2(tally.rejection_rate()),
            rejection_by_type,
            most_common_rejection: most_common
                .map(|(label, _)| label)
                .unwrap_or_else(|| NO_REJECTION_LABEL.to_string()),
        })
    }

    // ==========================================
    // 剔除趋势
    // ==========================================

    /// 按时间段统计剔除; 结果按时间段升序
    ///
    /// 日期缺失或无法解析的批次不进入任何时间段
    #[instrument(skip(self, batches), fields(count = batches.len()))]
    pub fn rejection_trends(
        &self,
        batches: &[BatchRecord],
        granularity: Granularity,
    ) -> AnalysisOutcome<Vec<RejectionTrendRow>> {
        if batches.is_empty() {
            return AnalysisOutcome::NoData;
        }

        let dated: Vec<(NaiveDate, &BatchRecord)> = batches
            .iter()
            .filter_map(|batch| batch.date().map(|date| (date, batch)))
            .collect();

        let undated = batches.len() - dated.len();
        if undated > 0 {
            tracing::warn!(undated, "存在日期缺失或无法解析的批次, 已跳过趋势分段");
        }

        let mut periods = group_by(
            dated,
            |(date, _)| bucket(*date, granularity),
            |_| RejectionTally::default(),
            |acc, (_, batch)| acc.absorb(batch, &self.classifier),
        )
        .into_vec();
        periods.sort_by_key(|(period, _)| *period);

        AnalysisOutcome::Report(
            periods
                .into_iter()
                .map(|(period, tally)| trend_row(period, &tally))
                .collect(),
        )
    }

    // ==========================================
    // 模具表现
    // ==========================================

    /// 按模具统计剔除率; 按剔除率降序（并列保持首次出现顺序）
    #[instrument(skip(self, batches), fields(count = batches.len()))]
    pub fn mould_performance(
        &self,
        batches: &[BatchRecord],
    ) -> AnalysisOutcome<Vec<MouldPerformanceRow>> {
        if batches.is_empty() {
            return AnalysisOutcome::NoData;
        }

        let mut moulds = group_by(
            batches,
            |batch| batch.mould_key(),
            |_| RejectionTally::default(),
            |acc, batch| acc.absorb(batch, &self.classifier),
        )
        .into_vec();
        sort_descending(&mut moulds, |(_, tally)| tally.rejection_rate());

        AnalysisOutcome::Report(
            moulds
                .into_iter()
                .map(|(mould_id, tally)| MouldPerformanceRow {
                    mould_id,
                    total_batches: tally.total_batches,
                    rejected_batches: tally.rejected_batches,
                    rejection_rate: round2(tally.rejection_rate()),
                })
                .collect(),
        )
    }

    // ==========================================
    // 分拣缺陷分析
    // ==========================================

    pub fn segregation_analysis(
        &self,
        batches: &[BatchRecord],
    ) -> AnalysisOutcome<SegregationReport> {
        self.segregation.analyze(batches)
    }
}

/// 单时间段趋势行; 各字段比率相对于该时间段批次数
fn trend_row(period: NaiveDate, tally: &RejectionTally) -> RejectionTrendRow {
    let count = |field: RejectionField| tally.counters.get(field);
    let rate = |field: RejectionField| round2(safe_rate(count(field), tally.total_batches));

    RejectionTrendRow {
        period,
        total_batches: tally.total_batches,
        rejected_batches: tally.rejected_batches,
        rejection_rate: round2(tally.rejection_rate()),

        tilting_crane_rejections: count(RejectionField::TiltingCraneRejection),
        chipping_rejections: count(RejectionField::ChippingRejection),
        side_cutter_rejections: count(RejectionField::SideCutterRejection),
        joined_rejections: count(RejectionField::JoinedRejection),
        trimming_rejections: count(RejectionField::TrimmingRejection),
        rejected_due_to_hc: count(RejectionField::RejectedDueToHC),
        rejected_due_to_vc: count(RejectionField::RejectedDueToVC),

        tilting_crane_rate: rate(RejectionField::TiltingCraneRejection),
        chipping_rate: rate(RejectionField::ChippingRejection),
        side_cutter_rate: rate(RejectionField::SideCutterRejection),
        joined_rate: rate(RejectionField::JoinedRejection),
        trimming_rate: rate(RejectionField::TrimmingRejection),
        hc_rate: rate(RejectionField::RejectedDueToHC),
        vc_rate: rate(RejectionField::RejectedDueToVC),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn batch(batch_id: &str, mould_id: &str, date: &str, cutting: Value) -> BatchRecord {
        BatchRecord::new(json!({
            "batchId": batch_id,
            "mouldId": mould_id,
            "date": date,
            "processSteps": { "cutting": cutting }
        }))
    }

    #[test]
    fn test_batch_quality_summary() {
        let assembler = ReportAssembler::new();
        let batches = vec![
            batch("1", "M1", "2024-01-01", json!({ "chippingRejection": "Yes" })),
            batch("2", "M1", "2024-01-01", json!({ "chippingRejection": 2, "rejectedDueToHC": "Yes" })),
            batch("3", "M2", "2024-01-02", json!({ "rejectedDueToHC": "HC wire" })),
            batch("4", "M2", "2024-01-02", json!({ "wireBrokenHC": 1 })),
        ];

        let stats = assembler.batch_quality(&batches).into_option().unwrap();
        assert_eq!(stats.total_batches, 4);
        assert_eq!(stats.rejected_batches, 3);
        assert_eq!(stats.rejection_rate, 75.0);

        let labels: Vec<&str> = stats.rejection_by_type.iter().map(|r| r.rejection_type.as_str()).collect();
        assert_eq!(labels, vec!["Chipping", "Rejected To HC", "Wire Broken HC"]);
        assert_eq!(stats.rejection_by_type[0].percentage, 50.0);
        assert_eq!(stats.rejection_by_type[2].percentage, 25.0);
        // Chipping 与 Rejected To HC 并列, 取枚举顺序中的先出现者
        assert_eq!(stats.most_common_rejection, "Chipping");
    }

    #[test]
    fn test_no_rejections_reports_none() {
        let assembler = ReportAssembler::new();
        let batches = vec![batch("1", "M1", "2024-01-01", json!({ "chippingRejection": "No" }))];

        let stats = assembler.batch_quality(&batches).into_option().unwrap();
        assert_eq!(stats.rejected_batches, 0);
        assert!(stats.rejection_by_type.is_empty());
        assert_eq!(stats.most_common_rejection, NO_REJECTION_LABEL);
    }

    #[test]
    fn test_trends_are_sorted_by_period() {
        let assembler = ReportAssembler::new();
        let batches = vec![
            batch("1", "M1", "2024-03-05", json!({ "joinedRejection": "Yes" })),
            batch("2", "M1", "2024-01-20", json!({})),
            batch("3", "M1", "2024-03-28", json!({})),
            batch("4", "M1", "not-a-date", json!({ "joinedRejection": "Yes" })),
        ];

        let rows = assembler
            .rejection_trends(&batches, Granularity::Month)
            .into_option()
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].period, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(rows[1].period, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(rows[1].total_batches, 2);
        assert_eq!(rows[1].joined_rejections, 1);
        assert_eq!(rows[1].joined_rate, 50.0);
        assert_eq!(rows[1].rejection_rate, 50.0);
    }

    #[test]
    fn test_trend_row_serializes_with_column_names() {
        let assembler = ReportAssembler::new();
        let batches = vec![batch("1", "M1", "2024-01-01", json!({ "rejectedDueToVC": "Yes" }))];
        let rows = assembler
            .rejection_trends(&batches, Granularity::Day)
            .into_option()
            .unwrap();

        let value = serde_json::to_value(&rows[0]).unwrap();
        assert_eq!(value["Period"], json!("2024-01-01"));
        assert_eq!(value["RejectedDueToVC"], json!(1));
        assert_eq!(value["VCRate"], json!(100.0));
    }

    #[test]
    fn test_mould_performance_sorted_by_rate() {
        let assembler = ReportAssembler::new();
        let batches = vec![
            batch("1", "M1", "2024-01-01", json!({})),
            batch("2", "M2", "2024-01-01", json!({ "trimmingRejection": "Yes" })),
            batch("3", "M1", "2024-01-01", json!({ "trimmingRejection": "Yes" })),
            batch("4", "M3", "2024-01-01", json!({})),
            batch("5", "M1", "2024-01-01", json!({})),
        ];

        let rows = assembler.mould_performance(&batches).into_option().unwrap();
        let ids: Vec<&str> = rows.iter().map(|r| r.mould_id.as_str()).collect();
        assert_eq!(ids, vec!["M2", "M1", "M3"]);
        assert_eq!(rows[1].total_batches, 3);
        assert_eq!(rows[1].rejection_rate, 33.33);
    }

    #[test]
    fn test_empty_input_is_no_data_for_every_report() {
        let assembler = ReportAssembler::new();
        assert!(assembler.batch_quality(&[]).is_no_data());
        assert!(assembler.rejection_trends(&[], Granularity::Week).is_no_data());
        assert!(assembler.mould_performance(&[]).is_no_data());
        assert!(assembler.segregation_analysis(&[]).is_no_data());
    }
}
