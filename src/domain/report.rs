// ==========================================
// 加气混凝土质量分析 - 报表结构
// ==========================================
// 职责: 四类分析报表的对外结构
// 字段命名与既有前端契约保持一致:
// - 批次质量: snake_case
// - 剔除趋势 / 模具表现: PascalCase 列名
// - 分拣分析: camelCase
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// 批次质量汇总 (Batch Quality Summary)
// ==========================================

/// 单个剔除类型汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectionSummary {
    pub rejection_type: String,
    pub count: u64,
    /// 占总批次数百分比（两位小数）
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchQualityStats {
    pub total_batches: u64,
    pub rejected_batches: u64,
    pub rejection_rate: f64,
    /// 按次数降序
    pub rejection_by_type: Vec<RejectionSummary>,
    /// 无任何剔除时为 "None"
    pub most_common_rejection: String,
}

// ==========================================
// 剔除趋势 (Rejection Trends)
// ==========================================

/// 单个时间段的剔除统计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectionTrendRow {
    #[serde(rename = "Period")]
    pub period: NaiveDate,
    #[serde(rename = "TotalBatches")]
    pub total_batches: u64,
    #[serde(rename = "RejectedBatches")]
    pub rejected_batches: u64,
    #[serde(rename = "RejectionRate")]
    pub rejection_rate: f64,

    #[serde(rename = "TiltingCraneRejections")]
    pub tilting_crane_rejections: u64,
    #[serde(rename = "ChippingRejections")]
    pub chipping_rejections: u64,
    #[serde(rename = "SideCutterRejections")]
    pub side_cutter_rejections: u64,
    #[serde(rename = "JoinedRejections")]
    pub joined_rejections: u64,
    #[serde(rename = "TrimmingRejections")]
    pub trimming_rejections: u64,
    #[serde(rename = "RejectedDueToHC")]
    pub rejected_due_to_hc: u64,
    #[serde(rename = "RejectedDueToVC")]
    pub rejected_due_to_vc: u64,

    #[serde(rename = "TiltingCraneRate")]
    pub tilting_crane_rate: f64,
    #[serde(rename = "ChippingRate")]
    pub chipping_rate: f64,
    #[serde(rename = "SideCutterRate")]
    pub side_cutter_rate: f64,
    #[serde(rename = "JoinedRate")]
    pub joined_rate: f64,
    #[serde(rename = "TrimmingRate")]
    pub trimming_rate: f64,
    #[serde(rename = "HCRate")]
    pub hc_rate: f64,
    #[serde(rename = "VCRate")]
    pub vc_rate: f64,
}

// ==========================================
// 模具表现 (Mould Performance)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MouldPerformanceRow {
    #[serde(rename = "MouldId")]
    pub mould_id: String,
    #[serde(rename = "TotalBatches")]
    pub total_batches: u64,
    #[serde(rename = "RejectedBatches")]
    pub rejected_batches: u64,
    #[serde(rename = "RejectionRate")]
    pub rejection_rate: f64,
}

// ==========================================
// 分拣缺陷分析 (Segregation Analysis)
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegregationSummary {
    pub total_batches: u64,
    pub batches_with_defects: u64,
    pub total_defects: u64,
    pub defect_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefectTypeShare {
    #[serde(rename = "type")]
    pub defect_type: String,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionBreakdown {
    pub position: String,
    pub rain_cracks_cuts: u64,
    pub corner_cracks_cuts: u64,
    pub corner_damage: u64,
    pub chipped_blocks: u64,
    pub total: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefectTypeCount {
    #[serde(rename = "type")]
    pub defect_type: String,
    pub count: u64,
}

/// 模具缺陷画像
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MouldDefectProfile {
    pub mould_id: String,
    pub total_batches: u64,
    pub total_defects: u64,
    pub average_defects_per_batch: f64,
    pub defect_types: Vec<DefectTypeCount>,
}

/// 单批次分拣结果（用于最差批次排行）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegregationEntry {
    pub batch_id: String,
    pub mould_id: String,
    pub date: Option<NaiveDate>,
    pub total_blocks: u64,
    pub total_defects: u64,
    pub defect_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegregationReport {
    pub summary: SegregationSummary,
    pub defects_by_type: Vec<DefectTypeShare>,
    pub defects_by_position: Vec<PositionBreakdown>,
    pub mould_performance: Vec<MouldDefectProfile>,
    pub worst_batches: Vec<SegregationEntry>,
}
