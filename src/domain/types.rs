// ==========================================
// 加气混凝土质量分析 - 领域类型定义
// ==========================================
// 职责: 以封闭枚举取代字符串键字典
// 红线: 枚举声明顺序即迭代顺序（并列时的裁决顺序）
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 切割剔除字段 (Rejection Field)
// ==========================================
// 九个计数字段; 其中 WireBrokenHC / WireBrokenVC 只计数,
// 不参与"批次是否剔除"的判定
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RejectionField {
    #[serde(rename = "tiltingCraneRejection")]
    TiltingCraneRejection,
    #[serde(rename = "chippingRejection")]
    ChippingRejection,
    #[serde(rename = "sideCutterRejection")]
    SideCutterRejection,
    #[serde(rename = "joinedRejection")]
    JoinedRejection,
    #[serde(rename = "trimmingRejection")]
    TrimmingRejection,
    #[serde(rename = "wireBrokenHC")]
    WireBrokenHC,
    #[serde(rename = "wireBrokenVC")]
    WireBrokenVC,
    #[serde(rename = "rejectedDueToHC")]
    RejectedDueToHC,
    #[serde(rename = "rejectedDueToVC")]
    RejectedDueToVC,
}

impl RejectionField {
    /// 计数器字段全集（声明顺序）
    pub const ALL: [RejectionField; 9] = [
        RejectionField::TiltingCraneRejection,
        RejectionField::ChippingRejection,
        RejectionField::SideCutterRejection,
        RejectionField::JoinedRejection,
        RejectionField::TrimmingRejection,
        RejectionField::WireBrokenHC,
        RejectionField::WireBrokenVC,
        RejectionField::RejectedDueToHC,
        RejectionField::RejectedDueToVC,
    ];

    /// 参与剔除判定的七个字段
    pub const CLASSIFIER: [RejectionField; 7] = [
        RejectionField::TiltingCraneRejection,
        RejectionField::ChippingRejection,
        RejectionField::SideCutterRejection,
        RejectionField::JoinedRejection,
        RejectionField::TrimmingRejection,
        RejectionField::RejectedDueToHC,
        RejectionField::RejectedDueToVC,
    ];

    /// 原始文档中的字段名
    pub fn key(&self) -> &'static str {
        match self {
            RejectionField::TiltingCraneRejection => "tiltingCraneRejection",
            RejectionField::ChippingRejection => "chippingRejection",
            RejectionField::SideCutterRejection => "sideCutterRejection",
            RejectionField::JoinedRejection => "joinedRejection",
            RejectionField::TrimmingRejection => "trimmingRejection",
            RejectionField::WireBrokenHC => "wireBrokenHC",
            RejectionField::WireBrokenVC => "wireBrokenVC",
            RejectionField::RejectedDueToHC => "rejectedDueToHC",
            RejectionField::RejectedDueToVC => "rejectedDueToVC",
        }
    }

    /// 是否参与剔除判定
    pub fn is_classifier(&self) -> bool {
        !matches!(self, RejectionField::WireBrokenHC | RejectionField::WireBrokenVC)
    }

    /// 在 ALL 中的下标
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.key() == key)
    }
}

impl fmt::Display for RejectionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

// ==========================================
// 分拣缺陷类型 (Defect Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DefectType {
    #[serde(rename = "rainCracksCuts")]
    RainCracksCuts,
    #[serde(rename = "cornerCracksCuts")]
    CornerCracksCuts,
    #[serde(rename = "cornerDamage")]
    CornerDamage,
    #[serde(rename = "chippedBlocks")]
    ChippedBlocks,
}

impl DefectType {
    pub const ALL: [DefectType; 4] = [
        DefectType::RainCracksCuts,
        DefectType::CornerCracksCuts,
        DefectType::CornerDamage,
        DefectType::ChippedBlocks,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            DefectType::RainCracksCuts => "rainCracksCuts",
            DefectType::CornerCracksCuts => "cornerCracksCuts",
            DefectType::CornerDamage => "cornerDamage",
            DefectType::ChippedBlocks => "chippedBlocks",
        }
    }

    /// 报表展示名称
    pub fn label(&self) -> &'static str {
        match self {
            DefectType::RainCracksCuts => "Rain Cracks/Cuts",
            DefectType::CornerCracksCuts => "Corner Cracks/Cuts",
            DefectType::CornerDamage => "Corner Damage",
            DefectType::ChippedBlocks => "Chipped Blocks",
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// 未知键返回 None（宽松解析: 调用方直接忽略）
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.key() == key)
    }
}

impl fmt::Display for DefectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ==========================================
// 分拣位置 (Position "1".."6")
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position(u8);

impl Position {
    pub const COUNT: usize = 6;

    pub fn all() -> impl Iterator<Item = Position> {
        (1..=Self::COUNT as u8).map(Position)
    }

    /// 仅接受 "1".."6"（不去空白），其余一律视为未知位置
    pub fn from_key(key: &str) -> Option<Self> {
        match key.as_bytes() {
            [digit @ b'1'..=b'6'] => Some(Position(digit - b'0')),
            _ => None,
        }
    }

    pub fn number(&self) -> u8 {
        self.0
    }

    pub fn index(&self) -> usize {
        (self.0 - 1) as usize
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Position {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

// ==========================================
// 时间粒度 (Granularity)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Day,
    Week,
    Month,
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Granularity::Day => write!(f, "day"),
            Granularity::Week => write!(f, "week"),
            Granularity::Month => write!(f, "month"),
        }
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(Granularity::Day),
            "week" => Ok(Granularity::Week),
            "month" => Ok(Granularity::Month),
            other => Err(format!(
                "Invalid group_by parameter '{}'. Use day, week, or month",
                other
            )),
        }
    }
}
