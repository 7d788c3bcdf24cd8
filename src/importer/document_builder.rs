// ==========================================
// 加气混凝土质量分析 - 批次文档构建
// ==========================================
// 职责: 日报行记录 → 批次 JSON 文档 / 蒸压釜记录文档
// ==========================================
// 列映射:
// - 配料: "Cement Kg" → materials.cement 等, 空 → 0
// - 摆渡车/翻转吊: 测量值, 空 → 0; 时间单元格 → "HH:MM"
// - 切割: "Tilting Crane Rejection" → tiltingCraneRejection 等, 空 → null
// - 分拣: "{pos}-RainCracks/Cuts" 等按位置展开, 空 → 0
// ==========================================

use crate::domain::batch::DATE_FORMAT;
use crate::domain::types::{DefectType, Position};
use crate::importer::file_parser::RawRow;
use crate::repository::autoclave_repo::record_id;
use crate::repository::batch_repo::document_id;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde_json::{json, Map, Number, Value};

pub const BATCH_NO_COLUMN: &str = "Batch No.";
pub const MOULD_NO_COLUMN: &str = "Mould No.";
pub const SHIFT_COLUMN: &str = "Shift";

/// 默认创建人
pub const DEFAULT_CREATED_BY: &str = "plant_report_import";

/// 日报未给出班次时的默认值
pub const DEFAULT_SHIFT: &str = "Day";

/// 配料原料列 → materials 字段（"Aluminum  Powder GM" 为日报原样双空格）
const MATERIAL_COLUMNS: [(&str, &str); 9] = [
    ("Fresh Slurry Kg", "freshSlurry"),
    ("Waste Slurry Kg", "wasteSlurry"),
    ("Cement Kg", "cement"),
    ("Lime Kg", "lime"),
    ("Gypsum Kg", "gypsum"),
    ("Aluminum  Powder GM", "aluminumPowder"),
    ("D C Powder GM", "dcPowder"),
    ("Water Kg", "water"),
    ("Solu. Oil Litre", "solutionOil"),
];

/// 切割列 → 文档字段
const CUTTING_COLUMNS: [(&str, &str); 11] = [
    ("Block Size", "blockSize"),
    ("Tilting Crane Rejection", "tiltingCraneRejection"),
    ("Chipping Rejection", "chippingRejection"),
    ("Side Cutter Rejection", "sideCutterRejection"),
    ("Joined Rejection", "joinedRejection"),
    ("Trimming Rejection", "trimmingRejection"),
    ("Wire Broken HC", "wireBrokenHC"),
    ("Wire Broken VC", "wireBrokenVC"),
    ("Rejected Due to HC", "rejectedDueToHC"),
    ("Rejected Due to VC", "rejectedDueToVC"),
    ("Dimension Check", "dimensionCheck"),
];

/// 蒸压釜数值列（压力/班次/釜次批数原样保留）
const AUTOCLAVE_VALUE_COLUMNS: [(&str, &str); 10] = [
    ("Shift", "shift"),
    ("Batches Processed", "batchesProcessed"),
    ("Previous Door Open Pressure", "previousDoorOpenPressure"),
    ("Door Close Pressure", "doorClosePressure"),
    ("Vacuum Finish Pressure", "vacuumFinishPressure"),
    ("Slow Steam Start Pressure", "slowSteamStartPressure"),
    ("Fast Steam Start  Pressure", "fastSteamStartPressure"),
    ("Max Pressure", "maxPressure"),
    ("Release start  Pressure", "releaseStartPressure"),
    ("Door Open  Pressure", "doorOpenPressure"),
];

/// 蒸压釜时间/时长列 → "HH:MM"（"Vaccum" 为日报原样拼写）
const AUTOCLAVE_TIME_COLUMNS: [(&str, &str); 15] = [
    ("Previous Door Open Time", "previousDoorOpenTime"),
    ("Door Close Time", "doorCloseTime"),
    ("Vacuum Finish Time", "vacuumFinishTime"),
    ("Slow Steam Start Time", "slowSteamStartTime"),
    ("Fast Steam Start Time", "fastSteamStartTime"),
    ("Max Pressure Time", "maxPressureTime"),
    ("Release start Time", "releaseStartTime"),
    ("Door Open Time", "doorOpenTime"),
    ("Door Close Duration", "doorCloseDuration"),
    ("Vaccum Finish Duration", "vacuumFinishDuration"),
    ("Slow Steam Duration", "slowSteamDuration"),
    ("Fast Steam Duration", "fastSteamDuration"),
    ("Max Pressure Duration", "maxPressureDuration"),
    ("Release start Duration", "releaseStartDuration"),
    ("Door Open  Duration", "doorOpenDuration"),
];

/// 分拣列名中的缺陷后缀（日报原样拼写, 含 "Demage"）
fn segregation_column_suffix(defect_type: DefectType) -> &'static str {
    match defect_type {
        DefectType::RainCracksCuts => "RainCracks/Cuts",
        DefectType::CornerCracksCuts => "CornerCracks/Cuts",
        DefectType::CornerDamage => "CornerDemage",
        DefectType::ChippedBlocks => "ChippedBlocks",
    }
}

/// 单元格文本 → JSON 值
///
/// 空 → null; 整数/小数文本 → 数字; 其余保留原文
pub fn cell_value(text: &str) -> Value {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::Number(i.into());
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        if f.fract() == 0.0 && f.abs() < 1e15 {
            return Value::Number((f as i64).into());
        }
        if let Some(n) = Number::from_f64(f) {
            return Value::Number(n);
        }
    }
    Value::String(trimmed.to_string())
}

/// 时间单元格 → "HH:MM"
///
/// 接受 "YYYY-MM-DDTHH:MM:SS"（Excel 日期时间单元格）与 "HH:MM[:SS]"; 其余为 null
pub fn parse_excel_time(text: &str) -> Value {
    let trimmed = text.trim();
    let time_part = trimmed
        .split_once(|c: char| c == 'T' || c == ' ')
        .map(|(_, time)| time)
        .unwrap_or(trimmed);

    NaiveTime::parse_from_str(time_part, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(time_part, "%H:%M"))
        .map(|t| Value::String(t.format("%H:%M").to_string()))
        .unwrap_or(Value::Null)
}

/// 数值单元格: 空 → 0, 其余同 cell_value
fn value_or_zero(text: Option<&String>) -> Value {
    match text.map(|t| cell_value(t)) {
        None | Some(Value::Null) => json!(0),
        Some(v) => v,
    }
}

fn column_value(row: &RawRow, column: &str) -> Value {
    row.get(column).map(|t| cell_value(t)).unwrap_or(Value::Null)
}

fn time_value(row: &RawRow, column: &str) -> Value {
    row.get(column).map(|t| parse_excel_time(t)).unwrap_or(Value::Null)
}

fn shift_value(row: &RawRow) -> Value {
    match row.get(SHIFT_COLUMN).map(|s| s.trim()) {
        Some(shift) if !shift.is_empty() => json!(shift),
        _ => json!(DEFAULT_SHIFT),
    }
}

/// 行记录中的连接键 (Batch No., Mould No.)
pub fn join_key(row: &RawRow) -> Option<(String, String)> {
    let batch = row.get(BATCH_NO_COLUMN)?.trim();
    if batch.is_empty() {
        return None;
    }
    let mould = row.get(MOULD_NO_COLUMN).map(|m| m.trim()).unwrap_or("");
    Some((batch.to_string(), mould.to_string()))
}

/// 与配料行按 (Batch No., Mould No.) 连接上的各工序行
#[derive(Debug, Clone, Copy, Default)]
pub struct StepRows<'a> {
    pub ferry_cart: Option<&'a RawRow>,
    pub tilting_crane: Option<&'a RawRow>,
    pub cutting: Option<&'a RawRow>,
    pub segregation: Option<&'a RawRow>,
}

// ==========================================
// DocumentBuilder - 批次文档构建器
// ==========================================
#[derive(Debug, Clone)]
pub struct DocumentBuilder {
    process_date: NaiveDate,
    created_by: String,
    created_at: DateTime<Utc>,
}

impl DocumentBuilder {
    pub fn new(process_date: NaiveDate) -> Self {
        Self {
            process_date,
            created_by: DEFAULT_CREATED_BY.to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn with_created_by(mut self, created_by: &str) -> Self {
        self.created_by = created_by.to_string();
        self
    }

    fn metadata(&self) -> Value {
        let timestamp = self.created_at.to_rfc3339();
        json!({
            "createdAt": timestamp,
            "updatedAt": timestamp,
            "createdBy": self.created_by,
        })
    }

    fn date_text(&self) -> String {
        self.process_date.format(DATE_FORMAT).to_string()
    }

    /// 构建单个批次文档; 配料行缺少 Batch No. 时返回 None
    ///
    /// 配料工序总是写入; 其余工序仅在连接到对应行时写入
    pub fn build(&self, batching_row: &RawRow, steps: StepRows<'_>) -> Option<Value> {
        let (batch_id, mould_id) = join_key(batching_row)?;
        let mould_value = if mould_id.is_empty() {
            Value::Null
        } else {
            Value::String(mould_id)
        };

        let mut process_steps = Map::new();
        process_steps.insert("batching".to_string(), self.batching_step(batching_row));
        if let Some(row) = steps.ferry_cart {
            process_steps.insert("ferryCarts".to_string(), self.ferry_cart_step(row));
        }
        if let Some(row) = steps.tilting_crane {
            process_steps.insert("tiltingCrane".to_string(), self.tilting_crane_step(row));
        }
        if let Some(row) = steps.cutting {
            process_steps.insert("cutting".to_string(), self.cutting_step(row));
        }
        if let Some(row) = steps.segregation {
            process_steps.insert("segregation".to_string(), self.segregation_step(row));
        }

        Some(json!({
            "_id": document_id(&batch_id, Some(self.process_date)),
            "batchId": batch_id,
            "mouldId": mould_value,
            "status": "Completed",
            "date": self.date_text(),
            "processSteps": process_steps,
            "metadata": self.metadata(),
        }))
    }

    fn batching_step(&self, row: &RawRow) -> Value {
        let mut materials = Map::new();
        for (column, field) in MATERIAL_COLUMNS {
            materials.insert(field.to_string(), value_or_zero(row.get(column)));
        }

        json!({
            "shift": shift_value(row),
            "materials": materials,
            "process": {
                "mixingTime": value_or_zero(row.get("Mixing Time")),
                "dischargeTime": time_value(row, "Discharge Time"),
                "dischargeTemp": value_or_zero(row.get("Discharge Temp.")),
            }
        })
    }

    fn ferry_cart_step(&self, row: &RawRow) -> Value {
        json!({
            "shift": shift_value(row),
            "measurements": {
                "flow": value_or_zero(row.get("Flow")),
                "temp": value_or_zero(row.get("Temp.")),
                "height": value_or_zero(row.get("Height")),
                "time": time_value(row, "Time"),
            }
        })
    }

    fn tilting_crane_step(&self, row: &RawRow) -> Value {
        // 列名为日报原样（多个空格）
        let rising = row
            .get("Rising   Less / Over / Ok")
            .map(|v| v.trim())
            .unwrap_or("");

        json!({
            "shift": shift_value(row),
            "measurements": {
                "risingQuality": rising,
                "temp": value_or_zero(row.get("Temp.")),
                "time": time_value(row, "Time"),
                "hardness": value_or_zero(row.get("Hardness")),
            }
        })
    }

    fn cutting_step(&self, row: &RawRow) -> Value {
        let mut cutting = Map::new();
        cutting.insert("cuttingTime".to_string(), time_value(row, "Cutting Time"));
        for (column, field) in CUTTING_COLUMNS {
            cutting.insert(field.to_string(), column_value(row, column));
        }
        Value::Object(cutting)
    }

    fn segregation_step(&self, row: &RawRow) -> Value {
        let mut defects = Map::new();
        for position in Position::all() {
            let mut by_type = Map::new();
            for defect_type in DefectType::ALL {
                let column = format!("{}-{}", position, segregation_column_suffix(defect_type));
                by_type.insert(defect_type.key().to_string(), value_or_zero(row.get(&column)));
            }
            defects.insert(position.to_string(), Value::Object(by_type));
        }

        json!({
            "shift": shift_value(row),
            "totalBlocks": value_or_zero(row.get("Total Blocks")),
            "size": column_value(row, "Size"),
            "defects": defects,
            "totalDefects": value_or_zero(row.get("Total Defects")),
        })
    }

    /// 构建蒸压釜记录文档
    ///
    /// row_number 为该记录在工作表中的序号（1 起算）, 用于生成稳定主键
    pub fn build_autoclave(&self, row_number: usize, row: &RawRow) -> Value {
        let mut doc = Map::new();
        doc.insert(
            "_id".to_string(),
            json!(record_id(self.process_date, row_number)),
        );
        doc.insert("autoclaveId".to_string(), column_value(row, "Autoclave Id"));
        doc.insert("date".to_string(), json!(self.date_text()));
        for (column, field) in AUTOCLAVE_VALUE_COLUMNS {
            doc.insert(field.to_string(), column_value(row, column));
        }
        for (column, field) in AUTOCLAVE_TIME_COLUMNS {
            doc.insert(field.to_string(), time_value(row, column));
        }
        doc.insert("metadata".to_string(), self.metadata());
        Value::Object(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::batch::BatchRecord;
    use crate::domain::types::RejectionField;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn builder() -> DocumentBuilder {
        DocumentBuilder::new(NaiveDate::from_ymd_opt(2024, 5, 6).unwrap())
    }

    #[test]
    fn test_cell_value() {
        assert_eq!(cell_value(""), Value::Null);
        assert_eq!(cell_value(" 3 "), json!(3));
        assert_eq!(cell_value("2.0"), json!(2));
        assert_eq!(cell_value("2.5"), json!(2.5));
        assert_eq!(cell_value("Yes"), json!("Yes"));
    }

    #[test]
    fn test_parse_excel_time() {
        assert_eq!(parse_excel_time("1899-12-30T08:15:00"), json!("08:15"));
        assert_eq!(parse_excel_time("2024-05-06 14:05:59"), json!("14:05"));
        assert_eq!(parse_excel_time("07:30:10"), json!("07:30"));
        assert_eq!(parse_excel_time(""), Value::Null);
        assert_eq!(parse_excel_time("0.34375"), Value::Null);
        assert_eq!(parse_excel_time("late"), Value::Null);
    }

    #[test]
    fn test_build_full_document() {
        let batching = row(&[("Batch No.", "1520"), ("Mould No.", "7")]);
        let cutting = row(&[("Chipping Rejection", "Yes"), ("Tilting Crane Rejection", "0")]);
        let segregation = row(&[
            ("Total Blocks", "120"),
            ("1-CornerDemage", "2"),
            ("3-RainCracks/Cuts", "1"),
            ("Total Defects", "3"),
        ]);

        let steps = StepRows {
            cutting: Some(&cutting),
            segregation: Some(&segregation),
            ..StepRows::default()
        };
        let doc = builder().build(&batching, steps).unwrap();
        assert_eq!(doc["_id"], json!("batch_1520_20240506"));
        assert_eq!(doc["status"], json!("Completed"));
        assert_eq!(doc["metadata"]["createdBy"], json!(DEFAULT_CREATED_BY));
        assert_eq!(doc["processSteps"]["segregation"]["shift"], json!(DEFAULT_SHIFT));

        let record = BatchRecord::new(doc);
        assert_eq!(record.batch_id().as_deref(), Some("1520"));
        assert_eq!(record.date(), NaiveDate::from_ymd_opt(2024, 5, 6));
        assert!(record.rejection_present(RejectionField::ChippingRejection));
        assert!(!record.rejection_present(RejectionField::TiltingCraneRejection));
        assert!(!record.rejection_present(RejectionField::JoinedRejection));

        let seg = record.segregation().unwrap();
        assert_eq!(seg.total_blocks(), Some(120));
        assert_eq!(seg.recomputed_total_defects(), 3);
    }

    #[test]
    fn test_batching_materials_and_process() {
        let batching = row(&[
            ("Batch No.", "1520"),
            ("Mould No.", "7"),
            ("Shift", "Night"),
            ("Cement Kg", "410"),
            ("Aluminum  Powder GM", "520.5"),
            ("Lime Kg", ""),
            ("Mixing Time", "4"),
            ("Discharge Time", "1899-12-30T06:40:00"),
            ("Discharge Temp.", "42"),
        ]);

        let doc = builder().build(&batching, StepRows::default()).unwrap();
        let step = &doc["processSteps"]["batching"];
        assert_eq!(step["shift"], json!("Night"));
        assert_eq!(step["materials"]["cement"], json!(410));
        assert_eq!(step["materials"]["aluminumPowder"], json!(520.5));
        assert_eq!(step["materials"]["lime"], json!(0));
        assert_eq!(step["materials"]["solutionOil"], json!(0));
        assert_eq!(step["materials"].as_object().unwrap().len(), 9);
        assert_eq!(step["process"]["mixingTime"], json!(4));
        assert_eq!(step["process"]["dischargeTime"], json!("06:40"));
        assert_eq!(step["process"]["dischargeTemp"], json!(42));
    }

    #[test]
    fn test_ferry_cart_tilting_crane_and_cutting_time() {
        let batching = row(&[("Batch No.", "1520"), ("Mould No.", "7")]);
        let ferry = row(&[("Flow", "210"), ("Temp.", "45"), ("Time", "1899-12-30T07:05:00")]);
        let crane = row(&[("Rising   Less / Over / Ok", " Ok "), ("Hardness", "3.5"), ("Time", "")]);
        let cutting = row(&[("Cutting Time", "2024-05-06T09:30:00")]);

        let steps = StepRows {
            ferry_cart: Some(&ferry),
            tilting_crane: Some(&crane),
            cutting: Some(&cutting),
            segregation: None,
        };
        let doc = builder().build(&batching, steps).unwrap();
        let process = &doc["processSteps"];

        assert_eq!(process["ferryCarts"]["shift"], json!(DEFAULT_SHIFT));
        assert_eq!(process["ferryCarts"]["measurements"]["flow"], json!(210));
        assert_eq!(process["ferryCarts"]["measurements"]["height"], json!(0));
        assert_eq!(process["ferryCarts"]["measurements"]["time"], json!("07:05"));
        assert_eq!(process["tiltingCrane"]["measurements"]["risingQuality"], json!("Ok"));
        assert_eq!(process["tiltingCrane"]["measurements"]["hardness"], json!(3.5));
        assert_eq!(process["tiltingCrane"]["measurements"]["time"], Value::Null);
        assert_eq!(process["cutting"]["cuttingTime"], json!("09:30"));
        assert_eq!(process["cutting"]["chippingRejection"], Value::Null);
        assert!(process.get("segregation").is_none());
    }

    #[test]
    fn test_missing_steps_are_omitted() {
        let builder = builder();
        let doc = builder.build(&row(&[("Batch No.", "9")]), StepRows::default()).unwrap();

        assert_eq!(doc["mouldId"], Value::Null);
        let steps = doc["processSteps"].as_object().unwrap();
        assert_eq!(steps.len(), 1);
        assert!(steps.contains_key("batching"));
        assert!(builder.build(&row(&[("Batch No.", " ")]), StepRows::default()).is_none());
    }

    #[test]
    fn test_build_autoclave_record() {
        let autoclave = row(&[
            ("Autoclave Id", "AC-2"),
            ("Shift", "Day"),
            ("Batches Processed", "12"),
            ("Door Close Time", "1899-12-30T10:00:00"),
            ("Max Pressure", "12.5"),
            ("Vaccum Finish Duration", "1899-12-30T00:45:00"),
        ]);

        let doc = builder().build_autoclave(3, &autoclave);
        assert_eq!(doc["_id"], json!("autoclave_20240506_003"));
        assert_eq!(doc["autoclaveId"], json!("AC-2"));
        assert_eq!(doc["date"], json!("2024-05-06"));
        assert_eq!(doc["batchesProcessed"], json!(12));
        assert_eq!(doc["doorCloseTime"], json!("10:00"));
        assert_eq!(doc["maxPressure"], json!(12.5));
        assert_eq!(doc["vacuumFinishDuration"], json!("00:45"));
        assert_eq!(doc["doorOpenTime"], Value::Null);
        assert_eq!(doc["doorClosePressure"], Value::Null);
        assert_eq!(doc["metadata"]["createdBy"], json!(DEFAULT_CREATED_BY));
    }
}
