// ==========================================
// 加气混凝土质量分析 - 文件解析器
// ==========================================
// 支持: Excel 日报 (.xlsx/.xls, 多工作表) / CSV (.csv, 单表扁平)
// 输出: 行记录 HashMap<列名, 文本值>, 完全空白的行被跳过
// 日期时间单元格输出为 "YYYY-MM-DDTHH:MM:SS"
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook_auto, Data, Reader};
use chrono::{Duration, NaiveDate};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

/// 单行原始记录
pub type RawRow = HashMap<String, String>;

/// 配料工作表（名称末尾带空格）
pub const BATCHING_SHEET: &str = "1. Batching ";
/// 摆渡车工作表（名称末尾带空格）
pub const FERRY_CART_SHEET: &str = "2.Ferry Cart ";
/// 翻转吊工作表
pub const TILTING_CRANE_SHEET: &str = "3.Tilting Crane";
/// 切割工作表
pub const CUTTING_SHEET: &str = "4.Cutting Report";
/// 蒸压釜工作表
pub const AUTOCLAVE_SHEET: &str = "5.Autoclave";
/// 分拣工作表
pub const SEGREGATION_SHEET: &str = "6.Segregation Report";

/// 日报表头所在行（0 起算; 前两行为标题）
pub const REPORT_HEADER_ROW: usize = 2;

// ==========================================
// FileParser - 文件解析接口
// ==========================================
pub trait FileParser: Send + Sync {
    /// 解析文件为原始行记录
    fn parse_to_raw_records(&self, file_path: &Path) -> ImportResult<Vec<RawRow>>;
}

fn ensure_exists(path: &Path) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Excel 序列值上限（9999-12-31 之后）
const MAX_EXCEL_SERIAL: f64 = 2_958_466.0;

/// Excel 序列值 → "YYYY-MM-DDTHH:MM:SS"（1899-12-30 起算, 精确到秒）
pub fn excel_serial_text(serial: f64) -> Option<String> {
    if !serial.is_finite() || !(0.0..MAX_EXCEL_SERIAL).contains(&serial) {
        return None;
    }
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let seconds = (serial * 86_400.0).round() as i64;
    let datetime = base.checked_add_signed(Duration::seconds(seconds))?;
    Some(datetime.format("%Y-%m-%dT%H:%M:%S").to_string())
}

/// 单元格 → 文本
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::DateTime(dt) => excel_serial_text(dt.as_f64()).unwrap_or_else(|| cell.to_string()),
        Data::DateTimeIso(text) | Data::DurationIso(text) => text.clone(),
        other => other.to_string(),
    }
}

/// 表头 + 数据行 → 行记录
fn rows_to_records<I, R>(headers: &[String], rows: I) -> Vec<RawRow>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = String>,
{
    let mut records = Vec::new();
    for row in rows {
        let mut row_map = HashMap::new();
        for (col_idx, value) in row.into_iter().enumerate() {
            if let Some(header) = headers.get(col_idx) {
                if !header.is_empty() {
                    row_map.insert(header.clone(), value.trim().to_string());
                }
            }
        }

        if row_map.values().all(|v| v.is_empty()) {
            continue;
        }
        records.push(row_map);
    }
    records
}

// ==========================================
// CSV Parser
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_to_raw_records(&self, file_path: &Path) -> ImportResult<Vec<RawRow>> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if !ext.is_empty() && ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            rows.push(record.iter().map(str::to_string).collect::<Vec<String>>());
        }

        Ok(rows_to_records(&headers, rows))
    }
}

// ==========================================
// Excel Parser
// ==========================================
pub struct ExcelParser {
    sheet_name: String,
    header_row: usize,
}

impl ExcelParser {
    /// 读取指定工作表, 表头位于 header_row（绝对行号, 0 起算）
    pub fn for_sheet(sheet_name: &str, header_row: usize) -> Self {
        Self {
            sheet_name: sheet_name.to_string(),
            header_row,
        }
    }
}

impl FileParser for ExcelParser {
    fn parse_to_raw_records(&self, file_path: &Path) -> ImportResult<Vec<RawRow>> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if ext != "xlsx" && ext != "xls" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook = open_workbook_auto(file_path)?;

        if !workbook.sheet_names().iter().any(|s| s == &self.sheet_name) {
            return Err(ImportError::SheetNotFound(self.sheet_name.clone()));
        }

        let range = workbook.worksheet_range(&self.sheet_name)?;

        // Range 从首个非空单元格开始, 需换算成相对行号
        let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);
        let mut rows = range.rows().skip(self.header_row.saturating_sub(first_row));

        let Some(header_row) = rows.next() else {
            return Ok(Vec::new());
        };
        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| cell_text(cell).trim().to_string())
            .collect();

        let data_rows = rows.map(|row| row.iter().map(cell_text).collect::<Vec<String>>());
        Ok(rows_to_records(&headers, data_rows))
    }
}

// ==========================================
// PlantReport - 日报工作表集合
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct PlantReport {
    pub batching: Vec<RawRow>,
    pub ferry_carts: Vec<RawRow>,
    pub tilting_crane: Vec<RawRow>,
    pub cutting: Vec<RawRow>,
    pub segregation: Vec<RawRow>,
    /// 蒸压釜记录（按釜次, 不与批次连接）
    pub autoclave: Vec<RawRow>,
}

/// 读取可缺省的工作表; 工作表不存在时返回空
fn read_optional_sheet(path: &Path, sheet_name: &str) -> ImportResult<Vec<RawRow>> {
    match ExcelParser::for_sheet(sheet_name, REPORT_HEADER_ROW).parse_to_raw_records(path) {
        Err(ImportError::SheetNotFound(name)) => {
            tracing::warn!(sheet = %name, "日报缺少工作表, 对应数据跳过");
            Ok(Vec::new())
        }
        other => other,
    }
}

impl PlantReport {
    /// 根据扩展名读取日报
    ///
    /// - Excel: 配料/切割/分拣为必需工作表; 摆渡车/翻转吊/蒸压釜缺失时为空
    /// - CSV: 单表承载配料/切割/分拣列, 同一行兼作三张表的行; 无摆渡车/翻转吊/蒸压釜数据
    pub fn read<P: AsRef<Path>>(file_path: P) -> ImportResult<Self> {
        let path = file_path.as_ref();
        ensure_exists(path)?;

        match extension_of(path).as_str() {
            "csv" => {
                let rows = CsvParser.parse_to_raw_records(path)?;
                Ok(Self {
                    batching: rows.clone(),
                    cutting: rows.clone(),
                    segregation: rows,
                    ..Self::default()
                })
            }
            "xlsx" | "xls" => Ok(Self {
                batching: ExcelParser::for_sheet(BATCHING_SHEET, REPORT_HEADER_ROW)
                    .parse_to_raw_records(path)?,
                ferry_carts: read_optional_sheet(path, FERRY_CART_SHEET)?,
                tilting_crane: read_optional_sheet(path, TILTING_CRANE_SHEET)?,
                cutting: ExcelParser::for_sheet(CUTTING_SHEET, REPORT_HEADER_ROW)
                    .parse_to_raw_records(path)?,
                segregation: ExcelParser::for_sheet(SEGREGATION_SHEET, REPORT_HEADER_ROW)
                    .parse_to_raw_records(path)?,
                autoclave: read_optional_sheet(path, AUTOCLAVE_SHEET)?,
            }),
            other => Err(ImportError::UnsupportedFormat(other.to_string())),
        }
    }
}
