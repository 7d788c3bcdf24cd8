// ==========================================
// 日报导入集成测试
// ==========================================
// 职责: 验证 CSV 日报 → 批次文档 → 仓储 → 报表 的完整链路
// ==========================================


use aac_quality_analytics::engine::ReportAssembler;
use aac_quality_analytics::importer::{ImportError, PlantReport, PlantReportImporter, RawRow};
use aac_quality_analytics::repository::BatchQuery;
use chrono::NaiveDate;
use serde_json::json;
use std::io::Write;
use test_helpers::{create_test_repo, create_test_repos};

const HEADER: &str = "Batch No.,Mould No.,Chipping Rejection,Tilting Crane Rejection,Wire Broken HC,\
Total Blocks,1-CornerDemage,2-RainCracks/Cuts,Total Defects";

fn write_csv(lines: &[&str]) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file
}

fn raw_row(pairs: &[(&str, &str)]) -> RawRow {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

fn process_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 4, 2).unwrap()
}

#[test]
fn test_import_csv_report() {
    println!("\n=== 测试：CSV 日报导入 ===");
    let (_temp, repo) = create_test_repo();
    let file = write_csv(&[
        HEADER,
        "1520,7,Yes,0,,120,2,1,3",
        "1521,7,No,,1,100,,,",
        ",,,,,,,,",
        ",8,Yes,,,,,,",
    ]);

    let importer = PlantReportImporter::new(repo.clone()).with_created_by("test");
    let summary = importer.import_file(file.path(), process_date()).unwrap();

    assert_eq!(summary.rows_read, 3);
    assert_eq!(summary.documents_written, 2);
    assert_eq!(summary.skipped_rows, 1);
    assert!(!summary.import_id.is_empty());

    let batches = repo.find(&BatchQuery::new()).unwrap();
    assert_eq!(batches.len(), 2);
    let first = serde_json::to_value(&batches[0]).unwrap();
    assert_eq!(first["_id"], "batch_1520_20240402");
    assert_eq!(first["metadata"]["createdBy"], "test");
    assert!(first["processSteps"]["batching"]["materials"].is_object());
    assert_eq!(batches[0].date(), Some(process_date()));

    let stats = ReportAssembler::new().batch_quality(&batches).into_option().unwrap();
    assert_eq!(stats.total_batches, 2);
    assert_eq!(stats.rejected_batches, 1);
    assert_eq!(stats.most_common_rejection, "Chipping");

    let seg = ReportAssembler::new()
        .segregation_analysis(&batches)
        .into_option()
        .unwrap();
    assert_eq!(seg.summary.total_defects, 3);
    assert_eq!(seg.summary.batches_with_defects, 1);
    assert_eq!(seg.summary.defect_rate, 50.0);
}

#[test]
fn test_reimport_replaces_documents() {
    println!("\n=== 测试：重复导入覆盖 ===");
    let (_temp, repo) = create_test_repo();
    let file = write_csv(&[HEADER, "1520,7,Yes,,,120,,,"]);
    let importer = PlantReportImporter::new(repo.clone());

    importer.import_file(file.path(), process_date()).unwrap();
    importer.import_file(file.path(), process_date()).unwrap();
    assert_eq!(repo.count().unwrap(), 1);

    importer
        .import_file(file.path(), NaiveDate::from_ymd_opt(2024, 4, 3).unwrap())
        .unwrap();
    assert_eq!(repo.count().unwrap(), 2);
}

#[test]
fn test_missing_batch_column_is_rejected() {
    println!("\n=== 测试：缺少关键列 ===");
    let (_temp, repo) = create_test_repo();
    let file = write_csv(&["Mould No.,Chipping Rejection", "7,Yes"]);

    let result = PlantReportImporter::new(repo.clone()).import_file(file.path(), process_date());
    assert!(matches!(result, Err(ImportError::MissingColumn { .. })));
    assert_eq!(repo.count().unwrap(), 0);
}

#[test]
fn test_missing_file() {
    println!("\n=== 测试：文件不存在 ===");
    let (_temp, repo) = create_test_repo();
    let result = PlantReportImporter::new(repo).import_file("no_such_report.xlsx", process_date());
    assert!(matches!(result, Err(ImportError::FileNotFound(_))));
}

#[test]
fn test_csv_batching_columns() {
    println!("\n=== 测试：CSV 配料列与切割时间 ===");
    let (_temp, repo) = create_test_repo();
    let file = write_csv(&[
        "Batch No.,Mould No.,Shift,Cement Kg,Lime Kg,Mixing Time,Discharge Time,Cutting Time",
        "1520,7,Night,410,,4,06:40,09:30:00",
    ]);

    PlantReportImporter::new(repo.clone())
        .import_file(file.path(), process_date())
        .unwrap();

    let doc = serde_json::to_value(&repo.find(&BatchQuery::new()).unwrap()[0]).unwrap();
    let steps = &doc["processSteps"];
    assert_eq!(steps["batching"]["shift"], json!("Night"));
    assert_eq!(steps["batching"]["materials"]["cement"], json!(410));
    assert_eq!(steps["batching"]["materials"]["lime"], json!(0));
    assert_eq!(steps["batching"]["process"]["dischargeTime"], json!("06:40"));
    assert_eq!(steps["cutting"]["cuttingTime"], json!("09:30"));
    assert!(steps.get("ferryCarts").is_none());
    assert!(steps.get("tiltingCrane").is_none());
}

#[test]
fn test_import_all_sheets_with_autoclave() {
    println!("\n=== 测试：全工作表导入（含蒸压釜） ===");
    let (_temp, repo, autoclave_repo) = create_test_repos();
    let report = PlantReport {
        batching: vec![
            raw_row(&[("Batch No.", "1520"), ("Mould No.", "7"), ("Cement Kg", "400")]),
            raw_row(&[("Batch No.", "1521"), ("Mould No.", "8")]),
        ],
        ferry_carts: vec![raw_row(&[
            ("Batch No.", "1520"),
            ("Mould No.", "7"),
            ("Flow", "210"),
            ("Time", "1899-12-30T07:05:00"),
        ])],
        tilting_crane: vec![raw_row(&[
            ("Batch No.", "1521"),
            ("Mould No.", "8"),
            ("Hardness", "3"),
        ])],
        // 模具号不匹配, 不连接
        cutting: vec![raw_row(&[("Batch No.", "1520"), ("Mould No.", "9"), ("Chipping Rejection", "Yes")])],
        segregation: Vec::new(),
        autoclave: vec![
            raw_row(&[("Autoclave Id", "AC-1"), ("Max Pressure", "12"), ("Door Close Time", "1899-12-30T10:00:00")]),
            raw_row(&[("Autoclave Id", "AC-2")]),
        ],
    };

    let importer = PlantReportImporter::new(repo.clone()).with_autoclave_repo(autoclave_repo.clone());
    let summary = importer.import_report(&report, process_date()).unwrap();
    assert_eq!(summary.documents_written, 2);
    assert_eq!(summary.autoclave_records_written, 2);

    let batches = repo.find(&BatchQuery::new()).unwrap();
    let first = serde_json::to_value(&batches[0]).unwrap();
    let second = serde_json::to_value(&batches[1]).unwrap();
    assert_eq!(first["processSteps"]["ferryCarts"]["measurements"]["flow"], json!(210));
    assert_eq!(first["processSteps"]["ferryCarts"]["measurements"]["time"], json!("07:05"));
    assert!(first["processSteps"].get("tiltingCrane").is_none());
    assert!(first["processSteps"].get("cutting").is_none());
    assert_eq!(second["processSteps"]["tiltingCrane"]["measurements"]["hardness"], json!(3));

    let records = autoclave_repo.find(Some(process_date()), Some(process_date())).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["_id"], json!("autoclave_20240402_001"));
    assert_eq!(records[0]["maxPressure"], json!(12));
    assert_eq!(records[0]["doorCloseTime"], json!("10:00"));
    assert_eq!(records[1]["autoclaveId"], json!("AC-2"));

    // 重复导入覆盖
    importer.import_report(&report, process_date()).unwrap();
    assert_eq!(autoclave_repo.count().unwrap(), 2);
}

#[test]
fn test_autoclave_rows_skipped_without_repo() {
    println!("\n=== 测试：未配置蒸压釜仓储 ===");
    let (_temp, repo) = create_test_repo();
    let report = PlantReport {
        batching: vec![raw_row(&[("Batch No.", "1520"), ("Mould No.", "7")])],
        autoclave: vec![raw_row(&[("Autoclave Id", "AC-1")])],
        ..PlantReport::default()
    };

    let summary = PlantReportImporter::new(repo).import_report(&report, process_date()).unwrap();
    assert_eq!(summary.documents_written, 1);
    assert_eq!(summary.autoclave_records_written, 0);
}
