// ==========================================
// 批量导入集成测试
// ==========================================
// 测试目标: ImportApi + SQLite 仓储的完整导入流程
// ==========================================


use school_admin::api::{ApiError, ImportApi};
use school_admin::domain::{Capability, CapabilitySet, ImportProgress};
use school_admin::importer::{CsvParser, ImportError};
use school_admin::repository::SchoolRepository;
use std::sync::Arc;
use test_helpers::{all_capabilities, create_test_repo, raw, seed_classes, MockConfig};

fn student_rows() -> Vec<school_admin::domain::RawRecord> {
    vec![
        raw(&[("name", "Ali"), ("roll_number", "R1"), ("class", "Class 1")]),
        raw(&[("name", "Sara"), ("roll_number", "R2"), ("class", "class 2")]),
        raw(&[("name", ""), ("roll_number", "R3"), ("class", "Class 1")]),
        raw(&[("name", "Omar"), ("roll_number", "R4"), ("class", "Class 9")]),
        raw(&[("name", "Zain"), ("roll_number", "r1"), ("class", "Class 2")]),
        raw(&[("name", "Hina"), ("roll_number", "R6"), ("class", "Class 2"), ("opening_balance", "1,200")]),
        raw(&[("name", "Asad"), ("roll_number", "R7"), ("class", "Class 1"), ("opening_balance", "abc")]),
    ]
}

#[tokio::test]
async fn test_preview_partitions_and_row_numbers() {
    let (_temp, repo) = create_test_repo();
    seed_classes(repo.as_ref(), &[("c1", "Class 1"), ("c2", "Class 2")]).await;
    let api = ImportApi::new(repo.clone(), Arc::new(MockConfig::default()));

    let records = student_rows();
    let result = api
        .preview_students(&all_capabilities(), &records)
        .await
        .unwrap();

    assert_eq!(result.total(), records.len());
    let valid: Vec<usize> = result.valid_records.iter().map(|r| r.row_num).collect();
    let invalid: Vec<usize> = result.invalid_records.iter().map(|r| r.row_num).collect();
    assert_eq!(valid, vec![2, 3, 7]);
    assert_eq!(invalid, vec![4, 5, 6, 8]);
    assert!(result.invalid_records[1].reason.contains("'Class 9'"));
    assert!(result.invalid_records[3].reason.contains("abc"));
}

#[tokio::test]
async fn test_import_selected_rows_with_progress() {
    let (_temp, repo) = create_test_repo();
    seed_classes(repo.as_ref(), &[("c1", "Class 1"), ("c2", "Class 2")]).await;
    let api = ImportApi::new(repo.clone(), Arc::new(MockConfig::with_chunk_size(1)));

    let records = student_rows();
    let mut progress: Vec<ImportProgress> = Vec::new();
    // 行 4 无效: 被跳过
    let report = api
        .import_students(&all_capabilities(), &records, &[2, 4, 7], |p| progress.push(p))
        .await
        .unwrap();

    assert_eq!(report.written, 2);
    assert_eq!(report.skipped_rows, vec![4]);
    assert_eq!(report.invalid_rows, 4);

    // 块大小 1: 每条一次回调, processed 单调递增
    let processed: Vec<usize> = progress.iter().map(|p| p.processed).collect();
    assert_eq!(processed, vec![1, 2]);
    assert!(progress.iter().all(|p| p.total == 2 && p.errors.is_empty()));

    let students = repo.list_students().await.unwrap();
    let rolls: Vec<&str> = students.iter().map(|s| s.roll_number.as_str()).collect();
    assert_eq!(rolls, vec!["R1", "R6"]);
    assert_eq!(students[1].class_id, "c2");
    assert_eq!(students[1].opening_balance, 1200.0);
}

#[tokio::test]
async fn test_roll_number_unique_against_persisted() {
    let (_temp, repo) = create_test_repo();
    seed_classes(repo.as_ref(), &[("c1", "Class 1")]).await;
    let api = ImportApi::new(repo.clone(), Arc::new(MockConfig::default()));
    let caps = all_capabilities();

    let first = vec![raw(&[("name", "Ali"), ("roll_number", "R1"), ("class", "Class 1")])];
    api.import_students(&caps, &first, &[2], |_| {}).await.unwrap();

    let second = vec![
        raw(&[("name", "Ali Again"), ("roll_number", " r1 "), ("class", "Class 1")]),
        raw(&[("name", "New"), ("roll_number", "R2"), ("class", "Class 1")]),
    ];
    let result = api.preview_students(&caps, &second).await.unwrap();

    assert_eq!(result.invalid_records.len(), 1);
    assert_eq!(result.invalid_records[0].row_num, 2);
    assert!(result.invalid_records[0].reason.contains("已存在"));
}

#[tokio::test]
async fn test_missing_header_rejects_whole_import() {
    let (_temp, repo) = create_test_repo();
    let api = ImportApi::new(repo.clone(), Arc::new(MockConfig::default()));

    let records = vec![raw(&[("name", "Ali"), ("class", "Class 1")])];
    let err = api
        .import_students(&all_capabilities(), &records, &[2], |_| {})
        .await
        .unwrap_err();

    match err {
        ApiError::Import(ImportError::MissingHeaders(missing)) => {
            assert_eq!(missing, vec!["roll_number"]);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(repo.list_students().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_and_oversized_input_rejected() {
    let (_temp, repo) = create_test_repo();
    let config = MockConfig {
        import_max_rows: 2,
        ..MockConfig::default()
    };
    let api = ImportApi::new(repo.clone(), Arc::new(config));
    let caps = all_capabilities();

    let err = api.preview_classes(&caps, &[]).await.unwrap_err();
    assert!(matches!(err, ApiError::Import(ImportError::EmptyInput)));

    let records = vec![
        raw(&[("name", "Class 1")]),
        raw(&[("name", "Class 2")]),
        raw(&[("name", "Class 3")]),
    ];
    let err = api.preview_classes(&caps, &records).await.unwrap_err();
    assert!(matches!(
        err,
        ApiError::Import(ImportError::TooManyRows { rows: 3, max: 2 })
    ));
}

#[tokio::test]
async fn test_class_import_from_csv() {
    let (_temp, repo) = create_test_repo();
    let api = ImportApi::new(repo.clone(), Arc::new(MockConfig::with_chunk_size(2)));

    let csv = "name,section,sort_order\nClass 1,A,\nClass 1,B,\nClass 1,a,\nNursery,,0\nKG,,x\n";
    let records = CsvParser.parse_reader(csv.as_bytes()).unwrap();
    let caps = all_capabilities();
    let preview = api.preview_classes(&caps, &records).await.unwrap();

    // Class 1 / a 与 Class 1 / A 重复; sort_order "x" 不是数字
    let invalid: Vec<usize> = preview.invalid_records.iter().map(|r| r.row_num).collect();
    assert_eq!(invalid, vec![4, 6]);

    let rows: Vec<usize> = preview.valid_records.iter().map(|r| r.row_num).collect();
    let mut calls = 0;
    let report = api
        .import_classes(&caps, &records, &rows, |_| calls += 1)
        .await
        .unwrap();

    assert_eq!(report.written, 3);
    // ceil(3 / 2) 次进度回调
    assert_eq!(calls, 2);
    let classes = repo.list_classes().await.unwrap();
    assert_eq!(classes.len(), 3);
    assert_eq!(classes[2].sort_order, Some(0));
}

#[tokio::test]
async fn test_import_requires_capability() {
    let (_temp, repo) = create_test_repo();
    let api = ImportApi::new(repo.clone(), Arc::new(MockConfig::default()));
    let caps = CapabilitySet::of([Capability::ImportStudents]);

    let records = vec![raw(&[("name", "Class 1")])];
    let err = api.import_classes(&caps, &records, &[2], |_| {}).await.unwrap_err();

    assert!(matches!(
        err,
        ApiError::PermissionDenied(Capability::ImportClasses)
    ));
    assert!(repo.list_classes().await.unwrap().is_empty());
}

#[test]
fn test_templates_expose_required_headers() {
    let (_temp, repo) = create_test_repo();
    let api = ImportApi::new(repo, Arc::new(MockConfig::default()));

    let template = api.student_template();
    for header in ["name", "roll_number", "class"] {
        assert!(template.headers.iter().any(|h| h == header));
    }
    assert!(!template.sample_rows.is_empty());
    assert_eq!(api.class_template().headers[0], "name");
}

#[tokio::test]
async fn test_short_first_row_is_invalid_record_not_missing_header() {
    let (_temp, repo) = create_test_repo();
    seed_classes(repo.as_ref(), &[("c1", "Class 1")]).await;
    let api = ImportApi::new(repo.clone(), Arc::new(MockConfig::default()));

    // 表头完整, 第一条数据行缺少 class / phone 单元格
    let csv = "name,roll_number,class,phone\nAli,R1\nSara,R2,Class 1,123\n";
    let records = CsvParser.parse_reader(csv.as_bytes()).unwrap();
    let result = api
        .preview_students(&all_capabilities(), &records)
        .await
        .unwrap();

    assert_eq!(result.invalid_records.len(), 1);
    assert_eq!(result.invalid_records[0].row_num, 2);
    assert_eq!(result.invalid_records[0].reason, "缺少必填字段: class");
    assert_eq!(result.valid_records.len(), 1);
    assert_eq!(result.valid_records[0].row_num, 3);
    assert_eq!(result.valid_records[0].reference("class"), Some("c1"));
}
