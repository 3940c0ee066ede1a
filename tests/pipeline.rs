mod common;

use attendance_audit::{
    comparison::NormalizationRule,
    data::Value,
    duplicates::DuplicateKeyOptions,
    error::{ErrorCategory, ReportError, SchemaError},
    ingest::{self, Upload},
    report::{ReportOptions, ReportSet, run_pipeline},
    schema::ReportSchema,
};
use encoding_rs::EUC_KR;

use common::{encode_cp949, export_row, export_text};

fn run(rows: &[String], options: &ReportOptions) -> Result<ReportSet, ReportError> {
    let upload = Upload::new("attendance.csv", encode_cp949(&export_text(rows)));
    let raw = ingest::read_upload(Some(&upload), EUC_KR, b',')?;
    run_pipeline(&raw, &ReportSchema::default(), options)
}

fn sequences(reports: &ReportSet) -> Vec<i64> {
    let seq = reports.duplicates.roles.sequence;
    reports
        .duplicates
        .rows
        .iter()
        .map(|row| match row[seq] {
            Some(Value::Integer(value)) => value,
            _ => panic!("sequence must be an integer"),
        })
        .collect()
}

#[test]
fn three_way_duplicate_group_is_reported_in_full() {
    let rows = vec![
        export_row("1", "김철수", "안전교육", "2024-03-01", "2"),
        export_row("2", "김철수", "안전교육", "2024-03-08", "2"),
        export_row("3", "이영희", "윤리교육", "2024-03-01", "1"),
        export_row("4", "김철수", "안전교육", "2024-03-15", "2"),
    ];
    let reports = run(&rows, &ReportOptions::default()).expect("reports");
    assert_eq!(sequences(&reports), vec![1, 2, 4]);
    assert_eq!(
        reports.duplicates.columns,
        vec![
            "연번",
            "소속",
            "직급",
            "이름",
            "구분1(외부/내부)",
            "구분2(법정의무/직무역량)",
            "과정구분3",
            "과정명",
            "교육기관",
            "교육일시",
            "교육시간",
            "수료여부",
        ]
    );
}

#[test]
fn including_session_date_narrows_duplicates() {
    let rows = vec![
        export_row("1", "김철수", "안전교육", "2024-03-01", "2"),
        export_row("2", "김철수", "안전교육", "2024-03-01", "2"),
        export_row("3", "김철수", "안전교육", "2024-03-15", "2"),
    ];
    let options = ReportOptions {
        duplicate_key: DuplicateKeyOptions {
            include_session_datetime: true,
        },
        ..ReportOptions::default()
    };
    let reports = run(&rows, &options).expect("reports");
    assert_eq!(sequences(&reports), vec![1, 2]);
}

#[test]
fn count_mismatch_reports_repeated_attendee_only() {
    let rows = vec![
        export_row("1", "김철수", "안전교육", "3/1", "2"),
        export_row("2", "이영희", "안전교육", "3/1", "2"),
        export_row("3", "김철수", "안전교육", "3/8", "2"),
        export_row("4", "박민수", "윤리교육", "3/1", "1"),
        export_row("5", "최지우", "윤리교육", "3/1", "1"),
        export_row("6", "정하늘", "윤리교육", "3/1", "1"),
    ];
    let reports = run(&rows, &ReportOptions::default()).expect("reports");
    assert_eq!(reports.count_mismatches.len(), 1);
    let mismatch = &reports.count_mismatches[0];
    assert_eq!(mismatch.course_name, "안전교육");
    assert_eq!(mismatch.unique_attendee_count, 2);
    assert_eq!(mismatch.total_record_count, 3);
}

#[test]
fn spacing_variants_are_reported_with_breakdown() {
    let mut rows = Vec::new();
    for seq in 1..=5 {
        rows.push(export_row(&seq.to_string(), &format!("사원{seq}"), "Course A", "3/1", "1"));
    }
    for seq in 6..=7 {
        rows.push(export_row(&seq.to_string(), &format!("사원{seq}"), "CourseA", "3/1", "1"));
    }
    rows.push(export_row("8", "사원8", "단일과정", "3/1", "1"));
    let reports = run(&rows, &ReportOptions::default()).expect("reports");

    let whitespace = &reports.comparisons[0];
    assert_eq!(whitespace.rule, NormalizationRule::WHITESPACE);
    assert_eq!(whitespace.rows.len(), 1);
    assert_eq!(whitespace.rows[0].normalized_course_name, "CourseA");
    assert_eq!(whitespace.rows[0].literal_count_breakdown, "5, 2");
    assert_eq!(whitespace.rows[0].total_count, 7);

    let tables = reports.tables();
    assert_eq!(tables[2].rows, vec![vec!["CourseA", "5, 2", "7"]]);
}

#[test]
fn session_suffix_variants_merge_but_other_brackets_stay() {
    let rows = vec![
        export_row("1", "가", "Safety(2차시)", "3/1", "1"),
        export_row("2", "나", "Safety(3차시)", "3/1", "1"),
        export_row("3", "다", "Safety(ABC)", "3/1", "1"),
    ];
    let reports = run(&rows, &ReportOptions::default()).expect("reports");
    assert!(reports.comparisons[0].rows.is_empty());
    let suffix = &reports.comparisons[1];
    assert_eq!(suffix.rule, NormalizationRule::WHITESPACE_AND_SUFFIX);
    assert_eq!(suffix.rows.len(), 1);
    assert_eq!(suffix.rows[0].normalized_course_name, "Safety");
    assert_eq!(suffix.rows[0].literal_names, vec!["Safety(2차시)", "Safety(3차시)"]);
    assert_eq!(suffix.rows[0].total_count, 2);
}

#[test]
fn rows_without_sequence_number_affect_nothing() {
    let rows = vec![
        export_row("1", "김철수", "안전교육", "3/1", "2"),
        export_row("", "김철수", "안전교육", "3/1", "2"),
        export_row("", "이영희", "안전 교육", "3/1", "x"),
        export_row("2", "", "안전교육", "3/1", "2"),
    ];
    let reports = run(&rows, &ReportOptions::default()).expect("reports");
    assert!(reports.duplicates.is_empty());
    assert!(reports.count_mismatches.is_empty());
    assert!(reports.comparisons.iter().all(|c| c.rows.is_empty()));
}

#[test]
fn non_integer_hours_abort_the_pipeline() {
    let rows = vec![
        export_row("1", "김철수", "안전교육", "3/1", "2"),
        export_row("2", "이영희", "안전교육", "3/1", "abc"),
    ];
    let err = run(&rows, &ReportOptions::default()).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Content);
    assert!(matches!(
        err,
        ReportError::Schema(SchemaError::NotInteger { ref column, ref value, .. })
            if column == "교육시간" && value == "abc"
    ));
}

#[test]
fn decimal_sequence_number_is_rejected() {
    let rows = vec![export_row("1.5", "김철수", "안전교육", "3/1", "2")];
    let err = run(&rows, &ReportOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        ReportError::Schema(SchemaError::NotInteger { ref column, .. }) if column == "연번"
    ));
}

#[test]
fn export_without_usable_rows_is_empty_input() {
    let rows = vec![export_row("", "김철수", "안전교육", "3/1", "2")];
    let err = run(&rows, &ReportOptions::default()).unwrap_err();
    assert!(matches!(err, ReportError::EmptyInput));
    assert_eq!(err.category(), ErrorCategory::Content);
}

#[test]
fn repeated_header_is_read_with_suffix_and_processed() {
    let rows = vec![
        export_row("1", "김철수", "안전교육", "3/1", "2"),
        export_row("2", "김철수", "안전교육", "3/8", "2"),
    ];
    let text = export_text(&rows).replacen(",직급,", ",소속,", 1);
    let upload = Upload::new("attendance.csv", encode_cp949(&text));
    let raw = ingest::read_upload(Some(&upload), EUC_KR, b',').expect("read");
    assert_eq!(raw.headers[1], "소속");
    assert_eq!(raw.headers[2], "소속.1");

    let reports = run_pipeline(&raw, &ReportSchema::default(), &ReportOptions::default())
        .expect("reports");
    assert_eq!(reports.duplicates.len(), 2);
    let second = reports.duplicates.column_index("소속.1").expect("suffixed column");
    assert_eq!(reports.duplicates.rows[0][second], Some(Value::Text("대리".into())));
}

#[test]
fn wrong_encoding_is_a_parse_failure() {
    let upload = Upload::new("attendance.csv", vec![b'a', 0xff, b'\n']);
    let err = ingest::read_upload(Some(&upload), EUC_KR, b',').unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Parse);
}

#[test]
fn identical_input_yields_identical_reports() {
    let rows = vec![
        export_row("1", "김철수", "안전 교육", "3/1", "2"),
        export_row("2", "김철수", "안전교육", "3/1", "2"),
        export_row("3", "김철수", "안전교육", "3/1", "2"),
        export_row("4", "이영희", "윤리교육(1차시)", "3/1", "1"),
        export_row("5", "이영희", "윤리교육(2차시)", "3/1", "1"),
    ];
    let first = run(&rows, &ReportOptions::default()).expect("first");
    let second = run(&rows, &ReportOptions::default()).expect("second");
    assert_eq!(first, second);
    assert_eq!(first.tables(), second.tables());
}
