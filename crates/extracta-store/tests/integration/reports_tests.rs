use std::fs;

use chrono::NaiveDateTime;
use extracta_core::models::{FailedDraw, NumberFrequency, ScreenshotRecord};
use extracta_store::reports::TIMESTAMP_FORMAT;
use extracta_store::{
    latest_failure_report, read_failure_report, write_aggregate_export, write_failure_report,
    write_frequencies, write_screenshot_manifest, write_year_file,
};

use crate::integration::common::{draw, read_csv, setup_store};

fn at(stamp: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).unwrap()
}

#[test]
fn year_file_is_sorted_and_rewritten() {
    let (_, config, _dir) = setup_store();
    let draws = vec![
        draw("30.12. (Samstag)", 2023, &[6, 12, 19, 33, 40, 48], Some(3)),
        draw("27.12. (Mittwoch)", 2023, &[4, 8, 15, 16, 23, 42], Some(9)),
    ];

    let path = write_year_file(&config.history_dir(), 2023, &draws).unwrap();
    assert!(path.ends_with("history/draws_2023.json"));

    let loaded: Vec<extracta_core::Draw> =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(loaded[0].date, "27.12. (Mittwoch)");
    assert_eq!(loaded[1].date, "30.12. (Samstag)");

    write_year_file(&config.history_dir(), 2023, &draws[..1]).unwrap();
    let loaded: Vec<extracta_core::Draw> =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(loaded.len(), 1);
}

#[test]
fn aggregate_export_has_one_column_per_number() {
    let (_, config, _dir) = setup_store();
    let draws = vec![
        draw("04.05. (Samstag)", 2024, &[5, 9, 13, 27, 38, 44], Some(2)),
        draw("27.12. (Mittwoch)", 2023, &[4, 8, 15], None),
    ];

    let path =
        write_aggregate_export(config.data_dir(), &draws, at("2024-05-05_08-00-00")).unwrap();
    assert!(path.ends_with("all_draws_2024-05-05_08-00-00.csv"));

    let rows = read_csv(&path);
    assert_eq!(
        rows[0],
        vec![
            "Date", "Year", "Number1", "Number2", "Number3", "Number4", "Number5", "Number6",
            "BonusNumber"
        ]
    );
    assert_eq!(
        rows[1],
        vec!["27.12. (Mittwoch)", "2023", "4", "8", "15", "", "", "", ""]
    );
    assert_eq!(
        rows[2],
        vec!["04.05. (Samstag)", "2024", "5", "9", "13", "27", "38", "44", "2"]
    );
}

#[test]
fn failure_report_only_written_when_needed() {
    let (_, config, _dir) = setup_store();
    let dir = config.data_dir();

    assert!(
        write_failure_report(dir, &[], at("2024-05-05_08-00-00"))
            .unwrap()
            .is_none()
    );
    assert!(latest_failure_report(dir).unwrap().is_none());

    let failures = vec![
        FailedDraw {
            year: 2024,
            date: "04.05. (Samstag)".into(),
            reason: "Extraction incomplete: only 2 numbers".into(),
            option_value: Some("2024-05-04".into()),
        },
        FailedDraw::whole_year(1955, "Control not found: no selection control offers year 1955"),
    ];
    let path = write_failure_report(dir, &failures, at("2024-05-05_08-00-00"))
        .unwrap()
        .unwrap();

    assert_eq!(read_failure_report(&path).unwrap(), failures);
    let raw = fs::read_to_string(&path).unwrap();
    assert_eq!(raw.matches("option_value").count(), 1);
}

#[test]
fn latest_failure_report_picks_newest_valid_name() {
    let (_, config, _dir) = setup_store();
    let dir = config.data_dir();
    let one = vec![FailedDraw::whole_year(2001, "timeout")];

    write_failure_report(dir, &one, at("2023-12-31_23-59-59")).unwrap();
    let newest = write_failure_report(dir, &one, at("2024-01-02_00-00-00"))
        .unwrap()
        .unwrap();
    write_failure_report(dir, &one, at("2024-01-01_12-00-00")).unwrap();
    fs::write(dir.join("failed_draws_latest.json"), "[]").unwrap();
    fs::write(dir.join("failed_draws_2099-13-01_00-00-00.json"), "[]").unwrap();
    fs::write(dir.join("notes.json"), "[]").unwrap();

    assert_eq!(latest_failure_report(dir).unwrap(), Some(newest));
}

#[test]
fn latest_failure_report_in_missing_dir_is_none() {
    let (_, config, _dir) = setup_store();
    assert!(
        latest_failure_report(&config.data_dir().join("nowhere"))
            .unwrap()
            .is_none()
    );
}

#[test]
fn screenshot_manifest_lists_records() {
    let (_, config, _dir) = setup_store();
    let records = vec![ScreenshotRecord {
        year: 2023,
        date: "27.12. (Mittwoch)".into(),
        option_value: "2023-12-27".into(),
        screenshot: "data/screenshots/screenshot_2023_2712Mittwoch.png".into(),
    }];

    let path =
        write_screenshot_manifest(config.data_dir(), &records, at("2024-05-05_08-00-00")).unwrap();

    assert!(path.ends_with("screenshots_2024-05-05_08-00-00.json"));
    let loaded: Vec<ScreenshotRecord> =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(loaded, records);
}

#[test]
fn frequency_exports() {
    let (_, config, _dir) = setup_store();
    let freqs = vec![
        NumberFrequency { number: 1, count: 598 },
        NumberFrequency { number: 6, count: 640 },
    ];

    let (json, csv) = write_frequencies(config.data_dir(), &freqs).unwrap();

    let loaded: Vec<NumberFrequency> =
        serde_json::from_str(&fs::read_to_string(json).unwrap()).unwrap();
    assert_eq!(loaded, freqs);
    assert_eq!(
        read_csv(&csv),
        vec![
            vec!["Number", "Count"],
            vec!["1", "598"],
            vec!["6", "640"],
        ]
    );
}
