use std::collections::BTreeMap;
use std::fs;

use extracta_core::traits::DrawStore;
use extracta_store::FileDrawStore;

use crate::integration::common::{draw, read_csv, setup_store};

#[test]
fn missing_store_loads_empty() {
    let (store, _config, _dir) = setup_store();
    assert!(store.load_existing().unwrap().is_empty());
    assert!(store.load_sheet().unwrap().is_empty());
}

#[test]
fn first_draw_creates_both_stores() {
    let (store, config, _dir) = setup_store();
    let mut d = draw("2024-05-04", 2024, &[5, 9, 13, 27, 38, 44], Some(2));
    d.payout_tiers = BTreeMap::from([("Klasse 1".to_string(), "8.123.456,70 €".to_string())]);

    let outcome = store.persist(&d).unwrap();

    assert!(outcome.json_written);
    assert!(outcome.sheet_written);
    assert!(config.json_path().exists());

    let loaded = store.load_existing().unwrap();
    assert_eq!(loaded, vec![d]);

    let rows = read_csv(&config.sheet_path());
    assert_eq!(rows[0], vec!["Date", "Numbers", "BonusNumber", "PayoutTiers"]);
    assert_eq!(rows[1][0], "2024-05-04");
    assert_eq!(rows[1][1], "5, 9, 13, 27, 38, 44");
    assert_eq!(rows[1][2], "2");
    assert_eq!(rows[1][3], r#"{"Klasse 1":"8.123.456,70 €"}"#);
}

#[test]
fn json_store_is_pretty_utf8() {
    let (store, config, _dir) = setup_store();
    let mut d = draw("2024-05-04", 2024, &[5, 9, 13, 27, 38, 44], None);
    d.payout_tiers = BTreeMap::from([("Klasse 9".to_string(), "6,00 €".to_string())]);
    store.persist(&d).unwrap();

    let raw = fs::read_to_string(config.json_path()).unwrap();
    assert!(raw.contains("\n  {"));
    assert!(raw.contains("6,00 €"));
    assert!(raw.contains("\"bonus_number\": null"));
}

#[test]
fn duplicate_date_leaves_stores_unchanged() {
    let (store, config, _dir) = setup_store();
    store
        .persist(&draw("2024-05-01", 2024, &[3, 11, 22, 28, 34, 41], Some(7)))
        .unwrap();
    let json_before = fs::read_to_string(config.json_path()).unwrap();
    let sheet_before = fs::read_to_string(config.sheet_path()).unwrap();

    // Same date, different numbers: still a duplicate.
    let outcome = store
        .persist(&draw("2024-05-01", 2024, &[1, 2, 3, 4, 5, 6], Some(0)))
        .unwrap();

    assert!(!outcome.any());
    assert_eq!(fs::read_to_string(config.json_path()).unwrap(), json_before);
    assert_eq!(fs::read_to_string(config.sheet_path()).unwrap(), sheet_before);
}

#[test]
fn new_date_appends_to_both_stores() {
    let (store, config, _dir) = setup_store();
    store
        .persist(&draw("2024-05-01", 2024, &[3, 11, 22, 28, 34, 41], Some(7)))
        .unwrap();

    let outcome = store
        .persist(&draw("2024-05-04", 2024, &[5, 9, 13, 27, 38, 44], Some(2)))
        .unwrap();

    assert!(outcome.json_written && outcome.sheet_written);
    assert_eq!(store.load_existing().unwrap().len(), 2);
    let rows = read_csv(&config.sheet_path());
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1][0], "2024-05-01");
    assert_eq!(rows[2][0], "2024-05-04");
}

#[test]
fn stores_are_reconciled_independently() {
    let (store, config, _dir) = setup_store();
    store
        .persist(&draw("2024-05-01", 2024, &[3, 11, 22], None))
        .unwrap();
    // Sheet lost, JSON still has the draw.
    fs::remove_file(config.sheet_path()).unwrap();

    let outcome = store
        .persist(&draw("2024-05-01", 2024, &[3, 11, 22], None))
        .unwrap();

    assert!(!outcome.json_written);
    assert!(outcome.sheet_written);
    assert_eq!(store.load_existing().unwrap().len(), 1);
    assert_eq!(read_csv(&config.sheet_path()).len(), 2);
}

#[test]
fn persist_all_deduplicates_within_batch() {
    let (store, config, _dir) = setup_store();
    store
        .persist(&draw("30.12. (Samstag)", 2023, &[6, 12, 19, 33, 40, 48], Some(3)))
        .unwrap();

    let batch = vec![
        draw("30.12. (Samstag)", 2023, &[6, 12, 19, 33, 40, 48], Some(3)),
        draw("27.12. (Mittwoch)", 2023, &[4, 8, 15, 16, 23, 42], Some(9)),
        draw("27.12. (Mittwoch)", 2023, &[4, 8, 15, 16, 23, 42], Some(9)),
        draw("04.05. (Samstag)", 2024, &[5, 9, 13, 27, 38, 44], Some(2)),
    ];
    let summary = store.persist_all(&batch).unwrap();

    assert_eq!(summary.json_added, 2);
    assert_eq!(summary.sheet_added, 2);
    assert_eq!(summary.duplicates, 2);
    assert_eq!(store.load_existing().unwrap().len(), 3);
    assert_eq!(read_csv(&config.sheet_path()).len(), 4);
}

#[test]
fn missing_payout_tiers_default_on_load() {
    let (_, config, _dir) = setup_store();
    fs::create_dir_all(config.data_dir()).unwrap();
    fs::write(
        config.json_path(),
        r#"[{"date": "2024-05-04", "year": 2024, "numbers": [5, 9, 13], "bonus_number": null}]"#,
    )
    .unwrap();

    let store = FileDrawStore::new(&config);
    let loaded = store.load_existing().unwrap();

    assert_eq!(loaded.len(), 1);
    assert!(loaded[0].payout_tiers.is_empty());
    assert_eq!(loaded[0].bonus_number, None);
}

#[test]
fn corrupt_json_store_is_an_error() {
    let (store, config, _dir) = setup_store();
    fs::create_dir_all(config.data_dir()).unwrap();
    fs::write(config.json_path(), "{ not json").unwrap();

    assert!(store.load_existing().is_err());
    assert!(
        store
            .persist(&draw("2024-05-04", 2024, &[5, 9, 13], None))
            .is_err()
    );
}
