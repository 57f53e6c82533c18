mod common;

use std::time::Duration;

use burnin_data_processing::processing::{AveragingKind, ReductionKind};
use burnin_data_processing::types::COMBINED_TIME;
use burnin_data_processing::{DataType, Session};

use common::{configs, fixture, init_logging};

const OFF_TIME: Duration = Duration::from_secs(300);

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn loaded_rack_session() -> Session {
    init_logging();
    let mut session = Session::new();
    let files = [fixture("logs/rack_a.csv"), fixture("logs/rack_b.csv")];
    assert!(session.load(&files, configs(), 256, OFF_TIME, true));
    session
}

#[test]
fn filter_then_cycle_reduce() {
    let mut s = loaded_rack_session();
    assert!(s.is_initialized());
    assert_eq!(s.row_count(), 10);
    assert_eq!(s.file_boundaries().len(), 2);
    assert!(s.available_columns().contains(&COMBINED_TIME.to_string()));
    assert_eq!(s.type_of("Laser Power"), DataType::Integer);

    assert!(s.load_columns(&["Laser Power", "Diode Temp", "State"]));
    assert!(s.filter("Laser Power", 0.5, 1, 0));
    assert_eq!(s.filter_set().len(), 2);
    assert_eq!(s.row_count(), 6);

    assert!(s.reduce(ReductionKind::Cycle, AveragingKind::StableMean, 1, 0));
    assert!(s.filter_set().is_empty());
    assert_eq!(s.row_count(), 2);
    assert_eq!(s.get_integers("Laser Power").unwrap(), vec![100, 90]);

    let temps = s.get_doubles("Diode Temp").unwrap();
    assert!(approx(temps[0], 31.0));
    assert!(approx(temps[1], 29.5));
    let spread = s.get_error("Diode Temp").unwrap();
    assert!(approx(spread[0], (2.0f64 / 3.0).sqrt()));
    assert!(approx(spread[1], (1.0f64 / 6.0).sqrt()));

    assert_eq!(
        s.get_strings("State").unwrap(),
        vec!["on, on, on", "on, on, on"]
    );

    // Loading a column after the reduction yields the reduced length.
    assert!(s.load_column(COMBINED_TIME));
    let time = s.get_doubles(COMBINED_TIME).unwrap();
    assert!(approx(time[0], 2.0));
    assert!(approx(time[1], 66.0));
    assert!(s.diagnostics().is_empty());
}

#[test]
fn all_reduction_chains_stages() {
    let mut s = loaded_rack_session();
    assert!(s.load_column("Laser Power"));
    assert!(s.filter("Laser Power", 0.5, 1, 0));
    assert!(s.reduce(ReductionKind::All, AveragingKind::OverallMean, 2, 1000));
    assert_eq!(s.row_count(), 1);
    assert_eq!(s.get_integers("Laser Power").unwrap(), vec![95]);
    assert_eq!(s.reduction_state().kind, ReductionKind::All);
}

#[test]
fn all_reduction_with_zero_counts_reduces_by_cycle_only() {
    let mut s = loaded_rack_session();
    assert!(s.load_column("Laser Power"));
    assert!(s.filter("Laser Power", 0.5, 1, 0));
    assert!(s.reduce(ReductionKind::All, AveragingKind::StableMean, 1, 0));
    assert_eq!(s.row_count(), 2);
    assert_eq!(s.get_integers("Laser Power").unwrap(), vec![100, 90]);
}

#[test]
fn clear_changes_reloads_raw_columns() {
    let mut s = loaded_rack_session();
    assert!(s.load_column("Diode Temp"));
    assert!(s.reduce(ReductionKind::NPoints, AveragingKind::OverallMedian, 1, 3));
    assert_eq!(s.get_doubles("Diode Temp").unwrap().len(), 3);
    assert!(s.clear_changes());
    assert_eq!(s.get_doubles("Diode Temp").unwrap().len(), 10);
    assert!(s.get_error("Diode Temp").unwrap().iter().all(|e| e.is_nan()));
}

#[test]
fn failed_load_keeps_previous_state() {
    let mut s = loaded_rack_session();
    assert!(s.load_column("Laser Power"));
    assert!(!s.load(
        &[fixture("logs/rack_b.csv")],
        fixture("no_such_configs"),
        256,
        OFF_TIME,
        true
    ));
    assert_eq!(s.row_count(), 10);
    assert_eq!(s.files().len(), 2);
    assert!(s.contains("Laser Power"));

    let diagnostics = s.take_diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].operation, "load");
    assert!(s.diagnostics().is_empty());

    assert!(!s.load(&[fixture("logs/rack_b.csv")], configs(), 0, OFF_TIME, true));
    assert_eq!(s.row_count(), 10);
}

#[test]
fn adding_and_removing_files_reingests() {
    init_logging();
    let mut s = Session::new();
    assert!(s.load(&[fixture("logs/rack_b.csv")], configs(), 256, OFF_TIME, true));
    assert!(s.load_column("Laser Power"));
    assert_eq!(s.row_count(), 6);

    assert!(s.add_files(&[fixture("logs/rack_a.csv"), fixture("logs/unknown.csv")]));
    assert_eq!(s.files().len(), 3);
    assert_eq!(s.row_count(), 10);
    assert_eq!(s.get_integers("Laser Power").unwrap().len(), 10);
    // The unmatched file is excluded and noted.
    assert_eq!(s.outcomes().iter().filter(|o| !o.is_ok()).count(), 1);
    assert_eq!(s.diagnostics().len(), 1);

    assert!(!s.remove_files(&[7]));
    assert!(s.remove_files(&[2, 0, 2]));
    assert_eq!(s.files(), &[fixture("logs/rack_a.csv")]);
    assert_eq!(s.row_count(), 4);
    assert_eq!(s.get_integers("Laser Power").unwrap(), vec![90, 90, 90, 90]);

    assert!(s.remove_file(0));
    assert!(!s.is_initialized());
    assert!(s.files().is_empty());
    assert!(!s.add_file(fixture("logs/rack_b.csv")));
}

#[test]
fn reduction_state_is_replayed_after_reingest() {
    init_logging();
    let mut s = Session::new();
    assert!(s.load(&[fixture("logs/rack_b.csv")], configs(), 256, OFF_TIME, true));
    assert!(s.load_column("Diode Temp"));
    assert!(s.reduce(ReductionKind::NPoints, AveragingKind::OverallMean, 1, 2));
    assert_eq!(s.row_count(), 2);

    assert!(s.add_file(fixture("logs/rack_a.csv")));
    assert_eq!(s.row_count(), 2);
    assert_eq!(s.get_doubles("Diode Temp").unwrap().len(), 2);

    assert!(s.load_column("Laser Power"));
    assert_eq!(s.get_integers("Laser Power").unwrap().len(), 2);
}

#[test]
fn operations_before_load_fail_softly() {
    init_logging();
    let mut s = Session::new();
    assert!(!s.load_column("Laser Power"));
    assert!(!s.filter("Laser Power", 0.5, 1, 0));
    assert!(!s.reduce(ReductionKind::NPoints, AveragingKind::StableMean, 1, 10));
    assert!(s.get("Laser Power").is_none());
    assert_eq!(s.type_of("Laser Power"), DataType::None);
    assert_eq!(s.diagnostics().len(), 3);
}
