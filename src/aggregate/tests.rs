use super::summarize_month;
use crate::domain::calendar::{CalendarDate, YearMonth};
use crate::domain::person::Person;
use crate::domain::project::{Project, ProjectStatus};
use crate::hours::HoursStore;
use crate::ident::Identifier;

fn id(raw: u64) -> Identifier {
    Identifier::from(raw)
}

fn date(raw: &str) -> CalendarDate {
    raw.parse().expect("test date should parse")
}

fn february() -> YearMonth {
    "2024-02".parse().expect("month should parse")
}

fn project(raw_id: u64, name: &str) -> Project {
    Project {
        id: id(raw_id),
        name: name.to_string(),
        start_date: date("2024-01-01"),
        status: ProjectStatus::Active,
    }
}

fn person(raw_id: u64, name: &str) -> Person {
    Person {
        id: id(raw_id),
        name: name.to_string(),
    }
}

fn office_store() -> HoursStore {
    let mut store = HoursStore::new();
    let day = date("2024-02-26");
    store.set_hours(day, &id(1), &id(1), 4.0);
    store.set_hours(day, &id(1), &id(2), 4.0);
    store.set_hours(day, &id(2), &id(2), 8.0);
    store
}

fn assert_closure(summary: &super::MonthSummary) {
    let by_pair: f64 = summary.pair_totals.iter().map(|total| total.hours).sum();
    let by_person: f64 = summary.person_totals.iter().map(|total| total.hours).sum();
    assert!((summary.grand_total - by_pair).abs() < 1e-9);
    assert!((summary.grand_total - by_person).abs() < 1e-9);
}

#[test]
fn totals_for_a_fully_known_month() {
    let projects = vec![project(1, "Residencia Silva"), project(2, "Edificio Infinity")];
    let people = vec![person(1, "Ana Costa"), person(2, "Carlos Pereira")];

    let summary = summarize_month(february(), &projects, &people, &office_store());
    assert_eq!(summary.pair_total(&id(1), &id(1)), Some(4.0));
    assert_eq!(summary.pair_total(&id(1), &id(2)), Some(4.0));
    assert_eq!(summary.pair_total(&id(2), &id(2)), Some(8.0));
    assert_eq!(summary.pair_totals.len(), 3);
    assert_eq!(summary.person_total(&id(1)), Some(8.0));
    assert_eq!(summary.person_total(&id(2)), Some(8.0));
    assert_eq!(summary.grand_total, 16.0);
    assert_eq!(summary.people, vec![id(1), id(2)]);
    assert_eq!(summary.projects, vec![id(1), id(2)]);
    assert_closure(&summary);
}

#[test]
fn deleted_project_drops_out_of_every_total() {
    let projects = vec![project(2, "Edificio Infinity")];
    let people = vec![person(1, "Ana Costa"), person(2, "Carlos Pereira")];

    let summary = summarize_month(february(), &projects, &people, &office_store());
    assert_eq!(summary.pair_totals.len(), 2);
    assert_eq!(summary.pair_total(&id(1), &id(1)), None);
    assert_eq!(summary.pair_total(&id(2), &id(2)), Some(8.0));
    assert_eq!(summary.person_total(&id(1)), Some(4.0));
    assert_eq!(summary.person_total(&id(2)), Some(8.0));
    assert_eq!(summary.grand_total, 12.0);
    assert_closure(&summary);
}

#[test]
fn deleted_project_with_person_one_only_on_it() {
    let mut store = HoursStore::new();
    let day = date("2024-02-26");
    store.set_hours(day, &id(1), &id(1), 4.0);
    store.set_hours(day, &id(2), &id(2), 8.0);
    let projects = vec![project(2, "Edificio Infinity")];
    let people = vec![person(1, "Ana Costa"), person(2, "Carlos Pereira")];

    let summary = summarize_month(february(), &projects, &people, &store);
    assert_eq!(summary.pair_totals.len(), 1);
    assert_eq!(summary.pair_total(&id(2), &id(2)), Some(8.0));
    assert_eq!(summary.person_total(&id(1)), None);
    assert_eq!(summary.grand_total, 8.0);
    assert_eq!(summary.people, vec![id(2)]);
    assert_closure(&summary);
}

#[test]
fn deleted_person_and_other_months_are_ignored() {
    let mut store = office_store();
    store.set_hours(date("2024-03-01"), &id(1), &id(1), 5.0);
    store.set_hours(date("2024-01-31"), &id(2), &id(2), 5.0);
    let projects = vec![project(1, "Residencia Silva"), project(2, "Edificio Infinity")];
    let people = vec![person(2, "Carlos Pereira")];

    let summary = summarize_month(february(), &projects, &people, &store);
    assert_eq!(summary.grand_total, 8.0);
    assert_eq!(summary.people, vec![id(2)]);
    assert_eq!(summary.projects, vec![id(2)]);
    assert_closure(&summary);
}

#[test]
fn repeated_runs_are_identical_and_accumulate_across_days() {
    let mut store = office_store();
    store.set_hours(date("2024-02-27"), &id(2), &id(1), 1.5);
    store.set_hours(date("2024-02-28"), &id(2), &id(2), 2.5);
    let projects = vec![project(1, "Residencia Silva"), project(2, "Edificio Infinity")];
    let people = vec![person(1, "Ana Costa"), person(2, "Carlos Pereira")];

    let first = summarize_month(february(), &projects, &people, &store);
    let second = summarize_month(february(), &projects, &people, &store);
    assert_eq!(
        serde_json::to_string(&first).expect("serialize"),
        serde_json::to_string(&second).expect("serialize")
    );
    assert_eq!(first.pair_total(&id(2), &id(2)), Some(10.5));
    assert_eq!(first.person_total(&id(2)), Some(12.0));
    assert_eq!(first.grand_total, 20.0);
    assert_closure(&first);
}

#[test]
fn charts_use_names_and_fill_missing_pairs_with_zero() {
    let projects = vec![project(1, "Residencia Silva"), project(2, "Edificio Infinity")];
    let people = vec![person(1, "Ana Costa"), person(2, "Carlos Pereira")];
    let summary = summarize_month(february(), &projects, &people, &office_store());

    let charts = summary.charts(&projects, &people);
    assert_eq!(charts.bar.labels, vec!["Ana Costa", "Carlos Pereira"]);
    assert_eq!(charts.bar.datasets.len(), 2);
    assert_eq!(charts.bar.datasets[0].label, "Residencia Silva");
    assert_eq!(charts.bar.datasets[0].data, vec![4.0, 0.0]);
    assert_eq!(charts.bar.datasets[1].data, vec![4.0, 8.0]);
    assert_eq!(charts.pie.data, vec![8.0, 8.0]);
    assert_eq!(charts.total_hours, 16.0);
}

#[test]
fn empty_month_has_no_axes() {
    let summary = summarize_month(
        "2024-05".parse().expect("month"),
        &[project(1, "Residencia Silva")],
        &[person(1, "Ana Costa")],
        &office_store(),
    );
    assert!(summary.is_empty());
    assert!(summary.people.is_empty());
    assert_eq!(summary.grand_total, 0.0);
}
