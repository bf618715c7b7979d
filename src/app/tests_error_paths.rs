use super::{AppError, Timesheet};
use crate::backend::{Backend, BackendError, Snapshot};
use crate::config::Config;
use crate::domain::calendar::CalendarDate;
use crate::domain::person::Person;
use crate::domain::project::{Project, ProjectStatus};
use crate::hours::{CellWrite, HoursStore};
use crate::ident::Identifier;
use std::cell::Cell;
use std::rc::Rc;

/// Serves a fixed snapshot and fails every write while `fail` is set.
struct FlakyBackend {
    snapshot: Snapshot,
    fail: Rc<Cell<bool>>,
    writes: Rc<Cell<usize>>,
}

impl FlakyBackend {
    fn attempt(&self) -> Result<(), BackendError> {
        self.writes.set(self.writes.get() + 1);
        if self.fail.get() {
            Err(BackendError::Corrupt("backend unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

impl Backend for FlakyBackend {
    fn kind(&self) -> &'static str {
        "flaky"
    }

    fn load_all(&mut self) -> Result<Snapshot, BackendError> {
        Ok(self.snapshot.clone())
    }

    fn upsert_hour_fact(
        &mut self,
        _date: CalendarDate,
        _person_id: &Identifier,
        _project_id: &Identifier,
        _hours: f64,
    ) -> Result<(), BackendError> {
        self.attempt()
    }

    fn delete_hour_fact(
        &mut self,
        _date: CalendarDate,
        _person_id: &Identifier,
        _project_id: &Identifier,
    ) -> Result<(), BackendError> {
        self.attempt()
    }

    fn delete_hour_facts_in_range(
        &mut self,
        _person_id: &Identifier,
        _project_id: &Identifier,
        _start: CalendarDate,
        _end: CalendarDate,
    ) -> Result<usize, BackendError> {
        self.attempt().map(|()| 0)
    }

    fn create_project(&mut self, _project: &Project) -> Result<(), BackendError> {
        self.attempt()
    }

    fn update_project(&mut self, _project: &Project) -> Result<(), BackendError> {
        self.attempt()
    }

    fn delete_project(&mut self, _id: &Identifier) -> Result<(), BackendError> {
        self.attempt()
    }

    fn create_person(&mut self, _person: &Person) -> Result<(), BackendError> {
        self.attempt()
    }

    fn update_person(&mut self, _person: &Person) -> Result<(), BackendError> {
        self.attempt()
    }

    fn delete_person(&mut self, _id: &Identifier) -> Result<(), BackendError> {
        self.attempt()
    }
}

fn date(raw: &str) -> CalendarDate {
    raw.parse().expect("test date should parse")
}

fn id(raw: u64) -> Identifier {
    Identifier::from(raw)
}

fn flaky_session(hours: HoursStore) -> (Timesheet, Rc<Cell<bool>>, Rc<Cell<usize>>) {
    let fail = Rc::new(Cell::new(false));
    let writes = Rc::new(Cell::new(0));
    let backend = FlakyBackend {
        snapshot: Snapshot {
            projects: vec![Project {
                id: id(10),
                name: "Casa Uva".to_string(),
                start_date: date("2024-01-01"),
                status: ProjectStatus::Active,
            }],
            people: vec![Person {
                id: id(1),
                name: "Ana".to_string(),
            }],
            hours,
        },
        fail: Rc::clone(&fail),
        writes: Rc::clone(&writes),
    };
    let config = Config {
        legacy_keys: Vec::new(),
        ..Config::default()
    };
    let mut session = Timesheet::open(Box::new(backend), &config);
    session.load().expect("load should succeed");
    (session, fail, writes)
}

#[test]
fn failed_hour_write_keeps_the_optimistic_value() {
    let (mut session, fail, writes) = flaky_session(HoursStore::new());
    fail.set(true);

    let outcome = session
        .set_hours(date("2024-02-05"), &id(1), &id(10), 6.0)
        .expect("hour writes never fail the caller");
    assert_eq!(outcome.write, CellWrite::Upserted(6.0));
    assert!(!outcome.synced);
    assert_eq!(writes.get(), 1);
    assert_eq!(session.unsynced_writes(), 1);
    assert_eq!(
        session
            .hours()
            .expect("hours")
            .get(date("2024-02-05"), &id(1), &id(10)),
        Some(6.0)
    );

    fail.set(false);
    let outcome = session
        .set_hours(date("2024-02-05"), &id(1), &id(10), 0.0)
        .expect("write");
    assert!(outcome.synced);
    assert_eq!(session.unsynced_writes(), 1);
}

#[test]
fn clearing_an_absent_cell_skips_the_backend() {
    let (mut session, _fail, writes) = flaky_session(HoursStore::new());
    let outcome = session
        .set_hours(date("2024-02-05"), &id(1), &id(10), -1.0)
        .expect("write");
    assert_eq!(outcome.write, CellWrite::Cleared);
    assert!(outcome.synced);
    assert_eq!(writes.get(), 0);
}

#[test]
fn commit_counts_unsynced_cells_but_keeps_memory() {
    let (mut session, fail, _writes) = flaky_session(HoursStore::new());
    let february = "2024-02".parse().expect("month");
    let mut grid = session.load_grid(february).expect("grid");
    let row = grid.rows()[0].row_id;
    grid.set_person(row, "1").expect("edit");
    grid.set_project(row, "10").expect("edit");
    grid.set_hours(row, 3, "7").expect("edit");
    grid.set_hours(row, 4, "2").expect("edit");

    fail.set(true);
    let outcome = session.commit_grid(&grid).expect("commit");
    assert_eq!(outcome.cells_written, 29);
    assert_eq!(outcome.cells_unsynced, 2);
    assert_eq!(session.hours().expect("hours").len(), 2);

    let removed = session
        .remove_row_hours(february, &id(1), &id(10))
        .expect("remove");
    assert_eq!(removed, 2);
    assert_eq!(session.unsynced_writes(), 3);
    assert!(session.hours().expect("hours").is_empty());
}

#[test]
fn entity_writes_propagate_backend_errors_and_leave_memory_untouched() {
    let (mut session, fail, _writes) = flaky_session(HoursStore::new());
    fail.set(true);

    assert!(matches!(
        session.add_person("Bruno"),
        Err(AppError::Backend(_))
    ));
    assert!(matches!(
        session.rename_person(&id(1), "Ana Costa"),
        Err(AppError::Backend(_))
    ));
    assert!(matches!(
        session.toggle_project_status(&id(10)),
        Err(AppError::Backend(_))
    ));
    assert!(matches!(
        session.delete_project(&id(10)),
        Err(AppError::Backend(_))
    ));

    assert_eq!(session.people().expect("people").len(), 1);
    assert_eq!(session.people().expect("people")[0].name, "Ana");
    let projects = session.projects().expect("projects");
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].status, ProjectStatus::Active);
}

#[test]
fn failed_migration_write_back_still_exposes_merged_hours() {
    let mut hours = HoursStore::new();
    hours.set_hours(date("2024-05-02"), &id(42), &id(1), 6.0);
    let fail = Rc::new(Cell::new(true));
    let backend = FlakyBackend {
        snapshot: Snapshot {
            hours,
            ..Snapshot::default()
        },
        fail: Rc::clone(&fail),
        writes: Rc::new(Cell::new(0)),
    };
    let mut session = Timesheet::open(Box::new(backend), &Config::default());
    let report = session.load().expect("load");
    assert_eq!(report.moved.len(), 1);
    assert_eq!(session.unsynced_writes(), 2);
    assert_eq!(
        session
            .hours()
            .expect("hours")
            .get(date("2024-05-02"), &id(42), &id(1772214122148)),
        Some(6.0)
    );
}
