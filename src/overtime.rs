use serde::Serialize;

use crate::domain::calendar::YearMonth;
use crate::grid::{Grid, GridRow};
use crate::ident::Identifier;

/// Hours per person per day above which a warning is raised.
pub const DAILY_HOURS_LIMIT: f64 = 8.0;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OvertimeWarning {
    pub person_id: Identifier,
    pub day: u8,
    pub total: f64,
}

pub fn day_total(rows: &[GridRow], person_id: &Identifier, day: u8) -> f64 {
    rows.iter()
        .filter(|row| row.person_id.as_ref() == Some(person_id))
        .map(|row| row.hours_on(day))
        .sum()
}

pub fn is_over_limit(rows: &[GridRow], person_id: &Identifier, day: u8) -> bool {
    day_total(rows, person_id, day) > DAILY_HOURS_LIMIT
}

/// Per-cell check used while editing. Cells of draft rows without a person
/// are never flagged.
pub fn cell_over_limit(rows: &[GridRow], row: &GridRow, day: u8) -> bool {
    row.person_id
        .as_ref()
        .is_some_and(|person_id| is_over_limit(rows, person_id, day))
}

/// The single save-time advisory: first complete row in order, then first
/// day in order, whose person exceeds the limit.
pub fn first_violation(grid: &Grid) -> Option<OvertimeWarning> {
    let rows = grid.rows();
    rows.iter()
        .filter_map(GridRow::pair)
        .find_map(|(person_id, _)| {
            grid.month().days().find_map(|day| {
                let total = day_total(rows, person_id, day);
                (total > DAILY_HOURS_LIMIT).then(|| OvertimeWarning {
                    person_id: person_id.clone(),
                    day,
                    total,
                })
            })
        })
}

/// Every distinct person/day over the limit, for reports.
pub fn violations(grid: &Grid) -> Vec<OvertimeWarning> {
    let rows = grid.rows();
    let mut found: Vec<OvertimeWarning> = Vec::new();
    for (person_id, _) in rows.iter().filter_map(GridRow::pair) {
        if found.iter().any(|warning| warning.person_id == *person_id) {
            continue;
        }
        for day in grid.month().days() {
            let total = day_total(rows, person_id, day);
            if total > DAILY_HOURS_LIMIT {
                found.push(OvertimeWarning {
                    person_id: person_id.clone(),
                    day,
                    total,
                });
            }
        }
    }
    found
}

/// Result of committing a grid. Overtime never blocks the save.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SaveOutcome {
    pub month: YearMonth,
    pub cells_written: usize,
    pub cells_unsynced: usize,
    pub warning: Option<OvertimeWarning>,
}

impl SaveOutcome {
    pub fn message(&self, person_name: impl Fn(&Identifier) -> String) -> String {
        match &self.warning {
            Some(warning) => format!(
                "warning: {} exceeded {} hours on day {}. The records were saved.",
                person_name(&warning.person_id),
                DAILY_HOURS_LIMIT,
                warning.day
            ),
            None => "records saved".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        cell_over_limit, day_total, first_violation, is_over_limit, violations, SaveOutcome,
    };
    use crate::domain::calendar::YearMonth;
    use crate::grid::Grid;
    use crate::hours::HoursStore;
    use crate::ident::Identifier;

    fn id(raw: u64) -> Identifier {
        Identifier::from(raw)
    }

    fn february() -> YearMonth {
        "2024-02".parse().expect("month should parse")
    }

    fn grid_with_rows(rows: &[(u64, u64, u8, &str)]) -> Grid {
        let mut grid = Grid::load(&HoursStore::new(), february());
        let draft = grid.rows()[0].row_id;
        grid.remove_row(draft).expect("draft row exists");
        for (person, project, day, hours) in rows {
            let row = match grid.find_pair(&id(*person), &id(*project)) {
                Some(row) => row,
                None => {
                    let row = grid.add_row();
                    grid.set_person(row, &person.to_string()).expect("row exists");
                    grid.set_project(row, &project.to_string()).expect("row exists");
                    row
                }
            };
            grid.set_hours(row, *day, hours).expect("valid cell");
        }
        grid
    }

    #[test]
    fn flags_person_over_eight_hours_across_projects() {
        let grid = grid_with_rows(&[(7, 1, 12, "5"), (7, 2, 12, "4")]);
        assert_eq!(day_total(grid.rows(), &id(7), 12), 9.0);
        assert!(is_over_limit(grid.rows(), &id(7), 12));
        assert!(grid
            .rows()
            .iter()
            .all(|row| cell_over_limit(grid.rows(), row, 12)));

        let warning = first_violation(&grid).expect("overtime should be flagged");
        assert_eq!(warning.person_id, id(7));
        assert_eq!(warning.day, 12);
    }

    #[test]
    fn exactly_eight_hours_is_within_the_limit() {
        let grid = grid_with_rows(&[(7, 1, 12, "4"), (7, 2, 12, "4"), (8, 1, 12, "8")]);
        assert!(!is_over_limit(grid.rows(), &id(7), 12));
        assert!(first_violation(&grid).is_none());
        assert!(violations(&grid).is_empty());
    }

    #[test]
    fn other_people_do_not_count_towards_a_total() {
        let grid = grid_with_rows(&[(7, 1, 3, "6"), (8, 1, 3, "6")]);
        assert_eq!(day_total(grid.rows(), &id(7), 3), 6.0);
        assert!(first_violation(&grid).is_none());
    }

    #[test]
    fn first_violation_follows_row_then_day_order() {
        let grid = grid_with_rows(&[(8, 1, 20, "9"), (7, 1, 2, "10"), (8, 1, 4, "12")]);
        let warning = first_violation(&grid).expect("overtime should be flagged");
        assert_eq!(warning.person_id, id(8));
        assert_eq!(warning.day, 4);

        let all = violations(&grid);
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn draft_person_cells_are_not_flagged() {
        let mut grid = Grid::load(&HoursStore::new(), february());
        let row = grid.rows()[0].row_id;
        grid.set_hours(row, 1, "12").expect("valid cell");
        let draft = grid.row(row).expect("row exists");
        assert!(!cell_over_limit(grid.rows(), draft, 1));
        assert!(first_violation(&grid).is_none());
    }

    #[test]
    fn save_message_names_the_person_and_day() {
        let grid = grid_with_rows(&[(7, 1, 12, "5"), (7, 2, 12, "4")]);
        let outcome = SaveOutcome {
            month: february(),
            cells_written: 58,
            cells_unsynced: 0,
            warning: first_violation(&grid),
        };
        let message = outcome.message(|_| "Ana Costa".to_string());
        assert!(message.starts_with("warning: Ana Costa exceeded 8 hours on day 12"));

        let clean = SaveOutcome {
            warning: None,
            ..outcome
        };
        assert_eq!(clean.message(|_| String::new()), "records saved");
    }
}
