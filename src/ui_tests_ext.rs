use super::{
    draft_footer, format_grid_row, format_hours, format_project_row, grid_heading,
    status_color_code, summary_lines, Palette,
};
use crate::aggregate::summarize_month;
use crate::domain::calendar::{CalendarDate, YearMonth};
use crate::domain::person::Person;
use crate::domain::project::{Project, ProjectStatus};
use crate::grid::Grid;
use crate::hours::HoursStore;
use crate::ident::Identifier;

fn date(raw: &str) -> CalendarDate {
    raw.parse().expect("test date should parse")
}

fn february() -> YearMonth {
    "2024-02".parse().expect("month should parse")
}

fn fixtures() -> (Vec<Project>, Vec<Person>, HoursStore) {
    let projects = vec![
        Project {
            id: Identifier::from(10u64),
            name: "Casa Uva".to_string(),
            start_date: date("2024-01-15"),
            status: ProjectStatus::Active,
        },
        Project {
            id: Identifier::from(20u64),
            name: "Infinity".to_string(),
            start_date: date("2024-01-15"),
            status: ProjectStatus::Inactive,
        },
    ];
    let people = vec![Person {
        id: Identifier::from(1u64),
        name: "Ana".to_string(),
    }];
    let mut store = HoursStore::new();
    store.set_hours(date("2024-02-05"), &people[0].id, &projects[0].id, 5.0);
    store.set_hours(date("2024-02-05"), &people[0].id, &projects[1].id, 4.5);
    store.set_hours(date("2024-02-06"), &people[0].id, &projects[0].id, 2.0);
    (projects, people, store)
}

#[test]
fn hours_render_without_trailing_zero_fraction() {
    assert_eq!(format_hours(8.0), "8h");
    assert_eq!(format_hours(4.5), "4.5h");
}

#[test]
fn disabled_palette_produces_plain_text() {
    let palette = Palette { enabled: false };
    let (projects, _, _) = fixtures();
    assert_eq!(
        format_project_row(&projects[1], &palette),
        "20 [INACTIVE] Infinity since 2024-01-15"
    );

    let colored = Palette { enabled: true };
    assert!(colored.warn("x").starts_with("\x1b[31m"));
    assert_eq!(status_color_code(ProjectStatus::Active), "32");
}

#[test]
fn summary_lists_people_with_nested_projects_and_total() {
    let palette = Palette { enabled: false };
    let (projects, people, store) = fixtures();
    let summary = summarize_month(february(), &projects, &people, &store);
    let lines = summary_lines(&summary, &projects, &people, &palette);
    assert_eq!(
        lines,
        vec![
            "Summary 2024-02".to_string(),
            "Ana 11.5h".to_string(),
            "  Casa Uva 7h".to_string(),
            "  Infinity 4.5h".to_string(),
            "total 11.5h".to_string(),
        ]
    );

    let empty = summarize_month("2024-03".parse().expect("month"), &projects, &people, &store);
    let lines = summary_lines(&empty, &projects, &people, &palette);
    assert_eq!(lines[1], "no hours logged");
}

#[test]
fn grid_rows_show_labels_totals_and_overtime_cells() {
    let palette = Palette { enabled: false };
    let (projects, people, store) = fixtures();
    let mut grid = Grid::load(&store, february());
    let line = format_grid_row(&grid, &grid.rows()[0], &projects, &people, &palette);
    assert_eq!(line, "Ana / Casa Uva 7h 05:5h 06:2h");

    let flagged = Palette { enabled: true };
    let line = format_grid_row(&grid, &grid.rows()[0], &projects, &people, &flagged);
    assert!(line.contains("\x1b[31m05:5h\x1b[0m"), "day 5 totals 9.5h");
    assert!(!line.contains("\x1b[31m06:2h"));

    let draft = grid.add_row();
    let row = grid.row(draft).expect("draft row");
    let line = format_grid_row(&grid, row, &projects, &people, &palette);
    assert!(line.ends_with("(draft)"));
}

#[test]
fn grid_heading_links_neighbouring_months_and_counts_drafts() {
    let palette = Palette { enabled: false };
    let january: YearMonth = "2024-01".parse().expect("month should parse");
    assert_eq!(
        grid_heading(january, &palette),
        "Hours 2024-01 < 2023-12 | 2024-02 >"
    );

    let (_, _, store) = fixtures();
    let empty = Grid::load(&store, january);
    assert_eq!(
        draft_footer(&empty, &palette).as_deref(),
        Some("1 draft row(s) need a person and a project before they are saved")
    );
    let filled = Grid::load(&store, february());
    assert_eq!(draft_footer(&filled, &palette), None);
}
