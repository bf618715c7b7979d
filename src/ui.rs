use std::io::{self, IsTerminal};

use crate::aggregate::MonthSummary;
use crate::domain::calendar::YearMonth;
use crate::domain::person::{person_label, Person};
use crate::domain::project::{project_label, Project, ProjectStatus};
use crate::grid::{Grid, GridRow};
use crate::overtime::{cell_over_limit, SaveOutcome};

pub fn print_project_list(projects: &[Project]) {
    let palette = Palette::auto();
    println!("{}", palette.heading("Projects"));
    if projects.is_empty() {
        println!("{}", palette.dim("no projects yet"));
        return;
    }
    for project in projects {
        println!("{}", format_project_row(project, &palette));
    }
    println!("{}", palette.dim(&format!("{} project(s)", projects.len())));
}

pub fn print_person_list(people: &[Person]) {
    let palette = Palette::auto();
    println!("{}", palette.heading("People"));
    if people.is_empty() {
        println!("{}", palette.dim("no people yet"));
        return;
    }
    for person in people {
        println!("{} {}", palette.id(person.id.as_str()), person.name);
    }
    println!("{}", palette.dim(&format!("{} person(s)", people.len())));
}

pub fn print_month_summary(summary: &MonthSummary, projects: &[Project], people: &[Person]) {
    let palette = Palette::auto();
    for line in summary_lines(summary, projects, people, &palette) {
        println!("{line}");
    }
}

pub fn print_grid(grid: &Grid, projects: &[Project], people: &[Person]) {
    let palette = Palette::auto();
    println!("{}", grid_heading(grid.month(), &palette));
    for row in grid.rows() {
        println!("{}", format_grid_row(grid, row, projects, people, &palette));
    }
    if let Some(footer) = draft_footer(grid, &palette) {
        println!("{footer}");
    }
}

pub fn print_save_outcome(outcome: &SaveOutcome, people: &[Person]) {
    let palette = Palette::auto();
    let message = outcome.message(|id| person_label(people, id));
    if outcome.warning.is_some() {
        println!("{}", palette.warn(&message));
    } else {
        println!("{}", palette.ok(&message));
    }
    if outcome.cells_unsynced > 0 {
        println!(
            "{}",
            palette.warn(&format!(
                "{} cell(s) were not written to the backend",
                outcome.cells_unsynced
            ))
        );
    }
}

fn format_project_row(project: &Project, palette: &Palette) -> String {
    format!(
        "{} {} {} {}",
        palette.id(project.id.as_str()),
        palette.status(project.status),
        project.name,
        palette.dim(&format!("since {}", project.start_date))
    )
}

fn summary_lines(
    summary: &MonthSummary,
    projects: &[Project],
    people: &[Person],
    palette: &Palette,
) -> Vec<String> {
    let mut lines = vec![palette.heading(&format!("Summary {}", summary.month))];
    if summary.is_empty() {
        lines.push(palette.dim("no hours logged"));
        return lines;
    }

    for person in &summary.person_totals {
        lines.push(format!(
            "{} {}",
            person_label(people, &person.person_id),
            palette.hours(&format_hours(person.hours))
        ));
        for pair in summary
            .pair_totals
            .iter()
            .filter(|pair| pair.person_id == person.person_id)
        {
            lines.push(format!(
                "  {} {}",
                project_label(projects, &pair.project_id),
                format_hours(pair.hours)
            ));
        }
    }
    lines.push(format!(
        "{} {}",
        palette.dim("total"),
        palette.hours(&format_hours(summary.grand_total))
    ));
    lines
}

fn grid_heading(month: YearMonth, palette: &Palette) -> String {
    format!(
        "{} {}",
        palette.heading(&format!("Hours {}", month)),
        palette.dim(&format!("< {} | {} >", month.previous(), month.next()))
    )
}

fn draft_footer(grid: &Grid, palette: &Palette) -> Option<String> {
    let drafts = grid.rows().iter().filter(|row| row.is_draft()).count();
    (drafts > 0).then(|| {
        palette.dim(&format!(
            "{} draft row(s) need a person and a project before they are saved",
            drafts
        ))
    })
}

fn format_grid_row(
    grid: &Grid,
    row: &GridRow,
    projects: &[Project],
    people: &[Person],
    palette: &Palette,
) -> String {
    let Some((person_id, project_id)) = row.pair() else {
        return palette.dim(&format!("{} (draft)", row.row_id));
    };
    let cells = row
        .hours_by_day
        .iter()
        .map(|(day, hours)| {
            let cell = format!("{:02}:{}", day, format_hours(*hours));
            if cell_over_limit(grid.rows(), row, *day) {
                palette.warn(&cell)
            } else {
                cell
            }
        })
        .collect::<Vec<_>>();
    format!(
        "{} / {} {} {}",
        person_label(people, person_id),
        project_label(projects, project_id),
        palette.hours(&format_hours(row.total())),
        cells.join(" ")
    )
}

/// Whole numbers print without a fraction.
fn format_hours(hours: f64) -> String {
    if hours.fract() == 0.0 {
        format!("{:.0}h", hours)
    } else {
        format!("{}h", hours)
    }
}

struct Palette {
    enabled: bool,
}

impl Palette {
    fn auto() -> Self {
        let enabled = std::env::var_os("NO_COLOR").is_none() && io::stdout().is_terminal();
        Self { enabled }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.enabled {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    fn heading(&self, text: &str) -> String {
        self.paint("1;36", text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint("2", text)
    }

    fn id(&self, text: &str) -> String {
        self.paint("1;94", text)
    }

    fn hours(&self, text: &str) -> String {
        self.paint("1", text)
    }

    fn ok(&self, text: &str) -> String {
        self.paint("32", text)
    }

    fn warn(&self, text: &str) -> String {
        self.paint("31", text)
    }

    fn status(&self, status: ProjectStatus) -> String {
        let upper = status.as_str().to_ascii_uppercase();
        self.paint(status_color_code(status), &format!("[{upper}]"))
    }
}

fn status_color_code(status: ProjectStatus) -> &'static str {
    match status {
        ProjectStatus::Active => "32",
        ProjectStatus::Inactive => "90",
    }
}

#[cfg(test)]
#[path = "ui_tests_ext.rs"]
mod tests_ext;
