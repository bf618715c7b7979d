use std::path::PathBuf;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{ArgAction, Args, Parser, Subcommand};

use crate::config::BackendKind;
use crate::domain::calendar::{CalendarDate, YearMonth};
use crate::domain::project::ProjectStatus;
use crate::ident::Identifier;

fn cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::BrightCyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::BrightYellow.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightGreen.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::BrightMagenta.on_default())
}

#[derive(Debug, Parser)]
#[command(name = "hourbook")]
#[command(bin_name = "hourbook")]
#[command(version)]
#[command(about = "Office timesheet: projects, people and the hours they log")]
#[command(styles = cli_styles())]
pub struct Cli {
    #[arg(
        long,
        env = "HOURBOOK_CONFIG",
        global = true,
        help = "Path to the TOML config file."
    )]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Storage backend (sqlite or json).")]
    pub backend: Option<BackendKind>,

    #[arg(
        long,
        global = true,
        help = "Directory holding the timesheet data."
    )]
    pub data_dir: Option<PathBuf>,

    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        global = true,
        help = "Log more (-v info, -vv debug)."
    )]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Manage projects.")]
    Project(ProjectArgs),
    #[command(about = "Manage people.")]
    Person(PersonArgs),
    #[command(about = "Write one hour cell; 0 clears it.")]
    Log(LogArgs),
    #[command(about = "Show or commit the monthly hours grid.")]
    Grid(GridArgs),
    #[command(about = "Show monthly totals per person and project.")]
    Summary(SummaryArgs),
    #[command(about = "Fold hours logged under retired project ids onto their replacement.")]
    Migrate(JsonFlag),
}

#[derive(Debug, Args, Clone, Copy)]
pub struct JsonFlag {
    #[arg(long, help = "Emit JSON output.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ProjectArgs {
    #[command(subcommand)]
    pub command: ProjectSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum ProjectSubcommands {
    #[command(about = "Create a project.")]
    Add(ProjectAddArgs),
    #[command(about = "List projects.")]
    Ls(ProjectLsArgs),
    #[command(about = "Change project fields.")]
    Update(ProjectUpdateArgs),
    #[command(about = "Flip a project between active and inactive.")]
    Toggle(IdArgs),
    #[command(about = "Delete a project (its logged hours are kept).")]
    Rm(IdArgs),
}

#[derive(Debug, Args)]
pub struct ProjectAddArgs {
    #[arg(help = "Project name.")]
    pub name: String,

    #[arg(long = "start", help = "Start date (yyyy-MM-dd).")]
    pub start_date: CalendarDate,

    #[arg(long, default_value = "active", help = "active or inactive.")]
    pub status: ProjectStatus,
}

#[derive(Debug, Args, Clone, Copy)]
pub struct ProjectLsArgs {
    #[arg(long, help = "Only projects open for new hours.")]
    pub active: bool,

    #[arg(long, help = "Emit JSON output.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ProjectUpdateArgs {
    #[arg(help = "Project id.")]
    pub id: Identifier,

    #[arg(long, help = "New project name.")]
    pub name: Option<String>,

    #[arg(long = "start", help = "New start date (yyyy-MM-dd).")]
    pub start_date: Option<CalendarDate>,

    #[arg(long, help = "active or inactive.")]
    pub status: Option<ProjectStatus>,
}

#[derive(Debug, Args)]
pub struct IdArgs {
    #[arg(help = "Entity id.")]
    pub id: Identifier,
}

#[derive(Debug, Args)]
pub struct PersonArgs {
    #[command(subcommand)]
    pub command: PersonSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum PersonSubcommands {
    #[command(about = "Add a person.")]
    Add(PersonAddArgs),
    #[command(about = "List people.")]
    Ls(JsonFlag),
    #[command(about = "Rename a person.")]
    Rename(PersonRenameArgs),
    #[command(about = "Delete a person (their logged hours are kept).")]
    Rm(IdArgs),
}

#[derive(Debug, Args)]
pub struct PersonAddArgs {
    #[arg(help = "Person name.")]
    pub name: String,
}

#[derive(Debug, Args)]
pub struct PersonRenameArgs {
    #[arg(help = "Person id.")]
    pub id: Identifier,

    #[arg(help = "New name.")]
    pub name: String,
}

#[derive(Debug, Args)]
pub struct LogArgs {
    #[arg(help = "Work date (yyyy-MM-dd).")]
    pub date: CalendarDate,

    #[arg(help = "Person id.")]
    pub person: Identifier,

    #[arg(help = "Project id.")]
    pub project: Identifier,

    #[arg(help = "Hours worked; anything not positive clears the cell.")]
    pub hours: String,

    #[arg(long, help = "Emit JSON output.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct GridArgs {
    #[command(subcommand)]
    pub command: GridSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum GridSubcommands {
    #[command(about = "Show the editing grid for a month.")]
    Show(GridShowArgs),
    #[command(about = "Set one day of a person/project row and commit the month.")]
    Set(GridSetArgs),
    #[command(about = "Commit edited grid rows from a JSON file.")]
    Commit(GridCommitArgs),
    #[command(about = "Remove a person/project row and its hours for the month.")]
    Rm(GridRemoveArgs),
}

#[derive(Debug, Args)]
pub struct GridShowArgs {
    #[arg(help = "Month (yyyy-MM); defaults to the current month.")]
    pub month: Option<YearMonth>,

    #[arg(long, help = "Emit JSON output.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct GridSetArgs {
    #[arg(help = "Month (yyyy-MM).")]
    pub month: YearMonth,

    #[arg(help = "Person id.")]
    pub person: Identifier,

    #[arg(help = "Project id.")]
    pub project: Identifier,

    #[arg(help = "Day of the month.")]
    pub day: u8,

    #[arg(help = "Hours worked; anything not positive clears the cell.")]
    pub hours: String,

    #[arg(long, help = "Emit JSON output.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct GridCommitArgs {
    #[arg(help = "Month (yyyy-MM).")]
    pub month: YearMonth,

    #[arg(
        long,
        help = "JSON array of rows: {person_id, project_id, hours_by_day}."
    )]
    pub file: PathBuf,

    #[arg(long, help = "Emit JSON output.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct GridRemoveArgs {
    #[arg(help = "Month (yyyy-MM).")]
    pub month: YearMonth,

    #[arg(help = "Person id.")]
    pub person: Identifier,

    #[arg(help = "Project id.")]
    pub project: Identifier,
}

#[derive(Debug, Args)]
pub struct SummaryArgs {
    #[arg(help = "Month (yyyy-MM); defaults to the current month.")]
    pub month: Option<YearMonth>,

    #[arg(long, help = "Emit JSON output.")]
    pub json: bool,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
