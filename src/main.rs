mod aggregate;
mod app;
mod backend;
mod cli;
mod config;
mod db;
mod domain;
mod grid;
mod hours;
mod ident;
mod logging;
mod migrate;
mod overtime;
mod ui;

use app::{AppError, Timesheet};
use cli::{GridSubcommands, LogArgs, PersonSubcommands, ProjectSubcommands};
use config::{resolve_config_path, Config};
use domain::calendar::YearMonth;
use domain::project::{Project, ProjectPatch};
use grid::{Grid, GridEdit, GridRow};
use hours::CellWrite;

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn print_json(value: &impl serde::Serialize) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).expect("json serialization should work")
    );
}

/// Config file values with command-line overrides applied.
fn resolve_config(cli: &cli::Cli) -> Result<Config, AppError> {
    let mut config = match resolve_config_path(cli.config.as_deref()) {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    Ok(config)
}

fn run() -> Result<(), AppError> {
    use clap::Parser;
    use cli::Commands;

    let cli = cli::Cli::parse();
    logging::init(cli.verbose);
    let config = resolve_config(&cli)?;
    tracing::debug!(
        backend = %config.backend,
        data_dir = %config.data_dir.display(),
        "resolved configuration"
    );

    let mut session = Timesheet::from_config(&config)?;
    let load_report = session.load()?;

    match cli.command {
        Commands::Project(args) => run_project(&mut session, args.command)?,
        Commands::Person(args) => run_person(&mut session, args.command)?,
        Commands::Log(args) => run_log(&mut session, args)?,
        Commands::Grid(args) => run_grid(&mut session, args.command)?,
        Commands::Summary(args) => {
            let month = args.month.unwrap_or_else(YearMonth::current);
            let summary = session.month_summary(month)?;
            if args.json {
                let charts = summary.charts(session.projects()?, session.people()?);
                print_json(&serde_json::json!({
                    "summary": summary,
                    "charts": charts,
                }));
            } else {
                ui::print_month_summary(&summary, session.projects()?, session.people()?);
            }
        }
        Commands::Migrate(flag) => {
            let mut report = load_report;
            report.moved.extend(session.run_migration()?.moved);
            if flag.json {
                print_json(&serde_json::json!({
                    "entries": report.moved.len(),
                    "hours": report.hours_moved(),
                    "moved": report.moved,
                }));
            } else if report.changed() {
                println!(
                    "migrated {} entr(ies), {} hours",
                    report.moved.len(),
                    report.hours_moved()
                );
            } else {
                println!("nothing to migrate");
            }
        }
    }

    if session.unsynced_writes() > 0 {
        eprintln!(
            "warning: {} write(s) did not reach the {} backend",
            session.unsynced_writes(),
            session.backend_kind()
        );
    }
    session.dispose();
    Ok(())
}

fn run_project(session: &mut Timesheet, command: ProjectSubcommands) -> Result<(), AppError> {
    match command {
        ProjectSubcommands::Add(args) => {
            let project = session.add_project(&args.name, args.start_date, args.status)?;
            println!("created project {} {}", project.id, project.name);
        }
        ProjectSubcommands::Ls(args) => {
            let projects: Vec<Project> = if args.active {
                session.active_projects()?.into_iter().cloned().collect()
            } else {
                session.projects()?.to_vec()
            };
            if args.json {
                print_json(&projects);
            } else {
                ui::print_project_list(&projects);
            }
        }
        ProjectSubcommands::Update(args) => {
            let patch = ProjectPatch {
                name: args.name,
                start_date: args.start_date,
                status: args.status,
            };
            let project = session.update_project(&args.id, &patch)?;
            println!("updated project {} {}", project.id, project.name);
        }
        ProjectSubcommands::Toggle(args) => {
            let project = session.toggle_project_status(&args.id)?;
            println!("project {} is now {}", project.id, project.status);
        }
        ProjectSubcommands::Rm(args) => {
            let project = session.delete_project(&args.id)?;
            println!("deleted project {} {}", project.id, project.name);
        }
    }
    Ok(())
}

fn run_person(session: &mut Timesheet, command: PersonSubcommands) -> Result<(), AppError> {
    match command {
        PersonSubcommands::Add(args) => {
            let person = session.add_person(&args.name)?;
            println!("added person {} {}", person.id, person.name);
        }
        PersonSubcommands::Ls(flag) => {
            let people = session.people()?;
            if flag.json {
                print_json(&people);
            } else {
                ui::print_person_list(people);
            }
        }
        PersonSubcommands::Rename(args) => {
            let person = session.rename_person(&args.id, &args.name)?;
            println!("renamed person {} to {}", person.id, person.name);
        }
        PersonSubcommands::Rm(args) => {
            let person = session.delete_person(&args.id)?;
            println!("deleted person {} {}", person.id, person.name);
        }
    }
    Ok(())
}

fn run_log(session: &mut Timesheet, args: LogArgs) -> Result<(), AppError> {
    let outcome = session.set_hours_text(args.date, &args.person, &args.project, &args.hours)?;
    let hours = match outcome.write {
        CellWrite::Upserted(hours) => Some(hours),
        CellWrite::Cleared => None,
    };
    if args.json {
        print_json(&serde_json::json!({
            "date": args.date,
            "person_id": args.person,
            "project_id": args.project,
            "hours": hours,
            "synced": outcome.synced,
        }));
        return Ok(());
    }

    let person = session.person_name(&args.person)?;
    let project = session.project_name(&args.project)?;
    match hours {
        Some(hours) => println!(
            "logged {} hours for {} on {} ({})",
            hours, person, args.date, project
        ),
        None => println!("cleared {} on {} ({})", person, args.date, project),
    }
    let month = args.date.year_month();
    if let Some(total) = session.month_summary(month)?.person_total(&args.person) {
        println!("{} has {} hours in {}", person, total, month);
    }
    Ok(())
}

fn run_grid(session: &mut Timesheet, command: GridSubcommands) -> Result<(), AppError> {
    match command {
        GridSubcommands::Show(args) => {
            let month = args.month.unwrap_or_else(YearMonth::current);
            let grid = session.load_grid(month)?;
            if args.json {
                print_json(&serde_json::json!({
                    "grid": grid,
                    "overtime": overtime::violations(&grid),
                }));
            } else {
                ui::print_grid(&grid, session.projects()?, session.people()?);
            }
        }
        GridSubcommands::Set(args) => {
            let mut grid = session.load_grid(args.month)?;
            let row = match grid.find_pair(&args.person, &args.project) {
                Some(row) => row,
                None => {
                    let row = grid.add_row();
                    grid.apply(GridEdit::SetPerson {
                        row,
                        value: args.person.to_string(),
                    })?;
                    grid.apply(GridEdit::SetProject {
                        row,
                        value: args.project.to_string(),
                    })?;
                    row
                }
            };
            grid.apply(GridEdit::SetHours {
                row,
                day: args.day,
                value: args.hours,
            })?;
            let outcome = session.commit_grid(&grid)?;
            let row_total = grid.row(row).map_or(0.0, GridRow::total);
            if args.json {
                print_json(&serde_json::json!({
                    "row_total": row_total,
                    "outcome": outcome,
                }));
            } else {
                ui::print_save_outcome(&outcome, session.people()?);
                println!(
                    "{} / {} now at {} hours in {}",
                    session.person_name(&args.person)?,
                    session.project_name(&args.project)?,
                    row_total,
                    args.month
                );
            }
        }
        GridSubcommands::Commit(args) => {
            let raw = std::fs::read_to_string(&args.file)?;
            let rows: Vec<GridRow> = serde_json::from_str(&raw).map_err(|err| {
                AppError::InvalidArgument(format!("invalid grid rows file: {}", err))
            })?;
            let grid = Grid::from_rows(args.month, rows);
            let outcome = session.commit_grid(&grid)?;
            if args.json {
                print_json(&outcome);
            } else {
                ui::print_save_outcome(&outcome, session.people()?);
            }
        }
        GridSubcommands::Rm(args) => {
            let mut grid = session.load_grid(args.month)?;
            let row = grid.find_pair(&args.person, &args.project).ok_or_else(|| {
                AppError::NotFound(format!(
                    "row {} / {} in {}",
                    args.person, args.project, args.month
                ))
            })?;
            let removed = session.remove_grid_row(&mut grid, row)?;
            println!("removed {} hour fact(s) from {}", removed, args.month);
        }
    }
    Ok(())
}
