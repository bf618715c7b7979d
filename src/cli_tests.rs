use clap::Parser;

use super::{Cli, Commands, GridSubcommands, PersonSubcommands, ProjectSubcommands};
use crate::config::BackendKind;
use crate::domain::project::ProjectStatus;
use crate::ident::Identifier;

fn parse(args: &[&str]) -> Cli {
    Cli::parse_from(args)
}

#[test]
fn project_add_parses_typed_date_and_legacy_status() {
    let cli = parse(&[
        "hourbook",
        "project",
        "add",
        "Casa Uva",
        "--start",
        "2024-01-15",
        "--status",
        "inativo",
    ]);
    match cli.command {
        Commands::Project(args) => match args.command {
            ProjectSubcommands::Add(add) => {
                assert_eq!(add.name, "Casa Uva");
                assert_eq!(add.start_date.to_string(), "2024-01-15");
                assert_eq!(add.status, ProjectStatus::Inactive);
            }
            other => panic!("expected Add, got {:?}", other),
        },
        other => panic!("expected Project, got {:?}", other),
    }
}

#[test]
fn project_add_defaults_to_active() {
    let cli = parse(&["hourbook", "project", "add", "X", "--start", "2024-01-15"]);
    match cli.command {
        Commands::Project(args) => match args.command {
            ProjectSubcommands::Add(add) => assert_eq!(add.status, ProjectStatus::Active),
            other => panic!("expected Add, got {:?}", other),
        },
        other => panic!("expected Project, got {:?}", other),
    }
}

#[test]
fn invalid_dates_are_rejected_at_parse_time() {
    let result = Cli::try_parse_from([
        "hourbook",
        "project",
        "add",
        "X",
        "--start",
        "2024-02-30",
    ]);
    assert!(result.is_err());
}

#[test]
fn global_flags_apply_after_the_subcommand() {
    let cli = parse(&[
        "hourbook",
        "person",
        "ls",
        "--json",
        "--backend",
        "json",
        "--data-dir",
        "/tmp/hb",
        "-vv",
    ]);
    assert_eq!(cli.backend, Some(BackendKind::Json));
    assert_eq!(
        cli.data_dir.as_deref(),
        Some(std::path::Path::new("/tmp/hb"))
    );
    assert_eq!(cli.verbose, 2);
    match cli.command {
        Commands::Person(args) => match args.command {
            PersonSubcommands::Ls(flag) => assert!(flag.json),
            other => panic!("expected Ls, got {:?}", other),
        },
        other => panic!("expected Person, got {:?}", other),
    }
}

#[test]
fn log_keeps_hours_as_raw_text() {
    let cli = parse(&["hourbook", "log", "2024-02-05", "1", "1772214122148", "4.5h"]);
    match cli.command {
        Commands::Log(args) => {
            assert_eq!(args.person, Identifier::from(1u64));
            assert_eq!(args.project, Identifier::from(1772214122148u64));
            assert_eq!(args.hours, "4.5h");
        }
        other => panic!("expected Log, got {:?}", other),
    }
}

#[test]
fn grid_show_month_is_optional() {
    let cli = parse(&["hourbook", "grid", "show"]);
    match cli.command {
        Commands::Grid(args) => match args.command {
            GridSubcommands::Show(show) => assert!(show.month.is_none()),
            other => panic!("expected Show, got {:?}", other),
        },
        other => panic!("expected Grid, got {:?}", other),
    }

    let cli = parse(&["hourbook", "grid", "rm", "2024-02", "1", "2"]);
    match cli.command {
        Commands::Grid(args) => match args.command {
            GridSubcommands::Rm(rm) => {
                assert_eq!(rm.month.to_string(), "2024-02");
                assert_eq!(rm.project, Identifier::from(2u64));
            }
            other => panic!("expected Rm, got {:?}", other),
        },
        other => panic!("expected Grid, got {:?}", other),
    }
}

#[test]
fn project_ls_filters_active_on_request() {
    let cli = parse(&["hourbook", "project", "ls", "--active"]);
    match cli.command {
        Commands::Project(args) => match args.command {
            ProjectSubcommands::Ls(ls) => {
                assert!(ls.active);
                assert!(!ls.json);
            }
            other => panic!("expected Ls, got {:?}", other),
        },
        other => panic!("expected Project, got {:?}", other),
    }
}

#[test]
fn grid_set_takes_a_single_cell() {
    let cli = parse(&["hourbook", "grid", "set", "2024-02", "1", "10", "5", "7.5", "--json"]);
    match cli.command {
        Commands::Grid(args) => match args.command {
            GridSubcommands::Set(set) => {
                assert_eq!(set.person, Identifier::from(1u64));
                assert_eq!(set.project, Identifier::from(10u64));
                assert_eq!(set.day, 5);
                assert_eq!(set.hours, "7.5");
                assert!(set.json);
            }
            other => panic!("expected Set, got {:?}", other),
        },
        other => panic!("expected Grid, got {:?}", other),
    }

    let result = Cli::try_parse_from([
        "hourbook", "grid", "set", "2024-02", "1", "10", "day", "1",
    ]);
    assert!(result.is_err());
}
