use std::error::Error;
use std::fmt;

use crate::aggregate::{summarize_month, MonthSummary};
use crate::backend::{Backend, BackendError, JsonCacheBackend, SqliteBackend};
use crate::config::{BackendKind, Config, ConfigError};
use crate::domain::calendar::{CalendarDate, CalendarError, YearMonth};
use crate::domain::person::{find_person, normalize_person_name, person_label, Person};
use crate::domain::project::{
    find_project, project_label, NewProject, ParseProjectStatusError, Project, ProjectPatch,
    ProjectStatus,
};
use crate::grid::{Grid, GridError, RowId};
use crate::hours::{normalize_hours, CellWrite, HoursStore};
use crate::ident::{generate_identifier, Identifier, IdentifierError};
use crate::migrate::{migrate_legacy_keys, KeyMigration, MigrationReport};
use crate::overtime::{first_violation, SaveOutcome};

/// Hour writes land in memory first and are then pushed to the backend; a
/// failed push is logged and counted but never rolled back.
pub struct Timesheet {
    backend: Box<dyn Backend>,
    legacy_keys: Vec<KeyMigration>,
    state: Option<SessionState>,
    unsynced: usize,
}

struct SessionState {
    projects: Vec<Project>,
    people: Vec<Person>,
    hours: HoursStore,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellOutcome {
    pub write: CellWrite,
    pub synced: bool,
}

impl Timesheet {
    pub fn open(backend: Box<dyn Backend>, config: &Config) -> Self {
        Self {
            backend,
            legacy_keys: config.legacy_keys.clone(),
            state: None,
            unsynced: 0,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let backend: Box<dyn Backend> = match config.backend {
            BackendKind::Sqlite => Box::new(SqliteBackend::open(&config.sqlite_path())?),
            BackendKind::Json => Box::new(JsonCacheBackend::open(&config.json_cache_dir())?),
        };
        Ok(Self::open(backend, config))
    }

    pub fn backend_kind(&self) -> &'static str {
        self.backend.kind()
    }

    pub fn load(&mut self) -> Result<MigrationReport, AppError> {
        let snapshot = self.backend.load_all()?;
        let mut hours = HoursStore::new();
        hours.replace(snapshot.hours);
        let report = migrate_legacy_keys(&mut hours, &self.legacy_keys);
        tracing::info!(
            backend = self.backend.kind(),
            projects = snapshot.projects.len(),
            people = snapshot.people.len(),
            facts = hours.len(),
            "timesheet loaded"
        );
        self.state = Some(SessionState {
            projects: snapshot.projects,
            people: snapshot.people,
            hours,
        });
        self.write_back_migration(&report);
        Ok(report)
    }

    pub fn is_loaded(&self) -> bool {
        self.state.is_some()
    }

    pub fn dispose(&mut self) {
        self.state = None;
        self.unsynced = 0;
    }

    pub fn unsynced_writes(&self) -> usize {
        self.unsynced
    }

    pub fn projects(&self) -> Result<&[Project], AppError> {
        Ok(&self.state()?.projects)
    }

    pub fn people(&self) -> Result<&[Person], AppError> {
        Ok(&self.state()?.people)
    }

    pub fn hours(&self) -> Result<&HoursStore, AppError> {
        Ok(&self.state()?.hours)
    }

    pub fn active_projects(&self) -> Result<Vec<&Project>, AppError> {
        Ok(self
            .projects()?
            .iter()
            .filter(|project| project.is_active())
            .collect())
    }

    pub fn person_name(&self, id: &Identifier) -> Result<String, AppError> {
        Ok(person_label(self.people()?, id))
    }

    pub fn project_name(&self, id: &Identifier) -> Result<String, AppError> {
        Ok(project_label(self.projects()?, id))
    }

    pub fn add_project(
        &mut self,
        name: &str,
        start_date: CalendarDate,
        status: ProjectStatus,
    ) -> Result<Project, AppError> {
        let input = NewProject::new(name, start_date, status)
            .ok_or_else(|| AppError::InvalidArgument("project name is required".to_string()))?;
        let projects = self.projects()?;
        let id = generate_identifier(|candidate| find_project(projects, candidate).is_some());
        let project = input.with_id(id);
        self.backend.create_project(&project)?;
        self.state_mut()?.projects.push(project.clone());
        Ok(project)
    }

    pub fn update_project(
        &mut self,
        id: &Identifier,
        patch: &ProjectPatch,
    ) -> Result<Project, AppError> {
        if !patch.has_changes() {
            return Err(AppError::InvalidArgument(
                "update requires at least one field".to_string(),
            ));
        }
        if patch
            .name
            .as_deref()
            .is_some_and(|name| name.trim().is_empty())
        {
            return Err(AppError::InvalidArgument(
                "project name is required".to_string(),
            ));
        }
        let current = find_project(self.projects()?, id)
            .ok_or_else(|| AppError::NotFound(format!("project '{}'", id)))?;
        let next = patch.apply_to(current);
        self.backend.update_project(&next)?;
        self.replace_project(next.clone())?;
        Ok(next)
    }

    pub fn set_project_status(
        &mut self,
        id: &Identifier,
        status: ProjectStatus,
    ) -> Result<Project, AppError> {
        self.update_project(
            id,
            &ProjectPatch {
                status: Some(status),
                ..ProjectPatch::default()
            },
        )
    }

    pub fn toggle_project_status(&mut self, id: &Identifier) -> Result<Project, AppError> {
        let current = find_project(self.projects()?, id)
            .ok_or_else(|| AppError::NotFound(format!("project '{}'", id)))?;
        let next = current.status.toggled();
        self.set_project_status(id, next)
    }

    /// Hour facts logged against the project stay in place and simply drop
    /// out of reports.
    pub fn delete_project(&mut self, id: &Identifier) -> Result<Project, AppError> {
        let position = self
            .projects()?
            .iter()
            .position(|project| project.id == *id)
            .ok_or_else(|| AppError::NotFound(format!("project '{}'", id)))?;
        self.backend.delete_project(id)?;
        Ok(self.state_mut()?.projects.remove(position))
    }

    pub fn add_person(&mut self, name: &str) -> Result<Person, AppError> {
        let name = normalize_person_name(name)
            .ok_or_else(|| AppError::InvalidArgument("person name is required".to_string()))?;
        let people = self.people()?;
        let id = generate_identifier(|candidate| find_person(people, candidate).is_some());
        let person = Person { id, name };
        self.backend.create_person(&person)?;
        self.state_mut()?.people.push(person.clone());
        Ok(person)
    }

    pub fn rename_person(&mut self, id: &Identifier, name: &str) -> Result<Person, AppError> {
        let name = normalize_person_name(name)
            .ok_or_else(|| AppError::InvalidArgument("person name is required".to_string()))?;
        let current = find_person(self.people()?, id)
            .ok_or_else(|| AppError::NotFound(format!("person '{}'", id)))?;
        let next = Person {
            id: current.id.clone(),
            name,
        };
        self.backend.update_person(&next)?;
        let state = self.state_mut()?;
        if let Some(slot) = state.people.iter_mut().find(|person| person.id == *id) {
            *slot = next.clone();
        }
        Ok(next)
    }

    pub fn delete_person(&mut self, id: &Identifier) -> Result<Person, AppError> {
        let position = self
            .people()?
            .iter()
            .position(|person| person.id == *id)
            .ok_or_else(|| AppError::NotFound(format!("person '{}'", id)))?;
        self.backend.delete_person(id)?;
        Ok(self.state_mut()?.people.remove(position))
    }

    pub fn set_hours(
        &mut self,
        date: CalendarDate,
        person_id: &Identifier,
        project_id: &Identifier,
        value: f64,
    ) -> Result<CellOutcome, AppError> {
        let state = self.state.as_mut().ok_or(AppError::NotLoaded)?;
        let existed = state.hours.get(date, person_id, project_id).is_some();
        let write = state.hours.set_hours(date, person_id, project_id, value);
        let synced = self.push_cell(date, person_id, project_id, write, existed);
        Ok(CellOutcome { write, synced })
    }

    pub fn set_hours_text(
        &mut self,
        date: CalendarDate,
        person_id: &Identifier,
        project_id: &Identifier,
        raw: &str,
    ) -> Result<CellOutcome, AppError> {
        self.set_hours(
            date,
            person_id,
            project_id,
            normalize_hours(raw).unwrap_or(0.0),
        )
    }

    pub fn remove_row_hours(
        &mut self,
        month: YearMonth,
        person_id: &Identifier,
        project_id: &Identifier,
    ) -> Result<usize, AppError> {
        let state = self.state.as_mut().ok_or(AppError::NotLoaded)?;
        let removed = state
            .hours
            .delete_for_person_project_in_month(month, person_id, project_id);
        if let Err(err) = self.backend.delete_hour_facts_in_range(
            person_id,
            project_id,
            month.first_day(),
            month.last_day(),
        ) {
            self.record_sync_failure("delete month range", &err);
        }
        Ok(removed)
    }

    pub fn month_summary(&self, month: YearMonth) -> Result<MonthSummary, AppError> {
        let state = self.state()?;
        Ok(summarize_month(
            month,
            &state.projects,
            &state.people,
            &state.hours,
        ))
    }

    pub fn load_grid(&self, month: YearMonth) -> Result<Grid, AppError> {
        let state = self.state()?;
        let mut grid = Grid::load(&state.hours, month);
        grid.retain_known(|person_id, project_id| {
            find_person(&state.people, person_id).is_some()
                && find_project(&state.projects, project_id).is_some()
        });
        Ok(grid)
    }

    pub fn commit_grid(&mut self, grid: &Grid) -> Result<SaveOutcome, AppError> {
        let warning = first_violation(grid);
        let writes = grid.commit_writes();
        let mut cells_written = 0usize;
        let unsynced_before = self.unsynced;

        for write in writes {
            let state = self.state.as_mut().ok_or(AppError::NotLoaded)?;
            let existed = state
                .hours
                .get(write.date, &write.person_id, &write.project_id)
                .is_some();
            let effect =
                state
                    .hours
                    .set_hours(write.date, &write.person_id, &write.project_id, write.hours);
            cells_written += 1;
            self.push_cell(
                write.date,
                &write.person_id,
                &write.project_id,
                effect,
                existed,
            );
        }

        if let Some(warning) = &warning {
            tracing::info!(
                person_id = %warning.person_id,
                day = warning.day,
                total = warning.total,
                "daily hours limit exceeded"
            );
        }
        Ok(SaveOutcome {
            month: grid.month(),
            cells_written,
            cells_unsynced: self.unsynced - unsynced_before,
            warning,
        })
    }

    /// Drops a grid row and, for a complete row, deletes the pair's hours for
    /// the grid month right away.
    pub fn remove_grid_row(&mut self, grid: &mut Grid, row: RowId) -> Result<usize, AppError> {
        if !self.is_loaded() {
            return Err(AppError::NotLoaded);
        }
        match grid.remove_row(row)? {
            Some(removal) => {
                self.remove_row_hours(removal.month, &removal.person_id, &removal.project_id)
            }
            None => Ok(0),
        }
    }

    pub fn run_migration(&mut self) -> Result<MigrationReport, AppError> {
        let state = self.state.as_mut().ok_or(AppError::NotLoaded)?;
        let report = migrate_legacy_keys(&mut state.hours, &self.legacy_keys);
        self.write_back_migration(&report);
        Ok(report)
    }

    fn write_back_migration(&mut self, report: &MigrationReport) {
        for moved in &report.moved {
            if let Err(err) =
                self.backend
                    .delete_hour_fact(moved.date, &moved.person_id, &moved.from_project)
            {
                self.record_sync_failure("delete retired fact", &err);
            }
            if let Err(err) = self.backend.upsert_hour_fact(
                moved.date,
                &moved.person_id,
                &moved.to_project,
                moved.merged_total,
            ) {
                self.record_sync_failure("upsert merged fact", &err);
            }
        }
    }

    fn push_cell(
        &mut self,
        date: CalendarDate,
        person_id: &Identifier,
        project_id: &Identifier,
        write: CellWrite,
        existed: bool,
    ) -> bool {
        let result = match write {
            CellWrite::Upserted(hours) => {
                tracing::debug!(%date, %person_id, %project_id, hours, "upsert hour fact");
                self.backend
                    .upsert_hour_fact(date, person_id, project_id, hours)
            }
            CellWrite::Cleared if existed => {
                tracing::debug!(%date, %person_id, %project_id, "delete hour fact");
                self.backend.delete_hour_fact(date, person_id, project_id)
            }
            CellWrite::Cleared => Ok(()),
        };
        match result {
            Ok(()) => true,
            Err(err) => {
                self.record_sync_failure("hour fact write", &err);
                false
            }
        }
    }

    fn record_sync_failure(&mut self, action: &str, err: &BackendError) {
        self.unsynced += 1;
        tracing::warn!(
            backend = self.backend.kind(),
            action,
            error = %err,
            "backend write failed; keeping in-memory value"
        );
    }

    fn replace_project(&mut self, next: Project) -> Result<(), AppError> {
        let state = self.state_mut()?;
        if let Some(slot) = state
            .projects
            .iter_mut()
            .find(|project| project.id == next.id)
        {
            *slot = next;
        }
        Ok(())
    }

    fn state(&self) -> Result<&SessionState, AppError> {
        self.state.as_ref().ok_or(AppError::NotLoaded)
    }

    fn state_mut(&mut self) -> Result<&mut SessionState, AppError> {
        self.state.as_mut().ok_or(AppError::NotLoaded)
    }
}

#[derive(Debug)]
pub enum AppError {
    Io(std::io::Error),
    Backend(BackendError),
    Config(ConfigError),
    Calendar(CalendarError),
    Grid(GridError),
    ParseStatus(ParseProjectStatusError),
    Identifier(IdentifierError),
    InvalidArgument(String),
    NotFound(String),
    NotLoaded,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Io(err) => write!(f, "I/O error: {}", err),
            AppError::Backend(err) => write!(f, "backend error: {}", err),
            AppError::Config(err) => write!(f, "{}", err),
            AppError::Calendar(err) => write!(f, "{}", err),
            AppError::Grid(err) => write!(f, "{}", err),
            AppError::ParseStatus(err) => write!(f, "{}", err),
            AppError::Identifier(err) => write!(f, "{}", err),
            AppError::InvalidArgument(message) => write!(f, "{}", message),
            AppError::NotFound(what) => write!(f, "{} not found", what),
            AppError::NotLoaded => write!(f, "timesheet is not loaded"),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AppError::Io(err) => Some(err),
            AppError::Backend(err) => Some(err),
            AppError::Config(err) => Some(err),
            AppError::Calendar(err) => Some(err),
            AppError::Grid(err) => Some(err),
            AppError::ParseStatus(err) => Some(err),
            AppError::Identifier(err) => Some(err),
            AppError::InvalidArgument(_) => None,
            AppError::NotFound(_) => None,
            AppError::NotLoaded => None,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        AppError::Io(value)
    }
}

impl From<BackendError> for AppError {
    fn from(value: BackendError) -> Self {
        AppError::Backend(value)
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        AppError::Config(value)
    }
}

impl From<CalendarError> for AppError {
    fn from(value: CalendarError) -> Self {
        AppError::Calendar(value)
    }
}

impl From<GridError> for AppError {
    fn from(value: GridError) -> Self {
        AppError::Grid(value)
    }
}

impl From<ParseProjectStatusError> for AppError {
    fn from(value: ParseProjectStatusError) -> Self {
        AppError::ParseStatus(value)
    }
}

impl From<IdentifierError> for AppError {
    fn from(value: IdentifierError) -> Self {
        AppError::Identifier(value)
    }
}


#[cfg(test)]
mod tests_error_paths;
