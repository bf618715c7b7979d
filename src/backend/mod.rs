use std::error::Error;
use std::fmt;

use crate::domain::calendar::CalendarDate;
use crate::domain::person::Person;
use crate::domain::project::Project;
use crate::hours::HoursStore;
use crate::ident::Identifier;

pub mod json_cache;
pub mod sqlite;

pub use json_cache::JsonCacheBackend;
pub use sqlite::SqliteBackend;

/// Everything a session needs to start.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub projects: Vec<Project>,
    pub people: Vec<Person>,
    pub hours: HoursStore,
}

/// Durable home of projects, people and hour facts.
///
/// Calls are not retried; failures go back to the caller.
pub trait Backend {
    fn kind(&self) -> &'static str;

    fn load_all(&mut self) -> Result<Snapshot, BackendError>;

    fn upsert_hour_fact(
        &mut self,
        date: CalendarDate,
        person_id: &Identifier,
        project_id: &Identifier,
        hours: f64,
    ) -> Result<(), BackendError>;

    fn delete_hour_fact(
        &mut self,
        date: CalendarDate,
        person_id: &Identifier,
        project_id: &Identifier,
    ) -> Result<(), BackendError>;

    fn delete_hour_facts_in_range(
        &mut self,
        person_id: &Identifier,
        project_id: &Identifier,
        start: CalendarDate,
        end: CalendarDate,
    ) -> Result<usize, BackendError>;

    fn create_project(&mut self, project: &Project) -> Result<(), BackendError>;

    fn update_project(&mut self, project: &Project) -> Result<(), BackendError>;

    fn delete_project(&mut self, id: &Identifier) -> Result<(), BackendError>;

    fn create_person(&mut self, person: &Person) -> Result<(), BackendError>;

    fn update_person(&mut self, person: &Person) -> Result<(), BackendError>;

    fn delete_person(&mut self, id: &Identifier) -> Result<(), BackendError>;
}

#[derive(Debug)]
pub enum BackendError {
    Io(std::io::Error),
    Db(rusqlite::Error),
    Json(serde_json::Error),
    Corrupt(String),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::Io(err) => write!(f, "I/O error: {}", err),
            BackendError::Db(err) => write!(f, "database error: {}", err),
            BackendError::Json(err) => write!(f, "JSON error: {}", err),
            BackendError::Corrupt(message) => write!(f, "corrupt stored record: {}", message),
        }
    }
}

impl Error for BackendError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BackendError::Io(err) => Some(err),
            BackendError::Db(err) => Some(err),
            BackendError::Json(err) => Some(err),
            BackendError::Corrupt(_) => None,
        }
    }
}

impl From<std::io::Error> for BackendError {
    fn from(value: std::io::Error) -> Self {
        BackendError::Io(value)
    }
}

impl From<rusqlite::Error> for BackendError {
    fn from(value: rusqlite::Error) -> Self {
        BackendError::Db(value)
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(value: serde_json::Error) -> Self {
        BackendError::Json(value)
    }
}
