use std::path::Path;

use rusqlite::Connection;

use super::{Backend, BackendError, Snapshot};
use crate::db::{self, HourFactRecord, PersonRecord, ProjectRecord};
use crate::domain::calendar::CalendarDate;
use crate::domain::person::Person;
use crate::domain::project::Project;
use crate::hours::{HourFact, HoursStore};
use crate::ident::Identifier;

pub struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    pub fn open(path: &Path) -> Result<Self, BackendError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = db::open_connection(&path.display().to_string())?;
        Ok(Self { conn })
    }
}

impl Backend for SqliteBackend {
    fn kind(&self) -> &'static str {
        "sqlite"
    }

    fn load_all(&mut self) -> Result<Snapshot, BackendError> {
        let projects = db::list_projects(&self.conn)?
            .into_iter()
            .map(project_from_record)
            .collect::<Result<Vec<_>, _>>()?;
        let people = db::list_people(&self.conn)?
            .into_iter()
            .map(person_from_record)
            .collect::<Result<Vec<_>, _>>()?;

        let mut facts = Vec::new();
        for record in db::list_hour_facts(&self.conn)? {
            match fact_from_record(&record) {
                Some(fact) => facts.push(fact),
                None => tracing::warn!(
                    work_date = %record.work_date,
                    person_id = %record.person_id,
                    project_id = %record.project_id,
                    "skipping unreadable hour fact row"
                ),
            }
        }

        Ok(Snapshot {
            projects,
            people,
            hours: HoursStore::from_facts(facts),
        })
    }

    fn upsert_hour_fact(
        &mut self,
        date: CalendarDate,
        person_id: &Identifier,
        project_id: &Identifier,
        hours: f64,
    ) -> Result<(), BackendError> {
        db::upsert_hour_fact(
            &self.conn,
            &HourFactRecord {
                work_date: date.to_string(),
                person_id: person_id.to_string(),
                project_id: project_id.to_string(),
                hours,
            },
        )?;
        Ok(())
    }

    fn delete_hour_fact(
        &mut self,
        date: CalendarDate,
        person_id: &Identifier,
        project_id: &Identifier,
    ) -> Result<(), BackendError> {
        db::delete_hour_fact(
            &self.conn,
            &date.to_string(),
            person_id.as_str(),
            project_id.as_str(),
        )?;
        Ok(())
    }

    fn delete_hour_facts_in_range(
        &mut self,
        person_id: &Identifier,
        project_id: &Identifier,
        start: CalendarDate,
        end: CalendarDate,
    ) -> Result<usize, BackendError> {
        let removed = db::delete_hour_facts_in_range(
            &self.conn,
            person_id.as_str(),
            project_id.as_str(),
            &start.to_string(),
            &end.to_string(),
        )?;
        Ok(removed)
    }

    fn create_project(&mut self, project: &Project) -> Result<(), BackendError> {
        db::upsert_project(&self.conn, &project_record(project))?;
        Ok(())
    }

    fn update_project(&mut self, project: &Project) -> Result<(), BackendError> {
        db::upsert_project(&self.conn, &project_record(project))?;
        Ok(())
    }

    fn delete_project(&mut self, id: &Identifier) -> Result<(), BackendError> {
        db::delete_project(&self.conn, id.as_str())?;
        Ok(())
    }

    fn create_person(&mut self, person: &Person) -> Result<(), BackendError> {
        db::upsert_person(&self.conn, &person_record(person))?;
        Ok(())
    }

    fn update_person(&mut self, person: &Person) -> Result<(), BackendError> {
        db::upsert_person(&self.conn, &person_record(person))?;
        Ok(())
    }

    fn delete_person(&mut self, id: &Identifier) -> Result<(), BackendError> {
        db::delete_person(&self.conn, id.as_str())?;
        Ok(())
    }
}

fn project_record(project: &Project) -> ProjectRecord {
    ProjectRecord {
        id: project.id.to_string(),
        name: project.name.clone(),
        start_date: project.start_date.to_string(),
        status: project.status.as_str().to_string(),
    }
}

fn person_record(person: &Person) -> PersonRecord {
    PersonRecord {
        id: person.id.to_string(),
        name: person.name.clone(),
    }
}

fn project_from_record(record: ProjectRecord) -> Result<Project, BackendError> {
    let corrupt = |detail: String| BackendError::Corrupt(format!("project '{}': {}", record.id, detail));
    let id = Identifier::canonical(&record.id).ok_or_else(|| corrupt("empty id".to_string()))?;
    let start_date = record
        .start_date
        .parse()
        .map_err(|err| corrupt(format!("{err}")))?;
    let status = record
        .status
        .parse()
        .map_err(|err| corrupt(format!("{err}")))?;
    Ok(Project {
        id,
        name: record.name,
        start_date,
        status,
    })
}

fn person_from_record(record: PersonRecord) -> Result<Person, BackendError> {
    let id = Identifier::canonical(&record.id)
        .ok_or_else(|| BackendError::Corrupt("person with empty id".to_string()))?;
    Ok(Person {
        id,
        name: record.name,
    })
}

fn fact_from_record(record: &HourFactRecord) -> Option<HourFact> {
    Some(HourFact {
        date: record.work_date.parse().ok()?,
        person_id: Identifier::canonical(&record.person_id)?,
        project_id: Identifier::canonical(&record.project_id)?,
        hours: record.hours,
    })
}
