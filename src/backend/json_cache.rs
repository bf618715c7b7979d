use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{Backend, BackendError, Snapshot};
use crate::domain::calendar::CalendarDate;
use crate::domain::person::Person;
use crate::domain::project::Project;
use crate::ident::Identifier;

const PROJECTS_FILE: &str = "projects.json";
const PEOPLE_FILE: &str = "people.json";
const HOURS_FILE: &str = "hours.json";

/// Flat-file store: one JSON document per collection, rewritten whole on
/// every change. A missing file reads as an empty collection.
pub struct JsonCacheBackend {
    root: PathBuf,
    state: Snapshot,
}

impl JsonCacheBackend {
    pub fn open(root: &Path) -> Result<Self, BackendError> {
        fs::create_dir_all(root)?;
        let state = Snapshot {
            projects: read_document(&root.join(PROJECTS_FILE))?.unwrap_or_default(),
            people: read_document(&root.join(PEOPLE_FILE))?.unwrap_or_default(),
            hours: read_document(&root.join(HOURS_FILE))?.unwrap_or_default(),
        };
        Ok(Self {
            root: root.to_path_buf(),
            state,
        })
    }

    fn flush_projects(&self) -> Result<(), BackendError> {
        write_document(&self.root.join(PROJECTS_FILE), &self.state.projects)
    }

    fn flush_people(&self) -> Result<(), BackendError> {
        write_document(&self.root.join(PEOPLE_FILE), &self.state.people)
    }

    fn flush_hours(&self) -> Result<(), BackendError> {
        write_document(&self.root.join(HOURS_FILE), &self.state.hours)
    }
}

impl Backend for JsonCacheBackend {
    fn kind(&self) -> &'static str {
        "json"
    }

    fn load_all(&mut self) -> Result<Snapshot, BackendError> {
        Ok(self.state.clone())
    }

    fn upsert_hour_fact(
        &mut self,
        date: CalendarDate,
        person_id: &Identifier,
        project_id: &Identifier,
        hours: f64,
    ) -> Result<(), BackendError> {
        self.state.hours.set_hours(date, person_id, project_id, hours);
        self.flush_hours()
    }

    fn delete_hour_fact(
        &mut self,
        date: CalendarDate,
        person_id: &Identifier,
        project_id: &Identifier,
    ) -> Result<(), BackendError> {
        self.state.hours.set_hours(date, person_id, project_id, 0.0);
        self.flush_hours()
    }

    fn delete_hour_facts_in_range(
        &mut self,
        person_id: &Identifier,
        project_id: &Identifier,
        start: CalendarDate,
        end: CalendarDate,
    ) -> Result<usize, BackendError> {
        let removed = self
            .state
            .hours
            .delete_pair_in_range(person_id, project_id, start, end);
        if removed > 0 {
            self.flush_hours()?;
        }
        Ok(removed)
    }

    fn create_project(&mut self, project: &Project) -> Result<(), BackendError> {
        upsert_by_id(&mut self.state.projects, project.clone(), |p| &p.id);
        self.flush_projects()
    }

    fn update_project(&mut self, project: &Project) -> Result<(), BackendError> {
        upsert_by_id(&mut self.state.projects, project.clone(), |p| &p.id);
        self.flush_projects()
    }

    fn delete_project(&mut self, id: &Identifier) -> Result<(), BackendError> {
        self.state.projects.retain(|project| &project.id != id);
        self.flush_projects()
    }

    fn create_person(&mut self, person: &Person) -> Result<(), BackendError> {
        upsert_by_id(&mut self.state.people, person.clone(), |p| &p.id);
        self.flush_people()
    }

    fn update_person(&mut self, person: &Person) -> Result<(), BackendError> {
        upsert_by_id(&mut self.state.people, person.clone(), |p| &p.id);
        self.flush_people()
    }

    fn delete_person(&mut self, id: &Identifier) -> Result<(), BackendError> {
        self.state.people.retain(|person| &person.id != id);
        self.flush_people()
    }
}

fn upsert_by_id<T, F>(items: &mut Vec<T>, item: T, id_of: F)
where
    F: Fn(&T) -> &Identifier,
{
    match items.iter_mut().find(|existing| id_of(existing) == id_of(&item)) {
        Some(existing) => *existing = item,
        None => items.push(item),
    }
}

fn read_document<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, BackendError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    let value = serde_json::from_reader(BufReader::new(file))?;
    Ok(Some(value))
}

fn write_document<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), BackendError> {
    let tmp = path.with_extension("json.tmp");
    {
        let mut file = File::create(&tmp)?;
        serde_json::to_writer_pretty(&mut file, value)?;
        file.write_all(b"\n")?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}
