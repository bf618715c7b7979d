use std::error::Error;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::calendar::CalendarDate;
use crate::ident::Identifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ProjectStatus {
    Active,
    Inactive,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 2] = [ProjectStatus::Active, ProjectStatus::Inactive];

    pub fn as_str(self) -> &'static str {
        match self {
            ProjectStatus::Active => "active",
            ProjectStatus::Inactive => "inactive",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ProjectStatus::Active => ProjectStatus::Inactive,
            ProjectStatus::Inactive => ProjectStatus::Active,
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = ParseProjectStatusError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" | "ativo" => Ok(ProjectStatus::Active),
            "inactive" | "inativo" => Ok(ProjectStatus::Inactive),
            _ => Err(ParseProjectStatusError {
                value: value.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for ProjectStatus {
    type Error = ParseProjectStatusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ProjectStatus> for String {
    fn from(value: ProjectStatus) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseProjectStatusError {
    value: String,
}

impl fmt::Display for ParseProjectStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid project status '{}': expected one of {}",
            self.value,
            ProjectStatus::ALL
                .iter()
                .map(|status| status.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl Error for ParseProjectStatusError {}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Project {
    pub id: Identifier,
    pub name: String,
    #[serde(rename = "startDate", alias = "start_date")]
    pub start_date: CalendarDate,
    pub status: ProjectStatus,
}

impl Project {
    pub fn is_active(&self) -> bool {
        self.status == ProjectStatus::Active
    }
}

/// Validated fields for a project that does not have an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    pub name: String,
    pub start_date: CalendarDate,
    pub status: ProjectStatus,
}

impl NewProject {
    pub fn new(name: &str, start_date: CalendarDate, status: ProjectStatus) -> Option<Self> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            start_date,
            status,
        })
    }

    pub fn with_id(self, id: Identifier) -> Project {
        Project {
            id,
            name: self.name,
            start_date: self.start_date,
            status: self.status,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub start_date: Option<CalendarDate>,
    pub status: Option<ProjectStatus>,
}

impl ProjectPatch {
    pub fn has_changes(&self) -> bool {
        self.name.is_some() || self.start_date.is_some() || self.status.is_some()
    }

    pub fn apply_to(&self, project: &Project) -> Project {
        let mut next = project.clone();
        if let Some(name) = self.name.as_deref() {
            next.name = name.trim().to_string();
        }
        if let Some(start_date) = self.start_date {
            next.start_date = start_date;
        }
        if let Some(status) = self.status {
            next.status = status;
        }
        next
    }
}

pub fn find_project<'a>(projects: &'a [Project], id: &Identifier) -> Option<&'a Project> {
    projects.iter().find(|project| project.id == *id)
}

pub fn project_label(projects: &[Project], id: &Identifier) -> String {
    find_project(projects, id)
        .map_or_else(|| format!("Project {id}"), |project| project.name.clone())
}

#[cfg(test)]
mod tests {
    use super::{NewProject, Project, ProjectPatch, ProjectStatus};
    use crate::ident::Identifier;

    #[test]
    fn parses_statuses_and_legacy_labels() {
        assert_eq!(
            "Active".parse::<ProjectStatus>().unwrap(),
            ProjectStatus::Active
        );
        assert_eq!(
            "Ativo".parse::<ProjectStatus>().unwrap(),
            ProjectStatus::Active
        );
        assert_eq!(
            "inativo".parse::<ProjectStatus>().unwrap(),
            ProjectStatus::Inactive
        );
        assert!("paused".parse::<ProjectStatus>().is_err());
        assert_eq!(ProjectStatus::Active.toggled(), ProjectStatus::Inactive);
    }

    #[test]
    fn deserializes_cached_projects_with_numeric_ids() {
        let raw = r#"{"id": 2, "name": "Edificio Infinity", "startDate": "2024-01-15", "status": "Ativo"}"#;
        let project: Project = serde_json::from_str(raw).expect("project should parse");
        assert_eq!(project.id, Identifier::from(2u64));
        assert!(project.is_active());

        let written = serde_json::to_value(&project).expect("serialize");
        assert_eq!(written["status"], "active");
        assert_eq!(written["startDate"], "2024-01-15");
        assert_eq!(written["id"], "2");
    }

    #[test]
    fn new_projects_require_a_name() {
        let start = "2024-01-15".parse().expect("date");
        assert!(NewProject::new("   ", start, ProjectStatus::Active).is_none());
        let draft = NewProject::new(" Casa Uva ", start, ProjectStatus::Active).expect("valid");
        assert_eq!(draft.name, "Casa Uva");
    }

    #[test]
    fn patch_only_touches_provided_fields() {
        let start = "2023-11-01".parse().expect("date");
        let project = NewProject::new("Residencia Silva", start, ProjectStatus::Active)
            .expect("valid")
            .with_id(Identifier::from(1u64));
        let patch = ProjectPatch {
            status: Some(ProjectStatus::Inactive),
            ..ProjectPatch::default()
        };
        assert!(patch.has_changes());
        let next = patch.apply_to(&project);
        assert_eq!(next.name, "Residencia Silva");
        assert_eq!(next.status, ProjectStatus::Inactive);
        assert!(!ProjectPatch::default().has_changes());
    }
}
