use std::collections::{BTreeMap, HashMap};
use std::error::Error;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::calendar::{CalendarDate, YearMonth};
use crate::hours::{hours_from_value, normalize_hours, positive_hours, HoursStore};
use crate::ident::{self, Identifier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowId(Uuid);

impl RowId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RowId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl Serialize for RowId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// One person+project line of the month editor with an hour cell per day.
/// A row missing either id is a draft and never reaches the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridRow {
    #[serde(skip_deserializing)]
    pub row_id: RowId,
    #[serde(default, deserialize_with = "ident::deserialize_optional")]
    pub person_id: Option<Identifier>,
    #[serde(default, deserialize_with = "ident::deserialize_optional")]
    pub project_id: Option<Identifier>,
    #[serde(default, deserialize_with = "lenient_hours_by_day")]
    pub hours_by_day: BTreeMap<u8, f64>,
}

impl GridRow {
    pub fn draft() -> Self {
        Self {
            row_id: RowId::new(),
            person_id: None,
            project_id: None,
            hours_by_day: BTreeMap::new(),
        }
    }

    pub fn pair(&self) -> Option<(&Identifier, &Identifier)> {
        match (&self.person_id, &self.project_id) {
            (Some(person_id), Some(project_id)) => Some((person_id, project_id)),
            _ => None,
        }
    }

    pub fn is_draft(&self) -> bool {
        self.pair().is_none()
    }

    pub fn hours_on(&self, day: u8) -> f64 {
        self.hours_by_day.get(&day).copied().unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.hours_by_day.values().sum()
    }
}

/// Cells that are not a day number or not positive hours are dropped, the
/// same as clearing them in the editor.
fn lenient_hours_by_day<'de, D>(deserializer: D) -> Result<BTreeMap<u8, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(day, value)| {
            let day = day.trim().parse::<u8>().ok()?;
            Some((day, hours_from_value(&value)?))
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridEdit {
    SetPerson { row: RowId, value: String },
    SetProject { row: RowId, value: String },
    SetHours { row: RowId, day: u8, value: String },
}

/// A cell the commit pass writes back; `hours == 0.0` clears the cell.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingWrite {
    pub date: CalendarDate,
    pub person_id: Identifier,
    pub project_id: Identifier,
    pub hours: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowRemoval {
    pub month: YearMonth,
    pub person_id: Identifier,
    pub project_id: Identifier,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grid {
    month: YearMonth,
    rows: Vec<GridRow>,
}

impl Grid {
    /// One row per person/project pair that has hours in `month`, in
    /// first-seen order; a single draft row when the month is empty.
    pub fn load(store: &HoursStore, month: YearMonth) -> Self {
        let mut rows: Vec<GridRow> = Vec::new();
        let mut index: HashMap<(Identifier, Identifier), usize> = HashMap::new();

        for fact in store.facts_in_month(month) {
            let key = (fact.person_id.clone(), fact.project_id.clone());
            let position = *index.entry(key).or_insert_with(|| {
                rows.push(GridRow {
                    row_id: RowId::new(),
                    person_id: Some(fact.person_id.clone()),
                    project_id: Some(fact.project_id.clone()),
                    hours_by_day: BTreeMap::new(),
                });
                rows.len() - 1
            });
            rows[position].hours_by_day.insert(fact.date.day(), fact.hours);
        }

        let mut grid = Self { month, rows };
        if grid.rows.is_empty() {
            grid.add_row();
        }
        grid
    }

    pub fn from_rows(month: YearMonth, rows: Vec<GridRow>) -> Self {
        let days = month.days_in_month();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.hours_by_day
                    .retain(|day, hours| (1..=days).contains(day) && positive_hours(*hours).is_some());
                row
            })
            .collect();
        Self { month, rows }
    }

    /// Drops complete rows whose person or project is no longer known. Their
    /// facts stay in the store, out of the editor and its overtime check.
    pub fn retain_known<F>(&mut self, is_known: F)
    where
        F: Fn(&Identifier, &Identifier) -> bool,
    {
        self.rows.retain(|row| {
            row.pair()
                .map_or(true, |(person_id, project_id)| is_known(person_id, project_id))
        });
        if self.rows.is_empty() {
            self.add_row();
        }
    }

    pub fn month(&self) -> YearMonth {
        self.month
    }

    pub fn rows(&self) -> &[GridRow] {
        &self.rows
    }

    pub fn row(&self, row: RowId) -> Option<&GridRow> {
        self.rows.iter().find(|candidate| candidate.row_id == row)
    }

    pub fn add_row(&mut self) -> RowId {
        let row = GridRow::draft();
        let row_id = row.row_id;
        self.rows.push(row);
        row_id
    }

    pub fn set_person(&mut self, row: RowId, value: &str) -> Result<(), GridError> {
        self.row_mut(row)?.person_id = Identifier::canonical(value);
        Ok(())
    }

    pub fn set_project(&mut self, row: RowId, value: &str) -> Result<(), GridError> {
        self.row_mut(row)?.project_id = Identifier::canonical(value);
        Ok(())
    }

    pub fn set_hours(&mut self, row: RowId, day: u8, value: &str) -> Result<(), GridError> {
        let month = self.month;
        if !(1..=month.days_in_month()).contains(&day) {
            return Err(GridError::DayOutOfRange { month, day });
        }
        let target = self.row_mut(row)?;
        match normalize_hours(value) {
            Some(hours) => {
                target.hours_by_day.insert(day, hours);
            }
            None => {
                target.hours_by_day.remove(&day);
            }
        }
        Ok(())
    }

    pub fn apply(&mut self, edit: GridEdit) -> Result<(), GridError> {
        match edit {
            GridEdit::SetPerson { row, value } => self.set_person(row, &value),
            GridEdit::SetProject { row, value } => self.set_project(row, &value),
            GridEdit::SetHours { row, day, value } => self.set_hours(row, day, &value),
        }
    }

    /// Drops a row from the buffer. A complete row yields the month-wide
    /// deletion the caller must apply so a later commit cannot bring it back.
    pub fn remove_row(&mut self, row: RowId) -> Result<Option<RowRemoval>, GridError> {
        let position = self
            .rows
            .iter()
            .position(|candidate| candidate.row_id == row)
            .ok_or(GridError::UnknownRow(row))?;
        let removed = self.rows.remove(position);
        Ok(removed.pair().map(|(person_id, project_id)| RowRemoval {
            month: self.month,
            person_id: person_id.clone(),
            project_id: project_id.clone(),
        }))
    }

    pub fn find_pair(&self, person_id: &Identifier, project_id: &Identifier) -> Option<RowId> {
        self.rows
            .iter()
            .find(|row| row.pair() == Some((person_id, project_id)))
            .map(|row| row.row_id)
    }

    /// Every day of the month for every complete row. Empty days are written
    /// as zero so cleared cells delete their stored facts.
    pub fn commit_writes(&self) -> Vec<PendingWrite> {
        let mut writes = Vec::new();
        for row in &self.rows {
            let Some((person_id, project_id)) = row.pair() else {
                continue;
            };
            for day in self.month.days() {
                let Ok(date) = self.month.date(day) else {
                    continue;
                };
                writes.push(PendingWrite {
                    date,
                    person_id: person_id.clone(),
                    project_id: project_id.clone(),
                    hours: row.hours_on(day),
                });
            }
        }
        writes
    }

    fn row_mut(&mut self, row: RowId) -> Result<&mut GridRow, GridError> {
        self.rows
            .iter_mut()
            .find(|candidate| candidate.row_id == row)
            .ok_or(GridError::UnknownRow(row))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    UnknownRow(RowId),
    DayOutOfRange { month: YearMonth, day: u8 },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::UnknownRow(row) => write!(f, "grid row '{}' not found", row),
            GridError::DayOutOfRange { month, day } => {
                write!(f, "day {} is outside {}", day, month)
            }
        }
    }
}

impl Error for GridError {}
