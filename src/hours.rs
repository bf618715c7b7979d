use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::domain::calendar::{CalendarDate, YearMonth};
use crate::ident::Identifier;

pub type ProjectHours = BTreeMap<Identifier, f64>;
pub type PersonHours = BTreeMap<Identifier, ProjectHours>;

/// date -> person -> project -> hours. Zero is stored as absence and every
/// mutator ends in `prune_day`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct HoursStore {
    days: BTreeMap<CalendarDate, PersonHours>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourFact {
    pub date: CalendarDate,
    pub person_id: Identifier,
    pub project_id: Identifier,
    pub hours: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellWrite {
    Upserted(f64),
    Cleared,
}

pub fn positive_hours(value: f64) -> Option<f64> {
    if value.is_finite() && value > 0.0 {
        Some(value)
    } else {
        None
    }
}

/// Permissive numeric parse of a typed hour cell.
///
/// The longest leading prefix that reads as a number wins (`"4.5h"` is 4.5);
/// anything that does not yield a finite positive number is `None`.
pub fn normalize_hours(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let parsed = (1..=trimmed.len())
        .rev()
        .filter_map(|end| trimmed.get(..end))
        .find_map(|prefix| prefix.parse::<f64>().ok())?;
    positive_hours(parsed)
}

/// Hours from a loosely typed JSON value: numbers must be positive, strings
/// go through [`normalize_hours`], anything else is no hours.
pub fn hours_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64().and_then(positive_hours),
        Value::String(text) => normalize_hours(text),
        _ => None,
    }
}

impl HoursStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_facts<I>(facts: I) -> Self
    where
        I: IntoIterator<Item = HourFact>,
    {
        let mut store = Self::new();
        for fact in facts {
            store.set_hours(fact.date, &fact.person_id, &fact.project_id, fact.hours);
        }
        store
    }

    pub fn from_raw(raw: &Value) -> Self {
        let mut store = Self::new();
        let Some(dates) = raw.as_object() else {
            if !raw.is_null() {
                tracing::warn!("hours snapshot is not an object; starting empty");
            }
            return store;
        };

        for (date_key, people) in dates {
            let date = match date_key.parse::<CalendarDate>() {
                Ok(date) => date,
                Err(err) => {
                    tracing::warn!(
                        key = %date_key,
                        error = %err,
                        "skipping hours under invalid date key"
                    );
                    continue;
                }
            };
            let Some(people) = people.as_object() else {
                continue;
            };
            let day = store.days.entry(date).or_default();
            for (person_key, projects) in people {
                let (Some(person_id), Some(projects)) =
                    (Identifier::canonical(person_key), projects.as_object())
                else {
                    continue;
                };
                let logs = day.entry(person_id).or_default();
                for (project_key, value) in projects {
                    let Some(project_id) = Identifier::canonical(project_key) else {
                        continue;
                    };
                    if let Some(hours) = hours_from_value(value) {
                        logs.insert(project_id, hours);
                    }
                }
            }
        }

        store.prune();
        store
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn len(&self) -> usize {
        self.days
            .values()
            .flat_map(|people| people.values())
            .map(BTreeMap::len)
            .sum()
    }

    pub fn get(
        &self,
        date: CalendarDate,
        person_id: &Identifier,
        project_id: &Identifier,
    ) -> Option<f64> {
        self.days
            .get(&date)?
            .get(person_id)?
            .get(project_id)
            .copied()
    }

    #[cfg(test)]
    pub fn day(&self, date: CalendarDate) -> Option<&PersonHours> {
        self.days.get(&date)
    }

    pub fn set_hours(
        &mut self,
        date: CalendarDate,
        person_id: &Identifier,
        project_id: &Identifier,
        value: f64,
    ) -> CellWrite {
        let write = match positive_hours(value) {
            Some(hours) => {
                self.days
                    .entry(date)
                    .or_default()
                    .entry(person_id.clone())
                    .or_default()
                    .insert(project_id.clone(), hours);
                CellWrite::Upserted(hours)
            }
            None => {
                if let Some(logs) = self
                    .days
                    .get_mut(&date)
                    .and_then(|day| day.get_mut(person_id))
                {
                    logs.remove(project_id);
                }
                CellWrite::Cleared
            }
        };
        self.prune_date(date);
        write
    }

    pub fn delete_for_person_project_in_month(
        &mut self,
        month: YearMonth,
        person_id: &Identifier,
        project_id: &Identifier,
    ) -> usize {
        self.delete_pair_in_range(person_id, project_id, month.first_day(), month.last_day())
    }

    /// Inclusive on both ends.
    pub fn delete_pair_in_range(
        &mut self,
        person_id: &Identifier,
        project_id: &Identifier,
        start: CalendarDate,
        end: CalendarDate,
    ) -> usize {
        if start > end {
            return 0;
        }
        let dates = self
            .days
            .range(start..=end)
            .map(|(date, _)| *date)
            .collect::<Vec<_>>();

        let mut removed = 0usize;
        for date in dates {
            let hit = self
                .days
                .get_mut(&date)
                .and_then(|day| day.get_mut(person_id))
                .and_then(|logs| logs.remove(project_id));
            if hit.is_some() {
                removed += 1;
                self.prune_date(date);
            }
        }
        removed
    }

    pub fn replace(&mut self, snapshot: HoursStore) {
        self.days = snapshot.days;
        self.prune();
    }

    #[cfg(test)]
    pub fn facts(&self) -> impl Iterator<Item = HourFact> + '_ {
        self.days
            .iter()
            .flat_map(|(date, people)| facts_for_day(*date, people))
    }

    pub fn facts_in_month(&self, month: YearMonth) -> impl Iterator<Item = HourFact> + '_ {
        self.days
            .range(month.first_day()..=month.last_day())
            .flat_map(|(date, people)| facts_for_day(*date, people))
    }

    pub(crate) fn rewrite_person_logs<F>(&mut self, mut rewrite: F)
    where
        F: FnMut(CalendarDate, &Identifier, &mut ProjectHours),
    {
        for (date, people) in self.days.iter_mut() {
            for (person_id, logs) in people.iter_mut() {
                rewrite(*date, person_id, logs);
            }
        }
        self.prune();
    }

    fn prune(&mut self) {
        self.days.retain(|_, people| prune_day(people));
    }

    fn prune_date(&mut self, date: CalendarDate) {
        let keep = self.days.get_mut(&date).is_some_and(prune_day);
        if !keep {
            self.days.remove(&date);
        }
    }
}

fn prune_day(people: &mut PersonHours) -> bool {
    people.retain(|_, logs| {
        logs.retain(|_, hours| positive_hours(*hours).is_some());
        !logs.is_empty()
    });
    !people.is_empty()
}

fn facts_for_day(
    date: CalendarDate,
    people: &PersonHours,
) -> impl Iterator<Item = HourFact> + '_ {
    people.iter().flat_map(move |(person_id, logs)| {
        logs.iter().map(move |(project_id, hours)| HourFact {
            date,
            person_id: person_id.clone(),
            project_id: project_id.clone(),
            hours: *hours,
        })
    })
}

impl<'de> Deserialize<'de> for HoursStore {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        Ok(HoursStore::from_raw(&raw))
    }
}
