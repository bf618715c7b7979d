use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::domain::calendar::YearMonth;
use crate::domain::person::{person_label, Person};
use crate::domain::project::{project_label, Project};
use crate::hours::HoursStore;
use crate::ident::Identifier;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PairTotal {
    pub person_id: Identifier,
    pub project_id: Identifier,
    pub hours: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PersonTotal {
    pub person_id: Identifier,
    pub hours: f64,
}

/// Month totals over facts whose person and project both still exist.
///
/// Every list is in first-seen order over the store's date/person/project
/// ordering, so identical input always yields identical output.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MonthSummary {
    pub month: YearMonth,
    pub pair_totals: Vec<PairTotal>,
    pub person_totals: Vec<PersonTotal>,
    pub grand_total: f64,
    pub people: Vec<Identifier>,
    pub projects: Vec<Identifier>,
}

pub fn summarize_month(
    month: YearMonth,
    projects: &[Project],
    people: &[Person],
    store: &HoursStore,
) -> MonthSummary {
    let known_people = people.iter().map(|person| &person.id).collect::<HashSet<_>>();
    let known_projects = projects
        .iter()
        .map(|project| &project.id)
        .collect::<HashSet<_>>();

    let mut pair_totals: Vec<PairTotal> = Vec::new();
    let mut pair_index: HashMap<(Identifier, Identifier), usize> = HashMap::new();
    let mut person_totals: Vec<PersonTotal> = Vec::new();
    let mut person_index: HashMap<Identifier, usize> = HashMap::new();
    let mut project_axis: Vec<Identifier> = Vec::new();
    let mut grand_total = 0.0;

    for fact in store.facts_in_month(month) {
        if !known_people.contains(&fact.person_id) || !known_projects.contains(&fact.project_id) {
            continue;
        }

        let pair_key = (fact.person_id.clone(), fact.project_id.clone());
        match pair_index.get(&pair_key) {
            Some(&index) => pair_totals[index].hours += fact.hours,
            None => {
                pair_index.insert(pair_key, pair_totals.len());
                pair_totals.push(PairTotal {
                    person_id: fact.person_id.clone(),
                    project_id: fact.project_id.clone(),
                    hours: fact.hours,
                });
            }
        }

        match person_index.get(&fact.person_id) {
            Some(&index) => person_totals[index].hours += fact.hours,
            None => {
                person_index.insert(fact.person_id.clone(), person_totals.len());
                person_totals.push(PersonTotal {
                    person_id: fact.person_id.clone(),
                    hours: fact.hours,
                });
            }
        }

        if !project_axis.contains(&fact.project_id) {
            project_axis.push(fact.project_id.clone());
        }
        grand_total += fact.hours;
    }

    let people_axis = person_totals
        .iter()
        .map(|total| total.person_id.clone())
        .collect();

    MonthSummary {
        month,
        pair_totals,
        person_totals,
        grand_total,
        people: people_axis,
        projects: project_axis,
    }
}

impl MonthSummary {
    pub fn pair_total(&self, person_id: &Identifier, project_id: &Identifier) -> Option<f64> {
        self.pair_totals
            .iter()
            .find(|total| total.person_id == *person_id && total.project_id == *project_id)
            .map(|total| total.hours)
    }

    pub fn person_total(&self, person_id: &Identifier) -> Option<f64> {
        self.person_totals
            .iter()
            .find(|total| total.person_id == *person_id)
            .map(|total| total.hours)
    }

    pub fn is_empty(&self) -> bool {
        self.pair_totals.is_empty()
    }

    /// Labelled series for a per-person bar chart (one dataset per project)
    /// and a per-person pie chart.
    pub fn charts(&self, projects: &[Project], people: &[Person]) -> MonthCharts {
        let labels = self
            .people
            .iter()
            .map(|id| person_label(people, id))
            .collect::<Vec<_>>();

        let datasets = self
            .projects
            .iter()
            .map(|project_id| BarDataset {
                project_id: project_id.clone(),
                label: project_label(projects, project_id),
                data: self
                    .people
                    .iter()
                    .map(|person_id| self.pair_total(person_id, project_id).unwrap_or(0.0))
                    .collect(),
            })
            .collect();

        MonthCharts {
            month: self.month,
            total_hours: self.grand_total,
            bar: BarChart {
                labels: labels.clone(),
                datasets,
            },
            pie: PieChart {
                labels,
                data: self.person_totals.iter().map(|total| total.hours).collect(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BarDataset {
    pub project_id: Identifier,
    pub label: String,
    pub data: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BarChart {
    pub labels: Vec<String>,
    pub datasets: Vec<BarDataset>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PieChart {
    pub labels: Vec<String>,
    pub data: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MonthCharts {
    pub month: YearMonth,
    pub total_hours: f64,
    pub bar: BarChart,
    pub pie: PieChart,
}

#[cfg(test)]
mod tests;
