use serde::{Deserialize, Serialize};

use crate::domain::calendar::CalendarDate;
use crate::hours::HoursStore;
use crate::ident::Identifier;

/// Folds hours recorded under superseded project ids onto their replacement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyMigration {
    pub retired: Vec<Identifier>,
    pub replacement: Identifier,
}

impl KeyMigration {
    /// Project ids that were deleted and recreated while hours kept being
    /// logged against them.
    pub fn historical() -> Vec<KeyMigration> {
        vec![KeyMigration {
            retired: vec![Identifier::from(1u64), Identifier::from(1772212705262u64)],
            replacement: Identifier::from(1772214122148u64),
        }]
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MovedHours {
    pub date: CalendarDate,
    pub person_id: Identifier,
    pub from_project: Identifier,
    pub to_project: Identifier,
    pub hours: f64,
    pub merged_total: f64,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct MigrationReport {
    pub moved: Vec<MovedHours>,
}

impl MigrationReport {
    pub fn changed(&self) -> bool {
        !self.moved.is_empty()
    }

    pub fn hours_moved(&self) -> f64 {
        self.moved.iter().map(|entry| entry.hours).sum()
    }
}

/// Rejects rule sets that could keep moving hours on every run.
pub fn check_rules(rules: &[KeyMigration]) -> Result<(), String> {
    for rule in rules {
        for other in rules {
            if other.retired.contains(&rule.replacement) {
                return Err(format!(
                    "replacement id '{}' is also listed as retired",
                    rule.replacement
                ));
            }
        }
    }
    Ok(())
}

/// Moves every retired entry onto its replacement, adding to whatever the
/// replacement already holds. A second run finds no retired keys and changes
/// nothing.
pub fn migrate_legacy_keys(store: &mut HoursStore, rules: &[KeyMigration]) -> MigrationReport {
    let mut report = MigrationReport::default();
    if rules.is_empty() || store.is_empty() {
        return report;
    }

    store.rewrite_person_logs(|date, person_id, logs| {
        for rule in rules {
            for retired in &rule.retired {
                if *retired == rule.replacement {
                    continue;
                }
                let Some(hours) = logs.remove(retired) else {
                    continue;
                };
                let merged_total = logs.get(&rule.replacement).copied().unwrap_or(0.0) + hours;
                logs.insert(rule.replacement.clone(), merged_total);
                report.moved.push(MovedHours {
                    date,
                    person_id: person_id.clone(),
                    from_project: retired.clone(),
                    to_project: rule.replacement.clone(),
                    hours,
                    merged_total,
                });
            }
        }
    });

    if report.changed() {
        tracing::info!(
            entries = report.moved.len(),
            hours = report.hours_moved(),
            "migrated hours from retired project ids"
        );
    }
    report
}
