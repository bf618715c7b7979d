use serde::{Deserialize, Serialize};

use crate::ident::Identifier;

/// A team member who logs hours ("architect" in the office vocabulary).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Person {
    pub id: Identifier,
    pub name: String,
}

pub fn normalize_person_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn find_person<'a>(people: &'a [Person], id: &Identifier) -> Option<&'a Person> {
    people.iter().find(|person| person.id == *id)
}

pub fn person_label(people: &[Person], id: &Identifier) -> String {
    find_person(people, id).map_or_else(|| format!("Person {id}"), |person| person.name.clone())
}
