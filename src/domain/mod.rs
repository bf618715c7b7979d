pub mod calendar;
pub mod person;
pub mod project;
