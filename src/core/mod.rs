//! Core case types

pub mod case;

pub use case::{Case, Section, SectionType, section_id};
