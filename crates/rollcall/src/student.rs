//! Core student types for rollcall.
//!
//! This module defines the stored [`Student`] record and the raw form inputs
//! it is built from. Forms are validated here; nothing unvalidated reaches
//! the storage layer.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Field, FieldIssue, ValidationError};

/// Gender of a student. Also selects the avatar pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Gender {
    /// Male.
    Male,
    /// Female.
    Female,
}

impl Gender {
    /// Every accepted gender, in display order.
    pub const ALL: [Self; 2] = [Self::Male, Self::Female];

    /// Canonical capitalized name, as stored in the database.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = FieldIssue;

    /// Case-insensitive, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(FieldIssue::Missing(Field::Gender));
        }
        Self::ALL
            .into_iter()
            .find(|gender| gender.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| FieldIssue::InvalidGender(trimmed.to_string()))
    }
}

/// A stored student record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    /// Unique, immutable roll number.
    pub roll_no: String,
    /// Full name.
    pub name: String,
    /// Email address (not format-checked).
    pub email: String,
    /// Contact number.
    pub contact: String,
    /// Gender.
    pub gender: Gender,
    /// Avatar URL or relative path, assigned at creation.
    pub avatar: String,
    /// When the record was inserted.
    pub created_at: DateTime<Utc>,
}

impl Student {
    /// Build a new record stamped with the current time.
    #[must_use]
    pub fn new(roll_no: String, details: StudentChanges, avatar: String) -> Self {
        Self {
            roll_no,
            name: details.name,
            email: details.email,
            contact: details.contact,
            gender: details.gender,
            avatar,
            created_at: Utc::now(),
        }
    }

    /// The mutable part of this record.
    #[must_use]
    pub fn details(&self) -> StudentChanges {
        StudentChanges {
            name: self.name.clone(),
            email: self.email.clone(),
            contact: self.contact.clone(),
            gender: self.gender,
        }
    }
}

/// Validated values for the editable fields of a student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentChanges {
    /// Full name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Contact number.
    pub contact: String,
    /// Gender.
    pub gender: Gender,
}

/// Raw input for creating a student.
///
/// Missing fields deserialize as empty strings so they are reported by
/// validation rather than by the form extractor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudentForm {
    /// Roll number.
    pub roll_no: String,
    /// Full name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Contact number.
    pub contact: String,
    /// Gender, any case.
    pub gender: String,
}

impl StudentForm {
    /// Trim and validate every field.
    ///
    /// Returns the trimmed roll number and the validated details.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] listing every rejected field.
    pub fn validate(&self) -> Result<(String, StudentChanges), ValidationError> {
        let mut issues = Vec::new();
        let roll_no = required(&mut issues, Field::RollNo, &self.roll_no);
        let details = validate_details(
            &mut issues,
            &self.name,
            &self.email,
            &self.contact,
            &self.gender,
        );

        match details {
            Some(details) if issues.is_empty() => Ok((roll_no, details)),
            _ => Err(ValidationError::new(issues)),
        }
    }
}

/// Raw input for editing a student. The roll number comes from the route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileForm {
    /// Full name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Contact number.
    pub contact: String,
    /// Gender, any case.
    pub gender: String,
}

impl ProfileForm {
    /// Trim and validate every field.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] listing every rejected field.
    pub fn validate(&self) -> Result<StudentChanges, ValidationError> {
        let mut issues = Vec::new();
        validate_details(
            &mut issues,
            &self.name,
            &self.email,
            &self.contact,
            &self.gender,
        )
        .filter(|_| issues.is_empty())
        .ok_or_else(|| ValidationError::new(issues))
    }
}

impl From<&Student> for ProfileForm {
    fn from(student: &Student) -> Self {
        Self {
            name: student.name.clone(),
            email: student.email.clone(),
            contact: student.contact.clone(),
            gender: student.gender.to_string(),
        }
    }
}

fn required(issues: &mut Vec<FieldIssue>, field: Field, value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        issues.push(FieldIssue::Missing(field));
    }
    trimmed.to_string()
}

fn validate_details(
    issues: &mut Vec<FieldIssue>,
    name: &str,
    email: &str,
    contact: &str,
    gender: &str,
) -> Option<StudentChanges> {
    let name = required(issues, Field::Name, name);
    let email = required(issues, Field::Email, email);
    let contact = required(issues, Field::Contact, contact);
    let gender = gender.parse::<Gender>().map_err(|issue| issues.push(issue)).ok()?;

    Some(StudentChanges {
        name,
        email,
        contact,
        gender,
    })
}
