//! Record service for rollcall.
//!
//! [`Registry`] enforces the domain rules (trimming, required fields, gender
//! normalization, avatar assignment) before delegating to the [`Store`].
//! It is the only entry point the web layer and the CLI use.

use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

use crate::avatar::AvatarPool;
use crate::error::{Error, Result};
use crate::storage::Store;
use crate::student::{ProfileForm, Student, StudentForm};

/// Validating front for the student store.
#[derive(Debug)]
pub struct Registry<R = StdRng> {
    store: Store,
    avatars: AvatarPool,
    rng: Mutex<R>,
}

impl Registry<StdRng> {
    /// Create a registry whose avatar choice is seeded from the OS.
    #[must_use]
    pub fn new(store: Store, avatars: AvatarPool) -> Self {
        Self::with_rng(store, avatars, StdRng::from_entropy())
    }
}

impl<R: Rng> Registry<R> {
    /// Create a registry with an explicit random source.
    #[must_use]
    pub fn with_rng(store: Store, avatars: AvatarPool, rng: R) -> Self {
        Self {
            store,
            avatars,
            rng: Mutex::new(rng),
        }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// The avatar pool used for new students.
    #[must_use]
    pub fn avatars(&self) -> &AvatarPool {
        &self.avatars
    }

    /// Validate `form`, assign an avatar, and store the new student.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] if a field is missing or the gender is invalid
    /// - [`Error::DuplicateRollNo`] if the roll number is taken
    /// - a storage error if the database fails
    pub fn add_student(&self, form: &StudentForm) -> Result<Student> {
        let (roll_no, details) = form.validate().inspect_err(|err| {
            warn!("Rejected new student: {}", err);
        })?;

        let avatar = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            self.avatars.assign(details.gender, &mut *rng)
        };

        let student = Student::new(roll_no, details, avatar);
        self.store.insert(&student)?;
        info!(
            "Added student {} ({}) with avatar {}",
            student.roll_no, student.gender, student.avatar
        );
        Ok(student)
    }

    /// Validate `form` and overwrite the editable fields of `roll_no`.
    ///
    /// The roll number and avatar are never changed.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] if a field is missing or the gender is invalid
    /// - [`Error::StudentNotFound`] if no student has this roll number
    /// - a storage error if the database fails
    pub fn edit_student(&self, roll_no: &str, form: &ProfileForm) -> Result<()> {
        let roll_no = roll_no.trim();
        let changes = form.validate().inspect_err(|err| {
            warn!("Rejected edit of student {}: {}", roll_no, err);
        })?;

        self.store.update(roll_no, &changes)
    }

    /// Delete a student. Succeeds whether or not the student existed.
    ///
    /// # Errors
    ///
    /// Returns an error only if the database fails.
    pub fn delete_student(&self, roll_no: &str) -> Result<()> {
        self.store.delete(roll_no.trim()).map(|_| ())
    }

    /// Every student, in the store's configured order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database fails.
    pub fn list_students(&self) -> Result<Vec<Student>> {
        self.store.list_all()
    }

    /// Look up one student.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StudentNotFound`] if absent, or a storage error.
    pub fn find_student(&self, roll_no: &str) -> Result<Student> {
        let roll_no = roll_no.trim();
        self.store
            .find(roll_no)?
            .ok_or_else(|| Error::student_not_found(roll_no))
    }
}
