//! Storage layer for rollcall.
//!
//! This module provides `SQLite`-based persistent storage for student records.
//! It knows nothing about validation or avatars; callers hand it finished
//! [`Student`] values.

pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{ffi, params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::student::{Gender, Student, StudentChanges};

use self::schema::{SCHEMA_STATEMENTS, STUDENT_COLUMNS};

const SELECT_COLUMNS: &str =
    "SELECT roll_no, name, email, contact, gender, avatar, created_at FROM students";

/// Ordering used by [`Store::list_all`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListOrder {
    /// Most recently added first.
    #[default]
    Newest,
    /// Alphabetical by name, case-insensitive.
    Name,
}

impl ListOrder {
    fn order_by(self) -> &'static str {
        match self {
            Self::Newest => "ORDER BY created_at DESC, rowid DESC",
            Self::Name => "ORDER BY name COLLATE NOCASE ASC, roll_no ASC",
        }
    }
}

/// Handle to the students database.
///
/// The handle only remembers where the database lives. Every operation opens
/// its own connection and closes it before returning, so a `Store` is cheap
/// to share between threads.
#[derive(Debug, Clone)]
pub struct Store {
    /// Path to the database file.
    path: PathBuf,
    /// Ordering for listings.
    order: ListOrder,
}

impl Store {
    /// Open or create a students database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist,
    /// then runs [`Store::initialize`].
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let store = Self {
            path,
            order: ListOrder::default(),
        };

        // WAL is a property of the file, so setting it once is enough.
        store
            .connect()?
            .execute_batch("PRAGMA journal_mode=WAL;")?;
        store.initialize()?;

        info!("Database opened successfully at {}", store.path.display());
        Ok(store)
    }

    /// Use `order` for subsequent listings.
    #[must_use]
    pub fn with_order(mut self, order: ListOrder) -> Self {
        self.order = order;
        self
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the listing order.
    #[must_use]
    pub fn order(&self) -> ListOrder {
        self.order
    }

    fn connect(&self) -> Result<Connection> {
        debug!("Opening connection to {}", self.path.display());
        Connection::open(&self.path).map_err(|source| Error::DatabaseOpen {
            path: self.path.clone(),
            source,
        })
    }

    /// Ensure the students table and its indexes exist.
    ///
    /// Safe to call any number of times; existing rows are never touched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IncompatibleSchema`] if an existing `students` table
    /// lacks required columns, or an error if the database cannot be opened
    /// or a statement fails.
    pub fn initialize(&self) -> Result<()> {
        let conn = self.connect()?;
        self.check_existing_columns(&conn)?;
        for statement in SCHEMA_STATEMENTS {
            conn.execute(statement, [])?;
        }
        Ok(())
    }

    fn check_existing_columns(&self, conn: &Connection) -> Result<()> {
        let mut stmt = conn.prepare("SELECT name FROM pragma_table_info('students')")?;
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        if columns.is_empty() {
            return Ok(());
        }

        let missing: Vec<&str> = STUDENT_COLUMNS
            .iter()
            .copied()
            .filter(|column| !columns.iter().any(|existing| existing == *column))
            .collect();
        if missing.is_empty() {
            return Ok(());
        }

        Err(Error::IncompatibleSchema {
            path: self.path.clone(),
            missing: missing.join(", "),
        })
    }

    /// Get every student in the configured order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_all(&self) -> Result<Vec<Student>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} {}", self.order.order_by()))?;

        let students = stmt
            .query_map([], Self::row_to_student)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        debug!("Listed {} students", students.len());
        Ok(students)
    }

    /// Get a student by roll number.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn find(&self, roll_no: &str) -> Result<Option<Student>> {
        let conn = self.connect()?;
        let student = conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE roll_no = ?1"),
                [roll_no],
                Self::row_to_student,
            )
            .optional()?;
        Ok(student)
    }

    /// Insert a new student.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateRollNo`] if the roll number is taken, in
    /// which case nothing was written, or a storage error if the database
    /// operation fails.
    pub fn insert(&self, student: &Student) -> Result<()> {
        let conn = self.connect()?;
        let result = conn.execute(
            r"
            INSERT INTO students (roll_no, name, email, contact, gender, avatar, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
            params![
                student.roll_no,
                student.name,
                student.email,
                student.contact,
                student.gender.as_str(),
                student.avatar,
                format_timestamp(student.created_at),
            ],
        );

        match result {
            Ok(_) => {
                info!("Inserted student {}", student.roll_no);
                Ok(())
            }
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
            {
                debug!("Rejected duplicate roll number {}", student.roll_no);
                Err(Error::duplicate_roll_no(&student.roll_no))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Overwrite the editable fields of a student.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StudentNotFound`] if no row has this roll number, or
    /// a storage error if the database operation fails.
    pub fn update(&self, roll_no: &str, changes: &StudentChanges) -> Result<()> {
        let conn = self.connect()?;
        let affected = conn.execute(
            r"
            UPDATE students SET name = ?1, email = ?2, contact = ?3, gender = ?4
            WHERE roll_no = ?5
            ",
            params![
                changes.name,
                changes.email,
                changes.contact,
                changes.gender.as_str(),
                roll_no,
            ],
        )?;

        if affected == 0 {
            return Err(Error::student_not_found(roll_no));
        }
        info!("Updated student {}", roll_no);
        Ok(())
    }

    /// Delete a student by roll number.
    ///
    /// Returns `true` if a student was deleted, `false` if none existed.
    /// A missing roll number is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete(&self, roll_no: &str) -> Result<bool> {
        let conn = self.connect()?;
        let affected = conn.execute("DELETE FROM students WHERE roll_no = ?1", [roll_no])?;

        if affected > 0 {
            info!("Deleted student {}", roll_no);
        } else {
            debug!("Delete of unknown student {} was a no-op", roll_no);
        }
        Ok(affected > 0)
    }

    /// Count stored students.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self) -> Result<i64> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM students", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Convert a database row to a Student struct.
    fn row_to_student(row: &rusqlite::Row) -> rusqlite::Result<Student> {
        let gender_str: String = row.get(4)?;
        let created_at_str: String = row.get(6)?;

        let gender = gender_str.parse::<Gender>().map_err(|issue| {
            rusqlite::Error::FromSqlConversionFailure(4, Type::Text, issue.to_string().into())
        })?;
        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map_err(|err| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(err)))?
            .with_timezone(&Utc);

        Ok(Student {
            roll_no: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            contact: row.get(3)?,
            gender,
            avatar: row.get(5)?,
            created_at,
        })
    }
}

/// Fixed-width UTC timestamps so text order matches time order.
fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use tempfile::TempDir;

    use super::*;

    fn create_test_store() -> (TempDir, Store) {
        let dir = TempDir::new().expect("failed to create temp dir");
        let store = Store::open(dir.path().join("students.db")).expect("failed to open store");
        (dir, store)
    }

    fn create_test_student(roll_no: &str, name: &str) -> Student {
        Student::new(
            roll_no.to_string(),
            StudentChanges {
                name: name.to_string(),
                email: format!("{roll_no}@example.com"),
                contact: "555-0100".to_string(),
                gender: Gender::Male,
            },
            "profile_icons/Male/1.png".to_string(),
        )
    }

    #[test]
    fn test_insert_and_find() {
        let (_dir, store) = create_test_store();
        let student = create_test_student("101", "Ali Khan");

        store.insert(&student).unwrap();

        let found = store.find("101").unwrap().unwrap();
        assert_eq!(found.name, "Ali Khan");
        assert_eq!(found.gender, Gender::Male);
        assert_eq!(found.avatar, "profile_icons/Male/1.png");
        assert_eq!(
            found.created_at.timestamp_micros(),
            student.created_at.timestamp_micros()
        );
    }

    #[test]
    fn test_find_nonexistent() {
        let (_dir, store) = create_test_store();
        assert!(store.find("nope").unwrap().is_none());
    }

    #[test]
    fn test_insert_duplicate_leaves_row_unchanged() {
        let (_dir, store) = create_test_store();
        store.insert(&create_test_student("101", "First")).unwrap();

        let err = store
            .insert(&create_test_student("101", "Second"))
            .unwrap_err();

        assert!(err.is_duplicate());
        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.find("101").unwrap().unwrap().name, "First");
    }

    #[test]
    fn test_update() {
        let (_dir, store) = create_test_store();
        store.insert(&create_test_student("7", "Before")).unwrap();

        let changes = StudentChanges {
            name: "After".to_string(),
            email: "after@example.com".to_string(),
            contact: "555-9999".to_string(),
            gender: Gender::Female,
        };
        store.update("7", &changes).unwrap();

        let found = store.find("7").unwrap().unwrap();
        assert_eq!(found.details(), changes);
        assert_eq!(found.avatar, "profile_icons/Male/1.png");
    }

    #[test]
    fn test_update_nonexistent() {
        let (_dir, store) = create_test_store();
        let changes = create_test_student("x", "X").details();

        let err = store.update("missing", &changes).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_delete() {
        let (_dir, store) = create_test_store();
        store.insert(&create_test_student("1", "One")).unwrap();

        assert!(store.delete("1").unwrap());
        assert!(store.find("1").unwrap().is_none());
    }

    #[test]
    fn test_delete_nonexistent() {
        let (_dir, store) = create_test_store();
        store.insert(&create_test_student("1", "One")).unwrap();

        assert!(!store.delete("2").unwrap());
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_list_all_newest_first() {
        let (_dir, store) = create_test_store();
        let base = Utc::now();

        for (offset, roll_no) in [(0, "a"), (2, "c"), (1, "b")] {
            let mut student = create_test_student(roll_no, roll_no);
            student.created_at = base + Duration::seconds(offset);
            store.insert(&student).unwrap();
        }

        let rolls: Vec<String> = store
            .list_all()
            .unwrap()
            .into_iter()
            .map(|s| s.roll_no)
            .collect();
        assert_eq!(rolls, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_list_all_same_timestamp_uses_insertion_order() {
        let (_dir, store) = create_test_store();
        let at = Utc::now();

        for roll_no in ["first", "second"] {
            let mut student = create_test_student(roll_no, roll_no);
            student.created_at = at;
            store.insert(&student).unwrap();
        }

        let students = store.list_all().unwrap();
        assert_eq!(students[0].roll_no, "second");
        assert_eq!(students[1].roll_no, "first");
    }

    #[test]
    fn test_list_all_by_name() {
        let (_dir, store) = create_test_store();
        let store = store.with_order(ListOrder::Name);

        store.insert(&create_test_student("1", "zoe")).unwrap();
        store.insert(&create_test_student("2", "Adam")).unwrap();
        store.insert(&create_test_student("3", "mina")).unwrap();

        let names: Vec<String> = store
            .list_all()
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Adam", "mina", "zoe"]);
        assert_eq!(store.order(), ListOrder::Name);
    }

    #[test]
    fn test_list_all_empty() {
        let (_dir, store) = create_test_store();
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_reopen_keeps_data() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("students.db");

        Store::open(&path)
            .unwrap()
            .insert(&create_test_student("42", "Kept"))
            .unwrap();

        let reopened = Store::open(&path).unwrap();
        reopened.initialize().unwrap();
        assert_eq!(reopened.find("42").unwrap().unwrap().name, "Kept");
        assert_eq!(reopened.path(), path);
    }

    #[test]
    fn test_open_rejects_table_without_avatar_columns() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("students.db");
        Connection::open(&path)
            .unwrap()
            .execute_batch(
                "CREATE TABLE students (
                    roll_no TEXT PRIMARY KEY, name TEXT, email TEXT,
                    contact TEXT, gender TEXT, image TEXT
                );
                INSERT INTO students VALUES ('1', 'Old', 'o@x.y', '1', 'Male', 'a.png');",
            )
            .unwrap();

        let err = Store::open(&path).unwrap_err();
        match &err {
            Error::IncompatibleSchema { path: at, missing } => {
                assert_eq!(at, &path);
                assert_eq!(missing, "avatar, created_at");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.kind(), crate::error::ErrorKind::Storage);
        assert!(err.to_string().contains("incompatible students table"));

        let count: i64 = Connection::open(&path)
            .unwrap()
            .query_row("SELECT COUNT(*) FROM students", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("nested/deeper/students.db");

        let store = Store::open(&nested).unwrap();
        assert!(nested.exists());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_unicode_fields() {
        let (_dir, store) = create_test_store();
        store
            .insert(&create_test_student("u1", "Zoë Ñúñez 王"))
            .unwrap();

        assert_eq!(store.find("u1").unwrap().unwrap().name, "Zoë Ñúñez 王");
    }

    #[test]
    fn test_list_order_deserialize() {
        let order: ListOrder = serde_json::from_str("\"name\"").unwrap();
        assert_eq!(order, ListOrder::Name);
        assert_eq!(ListOrder::default(), ListOrder::Newest);
    }
}
