//! `SQLite` schema definitions for rollcall.
//!
//! Every statement is `IF NOT EXISTS`, so running the whole list against an
//! existing database leaves its data untouched.

/// SQL statement to create the students table.
pub const CREATE_STUDENTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS students (
    roll_no TEXT PRIMARY KEY NOT NULL CHECK (length(roll_no) > 0),
    name TEXT NOT NULL CHECK (length(name) > 0),
    email TEXT NOT NULL CHECK (length(email) > 0),
    contact TEXT NOT NULL CHECK (length(contact) > 0),
    gender TEXT NOT NULL CHECK (gender IN ('Male', 'Female')),
    avatar TEXT NOT NULL,
    created_at TEXT NOT NULL
)
";

/// Columns every existing `students` table must have.
pub const STUDENT_COLUMNS: &[&str] = &[
    "roll_no",
    "name",
    "email",
    "contact",
    "gender",
    "avatar",
    "created_at",
];

/// SQL statement to create an index on `created_at` for the default listing.
pub const CREATE_CREATED_AT_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_students_created_at ON students(created_at DESC)
";

/// SQL statement to create an index on `name` for the alphabetical listing.
pub const CREATE_NAME_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_students_name ON students(name)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_STUDENTS_TABLE,
    CREATE_CREATED_AT_INDEX,
    CREATE_NAME_INDEX,
];
