//! `rollcall` - A small student registry
//!
//! This library provides record validation, `SQLite` persistence, avatar
//! assignment and a server-rendered web UI for a list of students keyed by
//! roll number.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod avatar;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod registry;
pub mod storage;
pub mod student;
pub mod web;

pub use avatar::AvatarPool;
pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use logging::init_logging;
pub use registry::Registry;
pub use storage::{ListOrder, Store};
pub use student::{Gender, ProfileForm, Student, StudentForm};
