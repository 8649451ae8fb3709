//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::student::{ProfileForm, StudentForm};

/// Serve command arguments.
#[derive(Debug, Args)]
pub struct ServeCommand {
    /// Address to listen on (overrides `server.bind_addr`)
    #[arg(short, long, value_name = "ADDR")]
    pub bind: Option<String>,
}

/// Student fields as positional arguments.
#[derive(Debug, Args)]
pub struct AddCommand {
    /// Unique roll number
    pub roll_no: String,
    /// Full name
    pub name: String,
    /// Email address
    pub email: String,
    /// Contact number
    pub contact: String,
    /// Male or Female (any case)
    pub gender: String,
}

impl AddCommand {
    /// The arguments as an unvalidated form.
    #[must_use]
    pub fn to_form(&self) -> StudentForm {
        StudentForm {
            roll_no: self.roll_no.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            contact: self.contact.clone(),
            gender: self.gender.clone(),
        }
    }
}

/// Edit command arguments.
#[derive(Debug, Args)]
pub struct EditCommand {
    /// Roll number of the student to edit
    pub roll_no: String,
    /// New full name
    pub name: String,
    /// New email address
    pub email: String,
    /// New contact number
    pub contact: String,
    /// New gender, Male or Female (any case)
    pub gender: String,
}

impl EditCommand {
    /// The new values as an unvalidated form.
    #[must_use]
    pub fn to_form(&self) -> ProfileForm {
        ProfileForm {
            name: self.name.clone(),
            email: self.email.clone(),
            contact: self.contact.clone(),
            gender: self.gender.clone(),
        }
    }
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Show command arguments.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Roll number to look up
    pub roll_no: String,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Delete command arguments.
#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Roll number to delete
    pub roll_no: String,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show configuration file path
    Path,

    /// Validate configuration file
    Validate {
        /// Path to config file (uses default if not specified)
        file: Option<PathBuf>,
    },
}

/// Output format for listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned text table
    #[default]
    Table,
    /// JSON array
    Json,
}
