//! `rollcall` - CLI for the student registry
//!
//! This binary runs the web UI and offers the same record operations from
//! the command line.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use clap::Parser;

use rollcall::cli::{Cli, Command, ConfigCommand, ListCommand, OutputFormat, ShowCommand};
use rollcall::config::AvatarSource;
use rollcall::{init_logging, web, AvatarPool, Config, Registry, Store, Student};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let mut config = Config::load_from(cli.config.clone())?;

    match cli.command {
        Command::Serve(serve_cmd) => {
            if let Some(bind) = serve_cmd.bind {
                config.server.bind_addr = bind;
                config.validate()?;
            }
            let registry = open_registry(&config)?;
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(web::serve(registry, &config))?;
        }
        Command::Add(add_cmd) => {
            let student = open_registry(&config)?.add_student(&add_cmd.to_form())?;
            println!("Added student {} ({})", student.roll_no, student.name);
        }
        Command::List(list_cmd) => handle_list(&open_registry(&config)?, &list_cmd)?,
        Command::Show(show_cmd) => handle_show(&open_registry(&config)?, &show_cmd)?,
        Command::Edit(edit_cmd) => {
            open_registry(&config)?.edit_student(&edit_cmd.roll_no, &edit_cmd.to_form())?;
            println!("Updated student {}", edit_cmd.roll_no.trim());
        }
        Command::Delete(delete_cmd) => {
            open_registry(&config)?.delete_student(&delete_cmd.roll_no)?;
            println!("Deleted student {}", delete_cmd.roll_no.trim());
        }
        Command::Config(config_cmd) => handle_config(&config, config_cmd)?,
    }
    Ok(())
}

fn open_registry(config: &Config) -> rollcall::Result<Registry> {
    let store = Store::open(config.database_path())?.with_order(config.storage.list_order);
    let avatars = AvatarPool::from_config(&config.avatars)?;
    Ok(Registry::new(store, avatars))
}

fn handle_list(registry: &Registry, cmd: &ListCommand) -> Result<(), Box<dyn std::error::Error>> {
    let students = registry.list_students()?;

    match cmd.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&students)?),
        OutputFormat::Table => print_table(&students),
    }
    Ok(())
}

fn print_table(students: &[Student]) {
    if students.is_empty() {
        println!("No students yet.");
        return;
    }

    let roll_w = column_width(students.iter().map(|s| s.roll_no.as_str()), "ROLL NO");
    let name_w = column_width(students.iter().map(|s| s.name.as_str()), "NAME");
    let email_w = column_width(students.iter().map(|s| s.email.as_str()), "EMAIL");
    let contact_w = column_width(students.iter().map(|s| s.contact.as_str()), "CONTACT");

    println!(
        "{:roll_w$}  {:name_w$}  {:email_w$}  {:contact_w$}  GENDER",
        "ROLL NO", "NAME", "EMAIL", "CONTACT"
    );
    for student in students {
        println!(
            "{:roll_w$}  {:name_w$}  {:email_w$}  {:contact_w$}  {}",
            student.roll_no, student.name, student.email, student.contact, student.gender
        );
    }
}

fn column_width<'a>(values: impl Iterator<Item = &'a str>, header: &str) -> usize {
    values
        .map(|value| value.chars().count())
        .fold(header.len(), usize::max)
}

fn handle_show(registry: &Registry, cmd: &ShowCommand) -> Result<(), Box<dyn std::error::Error>> {
    let student = registry.find_student(&cmd.roll_no)?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&student)?);
    } else {
        println!("Roll No:  {}", student.roll_no);
        println!("Name:     {}", student.name);
        println!("Email:    {}", student.email);
        println!("Contact:  {}", student.contact);
        println!("Gender:   {}", student.gender);
        println!("Avatar:   {}", student.avatar);
        println!("Added:    {}", student.created_at.to_rfc3339());
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!("  List order:         {:?}", config.storage.list_order);
                println!();
                println!("[Server]");
                println!("  Bind address:       {}", config.server.bind_addr);
                println!(
                    "  Secret key:         {}",
                    if config.server.secret_key.is_some() {
                        "set"
                    } else {
                        "not set (random per process)"
                    }
                );
                println!("  Static dir:         {}", config.server.static_dir.display());
                println!();
                println!("[Avatars]");
                match config.avatars.source {
                    AvatarSource::Remote => {
                        println!("  Source:             remote");
                        println!("  Base URL:           {}", config.avatars.remote_base_url);
                        println!(
                            "  Images:             {} male, {} female",
                            config.avatars.male_count, config.avatars.female_count
                        );
                    }
                    AvatarSource::Local => {
                        println!("  Source:             local");
                        println!("  Directory:          {}", config.avatars.local_dir.display());
                        println!("  URL prefix:         {}", config.avatars.url_prefix);
                    }
                }
                println!("  Fallback:           {}", config.avatars.fallback);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
