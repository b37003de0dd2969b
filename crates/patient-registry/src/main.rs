//! `ptreg` - CLI for the patient registry
//!
//! This binary opens the configured database, loads the registry, and runs
//! one command against it.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;

use patient_registry::cli::{
    AddCommand, Cli, Command, ConfigCommand, DeleteCommand, EditCommand, OutputFormat,
    SearchCommand, ShowCommand,
};
use patient_registry::{
    init_logging, Config, Error, PatientRecord, Registry, RegistryOptions, SearchScope,
    SearchView, SqliteStore, SyncState,
};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Config commands must work even when the config file is broken
    let command = match cli.command {
        Command::Config(config_cmd) => return handle_config(cli.config, config_cmd),
        command => command,
    };

    let config = Config::load_from(cli.config).context("failed to load configuration")?;
    let mut registry = open_registry(&config)?;

    match command {
        Command::Add(cmd) => handle_add(&mut registry, &cmd)?,
        Command::Edit(cmd) => handle_edit(&mut registry, &cmd)?,
        Command::Delete(cmd) => handle_delete(&mut registry, &cmd)?,
        Command::List(cmd) => {
            let mut view = SearchView::new();
            print_results(&mut view, &registry, cmd.format)?;
        }
        Command::Search(cmd) => handle_search(&registry, &config, &cmd)?,
        Command::Show(cmd) => handle_show(&registry, &cmd)?,
        Command::Status(cmd) => handle_status(&registry, cmd.json)?,
        Command::Config(_) => unreachable!("handled above"),
    }

    check_saved(&registry)
}

fn open_registry(config: &Config) -> anyhow::Result<Registry<SqliteStore>> {
    let path = config.database_path();
    let store = SqliteStore::open(&path)
        .with_context(|| format!("failed to open registry at {}", path.display()))?
        .with_quota(config.quota());
    Ok(Registry::load(store, RegistryOptions::from(config)))
}

/// A change that only reached memory is lost when the process exits.
fn check_saved(registry: &Registry<SqliteStore>) -> anyhow::Result<()> {
    if let SyncState::Failed { message } = registry.sync_state() {
        bail!("change was not saved: {message}");
    }
    Ok(())
}

fn handle_add(registry: &mut Registry<SqliteStore>, cmd: &AddCommand) -> anyhow::Result<()> {
    let record = registry.create(cmd.fields())?;
    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        println!("Registered patient {}: {}", record.id, record.display_name());
    }
    Ok(())
}

fn handle_edit(registry: &mut Registry<SqliteStore>, cmd: &EditCommand) -> anyhow::Result<()> {
    let current = registry
        .get(cmd.id)
        .ok_or_else(|| Error::patient_not_found(cmd.id))?
        .fields
        .clone();

    if cmd.is_noop() {
        println!("Nothing to change for patient {}.", cmd.id);
        return Ok(());
    }

    let record = registry
        .update(cmd.id, cmd.apply(&current))?
        .ok_or_else(|| Error::patient_not_found(cmd.id))?;
    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        println!("Updated patient {}: {}", record.id, record.display_name());
    }
    Ok(())
}

fn handle_delete(registry: &mut Registry<SqliteStore>, cmd: &DeleteCommand) -> anyhow::Result<()> {
    let Some(record) = registry.get(cmd.id) else {
        return Err(Error::patient_not_found(cmd.id).into());
    };

    if !cmd.yes {
        println!(
            "This will delete patient {}: {}.",
            record.id,
            record.display_name()
        );
        println!("Use --yes to confirm.");
        return Ok(());
    }

    let removed = registry
        .delete(cmd.id)
        .ok_or_else(|| Error::patient_not_found(cmd.id))?;
    println!("Deleted patient {}: {}", removed.id, removed.display_name());
    Ok(())
}

fn handle_search(
    registry: &Registry<SqliteStore>,
    config: &Config,
    cmd: &SearchCommand,
) -> anyhow::Result<()> {
    let scope = cmd
        .scope
        .map_or(config.registry.default_scope, SearchScope::from);
    let mut view = SearchView::new()
        .with_query(cmd.query.as_str())
        .with_scope(scope);

    if let Some(id) = cmd.select {
        if !view.select(id, registry) {
            eprintln!("Patient {id} is not among the results.");
        }
    }

    print_results(&mut view, registry, cmd.format)?;

    if cmd.format != OutputFormat::Json {
        if let Some(record) = view.selected_record(registry) {
            println!();
            print_detail(record);
        }
    }
    Ok(())
}

fn handle_show(registry: &Registry<SqliteStore>, cmd: &ShowCommand) -> anyhow::Result<()> {
    let record = registry
        .get(cmd.id)
        .ok_or_else(|| Error::patient_not_found(cmd.id))?;
    if cmd.json {
        println!("{}", serde_json::to_string_pretty(record)?);
    } else {
        print_detail(record);
    }
    Ok(())
}

fn handle_status(registry: &Registry<SqliteStore>, json: bool) -> anyhow::Result<()> {
    let store = registry.store();
    let stats = store.stats()?;
    let slot_bytes = store.slot_size(registry.slot_key())?;
    let synced = registry.sync_state().is_synced();

    if json {
        let status = serde_json::json!({
            "patients": registry.len(),
            "database_path": store.path(),
            "slot_key": registry.slot_key(),
            "slot_bytes": slot_bytes,
            "total_bytes": stats.total_bytes,
            "database_bytes": stats.db_size_bytes,
            "quota_bytes": stats.quota_bytes,
            "synced": synced,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("ptreg status");
        println!("------------");
        println!("Patients:      {}", registry.len());
        println!("Database:      {}", store.path().display());
        println!("Slot:          {}", registry.slot_key());
        match slot_bytes {
            Some(bytes) => println!("Slot size:     {bytes} bytes"),
            None => println!("Slot size:     (never saved)"),
        }
        match stats.quota_bytes {
            Some(quota) => println!("Quota:         {} of {quota} bytes", stats.total_bytes),
            None => println!("Quota:         unlimited"),
        }
        println!("Database file: {} bytes", stats.db_size_bytes);
        println!("Saved:         {}", if synced { "yes" } else { "no" });
    }
    Ok(())
}

fn handle_config(config_path: Option<PathBuf>, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = Config::load_from(config_path).context("failed to load configuration")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!("  Slot key:           {}", config.storage.slot_key);
                match config.quota() {
                    Some(quota) => println!("  Max slot bytes:     {quota}"),
                    None => println!("  Max slot bytes:     unlimited"),
                }
                println!();
                println!("[Registry]");
                println!("  Date format:        {}", config.registry.date_format);
                println!("  Default scope:      {}", config.registry.default_scope);
            }
        }
        ConfigCommand::Path => {
            println!(
                "{}",
                config_path
                    .unwrap_or_else(Config::default_config_path)
                    .display()
            );
        }
        ConfigCommand::Validate { file } => {
            let path = file
                .or(config_path)
                .unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => bail!("configuration error: {e}"),
            }
        }
    }
    Ok(())
}

fn print_results(
    view: &mut SearchView,
    registry: &Registry<SqliteStore>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let results = view.results(registry);

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    println!("{}", view.summary(registry));
    if results.is_empty() {
        return Ok(());
    }

    match format {
        OutputFormat::Plain => {
            for record in &results {
                println!(
                    "{}  {}  DNI {}",
                    record.id,
                    record.display_name(),
                    record.fields.national_id
                );
            }
        }
        OutputFormat::Table => print_table(&results),
        OutputFormat::Json => {}
    }
    Ok(())
}

fn print_table(records: &[PatientRecord]) {
    const HEADERS: [&str; 6] = ["ID", "NAME", "DNI", "AGE", "INSURANCE", "REGISTERED"];

    let rows: Vec<[String; 6]> = records
        .iter()
        .map(|record| {
            [
                record.id.to_string(),
                record.display_name(),
                record.fields.national_id.clone(),
                record.age().unwrap_or("-").to_string(),
                record.insurance_provider().unwrap_or("-").to_string(),
                record.registered_on.clone(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|header| header.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let render = |cells: &[&str]| {
        cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    println!("{}", render(&HEADERS));
    for row in &rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        println!("{}", render(&cells));
    }
}

fn print_detail(record: &PatientRecord) {
    println!("{}", record.full_name());
    println!("  ID:          {}", record.id);
    println!("  DNI:         {}", record.fields.national_id);
    println!("  Age:         {}", record.age().unwrap_or("-"));
    println!(
        "  Insurance:   {}",
        record.insurance_provider().unwrap_or("-")
    );
    println!("  Registered:  {}", record.registered_on);
    if let Some(notes) = record.notes() {
        println!("  Notes:");
        for line in notes.lines() {
            println!("    {line}");
        }
    }
}
