//! `cbook` - CLI for contactbook
//!
//! One-shot subcommands log in, perform one session action against the
//! local database and exit. `cbook shell` keeps a session open.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;

use contactbook::cli::{
    write_detail, write_list, AddCommand, Cli, Command, ConfigCommand, EditCommand, ExportCommand,
    ImportCommand, ListCommand, Shell, ShowCommand,
};
use contactbook::store::IdPolicy;
use contactbook::transfer::{self, ImportOptions, TableFormat};
use contactbook::{init_logging, Config, Error, RecordStore, Session, SqliteStore};

type Store = RecordStore<SqliteStore>;

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    if let Command::Config(cmd) = cli.command {
        return handle_config(cli.config, cmd);
    }

    let config = Config::load_from(cli.config.clone())?;
    let database_path = config.database_path();
    let backend = SqliteStore::open(&database_path)
        .with_context(|| format!("opening {}", database_path.display()))?;
    let mut store = RecordStore::load_with_key(backend, config.storage.records_key.clone());
    let mut session = Session::with_view(
        config.auth.clone(),
        config.view.default_sort,
        config.view.default_group,
    );
    debug!(
        path = %database_path.display(),
        bytes = store.backend().size_bytes(),
        records = store.len(),
        "Opened address book"
    );

    if let Command::Shell = cli.command {
        let mut shell = Shell::new(session, &mut store, config.transfer.clone());
        shell.run(io::stdin().lock(), io::stdout().lock())?;
        return Ok(());
    }

    session.login(
        cli.email.as_deref().unwrap_or_default(),
        cli.password.as_deref().unwrap_or_default(),
    )?;

    match cli.command {
        Command::List(cmd) => handle_list(&mut session, &store, &cmd),
        Command::Show(cmd) => handle_show(&mut session, &store, &cmd),
        Command::Add(cmd) => handle_add(&mut session, &mut store, cmd),
        Command::Edit(cmd) => handle_edit(&mut session, &mut store, cmd),
        Command::Delete(cmd) => {
            let contact = store.get(cmd.id).cloned().ok_or(Error::ContactNotFound(cmd.id))?;
            session.select(contact)?;
            session.delete_selected(&mut store)?;
            println!("Deleted contact {}.", cmd.id);
            Ok(())
        }
        Command::Export(cmd) => handle_export(&config, &store, &cmd),
        Command::Import(cmd) => handle_import(&config, &mut store, &cmd),
        Command::Shell | Command::Config(_) => Ok(()),
    }
}

fn handle_list(session: &mut Session, store: &Store, cmd: &ListCommand) -> Result<()> {
    if let Some(search) = &cmd.search {
        session.set_search(search.as_str())?;
    }
    if let Some(sort) = cmd.sort {
        session.set_sort(sort.into())?;
    }
    if let Some(group) = cmd.group {
        session.set_group_filter(group.into())?;
    }
    let visible = session.visible(store)?;
    write_list(&mut io::stdout().lock(), &visible, cmd.format)?;
    Ok(())
}

fn handle_show(session: &mut Session, store: &Store, cmd: &ShowCommand) -> Result<()> {
    let contact = store.get(cmd.id).cloned().ok_or(Error::ContactNotFound(cmd.id))?;
    session.select(contact)?;
    if let Some(selected) = session.selected() {
        write_detail(&mut io::stdout().lock(), selected, cmd.json)?;
    }
    Ok(())
}

fn handle_add(session: &mut Session, store: &mut Store, cmd: AddCommand) -> Result<()> {
    session.create()?;
    let saved = session.submit(store, cmd.into_form())?;
    println!("Added contact {}.", saved.id);
    Ok(())
}

fn handle_edit(session: &mut Session, store: &mut Store, cmd: EditCommand) -> Result<()> {
    let contact = store.get(cmd.id).cloned().ok_or(Error::ContactNotFound(cmd.id))?;
    let mut form = contact.to_form();
    session.edit(contact)?;
    cmd.apply(&mut form);
    let saved = session.submit(store, form)?;
    println!("Updated contact {}.", saved.id);
    Ok(())
}

fn handle_export(config: &Config, store: &Store, cmd: &ExportCommand) -> Result<()> {
    let format = match cmd.format {
        Some(format) => format.into(),
        None => TableFormat::from_path(&cmd.file)?,
    };
    let count = transfer::export(store.all(), &cmd.file, format, &config.transfer.sheet_name)?;
    println!("Exported {count} contact(s) to {}.", cmd.file.display());
    Ok(())
}

fn handle_import(config: &Config, store: &mut Store, cmd: &ImportCommand) -> Result<()> {
    let format = match cmd.format {
        Some(format) => format.into(),
        None => TableFormat::from_path(&cmd.file)?,
    };
    let options = ImportOptions {
        id_policy: if cmd.fresh_ids {
            IdPolicy::Fresh
        } else {
            config.transfer.id_policy
        },
        strict: cmd.strict || config.transfer.strict_import,
    };
    let added = transfer::import(store, &cmd.file, format, options)?;
    println!("Imported {} contact(s) from {}.", added.len(), cmd.file.display());
    Ok(())
}

fn handle_config(path: Option<std::path::PathBuf>, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let mut config = Config::load_from(path)?;
            config.auth.password = "********".to_string();
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                let mut out = io::stdout().lock();
                writeln!(out, "Current Configuration")?;
                writeln!(out, "=====================")?;
                writeln!(out)?;
                writeln!(out, "[Storage]")?;
                writeln!(out, "  Database path:  {}", config.database_path().display())?;
                writeln!(out, "  Records key:    {}", config.storage.records_key)?;
                writeln!(out)?;
                writeln!(out, "[Auth]")?;
                writeln!(out, "  Email:          {}", config.auth.email)?;
                writeln!(out)?;
                writeln!(out, "[View]")?;
                writeln!(out, "  Default sort:   {}", config.view.default_sort)?;
                writeln!(out, "  Default group:  {}", config.view.default_group)?;
                writeln!(out)?;
                writeln!(out, "[Transfer]")?;
                writeln!(out, "  Id policy:      {:?}", config.transfer.id_policy)?;
                writeln!(out, "  Strict import:  {}", config.transfer.strict_import)?;
                writeln!(out, "  Sheet name:     {}", config.transfer.sheet_name)?;
            }
        }
        ConfigCommand::Path => {
            println!("{}", path.unwrap_or_else(Config::default_config_path).display());
        }
        ConfigCommand::Validate { file } => {
            let target = file.or(path);
            let shown = target.clone().unwrap_or_else(Config::default_config_path);
            Config::load_from(target)?;
            println!("Configuration is valid: {}", shown.display());
        }
    }
    Ok(())
}
