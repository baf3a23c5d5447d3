use std::io::{BufRead, Write};

use clap::Subcommand;
use hydrant_core::{Fixture, FixtureFields, FixtureId, FixtureStore, FixtureStoreError, FixtureType, Storage};

use crate::error::HydError;

#[derive(Debug, Subcommand)]
pub enum FixtureCommand {
    /// List fixtures in the order they were added
    List {
        /// Print the collection as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the fixture types that can be chosen
    Types,

    /// Add a new fixture
    Add {
        /// e.g. "Master Bathroom Sink"
        #[arg(long)]
        name: String,

        /// One of the types shown by `hyd fixture types`
        #[arg(long = "type")]
        fixture_type: FixtureType,

        /// e.g. "Second Floor"
        #[arg(long)]
        location: String,
    },

    /// Edit a fixture; omitted fields keep their current value
    Update {
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long = "type")]
        fixture_type: Option<FixtureType>,

        #[arg(long)]
        location: Option<String>,
    },

    /// Delete a fixture after confirmation
    Delete {
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

pub fn run<S: Storage>(
    store: &mut FixtureStore<S>,
    command: FixtureCommand,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<(), HydError> {
    match command {
        FixtureCommand::List { json } => {
            if json {
                serde_json::to_writer_pretty(&mut *out, store.list())?;
                writeln!(out)?;
            } else if store.is_empty() {
                writeln!(out, "No fixtures yet. Add one with `hyd fixture add`.")?;
            } else {
                for fixture in store.list() {
                    write_fixture(out, fixture)?;
                }
            }
        }
        FixtureCommand::Types => {
            for fixture_type in FixtureType::ALL {
                writeln!(out, "{:<16} ({})", fixture_type.label(), fixture_type.device_slug())?;
            }
        }
        FixtureCommand::Add {
            name,
            fixture_type,
            location,
        } => {
            let fixture = store.add(FixtureFields::new(name, fixture_type, location))?;
            writeln!(out, "Added {}", fixture.id())?;
        }
        FixtureCommand::Update {
            id,
            name,
            fixture_type,
            location,
        } => {
            let id = FixtureId::from(id);
            let mut fields = store
                .get(&id)
                .map(Fixture::fields)
                .ok_or_else(|| FixtureStoreError::NotFound(id.clone()))?;
            if let Some(name) = name {
                fields.name = name;
            }
            if let Some(fixture_type) = fixture_type {
                fields.fixture_type = fixture_type;
            }
            if let Some(location) = location {
                fields.location = location;
            }

            let fixture = store.update(&id, fields)?;
            write_fixture(out, &fixture)?;
        }
        FixtureCommand::Delete { id, yes } => {
            let id = FixtureId::from(id);
            let Some(fixture) = store.get(&id) else {
                writeln!(out, "No fixture {id}; nothing to delete.")?;
                return Ok(());
            };

            if !yes {
                write!(out, "Delete \"{}\" ({})? [y/N] ", fixture.name, fixture.location)?;
                out.flush()?;
                if !confirmed(input)? {
                    writeln!(out, "Cancelled.")?;
                    return Ok(());
                }
            }

            store.delete(&id)?;
            writeln!(out, "Deleted {id}")?;
        }
    }
    Ok(())
}

fn write_fixture(out: &mut impl Write, fixture: &Fixture) -> std::io::Result<()> {
    writeln!(
        out,
        "{}  {:<16} {}  @ {}",
        fixture.id(),
        fixture.fixture_type.label(),
        fixture.name,
        fixture.location
    )
}

fn confirmed(input: &mut impl BufRead) -> std::io::Result<bool> {
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
