//! Command dispatch for the interactive Pokedex
//!
//! Maps each verb typed at the prompt to a handler. Handlers share a
//! [`Session`] that owns the API client, the caught-Pokemon store, the
//! location-area pagination cursors and the output writer.

use std::collections::HashMap;
use std::io::{self, Write};

use futures::future::LocalBoxFuture;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::debug;

use crate::data::{ApiError, PokeApiClient};
use crate::store::Pokedex;

/// Base experience that halves the catch chance
const CATCH_DIFFICULTY: f64 = 50.0;

/// Errors a command can report back to the prompt
#[derive(Debug, Error)]
pub enum CommandError {
    /// A PokeAPI request failed
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Writing to the terminal failed
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

/// What the input loop should do after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub type CommandResult = Result<Flow, CommandError>;

/// A command handler; receives the arguments that followed the verb
pub type Handler<W> =
    for<'a> fn(&'a mut Session<W>, &'a [String]) -> LocalBoxFuture<'a, CommandResult>;

/// A registered command
pub struct Command<W> {
    pub name: &'static str,
    pub description: &'static str,
    handler: Handler<W>,
}

/// Cursor state for paging through location areas with `map`/`mapb`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pagination {
    /// URL of the page after the one last shown
    pub next: Option<String>,
    /// URL of the page before the one last shown
    pub previous: Option<String>,
    /// Whether any page has been shown yet
    pub started: bool,
}

/// Probability of catching a Pokemon with the given base experience
///
/// `1 / (base_experience / 50 + 1)`: always 1.0 at zero experience, falling
/// towards zero for strong Pokemon.
pub fn catch_chance(base_experience: u32) -> f64 {
    1.0 / (f64::from(base_experience) / CATCH_DIFFICULTY + 1.0)
}

/// Returns true if a roll drawn from `[0, 1)` catches at the given chance
pub fn is_caught(roll: f64, chance: f64) -> bool {
    roll <= chance
}

/// Interactive state shared by all commands
pub struct Session<W> {
    client: PokeApiClient,
    pokedex: Pokedex,
    pagination: Pagination,
    rng: StdRng,
    out: W,
    commands: HashMap<&'static str, Command<W>>,
}

impl<W: Write> Session<W> {
    /// Creates a session writing to `out`, with catch rolls seeded from the OS
    pub fn new(client: PokeApiClient, pokedex: Pokedex, out: W) -> Self {
        Self::with_rng(client, pokedex, out, StdRng::from_entropy())
    }

    /// Creates a session with a caller-supplied random number generator
    pub fn with_rng(client: PokeApiClient, pokedex: Pokedex, out: W, rng: StdRng) -> Self {
        Self {
            client,
            pokedex,
            pagination: Pagination::default(),
            rng,
            out,
            commands: registry(),
        }
    }

    pub fn pokedex(&self) -> &Pokedex {
        &self.pokedex
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    pub fn output(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Runs the command named by the first token
    ///
    /// Unknown verbs print a hint and keep the session going.
    pub async fn dispatch(&mut self, tokens: &[String]) -> CommandResult {
        let Some((verb, args)) = tokens.split_first() else {
            return Ok(Flow::Continue);
        };

        let Some(handler) = self.commands.get(verb.as_str()).map(|cmd| cmd.handler) else {
            writeln!(self.out, "Unknown command. Type 'help' for available commands.")?;
            return Ok(Flow::Continue);
        };

        debug!(command = %verb, ?args, "dispatching");
        handler(self, args).await
    }

    fn help(&mut self) -> CommandResult {
        let mut commands: Vec<_> = self.commands.values().collect();
        commands.sort_by_key(|cmd| cmd.name);

        writeln!(self.out, "Welcome to the Pokedex!")?;
        writeln!(self.out, "Usage:")?;
        writeln!(self.out)?;
        for cmd in commands {
            writeln!(self.out, "{}: {}", cmd.name, cmd.description)?;
        }
        Ok(Flow::Continue)
    }

    fn exit(&mut self) -> CommandResult {
        writeln!(self.out, "Closing the Pokedex... Goodbye!")?;
        Ok(Flow::Exit)
    }

    async fn map_next(&mut self) -> CommandResult {
        if self.pagination.started && self.pagination.next.is_none() {
            writeln!(self.out, "You're on the last page")?;
            return Ok(Flow::Continue);
        }
        let cursor = self.pagination.next.clone();
        self.show_page(cursor.as_deref()).await
    }

    async fn map_previous(&mut self) -> CommandResult {
        let Some(cursor) = self.pagination.previous.clone() else {
            writeln!(self.out, "You're on the first page")?;
            return Ok(Flow::Continue);
        };
        self.show_page(Some(&cursor)).await
    }

    async fn show_page(&mut self, cursor: Option<&str>) -> CommandResult {
        let page = self.client.location_areas(cursor).await?;

        self.pagination = Pagination {
            next: page.next,
            previous: page.previous,
            started: true,
        };
        for area in &page.results {
            writeln!(self.out, "{}", area.name)?;
        }
        Ok(Flow::Continue)
    }

    async fn explore(&mut self, args: &[String]) -> CommandResult {
        let Some(name) = args.first() else {
            writeln!(self.out, "Please provide a location name")?;
            return Ok(Flow::Continue);
        };

        let area = self.client.location_area(name).await?;

        writeln!(self.out, "Exploring {}...", name)?;
        writeln!(self.out, "Found Pokemon:")?;
        for encounter in &area.pokemon_encounters {
            writeln!(self.out, " - {}", encounter.pokemon.name)?;
        }
        Ok(Flow::Continue)
    }

    async fn catch(&mut self, args: &[String]) -> CommandResult {
        let Some(name) = args.first() else {
            writeln!(self.out, "Please provide a Pokemon name")?;
            return Ok(Flow::Continue);
        };

        let pokemon = self.client.pokemon(name).await?;
        writeln!(self.out, "Throwing a Pokeball at {}...", name)?;

        let chance = catch_chance(pokemon.base_experience);
        let roll: f64 = self.rng.gen();
        debug!(pokemon = %name, chance, roll, "catch attempt");

        if is_caught(roll, chance) {
            self.pokedex.add(name.clone(), pokemon);
            writeln!(self.out, "{} was caught!", name)?;
            writeln!(self.out, "You may now inspect it with the inspect command.")?;
        } else {
            writeln!(self.out, "{} escaped!", name)?;
        }
        Ok(Flow::Continue)
    }

    fn inspect(&mut self, args: &[String]) -> CommandResult {
        let Some(name) = args.first() else {
            writeln!(self.out, "Please provide a Pokemon name")?;
            return Ok(Flow::Continue);
        };
        let Some(pokemon) = self.pokedex.get(name) else {
            writeln!(self.out, "You have not caught that Pokemon")?;
            return Ok(Flow::Continue);
        };

        writeln!(self.out, "Name: {}", pokemon.name)?;
        writeln!(self.out, "Height: {}", pokemon.height)?;
        writeln!(self.out, "Weight: {}", pokemon.weight)?;
        writeln!(self.out, "Stats:")?;
        for stat in &pokemon.stats {
            writeln!(self.out, "  -{}: {}", stat.stat.name, stat.base_stat)?;
        }
        writeln!(self.out, "Types:")?;
        for pokemon_type in &pokemon.types {
            writeln!(self.out, "  - {}", pokemon_type.kind.name)?;
        }
        Ok(Flow::Continue)
    }

    fn list_caught(&mut self) -> CommandResult {
        if self.pokedex.is_empty() {
            writeln!(self.out, "Go catch some Pokemon using the catch command")?;
            return Ok(Flow::Continue);
        }

        writeln!(self.out, "Your Pokedex:")?;
        for name in self.pokedex.all().keys() {
            writeln!(self.out, "  - {}", name)?;
        }
        Ok(Flow::Continue)
    }
}

fn registry<W: Write>() -> HashMap<&'static str, Command<W>> {
    let commands: [Command<W>; 8] = [
        Command {
            name: "exit",
            description: "Exit the Pokedex",
            handler: run_exit,
        },
        Command {
            name: "help",
            description: "Displays a help message",
            handler: run_help,
        },
        Command {
            name: "map",
            description: "Displays the names of the next 20 location areas",
            handler: run_map,
        },
        Command {
            name: "mapb",
            description: "Displays the names of the previous 20 location areas",
            handler: run_mapb,
        },
        Command {
            name: "explore",
            description: "Lists the Pokemon found in a location area: explore <area>",
            handler: run_explore,
        },
        Command {
            name: "catch",
            description: "Throws a Pokeball at a Pokemon: catch <pokemon>",
            handler: run_catch,
        },
        Command {
            name: "inspect",
            description: "Shows the details of a caught Pokemon: inspect <pokemon>",
            handler: run_inspect,
        },
        Command {
            name: "pokedex",
            description: "Lists every Pokemon you have caught",
            handler: run_pokedex,
        },
    ];
    commands.into_iter().map(|cmd| (cmd.name, cmd)).collect()
}

fn run_exit<'a, W: Write>(
    session: &'a mut Session<W>,
    _args: &'a [String],
) -> LocalBoxFuture<'a, CommandResult> {
    Box::pin(async move { session.exit() })
}

fn run_help<'a, W: Write>(
    session: &'a mut Session<W>,
    _args: &'a [String],
) -> LocalBoxFuture<'a, CommandResult> {
    Box::pin(async move { session.help() })
}

fn run_map<'a, W: Write>(
    session: &'a mut Session<W>,
    _args: &'a [String],
) -> LocalBoxFuture<'a, CommandResult> {
    Box::pin(session.map_next())
}

fn run_mapb<'a, W: Write>(
    session: &'a mut Session<W>,
    _args: &'a [String],
) -> LocalBoxFuture<'a, CommandResult> {
    Box::pin(session.map_previous())
}

fn run_explore<'a, W: Write>(
    session: &'a mut Session<W>,
    args: &'a [String],
) -> LocalBoxFuture<'a, CommandResult> {
    Box::pin(session.explore(args))
}

fn run_catch<'a, W: Write>(
    session: &'a mut Session<W>,
    args: &'a [String],
) -> LocalBoxFuture<'a, CommandResult> {
    Box::pin(session.catch(args))
}

fn run_inspect<'a, W: Write>(
    session: &'a mut Session<W>,
    args: &'a [String],
) -> LocalBoxFuture<'a, CommandResult> {
    Box::pin(async move { session.inspect(args) })
}

fn run_pokedex<'a, W: Write>(
    session: &'a mut Session<W>,
    _args: &'a [String],
) -> LocalBoxFuture<'a, CommandResult> {
    Box::pin(async move { session.list_caught() })
}
