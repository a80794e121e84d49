//! Core data models for the Pokedex
//!
//! This module contains the typed records decoded from PokeAPI responses and
//! the client that fetches them.

pub mod client;

pub use client::{ApiError, PokeApiClient, DEFAULT_BASE_URL};

use serde::{Deserialize, Serialize};

/// A name/URL pair as PokeAPI returns for linked resources
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedResource {
    pub name: String,
    pub url: String,
}

/// A Pokemon's stat record
///
/// This is also the record persisted in the saved pokedex, so it round-trips
/// through serde in both directions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pokemon {
    /// Lowercase species/form name
    pub name: String,
    /// Experience gained for defeating it; drives the catch chance.
    /// PokeAPI reports `null` for some forms, which decodes as 0.
    #[serde(default, deserialize_with = "null_as_zero")]
    pub base_experience: u32,
    /// Height in decimetres
    pub height: u32,
    /// Weight in hectograms
    pub weight: u32,
    #[serde(default)]
    pub stats: Vec<Stat>,
    #[serde(default)]
    pub types: Vec<PokemonType>,
}

/// One base stat (hp, attack, ...) of a Pokemon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stat {
    pub base_stat: u32,
    pub stat: StatName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatName {
    pub name: String,
}

/// One of a Pokemon's elemental types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PokemonType {
    pub slot: u32,
    #[serde(rename = "type")]
    pub kind: TypeName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeName {
    pub name: String,
}

/// One page of the location-area listing
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LocationAreaPage {
    pub count: u32,
    /// Cursor URL of the following page, absent on the last page
    pub next: Option<String>,
    /// Cursor URL of the preceding page, absent on the first page
    pub previous: Option<String>,
    pub results: Vec<NamedResource>,
}

/// A single location area and the Pokemon that can be encountered there
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LocationArea {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub pokemon_encounters: Vec<PokemonEncounter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PokemonEncounter {
    pub pokemon: NamedResource,
}

fn null_as_zero<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<u32>::deserialize(deserializer)?.unwrap_or_default())
}
