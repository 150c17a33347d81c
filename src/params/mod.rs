//! Operator-supplied parameters forwarded with every monitor request.
//!
//! The backend needs contextual keys (which match, tournament or player to
//! query) to exercise an endpoint meaningfully. The set has fixed defaults,
//! is editable field by field, and survives across sessions in the local
//! state file under [`PARAMS_STORAGE_KEY`].

mod error;

pub use error::*;

use crate::storage::LocalStore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Storage key of the persisted parameter set.
pub const PARAMS_STORAGE_KEY: &str = "apiConstants";

/// Contextual keys used to parameterize monitor requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParameterSet {
    pub country_code: String,
    pub tournament_key: String,
    pub match_key: String,
    pub player_key: String,
    pub inning_key: String,
    pub over_key: String,
    pub page: u32,
    pub team_key: String,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            country_code: "IND".to_string(),
            tournament_key: "a-rz--cricket--icc--icccwclt--2023-27-8JlY".to_string(),
            match_key: "a-rz--cricket--Th1834366022682058833".to_string(),
            player_key: "c__player__jan_nicol_loftieeaton__34004".to_string(),
            inning_key: "a_1".to_string(),
            over_key: "a_1_36".to_string(),
            page: 1,
            team_key: "nep".to_string(),
        }
    }
}

/// One named field of a [`ParameterSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamField {
    CountryCode,
    TournamentKey,
    MatchKey,
    PlayerKey,
    InningKey,
    OverKey,
    Page,
    TeamKey,
}

impl ParamField {
    pub const ALL: [ParamField; 8] = [
        ParamField::CountryCode,
        ParamField::TournamentKey,
        ParamField::MatchKey,
        ParamField::PlayerKey,
        ParamField::InningKey,
        ParamField::OverKey,
        ParamField::Page,
        ParamField::TeamKey,
    ];

    /// Header (and storage) name of the field.
    pub fn header_name(self) -> &'static str {
        match self {
            ParamField::CountryCode => "countryCode",
            ParamField::TournamentKey => "tournamentKey",
            ParamField::MatchKey => "matchKey",
            ParamField::PlayerKey => "playerKey",
            ParamField::InningKey => "inningKey",
            ParamField::OverKey => "overKey",
            ParamField::Page => "page",
            ParamField::TeamKey => "teamKey",
        }
    }
}

impl fmt::Display for ParamField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header_name())
    }
}

impl FromStr for ParamField {
    type Err = ParamsError;

    /// Accepts `matchKey`, `match_key` and `MATCH_KEY` spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();

        ParamField::ALL
            .into_iter()
            .find(|field| field.header_name().to_lowercase() == normalized)
            .ok_or_else(|| ParamsError::UnknownField(s.to_string()))
    }
}

impl ParameterSet {
    /// Current value of a field, rendered as text.
    pub fn get(&self, field: ParamField) -> String {
        match field {
            ParamField::CountryCode => self.country_code.clone(),
            ParamField::TournamentKey => self.tournament_key.clone(),
            ParamField::MatchKey => self.match_key.clone(),
            ParamField::PlayerKey => self.player_key.clone(),
            ParamField::InningKey => self.inning_key.clone(),
            ParamField::OverKey => self.over_key.clone(),
            ParamField::Page => self.page.to_string(),
            ParamField::TeamKey => self.team_key.clone(),
        }
    }

    /// Set a field from text. Numeric fields are parsed.
    pub fn set(&mut self, field: ParamField, value: &str) -> Result<(), ParamsError> {
        let value = value.trim();
        let slot = match field {
            ParamField::Page => {
                self.page = value.parse().map_err(|_| ParamsError::Invalid {
                    field: field.header_name(),
                    message: format!("expected a page number, got '{}'", value),
                })?;
                return Ok(());
            }
            ParamField::CountryCode => &mut self.country_code,
            ParamField::TournamentKey => &mut self.tournament_key,
            ParamField::MatchKey => &mut self.match_key,
            ParamField::PlayerKey => &mut self.player_key,
            ParamField::InningKey => &mut self.inning_key,
            ParamField::OverKey => &mut self.over_key,
            ParamField::TeamKey => &mut self.team_key,
        };
        *slot = value.to_string();
        Ok(())
    }

    /// Every field must be filled in before the set can be saved.
    pub fn validate(&self) -> Result<(), ParamsError> {
        for field in ParamField::ALL {
            if field != ParamField::Page && self.get(field).trim().is_empty() {
                return Err(ParamsError::Missing {
                    field: field.header_name(),
                });
            }
        }
        Ok(())
    }

    /// Fields flattened as `(header, value)` pairs, in a fixed order.
    pub fn header_pairs(&self) -> Vec<(&'static str, String)> {
        ParamField::ALL
            .into_iter()
            .map(|field| (field.header_name(), self.get(field)))
            .collect()
    }
}

/// Persistence for the parameter set.
#[derive(Debug, Clone)]
pub struct ParameterStore {
    store: LocalStore,
}

impl ParameterStore {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    /// Saved parameters, or the defaults if nothing was saved yet.
    pub fn load(&self) -> Result<ParameterSet, ParamsError> {
        Ok(self
            .store
            .get::<ParameterSet>(PARAMS_STORAGE_KEY)?
            .unwrap_or_default())
    }

    /// Validate and persist.
    pub fn save(&self, params: &ParameterSet) -> Result<(), ParamsError> {
        params.validate()?;
        self.store.set(PARAMS_STORAGE_KEY, params)?;
        tracing::debug!("Parameter set saved");
        Ok(())
    }

    /// Update a single field of the saved set and persist the result.
    pub fn update(&self, field: ParamField, value: &str) -> Result<ParameterSet, ParamsError> {
        let mut params = self.load()?;
        params.set(field, value)?;
        self.save(&params)?;
        Ok(params)
    }

    /// Restore and persist the defaults.
    pub fn reset(&self) -> Result<ParameterSet, ParamsError> {
        let params = ParameterSet::default();
        self.store.set(PARAMS_STORAGE_KEY, &params)?;
        tracing::info!("Parameter set reset to defaults");
        Ok(params)
    }
}
