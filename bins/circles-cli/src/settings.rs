//! Hub parameters for `circles-cli init`, layered from defaults, an optional
//! TOML file, and `CIRCLES_*` environment variables (later sources win).

use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use circles_core::address::Address;
use circles_core::constants::{
    DEFAULT_DECIMALS, DEFAULT_DEMURRAGE_RATE, DEFAULT_EPOCH_LENGTH, DEFAULT_INITIAL_PAYOUT,
    DEFAULT_ISSUANCE_RATE, DEFAULT_SYMBOL,
};
use circles_core::types::{Amount, HubConfig};

/// Raw hub settings as read from the config sources.
///
/// Rates and the payout are kept as decimal strings and parsed to
/// [`Amount`] in [`into_hub_config`](Self::into_hub_config), so values
/// beyond `u64` can be given as quoted TOML strings or env vars.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HubSettings {
    /// Hex address of the account constructing the hub.
    pub system_owner: Option<String>,
    pub issuance_rate: String,
    pub demurrage_rate: String,
    pub decimals: u8,
    pub symbol: String,
    pub epoch_length: u64,
    pub initial_payout: String,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            system_owner: None,
            issuance_rate: DEFAULT_ISSUANCE_RATE.to_string(),
            demurrage_rate: DEFAULT_DEMURRAGE_RATE.to_string(),
            decimals: DEFAULT_DECIMALS,
            symbol: DEFAULT_SYMBOL.to_string(),
            epoch_length: DEFAULT_EPOCH_LENGTH,
            initial_payout: DEFAULT_INITIAL_PAYOUT.to_string(),
        }
    }
}

impl HubSettings {
    /// Load settings from `file` (if given) and the environment.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder
            .add_source(Environment::with_prefix("CIRCLES"))
            .build()
            .context("failed to read hub settings")?
            .try_deserialize()
            .context("invalid hub settings")
    }

    /// Resolve into a hub configuration. `owner_override` wins over the
    /// configured system owner.
    pub fn into_hub_config(self, owner_override: Option<Address>) -> Result<HubConfig> {
        let system_owner = match (owner_override, self.system_owner) {
            (Some(owner), _) => owner,
            (None, Some(s)) => s
                .parse()
                .with_context(|| format!("invalid system_owner: {s}"))?,
            (None, None) => anyhow::bail!(
                "system owner required: pass --system-owner or set CIRCLES_SYSTEM_OWNER"
            ),
        };
        let config = HubConfig {
            system_owner,
            issuance_rate: parse_amount("issuance_rate", &self.issuance_rate)?,
            demurrage_rate: parse_amount("demurrage_rate", &self.demurrage_rate)?,
            decimals: self.decimals,
            symbol: self.symbol,
            epoch_length: self.epoch_length,
            initial_payout: parse_amount("initial_payout", &self.initial_payout)?,
        };
        config.validate().context("invalid hub parameters")?;
        Ok(config)
    }
}

fn parse_amount(field: &str, value: &str) -> Result<Amount> {
    value
        .trim()
        .parse()
        .with_context(|| format!("invalid {field}: {value}"))
}
