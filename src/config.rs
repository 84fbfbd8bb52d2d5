use crate::balance::BalanceMode;
use serde::Deserialize;
use std::env;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_SETTINGS_FILE: &str = "appsetting.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{key} has invalid value {value:?}")]
    Invalid { key: &'static str, value: String },
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Fanout of the generated tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TreeShape {
    pub companies: usize,
    pub subsystems_per_company: usize,
    pub web_ids_per_subsystem: usize,
    pub players_per_web_id: usize,
    pub records_per_player: usize,
}

impl TreeShape {
    pub fn subsystems(&self) -> usize {
        self.companies * self.subsystems_per_company
    }

    pub fn web_ids(&self) -> usize {
        self.subsystems() * self.web_ids_per_subsystem
    }

    pub fn players(&self) -> usize {
        self.web_ids() * self.players_per_web_id
    }

    pub fn records(&self) -> usize {
        self.players() * self.records_per_player
    }
}

impl Default for TreeShape {
    fn default() -> Self {
        Self {
            companies: 20,
            subsystems_per_company: 25,
            web_ids_per_subsystem: 30,
            players_per_web_id: 20,
            records_per_player: 40,
        }
    }
}

/// Which generation phases run after the clear.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Phases {
    pub flattened: bool,
    pub adjacency: bool,
    pub materialized_path: bool,
}

impl Phases {
    pub fn all() -> Self {
        Self {
            flattened: true,
            adjacency: true,
            materialized_path: true,
        }
    }

    pub fn any(&self) -> bool {
        self.flattened || self.adjacency || self.materialized_path
    }

    /// Parses a comma-separated list such as `flattened,path`.
    pub fn parse(list: &str) -> Result<Self, ConfigError> {
        let mut phases = Phases {
            flattened: false,
            adjacency: false,
            materialized_path: false,
        };
        for name in list.split(',').map(str::trim).filter(|name| !name.is_empty()) {
            match name {
                "flattened" => phases.flattened = true,
                "adjacency" => phases.adjacency = true,
                "path" | "materialized-path" | "ltree" => phases.materialized_path = true,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "PHASES",
                        value: list.to_string(),
                    })
                }
            }
        }
        Ok(phases)
    }
}

impl Default for Phases {
    fn default() -> Self {
        Self::all()
    }
}

/// Immutable run parameters, handed to the generator at construction.
#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    pub database_url: Option<String>,
    pub shape: TreeShape,
    pub batch_size: NonZeroUsize,
    pub balance: BalanceMode,
    pub balance_seed: Option<u64>,
    pub phases: Phases,
    pub summary_path: Option<PathBuf>,
    /// Generate into an in-process store instead of Postgres.
    pub dry_run: bool,
}

impl GeneratorConfig {
    pub fn builder() -> GeneratorConfigBuilder {
        GeneratorConfigBuilder::new()
    }

    pub fn database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))
    }

    /// Defaults, then the settings file (`GENERATOR_CONFIG` or
    /// `appsetting.json` if present), then the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let file = match env::var("GENERATOR_CONFIG") {
            Ok(path) => Some(PathBuf::from(path)),
            Err(_) => Some(PathBuf::from(DEFAULT_SETTINGS_FILE)).filter(|path| path.exists()),
        };
        Self::load_from(file.as_deref(), |key| env::var(key).ok())
    }

    pub fn load_from<F>(file: Option<&Path>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = GeneratorConfigBuilder::new();
        if let Some(path) = file {
            builder = FileSettings::read(path)?.apply(builder)?;
        }
        apply_env(builder, env)?.build()
    }
}

#[derive(Default)]
pub struct GeneratorConfigBuilder {
    database_url: Option<String>,
    shape: TreeShape,
    batch_size: Option<usize>,
    balance: BalanceMode,
    balance_seed: Option<u64>,
    phases: Phases,
    summary_path: Option<PathBuf>,
    dry_run: bool,
}

impl GeneratorConfigBuilder {
    const DEFAULT_BATCH_SIZE: usize = 2000;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn database_url(mut self, database_url: impl Into<String>) -> Self {
        self.database_url = Some(database_url.into());
        self
    }

    pub fn shape(mut self, shape: TreeShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn companies(mut self, companies: usize) -> Self {
        self.shape.companies = companies;
        self
    }

    pub fn subsystems_per_company(mut self, subsystems: usize) -> Self {
        self.shape.subsystems_per_company = subsystems;
        self
    }

    pub fn web_ids_per_subsystem(mut self, web_ids: usize) -> Self {
        self.shape.web_ids_per_subsystem = web_ids;
        self
    }

    pub fn players_per_web_id(mut self, players: usize) -> Self {
        self.shape.players_per_web_id = players;
        self
    }

    pub fn records_per_player(mut self, records: usize) -> Self {
        self.shape.records_per_player = records;
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    pub fn balance(mut self, balance: BalanceMode) -> Self {
        self.balance = balance;
        self
    }

    pub fn balance_seed(mut self, seed: u64) -> Self {
        self.balance_seed = Some(seed);
        self
    }

    pub fn phases(mut self, phases: Phases) -> Self {
        self.phases = phases;
        self
    }

    pub fn summary_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.summary_path = Some(path.into());
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn build(self) -> Result<GeneratorConfig, ConfigError> {
        let batch_size = self.batch_size.unwrap_or(Self::DEFAULT_BATCH_SIZE);
        Ok(GeneratorConfig {
            database_url: self.database_url,
            shape: self.shape,
            batch_size: NonZeroUsize::new(batch_size).ok_or(ConfigError::Invalid {
                key: "BatchSize",
                value: batch_size.to_string(),
            })?,
            balance: self.balance,
            balance_seed: self.balance_seed,
            phases: self.phases,
            summary_path: self.summary_path,
            dry_run: self.dry_run,
        })
    }
}

/// A count in the settings file, written either as a number or a string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Count {
    Number(usize),
    Text(String),
}

impl Count {
    fn get(self, key: &'static str) -> Result<usize, ConfigError> {
        match self {
            Count::Number(value) => Ok(value),
            Count::Text(value) => parse(key, &value),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct FileSettings {
    connection_string: Option<String>,
    company_count: Option<Count>,
    subsystems_per_company: Option<Count>,
    web_ids_per_subsystem: Option<Count>,
    players_per_web_id: Option<Count>,
    records_per_player: Option<Count>,
    batch_size: Option<Count>,
    random_balance: Option<bool>,
    balance_seed: Option<u64>,
    summary_path: Option<PathBuf>,
}

impl FileSettings {
    fn read(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply(self, mut builder: GeneratorConfigBuilder) -> Result<GeneratorConfigBuilder, ConfigError> {
        if let Some(url) = self.connection_string.filter(|url| !url.trim().is_empty()) {
            builder = builder.database_url(url);
        }
        if let Some(count) = self.company_count {
            builder = builder.companies(count.get("CompanyCount")?);
        }
        if let Some(count) = self.subsystems_per_company {
            builder = builder.subsystems_per_company(count.get("SubsystemsPerCompany")?);
        }
        if let Some(count) = self.web_ids_per_subsystem {
            builder = builder.web_ids_per_subsystem(count.get("WebIdsPerSubsystem")?);
        }
        if let Some(count) = self.players_per_web_id {
            builder = builder.players_per_web_id(count.get("PlayersPerWebId")?);
        }
        if let Some(count) = self.records_per_player {
            builder = builder.records_per_player(count.get("RecordsPerPlayer")?);
        }
        if let Some(count) = self.batch_size {
            builder = builder.batch_size(count.get("BatchSize")?);
        }
        if self.random_balance == Some(true) {
            builder = builder.balance(BalanceMode::random());
        }
        if let Some(seed) = self.balance_seed {
            builder = builder.balance_seed(seed);
        }
        if let Some(path) = self.summary_path {
            builder = builder.summary_path(path);
        }
        Ok(builder)
    }
}

fn apply_env<F>(mut builder: GeneratorConfigBuilder, env: F) -> Result<GeneratorConfigBuilder, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| env(key).filter(|value| !value.trim().is_empty());

    if let Some(url) = var("DATABASE_URL") {
        builder = builder.database_url(url);
    }
    if let Some(value) = var("COMPANY_COUNT") {
        builder = builder.companies(parse("COMPANY_COUNT", &value)?);
    }
    if let Some(value) = var("SUBSYSTEMS_PER_COMPANY") {
        builder = builder.subsystems_per_company(parse("SUBSYSTEMS_PER_COMPANY", &value)?);
    }
    if let Some(value) = var("WEB_IDS_PER_SUBSYSTEM") {
        builder = builder.web_ids_per_subsystem(parse("WEB_IDS_PER_SUBSYSTEM", &value)?);
    }
    if let Some(value) = var("PLAYERS_PER_WEB_ID") {
        builder = builder.players_per_web_id(parse("PLAYERS_PER_WEB_ID", &value)?);
    }
    if let Some(value) = var("RECORDS_PER_PLAYER") {
        builder = builder.records_per_player(parse("RECORDS_PER_PLAYER", &value)?);
    }
    if let Some(value) = var("BATCH_SIZE") {
        builder = builder.batch_size(parse("BATCH_SIZE", &value)?);
    }
    if let Some(value) = var("RANDOM_BALANCE") {
        let random: bool = parse("RANDOM_BALANCE", &value)?;
        builder = builder.balance(if random {
            BalanceMode::random()
        } else {
            BalanceMode::default()
        });
    }
    if let Some(value) = var("BALANCE_SEED") {
        builder = builder.balance_seed(parse("BALANCE_SEED", &value)?);
    }
    if let Some(value) = var("PHASES") {
        builder = builder.phases(Phases::parse(&value)?);
    }
    if let Some(value) = var("DRY_RUN") {
        builder = builder.dry_run(parse("DRY_RUN", &value)?);
    }
    if let Some(value) = var("SUMMARY_PATH") {
        builder = builder.summary_path(value);
    }
    Ok(builder)
}

fn parse<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })
}
