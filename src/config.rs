mod commandline;
mod defaults;
mod file;
mod primitives;

use std::path::{Path, PathBuf};

use clap::Parser;
use commandline::{Args, Output};
use config::Config;
use defaults::Defaults;

pub(crate) use file::{
    ConfigFile as Configuration, ObjectStorage, OpenTelemetry, Repo, Sled, Store, Tracing,
};
pub(crate) use primitives::LogFormat;

const ENV_PREFIX: &str = "VIDKEEP";

/// Source for vidkeep configuration when embedding as a library
pub enum ConfigSource<P, T> {
    /// A file path containing a vidkeep configuration
    File { path: P },
    /// An in-memory vidkeep configuration
    Memory { value: T },
    /// No configuration beyond defaults and the environment
    Empty,
}

/// A resolved vidkeep configuration, ready to run
#[derive(Clone, Debug)]
pub struct VidkeepConfiguration {
    pub(crate) config: Configuration,
}

impl<T> ConfigSource<PathBuf, T>
where
    T: serde::Serialize,
{
    /// Create a new memory-based ConfigSource
    pub fn memory(value: T) -> Self {
        ConfigSource::Memory { value }
    }
}

impl<P> ConfigSource<P, ()>
where
    P: AsRef<Path>,
{
    /// Create a new file-based ConfigSource
    pub fn file(path: P) -> Self {
        ConfigSource::File { path }
    }
}

impl ConfigSource<PathBuf, ()> {
    /// Create a new empty ConfigSource
    pub fn empty() -> Self {
        ConfigSource::Empty
    }
}

pub(crate) fn configure_without_clap<P, T, Q>(
    source: ConfigSource<P, T>,
    save_to: Option<Q>,
) -> color_eyre::Result<VidkeepConfiguration>
where
    P: AsRef<Path>,
    T: serde::Serialize,
    Q: AsRef<Path>,
{
    let config = Config::builder().add_source(config::Config::try_from(&Defaults::default())?);

    let config = match source {
        ConfigSource::Empty => config,
        ConfigSource::File { path } => config.add_source(config::File::from(path.as_ref())),
        ConfigSource::Memory { value } => config.add_source(config::Config::try_from(&value)?),
    };

    let built = config
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config: Configuration = built.try_deserialize()?;

    if let Some(save_to) = save_to {
        save(&config, save_to.as_ref())?;
    }

    Ok(VidkeepConfiguration { config })
}

pub(crate) fn configure() -> color_eyre::Result<VidkeepConfiguration> {
    let Output {
        config_format,
        save_to,
        config_file,
    } = Args::parse().into_output();

    let config = Config::builder().add_source(config::Config::try_from(&Defaults::default())?);

    let config = if let Some(config_file) = config_file {
        config.add_source(config::File::from(config_file))
    } else {
        config
    };

    let built = config
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .add_source(config::Config::try_from(&config_format)?)
        .build()?;

    let config: Configuration = built.try_deserialize()?;

    if let Some(save_to) = save_to {
        save(&config, &save_to)?;
    }

    Ok(VidkeepConfiguration { config })
}

fn save(config: &Configuration, path: &Path) -> color_eyre::Result<()> {
    let output = toml::to_string_pretty(config)?;
    std::fs::write(path, output)?;
    Ok(())
}
