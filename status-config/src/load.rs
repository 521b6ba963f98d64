use config::ConfigError;
use serde::de::DeserializeOwned;

use crate::environment::Environment;

/// Directory holding `base.yaml` and the per-environment overrides, relative to the working
/// directory.
const CONFIGURATION_DIR: &str = "configuration";

/// Environment variables starting with `APP_` override file values. Nested keys are joined with
/// `__`, so `APP_REPLAY__INPUT_PATH` sets `replay.input_path`.
const ENV_PREFIX: &str = "APP";
const ENV_PREFIX_SEPARATOR: &str = "_";
const ENV_SEPARATOR: &str = "__";
const LIST_SEPARATOR: &str = ",";

/// Implemented by top-level configuration types that can be loaded with [`load_config`].
pub trait Config {
    /// Dotted keys whose environment variable values are comma separated lists, e.g.
    /// `replay.connection_ids`.
    const LIST_PARSE_KEYS: &'static [&'static str];
}

/// Loads `T` from `configuration/base.yaml`, the optional `configuration/{environment}.yaml` and
/// `APP_` environment variables, later sources taking precedence.
pub fn load_config<T>() -> Result<T, ConfigError>
where
    T: Config + DeserializeOwned,
{
    let environment = Environment::load().map_err(|err| ConfigError::Foreign(Box::new(err)))?;
    let configuration_directory = std::env::current_dir()
        .map_err(|err| ConfigError::Foreign(Box::new(err)))?
        .join(CONFIGURATION_DIR);

    config::Config::builder()
        .add_source(config::File::from(
            configuration_directory.join("base.yaml"),
        ))
        .add_source(
            config::File::from(configuration_directory.join(format!("{environment}.yaml")))
                .required(false),
        )
        .add_source(environment_source::<T>())
        .build()?
        .try_deserialize()
}

fn environment_source<T: Config>() -> config::Environment {
    T::LIST_PARSE_KEYS.iter().fold(
        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator(ENV_PREFIX_SEPARATOR)
            .separator(ENV_SEPARATOR)
            .try_parsing(true)
            .list_separator(LIST_SEPARATOR),
        |source, key| source.with_list_parse_key(key),
    )
}
