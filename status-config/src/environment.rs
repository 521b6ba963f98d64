use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const APP_ENVIRONMENT_ENV_NAME: &str = "APP_ENVIRONMENT";

/// Returned when `APP_ENVIRONMENT` names an environment we do not deploy to.
#[derive(Debug, Error)]
#[error("`{0}` is not a supported environment, expected `prod`, `staging` or `dev`")]
pub struct UnsupportedEnvironment(String);

/// Deployment environment, read from `APP_ENVIRONMENT`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Prod,
    Staging,
    Dev,
}

impl Environment {
    /// Reads `APP_ENVIRONMENT`, falling back to [`Environment::Prod`] when it is unset.
    pub fn load() -> Result<Self, UnsupportedEnvironment> {
        match std::env::var(APP_ENVIRONMENT_ENV_NAME) {
            Ok(value) => value.parse(),
            Err(_) => Ok(Self::default()),
        }
    }

    /// Exports this environment as `APP_ENVIRONMENT`.
    ///
    /// Must be called before other threads are spawned.
    pub fn set(self) {
        unsafe { std::env::set_var(APP_ENVIRONMENT_ENV_NAME, self.as_str()) }
    }

    /// Staging runs with the production logging setup.
    pub fn is_prod(self) -> bool {
        matches!(self, Self::Prod | Self::Staging)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Prod => "prod",
            Self::Staging => "staging",
            Self::Dev => "dev",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = UnsupportedEnvironment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Self::Prod, Self::Staging, Self::Dev]
            .into_iter()
            .find(|environment| environment.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnsupportedEnvironment(s.to_string()))
    }
}
