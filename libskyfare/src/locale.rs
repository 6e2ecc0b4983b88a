//! Process-wide display locale
//!
//! Skyfare ships two languages. The active one is a single process-wide
//! value read by the formatters and notification templates.

use std::str::FromStr;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, SkyfareError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Es,
}

static CURRENT: RwLock<Locale> = RwLock::new(Locale::En);

impl Locale {
    pub fn code(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Es => "es",
        }
    }

    /// The other supported locale
    pub fn other(&self) -> Locale {
        match self {
            Locale::En => Locale::Es,
            Locale::Es => Locale::En,
        }
    }

    pub fn flag_emoji(&self) -> &'static str {
        match self {
            Locale::En => "🇺🇸",
            Locale::Es => "🇲🇽",
        }
    }

    /// Label for the button that switches away from this locale
    pub fn toggle_tooltip(&self) -> &'static str {
        match self {
            Locale::En => "Cambiar a Español",
            Locale::Es => "Switch to English",
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = SkyfareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" => Ok(Locale::En),
            "es" => Ok(Locale::Es),
            other => Err(ConfigError::InvalidValue {
                field: "locale".to_string(),
                value: other.to_string(),
            }
            .into()),
        }
    }
}

/// The active locale
pub fn current() -> Locale {
    match CURRENT.read() {
        Ok(guard) => *guard,
        Err(poisoned) => *poisoned.into_inner(),
    }
}

pub fn set(locale: Locale) {
    match CURRENT.write() {
        Ok(mut guard) => *guard = locale,
        Err(poisoned) => *poisoned.into_inner() = locale,
    }
    tracing::debug!("Locale set to {}", locale);
}

/// Switch to the other locale and return the new value
pub fn toggle() -> Locale {
    let next = current().other();
    set(next);
    next
}

pub fn is_spanish() -> bool {
    current() == Locale::Es
}
