use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Dialogue persona (exposed on the wire as `voice_profile`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Persona {
    /// Friendly, casual lifestyle coach
    #[default]
    Lifestyle,
    /// Professional business intake assistant
    Business,
}

impl Persona {
    /// All personas, in wire order
    pub const ALL: [Persona; 2] = [Persona::Lifestyle, Persona::Business];

    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lifestyle => "lifestyle",
            Self::Business => "business",
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a `voice_profile` string names no persona
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown voice profile: {0}. Supported: lifestyle, business")]
pub struct PersonaParseError(pub String);

impl FromStr for Persona {
    type Err = PersonaParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lifestyle" => Ok(Self::Lifestyle),
            "business" => Ok(Self::Business),
            _ => Err(PersonaParseError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("Lifestyle".parse::<Persona>(), Ok(Persona::Lifestyle));
        assert_eq!(" BUSINESS ".parse::<Persona>(), Ok(Persona::Business));
    }

    #[test]
    fn test_parse_unknown_profile() {
        let err = "support".parse::<Persona>().unwrap_err();
        assert_eq!(err, PersonaParseError("support".to_string()));
        assert!(err.to_string().contains("lifestyle"));
    }

    #[test]
    fn test_serde_uses_lowercase_names() {
        assert_eq!(
            serde_json::to_string(&Persona::Business).unwrap(),
            "\"business\""
        );
        let parsed: Persona = serde_json::from_str("\"lifestyle\"").unwrap();
        assert_eq!(parsed, Persona::Lifestyle);
        for persona in Persona::ALL {
            assert_eq!(persona.to_string(), persona.as_str());
        }
    }
}
