//! Component kind enumeration.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The fixed set of legacy component kinds.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Controller,
    Service,
    Repository,
    Model,
    #[default]
    Other,
}

impl ComponentKind {
    /// Returns a static slice of all kinds.
    pub fn all() -> &'static [ComponentKind] {
        &[
            ComponentKind::Controller,
            ComponentKind::Service,
            ComponentKind::Repository,
            ComponentKind::Model,
            ComponentKind::Other,
        ]
    }

    /// Lowercase name as persisted in the stores.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Controller => "controller",
            ComponentKind::Service => "service",
            ComponentKind::Repository => "repository",
            ComponentKind::Model => "model",
            ComponentKind::Other => "other",
        }
    }

    /// Parses a stored kind, mapping unknown values to `Other`.
    pub fn from_stored(s: &str) -> Self {
        s.parse().unwrap_or(ComponentKind::Other)
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "controller" => Ok(ComponentKind::Controller),
            "service" => Ok(ComponentKind::Service),
            "repository" => Ok(ComponentKind::Repository),
            "model" => Ok(ComponentKind::Model),
            "other" => Ok(ComponentKind::Other),
            _ => Err(format!(
                "Invalid component kind '{}'. Valid values: controller, service, repository, model, other",
                s
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("Controller".parse::<ComponentKind>(), Ok(ComponentKind::Controller));
        assert_eq!("REPOSITORY".parse::<ComponentKind>(), Ok(ComponentKind::Repository));
        assert!("widget".parse::<ComponentKind>().is_err());
    }

    #[test]
    fn test_from_stored_falls_back_to_other() {
        assert_eq!(ComponentKind::from_stored("model"), ComponentKind::Model);
        assert_eq!(ComponentKind::from_stored("view"), ComponentKind::Other);
    }

    #[test]
    fn test_display_round_trips_through_as_str() {
        for kind in ComponentKind::all() {
            assert_eq!(kind.to_string().parse::<ComponentKind>(), Ok(*kind));
        }
    }
}
