use geo::Point;
use serde::{Deserialize, Serialize};

/// A facility that already serves the area, e.g. an installed ATM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExistingFacility {
    pub location: Point,
    /// Free-form label, typically the street address.
    #[serde(default)]
    pub label: Option<String>,
}

impl ExistingFacility {
    pub fn new(location: Point) -> Self {
        Self {
            location,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn x(&self) -> f64 {
        self.location.x()
    }

    pub fn y(&self) -> f64 {
        self.location.y()
    }

    /// Label, or `default` when none was supplied.
    pub fn label_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.label.as_deref().unwrap_or(default)
    }
}
