use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Structured pricing proposal produced for a free-text task description.
///
/// `price` is expressed in soles. A price of exactly zero means the request
/// was declined and `justification` carries the explanation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub task: String,
    pub price: f64,
    pub eta: String,
    pub category: String,
    pub justification: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceTier {
    /// Fast motorbike courier.
    Flash,
    /// Car or medium load.
    Pro,
    /// Complex errands and paperwork.
    Senior,
}

impl ServiceTier {
    /// Best-effort mapping from the free-form category the model returned.
    pub fn classify(category: &str) -> Option<Self> {
        let normalized = category.to_lowercase();
        if normalized.contains("flash") {
            Some(Self::Flash)
        } else if normalized.contains("senior") {
            Some(Self::Senior)
        } else if normalized.contains("pro") {
            Some(Self::Pro)
        } else {
            None
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Flash => "Flash",
            Self::Pro => "Pro",
            Self::Senior => "Senior",
        }
    }
}

impl Quote {
    pub fn is_declined(&self) -> bool {
        self.price == 0.0
    }

    pub fn tier(&self) -> Option<ServiceTier> {
        ServiceTier::classify(&self.category)
    }

    pub fn formatted_price(&self) -> String {
        format!("S/ {:.2}", self.price)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.task.trim().is_empty() {
            return Err(DomainError::InvariantViolation("quote task must not be empty".to_owned()));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(DomainError::InvariantViolation(
                "quote price must be a finite, non-negative amount".to_owned(),
            ));
        }
        Ok(())
    }
}
