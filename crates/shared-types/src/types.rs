use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A converted PDF registered for field placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub file_id: String, // Object-store path of the PDF
    pub created_at: DateTime<Utc>,
}

/// A recipient attached to a template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signatory {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub template_id: Option<String>,
}

/// One row of the signatory form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSignatory {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl NewSignatory {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.name.trim().is_empty() {
            return Err("Signatory name must not be empty");
        }
        if self.email.trim().is_empty() {
            return Err("Signatory email must not be empty");
        }
        if !self.email.contains('@') {
            return Err("Signatory email must contain '@'");
        }
        if self.phone.trim().is_empty() {
            return Err("Signatory phone must not be empty");
        }
        Ok(())
    }
}
