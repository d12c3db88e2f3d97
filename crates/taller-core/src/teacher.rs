//! Teachers who run calendar sessions.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Teacher {
  pub id:        Uuid,
  pub name:      String,
  pub surname:   Option<String>,
  pub email:     Option<String>,
  pub phone:     Option<String>,
  pub specialty: Option<String>,
  pub notes:     Option<String>,
}

impl Teacher {
  pub fn full_name(&self) -> String {
    format!("{} {}", self.name, self.surname.as_deref().unwrap_or(""))
      .trim()
      .to_string()
  }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTeacher {
  pub name:      String,
  pub surname:   Option<String>,
  pub email:     Option<String>,
  pub phone:     Option<String>,
  pub specialty: Option<String>,
  pub notes:     Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeacherPatch {
  pub name:      Option<String>,
  pub surname:   Option<String>,
  pub email:     Option<String>,
  pub phone:     Option<String>,
  pub specialty: Option<String>,
  pub notes:     Option<String>,
}
