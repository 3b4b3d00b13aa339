use chrono::{DateTime, Utc};

use crate::{car::Car, id::DbId};

/// Snapshot of the authenticated user as returned on login and on the
/// authentication check
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct User {
    pub id: DbId,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub is_superuser: bool,
    pub date_joined: DateTime<Utc>,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
}

/// Wrapper the server uses when returning the user
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct UserEnvelope {
    pub user: User,
}

impl User {
    /// Mirrors the server, which only lets the owner update a car
    pub fn can_edit(&self, car: &Car) -> bool {
        car.user == self.id
    }

    /// Owners may delete their own cars and staff may delete any car
    pub fn can_delete(&self, car: &Car) -> bool {
        self.is_admin() || car.user == self.id
    }

    /// Staff see every user's cars through the admin endpoints
    pub fn is_admin(&self) -> bool {
        self.is_staff
    }
}
