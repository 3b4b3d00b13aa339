use std::sync::Arc;

use car_notes_shared::user::User;
use tracing::info;

/// Holds the user of the current session, if there is one
///
/// There is only ever one of these per [`crate::Client`]
#[derive(Debug, Default)]
pub(crate) struct SessionStore {
    user: Option<Arc<User>>,
}

impl SessionStore {
    pub(crate) fn user(&self) -> Option<Arc<User>> {
        self.user.clone()
    }

    pub(crate) fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }

    /// Replaces any user already stored
    pub(crate) fn set_user(&mut self, user: User) -> Arc<User> {
        info!(username = %user.username, "session started");
        let user = Arc::new(user);
        self.user = Some(Arc::clone(&user));
        user
    }

    pub(crate) fn clear(&mut self) {
        if let Some(user) = self.user.take() {
            info!(username = %user.username, "session cleared");
        }
    }
}
