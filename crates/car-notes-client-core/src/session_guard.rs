//! Restores the session after the client starts (or the page is reloaded) by
//! asking the server if its session cookie is still valid

use std::sync::Arc;

use car_notes_shared::user::User;
use futures::channel::oneshot;
use tracing::{info, warn};

use crate::{client::UiCallBack, Client};

/// Issues the authentication check at most once, no matter how often it is
/// polled
#[derive(Debug, Default)]
pub struct SessionGuard {
    state: GuardState,
}

#[derive(Debug, Default)]
enum GuardState {
    #[default]
    NotStarted,
    Checking(oneshot::Receiver<anyhow::Result<Arc<User>>>),
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardStatus {
    /// Waiting for the server, protected pages should not be shown yet
    Checking,
    /// The session store reflects the server, route guards can be applied
    Ready,
}

impl SessionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the check on the first call and reports when it has finished
    ///
    /// If a user is already logged in no check is sent. Failures (including
    /// network errors) end the session in the client and still lead to
    /// [`GuardStatus::Ready`].
    pub fn poll<F: UiCallBack>(&mut self, client: &Client, ui_notify: F) -> GuardStatus {
        match &mut self.state {
            GuardState::NotStarted => {
                if client.is_logged_in() {
                    self.state = GuardState::Done;
                    return GuardStatus::Ready;
                }
                info!("checking if the server still has a session");
                self.state = GuardState::Checking(client.check_authenticated(ui_notify));
                GuardStatus::Checking
            }
            GuardState::Checking(rx) => match rx.try_recv() {
                Ok(None) => GuardStatus::Checking,
                Ok(Some(result)) => {
                    match result {
                        Ok(user) => info!(username = %user.username, "session restored"),
                        Err(e) => info!(?e, "no session to restore"),
                    }
                    self.state = GuardState::Done;
                    GuardStatus::Ready
                }
                Err(e) => {
                    warn!(?e, "session check dropped without an answer");
                    client.logout_no_wait();
                    self.state = GuardState::Done;
                    GuardStatus::Ready
                }
            },
            GuardState::Done => GuardStatus::Ready,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, GuardState::Done)
    }
}
