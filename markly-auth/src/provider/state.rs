use crate::common::UserIdentity;

/// Auth state shared with presentation code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<UserIdentity>,
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for AuthState {
    /// Loading until the mount sequence resolves
    fn default() -> Self {
        Self {
            user: None,
            loading: true,
            error: None,
        }
    }
}

/// Inputs to the auth state reducer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    // Mount sequence
    FinalizeFailed(String),
    UserLoaded(Option<UserIdentity>),
    UserLoadFailed(String),

    // Auth-state-change stream
    SessionChanged(Option<UserIdentity>),

    // Sign-in / sign-out actions
    ActionStarted,
    ActionFailed(String),
    ActionFinished,
    SignedOut,
}

/// Pure state transition function for auth events
pub fn reduce(state: &mut AuthState, event: AuthEvent) {
    match event {
        // Keep loading: the user fetch still follows
        AuthEvent::FinalizeFailed(message) => {
            state.error = Some(message);
        }

        AuthEvent::UserLoaded(user) => {
            state.user = user;
            state.loading = false;
        }

        // Failed fetch keeps whatever user the change stream reported
        AuthEvent::UserLoadFailed(message) => {
            state.error = Some(message);
            state.loading = false;
        }

        AuthEvent::SessionChanged(user) => {
            state.user = user;
        }

        AuthEvent::ActionStarted => {
            state.loading = true;
            state.error = None;
        }

        AuthEvent::ActionFailed(message) => {
            state.error = Some(message);
        }

        AuthEvent::ActionFinished => {
            state.loading = false;
        }

        AuthEvent::SignedOut => {
            state.user = None;
        }
    }
}
