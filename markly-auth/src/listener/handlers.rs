use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use super::{pages, ListenerState};
use crate::finalizer::exchange_code;

const MISSING_CODE: &str = "Missing auth code. Please try signing in again.";

// GET {callback_path}
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// One-shot handler for the callback route: exchange the code, then go home
pub async fn oauth_callback(
    State(state): State<ListenerState>,
    Query(params): Query<CallbackParams>,
) -> Response {
    if let Some(description) = params.error_description.or(params.error) {
        tracing::warn!(error = %description, "Provider returned an error to the callback");
        state.outcome.finish(Err(description.clone()));
        return Html(pages::failed(&description)).into_response();
    }

    let Some(code) = params.code.filter(|code| !code.is_empty()) else {
        tracing::warn!("Callback hit without an authorization code");
        state.outcome.finish(Err(MISSING_CODE.to_string()));
        return Html(pages::failed(MISSING_CODE)).into_response();
    };

    match exchange_code(&*state.service, &code).await {
        Ok(session) => {
            tracing::info!(user_id = %session.user.id, "OAuth callback successful");
            state.outcome.stash(session.user);
            Redirect::to("/").into_response()
        }
        Err(e) => {
            let message = e.to_string();
            state.outcome.finish(Err(message.clone()));
            Html(pages::failed(&message)).into_response()
        }
    }
}

/// Landing page after a successful callback
pub async fn home(State(state): State<ListenerState>) -> Html<String> {
    match state.outcome.take_stashed() {
        Some(user) => {
            let name = user
                .display_name
                .clone()
                .or_else(|| user.email.clone())
                .unwrap_or_else(|| "there".to_string());
            state.outcome.finish(Ok(user));
            Html(pages::signed_in(&name))
        }
        None => Html(pages::waiting()),
    }
}
