use std::path::Path;

use axum::{
    Form, Router,
    extract::{Request, State, WebSocketUpgrade},
    http::{HeaderMap, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use common::log;
use common::tictactoe::TicTacToeSessionSettings;
use serde::Deserialize;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
};

use crate::auth::{
    AuthGate, SignIn, expired_session_cookie, session_cookie, sign_in_key_from_headers,
};
use crate::pages::sign_in_page;
use crate::server_config::ServerConfig;
use crate::ws_handler::handle_websocket;

#[derive(Clone)]
pub struct WebServerState {
    pub auth: AuthGate,
    pub session_settings: TicTacToeSessionSettings,
}

#[derive(Deserialize)]
pub struct SignInForm {
    token: String,
}

pub async fn run_web_server(config: &ServerConfig) -> Result<(), String> {
    let state = WebServerState {
        auth: AuthGate::new(&config.access_tokens),
        session_settings: config.session_settings(),
    };
    if state.auth.is_open() {
        log!("No access tokens configured, sign-in is not required");
    }

    let app = build_router(state, Path::new(&config.static_files_path));

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .map_err(|e| format!("Failed to bind {}: {}", config.bind_address, e))?;
    log!("Web server listening on {}", config.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| format!("Web server error: {}", e))?;

    log!("Web server shut down gracefully");
    Ok(())
}

pub fn build_router(state: WebServerState, static_files_path: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let ui = Router::new()
        .nest_service("/ui", ServeDir::new(static_files_path))
        .layer(middleware::from_fn_with_state(state.clone(), require_sign_in));

    Router::new()
        .route("/", get(index_handler))
        .route("/sign-in", get(sign_in_form_handler).post(sign_in_handler))
        .route("/sign-out", get(sign_out_handler))
        .route("/ws", get(ws_upgrade_handler))
        .merge(ui)
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    log!("Shutdown signal received");
}

async fn require_sign_in(
    State(state): State<WebServerState>,
    request: Request,
    next: Next,
) -> Response {
    if state.auth.may_play(request.headers()).await {
        next.run(request).await
    } else {
        Redirect::to("/sign-in").into_response()
    }
}

async fn index_handler(State(state): State<WebServerState>, headers: HeaderMap) -> Redirect {
    if state.auth.may_play(&headers).await {
        Redirect::to("/ui/")
    } else {
        Redirect::to("/sign-in")
    }
}

async fn sign_in_form_handler(State(state): State<WebServerState>, headers: HeaderMap) -> Response {
    if state.auth.may_play(&headers).await {
        return Redirect::to("/ui/").into_response();
    }
    sign_in_page(None).into_response()
}

async fn sign_in_handler(
    State(state): State<WebServerState>,
    Form(form): Form<SignInForm>,
) -> Response {
    match state.auth.sign_in(form.token.trim()).await {
        SignIn::NotRequired => Redirect::to("/").into_response(),
        SignIn::Granted(key) => (
            [(header::SET_COOKIE, session_cookie(&key))],
            Redirect::to("/"),
        )
            .into_response(),
        SignIn::Rejected => (
            StatusCode::UNAUTHORIZED,
            sign_in_page(Some("Unknown access token")),
        )
            .into_response(),
    }
}

async fn sign_out_handler(State(state): State<WebServerState>, headers: HeaderMap) -> Response {
    if let Some(key) = sign_in_key_from_headers(&headers) {
        state.auth.sign_out(&key).await;
    }
    (
        [(header::SET_COOKIE, expired_session_cookie())],
        Redirect::to("/sign-in"),
    )
        .into_response()
}

async fn ws_upgrade_handler(
    ws: WebSocketUpgrade,
    State(state): State<WebServerState>,
    headers: HeaderMap,
) -> Response {
    if !state.auth.may_play(&headers).await {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let session_settings = state.session_settings;
    ws.on_upgrade(move |socket| handle_websocket(socket, session_settings))
}
