use axum::{
    Json, Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use tower_http::trace::TraceLayer;

use tracing::info;

use crate::AppState;
use crate::auth::{self, AllowList, AuthError, AuthStore, User};
use crate::chat::{ChatSession, Message, SubmitOutcome};
use crate::config::AppConfig;
use crate::llm::{GeminiDriver, GenerationClient, GenerationSettings};

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>, settings: GenerationSettings) -> anyhow::Result<()> {
    info!(
        name: "llm.config.loaded",
        base_url = %settings.base_url,
        model = %settings.model,
        "Generation configuration loaded"
    );

    // Identity store: restore the persisted session once, up front.
    let auth = AuthStore::new(
        Box::new(AllowList::builtin()),
        config.auth.store_path.clone(),
    );
    auth.restore();

    // Generation client and chat session.
    let client = GenerationClient::new(Arc::new(GeminiDriver::new(settings)));
    let chat = ChatSession::new(client);

    let state = AppState {
        auth,
        chat,
        config: config.clone(),
    };

    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

/// Build the application router.
///
/// Split out from [`start_server`] so tests can drive the router without
/// binding a socket.
pub fn build_router(state: AppState) -> Router {
    // The chat surface sits behind the route guard; everything else is public.
    let protected = Router::new()
        .route("/chat", get(chat_page_handler))
        .route("/api/chat", post(api_chat))
        .route("/api/chat/messages", get(api_get_messages))
        .route("/api/chat/clear", post(api_clear))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::route_guard,
        ));

    // Timeout is always applied; "disabled" just means a very large duration,
    // which keeps the router type uniform.
    let timeout_duration = if state.config.resilience.timeout_disabled {
        Duration::from_secs(365 * 24 * 60 * 60) // 1 year
    } else {
        Duration::from_secs(30)
    };

    Router::new()
        .route("/", get(index_handler))
        .route("/login", get(login_page_handler))
        .route("/api/login", post(api_login))
        .route("/api/logout", post(api_logout))
        .merge(protected)
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(
            move |req: Request, next: Next| {
                let duration = timeout_duration;
                async move {
                    match tokio::time::timeout(duration, next.run(req)).await {
                        Ok(res) => res,
                        Err(_) => {
                            (StatusCode::REQUEST_TIMEOUT, "Request timed out").into_response()
                        }
                    }
                }
            },
        ))
        .with_state(state)
}

// ─────────────────────────────────────────────────────────────────────────────
// HTML Page Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Generate the HTML shell for a page.
fn html_shell(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="description" content="Gadget review chat assistant">
    <title>{title} - Gadget Chat</title>
</head>
<body>
    <header>
        <nav>
            <a href="/">Home</a>
            <a href="/chat">Chat</a>
            <a href="/login">Login</a>
        </nav>
    </header>
    <main>
        {content}
    </main>
</body>
</html>"#
    )
}

/// Landing page content.
fn index_content() -> &'static str {
    r#"
    <h1>Gadget Review Assistant</h1>
    <p>Ask about gadgets, reviews, or comparisons. Log in to start chatting.</p>
    <p><a href="/chat">Go to chat</a></p>
    "#
}

/// Login form content. Submits as JSON and follows the `from` parameter
/// carried by the route guard (falling back to the chat page).
fn login_content() -> &'static str {
    r#"
    <h1>Login</h1>
    <form id="login-form">
        <label>Email <input type="email" name="email" required></label>
        <label>Password <input type="password" name="password" required></label>
        <button type="submit">Login</button>
    </form>
    <p id="login-error" role="alert" hidden>Invalid email or password</p>
    <script>
    document.getElementById('login-form').addEventListener('submit', async (e) => {
        e.preventDefault();
        const form = new FormData(e.target);
        const res = await fetch('/api/login', {
            method: 'POST',
            headers: { 'Content-Type': 'application/json' },
            body: JSON.stringify({ email: form.get('email'), password: form.get('password') }),
        });
        if (res.ok) {
            const from = new URLSearchParams(location.search).get('from');
            location.assign(from || '/chat');
        } else {
            document.getElementById('login-error').hidden = false;
        }
    });
    </script>
    "#
}

/// Chat page content, rendered with the current transcript state.
fn chat_content(user: &User, message_count: usize) -> String {
    format!(
        r#"
    <h1>Chat</h1>
    <p>Signed in as {name} &middot; <span id="count">{message_count}</span> messages</p>
    <ul id="transcript"></ul>
    <form id="chat-form">
        <input type="text" name="message" placeholder="Type your message..." autofocus>
        <button type="submit">Send</button>
        <button type="button" id="clear">Clear chat</button>
    </form>
    <p id="chat-error" role="alert" hidden>Failed to get response from the AI</p>
    <script>
    async function refresh() {{
        const res = await fetch('/api/chat/messages');
        const messages = await res.json();
        const list = document.getElementById('transcript');
        list.innerHTML = '';
        for (const m of messages) {{
            const li = document.createElement('li');
            li.textContent = m.role + ': ' + m.content;
            list.appendChild(li);
        }}
        document.getElementById('count').textContent = messages.length;
    }}
    document.getElementById('chat-form').addEventListener('submit', async (e) => {{
        e.preventDefault();
        const input = e.target.elements.message;
        const res = await fetch('/api/chat', {{
            method: 'POST',
            headers: {{ 'Content-Type': 'application/json' }},
            body: JSON.stringify({{ message: input.value }}),
        }});
        document.getElementById('chat-error').hidden = res.ok;
        input.value = '';
        await refresh();
    }});
    document.getElementById('clear').addEventListener('click', async () => {{
        await fetch('/api/chat/clear', {{ method: 'POST' }});
        await refresh();
    }});
    refresh();
    </script>
    "#,
        name = user.name,
    )
}

/// Index page handler.
async fn index_handler() -> impl IntoResponse {
    Html(html_shell("Home", index_content()))
}

/// Login page handler.
async fn login_page_handler() -> impl IntoResponse {
    Html(html_shell("Login", login_content()))
}

/// Chat page handler. The route guard has already established a user.
async fn chat_page_handler(State(state): State<AppState>) -> Response {
    match state.auth.current_user() {
        Some(user) => Html(html_shell(
            "Chat",
            &chat_content(&user, state.chat.message_count()),
        ))
        .into_response(),
        // The guard redirects before this handler runs.
        None => Redirect::to("/login").into_response(),
    }
}

/// Catch-all: everything unknown goes back to the landing page.
async fn fallback_handler() -> Redirect {
    Redirect::to("/")
}

// ─────────────────────────────────────────────────────────────────────────────
// API Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Request body for the login API.
#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

/// Error body for failed API calls.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// POST /api/login - Verify credentials and establish the session.
async fn api_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<User>, (StatusCode, Json<ErrorResponse>)> {
    match state.auth.login(&req.email, &req.password) {
        Ok(user) => Ok(Json(user)),
        Err(e @ AuthError::InvalidCredentials) => Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}

/// POST /api/logout - Clear the session.
async fn api_logout(State(state): State<AppState>) -> StatusCode {
    state.auth.logout();
    StatusCode::NO_CONTENT
}

/// Request body for the chat API.
#[derive(Debug, Deserialize)]
struct ChatRequest {
    /// User message content.
    message: String,
}

/// Response from the chat API.
#[derive(Debug, Serialize)]
struct ChatResponse {
    /// What the submission did: "replied", "ignored", "busy", or "discarded".
    outcome: &'static str,
    /// The transcript after the submission resolved.
    messages: Vec<Message>,
}

/// POST /api/chat - Submit a prompt and wait for the reply.
async fn api_chat(State(state): State<AppState>, Json(req): Json<ChatRequest>) -> Json<ChatResponse> {
    let outcome = state.chat.submit(&req.message).await;
    let outcome = match outcome {
        SubmitOutcome::Replied => "replied",
        SubmitOutcome::Ignored => "ignored",
        SubmitOutcome::Busy => "busy",
        SubmitOutcome::Discarded => "discarded",
    };

    Json(ChatResponse {
        outcome,
        messages: state.chat.messages(),
    })
}

/// GET /api/chat/messages - The current transcript.
async fn api_get_messages(State(state): State<AppState>) -> Json<Vec<Message>> {
    Json(state.chat.messages())
}

/// POST /api/chat/clear - Empty the transcript.
async fn api_clear(State(state): State<AppState>) -> StatusCode {
    state.chat.clear();
    StatusCode::NO_CONTENT
}
