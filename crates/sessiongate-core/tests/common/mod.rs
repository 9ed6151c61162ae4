#![allow(dead_code)]

use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};

pub const EMAIL: &str = "alice@example.com";
pub const PASSWORD: &str = "correct horse";

/// Mint a token the way the backend would; the client never sees the key.
pub fn mint(sub: &str, user_name: &str, exp: i64) -> String {
    let claims = json!({ "sub": sub, "userName": user_name, "exp": exp });
    encode(&Header::default(), &claims, &EncodingKey::from_secret(b"backend-secret")).unwrap()
}

/// Serve `router` on an ephemeral port and return its base URL.
pub async fn spawn_backend(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Backend accepting only `EMAIL`/`PASSWORD` and answering with `token`.
pub async fn login_backend(token: String) -> String {
    let router = Router::new().route(
        "/users/login",
        post(move |Json(body): Json<Value>| {
            let token = token.clone();
            async move {
                if body["email"] == EMAIL && body["password"] == PASSWORD {
                    (StatusCode::OK, Json(json!({ "token": token })))
                } else {
                    (
                        StatusCode::UNAUTHORIZED,
                        Json(json!({ "error": "bad credentials" })),
                    )
                }
            }
        }),
    );
    spawn_backend(router).await
}

/// Backend that always answers with a fixed status and raw body.
pub async fn fixed_backend(status: StatusCode, body: &'static str) -> String {
    let router = Router::new().route("/users/login", post(move || async move { (status, body) }));
    spawn_backend(router).await
}

/// Base URL of a port nothing listens on.
pub async fn dead_backend() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
