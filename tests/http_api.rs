use std::{sync::Arc, time::Duration};

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use owl_speak_back::{
    catalog::Catalog, config::AppConfig, dao::progress_store::InMemoryProgressStore, routes,
    state::AppState,
};

struct TestApp {
    base: String,
    client: Client,
}

impl TestApp {
    async fn spawn(config: AppConfig) -> Self {
        let state = AppState::new(
            config,
            Catalog::builtin(),
            Arc::new(InMemoryProgressStore::new()),
        )
        .into_shared();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, routes::router(state)).await.unwrap();
        });

        Self {
            base: format!("http://{addr}"),
            client: Client::new(),
        }
    }

    async fn default() -> Self {
        Self::spawn(AppConfig {
            feedback_delay: Duration::ZERO,
            ..AppConfig::default()
        })
        .await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    async fn get(&self, path: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut request = self.client.get(self.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        read(request.send().await.unwrap()).await
    }

    async fn send(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Value,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut request = self.client.request(method, self.url(path)).json(&body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        read(request.send().await.unwrap()).await
    }

    async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.send(reqwest::Method::POST, path, body, None).await
    }

    async fn sign_up_and_login(&self, username: &str) -> (u64, String) {
        let (status, user) = self
            .post(
                "/api/users",
                json!({ "username": username, "password": "hoot-hoot", "name": "Asha", "age": 7 }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{user}");

        let (status, login) = self
            .post(
                "/api/auth/login",
                json!({ "username": username, "password": "hoot-hoot" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{login}");
        (
            user["id"].as_u64().unwrap(),
            login["token"].as_str().unwrap().to_owned(),
        )
    }
}

async fn read(response: reqwest::Response) -> (StatusCode, Value) {
    let status = response.status();
    let text = response.text().await.unwrap();
    let body = if text.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap_or(Value::String(text))
    };
    (status, body)
}

#[tokio::test]
async fn health_reports_ok() {
    let app = TestApp::default().await;
    let (status, body) = app.get("/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn sign_up_never_echoes_the_password_and_rejects_duplicates() {
    let app = TestApp::default().await;
    let (status, user) = app
        .post(
            "/api/users",
            json!({ "username": "asha", "password": "hoot-hoot", "name": "Asha", "language": "hi" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["language"], "hi");
    assert!(user.get("password").is_none());
    assert!(user.get("passwordDigest").is_none());

    let (status, _) = app
        .post(
            "/api/users",
            json!({ "username": "ASHA", "password": "other-pass", "name": "Asha" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .post(
            "/api/users",
            json!({ "username": "ravi", "password": "hoot-hoot", "name": "Ravi", "language": "fr" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("language"));

    let (status, fetched) = app.get(&format!("/api/users/{}", user["id"]), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["username"], "asha");
    let (status, _) = app.get("/api/users/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn login_and_current_user() {
    let app = TestApp::default().await;
    let (user_id, token) = app.sign_up_and_login("mira").await;
    assert!(token.starts_with(&format!("user_{user_id}_")));

    let (status, me) = app.get("/api/users/me", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"].as_u64(), Some(user_id));
    assert_eq!(me["age"], 7);

    let (status, _) = app
        .post(
            "/api/auth/login",
            json!({ "username": "mira", "password": "wrong" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get("/api/users/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.get("/api/users/me", Some("user_1_1000")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.get("/api/users/me", Some("garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_less_requests_use_the_demo_user_when_allowed() {
    let app = TestApp::default().await;
    let (status, progress) = app.get("/api/progress", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(progress["userId"], 1);
    assert_eq!(progress["todayStars"], 0);

    let strict = TestApp::spawn(AppConfig {
        allow_demo_user: false,
        ..AppConfig::default()
    })
    .await;
    let (status, _) = strict.get("/api/progress", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn reported_completion_updates_both_aggregates() {
    let app = TestApp::default().await;
    let (_, token) = app.sign_up_and_login("kavi").await;

    let (status, game) = app
        .send(
            reqwest::Method::POST,
            "/api/game-progress",
            json!({
                "gameId": "speakRepeat",
                "completed": true,
                "score": 3,
                "evaluation": "3/5 correct (60.0%)",
                "starsEarned": 2,
                "wordsLearned": 3,
                "timeSpent": 42
            }),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{game}");
    assert_eq!(game["timesPlayed"], 1);
    assert_eq!(game["timesCompleted"], 1);
    assert_eq!(game["bestScore"], 3);

    let (_, progress) = app.get("/api/progress", Some(&token)).await;
    assert_eq!(progress["todayStars"], 2);
    assert_eq!(progress["wordsLearned"], 3);
    assert_eq!(progress["gamesCompleted"], 1);

    let (status, all) = app.get("/api/game-progress/all", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 1);

    let (status, _) = app.get("/api/game-progress/chess", Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(
            reqwest::Method::POST,
            "/api/game-progress",
            json!({
                "gameId": "speakRepeat",
                "completed": true,
                "score": 3,
                "starsEarned": 9,
                "wordsLearned": 3
            }),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn progress_patch_overwrites_given_counters() {
    let app = TestApp::default().await;
    let (status, progress) = app
        .send(
            reqwest::Method::PUT,
            "/api/progress",
            json!({ "streak": 4, "wordsLearned": 10 }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(progress["streak"], 4);
    assert_eq!(progress["wordsLearned"], 10);
    assert_eq!(progress["todayStars"], 0);
}

#[tokio::test]
async fn speech_attempts_are_appended_and_listed() {
    let app = TestApp::default().await;
    for (speech, correct) in [("ap", false), ("apple", true)] {
        let (status, attempt) = app
            .post(
                "/api/speech-attempts",
                json!({
                    "gameId": "wordMatch",
                    "phraseId": 1,
                    "targetPhrase": "apple",
                    "userSpeech": speech,
                    "isCorrect": correct,
                    "language": "en"
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{attempt}");
    }

    let (status, attempts) = app.get("/api/speech-attempts/wordMatch", None).await;
    assert_eq!(status, StatusCode::OK);
    let attempts = attempts.as_array().unwrap();
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[0]["userSpeech"], "ap");
    assert_eq!(attempts[1]["isCorrect"], true);
}

#[tokio::test]
async fn hosted_session_round_trip() {
    let app = TestApp::default().await;
    let (status, session) = app
        .post("/api/sessions", json!({ "gameId": "wordMatch" }))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{session}");
    assert_eq!(session["phase"], "presenting");
    assert_eq!(session["currentPhrase"]["text"], "apple");
    let id = session["id"].as_str().unwrap().to_owned();

    let (status, attempt) = app
        .post(
            &format!("/api/sessions/{id}/attempts"),
            json!({ "transcript": "Apple!" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{attempt}");
    assert_eq!(attempt["verdict"]["isCorrect"], true);
    assert_eq!(attempt["session"]["currentPhraseIndex"], 1);

    let (status, _) = app
        .post(&format!("/api/sessions/{id}/attempts"), json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, ended) = app
        .post(&format!("/api/sessions/{id}/end"), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ended["phase"], "completed");
    assert_eq!(ended["reported"], true);
    assert_eq!(ended["summary"]["score"], 1);
    assert_eq!(ended["summary"]["completed"], false);

    let (status, _) = app
        .post(&format!("/api/sessions/{id}/end"), json!({}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, game) = app.get("/api/game-progress/wordMatch", None).await;
    assert_eq!(game["timesPlayed"], 1);
    assert_eq!(game["timesCompleted"], 0);
    assert_eq!(game["bestScore"], 1);

    let (status, _) = app
        .send(
            reqwest::Method::DELETE,
            &format!("/api/sessions/{id}"),
            Value::Null,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get(&format!("/api/sessions/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn sessions_are_private_to_their_user() {
    let app = TestApp::default().await;
    // The first account takes the demo user's id.
    app.sign_up_and_login("demo").await;
    let (user_id, token) = app.sign_up_and_login("nila").await;
    assert_ne!(user_id, 1);
    let (_, session) = app
        .send(
            reqwest::Method::POST,
            "/api/sessions",
            json!({ "gameId": "storyTime", "language": "hi" }),
            Some(&token),
        )
        .await;
    let id = session["id"].as_str().unwrap();

    let (status, _) = app.get(&format!("/api/sessions/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, mine) = app.get(&format!("/api/sessions/{id}"), Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine["language"], "hi");
}

#[tokio::test]
async fn catalog_and_docs_are_served() {
    let app = TestApp::default().await;
    let (status, games) = app.get("/api/games", None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = games
        .as_array()
        .unwrap()
        .iter()
        .map(|game| game["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["wordMatch", "speakRepeat", "storyTime"]);

    let (status, game) = app.get("/api/games/storyTime", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(game["phrases"].as_array().unwrap().len(), 5);
    let (status, _) = app.get("/api/games/chess", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, doc) = app.get("/api-doc/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/api/sessions"].is_object());
}

#[tokio::test]
async fn malformed_bodies_are_bad_requests_with_a_message() {
    let app = TestApp::default().await;

    let (status, body) = app.post("/api/users", json!({ "username": "asha" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("password"), "{body}");

    let (status, body) = app
        .post(
            "/api/game-progress",
            json!({
                "gameId": "wordMatch",
                "completed": true,
                "score": -1,
                "starsEarned": 0,
                "wordsLearned": 0
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string(), "{body}");

    let response = app
        .client
        .post(app.url("/api/auth/login"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    let (status, body) = read(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string(), "{body}");
}
