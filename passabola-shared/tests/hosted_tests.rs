/// Integration tests for the hosted REST clients
///
/// A mockito server stands in for the hosted project and checks that the
/// clients speak the auth and table APIs' wire formats.

use mockito::{Matcher, Server};
use passabola_shared::{
    auth::jwt,
    backend::{
        hosted::{HostedConfig, HostedConnector},
        BackendError, Connector, SessionEvent,
    },
    models::{
        profile::{NewProfile, Position},
        team::NewTeam,
    },
};
use serde_json::json;
use uuid::Uuid;

const ANON_KEY: &str = "public-anon-key";
const SITE_URL: &str = "https://passaabola.example";
const JWT_SECRET: &str = "hosted-test-jwt-secret-at-least-32-bytes";

fn connector(url: String, jwt_secret: Option<&str>) -> HostedConnector {
    HostedConnector::new(HostedConfig {
        url,
        anon_key: ANON_KEY.to_string(),
        jwt_secret: jwt_secret.map(str::to_string),
    })
    .unwrap()
}

fn user(id: Uuid) -> serde_json::Value {
    json!({
        "id": id,
        "aud": "authenticated",
        "email": "marta@example.com",
        "user_metadata": { "full_name": "Marta Vieira da Silva" }
    })
}

fn grant(id: Uuid) -> String {
    json!({
        "access_token": "user-access-token",
        "token_type": "bearer",
        "expires_in": 3600,
        "refresh_token": "user-refresh-token",
        "user": user(id)
    })
    .to_string()
}

#[tokio::test]
async fn test_signup_pending_confirmation_returns_identity() {
    let mut server = Server::new_async().await;
    let id = Uuid::new_v4();

    let mock = server
        .mock("POST", "/auth/v1/signup")
        .match_query(Matcher::UrlEncoded("redirect_to".into(), SITE_URL.into()))
        .match_header("apikey", ANON_KEY)
        .match_body(Matcher::PartialJson(json!({
            "email": "marta@example.com",
            "password": "segredo123",
            "data": { "full_name": "Marta Vieira da Silva" }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(user(id).to_string())
        .create_async()
        .await;

    let client = connector(server.url(), None).connect(None).await.unwrap();
    let identity = client
        .identity
        .create_identity(
            "marta@example.com",
            "segredo123",
            SITE_URL,
            json!({ "full_name": "Marta Vieira da Silva" }),
        )
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(identity.map(|i| i.id), Some(id));
    assert!(client.identity.current_session().await.unwrap().is_none());
}

#[tokio::test]
async fn test_signup_rejection_keeps_provider_message() {
    let mut server = Server::new_async().await;

    server
        .mock("POST", "/auth/v1/signup")
        .match_query(Matcher::Any)
        .with_status(422)
        .with_header("content-type", "application/json")
        .with_body(json!({ "code": 422, "msg": "User already registered" }).to_string())
        .create_async()
        .await;

    let client = connector(server.url(), None).connect(None).await.unwrap();
    let err = client
        .identity
        .create_identity("marta@example.com", "segredo123", SITE_URL, json!({}))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        BackendError::Rejected {
            status: 422,
            message: "User already registered".to_string()
        }
    );
}

#[tokio::test]
async fn test_password_grant_signs_in_and_announces() {
    let mut server = Server::new_async().await;
    let id = Uuid::new_v4();

    let mock = server
        .mock("POST", "/auth/v1/token")
        .match_query(Matcher::UrlEncoded("grant_type".into(), "password".into()))
        .match_body(Matcher::Json(json!({
            "email": "marta@example.com",
            "password": "segredo123"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(grant(id))
        .create_async()
        .await;

    let client = connector(server.url(), None).connect(None).await.unwrap();
    let mut feed = client.identity.session_changes();

    let session = client
        .identity
        .authenticate("marta@example.com", "segredo123")
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(session.user.id, id);
    assert_eq!(session.refresh_token.as_deref(), Some("user-refresh-token"));
    assert!(session.expires_at.is_some());

    let change = feed.recv().await.unwrap();
    assert_eq!(change.event, SessionEvent::SignedIn);
}

#[tokio::test]
async fn test_invalid_grant_uses_error_description() {
    let mut server = Server::new_async().await;

    server
        .mock("POST", "/auth/v1/token")
        .match_query(Matcher::Any)
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "error": "invalid_grant",
                "error_description": "Invalid login credentials"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = connector(server.url(), None).connect(None).await.unwrap();
    let err = client
        .identity
        .authenticate("marta@example.com", "errada")
        .await
        .unwrap_err();

    assert_eq!(err.user_message(), "Invalid login credentials");
}

#[tokio::test]
async fn test_table_writes_use_the_signed_in_token() {
    let mut server = Server::new_async().await;
    let id = Uuid::new_v4();

    server
        .mock("POST", "/auth/v1/token")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(grant(id))
        .create_async()
        .await;

    let insert = server
        .mock("POST", "/rest/v1/profiles")
        .match_header("authorization", "Bearer user-access-token")
        .match_header("apikey", ANON_KEY)
        .match_header("prefer", "return=representation")
        .match_body(Matcher::PartialJson(json!({
            "id": id,
            "full_name": "Marta Vieira da Silva",
            "position": "Atacante",
            "birth_date": "1986-02-19"
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(
            json!([{
                "id": id,
                "full_name": "Marta Vieira da Silva",
                "nickname": null,
                "position": "Atacante",
                "birth_date": "1986-02-19",
                "phone": null,
                "avatar_url": null,
                "created_at": "2025-03-01T12:00:00+00:00",
                "updated_at": "2025-03-01T12:00:00+00:00"
            }])
            .to_string(),
        )
        .create_async()
        .await;

    let client = connector(server.url(), None).connect(None).await.unwrap();
    client
        .identity
        .authenticate("marta@example.com", "segredo123")
        .await
        .unwrap();

    let profile = client
        .tables
        .insert_profile(NewProfile {
            id,
            full_name: "Marta Vieira da Silva".to_string(),
            nickname: None,
            position: Some(Position::Atacante),
            birth_date: chrono::NaiveDate::from_ymd_opt(1986, 2, 19),
            phone: None,
        })
        .await
        .unwrap();

    insert.assert_async().await;
    assert_eq!(profile.id, id);
}

#[tokio::test]
async fn test_anonymous_reads_use_the_anon_key() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/rest/v1/news")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("select".into(), "*".into()),
            Matcher::UrlEncoded("order".into(), "published_at.desc".into()),
        ]))
        .match_header("authorization", format!("Bearer {}", ANON_KEY).as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
        .create_async()
        .await;

    let client = connector(server.url(), None).connect(None).await.unwrap();
    let news = client.tables.list_news().await.unwrap();

    mock.assert_async().await;
    assert!(news.is_empty());
}

#[tokio::test]
async fn test_find_profile_without_rows_is_none() {
    let mut server = Server::new_async().await;
    let id = Uuid::new_v4();

    server
        .mock("GET", "/rest/v1/profiles")
        .match_query(Matcher::UrlEncoded("id".into(), format!("eq.{}", id)))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
        .create_async()
        .await;

    let client = connector(server.url(), None).connect(None).await.unwrap();

    assert!(client.tables.find_profile(id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_table_rejection_keeps_message() {
    let mut server = Server::new_async().await;

    server
        .mock("POST", "/rest/v1/teams")
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "code": "42501",
                "message": "new row violates row-level security policy for table \"teams\""
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = connector(server.url(), None).connect(None).await.unwrap();
    let err = client
        .tables
        .insert_team(NewTeam {
            name: "Guerreiras do Norte".to_string(),
            founded_year: None,
            description: None,
        })
        .await
        .unwrap_err();

    assert!(err.user_message().contains("row-level security"));
}

#[tokio::test]
async fn test_connect_verifies_token_locally_with_secret() {
    let server = Server::new_async().await;
    let id = Uuid::new_v4();
    let claims = jwt::Claims::new(id, "marta@example.com", json!({}));
    let token = jwt::create_token(&claims, JWT_SECRET).unwrap();

    let connector = connector(server.url(), Some(JWT_SECRET));

    let client = connector.connect(Some(&token)).await.unwrap();
    let session = client.identity.current_session().await.unwrap().unwrap();
    assert_eq!(session.user.id, id);

    let forged = jwt::create_token(&claims, "some-other-secret-32-bytes-long!!!").unwrap();
    let anonymous = connector.connect(Some(&forged)).await.unwrap();
    assert!(anonymous.identity.current_session().await.unwrap().is_none());
}

#[tokio::test]
async fn test_connect_asks_auth_api_without_secret() {
    let mut server = Server::new_async().await;
    let id = Uuid::new_v4();

    server
        .mock("GET", "/auth/v1/user")
        .match_header("authorization", "Bearer good-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(user(id).to_string())
        .create_async()
        .await;
    server
        .mock("GET", "/auth/v1/user")
        .match_header("authorization", "Bearer stale-token")
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(json!({ "msg": "invalid JWT" }).to_string())
        .create_async()
        .await;

    let connector = connector(server.url(), None);

    let client = connector.connect(Some("good-token")).await.unwrap();
    let session = client.identity.current_session().await.unwrap().unwrap();
    assert_eq!(session.user.id, id);

    let anonymous = connector.connect(Some("stale-token")).await.unwrap();
    assert!(anonymous.identity.current_session().await.unwrap().is_none());
}

#[tokio::test]
async fn test_sign_out_announces_even_when_revoke_fails() {
    let mut server = Server::new_async().await;
    let id = Uuid::new_v4();

    server
        .mock("POST", "/auth/v1/token")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(grant(id))
        .create_async()
        .await;
    let logout = server
        .mock("POST", "/auth/v1/logout")
        .match_header("authorization", "Bearer user-access-token")
        .with_status(500)
        .create_async()
        .await;

    let client = connector(server.url(), None).connect(None).await.unwrap();
    client
        .identity
        .authenticate("marta@example.com", "segredo123")
        .await
        .unwrap();
    let mut feed = client.identity.session_changes();

    client.identity.sign_out().await.unwrap();

    logout.assert_async().await;
    assert_eq!(feed.recv().await.unwrap().event, SessionEvent::SignedOut);
    assert!(client.identity.current_session().await.unwrap().is_none());
}
