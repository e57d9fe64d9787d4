//! FileRegistry against a mock backend

use codexec_account::{CredentialReader, FileRegistry};
use codexec_foundation::{ArtifactDraft, ArtifactId, Credential, Error, Language, ShareLink};
use codexec_transport::HttpTransport;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn registry(server: &MockServer) -> FileRegistry {
    let transport = HttpTransport::new(&server.uri(), "/api").unwrap();
    FileRegistry::new(transport, CredentialReader::fixed(Some(Credential::new("tok"))))
}

fn no_authorization(req: &Request) -> bool {
    !req.headers.contains_key("authorization")
}

#[tokio::test]
async fn list_is_cached_until_create() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/files"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "filename": "a", "language": "python", "owner_username": "ana",
             "created_at": "2024-05-01T10:00:00"},
            {"id": 2, "filename": "b", "language": "java", "owner_username": "ana",
             "created_at": "2024-05-02T10:00:00"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(
            {"id": 3, "filename": "c", "language": "c", "owner_username": "ana",
             "created_at": "2024-05-03T10:00:00"}
        )))
        .mount(&server)
        .await;

    let files = registry(&server);
    assert!(files.cached().await.is_none());

    let listed = files.list().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(files.cached().await, Some(listed));

    files
        .create(&ArtifactDraft::new("c", Language::C, "int main(){}"))
        .await
        .unwrap();
    assert!(files.cached().await.is_none());
}

#[tokio::test]
async fn listing_started_before_create_is_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/files"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(std::time::Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(
            {"id": 9, "filename": "late", "language": "python"}
        )))
        .mount(&server)
        .await;

    let files = registry(&server);
    let (listed, created) = tokio::join!(files.list(), async {
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        files
            .create(&ArtifactDraft::new("late", Language::Python, "print(9)"))
            .await
    });

    assert!(listed.unwrap().is_empty());
    assert_eq!(created.unwrap().id, ArtifactId::new("9"));
    assert!(files.cached().await.is_none());

    // a fresh listing after the change is cached again
    files.list().await.unwrap();
    assert_eq!(files.cached().await, Some(vec![]));
}

#[tokio::test]
async fn create_rejects_empty_filename_without_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = registry(&server)
        .create(&ArtifactDraft::new("  ", Language::Python, "print(1)"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[tokio::test]
async fn save_fetch_share_round_trip() {
    let server = MockServer::start().await;
    let code = "print('hi')\n";

    Mock::given(method("POST"))
        .and(path("/api/files"))
        .and(body_json(json!({"filename": "hello", "language": "python", "code": code})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(
            {"id": 5, "filename": "hello", "language": "python", "owner_username": "ana",
             "created_at": "2024-05-01T10:00:00"}
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/files/5"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(
            {"filename": "hello", "language": "python", "code": code}
        )))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/files/share/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(
            {"share_url": "http://localhost:3000/files/shared/Xy12Ab34"}
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/files/Xy12Ab34"))
        .and(no_authorization)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(
            {"filename": "hello", "language": "python", "code": code, "owner_username": "ana"}
        )))
        .expect(1)
        .mount(&server)
        .await;

    let files = registry(&server);
    let draft = ArtifactDraft::new("hello", Language::Python, code);
    let saved = files.create(&draft).await.unwrap();
    assert_eq!(saved.id, ArtifactId::new("5"));

    let fetched = files.fetch(&saved.id).await.unwrap();
    assert_eq!(
        (fetched.filename.as_str(), fetched.language, fetched.code.as_str()),
        (draft.filename.as_str(), draft.language, draft.code.as_str())
    );

    let link = files.share(&saved.id).await.unwrap();
    assert_eq!(link.share_id, "Xy12Ab34");

    let shared = files.fetch_shared(&link).await.unwrap();
    assert_eq!(shared.code, fetched.code);
    assert_eq!(shared.owner_username.as_deref(), Some("ana"));
}

#[tokio::test]
async fn fetch_after_delete_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/files/9"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/files/9"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "File not found."})))
        .mount(&server)
        .await;

    let files = registry(&server);
    let id = ArtifactId::new("9");
    files.delete(&id).await.unwrap();

    let err = files.fetch(&id).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.user_message(), "File not found.");
}

#[tokio::test]
async fn transport_failures_propagate() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/files"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = registry(&server).list().await.unwrap_err();
    assert_eq!(err.http_status(), Some(500));
    assert!(matches!(err, Error::Transport { .. }));
}

#[tokio::test]
async fn share_url_without_id_is_protocol_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/files/share/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"share_url": "http://"})))
        .mount(&server)
        .await;

    let err = registry(&server).share(&ArtifactId::new("1")).await.unwrap_err();
    assert!(matches!(err, Error::Protocol(_)));
}

#[tokio::test]
async fn fetch_shared_from_pasted_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/files/Qw3rTy12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(
            {"filename": "x", "language": "javascript", "code": "1+1", "owner_username": "ben"}
        )))
        .mount(&server)
        .await;

    let files = FileRegistry::new(
        HttpTransport::new(&server.uri(), "/api").unwrap(),
        CredentialReader::fixed(None),
    );
    let link = ShareLink::parse("http://localhost:3000/files/shared/Qw3rTy12").unwrap();
    let content = files.fetch_shared(&link).await.unwrap();
    assert_eq!(content.language, Language::Javascript);
}
