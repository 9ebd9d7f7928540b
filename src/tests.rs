use actix_web::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        StatusCode,
    },
    test, App,
};
use uuid::Uuid;

use crate::{
    auth::tests::valid_token,
    configure_endpoints,
    media::tests::FakeMedia,
    repo::VideoRecord,
    state::{tests::state, State},
    store::tests::SpyStore,
};

const BOUNDARY: &str = "vidkeep-test-boundary";

fn multipart(field: &str, content_type: Option<&str>, body: &[u8]) -> Vec<u8> {
    let mut payload = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"{field}\"; filename=\"clip.mp4\"\r\n"
    )
    .into_bytes();
    if let Some(content_type) = content_type {
        payload.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
    }
    payload.extend_from_slice(b"\r\n");
    payload.extend_from_slice(body);
    payload.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    payload
}

fn upload_request(video_id: &str, token: Option<&str>, content_type: &str) -> test::TestRequest {
    let request = multipart_request(
        video_id,
        multipart("video", Some(content_type), b"raw mp4 bytes"),
    );

    match token {
        Some(token) => request.insert_header((AUTHORIZATION, format!("Bearer {token}"))),
        None => request,
    }
}

fn multipart_request(video_id: &str, payload: Vec<u8>) -> test::TestRequest {
    test::TestRequest::post()
        .uri(&format!("/api/video_upload/{video_id}"))
        .insert_header((
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        ))
        .set_payload(payload)
}

fn staged_files(state: &State<SpyStore>) -> usize {
    std::fs::read_dir(state.tmp_dir.path())
        .expect("Read tmp dir")
        .count()
}

async fn draft(state: &State<SpyStore>, owner: Uuid) -> VideoRecord {
    let record = VideoRecord::draft(owner, String::from("clip"), Some(String::from("a clip")));
    state.repo.create(&record).await.expect("Created");
    record
}

#[actix_web::test]
async fn upload_responds_with_playable_record() {
    let state = state(SpyStore::default(), FakeMedia::new(1920, 1080), 16).await;
    let owner = Uuid::new_v4();
    let record = draft(&state, owner).await;

    let app = test::init_service(
        App::new().configure(|sc| configure_endpoints(sc, state.clone())),
    )
    .await;

    let req = upload_request(&record.id.to_string(), Some(&valid_token(owner)), "video/mp4")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: serde_json::Value = test::read_body_json(resp).await;
    let url = body["video_url"].as_str().expect("Has url");
    assert!(
        url.starts_with("https://storage.example.com/videos/landscape/"),
        "{url}"
    );
    assert!(url.ends_with("?expires=300"), "{url}");
    assert_eq!(body["id"], record.id.to_string());

    let stored = state
        .repo
        .get(record.id)
        .await
        .expect("Fetched")
        .expect("Present");
    let locator = stored.video_url.expect("Has locator");
    assert!(locator.starts_with("videos,landscape/"), "{locator}");
    assert_eq!(state.store.writes(), 1);
}

#[actix_web::test]
async fn upload_rejections() {
    let state = state(SpyStore::default(), FakeMedia::new(1920, 1080), 16).await;
    let owner = Uuid::new_v4();
    let record = draft(&state, owner).await;
    let id = record.id.to_string();

    let app = test::init_service(
        App::new().configure(|sc| configure_endpoints(sc, state.clone())),
    )
    .await;

    let owner_token = valid_token(owner);
    let stranger_token = valid_token(Uuid::new_v4());

    let cases = [
        (
            upload_request(&id, None, "video/mp4"),
            StatusCode::UNAUTHORIZED,
            "unauthenticated",
        ),
        (
            upload_request(&id, Some("not-a-jwt"), "video/mp4"),
            StatusCode::UNAUTHORIZED,
            "invalid-token",
        ),
        (
            upload_request(&id, Some(&stranger_token), "video/mp4"),
            StatusCode::FORBIDDEN,
            "not-authorized",
        ),
        (
            upload_request(&id, Some(&owner_token), "video/quicktime"),
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "unsupported-media-type",
        ),
        (
            upload_request("not-a-uuid", Some(&owner_token), "video/mp4"),
            StatusCode::BAD_REQUEST,
            "invalid-video-id",
        ),
        (
            upload_request(&Uuid::new_v4().to_string(), Some(&owner_token), "video/mp4"),
            StatusCode::NOT_FOUND,
            "record-not-found",
        ),
    ];

    for (req, status, code) in cases {
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), status, "{code}");

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], code);
        assert!(body["msg"].is_string());
    }

    assert_eq!(state.store.writes(), 0);
    assert_eq!(
        state.repo.get(record.id).await.expect("Fetched"),
        Some(record)
    );
}

#[actix_web::test]
async fn malformed_multipart_parts_are_rejected() {
    let state = state(SpyStore::default(), FakeMedia::new(1920, 1080), 1).await;
    let owner = Uuid::new_v4();
    let record = draft(&state, owner).await;
    let id = record.id.to_string();
    let token = valid_token(owner);

    let app = test::init_service(
        App::new().configure(|sc| configure_endpoints(sc, state.clone())),
    )
    .await;

    let oversized = vec![0u8; 2 * 1024 * 1024];

    let cases = [
        (
            multipart("video", None, b"raw mp4 bytes"),
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "unsupported-media-type",
        ),
        (
            multipart("video", Some("video/mp4"), &oversized),
            StatusCode::PAYLOAD_TOO_LARGE,
            "payload-too-large",
        ),
        (
            multipart("attachment", Some("video/mp4"), b"raw mp4 bytes"),
            StatusCode::BAD_REQUEST,
            "file-upload-error",
        ),
    ];

    for (payload, status, code) in cases {
        let req = multipart_request(&id, payload)
            .insert_header((AUTHORIZATION, format!("Bearer {token}")))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), status, "{code}");

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], code);
    }

    assert_eq!(state.store.writes(), 0);
    assert_eq!(staged_files(&state), 0);
    assert_eq!(
        state.repo.get(record.id).await.expect("Fetched"),
        Some(record)
    );
}

#[actix_web::test]
async fn create_list_and_fetch_videos() {
    let state = state(SpyStore::default(), FakeMedia::new(608, 1080), 16).await;
    let owner = Uuid::new_v4();
    let token = valid_token(owner);

    let app = test::init_service(
        App::new().configure(|sc| configure_endpoints(sc, state.clone())),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/videos")
        .insert_header((AUTHORIZATION, format!("Bearer {token}")))
        .set_json(serde_json::json!({ "title": "holiday" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let created: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(created["title"], "holiday");
    assert_eq!(created["user_id"], owner.to_string());
    assert!(created["video_url"].is_null());
    let id = created["id"].as_str().expect("Has id").to_string();

    let req = upload_request(&id, Some(&token), "video/mp4").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/api/videos")
        .insert_header((AUTHORIZATION, format!("Bearer {token}")))
        .to_request();
    let listed: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let listed = listed.as_array().expect("Array");
    assert_eq!(listed.len(), 1);
    let url = listed[0]["video_url"].as_str().expect("Signed");
    assert!(
        url.starts_with("https://storage.example.com/videos/portrait/"),
        "{url}"
    );

    let req = test::TestRequest::get()
        .uri(&format!("/api/videos/{id}"))
        .insert_header((AUTHORIZATION, format!("Bearer {token}")))
        .to_request();
    let fetched: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched["id"], id.as_str());
    assert!(fetched["video_url"]
        .as_str()
        .expect("Signed")
        .contains("expires=300"));

    let req = test::TestRequest::get()
        .uri(&format!("/api/videos/{id}"))
        .insert_header((
            AUTHORIZATION,
            format!("Bearer {}", valid_token(Uuid::new_v4())),
        ))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn lists_are_per_user() {
    let state = state(SpyStore::default(), FakeMedia::new(1920, 1080), 16).await;
    let owner = Uuid::new_v4();
    draft(&state, owner).await;
    draft(&state, Uuid::new_v4()).await;

    let app = test::init_service(
        App::new().configure(|sc| configure_endpoints(sc, state.clone())),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/videos")
        .insert_header((AUTHORIZATION, format!("Bearer {}", valid_token(owner))))
        .to_request();
    let listed: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    let listed = listed.as_array().expect("Array");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["user_id"], owner.to_string());
    assert!(listed[0]["video_url"].is_null());

    let req = test::TestRequest::get().uri("/api/videos").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn malformed_video_id_is_bad_request() {
    let state = state(SpyStore::default(), FakeMedia::new(1920, 1080), 16).await;

    let app = test::init_service(
        App::new().configure(|sc| configure_endpoints(sc, state.clone())),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/videos/12345")
        .insert_header((
            AUTHORIZATION,
            format!("Bearer {}", valid_token(Uuid::new_v4())),
        ))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "invalid-video-id");
}

#[actix_web::test]
async fn healthz_checks_collaborators() {
    let state = state(SpyStore::default(), FakeMedia::new(1920, 1080), 16).await;

    let app = test::init_service(
        App::new().configure(|sc| configure_endpoints(sc, state.clone())),
    )
    .await;

    let req = test::TestRequest::get().uri("/healthz").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}
