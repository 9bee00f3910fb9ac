mod common;

use common::{fast_poller, stability_client, ScriptedResponder};
use mediagen::{MediaGenError, Submission, VideoParams, VideoVariant};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_submit_falls_back_to_next_variant_on_404() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2alpha/generation/image-to-video"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v2beta/image-to-video"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "gen_42" })))
        .expect(1)
        .mount(&server)
        .await;

    let submission = stability_client(&server)
        .submit_image_to_video(b"png", &VideoParams::default())
        .await
        .unwrap();

    assert_eq!(submission.id.as_str(), "gen_42");
    assert_eq!(submission.variant, VideoVariant::V2Beta);
}

#[tokio::test]
async fn test_submit_hard_failure_is_not_retried_elsewhere() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2alpha/generation/image-to-video"))
        .respond_with(ResponseTemplate::new(402).set_body_string("insufficient credits"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v2beta/image-to-video"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "never" })))
        .expect(0)
        .mount(&server)
        .await;

    let err = stability_client(&server)
        .submit_image_to_video(b"png", &VideoParams::default())
        .await
        .unwrap_err();

    assert!(matches!(err, MediaGenError::SubmitFailed { status: 402, .. }));
}

#[tokio::test]
async fn test_submit_exhausting_all_variants() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2alpha/generation/image-to-video"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "queued": true })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v2beta/image-to-video"))
        .respond_with(ResponseTemplate::new(405).set_body_string("method not allowed"))
        .mount(&server)
        .await;

    let err = stability_client(&server)
        .submit_image_to_video(b"png", &VideoParams::default())
        .await
        .unwrap_err();

    match err {
        MediaGenError::EndpointsExhausted { last_error } => {
            assert!(last_error.contains("405"));
        }
        other => panic!("expected EndpointsExhausted, got {other:?}"),
    }
}

#[tokio::test]
async fn test_result_polling_returns_inline_video() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2beta/image-to-video/result/gen_7"))
        .and(header("accept", "video/*"))
        .respond_with(ScriptedResponder::new(vec![
            ResponseTemplate::new(202).set_body_json(json!({ "id": "gen_7", "status": "in-progress" })),
            ResponseTemplate::new(202).set_body_json(json!({ "id": "gen_7", "status": "in-progress" })),
            ResponseTemplate::new(200).set_body_bytes("stability mp4"),
        ]))
        .expect(3)
        .mount(&server)
        .await;

    let out_dir = tempfile::tempdir().unwrap();
    let client = stability_client(&server);
    let submission = Submission {
        id: "gen_7".into(),
        variant: VideoVariant::V2Beta,
    };
    let path = fast_poller()
        .run(
            &client.video_result(&submission),
            &submission.id,
            &mediagen::ArtifactFetcher::new().unwrap(),
            out_dir.path().join("video_gen_7.mp4"),
        )
        .await
        .unwrap();

    assert_eq!(std::fs::read_to_string(path).unwrap(), "stability mp4");
}

#[tokio::test]
async fn test_generate_video_falls_back_on_result_endpoints() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2alpha/generation/image-to-video"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v2beta/image-to-video"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "generation_id": "gen_8" })))
        .expect(1)
        .mount(&server)
        .await;

    // The accepting variant is asked first, then the other one.
    Mock::given(method("GET"))
        .and(path("/v2beta/image-to-video/result/gen_8"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2alpha/generation/image-to-video/result/gen_8"))
        .respond_with(ScriptedResponder::new(vec![
            ResponseTemplate::new(202),
            ResponseTemplate::new(200).set_body_bytes("found it"),
        ]))
        .expect(2)
        .mount(&server)
        .await;

    let out_dir = tempfile::tempdir().unwrap();
    let path = stability_client(&server)
        .generate_video(b"png", &VideoParams::default(), &fast_poller(), out_dir.path())
        .await
        .unwrap();

    assert_eq!(path, out_dir.path().join("video_gen_8.mp4"));
    assert_eq!(std::fs::read_to_string(path).unwrap(), "found it");
}

#[tokio::test]
async fn test_result_not_found_anywhere() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(2)
        .mount(&server)
        .await;

    let client = stability_client(&server);
    let submission = Submission {
        id: "gen_9".into(),
        variant: VideoVariant::V2Alpha,
    };
    let err = fast_poller()
        .poll(&client.video_result(&submission), &submission.id)
        .await
        .unwrap_err();

    assert!(matches!(err, MediaGenError::EndpointsExhausted { .. }));
}
