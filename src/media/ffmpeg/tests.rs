use std::path::Path;

use super::{parse_probe_output, FfMpeg};
use crate::media::{Geometry, MediaTools, ProbeError, RemuxError};

const LANDSCAPE: &str = r#"{
    "programs": [],
    "streams": [
        {
            "width": 1920,
            "height": 1080
        }
    ]
}"#;

const PORTRAIT: &str = r#"{"programs":[],"streams":[{"width":608,"height":1080}]}"#;

const NO_STREAMS: &str = r#"{"programs":[],"streams":[]}"#;

const EMPTY_OBJECT: &str = "{}";

const MISSING_HEIGHT: &str = r#"{"streams":[{"width":1920}]}"#;

#[test]
fn parses_first_stream() {
    assert_eq!(
        parse_probe_output(LANDSCAPE.as_bytes()).expect("Parsed"),
        Geometry {
            width: 1920,
            height: 1080
        }
    );

    assert_eq!(
        parse_probe_output(PORTRAIT.as_bytes()).expect("Parsed"),
        Geometry {
            width: 608,
            height: 1080
        }
    );
}

#[test]
fn no_streams() {
    assert!(matches!(
        parse_probe_output(NO_STREAMS.as_bytes()),
        Err(ProbeError::NoVideoStream)
    ));
    assert!(matches!(
        parse_probe_output(EMPTY_OBJECT.as_bytes()),
        Err(ProbeError::NoVideoStream)
    ));
}

#[test]
fn malformed_output() {
    for input in ["", "not json", "[1, 2, 3]", MISSING_HEIGHT] {
        assert!(
            matches!(
                parse_probe_output(input.as_bytes()),
                Err(ProbeError::Malformed(_))
            ),
            "{input:?}"
        );
    }
}

#[tokio::test]
async fn missing_prober_is_unavailable() {
    let ffmpeg = FfMpeg::new(
        String::from("vidkeep-missing-ffprobe"),
        String::from("vidkeep-missing-ffmpeg"),
        None,
    );

    let err = ffmpeg
        .probe(Path::new("/nonexistent.mp4"))
        .await
        .expect_err("Missing binary");
    assert!(matches!(err, ProbeError::Unavailable(_)));

    let err = ffmpeg
        .remux(Path::new("/nonexistent.mp4"), Path::new("/nonexistent-out.mp4"))
        .await
        .expect_err("Missing binary");
    assert!(matches!(err, RemuxError::ToolUnavailable(_)));
}

#[tokio::test]
async fn failing_tools() {
    let ffmpeg = FfMpeg::new(String::from("false"), String::from("false"), None);

    let err = ffmpeg
        .probe(Path::new("/nonexistent.mp4"))
        .await
        .expect_err("Non-zero exit");
    assert!(matches!(err, ProbeError::Unavailable(_)));

    let err = ffmpeg
        .remux(Path::new("/nonexistent.mp4"), Path::new("/nonexistent-out.mp4"))
        .await
        .expect_err("Non-zero exit");
    assert!(matches!(err, RemuxError::Failed(_)));
}

#[tokio::test]
async fn silent_prober_is_malformed() {
    let ffmpeg = FfMpeg::new(String::from("true"), String::from("true"), None);

    let err = ffmpeg
        .probe(Path::new("/nonexistent.mp4"))
        .await
        .expect_err("No output");
    assert!(matches!(err, ProbeError::Malformed(_)));
}
