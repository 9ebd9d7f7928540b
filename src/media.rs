mod ffmpeg;

use std::{path::Path, sync::Arc};

use crate::{error_code::ErrorCode, process::ProcessError, tmp_file::TmpFile};

pub(crate) use ffmpeg::FfMpeg;

pub(crate) type ArcMediaTools = Arc<dyn MediaTools>;

/// Stream dimensions of the first video stream in a file
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Geometry {
    pub(crate) width: u32,
    pub(crate) height: u32,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum ProbeError {
    #[error("Media prober could not be run")]
    Unavailable(#[source] ProcessError),

    #[error("Media prober produced unreadable output")]
    Malformed(#[source] serde_json::Error),

    #[error("No video stream in uploaded media")]
    NoVideoStream,
}

impl ProbeError {
    pub(crate) const fn error_code(&self) -> ErrorCode {
        match self {
            Self::Unavailable(_) => ErrorCode::PROBE_UNAVAILABLE,
            Self::Malformed(_) => ErrorCode::MALFORMED_PROBE_OUTPUT,
            Self::NoVideoStream => ErrorCode::NO_VIDEO_STREAM,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum RemuxError {
    #[error("Remux tool could not be run")]
    ToolUnavailable(#[source] ProcessError),

    #[error("Remux tool failed")]
    Failed(#[source] ProcessError),

    #[error("Remux tool produced no output")]
    EmptyOutput,
}

impl RemuxError {
    pub(crate) const fn error_code(&self) -> ErrorCode {
        match self {
            Self::ToolUnavailable(_) => ErrorCode::REMUX_TOOL_UNAVAILABLE,
            Self::Failed(_) => ErrorCode::REMUX_FAILED,
            Self::EmptyOutput => ErrorCode::REMUX_EMPTY_OUTPUT,
        }
    }

    /// Captured output of the failed tool, for operators only
    pub(crate) fn diagnostics(&self) -> Option<&str> {
        match self {
            Self::Failed(e) => e.diagnostics(),
            _ => None,
        }
    }
}

/// External media inspection and container rewriting
///
/// Neither operation decodes or re-encodes media. Implementations must not modify the input
/// file.
#[async_trait::async_trait(?Send)]
pub(crate) trait MediaTools: Send + Sync {
    async fn probe(&self, input: &Path) -> Result<Geometry, ProbeError>;

    /// Rewrite `input` into `output` with the container index moved ahead of the payload
    async fn remux(&self, input: &Path, output: &Path) -> Result<(), RemuxError>;
}

/// Produce a fast-start copy of `input` in `output`, checking the copy is non-empty
///
/// `output` is owned by the caller, so it is cleaned up even if the tool fails partway through
/// writing it.
#[tracing::instrument(level = "debug", skip(tools, output))]
pub(crate) async fn fast_start(
    tools: &dyn MediaTools,
    input: &Path,
    output: TmpFile,
) -> Result<TmpFile, RemuxError> {
    tools.remux(input, &output).await?;

    match tokio::fs::metadata(&output).await {
        Ok(metadata) if metadata.len() > 0 => Ok(output),
        Ok(_) => Err(RemuxError::EmptyOutput),
        Err(e) => {
            tracing::debug!("Remux output missing: {e}");
            Err(RemuxError::EmptyOutput)
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::path::Path;

    use super::{fast_start, Geometry, MediaTools, ProbeError, RemuxError};
    use crate::tmp_file::TmpDir;

    /// Scripted media tools for exercising callers without spawning processes
    pub(crate) struct FakeMedia {
        pub(crate) geometry: Result<Geometry, fn() -> ProbeError>,
        pub(crate) remux_output: Option<&'static [u8]>,
    }

    impl FakeMedia {
        pub(crate) fn new(width: u32, height: u32) -> Self {
            FakeMedia {
                geometry: Ok(Geometry { width, height }),
                remux_output: Some(b"ftyp moov mdat"),
            }
        }
    }

    #[async_trait::async_trait(?Send)]
    impl MediaTools for FakeMedia {
        async fn probe(&self, input: &Path) -> Result<Geometry, ProbeError> {
            assert!(input.exists(), "probed file must be staged");

            self.geometry.map_err(|f| f())
        }

        async fn remux(&self, input: &Path, output: &Path) -> Result<(), RemuxError> {
            assert!(input.exists(), "remuxed file must be staged");

            if let Some(bytes) = self.remux_output {
                tokio::fs::write(output, bytes)
                    .await
                    .expect("Wrote remux output");
            }

            Ok(())
        }
    }

    #[tokio::test]
    async fn fast_start_keeps_non_empty_output() {
        let tmp_dir = TmpDir::init(std::env::temp_dir()).await.unwrap();
        let input = tmp_dir.tmp_file(Some(".mp4"));
        tokio::fs::write(&input, b"input").await.unwrap();

        let output = fast_start(&FakeMedia::new(1920, 1080), &input, tmp_dir.tmp_file(None))
            .await
            .expect("Remuxed");

        assert_eq!(tokio::fs::read(&output).await.unwrap(), b"ftyp moov mdat");
        assert!(input.exists());
    }

    #[tokio::test]
    async fn fast_start_rejects_empty_output() {
        let tmp_dir = TmpDir::init(std::env::temp_dir()).await.unwrap();
        let input = tmp_dir.tmp_file(Some(".mp4"));
        tokio::fs::write(&input, b"input").await.unwrap();

        let media = FakeMedia {
            remux_output: Some(b""),
            ..FakeMedia::new(1920, 1080)
        };

        let output = tmp_dir.tmp_file(None);
        let output_path = output.to_path_buf();

        let err = fast_start(&media, &input, output).await.expect_err("Empty");
        assert!(matches!(err, RemuxError::EmptyOutput));
        assert!(!output_path.exists());
    }

    #[tokio::test]
    async fn fast_start_rejects_missing_output() {
        let tmp_dir = TmpDir::init(std::env::temp_dir()).await.unwrap();
        let input = tmp_dir.tmp_file(Some(".mp4"));
        tokio::fs::write(&input, b"input").await.unwrap();

        let media = FakeMedia {
            remux_output: None,
            ..FakeMedia::new(1920, 1080)
        };

        let err = fast_start(&media, &input, tmp_dir.tmp_file(None))
            .await
            .expect_err("Missing");
        assert!(matches!(err, RemuxError::EmptyOutput));
    }
}
