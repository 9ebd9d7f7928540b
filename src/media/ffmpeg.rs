#[cfg(test)]
mod tests;

use std::{ffi::OsStr, path::Path};

use super::{Geometry, MediaTools, ProbeError, RemuxError};
use crate::process::{Process, ProcessError};

#[derive(Debug, serde::Deserialize)]
struct FfProbeOutput {
    #[serde(default)]
    streams: Vec<FfProbeStream>,
}

#[derive(Debug, serde::Deserialize)]
struct FfProbeStream {
    width: u32,
    height: u32,
}

/// ffprobe and ffmpeg, found on $PATH or at configured locations
#[derive(Clone, Debug)]
pub(crate) struct FfMpeg {
    ffprobe: String,
    ffmpeg: String,
    timeout: Option<u64>,
}

impl FfMpeg {
    pub(crate) fn new(ffprobe: String, ffmpeg: String, timeout: Option<u64>) -> Self {
        FfMpeg {
            ffprobe,
            ffmpeg,
            timeout,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl MediaTools for FfMpeg {
    #[tracing::instrument(skip(self))]
    async fn probe(&self, input: &Path) -> Result<Geometry, ProbeError> {
        let process = Process::run(
            &self.ffprobe,
            &[
                OsStr::new("-v"),
                OsStr::new("error"),
                OsStr::new("-select_streams"),
                OsStr::new("v:0"),
                OsStr::new("-show_entries"),
                OsStr::new("stream=width,height"),
                OsStr::new("-print_format"),
                OsStr::new("json"),
                input.as_os_str(),
            ],
            self.timeout,
        )
        .map_err(ProbeError::Unavailable)?;

        let output = process.output().await.map_err(ProbeError::Unavailable)?;

        parse_probe_output(&output)
    }

    #[tracing::instrument(skip(self))]
    async fn remux(&self, input: &Path, output: &Path) -> Result<(), RemuxError> {
        let process = Process::run(
            &self.ffmpeg,
            &[
                OsStr::new("-hide_banner"),
                OsStr::new("-v"),
                OsStr::new("error"),
                OsStr::new("-i"),
                input.as_os_str(),
                OsStr::new("-c"),
                OsStr::new("copy"),
                OsStr::new("-movflags"),
                OsStr::new("faststart"),
                OsStr::new("-f"),
                OsStr::new("mp4"),
                OsStr::new("-y"),
                output.as_os_str(),
            ],
            self.timeout,
        )
        .map_err(RemuxError::ToolUnavailable)?;

        match process.output().await {
            Ok(_) => Ok(()),
            Err(e @ ProcessError::Status { .. }) => Err(RemuxError::Failed(e)),
            Err(e) => Err(RemuxError::ToolUnavailable(e)),
        }
    }
}

fn parse_probe_output(output: &[u8]) -> Result<Geometry, ProbeError> {
    let output: FfProbeOutput = serde_json::from_slice(output).map_err(ProbeError::Malformed)?;

    let Some(FfProbeStream { width, height }) = output.streams.into_iter().next() else {
        return Err(ProbeError::NoVideoStream);
    };

    Ok(Geometry { width, height })
}
