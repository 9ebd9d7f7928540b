#[derive(Debug, serde::Serialize)]
#[serde(transparent)]
pub(crate) struct ErrorCode {
    code: &'static str,
}

impl ErrorCode {
    pub(crate) const fn as_str(&self) -> &'static str {
        self.code
    }

    pub(crate) const PROBE_UNAVAILABLE: ErrorCode = ErrorCode {
        code: "probe-unavailable",
    };
    pub(crate) const MALFORMED_PROBE_OUTPUT: ErrorCode = ErrorCode {
        code: "malformed-probe-output",
    };
    pub(crate) const NO_VIDEO_STREAM: ErrorCode = ErrorCode {
        code: "no-video-stream",
    };
    pub(crate) const INVALID_GEOMETRY: ErrorCode = ErrorCode {
        code: "invalid-geometry",
    };
    pub(crate) const REMUX_TOOL_UNAVAILABLE: ErrorCode = ErrorCode {
        code: "remux-tool-unavailable",
    };
    pub(crate) const REMUX_FAILED: ErrorCode = ErrorCode {
        code: "remux-failed",
    };
    pub(crate) const REMUX_EMPTY_OUTPUT: ErrorCode = ErrorCode {
        code: "remux-empty-output",
    };
    pub(crate) const ENTROPY_UNAVAILABLE: ErrorCode = ErrorCode {
        code: "entropy-unavailable",
    };
    pub(crate) const STORE_WRITE_FAILED: ErrorCode = ErrorCode {
        code: "store-write-failed",
    };
    pub(crate) const STORE_UNAVAILABLE: ErrorCode = ErrorCode {
        code: "store-unavailable",
    };
    pub(crate) const SIGNING_FAILED: ErrorCode = ErrorCode {
        code: "signing-failed",
    };
    pub(crate) const MALFORMED_LOCATOR: ErrorCode = ErrorCode {
        code: "malformed-locator",
    };
    pub(crate) const MISSING_LOCATOR: ErrorCode = ErrorCode {
        code: "missing-locator",
    };
    pub(crate) const SLED_ERROR: ErrorCode = ErrorCode { code: "sled-error" };
    pub(crate) const EXTRACT_RECORD: ErrorCode = ErrorCode {
        code: "extract-record",
    };
    pub(crate) const PANIC: ErrorCode = ErrorCode { code: "panic" };
    pub(crate) const METADATA_UPDATE_FAILED: ErrorCode = ErrorCode {
        code: "metadata-update-failed",
    };
    pub(crate) const RECORD_NOT_FOUND: ErrorCode = ErrorCode {
        code: "record-not-found",
    };
    pub(crate) const NOT_AUTHORIZED: ErrorCode = ErrorCode {
        code: "not-authorized",
    };
    pub(crate) const UNAUTHENTICATED: ErrorCode = ErrorCode {
        code: "unauthenticated",
    };
    pub(crate) const INVALID_TOKEN: ErrorCode = ErrorCode {
        code: "invalid-token",
    };
    pub(crate) const INVALID_VIDEO_ID: ErrorCode = ErrorCode {
        code: "invalid-video-id",
    };
    pub(crate) const UNSUPPORTED_MEDIA_TYPE: ErrorCode = ErrorCode {
        code: "unsupported-media-type",
    };
    pub(crate) const PAYLOAD_TOO_LARGE: ErrorCode = ErrorCode {
        code: "payload-too-large",
    };
    pub(crate) const FILE_UPLOAD_ERROR: ErrorCode = ErrorCode {
        code: "file-upload-error",
    };
    pub(crate) const VALIDATE_NO_FILES: ErrorCode = ErrorCode {
        code: "validate-no-files",
    };
    pub(crate) const IO_ERROR: ErrorCode = ErrorCode { code: "io-error" };
    pub(crate) const UNKNOWN_ERROR: ErrorCode = ErrorCode {
        code: "unknown-error",
    };
}
