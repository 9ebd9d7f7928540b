use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use color_eyre::Report;

use crate::error_code::ErrorCode;

pub(crate) struct Error {
    inner: color_eyre::Report,
}

impl Error {
    pub(crate) fn kind(&self) -> Option<&UploadError> {
        self.inner.downcast_ref()
    }

    pub(crate) fn root_cause(&self) -> &(dyn std::error::Error + 'static) {
        self.inner.root_cause()
    }

    pub(crate) fn error_code(&self) -> ErrorCode {
        self.kind()
            .map(|e| e.error_code())
            .unwrap_or(ErrorCode::UNKNOWN_ERROR)
    }
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&self.inner, f)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.inner, f)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

impl<T> From<T> for Error
where
    UploadError: From<T>,
{
    fn from(error: T) -> Self {
        Error {
            inner: Report::from(UploadError::from(error)),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum UploadError {
    #[error("Couldn't upload file")]
    Upload(#[from] actix_form_data::Error),

    #[error("Error in DB")]
    Repo(#[from] crate::repo::RepoError),

    #[error("Error interacting with filesystem")]
    Io(#[from] std::io::Error),

    #[error("Error authenticating request")]
    Auth(#[from] crate::auth::AuthError),

    #[error("Error probing uploaded media")]
    Probe(#[from] crate::media::ProbeError),

    #[error("Uploaded media has unusable dimensions")]
    Geometry(#[from] crate::aspect::GeometryError),

    #[error("Error preparing media for streaming")]
    Remux(#[from] crate::media::RemuxError),

    #[error("Error generating object key")]
    Key(#[from] crate::object_key::KeyError),

    #[error("Error in store")]
    Store(#[from] crate::store::StoreError),

    #[error("Failed to write video to object store")]
    StoreWriteFailed(#[source] crate::store::StoreError),

    #[error("Video was stored but its record could not be updated")]
    MetadataUpdateFailed(#[source] crate::repo::RepoError),

    #[error("Stored video location is invalid")]
    Locator(#[from] crate::locator::LocatorError),

    #[error("Video has not been uploaded")]
    MissingLocator,

    #[error("Failed to sign video url")]
    SigningFailed(#[source] crate::store::StoreError),

    #[error("Unsupported media type {0}, only video/mp4 is accepted")]
    UnsupportedMediaType(String),

    #[error("Upload too large")]
    PayloadTooLarge(#[from] crate::ingest::LimitError),

    #[error("Requested video does not exist")]
    RecordNotFound,

    #[error("Not authorized to modify this video")]
    NotAuthorized,

    #[error("Invalid video id")]
    InvalidVideoId(#[source] uuid::Error),

    #[error("No files present in upload")]
    NoFiles,
}

impl UploadError {
    const fn error_code(&self) -> ErrorCode {
        match self {
            Self::Upload(actix_form_data::Error::FileSize) => ErrorCode::PAYLOAD_TOO_LARGE,
            Self::Upload(_) => ErrorCode::FILE_UPLOAD_ERROR,
            Self::Repo(e) => e.error_code(),
            Self::Io(_) => ErrorCode::IO_ERROR,
            Self::Auth(e) => e.error_code(),
            Self::Probe(e) => e.error_code(),
            Self::Geometry(e) => e.error_code(),
            Self::Remux(e) => e.error_code(),
            Self::Key(e) => e.error_code(),
            Self::Store(e) => e.error_code(),
            Self::StoreWriteFailed(_) => ErrorCode::STORE_WRITE_FAILED,
            Self::MetadataUpdateFailed(_) => ErrorCode::METADATA_UPDATE_FAILED,
            Self::Locator(e) => e.error_code(),
            Self::MissingLocator => ErrorCode::MISSING_LOCATOR,
            Self::SigningFailed(_) => ErrorCode::SIGNING_FAILED,
            Self::UnsupportedMediaType(_) => ErrorCode::UNSUPPORTED_MEDIA_TYPE,
            Self::PayloadTooLarge(_) => ErrorCode::PAYLOAD_TOO_LARGE,
            Self::RecordNotFound => ErrorCode::RECORD_NOT_FOUND,
            Self::NotAuthorized => ErrorCode::NOT_AUTHORIZED,
            Self::InvalidVideoId(_) => ErrorCode::INVALID_VIDEO_ID,
            Self::NoFiles => ErrorCode::VALIDATE_NO_FILES,
        }
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self.kind() {
            Some(
                UploadError::PayloadTooLarge(_)
                | UploadError::Upload(actix_form_data::Error::FileSize),
            ) => StatusCode::PAYLOAD_TOO_LARGE,
            Some(UploadError::UnsupportedMediaType(_)) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Some(
                UploadError::Upload(_)
                | UploadError::NoFiles
                | UploadError::InvalidVideoId(_)
                | UploadError::Geometry(_)
                | UploadError::Probe(crate::media::ProbeError::NoVideoStream),
            ) => StatusCode::BAD_REQUEST,
            Some(UploadError::Auth(_)) => StatusCode::UNAUTHORIZED,
            Some(UploadError::NotAuthorized) => StatusCode::FORBIDDEN,
            Some(UploadError::RecordNotFound) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .content_type("application/json")
            .body(
                serde_json::to_string(&serde_json::json!({
                    "msg": self.root_cause().to_string(),
                    "code": self.error_code()
                }))
                .unwrap_or_else(|_| {
                    r#"{"msg":"Request failed","code":"unknown-error"}"#.to_string()
                }),
            )
    }
}
