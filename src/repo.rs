use std::{fmt::Debug, sync::Arc};

use time::OffsetDateTime;
use uuid::Uuid;

use crate::{config, error_code::ErrorCode};

pub(crate) mod sled;

pub(crate) type ArcRepo = Arc<dyn VideoRepo>;

#[derive(Clone, Debug)]
pub(crate) enum Repo {
    Sled(self::sled::SledRepo),
}

/// Metadata for one uploaded or pending video
///
/// `video_url` holds an encoded locator once the video has been stored. It is replaced with a
/// signed URL before the record is handed to clients.
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub(crate) struct VideoRecord {
    pub(crate) id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) updated_at: OffsetDateTime,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) thumbnail_url: Option<String>,
    pub(crate) video_url: Option<String>,
    pub(crate) user_id: Uuid,
}

impl VideoRecord {
    pub(crate) fn draft(user_id: Uuid, title: String, description: Option<String>) -> Self {
        let now = OffsetDateTime::now_utc();

        VideoRecord {
            id: Uuid::now_v7(),
            created_at: now,
            updated_at: now,
            title,
            description,
            thumbnail_url: None,
            video_url: None,
            user_id,
        }
    }

    pub(crate) fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum RepoError {
    #[error("Error in sled")]
    SledError(#[from] crate::repo::sled::SledError),

    #[error("Record to update does not exist")]
    Missing,
}

impl RepoError {
    pub(crate) const fn error_code(&self) -> ErrorCode {
        match self {
            Self::SledError(e) => e.error_code(),
            Self::Missing => ErrorCode::RECORD_NOT_FOUND,
        }
    }
}

#[async_trait::async_trait(?Send)]
pub(crate) trait VideoRepo: Send + Sync + Debug {
    async fn health_check(&self) -> Result<(), RepoError>;

    async fn create(&self, record: &VideoRecord) -> Result<(), RepoError>;

    async fn get(&self, id: Uuid) -> Result<Option<VideoRecord>, RepoError>;

    /// Replace a stored record, failing if it was never created
    async fn update(&self, record: &VideoRecord) -> Result<(), RepoError>;

    /// Every record owned by `user_id`, newest first
    async fn list_for_owner(&self, user_id: Uuid) -> Result<Vec<VideoRecord>, RepoError>;
}

impl Repo {
    #[tracing::instrument]
    pub(crate) fn open(config: config::Repo) -> color_eyre::Result<Self> {
        match config {
            config::Repo::Sled(config::Sled {
                path,
                cache_capacity,
            }) => {
                let db = ::sled::Config::new()
                    .cache_capacity(cache_capacity)
                    .path(path)
                    .open()?;

                Ok(Self::Sled(self::sled::SledRepo::new(db)?))
            }
        }
    }

    pub(crate) fn to_arc(&self) -> ArcRepo {
        match self {
            Self::Sled(sled_repo) => Arc::new(sled_repo.clone()),
        }
    }
}
