use sled::{
    transaction::{ConflictableTransactionError, TransactionError},
    Db, Transactional, Tree,
};
use uuid::Uuid;

use crate::{
    error_code::ErrorCode,
    repo::{RepoError, VideoRecord, VideoRepo},
};

macro_rules! b {
    ($self:ident.$ident:ident, $expr:expr) => {{
        let $ident = $self.$ident.clone();

        let span = tracing::Span::current();

        tokio::task::spawn_blocking(move || span.in_scope(|| $expr))
            .await
            .map_err(|_| SledError::Panic)
            .map_err(RepoError::from)?
            .map_err(SledError::from)
            .map_err(RepoError::from)?
    }};
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum SledError {
    #[error("Error in database")]
    Sled(#[from] sled::Error),

    #[error("Invalid record json")]
    Record(#[from] serde_json::Error),

    #[error("Operation panicked")]
    Panic,
}

impl SledError {
    pub(super) const fn error_code(&self) -> ErrorCode {
        match self {
            Self::Sled(_) => ErrorCode::SLED_ERROR,
            Self::Record(_) => ErrorCode::EXTRACT_RECORD,
            Self::Panic => ErrorCode::PANIC,
        }
    }
}

#[derive(Clone)]
pub(crate) struct SledRepo {
    healthz_count: std::sync::Arc<std::sync::atomic::AtomicU64>,
    healthz: Tree,
    videos: Tree,
    owner_videos: Tree,
    _db: Db,
}

impl std::fmt::Debug for SledRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SledRepo").finish()
    }
}

impl SledRepo {
    pub(crate) fn new(db: Db) -> Result<Self, SledError> {
        Ok(SledRepo {
            healthz_count: Default::default(),
            healthz: db.open_tree("vidkeep-healthz-tree")?,
            videos: db.open_tree("vidkeep-videos-tree")?,
            owner_videos: db.open_tree("vidkeep-owner-videos-tree")?,
            _db: db,
        })
    }
}

fn owner_video_key(user_id: Uuid, id: Uuid) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(user_id.as_bytes());
    key.extend_from_slice(id.as_bytes());
    key
}

#[async_trait::async_trait(?Send)]
impl VideoRepo for SledRepo {
    #[tracing::instrument(level = "debug", skip(self))]
    async fn health_check(&self) -> Result<(), RepoError> {
        let next = self
            .healthz_count
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);

        b!(self.healthz, {
            healthz.insert("healthz", &next.to_be_bytes()[..])?;
            Ok::<_, SledError>(())
        });

        self.healthz.flush_async().await.map_err(SledError::from)?;

        b!(self.healthz, {
            healthz.get("healthz")?;
            Ok::<_, SledError>(())
        });

        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self, record), fields(id = %record.id))]
    async fn create(&self, record: &VideoRecord) -> Result<(), RepoError> {
        let value = serde_json::to_vec(record).map_err(SledError::from)?;
        let id = record.id;
        let index_key = owner_video_key(record.user_id, id);

        let owner_videos = self.owner_videos.clone();

        b!(self.videos, {
            (&videos, &owner_videos)
                .transaction(|(videos, owner_videos)| {
                    videos.insert(id.as_bytes(), value.as_slice())?;
                    owner_videos.insert(index_key.as_slice(), Vec::<u8>::new())?;

                    Ok::<_, ConflictableTransactionError<sled::Error>>(())
                })
                .map_err(|e| match e {
                    TransactionError::Abort(e) | TransactionError::Storage(e) => e,
                })
        });

        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn get(&self, id: Uuid) -> Result<Option<VideoRecord>, RepoError> {
        let opt = b!(self.videos, videos.get(id.as_bytes()));

        opt.map(|ivec| serde_json::from_slice(&ivec))
            .transpose()
            .map_err(SledError::from)
            .map_err(RepoError::from)
    }

    #[tracing::instrument(level = "debug", skip(self, record), fields(id = %record.id))]
    async fn update(&self, record: &VideoRecord) -> Result<(), RepoError> {
        let value = serde_json::to_vec(record).map_err(SledError::from)?;
        let id = record.id;

        let previous = b!(self.videos, {
            let existed = videos.contains_key(id.as_bytes())?;

            if existed {
                videos.insert(id.as_bytes(), value)?;
            }

            Ok::<_, SledError>(existed)
        });

        if previous {
            Ok(())
        } else {
            Err(RepoError::Missing)
        }
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn list_for_owner(&self, user_id: Uuid) -> Result<Vec<VideoRecord>, RepoError> {
        let videos = self.videos.clone();

        let mut records = b!(self.owner_videos, {
            let mut records = Vec::new();

            for res in owner_videos.scan_prefix(user_id.as_bytes()) {
                let (key, _) = res?;

                let Some(id) = key.get(16..) else {
                    continue;
                };

                if let Some(ivec) = videos.get(id)? {
                    records.push(serde_json::from_slice::<VideoRecord>(&ivec)?);
                }
            }

            Ok::<_, SledError>(records)
        });

        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(records)
    }
}
