use actix_web::web::Bytes;
use futures_core::Stream;
use streem::IntoStreamer;
use time::OffsetDateTime;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::{
    aspect,
    error::{Error, UploadError},
    locator::Locator,
    media,
    object_key::ObjectKey,
    repo::VideoRecord,
    state::State,
    store::Store,
    tmp_file::{TmpDir, TmpFile},
};

const ACCEPTED_MEDIA_TYPE: &str = "video/mp4";
const MEGABYTES: u64 = 1024 * 1024;

#[derive(Debug, thiserror::Error)]
#[error("Upload exceeded {limit} bytes")]
pub(crate) struct LimitError {
    limit: u64,
}

/// Store an uploaded video and point the owner's record at it
///
/// Ownership is checked before any bytes are staged. Every temporary file is removed by the
/// time this returns, whether or not the upload succeeded.
#[tracing::instrument(name = "Ingest", skip(state, stream))]
pub(crate) async fn ingest<S, St, E>(
    state: &State<S>,
    requester: Uuid,
    video_id: Uuid,
    media_type: &str,
    stream: St,
) -> Result<VideoRecord, Error>
where
    S: Store,
    St: Stream<Item = Result<Bytes, E>>,
    Error: From<E>,
{
    let res = do_ingest(state, requester, video_id, media_type, stream).await;

    let outcome = match &res {
        Ok(_) => "success",
        Err(e) => e.error_code().as_str(),
    };
    metrics::counter!(crate::init_metrics::UPLOAD, "outcome" => outcome).increment(1);

    res
}

async fn do_ingest<S, St, E>(
    state: &State<S>,
    requester: Uuid,
    video_id: Uuid,
    media_type: &str,
    stream: St,
) -> Result<VideoRecord, Error>
where
    S: Store,
    St: Stream<Item = Result<Bytes, E>>,
    Error: From<E>,
{
    if media_type != ACCEPTED_MEDIA_TYPE {
        return Err(UploadError::UnsupportedMediaType(media_type.to_string()).into());
    }

    let Some(mut record) = state.repo.get(video_id).await? else {
        return Err(UploadError::RecordNotFound.into());
    };

    if !record.is_owned_by(requester) {
        return Err(UploadError::NotAuthorized.into());
    }

    let limit = (state.config.media.max_file_size as u64).saturating_mul(MEGABYTES);
    let staged = stage(&state.tmp_dir, stream, limit).await?;

    let geometry = match state.media.probe(&staged).await {
        Ok(geometry) => geometry,
        Err(e) => {
            if let crate::media::ProbeError::Unavailable(process) = &e {
                if let Some(diagnostics) = process.diagnostics() {
                    tracing::warn!(diagnostics, "Probe failed");
                }
            }
            return Err(e.into());
        }
    };
    let class = aspect::classify(geometry.width, geometry.height)?;
    metrics::counter!(crate::init_metrics::UPLOAD_ASPECT, "class" => class.as_str())
        .increment(1);

    let remuxed =
        match media::fast_start(&*state.media, &staged, state.tmp_dir.tmp_file(Some(".mp4"))).await
        {
            Ok(remuxed) => remuxed,
            Err(e) => {
                if let Some(diagnostics) = e.diagnostics() {
                    tracing::warn!(diagnostics, "Remux failed");
                }
                return Err(e.into());
            }
        };
    discard(staged).await;

    let key = match ObjectKey::generate(class, media_type) {
        Ok(key) => key,
        Err(e) => {
            tracing::error!("Cannot generate object key: {e}");
            return Err(e.into());
        }
    };
    let bucket = state.store.bucket();

    let saved = state
        .store
        .save_file(bucket, key.as_str(), &remuxed, media_type)
        .await;
    discard(remuxed).await;
    saved.map_err(UploadError::StoreWriteFailed)?;

    let locator = Locator::new(bucket, key.as_str())?;
    record.video_url = Some(locator.encode());
    record.updated_at = OffsetDateTime::now_utc();

    if let Err(e) = state.repo.update(&record).await {
        tracing::error!(
            bucket = locator.bucket(),
            key = locator.key(),
            "Stored object has no record: {e}"
        );
        return Err(UploadError::MetadataUpdateFailed(e).into());
    }

    Ok(record)
}

#[tracing::instrument(level = "debug", skip(tmp_dir, stream))]
async fn stage<St, E>(tmp_dir: &TmpDir, stream: St, limit: u64) -> Result<TmpFile, Error>
where
    St: Stream<Item = Result<Bytes, E>>,
    Error: From<E>,
{
    let staged = tmp_dir.tmp_file(Some(".mp4"));
    let mut file = match tokio::fs::File::create(&staged).await {
        Ok(file) => file,
        Err(e) => {
            tracing::error!(path = ?&*staged, "Cannot create staging file: {e}");
            return Err(e.into());
        }
    };

    let stream = std::pin::pin!(stream);
    let mut stream = stream.into_streamer();

    let mut written: u64 = 0;

    while let Some(mut bytes) = stream.try_next().await? {
        written += bytes.len() as u64;

        if written > limit {
            return Err(LimitError { limit }.into());
        }

        file.write_all_buf(&mut bytes).await?;
    }

    file.flush().await?;
    metrics::histogram!(crate::init_metrics::UPLOAD_BYTES).record(written as f64);

    Ok(staged)
}

async fn discard(file: TmpFile) {
    if let Err(e) = file.cleanup().await {
        tracing::warn!("Failed to remove temporary file: {e}");
    }
}
