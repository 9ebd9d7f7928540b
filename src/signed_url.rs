use std::time::Duration;

use crate::{
    error::{Error, UploadError},
    locator::Locator,
    repo::VideoRecord,
    store::Store,
};

const PRESIGNED_URL_EXPIRY: Duration = Duration::from_secs(5 * 60);

/// A record whose locator has been swapped for a playable URL
///
/// Only ever built for a response. It is never written back to the repo.
#[derive(Debug, serde::Serialize)]
#[serde(transparent)]
pub(crate) struct SignedVideo(VideoRecord);

impl SignedVideo {
    #[cfg(test)]
    pub(crate) fn into_inner(self) -> VideoRecord {
        self.0
    }
}

/// Replace the record's locator with a URL that expires five minutes from now
#[tracing::instrument(skip(store, record), fields(id = %record.id))]
pub(crate) async fn sign_video<S: Store>(store: &S, record: VideoRecord) -> Result<SignedVideo, Error> {
    let Some(video_url) = record.video_url.as_deref() else {
        return Err(UploadError::MissingLocator.into());
    };

    let locator = Locator::decode(video_url)?;

    let url = store
        .signed_url(locator.bucket(), locator.key(), PRESIGNED_URL_EXPIRY)
        .await
        .map_err(UploadError::SigningFailed)?;

    Ok(SignedVideo(VideoRecord {
        video_url: Some(url.into()),
        ..record
    }))
}

/// Sign the record if it has been uploaded, pass it through untouched otherwise
pub(crate) async fn expand<S: Store>(store: &S, record: VideoRecord) -> Result<SignedVideo, Error> {
    if record.video_url.is_some() {
        sign_video(store, record).await
    } else {
        Ok(SignedVideo(record))
    }
}
