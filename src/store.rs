use std::{fmt::Debug, path::Path, time::Duration};

use url::Url;

use crate::error_code::ErrorCode;

pub(crate) mod object_store;

#[derive(Debug, thiserror::Error)]
pub(crate) enum StoreError {
    #[error("Error in object store")]
    ObjectStore(#[source] ::object_store::Error),

    #[error("Error reading file for upload")]
    Io(#[from] std::io::Error),

    #[error("Invalid object store configuration")]
    Build(#[source] ::object_store::Error),
}

impl StoreError {
    pub(crate) const fn error_code(&self) -> ErrorCode {
        match self {
            Self::ObjectStore(_) | Self::Build(_) => ErrorCode::STORE_UNAVAILABLE,
            Self::Io(_) => ErrorCode::IO_ERROR,
        }
    }

    pub(crate) const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ObjectStore(::object_store::Error::NotFound { .. })
        )
    }
}

impl From<::object_store::Error> for StoreError {
    fn from(value: ::object_store::Error) -> Self {
        Self::ObjectStore(value)
    }
}

/// Content storage for finished uploads
///
/// Objects are addressed by bucket and key. Implementations do not retry failed writes.
#[async_trait::async_trait(?Send)]
pub(crate) trait Store: Clone + Debug {
    async fn health_check(&self) -> Result<(), StoreError>;

    /// The bucket new uploads are written to
    fn bucket(&self) -> &str;

    /// Write the contents of the file at `path` to `key`, tagging it with `content_type`
    async fn save_file(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        content_type: &str,
    ) -> Result<(), StoreError>;

    /// Produce a URL granting read access to `key` for `expires_in`
    async fn signed_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<Url, StoreError>;
}

#[async_trait::async_trait(?Send)]
impl<T> Store for actix_web::web::Data<T>
where
    T: Store,
{
    async fn health_check(&self) -> Result<(), StoreError> {
        T::health_check(self).await
    }

    fn bucket(&self) -> &str {
        T::bucket(self)
    }

    async fn save_file(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        content_type: &str,
    ) -> Result<(), StoreError> {
        T::save_file(self, bucket, key, path, content_type).await
    }

    async fn signed_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<Url, StoreError> {
        T::signed_url(self, bucket, key, expires_in).await
    }
}
