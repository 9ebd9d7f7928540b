use std::{path::Path, sync::Arc, time::Duration};

use ::object_store::{
    aws::{AmazonS3, AmazonS3Builder},
    buffered::BufWriter,
    path::Path as ObjectPath,
    signer::Signer,
    Attribute, Attributes, ObjectStore as _,
};
use dashmap::DashMap;
use tokio::io::AsyncWriteExt;
use url::Url;

use super::{Store, StoreError};

/// S3-compatible object storage, with one client per bucket
#[derive(Clone)]
pub(crate) struct ObjectStore {
    builder: AmazonS3Builder,
    bucket_name: String,
    clients: Arc<DashMap<String, Arc<AmazonS3>>>,
}

impl std::fmt::Debug for ObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStore")
            .field("bucket_name", &self.bucket_name)
            .field("clients", &self.clients.len())
            .finish()
    }
}

impl ObjectStore {
    #[tracing::instrument(skip(access_key, secret_key, session_token))]
    pub(crate) fn build(
        endpoint: Option<Url>,
        bucket_name: String,
        use_path_style: bool,
        region: String,
        access_key: String,
        secret_key: String,
        session_token: Option<String>,
    ) -> Result<Self, StoreError> {
        let mut builder = AmazonS3Builder::new()
            .with_region(region)
            .with_access_key_id(access_key)
            .with_secret_access_key(secret_key)
            .with_virtual_hosted_style_request(!use_path_style);

        if let Some(endpoint) = endpoint {
            builder = builder
                .with_allow_http(endpoint.scheme() == "http")
                .with_endpoint(endpoint.as_str().trim_end_matches('/'));
        }

        if let Some(token) = session_token {
            builder = builder.with_token(token);
        }

        let store = ObjectStore {
            builder,
            bucket_name,
            clients: Arc::new(DashMap::new()),
        };

        // fail on bad settings at startup
        store.client(&store.bucket_name)?;

        Ok(store)
    }

    fn client(&self, bucket: &str) -> Result<Arc<AmazonS3>, StoreError> {
        if let Some(client) = self.clients.get(bucket) {
            return Ok(Arc::clone(client.value()));
        }

        let client = self
            .builder
            .clone()
            .with_bucket_name(bucket)
            .build()
            .map_err(StoreError::Build)?;

        let client = Arc::new(client);
        self.clients.insert(bucket.to_string(), Arc::clone(&client));

        Ok(client)
    }
}

#[async_trait::async_trait(?Send)]
impl Store for ObjectStore {
    #[tracing::instrument]
    async fn health_check(&self) -> Result<(), StoreError> {
        let client = self.client(&self.bucket_name)?;

        match client.head(&ObjectPath::from("healthz")).await {
            Ok(_) => Ok(()),
            Err(e) => {
                let e = StoreError::from(e);

                if e.is_not_found() {
                    Ok(())
                } else {
                    Err(e)
                }
            }
        }
    }

    fn bucket(&self) -> &str {
        &self.bucket_name
    }

    #[tracing::instrument(skip(self))]
    async fn save_file(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        content_type: &str,
    ) -> Result<(), StoreError> {
        let client = self.client(bucket)?;

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());

        let mut file = tokio::fs::File::open(path).await?;
        let mut writer =
            BufWriter::new(client, ObjectPath::from(key)).with_attributes(attributes);

        let res = async {
            let written = tokio::io::copy(&mut file, &mut writer).await?;
            writer.shutdown().await?;
            Ok::<_, std::io::Error>(written)
        }
        .await;

        match res {
            Ok(written) => {
                tracing::debug!("Wrote {written} bytes");
                Ok(())
            }
            Err(e) => {
                if let Err(abort_error) = writer.abort().await {
                    tracing::warn!("Failed to abort upload: {abort_error}");
                }

                Err(e.into())
            }
        }
    }

    #[tracing::instrument(skip(self))]
    async fn signed_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<Url, StoreError> {
        let client = self.client(bucket)?;

        let url = client
            .signed_url(reqwest::Method::GET, &ObjectPath::from(key), expires_in)
            .await?;

        Ok(url)
    }
}
