mod aspect;
mod auth;
mod config;
mod error;
mod error_code;
mod future;
mod ingest;
mod init_metrics;
mod init_tracing;
mod locator;
mod media;
mod object_key;
mod process;
mod repo;
mod signed_url;
mod state;
mod store;
mod tmp_file;

use std::{marker::PhantomData, path::Path, sync::Arc};

use actix_form_data::{Field, Form, FormData, Multipart, Value};
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::Instrument;
use tracing_actix_web::TracingLogger;
use uuid::Uuid;

use self::{
    auth::JwtAuth,
    error::{Error, UploadError},
    init_tracing::init_tracing,
    media::{ArcMediaTools, FfMpeg},
    repo::{Repo, VideoRecord},
    state::State,
    store::{object_store::ObjectStore, Store},
    tmp_file::TmpDir,
};

pub use self::config::{ConfigSource, VidkeepConfiguration};

const MEGABYTES: usize = 1024 * 1024;

struct Upload<S: Store + 'static>(Value<VideoRecord>, PhantomData<S>);

impl<S: Store + 'static> FormData for Upload<S> {
    type Item = VideoRecord;
    type Error = Error;

    fn form(req: &HttpRequest) -> Result<Form<Self::Item, Self::Error>, Self::Error> {
        let state = req
            .app_data::<web::Data<State<S>>>()
            .expect("No state in request")
            .clone();

        let requester = state.auth.authenticate(req.headers())?;
        let video_id = parse_video_id(req.match_info().query("video_id"))?;

        // This form is expecting a single file field, 'video'
        Ok(Form::new()
            .max_files(1)
            .max_file_size(state.config.media.max_file_size.saturating_mul(MEGABYTES))
            .transform_error(transform_error)
            .field(
                "video",
                Field::file(move |filename, content_type: Option<mime::Mime>, stream| {
                    let state = state.clone();

                    let span = tracing::info_span!("file-upload", ?filename, %video_id);

                    Box::pin(
                        async move {
                            // a part without Content-Type fails the media type check
                            let media_type =
                                content_type.as_ref().map(mime::Mime::essence_str).unwrap_or("");

                            ingest::ingest(
                                &state,
                                requester,
                                video_id,
                                media_type,
                                stream,
                            )
                            .await
                        }
                        .instrument(span),
                    )
                }),
            ))
    }

    fn extract(value: Value<Self::Item>) -> Result<Self, Self::Error> {
        Ok(Upload(value, PhantomData))
    }
}

fn parse_video_id(video_id: &str) -> Result<Uuid, Error> {
    Ok(video_id.parse().map_err(UploadError::InvalidVideoId)?)
}

/// Respond to a finished upload with the playable record
#[tracing::instrument(name = "Uploaded video", skip(value, state))]
async fn upload<S: Store + 'static>(
    Multipart(Upload(value, _)): Multipart<Upload<S>>,
    state: web::Data<State<S>>,
) -> Result<HttpResponse, Error> {
    let record = value
        .map()
        .and_then(|mut m| m.remove("video"))
        .and_then(|video| video.file())
        .ok_or(UploadError::NoFiles)?
        .result;

    let signed = signed_url::sign_video(&state.store, record).await?;

    Ok(HttpResponse::Ok().json(&signed))
}

#[derive(Debug, serde::Deserialize)]
struct NewVideo {
    title: String,
    #[serde(default)]
    description: Option<String>,
}

#[tracing::instrument(name = "Create video", skip(req, new_video, state))]
async fn create_video<S: Store + 'static>(
    req: HttpRequest,
    web::Json(new_video): web::Json<NewVideo>,
    state: web::Data<State<S>>,
) -> Result<HttpResponse, Error> {
    let user_id = state.auth.authenticate(req.headers())?;

    let record = VideoRecord::draft(user_id, new_video.title, new_video.description);
    state.repo.create(&record).await?;

    Ok(HttpResponse::Created().json(&record))
}

#[tracing::instrument(name = "List videos", skip(req, state))]
async fn list_videos<S: Store + 'static>(
    req: HttpRequest,
    state: web::Data<State<S>>,
) -> Result<HttpResponse, Error> {
    let user_id = state.auth.authenticate(req.headers())?;

    let records = state.repo.list_for_owner(user_id).await?;

    let mut videos = Vec::with_capacity(records.len());
    for record in records {
        videos.push(signed_url::expand(&state.store, record).await?);
    }

    Ok(HttpResponse::Ok().json(&videos))
}

#[tracing::instrument(name = "Fetch video", skip(req, state))]
async fn get_video<S: Store + 'static>(
    req: HttpRequest,
    video_id: web::Path<String>,
    state: web::Data<State<S>>,
) -> Result<HttpResponse, Error> {
    let user_id = state.auth.authenticate(req.headers())?;
    let video_id = parse_video_id(&video_id)?;

    let record = state
        .repo
        .get(video_id)
        .await?
        .ok_or(UploadError::RecordNotFound)?;

    if !record.is_owned_by(user_id) {
        return Err(UploadError::NotAuthorized.into());
    }

    let video = signed_url::expand(&state.store, record).await?;

    Ok(HttpResponse::Ok().json(&video))
}

async fn healthz<S: Store>(state: web::Data<State<S>>) -> Result<HttpResponse, Error> {
    state.repo.health_check().await?;
    state.store.health_check().await?;
    Ok(HttpResponse::Ok().finish())
}

fn transform_error(error: actix_form_data::Error) -> actix_web::Error {
    let error: Error = error.into();
    let error: actix_web::Error = error.into();
    error
}

fn configure_endpoints<S: Store + 'static>(config: &mut web::ServiceConfig, state: State<S>) {
    config
        .app_data(web::Data::new(state))
        .route("/healthz", web::get().to(healthz::<S>))
        .service(
            web::scope("/api")
                .service(
                    web::resource("/video_upload/{video_id}").route(web::post().to(upload::<S>)),
                )
                .service(
                    web::resource("/videos")
                        .route(web::get().to(list_videos::<S>))
                        .route(web::post().to(create_video::<S>)),
                )
                .service(web::resource("/videos/{video_id}").route(web::get().to(get_video::<S>))),
        );
}

async fn launch<S: Store + Send + 'static>(state: State<S>) -> std::io::Result<()> {
    let address = state.config.server.address;

    tracing::info!("Starting vidkeep on {address}");

    HttpServer::new(move || {
        let state = state.clone();

        App::new()
            .wrap(TracingLogger::default())
            .configure(move |sc| configure_endpoints(sc, state))
    })
    .bind(address)?
    .run()
    .await
}

impl VidkeepConfiguration {
    /// Build the vidkeep configuration from commandline arguments
    ///
    /// This is probably not useful for 3rd party applications that handle their own commandline
    pub fn build_default() -> color_eyre::Result<Self> {
        config::configure()
    }

    /// Build the vidkeep configuration from a file or in-memory value
    pub fn builder<P, T>(source: ConfigSource<P, T>) -> color_eyre::Result<Self>
    where
        P: AsRef<Path>,
        T: serde::Serialize,
    {
        config::configure_without_clap(source, None::<&Path>)
    }

    /// Install the default vidkeep tracer
    ///
    /// This is probably not useful for 3rd party applications that install their own tracing
    /// subscribers.
    pub fn install_tracing(self) -> color_eyre::Result<Self> {
        init_tracing(&self.config.tracing)?;
        Ok(self)
    }

    /// Describe vidkeep's metrics and start the prometheus listener if one is configured
    pub fn install_metrics(self) -> color_eyre::Result<Self> {
        init_metrics::init_metrics();

        if let Some(addr) = self.config.metrics.prometheus_address {
            PrometheusBuilder::new()
                .with_http_listener(addr)
                .install()?;
        }

        Ok(self)
    }

    /// Run the vidkeep web server until it is shut down
    pub async fn run(self) -> color_eyre::Result<()> {
        let VidkeepConfiguration { config } = self;

        let tmp_dir = TmpDir::init(&config.server.temporary_directory).await?;

        let repo = Repo::open(config.repo.clone())?;

        let store = match config.store.clone() {
            config::Store::ObjectStorage(config::ObjectStorage {
                endpoint,
                bucket_name,
                use_path_style,
                region,
                access_key,
                secret_key,
                session_token,
            }) => ObjectStore::build(
                endpoint,
                bucket_name,
                use_path_style,
                region,
                access_key,
                secret_key,
                session_token,
            )?,
        };

        let media: ArcMediaTools = Arc::new(FfMpeg::new(
            config.media.ffprobe_path.clone(),
            config.media.ffmpeg_path.clone(),
            config.media.process_timeout,
        ));

        let auth = Arc::new(JwtAuth::new(&config.auth.jwt_secret));

        let state = State {
            config,
            tmp_dir: tmp_dir.clone(),
            repo: repo.to_arc(),
            store,
            media,
            auth,
        };

        launch(state).await?;

        tmp_dir.cleanup().await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests;
