use std::{net::SocketAddr, path::PathBuf};

use clap::{Parser, Subcommand};
use url::Url;

use crate::config::primitives::{LogFormat, Targets};

impl Args {
    pub(super) fn into_output(self) -> Output {
        let Args {
            config_file,
            log_format,
            log_targets,
            log_spans,
            opentelemetry_url,
            opentelemetry_service_name,
            opentelemetry_targets,
            save_to,
            command,
        } = self;

        let tracing = Tracing {
            logging: Logging {
                format: log_format,
                targets: log_targets,
                log_spans,
            },
            opentelemetry: OpenTelemetry {
                url: opentelemetry_url,
                service_name: opentelemetry_service_name,
                targets: opentelemetry_targets,
            },
        };

        match command {
            Command::Run(Run {
                address,
                temporary_directory,
                metrics_prometheus_address,
                media_max_file_size,
                media_process_timeout,
                media_ffprobe_path,
                media_ffmpeg_path,
                jwt_secret,
                store,
            }) => {
                let server = Server {
                    address,
                    temporary_directory,
                };

                let metrics = Metrics {
                    prometheus_address: metrics_prometheus_address,
                };

                let media = Media {
                    max_file_size: media_max_file_size,
                    process_timeout: media_process_timeout,
                    ffprobe_path: media_ffprobe_path,
                    ffmpeg_path: media_ffmpeg_path,
                };

                let auth = Auth { jwt_secret };

                let (store, repo) = match store {
                    Some(RunStore::ObjectStorage(RunObjectStorage { storage, repo })) => {
                        (Some(Store::ObjectStorage(storage)), repo)
                    }
                    None => (None, None),
                };

                Output {
                    config_format: ConfigFormat {
                        server,
                        tracing,
                        metrics,
                        media,
                        auth,
                        repo,
                        store,
                    },
                    save_to,
                    config_file,
                }
            }
        }
    }
}

pub(super) struct Output {
    pub(super) config_format: ConfigFormat,
    pub(super) save_to: Option<PathBuf>,
    pub(super) config_file: Option<PathBuf>,
}

/// Settings given on the command line, serialized as the highest precedence config layer
#[derive(Debug, Default, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub(super) struct ConfigFormat {
    server: Server,
    tracing: Tracing,
    metrics: Metrics,
    media: Media,
    auth: Auth,
    #[serde(skip_serializing_if = "Option::is_none")]
    repo: Option<Repo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    store: Option<Store>,
}

#[derive(Debug, Default, serde::Serialize)]
#[serde(rename_all = "snake_case")]
struct Server {
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<SocketAddr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temporary_directory: Option<PathBuf>,
}

#[derive(Debug, Default, serde::Serialize)]
#[serde(rename_all = "snake_case")]
struct Tracing {
    logging: Logging,
    opentelemetry: OpenTelemetry,
}

#[derive(Debug, Default, serde::Serialize)]
#[serde(rename_all = "snake_case")]
struct Logging {
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<LogFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    targets: Option<Targets>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    log_spans: bool,
}

#[derive(Debug, Default, serde::Serialize)]
#[serde(rename_all = "snake_case")]
struct OpenTelemetry {
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<Url>,
    #[serde(skip_serializing_if = "Option::is_none")]
    service_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    targets: Option<Targets>,
}

#[derive(Debug, Default, serde::Serialize)]
#[serde(rename_all = "snake_case")]
struct Metrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    prometheus_address: Option<SocketAddr>,
}

#[derive(Debug, Default, serde::Serialize)]
#[serde(rename_all = "snake_case")]
struct Media {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_file_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    process_timeout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ffprobe_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ffmpeg_path: Option<String>,
}

#[derive(Default, serde::Serialize)]
#[serde(rename_all = "snake_case")]
struct Auth {
    #[serde(skip_serializing_if = "Option::is_none")]
    jwt_secret: Option<String>,
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Auth").finish_non_exhaustive()
    }
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "snake_case")]
#[serde(tag = "type")]
enum Store {
    ObjectStorage(ObjectStorage),
}

/// Run the vidkeep video service
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub(super) struct Args {
    /// Path to the vidkeep configuration file
    #[arg(short, long)]
    config_file: Option<PathBuf>,

    /// Format of logs printed to stdout
    #[arg(long)]
    log_format: Option<LogFormat>,
    /// Log levels to print to stdout, respects RUST_LOG formatting
    #[arg(long)]
    log_targets: Option<Targets>,
    /// Whether to log openning and closing of tracing spans to stdout
    #[arg(long)]
    log_spans: bool,

    /// URL to send OpenTelemetry traces
    #[arg(long)]
    opentelemetry_url: Option<Url>,
    /// Service Name to use for OpenTelemetry
    #[arg(long)]
    opentelemetry_service_name: Option<String>,
    /// Log levels to use for OpenTelemetry, respects RUST_LOG formatting
    #[arg(long)]
    opentelemetry_targets: Option<Targets>,

    /// File to save the current configuration for reproducible runs
    #[arg(long)]
    save_to: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Runs the vidkeep web server
    Run(Run),
}

#[derive(Debug, Parser)]
struct Run {
    /// The address and port to bind the vidkeep web server
    #[arg(short, long)]
    address: Option<SocketAddr>,

    /// The directory uploads are staged in while they are processed
    #[arg(long)]
    temporary_directory: Option<PathBuf>,

    /// Whether to enable the prometheus scrape endpoint
    #[arg(long)]
    metrics_prometheus_address: Option<SocketAddr>,

    /// The maximum size, in megabytes, of an uploaded video
    ///
    /// This number defaults to 1024
    #[arg(long)]
    media_max_file_size: Option<usize>,

    /// How long (in seconds) ffprobe and ffmpeg may run before they are killed
    ///
    /// Unset by default, meaning no limit
    #[arg(long)]
    media_process_timeout: Option<u64>,

    /// Path or name of the ffprobe binary
    #[arg(long)]
    media_ffprobe_path: Option<String>,

    /// Path or name of the ffmpeg binary
    #[arg(long)]
    media_ffmpeg_path: Option<String>,

    /// The HMAC secret bearer tokens are signed with
    #[arg(long)]
    jwt_secret: Option<String>,

    #[command(subcommand)]
    store: Option<RunStore>,
}

/// Run vidkeep with the provided storage
#[derive(Debug, Subcommand)]
enum RunStore {
    /// Run vidkeep with object storage
    ObjectStorage(RunObjectStorage),
}

/// Run vidkeep with the provided object storage
#[derive(Debug, Parser)]
struct RunObjectStorage {
    #[command(flatten)]
    storage: ObjectStorage,

    #[command(subcommand)]
    repo: Option<Repo>,
}

/// Configuration for data repositories
#[derive(Debug, Subcommand, serde::Serialize)]
#[serde(rename_all = "snake_case")]
#[serde(tag = "type")]
enum Repo {
    /// Run vidkeep with the provided sled-backed data repository
    Sled(Sled),
}

/// Configuration for Object Storage
#[derive(Clone, Debug, Parser, serde::Serialize)]
#[serde(rename_all = "snake_case")]
struct ObjectStorage {
    /// The base endpoint for the object storage
    ///
    /// When unset, the AWS endpoint for the region is used
    #[arg(short, long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    endpoint: Option<Url>,

    /// Determines whether to use path style or virtualhost style for accessing objects
    ///
    /// When this is true, objects will be fetched from {endpoint}/{bucket_name}/{object}
    /// When false, objects will be fetched from {bucket_name}.{endpoint}/{object}
    #[arg(short, long)]
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    use_path_style: bool,

    /// The bucket uploads are written to
    #[arg(short, long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    bucket_name: Option<String>,

    /// The region the bucket is located in
    #[arg(short, long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    region: Option<String>,

    /// The Access Key for the user accessing the bucket
    #[arg(short, long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    access_key: Option<String>,

    /// The secret key for the user accessing the bucket
    #[arg(short, long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    secret_key: Option<String>,

    /// The session token for accessing the bucket
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    session_token: Option<String>,
}

/// Configuration for the sled-backed data repository
#[derive(Debug, Parser, serde::Serialize)]
#[serde(rename_all = "snake_case")]
struct Sled {
    /// The path to store the sled database
    #[arg(short, long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<PathBuf>,

    /// The cache capacity, in bytes, allowed to sled for in-memory operations
    #[arg(short, long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    cache_capacity: Option<u64>,
}
