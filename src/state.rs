use std::sync::Arc;

use crate::{
    auth::JwtAuth, config::Configuration, media::ArcMediaTools, repo::ArcRepo,
    tmp_file::ArcTmpDir,
};

#[derive(Clone)]
pub(crate) struct State<S> {
    pub(super) config: Configuration,
    pub(super) tmp_dir: ArcTmpDir,
    pub(super) repo: ArcRepo,
    pub(super) store: S,
    pub(super) media: ArcMediaTools,
    pub(super) auth: Arc<JwtAuth>,
}
