#[actix_web::main]
async fn main() -> color_eyre::Result<()> {
    vidkeep::VidkeepConfiguration::build_default()?
        .install_tracing()?
        .install_metrics()?
        .run()
        .await
}
