use clubscout::{configuration::get_configuration, startup::run};
use env_logger::Env;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let configuration = get_configuration()?;

    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, exporting what has been gathered (Ctrl-C again to quit)");
            ctrl_c_cancel.cancel();
        }
        if tokio::signal::ctrl_c().await.is_ok() {
            log::error!("Interrupted twice, exiting without export");
            std::process::exit(130);
        }
    });

    let summary = run(configuration, cancel).await?;
    println!(
        "Done: {} companies ({} described, {} matched, {} without match, {} lookup errors).",
        summary.companies,
        summary.described,
        summary.matched,
        summary.no_match,
        summary.lookup_failed
    );

    Ok(())
}
