use dotenvy::dotenv;
use neworld_checkin::{
    FileMarkerStore, LogNotifier, NeworldClient, Notifier, Runner, Settings, SnapshotWriter,
    TelegramNotifier, init_tracing,
};
use std::process::ExitCode;
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenv().ok();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(2);
        }
    };

    let _log_guard = match init_tracing(settings.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(2);
        }
    };

    let code = match run(&settings).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "run aborted");
            ExitCode::from(2)
        }
    };

    info!("script end");
    code
}

async fn run(settings: &Settings) -> neworld_checkin::Result<ExitCode> {
    let portal = NeworldClient::with_config(&settings.base_url, settings.delay.clone())?
        .with_snapshots(SnapshotWriter::from_option(settings.snapshot_dir.as_deref()));
    let store = FileMarkerStore::new(&settings.signed_dir);

    let telegram = TelegramNotifier::from_parts(
        settings.telegram_token.as_deref(),
        settings.telegram_chat_id.as_deref(),
    )?;
    let notifier: Box<dyn Notifier> = match telegram {
        Some(telegram) => Box::new(telegram),
        None => Box::new(LogNotifier),
    };

    let outcome = Runner::new(settings, &portal, &store, &*notifier)
        .run()
        .await?;

    Ok(if outcome.is_failure() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
