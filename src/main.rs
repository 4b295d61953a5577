use std::{path::Path, process, sync::Arc};

use placard::{
    application::{
        AdminEditor, ConfigApplier, ConfigLoader, LoadOutcome, LogNotifier, SaveReceipt,
        error::AppError,
    },
    cache::{CacheConfig, ConfigCache},
    config::{self, AssetsArgs, Command, RenderArgs, SetArgs, SetManyArgs, Settings},
    domain::{AssetUpdate, ConfigSnapshot, SectionGroups},
    infra::{
        document::{DocumentOptions, render_document},
        http::StoreClient,
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        if !error.is_notified() {
            report_application_error(&error);
        }
        process::exit(error.exit_code());
    }
}

fn report_application_error(error: &AppError) {
    let report = error.report();
    if dispatcher::has_been_set() {
        error!(source = report.source, error = %report.chain(), "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(std::io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(source = report.source, error = %report.chain(), "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;
    let command = cli_args.command.unwrap_or(Command::Load);

    telemetry::init(&settings.logging)?;

    let cache = Arc::new(ConfigCache::from_config(&CacheConfig::from(&settings.cache)));

    match command {
        Command::Load => run_load(&settings, cache, false).await,
        Command::Refresh => run_load(&settings, cache, true).await,
        Command::Invalidate => {
            cache.invalidate().await;
            info!("Cleared cached UI config");
            Ok(())
        }
        Command::Assets(args) => run_assets(&settings, cache, args).await,
        Command::Set(args) => run_set(&settings, cache, args).await,
        Command::SetMany(args) => run_set_many(&settings, cache, args).await,
        Command::Render(args) => run_render(&settings, cache, args).await,
    }
}

fn build_loader(settings: &Settings, cache: Arc<ConfigCache>) -> Result<ConfigLoader, AppError> {
    let source = Arc::new(StoreClient::new(&settings.store)?);
    Ok(ConfigLoader::new(cache, source, Arc::new(ConfigApplier::new())))
}

async fn build_editor(
    settings: &Settings,
    cache: Arc<ConfigCache>,
) -> Result<AdminEditor, AppError> {
    let store = Arc::new(StoreClient::connect(&settings.store).await?);
    Ok(AdminEditor::new(store, cache, Arc::new(LogNotifier)))
}

async fn run_load(
    settings: &Settings,
    cache: Arc<ConfigCache>,
    refresh: bool,
) -> Result<(), AppError> {
    let loader = build_loader(settings, cache)?;
    let outcome = if refresh {
        loader.refresh().await
    } else {
        loader.load().await
    };

    match outcome {
        LoadOutcome::Failed { reason } => Err(AppError::unavailable(reason)),
        LoadOutcome::Cached { snapshot, .. } | LoadOutcome::Fetched { snapshot, .. } => {
            print_json(&snapshot)
        }
    }
}

async fn run_assets(
    settings: &Settings,
    cache: Arc<ConfigCache>,
    args: AssetsArgs,
) -> Result<(), AppError> {
    let store = Arc::new(StoreClient::new(&settings.store)?);
    let editor = AdminEditor::new(store, cache, Arc::new(LogNotifier));
    let groups = editor.list_grouped().await?;

    if args.json {
        print_json(&groups)
    } else {
        print_sections(&groups);
        Ok(())
    }
}

async fn run_set(
    settings: &Settings,
    cache: Arc<ConfigCache>,
    args: SetArgs,
) -> Result<(), AppError> {
    let editor = build_editor(settings, cache).await?;
    let receipt = editor
        .save_one(&args.key, &args.value)
        .await
        .map_err(AppError::Save)?;
    print_receipt(&receipt);
    Ok(())
}

async fn run_set_many(
    settings: &Settings,
    cache: Arc<ConfigCache>,
    args: SetManyArgs,
) -> Result<(), AppError> {
    let SetManyArgs { mut updates, file } = args;
    if let Some(path) = file {
        updates.extend(read_updates(&path).await?);
    }

    let editor = build_editor(settings, cache).await?;
    let receipt = editor.save_many(&updates).await.map_err(AppError::Save)?;
    print_receipt(&receipt);
    Ok(())
}

async fn run_render(
    settings: &Settings,
    cache: Arc<ConfigCache>,
    args: RenderArgs,
) -> Result<(), AppError> {
    let html = tokio::fs::read_to_string(&args.file)
        .await
        .map_err(|err| AppError::validation(format!("failed to read {}: {err}", args.file.display())))?;

    let loader = build_loader(settings, cache)?;
    let snapshot = match loader.load().await.into_snapshot() {
        Some(snapshot) => snapshot,
        None => {
            warn!(file = %args.file.display(), "UI config unavailable; rendering static content");
            ConfigSnapshot::default()
        }
    };

    let rendered = render_document(
        &html,
        &snapshot,
        DocumentOptions {
            sanitize_markup: args.sanitize_markup,
        },
    )?;
    info!(
        applied = rendered.summary.applied,
        skipped = rendered.summary.skipped,
        failed = rendered.summary.failed,
        "Rendered document"
    );
    print!("{}", rendered.html);
    Ok(())
}

async fn read_updates(path: &Path) -> Result<Vec<AssetUpdate>, AppError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|err| AppError::validation(format!("failed to read {}: {err}", path.display())))?;
    serde_json::from_str(&raw).map_err(|err| {
        AppError::validation(format!(
            "{} must hold a JSON array of {{\"key\", \"value\"}} objects: {err}",
            path.display()
        ))
    })
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), AppError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|err| AppError::unexpected(format!("failed to encode output: {err}")))?;
    println!("{json}");
    Ok(())
}

fn print_sections(groups: &SectionGroups) {
    for section in groups {
        println!("[{}]", section.name);
        for asset in &section.assets {
            println!(
                "  {:<24} {:<6} {}",
                asset.key,
                asset.asset_type.as_str(),
                asset.value.as_deref().unwrap_or("-")
            );
        }
    }
}

fn print_receipt(receipt: &SaveReceipt) {
    match receipt.message.as_deref() {
        Some(message) => println!("updated {} ({message})", receipt.updated),
        None => println!("updated {}", receipt.updated),
    }
}
