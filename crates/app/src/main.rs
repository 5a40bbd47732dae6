use clap::Parser;
use engine::{
    BatchStore, BatchStoreBuilder, DatabaseRemote, LocalSnapshot, Offline, RemotePort, RestRemote,
    RestSession, SessionEvent, User,
};
use migration::{Migrator, MigratorTrait};

use crate::{
    cli::{Cli, Command, LoginArgs},
    commands::Context,
    error::{AppError, Result},
    session::{SessionFile, ViewState},
    settings::{RemoteSettings, Settings},
};

mod cli;
mod commands;
mod error;
mod prompt;
mod session;
mod settings;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load(&cli.global)?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "batchbook={level},engine={level},report={level}",
            level = settings.level
        ))
        .with_writer(std::io::stderr)
        .init();

    let session_path = settings.session_path();
    let mut session = SessionFile::load(&session_path)?;
    let event = match &cli.command {
        Command::Login(args) => {
            let signed_in = sign_in(&settings, args).await?;
            let event = signed_in.event();
            session.session = Some(signed_in);
            session.save(&session_path)?;
            Some(event)
        }
        Command::Logout => {
            SessionFile::clear(&session_path)?;
            session.session = None;
            Some(SessionEvent::SignedOut)
        }
        _ => None,
    };

    match settings.remote.clone() {
        RemoteSettings::Offline => {
            tracing::debug!(path = %settings.snapshot_path().display(), "using local snapshot");
            let builder = BatchStore::builder(Offline)
                .snapshot(LocalSnapshot::new(settings.snapshot_path()));
            let store = with_session(builder, &session).build()?;
            execute(store, event, cli.command, &settings).await
        }
        RemoteSettings::Database { url } => {
            let db = sea_orm::Database::connect(url.as_str()).await?;
            Migrator::up(&db, None).await?;
            let builder = BatchStore::builder(DatabaseRemote::new(db));
            let store = with_session(builder, &session).build()?;
            execute(store, event, cli.command, &settings).await
        }
        RemoteSettings::Rest { base_url, api_key } => {
            let mut remote = RestRemote::new(&base_url, &api_key)?;
            if let Some(signed_in) = &session.session {
                remote = remote.with_session(signed_in);
            }
            let store = with_session(BatchStore::builder(remote), &session).build()?;
            execute(store, event, cli.command, &settings).await
        }
    }
}

fn with_session<R: RemotePort>(
    builder: BatchStoreBuilder<R>,
    session: &SessionFile,
) -> BatchStoreBuilder<R> {
    match &session.session {
        Some(signed_in) => builder.user(signed_in.user.clone()),
        None => builder,
    }
}

/// Password sign-in against the REST service. Other remotes trust the
/// given email as the user id.
async fn sign_in(settings: &Settings, args: &LoginArgs) -> Result<RestSession> {
    let name = args.name.clone().unwrap_or_default();
    match &settings.remote {
        RemoteSettings::Rest { base_url, api_key } => {
            let mut remote = RestRemote::new(base_url, api_key)?;
            let password = prompt::password("Password: ")?;
            let mut session = remote.sign_in(&args.email, &password).await?;
            if !name.is_empty() {
                session.user.name = name;
            }
            Ok(session)
        }
        RemoteSettings::Offline | RemoteSettings::Database { .. } => Ok(RestSession {
            user: User::new(args.email.clone(), args.email.clone(), name),
            access_token: String::new(),
        }),
    }
}

async fn execute<R: RemotePort>(
    mut store: BatchStore<R>,
    event: Option<SessionEvent>,
    command: Command,
    settings: &Settings,
) -> Result<()> {
    let state_path = settings.state_path();
    let mut ctx = Context {
        settings,
        view: ViewState::load(&state_path)?,
    };

    match event {
        Some(event) => store.on_session_event(event).await?,
        None if store.remote().is_configured() => {
            if store.user().is_none() {
                return Err(AppError::Usage(
                    "not signed in; run `batchbook login --email <email>`".to_string(),
                ));
            }
            store.load_batches().await?;
        }
        None => {}
    }

    if let Some(id) = ctx.view.selected_batch
        && store.find_batch(id).is_some()
    {
        store.select_batch(id)?;
    }

    commands::run(&mut store, command, &mut ctx).await?;
    ctx.view.save(&state_path)?;
    Ok(())
}
