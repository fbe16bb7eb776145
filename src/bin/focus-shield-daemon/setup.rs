use std::cell::LazyCell;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use focus_shield::config::{self, Configuration, DEFAULT_BLOCKED_PAGE};
use focus_shield::daemon::app::{Server, UnixListener};
use focus_shield::daemon::outbound::{NotifyService, RuleFile};
use focus_shield::daemon::repository::{JsonFileStorage, NotificationConfiguration};
use focus_shield::domain::daemon::blocking::BlockedPage;
use focus_shield::domain::daemon::{Adapters, ApplicationCore};
use focus_shield::utils::xdg::{Xdg, XdgBaseKind, XdgError};
use snafu::{prelude::*, Whatever};
use url::Url;

use crate::cli::Arguments;

const APP_NAME: &str = "focus-shield";

pub struct Daemon {
    pub server: Server,
    pub core: Arc<ApplicationCore>,
}

struct EnvironmentPath {
    socket: PathBuf,
    storage: PathBuf,
    rules: PathBuf,
}

pub async fn bootstrap(arg: &Arguments) -> Result<Daemon, Whatever> {
    let configuration = configuration(arg)?;
    let env = environment(arg, &configuration)?;
    tracing::info!(
        socket = %env.socket.display(),
        storage = %env.storage.display(),
        rules = %env.rules.display(),
        "Resolved runtime files"
    );

    let listener = UnixListener::new(&env.socket)
        .whatever_context(format!("Could not bind to {}", env.socket.display()))?;
    let core = Arc::new(core(configuration, &env).await?);

    let server = Server::new(Box::new(listener), Arc::clone(&core));
    Ok(Daemon { server, core })
}

fn configuration(arg: &Arguments) -> Result<Arc<Configuration>, Whatever> {
    let res = match &arg.config {
        Some(path) => config::load_with_path(path),
        None => config::load_with_xdg(APP_NAME),
    };

    let configuration = res.whatever_context("Could not load configuration")?;
    Ok(Arc::new(configuration))
}

fn environment(arg: &Arguments, config: &Configuration) -> Result<EnvironmentPath, Whatever> {
    let xdg = LazyCell::new(|| Xdg::new(APP_NAME));
    let resolve = |configured: Option<&Path>,
                   kind: XdgBaseKind,
                   file: &str|
     -> Result<PathBuf, Whatever> {
        match configured {
            Some(path) => Ok(path.to_path_buf()),
            None => xdg
                .as_ref()
                .map_err(XdgError::clone)
                .and_then(|xdg| xdg.resolve_create(kind, file))
                .whatever_context("Could not use XDG base directories"),
        }
    };

    let socket = resolve(
        arg.socket.as_deref().or(config.runtime.socket.as_deref()),
        XdgBaseKind::Runtime,
        "daemon.socket",
    )?;
    let storage = resolve(
        config.runtime.storage.as_deref(),
        XdgBaseKind::Data,
        "storage.json",
    )?;
    let rules = resolve(config.runtime.rules.as_deref(), XdgBaseKind::Data, "rules.json")?;

    Ok(EnvironmentPath {
        socket,
        storage,
        rules,
    })
}

async fn core(
    config: Arc<Configuration>,
    env: &EnvironmentPath,
) -> Result<ApplicationCore, Whatever> {
    let page = config
        .blocking
        .page
        .as_deref()
        .unwrap_or(DEFAULT_BLOCKED_PAGE);
    let page = Url::parse(page).whatever_context(format!("Invalid blocked page {page}"))?;

    let storage = JsonFileStorage::open(&env.storage)
        .await
        .whatever_context("Could not open storage")?;

    let adapters = Adapters {
        storage: Arc::new(storage),
        rule_table: Arc::new(RuleFile::new(&env.rules)),
        blocked_page: BlockedPage::new(page),
        notifier: Arc::new(NotifyService::new(APP_NAME.to_owned())),
        messages: Arc::new(NotificationConfiguration::new(config)),
    };

    Ok(ApplicationCore::setup(adapters).await)
}
