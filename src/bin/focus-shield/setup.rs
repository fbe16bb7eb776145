use std::path::PathBuf;
use std::sync::Arc;

use focus_shield::client::app::connector::{Connector, UnixConnector};
use focus_shield::client::outbound::{PreferenceService, TimerService, WatchService};
use focus_shield::client::Client;
use focus_shield::config;
use focus_shield::domain::client::ApplicationCore;
use focus_shield::utils::xdg::{Xdg, XdgBaseKind};
use snafu::{prelude::*, Whatever};

use crate::cli::Arguments;

const APP_NAME: &str = "focus-shield";

pub fn bootstrap(args: &Arguments) -> Result<Client, Whatever> {
    let socket = socket(args)?;
    let core = core(socket);
    Ok(Client::new(core))
}

fn socket(args: &Arguments) -> Result<PathBuf, Whatever> {
    if let Some(socket) = &args.socket {
        return Ok(socket.clone());
    }

    let res = match &args.config {
        Some(path) => config::load_with_path(path),
        None => config::load_with_xdg(APP_NAME),
    };
    let configuration = res.whatever_context("Could not load configuration")?;

    match configuration.runtime.socket {
        Some(socket) => Ok(socket),
        None => Xdg::new(APP_NAME)
            .and_then(|xdg| xdg.resolve(XdgBaseKind::Runtime, "daemon.socket"))
            .whatever_context("Could not use XDG base directories"),
    }
}

fn core(socket: PathBuf) -> Arc<ApplicationCore> {
    let connector: Arc<dyn Connector> = Arc::new(UnixConnector::new(socket));

    let timer_port = Arc::new(TimerService::new(Arc::clone(&connector)));
    let preference_port = Arc::new(PreferenceService::new(Arc::clone(&connector)));
    let watch_port = Arc::new(WatchService::new(connector));

    let core = ApplicationCore::setup(timer_port, preference_port, watch_port);
    Arc::new(core)
}
