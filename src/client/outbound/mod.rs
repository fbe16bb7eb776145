mod preference;
mod request;
mod timer;
mod watch;

pub use preference::PreferenceService;
pub use timer::TimerService;
pub use watch::WatchService;
