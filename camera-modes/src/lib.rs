pub mod cli;
pub mod config;
pub mod dispatch;
pub mod mode;
pub mod selector;
pub mod session;
pub mod snapshot;
pub mod terminal;

pub use dispatch::apply;
pub use mode::{DEFAULT_MODE, Mode, ModeParams, ModeRegistry, Slider};
pub use selector::{ModeSelector, Selection};
pub use session::{
    CaptureSession, Command, DisplaySession, Presenter, SessionOptions, SessionStats,
};
pub use snapshot::{Artifact, Clock, SnapshotError, SnapshotWriter, SystemClock};

pub fn init_logger() {
    use std::io::Write;

    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .filter_module("nokhwa", log::LevelFilter::Warn)
        .parse_default_env()
        .format(|buf, record| {
            let style = buf.default_level_style(record.level());
            let ts = chrono::Local::now().format("%H:%M:%S");

            writeln!(
                buf,
                "[{} {style}{}{style:#} {} {}] {}",
                ts,
                record.level(),
                record
                    .file()
                    .unwrap_or("None")
                    .split('/')
                    .next_back()
                    .unwrap_or("None"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .init();
}
