use std::path::PathBuf;

/// Application name; scopes the runtime directory and the FIFO.
pub const APP_NAME: &str = "voxd";

/// File name of the ingestion FIFO inside the runtime directory.
pub const FIFO_NAME: &str = "voxd.fifo";

/// Default portrait shown on notifications.
pub const PORTRAIT_FILENAME: &str = "portrait.png";

/// Runtime directory. Must exist before the daemon starts; writers address
/// the FIFO inside it.
pub fn runtime_dir() -> PathBuf {
    PathBuf::from("/var/tmp").join(APP_NAME)
}

pub fn fifo_path() -> PathBuf {
    runtime_dir().join(FIFO_NAME)
}

pub fn portrait_path() -> PathBuf {
    PathBuf::from("data").join(PORTRAIT_FILENAME)
}
