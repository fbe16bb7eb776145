use std::fs::{self, File};
use std::io::{Error as IoError, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use snafu::prelude::*;

pub const DEFAULT_CONTENT: &str = r#"
# This configuration file is generated automatically. Feel free to do some
# modification.

# The `notification.<mode>` sections specify the desktop notification shown
# when a session of that mode completes. `body` is optional.
[notification.focus]
summary = "Focus session complete"
body = "Well done! Time for a break."

[notification.short_break]
summary = "Short break is over"
body = "Ready to focus again?"

[notification.long_break]
summary = "Long break is over"
body = "Feel energetic now? Let's continue."

# The page blocked requests are redirected to. The blocked domain is passed
# in the `blocked` query parameter.
# [blocking]
# page = "http://localhost/focus-shield/blocked.html"

# The `runtime` section specifies the paths to some runtime files. Leave
# them empty to use XDG directories.
# [runtime]
# socket = "/path/to/unix/socket"
# storage = "/path/to/storage.json"
# rules = "/path/to/rules.json"
"#;

/// A reader which reads the configuration content and creates a default
/// configuration file if it is missing.
pub struct ContentReader {
    path: PathBuf,
    create_new: bool,
}

impl ContentReader {
    /// Creates a new [`ContentReader`]. With `create_new`, a missing file is
    /// created from [`DEFAULT_CONTENT`].
    pub fn new<P: AsRef<Path>>(path: P, create_new: bool) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            create_new,
        }
    }

    /// Read content from the file.
    ///
    /// # Errors
    ///
    /// This function will return an error if file doesn't exist or it fails to
    /// create a configuration file.
    pub fn read(self) -> Result<String, ReadContentError> {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                ensure!(self.create_new, NotFoundSnafu { path: self.path });
                tracing::info!(path = %self.path.display(), "Creating default configuration");
                create_configuration(&self.path)?
            }
            Err(err) => {
                return Err(err).context(FileSystemSnafu {
                    when: "Opening configuration file",
                })
            }
        };

        let mut content = String::new();
        file.read_to_string(&mut content).context(FileSystemSnafu {
            when: "Reading configuration",
        })?;
        Ok(content)
    }
}

/// Create a default configuration file along with its parent directories.
fn create_configuration(path: &Path) -> Result<File, ReadContentError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context(FileSystemSnafu {
            when: "Creating configuration directory",
        })?;
    }

    let mut file = File::options()
        .read(true)
        .write(true)
        .create_new(true)
        .open(path)
        .context(FileSystemSnafu {
            when: "Creating configuration file",
        })?;

    file.write_all(DEFAULT_CONTENT.as_bytes())
        .context(FileSystemSnafu {
            when: "Writing default configuration content",
        })?;
    file.seek(SeekFrom::Start(0)).context(FileSystemSnafu {
        when: "Reseting file cursor position to start",
    })?;

    Ok(file)
}

/// An error type for reading content from the configuration file.
#[derive(Debug, Snafu, Clone)]
#[non_exhaustive]
pub enum ReadContentError {
    #[snafu(display("Could not open inexistent file {}", path.display()))]
    NotFound { path: PathBuf },
    #[snafu(display("Could not access configuration: {when}"))]
    FileSystem {
        when: String,
        #[snafu(source(from(IoError, Arc::new)))]
        source: Arc<IoError>,
    },
}
