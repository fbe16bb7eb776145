use std::io::{Error as IoError, ErrorKind as IoErrorKind};
use std::os::unix::fs::FileTypeExt;
use std::os::unix::net::UnixStream as StdUnixStream;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use snafu::prelude::*;
use tokio::io::DuplexStream;
use tokio::net::UnixListener as TokioUnixListener;
use tokio::sync::mpsc::{self, Receiver, Sender};

use crate::utils::stream::Stream;

/// Abstract listener which listens on a given endpoint and accepts connections.
#[async_trait::async_trait]
pub trait Listener: Send + Sync {
    /// Accept connections and return its corresponding stream.
    ///
    /// # Errors
    ///
    /// This function will return an error if the connection fails to establish.
    async fn accept(&self) -> Result<Box<dyn Stream>, ListenError>;
}

/// An error for listening procedure.
#[derive(Debug, Snafu, Clone)]
#[non_exhaustive]
pub enum ListenError {
    #[snafu(display("Could not bind to occupied endpoint {endpoint}"))]
    InUse { endpoint: String },
    #[snafu(display("Could not bind due to system error"))]
    BindSystem {
        #[snafu(source(from(IoError, Arc::new)))]
        source: Arc<IoError>,
    },
    #[snafu(display("Could not bind: {message}"))]
    BindUnknown { message: String },
    #[snafu(display("Could not accept connection due to system error"))]
    AcceptSystem {
        #[snafu(source(from(IoError, Arc::new)))]
        source: Arc<IoError>,
    },
}

/// A [`Listener`] implementation which accepts UNIX socket connections. The
/// socket file is removed when the listener is dropped.
#[derive(Debug)]
pub struct UnixListener {
    listener: TokioUnixListener,
    path: PathBuf,
}

impl UnixListener {
    /// Create a [`UnixListener`] with a given UNIX socket path. A socket file
    /// left behind by a daemon that is no longer running is replaced.
    ///
    /// # Errors
    ///
    /// This function will return an error if another daemon is listening on
    /// the path, the path is not a socket, or binding fails.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, ListenError> {
        let path = path.as_ref();
        let endpoint = || path.to_string_lossy().into_owned();

        match std::fs::symlink_metadata(path) {
            Ok(metadata) if !metadata.file_type().is_socket() => {
                return InUseSnafu {
                    endpoint: endpoint(),
                }
                .fail()
            }
            Ok(_) => {
                ensure!(
                    StdUnixStream::connect(path).is_err(),
                    InUseSnafu {
                        endpoint: endpoint()
                    }
                );
                tracing::warn!(path = %path.display(), "Removing stale socket");
                std::fs::remove_file(path).context(BindSystemSnafu)?;
            }
            Err(err) if err.kind() == IoErrorKind::NotFound => {}
            Err(err) => return Err(err).context(BindSystemSnafu),
        }

        match TokioUnixListener::bind(path) {
            Ok(listener) => Ok(Self {
                listener,
                path: path.to_path_buf(),
            }),
            Err(err) => match err.kind() {
                IoErrorKind::AddrInUse => InUseSnafu {
                    endpoint: endpoint(),
                }
                .fail(),
                _ => Err(err).context(BindSystemSnafu),
            },
        }
    }
}

#[async_trait::async_trait]
impl Listener for UnixListener {
    async fn accept(&self) -> Result<Box<dyn Stream>, ListenError> {
        self.listener
            .accept()
            .await
            .map(|(stream, _)| -> Box<dyn Stream> { Box::new(stream) })
            .context(AcceptSystemSnafu)
    }
}

impl Drop for UnixListener {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), %err, "Could not remove socket");
        }
    }
}

/// A [`Listener`] implementation which returns [`DuplexStream`]s. This is
/// typically used for testing purpose.
#[derive(Debug)]
pub struct DuplexListener {
    peer: Sender<DuplexStream>,
    buffer_size: usize,
}

impl DuplexListener {
    /// Create a [`DuplexListener`] and return a channel receiver which
    /// receives the [`DuplexStream`].
    pub fn new(buffer_size: usize) -> (Self, Receiver<DuplexStream>) {
        let (sender, receiver) = mpsc::channel(1);
        let listener = Self {
            peer: sender,
            buffer_size,
        };
        (listener, receiver)
    }
}

#[async_trait::async_trait]
impl Listener for DuplexListener {
    async fn accept(&self) -> Result<Box<dyn Stream>, ListenError> {
        let (local, peer) = tokio::io::duplex(self.buffer_size);
        self.peer.send(peer).await.map_err(|_| {
            BindUnknownSnafu {
                message: "Peer already closed",
            }
            .build()
        })?;
        Ok(Box::new(local))
    }
}
