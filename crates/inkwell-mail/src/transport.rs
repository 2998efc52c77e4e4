//! The named channel between mail queue clients and the owning process.
//!
//! On Windows this is a real named pipe, `\\.\pipe\{name}`. On Unix the same
//! name maps to a domain socket at `{temp_dir}/{name}.sock`. Either way a
//! connection carries exactly one message and is then closed.

use std::io;

/// Address of the mail queue channel, derived from its configured name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipeEndpoint {
    name: String,
}

impl PipeEndpoint {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[cfg(unix)]
    pub fn socket_path(&self) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("{}.sock", self.name))
    }

    #[cfg(windows)]
    pub fn pipe_address(&self) -> String {
        format!(r"\\.\pipe\{}", self.name)
    }

    /// Human-readable address for logs.
    pub fn address(&self) -> String {
        #[cfg(unix)]
        {
            self.socket_path().display().to_string()
        }
        #[cfg(windows)]
        {
            self.pipe_address()
        }
    }
}

impl std::fmt::Display for PipeEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.address())
    }
}

#[cfg(unix)]
pub use self::unix::{connect, ClientStream, ServerChannel, ServerStream};
#[cfg(windows)]
pub use self::windows::{connect, ClientStream, ServerChannel, ServerStream};

#[cfg(unix)]
mod unix {
    use super::*;
    use std::path::PathBuf;
    use tokio::net::{UnixListener, UnixStream};

    pub type ServerStream = UnixStream;
    pub type ClientStream = UnixStream;

    /// Listening side of the channel. Removes its socket file on drop.
    pub struct ServerChannel {
        listener: UnixListener,
        path: PathBuf,
    }

    impl ServerChannel {
        /// Bind the channel. A socket file left behind by a previous owner is
        /// replaced. Connections are served one at a time, so
        /// `_max_instances` has no Unix counterpart.
        pub fn bind(endpoint: &PipeEndpoint, _max_instances: usize) -> io::Result<Self> {
            let path = endpoint.socket_path();
            match std::fs::remove_file(&path) {
                Ok(()) => tracing::debug!(path = %path.display(), "Removed stale mail queue socket"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }

            let listener = UnixListener::bind(&path)?;
            Ok(Self { listener, path })
        }

        pub async fn accept(&mut self) -> io::Result<ServerStream> {
            let (stream, _) = self.listener.accept().await?;
            Ok(stream)
        }
    }

    impl Drop for ServerChannel {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.path);
        }
    }

    pub async fn connect(endpoint: &PipeEndpoint) -> io::Result<ClientStream> {
        UnixStream::connect(endpoint.socket_path()).await
    }
}

#[cfg(windows)]
mod windows {
    use super::*;
    use std::time::Duration;
    use tokio::net::windows::named_pipe::{
        ClientOptions, NamedPipeClient, NamedPipeServer, ServerOptions,
    };

    pub type ServerStream = NamedPipeServer;
    pub type ClientStream = NamedPipeClient;

    // winerror.h
    const ERROR_PIPE_BUSY: i32 = 231;
    const MAX_PIPE_INSTANCES: usize = 254;

    /// Listening side of the channel: one pipe instance waiting for a client.
    pub struct ServerChannel {
        address: String,
        max_instances: usize,
        next: Option<NamedPipeServer>,
    }

    impl ServerChannel {
        pub fn bind(endpoint: &PipeEndpoint, max_instances: usize) -> io::Result<Self> {
            let mut channel = Self {
                address: endpoint.pipe_address(),
                max_instances: max_instances.clamp(1, MAX_PIPE_INSTANCES),
                next: None,
            };
            channel.next = Some(channel.create_instance()?);
            Ok(channel)
        }

        fn create_instance(&self) -> io::Result<NamedPipeServer> {
            ServerOptions::new()
                .first_pipe_instance(true)
                .max_instances(self.max_instances)
                .create(&self.address)
        }

        /// Wait for a client on the current instance. The next instance is
        /// only created on the following call, after this one is dropped.
        pub async fn accept(&mut self) -> io::Result<ServerStream> {
            let server = match self.next.take() {
                Some(server) => server,
                None => self.create_instance()?,
            };
            server.connect().await?;
            Ok(server)
        }
    }

    pub async fn connect(endpoint: &PipeEndpoint) -> io::Result<ClientStream> {
        let address = endpoint.pipe_address();
        loop {
            match ClientOptions::new().open(&address) {
                Ok(client) => return Ok(client),
                // The single instance is serving someone else; the caller's
                // connect timeout bounds this wait.
                Err(e) if e.raw_os_error() == Some(ERROR_PIPE_BUSY) => {}
                Err(e) => return Err(e),
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
}
