//! Client for gateways exposing the IPFS `add`/`cat` HTTP API.

pub mod infrastructure;

#[cfg(feature = "test-util")]
pub mod testing;

pub use infrastructure::{
    filename::random_filename, read_payload, ClientConfig, ConfigError, ContentDescriptor,
    ContentStore, IpfsClient, IpfsError, IpfsResult, MemoryContentStore, TransportErrorKind,
};

/// Create a client from a configuration file
pub fn connect_from_file<P: AsRef<std::path::Path>>(config_path: P) -> IpfsResult<IpfsClient> {
    let config = ClientConfig::from_file(config_path)?;
    IpfsClient::new(config)
}

/// Create a client from a configuration string
pub fn connect_from_str(config_str: &str) -> IpfsResult<IpfsClient> {
    let config = ClientConfig::from_toml_str(config_str)?;
    IpfsClient::new(config)
}

/// Create a client for the public Stratos gateway
pub fn connect_default() -> IpfsResult<IpfsClient> {
    IpfsClient::new(ClientConfig::default())
}
