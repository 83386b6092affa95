pub(crate) const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:8080";
pub(crate) const DEFAULT_PEER_PORT: u16 = 3000;
pub(crate) const DEFAULT_DATA_DIR: &str = "./data";
/// Upper bound on a single peer message read off the wire.
pub(crate) const MAX_MESSAGE_SIZE: u64 = 4 * 1024 * 1024;
pub(crate) const PEER_CONNECT_TIMEOUT_SECS: u64 = 5;
pub(crate) const BLOCKS_PER_BATCH: u32 = 25;
pub(crate) const MAX_BLOCKS_PER_REQUEST: u32 = BLOCKS_PER_BATCH * 10;
