pub const HASH_SIZE: usize = 32;
/// Length of a hex-encoded block hash, and so the highest satisfiable difficulty.
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;
pub const DEFAULT_DIFFICULTY: u32 = 4;
/// Payload written into the genesis block.
pub const GENESIS_PAYLOAD: &str = "Genesis Block";
/// Command label used when handing a mined block to the broadcast layer.
pub const BLOCK_COMMAND: &str = "block";
