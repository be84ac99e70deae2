// Size units
pub const KB: usize = 1024;

// Data file preamble
pub const UADB_SIGNATURE: &[u8; 8] = b"UADB_DAT";
pub const UADB_SIGNATURE_SIZE: usize = 8;
pub const METADATA_SIZE: usize = 16;
pub const LIST_COUNT: u32 = 8;

// Node format versions
pub const FORMAT_V31: u16 = 31;
pub const FORMAT_V32: u16 = 32;

// List header: i32 count, i64 start_position, i64 length
pub const LIST_HEADER_SIZE: usize = 20;

// Record sizes (bytes)
pub const VALUE_RECORD_SIZE: u64 = 14;
pub const PROFILE_HEADER_SIZE: u64 = 13;
pub const SIGNATURE_FIXED_SIZE: u64 = 13;
pub const STRING_LENGTH_PREFIX: u64 = 2;
pub const NODE_COMMON_HEADER_SIZE: u64 = 16;
pub const NODE_NUMERIC_INDEX_SIZE: u64 = 6;
pub const INTEGER_SIZE: u64 = 4;

// Sentinel for absent string/profile/node references
pub const NO_OFFSET: i32 = -1;

// Default cache capacities per list
pub const DEFAULT_STRINGS_CACHE: usize = 5000;
pub const DEFAULT_NODES_CACHE: usize = 15000;
pub const DEFAULT_VALUES_CACHE: usize = 5000;
pub const DEFAULT_PROFILES_CACHE: usize = 600;
pub const DEFAULT_SIGNATURES_CACHE: usize = 500;

// File reader buffering
pub const FILE_READER_BUFFER_SIZE: usize = 4 * KB;

// Extension that marks a data file as a temporary artifact
pub const TEMP_FILE_EXTENSION: &str = "tmp";
