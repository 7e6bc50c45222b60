/// Default maximum packet size: 16 MiB.
pub const DEFAULT_MAX_PACKET_SIZE: usize = 16 * 1024 * 1024;

/// Default maximum protocol document size: 1 MiB.
pub const DEFAULT_MAX_PROTOCOL_FILE_SIZE: usize = 1024 * 1024;

/// Controls envelope and loader behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Largest packet `create_packet_buffer` will allocate.
    pub max_packet_size: usize,
    /// Largest protocol file `load_protocol_file` will read.
    pub max_protocol_file_size: usize,
    /// When true, a write that fills a different byte count than `size_of`
    /// reported fails with `Fault::SizeMismatch`.
    pub verify_write_size: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
            max_protocol_file_size: DEFAULT_MAX_PROTOCOL_FILE_SIZE,
            verify_write_size: true,
        }
    }
}
