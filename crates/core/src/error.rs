use thiserror::Error;

#[derive(Error, Debug)]
pub enum TqsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Queue size {queue_size} exceeds {available} queued tasks")]
    QueueTooShort { queue_size: usize, available: usize },

    #[error("Task id {id} below offset {offset}")]
    IdBelowOffset { id: u32, offset: u32 },

    #[error("Task id {id} maps to region {region}, buffer has {regions} regions")]
    IdOutOfRange { id: u32, region: usize, regions: usize },

    #[error("Output tile size {tile_size} does not match group size {group_size}")]
    TileMismatch { tile_size: usize, group_size: usize },
}

pub type Result<T> = std::result::Result<T, TqsError>;
