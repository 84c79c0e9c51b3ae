// Format constants for WindCube day files

pub const SECONDS_PER_DAY: u32 = 24 * 60 * 60;

pub const DEFAULT_SAMPLE_PERIOD_SECS: u32 = 600; // 144 slots per day
pub const DEFAULT_FILE_PATTERN: &str = "%Y-%m/%Y-%m-%d.sta";
pub const DEFAULT_DELIMITER: char = '\t';
pub const DEFAULT_MAX_OPEN_FILES: usize = 4;

// Preamble line announcing the number of key=value lines that follow
pub const HEADER_SIZE_KEY: &str = "HeaderSize";

// First cell of the column header row (prefix, case-insensitive)
pub const TIMESTAMP_COLUMN: &str = "timestamp";

pub const COMMENT_PREFIX: char = '#';

// Cells decoded as "no value" instead of rejecting the row
pub const MISSING_MARKERS: [&str; 3] = ["nan", "na", "-"];

pub const TIMESTAMP_FORMATS: [&str; 3] = [
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

// Compression codes, keyed by day file suffix
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionType {
    None = 0,
    Gzip = 1,
    Lz4 = 2,
    Zstd = 3,
}

impl CompressionType {
    /// Probe order when locating a day file; the plain file wins.
    pub const ALL: [CompressionType; 4] = [
        CompressionType::None,
        CompressionType::Gzip,
        CompressionType::Zstd,
        CompressionType::Lz4,
    ];

    pub fn suffix(self) -> &'static str {
        match self {
            CompressionType::None => "",
            CompressionType::Gzip => ".gz",
            CompressionType::Lz4 => ".lz4",
            CompressionType::Zstd => ".zst",
        }
    }

    pub fn from_file_name(name: &str) -> (Self, &str) {
        for compression in [CompressionType::Gzip, CompressionType::Zstd, CompressionType::Lz4] {
            if let Some(stem) = name.strip_suffix(compression.suffix()) {
                return (compression, stem);
            }
        }
        (CompressionType::None, name)
    }
}
