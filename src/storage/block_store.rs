//! Length-framed, checksummed append-only block log.
//!
//! Each record is a fixed header (magic, format version, record kind,
//! payload length), the serialized block payload, and a trailing SHA-256 of
//! the payload. Records are only ever appended; readers scan from the
//! start and stop at the first frame that does not check out, which turns
//! a torn tail write into a silent truncation.

use log::{debug, info, warn};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::GLOBAL_CONFIG;
use crate::core::Block;
use crate::error::{ChainError, Result};
use crate::utils::{sha256_digest, ByteReader, ByteWriter};

const RECORD_MAGIC: u32 = 0x4153_5452; // "ASTR"
const RECORD_VERSION: u64 = 1;
const KIND_BLOCK: u16 = 1;

const LOG_FILE_NAME: &str = "chain.log";

/// Single-writer append-only store for blocks.
///
/// Owns its log file exclusively; opening the same path from two stores at
/// once is not supported.
pub struct BlockStore {
    root_path: PathBuf,
    log_path: PathBuf,
    log_file: File,
}

impl BlockStore {
    /// Creates the directory if missing and opens `<root>/chain.log` for
    /// append writes.
    pub fn open(root_path: impl Into<PathBuf>) -> Result<BlockStore> {
        let root_path = root_path.into();
        fs::create_dir_all(&root_path)
            .map_err(|e| ChainError::Store(format!("create {}: {e}", root_path.display())))?;

        let log_path = root_path.join(LOG_FILE_NAME);
        let log_file = open_append(&log_path)?;
        info!("opened block log at {}", log_path.display());

        Ok(BlockStore {
            root_path,
            log_path,
            log_file,
        })
    }

    /// Opens the store under the configured data directory.
    pub fn open_default() -> Result<BlockStore> {
        Self::open(GLOBAL_CONFIG.data_dir())
    }

    pub fn directory(&self) -> &Path {
        &self.root_path
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Appends one framed record and waits for the durability barrier, so
    /// the block is on stable storage before this returns.
    pub fn append_block(&mut self, block: &Block) -> Result<()> {
        let payload = block.serialize();
        let check = sha256_digest(&payload);

        let mut frame = ByteWriter::new();
        frame.write_u32(RECORD_MAGIC);
        frame.write_u64(RECORD_VERSION);
        frame.write_u16(KIND_BLOCK);
        frame.write_u64(payload.len() as u64);
        frame.write_raw(&payload);
        frame.write_raw(&check);
        let frame = frame.take();

        self.log_file
            .write_all(&frame)
            .map_err(|e| ChainError::Store(format!("write block record: {e}")))?;
        self.log_file
            .flush()
            .map_err(|e| ChainError::Store(format!("flush block log: {e}")))?;
        self.log_file
            .sync_data()
            .map_err(|e| ChainError::Store(format!("sync block log: {e}")))?;

        debug!("appended {} byte record to block log", frame.len());
        Ok(())
    }

    /// Scans the log from the beginning and returns every block whose
    /// record frames and checksums correctly. Scanning stops at the first
    /// bad frame; whatever follows it is discarded without error.
    pub fn load_all_blocks(&self) -> Result<Vec<Block>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read(&self.log_path)
            .map_err(|e| ChainError::Store(format!("read {}: {e}", self.log_path.display())))?;

        let mut blocks = Vec::new();
        let mut reader = ByteReader::new(&raw);
        while reader.remaining() > 0 {
            let payload = match read_record(&mut reader) {
                Ok(payload) => payload,
                Err(err) => {
                    warn!("discarding torn tail of block log: {err}");
                    break;
                }
            };
            match Block::deserialize(payload) {
                Ok(block) => blocks.push(block),
                Err(err) => {
                    warn!("discarding undecodable record in block log: {err}");
                    break;
                }
            }
        }

        debug!(
            "loaded {} blocks from {}",
            blocks.len(),
            self.log_path.display()
        );
        Ok(blocks)
    }

    /// Truncates the log and reopens it, discarding every stored block.
    pub fn clear(&mut self) -> Result<()> {
        let truncated = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&self.log_path)
            .map_err(|e| ChainError::Store(format!("truncate {}: {e}", self.log_path.display())))?;
        truncated
            .sync_data()
            .map_err(|e| ChainError::Store(format!("sync block log: {e}")))?;

        self.log_file = open_append(&self.log_path)?;
        info!("cleared block log at {}", self.log_path.display());
        Ok(())
    }
}

fn open_append(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| ChainError::Store(format!("open {}: {e}", path.display())))
}

/// Reads one record frame and returns its payload after verifying the
/// framing values and the trailing checksum.
fn read_record<'a>(reader: &mut ByteReader<'a>) -> Result<&'a [u8]> {
    let magic = reader.read_u32()?;
    let version = reader.read_u64()?;
    let kind = reader.read_u16()?;
    let length = reader.read_u64()?;

    if magic != RECORD_MAGIC {
        return Err(ChainError::Invalid(format!("bad record magic {magic:#010x}")));
    }
    if version != RECORD_VERSION {
        return Err(ChainError::Invalid(format!(
            "unsupported record version {version}"
        )));
    }
    if kind != KIND_BLOCK {
        return Err(ChainError::Invalid(format!("unknown record kind {kind}")));
    }

    let length = usize::try_from(length)
        .map_err(|_| ChainError::Invalid("record length overflows usize".to_string()))?;
    let payload = reader.read_raw(length)?;
    let check = reader.read_raw(32)?;

    if sha256_digest(payload) != check {
        return Err(ChainError::Invalid("record checksum mismatch".to_string()));
    }
    Ok(payload)
}
