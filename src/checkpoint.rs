//! Checkpoint system for saving and loading simulation state.

use crate::agents::AgentArena;
use crate::atmosphere::GasPool;
use crate::config::Config;
use crate::population::{RespawnQueue, Scheduler};
use crate::stats::Stats;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

const MAGIC: &[u8; 4] = b"TRRM";

/// Complete simulation state for checkpointing
#[derive(Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Version for compatibility checking
    pub version: u32,
    /// Simulation step
    pub time: u64,
    /// Simulated seconds since start
    pub elapsed: f64,
    /// Configuration
    pub config: Config,
    /// Clock position
    pub day: u32,
    pub time01: f64,
    /// Atmosphere moles
    pub gas: GasPool,
    /// All agents, with their handles
    pub agents: AgentArena,
    pub respawn: RespawnQueue,
    pub scheduler: Scheduler,
    /// Current statistics
    pub stats: Stats,
    /// Random seed (for reproducibility)
    pub random_seed: u64,
}

impl Checkpoint {
    /// Current checkpoint version
    pub const VERSION: u32 = 3;

    /// Create a new checkpoint
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        time: u64,
        elapsed: f64,
        config: Config,
        day: u32,
        time01: f64,
        gas: GasPool,
        agents: AgentArena,
        respawn: RespawnQueue,
        scheduler: Scheduler,
        stats: Stats,
        random_seed: u64,
    ) -> Self {
        Self {
            version: Self::VERSION,
            time,
            elapsed,
            config,
            day,
            time01,
            gas,
            agents,
            respawn,
            scheduler,
            stats,
            random_seed,
        }
    }

    /// Save checkpoint to binary file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), CheckpointError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writer.write_all(MAGIC)?;
        let encoded = bincode::serialize(self)?;
        writer.write_all(&encoded)?;
        writer.flush()?;

        Ok(())
    }

    /// Load checkpoint from binary file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CheckpointError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(CheckpointError::InvalidFormat("Invalid magic bytes".to_string()));
        }

        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer)?;
        let checkpoint: Checkpoint = bincode::deserialize(&buffer)?;

        if checkpoint.version != Self::VERSION {
            return Err(CheckpointError::VersionMismatch {
                expected: Self::VERSION,
                found: checkpoint.version,
            });
        }

        Ok(checkpoint)
    }

    /// Get approximate size in bytes
    pub fn size_bytes(&self) -> usize {
        bincode::serialized_size(self).unwrap_or(0) as usize
    }
}

/// Errors that can occur during checkpoint operations
#[derive(Debug)]
pub enum CheckpointError {
    Io(std::io::Error),
    Serialization(bincode::Error),
    InvalidFormat(String),
    VersionMismatch { expected: u32, found: u32 },
}

impl std::fmt::Display for CheckpointError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {}", e),
            Self::Serialization(e) => write!(f, "Serialization error: {}", e),
            Self::InvalidFormat(msg) => write!(f, "Invalid format: {}", msg),
            Self::VersionMismatch { expected, found } => {
                write!(f, "Version mismatch: expected {}, found {}", expected, found)
            }
        }
    }
}

impl std::error::Error for CheckpointError {}

impl From<std::io::Error> for CheckpointError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<bincode::Error> for CheckpointError {
    fn from(e: bincode::Error) -> Self {
        Self::Serialization(e)
    }
}

/// Checkpoint manager for automatic saving
pub struct CheckpointManager {
    /// Base directory for checkpoints
    pub base_dir: String,
    /// Steps between checkpoints
    pub interval: u64,
    /// Maximum checkpoints to keep
    pub max_checkpoints: usize,
    last_checkpoint: u64,
}

impl CheckpointManager {
    pub fn new(base_dir: String, interval: u64, max_checkpoints: usize) -> Self {
        if let Err(e) = std::fs::create_dir_all(&base_dir) {
            log::warn!("Could not create checkpoint directory {}: {}", base_dir, e);
        }

        Self {
            base_dir,
            interval: interval.max(1),
            max_checkpoints: max_checkpoints.max(1),
            last_checkpoint: 0,
        }
    }

    /// Check if a checkpoint should be saved
    pub fn should_save(&self, time: u64) -> bool {
        time > 0 && time % self.interval == 0 && time != self.last_checkpoint
    }

    pub fn checkpoint_path(&self, time: u64) -> String {
        format!("{}/checkpoint_{:08}.bin", self.base_dir, time)
    }

    /// Save checkpoint and prune old ones
    pub fn save(&mut self, checkpoint: &Checkpoint) -> Result<String, CheckpointError> {
        let path = self.checkpoint_path(checkpoint.time);
        checkpoint.save(&path)?;
        self.last_checkpoint = checkpoint.time;
        log::debug!("Checkpoint written to {}", path);

        self.cleanup()?;

        Ok(path)
    }

    fn numbered_checkpoints(&self) -> std::io::Result<Vec<std::fs::DirEntry>> {
        Ok(std::fs::read_dir(&self.base_dir)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                name.starts_with("checkpoint_") && name != "checkpoint_final.bin"
            })
            .collect())
    }

    /// Remove old checkpoints beyond max limit
    fn cleanup(&self) -> Result<(), CheckpointError> {
        let mut checkpoints = self.numbered_checkpoints()?;

        if checkpoints.len() > self.max_checkpoints {
            // Zero-padded names sort by time
            checkpoints.sort_by_key(|e| e.file_name());

            let to_remove = checkpoints.len() - self.max_checkpoints;
            for entry in checkpoints.into_iter().take(to_remove) {
                std::fs::remove_file(entry.path())?;
            }
        }

        Ok(())
    }

    /// Find latest checkpoint in directory
    pub fn find_latest(&self) -> Option<String> {
        self.numbered_checkpoints()
            .ok()?
            .into_iter()
            .max_by_key(|e| e.file_name())
            .map(|e| e.path().to_string_lossy().to_string())
    }
}
