//! Persisting network parameters.
//!
//! A checkpoint is a [`StateDict`]: parameter names (`fc1.weight`, ...) mapped
//! to shaped tensors. The binary format is bincode; a JSON export exists for
//! inspection.

use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use log::info;

use crate::error::Result;
use crate::network::StateDict;

/// Write a state dict to `path` in bincode format.
pub fn save<P: AsRef<Path>>(path: P, state_dict: &StateDict) -> Result<()> {
    let path = path.as_ref();
    let serialized = bincode::serialize(state_dict)?;
    let mut file = BufWriter::new(fs::File::create(path)?);
    file.write_all(&serialized)?;
    file.flush()?;
    info!("Saved {} tensors to {}", state_dict.len(), path.display());
    Ok(())
}

/// Read a state dict written by [`save`].
pub fn load<P: AsRef<Path>>(path: P) -> Result<StateDict> {
    let file = BufReader::new(fs::File::open(path)?);
    let state_dict = bincode::deserialize_from(file)?;
    Ok(state_dict)
}

/// Write a state dict as pretty-printed JSON.
pub fn save_json<P: AsRef<Path>>(path: P, state_dict: &StateDict) -> Result<()> {
    let json = serde_json::to_string_pretty(state_dict)?;
    fs::write(path, json)?;
    Ok(())
}

/// Read a state dict written by [`save_json`].
pub fn load_json<P: AsRef<Path>>(path: P) -> Result<StateDict> {
    let file = BufReader::new(fs::File::open(path)?);
    let state_dict = serde_json::from_reader(file)?;
    Ok(state_dict)
}
