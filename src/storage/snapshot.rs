//! Binary snapshots of the relation graph state

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::graph::StoreSnapshot;

/// Bumped whenever the layout of `StoreSnapshot` changes
pub const FORMAT_VERSION: u32 = 1;

/// Write the format version followed by the snapshot
pub fn write_snapshot<W: Write>(mut writer: W, snapshot: &StoreSnapshot) -> Result<()> {
    bincode::serialize_into(&mut writer, &FORMAT_VERSION)?;
    bincode::serialize_into(&mut writer, snapshot)?;
    writer
        .flush()
        .map_err(|e| Error::io("flushing snapshot", e))
}

pub fn read_snapshot<R: Read>(mut reader: R) -> Result<StoreSnapshot> {
    let version: u32 = bincode::deserialize_from(&mut reader)?;
    if version != FORMAT_VERSION {
        return Err(Error::io(
            "reading snapshot",
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unsupported snapshot version {}", version),
            ),
        ));
    }
    Ok(bincode::deserialize_from(reader)?)
}

pub fn save_to_file(path: &Path, snapshot: &StoreSnapshot) -> Result<()> {
    let file = File::create(path).map_err(|e| Error::io(format!("creating {}", path.display()), e))?;
    write_snapshot(BufWriter::new(file), snapshot)?;
    log::info!("Saved state snapshot to {}", path.display());
    Ok(())
}

pub fn load_from_file(path: &Path) -> Result<StoreSnapshot> {
    let file = File::open(path).map_err(|e| Error::io(format!("opening {}", path.display()), e))?;
    let snapshot = read_snapshot(BufReader::new(file))?;
    log::info!("Loaded state snapshot from {}", path.display());
    Ok(snapshot)
}
