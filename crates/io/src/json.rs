// JSON export

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use kesher_recon::ContactSet;

use crate::error::IoError;

/// Export the contact set as a JSON array of arrays.
/// The first array is the header row; every cell is a string.
pub fn export(contacts: &ContactSet, labels: [&str; 5], path: &Path) -> Result<(), IoError> {
    let file = File::create(path).map_err(|e| IoError::Export(e.to_string()))?;
    let writer = BufWriter::new(file);

    let rows = contacts.to_table(labels);
    serde_json::to_writer_pretty(writer, &rows).map_err(|e| IoError::Export(e.to_string()))?;

    Ok(())
}
