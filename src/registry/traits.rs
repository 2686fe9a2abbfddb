//! Registry trait definition.

use crate::domain::ProcessRecord;
use crate::error::Result;

/// Storage for the one active process record.
pub trait Registry {
    /// Load the record. A record whose process is not alive is deleted and `None` returned.
    fn read(&self) -> Result<Option<ProcessRecord>>;

    /// Overwrite the record.
    fn write(&self, record: &ProcessRecord) -> Result<()>;

    /// Delete the record. Not an error if there is none.
    fn clear(&self) -> Result<()>;
}
