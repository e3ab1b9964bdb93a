mod collection;
mod record;

pub use collection::{Collection, SETTINGS_KEY};
pub use record::{KeyedRecord, Record, RecordError, ID_FIELD};
