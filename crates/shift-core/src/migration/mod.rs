mod record;
mod registry;
mod script;
mod status;
mod traits;

pub use record::{successful, AppliedRecord};
pub use registry::Registry;
pub use script::{checksum, is_valid_name, Direction, MigrationFileName, MigrationScript};
pub use status::{AvailableScript, StatusReport};
pub use traits::{Migrate, MigrationLock, MigrationSource, MigrationStore, StoreTransaction};
