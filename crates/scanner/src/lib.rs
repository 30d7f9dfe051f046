pub mod false_positive;
pub mod mode;
pub mod scan;

pub use false_positive::{structural_false_positive, METADATA_TOKENS};
pub use mode::{ModeEnvelope, PrecisionMode};
pub use scan::{PrecisionScanner, ScanError, ScanFilters};
