pub(crate) mod blank_date;
pub mod enums;
pub mod profile;
pub mod record;

pub use enums::*;
pub use profile::*;
pub use record::*;
