pub mod record;
pub mod sheet;

pub use record::*;
pub use sheet::*;
