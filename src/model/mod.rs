pub mod record;
pub mod reseed;
pub mod table;

pub use record::*;
pub use reseed::*;
pub use table::*;
