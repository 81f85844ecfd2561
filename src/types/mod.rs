pub mod conversion;
pub mod egg;
pub mod timezone;
pub use conversion::*;
pub use egg::*;
pub use timezone::*;
