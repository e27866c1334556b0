//! Maps a flat struct onto one spreadsheet row, a cell per field in
//! declaration order.

pub mod de;
pub mod error;
pub mod ser;

pub use de::RowDeserializer;
pub use error::Error;
pub use ser::RowSerializer;
