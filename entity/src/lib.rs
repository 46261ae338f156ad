pub mod boards;
pub mod priority;
pub mod status;
pub mod tasks;
pub mod users;

/// A type alias that represents any Entity's internal id field data type.
/// Aliased so that it's easy to change the underlying type if necessary.
pub type Id = i64;
