mod bank;
mod coordinates;
mod record;

pub use bank::BankId;
pub use coordinates::Coordinates;
pub use record::BranchRecord;
pub(crate) use record::coordinates_from;
