pub mod catalog;
pub mod inventory;
pub mod progression;
pub mod selections;
pub mod validate;
