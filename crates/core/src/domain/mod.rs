pub mod booking;
pub mod customer;
pub mod quotation;
pub mod stock;
