pub mod health;
pub mod offers;
