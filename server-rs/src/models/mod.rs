pub mod booking;
pub mod catalog;
pub mod coins;
pub mod payment;
pub mod user;

pub use booking::*;
pub use catalog::*;
pub use coins::*;
pub use payment::*;
pub use user::*;
