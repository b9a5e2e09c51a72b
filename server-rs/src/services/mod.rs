pub mod checkout;
pub mod ledger;
pub mod razorpay;
