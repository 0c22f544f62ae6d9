pub mod customers;
pub mod products;
pub mod repairs;
pub mod users;
pub mod warranties;
