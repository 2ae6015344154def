pub mod check;
pub mod ticket_ops;
