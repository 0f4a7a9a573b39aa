//! The dashboard gives an overview of the current month.

mod cards;
mod handlers;
mod tables;

pub use handlers::get_dashboard_page;
