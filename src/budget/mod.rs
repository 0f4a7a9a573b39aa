//! Budgets cap how much the user wants to spend in a category each month.

mod create;
mod db;
mod delete;
mod domain;
mod edit;
mod form;
mod list;
mod utilization;

pub use create::{create_budget_endpoint, get_new_budget_page};
pub use db::{
    create_budget, create_budget_table, delete_budget, get_budget, get_budgets_for_month,
    update_budget,
};
pub use delete::delete_budget_endpoint;
pub use domain::{Budget, BudgetId, BudgetStatus, BudgetUtilization};
pub use edit::{get_edit_budget_page, update_budget_endpoint};
pub(crate) use list::{budget_progress_bar, load_budget_utilization};
pub use list::get_budgets_page;
pub use utilization::calculate_utilization;
