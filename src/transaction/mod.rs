//! Transactions record money earned or spent against a wallet and a category.

mod create;
mod db;
mod delete;
mod domain;
mod edit;
mod form;
mod list;
mod query;

pub(crate) use create::new_transaction_form;
pub use create::{create_transaction_endpoint, get_new_transaction_page};
pub use db::{
    create_transaction, create_transaction_table, delete_transaction, get_transaction,
    update_transaction,
};
pub use delete::delete_transaction_endpoint;
pub use domain::{
    DATE_FORMAT, Transaction, TransactionBuilder, TransactionForm, TransactionId,
    TransactionType, validate_amount,
};
pub use edit::{get_edit_transaction_page, update_transaction_endpoint};
pub(crate) use form::TransactionFormDefaults;
pub(crate) use list::parse_date;
pub use list::get_transactions_page;
pub use query::{
    Page, TransactionFilter, TransactionTableRow, count_transactions, get_transactions,
    query_transactions,
};
