//! Wallets hold the user's money, e.g. a bank account or an e-wallet.

mod create;
mod db;
mod delete;
mod domain;
mod edit;
mod form;
mod list;

pub use create::{create_wallet_endpoint, get_new_wallet_page};
pub(crate) use db::apply_wallet_delta;
pub use db::{
    create_wallet, create_wallet_table, delete_wallet, get_total_balance, get_wallet,
    get_wallets, update_wallet,
};
pub use delete::delete_wallet_endpoint;
pub use domain::{Wallet, WalletId, WalletKind, WalletName};
pub use edit::{get_edit_wallet_page, update_wallet_endpoint};
pub use list::get_wallets_page;
