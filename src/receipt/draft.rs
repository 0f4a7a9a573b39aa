use time::Date;

use crate::{
    category::Category, receipt::ReceiptDraft, transaction::TransactionFormDefaults,
    transaction::TransactionType,
};

impl ReceiptDraft {
    /// Pre-fill an expense form from the draft.
    ///
    /// A future or missing date becomes `today`. The category is matched by
    /// name, ignoring case, and left unselected if nothing matches.
    pub(crate) fn to_form_defaults<'a>(
        &'a self,
        categories: &[Category],
        today: Date,
    ) -> TransactionFormDefaults<'a> {
        let date = self.date.filter(|date| *date <= today).unwrap_or(today);
        let amount = self
            .total
            .map(f64::abs)
            .filter(|amount| *amount > 0.0);
        let category_id = self.category.as_deref().and_then(|wanted| {
            let wanted = wanted.trim().to_lowercase();

            categories
                .iter()
                .find(|category| category.name.as_ref().to_lowercase() == wanted)
                .map(|category| category.id)
        });

        TransactionFormDefaults {
            transaction_type: TransactionType::Expense,
            amount,
            date,
            description: self.merchant.as_deref(),
            wallet_id: None,
            category_id,
            max_date: today,
            autofocus_amount: amount.is_none(),
        }
    }
}
