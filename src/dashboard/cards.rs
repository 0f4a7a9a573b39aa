//! Cards for the month's totals and the budget overview.

use maud::{Markup, html};

use crate::{
    budget::{BudgetUtilization, budget_progress_bar},
    endpoints,
    html::{CARD_STYLE, LINK_STYLE, amount_class, color_badge, format_currency},
    report::Summary,
};

/// How many budgets the overview shows.
pub(super) const BUDGET_OVERVIEW_SIZE: usize = 3;

fn stat_card(label: &str, id: &str, amount: f64, class: &str) -> Markup {
    html! {
        div class=(CARD_STYLE) id=(id)
        {
            p class="text-sm text-gray-500 dark:text-gray-400" { (label) }
            p class={ "text-2xl font-bold tabular-nums " (class) } { (format_currency(amount)) }
        }
    }
}

/// The total balance and this month's income, expenses and net.
pub(super) fn totals_view(total_balance: f64, month_label: &str, summary: &Summary) -> Markup {
    html! {
        section id="dashboard-totals" class="grid gap-4 grid-cols-2 lg:grid-cols-4"
        {
            (stat_card("Total balance", "total-balance", total_balance, amount_class(total_balance)))
            (stat_card(&format!("Income, {month_label}"), "month-income", summary.income, amount_class(summary.income)))
            (stat_card(&format!("Expenses, {month_label}"), "month-expenses", summary.expenses, amount_class(-summary.expenses)))
            (stat_card(&format!("Net, {month_label}"), "month-net", summary.net, amount_class(summary.net)))
        }
    }
}

/// Pick the budgets with the highest utilization, most used first.
pub(super) fn top_budgets(mut utilization: Vec<BudgetUtilization>) -> Vec<BudgetUtilization> {
    utilization.sort_by(|a, b| b.percent_used.total_cmp(&a.percent_used));
    utilization.truncate(BUDGET_OVERVIEW_SIZE);
    utilization
}

/// The most used budgets for the month with a progress bar each.
pub(super) fn budget_overview_view(budgets: &[BudgetUtilization], budgets_url: &str) -> Markup {
    html! {
        section id="budget-overview" class=(CARD_STYLE)
        {
            div class="flex justify-between items-baseline mb-4"
            {
                h2 class="text-lg font-semibold" { "Budgets" }
                a href=(budgets_url) class=(LINK_STYLE) { "View all" }
            }

            @if budgets.is_empty() {
                p class="text-sm text-gray-500 dark:text-gray-400"
                {
                    "No budgets this month. "
                    a href=(endpoints::NEW_BUDGET_VIEW) class=(LINK_STYLE) { "Create a budget" }
                    "."
                }
            } @else {
                ul class="space-y-4"
                {
                    @for item in budgets {
                        li data-budget-overview-item
                        {
                            div class="flex justify-between items-center mb-1 text-sm"
                            {
                                (color_badge(item.category.name.as_ref(), &item.category.color))
                                span class="tabular-nums"
                                {
                                    (format_currency(item.spent)) " / " (format_currency(item.budget.limit))
                                }
                            }
                            (budget_progress_bar(item))
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::{
        auth::UserID,
        budget::{Budget, BudgetStatus, BudgetUtilization},
        category::{Category, CategoryName},
        color::Color,
    };

    use super::top_budgets;

    fn utilization(id: i64, percent_used: f64) -> BudgetUtilization {
        BudgetUtilization {
            budget: Budget {
                id,
                user_id: UserID::new(1),
                category_id: id,
                month: date!(2025 - 03 - 01),
                limit: 100.0,
            },
            category: Category {
                id,
                user_id: UserID::new(1),
                name: CategoryName::new_unchecked("Food"),
                color: Color::default(),
            },
            spent: percent_used,
            remaining: 100.0 - percent_used,
            percent_used,
            status: BudgetStatus::classify(percent_used, 100.0),
        }
    }

    #[test]
    fn top_budgets_keeps_three_most_used() {
        let budgets = vec![
            utilization(1, 10.0),
            utilization(2, 120.0),
            utilization(3, 50.0),
            utilization(4, 85.0),
        ];

        let got = top_budgets(budgets)
            .iter()
            .map(|item| item.budget.id)
            .collect::<Vec<_>>();

        assert_eq!(got, [2, 4, 3]);
    }
}
