//! ECharts visualisations for reports and the dashboard.
//!
//! Each chart is built with charming and serialized to JSON options that
//! are handed to ECharts in the browser.

use charming::{
    Chart,
    component::{Axis, Grid, Legend, Title},
    element::{
        AxisLabel, AxisPointer, AxisPointerType, AxisType, Color as ChartColor, JsFunction,
        Tooltip, Trigger,
    },
    series::{Bar, Pie},
};
use maud::{Markup, PreEscaped, html};

use crate::{
    html::HeadElement,
    month::format_month_label,
    report::{CategoryTotal, MonthBucket},
};

/// The ECharts bundle served from the static directory.
pub(crate) const ECHARTS_SCRIPT: &str = "/static/echarts.6.0.0.min.js";

/// A chart with its HTML container ID and ECharts configuration.
pub(crate) struct ReportChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

/// Renders the HTML containers for `charts` in a responsive grid.
pub(crate) fn charts_view(charts: &[ReportChart]) -> Markup {
    html!(
        section
            id="charts"
            class="w-full mx-auto mb-4"
        {
            div class="grid grid-cols-1 xl:grid-cols-2 gap-4"
            {
                @for chart in charts {
                    div
                        id=(chart.id)
                        class="min-h-[380px] rounded dark:bg-gray-100"
                    {}
                }
            }
        }
    )
}

/// The scripts that load ECharts and initialise `charts` once the page loads.
///
/// Charts follow the browser's dark mode setting and resize with the window.
pub(crate) fn charts_scripts(charts: &[ReportChart]) -> [HeadElement; 2] {
    let script_content = charts
        .iter()
        .map(|chart| {
            format!(
                r#"(function() {{
                    const chartDom = document.getElementById("{}");
                    const chart = echarts.init(chartDom);
                    const option = {};
                    chart.setOption(option);

                    window.addEventListener('resize', chart.resize);

                    const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
                    const updateTheme = () => {{
                        const isDarkMode = darkModeMediaQuery.matches;
                        chart.setTheme(isDarkMode ? 'dark' : 'default');
                    }}
                    darkModeMediaQuery.addEventListener('change', updateTheme);
                    updateTheme();
                }})();"#,
                chart.id, chart.options
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let wrapped_script = format!(
        "document.addEventListener('DOMContentLoaded', function() {{\n{script_content}\n}});"
    );

    [
        HeadElement::ScriptLink(ECHARTS_SCRIPT.to_owned()),
        HeadElement::ScriptSource(PreEscaped(wrapped_script)),
    ]
}

/// A doughnut chart of spending per category, coloured with the category colours.
pub(crate) fn category_pie_chart(title: &str, subtitle: &str, totals: &[CategoryTotal]) -> Chart {
    let colors = totals
        .iter()
        .map(|total| ChartColor::from(total.color.as_str()))
        .collect::<Vec<_>>();
    let data = totals
        .iter()
        .map(|total| (total.total, total.name.clone()))
        .collect::<Vec<_>>();

    Chart::new()
        .title(Title::new().text(title).subtext(subtitle))
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Item)
                .value_formatter(currency_formatter()),
        )
        .legend(Legend::new().bottom("1%"))
        .color(colors)
        .series(
            Pie::new()
                .name(title)
                .radius(vec!["40%", "70%"])
                .data(data),
        )
}

/// A grouped bar chart of income against expenses for each month.
pub(crate) fn monthly_trend_chart(buckets: &[MonthBucket]) -> Chart {
    let labels = buckets
        .iter()
        .map(|bucket| format_month_label(bucket.month))
        .collect::<Vec<_>>();
    let income = buckets.iter().map(|bucket| bucket.income).collect::<Vec<_>>();
    let expenses = buckets
        .iter()
        .map(|bucket| bucket.expenses)
        .collect::<Vec<_>>();

    Chart::new()
        .title(Title::new().text("Income vs. expenses").subtext("Per month"))
        .tooltip(currency_tooltip())
        .legend(Legend::new().right("4%"))
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .contain_label(true),
        )
        .color(vec![ChartColor::from("#22c55e"), ChartColor::from("#ef4444")])
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
        )
        .series(Bar::new().name("Income").data(income))
        .series(Bar::new().name("Expenses").data(expenses))
}

#[inline]
fn currency_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        "const currencyFormatter = new Intl.NumberFormat('en-US', {
              style: 'currency',
              currency: 'USD'
            });
            return (number) ? currencyFormatter.format(number) : \"-\";",
    )
}

/// Creates a tooltip configuration for currency values
fn currency_tooltip() -> Tooltip {
    Tooltip::new()
        .trigger(Trigger::Axis)
        .value_formatter(currency_formatter())
        .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow))
}
