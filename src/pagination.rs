//! Common functionality for paging through long lists such as transactions.

use maud::{Markup, html};

/// The config for pagination
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The maximum number of rows to display per page when not specified in a request.
    pub default_page_size: u64,
    /// The maximum number of pages to show in the pagination indicator.
    pub max_pages: u64,
    /// The largest page size a request may ask for.
    pub max_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 20,
            max_pages: 5,
            max_page_size: 100,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum PaginationIndicator {
    Page(u64),
    CurrPage(u64),
    Ellipsis,
    NextButton(u64),
    BackButton(u64),
}

/// The number of pages needed to show `row_count` rows, `page_size` at a time.
///
/// There is always at least one page, even when there are no rows.
pub fn page_count(row_count: u64, page_size: u64) -> u64 {
    if page_size == 0 {
        return 1;
    }

    row_count.div_ceil(page_size).max(1)
}

/// Build the list of page links to show for `curr_page` out of `page_count` pages.
///
/// At most `max_pages` consecutive page numbers are shown, centred on the
/// current page where possible. The first and last pages are always
/// reachable, with an ellipsis standing in for any skipped pages.
pub fn create_pagination_indicators(
    curr_page: u64,
    page_count: u64,
    max_pages: u64,
) -> Vec<PaginationIndicator> {
    let page_count = page_count.max(1);
    let curr_page = curr_page.clamp(1, page_count);
    let half = max_pages / 2;

    let (window_start, window_end) = if page_count <= max_pages {
        (1, page_count)
    } else if curr_page <= half {
        (1, max_pages)
    } else if curr_page > page_count - half {
        (page_count - max_pages + 1, page_count)
    } else {
        (curr_page - half, curr_page + half)
    };

    let mut indicators = Vec::new();

    if curr_page > 1 {
        indicators.push(PaginationIndicator::BackButton(curr_page - 1));
    }

    if page_count > max_pages && curr_page > half + 1 {
        indicators.push(PaginationIndicator::Page(1));
        indicators.push(PaginationIndicator::Ellipsis);
    }

    indicators.extend((window_start..=window_end).map(|page| {
        if page == curr_page {
            PaginationIndicator::CurrPage(page)
        } else {
            PaginationIndicator::Page(page)
        }
    }));

    if page_count > max_pages && curr_page < page_count - half {
        indicators.push(PaginationIndicator::Ellipsis);
        indicators.push(PaginationIndicator::Page(page_count));
    }

    if curr_page < page_count {
        indicators.push(PaginationIndicator::NextButton(curr_page + 1));
    }

    indicators
}

/// Render pagination links.
///
/// `page_url` maps a page number to the URL for that page so that callers can
/// keep their other query parameters (e.g. filters).
pub fn pagination_view(
    indicators: &[PaginationIndicator],
    page_url: impl Fn(u64) -> String,
) -> Markup {
    let link_style = "block px-3 py-2 leading-tight text-gray-500 bg-white \
        border border-gray-300 hover:bg-gray-100 hover:text-gray-700 \
        dark:bg-gray-800 dark:border-gray-700 dark:text-gray-400 \
        dark:hover:bg-gray-700 dark:hover:text-white";
    let current_style = "block px-3 py-2 leading-tight text-blue-600 \
        border border-blue-300 bg-blue-50 dark:border-gray-700 \
        dark:bg-gray-700 dark:text-white";

    html! {
        nav class="pagination flex justify-center my-4" aria-label="Pagination"
        {
            ul class="pagination inline-flex -space-x-px text-sm"
            {
                @for indicator in indicators {
                    li {
                        @match indicator {
                            PaginationIndicator::Page(page) => {
                                a href=(page_url(*page)) class=(link_style) { (page) }
                            }
                            PaginationIndicator::CurrPage(page) => {
                                span aria-current="page" class=(current_style) { (page) }
                            }
                            PaginationIndicator::Ellipsis => {
                                span class=(link_style) { "..." }
                            }
                            PaginationIndicator::BackButton(page) => {
                                a href=(page_url(*page)) class=(link_style) { "Back" }
                            }
                            PaginationIndicator::NextButton(page) => {
                                a href=(page_url(*page)) class=(link_style) { "Next" }
                            }
                        }
                    }
                }
            }
        }
    }
}
