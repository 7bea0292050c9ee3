//! The navigation bar shown at the top of every page that requires a session.

use maud::{Markup, html};

use crate::endpoints;

/// The pages listed in the navigation bar, in display order.
const PAGES: [(&str, &str); 5] = [
    (endpoints::DASHBOARD_VIEW, "Dashboard"),
    (endpoints::MANAGE_FINANCE_VIEW, "Finance"),
    (endpoints::WRITE_REPORT_VIEW, "Report"),
    (endpoints::MANAGE_ACCOUNT_VIEW, "Account"),
    (endpoints::MAINTENANCE_VIEW, "Maintenance"),
];

const LINK_STYLE: &str = "block whitespace-nowrap rounded-lg px-3 py-2 text-sm font-medium \
    text-gray-700 hover:bg-gray-100 hover:text-blue-700 \
    dark:text-gray-200 dark:hover:bg-gray-800 dark:hover:text-blue-300";

const CURRENT_LINK_STYLE: &str = "block whitespace-nowrap rounded-lg px-3 py-2 text-sm \
    font-semibold bg-blue-50 text-blue-700 dark:bg-blue-900/30 dark:text-blue-200";

/// A link in the navigation bar.
///
/// Only one link should be current at any one time.
struct Link<'a> {
    url: &'a str,
    title: &'a str,
    is_current: bool,
}

impl Link<'_> {
    fn into_html(self) -> Markup {
        let style = if self.is_current {
            CURRENT_LINK_STYLE
        } else {
            LINK_STYLE
        };

        html! {
            a
                href=(self.url)
                class=(style)
                aria-current=[self.is_current.then_some("page")]
            {
                (self.title)
            }
        }
    }
}

pub struct NavBar<'a> {
    links: Vec<Link<'a>>,
}

impl NavBar<'_> {
    /// Get the navigation bar.
    ///
    /// If a link matches `active_endpoint`, then that link will be
    /// marked as current and displayed differently in the HTML.
    pub fn new(active_endpoint: &str) -> NavBar<'_> {
        let links = PAGES
            .into_iter()
            .map(|(url, title)| Link {
                url,
                title,
                is_current: active_endpoint == url,
            })
            .collect();

        NavBar { links }
    }

    pub fn into_html(self) -> Markup {
        html! {
            nav class="bg-white border-b border-gray-200 dark:bg-gray-900 dark:border-gray-700"
            {
                div
                    class="max-w-screen-xl mx-auto flex flex-wrap items-center
                    justify-between gap-4 p-4"
                {
                    a
                        href=(endpoints::DASHBOARD_VIEW)
                        class="text-2xl font-semibold whitespace-nowrap dark:text-white"
                    {
                        "Fintrack"
                    }

                    a href=(endpoints::LOG_OUT) class={ (LINK_STYLE) " lg:order-last" } { "Log out" }

                    ul
                        class="w-full lg:w-auto flex gap-1 overflow-x-auto"
                        aria-label="Primary"
                    {
                        @for link in self.links {
                            li { (link.into_html()) }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod nav_bar_tests {
    use scraper::{Html, Selector};

    use crate::{endpoints, navigation::NavBar};

    #[test]
    fn marks_only_active_endpoint_as_current() {
        let cases = [
            (endpoints::DASHBOARD_VIEW, true),
            (endpoints::MANAGE_FINANCE_VIEW, true),
            (endpoints::WRITE_REPORT_VIEW, true),
            (endpoints::MANAGE_ACCOUNT_VIEW, true),
            (endpoints::MAINTENANCE_VIEW, true),
            (endpoints::ROOT, false),
            (endpoints::INTERNAL_ERROR_VIEW, false),
            (endpoints::LOG_IN_VIEW, false),
            (endpoints::LOG_OUT, false),
            (endpoints::REGISTER_VIEW, false),
        ];

        for (endpoint, should_be_current) in cases {
            let nav_bar = NavBar::new(endpoint);

            for link in nav_bar.links {
                assert_eq!(
                    link.is_current,
                    should_be_current && link.url == endpoint,
                    "link {} with active endpoint {endpoint}",
                    link.url
                );
            }
        }
    }

    #[test]
    fn renders_each_page_once_and_log_out() {
        let html = Html::parse_fragment(&NavBar::new(endpoints::WRITE_REPORT_VIEW).into_html().0);
        let link_selector = Selector::parse("a").unwrap();

        let hrefs = html
            .select(&link_selector)
            .filter_map(|link| link.value().attr("href"))
            .collect::<Vec<_>>();

        for endpoint in [
            endpoints::MANAGE_FINANCE_VIEW,
            endpoints::WRITE_REPORT_VIEW,
            endpoints::MANAGE_ACCOUNT_VIEW,
            endpoints::MAINTENANCE_VIEW,
            endpoints::LOG_OUT,
        ] {
            let count = hrefs.iter().filter(|href| **href == endpoint).count();
            assert_eq!(count, 1, "want one link to {endpoint}, got {hrefs:?}");
        }

        let current_selector = Selector::parse("a[aria-current=page]").unwrap();
        let current = html.select(&current_selector).collect::<Vec<_>>();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].value().attr("href"), Some(endpoints::WRITE_REPORT_VIEW));
    }
}
