//! The page that reports the daily totals and monthly average for a chosen day.
use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::{Date, OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description};
use time_tz::{OffsetDateTimeExt, Tz};

use crate::{
    AppState, Error,
    auth::{Session, UserID},
    endpoints,
    html::{
        FORM_ERROR_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, base,
        format_currency, submit_button,
    },
    navigation::NavBar,
    report::aggregation::{CalendarMonth, daily_totals, monthly_average},
    timezone::get_timezone,
    transaction::list_transactions,
};

const REPORT_DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// The state needed for the report page.
#[derive(Debug, Clone)]
pub struct ReportState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for ReportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The form data for choosing the day to report on.
#[derive(Debug, Deserialize)]
pub struct ReportForm {
    /// The day in `YYYY-MM-DD` format. Defaults to today.
    pub date: Option<String>,
}

/// The figures shown for a single day.
#[derive(Debug, PartialEq)]
struct Report {
    day: Date,
    daily_totals: Vec<f64>,
    month: CalendarMonth,
    monthly_average: f64,
}

fn build_report(
    user_id: UserID,
    day: Date,
    timezone: &Tz,
    connection: &Connection,
) -> Result<Report, Error> {
    let transactions = list_transactions(user_id, None, connection)?;
    let month = CalendarMonth::containing(day);

    Ok(Report {
        day,
        daily_totals: daily_totals(&transactions, day, timezone),
        month,
        monthly_average: monthly_average(&transactions, month, timezone),
    })
}

fn report_form(day: Date) -> Markup {
    html! {
        form
            hx-post=(endpoints::WRITE_REPORT_VIEW)
            hx-target="#report-results"
            hx-swap="innerHTML"
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="w-full space-y-4"
        {
            div
            {
                label for="date" class=(FORM_LABEL_STYLE) { "Day" }

                input
                    name="date"
                    id="date"
                    type="date"
                    value=(day)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            (submit_button("Write report"))
        }
    }
}

fn report_results(report: &Report) -> Markup {
    let daily_sum: f64 = report.daily_totals.iter().sum();

    html! {
        h2 class="text-xl font-semibold" { "Report for " (report.day) }

        section class="space-y-2"
        {
            h3 class="text-lg font-semibold" { "Daily totals" }

            @if report.daily_totals.is_empty() {
                p class="text-gray-500 dark:text-gray-400" { "Nothing was recorded on this day." }
            } @else {
                ol id="daily-totals" class="list-decimal list-inside"
                {
                    @for amount in &report.daily_totals {
                        li { (format_currency(*amount)) }
                    }
                }

                p id="daily-sum" { "Total: " (format_currency(daily_sum)) }
            }
        }

        section class="space-y-2"
        {
            h3 class="text-lg font-semibold"
            {
                "Average for " (report.month.month) " " (report.month.year)
            }

            p id="monthly-average" { (format_currency(report.monthly_average)) }
        }
    }
}

fn report_error(message: &str) -> Markup {
    html! {
        p class=(FORM_ERROR_STYLE) { (message) }
    }
}

/// Display the report form and the report for today.
pub async fn get_report_page(
    State(state): State<ReportState>,
    Extension(session): Extension<Session>,
) -> Result<Response, Error> {
    let timezone = get_timezone(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone.clone())
    })?;
    let today = OffsetDateTime::now_utc().to_timezone(timezone).date();

    let report = {
        let connection = state.db_connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::DatabaseLockError
        })?;

        build_report(session.user_id, today, timezone, &connection)?
    };

    let nav_bar = NavBar::new(endpoints::WRITE_REPORT_VIEW).into_html();
    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-2xl space-y-8"
            {
                h1 class="text-2xl font-bold" { "Write Report" }

                (report_form(today))

                div id="report-results" class="space-y-4"
                {
                    (report_results(&report))
                }
            }
        }
    };

    Ok(base("Write Report", &[], &content).into_response())
}

/// Render the report for the chosen day as a fragment for `#report-results`.
pub async fn post_report(
    State(state): State<ReportState>,
    Extension(session): Extension<Session>,
    Form(form): Form<ReportForm>,
) -> Response {
    let Some(timezone) = get_timezone(&state.local_timezone) else {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        return Error::InvalidTimezoneError(state.local_timezone).into_response();
    };

    let raw_date = form.date.as_deref().map(str::trim).unwrap_or_default();
    let day = if raw_date.is_empty() {
        OffsetDateTime::now_utc().to_timezone(timezone).date()
    } else {
        match Date::parse(raw_date, REPORT_DATE_FORMAT) {
            Ok(day) => day,
            Err(_) => {
                return report_error(&Error::InvalidDate(raw_date.to_owned()).to_string())
                    .into_response();
            }
        }
    };

    let report = match state.db_connection.lock() {
        Ok(connection) => build_report(session.user_id, day, timezone, &connection),
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            Err(Error::DatabaseLockError)
        }
    };

    match report {
        Ok(report) => report_results(&report).into_response(),
        Err(error) => {
            tracing::error!("could not build report for {day}: {error}");
            report_error("Could not write the report. Try again later.").into_response()
        }
    }
}
