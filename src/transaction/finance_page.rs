//! The page for entering financial figures and viewing the transaction history.
use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::{OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description};
use time_tz::{OffsetDateTimeExt, Tz};

use crate::{
    AppState, Error,
    auth::Session,
    endpoints,
    html::{
        FORM_ERROR_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, dollar_input_styles,
        format_currency, submit_button,
    },
    internal_server_error::get_internal_server_error_redirect,
    navigation::NavBar,
    report::{NetProfitInputs, net_profit},
    timezone::get_timezone,
    transaction::{
        DEFAULT_TRANSACTION_TYPE, NewTransaction, Transaction, list_transactions,
        record_transaction,
        form::{parse_amount, parse_transaction_date},
    },
};

const NET_PROFIT_OUT_OF_RANGE_ERROR_MSG: &str =
    "The net profit of these figures is too large to record.";

const TABLE_DATE_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");

/// The state needed for the finance page.
#[derive(Debug, Clone)]
pub struct FinanceState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for FinanceState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The raw figures submitted by the finance form.
///
/// Fields are kept as strings so that bad input can be shown back to the user.
#[derive(Debug, Default, Deserialize)]
pub struct FinanceForm {
    pub income: Option<String>,
    pub interest: Option<String>,
    pub loss: Option<String>,
    pub loaner: Option<String>,
    pub transaction_type: Option<String>,
    pub date: Option<String>,
}

/// The query parameters for filtering the history table.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub transaction_type: Option<String>,
}

fn amount_input(name: &str, label: &str, value: Option<&str>) -> Markup {
    html! {
        div
        {
            label for=(name) class=(FORM_LABEL_STYLE) { (label) }

            div class="input-wrapper w-full"
            {
                input
                    name=(name)
                    id=(name)
                    type="number"
                    step="0.01"
                    placeholder="0.00"
                    value=[value]
                    class=(FORM_TEXT_INPUT_STYLE);
            }
        }
    }
}

fn finance_form(form: &FinanceForm, error_message: Option<&str>) -> Markup {
    html! {
        form
            hx-post=(endpoints::MANAGE_FINANCE_VIEW)
            hx-swap="outerHTML"
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="w-full space-y-4 md:space-y-6"
        {
            (amount_input("income", "Income", form.income.as_deref()))
            (amount_input("interest", "Interest", form.interest.as_deref()))
            (amount_input("loss", "Loss", form.loss.as_deref()))
            (amount_input("loaner", "Loaned out", form.loaner.as_deref()))

            div
            {
                label for="transaction_type" class=(FORM_LABEL_STYLE) { "Type" }

                input
                    name="transaction_type"
                    id="transaction_type"
                    type="text"
                    placeholder=(DEFAULT_TRANSACTION_TYPE)
                    value=[form.transaction_type.as_deref()]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="date" class=(FORM_LABEL_STYLE) { "Date" }

                input
                    name="date"
                    id="date"
                    type="datetime-local"
                    value=[form.date.as_deref()]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            @if let Some(error_message) = error_message {
                p class=(FORM_ERROR_STYLE) { (error_message) }
            }

            (submit_button("Record net profit"))
        }
    }
}

fn format_transaction_date(date: OffsetDateTime, timezone: &Tz) -> String {
    let date = date.to_timezone(timezone);

    date.format(TABLE_DATE_FORMAT)
        .unwrap_or_else(|_| date.to_string())
}

fn history_table(
    transactions: &[Transaction],
    transaction_type: Option<&str>,
    timezone: &Tz,
) -> Markup {
    let total: f64 = transactions.iter().map(|transaction| transaction.amount).sum();

    html! {
        section class="w-full space-y-4"
        {
            h2 class="text-xl font-semibold" { "History" }

            form
                method="get"
                action=(endpoints::MANAGE_FINANCE_VIEW)
                class="flex gap-2 items-end"
            {
                div class="grow"
                {
                    label for="filter_transaction_type" class=(FORM_LABEL_STYLE) { "Filter by type" }

                    input
                        name="transaction_type"
                        id="filter_transaction_type"
                        type="text"
                        value=[transaction_type]
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                button type="submit" class="px-4 py-2 bg-blue-500 text-white rounded" { "Filter" }
            }

            @if transactions.is_empty() {
                p class="text-gray-500 dark:text-gray-400" { "No transactions recorded yet." }
            } @else {
                div class="overflow-x-auto rounded shadow"
                {
                    table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Type" }
                                th scope="col" class={ (TABLE_CELL_STYLE) " text-right" } { "Amount" }
                            }
                        }

                        tbody
                        {
                            @for transaction in transactions {
                                tr class=(TABLE_ROW_STYLE) data-transaction-id=(transaction.id)
                                {
                                    td class=(TABLE_CELL_STYLE)
                                    {
                                        (format_transaction_date(transaction.transaction_date, timezone))
                                    }
                                    td class=(TABLE_CELL_STYLE) { (transaction.transaction_type) }
                                    td class={ (TABLE_CELL_STYLE) " text-right" }
                                    {
                                        (format_currency(transaction.amount))
                                    }
                                }
                            }
                        }

                        tfoot
                        {
                            tr class="font-semibold text-gray-900 dark:text-white"
                            {
                                th scope="row" colspan="2" class=(TABLE_CELL_STYLE) { "Total" }
                                td class={ (TABLE_CELL_STYLE) " text-right" } { (format_currency(total)) }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Display the finance form and the user's transaction history.
///
/// The history can be filtered with the `transaction_type` query parameter.
pub async fn get_finance_page(
    State(state): State<FinanceState>,
    Extension(session): Extension<Session>,
    Query(query): Query<HistoryQuery>,
) -> Result<Response, Error> {
    let timezone = get_timezone(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone.clone())
    })?;

    let transaction_type = query
        .transaction_type
        .as_deref()
        .map(str::trim)
        .filter(|transaction_type| !transaction_type.is_empty());

    let transactions = {
        let connection = state.db_connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::DatabaseLockError
        })?;

        list_transactions(session.user_id, transaction_type, &connection)?
    };

    let nav_bar = NavBar::new(endpoints::MANAGE_FINANCE_VIEW).into_html();
    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-2xl space-y-8"
            {
                h1 class="text-2xl font-bold" { "Manage Finance" }

                (finance_form(&FinanceForm::default(), None))

                (history_table(&transactions, transaction_type, timezone))
            }
        }
    };

    Ok(base("Manage Finance", &[dollar_input_styles()], &content).into_response())
}

/// Record the net profit of the submitted figures as a new transaction.
///
/// Bad figures re-render the form with an error message and nothing is recorded.
pub async fn post_finance(
    State(state): State<FinanceState>,
    Extension(session): Extension<Session>,
    Form(form): Form<FinanceForm>,
) -> Response {
    let Some(timezone) = get_timezone(&state.local_timezone) else {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        return Error::InvalidTimezoneError(state.local_timezone).into_response();
    };

    let parsed = parse_finance_form(&form, timezone);
    let (inputs, transaction_date) = match parsed {
        Ok(parsed) => parsed,
        Err(error) => return finance_form(&form, Some(&error.to_string())).into_response(),
    };

    let amount = net_profit(inputs);
    if !amount.is_finite() {
        return finance_form(&form, Some(NET_PROFIT_OUT_OF_RANGE_ERROR_MSG)).into_response();
    }

    let transaction = NewTransaction::new(session.user_id, amount)
        .transaction_type(form.transaction_type.as_deref().unwrap_or_default())
        .transaction_date(transaction_date);

    let result = match state.db_connection.lock() {
        Ok(connection) => record_transaction(transaction, &connection),
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            Err(Error::DatabaseLockError)
        }
    };

    match result {
        Ok(_) => (
            HxRedirect(endpoints::MANAGE_FINANCE_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("could not record transaction: {error}");
            get_internal_server_error_redirect()
        }
    }
}

fn parse_finance_form(
    form: &FinanceForm,
    timezone: &Tz,
) -> Result<(NetProfitInputs, Option<OffsetDateTime>), Error> {
    let inputs = NetProfitInputs {
        income: parse_amount("Income", form.income.as_deref())?,
        interest: parse_amount("Interest", form.interest.as_deref())?,
        loss: parse_amount("Loss", form.loss.as_deref())?,
        loaner: parse_amount("Loaned out", form.loaner.as_deref())?,
    };
    let transaction_date = parse_transaction_date(form.date.as_deref(), timezone)?;

    Ok((inputs, transaction_date))
}
