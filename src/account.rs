//! The page showing the logged in user's account details and a summary of their ledger.
use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::html;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::{Session, UserID},
    endpoints,
    html::{PAGE_CONTAINER_STYLE, base, format_currency, link},
    navigation::NavBar,
    transaction::{count_transactions, list_transactions},
};

/// The state needed for the account page.
#[derive(Debug, Clone)]
pub struct AccountState {
    /// The database connection for reading the ledger.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The number of transactions a user has recorded and their sum.
#[derive(Debug, PartialEq)]
struct LedgerSummary {
    count: usize,
    total: f64,
}

fn get_ledger_summary(user_id: UserID, connection: &Connection) -> Result<LedgerSummary, Error> {
    let count = count_transactions(user_id, connection)?;
    let total = list_transactions(user_id, None, connection)?
        .iter()
        .map(|transaction| transaction.amount)
        .sum();

    Ok(LedgerSummary { count, total })
}

/// Display the account page.
pub async fn get_account_page(
    State(state): State<AccountState>,
    Extension(session): Extension<Session>,
) -> Result<Response, Error> {
    let summary = {
        let connection = state.db_connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::DatabaseLockError
        })?;

        get_ledger_summary(session.user_id, &connection)?
    };

    let nav_bar = NavBar::new(endpoints::MANAGE_ACCOUNT_VIEW).into_html();
    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-2xl space-y-4"
            {
                h1 class="text-2xl font-bold" { "Manage Account" }

                dl class="grid grid-cols-2 gap-2"
                {
                    dt class="font-semibold" { "Username" }
                    dd id="username" { (session.username) }

                    dt class="font-semibold" { "Transactions recorded" }
                    dd id="transaction-count" { (summary.count) }

                    dt class="font-semibold" { "Net total" }
                    dd id="transaction-total" { (format_currency(summary.total)) }
                }

                p { (link(endpoints::LOG_OUT, "Log out")) }
            }
        }
    };

    Ok(base("Manage Account", &[], &content).into_response())
}
