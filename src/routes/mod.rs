//! Application router configuration with protected and unprotected route
//! definitions.

mod balance;
mod customers;
mod log_in;
mod log_out;
mod register;
mod transaction;

pub(crate) mod endpoints;

use axum::{
    Router,
    extract::FromRef,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use crate::{
    AppState, Error,
    auth::{AuthState, auth_guard, banker_guard},
    stores::{LedgerStore, UserStore},
};

use balance::get_balance;
use customers::{get_customer_transactions, get_customers};
use log_in::post_log_in;
use log_out::get_log_out;
use register::register_user;
use transaction::{create_transaction_endpoint, get_transactions};

/// Return a router with all the app's routes.
pub fn build_router<L, U>(state: AppState<L, U>) -> Router
where
    L: LedgerStore + Clone + Send + Sync + 'static,
    U: UserStore + Clone + Send + Sync + 'static,
{
    let auth_state = AuthState::from_ref(&state);

    let unprotected_routes = Router::new()
        .route(endpoints::LOG_IN, post(post_log_in::<L, U>))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(endpoints::USERS, post(register_user::<L, U>));

    let customer_routes = Router::new()
        .route(endpoints::BALANCE, get(get_balance::<L, U>))
        .route(
            endpoints::TRANSACTIONS,
            get(get_transactions::<L, U>).post(create_transaction_endpoint::<L, U>),
        )
        .layer(middleware::from_fn_with_state(
            auth_state.clone(),
            auth_guard,
        ));

    let banker_routes = Router::new()
        .route(endpoints::CUSTOMERS, get(get_customers::<L, U>))
        .route(
            endpoints::CUSTOMER_TRANSACTIONS,
            get(get_customer_transactions::<L, U>),
        )
        .layer(middleware::from_fn_with_state(auth_state, banker_guard));

    customer_routes
        .merge(banker_routes)
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The JSON response for requests that match no route.
async fn get_404_not_found() -> Response {
    Error::NotFound.into_response()
}
