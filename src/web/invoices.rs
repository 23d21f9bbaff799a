// 🧾 Invoice and customer pages

use crate::entities::customer::{fetch_customers, fetch_filtered_customers, CustomerField};
use crate::entities::invoice::{self, InvoiceStatus};
use crate::schema::{validate_invoice, FormAction, FormState, InvoiceFormInput};
use crate::web::{cache_key, html, ApiError, AppState, ListParams};
use axum::extract::{OriginalUri, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};

const INVOICES_PATH: &str = "/dashboard/invoices";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/create", get(create_form).post(create))
        .route("/:id/edit", get(edit_form).post(update))
        .route("/:id/delete", post(delete))
}

/// GET /dashboard/invoices - summary cards, revenue, latest, searchable table
async fn list(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<ListParams>,
) -> Result<Html<String>, ApiError> {
    state.cached(&cache_key(&uri), || {
        let query = params.query();
        let page = params.page();

        let (cards, revenue, latest, invoices, total_pages) = state.db(|conn| {
            Ok((
                invoice::fetch_card_data(conn)?,
                invoice::fetch_revenue(conn)?,
                invoice::fetch_latest_invoices(conn)?,
                invoice::fetch_filtered_invoices(conn, query, page)?,
                invoice::fetch_invoices_pages(conn, query)?,
            ))
        })?;

        let main = format!(
            r#"<h1>Invoices</h1>{cards}<div class="split">{revenue}{latest}</div><div class="toolbar">{search}<a class="button" href="{path}/create">Create Invoice</a></div>{table}{pages}"#,
            cards = html::cards(&cards),
            revenue = html::revenue_chart(&revenue),
            latest = html::latest_invoices(&latest),
            search = html::search(INVOICES_PATH, "Search invoices...", query),
            path = INVOICES_PATH,
            table = html::invoices_table(&invoices),
            pages = html::pagination(INVOICES_PATH, query, page, total_pages),
        );
        Ok(html::layout("Invoices", INVOICES_PATH, &main))
    })
}

/// GET /dashboard/customers?query=
pub async fn customers(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<ListParams>,
) -> Result<Html<String>, ApiError> {
    state.cached(&cache_key(&uri), || {
        let query = params.query();
        let customers = state.db(|conn| fetch_filtered_customers(conn, query))?;

        let main = format!(
            "<h1>Customers</h1>{}{}",
            html::search("/dashboard/customers", "Search customers...", query),
            html::customers_table(&customers)
        );
        Ok(html::layout("Customers", "/dashboard/customers", &main))
    })
}

fn edit_href(id: &str) -> String {
    format!("{}/{}/edit", INVOICES_PATH, urlencoding::encode(id))
}

/// Re-render the invoice form; customers are reloaded for the select box
fn form_response(
    state: &AppState,
    status: StatusCode,
    title: &str,
    href: &str,
    form: &InvoiceFormInput,
    form_state: &FormState,
) -> Response {
    let customers: Vec<CustomerField> = state.db(|conn| fetch_customers(conn)).unwrap_or_default();
    (
        status,
        Html(html::invoice_form_page(title, href, &customers, form, form_state)),
    )
        .into_response()
}

async fn create_form(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let customers = state.db(|conn| fetch_customers(conn))?;
    let form = InvoiceFormInput {
        status: Some(InvoiceStatus::Pending.as_str().to_string()),
        ..Default::default()
    };
    let href = format!("{}/create", INVOICES_PATH);

    Ok(Html(html::invoice_form_page(
        "Create Invoice",
        &href,
        &customers,
        &form,
        &FormState::default(),
    )))
}

async fn create(State(state): State<AppState>, Form(form): Form<InvoiceFormInput>) -> Response {
    let href = format!("{}/create", INVOICES_PATH);

    let new_invoice = match validate_invoice(&form, FormAction::Create) {
        Ok(invoice) => invoice,
        Err(errors) => {
            return form_response(&state, StatusCode::UNPROCESSABLE_ENTITY, "Create Invoice", &href, &form, &errors)
        }
    };

    match state.db(|conn| invoice::insert_invoice(conn, &new_invoice)) {
        Ok(id) => {
            tracing::info!(%id, amount = new_invoice.amount_cents, "invoice created");
            state.invalidate_invoices();
            Redirect::to(INVOICES_PATH).into_response()
        }
        Err(err) => form_response(
            &state,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Create Invoice",
            &href,
            &form,
            &FormState::message(err.to_string()),
        ),
    }
}

async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, ApiError> {
    let (invoice, customers) = state.db(|conn| {
        Ok((invoice::fetch_invoice_by_id(conn, &id)?, fetch_customers(conn)?))
    })?;
    let invoice = invoice
        .ok_or_else(|| ApiError::not_found("Could not find the requested invoice.", INVOICES_PATH))?;

    Ok(Html(html::invoice_form_page(
        "Edit Invoice",
        &edit_href(&id),
        &customers,
        &InvoiceFormInput::from_invoice(&invoice),
        &FormState::default(),
    )))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<InvoiceFormInput>,
) -> Response {
    let href = edit_href(&id);

    let new_invoice = match validate_invoice(&form, FormAction::Update) {
        Ok(invoice) => invoice,
        Err(errors) => {
            return form_response(&state, StatusCode::UNPROCESSABLE_ENTITY, "Edit Invoice", &href, &form, &errors)
        }
    };

    match state.db(|conn| invoice::update_invoice(conn, &id, &new_invoice)) {
        Ok(changed) => {
            tracing::info!(%id, changed, "invoice updated");
            state.invalidate_invoices();
            Redirect::to(INVOICES_PATH).into_response()
        }
        Err(err) => form_response(
            &state,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Edit Invoice",
            &href,
            &form,
            &FormState::message(err.to_string()),
        ),
    }
}

async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<Redirect, ApiError> {
    let deleted = state.db(|conn| invoice::delete_invoice(conn, &id))?;
    tracing::info!(%id, deleted, "invoice deleted");

    state.invalidate_invoices();
    Ok(Redirect::to(INVOICES_PATH))
}
