// 🧵 Collectible pages - overview, list, create, edit, delete
//
// One router per category, nested under its path; the category rides along
// as a request extension.

use crate::entities::collectible::{self, Category};
use crate::progress::fetch_progress;
use crate::schema::{validate_collectible, CollectibleForm, FormAction, FormState};
use crate::web::{cache_key, html, ApiError, AppState, ListParams};
use axum::extract::{OriginalUri, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Extension, Form, Router};

pub fn routes(category: Category) -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/create", get(create_form).post(create))
        .route("/:id/edit", get(edit_form).post(update))
        .route("/:id/delete", post(delete))
        .layer(Extension(category))
}

/// GET /dashboard - total completion plus one widget per category
pub async fn overview(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
) -> Result<Html<String>, ApiError> {
    state.cached(&cache_key(&uri), || {
        let summary = state.db(|conn| fetch_progress(conn))?;
        Ok(html::overview(&summary))
    })
}

/// GET /dashboard/{slug}?query=&page=
async fn list(
    State(state): State<AppState>,
    Extension(category): Extension<Category>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<ListParams>,
) -> Result<Html<String>, ApiError> {
    state.cached(&cache_key(&uri), || {
        let query = params.query();
        let page = params.page();
        let (items, total_pages) = state.db(|conn| {
            Ok((
                collectible::fetch_filtered(conn, category, query, page)?,
                collectible::fetch_pages(conn, category, query)?,
            ))
        })?;
        Ok(html::collectible_list(category, &items, query, page, total_pages))
    })
}

fn create_href(category: Category) -> String {
    format!("{}/create", category.path())
}

fn edit_href(category: Category, id: &str) -> String {
    format!("{}/{}/edit", category.path(), urlencoding::encode(id))
}

fn missing(category: Category) -> ApiError {
    ApiError::not_found(
        format!("Could not find the requested {}.", category.singular().to_lowercase()),
        category.path(),
    )
}

/// Re-render a form after a failed submit
fn form_response(
    status: StatusCode,
    category: Category,
    title: &str,
    href: &str,
    form: &CollectibleForm,
    form_state: &FormState,
) -> Response {
    (
        status,
        Html(html::collectible_form_page(category, title, href, form, form_state)),
    )
        .into_response()
}

async fn create_form(Extension(category): Extension<Category>) -> Html<String> {
    let form = CollectibleForm {
        status: Some("pending".to_string()),
        ..Default::default()
    };
    Html(html::collectible_form_page(
        category,
        &format!("Create {}", category.singular()),
        &create_href(category),
        &form,
        &FormState::default(),
    ))
}

async fn create(
    State(state): State<AppState>,
    Extension(category): Extension<Category>,
    Form(form): Form<CollectibleForm>,
) -> Response {
    let title = format!("Create {}", category.singular());
    let href = create_href(category);

    let item = match validate_collectible(category, &form, FormAction::Create) {
        Ok(item) => item,
        Err(errors) => {
            return form_response(StatusCode::UNPROCESSABLE_ENTITY, category, &title, &href, &form, &errors)
        }
    };

    match state.db(|conn| collectible::insert(conn, category, &item)) {
        Ok(id) => {
            tracing::info!(category = category.slug(), %id, "created");
            state.invalidate_category(category);
            Redirect::to(&category.path()).into_response()
        }
        Err(err) => form_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            category,
            &title,
            &href,
            &form,
            &FormState::message(err.to_string()),
        ),
    }
}

async fn edit_form(
    State(state): State<AppState>,
    Extension(category): Extension<Category>,
    Path(id): Path<String>,
) -> Result<Html<String>, ApiError> {
    let item = state
        .db(|conn| collectible::fetch_by_id(conn, category, &id))?
        .ok_or_else(|| missing(category))?;

    Ok(Html(html::collectible_form_page(
        category,
        &format!("Edit {}", category.singular()),
        &edit_href(category, &id),
        &CollectibleForm::from_item(&item),
        &FormState::default(),
    )))
}

async fn update(
    State(state): State<AppState>,
    Extension(category): Extension<Category>,
    Path(id): Path<String>,
    Form(form): Form<CollectibleForm>,
) -> Response {
    let title = format!("Edit {}", category.singular());
    let href = edit_href(category, &id);

    let item = match validate_collectible(category, &form, FormAction::Update) {
        Ok(item) => item,
        Err(errors) => {
            return form_response(StatusCode::UNPROCESSABLE_ENTITY, category, &title, &href, &form, &errors)
        }
    };

    match state.db(|conn| collectible::update(conn, category, &id, &item)) {
        Ok(changed) => {
            tracing::info!(category = category.slug(), %id, changed, "updated");
            state.invalidate_category(category);
            Redirect::to(&category.path()).into_response()
        }
        Err(err) => form_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            category,
            &title,
            &href,
            &form,
            &FormState::message(err.to_string()),
        ),
    }
}

async fn delete(
    State(state): State<AppState>,
    Extension(category): Extension<Category>,
    Path(id): Path<String>,
) -> Result<Redirect, ApiError> {
    let deleted = state.db(|conn| collectible::delete(conn, category, &id))?;
    tracing::info!(category = category.slug(), %id, deleted, "deleted");

    state.invalidate_category(category);
    Ok(Redirect::to(&category.path()))
}

#[cfg(test)]
mod tests {
    use crate::config::Environment;
    use crate::entities::collectible::{self, Category};
    use crate::web::test_support::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_list_first_page() {
        let state = test_state(Environment::Test);
        let response = get(&state, "/dashboard/tools").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_text(response).await;
        assert!(body.contains("<h1>Tools</h1>"));
        assert!(body.contains("Create Tool"));
        // 51 tools → 9 pages
        assert!(body.contains("/dashboard/tools?page=9"));
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let state = test_state(Environment::Test);
        let body = body_text(get(&state, "/dashboard/tools?query=BR%C3%9AJULA").await).await;
        assert!(body.contains("Brújula"));
        assert!(!body.contains("Alfiler recto"));
    }

    #[tokio::test]
    async fn test_create_redirects_and_persists() {
        let state = test_state(Environment::Test);

        // Prime the cache so the write has something to invalidate
        get(&state, "/dashboard/crests").await;
        get(&state, "/dashboard").await;

        let response = post_form(
            &state,
            "/dashboard/crests/create",
            "name=Blason+Nuevo&status=collected&notes=&percentage=",
        )
        .await;
        assert_eq!(location(&response), "/dashboard/crests");

        let body = body_text(get(&state, "/dashboard/crests?query=nuevo").await).await;
        assert!(body.contains("Blason Nuevo"));

        let overview = body_text(get(&state, "/dashboard").await).await;
        assert!(overview.contains("88%"));
    }

    #[tokio::test]
    async fn test_create_with_empty_name_writes_nothing() {
        let state = test_state(Environment::Test);
        let before = state.db(|conn| collectible::counts(conn, Category::Tools)).unwrap();

        let response = post_form(&state, "/dashboard/tools/create", "name=&status=pending").await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_text(response).await;
        assert!(body.contains("Please enter a tool name."));
        assert!(body.contains("Missing Fields. Failed to Create Tool."));

        let after = state.db(|conn| collectible::counts(conn, Category::Tools)).unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_edit_unknown_id_is_404() {
        let state = test_state(Environment::Test);
        let response = get(&state, "/dashboard/abilities/does-not-exist/edit").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_text(response).await;
        assert!(body.contains("Could not find the requested ability."));
    }

    #[tokio::test]
    async fn test_update_unknown_id_still_redirects() {
        let state = test_state(Environment::Test);
        let response = post_form(
            &state,
            "/dashboard/abilities/does-not-exist/edit",
            "name=Nada&status=pending",
        )
        .await;
        assert_eq!(location(&response), "/dashboard/abilities");
    }

    #[tokio::test]
    async fn test_edit_and_delete_roundtrip() {
        let state = test_state(Environment::Test);
        let item = state
            .db(|conn| collectible::fetch_filtered(conn, Category::SilkHearts, "", 1))
            .unwrap()
            .remove(0);

        let edit_page = body_text(get(&state, &format!("/dashboard/silk-hearts/{}/edit", item.id)).await).await;
        assert!(edit_page.contains(&item.name));

        let response = post_form(
            &state,
            &format!("/dashboard/silk-hearts/{}/edit", item.id),
            "name=Corazon+Editado&status=pending&percentage=1",
        )
        .await;
        assert_eq!(location(&response), "/dashboard/silk-hearts");
        let updated = state
            .db(|conn| collectible::fetch_by_id(conn, Category::SilkHearts, &item.id))
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Corazon Editado");

        let response = post_form(&state, &format!("/dashboard/silk-hearts/{}/delete", item.id), "").await;
        assert_eq!(location(&response), "/dashboard/silk-hearts");
        let counts = state.db(|conn| collectible::counts(conn, Category::SilkHearts)).unwrap();
        assert_eq!(counts.total, 2);
    }
}
