// 🎨 HTML Rendering - server-side page fragments
//
// Every dynamic value goes through `escape` before it lands in markup.

use crate::entities::{
    format_percentage, Category, Collectible, CollectibleStatus, CustomerField, CustomersTableRow,
    InvoiceStatus, InvoicesTableRow, LatestInvoice, Revenue, CardData, format_currency,
};
use crate::pagination::{generate_pagination, PageItem};
use crate::progress::{CategoryProgress, ProgressSummary};
use crate::schema::{CollectibleForm, FormState, InvoiceFormInput};
use chrono::NaiveDate;

// ============================================================================
// PRIMITIVES
// ============================================================================

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// List URL for a search + page, e.g. `/dashboard/tools?query=pin&page=2`
pub fn page_url(path: &str, query: &str, page: i64) -> String {
    let mut url = format!("{}?page={}", path, page);
    if !query.is_empty() {
        url.push_str("&query=");
        url.push_str(&urlencoding::encode(query));
    }
    url
}

/// "2022-12-06" → "Dec 6, 2022"; anything unparsable is shown as-is
pub fn format_date(date: &str) -> String {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|d| d.format("%b %-d, %Y").to_string())
        .unwrap_or_else(|_| date.to_string())
}

// ============================================================================
// LAYOUT
// ============================================================================

fn nav(active: &str) -> String {
    let mut links = vec![("Home".to_string(), "/dashboard".to_string())];
    links.extend(Category::ALL.iter().map(|c| (c.label().to_string(), c.path())));

    let mut html = String::from(r#"<nav class="sidenav"><a class="brand" href="/dashboard">Silk Progress</a><div class="nav-links">"#);
    for (label, href) in &links {
        let class = if href == active { "nav-link active" } else { "nav-link" };
        html.push_str(&format!(
            r#"<a class="{}" href="{}">{}</a>"#,
            class,
            href,
            escape(label)
        ));
    }
    html.push_str(r#"</div><div class="nav-links secondary">"#);
    for (label, href) in [("Invoices", "/dashboard/invoices"), ("Customers", "/dashboard/customers")] {
        let class = if href == active { "nav-link active" } else { "nav-link" };
        html.push_str(&format!(r#"<a class="{}" href="{}">{}</a>"#, class, href, label));
    }
    html.push_str(
        r#"</div><form action="/logout" method="post"><button class="nav-link signout" type="submit">Sign Out</button></form></nav>"#,
    );
    html
}

fn document(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{} | Silk Progress</title>
<link rel="stylesheet" href="/static/app.css">
</head>
<body>
{}
</body>
</html>
"#,
        escape(title),
        body
    )
}

/// Dashboard page: side navigation plus `main`
pub fn layout(title: &str, active: &str, main: &str) -> String {
    document(
        title,
        &format!(r#"<div class="shell">{}<main class="content">{}</main></div>"#, nav(active), main),
    )
}

pub fn breadcrumbs(crumbs: &[(&str, &str)]) -> String {
    let mut html = String::from(r#"<nav class="breadcrumbs" aria-label="Breadcrumb"><ol>"#);
    let last = crumbs.len().saturating_sub(1);
    for (i, (label, href)) in crumbs.iter().enumerate() {
        let current = if i == last { r#" aria-current="page""# } else { "" };
        html.push_str(&format!(
            r#"<li{}><a href="{}">{}</a></li>"#,
            current,
            escape(href),
            escape(label)
        ));
        if i != last {
            html.push_str(r#"<li class="separator">/</li>"#);
        }
    }
    html.push_str("</ol></nav>");
    html
}

pub fn search(path: &str, placeholder: &str, query: &str) -> String {
    format!(
        r#"<form class="search" action="{}" method="get"><label class="sr-only" for="search">Search</label><input id="search" name="query" type="search" placeholder="{}" value="{}"><input type="hidden" name="page" value="1"></form>"#,
        escape(path),
        escape(placeholder),
        escape(query)
    )
}

pub fn pagination(path: &str, query: &str, current: i64, total: i64) -> String {
    if total <= 1 {
        return String::new();
    }

    let mut html = String::from(r#"<div class="pagination">"#);
    if current > 1 {
        html.push_str(&format!(
            r#"<a class="page-arrow" href="{}" aria-label="Previous">&larr;</a>"#,
            escape(&page_url(path, query, current - 1))
        ));
    }
    for item in generate_pagination(current, total) {
        match item {
            PageItem::Page(n) if n == current => {
                html.push_str(&format!(r#"<span class="page active">{}</span>"#, n));
            }
            PageItem::Page(n) => html.push_str(&format!(
                r#"<a class="page" href="{}">{}</a>"#,
                escape(&page_url(path, query, n)),
                n
            )),
            PageItem::Ellipsis => html.push_str(r#"<span class="page ellipsis">...</span>"#),
        }
    }
    if current < total {
        html.push_str(&format!(
            r#"<a class="page-arrow" href="{}" aria-label="Next">&rarr;</a>"#,
            escape(&page_url(path, query, current + 1))
        ));
    }
    html.push_str("</div>");
    html
}

pub fn not_found(message: &str, back: &str) -> String {
    layout(
        "Not Found",
        back,
        &format!(
            r#"<section class="not-found"><h2>404 Not Found</h2><p>{}</p><a class="button" href="{}">Go Back</a></section>"#,
            escape(message),
            escape(back)
        ),
    )
}

pub fn error_page(message: &str) -> String {
    layout(
        "Error",
        "",
        &format!(
            r#"<section class="error"><h2>Something went wrong!</h2><p>{}</p><a class="button" href="/dashboard">Back to Dashboard</a></section>"#,
            escape(message)
        ),
    )
}

// ============================================================================
// OVERVIEW
// ============================================================================

pub fn collected_percentage_widget(summary: &ProgressSummary) -> String {
    format!(
        r#"<div class="widget total"><p class="widget-label">Collected Progress</p><p class="widget-value">{}%</p><p class="widget-note">Total completion percentage</p><div class="bar"><div class="bar-fill gradient" style="width: {}%"></div></div></div>"#,
        format_percentage(summary.total_percentage()),
        format_percentage(summary.bar_width())
    )
}

pub fn count_widget(progress: &CategoryProgress) -> String {
    let pct = progress.counts.percentage();
    format!(
        r#"<a class="widget" href="{href}"><p class="widget-label">{label} Collected</p><p class="widget-value">{collected} <span class="widget-total">/ {total}</span></p><p class="widget-note">{pct}% of all {lower}</p><div class="bar"><div class="bar-fill" style="width: {pct}%"></div><span class="bar-label">{pct}%</span></div></a>"#,
        href = progress.category.path(),
        label = escape(progress.category.label()),
        collected = progress.counts.collected,
        total = progress.counts.total,
        pct = pct,
        lower = escape(&progress.category.label().to_lowercase()),
    )
}

pub fn overview(summary: &ProgressSummary) -> String {
    let widgets: String = summary.categories.iter().map(count_widget).collect();
    layout(
        "Dashboard",
        "/dashboard",
        &format!(
            r#"<h1>Dashboard</h1><div class="stack">{}<div class="widget-grid">{}</div></div>"#,
            collected_percentage_widget(summary),
            widgets
        ),
    )
}

// ============================================================================
// COLLECTIBLES
// ============================================================================

pub fn status_badge(status: CollectibleStatus) -> String {
    format!(
        r#"<span class="badge {}">{}</span>"#,
        status.as_str(),
        status.label()
    )
}

fn shows_percentage(category: Category) -> bool {
    category.min_percentage() < 1.0
}

pub fn collectible_table(category: Category, items: &[Collectible]) -> String {
    let pct_head = if shows_percentage(category) { "<th>Percentage</th>" } else { "" };
    let mut html = format!(
        r#"<div class="table-wrap"><table><thead><tr><th>Name</th><th>Status</th><th>Notes</th>{}<th><span class="sr-only">Edit</span></th></tr></thead><tbody>"#,
        pct_head
    );

    if items.is_empty() {
        html.push_str(r#"<tr><td class="empty" colspan="5">No results.</td></tr>"#);
    }

    for item in items {
        let pct_cell = if shows_percentage(category) {
            format!("<td>{}%</td>", format_percentage(item.percentage))
        } else {
            String::new()
        };
        html.push_str(&format!(
            r#"<tr><td>{name}</td><td>{status}</td><td class="notes">{notes}</td>{pct}<td class="actions"><a class="icon-button" href="{base}/{id}/edit">Edit</a><form action="{base}/{id}/delete" method="post"><button class="icon-button danger" type="submit">Delete</button></form></td></tr>"#,
            name = escape(&item.name),
            status = status_badge(item.status),
            notes = escape(&item.notes),
            pct = pct_cell,
            base = category.path(),
            id = escape(&item.id),
        ));
    }

    html.push_str("</tbody></table></div>");
    html
}

pub fn collectible_list(
    category: Category,
    items: &[Collectible],
    query: &str,
    page: i64,
    total_pages: i64,
) -> String {
    let path = category.path();
    let main = format!(
        r#"<h1>{label}</h1><div class="toolbar">{search}<a class="button" href="{path}/create">Create {singular}</a></div>{table}{pages}"#,
        label = escape(category.label()),
        search = search(&path, &format!("Search {}...", category.label().to_lowercase()), query),
        path = path,
        singular = escape(category.singular()),
        table = collectible_table(category, items),
        pages = pagination(&path, query, page, total_pages),
    );
    layout(category.label(), &path, &main)
}

fn field_errors(state: &FormState, field: &str) -> String {
    let errors: String = state
        .field_errors(field)
        .iter()
        .map(|e| format!(r#"<p class="field-error">{}</p>"#, escape(e)))
        .collect();
    format!(r#"<div id="{}-error" aria-live="polite">{}</div>"#, field, errors)
}

fn form_message(state: &FormState) -> String {
    state
        .message
        .as_deref()
        .map(|m| format!(r#"<div class="form-message" aria-live="polite"><p>{}</p></div>"#, escape(m)))
        .unwrap_or_default()
}

/// Create or edit form. `action` is the POST target, `submit` the button text.
pub fn collectible_form(
    category: Category,
    form: &CollectibleForm,
    state: &FormState,
    action: &str,
    submit: &str,
) -> String {
    let lower = category.singular().to_lowercase();
    let status = form.status.as_deref().unwrap_or("pending");
    let radio = |value: CollectibleStatus| {
        format!(
            r#"<label class="radio"><input type="radio" name="status" value="{v}"{checked} aria-describedby="status-error"> {badge}</label>"#,
            v = value.as_str(),
            checked = if status == value.as_str() { " checked" } else { "" },
            badge = status_badge(value),
        )
    };

    format!(
        r#"<form class="card-form" action="{action}" method="post">
<div class="field"><label for="name">{singular} Name</label><input id="name" name="name" type="text" placeholder="Enter {lower} name" value="{name}" aria-describedby="name-error">{name_errors}</div>
<div class="field"><label for="notes">Notes</label><textarea id="notes" name="notes" rows="3" placeholder="Enter notes (optional)">{notes}</textarea>{notes_errors}</div>
<div class="field"><label for="percentage">Percentage</label><input id="percentage" name="percentage" type="number" min="{min}" step="{step}" placeholder="{default}" value="{percentage}" aria-describedby="percentage-error">{percentage_errors}</div>
<fieldset><legend>Set the {lower} status</legend><div class="radios">{pending}{collected}</div>{status_errors}</fieldset>
{message}
<div class="form-actions"><a class="button secondary" href="{cancel}">Cancel</a><button class="button" type="submit">{submit}</button></div>
</form>"#,
        action = escape(action),
        singular = escape(category.singular()),
        lower = escape(&lower),
        name = escape(form.name.as_deref().unwrap_or_default()),
        name_errors = field_errors(state, "name"),
        notes = escape(form.notes.as_deref().unwrap_or_default()),
        notes_errors = field_errors(state, "notes"),
        min = format_percentage(category.min_percentage()),
        step = category.percentage_step(),
        default = format_percentage(category.default_percentage()),
        percentage = escape(form.percentage.as_deref().unwrap_or_default()),
        percentage_errors = field_errors(state, "percentage"),
        pending = radio(CollectibleStatus::Pending),
        collected = radio(CollectibleStatus::Collected),
        status_errors = field_errors(state, "status"),
        message = form_message(state),
        cancel = category.path(),
        submit = escape(submit),
    )
}

/// Breadcrumbs + form, wrapped in the dashboard layout
pub fn collectible_form_page(
    category: Category,
    title: &str,
    self_href: &str,
    form: &CollectibleForm,
    state: &FormState,
) -> String {
    let path = category.path();
    let main = format!(
        "{}{}",
        breadcrumbs(&[(category.label(), path.as_str()), (title, self_href)]),
        collectible_form(category, form, state, self_href, title)
    );
    layout(title, &path, &main)
}

// ============================================================================
// INVOICES & CUSTOMERS
// ============================================================================

pub fn invoice_status_badge(status: InvoiceStatus) -> String {
    format!(
        r#"<span class="badge {}">{}</span>"#,
        status.as_str(),
        status.label()
    )
}

pub fn cards(data: &CardData) -> String {
    let card = |title: &str, value: &str| {
        format!(
            r#"<div class="card"><h3>{}</h3><p class="card-value">{}</p></div>"#,
            title,
            escape(value)
        )
    };
    format!(
        r#"<div class="card-grid">{}{}{}{}</div>"#,
        card("Collected", &data.total_paid_invoices),
        card("Pending", &data.total_pending_invoices),
        card("Total Invoices", &data.number_of_invoices.to_string()),
        card("Total Customers", &data.number_of_customers.to_string()),
    )
}

/// Bar chart of monthly revenue, scaled to the largest month
pub fn revenue_chart(revenue: &[Revenue]) -> String {
    if revenue.is_empty() {
        return r#"<p class="empty">No data available.</p>"#.to_string();
    }

    let top = revenue.iter().map(|r| r.revenue).max().unwrap_or(0).max(1);
    let bars: String = revenue
        .iter()
        .map(|r| {
            format!(
                r#"<div class="chart-col"><div class="chart-bar" style="height: {}%" title="${}"></div><span>{}</span></div>"#,
                r.revenue * 100 / top,
                r.revenue,
                escape(&r.month)
            )
        })
        .collect();
    format!(r#"<div class="chart"><h2>Recent Revenue</h2><div class="chart-bars">{}</div></div>"#, bars)
}

pub fn latest_invoices(latest: &[LatestInvoice]) -> String {
    let rows: String = latest
        .iter()
        .map(|invoice| {
            format!(
                r#"<li><div><p class="name">{}</p><p class="email">{}</p></div><p class="amount">{}</p></li>"#,
                escape(&invoice.name),
                escape(&invoice.email),
                escape(&invoice.amount)
            )
        })
        .collect();
    format!(r#"<div class="latest"><h2>Latest Invoices</h2><ul>{}</ul></div>"#, rows)
}

pub fn invoices_table(invoices: &[InvoicesTableRow]) -> String {
    let mut html = String::from(
        r#"<div class="table-wrap"><table><thead><tr><th>Customer</th><th>Email</th><th>Amount</th><th>Date</th><th>Status</th><th><span class="sr-only">Edit</span></th></tr></thead><tbody>"#,
    );
    if invoices.is_empty() {
        html.push_str(r#"<tr><td class="empty" colspan="6">No results.</td></tr>"#);
    }
    for invoice in invoices {
        html.push_str(&format!(
            r#"<tr><td><img class="avatar" src="{img}" alt="" width="28" height="28"> {name}</td><td>{email}</td><td>{amount}</td><td>{date}</td><td>{status}</td><td class="actions"><a class="icon-button" href="/dashboard/invoices/{id}/edit">Edit</a><form action="/dashboard/invoices/{id}/delete" method="post"><button class="icon-button danger" type="submit">Delete</button></form></td></tr>"#,
            img = escape(&invoice.image_url),
            name = escape(&invoice.name),
            email = escape(&invoice.email),
            amount = format_currency(invoice.amount),
            date = format_date(&invoice.date),
            status = invoice_status_badge(invoice.status),
            id = escape(&invoice.id),
        ));
    }
    html.push_str("</tbody></table></div>");
    html
}

pub fn invoice_form(
    customers: &[CustomerField],
    form: &InvoiceFormInput,
    state: &FormState,
    action: &str,
    submit: &str,
) -> String {
    let selected = form.customer_id.as_deref().unwrap_or_default();
    let options: String = customers
        .iter()
        .map(|c| {
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                escape(&c.id),
                if c.id == selected { " selected" } else { "" },
                escape(&c.name)
            )
        })
        .collect();

    let status = form.status.as_deref().unwrap_or_default();
    let radio = |value: InvoiceStatus| {
        format!(
            r#"<label class="radio"><input type="radio" name="status" value="{v}"{checked}> {badge}</label>"#,
            v = value.as_str(),
            checked = if status == value.as_str() { " checked" } else { "" },
            badge = invoice_status_badge(value),
        )
    };

    format!(
        r#"<form class="card-form" action="{action}" method="post">
<div class="field"><label for="customer">Choose customer</label><select id="customer" name="customerId" aria-describedby="customerId-error"><option value="">Select a customer</option>{options}</select>{customer_errors}</div>
<div class="field"><label for="amount">Choose an amount</label><input id="amount" name="amount" type="number" step="0.01" placeholder="Enter USD amount" value="{amount}" aria-describedby="amount-error">{amount_errors}</div>
<fieldset><legend>Set the invoice status</legend><div class="radios">{pending}{paid}</div>{status_errors}</fieldset>
{message}
<div class="form-actions"><a class="button secondary" href="/dashboard/invoices">Cancel</a><button class="button" type="submit">{submit}</button></div>
</form>"#,
        action = escape(action),
        options = options,
        customer_errors = field_errors(state, "customerId"),
        amount = escape(form.amount.as_deref().unwrap_or_default()),
        amount_errors = field_errors(state, "amount"),
        pending = radio(InvoiceStatus::Pending),
        paid = radio(InvoiceStatus::Paid),
        status_errors = field_errors(state, "status"),
        message = form_message(state),
        submit = escape(submit),
    )
}

pub fn invoice_form_page(
    title: &str,
    self_href: &str,
    customers: &[CustomerField],
    form: &InvoiceFormInput,
    state: &FormState,
) -> String {
    let main = format!(
        "{}{}",
        breadcrumbs(&[("Invoices", "/dashboard/invoices"), (title, self_href)]),
        invoice_form(customers, form, state, self_href, title)
    );
    layout(title, "/dashboard/invoices", &main)
}

pub fn customers_table(customers: &[CustomersTableRow]) -> String {
    let mut html = String::from(
        r#"<div class="table-wrap"><table><thead><tr><th>Name</th><th>Email</th><th>Total Invoices</th><th>Total Pending</th><th>Total Paid</th></tr></thead><tbody>"#,
    );
    for customer in customers {
        html.push_str(&format!(
            r#"<tr><td><img class="avatar" src="{}" alt="" width="28" height="28"> {}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>"#,
            escape(&customer.image_url),
            escape(&customer.name),
            escape(&customer.email),
            customer.total_invoices,
            escape(&customer.total_pending),
            escape(&customer.total_paid),
        ));
    }
    html.push_str("</tbody></table></div>");
    html
}

// ============================================================================
// LOGIN
// ============================================================================

pub fn login_page(error: Option<&str>, email: &str, redirect_to: &str) -> String {
    let error = error
        .map(|e| format!(r#"<p class="field-error" aria-live="polite">{}</p>"#, escape(e)))
        .unwrap_or_default();

    document(
        "Login",
        &format!(
            r#"<main class="login"><div class="login-banner">Silk Progress</div>
<form class="card-form" action="/login" method="post">
<h1>Please log in to continue.</h1>
<div class="field"><label for="email">Email</label><input id="email" name="email" type="email" placeholder="Enter your email address" value="{}" required></div>
<div class="field"><label for="password">Password</label><input id="password" name="password" type="password" placeholder="Enter password" minlength="6" required></div>
<input type="hidden" name="redirectTo" value="{}">
<button class="button" type="submit">Log in</button>
{}
</form></main>"#,
            escape(email),
            escape(redirect_to),
            error
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::CollectibleCounts;

    #[test]
    fn test_escape() {
        assert_eq!(escape(r#"<a href="x">&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;&lt;/a&gt;");
        assert_eq!(escape("Brújula"), "Brújula");
    }

    #[test]
    fn test_page_url_encodes_query() {
        assert_eq!(page_url("/dashboard/tools", "", 2), "/dashboard/tools?page=2");
        assert_eq!(
            page_url("/dashboard/tools", "alfiler recto", 1),
            "/dashboard/tools?page=1&query=alfiler%20recto"
        );
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2022-12-06"), "Dec 6, 2022");
        assert_eq!(format_date("not a date"), "not a date");
    }

    #[test]
    fn test_pagination_marks_current_page() {
        let html = pagination("/dashboard/tools", "", 2, 3);
        assert!(html.contains(r#"<span class="page active">2</span>"#));
        assert!(html.contains("/dashboard/tools?page=3"));
        assert!(pagination("/dashboard/tools", "", 1, 1).is_empty());
    }

    #[test]
    fn test_count_widget_text() {
        let html = count_widget(&CategoryProgress {
            category: Category::Tools,
            counts: CollectibleCounts { collected: 46, total: 51 },
            collected_percentage: 46.0,
        });
        assert!(html.contains("Tools Collected"));
        assert!(html.contains("46 <span class=\"widget-total\">/ 51</span>"));
        assert!(html.contains("90% of all tools"));
    }

    #[test]
    fn test_form_shows_errors_and_keeps_values() {
        let form = CollectibleForm {
            name: Some("<b>".to_string()),
            ..Default::default()
        };
        let state = FormState::message("Missing Fields. Failed to Create Tool.");
        let html = collectible_form(Category::Tools, &form, &state, "/dashboard/tools/create", "Create Tool");
        assert!(html.contains("value=\"&lt;b&gt;\""));
        assert!(html.contains("Missing Fields. Failed to Create Tool."));
        assert!(html.contains(r#"value="pending" checked"#));
    }

    #[test]
    fn test_nav_marks_active_link() {
        let html = layout("Tools", "/dashboard/tools", "");
        assert!(html.contains(r#"<a class="nav-link active" href="/dashboard/tools">Tools</a>"#));
        assert!(html.contains("Crafting Kit + Tool Pouch"));
    }
}
