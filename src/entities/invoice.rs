// 🧾 Invoice Entity - the conventional demo schema
//
// Amounts are stored in cents. Forms and the edit page work in dollars.

use crate::db::new_id;
use crate::error::{DbError, DbResult};
use crate::pagination::{self, ITEMS_PER_PAGE};
use chrono::Utc;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum InvoiceStatus {
    Pending,
    Paid,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Paid => "paid",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "Pending",
            InvoiceStatus::Paid => "Paid",
        }
    }
}

impl ToSql for InvoiceStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for InvoiceStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// Row of the invoices list: invoice joined with its customer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoicesTableRow {
    pub id: String,
    pub customer_id: String,
    pub name: String,
    pub email: String,
    pub image_url: String,
    pub date: String,
    pub amount: i64,
    pub status: InvoiceStatus,
}

/// Edit-form view of an invoice; amount is in dollars
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceForm {
    pub id: String,
    pub customer_id: String,
    pub amount: f64,
    pub status: InvoiceStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInvoice {
    pub customer_id: String,
    pub amount_cents: i64,
    pub status: InvoiceStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestInvoice {
    pub id: String,
    pub name: String,
    pub image_url: String,
    pub email: String,
    /// Already formatted as currency
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardData {
    pub number_of_customers: i64,
    pub number_of_invoices: i64,
    pub total_paid_invoices: String,
    pub total_pending_invoices: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revenue {
    pub month: String,
    pub revenue: i64,
}

/// Result row of the ad hoc maintenance query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceAmount {
    pub amount: i64,
    pub name: String,
}

/// en-US currency string for an amount in cents: 123456 → "$1,234.56"
pub fn format_currency(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    let dollars = (cents / 100).to_string();

    let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
    for (i, ch) in dollars.chars().enumerate() {
        if i > 0 && (dollars.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}${}.{:02}", sign, grouped, cents % 100)
}

// ============================================================================
// READ SIDE
// ============================================================================

pub fn fetch_revenue(conn: &Connection) -> DbResult<Vec<Revenue>> {
    let action = "fetch revenue data";
    let mut stmt = conn
        .prepare("SELECT month, revenue FROM revenue ORDER BY rowid")
        .map_err(DbError::query(action))?;

    let revenue = stmt
        .query_map([], |row| {
            Ok(Revenue {
                month: row.get(0)?,
                revenue: row.get(1)?,
            })
        })
        .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
        .map_err(DbError::query(action))?;

    Ok(revenue)
}

/// The five most recent invoices
pub fn fetch_latest_invoices(conn: &Connection) -> DbResult<Vec<LatestInvoice>> {
    let action = "fetch the latest invoices";
    let mut stmt = conn
        .prepare(
            "SELECT invoices.amount, customers.name, customers.image_url, customers.email, invoices.id
             FROM invoices
             JOIN customers ON invoices.customer_id = customers.id
             ORDER BY invoices.date DESC
             LIMIT 5",
        )
        .map_err(DbError::query(action))?;

    let latest = stmt
        .query_map([], |row| {
            let amount: i64 = row.get(0)?;
            Ok(LatestInvoice {
                amount: format_currency(amount),
                name: row.get(1)?,
                image_url: row.get(2)?,
                email: row.get(3)?,
                id: row.get(4)?,
            })
        })
        .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
        .map_err(DbError::query(action))?;

    Ok(latest)
}

pub fn fetch_card_data(conn: &Connection) -> DbResult<CardData> {
    let action = "fetch card data";

    let number_of_invoices: i64 = conn
        .query_row("SELECT COUNT(*) FROM invoices", [], |row| row.get(0))
        .map_err(DbError::query(action))?;
    let number_of_customers: i64 = conn
        .query_row("SELECT COUNT(*) FROM customers", [], |row| row.get(0))
        .map_err(DbError::query(action))?;
    let (paid, pending): (i64, i64) = conn
        .query_row(
            "SELECT
                COALESCE(SUM(CASE WHEN status = 'paid' THEN amount ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN status = 'pending' THEN amount ELSE 0 END), 0)
             FROM invoices",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .map_err(DbError::query(action))?;

    Ok(CardData {
        number_of_customers,
        number_of_invoices,
        total_paid_invoices: format_currency(paid),
        total_pending_invoices: format_currency(pending),
    })
}

const INVOICE_SEARCH: &str = "contains_ci(customers.name, ?1) OR
    contains_ci(customers.email, ?1) OR
    contains_ci(CAST(invoices.amount AS TEXT), ?1) OR
    contains_ci(invoices.date, ?1) OR
    contains_ci(invoices.status, ?1)";

pub fn fetch_filtered_invoices(
    conn: &Connection,
    query: &str,
    page: i64,
) -> DbResult<Vec<InvoicesTableRow>> {
    let action = "fetch invoices";
    let sql = format!(
        "SELECT
            invoices.id, invoices.customer_id, customers.name, customers.email,
            customers.image_url, invoices.date, invoices.amount, invoices.status
         FROM invoices
         JOIN customers ON invoices.customer_id = customers.id
         WHERE {INVOICE_SEARCH}
         ORDER BY invoices.date DESC
         LIMIT ?2 OFFSET ?3"
    );

    let mut stmt = conn.prepare(&sql).map_err(DbError::query(action))?;
    let invoices = stmt
        .query_map(
            params![query, ITEMS_PER_PAGE, pagination::offset(page)],
            |row| {
                Ok(InvoicesTableRow {
                    id: row.get(0)?,
                    customer_id: row.get(1)?,
                    name: row.get(2)?,
                    email: row.get(3)?,
                    image_url: row.get(4)?,
                    date: row.get(5)?,
                    amount: row.get(6)?,
                    status: row.get(7)?,
                })
            },
        )
        .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
        .map_err(DbError::query(action))?;

    Ok(invoices)
}

pub fn fetch_invoices_pages(conn: &Connection, query: &str) -> DbResult<i64> {
    let sql = format!(
        "SELECT COUNT(*)
         FROM invoices
         JOIN customers ON invoices.customer_id = customers.id
         WHERE {INVOICE_SEARCH}"
    );

    let count: i64 = conn
        .query_row(&sql, params![query], |row| row.get(0))
        .map_err(DbError::query("fetch total number of invoices"))?;

    Ok(pagination::total_pages(count))
}

pub fn fetch_invoice_by_id(conn: &Connection, id: &str) -> DbResult<Option<InvoiceForm>> {
    conn.query_row(
        "SELECT id, customer_id, amount, status FROM invoices WHERE id = ?1",
        params![id],
        |row| {
            let cents: i64 = row.get(2)?;
            Ok(InvoiceForm {
                id: row.get(0)?,
                customer_id: row.get(1)?,
                amount: cents as f64 / 100.0,
                status: row.get(3)?,
            })
        },
    )
    .optional()
    .map_err(DbError::query("fetch invoice"))
}

/// Invoices with an exact amount (cents), joined with the customer name
pub fn fetch_invoices_with_amount(conn: &Connection, cents: i64) -> DbResult<Vec<InvoiceAmount>> {
    let action = "execute query";
    let mut stmt = conn
        .prepare(
            "SELECT invoices.amount, customers.name
             FROM invoices
             JOIN customers ON invoices.customer_id = customers.id
             WHERE invoices.amount = ?1",
        )
        .map_err(DbError::query(action))?;

    let rows = stmt
        .query_map(params![cents], |row| {
            Ok(InvoiceAmount {
                amount: row.get(0)?,
                name: row.get(1)?,
            })
        })
        .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
        .map_err(DbError::query(action))?;

    Ok(rows)
}

// ============================================================================
// WRITE SIDE
// ============================================================================

/// Insert an invoice dated today; returns the new id
pub fn insert_invoice(conn: &Connection, invoice: &NewInvoice) -> DbResult<String> {
    let id = new_id();
    let date = Utc::now().format("%Y-%m-%d").to_string();

    conn.execute(
        "INSERT INTO invoices (id, customer_id, amount, status, date) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![id, invoice.customer_id, invoice.amount_cents, invoice.status, date],
    )
    .map_err(DbError::query("Create Invoice"))?;

    Ok(id)
}

pub fn update_invoice(conn: &Connection, id: &str, invoice: &NewInvoice) -> DbResult<usize> {
    conn.execute(
        "UPDATE invoices SET customer_id = ?1, amount = ?2, status = ?3 WHERE id = ?4",
        params![invoice.customer_id, invoice.amount_cents, invoice.status, id],
    )
    .map_err(DbError::query("Update Invoice"))
}

pub fn delete_invoice(conn: &Connection, id: &str) -> DbResult<usize> {
    conn.execute("DELETE FROM invoices WHERE id = ?1", params![id])
        .map_err(DbError::query("Delete Invoice"))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::setup_database;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn.execute(
            "INSERT INTO customers (id, name, email, image_url) VALUES
                ('c1', 'Evil Rabbit', 'evil@rabbit.com', '/customers/evil-rabbit.png'),
                ('c2', 'Amy Burns', 'amy@burns.com', '/customers/amy-burns.png')",
            [],
        )
        .unwrap();
        conn
    }

    fn new_invoice(customer_id: &str, amount_cents: i64, status: InvoiceStatus) -> NewInvoice {
        NewInvoice {
            customer_id: customer_id.to_string(),
            amount_cents,
            status,
        }
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(0), "$0.00");
        assert_eq!(format_currency(666), "$6.66");
        assert_eq!(format_currency(15795), "$157.95");
        assert_eq!(format_currency(123456789), "$1,234,567.89");
        assert_eq!(format_currency(-1250), "-$12.50");
    }

    #[test]
    fn test_insert_and_fetch_by_id() {
        let conn = test_conn();
        let id = insert_invoice(&conn, &new_invoice("c1", 15795, InvoiceStatus::Pending)).unwrap();

        let form = fetch_invoice_by_id(&conn, &id).unwrap().unwrap();
        assert_eq!(form.customer_id, "c1");
        assert_eq!(form.amount, 157.95);
        assert_eq!(form.status, InvoiceStatus::Pending);

        assert!(fetch_invoice_by_id(&conn, "missing").unwrap().is_none());
    }

    #[test]
    fn test_insert_rejects_unknown_customer() {
        let conn = test_conn();
        let err = insert_invoice(&conn, &new_invoice("nobody", 100, InvoiceStatus::Paid)).unwrap_err();
        assert_eq!(err.to_string(), "Database Error: Failed to Create Invoice.");
    }

    #[test]
    fn test_filtered_invoices_search_customer_and_status() {
        let conn = test_conn();
        insert_invoice(&conn, &new_invoice("c1", 666, InvoiceStatus::Pending)).unwrap();
        insert_invoice(&conn, &new_invoice("c2", 3040, InvoiceStatus::Paid)).unwrap();

        let rabbit = fetch_filtered_invoices(&conn, "RABBIT", 1).unwrap();
        assert_eq!(rabbit.len(), 1);
        assert_eq!(rabbit[0].name, "Evil Rabbit");

        let paid = fetch_filtered_invoices(&conn, "paid", 1).unwrap();
        assert_eq!(paid.len(), 1);
        assert_eq!(paid[0].amount, 3040);

        let by_amount = fetch_filtered_invoices(&conn, "304", 1).unwrap();
        assert_eq!(by_amount.len(), 1);

        assert_eq!(fetch_invoices_pages(&conn, "").unwrap(), 1);
    }

    #[test]
    fn test_update_and_delete() {
        let conn = test_conn();
        let id = insert_invoice(&conn, &new_invoice("c1", 500, InvoiceStatus::Pending)).unwrap();

        assert_eq!(update_invoice(&conn, &id, &new_invoice("c2", 900, InvoiceStatus::Paid)).unwrap(), 1);
        let form = fetch_invoice_by_id(&conn, &id).unwrap().unwrap();
        assert_eq!(form.customer_id, "c2");
        assert_eq!(form.status, InvoiceStatus::Paid);

        assert_eq!(update_invoice(&conn, "missing", &new_invoice("c2", 1, InvoiceStatus::Paid)).unwrap(), 0);

        assert_eq!(delete_invoice(&conn, &id).unwrap(), 1);
        assert!(fetch_invoice_by_id(&conn, &id).unwrap().is_none());
    }

    #[test]
    fn test_card_data_and_latest() {
        let conn = test_conn();
        insert_invoice(&conn, &new_invoice("c1", 1000, InvoiceStatus::Paid)).unwrap();
        insert_invoice(&conn, &new_invoice("c2", 250, InvoiceStatus::Pending)).unwrap();
        insert_invoice(&conn, &new_invoice("c2", 666, InvoiceStatus::Pending)).unwrap();

        let cards = fetch_card_data(&conn).unwrap();
        assert_eq!(cards.number_of_invoices, 3);
        assert_eq!(cards.number_of_customers, 2);
        assert_eq!(cards.total_paid_invoices, "$10.00");
        assert_eq!(cards.total_pending_invoices, "$9.16");

        assert_eq!(fetch_latest_invoices(&conn).unwrap().len(), 3);

        let flagged = fetch_invoices_with_amount(&conn, 666).unwrap();
        assert_eq!(flagged, vec![InvoiceAmount { amount: 666, name: "Amy Burns".to_string() }]);
    }
}
