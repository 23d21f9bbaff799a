// 👤 Customer Entity - lookups for invoice forms and the customers table

use crate::entities::invoice::format_currency;
use crate::error::{DbError, DbResult};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub email: String,
    pub image_url: String,
}

/// Option for the customer select box
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerField {
    pub id: String,
    pub name: String,
}

/// Customer with invoice totals, amounts already formatted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomersTableRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub image_url: String,
    pub total_invoices: i64,
    pub total_pending: String,
    pub total_paid: String,
}

pub fn fetch_customers(conn: &Connection) -> DbResult<Vec<CustomerField>> {
    let action = "fetch all customers";
    let mut stmt = conn
        .prepare("SELECT id, name FROM customers ORDER BY name ASC")
        .map_err(DbError::query(action))?;

    let customers = stmt
        .query_map([], |row| {
            Ok(CustomerField {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })
        .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
        .map_err(DbError::query(action))?;

    Ok(customers)
}

/// Customers whose name or email contains `query`, with per-customer totals
pub fn fetch_filtered_customers(conn: &Connection, query: &str) -> DbResult<Vec<CustomersTableRow>> {
    let action = "fetch customer table";
    let mut stmt = conn
        .prepare(
            "SELECT
                customers.id,
                customers.name,
                customers.email,
                customers.image_url,
                COUNT(invoices.id) AS total_invoices,
                COALESCE(SUM(CASE WHEN invoices.status = 'pending' THEN invoices.amount ELSE 0 END), 0) AS total_pending,
                COALESCE(SUM(CASE WHEN invoices.status = 'paid' THEN invoices.amount ELSE 0 END), 0) AS total_paid
             FROM customers
             LEFT JOIN invoices ON customers.id = invoices.customer_id
             WHERE contains_ci(customers.name, ?1) OR contains_ci(customers.email, ?1)
             GROUP BY customers.id, customers.name, customers.email, customers.image_url
             ORDER BY customers.name ASC",
        )
        .map_err(DbError::query(action))?;

    let customers = stmt
        .query_map(params![query], |row| {
            let pending: i64 = row.get(5)?;
            let paid: i64 = row.get(6)?;
            Ok(CustomersTableRow {
                id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
                image_url: row.get(3)?,
                total_invoices: row.get(4)?,
                total_pending: format_currency(pending),
                total_paid: format_currency(paid),
            })
        })
        .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
        .map_err(DbError::query(action))?;

    Ok(customers)
}

pub fn insert_customer(conn: &Connection, customer: &Customer) -> DbResult<()> {
    conn.execute(
        "INSERT OR IGNORE INTO customers (id, name, email, image_url) VALUES (?1, ?2, ?3, ?4)",
        params![customer.id, customer.name, customer.email, customer.image_url],
    )
    .map_err(DbError::query("Create Customer"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::setup_database;

    fn customer(id: &str, name: &str, email: &str) -> Customer {
        Customer {
            id: id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            image_url: format!("/customers/{}.png", id),
        }
    }

    #[test]
    fn test_fetch_customers_sorted() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        insert_customer(&conn, &customer("b", "Lee Robinson", "lee@robinson.com")).unwrap();
        insert_customer(&conn, &customer("a", "Amy Burns", "amy@burns.com")).unwrap();
        // Duplicate ids are ignored
        insert_customer(&conn, &customer("a", "Someone Else", "x@y.z")).unwrap();

        let names: Vec<String> = fetch_customers(&conn).unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Amy Burns", "Lee Robinson"]);
    }

    #[test]
    fn test_filtered_customers_totals() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        insert_customer(&conn, &customer("a", "Amy Burns", "amy@burns.com")).unwrap();
        insert_customer(&conn, &customer("b", "Lee Robinson", "lee@robinson.com")).unwrap();
        conn.execute(
            "INSERT INTO invoices (id, customer_id, amount, status, date) VALUES
                ('i1', 'a', 1250, 'paid', '2023-06-17'),
                ('i2', 'a', 3040, 'pending', '2022-10-29')",
            [],
        )
        .unwrap();

        let all = fetch_filtered_customers(&conn, "").unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "Amy Burns");
        assert_eq!(all[0].total_invoices, 2);
        assert_eq!(all[0].total_paid, "$12.50");
        assert_eq!(all[0].total_pending, "$30.40");
        assert_eq!(all[1].total_invoices, 0);
        assert_eq!(all[1].total_paid, "$0.00");

        let lee = fetch_filtered_customers(&conn, "ROBINSON").unwrap();
        assert_eq!(lee.len(), 1);
    }
}
