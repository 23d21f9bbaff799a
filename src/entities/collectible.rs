// 🪡 Collectible Entity - one shape, nine categories
//
// Every category (tools, weaver skills, needle upgrades, ...) is an
// identically-shaped table: id, name, status, notes, percentage.
// `Category` carries the per-table constants; the query functions below
// take the category and work on any of the nine tables.

use crate::db::new_id;
use crate::error::{DbError, DbResult};
use crate::pagination::{self, ITEMS_PER_PAGE};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

// ============================================================================
// CATEGORY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Tools,
    WeaverSkills,
    NeedleUpgrades,
    MaskShards,
    SilkSpools,
    SilkHearts,
    CraftingKitToolPouch,
    Crests,
    Abilities,
}

impl Category {
    /// All categories, in dashboard order
    pub const ALL: [Category; 9] = [
        Category::Tools,
        Category::WeaverSkills,
        Category::NeedleUpgrades,
        Category::MaskShards,
        Category::SilkSpools,
        Category::SilkHearts,
        Category::CraftingKitToolPouch,
        Category::Crests,
        Category::Abilities,
    ];

    /// SQL table name. Only ever one of these constants is interpolated into SQL.
    pub fn table(&self) -> &'static str {
        match self {
            Category::Tools => "tools",
            Category::WeaverSkills => "weaver_skills",
            Category::NeedleUpgrades => "needle_upgrades",
            Category::MaskShards => "mask_shards",
            Category::SilkSpools => "silk_spools",
            Category::SilkHearts => "silk_hearts",
            Category::CraftingKitToolPouch => "crafting_kit_tool_pouch",
            Category::Crests => "crests",
            Category::Abilities => "abilities",
        }
    }

    /// URL path segment under /dashboard
    pub fn slug(&self) -> &'static str {
        match self {
            Category::Tools => "tools",
            Category::WeaverSkills => "weaver-skills",
            Category::NeedleUpgrades => "needle-upgrades",
            Category::MaskShards => "mask-shards",
            Category::SilkSpools => "silk-spools",
            Category::SilkHearts => "silk-hearts",
            Category::CraftingKitToolPouch => "crafting-kit-tool-pouch",
            Category::Crests => "crests",
            Category::Abilities => "abilities",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Category> {
        Category::ALL.into_iter().find(|c| c.slug() == slug)
    }

    /// Plural display label
    pub fn label(&self) -> &'static str {
        match self {
            Category::Tools => "Tools",
            Category::WeaverSkills => "Weaver Skills",
            Category::NeedleUpgrades => "Needle Upgrades",
            Category::MaskShards => "Mask Shards",
            Category::SilkSpools => "Silk Spools",
            Category::SilkHearts => "Silk Hearts",
            Category::CraftingKitToolPouch => "Crafting Kit + Tool Pouch",
            Category::Crests => "Crests",
            Category::Abilities => "Abilities",
        }
    }

    /// Singular display label, used in form titles and messages
    pub fn singular(&self) -> &'static str {
        match self {
            Category::Tools => "Tool",
            Category::WeaverSkills => "Weaver Skill",
            Category::NeedleUpgrades => "Needle Upgrade",
            Category::MaskShards => "Mask Shard",
            Category::SilkSpools => "Silk Spool",
            Category::SilkHearts => "Silk Heart",
            Category::CraftingKitToolPouch => "Crafting Kit + Tool Pouch Item",
            Category::Crests => "Crest",
            Category::Abilities => "Ability",
        }
    }

    /// Percentage a new row gets when the form leaves it blank
    pub fn default_percentage(&self) -> f64 {
        match self {
            Category::MaskShards => 0.25,
            Category::SilkSpools => 0.5,
            _ => 1.0,
        }
    }

    /// Smallest accepted percentage. Shards and spools are fractional.
    pub fn min_percentage(&self) -> f64 {
        match self {
            Category::MaskShards | Category::SilkSpools => 0.01,
            _ => 1.0,
        }
    }

    /// Step for the percentage input
    pub fn percentage_step(&self) -> &'static str {
        match self {
            Category::MaskShards | Category::SilkSpools => "any",
            _ => "1",
        }
    }

    pub fn name_required_message(&self) -> &'static str {
        match self {
            Category::Tools => "Please enter a tool name.",
            Category::WeaverSkills => "Please enter a weaver skill name.",
            _ => "Name is required.",
        }
    }

    pub fn status_required_message(&self) -> &'static str {
        match self {
            Category::Tools => "Please select a tool status.",
            Category::WeaverSkills => "Please select a weaver skill status.",
            _ => "Please select a status.",
        }
    }

    /// List page path, also the prefix of every page for this category
    pub fn path(&self) -> String {
        format!("/dashboard/{}", self.slug())
    }

    fn lower_label(&self) -> String {
        self.label().to_lowercase()
    }

    fn lower_singular(&self) -> String {
        self.singular().to_lowercase()
    }
}

// ============================================================================
// STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CollectibleStatus {
    Pending,
    Collected,
}

impl CollectibleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectibleStatus::Pending => "pending",
            CollectibleStatus::Collected => "collected",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CollectibleStatus::Pending => "Pending",
            CollectibleStatus::Collected => "Collected",
        }
    }

    pub fn toggled(&self) -> CollectibleStatus {
        match self {
            CollectibleStatus::Pending => CollectibleStatus::Collected,
            CollectibleStatus::Collected => CollectibleStatus::Pending,
        }
    }
}

impl ToSql for CollectibleStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for CollectibleStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

// ============================================================================
// ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collectible {
    pub id: String,
    pub name: String,
    pub status: CollectibleStatus,
    pub notes: String,
    pub percentage: f64,
}

impl Collectible {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Collectible {
            id: row.get(0)?,
            name: row.get(1)?,
            status: row.get(2)?,
            notes: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            percentage: row.get(4)?,
        })
    }

    pub fn is_collected(&self) -> bool {
        self.status == CollectibleStatus::Collected
    }
}

/// Validated field values for an insert or update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCollectible {
    pub name: String,
    pub status: CollectibleStatus,
    pub notes: String,
    pub percentage: f64,
}

impl NewCollectible {
    pub fn new(name: &str, status: CollectibleStatus, percentage: f64) -> Self {
        NewCollectible {
            name: name.to_string(),
            status,
            notes: String::new(),
            percentage,
        }
    }

    pub fn with_notes(mut self, notes: &str) -> Self {
        self.notes = notes.to_string();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CollectibleCounts {
    pub collected: i64,
    pub total: i64,
}

impl CollectibleCounts {
    /// Share of rows collected, rounded to a whole percent (0 when empty)
    pub fn percentage(&self) -> u32 {
        if self.total <= 0 {
            0
        } else {
            ((self.collected as f64 / self.total as f64) * 100.0).round() as u32
        }
    }
}

/// Render a percentage without trailing zeros: 0.25 → "0.25", 87.0 → "87"
pub fn format_percentage(value: f64) -> String {
    let fixed = format!("{:.2}", value);
    fixed.trim_end_matches('0').trim_end_matches('.').to_string()
}

// ============================================================================
// READ SIDE
// ============================================================================

const COLUMNS: &str = "id, name, status, notes, percentage";

/// `?1` is the search text; an empty string matches every row
const SEARCH: &str = "contains_ci(name, ?1) OR contains_ci(notes, ?1) OR contains_ci(status, ?1)";

/// One page of rows whose name, notes or status contains `query`
pub fn fetch_filtered(
    conn: &Connection,
    category: Category,
    query: &str,
    page: i64,
) -> DbResult<Vec<Collectible>> {
    let action = format!("fetch {}", category.lower_label());
    let sql = format!(
        "SELECT {COLUMNS} FROM {table}
         WHERE {SEARCH}
         ORDER BY name ASC
         LIMIT ?2 OFFSET ?3",
        table = category.table(),
    );

    let mut stmt = conn.prepare(&sql).map_err(DbError::query(action.clone()))?;
    let rows = stmt
        .query_map(
            params![query, ITEMS_PER_PAGE, pagination::offset(page)],
            Collectible::from_row,
        )
        .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
        .map_err(DbError::query(action))?;

    Ok(rows)
}

/// Every row of a category, by name (terminal dashboard)
pub fn fetch_all(conn: &Connection, category: Category) -> DbResult<Vec<Collectible>> {
    let action = format!("fetch {}", category.lower_label());
    let sql = format!("SELECT {COLUMNS} FROM {} ORDER BY name ASC", category.table());

    let mut stmt = conn.prepare(&sql).map_err(DbError::query(action.clone()))?;
    let rows = stmt
        .query_map([], Collectible::from_row)
        .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
        .map_err(DbError::query(action))?;

    Ok(rows)
}

/// Number of rows matching `query`
pub fn count_filtered(conn: &Connection, category: Category, query: &str) -> DbResult<i64> {
    let sql = format!(
        "SELECT COUNT(*) FROM {table} WHERE {SEARCH}",
        table = category.table(),
    );

    conn.query_row(&sql, params![query], |row| row.get(0))
        .map_err(DbError::query(format!(
            "fetch total number of {}",
            category.lower_label()
        )))
}

/// Total list pages for `query`
pub fn fetch_pages(conn: &Connection, category: Category, query: &str) -> DbResult<i64> {
    count_filtered(conn, category, query).map(pagination::total_pages)
}

pub fn fetch_by_id(conn: &Connection, category: Category, id: &str) -> DbResult<Option<Collectible>> {
    let sql = format!("SELECT {COLUMNS} FROM {} WHERE id = ?1", category.table());

    conn.query_row(&sql, params![id], Collectible::from_row)
        .optional()
        .map_err(DbError::query(format!("fetch {}", category.lower_singular())))
}

/// Sum of `percentage` over collected rows (0 for an empty table)
pub fn collected_percentage(conn: &Connection, category: Category) -> DbResult<f64> {
    let sql = format!(
        "SELECT COALESCE(SUM(percentage), 0.0) FROM {} WHERE status = 'collected'",
        category.table()
    );

    conn.query_row(&sql, [], |row| row.get(0))
        .map_err(DbError::query(format!(
            "fetch collected {} percentage",
            category.lower_label()
        )))
}

pub fn counts(conn: &Connection, category: Category) -> DbResult<CollectibleCounts> {
    let sql = format!(
        "SELECT
            COALESCE(SUM(CASE WHEN status = 'collected' THEN 1 ELSE 0 END), 0),
            COUNT(*)
         FROM {}",
        category.table()
    );

    conn.query_row(&sql, [], |row| {
        Ok(CollectibleCounts {
            collected: row.get(0)?,
            total: row.get(1)?,
        })
    })
    .map_err(DbError::query(format!("fetch {} count", category.lower_label())))
}

// ============================================================================
// WRITE SIDE
// ============================================================================

/// Insert a row and return its new id
pub fn insert(conn: &Connection, category: Category, item: &NewCollectible) -> DbResult<String> {
    let id = new_id();
    let sql = format!(
        "INSERT INTO {} (id, name, status, notes, percentage) VALUES (?1, ?2, ?3, ?4, ?5)",
        category.table()
    );

    conn.execute(
        &sql,
        params![id, item.name, item.status, item.notes, item.percentage],
    )
    .map_err(DbError::query(format!("Create {}", category.singular())))?;

    tracing::debug!(table = category.table(), %id, "inserted collectible");
    Ok(id)
}

/// Update a row by id. Returns rows affected: 0 means the id does not exist.
pub fn update(
    conn: &Connection,
    category: Category,
    id: &str,
    item: &NewCollectible,
) -> DbResult<usize> {
    let sql = format!(
        "UPDATE {} SET name = ?1, status = ?2, notes = ?3, percentage = ?4 WHERE id = ?5",
        category.table()
    );

    let changed = conn
        .execute(
            &sql,
            params![item.name, item.status, item.notes, item.percentage, id],
        )
        .map_err(DbError::query(format!("Update {}", category.singular())))?;

    if changed == 0 {
        tracing::debug!(table = category.table(), %id, "update matched no rows");
    }
    Ok(changed)
}

pub fn set_status(
    conn: &Connection,
    category: Category,
    id: &str,
    status: CollectibleStatus,
) -> DbResult<usize> {
    let sql = format!("UPDATE {} SET status = ?1 WHERE id = ?2", category.table());

    conn.execute(&sql, params![status, id])
        .map_err(DbError::query(format!("Update {}", category.singular())))
}

/// Delete a row by id. Returns rows affected.
pub fn delete(conn: &Connection, category: Category, id: &str) -> DbResult<usize> {
    let sql = format!("DELETE FROM {} WHERE id = ?1", category.table());

    conn.execute(&sql, params![id])
        .map_err(DbError::query(format!("Delete {}", category.singular())))
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
        conn
    }

    fn add(conn: &Connection, category: Category, name: &str, status: CollectibleStatus, pct: f64) -> String {
        insert(conn, category, &NewCollectible::new(name, status, pct)).unwrap()
    }

    #[test]
    fn test_category_lookup() {
        for category in Category::ALL {
            assert_eq!(Category::from_slug(category.slug()), Some(category));
        }
        assert_eq!(Category::from_slug("invoices"), None);
        assert_eq!(Category::CraftingKitToolPouch.path(), "/dashboard/crafting-kit-tool-pouch");
        assert_eq!(Category::MaskShards.default_percentage(), 0.25);
        assert_eq!(Category::SilkSpools.min_percentage(), 0.01);
    }

    #[test]
    fn test_format_percentage() {
        assert_eq!(format_percentage(0.25), "0.25");
        assert_eq!(format_percentage(0.5), "0.5");
        assert_eq!(format_percentage(87.0), "87");
        assert_eq!(format_percentage(0.0), "0");
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("collected".parse::<CollectibleStatus>().unwrap(), CollectibleStatus::Collected);
        assert_eq!("pending".parse::<CollectibleStatus>().unwrap(), CollectibleStatus::Pending);
        assert!("paid".parse::<CollectibleStatus>().is_err());
        assert_eq!(CollectibleStatus::Pending.toggled(), CollectibleStatus::Collected);
    }

    #[test]
    fn test_insert_then_fetch() {
        let conn = test_conn();
        let item = NewCollectible::new("Brújula", CollectibleStatus::Collected, 1.0)
            .with_notes("Shop");
        let id = insert(&conn, Category::Tools, &item).unwrap();

        let fetched = fetch_by_id(&conn, Category::Tools, &id).unwrap().unwrap();
        assert_eq!(fetched.name, "Brújula");
        assert_eq!(fetched.notes, "Shop");
        assert_eq!(fetched.status, CollectibleStatus::Collected);
        assert!(fetched.is_collected());

        let listed = fetch_filtered(&conn, Category::Tools, "", 1).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, id);

        // Categories are independent tables
        assert!(fetch_by_id(&conn, Category::Crests, &id).unwrap().is_none());
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let conn = test_conn();
        add(&conn, Category::Tools, "Brújula", CollectibleStatus::Collected, 1.0);
        add(&conn, Category::Tools, "Campana protectora", CollectibleStatus::Pending, 1.0);

        let hits = fetch_filtered(&conn, Category::Tools, "BRÚJ", 1).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Brújula");

        // Status column is searched too
        let pending = fetch_filtered(&conn, Category::Tools, "PEND", 1).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].name, "Campana protectora");

        assert_eq!(count_filtered(&conn, Category::Tools, "zzz").unwrap(), 0);
    }

    #[test]
    fn test_list_orders_by_name_and_paginates() {
        let conn = test_conn();
        for i in (1..=13).rev() {
            add(&conn, Category::MaskShards, &format!("Shard {:02}", i), CollectibleStatus::Pending, 0.25);
        }

        let first = fetch_filtered(&conn, Category::MaskShards, "", 1).unwrap();
        assert_eq!(first.len(), 6);
        assert_eq!(first[0].name, "Shard 01");

        let third = fetch_filtered(&conn, Category::MaskShards, "", 3).unwrap();
        assert_eq!(third.len(), 1);
        assert_eq!(third[0].name, "Shard 13");

        assert_eq!(fetch_pages(&conn, Category::MaskShards, "").unwrap(), 3);
        assert_eq!(fetch_pages(&conn, Category::MaskShards, "shard 1").unwrap(), 1);
    }

    #[test]
    fn test_update_existing_and_missing() {
        let conn = test_conn();
        let id = add(&conn, Category::Crests, "Blason de Parca", CollectibleStatus::Pending, 1.0);

        let changed = update(
            &conn,
            Category::Crests,
            &id,
            &NewCollectible::new("Blason de Bestia", CollectibleStatus::Collected, 2.0),
        )
        .unwrap();
        assert_eq!(changed, 1);

        let fetched = fetch_by_id(&conn, Category::Crests, &id).unwrap().unwrap();
        assert_eq!(fetched.name, "Blason de Bestia");
        assert_eq!(fetched.percentage, 2.0);

        let missing = update(
            &conn,
            Category::Crests,
            "does-not-exist",
            &NewCollectible::new("Ghost", CollectibleStatus::Pending, 1.0),
        )
        .unwrap();
        assert_eq!(missing, 0);
        assert_eq!(count_filtered(&conn, Category::Crests, "").unwrap(), 1);
    }

    #[test]
    fn test_delete_removes_exactly_one_row() {
        let conn = test_conn();
        let keep = add(&conn, Category::Abilities, "Paso Agil", CollectibleStatus::Collected, 1.0);
        let gone = add(&conn, Category::Abilities, "Silfonia", CollectibleStatus::Pending, 1.0);

        assert_eq!(delete(&conn, Category::Abilities, &gone).unwrap(), 1);
        assert_eq!(delete(&conn, Category::Abilities, &gone).unwrap(), 0);

        assert!(fetch_by_id(&conn, Category::Abilities, &gone).unwrap().is_none());
        assert!(fetch_by_id(&conn, Category::Abilities, &keep).unwrap().is_some());
    }

    #[test]
    fn test_collected_percentage_and_counts() {
        let conn = test_conn();
        assert_eq!(collected_percentage(&conn, Category::SilkSpools).unwrap(), 0.0);
        assert_eq!(counts(&conn, Category::SilkSpools).unwrap(), CollectibleCounts::default());

        add(&conn, Category::SilkSpools, "Spool 1", CollectibleStatus::Collected, 0.5);
        add(&conn, Category::SilkSpools, "Spool 2", CollectibleStatus::Collected, 0.5);
        add(&conn, Category::SilkSpools, "Spool 3", CollectibleStatus::Pending, 0.5);

        assert_eq!(collected_percentage(&conn, Category::SilkSpools).unwrap(), 1.0);

        let c = counts(&conn, Category::SilkSpools).unwrap();
        assert_eq!(c.collected, 2);
        assert_eq!(c.total, 3);
        assert_eq!(c.percentage(), 67);
    }

    #[test]
    fn test_set_status() {
        let conn = test_conn();
        let id = add(&conn, Category::SilkHearts, "Corazon", CollectibleStatus::Pending, 1.0);

        set_status(&conn, Category::SilkHearts, &id, CollectibleStatus::Collected).unwrap();
        assert_eq!(collected_percentage(&conn, Category::SilkHearts).unwrap(), 1.0);
    }
}
