// 📊 Progress - per-category counts and the overall completion figure

use crate::entities::collectible::{self, Category, CollectibleCounts};
use crate::error::DbResult;
use rusqlite::Connection;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CategoryProgress {
    pub category: Category,
    pub counts: CollectibleCounts,
    /// Sum of `percentage` over collected rows
    pub collected_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSummary {
    pub categories: Vec<CategoryProgress>,
}

impl ProgressSummary {
    /// Overall completion: the nine collected percentages added together
    pub fn total_percentage(&self) -> f64 {
        self.categories.iter().map(|c| c.collected_percentage).sum()
    }

    /// Width of the overview progress bar, in percent
    pub fn bar_width(&self) -> f64 {
        self.total_percentage().clamp(0.0, 100.0)
    }

    pub fn get(&self, category: Category) -> Option<&CategoryProgress> {
        self.categories.iter().find(|c| c.category == category)
    }
}

/// Every aggregate the overview needs, read on one connection
pub fn fetch_progress(conn: &Connection) -> DbResult<ProgressSummary> {
    let categories = Category::ALL
        .into_iter()
        .map(|category| {
            Ok(CategoryProgress {
                category,
                counts: collectible::counts(conn, category)?,
                collected_percentage: collectible::collected_percentage(conn, category)?,
            })
        })
        .collect::<DbResult<Vec<_>>>()?;

    Ok(ProgressSummary { categories })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::setup_database;
    use crate::entities::{CollectibleStatus, NewCollectible};

    #[test]
    fn test_empty_database_is_zero() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        let summary = fetch_progress(&conn).unwrap();
        assert_eq!(summary.categories.len(), 9);
        assert_eq!(summary.total_percentage(), 0.0);
        assert!(summary.categories.iter().all(|c| c.counts.percentage() == 0));
    }

    #[test]
    fn test_total_sums_collected_percentages() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        collectible::insert(&conn, Category::Tools, &NewCollectible::new("Pin", CollectibleStatus::Collected, 1.0)).unwrap();
        collectible::insert(&conn, Category::Tools, &NewCollectible::new("Hook", CollectibleStatus::Pending, 1.0)).unwrap();
        collectible::insert(&conn, Category::MaskShards, &NewCollectible::new("Shard", CollectibleStatus::Collected, 0.25)).unwrap();

        let summary = fetch_progress(&conn).unwrap();
        assert_eq!(summary.total_percentage(), 1.25);

        let tools = summary.get(Category::Tools).unwrap();
        assert_eq!(tools.counts, CollectibleCounts { collected: 1, total: 2 });
        assert_eq!(tools.counts.percentage(), 50);
    }

    #[test]
    fn test_bar_width_caps_at_100() {
        let summary = ProgressSummary {
            categories: vec![CategoryProgress {
                category: Category::Tools,
                counts: CollectibleCounts::default(),
                collected_percentage: 140.0,
            }],
        };
        assert_eq!(summary.bar_width(), 100.0);
    }
}
