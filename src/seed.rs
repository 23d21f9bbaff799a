// 🌱 Seeding - sample data for every table, applied in one transaction
//
// Demo tables (users, customers, invoices, revenue) use fixed ids and
// INSERT OR IGNORE, so reseeding never duplicates them. Collectible tables
// are dropped and recreated, so reseeding resets them to the sample state.

use crate::db::{count_rows, create_collectible_table};
use crate::entities::collectible::{self, Category, CollectibleStatus, NewCollectible};
use crate::entities::customer::{insert_customer, Customer};
use crate::entities::user::{hash_password, insert_user, User};
use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use serde::Serialize;

// ============================================================================
// DEMO DATA
// ============================================================================

pub const DEFAULT_USER_EMAIL: &str = "user@nextmail.com";
pub const DEFAULT_USER_PASSWORD: &str = "123456";
const DEFAULT_USER_ID: &str = "410544b2-4001-4271-9855-fec4b6a6442a";

/// (id, name, email, image_url)
const CUSTOMERS: [(&str, &str, &str, &str); 6] = [
    ("d6e15727-9fe1-4961-8c5b-ea44a9bd81aa", "Evil Rabbit", "evil@rabbit.com", "/customers/evil-rabbit.png"),
    ("3958dc9e-712f-4377-85e9-fec4b6a6442a", "Delba de Oliveira", "delba@oliveira.com", "/customers/delba-de-oliveira.png"),
    ("3958dc9e-742f-4377-85e9-fec4b6a6442a", "Lee Robinson", "lee@robinson.com", "/customers/lee-robinson.png"),
    ("76d65c26-f784-44a2-ac19-586678f7c2f2", "Michael Novotny", "michael@novotny.com", "/customers/michael-novotny.png"),
    ("CC27C14A-0ACF-4F4A-A6C9-D45682C144B9", "Amy Burns", "amy@burns.com", "/customers/amy-burns.png"),
    ("13D07535-C59E-4157-A011-F8D2EF4E0CBB", "Balazs Orban", "balazs@orban.com", "/customers/balazs-orban.png"),
];

/// (customer index, amount in cents, status, date)
const INVOICES: [(usize, i64, &str, &str); 13] = [
    (0, 15795, "pending", "2022-12-06"),
    (1, 20348, "pending", "2022-11-14"),
    (4, 3040, "paid", "2022-10-29"),
    (3, 44800, "paid", "2023-09-10"),
    (5, 34577, "pending", "2023-08-05"),
    (2, 54246, "pending", "2023-07-16"),
    (0, 666, "pending", "2023-06-27"),
    (3, 32545, "paid", "2023-06-09"),
    (4, 1250, "paid", "2023-06-17"),
    (5, 8546, "paid", "2023-06-07"),
    (1, 500, "paid", "2023-08-19"),
    (5, 8945, "paid", "2023-06-03"),
    (2, 1000, "paid", "2022-06-05"),
];

const REVENUE: [(&str, i64); 12] = [
    ("Jan", 2000),
    ("Feb", 1800),
    ("Mar", 2200),
    ("Apr", 2500),
    ("May", 2300),
    ("Jun", 3200),
    ("Jul", 3500),
    ("Aug", 3700),
    ("Sep", 2500),
    ("Oct", 2800),
    ("Nov", 3000),
    ("Dec", 4800),
];

// ============================================================================
// COLLECTIBLE SAMPLES
// ============================================================================

/// Tool names; entries with notes are still pending, the note says where to find them
const TOOLS: [(&str, &str); 51] = [
    ("Broche de magnetita", ""),
    ("Colgante fragmentador", ""),
    ("Brújula", ""),
    ("Ojo del druida", ""),
    ("Alfiler recto", ""),
    ("Campana protectora", ""),
    ("Aguijón cortante", ""),
    ("Campana magmática", ""),
    ("Cinturón lastrado", ""),
    ("Garracurva", ""),
    ("Máscara fracturada", ""),
    ("Alfiler triple", ""),
    ("Brebaje pulgoso", ""),
    ("Alfiler largo", ""),
    ("Bolsa pólipo", ""),
    ("Alfimohada", ""),
    ("Multiuso", ""),
    ("Tejeluz", ""),
    ("Tobilleras rapisedeñas", ""),
    ("Bolsa de bicho muerto / Saquito de coraza", ""),
    ("Ampolla con aguja / Ampolla de plasmio", ""),
    ("Dados de magnetita", ""),
    ("Taladro de excavador", ""),
    ("Agarre del ascendente", ""),
    ("Extensor de carrete", ""),
    ("Cilicio", ""),
    ("Tachuelas", ""),
    ("Garra espejo / Espejo oscuro", ""),
    ("Rueda mecánica", ""),
    ("Anillo de dientes de sierra", ""),
    ("Brazada de desliz", ""),
    ("Piedra de pedernal", ""),
    ("Banda inyectora", ""),
    ("Cristal de memoria", ""),
    ("Herramienta estropeada (Honda sedeña)", ""),
    ("Honda veloz", ""),
    ("Mosca mecánica", ""),
    ("Marca de ladrón", ""),
    ("Pico hurgón", ""),
    ("Cortaconcha", "Moscarola Furiosa (Arenas de Karak)"),
    ("Cañón de rosarios", ""),
    ("Recipientes voltaicos", ""),
    ("Cuerdas arácnidas", ""),
    ("Corona de pureza", ""),
    ("Anillo arrojadizo", ""),
    ("Garralarga", ""),
    ("Huevo de Pulgalia", ""),
    ("Reserva sedeña", "Segundo Centinela (Altos Salones)"),
    ("Filamento voltaico", "Voltvyrm (Arenas de Karak)"),
    ("Farol de fuego fatuo", "Padre de la Llama (Espesura Fatua)"),
    ("Placa de alfiler", "Alfilera (Monte Fay - Acto 3)"),
];

const WEAVER_SKILLS: [(&str, bool); 6] = [
    ("Lanza sedeña", true),
    ("Tormenta de Hilos", true),
    ("Punto de Cruz", true),
    ("Dardo Veloz", true),
    ("Furia rúnica", false),
    ("Uñas pálidas", false),
];

const NEEDLE_UPGRADES: [(&str, bool); 4] = [
    ("Eliminar Maldicion", true),
    ("Aceite Palido 1", true),
    ("Aceite Palido 2", true),
    ("Aceite Palido 3", false),
];

const CRESTS: [(&str, bool); 6] = [
    ("Blason de Parca", true),
    ("Blason de Bestia", true),
    ("Blason del Errante", true),
    ("Blason de Arquitecta", true),
    ("Blason de la Bruja", true),
    ("Blason de la Chamana", false),
];

const ABILITIES: [(&str, bool); 8] = [
    ("Paso Agil", true),
    ("Agarre de Pinza", true),
    ("Agujolin", true),
    ("Golpe Concentrado", true),
    ("Garra elongada", true),
    ("Vuelo sedeño", false),
    ("Silfonia", false),
    ("Siempreviva", false),
];

fn status(collected: bool) -> CollectibleStatus {
    if collected {
        CollectibleStatus::Collected
    } else {
        CollectibleStatus::Pending
    }
}

fn named(list: &[(&str, bool)], percentage: f64) -> Vec<NewCollectible> {
    list.iter()
        .map(|(name, collected)| NewCollectible::new(name, status(*collected), percentage))
        .collect()
}

fn numbered(prefix: &str, count: usize, percentage: f64, pending_from: Option<usize>) -> Vec<NewCollectible> {
    (1..=count)
        .map(|i| {
            let collected = pending_from.map_or(true, |from| i < from);
            NewCollectible::new(&format!("{} {}", prefix, i), status(collected), percentage)
        })
        .collect()
}

/// Sample rows for one category
pub fn sample_items(category: Category) -> Vec<NewCollectible> {
    let pct = category.default_percentage();
    match category {
        Category::Tools => TOOLS
            .iter()
            .map(|(name, notes)| NewCollectible::new(name, status(notes.is_empty()), pct).with_notes(notes))
            .collect(),
        Category::WeaverSkills => named(&WEAVER_SKILLS, pct),
        Category::NeedleUpgrades => named(&NEEDLE_UPGRADES, pct),
        Category::MaskShards => numbered("Fragmento de Mascara", 20, pct, Some(17)),
        Category::SilkSpools => numbered("Fragmento de Carrete", 18, pct, None),
        Category::SilkHearts => numbered("Corazon de Seda", 3, pct, None),
        Category::CraftingKitToolPouch => {
            let mut items = numbered("Mejora de Kit de Fabricacion", 4, pct, None);
            items.extend(numbered("Mejora de Bolsa de Herramientas", 4, pct, None));
            items
        }
        Category::Crests => named(&CRESTS, pct),
        Category::Abilities => named(&ABILITIES, pct),
    }
}

// ============================================================================
// SEEDING
// ============================================================================

/// Row counts after a seed run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeedReport {
    pub users: i64,
    pub customers: i64,
    pub invoices: i64,
    pub revenue: i64,
    pub collectibles: Vec<(Category, i64)>,
}

impl SeedReport {
    pub fn collectible_rows(&self) -> i64 {
        self.collectibles.iter().map(|(_, count)| count).sum()
    }
}

fn invoice_id(index: usize) -> String {
    format!("00000000-0000-4000-8000-{:012}", index + 1)
}

/// Seed every table. All of it commits, or none of it does.
pub fn seed_database(conn: &mut Connection) -> Result<SeedReport> {
    let tx = conn.transaction().context("Failed to begin seed transaction")?;

    insert_user(
        &tx,
        &User {
            id: DEFAULT_USER_ID.to_string(),
            name: "User".to_string(),
            email: DEFAULT_USER_EMAIL.to_string(),
            password: hash_password(DEFAULT_USER_PASSWORD).context("Failed to hash default password")?,
        },
    )?;

    for (id, name, email, image_url) in CUSTOMERS {
        insert_customer(
            &tx,
            &Customer {
                id: id.to_string(),
                name: name.to_string(),
                email: email.to_string(),
                image_url: image_url.to_string(),
            },
        )?;
    }

    for (index, (customer, amount, status, date)) in INVOICES.iter().enumerate() {
        tx.execute(
            "INSERT OR IGNORE INTO invoices (id, customer_id, amount, status, date) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![invoice_id(index), CUSTOMERS[*customer].0, amount, status, date],
        )
        .context("Failed to seed invoices")?;
    }

    for (month, revenue) in REVENUE {
        tx.execute(
            "INSERT OR IGNORE INTO revenue (month, revenue) VALUES (?1, ?2)",
            params![month, revenue],
        )
        .context("Failed to seed revenue")?;
    }

    let mut collectibles = Vec::with_capacity(Category::ALL.len());
    for category in Category::ALL {
        tx.execute(&format!("DROP TABLE IF EXISTS {}", category.table()), [])
            .with_context(|| format!("Failed to drop {}", category.table()))?;
        create_collectible_table(&tx, category)
            .with_context(|| format!("Failed to create {}", category.table()))?;

        for item in sample_items(category) {
            collectible::insert(&tx, category, &item)?;
        }

        collectibles.push((category, count_rows(&tx, category.table())?));
    }

    let report = SeedReport {
        users: count_rows(&tx, "users")?,
        customers: count_rows(&tx, "customers")?,
        invoices: count_rows(&tx, "invoices")?,
        revenue: count_rows(&tx, "revenue")?,
        collectibles,
    };

    tx.commit().context("Failed to commit seed transaction")?;

    tracing::info!(
        collectibles = report.collectible_rows(),
        invoices = report.invoices,
        "database seeded"
    );
    Ok(report)
}
