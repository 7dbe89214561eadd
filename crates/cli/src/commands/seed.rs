//! Catalog seeding command.
//!
//! Inserts a small demo catalog so a fresh install has something to show.
//! Refuses to run against a non-empty catalog unless `--force` is given.

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::info;

use pitstop_storefront::db::{PartRepository, RepositoryError};
use pitstop_storefront::models::part::PartInput;

use super::ConnectError;

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// The catalog already has parts and `--force` was not given.
    #[error("catalog already has {0} parts; re-run with --force to seed anyway")]
    NotEmpty(i64),

    /// Database error while inserting.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// One demo part: name, category, brand, price in forints, description.
type DemoPart = (&'static str, &'static str, &'static str, i64, &'static str);

const DEMO_PARTS: &[DemoPart] = &[
    (
        "Fékbetét készlet, első",
        "Fékrendszer",
        "Brembo",
        12_990,
        "Első tengelyre való fékbetét készlet kopásjelzővel, 4 darab betéttel.",
    ),
    (
        "Fékbetét készlet, hátsó",
        "Fékrendszer",
        "Bosch",
        9_490,
        "Hátsó tengelyre való fékbetét készlet, 4 darab betéttel.",
    ),
    (
        "Féktárcsa, szellőztetett",
        "Fékrendszer",
        "Brembo",
        18_500,
        "Szellőztetett első féktárcsa, 280 mm átmérő. Az ár darabra értendő.",
    ),
    (
        "Olajszűrő",
        "Szűrők",
        "Mann-Filter",
        2_490,
        "Rácsavarható olajszűrő benzines és dízel motorokhoz.",
    ),
    (
        "Levegőszűrő",
        "Szűrők",
        "Mann-Filter",
        3_290,
        "Panel levegőszűrő. Cseréje 30 000 km-enként ajánlott.",
    ),
    (
        "Pollenszűrő, aktívszenes",
        "Szűrők",
        "Bosch",
        4_190,
        "Aktívszenes utastérszűrő, kiszűri a pollent és a kellemetlen szagokat.",
    ),
    (
        "Gyújtógyertya, iridium",
        "Gyújtás",
        "NGK",
        3_990,
        "Iridium elektródás gyújtógyertya hosszú élettartammal. Az ár darabra értendő.",
    ),
    (
        "Akkumulátor 12V 60Ah",
        "Elektromos",
        "Varta",
        32_900,
        "Gondozásmentes indító akkumulátor, 540 A hidegindító árammal.",
    ),
    (
        "Ablaktörlő lapát készlet",
        "Karosszéria",
        "Valeo",
        7_490,
        "Keret nélküli első ablaktörlő pár, 600/450 mm.",
    ),
    (
        "Lengéscsillapító, első",
        "Futómű",
        "Sachs",
        24_500,
        "Gázos első lengéscsillapító. Párban történő cseréje ajánlott.",
    ),
    (
        "Vezérműszíj készlet vízpumpával",
        "Motor",
        "Continental",
        45_900,
        "Komplett vezérléskészlet: szíj, feszítő, vezetőgörgők és vízpumpa.",
    ),
    (
        "Motorolaj 5W-30, 4 liter",
        "Kenőanyagok",
        "Castrol",
        15_990,
        "Teljesen szintetikus motorolaj hosszú szervizintervallumhoz.",
    ),
];

/// Insert the demo catalog.
///
/// # Errors
///
/// Returns [`SeedError::NotEmpty`] if the catalog already has parts and
/// `force` is false, or a database error if an insert fails.
pub async fn run(force: bool) -> Result<(), SeedError> {
    let pool = super::connect().await?;
    let parts = PartRepository::new(&pool);

    let existing = parts.count().await?;
    if existing > 0 && !force {
        return Err(SeedError::NotEmpty(existing));
    }

    for (name, category, brand, price, description) in DEMO_PARTS {
        let part = parts
            .create(&PartInput {
                name: (*name).to_owned(),
                category: (*category).to_owned(),
                brand: (*brand).to_owned(),
                price: Decimal::new(*price, 0),
                description: Some((*description).to_owned()),
                image_url: None,
            })
            .await?;
        info!(part = %part.name, id = %part.id, "Seeded part");
    }

    info!(count = DEMO_PARTS.len(), "Catalog seeded");
    Ok(())
}
