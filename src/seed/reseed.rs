use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;

use crate::config::SeedSettings;
use crate::model::{ReseedOptions, ReseedOutcome, SeedTable};
use crate::seed::dates::{self, DateShifter};
use crate::seed::delta::resolve_delta_days;
use crate::seed::error::SeedError;
use crate::seed::fixtures::FixtureSet;
use crate::seed::rebalance::rebalance_project_dates;
use crate::store::traits::SeedStore;

/// Wipe the store and rebuild it from the fixture directory.
///
/// Not safe to run concurrently against the same store; callers serialize.
pub async fn reseed<S>(
    store: &S,
    settings: &SeedSettings,
    options: &ReseedOptions,
) -> Result<ReseedOutcome, SeedError>
where
    S: SeedStore + ?Sized,
{
    let mut rng = StdRng::from_entropy();
    reseed_at(store, settings, options, dates::today(), &mut rng).await
}

/// [`reseed`] with the calendar date and random source supplied by the caller.
pub async fn reseed_at<S, R>(
    store: &S,
    settings: &SeedSettings,
    options: &ReseedOptions,
    today: NaiveDate,
    rng: &mut R,
) -> Result<ReseedOutcome, SeedError>
where
    S: SeedStore + ?Sized,
    R: Rng + Send + ?Sized,
{
    let seed_dir: PathBuf = options
        .seed_dir
        .clone()
        .unwrap_or_else(|| settings.seed_dir.clone());

    // Read and transform everything up front so a bad fixture or an
    // unusable offset leaves the store untouched
    let mut fixtures = FixtureSet::load(&seed_dir).await?;
    log::info!(
        "Loaded {} fixture rows from {}",
        fixtures.total_rows(),
        seed_dir.display()
    );

    let delta_days = resolve_delta_days(
        options.delta_days,
        options.anchor_days_ago.or(Some(settings.anchor_days_ago)),
        today,
        fixtures.dated_rows(),
    )?;
    if options.delta_days.is_none() {
        log::info!("Inferred date shift of {} days", delta_days);
    }

    let shifter = DateShifter::new(delta_days);
    for table in SeedTable::ALL.into_iter().filter(SeedTable::is_date_shifted) {
        let shifted = shifter.shift_records(fixtures.rows(table))?;
        fixtures.set_rows(table, shifted);
    }

    let projects = rebalance_project_dates(
        fixtures.rows(SeedTable::Project),
        settings.done_ratio,
        today,
        rng,
    );
    fixtures.set_rows(SeedTable::Project, projects);

    store
        .truncate_all(&SeedTable::ALL)
        .await
        .map_err(SeedError::Truncate)?;
    log::info!("Truncated {} tables", SeedTable::ALL.len());

    let mut inserted = Vec::with_capacity(SeedTable::ALL.len());
    for table in SeedTable::ALL {
        let rows = fixtures.rows(table);
        for row in rows {
            store
                .insert_record(table, row)
                .await
                .map_err(|cause| SeedError::Insert { table, cause })?;
        }
        store
            .sync_identity(table)
            .await
            .map_err(|cause| SeedError::Insert { table, cause })?;

        log::debug!("Seeded {} rows into {}", rows.len(), table);
        inserted.push((table, rows.len()));
    }

    let outcome = ReseedOutcome {
        delta_days,
        inserted,
    };
    log::info!(
        "Reseed complete: {} rows, dates shifted by {} days",
        outcome.total_inserted(),
        delta_days
    );
    Ok(outcome)
}
