//! Paginated extractor for the raw FIPE table.
//!
//! Reads all rows for one vehicle type in fixed-size pages until a
//! short or empty page signals end-of-data. The store caps row counts
//! per request, so a single unpaged read would silently truncate.

use tracing::debug;

use crate::error::ExtractionError;
use crate::models::{RawVehicleRow, VehicleType};
use crate::store::CatalogStore;

/// Read the complete raw-row set for `vehicle_type`.
///
/// Any page failure aborts the whole extraction with an
/// [`ExtractionError`]; pages read so far are discarded. The operation
/// is read-only and safe to retry from scratch.
pub async fn extract_raw_rows(
    store: &dyn CatalogStore,
    vehicle_type: VehicleType,
    page_size: usize,
) -> Result<Vec<RawVehicleRow>, ExtractionError> {
    let mut rows = Vec::new();
    let mut page = 0;

    loop {
        let batch = store
            .fetch_raw_page(vehicle_type, page, page_size)
            .await
            .map_err(|source| ExtractionError {
                vehicle_type,
                page,
                source,
            })?;

        if batch.is_empty() {
            break;
        }

        let short_page = batch.len() < page_size;
        rows.extend(batch);
        debug!(
            vehicle_type = %vehicle_type,
            page,
            total = rows.len(),
            "fetched raw page"
        );

        if short_page {
            break;
        }
        page += 1;
    }

    Ok(rows)
}
