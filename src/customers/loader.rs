//! CSV ingestion for customer uploads.

use std::path::Path;

use crate::error::InputError;

use super::profile::CustomerProfile;

/// Parse customers from CSV bytes with a header row.
///
/// Surrounding whitespace is trimmed from every cell. Empty uploads and
/// uploads with a header but no rows are rejected.
pub fn parse_customers(data: &[u8]) -> Result<Vec<CustomerProfile>, InputError> {
    if data.iter().all(u8::is_ascii_whitespace) {
        return Err(InputError::EmptyUpload);
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(data);

    let mut customers = Vec::new();
    for result in reader.deserialize::<CustomerProfile>() {
        let customer = result.map_err(|e| InputError::InvalidCsv {
            record: e.position().map(|p| p.record()).unwrap_or(0),
            reason: e.to_string(),
        })?;
        customers.push(customer);
    }

    if customers.is_empty() {
        return Err(InputError::NoCustomers);
    }

    tracing::debug!(count = customers.len(), "Parsed customer CSV");
    Ok(customers)
}

/// Read and parse a customer CSV file.
pub async fn load_customers(path: &Path) -> Result<Vec<CustomerProfile>, InputError> {
    let data = tokio::fs::read(path)
        .await
        .map_err(|source| InputError::UnreadableDocument {
            path: path.to_path_buf(),
            source,
        })?;
    parse_customers(&data)
}
