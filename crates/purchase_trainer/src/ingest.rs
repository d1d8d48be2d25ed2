//! CSV event log loading
//!
//! Expects a header row naming the event columns (`event_time`,
//! `event_type`, `product_id`, `category_id`, `category_code`, `brand`,
//! `price`, `user_id`, `user_session`). Text columns may be empty or absent.

use purchase_core::RawEvent;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use crate::errors::TrainerError;

/// Load events from a CSV file, stopping after `limit` rows when given
pub fn load_events<P: AsRef<Path>>(
    path: P,
    limit: Option<usize>,
) -> Result<Vec<RawEvent>, TrainerError> {
    let path = path.as_ref();
    info!("Loading events from: {}", path.display());

    let events = read_events(File::open(path)?, limit)?;
    if events.is_empty() {
        return Err(TrainerError::NoEvents(path.display().to_string()));
    }
    Ok(events)
}

/// Read events from any CSV source. Rows are numbered from 1, excluding the header.
pub fn read_events<R: Read>(source: R, limit: Option<usize>) -> Result<Vec<RawEvent>, TrainerError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let limit = limit.unwrap_or(usize::MAX);
    let mut events = Vec::new();

    for (idx, record) in reader.deserialize::<RawEvent>().enumerate() {
        if idx >= limit {
            debug!(limit, "Row limit reached");
            break;
        }
        let event = record.map_err(|err| TrainerError::Ingest {
            row: idx + 1,
            reason: err.to_string(),
        })?;
        events.push(event);
    }

    let purchases = events.iter().filter(|e| e.is_purchase()).count();
    info!("Loaded {} events ({} purchases)", events.len(), purchases);

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "event_time,event_type,product_id,category_id,category_code,brand,price,user_id,user_session";

    #[test]
    fn test_read_events() {
        let data = format!(
            "{HEADER}\n\
             2019-10-01 00:00:00 UTC,view,44600062,2103807459595387724,,shiseido,35.79,541312140,72d76fde\n\
             2019-10-01 00:00:01 UTC,purchase,3900821,2053013552326770905,appliances.water_heater,aqua,33.20,554748717,9333dfbd\n"
        );

        let events = read_events(data.as_bytes(), None).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].category_id, 2103807459595387724);
        assert_eq!(events[0].category_code, "");
        assert!(!events[0].is_purchase());
        assert!(events[1].is_purchase());
        assert_eq!(events[1].price, 33.20);
    }

    #[test]
    fn test_row_limit() {
        let mut data = format!("{HEADER}\n");
        for i in 0..10 {
            data.push_str(&format!("t,view,{i},1,,,1.0,{i},s\n"));
        }

        let events = read_events(data.as_bytes(), Some(3)).unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[2].product_id, 2);
    }

    #[test]
    fn test_bad_row_reports_row_number() {
        let data = format!("{HEADER}\nt,view,1,1,,,1.0,1,s\nt,view,2,1,,,not-a-price,2,s\n");

        match read_events(data.as_bytes(), None) {
            Err(TrainerError::Ingest { row, .. }) => assert_eq!(row, 2),
            other => panic!("expected ingest error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file() {
        let err = load_events("/nonexistent/events.csv", None).unwrap_err();
        assert!(matches!(err, TrainerError::Io(_)));
    }
}
