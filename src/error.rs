use step_runner::TimedOut;

/// Anticipated ways a search step can fail.
///
/// These end a run as a failed step; they are not errors of the transport.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("could not enter {city} ({code}): {what} did not appear, {waited}")]
    CityEntry {
        city: String,
        code: String,
        what: &'static str,
        waited: TimedOut,
    },

    #[error("could not select departure date '{date}': {what} did not appear, {waited}")]
    DateSelection {
        date: String,
        what: &'static str,
        waited: TimedOut,
    },

    #[error("search button did not appear, {waited}")]
    Submit { waited: TimedOut },

    #[error("results page never rendered, {waited}")]
    ResultsTimeout { waited: TimedOut },

    #[error("results page rendered but lists no flights")]
    NoResults,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_messages_tell_timeout_and_empty_apart() {
        let waited = TimedOut {
            waited: Duration::from_millis(30_000),
        };
        let timeout = SearchError::ResultsTimeout { waited }.to_string();
        let empty = SearchError::NoResults.to_string();

        assert_eq!(timeout, "results page never rendered, timed out after 30000ms");
        assert_ne!(timeout, empty);
    }

    #[test]
    fn test_city_entry_message() {
        let err = SearchError::CityEntry {
            city: "Mumbai".into(),
            code: "BOM".into(),
            what: "dropdown option",
            waited: TimedOut {
                waited: Duration::from_millis(10_000),
            },
        };
        assert_eq!(
            err.to_string(),
            "could not enter Mumbai (BOM): dropdown option did not appear, timed out after 10000ms"
        );
    }
}
