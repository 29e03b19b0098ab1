use std::fmt::Display;
use std::time::Instant;

use ::tracing::{info, info_span, warn};

/// Run `f` inside a span named after `operation`, logging entry, elapsed
/// time and outcome.
pub fn observe<T, E, F>(operation: &'static str, f: F) -> Result<T, E>
where
    E: Display,
    F: FnOnce() -> Result<T, E>,
{
    let span = info_span!("operation", name = operation);
    let _guard = span.enter();

    info!(operation, "started");
    let started = Instant::now();
    let result = f();
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match &result {
        Ok(_) => info!(operation, elapsed_ms, "completed"),
        Err(e) => warn!(operation, elapsed_ms, error = %e, "failed"),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_results_through() {
        let ok: Result<u8, String> = observe("ok", || Ok(3));
        assert_eq!(ok, Ok(3));
        let err: Result<u8, String> = observe("err", || Err("boom".to_string()));
        assert_eq!(err, Err("boom".to_string()));
    }
}
