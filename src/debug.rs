use std::time::Instant;

use log::debug;

/// Times a scope. Bind it to a `_tracer` local; dropping it writes the
/// elapsed time to the debug log under `name`.
pub struct Tracer {
    name: &'static str,
    start_time: Instant,
}

impl Tracer {
    pub fn new(name: &'static str) -> Self {
        Tracer {
            name,
            start_time: Instant::now(),
        }
    }
}

impl Drop for Tracer {
    fn drop(&mut self) {
        debug!("[Trace] {}: {:.2?}", self.name, self.start_time.elapsed());
    }
}
