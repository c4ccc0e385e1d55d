//! I/O utilities for persistence operations.

use std::io::ErrorKind;

use crate::error::OrmError;

/// Classifies I/O errors into specific OrmError variants.
pub fn classify_io_error(error: std::io::Error, context: &str) -> OrmError {
    match error.kind() {
        ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted => {
            OrmError::TransientIoError(format!("{}: {}", context, error))
        }
        _ => OrmError::IoError(format!("{}: {}", context, error)),
    }
}

/// Retries an operation that may fail with transient I/O errors.
pub fn retry_io_operation<F, T>(
    operation: F,
    max_retries: u32,
    retry_delay_ms: u64,
    context: &str,
) -> Result<T, OrmError>
where
    F: Fn() -> Result<T, OrmError>,
{
    let mut attempt = 0;
    loop {
        match operation() {
            Ok(result) => return Ok(result),
            Err(err) => {
                attempt += 1;
                if attempt > max_retries {
                    return Err(err);
                }

                // Only retry transient I/O errors
                if let OrmError::TransientIoError(_) = err {
                    tracing::warn!(
                        "Transient I/O error in {} (attempt {}/{}): {}",
                        context,
                        attempt,
                        max_retries,
                        err
                    );

                    if retry_delay_ms > 0 {
                        std::thread::sleep(std::time::Duration::from_millis(retry_delay_ms));
                    }

                    continue;
                }

                return Err(err);
            }
        }
    }
}
