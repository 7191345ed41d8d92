use rand::Rng;
use std::time::Duration;

/// Exponential backoff with ±30% jitter: `base * 2^attempt`, exponent capped
/// at 6.
pub fn backoff_delay(attempt: u32, base: Duration) -> Duration {
    let factor = 2_u32.saturating_pow(attempt.min(6));
    let delay = base.saturating_mul(factor);
    let jitter = rand::thread_rng().gen_range(0.7..1.3);
    delay.mul_f64(jitter)
}
