use failsafe::{backoff, failure_policy, Config, StateMachine};
use std::time::Duration;

/// Circuit breaker guarding a third-party platform API.
pub type ApiCircuitBreaker =
    StateMachine<failure_policy::ConsecutiveFailures<backoff::Exponential>, ()>;

/// Creates the circuit breaker used around live platform API calls.
///
/// # Configuration
///
/// - **Failure threshold**: 3 consecutive failed refreshes trigger the OPEN state.
/// - **Backoff**: exponential, from 1 minute up to 10 minutes before a retry.
///
/// While OPEN, calls are rejected immediately and the refresh pipeline serves
/// mock data for that platform instead of waiting on a dead upstream.
pub fn create_api_circuit_breaker() -> ApiCircuitBreaker {
    let backoff_strategy = backoff::exponential(
        Duration::from_secs(60),  // Initial delay
        Duration::from_secs(600), // Maximum delay
    );

    let failure_policy = failure_policy::consecutive_failures(3, backoff_strategy);

    Config::new().failure_policy(failure_policy).build()
}
