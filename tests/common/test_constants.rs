//! Shared constants for behavioural tests.

/// Hosted-service path used by the provisioning scenarios.
pub const SERVICE_PATH: &str = "/services/web";

/// Deployment path nested under the hosted service.
pub const DEPLOYMENT_PATH: &str = "/services/web/deployments/staging";

/// Versioned endpoint document mutated when adding load-balancer rules.
pub const ENDPOINT_DOCUMENT: &str = "/services/web/endpoints";
