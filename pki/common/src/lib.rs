pub mod certificate_info;
pub mod tracing;
pub mod x509;
