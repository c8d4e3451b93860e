//! One-shot bootstrap of a minimal local PKI for a TLS-enabled server.
//!
//! The pipeline creates a self-signed root CA, generates a server key
//! pair, builds a certificate signing request carrying the server's
//! subject alternative names, and has the CA issue the matching
//! end-entity certificate. The only outputs are four PEM artifacts: the
//! CA certificate and key, and the server certificate and key.

pub mod ca;
pub mod config;
pub mod csr;
pub mod issue;
pub mod pipeline;
pub mod san;
pub mod template;

#[cfg(test)]
mod tests;
