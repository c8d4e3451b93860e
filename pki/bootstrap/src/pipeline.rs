use std::path::Path;
use std::path::PathBuf;

use localtls_common::certificate_info::CertificateError;
use localtls_common::certificate_info::CertificateInfo;
use localtls_common::x509::PemAsStringError;
use localtls_common::x509::PemString;
use localtls_common::x509::key::CryptoError;
use localtls_common::x509::key::KeyAlgorithm;
use localtls_common::x509::key::make_key;
use nameth::NamedEnumValues as _;
use nameth::nameth;
use tracing::debug;
use tracing::info;

use crate::ca;
use crate::ca::BootstrapCaError;
use crate::config::BootstrapConfig;
use crate::csr::BuildRequestError;
use crate::csr::build_request;
use crate::issue::SigningError;
use crate::issue::issue;
use crate::san::SanEntry;
use crate::san::SubjectAltNames;
use crate::template::DnTemplate;
use crate::template::ValidationError;

/// The four PEM artifacts of one bootstrap run.
pub struct Artifacts {
    pub ca: CertificateInfo<String>,
    pub server: CertificateInfo<String>,
}

/// Where [write] persisted the artifacts.
#[derive(Debug)]
pub struct ArtifactPaths {
    pub ca: CertificateInfo<PathBuf>,
    pub server: CertificateInfo<PathBuf>,
}

/// Runs the whole bootstrap in memory.
///
/// Template → CA bootstrap → server key → CSR → issuance. The CA key
/// and certificate never round-trip through the filesystem; only the
/// returned artifacts are meant to persist.
pub fn run(config: &BootstrapConfig) -> Result<Artifacts, PipelineError> {
    let template = DnTemplate::default();

    let ca = ca::bootstrap(
        &template,
        &config.dn_overrides(&config.ca_common_name),
        KeyAlgorithm::default(),
        config.validity_days,
    )?;
    info!(
        "Bootstrapped CA '{}', valid {} days",
        config.ca_common_name, config.validity_days
    );

    let server_key = make_key(KeyAlgorithm::default())?;
    let subject = template.materialize(&config.dn_overrides(&config.common_name))?;
    let subject_alt_names: SubjectAltNames = config
        .subject_alt_names
        .iter()
        .map(|name| SanEntry::from(name.as_str()))
        .collect();
    let request = build_request(&server_key, subject, subject_alt_names, config.validity_days)?;
    let certificate = issue(&ca, request, config.validity_days)?;
    info!("Issued server certificate '{}'", config.common_name);

    Ok(Artifacts {
        ca: CertificateInfo {
            certificate: ca.certificate().to_pem(),
            private_key: ca.private_key().private_key_to_pem_pkcs8(),
        }
        .try_map(PemString::pem_string)?,
        server: CertificateInfo {
            certificate: certificate.to_pem(),
            private_key: server_key.private_key_to_pem_pkcs8(),
        }
        .try_map(PemString::pem_string)?,
    })
}

/// Persists the artifact set, all-or-nothing.
///
/// A partial set must never survive: a server certificate next to a CA
/// certificate that didn't sign it is worse than no artifacts at all,
/// so on any write failure the files written so far are removed.
pub fn write(
    artifacts: &Artifacts,
    output_dir: impl AsRef<Path>,
) -> Result<ArtifactPaths, PipelineError> {
    let output_dir = output_dir.as_ref();
    std::fs::create_dir_all(output_dir).map_err(|error| PipelineError::CreateOutputDir {
        path: output_dir.to_owned(),
        error,
    })?;

    let paths = ArtifactPaths {
        ca: CertificateInfo {
            certificate: output_dir.join("ca.crt"),
            private_key: output_dir.join("ca.key"),
        },
        server: CertificateInfo {
            certificate: output_dir.join("server.crt"),
            private_key: output_dir.join("server.key"),
        },
    };

    let files = [
        (&paths.ca.certificate, &artifacts.ca.certificate),
        (&paths.ca.private_key, &artifacts.ca.private_key),
        (&paths.server.certificate, &artifacts.server.certificate),
        (&paths.server.private_key, &artifacts.server.private_key),
    ];
    let mut written = vec![];
    for (path, pem) in files {
        match std::fs::write(path, pem) {
            Ok(()) => {
                debug!("Wrote {}", path.display());
                written.push(path);
            }
            Err(error) => {
                for path in written {
                    let _ = std::fs::remove_file(path);
                }
                return Err(PipelineError::WriteArtifact {
                    path: path.clone(),
                    error,
                });
            }
        }
    }
    Ok(paths)
}

#[nameth]
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("[{n}] {0}", n = self.name())]
    BootstrapCa(#[from] BootstrapCaError),

    #[error("[{n}] {0}", n = self.name())]
    MakeKey(#[from] CryptoError),

    #[error("[{n}] {0}", n = self.name())]
    Validation(#[from] ValidationError),

    #[error("[{n}] {0}", n = self.name())]
    BuildRequest(#[from] BuildRequestError),

    #[error("[{n}] {0}", n = self.name())]
    Issue(#[from] SigningError),

    #[error("[{n}] {0}", n = self.name())]
    PemString(#[from] CertificateError<PemAsStringError>),

    #[error("[{n}] Failed to create the output directory {path}: {error}", n = self.name(), path = path.display())]
    CreateOutputDir {
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("[{n}] Failed to write {path}: {error}", n = self.name(), path = path.display())]
    WriteArtifact {
        path: PathBuf,
        error: std::io::Error,
    },
}
