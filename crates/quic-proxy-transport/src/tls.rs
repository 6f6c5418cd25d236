//! Session security provider.
//!
//! - [`SessionCredential`]: an ephemeral self-signed certificate and key,
//!   generated in memory at startup and never written to storage.
//! - [`build_server_tls_config`]: TLS 1.3 server config presenting that
//!   credential on every session.
//! - [`build_client_tls_config`]: TLS 1.3 client config whose peer
//!   verification is chosen explicitly via [`PeerVerification`].

use std::fmt;
use std::sync::Arc;

use quic_proxy_core::defaults::{DEFAULT_CERT_VALIDITY_DAYS, QUIC_ALPN, SELF_SIGNED_SERIAL};
use rcgen::{CertificateParams, KeyPair, SerialNumber};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use serde::{Deserialize, Serialize};

use crate::error::TransportError;

/// Signature algorithm of the generated key pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyAlgorithm {
    /// ECDSA over P-256 with SHA-256.
    #[default]
    EcdsaP256,
    /// ECDSA over P-384 with SHA-384.
    EcdsaP384,
}

impl KeyAlgorithm {
    fn rcgen_algorithm(self) -> &'static rcgen::SignatureAlgorithm {
        match self {
            Self::EcdsaP256 => &rcgen::PKCS_ECDSA_P256_SHA256,
            Self::EcdsaP384 => &rcgen::PKCS_ECDSA_P384_SHA384,
        }
    }
}

/// How the dialing side verifies the certificate presented by its peer.
///
/// There is no default: skipping verification has to be requested by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerVerification {
    /// Verify against the bundled WebPKI root store.
    WebPkiRoots,
    /// Accept any certificate. Only meaningful between co-located peers
    /// using throwaway self-signed credentials.
    InsecureSkipVerify,
}

impl PeerVerification {
    /// Map the `tls_insecure_skip_verify` configuration flag.
    pub fn from_insecure_flag(insecure_skip_verify: bool) -> Self {
        if insecure_skip_verify {
            Self::InsecureSkipVerify
        } else {
            Self::WebPkiRoots
        }
    }
}

/// A self-signed certificate and its private key, held only in memory.
pub struct SessionCredential {
    cert: CertificateDer<'static>,
    key: PrivatePkcs8KeyDer<'static>,
    algorithm: KeyAlgorithm,
}

impl SessionCredential {
    /// Generate a fresh key pair and a self-signed certificate for `server_name`.
    ///
    /// Every call produces new key material.
    pub fn generate(server_name: &str, algorithm: KeyAlgorithm) -> Result<Self, TransportError> {
        let key_pair = KeyPair::generate_for(algorithm.rcgen_algorithm())
            .map_err(|e| TransportError::CertGeneration(e.to_string()))?;

        let mut params = CertificateParams::new(vec![server_name.to_string()])
            .map_err(|e| TransportError::CertGeneration(e.to_string()))?;
        params.serial_number = Some(SerialNumber::from_slice(SELF_SIGNED_SERIAL));

        let now = time::OffsetDateTime::now_utc();
        params.not_before = now - time::Duration::minutes(5);
        params.not_after = now + time::Duration::days(DEFAULT_CERT_VALIDITY_DAYS);

        let cert = params
            .self_signed(&key_pair)
            .map_err(|e| TransportError::CertGeneration(e.to_string()))?;

        Ok(Self {
            cert: CertificateDer::from(cert.der().to_vec()),
            key: PrivatePkcs8KeyDer::from(key_pair.serialize_der()),
            algorithm,
        })
    }

    /// DER encoded certificate.
    pub fn certificate(&self) -> &CertificateDer<'static> {
        &self.cert
    }

    /// A copy of the private key for handing to rustls.
    pub fn private_key(&self) -> PrivateKeyDer<'static> {
        PrivateKeyDer::Pkcs8(self.key.clone_key())
    }

    pub fn algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }
}

impl fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCredential")
            .field("algorithm", &self.algorithm)
            .field("cert_len", &self.cert.len())
            .finish_non_exhaustive()
    }
}

/// Build a TLS 1.3 server config presenting `credential`.
pub fn build_server_tls_config(
    credential: &SessionCredential,
) -> Result<rustls::ServerConfig, TransportError> {
    let mut config = rustls::ServerConfig::builder_with_provider(crypto_provider())
        .with_protocol_versions(&[&rustls::version::TLS13])?
        .with_no_client_auth()
        .with_single_cert(vec![credential.certificate().clone()], credential.private_key())?;

    config.alpn_protocols = vec![QUIC_ALPN.to_vec()];
    Ok(config)
}

/// Build a TLS 1.3 client config with the requested peer verification.
pub fn build_client_tls_config(
    verification: PeerVerification,
) -> Result<rustls::ClientConfig, TransportError> {
    let builder = rustls::ClientConfig::builder_with_provider(crypto_provider())
        .with_protocol_versions(&[&rustls::version::TLS13])?;

    let mut config = match verification {
        PeerVerification::InsecureSkipVerify => builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(NoVerifier))
            .with_no_client_auth(),
        PeerVerification::WebPkiRoots => {
            let mut root_store = rustls::RootCertStore::empty();
            root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
            builder
                .with_root_certificates(root_store)
                .with_no_client_auth()
        }
    };

    config.alpn_protocols = vec![QUIC_ALPN.to_vec()];
    Ok(config)
}

/// aws-lc-rs, passed explicitly; no process-wide default provider is installed.
fn crypto_provider() -> Arc<CryptoProvider> {
    Arc::new(rustls::crypto::aws_lc_rs::default_provider())
}

/// A TLS certificate verifier that accepts any certificate.
///
/// Used only under [`PeerVerification::InsecureSkipVerify`], where peers
/// present throwaway self-signed certificates.
#[derive(Debug)]
struct NoVerifier;

impl rustls::client::danger::ServerCertVerifier for NoVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &rustls::pki_types::ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        rustls::crypto::aws_lc_rs::default_provider()
            .signature_verification_algorithms
            .supported_schemes()
    }
}
