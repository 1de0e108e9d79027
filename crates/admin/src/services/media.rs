//! Signed direct uploads to the hosted media service.
//!
//! Image bytes never pass through this server. The dashboard asks for a
//! signature, the browser uploads straight to the media service, and the
//! returned `secure_url` is what gets stored on billboards and products.

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use sha2::{Digest, Sha256};
use url::Url;

use crate::config::MediaConfig;

/// Host serving delivered assets.
pub const DELIVERY_HOST: &str = "res.cloudinary.com";

/// Parameters the browser posts to the upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSignature {
    pub cloud_name: String,
    pub api_key: String,
    pub timestamp: i64,
    pub upload_preset: String,
    pub signature: String,
    pub signature_algorithm: &'static str,
    pub upload_url: String,
}

/// Signs upload requests and checks that stored image URLs point at the
/// configured cloud.
#[derive(Clone)]
pub struct MediaSigner {
    cloud_name: String,
    api_key: String,
    api_secret: SecretString,
    upload_preset: String,
}

impl std::fmt::Debug for MediaSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaSigner")
            .field("cloud_name", &self.cloud_name)
            .field("upload_preset", &self.upload_preset)
            .finish_non_exhaustive()
    }
}

impl MediaSigner {
    #[must_use]
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            cloud_name: config.cloud_name.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            upload_preset: config.upload_preset.clone(),
        }
    }

    #[must_use]
    pub fn cloud_name(&self) -> &str {
        &self.cloud_name
    }

    /// Sign an upload for the given unix time.
    ///
    /// The signed string is every upload parameter except the file, the API
    /// key and the cloud name, sorted by name and joined as `k=v&k=v`, with
    /// the API secret appended.
    #[must_use]
    pub fn sign_upload(&self, timestamp: i64) -> UploadSignature {
        let to_sign = format!(
            "timestamp={timestamp}&upload_preset={}{}",
            self.upload_preset,
            self.api_secret.expose_secret()
        );
        let signature = hex::encode(Sha256::digest(to_sign.as_bytes()));

        UploadSignature {
            cloud_name: self.cloud_name.clone(),
            api_key: self.api_key.clone(),
            timestamp,
            upload_preset: self.upload_preset.clone(),
            signature,
            signature_algorithm: "sha256",
            upload_url: format!(
                "https://api.cloudinary.com/v1_1/{}/image/upload",
                self.cloud_name
            ),
        }
    }

    /// Whether `url` is an asset delivered from this cloud.
    #[must_use]
    pub fn accepts(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url.trim()) else {
            return false;
        };
        parsed.scheme() == "https"
            && parsed.host_str() == Some(DELIVERY_HOST)
            && parsed
                .path_segments()
                .and_then(|mut segments| segments.next())
                .is_some_and(|cloud| cloud == self.cloud_name)
    }
}

/// Image URL rule shared by billboards and products: always `https`, and
/// from the configured cloud when media uploads are enabled.
#[must_use]
pub fn is_acceptable_image_url(media: Option<&MediaSigner>, url: &str) -> bool {
    match media {
        Some(signer) => signer.accepts(url),
        None => Url::parse(url.trim()).is_ok_and(|u| u.scheme() == "https" && u.host().is_some()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::test_config;

    fn signer() -> MediaSigner {
        let config = test_config();
        MediaSigner::new(config.media().expect("test config has media"))
    }

    #[test]
    fn test_signature_is_sha256_of_sorted_params_and_secret() {
        let sig = signer().sign_upload(1_700_000_000);

        let expected = hex::encode(Sha256::digest(
            b"timestamp=1700000000&upload_preset=xd1zgfvtaB3xY9mK2nL5pQ7rT0uW4zC6",
        ));
        assert_eq!(sig.signature, expected);
        assert_eq!(sig.signature.len(), 64);
        assert_eq!(sig.signature_algorithm, "sha256");
        assert_eq!(sig.timestamp, 1_700_000_000);
        assert_eq!(sig.upload_preset, "xd1zgfvt");
        assert_eq!(
            sig.upload_url,
            "https://api.cloudinary.com/v1_1/storekeep-test/image/upload"
        );
    }

    #[test]
    fn test_signature_changes_with_timestamp() {
        let s = signer();
        assert_ne!(s.sign_upload(1).signature, s.sign_upload(2).signature);
    }

    #[test]
    fn test_signature_serializes_camel_case_without_secret() {
        let json = serde_json::to_value(signer().sign_upload(5)).expect("serialize");
        assert_eq!(json["cloudName"], "storekeep-test");
        assert_eq!(json["apiKey"], "123456789012345");
        assert_eq!(json["signatureAlgorithm"], "sha256");
        assert!(!json.to_string().contains("aB3xY9mK2nL5pQ7rT0uW4zC6"));
    }

    #[test]
    fn test_accepts_only_own_cloud_over_https() {
        let s = signer();
        assert!(s.accepts("https://res.cloudinary.com/storekeep-test/image/upload/v1/a.png"));
        assert!(!s.accepts("http://res.cloudinary.com/storekeep-test/image/upload/v1/a.png"));
        assert!(!s.accepts("https://res.cloudinary.com/someone-else/image/upload/v1/a.png"));
        assert!(!s.accepts("https://evil.example/storekeep-test/a.png"));
        assert!(!s.accepts("not a url"));
    }

    #[test]
    fn test_unconfigured_media_accepts_any_https_url() {
        assert!(is_acceptable_image_url(None, "https://images.example.com/banner.jpg"));
        assert!(!is_acceptable_image_url(None, "http://images.example.com/banner.jpg"));
        assert!(!is_acceptable_image_url(None, "javascript:alert(1)"));
    }

    #[test]
    fn test_debug_hides_secret() {
        let debug = format!("{:?}", signer());
        assert!(!debug.contains("aB3xY9mK2nL5pQ7rT0uW4zC6"));
    }
}
