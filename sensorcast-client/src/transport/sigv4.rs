use std::env;
use std::time::SystemTime;

use aws_credential_types::Credentials as AwsCredentials;
use aws_sigv4::http_request::{
    sign, SessionTokenMode, SignableBody, SignableRequest, SignatureLocation, SigningSettings,
};
use aws_sigv4::sign::v4;
use http::header::HOST;
use http::Request;

use crate::errors::TransportError;

/// Signing name of the AWS IoT data plane.
pub const IOT_SERVICE: &str = "iotdevicegateway";

pub const ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";
pub const REGION: &str = "AWS_REGION";

/// Presigns the websocket upgrade request with SigV4 query parameters, the
/// way AWS IoT expects for IAM-authenticated MQTT over WSS.
#[derive(Debug, Clone)]
pub struct WebsocketSigner {
    credentials: AwsCredentials,
    region: String,
}

impl WebsocketSigner {
    pub fn new(credentials: AwsCredentials, region: impl Into<String>) -> Self {
        Self {
            credentials,
            region: region.into(),
        }
    }

    /// Reads IAM credentials from the standard `AWS_*` variables. The region
    /// comes from the endpoint, falling back to `AWS_REGION`.
    pub fn from_env(endpoint: &str) -> Result<Self, TransportError> {
        Self::from_lookup(endpoint, |name| env::var(name).ok())
    }

    pub fn from_lookup<F>(endpoint: &str, lookup: F) -> Result<Self, TransportError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let region = region_from_endpoint(endpoint)
            .or_else(|| lookup(REGION))
            .ok_or_else(|| TransportError::UnknownRegion(endpoint.to_string()))?;

        let access_key = lookup(ACCESS_KEY_ID).filter(|v| !v.is_empty());
        let secret_key = lookup(SECRET_ACCESS_KEY).filter(|v| !v.is_empty());
        let (Some(access_key), Some(secret_key)) = (access_key, secret_key) else {
            return Err(TransportError::MissingAwsCredentials);
        };
        let session_token = lookup(SESSION_TOKEN).filter(|v| !v.is_empty());

        let credentials = AwsCredentials::new(access_key, secret_key, session_token, None, "environment");

        Ok(Self::new(credentials, region))
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Signs `request` as of `time`, leaving it untouched on error. Only the
    /// host header is signed so the websocket key headers may change afterwards.
    pub fn presign(&self, request: &mut Request<()>, time: SystemTime) -> Result<(), TransportError> {
        let host = match request.headers().get(HOST).and_then(|v| v.to_str().ok()) {
            Some(host) => host.to_string(),
            None => request
                .uri()
                .authority()
                .map(|a| a.to_string())
                .ok_or_else(|| TransportError::Signing("request has no host".into()))?,
        };
        let uri = request.uri().to_string();

        let mut settings = SigningSettings::default();
        settings.signature_location = SignatureLocation::QueryParams;
        // AWS IoT wants the token appended after the signature is computed
        settings.session_token_mode = SessionTokenMode::Exclude;

        let identity = self.credentials.clone().into();
        let params = v4::SigningParams::builder()
            .identity(&identity)
            .region(&self.region)
            .name(IOT_SERVICE)
            .time(time)
            .settings(settings)
            .build()
            .map_err(|e| TransportError::Signing(e.into()))?
            .into();

        let signable = SignableRequest::new(
            "GET",
            uri,
            std::iter::once(("host", host.as_str())),
            SignableBody::Bytes(&[]),
        )
        .map_err(|e| TransportError::Signing(e.into()))?;

        let (instructions, _signature) = sign(signable, &params)
            .map_err(|e| TransportError::Signing(e.into()))?
            .into_parts();
        instructions.apply_to_request_http1x(request);

        Ok(())
    }

    /// Signs with the current time. A failure is logged and the request goes
    /// out unsigned, so the broker reports the rejection.
    pub fn sign_handshake(&self, mut request: Request<()>) -> Request<()> {
        if let Err(e) = self.presign(&mut request, SystemTime::now()) {
            tracing::error!("Failed to sign websocket handshake: {e}");
        }
        request
    }
}

/// Extracts the region from `<prefix>.iot.<region>.amazonaws.com[.cn]`.
pub fn region_from_endpoint(endpoint: &str) -> Option<String> {
    let labels: Vec<&str> = endpoint.split('.').collect();
    let iot = labels.iter().position(|label| *label == "iot")?;
    let region = labels.get(iot + 1)?;
    let domain = labels.get(iot + 2)?;

    (*domain == "amazonaws" && !region.is_empty()).then(|| region.to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use super::*;

    const ENDPOINT: &str = "abc123-ats.iot.eu-west-1.amazonaws.com";

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    fn signer() -> WebsocketSigner {
        let credentials = AwsCredentials::new(
            "AKIDEXAMPLE",
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            Some("session-token".to_string()),
            None,
            "test",
        );
        WebsocketSigner::new(credentials, "eu-west-1")
    }

    fn handshake() -> Request<()> {
        Request::builder()
            .method("GET")
            .uri(format!("wss://{ENDPOINT}:443/mqtt"))
            .header("Host", format!("{ENDPOINT}:443"))
            .header("Sec-WebSocket-Protocol", "mqtt")
            .body(())
            .unwrap()
    }

    #[test]
    fn test_region_from_endpoint() {
        assert_eq!(region_from_endpoint(ENDPOINT).as_deref(), Some("eu-west-1"));
        assert_eq!(
            region_from_endpoint("abc-ats.iot.cn-north-1.amazonaws.com.cn").as_deref(),
            Some("cn-north-1")
        );
        assert_eq!(region_from_endpoint("broker.example.com"), None);
        assert_eq!(region_from_endpoint("localhost"), None);
    }

    #[test]
    fn test_from_lookup() {
        let signer = WebsocketSigner::from_lookup(ENDPOINT, lookup(&[
            (ACCESS_KEY_ID, "AKIDEXAMPLE"),
            (SECRET_ACCESS_KEY, "secret"),
        ]))
        .unwrap();
        assert_eq!(signer.region(), "eu-west-1");

        // A custom domain needs AWS_REGION
        let signer = WebsocketSigner::from_lookup("iot.example.com", lookup(&[
            (ACCESS_KEY_ID, "AKIDEXAMPLE"),
            (SECRET_ACCESS_KEY, "secret"),
            (REGION, "us-east-2"),
        ]))
        .unwrap();
        assert_eq!(signer.region(), "us-east-2");
    }

    #[test]
    fn test_from_lookup_errors() {
        let error = WebsocketSigner::from_lookup(ENDPOINT, lookup(&[(ACCESS_KEY_ID, "AKIDEXAMPLE")])).unwrap_err();
        assert!(matches!(error, TransportError::MissingAwsCredentials));

        let error = WebsocketSigner::from_lookup("broker.example.com", lookup(&[
            (ACCESS_KEY_ID, "AKIDEXAMPLE"),
            (SECRET_ACCESS_KEY, "secret"),
        ]))
        .unwrap_err();
        assert!(matches!(error, TransportError::UnknownRegion(_)));
    }

    #[test]
    fn test_presign_adds_query_parameters() {
        let time = SystemTime::UNIX_EPOCH + Duration::from_secs(1_440_938_160);
        let mut request = handshake();
        signer().presign(&mut request, time).unwrap();

        assert_eq!(request.uri().path(), "/mqtt");
        assert_eq!(request.headers()["Sec-WebSocket-Protocol"], "mqtt");

        let query = request.uri().query().unwrap();
        assert!(query.contains("X-Amz-Algorithm=AWS4-HMAC-SHA256"));
        assert!(query.contains("X-Amz-Credential=AKIDEXAMPLE"));
        assert!(query.contains("eu-west-1"));
        assert!(query.contains(IOT_SERVICE));
        assert!(query.contains("X-Amz-Date=20150830T123600Z"));
        assert!(query.contains("X-Amz-SignedHeaders=host"));
        assert!(query.contains("X-Amz-Signature="));
        assert!(query.contains("X-Amz-Security-Token=session-token"));
    }

    #[test]
    fn test_presign_is_deterministic_for_a_fixed_time() {
        let time = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);

        let sign_at = |time| {
            let mut request = handshake();
            signer().presign(&mut request, time).unwrap();
            request
        };

        let first = sign_at(time);
        let second = sign_at(time);
        let later = sign_at(time + Duration::from_secs(1));

        assert_eq!(first.uri(), second.uri());
        assert_ne!(first.uri(), later.uri());
    }
}
