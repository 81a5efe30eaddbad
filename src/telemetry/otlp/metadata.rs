use tonic::metadata::{MetadataMap, MetadataValue};

use crate::telemetry::error::TelemetryError;

/// gRPC metadata carrying the access token, empty when there is none.
pub fn access_token_metadata(access_token: Option<&str>) -> Result<MetadataMap, TelemetryError> {
    let mut metadata = MetadataMap::new();

    if let Some(token) = access_token.filter(|t| !t.is_empty()) {
        metadata.insert(
            "authorization",
            MetadataValue::try_from(format!("Bearer {}", token))
                .map_err(|e| TelemetryError::Config(format!("Invalid access token: {}", e)))?,
        );
    }

    Ok(metadata)
}
