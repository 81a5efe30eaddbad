use std::collections::BTreeMap;

use opentelemetry::KeyValue;
use opentelemetry_sdk::Resource;
use opentelemetry_semantic_conventions::resource::{
    SERVICE_NAME, TELEMETRY_DISTRO_NAME, TELEMETRY_DISTRO_VERSION,
};

pub const DISTRO_NAME: &str = env!("CARGO_PKG_NAME");
pub const DISTRO_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get base attributes for any resource
pub fn base_attributes(service_name: &str) -> Vec<KeyValue> {
    vec![
        KeyValue::new(SERVICE_NAME, service_name.to_string()),
        KeyValue::new(TELEMETRY_DISTRO_NAME, DISTRO_NAME),
        KeyValue::new(TELEMETRY_DISTRO_VERSION, DISTRO_VERSION),
    ]
}

/// Build resource with base + caller-supplied attributes
pub fn build_resource(service_name: &str, additional: &BTreeMap<String, String>) -> Resource {
    let mut attrs = base_attributes(service_name);
    attrs.extend(
        additional
            .iter()
            .map(|(key, value)| KeyValue::new(key.clone(), value.clone())),
    );
    Resource::builder().with_attributes(attrs).build()
}
