//! Route desired state and accessors over an observed route.

use serde::Deserialize;

use crate::document::Yedit;
use crate::value::{Map, Value};

/// TLS termination that keeps encryption end to end without certificates.
pub const PASSTHROUGH: &str = "passthrough";
/// TLS termination that re-encrypts towards the service.
pub const REENCRYPT: &str = "reencrypt";

pub const DEFAULT_WEIGHT: i64 = 100;
pub const DEFAULT_WILDCARD_POLICY: &str = "None";

/// Port of the backing service, by number or by name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TargetPort {
    Number(i64),
    Name(String),
}

impl TargetPort {
    /// A zero port or an empty name counts as unset.
    pub fn is_set(&self) -> bool {
        match self {
            TargetPort::Number(n) => *n != 0,
            TargetPort::Name(name) => !name.is_empty(),
        }
    }
}

impl From<&TargetPort> for Value {
    fn from(port: &TargetPort) -> Self {
        match port {
            TargetPort::Number(n) => Value::Int(*n),
            TargetPort::Name(name) => Value::from(name.as_str()),
        }
    }
}

/// Certificate material for a TLS route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsMaterial {
    pub cert: Option<String>,
    pub key: Option<String>,
    pub cacert: Option<String>,
    pub destcacert: Option<String>,
}

/// RouteConfig holds the desired settings of a route and the document they
/// produce.
#[derive(Debug, Clone)]
pub struct RouteConfig {
    pub name: String,
    pub namespace: String,
    pub host: Option<String>,
    pub tls_termination: Option<String>,
    pub tls: TlsMaterial,
    pub service_name: Option<String>,
    pub wildcard_policy: String,
    pub weight: i64,
    pub port: Option<TargetPort>,
    data: Value,
}

impl RouteConfig {
    /// Creates a new RouteConfigBuilder.
    pub fn builder(name: impl Into<String>, namespace: impl Into<String>) -> RouteConfigBuilder {
        RouteConfigBuilder::new(name, namespace)
    }

    /// Returns the desired route document.
    pub fn data(&self) -> &Value {
        &self.data
    }

    fn create_dict(&self) -> Value {
        let optional = |v: &Option<String>| v.as_deref().map(Value::from).unwrap_or(Value::Null);

        let mut metadata = Map::new();
        metadata.set("name", self.name.as_str());
        metadata.set("namespace", self.namespace.as_str());

        let mut spec = Map::new();
        spec.set("host", optional(&self.host));

        if let Some(termination) = self.tls_termination.as_deref().filter(|t| !t.is_empty()) {
            let mut tls = Map::new();
            tls.set("termination", termination);
            if termination != PASSTHROUGH {
                tls.set("key", optional(&self.tls.key));
                tls.set("caCertificate", optional(&self.tls.cacert));
                tls.set("certificate", optional(&self.tls.cert));
            }
            if termination == REENCRYPT {
                tls.set("destinationCACertificate", optional(&self.tls.destcacert));
            }
            spec.set("tls", Value::Map(tls));
        }

        let mut to = Map::new();
        to.set("kind", "Service");
        to.set("name", optional(&self.service_name));
        to.set("weight", Value::Int(self.weight));
        spec.set("to", Value::Map(to));

        spec.set("wildcardPolicy", self.wildcard_policy.as_str());

        if let Some(port) = self.port.as_ref().filter(|p| p.is_set()) {
            let mut target = Map::new();
            target.set("targetPort", Value::from(port));
            spec.set("port", Value::Map(target));
        }

        let mut data = Map::new();
        data.set("apiVersion", "v1");
        data.set("kind", "Route");
        data.set("metadata", Value::Map(metadata));
        data.set("spec", Value::Map(spec));
        Value::Map(data)
    }
}

/// RouteConfigBuilder collects route settings; unset weight and wildcard
/// policy fall back to their defaults.
#[derive(Debug, Default)]
pub struct RouteConfigBuilder {
    name: String,
    namespace: String,
    host: Option<String>,
    tls_termination: Option<String>,
    tls: TlsMaterial,
    service_name: Option<String>,
    wildcard_policy: Option<String>,
    weight: Option<i64>,
    port: Option<TargetPort>,
}

impl RouteConfigBuilder {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        RouteConfigBuilder {
            name: name.into(),
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    pub fn host(mut self, host: Option<String>) -> Self {
        self.host = host;
        self
    }

    pub fn tls_termination(mut self, termination: Option<String>) -> Self {
        self.tls_termination = termination;
        self
    }

    pub fn tls(mut self, tls: TlsMaterial) -> Self {
        self.tls = tls;
        self
    }

    pub fn service_name(mut self, service_name: Option<String>) -> Self {
        self.service_name = service_name;
        self
    }

    pub fn wildcard_policy(mut self, policy: Option<String>) -> Self {
        self.wildcard_policy = policy;
        self
    }

    pub fn weight(mut self, weight: Option<i64>) -> Self {
        self.weight = weight;
        self
    }

    pub fn port(mut self, port: Option<TargetPort>) -> Self {
        self.port = port;
        self
    }

    /// Builds the config and its desired document.
    pub fn build(self) -> RouteConfig {
        let mut config = RouteConfig {
            name: self.name,
            namespace: self.namespace,
            host: self.host,
            tls_termination: self.tls_termination,
            tls: self.tls,
            service_name: self.service_name,
            wildcard_policy: self
                .wildcard_policy
                .unwrap_or_else(|| DEFAULT_WILDCARD_POLICY.to_string()),
            weight: self.weight.unwrap_or(DEFAULT_WEIGHT),
            port: self.port,
            data: Value::Null,
        };
        config.data = config.create_dict();
        config
    }
}

/// Route exposes the well-known fields of a route document.
#[derive(Debug, Clone)]
pub struct Route {
    store: Yedit,
}

impl Route {
    pub const KIND: &'static str = "route";

    pub const WILDCARD_POLICY_PATH: &'static str = "spec.wildcardPolicy";
    pub const HOST_PATH: &'static str = "spec.host";
    pub const PORT_PATH: &'static str = "spec.port.targetPort";
    pub const SERVICE_PATH: &'static str = "spec.to.name";
    pub const WEIGHT_PATH: &'static str = "spec.to.weight";
    pub const CERT_PATH: &'static str = "spec.tls.certificate";
    pub const CACERT_PATH: &'static str = "spec.tls.caCertificate";
    pub const DESTCACERT_PATH: &'static str = "spec.tls.destinationCACertificate";
    pub const TERMINATION_PATH: &'static str = "spec.tls.termination";
    pub const KEY_PATH: &'static str = "spec.tls.key";

    pub fn new(content: Value) -> Self {
        Route {
            store: Yedit::from_document(content),
        }
    }

    pub fn document(&self) -> &Value {
        self.store.document()
    }

    fn get_str(&self, path: &str) -> Option<&str> {
        self.store.get(path).and_then(Value::as_str)
    }

    pub fn host(&self) -> Option<&str> {
        self.get_str(Self::HOST_PATH)
    }

    pub fn port(&self) -> Option<&Value> {
        self.store.get(Self::PORT_PATH)
    }

    pub fn service(&self) -> Option<&str> {
        self.get_str(Self::SERVICE_PATH)
    }

    pub fn weight(&self) -> Option<i64> {
        self.store.get(Self::WEIGHT_PATH).and_then(Value::as_int)
    }

    pub fn termination(&self) -> Option<&str> {
        self.get_str(Self::TERMINATION_PATH)
    }

    pub fn cert(&self) -> Option<&str> {
        self.get_str(Self::CERT_PATH)
    }

    pub fn cacert(&self) -> Option<&str> {
        self.get_str(Self::CACERT_PATH)
    }

    pub fn destcacert(&self) -> Option<&str> {
        self.get_str(Self::DESTCACERT_PATH)
    }

    pub fn key(&self) -> Option<&str> {
        self.get_str(Self::KEY_PATH)
    }

    pub fn wildcard_policy(&self) -> Option<&str> {
        self.get_str(Self::WILDCARD_POLICY_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::from_yaml;
    use pretty_assertions::assert_eq;

    fn material() -> TlsMaterial {
        TlsMaterial {
            cert: Some("CERT".into()),
            key: Some("KEY".into()),
            cacert: Some("CA".into()),
            destcacert: Some("DESTCA".into()),
        }
    }

    fn tls_of(config: &RouteConfig) -> Map {
        Route::new(config.data().clone())
            .document()
            .as_map()
            .and_then(|m| m.get("spec"))
            .and_then(Value::as_map)
            .and_then(|m| m.get("tls"))
            .and_then(Value::as_map)
            .cloned()
            .unwrap_or_default()
    }

    #[test]
    fn test_defaults() {
        let config = RouteConfig::builder("web", "apps")
            .host(Some("web.example.com".into()))
            .service_name(Some("web".into()))
            .build();

        let expected = from_yaml(
            r#"
apiVersion: v1
kind: Route
metadata:
  name: web
  namespace: apps
spec:
  host: web.example.com
  to:
    kind: Service
    name: web
    weight: 100
  wildcardPolicy: None
"#,
        )
        .unwrap();
        assert_eq!(config.data(), &expected);
    }

    #[test]
    fn test_passthrough_has_no_certificates() {
        let config = RouteConfig::builder("web", "apps")
            .tls_termination(Some(PASSTHROUGH.into()))
            .tls(material())
            .build();
        let tls = tls_of(&config);
        assert_eq!(tls.keys().collect::<Vec<_>>(), vec!["termination"]);
    }

    #[test]
    fn test_edge_has_certificates_but_no_destination_ca() {
        let config = RouteConfig::builder("web", "apps")
            .tls_termination(Some("edge".into()))
            .tls(material())
            .build();
        let tls = tls_of(&config);
        assert_eq!(
            tls.keys().collect::<Vec<_>>(),
            vec!["caCertificate", "certificate", "key", "termination"]
        );
        assert_eq!(tls.get("certificate"), Some(&Value::from("CERT")));
    }

    #[test]
    fn test_reencrypt_has_destination_ca() {
        let config = RouteConfig::builder("web", "apps")
            .tls_termination(Some(REENCRYPT.into()))
            .tls(material())
            .build();
        let tls = tls_of(&config);
        assert_eq!(tls.get("destinationCACertificate"), Some(&Value::from("DESTCA")));
        assert_eq!(tls.len(), 5);
    }

    #[test]
    fn test_port_included_only_when_set() {
        let numbered = RouteConfig::builder("web", "apps")
            .port(Some(TargetPort::Number(8080)))
            .build();
        let route = Route::new(numbered.data().clone());
        assert_eq!(route.port(), Some(&Value::Int(8080)));

        let named = RouteConfig::builder("web", "apps")
            .port(Some(TargetPort::Name("http".into())))
            .build();
        assert_eq!(Route::new(named.data().clone()).port(), Some(&Value::from("http")));

        for unset in [TargetPort::Number(0), TargetPort::Name(String::new())] {
            let config = RouteConfig::builder("web", "apps").port(Some(unset)).build();
            assert_eq!(Route::new(config.data().clone()).port(), None);
        }
    }

    #[test]
    fn test_getters() {
        let route = Route::new(
            from_yaml(
                r#"
spec:
  host: web.example.com
  port: {targetPort: 8080}
  to: {kind: Service, name: web, weight: 50}
  tls: {termination: reencrypt, certificate: C, caCertificate: CA, destinationCACertificate: D, key: K}
  wildcardPolicy: Subdomain
"#,
            )
            .unwrap(),
        );
        assert_eq!(route.host(), Some("web.example.com"));
        assert_eq!(route.port(), Some(&Value::Int(8080)));
        assert_eq!(route.service(), Some("web"));
        assert_eq!(route.weight(), Some(50));
        assert_eq!(route.termination(), Some("reencrypt"));
        assert_eq!(route.cert(), Some("C"));
        assert_eq!(route.cacert(), Some("CA"));
        assert_eq!(route.destcacert(), Some("D"));
        assert_eq!(route.key(), Some("K"));
        assert_eq!(route.wildcard_policy(), Some("Subdomain"));

        let empty = Route::new(Value::Null);
        assert_eq!(empty.host(), None);
        assert_eq!(empty.document(), &Value::Map(Map::new()));
    }
}
