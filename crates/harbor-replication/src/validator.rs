//! Replication configuration validation
//!
//! Three pure stages, each taking and returning an explicit value:
//! structural parse of the XML body, shape extraction into raw structs,
//! semantic validation into the typed model. A failure at any stage
//! happens before any persistence side effect.
//!
//! Example document:
//!
//! ```xml
//! <ReplicationConfiguration>
//!     <Role>arn:aws:iam::123456789012:role/replication</Role>
//!     <Rule>
//!         <ID>rule-1</ID>
//!         <Status>Enabled</Status>
//!         <Prefix>logs/</Prefix>
//!         <Destination>
//!             <Bucket>arn:aws:s3:::destination-bucket</Bucket>
//!             <StorageClass>STANDARD_IA</StorageClass>
//!         </Destination>
//!     </Rule>
//! </ReplicationConfiguration>
//! ```

use crate::model::{
    Destination, MAX_RULES, ReplicationConfiguration, ReplicationRule, RuleStatus, StorageClass,
};
use serde::Deserialize;
use thiserror::Error;

const BUCKET_ARN_PREFIX: &str = "arn:aws:s3:::";

/// Validation failure for a replication configuration document
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ReplicationConfigError {
    /// The body is empty or not well-formed XML
    #[error("malformed XML in replication configuration body")]
    MalformedXml,

    /// The document parses but violates a semantic constraint
    #[error("illegal replication configuration: {0}")]
    Illegal(String),
}

impl From<ReplicationConfigError> for harbor_common::Error {
    fn from(err: ReplicationConfigError) -> Self {
        match err {
            ReplicationConfigError::MalformedXml => Self::MalformedXml,
            ReplicationConfigError::Illegal(reason) => {
                Self::IllegalReplicationConfiguration(reason)
            }
        }
    }
}

// Raw shape as extracted from the XML; everything optional so semantic
// validation can name what is missing.

#[derive(Debug, Deserialize)]
struct RawConfiguration {
    #[serde(rename = "Role")]
    role: Option<String>,
    #[serde(rename = "Rule", default)]
    rules: Vec<RawRule>,
}

#[derive(Debug, Deserialize)]
struct RawRule {
    #[serde(rename = "ID")]
    id: Option<String>,
    #[serde(rename = "Status")]
    status: Option<String>,
    #[serde(rename = "Prefix")]
    prefix: Option<String>,
    #[serde(rename = "Destination")]
    destination: Option<RawDestination>,
}

#[derive(Debug, Deserialize)]
struct RawDestination {
    #[serde(rename = "Bucket")]
    bucket: Option<String>,
    #[serde(rename = "StorageClass")]
    storage_class: Option<String>,
}

/// Parse and validate a replication configuration document.
///
/// Returns the typed configuration with output rule order equal to input
/// order. Overlapping prefixes across rules are permitted; precedence is
/// the replication worker's concern.
pub fn parse(body: &[u8]) -> Result<ReplicationConfiguration, ReplicationConfigError> {
    let raw = parse_document(body)?;
    validate(raw)
}

/// Structural parse and shape extraction
fn parse_document(body: &[u8]) -> Result<RawConfiguration, ReplicationConfigError> {
    if body.is_empty() {
        return Err(ReplicationConfigError::MalformedXml);
    }
    let text = std::str::from_utf8(body).map_err(|_| ReplicationConfigError::MalformedXml)?;
    quick_xml::de::from_str(text).map_err(|_| ReplicationConfigError::MalformedXml)
}

/// Semantic validation into the typed model
fn validate(raw: RawConfiguration) -> Result<ReplicationConfiguration, ReplicationConfigError> {
    let role = match raw.role {
        Some(role) if !role.is_empty() => role,
        _ => return Err(ReplicationConfigError::Illegal("Role is required".into())),
    };

    if raw.rules.is_empty() {
        return Err(ReplicationConfigError::Illegal(
            "at least one Rule is required".into(),
        ));
    }
    if raw.rules.len() > MAX_RULES {
        return Err(ReplicationConfigError::Illegal(format!(
            "too many Rules: {} exceeds the limit of {MAX_RULES}",
            raw.rules.len()
        )));
    }

    let rules = raw
        .rules
        .into_iter()
        .enumerate()
        .map(|(index, rule)| validate_rule(index, rule))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ReplicationConfiguration { role, rules })
}

fn validate_rule(
    index: usize,
    rule: RawRule,
) -> Result<ReplicationRule, ReplicationConfigError> {
    let status = rule
        .status
        .as_deref()
        .and_then(|s| s.parse::<RuleStatus>().ok())
        .ok_or_else(|| {
            ReplicationConfigError::Illegal(format!(
                "Rule {index}: Status must be Enabled or Disabled"
            ))
        })?;

    // An absent or empty Prefix matches all keys
    let prefix = rule.prefix.unwrap_or_default();

    let destination = rule.destination.ok_or_else(|| {
        ReplicationConfigError::Illegal(format!("Rule {index}: Destination is required"))
    })?;

    let bucket_arn = match destination.bucket {
        Some(arn) if is_bucket_arn(&arn) => arn,
        Some(_) => {
            return Err(ReplicationConfigError::Illegal(format!(
                "Rule {index}: Destination Bucket must be of the form {BUCKET_ARN_PREFIX}bucket-name"
            )));
        }
        None => {
            return Err(ReplicationConfigError::Illegal(format!(
                "Rule {index}: Destination Bucket is required"
            )));
        }
    };

    let storage_class = match destination.storage_class {
        None => None,
        Some(raw_class) => Some(raw_class.parse::<StorageClass>().map_err(|()| {
            ReplicationConfigError::Illegal(format!(
                "Rule {index}: invalid StorageClass: {raw_class}"
            ))
        })?),
    };

    Ok(ReplicationRule {
        id: rule.id,
        status,
        prefix,
        destination: Destination {
            bucket_arn,
            storage_class,
        },
    })
}

fn is_bucket_arn(arn: &str) -> bool {
    arn.strip_prefix(BUCKET_ARN_PREFIX)
        .is_some_and(|bucket| !bucket.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule_xml(id: &str, status: &str, prefix: &str, storage_class: Option<&str>) -> String {
        let class = storage_class
            .map(|c| format!("<StorageClass>{c}</StorageClass>"))
            .unwrap_or_default();
        format!(
            "<Rule><ID>{id}</ID><Status>{status}</Status><Prefix>{prefix}</Prefix>\
             <Destination><Bucket>arn:aws:s3:::dest-bucket</Bucket>{class}</Destination></Rule>"
        )
    }

    fn config_xml(rules: &str) -> String {
        format!(
            "<ReplicationConfiguration><Role>arn:aws:iam::123456789012:role/repl</Role>\
             {rules}</ReplicationConfiguration>"
        )
    }

    fn config_with_n_rules(n: usize) -> String {
        let rules: String = (0..n)
            .map(|i| rule_xml(&format!("rule-{i}"), "Enabled", &format!("p{i}/"), None))
            .collect();
        config_xml(&rules)
    }

    #[test]
    fn test_empty_body_is_malformed() {
        assert_eq!(parse(b"").unwrap_err(), ReplicationConfigError::MalformedXml);
    }

    #[test]
    fn test_broken_xml_is_malformed() {
        assert_eq!(
            parse(b"this is not xml <<").unwrap_err(),
            ReplicationConfigError::MalformedXml
        );
        assert_eq!(
            parse(b"<ReplicationConfiguration><Role>x</Role>").unwrap_err(),
            ReplicationConfigError::MalformedXml
        );
    }

    #[test]
    fn test_single_rule_parses() {
        let xml = config_xml(&rule_xml("rule-1", "Enabled", "logs/", Some("STANDARD_IA")));
        let config = parse(xml.as_bytes()).unwrap();
        assert_eq!(config.role, "arn:aws:iam::123456789012:role/repl");
        assert_eq!(config.rules.len(), 1);
        let rule = &config.rules[0];
        assert_eq!(rule.id.as_deref(), Some("rule-1"));
        assert_eq!(rule.status, RuleStatus::Enabled);
        assert_eq!(rule.prefix, "logs/");
        assert_eq!(rule.destination.bucket_arn, "arn:aws:s3:::dest-bucket");
        assert_eq!(rule.destination.storage_class, Some(StorageClass::StandardIa));
    }

    #[test]
    fn test_rule_order_is_preserved() {
        let rules: String = (0..5)
            .map(|i| rule_xml(&format!("rule-{i}"), "Disabled", &format!("{i}/"), None))
            .collect();
        let config = parse(config_xml(&rules).as_bytes()).unwrap();
        let ids: Vec<_> = config.rules.iter().filter_map(|r| r.id.as_deref()).collect();
        assert_eq!(ids, ["rule-0", "rule-1", "rule-2", "rule-3", "rule-4"]);
    }

    #[test]
    fn test_empty_prefix_matches_all_keys() {
        let xml = config_xml(&rule_xml("rule-1", "Enabled", "", None));
        let config = parse(xml.as_bytes()).unwrap();
        assert_eq!(config.rules[0].prefix, "");
    }

    #[test]
    fn test_missing_role_is_illegal() {
        let xml = format!(
            "<ReplicationConfiguration>{}</ReplicationConfiguration>",
            rule_xml("rule-1", "Enabled", "logs/", None)
        );
        assert!(matches!(
            parse(xml.as_bytes()).unwrap_err(),
            ReplicationConfigError::Illegal(_)
        ));
    }

    #[test]
    fn test_zero_rules_is_illegal() {
        let xml = config_xml("");
        assert!(matches!(
            parse(xml.as_bytes()).unwrap_err(),
            ReplicationConfigError::Illegal(_)
        ));
    }

    #[test]
    fn test_rule_count_bounds() {
        assert!(parse(config_with_n_rules(1).as_bytes()).is_ok());
        assert_eq!(
            parse(config_with_n_rules(1000).as_bytes())
                .unwrap()
                .rules
                .len(),
            1000
        );
        assert!(matches!(
            parse(config_with_n_rules(1001).as_bytes()).unwrap_err(),
            ReplicationConfigError::Illegal(_)
        ));
    }

    #[test]
    fn test_invalid_status_is_illegal() {
        for status in ["enabled", "ENABLED", "On", ""] {
            let xml = config_xml(&rule_xml("rule-1", status, "logs/", None));
            let err = parse(xml.as_bytes()).unwrap_err();
            assert!(
                matches!(err, ReplicationConfigError::Illegal(ref r) if r.contains("Status")),
                "status {status:?} should be rejected, got {err:?}"
            );
        }
    }

    #[test]
    fn test_invalid_storage_class_is_illegal() {
        let xml = config_xml(&rule_xml("rule-1", "Enabled", "logs/", Some("GLACIER")));
        let err = parse(xml.as_bytes()).unwrap_err();
        assert!(matches!(err, ReplicationConfigError::Illegal(ref r) if r.contains("StorageClass")));
    }

    #[test]
    fn test_all_storage_classes_accepted() {
        for class in ["STANDARD", "REDUCED_REDUNDANCY", "STANDARD_IA"] {
            let xml = config_xml(&rule_xml("rule-1", "Enabled", "logs/", Some(class)));
            let config = parse(xml.as_bytes()).unwrap();
            assert_eq!(
                config.rules[0].destination.storage_class.unwrap().as_str(),
                class
            );
        }
    }

    #[test]
    fn test_missing_destination_is_illegal() {
        let xml = config_xml(
            "<Rule><ID>r</ID><Status>Enabled</Status><Prefix>p/</Prefix></Rule>",
        );
        let err = parse(xml.as_bytes()).unwrap_err();
        assert!(matches!(err, ReplicationConfigError::Illegal(ref r) if r.contains("Destination")));
    }

    #[test]
    fn test_bad_bucket_arn_is_illegal() {
        for arn in ["dest-bucket", "arn:aws:s3:::", "s3://dest-bucket"] {
            let xml = config_xml(&format!(
                "<Rule><Status>Enabled</Status><Prefix></Prefix>\
                 <Destination><Bucket>{arn}</Bucket></Destination></Rule>"
            ));
            let err = parse(xml.as_bytes()).unwrap_err();
            assert!(
                matches!(err, ReplicationConfigError::Illegal(ref r) if r.contains("Bucket")),
                "arn {arn:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_error_identifies_rule_index() {
        let rules = format!(
            "{}{}",
            rule_xml("rule-0", "Enabled", "a/", None),
            rule_xml("rule-1", "Sideways", "b/", None)
        );
        let err = parse(config_xml(&rules).as_bytes()).unwrap_err();
        assert!(matches!(err, ReplicationConfigError::Illegal(ref r) if r.contains("Rule 1")));
    }

    #[test]
    fn test_typed_model_round_trips_as_json() {
        let xml = config_xml(&rule_xml("rule-1", "Enabled", "logs/", Some("STANDARD")));
        let config = parse(xml.as_bytes()).unwrap();
        let json = serde_json::to_string(&config).unwrap();
        let back: ReplicationConfiguration = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
