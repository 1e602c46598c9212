//! Bridge configuration.

use aas_eventbridge_mqtt::{ConnectionOptions, DEFAULT_PUB_TOPIC, DEFAULT_SUB_TOPIC};
use aas_eventbridge_observer::ObserverScope;
use aas_eventbridge_proto::DEFAULT_REPOSITORY;
use anyhow::{Context, Result};
use std::time::Duration;

/// Bridge configuration.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Broker session
    pub connection: ConnectionOptions,

    /// Repository segment used in topics
    pub repo_id: String,

    /// Observed shell
    pub shell_id: String,

    /// Observed submodel; `None` observes the whole shell
    pub submodel_id: Option<String>,

    /// Whitelisted element paths; empty disables filtering
    pub whitelist: Vec<String>,

    /// Inbound I4.0 topic
    pub sub_topic: String,

    /// Outbound I4.0 topic
    pub pub_topic: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionOptions::default(),
            repo_id: DEFAULT_REPOSITORY.to_string(),
            shell_id: "urn:example:aas:1".to_string(),
            submodel_id: None,
            whitelist: Vec::new(),
            sub_topic: DEFAULT_SUB_TOPIC.to_string(),
            pub_topic: DEFAULT_PUB_TOPIC.to_string(),
        }
    }
}

impl BridgeConfig {
    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `EVENTBRIDGE_MQTT_BROKER`: MQTT broker URL
    /// - `EVENTBRIDGE_CLIENT_ID`: MQTT client id
    /// - `EVENTBRIDGE_USERNAME` / `EVENTBRIDGE_PASSWORD`: credentials (both required)
    /// - `EVENTBRIDGE_KEEP_ALIVE_SECS`: keep-alive interval
    /// - `EVENTBRIDGE_REPO_ID`: repository id
    /// - `EVENTBRIDGE_SHELL_ID`: observed shell
    /// - `EVENTBRIDGE_SUBMODEL_ID`: observed submodel
    /// - `EVENTBRIDGE_WHITELIST`: comma-separated element paths
    /// - `EVENTBRIDGE_SUB_TOPIC` / `EVENTBRIDGE_PUB_TOPIC`: I4.0 topics
    ///
    /// # Errors
    ///
    /// Returns error if a variable has an invalid value.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(broker) = std::env::var("EVENTBRIDGE_MQTT_BROKER") {
            config.connection.broker = broker;
        }

        if let Ok(client_id) = std::env::var("EVENTBRIDGE_CLIENT_ID") {
            config.connection.client_id = client_id;
        }

        if let (Ok(username), Ok(password)) = (
            std::env::var("EVENTBRIDGE_USERNAME"),
            std::env::var("EVENTBRIDGE_PASSWORD"),
        ) {
            config.connection = config.connection.with_credentials(username, password);
        }

        if let Ok(secs) = std::env::var("EVENTBRIDGE_KEEP_ALIVE_SECS") {
            let secs: u64 = secs
                .parse()
                .context("Invalid EVENTBRIDGE_KEEP_ALIVE_SECS")?;
            config.connection.keep_alive = Duration::from_secs(secs);
        }

        if let Ok(repo_id) = std::env::var("EVENTBRIDGE_REPO_ID") {
            config.repo_id = repo_id;
        }

        if let Ok(shell_id) = std::env::var("EVENTBRIDGE_SHELL_ID") {
            config.shell_id = shell_id;
        }

        if let Ok(submodel_id) = std::env::var("EVENTBRIDGE_SUBMODEL_ID") {
            config.submodel_id = Some(submodel_id).filter(|id| !id.is_empty());
        }

        if let Ok(whitelist) = std::env::var("EVENTBRIDGE_WHITELIST") {
            config.whitelist = parse_whitelist(&whitelist);
        }

        if let Ok(topic) = std::env::var("EVENTBRIDGE_SUB_TOPIC") {
            config.sub_topic = topic;
        }

        if let Ok(topic) = std::env::var("EVENTBRIDGE_PUB_TOPIC") {
            config.pub_topic = topic;
        }

        Ok(config)
    }

    /// Observer scope described by this configuration.
    #[must_use]
    pub fn scope(&self) -> ObserverScope {
        let scope = match &self.submodel_id {
            Some(submodel_id) => ObserverScope::submodel(&self.shell_id, submodel_id),
            None => ObserverScope::shell(&self.shell_id),
        };
        scope.in_repo(&self.repo_id)
    }
}

fn parse_whitelist(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|path| !path.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitelist_is_comma_separated() {
        assert_eq!(
            parse_whitelist("temperature, sensors/pressure ,,"),
            vec!["temperature".to_string(), "sensors/pressure".to_string()]
        );
        assert!(parse_whitelist("").is_empty());
    }

    #[test]
    fn scope_follows_submodel_setting() {
        let mut config = BridgeConfig::default();
        assert_eq!(config.scope().submodel_id, None);
        assert_eq!(config.scope().repo_id, "aas-repo");

        config.submodel_id = Some("SM1".to_string());
        config.repo_id = "plant".to_string();
        let scope = config.scope();
        assert_eq!(scope.submodel_id.as_deref(), Some("SM1"));
        assert_eq!(scope.repo_id, "plant");
    }

    #[test]
    fn defaults_are_anonymous() {
        let config = BridgeConfig::default();
        assert!(config.connection.credentials.is_none());
        assert!(config.connection.client_id.starts_with("aas-eventbridge-"));
        assert_eq!(config.sub_topic, "i40/inbox");
        assert_eq!(config.pub_topic, "i40/outbox");
    }
}
