//! [`Config`]-related definitions.

use std::{num::NonZeroUsize, time::Duration};

use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use derive_more::{Display, Error};
use serde::Deserialize;
use service::{
    domain::{
        contact::{Email, PersonName},
        work_order,
    },
    infra::notifier,
};
use smart_default::SmartDefault;

/// Application configuration.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: Server,

    /// Service configuration.
    pub service: Service,

    /// Postgres configuration.
    pub postgres: Postgres,

    /// Log configuration.
    pub log: Log,
}

impl Config {
    /// Creates a new [`Config`] by:
    /// - loading it from the provided `path` (if any);
    /// - merging it with the environment variables (if any);
    /// - using default values for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("CONF").separator("."))
            .build()?
            .try_deserialize()
    }
}

/// Server configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Server {
    /// Host to bind the server to.
    #[default("0.0.0.0".to_owned())]
    pub host: String,

    /// Port to bind the server to.
    #[default(8080)]
    pub port: u16,

    /// [CORS] configuration.
    ///
    /// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
    pub cors: Cors,
}

/// [CORS] configuration.
///
/// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Cors {
    /// List of allowed origins.
    #[default(vec!["*".to_owned()])]
    pub origins: Vec<String>,
}

/// Service configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Service {
    /// Leading part of the allocated work order numbers.
    #[default("ELX/SPK".to_owned())]
    pub number_prefix: String,

    /// UTC offset the business day is observed at, like `+07:00`.
    #[default("+07:00".to_owned())]
    pub utc_offset: String,

    /// Number of attempts to allocate a free work order number.
    #[default(5)]
    pub number_allocation_attempts: usize,

    /// Person in charge of work orders created without an explicit one.
    pub operator: Operator,

    /// Base URL of the vendor portal.
    #[default("http://localhost:3000/vendor".to_owned())]
    pub vendor_portal_url: String,

    /// Chat-ops notifications configuration.
    pub slack: Slack,

    /// Service tasks configuration.
    pub tasks: Tasks,
}

impl Service {
    /// Creates a new [`Notifier`] out of this [`Service`] configuration.
    ///
    /// # Errors
    ///
    /// If the configured webhook URL is malformed.
    ///
    /// [`Notifier`]: service::infra::Notifier
    pub fn notifier(&self) -> Result<service::infra::Notifier, Invalid> {
        let url = self.slack.webhook_url.trim();
        if url.is_empty() {
            return Ok(service::infra::Notifier::disabled());
        }
        url.parse::<notifier::Url>()
            .map(|u| service::infra::Notifier::new(Some(u)))
            .map_err(|_| Invalid::WebhookUrl)
    }
}

impl TryFrom<Service> for service::Config {
    type Error = Invalid;

    fn try_from(value: Service) -> Result<Self, Self::Error> {
        let Service {
            number_prefix,
            utc_offset,
            number_allocation_attempts,
            operator,
            vendor_portal_url,
            slack: _,
            tasks: Tasks {
                mark_overdue_payments,
            },
        } = value;

        let offset_format = time::format_description::parse(
            "[offset_hour sign:mandatory]:[offset_minute]",
        )
        .map_err(|_| Invalid::UtcOffset)?;

        Ok(Self {
            number_prefix: work_order::Prefix::new(number_prefix)
                .ok_or(Invalid::NumberPrefix)?,
            utc_offset: time::UtcOffset::parse(&utc_offset, &offset_format)
                .map_err(|_| Invalid::UtcOffset)?,
            number_allocation_attempts: NonZeroUsize::new(
                number_allocation_attempts,
            )
            .ok_or(Invalid::NumberAllocationAttempts)?,
            operator: work_order::Pic {
                name: PersonName::new(operator.name)
                    .ok_or(Invalid::OperatorName)?,
                email: Email::new(operator.email)
                    .ok_or(Invalid::OperatorEmail)?,
            },
            vendor_portal_url,
            mark_overdue_payments:
                service::task::mark_overdue_payments::Config {
                    interval: mark_overdue_payments.interval,
                },
        })
    }
}

/// Invalid [`Service`] configuration value.
#[derive(Clone, Copy, Debug, Display, Error)]
pub enum Invalid {
    /// `service.number_allocation_attempts` is zero.
    #[display("`service.number_allocation_attempts` must be positive")]
    NumberAllocationAttempts,

    /// `service.number_prefix` is malformed.
    #[display(
        "`service.number_prefix` must be non-empty, without whitespace and \
         surrounding `/`"
    )]
    NumberPrefix,

    /// `service.operator.email` is malformed.
    #[display("`service.operator.email` is not a valid e-mail")]
    OperatorEmail,

    /// `service.operator.name` is blank.
    #[display("`service.operator.name` must not be blank")]
    OperatorName,

    /// `service.utc_offset` is malformed.
    #[display("`service.utc_offset` must look like `+07:00`")]
    UtcOffset,

    /// `service.slack.webhook_url` is malformed.
    #[display("`service.slack.webhook_url` is not a valid URL")]
    WebhookUrl,
}

/// Operator configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Operator {
    /// Full name of the operator.
    #[default("Admin User".to_owned())]
    pub name: String,

    /// E-mail of the operator.
    #[default("admin@company.com".to_owned())]
    pub email: String,
}

/// Chat-ops notifications configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Slack {
    /// Incoming webhook URL.
    ///
    /// Notifications are skipped if it's empty.
    pub webhook_url: String,
}

/// Service tasks configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Tasks {
    /// `MarkOverduePayments` task configuration.
    pub mark_overdue_payments: Task,
}

/// Service task configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Task {
    /// Task execution interval.
    #[default(Duration::from_secs(60 * 60))]
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
}

/// Postgres configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Postgres {
    /// Host to connect to.
    #[default("127.0.0.1".to_owned())]
    pub host: String,

    /// Port to connect to.
    #[default(5432)]
    pub port: u16,

    /// User to connect as.
    #[default("postgres".to_owned())]
    pub user: String,

    /// Password to connect with.
    #[default("postgres".to_owned())]
    pub password: String,

    /// Database name to connect to.
    #[default("postgres".to_owned())]
    pub dbname: String,
}

impl From<Postgres> for service::infra::postgres::Config {
    fn from(value: Postgres) -> Self {
        let Postgres {
            host,
            port,
            user,
            password,
            dbname,
        } = value;

        Self {
            host: Some(host),
            port: Some(port),
            user: Some(user),
            password: Some(password),
            dbname: Some(dbname),
            ..Self::default()
        }
    }
}

/// Log configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Log {
    /// Log level.
    pub level: LogLevel,
}

/// Log level.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Designates very low priority, often extremely verbose, information.
    Trace,

    /// Designates lower priority information.
    Debug,

    /// Designates useful information.
    #[default]
    Info,

    /// Designates hazardous situations.
    Warn,

    /// Designates very serious errors.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

#[cfg(test)]
mod spec {
    use super::{Invalid, Service};

    #[test]
    fn converts_defaults() {
        let conf = service::Config::try_from(Service::default()).unwrap();

        assert_eq!(conf.number_prefix.to_string(), "ELX/SPK");
        assert_eq!(conf.utc_offset.whole_hours(), 7);
        assert_eq!(conf.number_allocation_attempts.get(), 5);
    }

    #[test]
    fn rejects_malformed_offset() {
        let res = service::Config::try_from(Service {
            utc_offset: "07:00".into(),
            ..Service::default()
        });

        assert!(matches!(res, Err(Invalid::UtcOffset)));
    }

    #[test]
    fn rejects_zero_allocation_attempts() {
        let res = service::Config::try_from(Service {
            number_allocation_attempts: 0,
            ..Service::default()
        });

        assert!(matches!(res, Err(Invalid::NumberAllocationAttempts)));
    }

    #[test]
    fn disables_notifier_without_webhook() {
        assert!(Service::default().notifier().is_ok());

        let mut conf = Service::default();
        conf.slack.webhook_url = "not a url".into();
        assert!(matches!(conf.notifier(), Err(Invalid::WebhookUrl)));
    }
}
