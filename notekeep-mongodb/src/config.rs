//! Note store connection configuration.

use std::time::Duration;

use mongodb::options::ClientOptions;

use crate::error::{NoteError, NoteResult};

/// Note store configuration.
///
/// `uri`, `database`, and `collection` are required; everything else has a
/// default. Driver-level retries are off unless enabled, so an operation is
/// never repeated behind the caller's back.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    /// MongoDB connection URI.
    pub uri: String,
    /// Database name.
    pub database: String,
    /// Name of the collection holding notes.
    pub collection: String,
    /// Application name (shown in server logs).
    pub app_name: Option<String>,
    /// Minimum connection pool size.
    pub min_pool_size: Option<u32>,
    /// Maximum connection pool size.
    pub max_pool_size: Option<u32>,
    /// Maximum idle time for connections.
    pub max_idle_time: Option<Duration>,
    /// Connection timeout.
    pub connect_timeout: Option<Duration>,
    /// Server selection timeout.
    pub server_selection_timeout: Option<Duration>,
    /// Deadline applied to operations whose context has none.
    pub operation_timeout: Option<Duration>,
    /// Read preference.
    pub read_preference: Option<ReadPreference>,
    /// Write concern.
    pub write_concern: Option<WriteConcern>,
    /// Let the driver retry writes once on transient errors.
    pub retry_writes: Option<bool>,
    /// Let the driver retry reads once on transient errors.
    pub retry_reads: Option<bool>,
    /// Direct connection (bypass replica set discovery).
    pub direct_connection: Option<bool>,
}

/// MongoDB read preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadPreference {
    /// Read from primary only.
    #[default]
    Primary,
    /// Read from primary preferred, fallback to secondary.
    PrimaryPreferred,
    /// Read from secondary only.
    Secondary,
    /// Read from secondary preferred, fallback to primary.
    SecondaryPreferred,
    /// Read from nearest member.
    Nearest,
}

/// MongoDB write concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteConcern {
    /// Acknowledge writes from the specified number of nodes.
    W(u32),
    /// Acknowledge writes from majority of nodes.
    Majority,
    /// Custom tag set.
    Custom(String),
}

/// Default application name reported to the server.
pub const DEFAULT_APP_NAME: &str = "notekeep";

impl StoreConfig {
    /// Create a configuration with default tuning.
    pub fn new(
        uri: impl Into<String>,
        database: impl Into<String>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            uri: uri.into(),
            database: database.into(),
            collection: collection.into(),
            app_name: Some(DEFAULT_APP_NAME.to_string()),
            min_pool_size: None,
            max_pool_size: Some(10),
            max_idle_time: Some(Duration::from_secs(300)),
            connect_timeout: Some(Duration::from_secs(10)),
            server_selection_timeout: Some(Duration::from_secs(30)),
            operation_timeout: None,
            read_preference: Some(ReadPreference::Primary),
            write_concern: None,
            retry_writes: Some(false),
            retry_reads: Some(false),
            direct_connection: None,
        }
    }

    /// Create a builder for configuration.
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::new()
    }

    /// The URI with any password masked, for logging.
    pub fn redacted_uri(&self) -> String {
        let Some((scheme, rest)) = self.uri.split_once("://") else {
            return self.uri.clone();
        };
        let Some((credentials, host)) = rest.rsplit_once('@') else {
            return self.uri.clone();
        };
        match credentials.split_once(':') {
            Some((user, _)) => format!("{}://{}:****@{}", scheme, user, host),
            None => self.uri.clone(),
        }
    }

    /// Convert to MongoDB ClientOptions.
    ///
    /// A URI the driver cannot parse is reported as a connection error.
    pub async fn to_client_options(&self) -> NoteResult<ClientOptions> {
        let mut options = ClientOptions::parse(&self.uri)
            .await
            .map_err(|e| NoteError::connection(format!("failed to parse URI: {}", e)))?;

        if let Some(ref app_name) = self.app_name {
            options.app_name = Some(app_name.clone());
        }

        if let Some(min_pool) = self.min_pool_size {
            options.min_pool_size = Some(min_pool);
        }

        if let Some(max_pool) = self.max_pool_size {
            options.max_pool_size = Some(max_pool);
        }

        if let Some(max_idle) = self.max_idle_time {
            options.max_idle_time = Some(max_idle);
        }

        if let Some(connect_timeout) = self.connect_timeout {
            options.connect_timeout = Some(connect_timeout);
        }

        if let Some(selection_timeout) = self.server_selection_timeout {
            options.server_selection_timeout = Some(selection_timeout);
        }

        if let Some(ref read_pref) = self.read_preference {
            options.selection_criteria = Some(mongodb::options::SelectionCriteria::ReadPreference(
                match read_pref {
                    ReadPreference::Primary => mongodb::options::ReadPreference::Primary,
                    ReadPreference::PrimaryPreferred => {
                        mongodb::options::ReadPreference::PrimaryPreferred {
                            options: Default::default(),
                        }
                    }
                    ReadPreference::Secondary => mongodb::options::ReadPreference::Secondary {
                        options: Default::default(),
                    },
                    ReadPreference::SecondaryPreferred => {
                        mongodb::options::ReadPreference::SecondaryPreferred {
                            options: Default::default(),
                        }
                    }
                    ReadPreference::Nearest => mongodb::options::ReadPreference::Nearest {
                        options: Default::default(),
                    },
                },
            ));
        }

        if let Some(ref wc) = self.write_concern {
            options.write_concern = Some(match wc {
                WriteConcern::W(n) => mongodb::options::WriteConcern::builder()
                    .w(mongodb::options::Acknowledgment::Nodes(*n))
                    .build(),
                WriteConcern::Majority => mongodb::options::WriteConcern::builder()
                    .w(mongodb::options::Acknowledgment::Majority)
                    .build(),
                WriteConcern::Custom(tag) => mongodb::options::WriteConcern::builder()
                    .w(mongodb::options::Acknowledgment::Custom(tag.clone()))
                    .build(),
            });
        }

        if let Some(retry_writes) = self.retry_writes {
            options.retry_writes = Some(retry_writes);
        }

        if let Some(retry_reads) = self.retry_reads {
            options.retry_reads = Some(retry_reads);
        }

        if let Some(direct) = self.direct_connection {
            options.direct_connection = Some(direct);
        }

        Ok(options)
    }
}

/// Builder for note store configuration.
#[derive(Debug, Default)]
pub struct StoreConfigBuilder {
    uri: Option<String>,
    database: Option<String>,
    collection: Option<String>,
    app_name: Option<String>,
    min_pool_size: Option<u32>,
    max_pool_size: Option<u32>,
    max_idle_time: Option<Duration>,
    connect_timeout: Option<Duration>,
    server_selection_timeout: Option<Duration>,
    operation_timeout: Option<Duration>,
    read_preference: Option<ReadPreference>,
    write_concern: Option<WriteConcern>,
    retry_writes: Option<bool>,
    retry_reads: Option<bool>,
    direct_connection: Option<bool>,
}

impl StoreConfigBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the MongoDB URI.
    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Set the database name.
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Set the collection name.
    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    /// Set the application name.
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self
    }

    /// Set the minimum pool size.
    pub fn min_pool_size(mut self, size: u32) -> Self {
        self.min_pool_size = Some(size);
        self
    }

    /// Set the maximum pool size.
    pub fn max_pool_size(mut self, size: u32) -> Self {
        self.max_pool_size = Some(size);
        self
    }

    /// Set the maximum idle time for connections.
    pub fn max_idle_time(mut self, duration: Duration) -> Self {
        self.max_idle_time = Some(duration);
        self
    }

    /// Set the connection timeout.
    pub fn connect_timeout(mut self, duration: Duration) -> Self {
        self.connect_timeout = Some(duration);
        self
    }

    /// Set the server selection timeout.
    pub fn server_selection_timeout(mut self, duration: Duration) -> Self {
        self.server_selection_timeout = Some(duration);
        self
    }

    /// Set the default per-operation deadline.
    pub fn operation_timeout(mut self, duration: Duration) -> Self {
        self.operation_timeout = Some(duration);
        self
    }

    /// Set the read preference.
    pub fn read_preference(mut self, pref: ReadPreference) -> Self {
        self.read_preference = Some(pref);
        self
    }

    /// Set the write concern.
    pub fn write_concern(mut self, wc: WriteConcern) -> Self {
        self.write_concern = Some(wc);
        self
    }

    /// Enable or disable retry writes.
    pub fn retry_writes(mut self, enabled: bool) -> Self {
        self.retry_writes = Some(enabled);
        self
    }

    /// Enable or disable retry reads.
    pub fn retry_reads(mut self, enabled: bool) -> Self {
        self.retry_reads = Some(enabled);
        self
    }

    /// Enable direct connection (bypass replica set discovery).
    pub fn direct_connection(mut self, enabled: bool) -> Self {
        self.direct_connection = Some(enabled);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> NoteResult<StoreConfig> {
        let uri = required(self.uri, "connection URI")?;
        let database = required(self.database, "database name")?;
        let collection = required(self.collection, "collection name")?;

        let defaults = StoreConfig::new(uri, database, collection);
        Ok(StoreConfig {
            app_name: self.app_name.or(defaults.app_name.clone()),
            min_pool_size: self.min_pool_size,
            max_pool_size: self.max_pool_size.or(defaults.max_pool_size),
            max_idle_time: self.max_idle_time.or(defaults.max_idle_time),
            connect_timeout: self.connect_timeout.or(defaults.connect_timeout),
            server_selection_timeout: self
                .server_selection_timeout
                .or(defaults.server_selection_timeout),
            operation_timeout: self.operation_timeout,
            read_preference: self.read_preference.or(defaults.read_preference),
            write_concern: self.write_concern,
            retry_writes: self.retry_writes.or(defaults.retry_writes),
            retry_reads: self.retry_reads.or(defaults.retry_reads),
            direct_connection: self.direct_connection,
            ..defaults
        })
    }
}

fn required(value: Option<String>, what: &str) -> NoteResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        Some(_) => Err(NoteError::config(format!("{} must not be empty", what))),
        None => Err(NoteError::config(format!("{} is required", what))),
    }
}
