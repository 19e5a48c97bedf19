//! Storage provider factory.

use std::time::Duration;

use crate::config::{DatabaseSettings, DatabaseType};
use crate::providers::ProviderError;

/// Storage backend selected for the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageProvider {
    Memory,
    MongoDb {
        url: String,
        prefix: String,
        timeout: Duration,
    },
}

impl StorageProvider {
    pub fn name(&self) -> &'static str {
        match self {
            StorageProvider::Memory => "mem",
            StorageProvider::MongoDb { .. } => "mongodb",
        }
    }
}

/// Pick the storage provider for `settings`.
pub fn select(settings: &DatabaseSettings) -> Result<StorageProvider, ProviderError> {
    match &settings.kind {
        DatabaseType::Memory => Ok(StorageProvider::Memory),
        DatabaseType::MongoDb => {
            let url = settings
                .url
                .clone()
                .ok_or_else(|| ProviderError::MissingDatabaseUrl(settings.kind.to_string()))?;
            Ok(StorageProvider::MongoDb {
                url,
                prefix: settings.prefix.clone(),
                timeout: settings.timeout,
            })
        }
        DatabaseType::Other(tag) => Err(ProviderError::UnsupportedDatabase(tag.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(kind: DatabaseType, url: Option<&str>) -> DatabaseSettings {
        DatabaseSettings {
            kind,
            url: url.map(str::to_string),
            prefix: "kms_".into(),
            timeout: Duration::from_secs(10),
        }
    }

    #[test]
    fn test_select_memory() {
        let provider = select(&settings(DatabaseType::Memory, None)).unwrap();
        assert_eq!(provider, StorageProvider::Memory);
        assert_eq!(provider.name(), "mem");
    }

    #[test]
    fn test_select_mongodb() {
        let provider =
            select(&settings(DatabaseType::MongoDb, Some("mongodb://localhost:27017"))).unwrap();
        assert_eq!(
            provider,
            StorageProvider::MongoDb {
                url: "mongodb://localhost:27017".into(),
                prefix: "kms_".into(),
                timeout: Duration::from_secs(10),
            }
        );
    }

    #[test]
    fn test_select_rejects_unknown() {
        let err = select(&settings(DatabaseType::Other("invalid".into()), None)).unwrap_err();
        assert_eq!(err.to_string(), "unsupported database type: invalid");
    }
}
